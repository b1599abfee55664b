//! Purpose: Error model shared by the bridge, the command parser, and the binary.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: One error type with builder-attached context; no per-module error enums.
//! Invariants: Rejected commands always carry the offending command name.
//! Invariants: Wire codes and exit codes are stable once published.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    InvalidArguments,
    UnsupportedCommand,
    Io,
}

impl ErrorKind {
    pub fn wire_code(self) -> &'static str {
        match self {
            ErrorKind::Internal => "internal",
            ErrorKind::Usage => "usage",
            ErrorKind::InvalidArguments => "bad_args",
            ErrorKind::UnsupportedCommand => "unimplemented",
            ErrorKind::Io => "io",
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    command: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            command: None,
            source: None,
        }
    }

    /// Required argument missing or of the wrong shape for `command`.
    pub fn invalid_arguments(command: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArguments).with_command(command)
    }

    pub fn unsupported_command(command: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedCommand).with_command(command)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(command) = &self.command {
            write!(f, "({command})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::InvalidArguments => 3,
        ErrorKind::UnsupportedCommand => 4,
        ErrorKind::Io => 5,
    }
}
