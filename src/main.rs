//! Purpose: `mapbridge` CLI entry point.
//! Role: Binary crate root; parses args, builds one bridge over the headless engine, serves stdio.
//! Invariants: stdout carries only protocol lines; diagnostics and logs go to stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use mapbridge::api::{
    BridgeConfig, ChannelNames, CountingPermissions, Error, ErrorKind, MapBridge, RecordingEngine,
    VIEW_TYPE_ID, Viewport, to_exit_code,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

mod stdio;

#[derive(Parser)]
#[command(
    name = "mapbridge",
    version,
    about = "Command/event bridge between a host and an embedded map surface",
    long_about = None,
    after_help = r#"EXAMPLES
  $ echo '{"id":1,"method":"addCircle","args":{"center":{"lat":0,"lon":0},"radius":100}}' | mapbridge
  $ mapbridge --config bridge.json --view-id 3 serve

PROTOCOL
  One JSON object per line: {"id": any, "method": name, "args": {...}}
  `listen` / `cancel` control the event stream; `tap`, `longPress`, `select` simulate input."#
)]
struct Cli {
    #[arg(long, help = "JSON file with bridge defaults", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 0, help = "View id used for channel naming")]
    view_id: i64,
    #[arg(long, help = "JSON creation arguments, e.g. '{\"camera\":{...}}'")]
    create_args: Option<String>,
    #[arg(long, default_value_t = 800.0, help = "Headless viewport width")]
    width: f64,
    #[arg(long, default_value_t = 600.0, help = "Headless viewport height")]
    height: f64,
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve newline-delimited JSON requests on stdin (default).
    Serve,
    /// Print version information.
    Version,
    /// Generate shell completions.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                return Ok(());
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage).with_message(err.to_string().trim_end()));
            }
        },
    };
    init_tracing();

    match cli.command.unwrap_or(CliCommand::Serve) {
        CliCommand::Version => {
            println!("mapbridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliCommand::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "mapbridge", &mut io::stdout());
            Ok(())
        }
        CliCommand::Serve => {
            let config = match &cli.config {
                Some(path) => BridgeConfig::from_path(path)?,
                None => BridgeConfig::default(),
            };
            let create_args = cli
                .create_args
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .map_err(|err| {
                    Error::new(ErrorKind::Usage)
                        .with_message("--create-args must be valid JSON")
                        .with_source(err)
                })?;
            if !(cli.width > 0.0 && cli.height > 0.0) {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("viewport width and height must be positive"));
            }

            let channels = ChannelNames::for_view(cli.view_id);
            let engine = RecordingEngine::new(Viewport {
                width: cli.width,
                height: cli.height,
            });
            let viewport = engine.viewport();
            tracing::info!(
                view_type = VIEW_TYPE_ID,
                methods = %channels.methods,
                events = %channels.events,
                width = viewport.width,
                height = viewport.height,
                long_press_ms = config.long_press_min_duration().as_millis() as u64,
                "serving map bridge on stdio"
            );
            let mut bridge = MapBridge::with_creation_args(
                engine,
                CountingPermissions::default(),
                config,
                create_args.as_ref(),
            );
            // The initial camera is not a region change the host asked to observe.
            bridge.engine_mut().take_region_change();

            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut writer = io::BufWriter::new(stdout.lock());
            stdio::serve(stdin.lock(), &mut writer, &mut bridge)
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        return;
    }
    let value = json!({ "error": stdio::error_json(err) });
    let text = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"code\":\"internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{text}");
}
