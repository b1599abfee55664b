//! Purpose: Drive one bridge over newline-delimited JSON on stdin/stdout.
//! Exports: `serve`, `error_json`.
//! Role: Host transport stand-in; maps request lines to commands and flushes events as lines.
//! Invariants: Output only carries JSON lines: responses first, then the events they caused.
//! Invariants: EOF exits cleanly; malformed lines produce an error line, not an exit.
//! Invariants: Events reach the output only while a `listen` subscription is active.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::rc::Rc;

use mapbridge::api::{
    Error, ErrorKind, EventEnvelope, GesturePhase, LocationPermissions, MapBridge, MapEngine,
    RecordingEngine, ScreenPoint,
};
use serde_json::{Map, Value, json};

type Outbox = Rc<RefCell<VecDeque<EventEnvelope>>>;

pub(super) fn serve<R, W, P>(
    reader: R,
    writer: &mut W,
    bridge: &mut MapBridge<RecordingEngine, P>,
) -> Result<(), Error>
where
    R: BufRead,
    W: Write,
    P: LocationPermissions,
{
    let outbox: Outbox = Rc::new(RefCell::new(VecDeque::new()));

    for line in reader.lines() {
        let line = line.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read request")
                .with_source(err)
        })?;
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(message) {
            Ok(request) => handle_request(request, bridge, &outbox),
            Err(_) => protocol_error(Value::Null, "parse_error", "invalid JSON"),
        };
        if let Some(animated) = bridge.engine_mut().take_region_change() {
            bridge.on_region_changed(animated);
        }

        write_json_line(writer, &response)?;
        let pending: Vec<EventEnvelope> = outbox.borrow_mut().drain(..).collect();
        for envelope in pending {
            let payload = serde_json::to_value(&envelope).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode event")
                    .with_source(err)
            })?;
            write_json_line(writer, &payload)?;
        }
    }

    bridge.dispose();
    writer.flush().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to flush output")
            .with_source(err)
    })
}

fn handle_request<P: LocationPermissions>(
    request: Value,
    bridge: &mut MapBridge<RecordingEngine, P>,
    outbox: &Outbox,
) -> Value {
    let Value::Object(mut object) = request else {
        return protocol_error(Value::Null, "invalid_request", "request must be a JSON object");
    };
    let id = object.remove("id").unwrap_or(Value::Null);
    let Some(method) = object
        .remove("method")
        .and_then(|value| value.as_str().map(ToString::to_string))
    else {
        return protocol_error(id, "invalid_request", "missing method field");
    };
    let args = object.remove("args");

    let result = match method.as_str() {
        "listen" => {
            let sink_outbox = Rc::clone(outbox);
            bridge.subscribe(move |envelope: EventEnvelope| {
                sink_outbox.borrow_mut().push_back(envelope)
            });
            Ok(Value::Null)
        }
        "cancel" => {
            bridge.cancel();
            Ok(Value::Null)
        }
        "tap" | "longPress" => gesture(&method, args.as_ref()).map(|(point, phase)| {
            if method == "tap" {
                bridge.on_tap(point, phase);
            } else {
                bridge.on_long_press(point, phase);
            }
            Value::Null
        }),
        "select" => select(bridge, args.as_ref()),
        _ => bridge.dispatch(&method, args.as_ref()),
    };

    match result {
        Ok(result) => json!({ "id": id, "result": result }),
        Err(err) => json!({ "id": id, "error": error_json(&err) }),
    }
}

fn gesture(method: &str, args: Option<&Value>) -> Result<(ScreenPoint, GesturePhase), Error> {
    let invalid = || Error::invalid_arguments(method.to_string());
    let args = args.and_then(Value::as_object).ok_or_else(invalid)?;
    let x = args.get("x").and_then(Value::as_f64).ok_or_else(invalid)?;
    let y = args.get("y").and_then(Value::as_f64).ok_or_else(invalid)?;
    let phase = match args.get("phase") {
        None | Some(Value::Null) => GesturePhase::Ended,
        Some(value) => value
            .as_str()
            .and_then(GesturePhase::from_wire)
            .ok_or_else(|| invalid().with_message("unknown gesture phase"))?,
    };
    Ok((ScreenPoint::new(x, y), phase))
}

fn select<E: MapEngine, P: LocationPermissions>(
    bridge: &mut MapBridge<E, P>,
    args: Option<&Value>,
) -> Result<Value, Error> {
    let id = args
        .and_then(|args| args.get("id"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_arguments("select"))?;
    if let Some(handle) = bridge.registry().marker(id).map(|entry| entry.handle) {
        bridge.on_select(handle);
    }
    Ok(Value::Null)
}

pub(super) fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("code".to_string(), json!(err.kind().wire_code()));
    let message = err.message().map(ToString::to_string).unwrap_or_else(|| err.to_string());
    inner.insert("message".to_string(), json!(message));
    if let Some(command) = err.command() {
        inner.insert("command".to_string(), json!(command));
    }
    Value::Object(inner)
}

fn protocol_error(id: Value, code: &str, message: &str) -> Value {
    json!({
        "id": id,
        "error": {
            "code": code,
            "message": message,
        }
    })
}

fn write_json_line<W: Write>(writer: &mut W, payload: &Value) -> Result<(), Error> {
    serde_json::to_writer(&mut *writer, payload).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode message")
            .with_source(err)
    })?;
    writer.write_all(b"\n").map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write message")
            .with_source(err)
    })?;
    writer.flush().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to flush message")
            .with_source(err)
    })
}
