//! Newline-delimited JSON-RPC framing for the MCP session.
//!
//! Lines that are not valid UTF-8, not JSON, or not a message the session
//! understands are answered here with a JSON-RPC error and skipped, so one bad
//! line never ends the session. A request id that is still in flight is
//! rejected rather than handed to the session twice.

use futures::{Sink, Stream, sink, stream};
use rmcp::{
    RoleServer,
    service::{RxJsonRpcMessage, TxJsonRpcMessage},
};
use serde_json::{Value, json};
use std::{
    collections::HashSet,
    io,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
};

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// Methods the session implements; malformed requests for these are
/// parameter errors, anything else is an unknown method.
const KNOWN_METHODS: &[&str] = &[
    "initialize",
    "ping",
    "tools/list",
    "tools/call",
    "prompts/list",
    "prompts/get",
    "resources/list",
    "resources/read",
    "resources/templates/list",
    "resources/subscribe",
    "resources/unsubscribe",
    "completion/complete",
    "logging/setLevel",
];

pub type MessageSink = Pin<Box<dyn Sink<TxJsonRpcMessage<RoleServer>, Error = io::Error> + Send>>;
pub type MessageStream = Pin<Box<dyn Stream<Item = RxJsonRpcMessage<RoleServer>> + Send>>;

/// Ids of client requests that have not been answered yet.
#[derive(Debug, Clone, Default)]
struct Pending(Arc<Mutex<HashSet<String>>>);

impl Pending {
    /// Returns false when `id` is already in flight.
    fn begin(&self, id: &Value) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string())
    }

    fn finish(&self, id: &Value) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.to_string());
    }
}

/// What one input line turned out to be.
#[derive(Debug)]
enum Frame {
    Message(Box<RxJsonRpcMessage<RoleServer>>),
    Reply(Value),
    Skip,
}

/// Split `reader`/`writer` into the message sink and stream the session runs on.
/// A background task owns `writer` and exits once both halves are dropped.
pub fn line_transport<R, W>(reader: R, writer: W) -> (MessageSink, MessageStream)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(write_lines(writer, out_rx));
    let pending = Pending::default();

    let outgoing: MessageSink = Box::pin(sink::unfold(
        (out_tx.clone(), pending.clone()),
        |(out, pending): (mpsc::UnboundedSender<String>, Pending),
         message: TxJsonRpcMessage<RoleServer>| async move {
            let value = serde_json::to_value(&message).map_err(io::Error::other)?;
            let answered = value.get("result").is_some() || value.get("error").is_some();
            if let Some(id) = value.get("id").filter(|_| answered) {
                pending.finish(id);
            }
            out.send(value.to_string())
                .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response writer closed"))?;
            Ok::<_, io::Error>((out, pending))
        },
    ));

    let incoming: MessageStream = Box::pin(stream::unfold(
        (BufReader::new(reader), out_tx, pending),
        |(mut reader, out, pending)| async move {
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => return None,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(error = %err, "failed to read from client");
                        return None;
                    }
                }

                match classify(&buf, &pending) {
                    Frame::Message(message) => return Some((*message, (reader, out, pending))),
                    Frame::Reply(reply) => {
                        if out.send(reply.to_string()).is_err() {
                            return None;
                        }
                    }
                    Frame::Skip => {}
                }
            }
        },
    ));

    (outgoing, incoming)
}

fn classify(line: &[u8], pending: &Pending) -> Frame {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Frame::Skip;
    }

    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "input line is not UTF-8");
            return parse_error(err);
        }
    };

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "unparsable message");
            return parse_error(err);
        }
    };

    let id = value.get("id").cloned();
    let method = value
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_owned);

    if let (Some("notifications/cancelled"), Some(request_id)) =
        (method.as_deref(), value.pointer("/params/requestId"))
    {
        pending.finish(request_id);
    }

    match serde_json::from_value::<RxJsonRpcMessage<RoleServer>>(value) {
        Ok(message) => match (id, method) {
            (Some(id), Some(_)) if !pending.begin(&id) => {
                tracing::warn!(%id, "request id reused while in flight");
                let message = format!("Duplicate request id: {id}");
                Frame::Reply(error_reply(id, INVALID_REQUEST, message))
            }
            _ => Frame::Message(Box::new(message)),
        },
        Err(err) => match (id, method) {
            (Some(id), Some(method)) if KNOWN_METHODS.contains(&method.as_str()) => {
                let message = format!("Invalid params for {method}: {err}");
                Frame::Reply(error_reply(id, INVALID_PARAMS, message))
            }
            (Some(id), Some(method)) => {
                tracing::debug!(method, "unknown method");
                let message = format!("Method not found: {method}");
                Frame::Reply(error_reply(id, METHOD_NOT_FOUND, message))
            }
            (_, method) => {
                tracing::debug!(?method, error = %err, "ignoring unrecognized message");
                Frame::Skip
            }
        },
    }
}

fn parse_error(err: impl std::fmt::Display) -> Frame {
    Frame::Reply(error_reply(Value::Null, PARSE_ERROR, format!("Parse error: {err}")))
}

fn error_reply(id: Value, code: i32, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        };
        if let Err(err) = written.await {
            tracing::error!(error = %err, "failed to write to client");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(frame: Frame) -> Value {
        match frame {
            Frame::Reply(value) => value,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_parse_error() {
        let line = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"x\":\"\xff\xfe\"}\n";
        let value = reply(classify(line, &Pending::default()));
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], PARSE_ERROR);
    }

    #[test]
    fn garbage_is_parse_error() {
        let value = reply(classify(b"{not json", &Pending::default()));
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], PARSE_ERROR);
    }

    #[test]
    fn malformed_known_method_is_invalid_params() {
        let line = br#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"arguments":{}}}"#;
        let value = reply(classify(line, &Pending::default()));
        assert_eq!(value["id"], 4);
        assert_eq!(value["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(matches!(classify(b"  \r\n", &Pending::default()), Frame::Skip));
    }

    #[test]
    fn requests_pass_through() {
        let line = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        assert!(matches!(classify(line, &Pending::default()), Frame::Message(_)));
    }

    #[test]
    fn reused_in_flight_id_is_rejected_until_answered() {
        let pending = Pending::default();
        let line = br#"{"jsonrpc":"2.0","id":5,"method":"tools/list"}"#;

        assert!(matches!(classify(line, &pending), Frame::Message(_)));

        let value = reply(classify(line, &pending));
        assert_eq!(value["id"], 5);
        assert_eq!(value["error"]["code"], INVALID_REQUEST);

        pending.finish(&Value::from(5));
        assert!(matches!(classify(line, &pending), Frame::Message(_)));
    }

    #[test]
    fn cancellation_releases_the_id() {
        let pending = Pending::default();
        let call = br#"{"jsonrpc":"2.0","id":"c1","method":"tools/list"}"#;
        let cancel =
            br#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":"c1"}}"#;

        assert!(matches!(classify(call, &pending), Frame::Message(_)));
        assert!(matches!(classify(cancel, &pending), Frame::Message(_)));
        assert!(matches!(classify(call, &pending), Frame::Message(_)));
    }
}
