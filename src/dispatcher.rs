//! Dispatcher: sends a rendered command line to the remote server and
//! classifies what came back.
//!
//! Every send is a single POST with bounded timeouts; nothing is retried.
//! Failures never escape as `Err`: they are folded into an [`Outcome`].

use std::time::Duration;

use serde::Serialize;

use crate::error::AppError;
use crate::response::classify;

/// Sub-path of the server address that accepts commands.
pub const COMMAND_PATH: &str = "/api/command";

/// Extra line shown when the server refused the connection.
pub const OFFLINE_HINT: &str = "Please check if the remote server is online";

// ── Outcome ─────────────────────────────────────────────────────

/// Classified result of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// HTTP 200. `command` is the exact text transmitted, uid suffix included.
    Ok { command: String, message: String },
    /// Any other HTTP status.
    ServerError { status: u16, message: String },
    /// The request never produced an HTTP response.
    TransportError { detail: String, hint: Option<String> },
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }

    /// Text appended to the operator's history pane for this outcome.
    pub fn history_entry(&self) -> String {
        match self {
            Outcome::Ok { command, message } => format!("> {command}\n{message}"),
            Outcome::ServerError { status, message } => format!("{status} - {message}"),
            Outcome::TransportError { detail, hint } => match hint {
                Some(hint) => format!("command sends exceptions: {detail}\n{hint}"),
                None => format!("command sends exceptions: {detail}"),
            },
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────

/// JSON body of a command request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRequest {
    pub token: String,
    pub command: String,
}

/// Status and body of whatever the server answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// A request that failed below HTTP (DNS, connect, timeout, bad address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub detail: String,
    pub connection_refused: bool,
}

/// Moves one request to the server. [`HttpTransport`] is the real one; tests
/// substitute scripted transports.
pub trait Transport: Send {
    fn post(&self, url: &str, request: &CommandRequest) -> Result<RawResponse, TransportFailure>;
}

// ── HTTP transport ──────────────────────────────────────────────

/// Connect and total request timeouts. `total` is never below `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    connect: Duration,
    total: Duration,
}

impl Timeouts {
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self {
            connect,
            total: total.max(connect),
        }
    }

    pub fn connect(&self) -> Duration {
        self.connect
    }

    pub fn total(&self) -> Duration {
        self.total
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(30))
    }
}

/// Blocking reqwest transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeouts: Timeouts) -> Result<Self, AppError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeouts.connect())
            .timeout(timeouts.total())
            .build()
            .map_err(|e| AppError::ApiError {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, request: &CommandRequest) -> Result<RawResponse, TransportFailure> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .map_err(|e| TransportFailure {
                connection_refused: is_connection_refused(&e),
                detail: error_chain(&e),
            })?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| TransportFailure {
            connection_refused: false,
            detail: error_chain(&e),
        })?;
        Ok(RawResponse { status, body })
    }
}

/// Error message followed by each nested source, joined with `: `.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !detail.contains(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        source = inner.source();
    }
    detail
}

fn is_connection_refused(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = inner.source();
    }
    err.is_connect() && error_chain(err).to_lowercase().contains("refused")
}

// ── Dispatcher ──────────────────────────────────────────────────

/// Full endpoint URL for a server address, tolerating a trailing `/`.
pub fn command_url(server_address: &str) -> String {
    format!("{}{COMMAND_PATH}", server_address.trim().trim_end_matches('/'))
}

/// Append the ` @uid` target suffix when a uid is given.
pub fn with_target_uid(command_text: &str, target_uid: Option<&str>) -> String {
    match target_uid.map(str::trim) {
        Some(uid) if !uid.is_empty() => format!("{command_text} @{uid}"),
        _ => command_text.to_string(),
    }
}

/// Sends command lines through a [`Transport`].
pub struct Dispatcher<T: Transport = HttpTransport> {
    transport: T,
}

impl Dispatcher<HttpTransport> {
    pub fn http(timeouts: Timeouts) -> Result<Self, AppError> {
        Ok(Self::new(HttpTransport::new(timeouts)?))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One best-effort send. Always returns an outcome.
    pub fn send(
        &self,
        server_address: &str,
        auth_token: &str,
        command_text: &str,
        target_uid: Option<&str>,
    ) -> Outcome {
        let command = with_target_uid(command_text, target_uid);
        let request = CommandRequest {
            token: auth_token.to_string(),
            command: command.clone(),
        };

        match self.transport.post(&command_url(server_address), &request) {
            Ok(RawResponse { status: 200, body }) => {
                let message = classify(&body);
                eprintln!("[NbCommand] Command succeeded: {command}; server replied: {message}");
                Outcome::Ok { command, message }
            }
            Ok(RawResponse { status, body }) => {
                let message = classify(&body);
                eprintln!("[NbCommand] Command failed: {status} - {message}");
                Outcome::ServerError { status, message }
            }
            Err(failure) => {
                eprintln!("[NbCommand] Failed to send command: {}", failure.detail);
                Outcome::TransportError {
                    hint: failure.connection_refused.then(|| OFFLINE_HINT.to_string()),
                    detail: failure.detail,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Replays a fixed reply and records every request.
    struct Scripted {
        reply: Result<RawResponse, TransportFailure>,
        seen: Mutex<Vec<(String, CommandRequest)>>,
    }

    impl Scripted {
        fn new(reply: Result<RawResponse, TransportFailure>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for Scripted {
        fn post(&self, url: &str, request: &CommandRequest) -> Result<RawResponse, TransportFailure> {
            self.seen.lock().push((url.to_string(), request.clone()));
            self.reply.clone()
        }
    }

    fn reply(status: u16, body: &str) -> Result<RawResponse, TransportFailure> {
        Ok(RawResponse {
            status,
            body: body.to_string(),
        })
    }

    #[test]
    fn success_extracts_msg_and_appends_uid() {
        let d = Dispatcher::new(Scripted::new(reply(200, r#"{"msg":"done"}"#)));
        let outcome = d.send("http://127.0.0.1:521/", "tok", "give 1", Some("10001"));
        assert_eq!(
            outcome,
            Outcome::Ok {
                command: "give 1 @10001".to_string(),
                message: "done".to_string()
            }
        );
        let seen = d.transport().seen.lock();
        assert_eq!(seen[0].0, "http://127.0.0.1:521/api/command");
        assert_eq!(seen[0].1.token, "tok");
        assert_eq!(seen[0].1.command, "give 1 @10001");
    }

    #[test]
    fn empty_uid_adds_no_suffix() {
        let d = Dispatcher::new(Scripted::new(reply(200, "ok")));
        d.send("http://h", "t", "give 1", Some(""));
        d.send("http://h", "t", "give 1", None);
        let seen = d.transport().seen.lock();
        assert_eq!(seen[0].1.command, "give 1");
        assert_eq!(seen[1].1.command, "give 1");
    }

    #[test]
    fn non_200_is_server_error() {
        let d = Dispatcher::new(Scripted::new(reply(400, r#"{"msg":"invalid id"}"#)));
        let outcome = d.send("http://h", "t", "give 0", None);
        assert_eq!(
            outcome,
            Outcome::ServerError {
                status: 400,
                message: "invalid id".to_string()
            }
        );
        assert_eq!(outcome.history_entry(), "400 - invalid id");
    }

    #[test]
    fn non_json_error_body_kept_raw() {
        let d = Dispatcher::new(Scripted::new(reply(502, "Bad Gateway")));
        let outcome = d.send("http://h", "t", "give 0", None);
        assert_eq!(
            outcome,
            Outcome::ServerError {
                status: 502,
                message: "Bad Gateway".to_string()
            }
        );
    }

    #[test]
    fn refused_connection_gets_hint() {
        let d = Dispatcher::new(Scripted::new(Err(TransportFailure {
            detail: "error sending request: Connection refused".to_string(),
            connection_refused: true,
        })));
        let outcome = d.send("http://h", "t", "give 0", None);
        assert!(matches!(
            &outcome,
            Outcome::TransportError { detail, hint: Some(hint) }
                if detail.contains("Connection refused") && hint == OFFLINE_HINT
        ));
        assert!(outcome.history_entry().ends_with(OFFLINE_HINT));
    }

    #[test]
    fn timeout_has_no_hint() {
        let d = Dispatcher::new(Scripted::new(Err(TransportFailure {
            detail: "operation timed out".to_string(),
            connection_refused: false,
        })));
        let outcome = d.send("http://h", "t", "give 0", None);
        assert_eq!(
            outcome.history_entry(),
            "command sends exceptions: operation timed out"
        );
    }

    #[test]
    fn success_history_entry_shows_command() {
        let outcome = Outcome::Ok {
            command: "build 8001".to_string(),
            message: "ok".to_string(),
        };
        assert_eq!(outcome.history_entry(), "> build 8001\nok");
    }

    #[test]
    fn request_body_escapes_quotes() {
        let body = serde_json::to_string(&CommandRequest {
            token: "t".to_string(),
            command: r#"mail "hi""#.to_string(),
        })
        .unwrap();
        assert_eq!(body, r#"{"token":"t","command":"mail \"hi\""}"#);
    }

    #[test]
    fn timeouts_total_not_below_connect() {
        let t = Timeouts::new(Duration::from_secs(20), Duration::from_secs(5));
        assert_eq!(t.total(), Duration::from_secs(20));
        assert_eq!(Timeouts::default().connect(), Duration::from_secs(10));
        assert_eq!(Timeouts::default().total(), Duration::from_secs(30));
    }

    #[test]
    fn command_url_trims_trailing_slash() {
        assert_eq!(command_url("http://a:1"), "http://a:1/api/command");
        assert_eq!(command_url("http://a:1//"), "http://a:1/api/command");
    }
}
