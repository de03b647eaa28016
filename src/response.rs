//! Server reply classification.

use serde::Deserialize;

/// Reply body shape of `/api/command`. Every field is optional.
#[derive(Debug, Deserialize)]
struct ServerReply {
    #[serde(default)]
    msg: Option<String>,
}

/// Best message to show for a server reply: its `msg` field when present and
/// non-empty, otherwise the raw body unchanged. Never fails.
pub fn classify(raw_body: &str) -> String {
    match serde_json::from_str::<ServerReply>(raw_body) {
        Ok(ServerReply { msg: Some(msg) }) if !msg.is_empty() => msg,
        Ok(_) => raw_body.to_string(),
        Err(e) => {
            eprintln!("[NbCommand] Could not parse server reply ({e}), using raw body");
            raw_body.to_string()
        }
    }
}
