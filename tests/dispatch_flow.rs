#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use nb_command::catalog::{Catalog, MapLocalizer};
use nb_command::dispatcher::{
    CommandRequest, Dispatcher, HttpTransport, RawResponse, Timeouts, Transport, TransportFailure,
    OFFLINE_HINT,
};
use nb_command::{render, Outcome, ParameterStore};

struct Recorder {
    status: u16,
    body: String,
    requests: Mutex<Vec<(String, CommandRequest)>>,
}

impl Transport for Recorder {
    fn post(&self, url: &str, request: &CommandRequest) -> Result<RawResponse, TransportFailure> {
        self.requests.lock().push((url.to_string(), request.clone()));
        Ok(RawResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

fn timeouts() -> Timeouts {
    Timeouts::new(Duration::from_secs(2), Duration::from_secs(5))
}

#[test]
fn preview_and_send_match() {
    let catalog = Catalog::builtin().unwrap();
    let syntax = &catalog.find("build").unwrap().syntax;
    let mut store = ParameterStore::for_syntax(syntax);
    store.add_to_set("characters", "8001 - Hero");
    let preview = render(syntax, &store);
    assert_eq!(preview, "build 8001");

    let dispatcher = Dispatcher::new(Recorder {
        status: 200,
        body: r#"{"code":0,"msg":"Build created"}"#.to_string(),
        requests: Mutex::new(Vec::new()),
    });
    let outcome = dispatcher.send("http://127.0.0.1:521", "secret", &preview, Some("10001"));
    assert_eq!(
        outcome,
        Outcome::Ok {
            command: "build 8001 @10001".to_string(),
            message: "Build created".to_string()
        }
    );

    let requests = dispatcher.transport().requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "http://127.0.0.1:521/api/command");
    assert_eq!(
        requests[0].1,
        CommandRequest {
            token: "secret".to_string(),
            command: "build 8001 @10001".to_string()
        }
    );
}

#[test]
fn user_catalog_renders_prefix_and_multiset() {
    let json = r#"{ "commands": [ {
        "keyword": "give", "category": "items", "name": "Give",
        "fields": [
            { "name": "items", "mode": "multi_select_multiset" },
            { "name": "level", "mode": "special_prefix", "delimiter": "lv" },
            { "name": "note" }
        ]
    } ] }"#;
    let catalog = Catalog::from_json(json, &MapLocalizer::default()).unwrap();
    let syntax = &catalog.find("give").unwrap().syntax;
    let mut store = ParameterStore::for_syntax(syntax);
    store.increment_multiset("items", "10001 - Sword", 2);
    store.increment_multiset("items", "10002 - Shield", 1);
    store.set_scalar("level", "5");
    assert_eq!(render(syntax, &store), "give 10001:2,10002:1 lv5");
}

#[test]
fn real_http_server_error_is_classified() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let mut buf = [0_u8; 4096];
        let mut request = Vec::new();
        // read until the JSON body has arrived
        while !String::from_utf8_lossy(&request).contains("\"command\"") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let body = r#"{"msg":"invalid id"}"#;
        let response = format!(
            "HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&request).to_string()
    });

    let dispatcher = Dispatcher::new(HttpTransport::new(timeouts()).unwrap());
    let outcome = dispatcher.send(&format!("http://{addr}"), "tok", "give 0", None);
    assert_eq!(
        outcome,
        Outcome::ServerError {
            status: 400,
            message: "invalid id".to_string()
        }
    );

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /api/command "));
    assert!(request.to_lowercase().contains("content-type: application/json"));
    assert!(request.contains(r#""command":"give 0""#));
}

#[test]
fn refused_connection_carries_hint() {
    // bind then drop to get a port nothing listens on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let dispatcher = Dispatcher::new(HttpTransport::new(timeouts()).unwrap());
    let outcome = dispatcher.send(&format!("http://127.0.0.1:{port}"), "tok", "give 0", None);
    assert!(
        matches!(&outcome, Outcome::TransportError { hint: Some(h), .. } if h == OFFLINE_HINT),
        "unexpected outcome: {outcome:?}"
    );
}

#[test]
fn malformed_address_is_transport_error() {
    let dispatcher = Dispatcher::new(HttpTransport::new(timeouts()).unwrap());
    let outcome = dispatcher.send("not a url", "tok", "give 0", None);
    assert!(matches!(outcome, Outcome::TransportError { hint: None, .. }));
}
