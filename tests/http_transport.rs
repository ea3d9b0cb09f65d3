//! HTTP Transport Tests
//!
//! Runs the default `reqwest` client against a one-shot HTTP server on a
//! loopback socket. Validates:
//! - The command is POSTed as JSON with the bearer token
//! - 2xx bodies are decoded, other statuses become remote errors
//! - An unreachable endpoint is a transport error

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use harper::{HarperError, Session};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Request as seen by the server
struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: serde_json::Value,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Serve exactly one request with the given status and body
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').unwrap();
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let length: usize = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .map(|(_, value)| value.parse().unwrap())
            .unwrap_or(0);
        let mut raw = vec![0; length];
        reader.read_exact(&mut raw).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();

        Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: serde_json::from_slice(&raw).unwrap(),
        }
    });

    (url, handle)
}

fn session(url: &str) -> Session {
    Session::builder()
        .endpoint(url)
        .auth_token("tok")
        .schema("dev")
        .timeout(Duration::from_secs(5))
        .build()
        .expect("session builds")
}

#[test]
fn test_post_json_with_bearer_token() {
    let (url, server) = serve_once("200 OK", r#"{"message":"inserted 1 of 1 records","inserted_hashes":["d-1"]}"#);

    let result = session(&url).insert_one("dog", json!({"id": "d-1"})).unwrap();
    let captured = server.join().unwrap();

    assert_eq!(result.inserted_hashes.len(), 1);
    assert!(captured.request_line.starts_with("POST / "));
    assert_eq!(captured.header("Authorization"), Some("Bearer tok"));
    assert_eq!(captured.header("Content-Type"), Some("application/json"));
    assert_eq!(
        captured.body,
        json!({"operation": "insert", "schema": "dev", "table": "dog", "records": [{"id": "d-1"}]})
    );
}

#[test]
fn test_non_success_status_is_remote_error() {
    let (url, server) = serve_once("403 Forbidden", r#"{"error":"This operation is not authorized"}"#);

    let err = session(&url).create_schema("prod").unwrap_err();
    let captured = server.join().unwrap();

    assert_eq!(captured.body, json!({"operation": "create_schema", "schema": "prod"}));
    match err {
        HarperError::Remote { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, br#"{"error":"This operation is not authorized"}"#.to_vec());
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[test]
fn test_created_status_counts_as_success() {
    let (url, server) = serve_once("201 Created", r#"{"message":"Starting job with id j-42"}"#);

    let job_id = session(&url)
        .csv_data_load("dog", harper::BulkAction::Upsert, [["id"], ["d-1"]])
        .unwrap();
    server.join().unwrap();

    assert_eq!(job_id, "j-42");
}

#[test]
fn test_unreachable_endpoint_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

    let err = session(&format!("http://127.0.0.1:{port}"))
        .select::<serde_json::Value>("SELECT 1")
        .unwrap_err();

    assert_eq!(err.error_code(), "TRANSPORT_ERROR");
}
