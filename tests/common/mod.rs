//! Shared test helpers: a scripted HTTP client that records every request.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Cursor};
use std::sync::{Arc, Mutex};

use harper::{HttpClient, HttpRequest, HttpResponse, SendError, Session};

/// One scripted reply
pub enum Reply {
    /// Status and body
    Status(u16, String),
    /// Send fails with a connection error
    Refused,
}

/// HTTP client replaying scripted replies in order
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a 200 reply with a JSON body
    pub fn ok(self: &Arc<Self>, body: serde_json::Value) -> Arc<Self> {
        self.push(Reply::Status(200, body.to_string()))
    }

    /// Queue a reply with any status and raw body
    pub fn status(self: &Arc<Self>, status: u16, body: &str) -> Arc<Self> {
        self.push(Reply::Status(status, body.to_string()))
    }

    /// Queue a refused connection
    pub fn refuse(self: &Arc<Self>) -> Arc<Self> {
        self.push(Reply::Refused)
    }

    fn push(self: &Arc<Self>, reply: Reply) -> Arc<Self> {
        self.replies.lock().unwrap().push_back(reply);
        Arc::clone(self)
    }

    /// All requests sent so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Body of the only request sent, parsed as JSON
    pub fn single_body(&self) -> serde_json::Value {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        serde_json::from_slice(&requests[0].body).expect("request body is JSON")
    }
}

impl HttpClient for ScriptedClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, SendError> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Status(status, body)) => {
                Ok(HttpResponse::new(status, Cursor::new(body.into_bytes())))
            }
            Some(Reply::Refused) | None => Err(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

/// Session on a scripted client with token `tok` and default schema `dev`
pub fn session(client: &Arc<ScriptedClient>) -> Session {
    Session::builder()
        .endpoint("http://harper.test:9925")
        .auth_token("tok")
        .schema("dev")
        .http_client(client.clone())
        .build()
        .expect("session builds")
}
