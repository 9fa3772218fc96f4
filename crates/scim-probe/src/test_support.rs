//! A hand-rolled [`HttpTransport`] test double.
//!
//! Each `(METHOD, path)` pair gets its own FIFO queue of canned responses;
//! a call against a path with nothing queued gets a bare 404. This is
//! enough to script every lifecycle this crate drives without standing up
//! a real HTTP server.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use scim_transport::{Headers, HttpResponse, HttpTransport, TransportError};
use serde_json::Value;

pub(crate) struct MockTransport {
    queues: Mutex<HashMap<(&'static str, String), VecDeque<HttpResponse>>>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn stub(&self, method: &'static str, path: impl Into<String>, response: HttpResponse) {
        self.queues
            .lock()
            .unwrap()
            .entry((method, path.into()))
            .or_default()
            .push_back(response);
    }

    pub(crate) fn stub_get(&self, path: impl Into<String>, response: HttpResponse) {
        self.stub("GET", path, response);
    }

    pub(crate) fn stub_post(&self, path: impl Into<String>, response: HttpResponse) {
        self.stub("POST", path, response);
    }

    pub(crate) fn stub_put(&self, path: impl Into<String>, response: HttpResponse) {
        self.stub("PUT", path, response);
    }

    pub(crate) fn stub_patch(&self, path: impl Into<String>, response: HttpResponse) {
        self.stub("PATCH", path, response);
    }

    pub(crate) fn stub_delete(&self, path: impl Into<String>, response: HttpResponse) {
        self.stub("DELETE", path, response);
    }

    pub(crate) fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn take(&self, method: &'static str, path: &str) -> HttpResponse {
        self.calls.lock().unwrap().push((method, path.to_string()));
        self.queues
            .lock()
            .unwrap()
            .get_mut(&(method, path.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| HttpResponse::new(404, Headers::new(), None))
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        Ok(self.take("GET", path))
    }

    async fn post(
        &self,
        path: &str,
        _payload: &Value,
        _extra_headers: Option<Headers>,
    ) -> Result<HttpResponse, TransportError> {
        Ok(self.take("POST", path))
    }

    async fn put(&self, path: &str, _payload: &Value) -> Result<HttpResponse, TransportError> {
        Ok(self.take("PUT", path))
    }

    async fn patch(&self, path: &str, _payload: &Value) -> Result<HttpResponse, TransportError> {
        Ok(self.take("PATCH", path))
    }

    async fn delete(&self, path: &str) -> Result<HttpResponse, TransportError> {
        Ok(self.take("DELETE", path))
    }
}
