//! In-memory transport for tests.
//!
//! [`RecordingTransport`] captures every request it receives and answers with a
//! fixed response. Downstream crates use it to exercise their service trees
//! without a network.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{PapiError, Request, Response, Transport};

/// A [`Transport`] that records requests and returns a canned response.
#[derive(Debug)]
pub struct RecordingTransport {
    requests: Mutex<Vec<Request>>,
    response: Response,
}

impl RecordingTransport {
    /// Creates a transport answering every request with `200` and an empty body.
    pub fn new() -> Self {
        Self::with_response(Response::new(200, ""))
    }

    /// Creates a transport answering every request with `response`.
    pub fn with_response(response: Response) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            response,
        }
    }

    /// Returns a copy of every request received so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn perform(&self, request: Request) -> Result<Response, PapiError> {
        self.requests.lock().push(request);
        Ok(self.response.clone())
    }
}
