//! Scripted transport for unit tests.

use std::sync::{Arc, Mutex};

use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Shared record of every request a `FakeTransport` saw.
#[derive(Clone, Default)]
pub(crate) struct RequestLog(Arc<Mutex<Vec<HttpRequest>>>);

impl RequestLog {
    pub(crate) fn all(&self) -> Vec<HttpRequest> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: HttpMethod, url_suffix: &str) -> usize {
        self.all()
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(url_suffix))
            .count()
    }
}

pub(crate) struct FakeTransport {
    handler: Box<Handler>,
    log: RequestLog,
}

impl FakeTransport {
    pub(crate) fn new<F>(handler: F) -> (Self, RequestLog)
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        let log = RequestLog::default();
        let transport = Self {
            handler: Box::new(handler),
            log: log.clone(),
        };
        (transport, log)
    }
}

impl Transport for FakeTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.0.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }
}

/// Strip the test base URL so handlers can match on the path alone.
pub(crate) fn path_of(request: &HttpRequest) -> &str {
    request
        .url
        .strip_prefix("http://localhost:8000")
        .unwrap_or(&request.url)
}
