//! Route table and dispatch.
//!
//! Routes are a fixed, ordered list of `(method, pattern, handler)` entries.
//! The first entry whose method and pattern both match wins; a request that
//! matches nothing goes to [`Handler::NotFound`].
//!
//! Patterns match the raw request target byte for byte. A capture takes
//! everything after its literal prefix up to the end of the target and may
//! not contain `/`. No percent-decoding happens anywhere.

pub mod handlers;

use std::sync::Arc;

use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::store::FileStore;

/// The handler a route resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Root,
    Echo,
    UserAgent,
    FileGet,
    FilePost,
    NotFound,
}

#[derive(Debug, Clone, Copy)]
pub enum Pattern {
    /// Matches only this exact target.
    Exact(&'static str),
    /// Matches `prefix{capture}` where the capture holds no `/`.
    Capture(&'static str),
}

impl Pattern {
    /// Returns the captured segment (empty for exact patterns) on a match.
    pub fn matches<'a>(&self, path: &'a str) -> Option<&'a str> {
        match *self {
            Pattern::Exact(literal) => (path == literal).then_some(""),
            Pattern::Capture(prefix) => path
                .strip_prefix(prefix)
                .filter(|rest| !rest.contains('/')),
        }
    }
}

#[derive(Debug)]
pub struct RouteEntry {
    pub method: &'static str,
    pub pattern: Pattern,
    pub handler: Handler,
}

pub const ROUTES: &[RouteEntry] = &[
    RouteEntry {
        method: "GET",
        pattern: Pattern::Exact("/"),
        handler: Handler::Root,
    },
    RouteEntry {
        method: "GET",
        pattern: Pattern::Capture("/echo/"),
        handler: Handler::Echo,
    },
    RouteEntry {
        method: "GET",
        pattern: Pattern::Exact("/user-agent"),
        handler: Handler::UserAgent,
    },
    RouteEntry {
        method: "GET",
        pattern: Pattern::Capture("/files/"),
        handler: Handler::FileGet,
    },
    RouteEntry {
        method: "POST",
        pattern: Pattern::Capture("/files/"),
        handler: Handler::FilePost,
    },
];

/// Looks up the handler for a method and target, with its captured segment.
pub fn resolve<'a>(method: &Method, path: &'a str) -> (Handler, &'a str) {
    ROUTES
        .iter()
        .filter(|route| route.method == method.as_str())
        .find_map(|route| route.pattern.matches(path).map(|cap| (route.handler, cap)))
        .unwrap_or((Handler::NotFound, ""))
}

/// Resolves requests and runs their handlers against the shared file store.
#[derive(Clone)]
pub struct Router {
    store: Arc<FileStore>,
}

impl Router {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }

    pub async fn dispatch(&self, req: &Request) -> Response {
        let (handler, capture) = resolve(&req.method, &req.path);

        let response = match handler {
            Handler::Root => handlers::root(),
            Handler::Echo => handlers::echo(capture),
            Handler::UserAgent => handlers::user_agent(req),
            Handler::FileGet => handlers::file_get(&self.store, capture).await,
            Handler::FilePost => handlers::file_post(&self.store, capture, &req.body).await,
            Handler::NotFound => handlers::not_found(),
        };

        tracing::debug!(
            method = req.method.as_str(),
            path = %req.path,
            handler = ?handler,
            status = response.status.as_u16(),
            "Request handled"
        );

        response
    }
}
