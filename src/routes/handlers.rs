//! One function per route family.
//!
//! Handlers never fail: storage problems are turned into status codes here.

use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::store::{FileStore, StoreError};

pub fn root() -> Response {
    Response::empty(StatusCode::Ok)
}

pub fn echo(text: &str) -> Response {
    Response::text(text)
}

/// Reflects the User-Agent header, or an empty body when it is missing.
pub fn user_agent(req: &Request) -> Response {
    Response::text(req.header("User-Agent").unwrap_or_default())
}

pub async fn file_get(store: &FileStore, name: &str) -> Response {
    match store.read(name).await {
        Ok(contents) => Response::octet_stream(contents),
        Err(e) => {
            if !e.is_not_found() {
                tracing::debug!(file = name, error = %e, "File not served");
            }
            Response::not_found()
        }
    }
}

pub async fn file_post(store: &FileStore, name: &str, body: &[u8]) -> Response {
    match store.write(name, body).await {
        Ok(()) => {
            tracing::debug!(file = name, bytes = body.len(), "File written");
            Response::created()
        }
        Err(StoreError::InvalidName(_)) => Response::not_found(),
        Err(e) => {
            tracing::warn!(file = name, error = %e, "Failed to write file");
            Response::internal_error()
        }
    }
}

pub fn not_found() -> Response {
    Response::not_found()
}
