use crate::http::request::{Method, Request};
use std::collections::HashMap;

/// Upper bound on the request line plus headers.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Largest Content-Length accepted for a request body.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequest,
    #[error("invalid method token")]
    InvalidMethod,
    #[error("unsupported protocol version")]
    InvalidVersion,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("invalid Content-Length")]
    InvalidContentLength,
    #[error("header section too large")]
    HeadersTooLarge,
    #[error("request body too large")]
    BodyTooLarge,
    #[error("need more bytes")]
    Incomplete,
}

/// Attempts to extract one complete request from the front of `buf`.
///
/// On success returns the request together with the number of bytes it
/// occupied (start line, headers, separator and body). Anything after that
/// belongs to the next request on the connection. `Incomplete` means the
/// caller must keep every byte and retry once more data arrives.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    // Look for header/body separator
    let headers_end = match find_headers_end(buf) {
        Some(pos) if pos > MAX_HEADER_BYTES => return Err(ParseError::HeadersTooLarge),
        Some(pos) => pos,
        None if buf.len() > MAX_HEADER_BYTES + 3 => return Err(ParseError::HeadersTooLarge),
        None => return Err(ParseError::Incomplete),
    };
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str =
        std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line: exactly three tokens separated by single spaces
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let parts: Vec<&str> = request_line.split(' ').collect();
    let (method_str, path, version) = match parts.as_slice() {
        &[method, path, version] => (method, path, version),
        _ => return Err(ParseError::InvalidRequest),
    };

    let method = Method::from_token(method_str).ok_or(ParseError::InvalidMethod)?;

    if !path.starts_with('/') {
        return Err(ParseError::InvalidRequest);
    }
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidVersion);
    }

    // Headers, last occurrence wins
    let mut headers = HashMap::new();

    for line in lines {
        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        headers.insert(key.to_ascii_lowercase(), value.trim().to_string());
    }

    // Body
    let content_length = headers
        .get("content-length")
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength)
        })
        .transpose()?
        .unwrap_or(0);

    if content_length > MAX_BODY_BYTES {
        return Err(ParseError::BodyTooLarge);
    }
    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body = body_bytes[..content_length].to_vec();

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body,
    };

    let total_consumed = headers_end + 4 + content_length;
    Ok((request, total_consumed))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
