use std::collections::HashMap;

/// HTTP request methods.
///
/// The two methods the route table cares about get their own variants.
/// Any other syntactically valid token is kept verbatim so it can be
/// answered with 404 instead of tearing the connection down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or replace a resource
    POST,
    /// Any other method token, e.g. `PUT` or `DELETE`
    Extension(String),
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Method names are case-sensitive, so `get` is an extension method,
    /// not GET.
    ///
    /// # Returns
    ///
    /// `None` if `s` is empty or contains characters that are not allowed
    /// in a token.
    ///
    /// # Example
    ///
    /// ```
    /// # use wicket::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_token("PUT"), Some(Method::Extension("PUT".into())));
    /// assert_eq!(Method::from_token("G(T"), None);
    /// ```
    pub fn from_token(s: &str) -> Option<Self> {
        if s.is_empty() || !s.bytes().all(is_token_byte) {
            return None;
        }

        Some(match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            other => Method::Extension(other.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::Extension(token) => token,
        }
    }
}

// tchar from RFC 9110 section 5.6.2
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Represents a parsed HTTP request from a client.
///
/// Header names are stored lower-cased; when a header is repeated the last
/// occurrence wins. The body holds exactly `Content-Length` bytes.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target exactly as sent, always starting with `/`
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Request headers keyed by lower-case name
    pub headers: HashMap<String, String>,
    /// Request body, empty when no Content-Length was sent
    pub body: Vec<u8>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring ASCII case.
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Determines whether the connection should remain open after the response.
    ///
    /// HTTP/1.1 connections persist by default. Only a `close` token in the
    /// Connection header (any case) ends the connection.
    pub fn keep_alive(&self) -> bool {
        !self
            .header("Connection")
            .map(|v| v.split(',').any(|token| token.trim().eq_ignore_ascii_case("close")))
            .unwrap_or(false)
    }
}
