use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::http::mime::TEXT_PLAIN;

/// Status codes this server produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 408 Request Timeout
    RequestTimeout,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use gzserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::RequestTimeout => 408,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A response ready to be serialized.
///
/// Headers keep insertion order so the wire output is deterministic.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    /// `None` means nothing follows the blank line, not even Content-Length.
    pub body: Option<Vec<u8>>,
    /// Whether `body` holds gzip output.
    pub gzip: bool,
}

/// Builder for constructing responses in a fluent style.
///
/// # Example
///
/// ```
/// # use gzserve::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-type", "text/plain")
///     .body("pong\n")
///     .gzip(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(response.header("content-encoding"), Some("gzip"));
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    gzip: bool,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
            gzip: false,
        }
    }

    /// Adds a header, replacing any earlier one with the same name (ignoring case).
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Request gzip content-coding for the body. Ignored when there is no body.
    pub fn gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    /// Compresses the body if asked to and fixes up the framing headers.
    ///
    /// Content-Length always describes the bytes that will be sent, so any
    /// value set by the caller is overwritten.
    pub fn build(mut self) -> io::Result<Response> {
        if self.gzip {
            match self.body.take() {
                Some(raw) => {
                    self.body = Some(gzip(&raw)?);
                    set_header(&mut self.headers, "Content-Encoding".into(), "gzip".into());
                }
                None => self.gzip = false,
            }
        }

        Ok(self.finish())
    }

    fn finish(mut self) -> Response {
        match &self.body {
            Some(body) => {
                let length = body.len().to_string();
                set_header(&mut self.headers, "Content-Length".into(), length);
            }
            None => self
                .headers
                .retain(|(k, _)| !k.eq_ignore_ascii_case("Content-Length")),
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
            gzip: self.gzip,
        }
    }
}

impl Response {
    /// An uncompressed `text/plain` response, used for diagnostics.
    pub fn text(status: StatusCode, message: impl Into<String>) -> Self {
        let message: String = message.into();
        ResponseBuilder::new(status)
            .header("Content-type", TEXT_PLAIN)
            .body(message)
            .finish()
    }

    /// Creates a 404 Not Found response naming the missing target.
    pub fn not_found(target: &str) -> Self {
        Self::text(
            StatusCode::NotFound,
            format!("404 Not Found: {target} does not exist\n"),
        )
    }

    pub fn bad_request(reason: &str) -> Self {
        Self::text(StatusCode::BadRequest, format!("400 Bad Request: {reason}\n"))
    }

    pub fn forbidden(target: &str) -> Self {
        Self::text(
            StatusCode::Forbidden,
            format!("403 Forbidden: {target} is outside the content root\n"),
        )
    }

    pub fn request_timeout() -> Self {
        Self::text(StatusCode::RequestTimeout, "408 Request Timeout\n")
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::text(StatusCode::InternalServerError, "500 Internal Server Error\n")
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// gzip-frames `data` at the default compression level.
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn set_header(headers: &mut Vec<(String, String)>, key: String, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
        Some(slot) => *slot = (key, value),
        None => headers.push((key, value)),
    }
}
