use thiserror::Error;
use tokio::io::AsyncRead;

use crate::http::lines::LineReader;
use crate::http::request::{Headers, Request};

/// Default cap on the number of header lines in one request.
pub const DEFAULT_MAX_HEADERS: usize = 100;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request line {0:?}: expected METHOD TARGET VERSION")]
    MalformedRequestLine(String),
    #[error("malformed header line {0:?}: missing ':'")]
    MalformedHeaderLine(String),
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
    #[error("more than {0} header lines")]
    TooManyHeaders(usize),
    #[error("connection closed before end of headers")]
    Incomplete,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// True when the peer sent something we can answer with a 400.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ParseError::MalformedRequestLine(_)
                | ParseError::MalformedHeaderLine(_)
                | ParseError::LineTooLong(_)
                | ParseError::TooManyHeaders(_)
        )
    }
}

/// The three tokens of `METHOD TARGET VERSION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    pub fn with_headers(self, headers: Headers) -> Request {
        Request {
            method: self.method,
            target: self.target,
            version: self.version,
            headers,
        }
    }
}

/// Splits a request line on whitespace. Method and version are not checked.
pub fn parse_request_line(line: &str) -> Result<RequestLine, ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        [method, target, version] => Ok(RequestLine {
            method: method.to_string(),
            target: target.to_string(),
            version: version.to_string(),
        }),
        _ => Err(ParseError::MalformedRequestLine(line.to_string())),
    }
}

/// Splits a header line at its first colon.
///
/// The name is lowercased, the value only has leading whitespace removed.
pub fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::MalformedHeaderLine(line.to_string()))?;

    Ok((name.to_ascii_lowercase(), value.trim_start().to_string()))
}

/// Reads the request line. `Ok(None)` if the peer closed without sending one.
pub async fn read_request_line<R>(
    lines: &mut LineReader<R>,
) -> Result<Option<RequestLine>, ParseError>
where
    R: AsyncRead + Unpin,
{
    match lines.next_line().await? {
        Some(line) => parse_request_line(&line).map(Some),
        None => Ok(None),
    }
}

/// Reads header lines up to and including the blank line that ends the block.
pub async fn read_headers<R>(
    lines: &mut LineReader<R>,
    max_headers: usize,
) -> Result<Headers, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut headers = Headers::new();
    let mut count = 0;

    loop {
        let line = lines.next_line().await?.ok_or(ParseError::Incomplete)?;
        if line.is_empty() {
            return Ok(headers);
        }

        count += 1;
        if count > max_headers {
            return Err(ParseError::TooManyHeaders(max_headers));
        }

        let (name, value) = parse_header_line(&line)?;
        headers.insert(name, value);
    }
}

/// Reads a complete request head: request line plus header block.
pub async fn read_request<R>(
    lines: &mut LineReader<R>,
    max_headers: usize,
) -> Result<Option<Request>, ParseError>
where
    R: AsyncRead + Unpin,
{
    let Some(request_line) = read_request_line(lines).await? else {
        return Ok(None);
    };
    let headers = read_headers(lines, max_headers).await?;

    Ok(Some(request_line.with_headers(headers)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parse_simple_get() {
        let mut lines = LineReader::new(&b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n"[..]);

        let parsed = read_request(&mut lines, DEFAULT_MAX_HEADERS)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(parsed.target, "/");
        assert_eq!(parsed.header("host"), Some("example.com"));
    }
}
