use gzserve::http::lines::LineReader;
use gzserve::http::parser::{
    ParseError, parse_header_line, parse_request_line, read_headers, read_request,
};

const MAX_HEADERS: usize = 100;

async fn parse(raw: &[u8]) -> Result<Option<gzserve::http::request::Request>, ParseError> {
    let mut lines = LineReader::new(raw);
    read_request(&mut lines, MAX_HEADERS).await
}

#[tokio::test]
async fn test_parse_simple_get_request() {
    let parsed = parse(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(parsed.method, "GET");
    assert_eq!(parsed.target, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.header("host"), Some("example.com"));
}

#[tokio::test]
async fn test_parse_request_without_headers() {
    let parsed = parse(b"GET /ping HTTP/1.1\r\n\r\n").await.unwrap().unwrap();

    assert_eq!(parsed.target, "/ping");
    assert!(parsed.headers.is_empty());
}

#[test]
fn test_request_line_split_on_any_whitespace() {
    let line = parse_request_line("BREW\t/pot  HTCPCP/1.0").unwrap();

    assert_eq!(line.method, "BREW");
    assert_eq!(line.target, "/pot");
    assert_eq!(line.version, "HTCPCP/1.0");
}

#[test]
fn test_request_line_tokens_are_opaque() {
    let line = parse_request_line("get relative-target whatever").unwrap();

    assert_eq!(line.method, "get");
    assert_eq!(line.target, "relative-target");
    assert_eq!(line.version, "whatever");
}

#[test]
fn test_request_line_wrong_token_count() {
    for line in ["", "GET", "GET /", "GET / HTTP/1.1 extra"] {
        let result = parse_request_line(line);
        assert!(
            matches!(result, Err(ParseError::MalformedRequestLine(_))),
            "{line:?} should be rejected"
        );
    }
}

#[test]
fn test_header_name_lowercased_value_left_trimmed() {
    let (name, value) = parse_header_line("Content-Type:   text/html  ").unwrap();

    assert_eq!(name, "content-type");
    assert_eq!(value, "text/html  ");
}

#[test]
fn test_header_split_at_first_colon() {
    let (name, value) = parse_header_line("Host: localhost:8080").unwrap();

    assert_eq!(name, "host");
    assert_eq!(value, "localhost:8080");
}

#[test]
fn test_header_with_empty_value() {
    let (name, value) = parse_header_line("X-Empty:").unwrap();

    assert_eq!(name, "x-empty");
    assert_eq!(value, "");
}

#[test]
fn test_parse_malformed_header() {
    let result = parse_header_line("BrokenHeader");

    assert!(matches!(result, Err(ParseError::MalformedHeaderLine(_))));
}

#[tokio::test]
async fn test_parse_multiple_headers() {
    let raw = b"GET /path HTTP/1.1\r\n\
        Host: example.com\r\n\
        User-Agent: test-client\r\n\
        Accept: */*\r\n\r\n";
    let parsed = parse(raw).await.unwrap().unwrap();

    assert_eq!(parsed.headers.len(), 3);
    assert_eq!(parsed.header("host"), Some("example.com"));
    assert_eq!(parsed.header("user-agent"), Some("test-client"));
    assert_eq!(parsed.header("accept"), Some("*/*"));
}

#[tokio::test]
async fn test_duplicate_headers_keep_last_value() {
    let parsed = parse(b"GET / HTTP/1.1\r\nX-Tag: one\r\nx-tag: two\r\nX-TAG: three\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(parsed.headers.len(), 1);
    assert_eq!(parsed.header("x-tag"), Some("three"));
}

#[tokio::test]
async fn test_headers_stop_at_blank_line() {
    let mut lines = LineReader::new(&b"A: 1\r\n\r\nGET /next HTTP/1.1\r\n"[..]);

    let headers = read_headers(&mut lines, MAX_HEADERS).await.unwrap();
    assert_eq!(headers.len(), 1);

    // The blank line was consumed, nothing after it was.
    let next = lines.next_line().await.unwrap();
    assert_eq!(next.as_deref(), Some("GET /next HTTP/1.1"));
}

#[tokio::test]
async fn test_parse_malformed_request_line() {
    let result = parse(b"GARBAGE\r\n\r\n").await;

    assert!(matches!(result, Err(ParseError::MalformedRequestLine(_))));
}

#[tokio::test]
async fn test_parse_malformed_header_in_block() {
    let result = parse(b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n").await;

    assert!(matches!(result, Err(ParseError::MalformedHeaderLine(_))));
}

#[tokio::test]
async fn test_closed_before_request_line() {
    assert!(parse(b"").await.unwrap().is_none());
    assert!(parse(b"GET / HTTP/1.1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_closed_before_end_of_headers() {
    let result = parse(b"GET / HTTP/1.1\r\nHost: example.com\r\n").await;

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[tokio::test]
async fn test_too_many_headers() {
    let mut raw = b"GET / HTTP/1.1\r\n".to_vec();
    for i in 0..5 {
        raw.extend_from_slice(format!("X-{i}: v\r\n").as_bytes());
    }
    raw.extend_from_slice(b"\r\n");

    let mut lines = LineReader::new(&raw[..]);
    let result = read_request(&mut lines, 4).await;

    assert!(matches!(result, Err(ParseError::TooManyHeaders(4))));
}

#[test]
fn test_client_error_classification() {
    assert!(ParseError::MalformedRequestLine(String::new()).is_client_error());
    assert!(ParseError::MalformedHeaderLine(String::new()).is_client_error());
    assert!(ParseError::LineTooLong(1).is_client_error());
    assert!(ParseError::TooManyHeaders(1).is_client_error());
    assert!(!ParseError::Incomplete.is_client_error());
    assert!(!ParseError::Io(std::io::Error::other("reset")).is_client_error());
}
