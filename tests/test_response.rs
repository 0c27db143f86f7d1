use std::io::Read;

use flate2::read::GzDecoder;
use gzserve::http::response::{Response, ResponseBuilder, StatusCode, gzip};
use gzserve::http::writer::serialize_response;

fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

fn split_head(wire: &[u8]) -> (String, Vec<u8>) {
    let end = wire.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
    (
        String::from_utf8(wire[..end].to_vec()).unwrap(),
        wire[end + 4..].to_vec(),
    )
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::RequestTimeout.as_u16(), 408);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::Forbidden.reason_phrase(), "Forbidden");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(StatusCode::RequestTimeout.reason_phrase(), "Request Timeout");
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(body.clone())
        .build()
        .unwrap();

    assert_eq!(response.header("Content-Length"), Some("16"));
    assert_eq!(response.body, Some(body));
    assert!(!response.gzip);
}

#[test]
fn test_response_builder_overrides_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("content-length", "999")
        .body(b"test".to_vec())
        .build()
        .unwrap();

    assert_eq!(response.header("Content-Length"), Some("4"));
    assert_eq!(response.headers.len(), 1);
}

#[test]
fn test_response_without_body_has_no_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "10")
        .gzip(true)
        .build()
        .unwrap();

    assert_eq!(response.body, None);
    assert_eq!(response.header("Content-Length"), None);
    assert_eq!(response.header("Content-Encoding"), None);
    assert!(!response.gzip);

    let wire = serialize_response(&response);
    assert_eq!(wire, b"HTTP/1.1 200 OK\r\n\r\n".to_vec());
}

#[test]
fn test_empty_body_still_gets_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(Vec::new())
        .build()
        .unwrap();

    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn test_gzip_body_and_headers() {
    let original = b"hello hello hello hello hello".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-type", "text/plain")
        .body(original.clone())
        .gzip(true)
        .build()
        .unwrap();

    let body = response.body.clone().unwrap();
    assert!(response.gzip);
    assert_eq!(response.header("Content-Encoding"), Some("gzip"));
    assert_eq!(response.header("Content-Length"), Some(body.len().to_string().as_str()));
    assert_eq!(&body[..2], &[0x1f, 0x8b]);
    assert_eq!(gunzip(&body), original);
}

#[test]
fn test_gzip_round_trip() {
    let data: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();

    assert_eq!(gunzip(&gzip(&data).unwrap()), data);
    assert_eq!(gunzip(&gzip(b"").unwrap()), b"");
}

#[test]
fn test_header_replacement_is_case_insensitive() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("X-Custom", "one")
        .header("x-custom", "two")
        .build()
        .unwrap();

    assert_eq!(response.headers, vec![("x-custom".to_string(), "two".to_string())]);
}

#[test]
fn test_serialize_wire_format() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-type", "text/plain")
        .body("pong\n")
        .build()
        .unwrap();

    let wire = serialize_response(&response);
    assert_eq!(
        wire,
        b"HTTP/1.1 200 OK\r\nContent-type: text/plain\r\nContent-Length: 5\r\n\r\npong\n".to_vec()
    );
}

#[test]
fn test_serialized_content_length_matches_body() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(vec![7u8; 4096])
        .gzip(true)
        .build()
        .unwrap();

    let (head, body) = split_head(&serialize_response(&response));
    let declared: usize = head
        .lines()
        .find_map(|l| l.strip_prefix("Content-Length: "))
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(declared, body.len());
    assert_eq!(gunzip(&body), vec![7u8; 4096]);
}

#[test]
fn test_response_not_found_helper() {
    let response = Response::not_found("/missing.txt");

    assert_eq!(response.status, StatusCode::NotFound);
    assert!(!response.gzip);
    assert_eq!(response.header("Content-type"), Some("text/plain"));
    let body = String::from_utf8(response.body.unwrap()).unwrap();
    assert!(body.contains("/missing.txt"));
}

#[test]
fn test_response_error_helpers() {
    assert_eq!(Response::bad_request("x").status, StatusCode::BadRequest);
    assert_eq!(Response::forbidden("/..").status, StatusCode::Forbidden);
    assert_eq!(Response::request_timeout().status, StatusCode::RequestTimeout);

    let response = Response::internal_error();
    assert_eq!(response.status, StatusCode::InternalServerError);
    assert_eq!(response.body, Some(b"500 Internal Server Error\n".to_vec()));
}
