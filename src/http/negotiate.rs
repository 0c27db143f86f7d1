//! `Accept-Encoding` negotiation between gzip and the identity coding.
//!
//! The client's header is turned into a coding → quality table, defaults are
//! filled in from the `*` entry and for `identity`, and gzip is chosen when
//! its weight is at least that of identity. Ties go to gzip.

use std::collections::HashMap;

use crate::http::request::Headers;

/// Quality assumed when a coding carries no (usable) `q` parameter.
pub const DEFAULT_QUALITY: f32 = 1.0;

const WILDCARD: &str = "*";
const IDENTITY: &str = "identity";
const GZIP: &str = "gzip";

// Codings that inherit the wildcard quality when not listed explicitly.
const WILDCARD_CODINGS: [&str; 4] = ["gzip", "compress", "deflate", "identity"];

/// Client preferences parsed from an `Accept-Encoding` value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodingPreference {
    qualities: HashMap<String, f32>,
}

impl EncodingPreference {
    /// Parses a header value. Never fails: tokens that make no sense are
    /// skipped and unusable quality values fall back to [`DEFAULT_QUALITY`].
    pub fn parse(value: &str) -> Self {
        let mut qualities = HashMap::new();

        for token in value.split(',') {
            if let Some((coding, quality)) = parse_token(token.trim()) {
                qualities.insert(coding, quality);
            }
        }

        if let Some(&wildcard) = qualities.get(WILDCARD) {
            for coding in WILDCARD_CODINGS {
                qualities.entry(coding.to_string()).or_insert(wildcard);
            }
        }
        qualities
            .entry(IDENTITY.to_string())
            .or_insert(DEFAULT_QUALITY);

        Self { qualities }
    }

    /// `None` when the request has no `Accept-Encoding` header at all.
    pub fn from_headers(headers: &Headers) -> Option<Self> {
        headers.get("accept-encoding").map(Self::parse)
    }

    /// The weight assigned to `coding`, after defaulting.
    pub fn quality(&self, coding: &str) -> Option<f32> {
        self.qualities.get(&coding.to_ascii_lowercase()).copied()
    }

    pub fn accepts(&self, coding: &str) -> bool {
        self.quality(coding).is_some_and(|q| q > 0.0)
    }

    /// gzip wins when its weight is >= identity's. An unlisted gzip weighs 0.
    pub fn prefers_gzip(&self) -> bool {
        let gzip = self.quality(GZIP).unwrap_or(0.0);
        let identity = self.quality(IDENTITY).unwrap_or(DEFAULT_QUALITY);
        gzip >= identity
    }
}

/// Whether the response to a request with these headers should be gzipped.
pub fn prefers_compressed(headers: &Headers) -> bool {
    EncodingPreference::from_headers(headers).is_some_and(|pref| pref.prefers_gzip())
}

// coding[;q=quality]. Codings are alphabetic, '*' or empty; anything else is
// dropped. Parameters other than q are ignored.
fn parse_token(token: &str) -> Option<(String, f32)> {
    let mut params = token.split(';');
    let coding = params.next().unwrap_or_default().trim().to_ascii_lowercase();

    if coding != WILDCARD && !coding.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut quality = DEFAULT_QUALITY;
    for param in params {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("q") {
                quality = parse_quality(value.trim()).unwrap_or(DEFAULT_QUALITY);
            }
        }
    }

    Some((coding, quality))
}

// qvalue = ( "0" [ "." 0*3DIGIT ] ) / ( "1" [ "." 0*3("0") ] )
fn parse_quality(raw: &str) -> Option<f32> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));

    let well_formed = matches!(whole, "0" | "1")
        && fraction.len() <= 3
        && fraction.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return None;
    }

    let fraction_value = if fraction.is_empty() {
        0.0
    } else {
        fraction.parse::<u16>().ok()? as f32 / 10f32.powi(fraction.len() as i32)
    };
    let quality = (if whole == "1" { 1.0 } else { 0.0 }) + fraction_value;

    (quality <= 1.0).then_some(quality)
}
