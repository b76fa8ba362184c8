//! Sanitization of captured path segments before substitution.
//!
//! Captured text comes straight from the request line, so it can carry
//! markup or raw bytes that would change how a client interprets the
//! `Location` header. The policy: drop complete `<…>` spans, then
//! percent-encode control bytes, a small set of markup-significant ASCII
//! bytes, and every non-ASCII byte. Safe punctuation (`/`, `.`, `-`, `_`,
//! `%`, …) passes through untouched so ordinary path segments survive
//! verbatim.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// ASCII bytes that are percent-encoded in sanitized captures, on top of
/// the control range. Non-ASCII bytes are always encoded as UTF-8.
const CAPTURE_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// Sanitize one captured value for use in a destination URL.
pub(crate) fn sanitize_capture(value: &str) -> String {
    let stripped = strip_markup(value);
    utf8_percent_encode(&stripped, CAPTURE_ESCAPE).to_string()
}

/// Remove every complete `<…>` span.
///
/// Scanning resumes after each removed span, so adjacent spans
/// (`</span></a>`) all go in one pass. A `<` with no closing `>` is kept;
/// it gets percent-encoded afterwards instead.
fn strip_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push('<');
                rest = &rest[open + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
