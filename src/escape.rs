//! Escaping tables shared by both transforms.
//!
//! Three independent channels live here:
//!
//! - LaTeX special characters in running text ([`escape_latex`] /
//!   [`unescape_latex`]).
//! - HTML text and attribute escaping for generated markup.
//! - Percent-encoding of widget payloads ([`encode_payload`] /
//!   [`decode_payload`]), the only channel through which math and code
//!   payloads travel inside attributes.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Characters left untouched by payload encoding, mirroring the browser's
/// `encodeURIComponent` so payloads written by either side decode the same.
const PAYLOAD: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static LATEX_ESCAPE_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(?:textbackslash\{\}|textasciicircum\{\}|textasciitilde\{\}|[{}$&#%_])")
        .expect("static pattern")
});

/// Escape LaTeX special characters in running text.
///
/// Each character is mapped exactly once, so the braces of
/// `\textbackslash{}` are never escaped a second time.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '$' => out.push_str(r"\$"),
            '&' => out.push_str(r"\&"),
            '#' => out.push_str(r"\#"),
            '%' => out.push_str(r"\%"),
            '_' => out.push_str(r"\_"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            other => out.push(other),
        }
    }
    out
}

/// Inverse of [`escape_latex`]. Sequences are recognized left to right in a
/// single pass.
pub fn unescape_latex(text: &str) -> String {
    LATEX_ESCAPE_SEQUENCE
        .replace_all(text, |caps: &Captures| {
            let seq = &caps[0];
            match seq {
                r"\textbackslash{}" => "\\".to_string(),
                r"\textasciicircum{}" => "^".to_string(),
                r"\textasciitilde{}" => "~".to_string(),
                _ => seq[1..].to_string(),
            }
        })
        .into_owned()
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Inverse of [`escape_html`]. `&amp;` is decoded last so `&amp;lt;` stays
/// `&lt;`.
pub fn unescape_html(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

/// Escape a value for a double-quoted HTML attribute.
pub fn escape_attr(s: &str) -> String {
    escape_html(s).replace('\'', "&#39;")
}

/// Percent-encode a widget payload.
pub fn encode_payload(raw: &str) -> String {
    utf8_percent_encode(raw, PAYLOAD).to_string()
}

/// Decode a widget payload. Malformed sequences degrade to replacement
/// characters instead of failing.
pub fn decode_payload(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// Remove the zero-width characters the editing surface uses as caret
/// anchors.
pub fn strip_zero_width(text: &str) -> Cow<'_, str> {
    if text.contains(['\u{200B}', '\u{FEFF}']) {
        Cow::Owned(text.replace(['\u{200B}', '\u{FEFF}'], ""))
    } else {
        Cow::Borrowed(text)
    }
}
