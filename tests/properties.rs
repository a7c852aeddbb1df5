//! Property tests for the escaping channels and the sanitizer.

use proptest::prelude::*;
use regex::Regex;
use std::borrow::Cow;
use texure::escape::{decode_payload, encode_payload, escape_latex, unescape_latex};
use texure::{maybe_sanitize, sanitize};

const ATTACKS: &[&str] = &[
    "<script>alert(1)</script>",
    r#"<img src="javascript:alert(1)" onerror="alert(1)">"#,
    r#"<iframe src="https://evil.test"></iframe>"#,
    r#"<a href="javascript:alert(1)" onclick="go()">link</a>"#,
    r#"<a href="https://ok.test" target="_blank">ok</a>"#,
    r#"<span style="color: red; background: url(javascript:x)">s</span>"#,
    r#"<div style="width: expression(alert(1))">w</div>"#,
    "<style>p { color: red }</style>",
    "&amp; &lt;",
];

const WRAPPERS: &[&str] = &["p", "b", "i", "u", "span", "div", "font", "blockquote", "ul", "li"];

/// Well-formed fragments mixing allowed, unknown and denied markup.
fn fragment() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[a-z ]{0,12}",
        prop::sample::select(ATTACKS).prop_map(str::to_string),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        (
            prop::sample::select(WRAPPERS),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, children)| {
                format!(r#"<{tag} onmouseover="x()">{}</{tag}>"#, children.concat())
            })
    })
}

proptest! {
    #[test]
    fn latex_escape_round_trips(text in any::<String>()) {
        prop_assert_eq!(unescape_latex(&escape_latex(&text)), text);
    }

    #[test]
    fn escaped_latex_has_no_bare_specials(text in "[a-z{}$&#%_^~\\\\ ]{0,24}") {
        let escaped = escape_latex(&text);
        let bare = Regex::new(r"(^|[^\\])[$&#%_]").unwrap();
        prop_assert!(!bare.is_match(&escaped));
    }

    #[test]
    fn payload_round_trips(text in any::<String>()) {
        let encoded = encode_payload(&text);
        prop_assert!(!encoded.contains(['"', '<', '>', '&', ' ']));
        prop_assert_eq!(decode_payload(&encoded), text);
    }

    #[test]
    fn sanitize_is_idempotent(markup in fragment()) {
        let once = sanitize(&markup);
        prop_assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn sanitize_removes_script_vectors(markup in fragment()) {
        let clean = sanitize(&markup).to_ascii_lowercase();
        let handler = Regex::new(r"\son[a-z]+=").unwrap();
        prop_assert!(!clean.contains("<script"));
        prop_assert!(!clean.contains("<iframe"));
        prop_assert!(!clean.contains("<style"));
        prop_assert!(!clean.contains("javascript:"));
        prop_assert!(!clean.contains("expression("));
        prop_assert!(!handler.is_match(&clean));
    }

    #[test]
    fn benign_markup_skips_sanitizer(words in prop::collection::vec("[a-z ]{1,16}", 1..5)) {
        let markup: String = words.iter().map(|w| format!("<p>{}</p>", w)).collect();
        prop_assert!(matches!(maybe_sanitize(&markup), Cow::Borrowed(_)));
    }

    #[test]
    fn gated_output_is_clean(markup in fragment()) {
        let gated = maybe_sanitize(&markup);
        prop_assert!(!gated.to_ascii_lowercase().contains("<script"));
        prop_assert!(!gated.contains("onmouseover"));
    }
}
