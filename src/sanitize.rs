//! Allow-list sanitizer for markup entering the editable surface.
//!
//! Markup is parsed into a detached tree, cleaned and re-serialized. Denied
//! tags are removed with their subtree, unknown tags are unwrapped, and
//! every surviving attribute and style declaration passes an allow-list.
//! Parse, clean and serialize repeat until the output stops changing, so
//! sanitizing sanitized markup is the identity.

use crate::ast::{style_declarations, Element, Node};
use crate::markup;
use crate::render::html::vocab;
use crate::style::is_safe_style_length;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Upper bound on clean passes; real inputs settle after one or two.
const MAX_PASSES: usize = 4;

/// Removed together with their content.
const DENIED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "frame", "frameset", "noscript", "template",
    "base", "link", "meta",
];

const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "b", "strong", "i", "em", "u", "span", "div", "p", "ul", "ol", "li",
    "a", "img", "pre", "code", "br", "input", "textarea", "select", "option", "blockquote",
    // MathML presentation markup produced by math typesetters.
    "math", "mrow", "mi", "mo", "mn", "mfrac", "msqrt", "mroot", "mstyle", "mspace", "mtd",
    "mtable", "mtr", "msup", "msub", "msubsup", "munderover", "munder", "mover", "mfenced",
    "semantics", "annotation", "mpadded", "menclose", "mglyph", "merror", "mlabeledtr",
];

const GLOBAL_ATTRS: &[&str] = &[
    "class",
    "style",
    "contenteditable",
    vocab::ATTR_MATH,
    vocab::ATTR_LATEX_COMMAND,
    vocab::ATTR_CODE_LANG,
    vocab::ATTR_CODE,
    vocab::ATTR_IMAGE_ID,
    vocab::ATTR_IMG_WIDTH,
    vocab::ATTR_IMG_ANGLE,
    vocab::ATTR_IMG_X,
    vocab::ATTR_IMG_Y,
    "title",
    "aria-hidden",
    "role",
];

/// Attributes allowed on top of [`GLOBAL_ATTRS`].
fn tag_attrs(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "target", "rel"],
        "img" => &["src", "alt"],
        "input" => &["type", "disabled", "value"],
        "textarea" | "select" => &["value"],
        "option" => &["value", "selected"],
        "math" => &["xmlns", "display", "overflow"],
        "mrow" => &["displaystyle", "scriptlevel"],
        "mi" => &["mathvariant", "mathsize"],
        "mo" => &["stretchy", "fence", "separator", "lspace", "rspace", "accent"],
        "mfrac" => &["linethickness"],
        "mstyle" => &["displaystyle", "scriptlevel", "mathvariant", "mathsize"],
        "mspace" => &["width", "height", "depth"],
        "mtd" => &["rowspan", "columnspan"],
        "mtable" => &["rowspacing", "columnspacing"],
        "mfenced" => &["open", "close", "separators"],
        "annotation" => &["encoding"],
        _ => &[],
    }
}

const BASE_STYLES: &[&str] = &[
    "color",
    "background-color",
    "text-align",
    "font-family",
    "font-size",
    "width",
    "height",
    "max-width",
    "margin-left",
    "margin-right",
    "padding-left",
    "padding-right",
    "text-indent",
];

/// Base properties that must hold a plain length.
const BASE_LENGTH_STYLES: &[&str] = &[
    "width",
    "height",
    "margin-left",
    "margin-right",
    "padding-left",
    "padding-right",
    "text-indent",
];

/// Layout properties a rendered formula needs, all lengths. Only allowed
/// inside a math-rendering subtree.
const MATH_LENGTH_STYLES: &[&str] = &[
    "height",
    "width",
    "min-width",
    "vertical-align",
    "top",
    "bottom",
    "margin-left",
    "margin-right",
    "margin-top",
    "margin-bottom",
    "padding-left",
    "border-bottom-width",
    "border-width",
];

static SCRIPTED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[<>]|url\s*\(|expression\s*\(|javascript:").expect("static pattern")
});
static SAFE_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?:|mailto:|tel:|#|/|\.{1,2}/|[a-z0-9][^:\s]*$)").expect("static pattern")
});
static SAFE_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?:|blob:|/|\.{1,2}/|data:image/(?:png|jpeg|jpg|gif|webp|svg\+xml);|[a-z0-9][^:\s]*$)",
    )
    .expect("static pattern")
});
static SUSPICIOUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"<(?:script|style|iframe|object|embed|frame|form|base|link|meta|svg|math|template|noscript)",
        r"|on[a-z]+=|javascript:|vbscript:|data:text/html|srcdoc|expression\(|url\(|@import|&[#a-z]",
    ))
    .expect("static pattern")
});

/// Sanitize markup for the editable surface.
#[tracing::instrument(skip_all, fields(len = markup.len()))]
pub fn sanitize(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }
    let mut current = clean_pass(markup);
    for _ in 1..MAX_PASSES {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Sanitize only when the markup carries a suspicious signature; benign
/// markup is returned untouched.
pub fn maybe_sanitize(markup: &str) -> Cow<'_, str> {
    if looks_suspicious(markup) {
        debug!("suspicious markup, running full sanitizer");
        Cow::Owned(sanitize(markup))
    } else {
        Cow::Borrowed(markup)
    }
}

/// Signature test on a lower-cased copy without ASCII whitespace or control
/// characters, so split keywords like `java\tscript:` are still caught. Any
/// character reference counts: decoded `&Tab;` or `&NewLine;` split a scheme
/// the same way.
pub fn looks_suspicious(markup: &str) -> bool {
    let normalized: String = markup
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .flat_map(char::to_lowercase)
        .collect();
    SUSPICIOUS.is_match(&normalized)
}

fn clean_pass(markup: &str) -> String {
    markup::serialize(&clean_nodes(markup::parse(markup), false))
}

fn clean_nodes(nodes: Vec<Node>, in_math: bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(el) => {
                let tag = el.tag.to_ascii_lowercase();
                if DENIED_TAGS.contains(&tag.as_str()) {
                    trace!(tag = %tag, "removed denied element");
                } else if !ALLOWED_TAGS.contains(&tag.as_str()) {
                    trace!(tag = %tag, "unwrapped element");
                    out.extend(clean_nodes(el.children, in_math));
                } else {
                    out.push(Node::Element(clean_element(el, tag, in_math)));
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn clean_element(el: Element, tag: String, in_math: bool) -> Element {
    let in_math = in_math || el.has_class(vocab::CLASS_MATH_RENDER);
    let extra = tag_attrs(&tag);
    let mut attrs = Vec::with_capacity(el.attrs.len());
    for (name, value) in el.attrs {
        let name = name.to_ascii_lowercase();
        if let Some(value) = clean_attr(&name, value, extra, in_math) {
            attrs.push((name, value));
        } else {
            trace!(tag = %tag, attr = %name, "dropped attribute");
        }
    }
    if tag == "a" && attrs.iter().any(|(k, v)| k == "target" && v == "_blank") {
        attrs.push(("rel".to_string(), "noopener noreferrer".to_string()));
    }
    Element {
        children: clean_nodes(el.children, in_math),
        tag,
        attrs,
    }
}

fn clean_attr(name: &str, value: String, extra: &[&str], in_math: bool) -> Option<String> {
    if name.starts_with("on") || !(GLOBAL_ATTRS.contains(&name) || extra.contains(&name)) {
        return None;
    }
    match name {
        "href" => SAFE_HREF.is_match(value.trim()).then_some(value),
        "src" => SAFE_SRC.is_match(value.trim()).then_some(value),
        "style" => {
            let style = clean_style(&value, in_math);
            (!style.is_empty()).then_some(style)
        }
        "target" => (value == "_blank").then_some(value),
        // Re-derived from `target`; an inbound value is never kept.
        "rel" => None,
        "contenteditable" => Some("false".to_string()),
        _ => Some(value),
    }
}

/// Filter a `style` attribute to the allowed properties and safe values.
pub fn clean_style(style: &str, in_math: bool) -> String {
    style_declarations(style)
        .filter(|(prop, value)| style_allowed(prop, value, in_math))
        .map(|(prop, value)| format!("{}: {}", prop, value))
        .collect::<Vec<_>>()
        .join("; ")
}

fn style_allowed(prop: &str, value: &str, in_math: bool) -> bool {
    if SCRIPTED_VALUE.is_match(value) {
        return false;
    }
    if in_math {
        if MATH_LENGTH_STYLES.contains(&prop) {
            return is_safe_style_length(value);
        }
        if prop == "border-style" {
            return value.eq_ignore_ascii_case("solid");
        }
    } else if BASE_LENGTH_STYLES.contains(&prop) {
        return is_safe_style_length(value);
    }
    BASE_STYLES.contains(&prop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_denied_tags_are_removed() {
        assert_eq!(sanitize("<p>a<script>alert(1)</script>b</p>"), "<p>ab</p>");
        assert_eq!(sanitize("<style>p{}</style><p>x</p>"), "<p>x</p>");
        assert_eq!(sanitize(r#"<div><iframe src="https://x.test"></iframe>ok</div>"#), "<div>ok</div>");
    }

    #[test]
    fn test_unknown_tags_are_unwrapped() {
        assert_eq!(sanitize("<section><b>x</b> <font>y</font></section>"), "<b>x</b> y");
    }

    #[test]
    fn test_event_handlers_and_script_urls() {
        assert_eq!(
            sanitize(r#"<a href="javascript:alert(1)" onclick="x()">y</a>"#),
            "<a>y</a>"
        );
        assert_eq!(
            sanitize(r#"<a href="jav&#x61;script:alert(1)">y</a>"#),
            "<a>y</a>"
        );
        assert_eq!(
            sanitize(r#"<a href="docs/page.html">y</a>"#),
            r#"<a href="docs/page.html">y</a>"#
        );
    }

    #[test]
    fn test_target_and_rel() {
        assert_eq!(
            sanitize(r#"<a href="https://a.test" target="_blank" rel="opener">x</a>"#),
            r#"<a href="https://a.test" target="_blank" rel="noopener noreferrer">x</a>"#
        );
        assert_eq!(
            sanitize(r#"<a href="https://a.test" target="_top" rel="opener">x</a>"#),
            r#"<a href="https://a.test">x</a>"#
        );
    }

    #[test]
    fn test_contenteditable_forced_false() {
        assert_eq!(
            sanitize(r#"<span contenteditable="true">x</span>"#),
            r#"<span contenteditable="false">x</span>"#
        );
    }

    #[test]
    fn test_style_allow_list() {
        assert_eq!(
            sanitize(r#"<span style="color: red; position: fixed; width: calc(1px); background-color: url(x)">t</span>"#),
            r#"<span style="color: red">t</span>"#
        );
        assert_eq!(sanitize(r#"<span style="position: fixed">t</span>"#), "<span>t</span>");
    }

    #[test]
    fn test_math_layout_styles_only_inside_katex() {
        assert_eq!(
            sanitize(r#"<span class="katex"><span style="vertical-align: -0.25em; top: 1px; border-style: dashed">x</span></span>"#),
            r#"<span class="katex"><span style="vertical-align: -0.25em; top: 1px">x</span></span>"#
        );
        assert_eq!(
            sanitize(r#"<span style="vertical-align: -0.25em">x</span>"#),
            "<span>x</span>"
        );
    }

    #[test]
    fn test_image_sources() {
        assert_eq!(
            sanitize(r#"<img src="data:image/png;base64,AA" alt="">"#),
            r#"<img src="data:image/png;base64,AA" alt="">"#
        );
        assert_eq!(sanitize(r#"<img src="data:text/html,x">"#), "<img>");
        assert_eq!(
            sanitize(r#"<img src="images/a.png">"#),
            r#"<img src="images/a.png">"#
        );
    }

    #[test]
    fn test_mathml_survives() {
        let math = r#"<math><mi mathvariant="bold">x</mi></math>"#;
        assert_eq!(sanitize(math), math);
    }

    #[test]
    fn test_math_widget_is_unchanged() {
        let widget = r#"<span class="math-inline" contenteditable="false" data-latex="a%2Bb"><span class="math-placeholder">$a+b$</span></span>"#;
        assert_eq!(sanitize(widget), widget);
    }

    #[test]
    fn test_idempotent_on_nested_junk() {
        for input in [
            "<p><p>a</div></span><b><i>x</b></i>",
            "<svg><style><img src=x onerror=alert(1)></style></svg>",
            "<table><tr><td><b>cell</td></tr></table>",
            "<select><option>a<b>b</b></option></select>",
        ] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_gate_leaves_benign_markup() {
        let benign = "<p>Plain <b>text</b></p>";
        assert!(matches!(maybe_sanitize(benign), Cow::Borrowed(_)));
    }

    #[test]
    fn test_gate_signatures() {
        for input in [
            "<ScRiPt>x</script>",
            "< script>x</script>",
            r#"<img src=x onerror = "x">"#,
            "<a href=\"java\tscript:x\">",
            "<a href=\"&#106;avascript:x\">",
            "<div style=\"background: URL(x)\">",
            "<iframe srcdoc=x>",
            "<svg><a>",
            r#"<a href="java&Tab;script:alert(1)">x</a>"#,
            r#"<a href="java&NewLine;script:alert(1)">x</a>"#,
            "<a href=\"javascript&colon;x\">",
        ] {
            assert!(looks_suspicious(input), "missed: {input}");
        }
        assert!(!looks_suspicious("<p>Python = fun</p>"));
        assert!(!looks_suspicious("<p>5 & 6</p>"));
    }

    #[test]
    fn test_named_reference_in_href_is_gated() {
        let pasted = r#"<a href="java&Tab;script:alert(1)">x</a>"#;
        assert_eq!(maybe_sanitize(pasted), "<a>x</a>");
    }
}
