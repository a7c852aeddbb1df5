//! Markup parsing and serialization.
//!
//! Parsing goes through html5ever's document parser so malformed or
//! adversarial markup is normalized exactly the way a browser would
//! normalize it before the result is turned into [`Node`]s.

use crate::ast::{Element, Node};
use crate::render::html::widget_markup;
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Parse a markup fragment into document nodes.
///
/// Head and body children of the synthesized document are concatenated in
/// order, so leading `<style>`, `<meta>` or `<script>` elements hoisted into
/// the head are still visible to callers.
pub fn parse(markup: &str) -> Vec<Node> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);
    let mut nodes = Vec::new();
    for child in dom.document.children.borrow().iter() {
        if element_name(child).as_deref() == Some("html") {
            for section in child.children.borrow().iter() {
                match element_name(section).as_deref() {
                    Some("head") | Some("body") => {
                        nodes.extend(section.children.borrow().iter().filter_map(convert));
                    }
                    _ => nodes.extend(convert(section)),
                }
            }
        }
    }
    nodes
}

fn element_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|a| {
                    let local = a.name.local.to_string();
                    let key = match &a.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, local),
                        None => local,
                    };
                    (key, a.value.to_string())
                })
                .collect();
            let children = handle.children.borrow().iter().filter_map(convert).collect();
            Some(Node::Element(Element {
                tag: name.local.to_string(),
                attrs,
                children,
            }))
        }
        _ => None,
    }
}

/// Serialize nodes back to markup. Widgets are re-rendered from their
/// payload.
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => escape_text_into(out, text),
        Node::Element(el) => write_element(out, el),
        Node::Widget(widget) => out.push_str(&widget_markup(widget)),
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr_into(out, value);
        out.push('"');
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&el.tag.as_str()) {
        return;
    }
    for child in &el.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

fn escape_text_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

fn escape_attr_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fragment() {
        let nodes = parse("Hello <b class=\"x\">world</b>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], Node::Text("Hello ".into()));
        let Node::Element(b) = &nodes[1] else {
            panic!("expected element");
        };
        assert_eq!(b.tag, "b");
        assert_eq!(b.attr("class"), Some("x"));
        assert_eq!(b.text_content(), "world");
    }

    #[test]
    fn test_parse_keeps_hoisted_head_elements() {
        let nodes = parse("<style>p{}</style><p>x</p>");
        let tags: Vec<_> = nodes
            .iter()
            .filter_map(|n| match n {
                Node::Element(el) => Some(el.tag.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(tags, vec!["style", "p"]);
    }

    #[test]
    fn test_serialize_escapes() {
        let nodes = parse("<a title=\"a&quot;b\">1 &lt; 2 &amp;&nbsp;3</a><br>");
        assert_eq!(
            serialize(&nodes),
            "<a title=\"a&quot;b\">1 &lt; 2 &amp;&nbsp;3</a><br>"
        );
    }

    #[test]
    fn test_serialize_is_stable() {
        let input = "<div style=\"color: red\"><ul><li>a</li><li>b</li></ul></div>";
        let once = serialize(&parse(input));
        assert_eq!(once, input);
        assert_eq!(serialize(&parse(&once)), once);
    }
}
