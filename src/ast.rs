//! Document tree for the editable surface.
//!
//! Markup is parsed into plain [`Node::Text`] and [`Node::Element`] nodes.
//! [`lift_widgets`] then replaces the elements that represent atomic units
//! (math, code, images, stored commands) with typed [`Widget`]s whose
//! payload comes from attributes, never from the rendered preview.

use crate::escape::{decode_payload, strip_zero_width};
use crate::render::html::vocab;
use crate::style::css_color_to_latex;

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Character data, entity-decoded.
    Text(String),
    /// A generic element.
    Element(Element),
    /// An atomic widget with an authoritative payload.
    Widget(Widget),
}

impl Node {
    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => el.children.iter().for_each(|c| c.collect_text(out)),
            Node::Widget(_) => {}
        }
    }
}

/// Layout class of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Block,
    Inline,
}

/// A generic element: lower-case tag, ordered attributes, children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First present attribute among `names`.
    pub fn attr_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.attr(n))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn kind(&self) -> ElementKind {
        match self.tag.as_str() {
            "h1" | "h2" | "h3" | "h4" | "p" | "div" | "ul" | "ol" | "li" | "blockquote"
            | "pre" | "textarea" | "select" => ElementKind::Block,
            _ => ElementKind::Inline,
        }
    }

    /// The allow-listed inline style of this element.
    pub fn style(&self) -> Style {
        self.attr("style").map(Style::parse).unwrap_or_default()
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// Depth-first search for the first descendant element matching `pred`.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in &self.children {
            if let Node::Element(el) = child {
                if pred(el) {
                    return Some(el);
                }
                if let Some(found) = el.find(pred) {
                    return Some(found);
                }
            }
        }
        None
    }
}

/// Inline style properties that survive into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleProperty {
    Color,
    BackgroundColor,
    TextAlign,
    FontFamily,
    FontSize,
    MarginLeft,
    MarginRight,
    PaddingLeft,
    PaddingRight,
    TextIndent,
    MaxWidth,
    Width,
    Height,
}

impl StyleProperty {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "color" => Self::Color,
            "background-color" => Self::BackgroundColor,
            "text-align" => Self::TextAlign,
            "font-family" => Self::FontFamily,
            "font-size" => Self::FontSize,
            "margin-left" => Self::MarginLeft,
            "margin-right" => Self::MarginRight,
            "padding-left" => Self::PaddingLeft,
            "padding-right" => Self::PaddingRight,
            "text-indent" => Self::TextIndent,
            "max-width" => Self::MaxWidth,
            "width" => Self::Width,
            "height" => Self::Height,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::BackgroundColor => "background-color",
            Self::TextAlign => "text-align",
            Self::FontFamily => "font-family",
            Self::FontSize => "font-size",
            Self::MarginLeft => "margin-left",
            Self::MarginRight => "margin-right",
            Self::PaddingLeft => "padding-left",
            Self::PaddingRight => "padding-right",
            Self::TextIndent => "text-indent",
            Self::MaxWidth => "max-width",
            Self::Width => "width",
            Self::Height => "height",
        }
    }
}

/// Split a `style` attribute into lower-cased property names and trimmed
/// values. Declarations without a name or value are skipped.
pub fn style_declarations(style: &str) -> impl Iterator<Item = (String, &str)> {
    style.split(';').filter_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let prop = prop.trim().to_ascii_lowercase();
        let value = value.trim();
        (!prop.is_empty() && !value.is_empty()).then_some((prop, value))
    })
}

/// Parsed inline style restricted to [`StyleProperty`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    declarations: Vec<(StyleProperty, String)>,
}

impl Style {
    /// Parse a `style` attribute; unknown properties are dropped. A later
    /// declaration of the same property wins.
    pub fn parse(style: &str) -> Self {
        let mut parsed = Style::default();
        for (name, value) in style_declarations(style) {
            if let Some(prop) = StyleProperty::from_name(&name) {
                parsed.set(prop, value);
            }
        }
        parsed
    }

    pub fn get(&self, prop: StyleProperty) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(p, _)| *p == prop)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, prop: StyleProperty, value: impl Into<String>) {
        let value = value.into();
        match self.declarations.iter_mut().find(|(p, _)| *p == prop) {
            Some(slot) => slot.1 = value,
            None => self.declarations.push((prop, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Whether any indentation property is present.
    pub fn has_indent(&self) -> bool {
        [
            StyleProperty::MarginLeft,
            StyleProperty::MarginRight,
            StyleProperty::PaddingLeft,
            StyleProperty::PaddingRight,
            StyleProperty::TextIndent,
        ]
        .iter()
        .any(|p| self.get(*p).is_some())
    }

    /// Serialize back to `prop: value; ...` form.
    pub fn to_css(&self) -> String {
        self.declarations
            .iter()
            .map(|(p, v)| format!("{}: {}", p.name(), v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Atomic units of the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Math(MathWidget),
    CodeBlock(CodeBlock),
    InlineCode(InlineCode),
    Image(Image),
    Command(StoredCommand),
}

/// Display or inline math.
#[derive(Debug, Clone, PartialEq)]
pub struct MathWidget {
    pub display: bool,
    /// Decoded `data-latex` payload.
    pub latex: String,
    /// Value of an open editing input, which supersedes the payload.
    pub live_input: Option<String>,
}

impl MathWidget {
    /// The expression to serialize.
    pub fn source(&self) -> &str {
        self.live_input.as_deref().unwrap_or(&self.latex)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineCode {
    pub language: Option<String>,
    pub text: String,
}

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Key into the local image store (`texure-image:<id>`).
    Local(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub source: ImageSource,
    /// Fraction of `\linewidth`.
    pub width: Option<f64>,
    /// Rotation in degrees.
    pub angle: Option<f64>,
    pub style: Style,
}

/// A literal LaTeX command stored on an opaque node.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCommand {
    pub command: String,
    pub block: bool,
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Background/color pair used by pasted inline code.
fn is_pasted_inline_code(style: &Style) -> bool {
    let bg = style
        .get(StyleProperty::BackgroundColor)
        .and_then(css_color_to_latex);
    let color = style.get(StyleProperty::Color).and_then(css_color_to_latex);
    match (bg.as_deref(), color.as_deref()) {
        (Some(vocab::PASTED_CODE_BACKGROUND), None | Some(vocab::PASTED_CODE_COLOR)) => true,
        (None, Some(vocab::PASTED_CODE_COLOR)) => true,
        _ => false,
    }
}

impl Widget {
    /// Recognize an element that represents a widget. Checked in priority
    /// order: stored command, code block, math, bare `pre`, inline code,
    /// image.
    pub fn recognize(el: &Element) -> Option<Widget> {
        if let Some(cmd) = el.attr(vocab::ATTR_LATEX_COMMAND).filter(|c| !c.is_empty()) {
            return Some(Widget::Command(StoredCommand {
                command: cmd.to_string(),
                block: el.kind() == ElementKind::Block,
            }));
        }

        if el.has_class(vocab::CLASS_CODE_BLOCK) {
            let language = el
                .attr(vocab::ATTR_CODE_LANG)
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or("text")
                .to_string();
            let code = match el.attr(vocab::ATTR_CODE).filter(|c| !c.is_empty()) {
                Some(encoded) => decode_payload(encoded),
                None => el
                    .find(&|e: &Element| e.tag == "textarea")
                    .map(|t| t.attr("value").map(String::from).unwrap_or_else(|| t.text_content()))
                    .unwrap_or_default(),
            };
            return Some(Widget::CodeBlock(CodeBlock {
                language,
                code: trim_one_newline(&code).to_string(),
            }));
        }

        let display = el.has_class(vocab::CLASS_MATH_BLOCK);
        if display || el.has_class(vocab::CLASS_MATH_INLINE) {
            let input_tag = if display { "textarea" } else { "input" };
            let live_input = el.find(&|e: &Element| e.tag == input_tag).map(|input| {
                input
                    .attr("value")
                    .map(String::from)
                    .unwrap_or_else(|| input.text_content())
            });
            return Some(Widget::Math(MathWidget {
                display,
                latex: decode_payload(el.attr(vocab::ATTR_MATH).unwrap_or_default()),
                live_input,
            }));
        }

        if el.tag == "pre" {
            let code_el = el.find(&|e: &Element| e.tag == "code");
            let language = code_el
                .and_then(|c| c.attr(vocab::ATTR_CODE_LANG))
                .or_else(|| el.attr(vocab::ATTR_CODE_LANG))
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            let code = code_el.map_or_else(|| el.text_content(), Element::text_content);
            return Some(Widget::CodeBlock(CodeBlock {
                language,
                code: trim_one_newline(&code).to_string(),
            }));
        }

        if el.tag == "code"
            || el.has_class(vocab::CLASS_INLINE_CODE)
            || el.has_attr(vocab::ATTR_CODE_LANG)
            || is_pasted_inline_code(&el.style())
        {
            return Some(Widget::InlineCode(InlineCode {
                language: el.attr(vocab::ATTR_CODE_LANG).map(String::from),
                text: strip_zero_width(&el.text_content()).into_owned(),
            }));
        }

        if el.tag == "img" {
            let id = el
                .attr_any(&[vocab::ATTR_IMAGE_ID, vocab::ATTR_IMAGE_ID_ALIAS])
                .map(str::trim)
                .filter(|id| !id.is_empty());
            let src = el.attr("src").unwrap_or_default();
            let source = match id {
                Some(id) => ImageSource::Local(id.to_string()),
                None => match src.strip_prefix(vocab::IMAGE_PREFIX) {
                    Some(id) => ImageSource::Local(id.trim().to_string()),
                    None => ImageSource::Url(src.to_string()),
                },
            };
            return Some(Widget::Image(Image {
                source,
                width: parse_number(el.attr_any(&[vocab::ATTR_IMG_WIDTH, vocab::ATTR_IMG_WIDTH_ALIAS])),
                angle: parse_number(el.attr_any(&[vocab::ATTR_IMG_ANGLE, vocab::ATTR_IMG_ANGLE_ALIAS])),
                style: el.style(),
            }));
        }

        None
    }
}

/// Strip one leading and one trailing newline.
pub fn trim_one_newline(code: &str) -> &str {
    let code = code.strip_prefix('\n').unwrap_or(code);
    code.strip_suffix('\n').unwrap_or(code)
}

/// Replace every recognized widget element in the tree with its typed form.
pub fn lift_widgets(nodes: Vec<Node>) -> Vec<Node> {
    nodes.into_iter().map(lift_node).collect()
}

fn lift_node(node: Node) -> Node {
    match node {
        Node::Element(el) => match Widget::recognize(&el) {
            Some(widget) => Node::Widget(widget),
            None => Node::Element(Element {
                children: lift_widgets(el.children),
                ..el
            }),
        },
        other => other,
    }
}
