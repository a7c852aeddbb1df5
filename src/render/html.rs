//! Markup builders for the editable surface's atomic widgets.
//!
//! Every widget's authoritative state lives in attributes (see [`vocab`]);
//! the children are a disposable preview.

use super::highlight::highlight_code;
use super::math::render_math;
use crate::ast::{Image, ImageSource, Widget};
use crate::escape::{encode_payload, escape_attr, escape_html};
use crate::style::safe_spacing_length;

/// Attribute and class names shared by both transforms and the sanitizer.
pub mod vocab {
    pub const ATTR_MATH: &str = "data-latex";
    pub const ATTR_CODE: &str = "data-texure-code";
    pub const ATTR_CODE_LANG: &str = "data-texure-code-lang";
    pub const ATTR_LATEX_COMMAND: &str = "data-texure-latex";
    pub const ATTR_IMAGE_ID: &str = "data-texure-image-id";
    pub const ATTR_IMAGE_ID_ALIAS: &str = "data-image-id";
    pub const ATTR_IMG_WIDTH: &str = "data-texure-img-width";
    pub const ATTR_IMG_WIDTH_ALIAS: &str = "data-width";
    pub const ATTR_IMG_ANGLE: &str = "data-texure-img-angle";
    pub const ATTR_IMG_ANGLE_ALIAS: &str = "data-angle";
    pub const ATTR_IMG_X: &str = "data-texure-img-x";
    pub const ATTR_IMG_Y: &str = "data-texure-img-y";

    pub const CLASS_MATH_BLOCK: &str = "math-block";
    pub const CLASS_MATH_INLINE: &str = "math-inline";
    pub const CLASS_CODE_BLOCK: &str = "texure-codeblock";
    pub const CLASS_INLINE_CODE: &str = "texure-inline-code";
    /// Root class of a KaTeX-rendered formula.
    pub const CLASS_MATH_RENDER: &str = "katex";

    /// Source prefix referencing the local image store.
    pub const IMAGE_PREFIX: &str = "texure-image:";
    /// 1x1 transparent GIF shown until a local image is resolved.
    pub const TRANSPARENT_GIF: &str =
        "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///ywAAAAAAQABAAACAUwAOw==";

    /// Background and text color of inline code pasted from note-taking apps.
    pub const PASTED_CODE_BACKGROUND: &str = "#878378";
    pub const PASTED_CODE_COLOR: &str = "#eb5757";

    /// Languages offered by the code-block language picker.
    pub const CODE_LANGUAGES: [&str; 16] = [
        "text",
        "javascript",
        "typescript",
        "python",
        "java",
        "c",
        "cpp",
        "csharp",
        "go",
        "rust",
        "bash",
        "json",
        "yaml",
        "html",
        "css",
        "latex",
    ];
}

/// Code-block widget with language picker, highlighted preview and input.
pub fn code_block(lang: &str, code: &str) -> String {
    let lang = match lang.trim() {
        "" => "text",
        l => l,
    };
    let options: String = vocab::CODE_LANGUAGES
        .iter()
        .map(|l| {
            let selected = if *l == lang { " selected" } else { "" };
            format!(r#"<option value="{l}"{selected}>{l}</option>"#)
        })
        .collect();
    format!(
        concat!(
            r#"<div class="{cls}" contenteditable="false" {lang_attr}="{lang}" {code_attr}="{payload}">"#,
            r#"<div class="texure-code-toolbar"><select class="texure-code-lang">{options}</select>"#,
            r#"<span class="texure-code-label">Code</span></div>"#,
            r#"<div class="texure-code-body">"#,
            r#"<pre class="texure-code-preview" aria-hidden="true"><code>{highlighted}</code></pre>"#,
            r#"<textarea class="texure-code-input" spellcheck="false">{text}</textarea>"#,
            r#"</div></div>"#,
        ),
        cls = vocab::CLASS_CODE_BLOCK,
        lang_attr = vocab::ATTR_CODE_LANG,
        lang = escape_attr(lang),
        code_attr = vocab::ATTR_CODE,
        payload = encode_payload(code),
        options = options,
        highlighted = highlight_code(lang, code),
        text = escape_html(code),
    )
}

/// Inline code, optionally tagged with a language.
pub fn inline_code(lang: Option<&str>, code: &str) -> String {
    let lang_attr = lang
        .map(|l| format!(r#" {}="{}""#, vocab::ATTR_CODE_LANG, escape_attr(l.trim())))
        .unwrap_or_default();
    format!(
        r#"<code class="{}"{}>{}</code>"#,
        vocab::CLASS_INLINE_CODE,
        lang_attr,
        escape_html(code)
    )
}

/// Math widget around an already rendered preview.
pub fn math_widget(latex: &str, display: bool, preview: &str) -> String {
    let (tag, class) = if display {
        ("div", vocab::CLASS_MATH_BLOCK)
    } else {
        ("span", vocab::CLASS_MATH_INLINE)
    };
    format!(
        r#"<{tag} class="{class}" contenteditable="false" {attr}="{payload}">{preview}</{tag}>"#,
        attr = vocab::ATTR_MATH,
        payload = encode_payload(latex),
    )
}

/// Manual spacing and pagination commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing<'a> {
    HSpace { star: bool, length: &'a str },
    VSpace { star: bool, length: &'a str },
    NewPage,
}

impl Spacing<'_> {
    /// The literal LaTeX command.
    pub fn command(&self) -> String {
        let star = |s: bool| if s { "*" } else { "" };
        match self {
            Spacing::HSpace { star: s, length } => format!(r"\hspace{}{{{}}}", star(*s), length.trim()),
            Spacing::VSpace { star: s, length } => format!(r"\vspace{}{{{}}}", star(*s), length.trim()),
            Spacing::NewPage => r"\newpage".to_string(),
        }
    }
}

/// Spacing marker. The command is stored verbatim; a size is applied only
/// when the length is a plain number with a CSS-compatible unit.
pub fn spacing_marker(spacing: Spacing<'_>) -> String {
    let cmd = escape_attr(&spacing.command());
    let attr = vocab::ATTR_LATEX_COMMAND;
    match spacing {
        Spacing::HSpace { length, .. } => {
            let style = safe_spacing_length(length)
                .map(|l| format!(r#" style="width: {}""#, escape_attr(l)))
                .unwrap_or_default();
            format!(
                r#"<span class="texure-hspace" contenteditable="false" {attr}="{cmd}" title="{cmd}"{style}>&nbsp;</span>"#
            )
        }
        Spacing::VSpace { length, .. } => {
            let style = safe_spacing_length(length)
                .map(|l| format!(r#" style="height: {}""#, escape_attr(l)))
                .unwrap_or_default();
            format!(
                r#"<div class="texure-vspace" contenteditable="false" {attr}="{cmd}" title="{cmd}"{style}></div>"#
            )
        }
        Spacing::NewPage => format!(
            r#"<div class="texure-newpage" contenteditable="false" {attr}="{cmd}" title="{cmd}">{cmd}</div>"#
        ),
    }
}

fn format_fraction(n: f64) -> String {
    format!("{}", n)
}

/// Image element. Local-store images get a transparent placeholder `src`.
pub fn image(img: &Image) -> String {
    let mut attrs = Vec::new();
    match &img.source {
        ImageSource::Local(id) => {
            attrs.push(format!(r#"src="{}""#, vocab::TRANSPARENT_GIF));
            attrs.push(format!(r#"{}="{}""#, vocab::ATTR_IMAGE_ID, escape_attr(id)));
        }
        ImageSource::Url(src) => attrs.push(format!(r#"src="{}""#, escape_attr(src))),
    }
    if let Some(w) = img.width.filter(|w| w.is_finite()) {
        attrs.push(format!(r#"{}="{}""#, vocab::ATTR_IMG_WIDTH, format_fraction(w)));
    }
    if let Some(a) = img.angle.filter(|a| a.is_finite()) {
        attrs.push(format!(r#"{}="{}""#, vocab::ATTR_IMG_ANGLE, format_fraction(a)));
    }
    if matches!(img.source, ImageSource::Local(_)) {
        attrs.push(r#"alt="""#.to_string());
    }
    let style = if img.style.is_empty() {
        "max-width:100%".to_string()
    } else {
        img.style.to_css()
    };
    attrs.push(format!(r#"style="{}""#, escape_attr(&style)));
    format!("<img {} />", attrs.join(" "))
}

/// Re-render a widget from its payload.
pub fn widget_markup(widget: &Widget) -> String {
    match widget {
        Widget::Math(m) => {
            math_widget(m.source(), m.display, &render_math(None, m.source(), m.display))
        }
        Widget::CodeBlock(c) => code_block(&c.language, &c.code),
        Widget::InlineCode(c) => inline_code(c.language.as_deref(), &c.text),
        Widget::Image(img) => image(img),
        Widget::Command(c) => {
            let cmd = escape_attr(&c.command);
            let tag = if c.block { "div" } else { "span" };
            format!(
                r#"<{tag} contenteditable="false" {}="{cmd}" title="{cmd}"></{tag}>"#,
                vocab::ATTR_LATEX_COMMAND
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Style;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_code_block_payload_and_picker() {
        let html = code_block("python", "print(1 < 2)");
        assert!(html.starts_with(r#"<div class="texure-codeblock" contenteditable="false" data-texure-code-lang="python" data-texure-code="print(1%20%3C%202)">"#));
        assert!(html.contains(r#"<option value="python" selected>python</option>"#));
        assert!(html.contains(r#"<textarea class="texure-code-input" spellcheck="false">print(1 &lt; 2)</textarea>"#));
    }

    #[test]
    fn test_empty_code_block_defaults_to_text() {
        let html = code_block("", "");
        assert!(html.contains(r#"data-texure-code-lang="text" data-texure-code="""#));
    }

    #[test]
    fn test_spacing_markers() {
        let html = spacing_marker(Spacing::HSpace { star: true, length: " 1em " });
        assert_eq!(
            html,
            r#"<span class="texure-hspace" contenteditable="false" data-texure-latex="\hspace*{1em}" title="\hspace*{1em}" style="width: 1em">&nbsp;</span>"#
        );
        let unsized_marker = spacing_marker(Spacing::VSpace { star: false, length: r"\fill" });
        assert!(!unsized_marker.contains("style="));
        assert!(unsized_marker.contains(r#"data-texure-latex="\vspace{\fill}""#));
    }

    #[test]
    fn test_local_image() {
        let img = Image {
            source: ImageSource::Local("abc".into()),
            width: Some(0.5),
            angle: None,
            style: Style::default(),
        };
        assert_eq!(
            image(&img),
            format!(
                r#"<img src="{}" data-texure-image-id="abc" data-texure-img-width="0.5" alt="" style="max-width:100%" />"#,
                vocab::TRANSPARENT_GIF
            )
        );
    }

    #[test]
    fn test_math_widget_encodes_payload() {
        assert_eq!(
            math_widget("a+b", false, "P"),
            r#"<span class="math-inline" contenteditable="false" data-latex="a%2Bb">P</span>"#
        );
    }
}
