//! Editable-document markup to LaTeX.
//!
//! The markup is parsed into the document tree, widgets are lifted out of
//! their previews, and the tree is walked depth-first. Element commands are
//! inferred from the tag and from the allow-listed inline style.

use crate::ast::{lift_widgets, CodeBlock, Element, Image, ImageSource, Node, Style, StyleProperty, Widget};
use crate::escape::{escape_latex, strip_zero_width};
use crate::markup;
use crate::render::html::vocab;
use crate::style::{css_color_to_latex, css_length_to_latex, font_size_command};
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("static pattern"));
static DOUBLED_SPACING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\\\\(?:hspace|vspace|newpage)\b").expect("static pattern")
});

/// Convert editable-document markup back into LaTeX.
///
/// Three or more consecutive newlines collapse to a blank line and the
/// result is trimmed.
#[tracing::instrument(skip_all, fields(len = markup.len()))]
pub fn html_to_latex(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }
    let nodes = lift_widgets(markup::parse(markup));
    let latex: String = nodes.iter().map(node_to_latex).collect();
    BLANK_LINES.replace_all(&latex, "\n\n").trim().to_string()
}

/// Map a code-block language onto the `listings` option value. Plain text
/// and unknown languages get no option.
pub fn code_lang_to_listings(lang: &str) -> Option<&'static str> {
    Some(match lang.trim().to_ascii_lowercase().as_str() {
        "js" | "javascript" | "ts" | "typescript" => "JavaScript",
        "py" | "python" => "Python",
        "c++" | "cpp" => "C++",
        "c#" | "csharp" => "[Sharp]C",
        "bash" | "sh" | "shell" => "bash",
        "json" => "JSON",
        "yaml" | "yml" => "yaml",
        "html" => "HTML",
        "css" => "CSS",
        "latex" | "tex" => "TeX",
        "java" => "Java",
        "go" => "Go",
        "rust" => "Rust",
        "c" => "C",
        _ => return None,
    })
}

fn node_to_latex(node: &Node) -> String {
    match node {
        Node::Text(text) => escape_latex(&WHITESPACE.replace_all(&strip_zero_width(text), " ")),
        Node::Widget(widget) => widget_to_latex(widget),
        Node::Element(el) => element_to_latex(el),
    }
}

fn children_to_latex(children: &[Node]) -> String {
    children.iter().map(node_to_latex).collect()
}

fn widget_to_latex(widget: &Widget) -> String {
    match widget {
        Widget::Command(cmd) => {
            let command = if DOUBLED_SPACING.is_match(&cmd.command) {
                &cmd.command[1..]
            } else {
                cmd.command.as_str()
            };
            if cmd.block {
                format!("\n{}\n", command)
            } else {
                command.to_string()
            }
        }
        Widget::CodeBlock(CodeBlock { language, code }) => {
            let option = code_lang_to_listings(language)
                .map(|l| format!("[language={}]", l))
                .unwrap_or_default();
            format!("\n\\begin{{lstlisting}}{}\n{}\n\\end{{lstlisting}}\n", option, code)
        }
        Widget::InlineCode(code) => {
            if code.text.trim().is_empty() {
                String::new()
            } else {
                format!(r"\texttt{{{}}}", escape_latex(&code.text))
            }
        }
        Widget::Math(math) if math.display => format!("\n\\[\n{}\n\\]\n", math.source()),
        Widget::Math(math) => format!("${}$", math.source()),
        Widget::Image(img) => {
            let (prefix, suffix) = style_wrapper(&img.style);
            format!("{}{}{}", prefix, includegraphics(img), suffix)
        }
    }
}

fn includegraphics(img: &Image) -> String {
    let reference = match &img.source {
        ImageSource::Local(id) => format!("{}{}", vocab::IMAGE_PREFIX, id),
        ImageSource::Url(src) => src.clone(),
    };
    let mut options = Vec::with_capacity(2);
    match img.width.filter(|w| *w > 0.0) {
        Some(w) if (w - 1.0).abs() >= 1e-6 => options.push(format!(r"width={}\linewidth", w)),
        _ => options.push(r"width=\linewidth".to_string()),
    }
    if let Some(angle) = img.angle.filter(|a| a.abs() > 1e-6) {
        options.push(format!("angle={}", angle));
    }
    format!(r"\includegraphics[{}]{{{}}}", options.join(","), reference)
}

/// Commands implied by an element's inline style, as an opening prefix and
/// the matching suffix.
fn style_wrapper(style: &Style) -> (String, String) {
    let mut prefix = String::new();
    let mut suffix = String::new();

    let color = style.get(StyleProperty::Color).and_then(css_color_to_latex);
    if let Some(c) = color.filter(|c| !c.contains("black") && c != "#000000") {
        prefix.push_str(&format!(r"\textcolor{{{}}}{{", c));
        suffix.insert(0, '}');
    }
    if let Some(bg) = style.get(StyleProperty::BackgroundColor).and_then(css_color_to_latex) {
        prefix.push_str(&format!(r"\colorbox{{{}}}{{", bg));
        suffix.insert(0, '}');
    }

    let env = match style.get(StyleProperty::TextAlign).map(str::trim) {
        Some("center") => Some("center"),
        Some("right") => Some("flushright"),
        Some("justify") => Some("justify"),
        _ => None,
    };
    if let Some(env) = env {
        prefix.insert_str(0, &format!("\n\\begin{{{}}}\n", env));
        suffix.push_str(&format!("\n\\end{{{}}}\n", env));
    }

    if style
        .get(StyleProperty::FontFamily)
        .is_some_and(|f| f.to_ascii_lowercase().contains("sans"))
    {
        prefix.push_str(r"\textsf{");
        suffix.insert(0, '}');
    }
    if let Some(size) = style.get(StyleProperty::FontSize).and_then(font_size_command) {
        prefix.push_str(&format!("\\{} ", size));
    }

    (prefix, suffix)
}

/// Left indentation of a block, from the first indentation property that
/// is set.
fn indentation(style: &Style) -> Option<String> {
    if !style.has_indent() {
        return None;
    }
    [
        StyleProperty::MarginLeft,
        StyleProperty::PaddingLeft,
        StyleProperty::TextIndent,
    ]
    .iter()
    .find_map(|p| style.get(*p))
    .and_then(css_length_to_latex)
}

fn is_checkbox(el: &Element) -> bool {
    el.tag == "input"
        && el
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
}

fn element_to_latex(el: &Element) -> String {
    let content = children_to_latex(&el.children);
    if el.tag == "span"
        && strip_zero_width(&el.text_content()).trim().is_empty()
        && content.trim().is_empty()
    {
        return String::new();
    }

    let style = el.style();
    let (prefix, suffix) = style_wrapper(&style);
    let wrap = |body: String| format!("{}{}{}", prefix, body, suffix);

    match el.tag.as_str() {
        "h1" => wrap(format!("\n\\section{{{}}}\n", content)),
        "h2" => wrap(format!("\n\\subsection{{{}}}\n", content)),
        "h3" => wrap(format!("\n\\subsubsection{{{}}}\n", content)),
        "h4" => wrap(format!("\n\\paragraph{{{}}}\n", content)),
        "b" | "strong" => wrap(format!(r"\textbf{{{}}}", content)),
        "i" | "em" => wrap(format!(r"\textit{{{}}}", content)),
        "u" => wrap(format!(r"\underline{{{}}}", content)),
        "a" => wrap(format!(
            r"\href{{{}}}{{{}}}",
            el.attr("href").unwrap_or_default(),
            content
        )),
        "ul" => wrap(format!("\n\\begin{{itemize}}\n{}\\end{{itemize}}\n", content)),
        "ol" => wrap(format!("\n\\begin{{enumerate}}\n{}\\end{{enumerate}}\n", content)),
        "li" => {
            let label = if el.find(&is_checkbox).is_some() {
                r"[$\square$] "
            } else {
                " "
            };
            format!("  \\item{}{}\n", label, content.trim_start())
        }
        "br" => String::new(),
        "blockquote" => format!(
            "\n\\begin{{quote}}\n{}{}{}\n\\end{{quote}}\n",
            prefix, content, suffix
        ),
        "div" | "p" => match indentation(&style) {
            Some(len) => format!(
                "\n{{\\leftskip={}\\relax\n{}{}{}\n\\par}}\n",
                len, prefix, content, suffix
            ),
            None => wrap(format!("\n\n{}\n\n", content)),
        },
        _ => wrap(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input() {
        assert_eq!(html_to_latex(""), "");
    }

    #[test]
    fn test_text_is_escaped_and_collapsed() {
        assert_eq!(html_to_latex("<p>50%  of\n a_b \u{200B}</p>"), r"50\% of a\_b");
    }

    #[test]
    fn test_code_block_language_option() {
        let html = crate::render::html::code_block("csharp", "int x;");
        assert_eq!(
            html_to_latex(&html),
            "\\begin{lstlisting}[language=[Sharp]C]\nint x;\n\\end{lstlisting}"
        );
        let plain = crate::render::html::code_block("text", "x");
        assert_eq!(html_to_latex(&plain), "\\begin{lstlisting}\nx\n\\end{lstlisting}");
    }

    #[test]
    fn test_image_with_alias_attributes() {
        assert_eq!(
            html_to_latex(r#"<img data-width="0.5" data-angle="90" data-image-id="abc">"#),
            r"\includegraphics[width=0.5\linewidth,angle=90]{texure-image:abc}"
        );
        assert_eq!(
            html_to_latex(r#"<img src="https://x.test/a.png">"#),
            r"\includegraphics[width=\linewidth]{https://x.test/a.png}"
        );
    }

    #[test]
    fn test_transparent_background_is_dropped() {
        assert_eq!(
            html_to_latex(r#"<span style="background-color: transparent">x</span>"#),
            "x"
        );
        assert_eq!(
            html_to_latex(r#"<span style="color: rgb(255, 0, 0)">x</span>"#),
            r"\textcolor{#ff0000}{x}"
        );
        assert_eq!(html_to_latex(r#"<span style="color: black">x</span>"#), "x");
    }

    #[test]
    fn test_stored_commands() {
        assert_eq!(
            html_to_latex(r#"a<span data-texure-latex="\hspace{1em}">&nbsp;</span>b"#),
            r"a\hspace{1em}b"
        );
        assert_eq!(
            html_to_latex(r#"<div data-texure-latex="\\newpage"></div>"#),
            r"\newpage"
        );
    }

    #[test]
    fn test_math_prefers_live_input() {
        assert_eq!(
            html_to_latex(r#"<span class="math-inline" data-latex="a%2Bb"><span>preview</span></span>"#),
            "$a+b$"
        );
        assert_eq!(
            html_to_latex(r#"<div class="math-block" data-latex="x"><textarea>y^2</textarea></div>"#),
            "\\[\ny^2\n\\]"
        );
    }

    #[test]
    fn test_inline_code_variants() {
        assert_eq!(html_to_latex("<code>a_b</code>"), r"\texttt{a\_b}");
        assert_eq!(
            html_to_latex(r#"<span style="background-color: #878378">x</span>"#),
            r"\texttt{x}"
        );
        assert_eq!(html_to_latex("<code> \u{200B}</code>"), "");
    }

    #[test]
    fn test_lists_and_checkboxes() {
        assert_eq!(
            html_to_latex(r#"<ul><li><input type="checkbox" disabled> done</li><li>open</li></ul>"#),
            "\\begin{itemize}\n  \\item[$\\square$] done\n  \\item open\n\\end{itemize}"
        );
    }

    #[test]
    fn test_indented_paragraph() {
        assert_eq!(
            html_to_latex(r#"<p style="margin-left: 20px">x</p>"#),
            "{\\leftskip=15pt\\relax\nx\n\\par}"
        );
        assert_eq!(html_to_latex(r#"<p style="margin-left: 0">x</p><p>y</p>"#), "x\n\ny");
    }

    #[test]
    fn test_alignment_and_size() {
        assert_eq!(
            html_to_latex(r#"<div style="text-align: center; font-size: 18.7px">T</div>"#),
            "\\begin{center}\n\\Large \n\nT\n\n\\end{center}"
        );
    }

    #[test]
    fn test_headings_and_links() {
        assert_eq!(
            html_to_latex(r#"<h1>Demo</h1><h4>P</h4><a href="https://a.test">site</a>"#),
            "\\section{Demo}\n\n\\paragraph{P}\n\\href{https://a.test}{site}"
        );
    }
}
