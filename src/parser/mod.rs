//! LaTeX to editable-document markup.
//!
//! Conversion is a fixed pipeline over the document body:
//!
//! 1. protect atomic regions (math, code, spacing, indentation wrappers)
//!    behind placeholder tokens,
//! 2. HTML-escape the remaining literal text,
//! 3. apply the formatting rules,
//! 4. turn `\\` into line breaks and newlines into spaces,
//! 5. un-escape LaTeX special characters,
//! 6. restore the protected markup.
//!
//! Anything the rules do not recognize passes through as text.

mod format;
mod lexer;
mod protect;
mod rules;

pub use lexer::{brace_group, key_values};
pub use protect::listings_to_code_lang;

use crate::escape::{escape_html, unescape_latex};
use crate::render::math::MathRenderer;
use rules::{apply_all, Context};

const BEGIN_DOCUMENT: &str = r"\begin{document}";
const END_DOCUMENT: &str = r"\end{document}";

/// The text between `\begin{document}` and `\end{document}`, or the whole
/// input when there is no document environment.
pub fn document_body(latex: &str) -> &str {
    latex
        .find(BEGIN_DOCUMENT)
        .map(|start| start + BEGIN_DOCUMENT.len())
        .and_then(|start| {
            latex[start..]
                .find(END_DOCUMENT)
                .map(|end| &latex[start..start + end])
        })
        .unwrap_or(latex)
}

/// Convert LaTeX source into markup for the editable surface.
///
/// Never fails; `renderer` only affects math previews.
#[tracing::instrument(skip_all, fields(len = latex.len()))]
pub fn latex_to_html(latex: &str, renderer: Option<&dyn MathRenderer>) -> String {
    let body = document_body(latex);
    if body.is_empty() {
        return String::new();
    }
    let mut ctx = Context::new(renderer).avoiding(body);

    let text = apply_all(protect::rules(), body, &mut ctx);
    let text = escape_html(&text);
    let text = apply_all(format::rules(), &text, &mut ctx);
    let text = text.replace(r"\\", "<br/>").replace('\n', " ");
    let text = unescape_latex(&text);

    ctx.restore(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use pretty_assertions::assert_eq;

    struct Upper;

    impl MathRenderer for Upper {
        fn render_inline(&self, latex: &str) -> Result<String> {
            Ok(latex.to_uppercase())
        }

        fn render_display(&self, latex: &str) -> Result<String> {
            Ok(format!("[{}]", latex))
        }
    }

    #[test]
    fn test_document_body() {
        let src = "\\documentclass{article}\n\\begin{document}\nHi\n\\end{document}\n";
        assert_eq!(document_body(src), "\nHi\n");
        assert_eq!(document_body("plain"), "plain");
        assert_eq!(document_body(r"\begin{document} open"), r"\begin{document} open");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(latex_to_html("", None), "");
        assert_eq!(latex_to_html("\\begin{document}\\end{document}", None), "");
    }

    #[test]
    fn test_heading_and_math_payloads() {
        let html = latex_to_html("\\section{Demo}\nInline $a+b$ and display:\n\\[ E = mc^2 \\]", None);
        assert!(html.starts_with("<h1>Demo</h1> Inline "));
        assert!(html.contains(r#"<span class="math-inline" contenteditable="false" data-latex="a%2Bb">"#));
        assert!(html.contains(r#"<div class="math-block" contenteditable="false" data-latex="%20E%20%3D%20mc%5E2%20">"#));
        assert!(html.contains(r#"<span class="math-placeholder">$a+b$</span>"#));
    }

    #[test]
    fn test_renderer_is_used_for_previews() {
        let html = latex_to_html(r"$x$ and $$y$$", Some(&Upper));
        assert!(html.contains(r#"data-latex="x">X</span>"#));
        assert!(html.contains(r#"data-latex="y">[y]</div>"#));
    }

    #[test]
    fn test_literal_text_is_escaped() {
        assert_eq!(
            latex_to_html(r#"a <script> & "b" \& \%"#, None),
            "a &lt;script&gt; &amp; &quot;b&quot; &amp; %"
        );
    }

    #[test]
    fn test_line_breaks_and_newlines() {
        assert_eq!(latex_to_html("a\\\\b\nc", None), "a<br/>b c");
    }

    #[test]
    fn test_unknown_commands_pass_through() {
        assert_eq!(latex_to_html(r"\foo{bar}", None), r"\foo{bar}");
    }

    #[test]
    fn test_code_is_not_formatted() {
        let html = latex_to_html("\\begin{verbatim}\n\\textbf{x} & $y$\n\\end{verbatim}", None);
        assert!(html.contains(r#"data-texure-code-lang="text" data-texure-code="%5Ctextbf%7Bx%7D%20%26%20%24y%24""#));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_texttt_unescapes_once() {
        assert_eq!(
            latex_to_html(r"\texttt{a\_b < c}", None),
            r#"<code class="texure-inline-code">a_b &lt; c</code>"#
        );
    }

    #[test]
    fn test_token_shaped_text_stays_literal() {
        let html = latex_to_html(r"\_\_PROTECTED\_BLOCK\_0\_\_ and $x$", None);
        assert!(html.starts_with("__PROTECTED_BLOCK_0__ and <span"));
        assert_eq!(html.matches("math-inline").count(), 1);
    }

    #[test]
    fn test_hspace_marker() {
        let html = latex_to_html(r"a\hspace{1em}b", None);
        assert!(html.contains(r#"data-texure-latex="\hspace{1em}""#));
    }
}
