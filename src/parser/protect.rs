//! Protect-pass rules: atomic regions that later passes must not touch.
//!
//! Every builder here stashes its markup in the [`Context`] and returns the
//! placeholder token instead.

use super::latex_to_html;
use super::lexer::{self, Shape};
use super::rules::{Captures, Context, Matcher, Rule};
use crate::ast::trim_one_newline;
use crate::escape::{strip_zero_width, unescape_latex};
use crate::render::html::{code_block, inline_code, math_widget, spacing_marker, Spacing};
use crate::render::math::render_math;
use crate::style::latex_length_to_css;
use regex::Regex;
use std::sync::LazyLock;

static DISPLAY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\[((?s:.)*?)\\\]").expect("static pattern"));
static DISPLAY_DOLLARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\$((?s:.)*?)\$\$").expect("static pattern"));
static INLINE_DOLLAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\\])\$([^$]+?)\$").expect("static pattern"));
static LEFTSKIP_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\\leftskip\s*=\s*((?s:.)*?)\\relax").expect("static pattern")
});

const CHECKBOX_ITEM: &str = r"\item[$\square$]";

const fn shape(name: &'static str, star: bool, optional: bool, args: usize) -> Shape {
    Shape {
        name,
        star,
        optional,
        args,
    }
}

/// Protect rules in priority order.
pub fn rules() -> &'static [Rule] {
    static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
        vec![
            Rule {
                name: "leftskip",
                matcher: Matcher::Scan {
                    trigger: r"{\leftskip",
                    scan: scan_leftskip,
                },
                build: build_leftskip,
                nested: false,
            },
            Rule {
                name: "verbatim",
                matcher: Matcher::Environment {
                    shape: shape("verbatim", false, false, 0),
                    nests: false,
                },
                build: |caps, ctx| Some(ctx.protect(code_block("text", trim_one_newline(caps.body())))),
                nested: false,
            },
            Rule {
                name: "minted",
                matcher: Matcher::Environment {
                    shape: shape("minted", false, true, 1),
                    nests: false,
                },
                build: |caps, ctx| {
                    Some(ctx.protect(code_block(caps.arg(0).trim(), trim_one_newline(caps.body()))))
                },
                nested: false,
            },
            Rule {
                name: "lstlisting",
                matcher: Matcher::Environment {
                    shape: shape("lstlisting", false, true, 0),
                    nests: false,
                },
                build: build_lstlisting,
                nested: false,
            },
            Rule {
                name: "mintinline",
                matcher: Matcher::Scan {
                    trigger: r"\mintinline",
                    scan: scan_mintinline,
                },
                build: |caps, ctx| {
                    Some(ctx.protect(inline_code(Some(caps.arg(0)), caps.body())))
                },
                nested: false,
            },
            Rule {
                name: "checkbox-list",
                matcher: Matcher::Environment {
                    shape: shape("itemize", false, false, 0),
                    nests: true,
                },
                build: build_checkbox_list,
                nested: false,
            },
            Rule {
                name: "display-math-brackets",
                matcher: Matcher::Pattern(&DISPLAY_BRACKETS),
                build: |caps, ctx| Some(protect_math(ctx, trim_one_newline(caps.group(0)), true)),
                nested: false,
            },
            Rule {
                name: "display-math-dollars",
                matcher: Matcher::Pattern(&DISPLAY_DOLLARS),
                build: |caps, ctx| Some(protect_math(ctx, trim_one_newline(caps.group(0)), true)),
                nested: false,
            },
            Rule {
                name: "inline-math",
                matcher: Matcher::Pattern(&INLINE_DOLLAR),
                build: |caps, ctx| {
                    let token = protect_math(ctx, caps.group(1), false);
                    Some(format!("{}{}", caps.group(0), token))
                },
                nested: false,
            },
            Rule {
                name: "texttt",
                matcher: Matcher::Command(shape("texttt", false, false, 1)),
                build: build_texttt,
                nested: false,
            },
            Rule {
                name: "hspace",
                matcher: Matcher::Command(shape("hspace", true, false, 1)),
                build: |caps, ctx| {
                    let marker = spacing_marker(Spacing::HSpace {
                        star: caps.star,
                        length: caps.arg(0),
                    });
                    Some(ctx.protect(marker))
                },
                nested: false,
            },
            Rule {
                name: "vspace",
                matcher: Matcher::Command(shape("vspace", true, false, 1)),
                build: |caps, ctx| {
                    let marker = spacing_marker(Spacing::VSpace {
                        star: caps.star,
                        length: caps.arg(0),
                    });
                    Some(ctx.protect(marker))
                },
                nested: false,
            },
            Rule {
                name: "newpage",
                matcher: Matcher::Command(shape("newpage", false, false, 0)),
                build: |_, ctx| Some(ctx.protect(spacing_marker(Spacing::NewPage))),
                nested: false,
            },
        ]
    });
    &RULES
}

fn protect_math(ctx: &mut Context<'_>, expression: &str, display: bool) -> String {
    let preview = render_math(ctx.renderer(), expression, display);
    ctx.protect(math_widget(expression, display, &preview))
}

/// `{\leftskip=<len>\relax ... \par}` with a brace-balanced outer group.
fn scan_leftskip(at: &str) -> Option<(Captures, usize)> {
    let (rest, inner) = lexer::brace_group(at).ok()?;
    let head = LEFTSKIP_HEAD.captures(inner)?;
    let content = inner[head.get(0)?.end()..].trim_end().strip_suffix(r"\par")?;
    let caps = Captures {
        args: vec![head[1].to_string()],
        body: Some(content.to_string()),
        ..Captures::default()
    };
    Some((caps, at.len() - rest.len()))
}

fn build_leftskip(caps: &Captures, ctx: &mut Context<'_>) -> Option<String> {
    let style = latex_length_to_css(caps.arg(0))
        .map(|len| format!(r#" style="margin-left: {}""#, len))
        .unwrap_or_default();
    let inner = latex_to_html(caps.body(), ctx.renderer());
    Some(ctx.protect(format!("<div{}>{}</div>", style, inner)))
}

/// Map a `listings` language name onto the code-block language ids.
pub fn listings_to_code_lang(raw: &str) -> &'static str {
    let l = raw.trim().to_ascii_lowercase();
    match l.as_str() {
        "" | "text" => "text",
        "javascript" | "js" => "javascript",
        "python" | "py" => "python",
        "bash" | "sh" | "shell" => "bash",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "html" => "html",
        "css" => "css",
        "tex" | "latex" => "latex",
        "java" => "java",
        "go" => "go",
        "rust" => "rust",
        "c" => "c",
        "cpp" => "cpp",
        "c#" | "csharp" => "csharp",
        _ if l.contains("c++") => "cpp",
        _ if l.contains("sharp") => "csharp",
        _ => "text",
    }
}

fn build_lstlisting(caps: &Captures, ctx: &mut Context<'_>) -> Option<String> {
    let lang = lexer::key_values(caps.option())
        .into_iter()
        .find(|(k, _)| k == "language")
        .map(|(_, v)| listings_to_code_lang(&v))
        .unwrap_or("text");
    Some(ctx.protect(code_block(lang, trim_one_newline(caps.body()))))
}

/// `\mintinline[opts]{lang}` followed by either `{code}` or `<d>code<d>`.
fn scan_mintinline(at: &str) -> Option<(Captures, usize)> {
    let mint = shape("mintinline", false, true, 1);
    let (rest, header) = lexer::command(at, &mint).ok()?;
    let (rest, code) = match rest.chars().next()? {
        '{' => {
            let (rest, code) = lexer::brace_group(rest).ok()?;
            (rest, code)
        }
        d if !d.is_whitespace() => {
            let after = &rest[d.len_utf8()..];
            let end = after.find(d)?;
            (&after[end + d.len_utf8()..], &after[..end])
        }
        _ => return None,
    };
    let caps = Captures {
        args: vec![header.args.first()?.trim().to_string()],
        body: Some(code.to_string()),
        ..Captures::default()
    };
    Some((caps, at.len() - rest.len()))
}

fn build_texttt(caps: &Captures, ctx: &mut Context<'_>) -> Option<String> {
    let text = unescape_latex(caps.arg(0));
    if strip_zero_width(&text).trim().is_empty() {
        return Some(String::new());
    }
    Some(ctx.protect(inline_code(None, &text)))
}

/// Itemize whose first item carries a `$\square$` label. Declines plain
/// lists so the formatting pass can handle them.
fn build_checkbox_list(caps: &Captures, ctx: &mut Context<'_>) -> Option<String> {
    let body = caps.body().trim_start().strip_prefix(CHECKBOX_ITEM)?;
    let items: String = body
        .split(CHECKBOX_ITEM)
        .map(|item| {
            format!(
                r#"<li><input type="checkbox" disabled> {}</li>"#,
                latex_to_html(item.trim(), ctx.renderer())
            )
        })
        .collect();
    Some(ctx.protect(format!(
        r#"<ul style="list-style-type: none;">{}</ul>"#,
        items
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::rules::apply_all;
    use pretty_assertions::assert_eq;

    fn protect(src: &str) -> (String, String) {
        let mut ctx = Context::new(None);
        let out = apply_all(rules(), src, &mut ctx);
        let restored = ctx.restore(&out);
        (out, restored)
    }

    #[test]
    fn test_listings_aliases() {
        assert_eq!(listings_to_code_lang("Python"), "python");
        assert_eq!(listings_to_code_lang("sh"), "bash");
        assert_eq!(listings_to_code_lang("[Sharp]C"), "csharp");
        assert_eq!(listings_to_code_lang("C++"), "cpp");
        assert_eq!(listings_to_code_lang("Fortran"), "text");
    }

    #[test]
    fn test_math_is_protected() {
        let (out, restored) = protect(r"a $x_1$ b");
        assert_eq!(out, "a __PROTECTED_BLOCK_0__ b");
        assert!(restored.contains(r#"data-latex="x_1""#));
    }

    #[test]
    fn test_display_math_trims_one_newline() {
        let (_, restored) = protect("\\[\n\nx\n\\]");
        assert!(restored.contains(r#"data-latex="%0Ax""#));
    }

    #[test]
    fn test_escaped_dollar_is_not_math() {
        let (out, _) = protect(r"costs \$5 and \$6");
        assert_eq!(out, r"costs \$5 and \$6");
    }

    #[test]
    fn test_checkbox_marker_is_not_math() {
        let (_, restored) = protect("\\begin{itemize}\n\\item[$\\square$] one\n\\item[$\\square$] \\textbf{two}\n\\end{itemize}");
        assert_eq!(
            restored,
            r#"<ul style="list-style-type: none;"><li><input type="checkbox" disabled> one</li><li><input type="checkbox" disabled> <b>two</b></li></ul>"#
        );
    }

    #[test]
    fn test_plain_itemize_is_declined() {
        let src = "\\begin{itemize}\\item a\\end{itemize}";
        assert_eq!(protect(src).0, src);
    }

    #[test]
    fn test_mintinline_forms() {
        let (_, restored) = protect(r"\mintinline{python}|x = {1}| and \mintinline[x]{rust}{a < b}");
        assert!(restored.contains(r#"<code class="texure-inline-code" data-texure-code-lang="python">x = {1}</code>"#));
        assert!(restored.contains(r#"data-texure-code-lang="rust">a &lt; b</code>"#));
    }

    #[test]
    fn test_lstlisting_trims_one_newline() {
        let (_, restored) = protect("\\begin{lstlisting}[language=py]\n\nprint(1)\n\\end{lstlisting}");
        assert!(restored.contains(r#"data-texure-code-lang="python" data-texure-code="%0Aprint(1)""#));
    }

    #[test]
    fn test_blank_texttt_collapses() {
        assert_eq!(protect("a\\texttt{\u{200B} }b").0, "ab");
        assert!(protect(r"\texttt{a\_b}").1.contains(">a_b</code>"));
    }

    #[test]
    fn test_spacing_commands() {
        let (_, restored) = protect(r"\hspace*{2em}\vspace{x}\newpage");
        assert!(restored.contains(r#"data-texure-latex="\hspace*{2em}""#));
        assert!(restored.contains(r#"style="width: 2em""#));
        assert!(restored.contains(r#"data-texure-latex="\vspace{x}""#));
        assert!(restored.contains(r#"data-texure-latex="\newpage""#));
    }

    #[test]
    fn test_leftskip_wrapper() {
        let (_, restored) = protect(r"{\leftskip=10pt\relax Hello {x} \par}");
        assert!(restored.starts_with(r#"<div style="margin-left: 13.333px">"#));
        let (_, unstyled) = protect(r"{\leftskip=12px\relax Hi\par}");
        assert!(unstyled.starts_with("<div>"));
    }
}
