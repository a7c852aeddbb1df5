//! Formatting-pass rules, run after protection and HTML escaping.
//!
//! Arguments arrive already HTML-escaped, so builders splice them into
//! markup as they are.

use super::lexer::{self, Shape};
use super::rules::{Captures, Context, Matcher, Rule};
use crate::ast::{Image, ImageSource, Style};
use crate::escape::unescape_html;
use crate::render::html::{image, vocab};
use crate::style::{font_size_points, format_number};
use regex::Regex;
use std::sync::LazyLock;

static SIZE_SWITCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\\(tiny|scriptsize|footnotesize|small|normalsize|large|Large|LARGE|huge|Huge)\s+([^\\\n]*)",
    )
    .expect("static pattern")
});
static COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[a-zA-Z]+|#[0-9a-fA-F]{6})$").expect("static pattern"));
static LINEWIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)?\s*\\linewidth$").expect("static pattern")
});

const fn command(name: &'static str, star: bool, args: usize) -> Matcher {
    Matcher::Command(Shape {
        name,
        star,
        optional: false,
        args,
    })
}

const fn environment(name: &'static str) -> Matcher {
    Matcher::Environment {
        shape: Shape {
            name,
            star: false,
            optional: false,
            args: 0,
        },
        nests: true,
    }
}

fn wrap(tag: &str, open: &str, inner: &str) -> String {
    format!("<{}{}>{}</{}>", tag, open, inner, tag)
}

/// Formatting rules in application order.
pub fn rules() -> &'static [Rule] {
    static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
        vec![
            Rule {
                name: "section",
                matcher: command("section", true, 1),
                build: |c, _| Some(wrap("h1", "", c.arg(0))),
                nested: true,
            },
            Rule {
                name: "subsection",
                matcher: command("subsection", true, 1),
                build: |c, _| Some(wrap("h2", "", c.arg(0))),
                nested: true,
            },
            Rule {
                name: "subsubsection",
                matcher: command("subsubsection", true, 1),
                build: |c, _| Some(wrap("h3", "", c.arg(0))),
                nested: true,
            },
            Rule {
                name: "paragraph",
                matcher: command("paragraph", true, 1),
                build: |c, _| Some(wrap("h4", "", c.arg(0))),
                nested: true,
            },
            Rule {
                name: "textbf",
                matcher: command("textbf", false, 1),
                build: |c, _| Some(wrap("b", "", c.arg(0))),
                nested: true,
            },
            Rule {
                name: "textit",
                matcher: command("textit", false, 1),
                build: |c, _| Some(wrap("i", "", c.arg(0))),
                nested: true,
            },
            Rule {
                name: "underline",
                matcher: command("underline", false, 1),
                build: |c, _| Some(wrap("u", "", c.arg(0))),
                nested: true,
            },
            Rule {
                name: "textsf",
                matcher: command("textsf", false, 1),
                build: |c, _| {
                    Some(wrap("span", r#" style="font-family: sans-serif""#, c.arg(0)))
                },
                nested: true,
            },
            Rule {
                name: "size-switch",
                matcher: Matcher::Pattern(&SIZE_SWITCH),
                build: build_size_switch,
                nested: false,
            },
            Rule {
                name: "textcolor",
                matcher: command("textcolor", false, 2),
                build: |c, _| color_span("color", c),
                nested: true,
            },
            Rule {
                name: "colorbox",
                matcher: command("colorbox", false, 2),
                build: |c, _| color_span("background-color", c),
                nested: true,
            },
            Rule {
                name: "center",
                matcher: environment("center"),
                build: |c, _| Some(aligned("center", c.body())),
                nested: true,
            },
            Rule {
                name: "flushleft",
                matcher: environment("flushleft"),
                build: |c, _| Some(aligned("left", c.body())),
                nested: true,
            },
            Rule {
                name: "flushright",
                matcher: environment("flushright"),
                build: |c, _| Some(aligned("right", c.body())),
                nested: true,
            },
            Rule {
                name: "justify-env",
                matcher: environment("justify"),
                build: |c, _| Some(aligned("justify", c.body())),
                nested: true,
            },
            Rule {
                name: "justify",
                matcher: command("justify", false, 1),
                build: |c, _| Some(aligned("justify", c.arg(0))),
                nested: true,
            },
            Rule {
                name: "quote",
                matcher: environment("quote"),
                build: |c, _| Some(wrap("blockquote", "", c.body())),
                nested: true,
            },
            Rule {
                name: "quotation",
                matcher: environment("quotation"),
                build: |c, _| Some(wrap("blockquote", "", c.body())),
                nested: true,
            },
            Rule {
                name: "href",
                matcher: command("href", false, 2),
                build: |c, _| {
                    Some(wrap("a", &format!(r#" href="{}""#, c.arg(0).trim()), c.arg(1)))
                },
                nested: true,
            },
            Rule {
                name: "includegraphics",
                matcher: Matcher::Command(Shape {
                    name: "includegraphics",
                    star: false,
                    optional: true,
                    args: 1,
                }),
                build: build_graphics,
                nested: false,
            },
            Rule {
                name: "itemize",
                matcher: environment("itemize"),
                build: |c, _| Some(list("ul", c.body())),
                nested: true,
            },
            Rule {
                name: "enumerate",
                matcher: environment("enumerate"),
                build: |c, _| Some(list("ol", c.body())),
                nested: true,
            },
        ]
    });
    &RULES
}

fn build_size_switch(caps: &Captures, _: &mut Context<'_>) -> Option<String> {
    let pt = font_size_points(caps.group(0))?;
    Some(wrap(
        "span",
        &format!(r#" style="font-size: {}pt""#, format_number(pt)),
        caps.group(1),
    ))
}

/// Color commands accept a name or `#rrggbb`; anything else stays literal.
fn color_span(property: &str, caps: &Captures) -> Option<String> {
    let color = caps.arg(0).trim();
    if !COLOR.is_match(color) {
        return None;
    }
    Some(wrap(
        "span",
        &format!(r#" style="{}: {}""#, property, color),
        caps.arg(1),
    ))
}

fn aligned(align: &str, inner: &str) -> String {
    wrap("div", &format!(r#" style="text-align: {}""#, align), inner)
}

/// Split a list body on `\item` at environment depth zero, so items of a
/// not yet converted inner list stay together.
fn split_items(body: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let (mut depth, mut start, mut i) = (0usize, 0, 0);
    while let Some(c) = body[i..].chars().next() {
        let rest = &body[i..];
        if rest.starts_with(r"\begin{") {
            depth += 1;
            i += r"\begin{".len();
        } else if rest.starts_with(r"\end{") {
            depth = depth.saturating_sub(1);
            i += r"\end{".len();
        } else if depth == 0 && lexer::control_word(rest, "item").is_ok() {
            items.push(&body[start..i]);
            i += r"\item".len();
            start = i;
        } else {
            i += c.len_utf8();
        }
    }
    items.push(&body[start..]);
    items
}

fn list(tag: &str, body: &str) -> String {
    let items: String = split_items(body)
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| wrap("li", "", item))
        .collect();
    wrap(tag, "", &items)
}

/// Width of `width=N\linewidth`; a bare `\linewidth` is the full line.
fn linewidth_fraction(value: &str) -> Option<f64> {
    let caps = LINEWIDTH.captures(value.trim())?;
    match caps.get(1) {
        Some(n) => n.as_str().parse().ok(),
        None => Some(1.0),
    }
}

fn build_graphics(caps: &Captures, _: &mut Context<'_>) -> Option<String> {
    let (mut width, mut angle) = (None, None);
    match &caps.optional {
        None => width = Some(1.0),
        Some(options) => {
            for (key, value) in lexer::key_values(options) {
                match key.as_str() {
                    "width" => width = linewidth_fraction(&value),
                    "angle" => angle = value.parse::<f64>().ok().filter(|a| a.is_finite()),
                    _ => {}
                }
            }
        }
    }
    let src = unescape_html(caps.arg(0).trim());
    let source = match src.strip_prefix(vocab::IMAGE_PREFIX) {
        Some(id) => ImageSource::Local(id.to_string()),
        None => ImageSource::Url(src),
    };
    Some(image(&Image {
        source,
        width,
        angle,
        style: Style::default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::rules::apply_all;
    use super::*;
    use pretty_assertions::assert_eq;

    fn format(src: &str) -> String {
        let mut ctx = Context::new(None);
        apply_all(rules(), src, &mut ctx)
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            format(r"\section*{A \textbf{b}}\paragraph{P}"),
            "<h1>A <b>b</b></h1><h4>P</h4>"
        );
    }

    #[test]
    fn test_nested_emphasis() {
        assert_eq!(
            format(r"\textbf{a \textit{b \textbf{c}}}"),
            "<b>a <i>b <b>c</b></i></b>"
        );
    }

    #[test]
    fn test_size_switch_runs_to_next_command() {
        assert_eq!(
            format("\\Large big words\nnext \\tiny"),
            "<span style=\"font-size: 14.4pt\">big words</span>\nnext \\tiny"
        );
    }

    #[test]
    fn test_colors() {
        assert_eq!(
            format(r"\textcolor{#FF0000}{red}\colorbox{yellow}{hi}"),
            r#"<span style="color: #FF0000">red</span><span style="background-color: yellow">hi</span>"#
        );
        assert_eq!(format(r"\textcolor{red!50}{x}"), r"\textcolor{red!50}{x}");
    }

    #[test]
    fn test_nested_alignment() {
        assert_eq!(
            format(r"\begin{center}a\begin{center}b\end{center}\end{center}"),
            r#"<div style="text-align: center">a<div style="text-align: center">b</div></div>"#
        );
        assert_eq!(
            format(r"\justify{t}"),
            r#"<div style="text-align: justify">t</div>"#
        );
    }

    #[test]
    fn test_nested_lists() {
        let src = "\\begin{itemize}\n\\item one\n\\item\n\\begin{enumerate}\\item a\\end{enumerate}\n\\end{itemize}";
        assert_eq!(
            format(src),
            "<ul><li>one</li><li><ol><li>a</li></ol></li></ul>"
        );
    }

    #[test]
    fn test_graphics_options() {
        let html = format(r"\includegraphics[width=0.5\linewidth, angle=90, scale=2]{texure-image:abc}");
        assert!(html.contains(r#"data-texure-image-id="abc" data-texure-img-width="0.5" data-texure-img-angle="90""#));

        let plain = format(r"\includegraphics{https://x.test/a.png?a=1&amp;b=2}");
        assert!(plain.contains(r#"src="https://x.test/a.png?a=1&amp;b=2" data-texure-img-width="1""#));

        let bare = format(r"\includegraphics[width=\linewidth]{a.png}");
        assert!(bare.contains(r#"data-texure-img-width="1""#));
    }

    #[test]
    fn test_href() {
        assert_eq!(
            format(r"\href{https://a.test}{\textit{site}}"),
            r#"<a href="https://a.test"><i>site</i></a>"#
        );
    }
}
