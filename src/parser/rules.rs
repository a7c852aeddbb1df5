//! Ordered rewrite rules.
//!
//! A [`Rule`] pairs a [`Matcher`] with a builder. Rules are applied one at a
//! time over the whole text, left to right, without overlap. A builder that
//! returns `None` declines the match and the source text stays literal.

use super::lexer::{self, Shape};
use crate::escape::unescape_latex;
use crate::render::math::MathRenderer;
use regex::Regex;
use std::sync::LazyLock;

const TOKEN_STEM: &str = "PROTECTED_BLOCK";

/// State shared by the rules of one conversion.
pub struct Context<'r> {
    protected: Vec<String>,
    renderer: Option<&'r dyn MathRenderer>,
    stem: String,
}

impl<'r> Context<'r> {
    pub fn new(renderer: Option<&'r dyn MathRenderer>) -> Self {
        Self {
            protected: Vec::new(),
            renderer,
            stem: TOKEN_STEM.to_string(),
        }
    }

    /// Lengthen the placeholder stem until neither `source` nor its
    /// LaTeX-unescaped form contains it, so text can never spell a token.
    pub fn avoiding(mut self, source: &str) -> Self {
        let plain = unescape_latex(source);
        while source.contains(&self.stem) || plain.contains(&self.stem) {
            self.stem.push('X');
        }
        self
    }

    pub fn renderer(&self) -> Option<&'r dyn MathRenderer> {
        self.renderer
    }

    /// Stash finished markup and return the placeholder standing in for it.
    pub fn protect(&mut self, markup: String) -> String {
        self.protected.push(markup);
        format!("__{}_{}__", self.stem, self.protected.len() - 1)
    }

    /// Substitute every placeholder with its stashed markup. Tokens that do
    /// not name a stashed block are left alone.
    pub fn restore(&self, text: &str) -> String {
        let open = format!("__{}_", self.stem);
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find(&open) {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + open.len()..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();
            let block = after[digits..]
                .starts_with("__")
                .then(|| after[..digits].parse::<usize>().ok())
                .flatten()
                .and_then(|i| self.protected.get(i));
            match block {
                Some(markup) => {
                    out.push_str(markup);
                    rest = &after[digits + 2..];
                }
                None => {
                    out.push_str(&open);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// What a matcher captured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captures {
    pub star: bool,
    pub optional: Option<String>,
    pub args: Vec<String>,
    pub body: Option<String>,
    /// Regex capture groups 1.., empty when a group did not participate.
    pub groups: Vec<String>,
}

impl Captures {
    pub fn arg(&self, i: usize) -> &str {
        self.args.get(i).map(String::as_str).unwrap_or_default()
    }

    pub fn group(&self, i: usize) -> &str {
        self.groups.get(i).map(String::as_str).unwrap_or_default()
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn option(&self) -> &str {
        self.optional.as_deref().unwrap_or_default()
    }
}

/// Custom scanner: tried at each occurrence of a trigger, returns the
/// captures and the number of bytes consumed.
pub type ScanFn = fn(&str) -> Option<(Captures, usize)>;

/// How a rule finds its matches.
pub enum Matcher {
    /// Regular expression; groups land in [`Captures::groups`].
    Pattern(&'static LazyLock<Regex>),
    /// `\name*[opt]{arg}...`, brace-balanced.
    Command(Shape),
    /// `\begin{name}[opt]{arg}... \end{name}`.
    Environment { shape: Shape, nests: bool },
    /// Hand-written scanner started at each `trigger`.
    Scan {
        trigger: &'static str,
        scan: ScanFn,
    },
}

pub type BuildFn = fn(&Captures, &mut Context<'_>) -> Option<String>;

pub struct Rule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub build: BuildFn,
    /// Apply the rule to arguments and bodies before building, so nested
    /// occurrences are rewritten innermost-first.
    pub nested: bool,
}

impl Rule {
    /// Rewrite every match of this rule in `text`.
    pub fn apply(&self, text: &str, ctx: &mut Context<'_>) -> String {
        match &self.matcher {
            Matcher::Pattern(re) => self.apply_pattern(re, text, ctx),
            Matcher::Command(shape) => {
                let trigger = format!("\\{}", shape.name);
                self.apply_scanner(&trigger, text, ctx, |at| {
                    let (rest, parts) = lexer::command(at, shape).ok()?;
                    let caps = Captures {
                        star: parts.star,
                        optional: parts.optional.map(String::from),
                        args: parts.args.into_iter().map(String::from).collect(),
                        ..Captures::default()
                    };
                    Some((caps, at.len() - rest.len()))
                })
            }
            Matcher::Environment { shape, nests } => {
                let trigger = format!("\\begin{{{}}}", shape.name);
                self.apply_scanner(&trigger, text, ctx, |at| {
                    let (rest, (parts, body)) = lexer::environment(at, shape, *nests).ok()?;
                    let caps = Captures {
                        star: parts.star,
                        optional: parts.optional.map(String::from),
                        args: parts.args.into_iter().map(String::from).collect(),
                        body: Some(body.to_string()),
                        ..Captures::default()
                    };
                    Some((caps, at.len() - rest.len()))
                })
            }
            Matcher::Scan { trigger, scan } => self.apply_scanner(trigger, text, ctx, *scan),
        }
    }

    fn apply_pattern(&self, re: &Regex, text: &str, ctx: &mut Context<'_>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in re.captures_iter(text) {
            let Some(whole) = m.get(0) else { continue };
            let caps = Captures {
                groups: m
                    .iter()
                    .skip(1)
                    .map(|g| g.map_or_else(String::new, |g| g.as_str().to_string()))
                    .collect(),
                ..Captures::default()
            };
            out.push_str(&text[last..whole.start()]);
            match (self.build)(&caps, ctx) {
                Some(replacement) => out.push_str(&replacement),
                None => out.push_str(whole.as_str()),
            }
            last = whole.end();
        }
        out.push_str(&text[last..]);
        out
    }

    fn apply_scanner<F>(&self, trigger: &str, text: &str, ctx: &mut Context<'_>, scan: F) -> String
    where
        F: Fn(&str) -> Option<(Captures, usize)>,
    {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find(trigger) {
            out.push_str(&rest[..pos]);
            let at = &rest[pos..];
            if let Some((caps, consumed)) = scan(at) {
                let caps = if self.nested {
                    self.rewrite_inner(caps, ctx)
                } else {
                    caps
                };
                if let Some(replacement) = (self.build)(&caps, ctx) {
                    tracing::trace!(rule = self.name, "rewrote construct");
                    out.push_str(&replacement);
                    rest = &at[consumed..];
                    continue;
                }
            }
            out.push_str(trigger);
            rest = &at[trigger.len()..];
        }
        out.push_str(rest);
        out
    }

    fn rewrite_inner(&self, mut caps: Captures, ctx: &mut Context<'_>) -> Captures {
        caps.args = caps.args.iter().map(|a| self.apply(a, ctx)).collect();
        caps.body = caps.body.map(|b| self.apply(&b, ctx));
        caps
    }
}

/// Apply `rules` in order.
pub fn apply_all(rules: &[Rule], text: &str, ctx: &mut Context<'_>) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc, ctx))
}
