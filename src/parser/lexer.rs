//! Scanners for LaTeX command and environment syntax.
//!
//! Arguments are brace-balanced: `{a {b} c}` is one argument. A backslash
//! always consumes the following character, so `\{` and `\}` never open or
//! close a group.

use nom::{
    bytes::complete::tag,
    character::complete::{char, multispace0, satisfy},
    combinator::{not, opt},
    error::{Error, ErrorKind},
    IResult,
};

fn fail<T>(input: &str, kind: ErrorKind) -> IResult<&str, T> {
    Err(nom::Err::Error(Error::new(input, kind)))
}

/// Scan a delimited group, returning the inner text. Braces nest inside the
/// group; `close` only terminates it at brace depth zero.
fn delimited_group(input: &str, open: char, close: char) -> IResult<&str, &str> {
    let (rest, _) = char(open)(input)?;
    let mut depth = 0usize;
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if c == close && depth == 0 => {
                return Ok((&rest[i + c.len_utf8()..], &rest[..i]));
            }
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    fail(input, ErrorKind::Char)
}

/// Parse `{...}` and return the inner text.
pub fn brace_group(input: &str) -> IResult<&str, &str> {
    delimited_group(input, '{', '}')
}

/// Parse `[...]` and return the inner text. A `]` inside braces does not
/// close the option.
pub fn bracket_option(input: &str) -> IResult<&str, &str> {
    delimited_group(input, '[', ']')
}

/// Match `\name` not followed by another letter.
pub fn control_word<'a>(input: &'a str, name: &str) -> IResult<&'a str, &'a str> {
    let (rest, _) = char('\\')(input)?;
    let (rest, word) = tag(name)(rest)?;
    let (rest, _) = not(satisfy(|c: char| c.is_ascii_alphabetic()))(rest)?;
    Ok((rest, word))
}

/// Shape of a command or environment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub name: &'static str,
    /// Accept a `*` variant.
    pub star: bool,
    /// Accept one `[...]` option.
    pub optional: bool,
    /// Number of mandatory `{...}` arguments.
    pub args: usize,
}

/// Parts of a parsed command header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header<'a> {
    pub star: bool,
    pub optional: Option<&'a str>,
    pub args: Vec<&'a str>,
}

/// Parse star, option and arguments after a command name.
fn header<'a>(input: &'a str, shape: &Shape) -> IResult<&'a str, Header<'a>> {
    let (mut rest, star) = if shape.star {
        let (rest, star) = opt(char('*'))(input)?;
        (rest, star.is_some())
    } else {
        (input, false)
    };
    let mut parts = Header {
        star,
        ..Header::default()
    };
    if shape.optional {
        let (r, _) = multispace0(rest)?;
        if let Ok((r, option)) = bracket_option(r) {
            parts.optional = Some(option);
            rest = r;
        }
    }
    for _ in 0..shape.args {
        let (r, _) = multispace0(rest)?;
        let (r, arg) = brace_group(r)?;
        parts.args.push(arg);
        rest = r;
    }
    Ok((rest, parts))
}

/// Parse a full command `\name*[opt]{arg}...` according to `shape`.
pub fn command<'a>(input: &'a str, shape: &Shape) -> IResult<&'a str, Header<'a>> {
    let (rest, _) = control_word(input, shape.name)?;
    header(rest, shape)
}

/// Parse `\begin{name}[opt]{arg}... body \end{name}`. With `nests`, inner
/// environments of the same name are balanced; otherwise the first
/// `\end{name}` closes the body.
pub fn environment<'a>(
    input: &'a str,
    shape: &Shape,
    nests: bool,
) -> IResult<&'a str, (Header<'a>, &'a str)> {
    let begin = format!("\\begin{{{}}}", shape.name);
    let end = format!("\\end{{{}}}", shape.name);
    let (rest, _) = tag(begin.as_str())(input)?;
    let (body_start, parts) = header(rest, shape)?;

    let mut depth = 0usize;
    let mut pos = 0usize;
    loop {
        let tail = &body_start[pos..];
        let next_end = match tail.find(&end) {
            Some(i) => i,
            None => return fail(input, ErrorKind::TakeUntil),
        };
        let next_begin = if nests { tail.find(&begin) } else { None };
        match next_begin {
            Some(b) if b < next_end => {
                depth += 1;
                pos += b + begin.len();
            }
            _ if depth > 0 => {
                depth -= 1;
                pos += next_end + end.len();
            }
            _ => {
                let body = &body_start[..pos + next_end];
                let rest = &body_start[pos + next_end + end.len()..];
                return Ok((rest, (parts, body)));
            }
        }
    }
}

/// Split a `key=value,key=value` option list. Keys are lower-cased; entries
/// without a key are skipped.
pub fn key_values(options: &str) -> Vec<(String, String)> {
    options
        .split(',')
        .filter_map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            let key = key.trim().to_ascii_lowercase();
            (!key.is_empty()).then(|| (key, value.trim().to_string()))
        })
        .collect()
}
