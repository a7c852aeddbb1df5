//! Lightweight syntax highlighting for code-block previews.
//!
//! A sticky tokenizer: at each offset the language's patterns are tried in
//! order and the first one matching exactly at that offset wins. Characters
//! matched by no pattern are emitted escaped and unstyled.

use crate::escape::escape_html;
use regex::Regex;
use std::sync::LazyLock;

/// Token classes emitted as `texure-tok-<kind>` spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    String,
    Keyword,
    Number,
    Variable,
    Tag,
    Operator,
}

impl TokenKind {
    fn class(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::String => "string",
            Self::Keyword => "keyword",
            Self::Number => "number",
            Self::Variable => "variable",
            Self::Tag => "tag",
            Self::Operator => "operator",
        }
    }
}

struct Pattern {
    kind: Option<TokenKind>,
    re: &'static Regex,
    /// Requires a word boundary before the match.
    word_start: bool,
}

macro_rules! anchored {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(concat!("^(?:", $re, ")")).expect("static pattern"));
    };
}

anchored!(WHITESPACE, r"\s+");
anchored!(HTML_TAG, r"</?[A-Za-z][^>]*>");
anchored!(LINE_COMMENT, r"//[^\n]*");
anchored!(BLOCK_COMMENT, r"/\*(?s:.)*?\*/");
anchored!(HASH_COMMENT, r"#[^\n]*");
anchored!(PERCENT_COMMENT, r"%[^\n]*");
anchored!(TEMPLATE_STRING, r"`(?:\\(?s:.)|[^`\\])*`");
anchored!(DOUBLE_STRING, r#""(?:\\.|[^"\\])*""#);
anchored!(SINGLE_STRING, r"'(?:\\.|[^'\\])*'");
anchored!(TRIPLE_SINGLE, r"'''(?s:.)*?'''");
anchored!(TRIPLE_DOUBLE, r#""""(?s:.)*?""""#);
anchored!(NUMBER, r"\d+(?:\.\d+)?\b");
anchored!(SHELL_VARIABLE, r"\$[A-Za-z_][A-Za-z0-9_]*");
anchored!(TEX_COMMAND, r"\\[A-Za-z@]+");
anchored!(OPERATOR, r"[=<>!:+\-*/]+");
anchored!(
    JS_KEYWORDS,
    r"(?:const|let|var|function|return|if|else|for|while|switch|case|break|continue|class|extends|new|try|catch|finally|throw|import|from|export|default|async|await|typeof|instanceof|true|false|null|undefined)\b"
);
anchored!(
    PYTHON_KEYWORDS,
    r"(?:def|return|if|elif|else|for|while|break|continue|class|import|from|as|try|except|finally|raise|with|lambda|pass|True|False|None|async|await)\b"
);
anchored!(JSON_KEYWORDS, r"(?:true|false|null)\b");
anchored!(
    BASH_KEYWORDS,
    r"(?:if|then|fi|for|in|do|done|case|esac|while|until|function)\b"
);

fn is_c_family(lang: &str) -> bool {
    matches!(
        lang,
        "javascript" | "typescript" | "java" | "c" | "cpp" | "csharp" | "go" | "rust"
    )
}

fn patterns_for(lang: &str) -> Vec<Pattern> {
    let p = |kind, re: &'static LazyLock<Regex>| Pattern {
        kind,
        re: LazyLock::force(re),
        word_start: false,
    };
    let mut patterns = vec![p(None, &WHITESPACE)];

    if lang == "html" {
        patterns.push(p(Some(TokenKind::Tag), &HTML_TAG));
    }

    if is_c_family(lang) || lang == "css" {
        patterns.push(p(Some(TokenKind::Comment), &LINE_COMMENT));
        patterns.push(p(Some(TokenKind::Comment), &BLOCK_COMMENT));
    } else if matches!(lang, "python" | "bash" | "yaml") {
        patterns.push(p(Some(TokenKind::Comment), &HASH_COMMENT));
    } else if lang == "latex" {
        patterns.push(p(Some(TokenKind::Comment), &PERCENT_COMMENT));
    }

    let strings: Vec<&'static LazyLock<Regex>> = match lang {
        "javascript" | "typescript" => vec![&TEMPLATE_STRING, &DOUBLE_STRING, &SINGLE_STRING],
        "python" => vec![&TRIPLE_SINGLE, &TRIPLE_DOUBLE, &DOUBLE_STRING, &SINGLE_STRING],
        "json" => vec![&DOUBLE_STRING],
        _ => vec![&DOUBLE_STRING, &SINGLE_STRING],
    };
    patterns.extend(strings.into_iter().map(|re| p(Some(TokenKind::String), re)));

    patterns.push(Pattern {
        word_start: true,
        ..p(Some(TokenKind::Number), &NUMBER)
    });

    if lang == "bash" {
        patterns.push(p(Some(TokenKind::Variable), &SHELL_VARIABLE));
    }
    if lang == "latex" {
        patterns.push(p(Some(TokenKind::Keyword), &TEX_COMMAND));
    }

    let keywords: Option<&'static LazyLock<Regex>> = match lang {
        "javascript" | "typescript" => Some(&JS_KEYWORDS),
        "python" => Some(&PYTHON_KEYWORDS),
        "json" => Some(&JSON_KEYWORDS),
        "bash" => Some(&BASH_KEYWORDS),
        _ => None,
    };
    if let Some(re) = keywords {
        patterns.push(Pattern {
            word_start: true,
            ..p(Some(TokenKind::Keyword), re)
        });
    }

    if is_c_family(lang) || matches!(lang, "python" | "bash") {
        patterns.push(p(Some(TokenKind::Operator), &OPERATOR));
    }
    patterns
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn wrap(out: &mut String, kind: Option<TokenKind>, text: &str) {
    match kind {
        Some(kind) => {
            out.push_str("<span class=\"texure-tok texure-tok-");
            out.push_str(kind.class());
            out.push_str("\">");
            out.push_str(&escape_html(text));
            out.push_str("</span>");
        }
        None => out.push_str(&escape_html(text)),
    }
}

/// Highlight `code` as `lang`, returning escaped markup with token spans.
/// Unknown languages only get string and number highlighting.
pub fn highlight_code(lang: &str, code: &str) -> String {
    let lang = match lang.trim().to_ascii_lowercase().as_str() {
        "ts" => "typescript".to_string(),
        "js" => "javascript".to_string(),
        other => other.to_string(),
    };
    let patterns = patterns_for(&lang);

    let mut out = String::with_capacity(code.len() * 2);
    let mut i = 0;
    while i < code.len() {
        let rest = &code[i..];
        let prev_is_word = code[..i].chars().next_back().is_some_and(is_word_char);
        let hit = patterns.iter().find_map(|pat| {
            if pat.word_start && prev_is_word {
                return None;
            }
            pat.re
                .find(rest)
                .filter(|m| !m.as_str().is_empty())
                .map(|m| (pat.kind, m.end()))
        });
        match hit {
            Some((kind, len)) => {
                wrap(&mut out, kind, &rest[..len]);
                i += len;
            }
            None => {
                let len = rest.chars().next().map_or(1, char::len_utf8);
                wrap(&mut out, None, &rest[..len]);
                i += len;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_highlight_keywords_and_strings() {
        let html = highlight_code("js", "const s = \"a<b\";");
        assert!(html.starts_with("<span class=\"texure-tok texure-tok-keyword\">const</span>"));
        assert!(html.contains("<span class=\"texure-tok texure-tok-string\">&quot;a&lt;b&quot;</span>"));
        assert!(html.contains("texure-tok-operator\">=</span>"));
    }

    #[test]
    fn test_numbers_need_word_boundary() {
        let html = highlight_code("python", "x1 = 42");
        assert!(!html.contains(">1</span>"));
        assert!(html.contains("texure-tok-number\">42</span>"));
    }

    #[test]
    fn test_comments_by_language() {
        assert!(highlight_code("bash", "# hi").contains("texure-tok-comment\"># hi</span>"));
        assert!(highlight_code("latex", "% note\n\\foo")
            .contains("texure-tok-keyword\">\\foo</span>"));
        assert!(highlight_code("rust", "/* a\nb */").contains("texure-tok-comment"));
    }

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(highlight_code("text", "a & b"), "a &amp; b");
        assert_eq!(highlight_code("text", ""), "");
    }
}
