//! Preamble helpers: splitting a document around its body and keeping the
//! `\usepackage` lines in step with the commands the body uses.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const BEGIN_DOCUMENT: &str = r"\begin{document}";
const END_DOCUMENT: &str = r"\end{document}";

/// Preamble used when the source has no document environment.
pub const DEFAULT_PREAMBLE: &str = "\\documentclass{article}\n\\begin{document}";
/// Closing used when the source has no document environment.
pub const DEFAULT_POSTAMBLE: &str = r"\end{document}";

/// Starter document for a new editor session.
pub const DEFAULT_DOCUMENT: &str = r"\documentclass{article}
\usepackage{graphicx}
\usepackage{xcolor}
\usepackage{hyperref}

\begin{document}

\section{Rich Text and Math Demo}

Welcome to \textbf{texure}. Click the equation below to edit it!

\subsection{Math Equations}
Here is a display equation:

\[ E = \frac{1}{2}mv^2 \]

And here is an inline equation: $ a^2 + b^2 = c^2 $.

\end{document}";

static USEPACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\usepackage(?:\[[^\]]*\])?\{([^}]*)\}").expect("static pattern")
});
static GRAPHICS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\includegraphics\b").expect("static pattern"));
static JUSTIFY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\begin\{justify\}|\\justifying\b|\\justify\{").expect("static pattern")
});
static LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\href\{|\\url\{|\\hyperref\[").expect("static pattern"));
static LISTINGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\begin\{minted\}|\\mintinline\b|\\begin\{lstlisting\}|\\lstinline\b")
        .expect("static pattern")
});
static COLORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\textcolor\{|\\colorbox\{").expect("static pattern"));

/// A document split around its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentParts {
    /// Everything up to and including `\begin{document}`.
    pub preamble: String,
    pub body: String,
    /// `\end{document}` and everything after it.
    pub postamble: String,
}

impl DocumentParts {
    /// Rebuild the document around a new body.
    pub fn assemble(&self, body: &str) -> String {
        format!("{}\n\n{}\n\n{}", self.preamble, body.trim(), self.postamble)
    }
}

/// Split `latex` at its document environment. Without one, the whole input
/// is the body and a minimal preamble is supplied.
pub fn split_document(latex: &str) -> DocumentParts {
    let Some(begin) = latex.find(BEGIN_DOCUMENT) else {
        return DocumentParts {
            preamble: DEFAULT_PREAMBLE.to_string(),
            body: latex.to_string(),
            postamble: DEFAULT_POSTAMBLE.to_string(),
        };
    };
    let body_start = begin + BEGIN_DOCUMENT.len();
    let (body, postamble) = match latex[body_start..].find(END_DOCUMENT) {
        Some(end) => (
            &latex[body_start..body_start + end],
            &latex[body_start + end..],
        ),
        None => (&latex[body_start..], DEFAULT_POSTAMBLE),
    };
    DocumentParts {
        preamble: latex[..body_start].to_string(),
        body: body.to_string(),
        postamble: postamble.to_string(),
    }
}

/// Packages the body's commands need, in a stable order.
pub fn infer_required_packages(body: &str) -> Vec<&'static str> {
    let checks: [(&LazyLock<Regex>, &str); 5] = [
        (&GRAPHICS, "graphicx"),
        (&JUSTIFY, "ragged2e"),
        (&LINKS, "hyperref"),
        (&LISTINGS, "listings"),
        (&COLORS, "xcolor"),
    ];
    checks
        .into_iter()
        .filter(|(re, _)| re.is_match(body))
        .map(|(_, package)| package)
        .collect()
}

/// Packages already loaded by the preamble, including every name of a
/// multi-package `\usepackage[..]{a,b}`.
pub fn loaded_packages(preamble: &str) -> BTreeSet<&str> {
    USEPACKAGE
        .captures_iter(preamble)
        .filter_map(|caps| caps.get(1))
        .flat_map(|m| m.as_str().split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Insert a `\usepackage` line for each missing package, just before
/// `\begin{document}`, or at the end when there is none.
pub fn ensure_packages(preamble: &str, packages: &[&str]) -> String {
    let loaded = loaded_packages(preamble);
    let mut seen = BTreeSet::new();
    let missing: Vec<&str> = packages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty() && !loaded.contains(p) && seen.insert(*p))
        .collect();
    if missing.is_empty() {
        return preamble.to_string();
    }
    let block: String = missing
        .iter()
        .map(|p| format!("\\usepackage{{{}}}\n", p))
        .collect();
    match preamble.find(BEGIN_DOCUMENT) {
        Some(at) => format!("{}{}{}", &preamble[..at], block, &preamble[at..]),
        None => format!("{}\n{}", preamble.trim_end(), block),
    }
}
