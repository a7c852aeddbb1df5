//! One-line summaries of TeX compiler logs.

use regex::Regex;
use std::sync::LazyLock;

static LINE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"l\.(\d+)").expect("static pattern"));
static ERROR_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error").expect("static pattern"));

/// Summarize a compile log.
///
/// Preference order: the first `!` error (with ` at line N` when the next
/// line carries `l.N`), the first `Overfull` box warning, the first
/// `Underfull` one, the first line mentioning an error. Returns an empty
/// string when nothing matches.
pub fn summarize_latex_log(log: &str) -> String {
    let lines: Vec<&str> = log.lines().collect();

    if let Some(i) = lines.iter().position(|l| l.trim_start().starts_with('!')) {
        let message = lines[i].trim_start();
        let message = message.strip_prefix('!').unwrap_or(message).trim_start();
        let location = lines
            .get(i + 1)
            .and_then(|next| LINE_NUMBER.captures(next))
            .map(|caps| format!(" at line {}", &caps[1]))
            .unwrap_or_default();
        return format!("{}{}", message, location).trim().to_string();
    }

    ["Overfull", "Underfull"]
        .iter()
        .find_map(|needle| lines.iter().find(|l| l.contains(needle)))
        .or_else(|| lines.iter().find(|l| ERROR_WORD.is_match(l)))
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bang_error_with_line() {
        let log = "This is pdfTeX\n! Undefined control sequence.\nl.12 \\foo\n";
        assert_eq!(summarize_latex_log(log), "Undefined control sequence. at line 12");
    }

    #[test]
    fn test_bang_error_without_line() {
        assert_eq!(
            summarize_latex_log("!  Emergency stop.\r\n*** (job aborted)"),
            "Emergency stop."
        );
    }

    #[test]
    fn test_bang_error_keeps_later_bangs() {
        assert_eq!(summarize_latex_log("!! Double bang\n"), "! Double bang");
    }

    #[test]
    fn test_box_warnings_and_fallbacks() {
        let log = "Underfull \\hbox (badness 10000)\n  Overfull \\hbox (3.0pt too wide)  \n";
        assert_eq!(summarize_latex_log(log), "Overfull \\hbox (3.0pt too wide)");
        assert_eq!(
            summarize_latex_log("ok\nPackage foo Error: bad option\n"),
            "Package foo Error: bad option"
        );
        assert_eq!(summarize_latex_log(""), "");
        assert_eq!(summarize_latex_log("Output written on a.pdf"), "");
    }
}
