//! Length, color, and font-size conversions between CSS and LaTeX.
//!
//! All conversions are total: malformed input yields `None` and the caller
//! omits the feature instead of emitting broken output.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit0, digit1, hex_digit1, multispace0, space0},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};

/// Units understood by the length grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Pt,
    Px,
    Em,
    Ex,
    Rem,
    Cm,
    Mm,
    In,
    Mu,
    Percent,
}

impl LengthUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::Px => "px",
            Self::Em => "em",
            Self::Ex => "ex",
            Self::Rem => "rem",
            Self::Cm => "cm",
            Self::Mm => "mm",
            Self::In => "in",
            Self::Mu => "mu",
            Self::Percent => "%",
        }
    }
}

/// A parsed length such as `1.5em`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

/// Units accepted in LaTeX source lengths (`\leftskip`).
const LATEX_UNITS: &[LengthUnit] = &[
    LengthUnit::Pt,
    LengthUnit::Em,
    LengthUnit::Ex,
    LengthUnit::Cm,
    LengthUnit::Mm,
    LengthUnit::In,
];

/// Units accepted in CSS indentation styles.
const CSS_INDENT_UNITS: &[LengthUnit] = &[
    LengthUnit::Px,
    LengthUnit::Pt,
    LengthUnit::Em,
    LengthUnit::Rem,
    LengthUnit::Cm,
    LengthUnit::Mm,
    LengthUnit::In,
];

/// Units a spacing marker may pass straight through to CSS.
const SPACING_UNITS: &[LengthUnit] = &[
    LengthUnit::Em,
    LengthUnit::Ex,
    LengthUnit::Pt,
    LengthUnit::Px,
    LengthUnit::Rem,
    LengthUnit::Percent,
    LengthUnit::Cm,
    LengthUnit::Mm,
    LengthUnit::In,
];

/// Units allowed in sanitized style values.
const SAFE_STYLE_UNITS: &[LengthUnit] = &[
    LengthUnit::Em,
    LengthUnit::Ex,
    LengthUnit::Mu,
    LengthUnit::Pt,
    LengthUnit::Px,
    LengthUnit::Rem,
    LengthUnit::Percent,
];

/// Standard LaTeX size switches for the 10pt article class, smallest first.
pub const FONT_SIZES: [(&str, f64); 10] = [
    ("tiny", 5.0),
    ("scriptsize", 7.0),
    ("footnotesize", 8.0),
    ("small", 9.0),
    ("normalsize", 10.0),
    ("large", 12.0),
    ("Large", 14.4),
    ("LARGE", 17.28),
    ("huge", 20.74),
    ("Huge", 24.88),
];

fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            alt((recognize(tuple((digit0, char('.'), digit1))), digit1)),
        ))),
        str::parse::<f64>,
    )(input)
}

fn unit(input: &str) -> IResult<&str, LengthUnit> {
    alt((
        value(LengthUnit::Rem, tag_no_case("rem")),
        value(LengthUnit::Em, tag_no_case("em")),
        value(LengthUnit::Ex, tag_no_case("ex")),
        value(LengthUnit::Pt, tag_no_case("pt")),
        value(LengthUnit::Px, tag_no_case("px")),
        value(LengthUnit::Cm, tag_no_case("cm")),
        value(LengthUnit::Mm, tag_no_case("mm")),
        value(LengthUnit::Mu, tag_no_case("mu")),
        value(LengthUnit::In, tag_no_case("in")),
        value(LengthUnit::Percent, tag_no_case("%")),
    ))(input)
}

fn length(input: &str) -> IResult<&str, Length> {
    map(tuple((number, space0, unit)), |(value, _, unit)| Length {
        value,
        unit,
    })(input)
}

fn tight_length(input: &str) -> IResult<&str, Length> {
    map(tuple((number, unit)), |(value, unit)| Length { value, unit })(input)
}

/// Parse a whole string as a length, tolerating surrounding whitespace and
/// whitespace between number and unit.
pub fn parse_length(raw: &str, units: &[LengthUnit]) -> Option<Length> {
    let (_, len) = all_consuming(length)(raw.trim()).ok()?;
    (len.value.is_finite() && units.contains(&len.unit)).then_some(len)
}

/// Format a number rounded to three decimals without trailing zeros.
pub fn format_number(num: f64) -> String {
    let rounded = (num * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

/// Convert a LaTeX length to a CSS length. `pt` becomes `px` at 4/3; other
/// units carry over. `px` is not a LaTeX source unit.
pub fn latex_length_to_css(raw: &str) -> Option<String> {
    let len = parse_length(raw, LATEX_UNITS)?;
    Some(match len.unit {
        LengthUnit::Pt => format!("{}px", format_number(len.value * 4.0 / 3.0)),
        unit => format!("{}{}", format_number(len.value), unit.as_str()),
    })
}

/// Convert a CSS length to a LaTeX length. `px` becomes `pt` at 0.75 and
/// `rem` is treated as `em`. Zero lengths yield `None`.
pub fn css_length_to_latex(raw: &str) -> Option<String> {
    let len = parse_length(&raw.to_lowercase(), CSS_INDENT_UNITS)?;
    if len.value.abs() < 1e-9 {
        return None;
    }
    Some(match len.unit {
        LengthUnit::Px => format!("{}pt", format_number(len.value * 0.75)),
        LengthUnit::Rem => format!("{}em", format_number(len.value)),
        unit => format!("{}{}", format_number(len.value), unit.as_str()),
    })
}

/// Return the trimmed length when it may be used verbatim as a CSS size on a
/// spacing marker.
pub fn safe_spacing_length(raw: &str) -> Option<&str> {
    let s = raw.trim();
    let (_, len) = all_consuming(tight_length)(s).ok()?;
    SPACING_UNITS.contains(&len.unit).then_some(s)
}

/// Whether a style value is a safe length for the sanitizer: a plain zero or
/// a number with an allowed unit. Rejects `calc()`, `url()`, viewport units.
pub fn is_safe_style_length(value: &str) -> bool {
    let v = value.trim();
    if let Ok((_, n)) = all_consuming(number)(v) {
        return n == 0.0;
    }
    matches!(all_consuming(tight_length)(v), Ok((_, len)) if SAFE_STYLE_UNITS.contains(&len.unit))
}

fn byte(input: &str) -> IResult<&str, u8> {
    map(delimited(multispace0, number, multispace0), |n| {
        n.round().clamp(0.0, 255.0) as u8
    })(input)
}

fn rgb(input: &str) -> IResult<&str, ([u8; 3], Option<f64>)> {
    let (input, _) = tuple((tag_no_case("rgb"), opt(tag_no_case("a")), multispace0, char('(')))(input)?;
    let (input, r) = terminated(byte, char(','))(input)?;
    let (input, g) = terminated(byte, char(','))(input)?;
    let (input, b) = byte(input)?;
    let (input, alpha) = opt(preceded(
        char(','),
        delimited(multispace0, number, multispace0),
    ))(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, ([r, g, b], alpha)))
}

fn hex_color(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), hex_digit1)(input)
}

fn expand_hex(digits: &str) -> Option<String> {
    let lower = digits.to_ascii_lowercase();
    let (rgb, alpha) = match lower.len() {
        3 | 4 => {
            let doubled: String = lower.chars().flat_map(|c| [c, c]).collect();
            let (rgb, alpha) = doubled.split_at(6);
            (rgb.to_string(), alpha.to_string())
        }
        6 | 8 => {
            let (rgb, alpha) = lower.split_at(6);
            (rgb.to_string(), alpha.to_string())
        }
        _ => return None,
    };
    if alpha == "00" {
        return None;
    }
    Some(format!("#{}", rgb))
}

/// Resolve a CSS color to the form emitted in `\textcolor` / `\colorbox`:
/// a bare color name or `#rrggbb`. Transparent, inherited, `var(...)` and
/// malformed colors resolve to `None`.
pub fn css_color_to_latex(raw: &str) -> Option<String> {
    let c = raw.trim();
    if c.is_empty() {
        return None;
    }
    let lower = c.to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "transparent" | "inherit" | "initial" | "unset" | "currentcolor"
    ) || lower.starts_with("var(")
    {
        return None;
    }
    if c.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Some(c.to_string());
    }
    if let Ok((_, digits)) = all_consuming(hex_color)(c) {
        return expand_hex(digits);
    }
    let (_, ([r, g, b], alpha)) = all_consuming(rgb)(c).ok()?;
    if let Some(a) = alpha {
        if !a.is_finite() || a <= 1e-6 {
            return None;
        }
    }
    Some(format!("#{:02x}{:02x}{:02x}", r, g, b))
}

/// Point size written for a LaTeX size switch.
pub fn font_size_points(command: &str) -> Option<f64> {
    FONT_SIZES
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, pt)| *pt)
}

/// Bucket a CSS font size into the LaTeX size switch that best matches it.
pub fn font_size_command(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    let points = match parse_length(trimmed, SAFE_STYLE_UNITS) {
        Some(len) => match len.unit {
            LengthUnit::Px => len.value * 0.75,
            LengthUnit::Em | LengthUnit::Rem => len.value * 10.0,
            LengthUnit::Percent => len.value / 10.0,
            LengthUnit::Pt => len.value,
            _ => return None,
        },
        None => all_consuming(number)(trimmed).ok()?.1,
    };
    let s = points.trunc();
    let command = if s <= 6.0 {
        "tiny"
    } else if s <= 7.0 {
        "scriptsize"
    } else if s <= 8.0 {
        "footnotesize"
    } else if s <= 9.0 {
        "small"
    } else if s >= 24.0 {
        "Huge"
    } else if s >= 20.0 {
        "huge"
    } else if s >= 17.0 {
        "LARGE"
    } else if s >= 14.0 {
        "Large"
    } else if s >= 12.0 {
        "large"
    } else {
        "normalsize"
    };
    Some(command)
}
