//! Math rendering backends.
//!
//! The transforms never depend on a backend being present: without one,
//! [`render_math`] falls back to a plain-text placeholder showing the source.

#[cfg(feature = "mathml")]
mod mathml;

#[cfg(feature = "mathml")]
pub use self::mathml::MathMlRenderer;

use crate::error::{ConfigError, Result};
use crate::escape::escape_html;
use serde::Deserialize;
use std::str::FromStr;

/// Marker shown in place of a formula the backend rejected.
pub const MATH_ERROR_MARKUP: &str = r#"<span class="math-error" style="color: red">Error</span>"#;

/// Math rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathBackend {
    /// No typesetter; formulas render as placeholders.
    #[default]
    None,
    /// Convert to MathML (requires the `mathml` feature).
    #[serde(alias = "MathML")]
    MathMl,
}

impl FromStr for MathBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "mathml" => Ok(Self::MathMl),
            other => Err(ConfigError::UnknownMathBackend(other.to_string())),
        }
    }
}

/// Trait for math renderers.
pub trait MathRenderer {
    /// Render inline math.
    fn render_inline(&self, latex: &str) -> Result<String>;

    /// Render display math.
    fn render_display(&self, latex: &str) -> Result<String>;
}

/// Create a math renderer for the given backend. `None` means no typesetter
/// is loaded, including when the backend's feature is compiled out.
pub fn create_renderer(backend: MathBackend) -> Option<Box<dyn MathRenderer>> {
    match backend {
        MathBackend::None => None,
        #[cfg(feature = "mathml")]
        MathBackend::MathMl => Some(Box::new(MathMlRenderer::new())),
        #[cfg(not(feature = "mathml"))]
        MathBackend::MathMl => {
            tracing::debug!("mathml backend requested but the feature is disabled");
            None
        }
    }
}

/// Render `expression` with the optional backend. Never fails: backend
/// errors become [`MATH_ERROR_MARKUP`].
pub fn render_math(renderer: Option<&dyn MathRenderer>, expression: &str, display: bool) -> String {
    match renderer {
        Some(r) => {
            let rendered = if display {
                r.render_display(expression)
            } else {
                r.render_inline(expression)
            };
            rendered.unwrap_or_else(|err| {
                tracing::debug!(%err, "math backend rejected expression");
                MATH_ERROR_MARKUP.to_string()
            })
        }
        None if display => format!(
            r#"<div class="math-placeholder">\[{}\]</div>"#,
            escape_html(expression)
        ),
        None => format!(
            r#"<span class="math-placeholder">${}$</span>"#,
            escape_html(expression)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use pretty_assertions::assert_eq;

    struct Failing;

    impl MathRenderer for Failing {
        fn render_inline(&self, latex: &str) -> Result<String> {
            Err(RenderError::Math(latex.to_string()).into())
        }

        fn render_display(&self, latex: &str) -> Result<String> {
            Err(RenderError::Math(latex.to_string()).into())
        }
    }

    struct Echo;

    impl MathRenderer for Echo {
        fn render_inline(&self, latex: &str) -> Result<String> {
            Ok(format!("<i>{}</i>", latex))
        }

        fn render_display(&self, latex: &str) -> Result<String> {
            Ok(format!("<b>{}</b>", latex))
        }
    }

    #[test]
    fn test_placeholder_without_backend() {
        assert_eq!(
            render_math(None, "a<b", true),
            r#"<div class="math-placeholder">\[a&lt;b\]</div>"#
        );
        assert_eq!(
            render_math(None, "x^2", false),
            r#"<span class="math-placeholder">$x^2$</span>"#
        );
    }

    #[test]
    fn test_backend_error_becomes_marker() {
        assert_eq!(render_math(Some(&Failing), r"\frac{", true), MATH_ERROR_MARKUP);
    }

    #[test]
    fn test_backend_mode_dispatch() {
        assert_eq!(render_math(Some(&Echo), "x", true), "<b>x</b>");
        assert_eq!(render_math(Some(&Echo), "x", false), "<i>x</i>");
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("MathML".parse::<MathBackend>().unwrap(), MathBackend::MathMl);
        assert_eq!("none".parse::<MathBackend>().unwrap(), MathBackend::None);
        assert!("katex".parse::<MathBackend>().is_err());
        assert!(create_renderer(MathBackend::None).is_none());
    }
}
