//! MathML renderer.

use super::MathRenderer;
use crate::error::{RenderError, Result};
use latex2mathml::{latex_to_mathml, DisplayStyle};

/// Renderer that converts LaTeX to MathML.
#[derive(Debug, Default)]
pub struct MathMlRenderer;

impl MathMlRenderer {
    /// Create a new MathML renderer.
    pub fn new() -> Self {
        Self
    }

    fn convert(&self, latex: &str, style: DisplayStyle) -> Result<String> {
        latex_to_mathml(latex, style).map_err(|e| RenderError::Math(e.to_string()).into())
    }
}

impl MathRenderer for MathMlRenderer {
    fn render_inline(&self, latex: &str) -> Result<String> {
        self.convert(latex, DisplayStyle::Inline)
    }

    fn render_display(&self, latex: &str) -> Result<String> {
        self.convert(latex, DisplayStyle::Block)
    }
}
