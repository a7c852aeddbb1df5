//! Rendering layer: widget markup, code highlighting, math previews and the
//! document-to-LaTeX serializer.

pub mod highlight;
pub mod html;
pub mod latex;
pub mod math;

pub use highlight::highlight_code;
pub use html::vocab;
pub use latex::html_to_latex;
pub use math::{create_renderer, render_math, MathBackend, MathRenderer};
