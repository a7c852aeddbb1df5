//! Editor configuration, loadable from TOML.
//!
//! ```toml
//! visual_topbar = true
//!
//! [math]
//! backend = "mathml"
//!
//! [sanitize]
//! fast_path = true
//!
//! [toolbar]
//! show_title = false
//! ```
//!
//! Every section and key is optional; missing values take their defaults.

use crate::error::{ConfigError, Result};
use crate::render::math::{create_renderer, MathBackend, MathRenderer};
use crate::sanitize::{maybe_sanitize, sanitize};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::Path;

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Master switch for the visual toolbar. When off, no button is shown.
    pub visual_topbar: bool,
    pub math: MathConfig,
    pub sanitize: SanitizeConfig,
    pub toolbar: FeatureFlags,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            visual_topbar: true,
            math: MathConfig::default(),
            sanitize: SanitizeConfig::default(),
            toolbar: FeatureFlags::default(),
        }
    }
}

/// Math preview settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MathConfig {
    pub backend: MathBackend,
}

/// Pasted-markup handling.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Skip the full sanitizer when no suspicious signature is present.
    pub fast_path: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self { fast_path: true }
    }
}

/// A button of the visual toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarButton {
    Undo,
    Redo,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Title,
    Bold,
    Italic,
    Underline,
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    InlineCode,
    CodeBlock,
    InlineMath,
    DisplayMath,
    HSpace,
    VSpace,
    NewPage,
    UnorderedList,
    OrderedList,
    Indent,
    Outdent,
    Link,
    Image,
}

/// Button groups, each shown when any of its buttons is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarGroup {
    History,
    Headings,
    TextStyles,
    Alignment,
    CodeMath,
    Spacing,
    Lists,
    Indentation,
    LinksMedia,
}

impl ToolbarGroup {
    pub const ALL: [ToolbarGroup; 9] = [
        ToolbarGroup::History,
        ToolbarGroup::Headings,
        ToolbarGroup::TextStyles,
        ToolbarGroup::Alignment,
        ToolbarGroup::CodeMath,
        ToolbarGroup::Spacing,
        ToolbarGroup::Lists,
        ToolbarGroup::Indentation,
        ToolbarGroup::LinksMedia,
    ];

    pub fn buttons(self) -> &'static [ToolbarButton] {
        use ToolbarButton::*;
        match self {
            ToolbarGroup::History => &[Undo, Redo],
            ToolbarGroup::Headings => &[Heading1, Heading2, Heading3, Heading4, Title],
            ToolbarGroup::TextStyles => &[Bold, Italic, Underline],
            ToolbarGroup::Alignment => &[AlignLeft, AlignCenter, AlignRight, AlignJustify],
            ToolbarGroup::CodeMath => &[InlineCode, CodeBlock, InlineMath, DisplayMath],
            ToolbarGroup::Spacing => &[HSpace, VSpace, NewPage],
            ToolbarGroup::Lists => &[UnorderedList, OrderedList],
            ToolbarGroup::Indentation => &[Indent, Outdent],
            ToolbarGroup::LinksMedia => &[Link, Image],
        }
    }
}

/// Per-button visibility. All buttons are shown by default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub show_undo: bool,
    pub show_redo: bool,
    pub show_heading1: bool,
    pub show_heading2: bool,
    pub show_heading3: bool,
    pub show_heading4: bool,
    pub show_title: bool,
    pub show_bold: bool,
    pub show_italic: bool,
    pub show_underline: bool,
    pub show_align_left: bool,
    pub show_align_center: bool,
    pub show_align_right: bool,
    pub show_align_justify: bool,
    pub show_inline_code: bool,
    pub show_code_block: bool,
    pub show_inline_math: bool,
    pub show_display_math: bool,
    pub show_hspace: bool,
    pub show_vspace: bool,
    pub show_new_page: bool,
    pub show_unordered_list: bool,
    pub show_ordered_list: bool,
    pub show_indent: bool,
    pub show_outdent: bool,
    pub show_link: bool,
    pub show_image: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            show_undo: true,
            show_redo: true,
            show_heading1: true,
            show_heading2: true,
            show_heading3: true,
            show_heading4: true,
            show_title: true,
            show_bold: true,
            show_italic: true,
            show_underline: true,
            show_align_left: true,
            show_align_center: true,
            show_align_right: true,
            show_align_justify: true,
            show_inline_code: true,
            show_code_block: true,
            show_inline_math: true,
            show_display_math: true,
            show_hspace: true,
            show_vspace: true,
            show_new_page: true,
            show_unordered_list: true,
            show_ordered_list: true,
            show_indent: true,
            show_outdent: true,
            show_link: true,
            show_image: true,
        }
    }
}

impl FeatureFlags {
    /// Whether a single button is enabled.
    pub fn is_enabled(&self, button: ToolbarButton) -> bool {
        use ToolbarButton::*;
        match button {
            Undo => self.show_undo,
            Redo => self.show_redo,
            Heading1 => self.show_heading1,
            Heading2 => self.show_heading2,
            Heading3 => self.show_heading3,
            Heading4 => self.show_heading4,
            Title => self.show_title,
            Bold => self.show_bold,
            Italic => self.show_italic,
            Underline => self.show_underline,
            AlignLeft => self.show_align_left,
            AlignCenter => self.show_align_center,
            AlignRight => self.show_align_right,
            AlignJustify => self.show_align_justify,
            InlineCode => self.show_inline_code,
            CodeBlock => self.show_code_block,
            InlineMath => self.show_inline_math,
            DisplayMath => self.show_display_math,
            HSpace => self.show_hspace,
            VSpace => self.show_vspace,
            NewPage => self.show_new_page,
            UnorderedList => self.show_unordered_list,
            OrderedList => self.show_ordered_list,
            Indent => self.show_indent,
            Outdent => self.show_outdent,
            Link => self.show_link,
            Image => self.show_image,
        }
    }

    /// Enabled buttons in toolbar order.
    pub fn visible_buttons(&self) -> Vec<ToolbarButton> {
        ToolbarGroup::ALL
            .iter()
            .flat_map(|g| g.buttons().iter().copied())
            .filter(|b| self.is_enabled(*b))
            .collect()
    }

    pub fn group_visible(&self, group: ToolbarGroup) -> bool {
        group.buttons().iter().any(|b| self.is_enabled(*b))
    }
}

impl EditorConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| ConfigError::Toml(e.to_string()).into())
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Buttons to show, honoring the master switch.
    pub fn visible_buttons(&self) -> Vec<ToolbarButton> {
        if self.visual_topbar {
            self.toolbar.visible_buttons()
        } else {
            Vec::new()
        }
    }

    pub fn group_visible(&self, group: ToolbarGroup) -> bool {
        self.visual_topbar && self.toolbar.group_visible(group)
    }

    /// The configured math renderer, if its backend is available.
    pub fn renderer(&self) -> Option<Box<dyn MathRenderer>> {
        create_renderer(self.math.backend)
    }

    /// Sanitize pasted markup with the configured strategy.
    pub fn sanitize_pasted<'a>(&self, markup: &'a str) -> Cow<'a, str> {
        if self.sanitize.fast_path {
            maybe_sanitize(markup)
        } else {
            Cow::Owned(sanitize(markup))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_show_everything() {
        let config = EditorConfig::default();
        assert!(config.visual_topbar);
        assert!(config.sanitize.fast_path);
        assert_eq!(config.math.backend, MathBackend::None);
        assert_eq!(config.visible_buttons().len(), 27);
    }

    #[test]
    fn test_partial_toml() {
        let config = EditorConfig::from_toml_str(
            r#"
            [math]
            backend = "mathml"

            [toolbar]
            show_undo = false
            show_redo = false
            "#,
        )
        .unwrap();
        assert_eq!(config.math.backend, MathBackend::MathMl);
        assert!(!config.group_visible(ToolbarGroup::History));
        assert!(config.group_visible(ToolbarGroup::Lists));
        assert_eq!(config.visible_buttons()[0], ToolbarButton::Heading1);
    }

    #[test]
    fn test_master_switch_hides_all() {
        let config = EditorConfig::from_toml_str("visual_topbar = false").unwrap();
        assert!(config.visible_buttons().is_empty());
        assert!(!config.group_visible(ToolbarGroup::TextStyles));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            EditorConfig::from_toml_str("[math]\nbackend = \"katex\""),
            Err(Error::Config(ConfigError::Toml(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            EditorConfig::load("/nonexistent/texure.toml"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_sanitize_pasted_strategies() {
        let mut config = EditorConfig::default();
        assert!(matches!(config.sanitize_pasted("<p>x</p>"), Cow::Borrowed(_)));
        config.sanitize.fast_path = false;
        assert_eq!(config.sanitize_pasted("<font>x</font>"), "x");
    }
}
