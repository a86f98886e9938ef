//! Color themes.

use ratatui::style::{Color, Modifier, Style};

/// Color theme for conversation rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,

    /// Base background.
    pub background: Color,
    /// Background of tool blocks and code.
    pub background_element: Color,

    pub text: Color,
    pub text_muted: Color,

    /// Accent for user messages and running work.
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub border: Color,
    /// Very subtle border around tool blocks.
    pub tool_border: Color,

    pub diff_added: Color,
    pub diff_removed: Color,
    pub diff_added_bg: Color,
    pub diff_removed_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::threadline()
    }
}

impl Theme {
    /// Look up a theme by name, falling back to the default.
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            "nord" => Self::nord(),
            _ => Self::threadline(),
        }
    }

    pub fn available() -> Vec<&'static str> {
        vec!["threadline", "light", "nord"]
    }

    /// Default dark theme.
    pub fn threadline() -> Self {
        Self {
            name: "threadline".to_string(),
            background: Color::Rgb(10, 10, 10),
            background_element: Color::Rgb(24, 24, 27),
            text: Color::Rgb(250, 250, 250),
            text_muted: Color::Rgb(128, 128, 128),
            primary: Color::Rgb(250, 178, 131),
            secondary: Color::Rgb(92, 156, 245),
            accent: Color::Rgb(157, 124, 216),
            success: Color::Rgb(127, 216, 143),
            warning: Color::Rgb(245, 167, 66),
            error: Color::Rgb(224, 108, 117),
            info: Color::Rgb(92, 156, 245),
            border: Color::Rgb(60, 60, 60),
            tool_border: Color::Rgb(39, 39, 42),
            diff_added: Color::Rgb(127, 216, 143),
            diff_removed: Color::Rgb(224, 108, 117),
            diff_added_bg: Color::Rgb(32, 48, 59),
            diff_removed_bg: Color::Rgb(55, 34, 44),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            background: Color::Rgb(255, 255, 255),
            background_element: Color::Rgb(245, 245, 245),
            text: Color::Rgb(30, 30, 30),
            text_muted: Color::Rgb(128, 128, 128),
            primary: Color::Rgb(200, 120, 60),
            secondary: Color::Rgb(50, 100, 200),
            accent: Color::Rgb(130, 80, 180),
            success: Color::Rgb(40, 160, 70),
            warning: Color::Rgb(200, 130, 30),
            error: Color::Rgb(200, 60, 70),
            info: Color::Rgb(50, 100, 200),
            border: Color::Rgb(220, 220, 220),
            tool_border: Color::Rgb(212, 212, 216),
            diff_added: Color::Rgb(40, 160, 70),
            diff_removed: Color::Rgb(200, 60, 70),
            diff_added_bg: Color::Rgb(220, 255, 220),
            diff_removed_bg: Color::Rgb(255, 220, 220),
        }
    }

    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            background: Color::Rgb(46, 52, 64),
            background_element: Color::Rgb(59, 66, 82),
            text: Color::Rgb(236, 239, 244),
            text_muted: Color::Rgb(129, 161, 193),
            primary: Color::Rgb(136, 192, 208),
            secondary: Color::Rgb(129, 161, 193),
            accent: Color::Rgb(180, 142, 173),
            success: Color::Rgb(163, 190, 140),
            warning: Color::Rgb(235, 203, 139),
            error: Color::Rgb(191, 97, 106),
            info: Color::Rgb(94, 129, 172),
            border: Color::Rgb(76, 86, 106),
            tool_border: Color::Rgb(67, 76, 94),
            diff_added: Color::Rgb(163, 190, 140),
            diff_removed: Color::Rgb(191, 97, 106),
            diff_added_bg: Color::Rgb(52, 66, 60),
            diff_removed_bg: Color::Rgb(70, 52, 60),
        }
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn primary_style(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn tool_border_style(&self) -> Style {
        Style::default().fg(self.tool_border)
    }

    /// Dimmed italic text for reasoning.
    pub fn thinking_style(&self) -> Style {
        Style::default()
            .fg(self.text_muted)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn bold(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_falls_back() {
        assert_eq!(Theme::by_name("LIGHT").name, "light");
        assert_eq!(Theme::by_name("does-not-exist").name, "threadline");
    }

    #[test]
    fn test_every_listed_theme_resolves() {
        for name in Theme::available() {
            assert_eq!(Theme::by_name(name).name, name);
        }
    }
}
