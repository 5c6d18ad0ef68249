use ratatui::style::{Color, Modifier, Style};

use crate::vim::VimMode;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub background: Color,
    pub foreground: Color,
    pub error: Color,
    pub warning: Color,
    pub success: Color,
    pub border: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Yellow,
            secondary: Color::Cyan,
            background: Color::Reset,
            foreground: Color::White,
            error: Color::Red,
            warning: Color::LightMagenta,
            success: Color::Green,
            border: Color::DarkGray,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn primary_style(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn secondary_style(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Highlight for the focused row or button
    pub fn selected_style(&self) -> Style {
        self.primary_style()
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    pub fn mode_style(&self, mode: VimMode) -> Style {
        let color = match mode {
            VimMode::Normal => self.secondary,
            VimMode::Insert => self.success,
            VimMode::Command => self.primary,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}
