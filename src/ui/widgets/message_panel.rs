use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::ui::Theme;

pub fn draw_message_panel(frame: &mut Frame, area: Rect, theme: &Theme, text: &str, is_error: bool) {
    let (title, border_style, text_style) = if is_error {
        (" Error ", theme.error_style(), theme.error_style())
    } else {
        (" Info ", theme.secondary_style(), theme.style())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
        .title_style(border_style.add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(Line::from(Span::styled(text.to_string(), text_style)))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
