use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::Theme;
use crate::vim::InputBuffer;

/// Label line plus input line for one form field.
pub fn draw_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    buffer: &InputBuffer,
    focused: bool,
    insert_mode: bool,
    theme: &Theme,
) {
    if area.height < 2 {
        return;
    }

    let label_style = if focused {
        theme.primary_style()
    } else {
        theme.muted_style()
    };
    let label_line = Line::from(vec![
        Span::styled(label.to_string(), label_style),
        if focused && !insert_mode {
            Span::styled(" (i to edit)", theme.muted_style())
        } else {
            Span::raw("")
        },
    ]);
    frame.render_widget(
        Paragraph::new(label_line),
        Rect::new(area.x, area.y, area.width, 1),
    );

    let line = render_input_field(
        &buffer.display(),
        buffer.cursor(),
        focused,
        insert_mode,
        theme,
    );
    frame.render_widget(
        Paragraph::new(line),
        Rect::new(area.x, area.y + 1, area.width, 1),
    );
}

pub fn render_input_field(
    content: &str,
    cursor: usize,
    focused: bool,
    insert_mode: bool,
    theme: &Theme,
) -> Line<'static> {
    let prefix = if focused { "> " } else { "  " };

    if !focused {
        let shown = if content.is_empty() { "(empty)" } else { content };
        return Line::from(vec![
            Span::styled(prefix, theme.muted_style()),
            Span::styled(shown.to_string(), theme.muted_style()),
        ]);
    }

    let chars: Vec<char> = content.chars().collect();
    let mut spans = vec![Span::styled(prefix, theme.primary_style())];

    if insert_mode {
        let at = cursor.min(chars.len());
        spans.push(Span::raw(chars[..at].iter().collect::<String>()));
        spans.push(Span::styled("│", theme.primary_style()));
        spans.push(Span::raw(chars[at..].iter().collect::<String>()));
    } else {
        let block_cursor = Style::default().bg(theme.primary).fg(theme.background);
        let at = cursor.min(chars.len().saturating_sub(1));
        match chars.get(at) {
            Some(c) => {
                spans.push(Span::raw(chars[..at].iter().collect::<String>()));
                spans.push(Span::styled(c.to_string(), block_cursor));
                spans.push(Span::raw(chars[at + 1..].iter().collect::<String>()));
            }
            None => spans.push(Span::styled(" ", block_cursor)),
        }
    }

    Line::from(spans)
}
