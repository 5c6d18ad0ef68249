use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use crate::ui::Theme;

/// Bordered selection list that keeps the cursor row in view.
///
/// `chosen` marks the entry that is currently committed (a picked client,
/// disk, ...), independent of where the cursor is.
#[allow(clippy::too_many_arguments)]
pub fn draw_list(
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
    title: &str,
    items: &[String],
    cursor: usize,
    chosen: Option<usize>,
    focused: bool,
) {
    let rows: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = if chosen == Some(i) { "(*)" } else { "( )" };
            let style = if i == cursor && focused {
                theme.selected_style()
            } else if chosen == Some(i) {
                theme.secondary_style()
            } else {
                theme.style()
            };
            ListItem::new(format!("{marker} {item}")).style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            theme.primary_style()
        } else {
            theme.border_style()
        })
        .title(format!(" {title} "));

    let list = if rows.is_empty() {
        List::new(vec![ListItem::new("(none)").style(theme.muted_style())]).block(block)
    } else {
        List::new(rows).block(block)
    };

    let mut state = ListState::default().with_selected(if items.is_empty() {
        None
    } else {
        Some(cursor.min(items.len() - 1))
    });
    frame.render_stateful_widget(list, area, &mut state);
}

/// A row of `[ label ]` buttons; `focused` is the index under the cursor.
pub fn draw_buttons(
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
    labels: &[&str],
    focused: Option<usize>,
) {
    let mut spans = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if focused == Some(i) {
            theme.selected_style()
        } else {
            theme.muted_style().add_modifier(Modifier::REVERSED)
        };
        spans.push(Span::styled(format!(" [ {label} ] "), style));
    }
    frame.render_widget(Line::from(spans), area);
}
