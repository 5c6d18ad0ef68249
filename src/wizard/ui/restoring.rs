use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
};

use crate::format::{format_local_datetime, format_size, format_size_signed};
use crate::ui::widgets::draw_buttons;
use crate::wizard::app::{App, PanelFocus};
use crate::wizard::steps::restoring::ProgressStatus;
use crate::wizard::view::RestoringView;

/// Speed line under the gauge, e.g. `1.2 GB of 20 GB at 45 MB/s`.
fn transfer_line(view: &RestoringView) -> Option<String> {
    let stats = view.stats?;
    let speed = if view.idle {
        "idle".to_string()
    } else {
        // bytes per millisecond to bytes per second
        format!("{}/s", format_size((view.average_speed() * 1000.0).max(0.0) as u64))
    };
    Some(format!(
        "{} of {} at {}",
        format_size_signed(stats.done_bytes),
        format_size_signed(stats.total_bytes),
        speed
    ))
}

pub(super) fn draw_restoring(frame: &mut Frame, area: Rect, app: &App, view: &RestoringView) {
    let buttons = view.buttons(app.props.can_restore_spill);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(if buttons.is_empty() { 0 } else { 2 }),
        ])
        .split(area);

    let action = if view.action.is_empty() {
        "Preparing restore...".to_string()
    } else {
        format!("Restoring {}", view.action)
    };
    frame.render_widget(
        Paragraph::new(action).style(app.theme.primary_style().add_modifier(Modifier::BOLD)),
        rows[0],
    );

    let gauge_style = match view.status {
        ProgressStatus::Normal => app.theme.primary_style(),
        ProgressStatus::Exception => app.theme.error_style(),
        ProgressStatus::Success => app.theme.success_style(),
    };
    frame.render_widget(
        Gauge::default()
            .gauge_style(gauge_style)
            .percent(view.percent.clamp(0, 100) as u16),
        rows[1],
    );

    if let Some(line) = transfer_line(view) {
        frame.render_widget(
            Paragraph::new(line).style(app.theme.muted_style()),
            rows[2],
        );
    }

    let visible = rows[3].height.saturating_sub(2) as usize;
    let skip = view.log.len().saturating_sub(visible);
    let items: Vec<ListItem> = view
        .log
        .iter()
        .skip(skip)
        .map(|line| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", format_local_datetime(&line.time)),
                    app.theme.muted_style(),
                ),
                Span::styled(line.message.clone(), app.theme.style()),
            ]))
        })
        .collect();
    frame.render_widget(
        List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.border_style())
                .title(" Log "),
        ),
        rows[3],
    );

    if !buttons.is_empty() {
        let labels: Vec<&str> = buttons.iter().map(|b| b.label()).collect();
        let focused = app.panel_focus == PanelFocus::Content && app.modal.is_none();
        draw_buttons(
            frame,
            Rect::new(rows[4].x, rows[4].y + 1, rows[4].width, 1),
            &app.theme,
            &labels,
            focused.then_some(view.button),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::steps::restoring::DownloadStats;
    use crate::wizard::steps::RestoreEvent;

    #[test]
    fn transfer_line_uses_average_speed() {
        let mut view = RestoringView::default();
        assert!(transfer_line(&view).is_none());

        view.apply(RestoreEvent::Stats(DownloadStats {
            total_bytes: 6144,
            done_bytes: 3072,
            speed_bpms: 2.0,
            percent: 50,
        }));
        assert_eq!(transfer_line(&view).unwrap(), "3 KB of 6 KB at 1.95 KB/s");

        view.apply(RestoreEvent::SpeedIdle);
        assert!(transfer_line(&view).unwrap().ends_with("at idle"));
    }
}
