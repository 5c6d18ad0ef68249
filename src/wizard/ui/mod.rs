mod content;
mod restoring;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::app::{App, ConfirmAction, PanelFocus};
use super::router::{self, MENU};
use crate::ui::widgets::draw_message_panel;
use crate::ui::Layout as Regions;
use crate::vim::VimMode;

/// Main draw function of the wizard
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    frame.render_widget(Clear, area);

    let regions = Regions::new(area);
    draw_header(frame, regions.header, app);
    draw_sidebar(frame, regions.sidebar, app);
    draw_main_content(frame, regions.content, app);
    draw_message(frame, regions.message, app);
    draw_status_bar(frame, regions.status, app);

    // Overlays
    if let Some(text) = &app.modal {
        draw_modal(frame, text, app);
    }

    if let Some(action) = app.confirm_action {
        draw_confirm_dialog(frame, action, app);
    }

    if app.show_help {
        draw_help(frame, app);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    frame.render_widget(
        Paragraph::new(format!(" {} ", app.config.general.title))
            .style(app.theme.primary_style().add_modifier(Modifier::BOLD)),
        area,
    );

    let mut right = Vec::new();
    if app.busy {
        right.push(Span::styled(
            format!("{} ", app.spinner()),
            app.theme.secondary_style(),
        ));
    }
    if app.config.general.demo {
        right.push(Span::styled("[Demo] ", app.theme.warning_style()));
    }
    right.push(Span::styled(
        format!("{} ", app.props.state.title()),
        app.theme.muted_style(),
    ));

    frame.render_widget(
        Paragraph::new(Line::from(right)).alignment(Alignment::Right),
        area,
    );
}

fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.panel_focus == PanelFocus::Sidebar;

    let title = if app.props.disable_menu {
        " Steps (locked) "
    } else {
        " Steps "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if is_focused {
            app.theme.primary_style()
        } else {
            app.theme.border_style()
        })
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    for (idx, step) in MENU.iter().enumerate() {
        if idx as u16 >= inner.height {
            break;
        }

        let is_current = *step == app.props.state;
        let is_enabled = router::is_enabled(*step, &app.props);
        let is_selected = is_focused && idx == app.sidebar_selected;

        let status = if is_current {
            "[>]"
        } else if *step < app.props.max_state {
            "[x]"
        } else if is_enabled {
            "[ ]"
        } else {
            "[#]"
        };
        let key = (idx + 1) % 10;

        let style = if is_selected {
            app.theme.selected_style()
        } else if is_current {
            app.theme.secondary_style().add_modifier(Modifier::BOLD)
        } else if is_enabled {
            app.theme.style()
        } else {
            app.theme.muted_style()
        };

        frame.render_widget(
            Paragraph::new(format!(" {key} {status} {}", step.title())).style(style),
            Rect::new(inner.x, inner.y + idx as u16, inner.width, 1),
        );
    }
}

fn draw_main_content(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.panel_focus == PanelFocus::Content;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if is_focused {
            app.theme.primary_style()
        } else {
            app.theme.border_style()
        })
        .title(format!(" {} ", app.props.state.title()));

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    if inner.height < 4 || inner.width < 20 {
        return;
    }

    content::draw_step(frame, inner, app);
}

fn draw_message(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(msg) = &app.message {
        draw_message_panel(frame, area, &app.theme, &msg.text, msg.is_error);
    } else if let Some(info) = &app.info {
        draw_message_panel(frame, area, &app.theme, info, false);
    } else if app.busy {
        draw_message_panel(
            frame,
            area,
            &app.theme,
            &format!("{} Please wait...", app.spinner()),
            false,
        );
    }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    frame.render_widget(Clear, area);

    let mode_span = Span::styled(
        format!(" {} ", app.vim_mode.display_name()),
        app.theme.mode_style(app.vim_mode),
    );

    let after_mode = if app.vim_mode == VimMode::Command {
        Span::styled(
            format!(":{}", app.command_buffer.content()),
            app.theme.style(),
        )
    } else {
        Span::styled(app.status_bar.left_hint.clone(), app.theme.muted_style())
    };

    frame.render_widget(
        Paragraph::new(Line::from(vec![mode_span, Span::raw(" "), after_mode])),
        Rect::new(area.x, area.y, area.width * 2 / 3, 1),
    );

    let position = router::menu_index(app.props.state)
        .map(|i| format!("{}/{}", i + 1, MENU.len()))
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(format!("{position}  {}", app.status_bar.right_hint))
            .style(app.theme.muted_style())
            .alignment(Alignment::Right),
        Rect::new(area.x + area.width / 3, area.y, area.width * 2 / 3, 1),
    );
}

fn draw_modal(frame: &mut Frame, text: &str, app: &App) {
    let width = 60.min(frame.area().width.saturating_sub(4));
    let area = Regions::centered_box(frame.area(), width, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.error_style())
        .title(" Error ")
        .title_style(app.theme.error_style().add_modifier(Modifier::BOLD));

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    frame.render_widget(
        Paragraph::new(text)
            .style(app.theme.style())
            .wrap(Wrap { trim: true }),
        Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(2), inner.height.saturating_sub(2)),
    );

    frame.render_widget(
        Paragraph::new(" [ OK ] ")
            .style(app.theme.selected_style())
            .alignment(Alignment::Center),
        Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1),
    );
}

fn draw_confirm_dialog(frame: &mut Frame, action: ConfirmAction, app: &App) {
    let (title, message) = match action {
        ConfirmAction::Quit => ("Quit", "Leave the restore wizard?"),
        ConfirmAction::Restart => ("Restart", "Restart the machine now?"),
    };

    let width = 44.min(frame.area().width.saturating_sub(4));
    let area = Regions::centered_box(frame.area(), width, 7);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.primary_style())
        .title(format!(" {title} "));

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    frame.render_widget(
        Paragraph::new(message)
            .style(app.theme.style().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        Rect::new(inner.x, inner.y + 1, inner.width, 1),
    );

    let hints = Line::from(vec![
        Span::styled("[", app.theme.style()),
        Span::styled("Y", app.theme.primary_style().add_modifier(Modifier::BOLD)),
        Span::styled("]es / [", app.theme.style()),
        Span::styled("N", app.theme.primary_style().add_modifier(Modifier::BOLD)),
        Span::styled("]o", app.theme.style()),
    ]);

    frame.render_widget(
        Paragraph::new(hints).alignment(Alignment::Center),
        Rect::new(inner.x, inner.y + 3, inner.width, 1),
    );
}

const HELP_TEXT: [&str; 21] = [
    "",
    "Navigation:",
    "",
    "  Ctrl+h / Ctrl+l  Focus sidebar / content",
    "  j/k              Move up/down",
    "  Tab              Next list or field",
    "  Enter            Select / press / edit",
    "  1-9, 0           Jump to a reached step",
    "",
    "Modes:",
    "",
    "  i                Edit the focused field",
    "  Esc              Back to normal mode",
    "  :                Command mode",
    "",
    "Commands:",
    "  :skip :back :retry :spill",
    "  :another :restart :quit",
    "",
    "Press q or Esc to close",
    "",
];

fn draw_help(frame: &mut Frame, app: &App) {
    let width = 50.min(frame.area().width.saturating_sub(4));
    let height = (HELP_TEXT.len() as u16 + 2).min(frame.area().height.saturating_sub(2));
    let area = Regions::centered_box(frame.area(), width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style())
        .title(" Help ");

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    for (i, line) in HELP_TEXT.iter().enumerate() {
        if i as u16 >= inner.height {
            break;
        }
        frame.render_widget(
            Paragraph::new(*line).style(app.theme.style()),
            Rect::new(inner.x, inner.y + i as u16, inner.width, 1),
        );
    }
}
