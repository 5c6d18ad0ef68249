use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};

use super::restoring::draw_restoring;
use crate::format::{format_size, format_size_signed};
use crate::ui::widgets::{draw_buttons, draw_field, draw_list};
use crate::vim::VimMode;
use crate::wizard::app::{App, PanelFocus};
use crate::wizard::steps::config_restore::RestoreMode;
use crate::wizard::view::{
    ConfigRestoreView, ConnectionView, KeyboardView, LoginView, RestoreSection, ReviewView,
    SpillRow, SpillView, StepView,
};

pub(super) fn draw_step(frame: &mut Frame, area: Rect, app: &App) {
    match &app.view {
        StepView::Waiting(text) => draw_waiting(frame, area, app, text),
        StepView::Keyboard(view) => draw_keyboard(frame, area, app, view),
        StepView::ServerSearch { no_local_server } => {
            draw_server_search(frame, area, app, *no_local_server)
        }
        StepView::Connection(view) => draw_connection(frame, area, app, view),
        StepView::WaitForConnection { service_error } => {
            draw_wait_for_connection(frame, area, app, *service_error)
        }
        StepView::Login(view) => draw_login(frame, area, app, view),
        StepView::ConfigRestore(view) => draw_config_restore(frame, area, app, view),
        StepView::Spill(view) => draw_spill(frame, area, app, view),
        StepView::Review(view) => draw_review(frame, area, app, view),
        StepView::Restoring(view) => draw_restoring(frame, area, app, view),
    }
}

fn focused(app: &App) -> bool {
    app.panel_focus == PanelFocus::Content && app.modal.is_none()
}

fn line_at(area: Rect, offset: u16) -> Rect {
    Rect::new(
        area.x + 1,
        area.y + offset,
        area.width.saturating_sub(2),
        1,
    )
}

fn draw_waiting(frame: &mut Frame, area: Rect, app: &App, text: &str) {
    frame.render_widget(
        Paragraph::new(format!("{} {}", app.spinner(), text)).style(app.theme.style()),
        line_at(area, 1),
    );
}

fn draw_keyboard(frame: &mut Frame, area: Rect, app: &App, view: &KeyboardView) {
    if !view.loaded {
        draw_waiting(frame, area, app, "Loading keyboard layouts...");
        return;
    }

    let is_focused = focused(app);
    draw_field(
        frame,
        Rect::new(area.x + 1, area.y + 1, area.width.saturating_sub(2), 2),
        "Filter",
        &view.filter,
        is_focused,
        is_focused && app.vim_mode == VimMode::Insert,
        &app.theme,
    );

    let filtered = view.filtered();
    let chosen = filtered.iter().position(|l| *l == app.props.keyboard_layout);
    let items: Vec<String> = filtered.iter().map(|l| l.to_string()).collect();

    let list_area = Rect::new(
        area.x,
        area.y + 4,
        area.width,
        area.height.saturating_sub(4),
    );
    draw_list(
        frame,
        list_area,
        &app.theme,
        &format!("Layouts ({})", items.len()),
        &items,
        view.cursor,
        chosen,
        is_focused,
    );
}

fn draw_server_search(frame: &mut Frame, area: Rect, app: &App, no_local_server: bool) {
    let text = if no_local_server {
        "No local backup server found. Still searching... \
         You can configure an Internet server instead."
    } else {
        "Searching for a local backup server..."
    };

    frame.render_widget(
        Paragraph::new(format!("{} {}", app.spinner(), text))
            .style(app.theme.style())
            .wrap(Wrap { trim: true }),
        Rect::new(area.x + 1, area.y + 1, area.width.saturating_sub(2), 3),
    );

    draw_buttons(
        frame,
        line_at(area, 5),
        &app.theme,
        &["Configure Internet server"],
        focused(app).then_some(0),
    );
}

fn draw_connection(frame: &mut Frame, area: Rect, app: &App, view: &ConnectionView) {
    let is_focused = focused(app);
    let insert = app.vim_mode == VimMode::Insert;

    let fields = [
        ("Server URL", &view.url),
        ("Authentication key", &view.authkey),
        ("Proxy (optional)", &view.proxy),
    ];

    let mut y = 1;
    for (idx, (label, buffer)) in fields.into_iter().enumerate() {
        if y + 2 > area.height {
            return;
        }
        let field_focused = is_focused && view.field == idx;
        draw_field(
            frame,
            Rect::new(area.x + 1, area.y + y, area.width.saturating_sub(2), 2),
            label,
            buffer,
            field_focused,
            field_focused && insert,
            &app.theme,
        );
        y += 3;
    }

    draw_buttons(
        frame,
        line_at(area, y),
        &app.theme,
        &["Connect"],
        (is_focused && view.field == ConnectionView::SUBMIT).then_some(0),
    );
}

fn draw_wait_for_connection(frame: &mut Frame, area: Rect, app: &App, service_error: bool) {
    let server = if app.props.internet_server {
        app.props.server_url.as_str()
    } else {
        "local server"
    };
    frame.render_widget(
        Paragraph::new(format!("{} Connecting to {}...", app.spinner(), server))
            .style(app.theme.style()),
        line_at(area, 1),
    );

    if service_error {
        draw_buttons(
            frame,
            line_at(area, 3),
            &app.theme,
            &["Change connection configuration"],
            focused(app).then_some(0),
        );
    }
}

fn draw_login(frame: &mut Frame, area: Rect, app: &App, view: &LoginView) {
    if !view.form_visible {
        draw_waiting(frame, area, app, "Logging in...");
        return;
    }

    let is_focused = focused(app);
    let insert = app.vim_mode == VimMode::Insert;

    frame.render_widget(
        Paragraph::new("The server requires a login to access the backups.")
            .style(app.theme.style()),
        line_at(area, 1),
    );

    let fields = [("Username", &view.username), ("Password", &view.password)];
    let mut y = 3;
    for (idx, (label, buffer)) in fields.into_iter().enumerate() {
        let field_focused = is_focused && view.field == idx;
        draw_field(
            frame,
            Rect::new(area.x + 1, area.y + y, area.width.saturating_sub(2), 2),
            label,
            buffer,
            field_focused,
            field_focused && insert,
            &app.theme,
        );
        y += 3;
    }

    if y < area.height {
        draw_buttons(
            frame,
            line_at(area, y),
            &app.theme,
            &["Login"],
            (is_focused && view.field == LoginView::SUBMIT).then_some(0),
        );
    }
}

fn draw_config_restore(frame: &mut Frame, area: Rect, app: &App, view: &ConfigRestoreView) {
    let is_focused = focused(app);
    let section_focused = |section: RestoreSection| is_focused && view.section == section;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Min(4),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    let client_chosen = view
        .client
        .as_ref()
        .and_then(|c| view.clients.iter().position(|n| n == c));
    draw_list(
        frame,
        top[0],
        &app.theme,
        "Clients",
        &view.clients,
        view.client_cursor,
        client_chosen,
        section_focused(RestoreSection::Clients),
    );

    let selectable = view.selectable();
    let image_chosen = view
        .image
        .as_ref()
        .and_then(|sel| selectable.iter().position(|i| i.id == sel.id));
    let images: Vec<String> = selectable
        .iter()
        .map(|i| {
            if view.mode == RestoreMode::ToPartition && !i.assoc.is_empty() {
                format!("{} (+{} more)", i.label(), i.assoc.len())
            } else {
                i.label()
            }
        })
        .collect();
    draw_list(
        frame,
        top[1],
        &app.theme,
        "Images",
        &images,
        view.image_cursor,
        image_chosen,
        section_focused(RestoreSection::Images),
    );

    let disk_chosen = view
        .disk
        .as_ref()
        .and_then(|sel| view.disks.iter().position(|d| d.path == sel.path));
    let disks: Vec<String> = view.disks.iter().map(|d| d.label()).collect();
    let disk_title = if view.mode == RestoreMode::ToPartition {
        "Restore to partition"
    } else {
        "Restore to disk"
    };
    draw_list(
        frame,
        rows[1],
        &app.theme,
        disk_title,
        &disks,
        view.disk_cursor,
        disk_chosen,
        section_focused(RestoreSection::Disks),
    );

    let modes: Vec<String> = RestoreMode::ALL.iter().map(|m| m.label().to_string()).collect();
    let mode_chosen = RestoreMode::ALL.iter().position(|m| *m == view.mode);
    draw_list(
        frame,
        rows[2],
        &app.theme,
        "Mode",
        &modes,
        view.mode_cursor,
        mode_chosen,
        section_focused(RestoreSection::Mode),
    );

    draw_buttons(
        frame,
        rows[3],
        &app.theme,
        &["Next"],
        section_focused(RestoreSection::Next).then_some(0),
    );
}

fn draw_spill(frame: &mut Frame, area: Rect, app: &App, view: &SpillView) {
    let Some(selection) = &view.selection else {
        draw_waiting(frame, area, app, "Looking for disks usable as spill space...");
        return;
    };

    let is_focused = focused(app);
    frame.render_widget(
        Paragraph::new(
            "The target disk is smaller than the image. Select space to temporarily \
             hold the data that does not fit.",
        )
        .style(app.theme.style())
        .wrap(Wrap { trim: true }),
        Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), 2),
    );

    let mut y = 3;
    for (idx, row) in view.rows().into_iter().enumerate() {
        if y >= area.height {
            break;
        }
        let at_cursor = is_focused && idx == view.cursor;

        match row {
            SpillRow::LiveMedium => {
                let mark = if selection.live_medium_selected { "[x]" } else { "[ ]" };
                let text = format!(
                    "{mark} Live medium, {} free",
                    format_size_signed(selection.live_medium_space)
                );
                let style = if at_cursor {
                    app.theme.selected_style()
                } else {
                    app.theme.style()
                };
                frame.render_widget(Paragraph::new(text).style(style), line_at(area, y));
                y += 1;
            }
            SpillRow::Disk(i) => {
                let Some(disk) = selection.disks.get(i) else {
                    continue;
                };
                let mark = if disk.selected { "[x]" } else { "[ ]" };
                let kind = if disk.is_whole_disk() { "Disk" } else { "Partition" };
                let mut text = format!(
                    "{mark} {kind} at {} size {} file system {}",
                    disk.info.path,
                    format_size_signed(disk.info.size),
                    if disk.info.fstype.is_empty() { "none" } else { disk.info.fstype.as_str() },
                );
                if disk.tested {
                    text.push_str(&format!(", {} usable", format_size_signed(disk.space)));
                }
                let style = if at_cursor {
                    app.theme.selected_style()
                } else {
                    app.theme.style()
                };
                frame.render_widget(Paragraph::new(text).style(style), line_at(area, y));
                y += 1;

                if disk.selected && disk.destructive && y < area.height {
                    frame.render_widget(
                        Paragraph::new("    Content of this disk will be overwritten")
                            .style(app.theme.error_style()),
                        line_at(area, y),
                    );
                    y += 1;
                }
            }
            SpillRow::Button => {
                y += 1;
                if y < area.height {
                    draw_buttons(
                        frame,
                        line_at(area, y),
                        &app.theme,
                        &[view.button_label()],
                        at_cursor.then_some(0),
                    );
                }
                y += 1;
            }
        }
    }

    if selection.has_selection() && y + 1 < area.height {
        frame.render_widget(
            Paragraph::new(format!(
                "Selected spill space: {}",
                format_size(selection.total_space().max(0) as u64)
            ))
            .style(app.theme.secondary_style()),
            line_at(area, y + 1),
        );
    }
}

fn draw_review(frame: &mut Frame, area: Rect, app: &App, view: &ReviewView) {
    let props = &app.props;
    let label = |text: &'static str| Span::styled(format!("{text:<18}"), app.theme.muted_style());

    let mut lines = Vec::new();
    if let Some(image) = &props.restore_image {
        lines.push(Line::from(vec![
            label("Client"),
            Span::styled(image.clientname.clone(), app.theme.style()),
        ]));
        lines.push(Line::from(vec![
            label("Image"),
            Span::styled(image.label(), app.theme.style()),
        ]));
    }
    if let Some(disk) = &props.restore_to_disk {
        lines.push(Line::from(vec![
            label("Restore to"),
            Span::styled(disk.label(), app.theme.style()),
        ]));
    }
    lines.push(Line::from(vec![
        label("Mode"),
        Span::styled(RestoreMode::of(props).label(), app.theme.style()),
    ]));
    if props.spill_space.is_configured() {
        lines.push(Line::from(vec![
            label("Spill space"),
            Span::styled(
                format_size_signed(props.spill_space.total_space()),
                app.theme.style(),
            ),
        ]));
    }
    lines.push(Line::raw(""));
    if let Some(disk) = &props.restore_to_disk {
        lines.push(Line::styled(
            format!("All data on {} will be overwritten!", disk.path),
            app.theme.error_style().add_modifier(Modifier::BOLD),
        ));
    }

    let height = lines.len() as u16;
    frame.render_widget(
        Paragraph::new(lines),
        Rect::new(area.x + 1, area.y + 1, area.width.saturating_sub(2), height.min(area.height)),
    );

    if height + 3 < area.height {
        draw_buttons(
            frame,
            line_at(area, height + 2),
            &app.theme,
            &ReviewView::BUTTONS,
            focused(app).then_some(view.button),
        );
    }
}
