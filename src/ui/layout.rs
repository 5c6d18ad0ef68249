use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Screen regions of the wizard.
pub struct Layout {
    pub header: Rect,
    pub sidebar: Rect,
    pub content: Rect,
    pub message: Rect,
    pub status: Rect,
}

impl Layout {
    pub fn new(area: Rect) -> Self {
        // Message panel space is always reserved so the content does not jump
        let rows = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        let columns = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(30)])
            .split(rows[1]);

        Self {
            header: rows[0],
            sidebar: columns[0],
            content: columns[1],
            message: rows[2],
            status: rows[3],
        }
    }

    pub fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
        let horizontal = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(width.min(area.width)),
                Constraint::Fill(1),
            ])
            .split(area);

        let vertical = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(height.min(area.height)),
                Constraint::Fill(1),
            ])
            .split(horizontal[1]);

        vertical[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_cover_the_screen() {
        let layout = Layout::new(Rect::new(0, 0, 100, 40));
        assert_eq!(layout.header.height, 1);
        assert_eq!(layout.status.y, 39);
        assert_eq!(layout.message.height, 3);
        assert_eq!(layout.sidebar.width + layout.content.width, 100);
        assert_eq!(layout.content.height, 35);
    }

    #[test]
    fn centered_box_is_clamped() {
        let area = Rect::new(0, 0, 20, 10);
        let boxed = Layout::centered_box(area, 50, 4);
        assert_eq!(boxed.width, 20);
        assert_eq!(boxed.height, 4);
        assert_eq!(boxed.y, 3);
    }
}
