use super::Action;
use crate::vim::InputBuffer;

/// Filterable list of keyboard layouts.
#[derive(Default)]
pub struct KeyboardView {
    pub layouts: Vec<String>,
    pub cursor: usize,
    pub filter: InputBuffer,
    pub loaded: bool,
}

impl KeyboardView {
    pub fn set_layouts(&mut self, layouts: Vec<String>, current: &str) {
        self.cursor = layouts.iter().position(|l| l == current).unwrap_or(0);
        self.layouts = layouts;
        self.loaded = true;
    }

    pub fn filtered(&self) -> Vec<&str> {
        let filter = self.filter.content().to_lowercase();
        self.layouts
            .iter()
            .filter(|l| filter.is_empty() || l.to_lowercase().contains(&filter))
            .map(String::as_str)
            .collect()
    }

    pub fn filter_changed(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor(&mut self, down: bool) {
        let count = self.filtered().len();
        if down {
            if self.cursor + 1 < count {
                self.cursor += 1;
            }
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    pub fn choose(&self) -> Action {
        match self.filtered().get(self.cursor) {
            Some(layout) => Action::SelectLayout(layout.to_string()),
            None => Action::Reject("Please select a keyboard layout".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> KeyboardView {
        let mut view = KeyboardView::default();
        view.set_layouts(
            vec!["us".to_string(), "de".to_string(), "de-nodeadkeys".to_string()],
            "de",
        );
        view
    }

    #[test]
    fn starts_on_the_active_layout() {
        assert_eq!(view().cursor, 1);
    }

    #[test]
    fn filter_narrows_the_choice() {
        let mut view = view();
        for c in "dead".chars() {
            view.filter.insert(c);
        }
        view.filter_changed();

        assert_eq!(view.filtered(), vec!["de-nodeadkeys"]);
        view.move_cursor(true);
        assert!(matches!(view.choose(), Action::SelectLayout(l) if l == "de-nodeadkeys"));
    }

    #[test]
    fn nothing_matching_is_rejected() {
        let mut view = view();
        view.filter.set("xx");
        view.filter_changed();
        assert!(matches!(view.choose(), Action::Reject(_)));
    }
}
