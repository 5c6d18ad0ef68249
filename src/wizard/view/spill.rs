use super::Action;
use crate::api::{SpillDisks, TestedDisk};
use crate::wizard::steps::spill::SpillSelection;

/// Rows: the live medium (when offered), every candidate disk, then the
/// test/use button.
#[derive(Default)]
pub struct SpillView {
    pub selection: Option<SpillSelection>,
    pub cursor: usize,
}

/// What a row of the spill list stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpillRow {
    LiveMedium,
    Disk(usize),
    Button,
}

impl SpillView {
    pub fn set_candidates(&mut self, candidates: SpillDisks) {
        self.selection = Some(SpillSelection::from_candidates(candidates));
        self.cursor = 0;
    }

    pub fn apply_test(&mut self, tested: &[TestedDisk]) {
        if let Some(selection) = self.selection.as_mut() {
            selection.apply_test(tested);
        }
    }

    pub fn rows(&self) -> Vec<SpillRow> {
        let Some(selection) = &self.selection else {
            return Vec::new();
        };

        let mut rows = Vec::with_capacity(selection.disks.len() + 2);
        if selection.live_medium {
            rows.push(SpillRow::LiveMedium);
        }
        rows.extend((0..selection.disks.len()).map(SpillRow::Disk));
        rows.push(SpillRow::Button);
        rows
    }

    pub fn button_label(&self) -> &'static str {
        match &self.selection {
            Some(selection) if selection.needs_test() => "Test spill disks",
            Some(selection) if selection.has_selection() => "Use spill space",
            _ => "Skip selecting spill space",
        }
    }

    pub fn move_cursor(&mut self, down: bool) {
        let count = self.rows().len();
        if down {
            if self.cursor + 1 < count {
                self.cursor += 1;
            }
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    pub fn activate(&mut self) -> Option<Action> {
        let row = *self.rows().get(self.cursor)?;
        let selection = self.selection.as_mut()?;

        match row {
            SpillRow::LiveMedium => {
                selection.live_medium_selected = !selection.live_medium_selected;
                None
            }
            SpillRow::Disk(idx) => {
                selection.toggle(idx);
                None
            }
            SpillRow::Button if selection.needs_test() => {
                Some(Action::TestSpill(selection.paths_to_test()))
            }
            SpillRow::Button => Some(Action::UseSpill(selection.to_spill_space())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SpillDiskInfo;

    fn view() -> SpillView {
        let mut view = SpillView::default();
        view.set_candidates(SpillDisks {
            live_medium: true,
            live_medium_space: 1024,
            disks: vec![SpillDiskInfo {
                path: "/dev/sdc1".to_string(),
                devpath: "/dev/sdc".to_string(),
                fstype: "ext4".to_string(),
                size: 4096,
                kind: "part".to_string(),
                ..Default::default()
            }],
        });
        view
    }

    #[test]
    fn rows_follow_candidates() {
        assert!(SpillView::default().rows().is_empty());
        assert_eq!(
            view().rows(),
            vec![SpillRow::LiveMedium, SpillRow::Disk(0), SpillRow::Button]
        );
    }

    #[test]
    fn selected_disk_must_be_tested_before_use() {
        let mut view = view();
        view.move_cursor(true);
        assert!(view.activate().is_none());
        assert_eq!(view.button_label(), "Test spill disks");

        view.move_cursor(true);
        match view.activate() {
            Some(Action::TestSpill(paths)) => assert_eq!(paths, vec!["/dev/sdc1".to_string()]),
            other => panic!("unexpected {other:?}"),
        }

        view.apply_test(&[TestedDisk {
            path: "/dev/sdc1".to_string(),
            space: 2048,
        }]);
        assert_eq!(view.button_label(), "Use spill space");

        match view.activate() {
            Some(Action::UseSpill(space)) => {
                assert!(space.live_medium);
                assert_eq!(space.disks.len(), 1);
                assert_eq!(space.disks[0].space, 2048);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nothing_selected_skips() {
        let mut view = view();
        assert!(view.activate().is_none());
        assert_eq!(view.button_label(), "Skip selecting spill space");
    }
}
