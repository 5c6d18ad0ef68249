use tracing::{info, warn};

use super::{StepContext, StepMessage};
use crate::api::{SpillDiskInfo, SpillDisks, TestedDisk};
use crate::wizard::{SpillDiskChoice, SpillSpace, WizardState};

/// A disk or partition offered as spill space, with its selection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillCandidate {
    pub info: SpillDiskInfo,
    pub selected: bool,
    pub tested: bool,
    /// Usable bytes, -1 until tested
    pub space: i64,
    /// Contents will be overwritten
    pub destructive: bool,
}

impl SpillCandidate {
    fn new(info: SpillDiskInfo) -> Self {
        Self {
            info,
            selected: false,
            tested: false,
            space: -1,
            destructive: false,
        }
    }

    pub fn is_whole_disk(&self) -> bool {
        self.info.path == self.info.devpath
    }
}

/// Spill-space choices of the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillSelection {
    pub live_medium: bool,
    pub live_medium_space: i64,
    pub live_medium_selected: bool,
    pub disks: Vec<SpillCandidate>,
}

impl Default for SpillSelection {
    fn default() -> Self {
        Self {
            live_medium: false,
            live_medium_space: 0,
            live_medium_selected: true,
            disks: Vec::new(),
        }
    }
}

impl SpillSelection {
    pub fn from_candidates(candidates: SpillDisks) -> Self {
        Self {
            live_medium: candidates.live_medium,
            live_medium_space: if candidates.live_medium {
                candidates.live_medium_space
            } else {
                0
            },
            live_medium_selected: true,
            disks: candidates.disks.into_iter().map(SpillCandidate::new).collect(),
        }
    }

    /// Select or deselect the candidate at `idx`. A whole disk and its
    /// partitions are never selected together.
    pub fn set_selected(&mut self, idx: usize, selected: bool) {
        let Some(target) = self.disks.get(idx) else {
            return;
        };
        let devpath = target.info.devpath.clone();
        let whole_disk = target.is_whole_disk();

        for (i, disk) in self.disks.iter_mut().enumerate() {
            if i == idx {
                disk.selected = selected;
            } else if selected && disk.info.devpath == devpath && disk.is_whole_disk() != whole_disk {
                disk.selected = false;
            }
        }
    }

    pub fn toggle(&mut self, idx: usize) {
        if let Some(disk) = self.disks.get(idx) {
            let selected = !disk.selected;
            self.set_selected(idx, selected);
        }
    }

    pub fn needs_test(&self) -> bool {
        self.disks.iter().any(|d| d.selected && !d.tested)
    }

    /// Selected, untested disks with a known file system.
    pub fn paths_to_test(&self) -> Vec<String> {
        self.disks
            .iter()
            .filter(|d| d.selected && !d.tested && d.info.fstype != "unknown")
            .map(|d| d.info.path.clone())
            .collect()
    }

    /// Fold in test results. Selected disks missing from `tested` can only be
    /// used by overwriting them completely.
    pub fn apply_test(&mut self, tested: &[TestedDisk]) {
        for disk in self.disks.iter_mut().filter(|d| !d.tested) {
            if disk.selected {
                disk.tested = true;
            }

            match tested.iter().find(|t| t.path == disk.info.path) {
                Some(result) => {
                    disk.space = result.space;
                    disk.destructive = false;
                }
                None if disk.selected => {
                    disk.space = disk.info.size;
                    disk.destructive = true;
                }
                None => {}
            }
        }
    }

    pub fn has_selection(&self) -> bool {
        (self.live_medium && self.live_medium_selected) || self.disks.iter().any(|d| d.selected)
    }

    /// Usable bytes of the current selection.
    pub fn total_space(&self) -> i64 {
        let disks: i64 = self
            .disks
            .iter()
            .filter(|d| d.selected && d.space > 0)
            .map(|d| d.space)
            .sum();

        if self.live_medium && self.live_medium_selected {
            disks + self.live_medium_space.max(0)
        } else {
            disks
        }
    }

    pub fn to_spill_space(&self) -> SpillSpace {
        SpillSpace {
            live_medium: self.live_medium && self.live_medium_selected,
            live_medium_space: self.live_medium_space,
            disks: self
                .disks
                .iter()
                .filter(|d| d.selected && d.tested)
                .map(|d| SpillDiskChoice {
                    path: d.info.path.clone(),
                    model: d.info.model.clone(),
                    fstype: d.info.fstype.clone(),
                    size: d.info.size,
                    space: d.space,
                    destructive: d.destructive,
                })
                .collect(),
        }
    }
}

pub async fn load(ctx: StepContext) {
    let exclude = ctx
        .props()
        .restore_to_disk
        .as_ref()
        .map(|d| d.path.clone())
        .filter(|p| !p.is_empty());

    ctx.emit(StepMessage::Busy(true));
    let result = ctx.api().get_spill_disks(exclude.as_deref()).await;
    if ctx.is_cancelled() {
        return;
    }
    ctx.emit(StepMessage::Busy(false));

    match result {
        Ok(candidates) => {
            ctx.emit(StepMessage::SpillCandidates(candidates));
        }
        Err(e) => {
            warn!("Fetching spill disks failed: {}", e);
            ctx.emit(StepMessage::Error(
                e.user_message("Error while getting spill disks"),
            ));
        }
    }
}

/// Measure the free space of `paths`.
pub async fn test(ctx: StepContext, paths: Vec<String>) {
    if paths.is_empty() {
        ctx.emit(StepMessage::SpillTested(Vec::new()));
        return;
    }

    ctx.emit(StepMessage::Busy(true));
    let result = ctx.api().test_spill_disks(&paths).await;
    if ctx.is_cancelled() {
        return;
    }
    ctx.emit(StepMessage::Busy(false));

    match result {
        Ok(tested) => {
            ctx.emit(StepMessage::SpillTested(tested));
        }
        Err(e) => {
            warn!("Testing spill disks failed: {}", e);
            ctx.emit(StepMessage::Error(
                e.user_message("Error while testing spill disks"),
            ));
        }
    }
}

pub async fn use_space(ctx: StepContext, space: SpillSpace) {
    info!(
        "Spill space: live medium {}, {} disk(s)",
        space.live_medium,
        space.disks.len()
    );
    ctx.transition(|draft| {
        draft.spill_space = space;
        draft.advance_to(WizardState::ReviewRestore);
    });
}
