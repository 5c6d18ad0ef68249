use std::collections::VecDeque;

use super::Action;
use crate::wizard::steps::RestoreEvent;
use crate::wizard::steps::restoring::{DownloadStats, LogLine, ProgressStatus};

/// Number of transfer speed samples kept for the average.
pub const SPEED_HISTORY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreButton {
    Retry,
    ConfigureSpill,
    RetryWithSpill,
    RestoreAnother,
    Restart,
}

impl RestoreButton {
    pub fn label(&self) -> &'static str {
        match self {
            RestoreButton::Retry => "Retry",
            RestoreButton::ConfigureSpill => "Configure spill space to restore to smaller disk",
            RestoreButton::RetryWithSpill => "Retry with configured spill space",
            RestoreButton::RestoreAnother => "Restore another image",
            RestoreButton::Restart => "Restart machine",
        }
    }
}

/// Progress, statistics and log of a running restore.
#[derive(Debug, Default)]
pub struct RestoringView {
    pub log: Vec<LogLine>,
    pub status: ProgressStatus,
    pub percent: i64,
    pub action: String,
    pub stats: Option<DownloadStats>,
    pub speed_history: VecDeque<f64>,
    pub idle: bool,
    pub disk_too_small: bool,
    pub tried_with_spill: bool,
    pub retry_with_spill: bool,
    pub image_done: bool,
    pub restarting: bool,
    pub button: usize,
}

impl RestoringView {
    pub fn apply(&mut self, event: RestoreEvent) {
        match event {
            RestoreEvent::Log(line) => self.log.push(line),
            RestoreEvent::Status(status) => self.status = status,
            RestoreEvent::Percent(percent) => self.percent = percent,
            RestoreEvent::Action(action) => {
                self.action = action;
                self.stats = None;
                self.speed_history.clear();
                self.idle = false;
            }
            RestoreEvent::Stats(stats) => {
                self.push_speed(stats.speed_bpms);
                self.stats = Some(stats);
                self.idle = false;
            }
            RestoreEvent::SpeedIdle => {
                self.push_speed(0.0);
                self.idle = true;
            }
            RestoreEvent::DiskTooSmall {
                tried_with_spill,
                retry_with_spill,
            } => {
                self.disk_too_small = true;
                self.tried_with_spill = tried_with_spill;
                self.retry_with_spill = retry_with_spill;
            }
            RestoreEvent::ImageDone => self.image_done = true,
            RestoreEvent::Restarting => self.restarting = true,
            RestoreEvent::RestartFailed => self.restarting = false,
        }
    }

    fn push_speed(&mut self, speed: f64) {
        if self.speed_history.len() == SPEED_HISTORY {
            self.speed_history.pop_front();
        }
        self.speed_history.push_back(speed);
    }

    /// Mean of the recent samples in bytes per millisecond.
    pub fn average_speed(&self) -> f64 {
        if self.speed_history.is_empty() {
            return 0.0;
        }
        self.speed_history.iter().sum::<f64>() / self.speed_history.len() as f64
    }

    /// Buttons offered after the restore stopped.
    pub fn buttons(&self, can_restore_spill: bool) -> Vec<RestoreButton> {
        let mut buttons = Vec::new();

        if self.status == ProgressStatus::Exception {
            if !self.disk_too_small || self.tried_with_spill {
                buttons.push(RestoreButton::Retry);
            }
            if !self.retry_with_spill && self.disk_too_small && can_restore_spill {
                buttons.push(RestoreButton::ConfigureSpill);
            }
            if self.retry_with_spill && can_restore_spill {
                buttons.push(RestoreButton::RetryWithSpill);
            }
        }

        if self.image_done && !self.restarting {
            buttons.push(RestoreButton::RestoreAnother);
            buttons.push(RestoreButton::Restart);
        }

        buttons
    }

    pub fn move_cursor(&mut self, down: bool, can_restore_spill: bool) {
        let count = self.buttons(can_restore_spill).len();
        if down {
            if self.button + 1 < count {
                self.button += 1;
            }
        } else {
            self.button = self.button.saturating_sub(1);
        }
    }

    pub fn activate(&mut self, can_restore_spill: bool) -> Option<Action> {
        let button = *self.buttons(can_restore_spill).get(self.button)?;
        Some(self.press(button))
    }

    /// Run `button`, resetting the view for an in-place second attempt.
    pub fn press(&mut self, button: RestoreButton) -> Action {
        match button {
            RestoreButton::Retry => Action::Retry,
            RestoreButton::ConfigureSpill => Action::ConfigureSpill,
            RestoreButton::RetryWithSpill => {
                self.disk_too_small = false;
                self.status = ProgressStatus::Normal;
                self.percent = 0;
                self.button = 0;
                Action::RetryWithSpill
            }
            RestoreButton::RestoreAnother => Action::RestoreAnother,
            RestoreButton::Restart => Action::Restart,
        }
    }
}
