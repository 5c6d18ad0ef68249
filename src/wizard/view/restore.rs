use super::Action;
use crate::wizard::steps::config_restore::{RestoreMode, selectable_images};
use crate::wizard::{BackupImage, LocalDisk, WizardStateProps};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSection {
    Clients,
    Images,
    Disks,
    Mode,
    Next,
}

impl RestoreSection {
    const ORDER: [RestoreSection; 5] = [
        RestoreSection::Clients,
        RestoreSection::Images,
        RestoreSection::Disks,
        RestoreSection::Mode,
        RestoreSection::Next,
    ];

    fn cycle(self, forward: bool) -> Self {
        let idx = Self::ORDER.iter().position(|s| *s == self).unwrap_or(0);
        let len = Self::ORDER.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        Self::ORDER[next]
    }
}

/// Client, image, target and mode pickers of the restore configuration.
pub struct ConfigRestoreView {
    pub section: RestoreSection,
    pub clients: Vec<String>,
    pub client_cursor: usize,
    pub client: Option<String>,
    pub images: Vec<BackupImage>,
    pub image_cursor: usize,
    pub image: Option<BackupImage>,
    pub disks: Vec<LocalDisk>,
    pub disk_cursor: usize,
    pub disk: Option<LocalDisk>,
    pub mode: RestoreMode,
    pub mode_cursor: usize,
}

impl ConfigRestoreView {
    /// Starts from the selection carried in `props` so coming back from the
    /// review keeps it.
    pub fn new(props: &WizardStateProps) -> Self {
        let mode = RestoreMode::of(props);
        let client = props
            .restore_image
            .as_ref()
            .map(|i| i.clientname.clone())
            .filter(|c| !c.is_empty());

        Self {
            section: RestoreSection::Clients,
            clients: Vec::new(),
            client_cursor: 0,
            client,
            images: Vec::new(),
            image_cursor: 0,
            image: props.restore_image.clone(),
            disks: Vec::new(),
            disk_cursor: 0,
            disk: props.restore_to_disk.clone().filter(|d| mode.accepts(d)),
            mode,
            mode_cursor: RestoreMode::ALL.iter().position(|m| *m == mode).unwrap_or(0),
        }
    }

    /// Images offered in the current mode.
    pub fn selectable(&self) -> Vec<BackupImage> {
        selectable_images(&self.images, self.mode == RestoreMode::ToPartition)
    }

    /// Swap the selected image for its copy in the current mode's list, so
    /// associated volumes only travel with whole-disk restores.
    fn reselect_image(&mut self) {
        if self.images.is_empty() {
            if self.mode == RestoreMode::ToPartition {
                if let Some(image) = &mut self.image {
                    image.assoc.clear();
                }
            }
            self.image_cursor = 0;
            return;
        }

        let selectable = self.selectable();
        let position = self
            .image
            .as_ref()
            .and_then(|sel| selectable.iter().position(|i| i.id == sel.id));
        self.image = position.map(|idx| selectable[idx].clone());
        self.image_cursor = position.unwrap_or(0);
    }

    pub fn set_clients(&mut self, clients: Vec<String>) {
        self.client_cursor = self
            .client
            .as_ref()
            .and_then(|c| clients.iter().position(|n| n == c))
            .unwrap_or(0);
        self.clients = clients;
    }

    pub fn set_images(&mut self, images: Vec<BackupImage>) {
        self.images = images;
        let selectable = self.selectable();
        self.image_cursor = self
            .image
            .as_ref()
            .and_then(|sel| selectable.iter().position(|i| i.id == sel.id))
            .unwrap_or(0);
    }

    pub fn set_disks(&mut self, disks: Vec<LocalDisk>) {
        let mode = self.mode;
        self.disks = disks.into_iter().filter(|d| mode.accepts(d)).collect();

        let position = self
            .disk
            .as_ref()
            .and_then(|sel| self.disks.iter().position(|d| d.path == sel.path));
        match position {
            Some(idx) => self.disk_cursor = idx,
            None => {
                self.disk = None;
                self.disk_cursor = 0;
            }
        }
    }

    fn cursor_and_len(&mut self) -> (&mut usize, usize) {
        match self.section {
            RestoreSection::Clients => (&mut self.client_cursor, self.clients.len()),
            RestoreSection::Images => {
                let len = self.selectable().len();
                (&mut self.image_cursor, len)
            }
            RestoreSection::Disks => (&mut self.disk_cursor, self.disks.len()),
            RestoreSection::Mode => (&mut self.mode_cursor, RestoreMode::ALL.len()),
            RestoreSection::Next => (&mut self.mode_cursor, 0),
        }
    }

    pub fn move_cursor(&mut self, down: bool) {
        let (cursor, len) = self.cursor_and_len();
        if down {
            if *cursor + 1 < len {
                *cursor += 1;
            }
        } else {
            *cursor = cursor.saturating_sub(1);
        }
    }

    pub fn cycle_section(&mut self, forward: bool) {
        self.section = self.section.cycle(forward);
    }

    pub fn activate(&mut self) -> Option<Action> {
        match self.section {
            RestoreSection::Clients => {
                let name = self.clients.get(self.client_cursor)?.clone();
                if self.client.as_deref() != Some(name.as_str()) {
                    self.image = None;
                    self.images.clear();
                    self.image_cursor = 0;
                }
                self.client = Some(name.clone());
                self.section = RestoreSection::Images;
                Some(Action::SelectClient(name))
            }
            RestoreSection::Images => {
                let image = self.selectable().get(self.image_cursor)?.clone();
                self.image = Some(image);
                self.section = RestoreSection::Disks;
                None
            }
            RestoreSection::Disks => {
                let disk = self.disks.get(self.disk_cursor)?.clone();
                self.disk = Some(disk);
                self.section = RestoreSection::Next;
                None
            }
            RestoreSection::Mode => {
                let mode = RestoreMode::ALL[self.mode_cursor.min(RestoreMode::ALL.len() - 1)];
                if mode == self.mode {
                    return None;
                }
                self.mode = mode;
                if self.disk.as_ref().is_some_and(|d| !mode.accepts(d)) {
                    self.disk = None;
                }
                self.reselect_image();
                Some(Action::SetMode(mode))
            }
            RestoreSection::Next => Some(Action::Review {
                image: self.image.clone(),
                disk: self.disk.clone(),
            }),
        }
    }
}

/// "Start restore" / "Back" buttons under the summary.
#[derive(Debug, Default)]
pub struct ReviewView {
    pub button: usize,
}

impl ReviewView {
    pub const BUTTONS: [&'static str; 2] = ["Start restore", "Back"];

    pub fn move_cursor(&mut self, down: bool) {
        self.button = if down { 1 } else { 0 };
    }

    pub fn activate(&self) -> Action {
        if self.button == 0 {
            Action::Confirm
        } else {
            Action::Back
        }
    }
}
