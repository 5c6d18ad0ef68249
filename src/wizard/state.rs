use serde::Deserialize;
use std::fmt;
use zeroize::Zeroizing;

use crate::format::format_unix_seconds;

/// Steps of the restore wizard. Declaration order doubles as progress
/// ranking, so `Ord` compares how far into the wizard a step is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum WizardState {
    #[default]
    Init,
    SelectKeyboard,
    WaitForNetwork,
    ServerSearch,
    ConfigureServerConnectionDetails,
    WaitForConnection,
    LoginToServer,
    ConfigRestore,
    ConfigSpillSpace,
    ReviewRestore,
    Restoring,
}

impl WizardState {
    pub fn title(&self) -> &'static str {
        match self {
            WizardState::Init => "Initializing",
            WizardState::SelectKeyboard => "Select keyboard layout",
            WizardState::WaitForNetwork => "Waiting for network",
            WizardState::ServerSearch => "Search for server",
            WizardState::ConfigureServerConnectionDetails => "Configure server connection",
            WizardState::WaitForConnection => "Wait for connection",
            WizardState::LoginToServer => "Login to server",
            WizardState::ConfigRestore => "Configure restore",
            WizardState::ConfigSpillSpace => "Configure spill space",
            WizardState::ReviewRestore => "Review restore",
            WizardState::Restoring => "Restore",
        }
    }
}

/// Local block device the image can be written to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LocalDisk {
    #[serde(default)]
    pub maj_min: String,
    #[serde(default)]
    pub model: String,
    pub path: String,
    /// Passed through from the service, never converted
    #[serde(default)]
    pub size: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl LocalDisk {
    pub fn is_partition(&self) -> bool {
        self.kind == "part"
    }

    pub fn label(&self) -> String {
        format!("{} - size {} at {}", self.model, self.size, self.path)
    }
}

/// Backup image stored on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackupImage {
    pub id: i64,
    #[serde(default)]
    pub letter: String,
    /// Unix seconds
    #[serde(default)]
    pub time_s: i64,
    #[serde(default)]
    pub time_str: String,
    #[serde(default)]
    pub clientname: String,
    /// Images of other volumes taken with this one, restored after it
    #[serde(default)]
    pub assoc: Vec<BackupImage>,
}

impl BackupImage {
    pub fn display_time(&self) -> String {
        format_unix_seconds(self.time_s)
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.letter, self.display_time())
    }

    /// Tag this image and its associated images with the client they
    /// belong to. Associated system volumes without a letter get "sysvol".
    pub fn with_client(mut self, clientname: &str) -> Self {
        self.clientname = clientname.to_string();
        for assoc in &mut self.assoc {
            assoc.clientname = clientname.to_string();
            if assoc.letter.is_empty() {
                assoc.letter = "sysvol".to_string();
            }
        }
        self
    }

    /// Main images followed by their associated images, each without
    /// associations. Used when restoring a single volume to a partition.
    pub fn flatten(images: &[BackupImage]) -> Vec<BackupImage> {
        let mut out = Vec::new();
        for image in images {
            out.push(BackupImage {
                assoc: Vec::new(),
                ..image.clone()
            });
            out.extend(image.assoc.iter().cloned());
        }
        out
    }
}

/// Spill disk chosen for a restore, as handed to `setup_spill_disks`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpillDiskChoice {
    pub path: String,
    pub model: String,
    pub fstype: String,
    pub size: i64,
    pub space: i64,
    pub destructive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillSpace {
    pub live_medium: bool,
    pub live_medium_space: i64,
    pub disks: Vec<SpillDiskChoice>,
}

impl Default for SpillSpace {
    fn default() -> Self {
        Self {
            live_medium: false,
            live_medium_space: -1,
            disks: Vec::new(),
        }
    }
}

impl SpillSpace {
    pub fn is_configured(&self) -> bool {
        self.live_medium || !self.disks.is_empty()
    }

    /// Bytes available across all chosen spill locations
    pub fn total_space(&self) -> i64 {
        let disks: i64 = self.disks.iter().map(|d| d.space.max(0)).sum();
        if self.live_medium {
            disks + self.live_medium_space.max(0)
        } else {
            disks
        }
    }
}

/// Everything the wizard has collected so far. Published as immutable
/// snapshots by the store.
#[derive(Clone, PartialEq, Eq)]
pub struct WizardStateProps {
    pub state: WizardState,
    pub max_state: WizardState,
    pub server_found: bool,
    pub internet_server: bool,
    pub server_url: String,
    pub server_authkey: String,
    pub server_proxy: String,
    pub username: String,
    /// Memory only, wiped when the snapshot is dropped
    pub password: Zeroizing<String>,
    pub restore_to_disk: Option<LocalDisk>,
    pub restore_image: Option<BackupImage>,
    pub disable_menu: bool,
    pub keyboard_layout: String,
    pub restore_only_mbr: bool,
    pub restore_to_partition: bool,
    pub spill_space: SpillSpace,
    pub can_restore_spill: bool,
}

impl Default for WizardStateProps {
    fn default() -> Self {
        Self {
            state: WizardState::Init,
            max_state: WizardState::Init,
            server_found: false,
            internet_server: false,
            server_url: String::new(),
            server_authkey: String::new(),
            server_proxy: String::new(),
            username: String::new(),
            password: Zeroizing::new(String::new()),
            restore_to_disk: None,
            restore_image: None,
            disable_menu: false,
            keyboard_layout: "us".to_string(),
            restore_only_mbr: false,
            restore_to_partition: false,
            spill_space: SpillSpace::default(),
            can_restore_spill: true,
        }
    }
}

impl WizardStateProps {
    /// Move forward to `state`, recording it as the furthest step reached.
    pub fn advance_to(&mut self, state: WizardState) {
        self.state = state;
        self.max_state = self.max_state.max(state);
    }

    /// Go back to `state` and forget progress past it. Used when leaving a
    /// restore so its step cannot be re-entered from the menu.
    pub fn restart_from(&mut self, state: WizardState) {
        self.state = state;
        self.max_state = state;
        self.disable_menu = false;
    }

    pub fn has_restore_selection(&self) -> bool {
        self.restore_image.is_some() && self.restore_to_disk.is_some()
    }
}

impl fmt::Debug for WizardStateProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardStateProps")
            .field("state", &self.state)
            .field("max_state", &self.max_state)
            .field("server_found", &self.server_found)
            .field("internet_server", &self.internet_server)
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("restore_to_disk", &self.restore_to_disk)
            .field("restore_image", &self.restore_image)
            .field("disable_menu", &self.disable_menu)
            .field("keyboard_layout", &self.keyboard_layout)
            .finish_non_exhaustive()
    }
}
