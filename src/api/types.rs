use serde::Deserialize;

/// Saved connection configuration of the restore medium.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub no_config: bool,
    #[serde(rename = "serverUrl")]
    pub server_url: String,
    #[serde(rename = "serverAuthkey")]
    pub server_authkey: String,
    #[serde(rename = "serverProxy")]
    pub server_proxy: String,
    /// `"ask"` means the operator has to pick one
    #[serde(rename = "keyboardLayout")]
    pub keyboard_layout: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct KeyboardLayouts {
    #[serde(default)]
    pub layouts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RetFlag {
    #[serde(default)]
    pub ret: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct OkFlag {
    #[serde(default)]
    pub ok: bool,
}

/// Result of polling `status`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerStatus {
    /// Missing entirely when the service could not determine a status
    #[serde(default)]
    pub servers: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub internet_status: Option<String>,
}

impl ServerStatus {
    pub fn with_servers(count: usize) -> Self {
        Self {
            servers: Some(vec![serde_json::Value::Null; count]),
            internet_status: None,
        }
    }

    pub fn internet(status: &str) -> Self {
        Self {
            servers: Some(Vec::new()),
            internet_status: Some(status.to_string()),
        }
    }

    pub fn server_found(&self) -> bool {
        self.servers.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Parameters pushed with `configure_server`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServerConnection {
    /// Internet server / active connection instead of a local server
    pub active: bool,
    pub url: String,
    pub authkey: String,
    pub proxy: String,
}

impl std::fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConnection")
            .field("active", &self.active)
            .field("url", &self.url)
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoginResult {
    pub ok: bool,
    pub success: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ClientNames {
    #[serde(default)]
    pub clients: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BackupImages {
    #[serde(default)]
    pub images: Vec<crate::wizard::BackupImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Disks {
    #[serde(default)]
    pub disks: Vec<crate::wizard::LocalDisk>,
}

/// Disk or partition offered as spill space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpillDiskInfo {
    pub model: String,
    pub maj_min: String,
    pub path: String,
    /// Whole-disk device this entry lives on (equal to `path` for disks)
    pub devpath: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub fstype: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpillDisks {
    pub live_medium: bool,
    pub live_medium_space: i64,
    pub disks: Vec<SpillDiskInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TestedDisk {
    pub path: String,
    #[serde(default)]
    pub space: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TestedDisks {
    #[serde(default)]
    pub disks: Vec<TestedDisk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TmpFileName {
    #[serde(rename = "fn")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub image_id: i64,
    pub image_time: i64,
    /// Output file or device
    pub out: String,
    /// Only fetch the partition table data of the image
    pub mbr: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ResId {
    pub res_id: i64,
}

/// A transfer running on the restore service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RestoreProcess {
    pub action: String,
    pub eta_ms: i64,
    pub percent_done: i64,
    pub process_id: i64,
    pub server_status_id: i64,
    pub speed_bpms: f64,
    pub total_bytes: Option<i64>,
    pub done_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownloadProgress {
    pub finished: bool,
    /// Exit code once finished, 0 on success
    pub ec: Option<i64>,
    pub pc: Option<i64>,
    pub running_processes: Option<Vec<RestoreProcess>>,
}

impl DownloadProgress {
    pub fn percent(pc: i64) -> Self {
        Self {
            pc: Some(pc),
            ..Default::default()
        }
    }

    pub fn finished(ec: i64) -> Self {
        Self {
            finished: true,
            ec: Some(ec),
            ..Default::default()
        }
    }

    /// The image restore entry among the running processes, if any.
    pub fn restore_process(&self) -> Option<&RestoreProcess> {
        self.running_processes
            .as_ref()?
            .iter()
            .find(|p| p.action == "RESTORE_IMAGE")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct IsDiskMbr {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub res: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WriteMbrResult {
    pub success: bool,
    pub errmsg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartitionResult {
    pub success: bool,
    pub partpath: String,
    pub partnum: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpillSetup {
    /// Device the image has to be written to instead of the partition
    pub path: String,
    pub orig_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResizeProgress {
    pub finished: bool,
    pub pcdone: Option<i64>,
    pub err: Option<String>,
}
