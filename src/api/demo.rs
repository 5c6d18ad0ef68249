use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

use super::types::*;
use super::RestoreApi;
use crate::error::{RestoreError, Result};
use crate::wizard::{BackupImage, LocalDisk, SpillDiskChoice};

const GIB: i64 = 1024 * 1024 * 1024;
const IMAGE_BYTES: i64 = 40 * GIB;

#[derive(Default)]
struct DemoState {
    network_polls: u32,
    status_polls: u32,
    next_id: i64,
    /// res_id -> (polls so far, is MBR transfer)
    transfers: HashMap<i64, (u32, bool)>,
    resizes: HashMap<i64, u32>,
}

/// In-memory restore service for `--demo`: walks through every step with
/// plausible data and fake transfers, without touching any disk.
#[derive(Default)]
pub struct DemoRestoreApi {
    state: Mutex<DemoState>,
}

impl DemoRestoreApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut DemoState) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RestoreError::Remote("demo state poisoned".to_string()))?;
        Ok(f(&mut state))
    }

    fn next_id(&self, mbr: bool) -> Result<i64> {
        self.with_state(|s| {
            s.next_id += 1;
            s.transfers.insert(s.next_id, (0, mbr));
            s.next_id
        })
    }
}

#[async_trait]
impl RestoreApi for DemoRestoreApi {
    async fn get_connection_settings(&self) -> Result<ConnectionSettings> {
        Ok(ConnectionSettings {
            no_config: true,
            ..Default::default()
        })
    }

    async fn get_keyboard_layouts(&self) -> Result<Vec<String>> {
        Ok(["us", "de", "fr", "gb", "es"]
            .iter()
            .map(|s| s.to_string())
            .collect())
    }

    async fn set_keyboard_layout(&self, layout: &str) -> Result<()> {
        info!("Demo: keyboard layout set to {}", layout);
        Ok(())
    }

    async fn has_network_device(&self) -> Result<bool> {
        self.with_state(|s| {
            s.network_polls += 1;
            s.network_polls > 1
        })
    }

    async fn status(&self) -> Result<ServerStatus> {
        self.with_state(|s| {
            s.status_polls += 1;
            if s.status_polls > 2 {
                let mut status = ServerStatus::with_servers(1);
                status.internet_status = Some("connected".to_string());
                status
            } else {
                ServerStatus::internet("wait_local")
            }
        })
    }

    async fn configure_server(&self, connection: &ServerConnection) -> Result<bool> {
        info!("Demo: configure server {:?}", connection);
        self.with_state(|s| s.status_polls = 0)?;
        Ok(!connection.url.is_empty())
    }

    async fn login(&self, credentials: Option<(&str, &str)>) -> Result<LoginResult> {
        let success = matches!(credentials, Some((_, password)) if !password.is_empty());
        Ok(LoginResult { ok: true, success })
    }

    async fn get_clientnames(&self) -> Result<Vec<String>> {
        Ok(vec!["laptop1".to_string(), "workstation".to_string()])
    }

    async fn get_backupimages(&self, clientname: &str) -> Result<Vec<BackupImage>> {
        let base = if clientname == "laptop1" { 1 } else { 10 };
        let now = chrono::Utc::now().timestamp();

        Ok((0..3)
            .map(|n| BackupImage {
                id: base + n,
                letter: "C:".to_string(),
                time_s: now - n * 86_400,
                assoc: vec![BackupImage {
                    id: base + 100 + n,
                    time_s: now - n * 86_400,
                    ..Default::default()
                }],
                ..Default::default()
            })
            .collect())
    }

    async fn get_disks(&self, partitions: bool) -> Result<Vec<LocalDisk>> {
        let disk = |path: &str, model: &str, size: &str, kind: &str| LocalDisk {
            maj_min: String::new(),
            model: model.to_string(),
            path: path.to_string(),
            size: size.to_string(),
            kind: kind.to_string(),
        };

        let mut disks = vec![
            disk("/dev/sda", "Samsung SSD 870", "500G", "disk"),
            disk("/dev/sdb", "WDC WD10EZEX", "1T", "disk"),
        ];
        if partitions {
            disks.push(disk("/dev/sda1", "Samsung SSD 870", "100M", "part"));
            disks.push(disk("/dev/sda2", "Samsung SSD 870", "499G", "part"));
        }
        Ok(disks)
    }

    async fn get_spill_disks(&self, exclude: Option<&str>) -> Result<SpillDisks> {
        let candidate = |path: &str, devpath: &str, kind: &str, fstype: &str, size: i64| {
            SpillDiskInfo {
                model: "SanDisk Ultra".to_string(),
                maj_min: String::new(),
                path: path.to_string(),
                devpath: devpath.to_string(),
                size,
                kind: kind.to_string(),
                fstype: fstype.to_string(),
            }
        };

        let disks = vec![
            candidate("/dev/sdc", "/dev/sdc", "disk", "unknown", 64 * GIB),
            candidate("/dev/sdc1", "/dev/sdc", "part", "ext4", 64 * GIB),
        ]
        .into_iter()
        .filter(|d| Some(d.devpath.as_str()) != exclude)
        .collect();

        Ok(SpillDisks {
            live_medium: true,
            live_medium_space: 2 * GIB,
            disks,
        })
    }

    async fn test_spill_disks(&self, paths: &[String]) -> Result<Vec<TestedDisk>> {
        Ok(paths
            .iter()
            .map(|path| TestedDisk {
                path: path.clone(),
                space: 48 * GIB,
            })
            .collect())
    }

    async fn get_tmpfn(&self) -> Result<String> {
        let id = self.with_state(|s| s.next_id + 1)?;
        Ok(format!("/tmp/restore_mbr_{id}"))
    }

    async fn start_download(&self, request: &DownloadRequest) -> Result<i64> {
        info!("Demo: download image {} to {}", request.image_id, request.out);
        self.next_id(request.mbr)
    }

    async fn download_progress(&self, res_id: i64) -> Result<DownloadProgress> {
        self.with_state(|s| {
            let Some((polls, mbr)) = s.transfers.get_mut(&res_id) else {
                return Err(RestoreError::Remote("Restore not found".to_string()));
            };
            *polls += 1;

            let total = if *mbr { 2 } else { 10 };
            if *polls > total {
                return Ok(DownloadProgress::finished(0));
            }

            let pc = i64::from(*polls) * 100 / i64::from(total + 1);
            if *mbr {
                return Ok(DownloadProgress::percent(pc));
            }

            Ok(DownloadProgress {
                running_processes: Some(vec![RestoreProcess {
                    action: "RESTORE_IMAGE".to_string(),
                    percent_done: pc,
                    speed_bpms: 110_000.0,
                    total_bytes: Some(IMAGE_BYTES),
                    done_bytes: Some(IMAGE_BYTES / 100 * pc),
                    ..Default::default()
                }]),
                ..Default::default()
            })
        })?
    }

    async fn get_is_disk_mbr(&self, _mbrfn: &str) -> Result<bool> {
        Ok(false)
    }

    async fn write_mbr(&self, _mbrfn: &str, out_device: &str) -> Result<WriteMbrResult> {
        info!("Demo: write MBR to {}", out_device);
        Ok(WriteMbrResult {
            success: true,
            errmsg: String::new(),
        })
    }

    async fn get_partition(&self, _mbrfn: &str, out_device: &str) -> Result<PartitionResult> {
        Ok(PartitionResult {
            success: true,
            partpath: format!("{out_device}1"),
            partnum: 1,
        })
    }

    async fn setup_spill_disks(
        &self,
        orig_dev: &str,
        _live_medium: bool,
        _disks: &[SpillDiskChoice],
    ) -> Result<SpillSetup> {
        info!("Demo: spill space for {}", orig_dev);
        Ok(SpillSetup {
            path: "/dev/mapper/restore_spill".to_string(),
            orig_size: (100 * GIB).to_string(),
        })
    }

    async fn resize_disk(&self, _disk_fn: &str, _new_size: &str) -> Result<i64> {
        self.with_state(|s| {
            s.next_id += 1;
            s.resizes.insert(s.next_id, 0);
            s.next_id
        })
    }

    async fn restore_finished(&self, res_id: i64) -> Result<ResizeProgress> {
        self.with_state(|s| {
            let polls = s.resizes.entry(res_id).or_default();
            *polls += 1;
            ResizeProgress {
                finished: *polls > 2,
                pcdone: Some(i64::from((*polls).min(3)) * 33),
                err: None,
            }
        })
    }

    async fn cleanup_spill_disks(&self) -> Result<()> {
        Ok(())
    }

    async fn resize_part(&self, _disk_fn: &str, _new_size: &str, _partnum: i64) -> Result<()> {
        Ok(())
    }

    async fn restart(&self) -> Result<()> {
        info!("Demo: restart requested");
        Ok(())
    }
}
