//! Client side of the restore-control HTTP service running on the restore
//! medium. Every call is a `POST x?a=<action>` with a form body answered by
//! JSON; an `err` member in any answer becomes [`RestoreError::Remote`].
//!
//! [`RestoreError::Remote`]: crate::error::RestoreError::Remote

mod demo;
mod http;
mod types;

pub use demo::DemoRestoreApi;
pub use http::HttpRestoreApi;
pub use types::{
    ConnectionSettings, DownloadProgress, DownloadRequest, LoginResult, PartitionResult,
    ResizeProgress, RestoreProcess, ServerConnection, ServerStatus, SpillDiskInfo, SpillDisks,
    SpillSetup, TestedDisk, WriteMbrResult,
};

use async_trait::async_trait;

use crate::error::Result;
use crate::wizard::{BackupImage, LocalDisk, SpillDiskChoice};

#[async_trait]
pub trait RestoreApi: Send + Sync {
    // Bootstrap and connectivity
    async fn get_connection_settings(&self) -> Result<ConnectionSettings>;
    async fn get_keyboard_layouts(&self) -> Result<Vec<String>>;
    async fn set_keyboard_layout(&self, layout: &str) -> Result<()>;
    async fn has_network_device(&self) -> Result<bool>;
    async fn status(&self) -> Result<ServerStatus>;
    /// Returns the service's `ok` flag
    async fn configure_server(&self, connection: &ServerConnection) -> Result<bool>;
    /// Anonymous login when `credentials` is `None`
    async fn login(&self, credentials: Option<(&str, &str)>) -> Result<LoginResult>;

    // Restore selection
    async fn get_clientnames(&self) -> Result<Vec<String>>;
    async fn get_backupimages(&self, clientname: &str) -> Result<Vec<BackupImage>>;
    async fn get_disks(&self, partitions: bool) -> Result<Vec<LocalDisk>>;
    async fn get_spill_disks(&self, exclude: Option<&str>) -> Result<SpillDisks>;
    async fn test_spill_disks(&self, paths: &[String]) -> Result<Vec<TestedDisk>>;

    // Transfers
    async fn get_tmpfn(&self) -> Result<String>;
    async fn start_download(&self, request: &DownloadRequest) -> Result<i64>;
    async fn download_progress(&self, res_id: i64) -> Result<DownloadProgress>;
    async fn get_is_disk_mbr(&self, mbrfn: &str) -> Result<bool>;
    async fn write_mbr(&self, mbrfn: &str, out_device: &str) -> Result<WriteMbrResult>;
    async fn get_partition(&self, mbrfn: &str, out_device: &str) -> Result<PartitionResult>;

    // Spill space
    async fn setup_spill_disks(
        &self,
        orig_dev: &str,
        live_medium: bool,
        disks: &[SpillDiskChoice],
    ) -> Result<SpillSetup>;
    async fn resize_disk(&self, disk_fn: &str, new_size: &str) -> Result<i64>;
    async fn restore_finished(&self, res_id: i64) -> Result<ResizeProgress>;
    async fn cleanup_spill_disks(&self) -> Result<()>;
    async fn resize_part(&self, disk_fn: &str, new_size: &str, partnum: i64) -> Result<()>;

    async fn restart(&self) -> Result<()>;
}

/// Form fields for `setup_spill_disks`: the live medium first (never
/// destructive), then each disk with its own index.
pub(crate) fn spill_setup_form(
    orig_dev: &str,
    live_medium: bool,
    disks: &[SpillDiskChoice],
) -> Vec<(String, String)> {
    let mut form = vec![("orig_dev".to_string(), orig_dev.to_string())];
    let mut idx = 0;

    if live_medium {
        form.push((format!("disk{idx}"), "live_medium".to_string()));
        form.push((format!("destructive{idx}"), "0".to_string()));
        idx += 1;
    }

    for disk in disks {
        form.push((format!("disk{idx}"), disk.path.clone()));
        form.push((
            format!("destructive{idx}"),
            if disk.destructive { "1" } else { "0" }.to_string(),
        ));
        idx += 1;
    }

    form
}
