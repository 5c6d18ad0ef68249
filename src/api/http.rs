use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::*;
use super::{RestoreApi, spill_setup_form};
use crate::error::{RestoreError, Result};
use crate::wizard::{BackupImage, LocalDisk, SpillDiskChoice};

type Form = Vec<(String, String)>;

fn form<const N: usize>(fields: [(&str, String); N]) -> Form {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Restore-control client talking to the service on the restore medium.
#[derive(Clone)]
pub struct HttpRestoreApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRestoreApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the action and return the raw JSON answer.
    async fn post(&self, action: &str, fields: Form) -> Result<serde_json::Value> {
        let url = format!("{}/x", self.base_url);
        debug!("POST {}?a={}", url, action);

        let response = self
            .client
            .post(&url)
            .query(&[("a", action)])
            .form(&fields)
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Object(Default::default()));
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// POST the action, map an `err` member to [`RestoreError::Remote`] and
    /// decode the rest into `T`.
    async fn call<T: DeserializeOwned>(&self, action: &str, fields: Form) -> Result<T> {
        let value = self.post(action, fields).await?;

        if let Some(err) = value.get("err") {
            let msg = match err {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            warn!("{} returned error: {}", action, msg);
            return Err(RestoreError::Remote(msg));
        }

        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl RestoreApi for HttpRestoreApi {
    async fn get_connection_settings(&self) -> Result<ConnectionSettings> {
        self.call("get_connection_settings", Form::new()).await
    }

    async fn get_keyboard_layouts(&self) -> Result<Vec<String>> {
        let res: KeyboardLayouts = self.call("get_keyboard_layouts", Form::new()).await?;
        Ok(res.layouts.unwrap_or_default())
    }

    async fn set_keyboard_layout(&self, layout: &str) -> Result<()> {
        self.post("set_keyboard_layout", form([("layout", layout.to_string())]))
            .await
            .map(|_| ())
    }

    async fn has_network_device(&self) -> Result<bool> {
        let res: RetFlag = self.call("has_network_device", Form::new()).await?;
        Ok(res.ret)
    }

    async fn status(&self) -> Result<ServerStatus> {
        self.call("status", Form::new()).await
    }

    async fn configure_server(&self, connection: &ServerConnection) -> Result<bool> {
        let fields = form([
            ("active", if connection.active { "1" } else { "0" }.to_string()),
            ("url", connection.url.clone()),
            ("authkey", connection.authkey.clone()),
            ("proxy", connection.proxy.clone()),
        ]);
        let res: OkFlag = self.call("configure_server", fields).await?;
        Ok(res.ok)
    }

    async fn login(&self, credentials: Option<(&str, &str)>) -> Result<LoginResult> {
        let fields = match credentials {
            Some((username, password)) => form([
                ("has_login_data", "1".to_string()),
                ("username", username.to_string()),
                ("password", password.to_string()),
            ]),
            None => Form::new(),
        };
        self.call("login", fields).await
    }

    async fn get_clientnames(&self) -> Result<Vec<String>> {
        let res: ClientNames = self.call("get_clientnames", Form::new()).await?;
        Ok(res.clients)
    }

    async fn get_backupimages(&self, clientname: &str) -> Result<Vec<BackupImage>> {
        let res: BackupImages = self
            .call(
                "get_backupimages",
                form([("restore_name", clientname.to_string())]),
            )
            .await?;
        Ok(res.images)
    }

    async fn get_disks(&self, partitions: bool) -> Result<Vec<LocalDisk>> {
        let fields = if partitions {
            form([("partitions", "1".to_string())])
        } else {
            Form::new()
        };
        let res: Disks = self.call("get_disks", fields).await?;
        Ok(res.disks)
    }

    async fn get_spill_disks(&self, exclude: Option<&str>) -> Result<SpillDisks> {
        let fields = match exclude {
            Some(path) if !path.is_empty() => form([("exclude", path.to_string())]),
            _ => Form::new(),
        };
        self.call("get_spill_disks", fields).await
    }

    async fn test_spill_disks(&self, paths: &[String]) -> Result<Vec<TestedDisk>> {
        let fields = paths
            .iter()
            .enumerate()
            .map(|(idx, path)| (format!("disk{idx}"), path.clone()))
            .collect();
        let res: TestedDisks = self.call("test_spill_disks", fields).await?;
        Ok(res.disks)
    }

    async fn get_tmpfn(&self) -> Result<String> {
        let res: TmpFileName = self.call("get_tmpfn", Form::new()).await?;
        Ok(res.name)
    }

    async fn start_download(&self, request: &DownloadRequest) -> Result<i64> {
        let mut fields = form([
            ("img_id", request.image_id.to_string()),
            ("img_time", request.image_time.to_string()),
            ("out", request.out.clone()),
        ]);
        if request.mbr {
            fields.push(("mbr".to_string(), "1".to_string()));
        }
        let res: ResId = self.call("start_download", fields).await?;
        Ok(res.res_id)
    }

    async fn download_progress(&self, res_id: i64) -> Result<DownloadProgress> {
        self.call("download_progress", form([("res_id", res_id.to_string())]))
            .await
    }

    async fn get_is_disk_mbr(&self, mbrfn: &str) -> Result<bool> {
        let res: IsDiskMbr = self
            .call("get_is_disk_mbr", form([("mbrfn", mbrfn.to_string())]))
            .await?;
        if !res.ok {
            return Err(RestoreError::Remote(
                "get_is_disk_mbr response not ok".to_string(),
            ));
        }
        Ok(res.res)
    }

    async fn write_mbr(&self, mbrfn: &str, out_device: &str) -> Result<WriteMbrResult> {
        self.call(
            "write_mbr",
            form([
                ("mbrfn", mbrfn.to_string()),
                ("out_device", out_device.to_string()),
            ]),
        )
        .await
    }

    async fn get_partition(&self, mbrfn: &str, out_device: &str) -> Result<PartitionResult> {
        self.call(
            "get_partition",
            form([
                ("mbrfn", mbrfn.to_string()),
                ("out_device", out_device.to_string()),
            ]),
        )
        .await
    }

    async fn setup_spill_disks(
        &self,
        orig_dev: &str,
        live_medium: bool,
        disks: &[SpillDiskChoice],
    ) -> Result<SpillSetup> {
        self.call(
            "setup_spill_disks",
            spill_setup_form(orig_dev, live_medium, disks),
        )
        .await
    }

    async fn resize_disk(&self, disk_fn: &str, new_size: &str) -> Result<i64> {
        let res: ResId = self
            .call(
                "resize_disk",
                form([
                    ("disk_fn", disk_fn.to_string()),
                    ("new_size", new_size.to_string()),
                ]),
            )
            .await?;
        Ok(res.res_id)
    }

    async fn restore_finished(&self, res_id: i64) -> Result<ResizeProgress> {
        // `err` here describes the finished resize, not the request
        let value = self
            .post("restore_finished", form([("res_id", res_id.to_string())]))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn cleanup_spill_disks(&self) -> Result<()> {
        self.post("cleanup_spill_disks", Form::new())
            .await
            .map(|_| ())
    }

    async fn resize_part(&self, disk_fn: &str, new_size: &str, partnum: i64) -> Result<()> {
        self.call::<serde_json::Value>(
            "resize_part",
            form([
                ("disk_fn", disk_fn.to_string()),
                ("new_size", new_size.to_string()),
                ("partnum", partnum.to_string()),
            ]),
        )
        .await
        .map(|_| ())
    }

    async fn restart(&self) -> Result<()> {
        self.post("restart", Form::new()).await.map(|_| ())
    }
}
