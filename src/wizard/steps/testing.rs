//! Scripted in-memory restore service for step tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::{StepContext, StepEnvelope, StepMessage};
use crate::api::*;
use crate::config::PollingConfig;
use crate::error::{RestoreError, Result};
use crate::wizard::{BackupImage, LocalDisk, SpillDiskChoice, WizardStateProps, WizardStore};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// JSON of the call's return value, or `{"err": ..}`
    Json(Value),
    /// Transport failure
    Down,
}

#[derive(Default)]
struct Script {
    queue: VecDeque<Reply>,
    fallback: Option<Reply>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub action: &'static str,
    pub args: Vec<String>,
}

/// Replies are consumed in order per action; once a queue runs dry the
/// action's fallback (if any) answers every further call.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    scripts: Mutex<HashMap<&'static str, Script>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn push(&self, action: &'static str, value: Value) {
        self.push_reply(action, Reply::Json(value));
    }

    pub fn push_down(&self, action: &'static str) {
        self.push_reply(action, Reply::Down);
    }

    pub fn push_reply(&self, action: &'static str, reply: Reply) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.entry(action).or_default().queue.push_back(reply);
    }

    pub fn always(&self, action: &'static str, value: Value) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.entry(action).or_default().fallback = Some(Reply::Json(value));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.action == action)
            .count()
    }

    pub fn actions(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|c| c.action).collect()
    }

    fn next(&self, action: &'static str, args: Vec<String>) -> Option<Reply> {
        self.calls.lock().unwrap().push(Call { action, args });

        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.get_mut(action)?;
        script.queue.pop_front().or_else(|| script.fallback.clone())
    }

    fn reply<T: DeserializeOwned>(&self, action: &'static str, args: Vec<String>) -> Result<T> {
        match self.next(action, args) {
            Some(Reply::Json(value)) => {
                if let Some(err) = value.get("err").and_then(Value::as_str) {
                    return Err(RestoreError::Remote(err.to_string()));
                }
                Ok(serde_json::from_value(value)?)
            }
            Some(Reply::Down) => Err(RestoreError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            None => Err(RestoreError::Remote(format!("{action} not scripted"))),
        }
    }

    /// Like `reply` for calls without a result; unscripted calls succeed.
    fn ack(&self, action: &'static str, args: Vec<String>) -> Result<()> {
        match self.next(action, args) {
            None => Ok(()),
            Some(Reply::Json(value)) => match value.get("err").and_then(Value::as_str) {
                Some(err) => Err(RestoreError::Remote(err.to_string())),
                None => Ok(()),
            },
            Some(Reply::Down) => Err(RestoreError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

fn args<const N: usize>(values: [&str; N]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl RestoreApi for ScriptedApi {
    async fn get_connection_settings(&self) -> Result<ConnectionSettings> {
        self.reply("get_connection_settings", vec![])
    }

    async fn get_keyboard_layouts(&self) -> Result<Vec<String>> {
        self.reply("get_keyboard_layouts", vec![])
    }

    async fn set_keyboard_layout(&self, layout: &str) -> Result<()> {
        self.ack("set_keyboard_layout", args([layout]))
    }

    async fn has_network_device(&self) -> Result<bool> {
        self.reply("has_network_device", vec![])
    }

    async fn status(&self) -> Result<ServerStatus> {
        self.reply("status", vec![])
    }

    async fn configure_server(&self, connection: &ServerConnection) -> Result<bool> {
        let active = if connection.active { "1" } else { "0" };
        self.reply(
            "configure_server",
            args([active, &connection.url, &connection.authkey, &connection.proxy]),
        )
    }

    async fn login(&self, credentials: Option<(&str, &str)>) -> Result<LoginResult> {
        let call_args = match credentials {
            Some((username, password)) => args([username, password]),
            None => vec![],
        };
        self.reply("login", call_args)
    }

    async fn get_clientnames(&self) -> Result<Vec<String>> {
        self.reply("get_clientnames", vec![])
    }

    async fn get_backupimages(&self, clientname: &str) -> Result<Vec<BackupImage>> {
        self.reply("get_backupimages", args([clientname]))
    }

    async fn get_disks(&self, partitions: bool) -> Result<Vec<LocalDisk>> {
        self.reply("get_disks", args([if partitions { "1" } else { "0" }]))
    }

    async fn get_spill_disks(&self, exclude: Option<&str>) -> Result<SpillDisks> {
        self.reply("get_spill_disks", args([exclude.unwrap_or("")]))
    }

    async fn test_spill_disks(&self, paths: &[String]) -> Result<Vec<TestedDisk>> {
        self.reply("test_spill_disks", paths.to_vec())
    }

    async fn get_tmpfn(&self) -> Result<String> {
        self.reply("get_tmpfn", vec![])
    }

    async fn start_download(&self, request: &DownloadRequest) -> Result<i64> {
        self.reply(
            "start_download",
            args([
                &request.image_id.to_string(),
                &request.out,
                if request.mbr { "mbr" } else { "image" },
            ]),
        )
    }

    async fn download_progress(&self, res_id: i64) -> Result<DownloadProgress> {
        self.reply("download_progress", args([&res_id.to_string()]))
    }

    async fn get_is_disk_mbr(&self, mbrfn: &str) -> Result<bool> {
        self.reply("get_is_disk_mbr", args([mbrfn]))
    }

    async fn write_mbr(&self, mbrfn: &str, out_device: &str) -> Result<WriteMbrResult> {
        self.reply("write_mbr", args([mbrfn, out_device]))
    }

    async fn get_partition(&self, mbrfn: &str, out_device: &str) -> Result<PartitionResult> {
        self.reply("get_partition", args([mbrfn, out_device]))
    }

    async fn setup_spill_disks(
        &self,
        orig_dev: &str,
        _live_medium: bool,
        disks: &[SpillDiskChoice],
    ) -> Result<SpillSetup> {
        let mut call_args = args([orig_dev]);
        call_args.extend(disks.iter().map(|d| d.path.clone()));
        self.reply("setup_spill_disks", call_args)
    }

    async fn resize_disk(&self, disk_fn: &str, new_size: &str) -> Result<i64> {
        self.reply("resize_disk", args([disk_fn, new_size]))
    }

    async fn restore_finished(&self, res_id: i64) -> Result<ResizeProgress> {
        // The `err` member belongs to the payload here
        match self.next("restore_finished", args([&res_id.to_string()])) {
            Some(Reply::Json(value)) => Ok(serde_json::from_value(value)?),
            _ => Err(RestoreError::Remote("restore_finished not scripted".to_string())),
        }
    }

    async fn cleanup_spill_disks(&self) -> Result<()> {
        self.ack("cleanup_spill_disks", vec![])
    }

    async fn resize_part(&self, disk_fn: &str, new_size: &str, partnum: i64) -> Result<()> {
        self.ack("resize_part", args([disk_fn, new_size, &partnum.to_string()]))
    }

    async fn restart(&self) -> Result<()> {
        self.ack("restart", vec![])
    }
}

/// Context for a step task backed by a fresh [`ScriptedApi`], with the
/// receiving end of its message channel.
pub(crate) fn harness(
    props: WizardStateProps,
) -> (
    StepContext,
    mpsc::UnboundedReceiver<StepEnvelope>,
    Arc<ScriptedApi>,
) {
    let api = Arc::new(ScriptedApi::default());
    let (tx, rx) = mpsc::unbounded_channel();
    let ctx = StepContext::new(
        api.clone(),
        WizardStore::new(props),
        tx,
        1,
        PollingConfig::default(),
    );
    (ctx, rx, api)
}

/// Everything emitted so far.
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<StepEnvelope>) -> Vec<StepMessage> {
    let mut out = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        out.push(envelope.message);
    }
    out
}
