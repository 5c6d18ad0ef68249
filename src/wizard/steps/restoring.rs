//! The restore itself: partition table first, then every image onto its
//! partition, optionally through spill space that is folded back afterwards.

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{StepContext, StepMessage};
use crate::api::DownloadRequest;
use crate::error::RestoreError;
use crate::wizard::{BackupImage, LocalDisk, WizardState, WizardStateProps};

/// Exit code the service uses when the target is smaller than the image.
pub const EC_DISK_TOO_SMALL: i64 = 11;

pub fn exit_code_message(ec: i64) -> String {
    match ec {
        10 => "Error connecting to server".to_string(),
        2 => "Error opening output device".to_string(),
        3 => "Error reading image size from server".to_string(),
        4 => "Timout while loading image (2)".to_string(),
        5 => "Timout while loading image (1)".to_string(),
        6 => "Writing image to disk failed".to_string(),
        EC_DISK_TOO_SMALL => "Disk too small for image".to_string(),
        _ => format!("Unknown error (code {ec})"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStatus {
    #[default]
    Normal,
    Exception,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub time: DateTime<Local>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadStats {
    pub total_bytes: i64,
    pub done_bytes: i64,
    /// Bytes per millisecond
    pub speed_bpms: f64,
    pub percent: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestoreEvent {
    Log(LogLine),
    Status(ProgressStatus),
    Percent(i64),
    /// What is being restored right now
    Action(String),
    Stats(DownloadStats),
    /// The transfer is alive but not currently moving data
    SpeedIdle,
    DiskTooSmall {
        tried_with_spill: bool,
        retry_with_spill: bool,
    },
    ImageDone,
    Restarting,
    /// The restart request did not go through
    RestartFailed,
}

enum Stop {
    /// Logged and marked as exception already
    Failed,
    Cancelled,
}

type Flow<T> = std::result::Result<T, Stop>;

#[derive(Debug, Clone, Default)]
struct MbrInfo {
    tmpfn: String,
    whole_disk: bool,
}

struct Restore<'a> {
    ctx: &'a StepContext,
    props: Arc<WizardStateProps>,
    disk: LocalDisk,
}

impl<'a> Restore<'a> {
    fn event(&self, event: RestoreEvent) {
        self.ctx.emit(StepMessage::Restore(event));
    }

    fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("Restore: {}", message);
        self.event(RestoreEvent::Log(LogLine {
            time: Local::now(),
            message,
        }));
    }

    fn status(&self, status: ProgressStatus) {
        self.event(RestoreEvent::Status(status));
    }

    fn percent(&self, percent: i64) {
        self.event(RestoreEvent::Percent(percent.clamp(0, 100)));
    }

    fn fail<T>(&self, message: impl Into<String>) -> Flow<T> {
        let message = message.into();
        error!("Restore failed: {}", message);
        self.log(message);
        self.status(ProgressStatus::Exception);
        Err(Stop::Failed)
    }

    fn check(&self) -> Flow<()> {
        if self.ctx.is_cancelled() {
            Err(Stop::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn pause(&self) -> Flow<()> {
        if self.ctx.pause().await {
            Ok(())
        } else {
            Err(Stop::Cancelled)
        }
    }

    /// Download the partition table data of `image` into a temporary file.
    async fn fetch_mbr(&self, image: &BackupImage) -> Flow<String> {
        self.log("Loading MBR and GPT data...");

        let tmpfn = self.ctx.api().get_tmpfn().await;
        self.check()?;
        let tmpfn = match tmpfn {
            Ok(tmpfn) => tmpfn,
            Err(RestoreError::Remote(msg)) => {
                return self.fail(format!("Error while getting temporary file name: {msg}"));
            }
            Err(_) => return self.fail("Error while getting temporary file name"),
        };

        let request = DownloadRequest {
            image_id: image.id,
            image_time: image.time_s,
            out: tmpfn.clone(),
            mbr: true,
        };
        let res_id = self.ctx.api().start_download(&request).await;
        self.check()?;
        let Ok(res_id) = res_id else {
            return self.fail("Error while loading MBR");
        };

        loop {
            self.pause().await?;

            let progress = self.ctx.api().download_progress(res_id).await;
            self.check()?;
            let Ok(progress) = progress else {
                return self.fail("Error while checking MBR restore status");
            };

            if progress.finished {
                match progress.ec.unwrap_or(0) {
                    0 => {
                        self.log("Loading MBR finished");
                        self.status(ProgressStatus::Success);
                        return Ok(tmpfn);
                    }
                    ec => {
                        return self.fail(format!(
                            "Loading MBR failed: {}",
                            exit_code_message(ec)
                        ));
                    }
                }
            } else if let Some(pc) = progress.pc {
                self.percent(pc);
            }
        }
    }

    /// Put the partition table of the selected image on the target disk.
    async fn restore_mbr(&self, image: &BackupImage) -> Flow<MbrInfo> {
        self.event(RestoreEvent::Action("MBR and GPT".to_string()));
        self.percent(0);

        let tmpfn = self.fetch_mbr(image).await?;

        let whole_disk = self.ctx.api().get_is_disk_mbr(&tmpfn).await;
        self.check()?;
        let whole_disk = match whole_disk {
            Ok(whole_disk) => whole_disk,
            Err(e) => {
                warn!("get_is_disk_mbr failed: {}", e);
                self.log("Error while getting if this is a disk MBR");
                self.status(ProgressStatus::Exception);
                false
            }
        };

        if whole_disk {
            self.log("MBR has disk information. Restoring whole disk...");
            self.status(ProgressStatus::Normal);
            return Ok(MbrInfo {
                tmpfn,
                whole_disk: true,
            });
        }

        self.log("Writing MBR and GPT to disk...");
        self.percent(0);
        self.status(ProgressStatus::Normal);

        let written = self.ctx.api().write_mbr(&tmpfn, &self.disk.path).await;
        self.check()?;
        let Ok(written) = written else {
            return self.fail("Error while writing MBR");
        };

        if !written.success {
            return self.fail(format!(
                "Error writing to MBR and GPT: {}",
                written.errmsg
            ));
        }
        if !written.errmsg.is_empty() {
            self.log(format!("Ignoring MBR write error: {}", written.errmsg));
        }

        Ok(MbrInfo {
            tmpfn,
            whole_disk: false,
        })
    }

    /// Resolve where `image` goes: its partition on the target disk, or the
    /// target itself.
    async fn target_partition(&self, image: &BackupImage, mbr: &MbrInfo) -> Flow<(String, i64)> {
        if self.props.restore_to_partition || mbr.whole_disk {
            return Ok((self.disk.path.clone(), -1));
        }

        if mbr.tmpfn.is_empty() {
            return self.fail("MBR info not found. Cannot restore to partition");
        }

        let tmpfn = match self.fetch_mbr(image).await {
            Ok(tmpfn) => tmpfn,
            Err(Stop::Failed) => return self.fail("Error loading MBR of partition."),
            Err(stop) => return Err(stop),
        };
        self.status(ProgressStatus::Normal);

        self.log("Getting partition to restore to...");
        let partition = self.ctx.api().get_partition(&tmpfn, &self.disk.path).await;
        self.check()?;

        match partition {
            Ok(p) if p.success => Ok((p.partpath, p.partnum)),
            _ => self.fail("Error getting partition to restore to"),
        }
    }

    async fn restore_image(&self, image: &BackupImage, mbr: &MbrInfo, with_spill: bool) -> Flow<()> {
        self.event(RestoreEvent::Action(format!(
            "{} - {} client {}",
            image.letter,
            image.display_time(),
            image.clientname
        )));

        let (mut partpath, partnum) = self.target_partition(image, mbr).await?;
        self.log(format!("Restoring image to {partpath}"));

        let mut orig_size = String::new();
        if with_spill {
            self.log("Setting up spill space...");

            let spill = &self.props.spill_space;
            let setup = self
                .ctx
                .api()
                .setup_spill_disks(&partpath, spill.live_medium, &spill.disks)
                .await;
            self.check()?;

            match setup {
                Ok(setup) => {
                    partpath = setup.path;
                    orig_size = setup.orig_size;
                }
                Err(RestoreError::Remote(msg)) => {
                    return self.fail(format!("Error while setting up spill space: {msg}"));
                }
                Err(_) => return self.fail("Error while setting up spill space"),
            }
        }

        self.log("Starting image restore...");
        let request = DownloadRequest {
            image_id: image.id,
            image_time: image.time_s,
            out: partpath.clone(),
            mbr: false,
        };
        let res_id = self.ctx.api().start_download(&request).await;
        self.check()?;
        let Ok(res_id) = res_id else {
            return self.fail("Error while starting image restore");
        };

        self.log("Restore is running");

        loop {
            self.pause().await?;

            let progress = self.ctx.api().download_progress(res_id).await;
            self.check()?;
            let Ok(progress) = progress else {
                return self.fail("Error while checking image restore status");
            };

            if progress.finished {
                let ec = progress.ec.unwrap_or(0);

                if ec == EC_DISK_TOO_SMALL {
                    self.event(RestoreEvent::DiskTooSmall {
                        tried_with_spill: with_spill,
                        retry_with_spill: self.props.spill_space.is_configured(),
                    });
                }

                if ec != 0 {
                    return self.fail(format!(
                        "Restoring image failed: {}",
                        exit_code_message(ec)
                    ));
                }

                self.log("Restoring image finished");
                self.percent(100);
                self.status(ProgressStatus::Success);

                if with_spill {
                    self.status(ProgressStatus::Normal);
                    self.resize_spilled(&partpath, &orig_size, partnum).await?;
                }
                return Ok(());
            }

            if progress.running_processes.is_some() {
                match progress.restore_process() {
                    Some(process) => {
                        if process.percent_done >= 0 {
                            self.percent(process.percent_done);
                        }
                        if let Some(done_bytes) = process.done_bytes {
                            self.event(RestoreEvent::Stats(DownloadStats {
                                total_bytes: process.total_bytes.unwrap_or(0),
                                done_bytes,
                                speed_bpms: process.speed_bpms,
                                percent: process.percent_done,
                            }));
                        }
                    }
                    None => self.event(RestoreEvent::SpeedIdle),
                }
            }
        }
    }

    /// Move the spilled image back onto the (smaller) target and shrink the
    /// partition to fit.
    async fn resize_spilled(&self, disk_fn: &str, new_size: &str, partnum: i64) -> Flow<()> {
        self.log("Resizing partition...");

        let res_id = self.ctx.api().resize_disk(disk_fn, new_size).await;
        self.check()?;
        let Ok(res_id) = res_id else {
            return self.fail("Error starting partition resize");
        };

        loop {
            self.pause().await?;

            let progress = self.ctx.api().restore_finished(res_id).await;
            self.check()?;
            let Ok(progress) = progress else {
                return self.fail("Error while checking image restore status");
            };

            if !progress.finished {
                if let Some(pc) = progress.pcdone {
                    self.percent(pc);
                }
                continue;
            }

            self.percent(100);
            if let Some(err) = progress.err {
                return self.fail(format!("Error resizing partition: {err}"));
            }

            self.log("Resizing done. Cleaning up spill disk...");
            let cleanup = self.ctx.api().cleanup_spill_disks().await;
            self.check()?;
            if cleanup.is_err() {
                self.log("Error cleaning up spill disk");
            }

            if !self.props.restore_to_partition {
                self.log("Resizing partition...");
                let resized = self
                    .ctx
                    .api()
                    .resize_part(&self.disk.path, new_size, partnum)
                    .await;
                self.check()?;
                match resized {
                    Ok(()) => {}
                    Err(RestoreError::Remote(msg)) => self.log(format!(
                        "Error changing partition size. Perhaps fix with gparted? Output: {msg}"
                    )),
                    Err(_) => self.log("Error resizing partition"),
                }
            }

            self.log("Done.");
            return Ok(());
        }
    }

    async fn execute(&self, image: &BackupImage, mut with_spill: bool) -> Flow<()> {
        self.status(ProgressStatus::Normal);

        // A single partition cannot hold the associated volumes as well
        if self.props.restore_to_partition && !image.assoc.is_empty() {
            return self.fail(format!(
                "Image {} has {} associated volumes and cannot be restored to a single partition",
                image.letter,
                image.assoc.len()
            ));
        }

        let mut mbr = MbrInfo::default();
        if !self.props.restore_to_partition {
            mbr = self.restore_mbr(image).await?;

            if self.props.restore_only_mbr {
                return Ok(());
            }
        }

        let mut images = vec![image.clone()];
        images.extend(image.assoc.iter().cloned());

        if images.len() > 1 {
            self.log(format!(
                "Restoring {} images of client {}: ",
                images.len(),
                image.clientname
            ));
        }
        for img in &images {
            self.log(format!("Restoring {} at {}", img.letter, img.display_time()));
        }

        for img in &images {
            self.restore_image(img, &mbr, with_spill).await?;
            // Spill space is only ever set up for the main volume
            with_spill = false;
        }

        Ok(())
    }
}

/// Run the whole restore for the current selection.
pub async fn run(ctx: StepContext, with_spill: bool) {
    let props = ctx.props();
    let (Some(image), Some(disk)) = (props.restore_image.clone(), props.restore_to_disk.clone())
    else {
        warn!("Restore started without image or target disk");
        ctx.emit(StepMessage::Error(
            "Please select an image and a disk to restore to".to_string(),
        ));
        return;
    };

    info!(
        "Restoring image {} of {} to {} (spill: {})",
        image.id, image.clientname, disk.path, with_spill
    );

    let restore = Restore {
        ctx: &ctx,
        props: props.clone(),
        disk,
    };

    match restore.execute(&image, with_spill).await {
        Ok(()) => {
            restore.event(RestoreEvent::ImageDone);
        }
        Err(Stop::Failed) => {}
        Err(Stop::Cancelled) => debug!("Restore view left"),
    }
}

/// Back to the review after a failure.
pub async fn retry(ctx: StepContext) {
    ctx.transition(|draft| draft.restart_from(WizardState::ReviewRestore));
}

pub async fn restore_another(ctx: StepContext) {
    ctx.transition(|draft| draft.restart_from(WizardState::ConfigRestore));
}

pub async fn configure_spill_space(ctx: StepContext) {
    ctx.transition(|draft| draft.restart_from(WizardState::ConfigSpillSpace));
}

pub async fn restart_machine(ctx: StepContext) {
    ctx.emit(StepMessage::Restore(RestoreEvent::Restarting));
    ctx.emit(StepMessage::Restore(RestoreEvent::Log(LogLine {
        time: Local::now(),
        message: "Restarting machine...".to_string(),
    })));

    if let Err(e) = ctx.api().restart().await {
        warn!("Restart request failed: {}", e);
        ctx.emit(StepMessage::Restore(RestoreEvent::Log(LogLine {
            time: Local::now(),
            message: format!("Restarting machine failed: {e}"),
        })));
        ctx.emit(StepMessage::Restore(RestoreEvent::RestartFailed));
    }
}
