use tracing::{info, warn};

use super::{StepContext, StepMessage};
use crate::wizard::{BackupImage, LocalDisk, WizardState, WizardStateProps};

/// Advanced restore options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    /// Partition table first, then each volume to its partition
    Normal,
    OnlyMbr,
    /// A single volume onto a chosen partition
    ToPartition,
}

impl RestoreMode {
    pub const ALL: [RestoreMode; 3] = [
        RestoreMode::Normal,
        RestoreMode::OnlyMbr,
        RestoreMode::ToPartition,
    ];

    pub fn of(props: &WizardStateProps) -> Self {
        if props.restore_only_mbr {
            RestoreMode::OnlyMbr
        } else if props.restore_to_partition {
            RestoreMode::ToPartition
        } else {
            RestoreMode::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RestoreMode::Normal => {
                "Restore MBR and GPT, then restore volume to correct partition"
            }
            RestoreMode::OnlyMbr => "Restore only MBR and GPT",
            RestoreMode::ToPartition => "Restore volume to selected partition",
        }
    }

    /// Whether `disk` is a valid target in this mode
    pub fn accepts(&self, disk: &LocalDisk) -> bool {
        match self {
            RestoreMode::ToPartition => disk.is_partition(),
            _ => !disk.is_partition(),
        }
    }
}

/// Images offered for selection: associated volumes become selectable on
/// their own when restoring to a single partition.
pub fn selectable_images(images: &[BackupImage], to_partition: bool) -> Vec<BackupImage> {
    if to_partition {
        BackupImage::flatten(images)
    } else {
        images.to_vec()
    }
}

/// Fetch clients and local disks side by side.
pub async fn load(ctx: StepContext) {
    let to_partition = ctx.props().restore_to_partition;
    ctx.emit(StepMessage::Busy(true));

    let api = ctx.api();
    let (clients, disks) = tokio::join!(api.get_clientnames(), api.get_disks(to_partition));
    if ctx.is_cancelled() {
        return;
    }

    match clients {
        Ok(clients) => {
            ctx.emit(StepMessage::Clients(clients));
        }
        Err(e) => {
            warn!("Fetching clients failed: {}", e);
            ctx.emit(StepMessage::Error(
                e.user_message("Error while getting clients on server"),
            ));
        }
    }

    match disks {
        Ok(disks) => {
            ctx.emit(StepMessage::Disks(disks));
        }
        Err(e) => {
            warn!("Fetching local disks failed: {}", e);
            ctx.emit(StepMessage::Error(
                e.user_message("Error while getting local disks"),
            ));
        }
    }

    ctx.emit(StepMessage::Busy(false));
}

pub async fn select_client(ctx: StepContext, clientname: String) {
    ctx.emit(StepMessage::Busy(true));
    let result = ctx.api().get_backupimages(&clientname).await;
    if ctx.is_cancelled() {
        return;
    }
    ctx.emit(StepMessage::Busy(false));

    match result {
        Ok(images) => {
            let images = images
                .into_iter()
                .map(|image| image.with_client(&clientname))
                .collect();
            ctx.emit(StepMessage::Images(images));
        }
        Err(e) => {
            warn!("Fetching images of {} failed: {}", clientname, e);
            ctx.emit(StepMessage::Error(
                e.user_message("Error while getting images of client on server"),
            ));
        }
    }
}

/// Switch the restore mode and reload the matching target list.
pub async fn set_mode(ctx: StepContext, mode: RestoreMode) {
    if !ctx.transition(|draft| {
        draft.restore_only_mbr = mode == RestoreMode::OnlyMbr;
        draft.restore_to_partition = mode == RestoreMode::ToPartition;
    }) {
        return;
    }

    let result = ctx
        .api()
        .get_disks(mode == RestoreMode::ToPartition)
        .await;
    if ctx.is_cancelled() {
        return;
    }

    match result {
        Ok(disks) => {
            ctx.emit(StepMessage::Disks(disks));
        }
        Err(e) => {
            ctx.emit(StepMessage::Error(
                e.user_message("Error while getting local disks"),
            ));
        }
    }
}

/// Carry the selection into the review step.
pub async fn review(ctx: StepContext, image: Option<BackupImage>, disk: Option<LocalDisk>) {
    let Some(image) = image else {
        ctx.emit(StepMessage::Error(
            "Please select an image to restore".to_string(),
        ));
        return;
    };
    let Some(disk) = disk else {
        ctx.emit(StepMessage::Error(
            "Please select a disk to restore to".to_string(),
        ));
        return;
    };

    info!("Restore of image {} to {} selected", image.id, disk.path);
    ctx.transition(|draft| {
        draft.restore_image = Some(image);
        draft.restore_to_disk = Some(disk);
        draft.advance_to(WizardState::ReviewRestore);
    });
}

#[cfg(test)]
mod tests {
    use super::super::testing::{drain, harness};
    use super::*;
    use serde_json::json;

    fn at_config() -> WizardStateProps {
        WizardStateProps {
            state: WizardState::ConfigRestore,
            max_state: WizardState::ConfigRestore,
            ..Default::default()
        }
    }

    fn find_images(messages: &[StepMessage]) -> Vec<BackupImage> {
        messages
            .iter()
            .find_map(|m| match m {
                StepMessage::Images(images) => Some(images.clone()),
                _ => None,
            })
            .unwrap()
    }

    fn find_disks(messages: &[StepMessage]) -> Vec<LocalDisk> {
        messages
            .iter()
            .find_map(|m| match m {
                StepMessage::Disks(disks) => Some(disks.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn laptop_image_to_second_disk() {
        let (ctx, mut rx, api) = harness(at_config());
        api.push("get_clientnames", json!(["laptop1"]));
        api.push(
            "get_disks",
            json!([
                {"path": "/dev/sda", "model": "SSD", "size": "500G", "type": "disk"},
                {"path": "/dev/sdb", "model": "HDD", "size": "1T", "type": "disk"}
            ]),
        );
        api.push(
            "get_backupimages",
            json!([{"id": 1, "letter": "C:", "time_s": 1700000000, "time_str": "", "assoc": []}]),
        );

        load(ctx.clone()).await;
        let messages = drain(&mut rx);
        assert!(messages.contains(&StepMessage::Clients(vec!["laptop1".to_string()])));
        let disks = find_disks(&messages);

        select_client(ctx.clone(), "laptop1".to_string()).await;
        let images = find_images(&drain(&mut rx));
        assert_eq!(images[0].clientname, "laptop1");

        let disk = disks.into_iter().find(|d| d.path == "/dev/sdb");
        let image = images.into_iter().find(|i| i.id == 1);
        review(ctx.clone(), image, disk).await;

        let props = ctx.props();
        assert_eq!(props.state, WizardState::ReviewRestore);
        assert_eq!(props.max_state, WizardState::ReviewRestore);
        assert_eq!(props.restore_image.as_ref().unwrap().id, 1);
        assert_eq!(props.restore_to_disk.as_ref().unwrap().path, "/dev/sdb");
        assert_eq!(api.calls().iter().find(|c| c.action == "get_backupimages").unwrap().args, vec!["laptop1".to_string()]);
    }

    #[tokio::test]
    async fn review_needs_both_selections() {
        let (ctx, mut rx, _api) = harness(at_config());
        let disk = LocalDisk {
            path: "/dev/sdb".to_string(),
            ..Default::default()
        };

        review(ctx.clone(), None, Some(disk)).await;
        review(
            ctx.clone(),
            Some(BackupImage {
                id: 1,
                ..Default::default()
            }),
            None,
        )
        .await;

        assert_eq!(
            drain(&mut rx),
            vec![
                StepMessage::Error("Please select an image to restore".to_string()),
                StepMessage::Error("Please select a disk to restore to".to_string()),
            ]
        );
        assert_eq!(ctx.props().state, WizardState::ConfigRestore);
    }

    #[tokio::test]
    async fn fetch_errors_are_inline() {
        let (ctx, mut rx, api) = harness(at_config());
        api.push("get_clientnames", json!({"err": "Not logged in"}));
        api.push_down("get_disks");

        load(ctx).await;

        let messages = drain(&mut rx);
        assert!(messages.contains(&StepMessage::Error("Not logged in".to_string())));
        assert!(messages.contains(&StepMessage::Error(
            "Error while getting local disks".to_string()
        )));
    }

    #[tokio::test]
    async fn partition_mode_reloads_with_partitions() {
        let (ctx, mut rx, api) = harness(at_config());
        api.push("get_disks", json!([{"path": "/dev/sda1", "type": "part"}]));

        set_mode(ctx.clone(), RestoreMode::ToPartition).await;

        assert!(ctx.props().restore_to_partition);
        assert_eq!(RestoreMode::of(&ctx.props()), RestoreMode::ToPartition);
        assert_eq!(api.calls()[0].args, vec!["1".to_string()]);
        assert!(find_disks(&drain(&mut rx))[0].is_partition());
    }

    #[test]
    fn partition_mode_offers_associated_volumes() {
        let images = vec![BackupImage {
            id: 1,
            assoc: vec![BackupImage {
                id: 7,
                ..Default::default()
            }],
            ..Default::default()
        }];

        assert_eq!(selectable_images(&images, false).len(), 1);
        let flat = selectable_images(&images, true);
        assert_eq!(flat.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 7]);
    }
}
