use tracing::info;

use super::{StepContext, StepMessage};
use crate::wizard::WizardState;

/// Start the restore. The menu stays locked until the restore step offers
/// a way out.
pub async fn confirm(ctx: StepContext) {
    let props = ctx.props();
    if !props.has_restore_selection() {
        ctx.emit(StepMessage::Error(
            "Please select an image and a disk to restore to".to_string(),
        ));
        return;
    }

    info!("Restore confirmed");
    ctx.transition(|draft| {
        draft.disable_menu = true;
        draft.advance_to(WizardState::Restoring);
    });
}

pub async fn back(ctx: StepContext) {
    ctx.transition(|draft| draft.state = WizardState::ConfigRestore);
}
