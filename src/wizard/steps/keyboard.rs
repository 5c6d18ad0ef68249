use tracing::{info, warn};

use super::{StepContext, StepMessage};
use crate::wizard::WizardState;

pub async fn load(ctx: StepContext) {
    ctx.emit(StepMessage::Busy(true));

    let result = ctx.api().get_keyboard_layouts().await;
    if ctx.is_cancelled() {
        return;
    }

    match result {
        Ok(layouts) if !layouts.is_empty() => {
            ctx.emit(StepMessage::Layouts(layouts));
        }
        Ok(_) => {
            ctx.emit(StepMessage::Error("No layouts found".to_string()));
        }
        Err(e) => {
            warn!("Fetching keyboard layouts failed: {}", e);
            ctx.emit(StepMessage::Error(
                e.user_message("Error while retrieving keyboard layouts"),
            ));
        }
    }
    ctx.emit(StepMessage::Busy(false));
}

/// Apply `layout` on the medium and continue.
pub async fn select(ctx: StepContext, layout: String) {
    ctx.emit(StepMessage::Busy(true));

    let result = ctx.api().set_keyboard_layout(&layout).await;
    if ctx.is_cancelled() {
        return;
    }

    if let Err(e) = result {
        warn!("Setting keyboard layout {} failed: {}", layout, e);
        ctx.emit(StepMessage::Error(
            e.user_message("Error setting keyboard layout"),
        ));
        ctx.emit(StepMessage::Busy(false));
        return;
    }

    info!("Keyboard layout set to {}", layout);
    ctx.transition(|draft| {
        draft.keyboard_layout = layout;
        draft.advance_to(WizardState::WaitForNetwork);
    });
}

/// Continue with the layout unchanged.
pub async fn skip(ctx: StepContext) {
    ctx.transition(|draft| draft.advance_to(WizardState::WaitForNetwork));
}
