use tracing::{info, warn};

use super::StepContext;
use crate::wizard::WizardState;

fn ask_for_keyboard(ctx: &StepContext) {
    ctx.transition(|draft| {
        draft.state = WizardState::SelectKeyboard;
        draft.max_state = WizardState::WaitForNetwork;
    });
}

/// Pick the first step from the connection settings saved on the medium.
pub async fn run(ctx: StepContext) {
    let settings = match ctx.api().get_connection_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Could not read saved connection settings: {}", e);
            Default::default()
        }
    };

    if ctx.is_cancelled() {
        return;
    }

    if settings.no_config || settings.server_url.is_empty() {
        ask_for_keyboard(&ctx);
        return;
    }

    info!("Using saved server {}", settings.server_url);

    let layout = settings.keyboard_layout.clone();
    if layout.is_empty() || layout == "ask" {
        ctx.transition(|draft| {
            draft.server_url = settings.server_url;
            draft.server_authkey = settings.server_authkey;
            draft.server_proxy = settings.server_proxy;
            draft.internet_server = true;
            draft.state = WizardState::SelectKeyboard;
            draft.max_state = WizardState::WaitForNetwork;
        });
        return;
    }

    if let Err(e) = ctx.api().set_keyboard_layout(&layout).await {
        warn!("Applying saved keyboard layout {} failed: {}", layout, e);
        ask_for_keyboard(&ctx);
        return;
    }

    ctx.transition(|draft| {
        draft.keyboard_layout = layout;
        draft.server_url = settings.server_url;
        draft.server_authkey = settings.server_authkey;
        draft.server_proxy = settings.server_proxy;
        draft.internet_server = true;
        draft.advance_to(WizardState::ServerSearch);
    });
}
