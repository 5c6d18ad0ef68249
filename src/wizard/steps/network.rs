use tracing::{debug, info};

use super::{StepContext, StepMessage};
use crate::wizard::WizardState;

/// Poll until the medium reports a usable network device.
pub async fn wait(ctx: StepContext) {
    loop {
        let result = ctx.api().has_network_device().await;
        if ctx.is_cancelled() {
            return;
        }

        match result {
            Ok(true) => break,
            Ok(false) => {
                debug!("No network device yet");
                ctx.emit(StepMessage::ClearError);
            }
            Err(e) => {
                ctx.emit(StepMessage::Error(
                    e.user_message("Error retrieving data from HTTP server"),
                ));
            }
        }

        if !ctx.pause().await {
            return;
        }
    }

    info!("Network device available");
    ctx.transition(|draft| draft.advance_to(WizardState::ServerSearch));
}

#[cfg(test)]
mod tests {
    use super::super::testing::{drain, harness};
    use super::*;
    use crate::wizard::WizardStateProps;
    use serde_json::json;

    fn at_network() -> WizardStateProps {
        WizardStateProps {
            state: WizardState::WaitForNetwork,
            max_state: WizardState::WaitForNetwork,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn advances_once_device_shows_up() {
        let (ctx, mut rx, api) = harness(at_network());
        api.push("has_network_device", json!(false));
        api.push_down("has_network_device");
        api.push("has_network_device", json!(true));

        wait(ctx.clone()).await;

        assert_eq!(api.count("has_network_device"), 3);
        assert_eq!(ctx.props().state, WizardState::ServerSearch);
        assert!(
            drain(&mut rx)
                .iter()
                .any(|m| matches!(m, StepMessage::Error(_)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_left() {
        let (ctx, _rx, api) = harness(at_network());
        api.always("has_network_device", json!(false));

        let task = tokio::spawn(wait(ctx.clone()));
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        ctx.cancel();
        task.await.unwrap();

        let polls = api.count("has_network_device");
        assert!(polls <= 4);
        assert_eq!(ctx.props().state, WizardState::WaitForNetwork);
    }
}
