use tracing::{debug, info, warn};

use super::{StepContext, StepMessage};
use crate::api::ServerConnection;
use crate::wizard::WizardState;

/// Look for a backup server until one shows up. Giving up is left to the
/// operator: after the attempt ceiling only a hint is raised.
pub async fn run(ctx: StepContext) {
    let props = ctx.props();

    if props.internet_server {
        let connection = ServerConnection {
            active: true,
            url: props.server_url.clone(),
            authkey: props.server_authkey.clone(),
            proxy: props.server_proxy.clone(),
        };

        info!("Pushing saved server connection {}", connection.url);
        let result = ctx.api().configure_server(&connection).await;
        if ctx.is_cancelled() {
            return;
        }

        match result {
            Ok(true) => {}
            Ok(false) => {
                ctx.emit(StepMessage::Error(
                    "Error configuring client to connect to server".to_string(),
                ));
            }
            Err(e) => {
                warn!("Pushing server connection failed: {}", e);
                ctx.emit(StepMessage::Error(
                    e.user_message("Error configuring client to connect to server"),
                ));
            }
        }
    }

    let mut polls = 0;
    loop {
        let result = ctx.api().status().await;
        if ctx.is_cancelled() {
            debug!("Server search aborted");
            return;
        }

        match result {
            Ok(status) if status.server_found() => break,
            Ok(status) if status.servers.is_none() => {
                ctx.emit(StepMessage::Error("Unknown status returned".to_string()));
            }
            Ok(_) => {
                ctx.emit(StepMessage::ClearError);
            }
            Err(e) => {
                ctx.emit(StepMessage::Error(
                    e.user_message("Error retrieving data from HTTP server"),
                ));
            }
        }

        polls += 1;
        if polls == ctx.attempts() + 1 {
            info!("No local server after {} polls", ctx.attempts());
            ctx.emit(StepMessage::NoLocalServer);
        }

        if !ctx.pause().await {
            return;
        }
    }

    info!("Server found");
    ctx.transition(|draft| {
        draft.server_found = true;
        draft.advance_to(WizardState::LoginToServer);
    });
}

/// Give up on discovery and enter server details manually.
pub async fn configure_manually(ctx: StepContext) {
    ctx.transition(|draft| draft.advance_to(WizardState::ConfigureServerConnectionDetails));
}

#[cfg(test)]
mod tests {
    use super::super::testing::{drain, harness};
    use super::*;
    use crate::wizard::WizardStateProps;
    use serde_json::json;

    fn at_search() -> WizardStateProps {
        WizardStateProps {
            state: WizardState::ServerSearch,
            max_state: WizardState::ServerSearch,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn finds_local_server() {
        let (ctx, _rx, api) = harness(at_search());
        api.push("status", json!({"servers": []}));
        api.push("status", json!({"servers": [{"name": "backup"}]}));

        run(ctx.clone()).await;

        let props = ctx.props();
        assert!(props.server_found);
        assert_eq!(props.state, WizardState::LoginToServer);
        assert_eq!(props.max_state, WizardState::LoginToServer);
        assert_eq!(api.count("configure_server"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hint_after_ceiling_but_keeps_polling() {
        let (ctx, mut rx, api) = harness(at_search());
        for _ in 0..65 {
            api.push("status", json!({"servers": []}));
        }
        api.push("status", json!({"servers": [{}]}));

        run(ctx.clone()).await;

        assert_eq!(api.count("status"), 66);
        let hints = drain(&mut rx)
            .into_iter()
            .filter(|m| *m == StepMessage::NoLocalServer)
            .count();
        assert_eq!(hints, 1);
        assert_eq!(ctx.props().state, WizardState::LoginToServer);
    }

    #[tokio::test(start_paused = true)]
    async fn internet_server_is_pushed_first() {
        let (ctx, _rx, api) = harness(WizardStateProps {
            internet_server: true,
            server_url: "urbackup://backup.example.com".to_string(),
            server_authkey: "k".to_string(),
            ..at_search()
        });
        api.push("configure_server", json!(true));
        api.push("status", json!({"servers": [{}]}));

        run(ctx.clone()).await;

        assert_eq!(api.actions(), vec!["configure_server", "status"]);
        assert_eq!(api.calls()[0].args[0], "1");
        assert_eq!(api.calls()[0].args[1], "urbackup://backup.example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_servers_field_is_reported() {
        let (ctx, mut rx, api) = harness(at_search());
        api.push("status", json!({}));
        api.push("status", json!({"servers": [{}]}));

        run(ctx).await;
        assert!(drain(&mut rx).contains(&StepMessage::Error("Unknown status returned".to_string())));
    }

    #[tokio::test]
    async fn manual_configuration_is_reachable() {
        let (ctx, _rx, _api) = harness(at_search());
        configure_manually(ctx.clone()).await;
        assert_eq!(ctx.props().state, WizardState::ConfigureServerConnectionDetails);
    }
}
