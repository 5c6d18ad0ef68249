use tracing::{debug, info, warn};

use super::{StepContext, StepMessage};
use crate::api::ServerConnection;
use crate::wizard::WizardState;

/// Internet status values that mean "still connecting".
fn is_transient(status: &str) -> bool {
    ["initializing", "wait_local", "connected"]
        .iter()
        .any(|s| status.contains(s))
}

fn is_fatal(status: &str) -> bool {
    status == "connecting_failed" || status.starts_with("error:")
}

/// Push manually entered connection details and wait for the connection.
pub async fn submit(ctx: StepContext, connection: ServerConnection) {
    if connection.url.trim().is_empty() {
        ctx.emit(StepMessage::Error(
            "Please enter the Server URL to connect to".to_string(),
        ));
        return;
    }
    if connection.authkey.is_empty() {
        ctx.emit(StepMessage::Error(
            "Please enter the restore authentication key for the server".to_string(),
        ));
        return;
    }

    ctx.emit(StepMessage::Busy(true));
    let result = ctx.api().configure_server(&connection).await;
    if ctx.is_cancelled() {
        return;
    }
    ctx.emit(StepMessage::Busy(false));

    match result {
        Ok(true) => {
            info!("Server connection configured for {}", connection.url);
            ctx.transition(|draft| {
                draft.internet_server = connection.active;
                draft.server_url = connection.url;
                draft.server_authkey = connection.authkey;
                draft.server_proxy = connection.proxy;
                draft.advance_to(WizardState::WaitForConnection);
            });
        }
        Ok(false) => {
            ctx.emit(StepMessage::Error(
                "Error configuring client to connect to server".to_string(),
            ));
        }
        Err(e) => {
            warn!("configure_server failed: {}", e);
            ctx.emit(StepMessage::Error(
                e.user_message("Error retrieving data from HTTP server"),
            ));
        }
    }
}

/// Poll the connection state. Ends in LoginToServer, or in a single
/// blocking error once the attempts run out or the service reports failure.
pub async fn wait(ctx: StepContext) {
    let mut polls = 0;

    loop {
        let result = ctx.api().status().await;
        if ctx.is_cancelled() {
            debug!("Connection wait aborted");
            return;
        }

        let note = match result {
            Ok(status) if status.server_found() => break,
            Ok(status) if status.servers.is_none() => "Unknown status returned".to_string(),
            Ok(status) => status.internet_status.unwrap_or_default(),
            Err(e) => e.user_message("Error retrieving data from HTTP server"),
        };

        if is_transient(&note) {
            ctx.emit(StepMessage::ClearError);
            ctx.emit(StepMessage::Info(note.clone()));
        } else {
            ctx.emit(StepMessage::Info(String::new()));
            if note.is_empty() {
                ctx.emit(StepMessage::ClearError);
            } else {
                ctx.emit(StepMessage::Error(note.clone()));
            }
        }

        polls += 1;
        if polls > ctx.attempts() || is_fatal(&note) {
            warn!("Connecting to server failed after {} polls: {}", polls, note);
            ctx.emit(StepMessage::ConnectionFailed(format!(
                "Connecting to server failed: {note}"
            )));
            return;
        }

        if !ctx.pause().await {
            return;
        }
    }

    info!("Server connected");
    ctx.transition(|draft| {
        draft.server_found = true;
        draft.advance_to(WizardState::LoginToServer);
    });
}

/// Back to the connection form, keeping recorded progress.
pub async fn change_configuration(ctx: StepContext) {
    ctx.transition(|draft| draft.state = WizardState::ConfigureServerConnectionDetails);
}

#[cfg(test)]
mod tests {
    use super::super::testing::{drain, harness};
    use super::*;
    use crate::wizard::WizardStateProps;
    use serde_json::json;

    fn at(state: WizardState) -> WizardStateProps {
        WizardStateProps {
            state,
            max_state: state,
            ..Default::default()
        }
    }

    fn connection(url: &str, authkey: &str) -> ServerConnection {
        ServerConnection {
            active: true,
            url: url.to_string(),
            authkey: authkey.to_string(),
            proxy: String::new(),
        }
    }

    #[tokio::test]
    async fn submit_requires_url_and_authkey() {
        let (ctx, mut rx, api) = harness(at(WizardState::ConfigureServerConnectionDetails));

        submit(ctx.clone(), connection("", "k")).await;
        submit(ctx.clone(), connection("urbackup://x", "")).await;

        assert_eq!(api.count("configure_server"), 0);
        let errors: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|m| matches!(m, StepMessage::Error(_)))
            .collect();
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn submit_stores_details_and_advances() {
        let (ctx, _rx, api) = harness(at(WizardState::ConfigureServerConnectionDetails));
        api.push("configure_server", json!(true));

        submit(ctx.clone(), connection("urbackup://backup.example.com", "key")).await;

        let props = ctx.props();
        assert_eq!(props.state, WizardState::WaitForConnection);
        assert_eq!(props.server_url, "urbackup://backup.example.com");
        assert!(props.internet_server);
    }

    #[tokio::test]
    async fn rejected_configuration_stays() {
        let (ctx, mut rx, api) = harness(at(WizardState::ConfigureServerConnectionDetails));
        api.push("configure_server", json!(false));

        submit(ctx.clone(), connection("urbackup://x", "k")).await;

        assert_eq!(ctx.props().state, WizardState::ConfigureServerConnectionDetails);
        assert!(drain(&mut rx).contains(&StepMessage::Error(
            "Error configuring client to connect to server".to_string()
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_raises_exactly_one_modal() {
        let (ctx, mut rx, api) = harness(at(WizardState::WaitForConnection));
        api.always("status", json!({"servers": []}));

        wait(ctx.clone()).await;
        // Nothing keeps polling after the modal
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;

        assert_eq!(api.count("status"), 61);
        let modals = drain(&mut rx)
            .into_iter()
            .filter(|m| matches!(m, StepMessage::ConnectionFailed(_)))
            .count();
        assert_eq!(modals, 1);
        assert_eq!(ctx.props().state, WizardState::WaitForConnection);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_states_are_info_then_connect() {
        let (ctx, mut rx, api) = harness(at(WizardState::WaitForConnection));
        api.push("status", json!({"servers": [], "internet_status": "initializing"}));
        api.push("status", json!({"servers": [], "internet_status": "connected"}));
        api.push("status", json!({"servers": [{}]}));

        wait(ctx.clone()).await;

        let messages = drain(&mut rx);
        assert!(messages.contains(&StepMessage::Info("initializing".to_string())));
        assert!(!messages.iter().any(|m| matches!(m, StepMessage::Error(_))));
        assert_eq!(ctx.props().state, WizardState::LoginToServer);
        assert!(ctx.props().server_found);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_failure_is_fatal_immediately() {
        let (ctx, mut rx, api) = harness(at(WizardState::WaitForConnection));
        api.push("status", json!({"servers": [], "internet_status": "error: authentication failed"}));

        wait(ctx).await;

        assert_eq!(api.count("status"), 1);
        assert!(drain(&mut rx).contains(&StepMessage::ConnectionFailed(
            "Connecting to server failed: error: authentication failed".to_string()
        )));
    }

    #[tokio::test]
    async fn dismissing_returns_to_form_without_losing_progress() {
        let (ctx, _rx, _api) = harness(at(WizardState::WaitForConnection));

        change_configuration(ctx.clone()).await;

        let props = ctx.props();
        assert_eq!(props.state, WizardState::ConfigureServerConnectionDetails);
        assert_eq!(props.max_state, WizardState::WaitForConnection);
    }
}
