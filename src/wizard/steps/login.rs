use tracing::{info, warn};
use zeroize::Zeroizing;

use super::{StepContext, StepMessage};
use crate::wizard::WizardState;

/// Try an anonymous login once; fall back to the credentials form.
pub async fn try_anonymous(ctx: StepContext) {
    if !ctx.props().username.is_empty() {
        ctx.emit(StepMessage::ShowLoginForm);
        return;
    }

    ctx.emit(StepMessage::Busy(true));
    let result = ctx.api().login(None).await;
    if ctx.is_cancelled() {
        return;
    }
    ctx.emit(StepMessage::Busy(false));

    match result {
        Ok(res) if res.success => {
            info!("Anonymous login succeeded");
            ctx.transition(|draft| draft.advance_to(WizardState::ConfigRestore));
        }
        Ok(_) => {
            ctx.emit(StepMessage::ShowLoginForm);
        }
        Err(e) => {
            warn!("Anonymous login failed: {}", e);
            ctx.emit(StepMessage::Error(e.user_message("Error during anonymous login")));
            ctx.emit(StepMessage::ShowLoginForm);
        }
    }
}

pub async fn submit(ctx: StepContext, username: String, password: Zeroizing<String>) {
    if username.is_empty() {
        ctx.emit(StepMessage::Error("Please enter your username".to_string()));
        return;
    }

    ctx.emit(StepMessage::Busy(true));
    let result = ctx.api().login(Some((username.as_str(), password.as_str()))).await;
    if ctx.is_cancelled() {
        return;
    }
    ctx.emit(StepMessage::Busy(false));

    match result {
        Ok(res) if !res.ok => {
            ctx.emit(StepMessage::Error(
                "Error while submitting login details".to_string(),
            ));
        }
        Ok(res) if res.success => {
            info!("Logged in as {}", username);
            ctx.transition(|draft| {
                draft.username = username;
                draft.password = password;
                draft.advance_to(WizardState::ConfigRestore);
            });
        }
        Ok(_) => {
            ctx.emit(StepMessage::Error("Login failed".to_string()));
        }
        Err(e) => {
            warn!("Login request failed: {}", e);
            ctx.emit(StepMessage::Error(
                e.user_message("Error while submitting login details"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{drain, harness};
    use super::*;
    use crate::wizard::WizardStateProps;
    use serde_json::json;

    fn at_login() -> WizardStateProps {
        WizardStateProps {
            state: WizardState::LoginToServer,
            max_state: WizardState::LoginToServer,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn anonymous_success_skips_form() {
        let (ctx, _rx, api) = harness(at_login());
        api.push("login", json!({"ok": true, "success": true}));

        try_anonymous(ctx.clone()).await;

        assert!(api.calls()[0].args.is_empty());
        assert_eq!(ctx.props().state, WizardState::ConfigRestore);
    }

    #[tokio::test]
    async fn anonymous_refusal_shows_form() {
        let (ctx, mut rx, api) = harness(at_login());
        api.push("login", json!({"ok": true, "success": false}));

        try_anonymous(ctx.clone()).await;

        assert!(drain(&mut rx).contains(&StepMessage::ShowLoginForm));
        assert_eq!(ctx.props().state, WizardState::LoginToServer);
    }

    #[tokio::test]
    async fn known_username_skips_anonymous_attempt() {
        let (ctx, mut rx, api) = harness(WizardStateProps {
            username: "admin".to_string(),
            ..at_login()
        });

        try_anonymous(ctx).await;

        assert_eq!(api.count("login"), 0);
        assert_eq!(drain(&mut rx), vec![StepMessage::ShowLoginForm]);
    }

    #[tokio::test]
    async fn credentials_are_stored_on_success() {
        let (ctx, _rx, api) = harness(at_login());
        api.push("login", json!({"ok": true, "success": true}));

        submit(ctx.clone(), "admin".into(), Zeroizing::new("pw".into())).await;

        assert_eq!(api.calls()[0].args, vec!["admin".to_string(), "pw".to_string()]);
        let props = ctx.props();
        assert_eq!(props.username, "admin");
        assert_eq!(props.password.as_str(), "pw");
        assert_eq!(props.state, WizardState::ConfigRestore);
    }

    #[tokio::test]
    async fn wrong_credentials_keep_form() {
        let (ctx, mut rx, api) = harness(at_login());
        api.push("login", json!({"ok": true, "success": false}));
        api.push("login", json!({"ok": false}));

        submit(ctx.clone(), "admin".into(), Zeroizing::new("bad".into())).await;
        submit(ctx.clone(), "admin".into(), Zeroizing::new("bad".into())).await;

        let messages = drain(&mut rx);
        assert!(messages.contains(&StepMessage::Error("Login failed".to_string())));
        assert!(messages.contains(&StepMessage::Error(
            "Error while submitting login details".to_string()
        )));
        assert_eq!(ctx.props().state, WizardState::LoginToServer);
        assert!(ctx.props().username.is_empty());
    }
}
