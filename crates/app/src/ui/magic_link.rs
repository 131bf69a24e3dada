use domain::{payloads::SendMagicLinkPayload, AccountAction, OnMagicLinkSent};
use tracing::{info, warn};

use super::{Notice, UiEffect};
use crate::{analytics::Stat, AppContext};

/// Passwordless login: mails a one-tap link to the user.
pub struct MagicLinkController {
    ctx: AppContext,
    in_progress: bool,
    pending_email: Option<String>,
}

impl MagicLinkController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            in_progress: false,
            pending_email: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn request_link(&mut self, email: &str) -> Vec<UiEffect> {
        let email = email.trim();
        if email.is_empty() || self.in_progress {
            return Vec::new();
        }
        if !self.ctx.is_online() {
            return vec![UiEffect::Toast(Notice::NoConnection)];
        }

        self.in_progress = true;
        self.pending_email = Some(email.to_string());
        self.ctx.tracker.track(Stat::LoginMagicLinkRequested);
        self.ctx.dispatcher.dispatch(AccountAction::SendMagicLink(SendMagicLinkPayload {
            email: email.to_string(),
        }));
        vec![UiEffect::ShowProgress(true)]
    }

    pub fn on_magic_link_sent(&mut self, event: &OnMagicLinkSent) -> Vec<UiEffect> {
        if self.pending_email.as_deref() != Some(event.email.as_str()) {
            return Vec::new();
        }
        self.in_progress = false;
        self.pending_email = None;

        let mut effects = vec![UiEffect::ShowProgress(false)];
        match &event.error {
            Some(error) => {
                warn!("Login link for {} failed: {}", event.email, error);
                self.ctx.tracker.track(Stat::LoginMagicLinkFailed);
                effects.push(UiEffect::Toast(Notice::LoginLinkFailed(error.message.clone())));
                effects.push(UiEffect::FallBackToPassword);
            }
            None => {
                info!("Login link sent to {}", event.email);
                self.ctx.tracker.track(Stat::LoginMagicLinkSent);
                effects.push(UiEffect::ShowLinkSent);
            }
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Bench;
    use domain::{Action, AuthError, AuthErrorType};

    #[tokio::test]
    async fn request_dispatches_once() {
        let mut bench = Bench::new().await;
        let mut ctl = MagicLinkController::new(bench.ctx.clone());

        assert!(ctl.request_link("   ").is_empty());
        assert_eq!(ctl.request_link(" ana@example.com "), vec![UiEffect::ShowProgress(true)]);
        assert!(ctl.request_link("ana@example.com").is_empty());

        match bench.dispatched().await.as_slice() {
            [Action::Account(AccountAction::SendMagicLink(p))] => {
                assert_eq!(p.email, "ana@example.com")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(bench.stats(), vec![Stat::LoginMagicLinkRequested]);
    }

    #[tokio::test]
    async fn success_shows_link_sent() {
        let bench = Bench::new().await;
        let mut ctl = MagicLinkController::new(bench.ctx.clone());
        ctl.request_link("ana@example.com");

        let effects = ctl.on_magic_link_sent(&OnMagicLinkSent {
            email: "ana@example.com".into(),
            error: None,
        });
        assert_eq!(effects, vec![UiEffect::ShowProgress(false), UiEffect::ShowLinkSent]);
        assert!(!ctl.is_in_progress());
        assert_eq!(
            bench.stats(),
            vec![Stat::LoginMagicLinkRequested, Stat::LoginMagicLinkSent]
        );
    }

    #[tokio::test]
    async fn failure_falls_back_to_password() {
        let bench = Bench::new().await;
        let mut ctl = MagicLinkController::new(bench.ctx.clone());
        ctl.request_link("ana@example.com");

        let effects = ctl.on_magic_link_sent(&OnMagicLinkSent {
            email: "ana@example.com".into(),
            error: Some(AuthError {
                kind: AuthErrorType::InvalidEmail,
                message: "No such user".into(),
            }),
        });
        assert!(effects.contains(&UiEffect::Toast(Notice::LoginLinkFailed("No such user".into()))));
        assert_eq!(effects.last(), Some(&UiEffect::FallBackToPassword));
        assert_eq!(bench.stats().last(), Some(&Stat::LoginMagicLinkFailed));
    }

    #[tokio::test]
    async fn offline_or_foreign_events_do_nothing() {
        let mut bench = Bench::new().await;
        let mut ctl = MagicLinkController::new(bench.ctx.clone());
        bench.connectivity.set_online(false);
        assert_eq!(
            ctl.request_link("ana@example.com"),
            vec![UiEffect::Toast(Notice::NoConnection)]
        );
        assert!(bench.dispatched().await.is_empty());

        let effects = ctl.on_magic_link_sent(&OnMagicLinkSent {
            email: "someone@else.com".into(),
            error: None,
        });
        assert!(effects.is_empty());
    }
}
