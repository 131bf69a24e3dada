use anyhow::Result;
use async_trait::async_trait;
use domain::{AccountAction, Action, ActionType, OnMagicLinkSent};
use tracing::{info, warn};

use crate::{rest::AuthRestClient, EventBus, Store};

pub struct AccountStore {
    bus: EventBus,
    client: AuthRestClient,
}

impl AccountStore {
    pub fn new(bus: EventBus, client: AuthRestClient) -> Self {
        Self { bus, client }
    }
}

#[async_trait]
impl Store for AccountStore {
    fn name(&self) -> &'static str {
        "account"
    }

    fn action_types(&self) -> &'static [ActionType] {
        &[ActionType::Account]
    }

    async fn on_action(&self, action: &Action) -> Result<()> {
        let Action::Account(action) = action else {
            return Ok(());
        };
        match action {
            AccountAction::SendMagicLink(p) => self.client.send_magic_link(p.clone()),
            AccountAction::SentMagicLink(p) => {
                match &p.error {
                    Some(e) => warn!("Login link for {} failed: {}", p.email, e),
                    None => info!("Login link sent to {}", p.email),
                }
                self.bus.emit(OnMagicLinkSent {
                    email: p.email.clone(),
                    error: p.error.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel,
        test_support::{step, MockResponse, MockWpCom},
        AuthClientCredentials,
    };
    use domain::payloads::SendMagicLinkPayload;
    use std::sync::Arc;

    #[tokio::test]
    async fn sent_link_reaches_subscribers() {
        let mock = MockWpCom::start().await;
        mock.enqueue(MockResponse::json(serde_json::json!({ "success": true }))).await;
        let bus = EventBus::default();
        let (dispatcher, mut queue) = channel();
        let credentials = AuthClientCredentials {
            client_id: "1".into(),
            client_secret: "2".into(),
        };
        let client = AuthRestClient::new(mock.client(), dispatcher.clone(), credentials);
        queue.register(Arc::new(AccountStore::new(bus.clone(), client)));
        let mut events = bus.subscribe::<OnMagicLinkSent>();

        dispatcher.dispatch(AccountAction::SendMagicLink(SendMagicLinkPayload {
            email: "ana@example.com".into(),
        }));
        step(&mut queue).await;
        step(&mut queue).await;

        let event = events.recv().await.unwrap();
        assert_eq!(event.email, "ana@example.com");
        assert!(event.error.is_none());
    }
}
