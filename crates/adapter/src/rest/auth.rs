use domain::{
    payloads::{MagicLinkResponsePayload, SendMagicLinkPayload},
    protocol::MagicLinkRequest,
    AccountAction,
};

use super::WpComRestClient;
use crate::{AuthClientCredentials, Dispatcher};

#[derive(Clone)]
pub struct AuthRestClient {
    rest: WpComRestClient,
    dispatcher: Dispatcher,
    credentials: AuthClientCredentials,
}

impl AuthRestClient {
    pub fn new(rest: WpComRestClient, dispatcher: Dispatcher, credentials: AuthClientCredentials) -> Self {
        Self {
            rest,
            dispatcher,
            credentials,
        }
    }

    pub async fn send_magic_link_payload(&self, payload: &SendMagicLinkPayload) -> MagicLinkResponsePayload {
        let body = MagicLinkRequest {
            email: &payload.email,
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
        };
        // 响应体内容无关紧要，只看是否成功
        let result = self
            .rest
            .post::<serde_json::Value, _>(&["v1.3", "auth", "send-login-email"], &body)
            .await;
        MagicLinkResponsePayload {
            email: payload.email.clone(),
            error: result.err().map(Into::into),
        }
    }

    pub fn send_magic_link(&self, payload: SendMagicLinkPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.send_magic_link_payload(&payload).await;
            this.dispatcher.dispatch(AccountAction::SentMagicLink(resp));
        });
    }
}
