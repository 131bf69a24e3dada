use anyhow::Result;
use async_trait::async_trait;
use domain::{Action, ActionType};

/// Consumer of dispatched actions.
///
/// `on_action` runs on the dispatch loop, one action at a time, so stores may
/// read-then-write the local cache without extra locking. Network calls must
/// be spawned and report back by dispatching a response action.
#[async_trait]
pub trait Store: Send + Sync {
    fn name(&self) -> &'static str;

    fn action_types(&self) -> &'static [ActionType];

    async fn on_action(&self, action: &Action) -> Result<()>;
}
