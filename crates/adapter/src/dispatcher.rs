use std::{collections::HashMap, sync::Arc};

use domain::{Action, ActionType};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::traits::Store;

/// Cheap handle used by controllers and request builders to enqueue actions.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Action>,
}

impl Dispatcher {
    pub fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();
        debug!("Dispatching {:?} action", action.action_type());
        if self.tx.send(action).is_err() {
            warn!("Dispatch loop has stopped; action dropped");
        }
    }
}

/// Receiving half: owns the store registry and routes actions in order.
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Action>,
    stores: HashMap<ActionType, Vec<Arc<dyn Store>>>,
}

/// Dispatcher whose actions land on a bare receiver instead of a store registry.
#[cfg(test)]
pub(crate) fn detached() -> (Dispatcher, mpsc::UnboundedReceiver<Action>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { tx }, rx)
}

pub fn channel() -> (Dispatcher, DispatchQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    let queue = DispatchQueue {
        tx: tx.clone(),
        rx,
        stores: HashMap::new(),
    };
    (Dispatcher { tx }, queue)
}

impl DispatchQueue {
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            tx: self.tx.clone(),
        }
    }

    pub fn register(&mut self, store: Arc<dyn Store>) {
        for action_type in store.action_types() {
            debug!("Store {} registered for {:?}", store.name(), action_type);
            self.stores
                .entry(*action_type)
                .or_default()
                .push(Arc::clone(&store));
        }
    }

    pub fn store_count(&self) -> usize {
        let mut names: Vec<&'static str> = self
            .stores
            .values()
            .flatten()
            .map(|s| s.name())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.len()
    }

    pub async fn run(mut self, cancel_token: CancellationToken) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Dispatch loop received shutdown signal");
                    break;
                }
                action = self.rx.recv() => match action {
                    Some(action) => self.route(action).await,
                    None => break,
                }
            }
        }
        Ok(())
    }

    /// Waits for the next action and routes it. `false` once every sender is gone.
    #[cfg(test)]
    pub(crate) async fn process_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(action) => {
                self.route(action).await;
                true
            }
            None => false,
        }
    }

    /// Routes every action already queued, including ones enqueued while draining.
    pub async fn drain(&mut self) -> usize {
        let mut routed = 0;
        while let Ok(action) = self.rx.try_recv() {
            self.route(action).await;
            routed += 1;
        }
        routed
    }

    /// Routes one already-queued action, if any.
    #[cfg(test)]
    pub(crate) async fn drain_one(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(action) => {
                self.route(action).await;
                true
            }
            Err(_) => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn try_take(&mut self) -> Option<Action> {
        self.rx.try_recv().ok()
    }

    async fn route(&self, action: Action) {
        let action_type = action.action_type();
        let Some(stores) = self.stores.get(&action_type) else {
            warn!("No store registered for {:?} actions", action_type);
            return;
        };
        for store in stores {
            // 单个 store 出错不能拖垮整个循环
            if let Err(e) = store.on_action(&action).await {
                error!("Store {} failed on {:?}: {:?}", store.name(), action_type, e);
            }
        }
    }
}
