//! Controller test bench: an in-memory cache, a dispatch queue that records
//! every action instead of calling the network, and a recording tracker.

use std::sync::{Arc, Mutex};

use adapter::{channel, DispatchQueue, EventBus, Store};
use async_trait::async_trait;
use domain::{Action, ActionType};
use storage::Db;

use crate::{
    analytics::{Stat, Tracker},
    connectivity::ManualConnectivity,
    AppContext,
};

#[derive(Default)]
pub struct RecordingTracker {
    pub stats: Mutex<Vec<Stat>>,
}

impl Tracker for RecordingTracker {
    fn track(&self, stat: Stat) {
        self.stats.lock().unwrap().push(stat);
    }
}

#[derive(Default)]
struct RecordingStore {
    actions: Mutex<Vec<Action>>,
}

#[async_trait]
impl Store for RecordingStore {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn action_types(&self) -> &'static [ActionType] {
        &[
            ActionType::Comment,
            ActionType::Reader,
            ActionType::Account,
            ActionType::Taxonomy,
            ActionType::Upload,
        ]
    }

    async fn on_action(&self, action: &Action) -> anyhow::Result<()> {
        self.actions.lock().unwrap().push(action.clone());
        Ok(())
    }
}

pub struct Bench {
    pub ctx: AppContext,
    pub connectivity: Arc<ManualConnectivity>,
    pub tracker: Arc<RecordingTracker>,
    queue: DispatchQueue,
    recorder: Arc<RecordingStore>,
}

impl Bench {
    pub async fn new() -> Self {
        let db = Db::new("sqlite::memory:").await.unwrap();
        let (dispatcher, mut queue) = channel();
        let recorder = Arc::new(RecordingStore::default());
        queue.register(recorder.clone());
        let connectivity = Arc::new(ManualConnectivity::new(true));
        let tracker = Arc::new(RecordingTracker::default());
        let ctx = AppContext {
            db,
            dispatcher,
            bus: EventBus::default(),
            connectivity: connectivity.clone(),
            tracker: tracker.clone(),
        };
        Self {
            ctx,
            connectivity,
            tracker,
            queue,
            recorder,
        }
    }

    /// Actions dispatched since the last call.
    pub async fn dispatched(&mut self) -> Vec<Action> {
        self.queue.drain().await;
        std::mem::take(&mut *self.recorder.actions.lock().unwrap())
    }

    pub fn stats(&self) -> Vec<Stat> {
        self.tracker.stats.lock().unwrap().clone()
    }
}
