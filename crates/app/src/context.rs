use std::sync::Arc;

use adapter::{Dispatcher, EventBus};
use storage::Db;

use crate::{analytics::Tracker, connectivity::Connectivity};

/// Everything a controller needs, handed in at construction.
#[derive(Clone)]
pub struct AppContext {
    pub db: Db,
    pub dispatcher: Dispatcher,
    pub bus: EventBus,
    pub connectivity: Arc<dyn Connectivity>,
    pub tracker: Arc<dyn Tracker>,
}

impl AppContext {
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }
}
