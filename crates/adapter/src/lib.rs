mod bus;
mod dispatcher;
pub mod rest;
pub mod stores;
mod traits;

#[cfg(test)]
mod test_support;

pub use bus::{BusEvent, EventBus};
pub use dispatcher::{channel, DispatchQueue, Dispatcher};
pub use traits::Store;

use std::sync::Arc;

use rest::{AuthRestClient, CommentRestClient, ReaderRestClient, TaxonomyRestClient, WpComRestClient};
use storage::Db;
use stores::{AccountStore, CommentStore, ReaderStore, TaxonomyStore, UploadStore};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReaderLimits {
    pub page_size: u32,
    pub max_posts_per_feed: u32,
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_posts_per_feed: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Builds every store on top of one REST client and registers them on `queue`.
pub fn register_stores(
    queue: &mut DispatchQueue,
    db: &Db,
    bus: &EventBus,
    rest: &WpComRestClient,
    credentials: AuthClientCredentials,
    limits: ReaderLimits,
) {
    let dispatcher = queue.dispatcher();

    queue.register(Arc::new(CommentStore::new(
        db.clone(),
        bus.clone(),
        CommentRestClient::new(rest.clone(), dispatcher.clone()),
    )));
    queue.register(Arc::new(ReaderStore::new(
        db.clone(),
        bus.clone(),
        dispatcher.clone(),
        ReaderRestClient::new(rest.clone(), dispatcher.clone()),
        limits,
    )));
    queue.register(Arc::new(AccountStore::new(
        bus.clone(),
        AuthRestClient::new(rest.clone(), dispatcher.clone(), credentials),
    )));
    queue.register(Arc::new(TaxonomyStore::new(
        db.clone(),
        bus.clone(),
        TaxonomyRestClient::new(rest.clone(), dispatcher),
    )));
    queue.register(Arc::new(UploadStore::new(db.clone(), bus.clone())));
}

pub async fn start_with_cancel_token(
    queue: DispatchQueue,
    cancel_token: CancellationToken,
) -> anyhow::Result<()> {
    info!("Dispatch loop starting with {} stores", queue.store_count());
    queue.run(cancel_token).await
}
