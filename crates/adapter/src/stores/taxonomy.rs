use anyhow::Result;
use async_trait::async_trait;
use domain::{
    Action, ActionType, OnTaxonomyChanged, TaxonomyAction, TaxonomyError, TaxonomyErrorType,
};
use storage::Db;
use tracing::{error, warn};

use crate::{rest::TaxonomyRestClient, EventBus, Store};

pub struct TaxonomyStore {
    db: Db,
    bus: EventBus,
    client: TaxonomyRestClient,
}

impl TaxonomyStore {
    pub fn new(db: Db, bus: EventBus, client: TaxonomyRestClient) -> Self {
        Self { db, bus, client }
    }
}

#[async_trait]
impl Store for TaxonomyStore {
    fn name(&self) -> &'static str {
        "taxonomy"
    }

    fn action_types(&self) -> &'static [ActionType] {
        &[ActionType::Taxonomy]
    }

    async fn on_action(&self, action: &Action) -> Result<()> {
        let Action::Taxonomy(action) = action else {
            return Ok(());
        };
        match action {
            TaxonomyAction::FetchTaxonomies(p) => self.client.fetch_taxonomies(p.clone()),
            TaxonomyAction::FetchedTaxonomies(p) => {
                let mut rows_affected = 0;
                let mut failure = p.error.clone();
                if let Some(error) = &p.error {
                    warn!("Taxonomies of site {} failed: {}", p.site.id, error);
                } else {
                    for taxonomy in &p.taxonomies {
                        let mut taxonomy = taxonomy.clone();
                        match self.db.upsert_taxonomy(&mut taxonomy).await {
                            Ok(n) => rows_affected += n,
                            Err(e) => {
                                error!(
                                    "Storing taxonomy {} of site {} failed: {:?}",
                                    taxonomy.name, p.site.id, e
                                );
                                failure = Some(TaxonomyError {
                                    kind: TaxonomyErrorType::GenericError,
                                    message: e.to_string(),
                                });
                                break;
                            }
                        }
                    }
                }
                // 已写入的行数照常上报
                self.bus.emit(OnTaxonomyChanged {
                    local_site_id: p.site.id,
                    rows_affected,
                    error: failure,
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
        test_support::{memory_db, MockWpCom},
    };
    use domain::{payloads::FetchedTaxonomiesPayload, Site, Taxonomy};
    use std::sync::Arc;

    fn taxonomy(name: &str, label: &str) -> Taxonomy {
        Taxonomy {
            id: 0,
            local_site_id: 2,
            name: name.into(),
            label: Some(label.into()),
            description: None,
            is_hierarchical: false,
            is_public: true,
        }
    }

    #[tokio::test]
    async fn refetch_updates_by_name() {
        let mock = MockWpCom::start().await;
        let db = memory_db().await;
        let bus = EventBus::default();
        let (dispatcher, mut queue) = channel();
        let client = TaxonomyRestClient::new(mock.client(), dispatcher.clone());
        queue.register(Arc::new(TaxonomyStore::new(db.clone(), bus.clone(), client)));
        let mut events = bus.subscribe::<OnTaxonomyChanged>();
        let mut site = Site::placeholder(9);
        site.id = 2;

        for label in ["Tags", "Keywords"] {
            dispatcher.dispatch(TaxonomyAction::FetchedTaxonomies(FetchedTaxonomiesPayload {
                site: site.clone(),
                taxonomies: vec![taxonomy("post_tag", label)],
                error: None,
            }));
        }
        queue.drain().await;

        assert_eq!(events.recv().await.unwrap().rows_affected, 1);
        assert_eq!(events.recv().await.unwrap().rows_affected, 1);
        let stored = db.get_taxonomies_for_site(2).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].label.as_deref(), Some("Keywords"));
    }

    #[tokio::test]
    async fn storage_failure_still_reports_change() {
        let mock = MockWpCom::start().await;
        let db = memory_db().await;
        let bus = EventBus::default();
        let (dispatcher, mut queue) = channel();
        let client = TaxonomyRestClient::new(mock.client(), dispatcher.clone());
        queue.register(Arc::new(TaxonomyStore::new(db.clone(), bus.clone(), client)));
        let mut events = bus.subscribe::<OnTaxonomyChanged>();
        let mut site = Site::placeholder(9);
        site.id = 2;
        db.close().await;

        dispatcher.dispatch(TaxonomyAction::FetchedTaxonomies(FetchedTaxonomiesPayload {
            site,
            taxonomies: vec![taxonomy("post_tag", "Tags"), taxonomy("category", "Categories")],
            error: None,
        }));
        queue.drain().await;

        let event = events.recv().await.unwrap();
        assert_eq!(event.local_site_id, 2);
        assert_eq!(event.rows_affected, 0);
        let error = event.error.unwrap();
        assert_eq!(error.kind, TaxonomyErrorType::GenericError);
        assert!(!error.message.is_empty());
    }
}
