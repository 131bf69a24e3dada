use anyhow::Result;
use async_trait::async_trait;
use domain::{Action, ActionType, OnUploadChanged, UploadAction, UploadKind};
use storage::Db;
use tracing::debug;

use crate::{EventBus, Store};

/// Local bookkeeping for media and post uploads; no network side.
pub struct UploadStore {
    db: Db,
    bus: EventBus,
}

impl UploadStore {
    pub fn new(db: Db, bus: EventBus) -> Self {
        Self { db, bus }
    }
}

#[async_trait]
impl Store for UploadStore {
    fn name(&self) -> &'static str {
        "uploads"
    }

    fn action_types(&self) -> &'static [ActionType] {
        &[ActionType::Upload]
    }

    async fn on_action(&self, action: &Action) -> Result<()> {
        let Action::Upload(action) = action else {
            return Ok(());
        };
        let (kind, local_id) = match action {
            UploadAction::UpdateMediaUpload(media) => {
                let mut media = media.clone();
                self.db.insert_or_update_media(Some(&mut media)).await?;
                (UploadKind::Media, media.id)
            }
            UploadAction::UpdatePostUpload(post) => {
                let mut post = post.clone();
                self.db.insert_or_update_post(Some(&mut post)).await?;
                (UploadKind::Post, post.id)
            }
        };
        debug!("{:?} upload {} updated", kind, local_id);
        self.bus.emit(OnUploadChanged { kind, local_id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channel, test_support::memory_db};
    use domain::{MediaUpload, MediaUploadState};
    use std::sync::Arc;

    #[tokio::test]
    async fn media_progress_updates_single_row() {
        let db = memory_db().await;
        let bus = EventBus::default();
        let (dispatcher, mut queue) = channel();
        queue.register(Arc::new(UploadStore::new(db.clone(), bus.clone())));
        let mut events = bus.subscribe::<OnUploadChanged>();

        let mut media = MediaUpload::new(5, 8);
        dispatcher.dispatch(UploadAction::UpdateMediaUpload(media.clone()));
        media.progress = 0.5;
        media.upload_state = MediaUploadState::Failed;
        media.error_message = Some("too large".into());
        dispatcher.dispatch(UploadAction::UpdateMediaUpload(media));
        queue.drain().await;

        let first = events.recv().await.unwrap();
        assert_eq!(first, OnUploadChanged { kind: UploadKind::Media, local_id: 5 });
        let stored = db.get_media_uploads_for_post(8).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].upload_state, MediaUploadState::Failed);
        assert_eq!(stored[0].error_message.as_deref(), Some("too large"));
    }
}
