use anyhow::{Context, Result};
use async_trait::async_trait;
use domain::{
    payloads::RemoteCommentResponsePayload, Action, ActionType, CommentAction, CommentChangeCause,
    CommentStatus, OnCommentChanged,
};
use storage::Db;
use tracing::{info, warn};

use crate::{rest::CommentRestClient, EventBus, Store};

pub struct CommentStore {
    db: Db,
    bus: EventBus,
    client: CommentRestClient,
}

impl CommentStore {
    pub fn new(db: Db, bus: EventBus, client: CommentRestClient) -> Self {
        Self { db, bus, client }
    }

    fn emit_error(&self, cause: CommentChangeCause, payload: &RemoteCommentResponsePayload) {
        let changed_local_ids = payload
            .comment
            .as_ref()
            .map(|c| c.id)
            .filter(|id| *id > 0)
            .into_iter()
            .collect();
        warn!("Comment {:?} failed: {:?}", cause, payload.error);
        self.bus.emit(OnCommentChanged {
            cause,
            changed_local_ids,
            error: payload.error.clone(),
        });
    }

    /// Stores the server copy and reports its local id.
    async fn upsert_server_copy(
        &self,
        cause: CommentChangeCause,
        payload: &RemoteCommentResponsePayload,
    ) -> Result<()> {
        if payload.error.is_some() {
            self.emit_error(cause, payload);
            return Ok(());
        }
        let Some(mut comment) = payload.comment.clone() else {
            warn!("{:?} succeeded without a comment", cause);
            return Ok(());
        };
        self.db
            .upsert_comment(&mut comment)
            .await
            .with_context(|| format!("upserting comment {}", comment.remote_comment_id))?;
        self.bus.emit(OnCommentChanged {
            cause,
            changed_local_ids: vec![comment.id],
            error: None,
        });
        Ok(())
    }

    async fn on_deleted(&self, payload: &RemoteCommentResponsePayload) -> Result<()> {
        let cause = CommentChangeCause::DeleteComment;
        if payload.error.is_some() {
            self.emit_error(cause, payload);
            return Ok(());
        }
        let Some(comment) = payload.comment.as_ref() else {
            return Ok(());
        };
        // 第一次删除只会进回收站，服务端返回 trash 时保留记录
        if comment.status == CommentStatus::Trash {
            return self.upsert_server_copy(cause, payload).await;
        }
        let removed = self.db.remove_comment(comment.id).await?;
        info!("Comment {} deleted ({} row)", comment.id, removed);
        self.bus.emit(OnCommentChanged {
            cause,
            changed_local_ids: vec![comment.id],
            error: None,
        });
        Ok(())
    }

    async fn on_liked(&self, payload: &RemoteCommentResponsePayload) -> Result<()> {
        let cause = CommentChangeCause::LikeComment;
        if payload.error.is_some() {
            self.emit_error(cause, payload);
            return Ok(());
        }
        let Some(mut comment) = payload.comment.clone() else {
            return Ok(());
        };
        // 服务端会把被点赞的待审评论自动批准
        if comment.i_like && comment.status == CommentStatus::Unapproved {
            comment.status = CommentStatus::Approved;
        }
        let promoted = RemoteCommentResponsePayload::success(payload.site.clone(), comment);
        self.upsert_server_copy(cause, &promoted).await
    }
}

#[async_trait]
impl Store for CommentStore {
    fn name(&self) -> &'static str {
        "comments"
    }

    fn action_types(&self) -> &'static [ActionType] {
        &[ActionType::Comment]
    }

    async fn on_action(&self, action: &Action) -> Result<()> {
        let Action::Comment(action) = action else {
            return Ok(());
        };
        match action {
            CommentAction::FetchComment(p) => self.client.fetch_comment(p.clone()),
            CommentAction::PushComment(p) => self.client.push_comment(p.clone()),
            CommentAction::DeleteComment(p) => self.client.delete_comment(p.clone()),
            CommentAction::LikeComment(p) => self.client.like_comment(p.clone()),
            CommentAction::CreateNewComment(p) => self.client.create_new_comment(p.clone()),
            CommentAction::FetchedComment(p) => {
                self.upsert_server_copy(CommentChangeCause::FetchComment, p).await?
            }
            CommentAction::PushedComment(p) => {
                self.upsert_server_copy(CommentChangeCause::PushComment, p).await?
            }
            CommentAction::CreatedNewComment(p) => {
                self.upsert_server_copy(CommentChangeCause::CreateNewComment, p).await?
            }
            CommentAction::DeletedComment(p) => self.on_deleted(p).await?,
            CommentAction::LikedComment(p) => self.on_liked(p).await?,
        }
        Ok(())
    }
}
