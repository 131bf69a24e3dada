use anyhow::Result;
use domain::{
    moderation::{self, DeleteIntent},
    payloads::{
        FetchCommentPayload, RemoteCommentPayload, RemoteCreateCommentPayload,
        RemoteLikeCommentPayload,
    },
    CapabilitySet, Comment, CommentAction, CommentChangeCause, CommentStatus, OnCommentChanged,
    Site,
};
use tracing::{debug, info, warn};

use super::{unescape_html, Notice, UiEffect};
use crate::{analytics::Stat, AppContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSource {
    CommentList,
    Notification,
}

/// Like state captured before an optimistic toggle.
#[derive(Debug, Clone, Copy)]
struct LikeSnapshot {
    i_like: bool,
    like_count: i64,
    status: CommentStatus,
}

/// Detail screen for one comment: moderation, reply and like.
pub struct CommentDetailController {
    ctx: AppContext,
    source: CommentSource,
    capabilities: CapabilitySet,
    site: Option<Site>,
    comment: Option<Comment>,
    attached: bool,
    previous_status: Option<CommentStatus>,
    like_snapshot: Option<LikeSnapshot>,
    is_submitting_reply: bool,
    reply_text: String,
    // 通知入口下本地没有评论时，等待这条远端评论被拉取回来
    awaiting_remote_id: Option<i64>,
}

impl CommentDetailController {
    pub fn new(ctx: AppContext, source: CommentSource) -> Self {
        Self {
            ctx,
            source,
            capabilities: CapabilitySet::default(),
            site: None,
            comment: None,
            attached: true,
            previous_status: None,
            like_snapshot: None,
            is_submitting_reply: false,
            reply_text: String::new(),
            awaiting_remote_id: None,
        }
    }

    pub fn source(&self) -> CommentSource {
        self.source
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    pub fn site(&self) -> Option<&Site> {
        self.site.as_ref()
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn is_submitting_reply(&self) -> bool {
        self.is_submitting_reply
    }

    pub fn reply_text(&self) -> &str {
        &self.reply_text
    }

    pub fn set_reply_text(&mut self, text: impl Into<String>) {
        self.reply_text = text.into();
    }

    /// Screen went away; late events are ignored from now on.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn can_moderate(&self) -> bool {
        self.capabilities.can_moderate()
    }

    pub fn can_mark_as_spam(&self) -> bool {
        self.capabilities.can_mark_as_spam()
    }

    pub fn can_reply(&self) -> bool {
        self.capabilities.can_reply()
    }

    pub fn can_trash(&self) -> bool {
        self.capabilities.can_trash()
    }

    pub fn can_like(&self) -> bool {
        self.capabilities.can_like(self.site.as_ref())
    }

    pub fn can_edit(&self) -> bool {
        CapabilitySet::can_edit(self.site.as_ref())
    }

    /// Opens a comment picked from a site's comment list.
    pub async fn load_from_list(
        &mut self,
        local_site_id: i64,
        remote_comment_id: i64,
    ) -> Result<Vec<UiEffect>> {
        let Some(site) = self.ctx.db.get_site_by_local_id(local_site_id).await? else {
            warn!("Site {} is not cached", local_site_id);
            return Ok(vec![UiEffect::Toast(Notice::SiteNotFound), UiEffect::CloseScreen]);
        };
        let comment = self
            .ctx
            .db
            .get_comment_by_remote_id(site.id, remote_comment_id)
            .await?;
        self.site = Some(site);
        match comment {
            Some(comment) => {
                self.comment = Some(comment);
                Ok(vec![UiEffect::Render])
            }
            None => Ok(vec![UiEffect::Toast(Notice::CommentNotFound), UiEffect::CloseScreen]),
        }
    }

    /// Opens the comment a notification points at. Unknown sites get a
    /// placeholder; a comment missing locally is fetched first.
    pub async fn load_from_notification(
        &mut self,
        remote_site_id: i64,
        remote_comment_id: i64,
        capabilities: CapabilitySet,
    ) -> Result<Vec<UiEffect>> {
        self.capabilities = capabilities;
        let site = match self.ctx.db.get_site_by_remote_id(remote_site_id).await? {
            Some(site) => site,
            None => {
                info!("Site {} unknown, using a placeholder", remote_site_id);
                let mut placeholder = Site::placeholder(remote_site_id);
                self.ctx.db.upsert_site(&mut placeholder).await?;
                placeholder
            }
        };
        let comment = self
            .ctx
            .db
            .get_comment_by_remote_id(site.id, remote_comment_id)
            .await?;
        self.site = Some(site.clone());

        if let Some(comment) = comment {
            self.comment = Some(comment);
            return Ok(vec![UiEffect::Render]);
        }
        if !self.ctx.is_online() {
            return Ok(vec![UiEffect::Toast(Notice::NoConnection), UiEffect::CloseScreen]);
        }
        self.awaiting_remote_id = Some(remote_comment_id);
        self.ctx.dispatcher.dispatch(CommentAction::FetchComment(FetchCommentPayload {
            site,
            remote_comment_id,
        }));
        Ok(vec![UiEffect::ShowProgress(true)])
    }

    pub fn toggle_moderate(&mut self) -> Vec<UiEffect> {
        match self.comment.as_ref() {
            Some(c) => self.moderate(moderation::moderate_toggle_target(c.status)),
            None => Vec::new(),
        }
    }

    pub fn toggle_spam(&mut self) -> Vec<UiEffect> {
        match self.comment.as_ref() {
            Some(c) => self.moderate(moderation::spam_toggle_target(c.status)),
            None => Vec::new(),
        }
    }

    /// Spam and trash need a confirmation before the permanent delete.
    pub fn request_delete(&mut self) -> Vec<UiEffect> {
        let Some(comment) = self.comment.as_ref() else {
            return Vec::new();
        };
        if !self.can_trash() {
            return Vec::new();
        }
        match moderation::delete_intent(comment.status) {
            DeleteIntent::ConfirmPermanent => vec![UiEffect::ConfirmDelete],
            DeleteIntent::MoveToTrash => self.moderate(CommentStatus::Trash),
        }
    }

    pub fn confirm_delete(&mut self) -> Vec<UiEffect> {
        self.moderate(CommentStatus::Deleted)
    }

    /// Moves the comment to `new_status`: optimistic locally, confirmed by the
    /// `PushComment` / `DeleteComment` change event.
    pub fn moderate(&mut self, new_status: CommentStatus) -> Vec<UiEffect> {
        if !self.attached {
            return Vec::new();
        }
        let (Some(site), Some(comment)) = (self.site.clone(), self.comment.as_mut()) else {
            return Vec::new();
        };
        let allowed = match new_status.persisted() {
            CommentStatus::Spam => self.capabilities.can_mark_as_spam(),
            CommentStatus::Trash | CommentStatus::Deleted => self.capabilities.can_trash(),
            _ => self.capabilities.can_moderate(),
        };
        if !allowed {
            debug!("{:?} not enabled for this comment", new_status);
            return Vec::new();
        }
        if !moderation::can_transition(comment.status, new_status) {
            warn!("Ignoring {:?} -> {:?}", comment.status, new_status);
            return Vec::new();
        }
        if !self.ctx.is_online() {
            return vec![UiEffect::Toast(Notice::NoConnection)];
        }

        let previous = comment.status;
        self.previous_status = Some(previous);
        self.ctx
            .tracker
            .track(Stat::for_moderation(moderation::tracked_status(previous, new_status)));

        if new_status == CommentStatus::Deleted {
            self.ctx.dispatcher.dispatch(CommentAction::DeleteComment(RemoteCommentPayload {
                site,
                comment: comment.clone(),
            }));
        } else {
            comment.status = new_status.persisted();
            self.ctx.dispatcher.dispatch(CommentAction::PushComment(RemoteCommentPayload {
                site,
                comment: comment.clone(),
            }));
        }
        vec![UiEffect::Render]
    }

    pub fn toggle_like(&mut self) -> Vec<UiEffect> {
        // 上一次点赞未返回前忽略连点
        if !self.attached || !self.can_like() || self.like_snapshot.is_some() {
            return Vec::new();
        }
        let (Some(site), Some(comment)) = (self.site.clone(), self.comment.as_mut()) else {
            return Vec::new();
        };
        if !self.ctx.is_online() {
            return vec![UiEffect::Toast(Notice::NoConnection)];
        }

        self.like_snapshot = Some(LikeSnapshot {
            i_like: comment.i_like,
            like_count: comment.like_count,
            status: comment.status,
        });
        let like = !comment.i_like;
        comment.i_like = like;
        comment.like_count = if like {
            comment.like_count + 1
        } else {
            (comment.like_count - 1).max(0)
        };
        // 服务端点赞待审评论时会自动批准，这里先行一步
        if like && comment.status == CommentStatus::Unapproved {
            comment.status = CommentStatus::Approved;
        }

        self.ctx
            .tracker
            .track(if like { Stat::CommentLiked } else { Stat::CommentUnliked });
        self.ctx.dispatcher.dispatch(CommentAction::LikeComment(RemoteLikeCommentPayload {
            site,
            comment: comment.clone(),
            like,
        }));
        vec![UiEffect::Render]
    }

    /// Single-flight: a second submit while one is pending does nothing.
    pub fn submit_reply(&mut self) -> Vec<UiEffect> {
        if !self.attached || self.is_submitting_reply || !self.can_reply() {
            return Vec::new();
        }
        let (Some(site), Some(parent)) = (self.site.clone(), self.comment.clone()) else {
            return Vec::new();
        };
        if !self.ctx.is_online() {
            return vec![UiEffect::Toast(Notice::NoConnection)];
        }
        let text = self.reply_text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        self.is_submitting_reply = true;
        self.ctx.tracker.track(Stat::CommentReplied);
        self.ctx.dispatcher.dispatch(CommentAction::CreateNewComment(RemoteCreateCommentPayload {
            site,
            parent,
            reply: Comment::reply_draft(text),
        }));
        vec![UiEffect::SetReplyEnabled(false), UiEffect::ShowProgress(true)]
    }

    pub async fn on_comment_changed(&mut self, event: &OnCommentChanged) -> Result<Vec<UiEffect>> {
        if !self.attached {
            debug!("Detached detail screen ignoring {:?}", event.cause);
            return Ok(Vec::new());
        }
        let mut effects = vec![UiEffect::ShowProgress(false), UiEffect::RefreshCommentList];
        match event.cause {
            CommentChangeCause::PushComment | CommentChangeCause::DeleteComment => {
                if self.concerns_current(event) {
                    self.on_moderated(event, &mut effects).await?;
                }
            }
            CommentChangeCause::CreateNewComment => self.on_reply_created(event, &mut effects).await?,
            CommentChangeCause::LikeComment => {
                if self.concerns_current(event) {
                    self.on_liked(event, &mut effects).await?;
                }
            }
            CommentChangeCause::FetchComment => self.on_fetched(event, &mut effects).await?,
        }
        Ok(effects)
    }

    fn concerns_current(&self, event: &OnCommentChanged) -> bool {
        match &self.comment {
            Some(c) => event.changed_local_ids.is_empty() || event.changed_local_ids.contains(&c.id),
            None => false,
        }
    }

    async fn on_moderated(&mut self, event: &OnCommentChanged, effects: &mut Vec<UiEffect>) -> Result<()> {
        let previous = self.previous_status.take();
        if event.is_error() {
            if let (Some(comment), Some(previous)) = (self.comment.as_mut(), previous) {
                comment.status = previous;
            }
            effects.push(UiEffect::Toast(Notice::ModerationFailed));
            effects.push(UiEffect::Render);
            return Ok(());
        }
        if !self.reload().await? {
            // 永久删除后本地已无此评论
            effects.push(UiEffect::CloseScreen);
            return Ok(());
        }
        effects.push(UiEffect::Render);
        Ok(())
    }

    async fn on_reply_created(&mut self, event: &OnCommentChanged, effects: &mut Vec<UiEffect>) -> Result<()> {
        // 别的页面发出的回复，不动这里的草稿
        if !self.is_submitting_reply {
            debug!("Ignoring a reply this screen did not send");
            return Ok(());
        }
        self.is_submitting_reply = false;
        effects.push(UiEffect::SetReplyEnabled(true));

        if let Some(error) = &event.error {
            effects.push(UiEffect::Toast(Notice::ReplyFailed(unescape_html(&error.message))));
            effects.push(UiEffect::RefocusReply);
            return Ok(());
        }

        self.reload().await?;
        self.reply_text.clear();
        effects.push(UiEffect::Toast(Notice::ReplySucceeded));
        effects.push(UiEffect::ClearReply);
        effects.push(UiEffect::Render);

        // 回复即表示认可，顺手批准原评论
        if self
            .comment
            .as_ref()
            .is_some_and(|c| c.status != CommentStatus::Approved)
        {
            effects.extend(self.moderate(CommentStatus::Approved));
        }
        Ok(())
    }

    async fn on_liked(&mut self, event: &OnCommentChanged, effects: &mut Vec<UiEffect>) -> Result<()> {
        let snapshot = self.like_snapshot.take();
        if event.is_error() {
            if let (Some(comment), Some(s)) = (self.comment.as_mut(), snapshot) {
                comment.i_like = s.i_like;
                comment.like_count = s.like_count;
                comment.status = s.status;
            }
        } else {
            self.reload().await?;
        }
        effects.push(UiEffect::Render);
        Ok(())
    }

    async fn on_fetched(&mut self, event: &OnCommentChanged, effects: &mut Vec<UiEffect>) -> Result<()> {
        let Some(remote_id) = self.awaiting_remote_id else {
            return Ok(());
        };
        if let Some(error) = &event.error {
            self.awaiting_remote_id = None;
            warn!("Fetching comment {} failed: {}", remote_id, error);
            effects.push(UiEffect::Toast(Notice::CommentNotFound));
            effects.push(UiEffect::CloseScreen);
            return Ok(());
        }
        let Some(site_id) = self.site.as_ref().map(|s| s.id) else {
            return Ok(());
        };
        if let Some(comment) = self.ctx.db.get_comment_by_remote_id(site_id, remote_id).await? {
            self.awaiting_remote_id = None;
            self.comment = Some(comment);
            effects.push(UiEffect::Render);
        }
        Ok(())
    }

    /// Replaces the in-memory comment with the cached row. `false` if it is gone.
    async fn reload(&mut self) -> Result<bool> {
        let Some(id) = self.comment.as_ref().map(|c| c.id) else {
            return Ok(false);
        };
        match self.ctx.db.get_comment_by_local_id(id).await? {
            Some(fresh) => {
                self.comment = Some(fresh);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
