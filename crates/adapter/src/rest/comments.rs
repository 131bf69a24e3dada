use domain::{
    payloads::{
        FetchCommentPayload, RemoteCommentPayload, RemoteCommentResponsePayload,
        RemoteCreateCommentPayload, RemoteLikeCommentPayload,
    },
    protocol::{
        build_push_comment_body, comment_from_response, CommentLikeWpComRestResponse,
        CommentWpComRestResponse,
    },
    Comment, CommentAction, CommentError,
};
use serde_json::json;
use tracing::warn;

use super::WpComRestClient;
use crate::Dispatcher;

#[derive(Clone)]
pub struct CommentRestClient {
    rest: WpComRestClient,
    dispatcher: Dispatcher,
}

impl CommentRestClient {
    pub fn new(rest: WpComRestClient, dispatcher: Dispatcher) -> Self {
        Self { rest, dispatcher }
    }

    pub async fn fetch_comment_payload(
        &self,
        payload: &FetchCommentPayload,
    ) -> RemoteCommentResponsePayload {
        let site_id = payload.site.site_id.to_string();
        let comment_id = payload.remote_comment_id.to_string();
        let result = self
            .rest
            .get::<CommentWpComRestResponse>(&["v1.1", "sites", &site_id, "comments", &comment_id], &[])
            .await;
        match result {
            Ok(resp) => {
                let comment = comment_from_response(resp, &payload.site);
                RemoteCommentResponsePayload::success(payload.site.clone(), comment)
            }
            Err(e) => RemoteCommentResponsePayload::failure(payload.site.clone(), None, e.into()),
        }
    }

    /// Sends content and status; the server copy comes back under the local id.
    pub async fn push_comment_payload(
        &self,
        payload: &RemoteCommentPayload,
    ) -> RemoteCommentResponsePayload {
        let site_id = payload.site.site_id.to_string();
        let comment_id = payload.comment.remote_comment_id.to_string();
        let body = build_push_comment_body(&payload.comment);
        let result = self
            .rest
            .post::<CommentWpComRestResponse, _>(
                &["v1.1", "sites", &site_id, "comments", &comment_id],
                &body,
            )
            .await;
        self.server_copy(payload, result)
    }

    pub async fn delete_comment_payload(
        &self,
        payload: &RemoteCommentPayload,
    ) -> RemoteCommentResponsePayload {
        let site_id = payload.site.site_id.to_string();
        let comment_id = payload.comment.remote_comment_id.to_string();
        let result = self
            .rest
            .post::<CommentWpComRestResponse, _>(
                &["v1.1", "sites", &site_id, "comments", &comment_id, "delete"],
                &json!({}),
            )
            .await;
        self.server_copy(payload, result)
    }

    pub async fn like_comment_payload(
        &self,
        payload: &RemoteLikeCommentPayload,
    ) -> RemoteCommentResponsePayload {
        let site_id = payload.site.site_id.to_string();
        let comment_id = payload.comment.remote_comment_id.to_string();
        let mut segments = vec!["v1.1", "sites", site_id.as_str(), "comments", comment_id.as_str(), "likes"];
        if payload.like {
            segments.push("new");
        } else {
            segments.extend(["mine", "delete"]);
        }

        match self
            .rest
            .post::<CommentLikeWpComRestResponse, _>(&segments, &json!({}))
            .await
        {
            Ok(resp) => {
                if !resp.success {
                    warn!("Like toggle for comment {} reported no success", comment_id);
                }
                let mut comment = payload.comment.clone();
                comment.i_like = resp.i_like;
                comment.like_count = resp.like_count;
                RemoteCommentResponsePayload::success(payload.site.clone(), comment)
            }
            Err(e) => RemoteCommentResponsePayload::failure(
                payload.site.clone(),
                Some(payload.comment.clone()),
                e.into(),
            ),
        }
    }

    /// Posts `reply` under `parent`; the created comment keeps the draft's local id.
    pub async fn create_new_comment_payload(
        &self,
        payload: &RemoteCreateCommentPayload,
    ) -> RemoteCommentResponsePayload {
        let site_id = payload.site.site_id.to_string();
        let parent_id = payload.parent.remote_comment_id.to_string();
        let result = self
            .rest
            .post::<CommentWpComRestResponse, _>(
                &["v1.1", "sites", &site_id, "comments", &parent_id, "replies", "new"],
                &json!({ "content": payload.reply.content }),
            )
            .await;
        match result {
            Ok(resp) => {
                let mut created = comment_from_response(resp, &payload.site);
                created.id = payload.reply.id;
                RemoteCommentResponsePayload::success(payload.site.clone(), created)
            }
            Err(e) => RemoteCommentResponsePayload::failure(
                payload.site.clone(),
                Some(payload.reply.clone()),
                e.into(),
            ),
        }
    }

    pub fn fetch_comment(&self, payload: FetchCommentPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.fetch_comment_payload(&payload).await;
            this.dispatcher.dispatch(CommentAction::FetchedComment(resp));
        });
    }

    pub fn push_comment(&self, payload: RemoteCommentPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.push_comment_payload(&payload).await;
            this.dispatcher.dispatch(CommentAction::PushedComment(resp));
        });
    }

    pub fn delete_comment(&self, payload: RemoteCommentPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.delete_comment_payload(&payload).await;
            this.dispatcher.dispatch(CommentAction::DeletedComment(resp));
        });
    }

    pub fn like_comment(&self, payload: RemoteLikeCommentPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.like_comment_payload(&payload).await;
            this.dispatcher.dispatch(CommentAction::LikedComment(resp));
        });
    }

    pub fn create_new_comment(&self, payload: RemoteCreateCommentPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.create_new_comment_payload(&payload).await;
            this.dispatcher.dispatch(CommentAction::CreatedNewComment(resp));
        });
    }

    fn server_copy(
        &self,
        payload: &RemoteCommentPayload,
        result: Result<CommentWpComRestResponse, domain::BaseNetworkError>,
    ) -> RemoteCommentResponsePayload {
        match result {
            Ok(resp) => {
                let mut comment: Comment = comment_from_response(resp, &payload.site);
                comment.id = payload.comment.id;
                RemoteCommentResponsePayload::success(payload.site.clone(), comment)
            }
            Err(e) => {
                let error: CommentError = e.into();
                RemoteCommentResponsePayload::failure(
                    payload.site.clone(),
                    Some(payload.comment.clone()),
                    error,
                )
            }
        }
    }
}
