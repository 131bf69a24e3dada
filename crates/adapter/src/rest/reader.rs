use domain::{
    payloads::{
        FetchedPostsPayload, PostsPageRequest, ReaderSearchSitesResponsePayload,
        SearchSitesPayload,
    },
    protocol::{
        feed_site_from_response, reader_post_from_response, ReaderPostListResponse,
        ReaderSearchSitesResponse,
    },
    FeedKey, ReaderAction,
};
use tracing::debug;

use super::WpComRestClient;
use crate::Dispatcher;

pub const SEARCH_PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct ReaderRestClient {
    rest: WpComRestClient,
    dispatcher: Dispatcher,
}

impl ReaderRestClient {
    pub fn new(rest: WpComRestClient, dispatcher: Dispatcher) -> Self {
        Self { rest, dispatcher }
    }

    pub async fn search_sites_payload(
        &self,
        payload: &SearchSitesPayload,
    ) -> ReaderSearchSitesResponsePayload {
        let query = [
            ("q", payload.term.clone()),
            ("offset", payload.offset.to_string()),
            ("number", SEARCH_PAGE_SIZE.to_string()),
            ("exclude_followed", "true".to_string()),
            ("sort", "relevance".to_string()),
        ];
        match self
            .rest
            .get::<ReaderSearchSitesResponse>(&["v1.1", "read", "feed"], &query)
            .await
        {
            Ok(resp) => {
                let feeds: Vec<_> = resp.feeds.into_iter().map(feed_site_from_response).collect();
                ReaderSearchSitesResponsePayload {
                    can_load_more: feeds.len() == SEARCH_PAGE_SIZE as usize,
                    feeds,
                    term: payload.term.clone(),
                    offset: payload.offset,
                    error: None,
                }
            }
            Err(e) => ReaderSearchSitesResponsePayload {
                feeds: Vec::new(),
                term: payload.term.clone(),
                offset: payload.offset,
                can_load_more: false,
                error: Some(e.into()),
            },
        }
    }

    pub async fn fetch_posts_page_payload(&self, request: &PostsPageRequest) -> FetchedPostsPayload {
        let blog_id;
        let segments: [&str; 5] = match &request.feed {
            FeedKey::Tag(tag) => ["v1.2", "read", "tags", tag.as_str(), "posts"],
            FeedKey::Blog(id) => {
                blog_id = id.to_string();
                ["v1.2", "read", "sites", blog_id.as_str(), "posts"]
            }
        };
        let query = [
            ("number", request.number.to_string()),
            ("offset", request.offset.to_string()),
        ];
        debug!(
            "Requesting {} posts of {} at offset {}",
            request.number, request.feed, request.offset
        );

        match self.rest.get::<ReaderPostListResponse>(&segments, &query).await {
            Ok(resp) => FetchedPostsPayload {
                request: request.clone(),
                page_len: resp.posts.len() as u32,
                posts: resp
                    .posts
                    .into_iter()
                    .filter_map(|p| reader_post_from_response(p, &request.feed))
                    .collect(),
                error: None,
            },
            Err(e) => FetchedPostsPayload {
                request: request.clone(),
                posts: Vec::new(),
                page_len: 0,
                error: Some(e.into()),
            },
        }
    }

    pub fn search_sites(&self, payload: SearchSitesPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.search_sites_payload(&payload).await;
            this.dispatcher.dispatch(ReaderAction::SearchedSites(resp));
        });
    }

    pub fn fetch_posts_page(&self, request: PostsPageRequest) {
        let this = self.clone();
        tokio::spawn(async move {
            let resp = this.fetch_posts_page_payload(&request).await;
            this.dispatcher.dispatch(ReaderAction::FetchedPosts(resp));
        });
    }
}
