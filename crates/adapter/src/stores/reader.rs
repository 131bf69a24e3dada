use anyhow::{Context, Result};
use async_trait::async_trait;
use domain::{
    payloads::{FetchPostsPayload, FetchedPostsPayload, PagePurpose, PostsPageRequest},
    Action, ActionType, OnReaderPostsBackfilled, OnReaderPostsUpdated, OnReaderSitesSearched,
    ReaderAction, RequestDataAction, UpdateResult,
};
use storage::Db;
use tracing::{debug, info, warn};

use crate::{rest::ReaderRestClient, Dispatcher, EventBus, ReaderLimits, Store};

/// Keeps per-feed post caches, including the backfill chain for tag feeds.
pub struct ReaderStore {
    db: Db,
    bus: EventBus,
    dispatcher: Dispatcher,
    client: ReaderRestClient,
    limits: ReaderLimits,
}

impl ReaderStore {
    pub fn new(
        db: Db,
        bus: EventBus,
        dispatcher: Dispatcher,
        client: ReaderRestClient,
        limits: ReaderLimits,
    ) -> Self {
        Self {
            db,
            bus,
            dispatcher,
            client,
            limits,
        }
    }

    async fn fetch_posts(&self, payload: &FetchPostsPayload) -> Result<()> {
        let count = self.db.count_posts_in_feed(&payload.feed).await?;
        let request = match payload.action {
            RequestDataAction::LoadOlder => {
                if count >= self.limits.max_posts_per_feed {
                    debug!("{} is full ({} posts); not loading older", payload.feed, count);
                    self.bus.emit(OnReaderPostsUpdated {
                        feed: payload.feed.clone(),
                        action: payload.action,
                        result: UpdateResult::Unchanged,
                        num_new_posts: 0,
                        error: None,
                    });
                    return Ok(());
                }
                PostsPageRequest {
                    feed: payload.feed.clone(),
                    offset: count,
                    number: self.limits.page_size,
                    purpose: PagePurpose::Older,
                }
            }
            RequestDataAction::LoadNewer => PostsPageRequest {
                feed: payload.feed.clone(),
                offset: 0,
                number: self.limits.page_size,
                purpose: PagePurpose::Newer {
                    allow_backfill: payload.allow_backfill && payload.feed.is_tag(),
                },
            },
        };
        self.client.fetch_posts_page(request);
        Ok(())
    }

    async fn on_fetched_posts(&self, payload: &FetchedPostsPayload) -> Result<()> {
        let request = &payload.request;

        if let Some(error) = &payload.error {
            warn!("Fetching {} failed: {}", request.feed, error);
            match request.purpose {
                PagePurpose::Backfill { new_so_far } => self.finish_backfill(request, new_so_far),
                _ => self.bus.emit(OnReaderPostsUpdated {
                    feed: request.feed.clone(),
                    action: request.action(),
                    result: UpdateResult::Failed,
                    num_new_posts: 0,
                    error: Some(error.clone()),
                }),
            }
            return Ok(());
        }

        let count_before = self.db.count_posts_in_feed(&request.feed).await?;
        let mut num_new: u32 = 0;
        for post in &payload.posts {
            let mut post = post.clone();
            if self
                .db
                .upsert_reader_post(&mut post)
                .await
                .with_context(|| format!("storing post {} of {}", post.post_id, request.feed))?
            {
                num_new += 1;
            }
        }
        let trimmed = self
            .db
            .trim_feed(&request.feed, self.limits.max_posts_per_feed)
            .await?;
        if trimmed > 0 {
            debug!("Trimmed {} old posts from {}", trimmed, request.feed);
        }
        let count_after = self.db.count_posts_in_feed(&request.feed).await?;

        // 整页都是新文章才说明中间可能有缺口
        let page_all_new = !payload.posts.is_empty()
            && payload.page_len >= request.number
            && num_new as usize == payload.posts.len();
        let room_left = count_after < self.limits.max_posts_per_feed;

        match request.purpose {
            PagePurpose::Newer { allow_backfill } => {
                self.bus.emit(OnReaderPostsUpdated {
                    feed: request.feed.clone(),
                    action: RequestDataAction::LoadNewer,
                    result: if num_new > 0 { UpdateResult::Changed } else { UpdateResult::Unchanged },
                    num_new_posts: num_new,
                    error: None,
                });
                if allow_backfill && count_before > 0 && page_all_new && room_left {
                    info!("Backfilling {} after {} new posts", request.feed, num_new);
                    self.request_next_backfill_page(request, num_new);
                }
            }
            PagePurpose::Older => self.bus.emit(OnReaderPostsUpdated {
                feed: request.feed.clone(),
                action: RequestDataAction::LoadOlder,
                result: if num_new > 0 { UpdateResult::Changed } else { UpdateResult::Unchanged },
                num_new_posts: num_new,
                error: None,
            }),
            PagePurpose::Backfill { new_so_far } => {
                let total = new_so_far + num_new;
                if page_all_new && room_left {
                    self.request_next_backfill_page(request, total);
                } else {
                    self.finish_backfill(request, total);
                }
            }
        }
        Ok(())
    }

    fn request_next_backfill_page(&self, previous: &PostsPageRequest, new_so_far: u32) {
        self.dispatcher.dispatch(ReaderAction::FetchPostsPage(PostsPageRequest {
            feed: previous.feed.clone(),
            offset: previous.offset + previous.number,
            number: previous.number,
            purpose: PagePurpose::Backfill { new_so_far },
        }));
    }

    fn finish_backfill(&self, request: &PostsPageRequest, total: u32) {
        info!("Backfill of {} done with {} new posts", request.feed, total);
        if total > 0 {
            self.bus.emit(OnReaderPostsBackfilled {
                feed: request.feed.clone(),
                num_new_posts: total,
            });
        }
    }
}

#[async_trait]
impl Store for ReaderStore {
    fn name(&self) -> &'static str {
        "reader"
    }

    fn action_types(&self) -> &'static [ActionType] {
        &[ActionType::Reader]
    }

    async fn on_action(&self, action: &Action) -> Result<()> {
        let Action::Reader(action) = action else {
            return Ok(());
        };
        match action {
            ReaderAction::SearchSites(p) => self.client.search_sites(p.clone()),
            ReaderAction::SearchedSites(p) => {
                if let Some(error) = &p.error {
                    warn!("Site search for {:?} failed: {}", p.term, error);
                }
                self.bus.emit(OnReaderSitesSearched {
                    term: p.term.clone(),
                    offset: p.offset,
                    feeds: p.feeds.clone(),
                    can_load_more: p.can_load_more,
                    error: p.error.clone(),
                });
            }
            ReaderAction::FetchPosts(p) => self.fetch_posts(p).await?,
            ReaderAction::FetchPostsPage(request) => self.client.fetch_posts_page(request.clone()),
            ReaderAction::FetchedPosts(p) => self.on_fetched_posts(p).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel,
        test_support::{memory_db, step, MockResponse, MockWpCom},
        DispatchQueue,
    };
    use chrono::{Duration, NaiveDate};
    use domain::{FeedKey, ReaderError, ReaderErrorType, ReaderPost};
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;

    const PAGE: u32 = 3;

    struct Harness {
        mock: MockWpCom,
        db: Db,
        bus: EventBus,
        queue: DispatchQueue,
        dispatcher: Dispatcher,
    }

    async fn harness(max_posts_per_feed: u32) -> Harness {
        let mock = MockWpCom::start().await;
        let db = memory_db().await;
        let bus = EventBus::default();
        let (dispatcher, mut queue) = channel();
        let client = ReaderRestClient::new(mock.client(), dispatcher.clone());
        queue.register(Arc::new(ReaderStore::new(
            db.clone(),
            bus.clone(),
            dispatcher.clone(),
            client,
            ReaderLimits { page_size: PAGE, max_posts_per_feed },
        )));
        Harness { mock, db, bus, queue, dispatcher }
    }

    fn tag() -> FeedKey {
        FeedKey::Tag("rust".into())
    }

    fn post(post_id: i64) -> ReaderPost {
        let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        ReaderPost {
            id: 0,
            feed: tag(),
            blog_id: 1,
            post_id,
            title: String::new(),
            excerpt: String::new(),
            author_name: String::new(),
            url: String::new(),
            date_published: base + Duration::minutes(post_id),
        }
    }

    fn page(offset: u32, purpose: PagePurpose, ids: &[i64]) -> Action {
        ReaderAction::FetchedPosts(FetchedPostsPayload {
            request: PostsPageRequest { feed: tag(), offset, number: PAGE, purpose },
            posts: ids.iter().map(|id| post(*id)).collect(),
            page_len: ids.len() as u32,
            error: None,
        })
        .into()
    }

    async fn seed(db: &Db, ids: &[i64]) {
        for id in ids {
            db.upsert_reader_post(&mut post(*id)).await.unwrap();
        }
    }

    // 只取出排队的后续分页请求，不交给 store 处理
    fn next_backfill_request(queue: &mut DispatchQueue) -> Option<PostsPageRequest> {
        match queue.try_take()? {
            Action::Reader(ReaderAction::FetchPostsPage(r)) => Some(r),
            _ => None,
        }
    }

    #[tokio::test]
    async fn older_request_is_skipped_at_max() {
        let mut h = harness(3).await;
        seed(&h.db, &[1, 2, 3]).await;
        let mut events = h.bus.subscribe::<OnReaderPostsUpdated>();

        h.dispatcher.dispatch(ReaderAction::FetchPosts(FetchPostsPayload {
            feed: tag(),
            action: RequestDataAction::LoadOlder,
            allow_backfill: false,
        }));
        h.queue.drain().await;

        let event = events.try_recv().unwrap();
        assert_eq!(event.result, UpdateResult::Unchanged);
        assert_eq!(event.num_new_posts, 0);
        assert!(h.mock.requests().await.is_empty());
    }

    #[tokio::test]
    async fn older_request_starts_at_stored_count() {
        let mut h = harness(100).await;
        seed(&h.db, &[1, 2]).await;
        h.mock
            .enqueue(MockResponse::json(serde_json::json!({ "posts": [] })))
            .await;

        h.dispatcher.dispatch(ReaderAction::FetchPosts(FetchPostsPayload {
            feed: tag(),
            action: RequestDataAction::LoadOlder,
            allow_backfill: false,
        }));
        step(&mut h.queue).await;
        step(&mut h.queue).await;

        let req = &h.mock.requests().await[0];
        assert!(req.query.contains("offset=2"));
    }

    #[tokio::test]
    async fn all_new_full_page_starts_backfill() {
        let mut h = harness(100).await;
        seed(&h.db, &[1]).await;
        let mut updated = h.bus.subscribe::<OnReaderPostsUpdated>();

        h.dispatcher.dispatch(page(0, PagePurpose::Newer { allow_backfill: true }, &[10, 11, 12]));
        h.queue.drain_one().await;

        let event = updated.try_recv().unwrap();
        assert_eq!(event.result, UpdateResult::Changed);
        assert_eq!(event.num_new_posts, 3);
        let next = next_backfill_request(&mut h.queue).unwrap();
        assert_eq!(next.offset, PAGE);
        assert_eq!(next.purpose, PagePurpose::Backfill { new_so_far: 3 });
    }

    #[tokio::test]
    async fn full_page_with_dropped_post_still_backfills() {
        let mut h = harness(100).await;
        seed(&h.db, &[1]).await;
        // 服务端给了满页，其中一篇没有日期被丢弃
        h.dispatcher.dispatch(ReaderAction::FetchedPosts(FetchedPostsPayload {
            request: PostsPageRequest {
                feed: tag(),
                offset: 0,
                number: PAGE,
                purpose: PagePurpose::Newer { allow_backfill: true },
            },
            posts: vec![post(10), post(11)],
            page_len: PAGE,
            error: None,
        }));
        h.queue.drain_one().await;

        let next = next_backfill_request(&mut h.queue).unwrap();
        assert_eq!(next.offset, PAGE);
        assert_eq!(next.purpose, PagePurpose::Backfill { new_so_far: 2 });
    }

    #[tokio::test]
    async fn empty_feed_never_backfills() {
        let mut h = harness(100).await;
        h.dispatcher.dispatch(page(0, PagePurpose::Newer { allow_backfill: true }, &[10, 11, 12]));
        h.queue.drain_one().await;
        assert!(next_backfill_request(&mut h.queue).is_none());
    }

    #[tokio::test]
    async fn backfill_stops_on_known_post_and_reports_total() {
        let mut h = harness(100).await;
        seed(&h.db, &[5]).await;
        let mut backfilled = h.bus.subscribe::<OnReaderPostsBackfilled>();

        h.dispatcher.dispatch(page(3, PagePurpose::Backfill { new_so_far: 3 }, &[7, 6, 5]));
        h.queue.drain_one().await;

        assert!(next_backfill_request(&mut h.queue).is_none());
        let event = backfilled.try_recv().unwrap();
        assert_eq!(event.num_new_posts, 5);
    }

    #[tokio::test]
    async fn backfill_stops_at_max_posts() {
        let mut h = harness(4).await;
        seed(&h.db, &[1]).await;
        let mut backfilled = h.bus.subscribe::<OnReaderPostsBackfilled>();

        h.dispatcher.dispatch(page(3, PagePurpose::Backfill { new_so_far: 0 }, &[8, 9, 10]));
        h.queue.drain_one().await;

        assert!(next_backfill_request(&mut h.queue).is_none());
        assert_eq!(backfilled.try_recv().unwrap().num_new_posts, 3);
        assert_eq!(h.db.count_posts_in_feed(&tag()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn short_page_ends_backfill_silently_when_nothing_new() {
        let mut h = harness(100).await;
        seed(&h.db, &[1]).await;
        let mut backfilled = h.bus.subscribe::<OnReaderPostsBackfilled>();

        h.dispatcher.dispatch(page(3, PagePurpose::Backfill { new_so_far: 0 }, &[1]));
        h.queue.drain_one().await;

        assert!(next_backfill_request(&mut h.queue).is_none());
        assert!(matches!(backfilled.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn failed_page_reports_failure() {
        let mut h = harness(100).await;
        let mut updated = h.bus.subscribe::<OnReaderPostsUpdated>();
        h.dispatcher.dispatch(ReaderAction::FetchedPosts(FetchedPostsPayload {
            request: PostsPageRequest {
                feed: tag(),
                offset: 0,
                number: PAGE,
                purpose: PagePurpose::Newer { allow_backfill: false },
            },
            posts: Vec::new(),
            page_len: 0,
            error: Some(ReaderError {
                kind: ReaderErrorType::GenericError,
                message: "timeout".into(),
            }),
        }));
        h.queue.drain().await;

        let event = updated.try_recv().unwrap();
        assert_eq!(event.result, UpdateResult::Failed);
        assert!(event.error.is_some());
    }
}
