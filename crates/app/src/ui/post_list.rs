use anyhow::Result;
use domain::{
    payloads::FetchPostsPayload, FeedKey, OnReaderPostsBackfilled, OnReaderPostsUpdated,
    PostListType, ReaderAction, ReaderPost, RequestDataAction, UpdateResult,
};
use std::collections::HashSet;
use tracing::{debug, info};

use super::{Notice, UiEffect};
use crate::{analytics::Stat, AppContext};

/// Post list for a tag or a blog.
pub struct PostListController {
    ctx: AppContext,
    list_type: PostListType,
    current_feed: Option<FeedKey>,
    max_posts: u32,
    posts: Vec<ReaderPost>,
    // 每个 feed 最多一个请求在途
    updating: HashSet<FeedKey>,
    new_posts_bar_visible: bool,
    attached: bool,
}

impl PostListController {
    pub fn new(ctx: AppContext, list_type: PostListType, max_posts: u32) -> Self {
        Self {
            ctx,
            list_type,
            current_feed: None,
            max_posts,
            posts: Vec::new(),
            updating: HashSet::new(),
            new_posts_bar_visible: false,
            attached: true,
        }
    }

    pub fn posts(&self) -> &[ReaderPost] {
        &self.posts
    }

    pub fn current_feed(&self) -> Option<&FeedKey> {
        self.current_feed.as_ref()
    }

    /// Whether the current feed has a fetch outstanding.
    pub fn is_updating(&self) -> bool {
        self.current_feed
            .as_ref()
            .is_some_and(|feed| self.updating.contains(feed))
    }

    pub fn is_new_posts_bar_visible(&self) -> bool {
        self.new_posts_bar_visible
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub async fn set_current_tag(&mut self, tag: &str) -> Result<Vec<UiEffect>> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(Vec::new());
        }
        self.switch_feed(FeedKey::Tag(tag.to_string())).await
    }

    pub async fn set_current_blog(&mut self, blog_id: i64) -> Result<Vec<UiEffect>> {
        self.switch_feed(FeedKey::Blog(blog_id)).await
    }

    async fn switch_feed(&mut self, feed: FeedKey) -> Result<Vec<UiEffect>> {
        if self.current_feed.as_ref() == Some(&feed) {
            return Ok(Vec::new());
        }
        info!("Post list switching to {}", feed);
        self.current_feed = Some(feed);
        self.new_posts_bar_visible = false;
        self.reload().await?;

        let mut effects = vec![UiEffect::HideNewPostsBar, UiEffect::RefreshPosts];
        effects.extend(self.update_posts(RequestDataAction::LoadNewer));
        Ok(effects)
    }

    /// At most one fetch per feed is outstanding; extra requests are dropped.
    pub fn update_posts(&mut self, action: RequestDataAction) -> Vec<UiEffect> {
        let Some(feed) = self.current_feed.clone() else {
            return Vec::new();
        };
        if self.updating.contains(&feed) {
            debug!("{} already updating, ignoring {:?}", feed, action);
            return Vec::new();
        }
        if !self.ctx.is_online() {
            info!("Network unavailable, not updating {}", feed);
            return Vec::new();
        }

        self.updating.insert(feed.clone());
        self.ctx.dispatcher.dispatch(ReaderAction::FetchPosts(FetchPostsPayload {
            feed,
            action,
            allow_backfill: action == RequestDataAction::LoadNewer,
        }));
        vec![progress_effect(action, true)]
    }

    /// Infinite scroll reached the bottom.
    pub async fn request_older(&mut self) -> Result<Vec<UiEffect>> {
        let Some(feed) = self.current_feed.as_ref() else {
            return Ok(Vec::new());
        };
        if self.updating.contains(feed) {
            return Ok(Vec::new());
        }
        if self.ctx.db.count_posts_in_feed(feed).await? >= self.max_posts {
            debug!("{} reached {} posts, not loading older", feed, self.max_posts);
            return Ok(Vec::new());
        }
        let effects = self.update_posts(RequestDataAction::LoadOlder);
        if !effects.is_empty() {
            self.ctx.tracker.track(Stat::ReaderInfiniteScroll);
        }
        Ok(effects)
    }

    pub async fn on_posts_updated(&mut self, event: &OnReaderPostsUpdated) -> Result<Vec<UiEffect>> {
        if !self.attached {
            return Ok(Vec::new());
        }
        self.updating.remove(&event.feed);
        if self.current_feed.as_ref() != Some(&event.feed) {
            // 当前 feed 的进度条不受影响
            info!("New posts in inactive feed {}", event.feed);
            return Ok(Vec::new());
        }
        let mut effects = vec![progress_effect(event.action, false)];

        match event.result {
            UpdateResult::Failed => {
                let message = event
                    .error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                effects.push(UiEffect::Toast(Notice::Error(message)));
            }
            UpdateResult::Changed if event.num_new_posts > 0 => {
                // 已有文章时不打断阅读，只提示有新文章
                if !self.posts.is_empty()
                    && self.list_type == PostListType::TagFollowed
                    && event.action == RequestDataAction::LoadNewer
                {
                    self.new_posts_bar_visible = true;
                    effects.push(UiEffect::ShowNewPostsBar);
                } else {
                    self.reload().await?;
                    effects.push(UiEffect::RefreshPosts);
                }
            }
            _ => {}
        }
        Ok(effects)
    }

    pub fn on_posts_backfilled(&mut self, event: &OnReaderPostsBackfilled) -> Vec<UiEffect> {
        if !self.attached {
            return Vec::new();
        }
        if self.current_feed.as_ref() != Some(&event.feed) {
            info!("Backfilled inactive feed {}", event.feed);
            return Vec::new();
        }
        // 列表非空时留到下次刷新再显示
        if self.posts.is_empty() {
            self.new_posts_bar_visible = true;
            return vec![UiEffect::ShowNewPostsBar];
        }
        Vec::new()
    }

    pub async fn new_posts_bar_tapped(&mut self) -> Result<Vec<UiEffect>> {
        self.new_posts_bar_visible = false;
        self.reload().await?;
        Ok(vec![
            UiEffect::HideNewPostsBar,
            UiEffect::RefreshPosts,
            UiEffect::ScrollToTop,
        ])
    }

    async fn reload(&mut self) -> Result<()> {
        self.posts = match &self.current_feed {
            Some(feed) => self.ctx.db.get_posts_in_feed(feed, self.max_posts).await?,
            None => Vec::new(),
        };
        Ok(())
    }
}

fn progress_effect(action: RequestDataAction, on: bool) -> UiEffect {
    match action {
        RequestDataAction::LoadNewer => UiEffect::ShowRefreshing(on),
        RequestDataAction::LoadOlder => UiEffect::ShowLoadingOlder(on),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Bench;
    use chrono::NaiveDate;
    use domain::{Action, ReaderError, ReaderErrorType};

    async fn store_post(bench: &Bench, feed: &FeedKey, post_id: i64) {
        let mut post = ReaderPost {
            id: 0,
            feed: feed.clone(),
            blog_id: 1,
            post_id,
            title: format!("post {post_id}"),
            excerpt: String::new(),
            author_name: "ana".into(),
            url: format!("https://example.com/{post_id}"),
            date_published: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, post_id as u32)
                .unwrap(),
        };
        bench.ctx.db.upsert_reader_post(&mut post).await.unwrap();
    }

    fn updated(feed: &FeedKey, action: RequestDataAction, new: u32) -> OnReaderPostsUpdated {
        OnReaderPostsUpdated {
            feed: feed.clone(),
            action,
            result: if new > 0 { UpdateResult::Changed } else { UpdateResult::Unchanged },
            num_new_posts: new,
            error: None,
        }
    }

    fn rust() -> FeedKey {
        FeedKey::Tag("rust".into())
    }

    #[tokio::test]
    async fn switching_tag_loads_newer_with_backfill() {
        let mut bench = Bench::new().await;
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 10);

        let effects = ctl.set_current_tag("rust").await.unwrap();
        assert_eq!(
            effects,
            vec![
                UiEffect::HideNewPostsBar,
                UiEffect::RefreshPosts,
                UiEffect::ShowRefreshing(true)
            ]
        );
        match bench.dispatched().await.as_slice() {
            [Action::Reader(ReaderAction::FetchPosts(p))] => {
                assert_eq!(p.feed, rust());
                assert!(p.allow_backfill);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(ctl.set_current_tag("rust").await.unwrap().is_empty());
        assert!(ctl.set_current_tag("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_one_fetch_in_flight() {
        let mut bench = Bench::new().await;
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 10);
        ctl.set_current_tag("rust").await.unwrap();

        assert!(ctl.update_posts(RequestDataAction::LoadNewer).is_empty());
        assert!(ctl.request_older().await.unwrap().is_empty());
        assert_eq!(bench.dispatched().await.len(), 1);

        ctl.on_posts_updated(&updated(&rust(), RequestDataAction::LoadNewer, 0))
            .await
            .unwrap();
        assert!(!ctl.is_updating());
        assert_eq!(
            ctl.update_posts(RequestDataAction::LoadNewer),
            vec![UiEffect::ShowRefreshing(true)]
        );
    }

    #[tokio::test]
    async fn new_posts_over_visible_list_show_bar() {
        let bench = Bench::new().await;
        store_post(&bench, &rust(), 1).await;
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 10);
        ctl.set_current_tag("rust").await.unwrap();
        assert_eq!(ctl.posts().len(), 1);

        store_post(&bench, &rust(), 2).await;
        let effects = ctl
            .on_posts_updated(&updated(&rust(), RequestDataAction::LoadNewer, 1))
            .await
            .unwrap();
        assert_eq!(effects, vec![UiEffect::ShowRefreshing(false), UiEffect::ShowNewPostsBar]);
        assert_eq!(ctl.posts().len(), 1);

        let effects = ctl.new_posts_bar_tapped().await.unwrap();
        assert_eq!(effects.last(), Some(&UiEffect::ScrollToTop));
        assert_eq!(ctl.posts()[0].post_id, 2);
        assert!(!ctl.is_new_posts_bar_visible());
    }

    #[tokio::test]
    async fn preview_lists_refresh_instead_of_showing_bar() {
        let bench = Bench::new().await;
        store_post(&bench, &rust(), 1).await;
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagPreview, 10);
        ctl.set_current_tag("rust").await.unwrap();

        store_post(&bench, &rust(), 2).await;
        let effects = ctl
            .on_posts_updated(&updated(&rust(), RequestDataAction::LoadNewer, 1))
            .await
            .unwrap();
        assert!(effects.contains(&UiEffect::RefreshPosts));
        assert_eq!(ctl.posts().len(), 2);
    }

    #[tokio::test]
    async fn older_posts_skipped_at_max() {
        let mut bench = Bench::new().await;
        for id in 1..=3 {
            store_post(&bench, &rust(), id).await;
        }
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 3);
        ctl.set_current_tag("rust").await.unwrap();
        ctl.on_posts_updated(&updated(&rust(), RequestDataAction::LoadNewer, 0))
            .await
            .unwrap();
        bench.dispatched().await;

        assert!(ctl.request_older().await.unwrap().is_empty());
        assert!(bench.dispatched().await.is_empty());
        assert!(bench.stats().is_empty());
    }

    #[tokio::test]
    async fn older_posts_request_is_tracked() {
        let mut bench = Bench::new().await;
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::BlogPreview, 10);
        ctl.set_current_blog(42).await.unwrap();
        ctl.on_posts_updated(&updated(&FeedKey::Blog(42), RequestDataAction::LoadNewer, 0))
            .await
            .unwrap();
        bench.dispatched().await;

        assert_eq!(ctl.request_older().await.unwrap(), vec![UiEffect::ShowLoadingOlder(true)]);
        match bench.dispatched().await.as_slice() {
            [Action::Reader(ReaderAction::FetchPosts(p))] => {
                assert_eq!(p.action, RequestDataAction::LoadOlder);
                assert!(!p.allow_backfill);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(bench.stats(), vec![Stat::ReaderInfiniteScroll]);
    }

    #[tokio::test]
    async fn switching_feed_mid_fetch_still_loads_new_feed() {
        let mut bench = Bench::new().await;
        let go = FeedKey::Tag("go".into());
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 10);
        ctl.set_current_tag("rust").await.unwrap();
        bench.dispatched().await;

        let effects = ctl.set_current_tag("go").await.unwrap();
        assert_eq!(effects.last(), Some(&UiEffect::ShowRefreshing(true)));
        match bench.dispatched().await.as_slice() {
            [Action::Reader(ReaderAction::FetchPosts(p))] => assert_eq!(p.feed, go),
            other => panic!("unexpected {other:?}"),
        }

        // 旧 feed 的结果不影响 go 的在途状态
        let effects = ctl
            .on_posts_updated(&updated(&rust(), RequestDataAction::LoadNewer, 5))
            .await
            .unwrap();
        assert!(effects.is_empty());
        assert!(ctl.is_updating());
        assert!(ctl.update_posts(RequestDataAction::LoadNewer).is_empty());
        assert!(bench.dispatched().await.is_empty());

        let effects = ctl
            .on_posts_updated(&updated(&go, RequestDataAction::LoadNewer, 0))
            .await
            .unwrap();
        assert_eq!(effects, vec![UiEffect::ShowRefreshing(false)]);
        assert!(!ctl.is_updating());
    }

    #[tokio::test]
    async fn returning_to_feed_in_flight_does_not_refetch() {
        let mut bench = Bench::new().await;
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 10);
        ctl.set_current_tag("rust").await.unwrap();
        ctl.set_current_tag("go").await.unwrap();
        assert_eq!(bench.dispatched().await.len(), 2);

        let effects = ctl.set_current_tag("rust").await.unwrap();
        assert_eq!(effects, vec![UiEffect::HideNewPostsBar, UiEffect::RefreshPosts]);
        assert!(ctl.is_updating());
        assert!(bench.dispatched().await.is_empty());
    }

    #[tokio::test]
    async fn failed_update_shows_notice() {
        let bench = Bench::new().await;
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 10);
        ctl.set_current_tag("rust").await.unwrap();

        let mut event = updated(&rust(), RequestDataAction::LoadNewer, 0);
        event.result = UpdateResult::Failed;
        event.error = Some(ReaderError {
            kind: ReaderErrorType::GenericError,
            message: "timeout".into(),
        });
        let effects = ctl.on_posts_updated(&event).await.unwrap();
        assert!(effects.contains(&UiEffect::Toast(Notice::Error("timeout".into()))));
    }

    #[tokio::test]
    async fn backfill_into_empty_list_shows_bar() {
        let bench = Bench::new().await;
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 10);
        ctl.set_current_tag("rust").await.unwrap();

        let event = OnReaderPostsBackfilled { feed: rust(), num_new_posts: 4 };
        assert_eq!(ctl.on_posts_backfilled(&event), vec![UiEffect::ShowNewPostsBar]);

        let other = OnReaderPostsBackfilled { feed: FeedKey::Tag("go".into()), num_new_posts: 4 };
        assert!(ctl.on_posts_backfilled(&other).is_empty());
    }

    #[tokio::test]
    async fn offline_update_is_not_dispatched() {
        let mut bench = Bench::new().await;
        bench.connectivity.set_online(false);
        let mut ctl = PostListController::new(bench.ctx.clone(), PostListType::TagFollowed, 10);

        let effects = ctl.set_current_tag("rust").await.unwrap();
        assert_eq!(effects, vec![UiEffect::HideNewPostsBar, UiEffect::RefreshPosts]);
        assert!(!ctl.is_updating());
        assert!(bench.dispatched().await.is_empty());
    }
}
