use adapter::rest::SEARCH_PAGE_SIZE;
use domain::{payloads::SearchSitesPayload, OnReaderSitesSearched, ReaderAction, ReaderFeedSite};
use tracing::debug;

use super::{Notice, UiEffect};
use crate::{analytics::Stat, AppContext};

pub struct SiteSearchController {
    ctx: AppContext,
    term: String,
    offset: u32,
    results: Vec<ReaderFeedSite>,
    can_load_more: bool,
    is_loading: bool,
}

impl SiteSearchController {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            term: String::new(),
            offset: 0,
            results: Vec::new(),
            can_load_more: false,
            is_loading: false,
        }
    }

    pub fn results(&self) -> &[ReaderFeedSite] {
        &self.results
    }

    pub fn can_load_more(&self) -> bool {
        self.can_load_more
    }

    pub fn search(&mut self, term: &str) -> Vec<UiEffect> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        if !self.ctx.is_online() {
            return vec![UiEffect::Toast(Notice::NoConnection)];
        }
        self.term = term.to_string();
        self.offset = 0;
        self.results.clear();
        self.can_load_more = false;
        self.ctx.tracker.track(Stat::ReaderSitesSearched);
        self.request()
    }

    pub fn load_more(&mut self) -> Vec<UiEffect> {
        if !self.can_load_more || self.is_loading || self.term.is_empty() {
            return Vec::new();
        }
        if !self.ctx.is_online() {
            return vec![UiEffect::Toast(Notice::NoConnection)];
        }
        self.offset += SEARCH_PAGE_SIZE;
        self.request()
    }

    fn request(&mut self) -> Vec<UiEffect> {
        self.is_loading = true;
        self.ctx.dispatcher.dispatch(ReaderAction::SearchSites(SearchSitesPayload {
            term: self.term.clone(),
            offset: self.offset,
        }));
        vec![UiEffect::ShowProgress(true)]
    }

    pub fn on_sites_searched(&mut self, event: &OnReaderSitesSearched) -> Vec<UiEffect> {
        // 用户已经换了关键词或翻了页
        if event.term != self.term || event.offset != self.offset {
            debug!("Dropping stale search results for {:?}@{}", event.term, event.offset);
            return Vec::new();
        }
        self.is_loading = false;
        let mut effects = vec![UiEffect::ShowProgress(false)];
        match &event.error {
            Some(error) => {
                self.can_load_more = false;
                effects.push(UiEffect::Toast(Notice::SearchFailed(error.message.clone())));
            }
            None => {
                self.results.extend(event.feeds.iter().cloned());
                self.can_load_more = event.can_load_more;
                effects.push(UiEffect::Render);
            }
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Bench;
    use domain::{Action, ReaderError, ReaderErrorType};

    fn feed(id: i64) -> ReaderFeedSite {
        ReaderFeedSite {
            feed_id: id,
            blog_id: id * 10,
            name: format!("site {id}"),
            url: format!("https://{id}.example.com"),
            subscriber_count: 1,
        }
    }

    fn searched(term: &str, offset: u32, ids: &[i64], more: bool) -> OnReaderSitesSearched {
        OnReaderSitesSearched {
            term: term.into(),
            offset,
            feeds: ids.iter().copied().map(feed).collect(),
            can_load_more: more,
            error: None,
        }
    }

    fn offsets(actions: &[Action]) -> Vec<u32> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Reader(ReaderAction::SearchSites(p)) => Some(p.offset),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn load_more_pages_by_search_page_size() {
        let mut bench = Bench::new().await;
        let mut ctl = SiteSearchController::new(bench.ctx.clone());

        ctl.search("rust");
        ctl.on_sites_searched(&searched("rust", 0, &[1, 2], true));
        ctl.load_more();
        assert!(ctl.load_more().is_empty());
        ctl.on_sites_searched(&searched("rust", SEARCH_PAGE_SIZE, &[3], false));

        assert_eq!(offsets(&bench.dispatched().await), vec![0, SEARCH_PAGE_SIZE]);
        assert_eq!(ctl.results().len(), 3);
        assert!(!ctl.can_load_more());
        assert!(ctl.load_more().is_empty());
    }

    #[tokio::test]
    async fn new_search_resets_and_drops_stale_results() {
        let mut bench = Bench::new().await;
        let mut ctl = SiteSearchController::new(bench.ctx.clone());

        ctl.search("rust");
        ctl.search("tokio");
        assert!(ctl.on_sites_searched(&searched("rust", 0, &[1], true)).is_empty());
        ctl.on_sites_searched(&searched("tokio", 0, &[7], false));

        assert_eq!(ctl.results(), &[feed(7)]);
        assert_eq!(bench.dispatched().await.len(), 2);
        assert_eq!(bench.stats(), vec![Stat::ReaderSitesSearched, Stat::ReaderSitesSearched]);
    }

    #[tokio::test]
    async fn search_error_shows_notice() {
        let bench = Bench::new().await;
        let mut ctl = SiteSearchController::new(bench.ctx.clone());
        ctl.search("rust");

        let mut event = searched("rust", 0, &[], false);
        event.error = Some(ReaderError {
            kind: ReaderErrorType::GenericError,
            message: "bad gateway".into(),
        });
        let effects = ctl.on_sites_searched(&event);
        assert!(effects.contains(&UiEffect::Toast(Notice::SearchFailed("bad gateway".into()))));
        assert!(ctl.results().is_empty());
    }
}
