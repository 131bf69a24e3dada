use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use adapter::{rest::WpComRestClient, BusEvent, EventBus};
use app::{
    analytics::LogTracker,
    config::Settings,
    connectivity::ManualConnectivity,
    ui::{
        comment_detail::{CommentDetailController, CommentSource},
        magic_link::MagicLinkController,
        post_list::PostListController,
        site_search::SiteSearchController,
        UiEffect,
    },
    AppContext,
};
use domain::{
    payloads::FetchTaxonomiesPayload, Capability, CapabilitySet, OnCommentChanged,
    OnMagicLinkSent, OnReaderPostsBackfilled, OnReaderPostsUpdated, OnReaderSitesSearched,
    OnTaxonomyChanged, OnUploadChanged, PostListType, RequestDataAction, Site, SiteOrigin,
    TaxonomyAction,
};
use storage::Db;

const HELP: &str = "\
site <remote_id> [name]          cache a WP.com site
comments <site>                  list cached comments of a local site
comment <site> <remote_id>       open a comment from the list
note <remote_site> <remote_id> [approve-comment,like-comment,..]
moderate | spam | delete | confirm | like | reply <text> | close
tag <name> | blog <id> | refresh | older | shownew
search <term> | more
login <email>
taxonomies <site>
online | offline
quit";

#[derive(Debug)]
enum BusMessage {
    CommentChanged(OnCommentChanged),
    PostsUpdated(OnReaderPostsUpdated),
    PostsBackfilled(OnReaderPostsBackfilled),
    SitesSearched(OnReaderSitesSearched),
    MagicLinkSent(OnMagicLinkSent),
    TaxonomyChanged(OnTaxonomyChanged),
    UploadChanged(OnUploadChanged),
}

#[derive(Debug, Clone, Copy)]
enum View {
    Detail,
    Posts,
    Search,
    Login,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;
    let bus = EventBus::default();
    let rest = WpComRestClient::new(settings.rest_client_config())
        .context("Failed to build REST client")?;

    let (dispatcher, mut queue) = adapter::channel();
    adapter::register_stores(
        &mut queue,
        &db,
        &bus,
        &rest,
        settings.credentials(),
        settings.reader_limits(),
    );

    let cancel_token = CancellationToken::new();
    let loop_token = cancel_token.clone();
    let dispatch_loop = tokio::spawn(async move {
        if let Err(e) = adapter::start_with_cancel_token(queue, loop_token).await {
            error!("Dispatch loop crashed: {:?}", e);
        }
    });

    let connectivity = Arc::new(ManualConnectivity::new(true));
    let ctx = AppContext {
        db: db.clone(),
        dispatcher,
        bus: bus.clone(),
        connectivity: connectivity.clone(),
        tracker: Arc::new(LogTracker),
    };
    let mut console = Console::new(ctx, connectivity, &settings);

    let mut events = bus_messages(&bus);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    println!("{HELP}");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match console.run_command(line.trim()).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("error: {e:#}"),
                }
            }
            Some(message) = events.next() => {
                if let Err(e) = console.on_bus_message(message).await {
                    error!("Handling event failed: {:?}", e);
                }
            }
            _ = &mut shutdown => break,
        }
    }

    cancel_token.cancel();
    if let Err(e) = dispatch_loop.await {
        warn!("Dispatch loop did not stop cleanly: {}", e);
    }
    db.close().await;
    info!("Bye");
    Ok(())
}

fn subscribe<E, F>(bus: &EventBus, wrap: F) -> BoxStream<'static, BusMessage>
where
    E: BusEvent,
    F: Fn(E) -> BusMessage + Send + 'static,
{
    let receiver: broadcast::Receiver<E> = bus.subscribe();
    BroadcastStream::new(receiver)
        .filter_map(move |item| {
            let message = match item {
                Ok(event) => Some(wrap(event)),
                Err(e) => {
                    warn!("Console fell behind on {}: {}", std::any::type_name::<E>(), e);
                    None
                }
            };
            async move { message }
        })
        .boxed()
}

fn bus_messages(bus: &EventBus) -> BoxStream<'static, BusMessage> {
    stream::select_all([
        subscribe(bus, BusMessage::CommentChanged),
        subscribe(bus, BusMessage::PostsUpdated),
        subscribe(bus, BusMessage::PostsBackfilled),
        subscribe(bus, BusMessage::SitesSearched),
        subscribe(bus, BusMessage::MagicLinkSent),
        subscribe(bus, BusMessage::TaxonomyChanged),
        subscribe(bus, BusMessage::UploadChanged),
    ])
    .boxed()
}

struct Console {
    ctx: AppContext,
    connectivity: Arc<ManualConnectivity>,
    detail: Option<CommentDetailController>,
    posts: PostListController,
    search: SiteSearchController,
    login: MagicLinkController,
}

impl Console {
    fn new(ctx: AppContext, connectivity: Arc<ManualConnectivity>, settings: &Settings) -> Self {
        Self {
            posts: PostListController::new(
                ctx.clone(),
                PostListType::TagFollowed,
                settings.reader.max_posts_per_feed,
            ),
            search: SiteSearchController::new(ctx.clone()),
            login: MagicLinkController::new(ctx.clone()),
            detail: None,
            connectivity,
            ctx,
        }
    }

    /// Returns `false` once the user asked to quit.
    async fn run_command(&mut self, line: &str) -> anyhow::Result<bool> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        match command {
            "" => {}
            "help" => println!("{HELP}"),
            "quit" | "exit" => return Ok(false),
            "online" => self.connectivity.set_online(true),
            "offline" => self.connectivity.set_online(false),

            "site" => {
                let remote_id = parse_arg(&args, 0, "remote site id")?;
                let mut site = Site::placeholder(remote_id);
                site.origin = SiteOrigin::WpComRest;
                site.name = args.get(1..).map(|a| a.join(" ")).unwrap_or_default();
                self.ctx.db.upsert_site(&mut site).await?;
                println!("site {} -> local {}", site.site_id, site.id);
            }
            "comments" => {
                let site_id = parse_arg(&args, 0, "local site id")?;
                for c in self.ctx.db.list_comments_for_site(site_id, None, 50, 0).await? {
                    println!("#{} [{}] {}: {}", c.remote_comment_id, c.status, c.author_name, c.content);
                }
            }
            "comment" => {
                let site_id = parse_arg(&args, 0, "local site id")?;
                let comment_id = parse_arg(&args, 1, "remote comment id")?;
                let mut detail = CommentDetailController::new(self.ctx.clone(), CommentSource::CommentList);
                let effects = detail.load_from_list(site_id, comment_id).await?;
                self.open_detail(detail, effects);
            }
            "note" => {
                let site_id = parse_arg(&args, 0, "remote site id")?;
                let comment_id = parse_arg(&args, 1, "remote comment id")?;
                let caps = match args.get(2) {
                    Some(list) => list
                        .split(',')
                        .filter_map(Capability::from_note_action)
                        .collect(),
                    None => CapabilitySet::default(),
                };
                let mut detail = CommentDetailController::new(self.ctx.clone(), CommentSource::Notification);
                let effects = detail.load_from_notification(site_id, comment_id, caps).await?;
                self.open_detail(detail, effects);
            }
            "moderate" | "spam" | "delete" | "confirm" | "like" | "reply" | "close" => {
                let Some(detail) = self.detail.as_mut() else {
                    println!("no comment open");
                    return Ok(true);
                };
                let effects = match command {
                    "moderate" => detail.toggle_moderate(),
                    "spam" => detail.toggle_spam(),
                    "delete" => detail.request_delete(),
                    "confirm" => detail.confirm_delete(),
                    "like" => detail.toggle_like(),
                    "reply" => {
                        detail.set_reply_text(rest);
                        detail.submit_reply()
                    }
                    _ => vec![UiEffect::CloseScreen],
                };
                self.apply(View::Detail, effects);
            }

            "tag" => {
                let effects = self.posts.set_current_tag(rest).await?;
                self.apply(View::Posts, effects);
            }
            "blog" => {
                let blog_id = parse_arg(&args, 0, "blog id")?;
                let effects = self.posts.set_current_blog(blog_id).await?;
                self.apply(View::Posts, effects);
            }
            "refresh" => {
                let effects = self.posts.update_posts(RequestDataAction::LoadNewer);
                self.apply(View::Posts, effects);
            }
            "older" => {
                let effects = self.posts.request_older().await?;
                self.apply(View::Posts, effects);
            }
            "shownew" => {
                let effects = self.posts.new_posts_bar_tapped().await?;
                self.apply(View::Posts, effects);
            }

            "search" => {
                let effects = self.search.search(rest);
                self.apply(View::Search, effects);
            }
            "more" => {
                let effects = self.search.load_more();
                self.apply(View::Search, effects);
            }
            "login" => {
                let effects = self.login.request_link(rest);
                self.apply(View::Login, effects);
            }
            "taxonomies" => {
                let site_id = parse_arg(&args, 0, "local site id")?;
                match self.ctx.db.get_site_by_local_id(site_id).await? {
                    Some(site) if self.ctx.is_online() => self
                        .ctx
                        .dispatcher
                        .dispatch(TaxonomyAction::FetchTaxonomies(FetchTaxonomiesPayload { site })),
                    Some(_) => println!("! {}", app::ui::Notice::NoConnection),
                    None => println!("! {}", app::ui::Notice::SiteNotFound),
                }
            }
            other => println!("unknown command {other:?}, try `help`"),
        }
        Ok(true)
    }

    fn open_detail(&mut self, detail: CommentDetailController, effects: Vec<UiEffect>) {
        if let Some(mut previous) = self.detail.replace(detail) {
            previous.detach();
        }
        self.apply(View::Detail, effects);
    }

    async fn on_bus_message(&mut self, message: BusMessage) -> anyhow::Result<()> {
        match message {
            BusMessage::CommentChanged(event) => {
                if let Some(detail) = self.detail.as_mut() {
                    let effects = detail.on_comment_changed(&event).await?;
                    self.apply(View::Detail, effects);
                }
            }
            BusMessage::PostsUpdated(event) => {
                let effects = self.posts.on_posts_updated(&event).await?;
                self.apply(View::Posts, effects);
            }
            BusMessage::PostsBackfilled(event) => {
                let effects = self.posts.on_posts_backfilled(&event);
                self.apply(View::Posts, effects);
            }
            BusMessage::SitesSearched(event) => {
                let effects = self.search.on_sites_searched(&event);
                self.apply(View::Search, effects);
            }
            BusMessage::MagicLinkSent(event) => {
                let effects = self.login.on_magic_link_sent(&event);
                self.apply(View::Login, effects);
            }
            BusMessage::TaxonomyChanged(event) => match event.error {
                Some(e) => println!("! taxonomies: {}", e.message),
                None => {
                    for t in self.ctx.db.get_taxonomies_for_site(event.local_site_id).await? {
                        println!("{} ({})", t.name, t.label.unwrap_or_default());
                    }
                }
            },
            BusMessage::UploadChanged(event) => {
                println!("upload {:?} #{} changed", event.kind, event.local_id)
            }
        }
        Ok(())
    }

    fn apply(&mut self, view: View, effects: Vec<UiEffect>) {
        for effect in effects {
            match effect {
                UiEffect::Render | UiEffect::RefreshPosts => self.render(view),
                UiEffect::Toast(notice) => println!("! {notice}"),
                UiEffect::CloseScreen => {
                    if let Some(mut detail) = self.detail.take() {
                        detail.detach();
                    }
                    println!("(closed)");
                }
                UiEffect::ConfirmDelete => println!("delete permanently? type `confirm`"),
                UiEffect::ShowProgress(true) => println!("..."),
                UiEffect::ShowRefreshing(true) => println!("refreshing..."),
                UiEffect::ShowLoadingOlder(true) => println!("loading older posts..."),
                UiEffect::ShowNewPostsBar => println!("new posts available, type `shownew`"),
                UiEffect::ClearReply => println!("(reply cleared)"),
                UiEffect::ShowLinkSent => println!("check your email for the login link"),
                UiEffect::FallBackToPassword => println!("log in with your password instead"),
                UiEffect::ShowProgress(false)
                | UiEffect::ShowRefreshing(false)
                | UiEffect::ShowLoadingOlder(false)
                | UiEffect::SetReplyEnabled(_)
                | UiEffect::RefocusReply
                | UiEffect::RefreshCommentList
                | UiEffect::HideNewPostsBar
                | UiEffect::ScrollToTop => {}
            }
        }
    }

    fn render(&self, view: View) {
        match view {
            View::Detail => {
                let Some(detail) = self.detail.as_ref() else { return };
                if let Some(c) = detail.comment() {
                    let liked = if c.i_like { " liked" } else { "" };
                    println!(
                        "#{} [{}] {} ({} likes{}): {}",
                        c.remote_comment_id, c.status, c.author_name, c.like_count, liked, c.content
                    );
                    // 只列出当前权限允许的操作
                    let actions: Vec<&str> = [
                        (detail.can_moderate(), "moderate"),
                        (detail.can_mark_as_spam(), "spam"),
                        (detail.can_trash(), "delete"),
                        (detail.can_like(), "like"),
                        (detail.can_reply(), "reply"),
                    ]
                    .into_iter()
                    .filter_map(|(enabled, name)| enabled.then_some(name))
                    .collect();
                    let editable = if detail.can_edit() { ", editable on the web" } else { "" };
                    println!("  actions: {}{}", actions.join(" "), editable);
                }
            }
            View::Posts => {
                for p in self.posts.posts() {
                    println!("{} {} - {}", p.date_published, p.title, p.author_name);
                }
            }
            View::Search => {
                for s in self.search.results() {
                    println!("feed {} {} <{}> {} subscribers", s.feed_id, s.name, s.url, s.subscriber_count);
                }
            }
            View::Login => {}
        }
    }
}

fn parse_arg(args: &[&str], index: usize, what: &str) -> anyhow::Result<i64> {
    let raw = args
        .get(index)
        .with_context(|| format!("missing {what}"))?;
    raw.parse()
        .with_context(|| format!("invalid {what}: {raw:?}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
