use domain::{
    OnCommentChanged, OnMagicLinkSent, OnReaderPostsBackfilled, OnReaderPostsUpdated,
    OnReaderSitesSearched, OnTaxonomyChanged, OnUploadChanged,
};
use tokio::sync::broadcast;
use tracing::debug;

/// Event type carried on its own channel of the [`EventBus`].
pub trait BusEvent: Clone + Send + 'static {
    fn channel(bus: &EventBus) -> &broadcast::Sender<Self>;
}

macro_rules! event_bus {
    ($($field:ident: $event:ty),* $(,)?) => {
        /// One broadcast channel per change-event type.
        #[derive(Clone)]
        pub struct EventBus {
            $($field: broadcast::Sender<$event>,)*
        }

        impl EventBus {
            pub fn new(capacity: usize) -> Self {
                Self {
                    $($field: broadcast::channel(capacity).0,)*
                }
            }
        }

        $(
            impl BusEvent for $event {
                fn channel(bus: &EventBus) -> &broadcast::Sender<Self> {
                    &bus.$field
                }
            }
        )*
    };
}

event_bus! {
    comment_changed: OnCommentChanged,
    sites_searched: OnReaderSitesSearched,
    posts_updated: OnReaderPostsUpdated,
    posts_backfilled: OnReaderPostsBackfilled,
    magic_link_sent: OnMagicLinkSent,
    taxonomy_changed: OnTaxonomyChanged,
    upload_changed: OnUploadChanged,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus {
    pub fn emit<E: BusEvent>(&self, event: E) {
        // 没有订阅者时 send 会失败，属于正常情况
        if E::channel(self).send(event).is_err() {
            debug!("Event {} emitted with no subscribers", std::any::type_name::<E>());
        }
    }

    pub fn subscribe<E: BusEvent>(&self) -> broadcast::Receiver<E> {
        E::channel(self).subscribe()
    }
}
