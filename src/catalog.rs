use anyhow::Result;
use futures::future::join_all;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::debounce::{Debouncer, Sequencer, Ticket};
use crate::details::{self, TitleDetails, TrailerLookup};
use crate::fetch::CatalogSource;
use crate::models::{parse_results, MediaItem, MediaKind, Row, UserListEntry, ViewModel};
use crate::player::PlaybackTarget;
use crate::store::{ListName, PreferenceStore};
use crate::views::{self, ViewConfig};

/// Hero is drawn from this many leading results of the hero query.
pub const HERO_POOL: usize = 10;
pub const CONTINUE_WATCHING_TITLE: &str = "Continue Watching";
pub const MY_LIST_TITLE: &str = "My List";
const SEARCH_ENDPOINT: &str = "search/multi";
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

pub type ViewWatcher = watch::Receiver<ViewModel>;

/// Builds view-models from concurrent upstream queries plus local lists and
/// publishes them through a watch channel.
pub struct Catalog {
    source: Arc<dyn CatalogSource>,
    store: Arc<PreferenceStore>,
    view_seq: Sequencer,
    search_seq: Sequencer,
    sender: watch::Sender<ViewModel>,
    search_debouncer: Debouncer,
}

impl Catalog {
    pub fn new(source: Arc<dyn CatalogSource>, store: Arc<PreferenceStore>) -> Self {
        let (sender, _) = watch::channel(ViewModel::default());
        Self {
            source,
            store,
            view_seq: Sequencer::new(),
            search_seq: Sequencer::new(),
            sender,
            search_debouncer: Debouncer::new(SEARCH_DEBOUNCE),
        }
    }

    pub fn subscribe(&self) -> ViewWatcher {
        self.sender.subscribe()
    }

    pub fn current(&self) -> ViewModel {
        self.sender.borrow().clone()
    }

    /// Loads `view_name` and publishes the result unless a newer load has
    /// started in the meantime. Unknown views yield an empty model.
    pub async fn load_view(&self, view_name: &str) -> ViewModel {
        let ticket = self.view_seq.begin();
        if view_name != views::SEARCH.name {
            // A search landing after we leave the search view must not leak in.
            self.search_seq.begin();
        }

        let Some(config) = views::lookup(view_name) else {
            debug!("Unknown view '{}'", view_name);
            let model = ViewModel::empty(view_name);
            self.publish(&ticket, model.clone());
            return model;
        };

        self.publish(
            &ticket,
            ViewModel {
                is_loading: true,
                ..ViewModel::empty(config.name)
            },
        );

        let model = self.assemble(config).await;
        if self.publish(&ticket, model.clone()) {
            info!(
                view = config.name,
                rows = model.rows.len(),
                hero = model.hero.is_some(),
                "View ready"
            );
        } else {
            debug!(view = config.name, seq = ticket.seq(), "Discarding superseded view load");
        }
        model
    }

    async fn assemble(&self, config: &ViewConfig) -> ViewModel {
        let hero_query = async {
            match config.hero_endpoint {
                Some(endpoint) => self.fetch_items(endpoint, &[]).await,
                None => None,
            }
        };
        let category_queries = join_all(
            config
                .categories
                .iter()
                .map(|c| async move { (c.label, self.fetch_items(c.endpoint, c.params).await) }),
        );
        let (hero_items, categories) = tokio::join!(hero_query, category_queries);

        let hero = hero_items.and_then(|items| pick_hero(&items, &mut rand::thread_rng()));

        let mut rows = Vec::with_capacity(categories.len() + 2);
        if config.include_continue_watching {
            rows.extend(local_row(
                CONTINUE_WATCHING_TITLE,
                &self.store.load(ListName::ContinueWatching),
            ));
        }
        if config.include_my_list {
            rows.extend(local_row(MY_LIST_TITLE, &self.store.load(ListName::MyList)));
        }
        rows.extend(
            categories
                .into_iter()
                .filter_map(|(label, items)| match items {
                    Some(items) if !items.is_empty() => Some(Row {
                        title: label.to_string(),
                        items,
                    }),
                    _ => {
                        debug!("Dropping empty row '{}'", label);
                        None
                    }
                }),
        );

        ViewModel {
            view: config.name.to_string(),
            hero,
            rows,
            search_results: Vec::new(),
            is_loading: false,
        }
    }

    async fn fetch_items(&self, endpoint: &str, params: &[(&str, &str)]) -> Option<Vec<MediaItem>> {
        let page = self.source.fetch(endpoint, params).await?;
        Some(parse_results(&page, MediaKind::from_endpoint(endpoint)))
    }

    /// Multi-search. A blank query clears the results without a request and
    /// a failed request yields no results.
    pub async fn search(&self, query: &str) -> Vec<MediaItem> {
        let ticket = self.search_seq.begin();
        let query = query.trim();
        let results = if query.is_empty() {
            Vec::new()
        } else {
            match self.source.fetch(SEARCH_ENDPOINT, &[("query", query)]).await {
                Some(page) => parse_results(&page, None),
                None => Vec::new(),
            }
        };

        let published = results.clone();
        let applied = self.sender.send_if_modified(move |current| {
            if !ticket.is_current() {
                return false;
            }
            current.search_results = published;
            true
        });
        if !applied {
            debug!("Discarding superseded search for '{}'", query);
        }
        results
    }

    /// Search that waits for typing to pause; each call supersedes the last.
    pub fn search_debounced(self: &Arc<Self>, query: impl Into<String>) {
        let catalog = Arc::clone(self);
        let query = query.into();
        self.search_debouncer.call(async move {
            catalog.search(&query).await;
        });
    }

    pub async fn details(&self, kind: MediaKind, id: i64) -> Option<TitleDetails> {
        match kind {
            MediaKind::Movie => details::movie_details(self.source.as_ref(), id).await,
            MediaKind::Tv => details::show_details(self.source.as_ref(), id).await,
        }
    }

    pub async fn trailer(&self, item: &MediaItem) -> TrailerLookup {
        details::trailer(self.source.as_ref(), item.kind, item.id).await
    }

    /// Records the watch and returns the player URL for the embed frame.
    pub fn play(&self, item: &MediaItem, season: Option<u32>, episode: Option<u32>) -> Result<String> {
        self.store.record_watch(item)?;
        Ok(PlaybackTarget::for_item(item, season, episode).embed_url())
    }

    pub fn toggle_my_list(&self, item: &MediaItem) -> Result<bool> {
        self.store.toggle_list_membership(ListName::MyList, item)
    }

    pub fn toggle_reminder(&self, item: &MediaItem) -> Result<bool> {
        self.store.toggle_list_membership(ListName::Reminders, item)
    }

    fn publish(&self, ticket: &Ticket, model: ViewModel) -> bool {
        self.sender.send_if_modified(|current| {
            if !ticket.is_current() {
                return false;
            }
            let mut model = model;
            if model.view == views::SEARCH.name && current.view == views::SEARCH.name {
                model.search_results = std::mem::take(&mut current.search_results);
            }
            *current = model;
            true
        })
    }
}

fn local_row(title: &str, entries: &[UserListEntry]) -> Option<Row> {
    if entries.is_empty() {
        return None;
    }
    Some(Row {
        title: title.to_string(),
        items: entries.iter().map(MediaItem::from).collect(),
    })
}

/// Uniform pick among the first `HERO_POOL` items.
pub fn pick_hero<R: Rng + ?Sized>(items: &[MediaItem], rng: &mut R) -> Option<MediaItem> {
    if items.is_empty() {
        return None;
    }
    let pool = items.len().min(HERO_POOL);
    items.get(rng.gen_range(0..pool)).cloned()
}
