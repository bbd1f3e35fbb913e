use std::sync::Arc;

use anyhow::Context as _;
use serde::Serialize;

use crate::api::{ChapterRequest, HttpScripturesApi, ScripturesApi};
use crate::catalog::Catalog;
use crate::map::{MapWidget, ViewportMap};
use crate::markers::{Marker, MarkerManager, Viewport};
use crate::places::{Chapter, PlaceTag};
use crate::render;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Route {
    Home,
    Volume { volume_id: u32 },
    Book { book_id: u32 },
    Chapter { book_id: u32, chapter: u32 },
}

impl Route {
    /// Resolves a location hash (`#`, `#V`, `#V:B`, `#V:B:C`). Anything that
    /// does not name a known volume, book or chapter resolves to `Home`.
    pub fn parse(hash: &str, catalog: &Catalog) -> Self {
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        if hash.is_empty() {
            return Route::Home;
        }

        let tokens: Vec<&str> = hash.split(':').collect();
        match tokens.as_slice() {
            [volume] => {
                let Some(volume_id) = parse_id(volume) else {
                    return Route::Home;
                };
                match catalog.volume_id_range() {
                    Some((min, max)) if (i64::from(min)..=i64::from(max)).contains(&volume_id) => {
                        // The range is contiguous in practice; a gap still
                        // falls back to Home.
                        u32::try_from(volume_id)
                            .ok()
                            .filter(|id| catalog.volume(*id).is_some())
                            .map_or(Route::Home, |volume_id| Route::Volume { volume_id })
                    }
                    _ => Route::Home,
                }
            }
            [_, book, rest @ ..] => {
                let Some(book_id) = parse_id(book)
                    .and_then(|id| u32::try_from(id).ok())
                    .filter(|id| catalog.book(*id).is_some())
                else {
                    return Route::Home;
                };

                let Some(chapter) = rest.first() else {
                    return Route::Book { book_id };
                };
                match parse_id(chapter) {
                    Some(chapter) if catalog.book_chapter_valid(i64::from(book_id), chapter) => {
                        Route::Chapter {
                            book_id,
                            chapter: chapter as u32,
                        }
                    }
                    _ => Route::Home,
                }
            }
            [] => Route::Home,
        }
    }

    pub fn to_hash(&self) -> String {
        match self {
            Route::Home => "#".to_owned(),
            Route::Volume { volume_id } => format!("#{volume_id}"),
            Route::Book { book_id } => format!("#0:{book_id}"),
            Route::Chapter { book_id, chapter } => format!("#0:{book_id}:{chapter}"),
        }
    }
}

fn parse_id(token: &str) -> Option<i64> {
    token.trim().parse::<i64>().ok()
}

/// Everything the page shows for one hash.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct View {
    pub route: Route,
    pub breadcrumbs: String,
    pub content: String,
    pub markers: Vec<Marker>,
    /// `None` when the view leaves the map untouched.
    pub viewport: Option<Viewport>,
}

/// Session state: metadata, the chapter source and the markers currently on
/// the map.
pub struct Navigator<M: MapWidget = ViewportMap> {
    api: Arc<dyn ScripturesApi>,
    catalog: Arc<Catalog>,
    markers: MarkerManager,
    places: Vec<PlaceTag>,
    map: M,
}

impl Navigator<ViewportMap> {
    pub fn new(api: Arc<dyn ScripturesApi>, catalog: Arc<Catalog>) -> Self {
        Self::with_map(api, catalog, ViewportMap::default())
    }

    /// Starts a session against the API at `base_url`.
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let api: Arc<dyn ScripturesApi> =
            Arc::new(HttpScripturesApi::new(base_url).context("build api client")?);
        let catalog = Catalog::load(api.as_ref())
            .await
            .context("load scripture metadata")?;
        Ok(Self::new(api, Arc::new(catalog)))
    }
}

impl<M: MapWidget> Navigator<M> {
    pub fn with_map(api: Arc<dyn ScripturesApi>, catalog: Arc<Catalog>, map: M) -> Self {
        Self {
            api,
            catalog,
            markers: MarkerManager::new(),
            places: Vec::new(),
            map,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn markers(&self) -> &[Marker] {
        self.markers.markers()
    }

    pub async fn navigate(&mut self, hash: &str) -> View {
        let route = Route::parse(hash, &self.catalog);
        tracing::debug!(hash, ?route, "navigate");

        match route {
            Route::Home => self.static_view(
                route,
                render::breadcrumbs(None, None, None),
                render::volumes_grid(&self.catalog, None),
            ),
            Route::Volume { volume_id } => {
                let volume = self.catalog.volume(volume_id);
                self.static_view(
                    route,
                    render::breadcrumbs(volume, None, None),
                    render::volumes_grid(&self.catalog, volume),
                )
            }
            Route::Book { book_id } => {
                let Some(book) = self.catalog.book(book_id) else {
                    return self.static_view(
                        Route::Home,
                        render::breadcrumbs(None, None, None),
                        render::volumes_grid(&self.catalog, None),
                    );
                };
                if book.num_chapters <= 1 {
                    let chapter = book.num_chapters;
                    return self.chapter_view(route, book_id, chapter).await;
                }
                self.static_view(
                    route,
                    render::breadcrumbs(self.catalog.volume_for_book(book), Some(book), None),
                    render::chapters_grid(book),
                )
            }
            Route::Chapter { book_id, chapter } => self.chapter_view(route, book_id, chapter).await,
        }
    }

    fn static_view(&self, route: Route, breadcrumbs: String, content: String) -> View {
        View {
            route,
            breadcrumbs,
            content,
            markers: self.markers.markers().to_vec(),
            viewport: None,
        }
    }

    async fn chapter_view(&mut self, route: Route, book_id: u32, chapter: u32) -> View {
        let book = self.catalog.book(book_id);
        let breadcrumbs = render::breadcrumbs(
            book.and_then(|book| self.catalog.volume_for_book(book)),
            book,
            Some(chapter),
        );

        let loaded = match self.load_chapter(&ChapterRequest::new(book_id, chapter)).await {
            Ok(loaded) => loaded,
            Err(err) => {
                let err = format!("{err:#}");
                tracing::warn!(book_id, chapter, %err, "chapter fetch failed");
                return self.static_view(
                    route,
                    breadcrumbs,
                    render::TEXT_CHAPTER_FAILURE.to_owned(),
                );
            }
        };

        let previous = self.catalog.previous_chapter(book_id, chapter);
        let next = self.catalog.next_chapter(book_id, chapter);
        let content = render::inject_chapter_nav(&loaded.html, previous.as_ref(), next.as_ref());
        let viewport = self.plot_places(&loaded.places);

        View {
            route,
            breadcrumbs,
            content,
            markers: self.markers.markers().to_vec(),
            viewport: Some(viewport),
        }
    }

    /// Fetches chapter markup and extracts the places it mentions.
    pub async fn load_chapter(&self, request: &ChapterRequest) -> anyhow::Result<Chapter> {
        let html = self
            .api
            .fetch_chapter(request)
            .await
            .with_context(|| format!("fetch chapter {}:{}", request.book_id, request.chapter))?;
        Chapter::from_html(request.book_id, request.chapter, html).context("extract place tags")
    }

    /// Replaces the markers on the map with the ones for `places`.
    pub fn plot_places(&mut self, places: &[PlaceTag]) -> Viewport {
        self.places = places.to_vec();
        self.markers.rebuild(places, &mut self.map)
    }

    /// Places behind the markers currently on the map.
    pub fn places(&self) -> &[PlaceTag] {
        &self.places
    }

    pub fn show_location(&mut self, place: &PlaceTag) -> Option<Viewport> {
        self.markers.show_location(place, &mut self.map)
    }

    /// Centers on the plotted place carrying `geotag_id`.
    pub fn show_geotag(&mut self, geotag_id: &str) -> Option<Viewport> {
        let place = self
            .places
            .iter()
            .find(|place| place.geotag_id == geotag_id)?
            .clone();
        self.show_location(&place)
    }
}
