use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::{Html, Json};
use axum::routing::get;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::api::ScripturesApi;
use crate::catalog::Catalog;
use crate::markers::Viewport;
use crate::navigator::{Navigator, View};

/// Shared across requests. Each request gets its own [`Navigator`], so marker
/// state never leaks between clients.
#[derive(Clone)]
pub struct AppState {
    api: Arc<dyn ScripturesApi>,
    catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(api: Arc<dyn ScripturesApi>, catalog: Arc<Catalog>) -> Self {
        Self { api, catalog }
    }

    /// Loads the metadata once; the server does not start without it.
    pub async fn load(api: Arc<dyn ScripturesApi>) -> anyhow::Result<Self> {
        let catalog = Catalog::load(api.as_ref()).await?;
        Ok(Self::new(api, Arc::new(catalog)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(shell))
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/view", get(view_handler))
        .route("/api/show-location", get(show_location_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ViewQuery {
    #[serde(default)]
    hash: String,
}

async fn view_handler(State(state): State<AppState>, Query(q): Query<ViewQuery>) -> Json<View> {
    let mut navigator = Navigator::new(Arc::clone(&state.api), Arc::clone(&state.catalog));
    Json(navigator.navigate(&q.hash).await)
}

#[derive(Debug, Deserialize)]
struct ShowLocationQuery {
    #[serde(default)]
    hash: String,
    geotag: String,
}

/// Re-renders `hash` so the chapter's markers exist, then centers on the
/// place tag with the given geotag id.
async fn show_location_handler(
    State(state): State<AppState>,
    Query(q): Query<ShowLocationQuery>,
) -> Json<Option<Viewport>> {
    let mut navigator = Navigator::new(Arc::clone(&state.api), Arc::clone(&state.catalog));
    navigator.navigate(&q.hash).await;
    let viewport = navigator.show_geotag(&q.geotag);
    if viewport.is_none() {
        tracing::debug!(hash = %q.hash, geotag = %q.geotag, "no marker for place");
    }
    Json(viewport)
}

async fn shell() -> Html<&'static str> {
    Html(SHELL_HTML)
}

const SHELL_HTML: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>The Scriptures</title>
  </head>
  <body>
    <div id="crumbs"></div>
    <div id="scriptures"></div>
    <script>
      async function onHashChanged() {
        const response = await fetch("/api/view?hash=" + encodeURIComponent(location.hash));
        const view = await response.json();
        document.getElementById("crumbs").innerHTML = view.breadcrumbs;
        document.getElementById("scriptures").innerHTML = view.content;
        window.dispatchEvent(new CustomEvent("scripmap:view", { detail: view }));
      }
      async function showLocation(geotagId) {
        const query = "hash=" + encodeURIComponent(location.hash) +
          "&geotag=" + encodeURIComponent(String(geotagId));
        const response = await fetch("/api/show-location?" + query);
        const viewport = await response.json();
        if (viewport) {
          window.dispatchEvent(new CustomEvent("scripmap:show-location", { detail: viewport }));
        }
      }
      window.addEventListener("hashchange", onHashChanged);
      onHashChanged();
    </script>
  </body>
</html>
"#;
