use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

use crate::formats::{Book, BookTable, VolumeRecord};

pub const DEFAULT_BASE_URL: &str = "https://scriptures.byu.edu/";

const BOOKS_PATH: &str = "mapscrip/model/books.php";
const VOLUMES_PATH: &str = "mapscrip/model/volumes.php";
const CHAPTER_PATH: &str = "mapscrip/mapgetscrip.php";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterRequest {
    pub book_id: u32,
    pub chapter: u32,
    pub verses: Option<String>,
    pub jst: bool,
}

impl ChapterRequest {
    pub fn new(book_id: u32, chapter: u32) -> Self {
        Self {
            book_id,
            chapter,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait ScripturesApi: Send + Sync {
    async fn fetch_books(&self) -> anyhow::Result<Vec<Book>>;
    async fn fetch_volumes(&self) -> anyhow::Result<Vec<VolumeRecord>>;
    async fn fetch_chapter(&self, request: &ChapterRequest) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpScripturesApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpScripturesApi {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url).context("parse api base url")?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            anyhow::bail!("api base url must be http/https: {base_url}");
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build api http client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn chapter_url(&self, request: &ChapterRequest) -> anyhow::Result<Url> {
        let mut url = self
            .base_url
            .join(CHAPTER_PATH)
            .context("build chapter url")?;

        let mut verses = request.verses.clone().unwrap_or_default();
        if request.jst {
            verses.push_str("&jst=JST");
        }

        // The jst flag rides inside the verses value, unescaped.
        url.set_query(Some(&format!(
            "book={}&chap={}&verses={verses}",
            request.book_id, request.chapter
        )));
        Ok(url)
    }

    async fn get(&self, url: Url, accept: &str) -> anyhow::Result<reqwest::Response> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, "scripmap/0.1")
            .header(ACCEPT, accept)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: unexpected status {status}");
        }
        Ok(response)
    }
}

#[async_trait]
impl ScripturesApi for HttpScripturesApi {
    async fn fetch_books(&self) -> anyhow::Result<Vec<Book>> {
        let url = self.base_url.join(BOOKS_PATH).context("build books url")?;
        let table: BookTable = self
            .get(url, "application/json")
            .await?
            .json()
            .await
            .context("decode book table")?;
        Ok(table.into_books())
    }

    async fn fetch_volumes(&self) -> anyhow::Result<Vec<VolumeRecord>> {
        let url = self
            .base_url
            .join(VOLUMES_PATH)
            .context("build volumes url")?;
        self.get(url, "application/json")
            .await?
            .json()
            .await
            .context("decode volume table")
    }

    async fn fetch_chapter(&self, request: &ChapterRequest) -> anyhow::Result<String> {
        let url = self.chapter_url(request)?;
        self.get(url, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .await?
            .text()
            .await
            .context("read chapter body")
    }
}
