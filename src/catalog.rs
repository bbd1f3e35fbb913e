use std::collections::BTreeMap;

use anyhow::Context as _;
use serde::Serialize;

use crate::api::ScripturesApi;
use crate::formats::{Book, VolumeRecord};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Volume {
    pub id: u32,
    pub full_name: String,
    pub min_book_id: u32,
    pub max_book_id: u32,
    /// Book ids in `[min_book_id, max_book_id]`, in order.
    pub books: Vec<u32>,
}

/// A chapter reachable from another one by "next" or "previous".
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AdjacentChapter {
    pub book_id: u32,
    pub chapter: u32,
    pub title: String,
}

impl AdjacentChapter {
    pub fn hash(&self) -> String {
        format!("#0:{}:{}", self.book_id, self.chapter)
    }
}

/// Volume and book tables for one session.
#[derive(Debug, Clone)]
pub struct Catalog {
    books: BTreeMap<u32, Book>,
    volumes: Vec<Volume>,
}

impl Catalog {
    /// Fetches both tables concurrently; derived lists are built only once
    /// both have arrived.
    pub async fn load(api: &dyn ScripturesApi) -> anyhow::Result<Self> {
        let (books, volumes) = tokio::try_join!(api.fetch_books(), api.fetch_volumes())
            .context("fetch book and volume tables")?;
        tracing::info!(
            books = books.len(),
            volumes = volumes.len(),
            "loaded scripture metadata"
        );
        Self::from_tables(books, volumes)
    }

    pub fn from_tables(books: Vec<Book>, volumes: Vec<VolumeRecord>) -> anyhow::Result<Self> {
        let books: BTreeMap<u32, Book> = books.into_iter().map(|book| (book.id, book)).collect();

        let mut records = volumes;
        records.sort_by_key(|volume| volume.id);

        let mut volumes = Vec::with_capacity(records.len());
        for record in records {
            if record.min_book_id > record.max_book_id {
                anyhow::bail!(
                    "volume {} has empty book range {}..={}",
                    record.id,
                    record.min_book_id,
                    record.max_book_id
                );
            }

            let mut volume_books = Vec::new();
            for book_id in record.min_book_id..=record.max_book_id {
                let book = books.get(&book_id).with_context(|| {
                    format!("volume {} references missing book {book_id}", record.id)
                })?;
                if book.parent_book_id != record.id {
                    anyhow::bail!(
                        "book {book_id} belongs to volume {} but lies in the range of volume {}",
                        book.parent_book_id,
                        record.id
                    );
                }
                volume_books.push(book_id);
            }

            volumes.push(Volume {
                id: record.id,
                full_name: record.full_name,
                min_book_id: record.min_book_id,
                max_book_id: record.max_book_id,
                books: volume_books,
            });
        }

        for book in books.values() {
            if !volumes.iter().any(|volume| volume.id == book.parent_book_id) {
                anyhow::bail!(
                    "book {} references missing volume {}",
                    book.id,
                    book.parent_book_id
                );
            }
        }

        Ok(Self { books, volumes })
    }

    pub fn book(&self, book_id: u32) -> Option<&Book> {
        self.books.get(&book_id)
    }

    pub fn volume(&self, volume_id: u32) -> Option<&Volume> {
        self.volumes.iter().find(|volume| volume.id == volume_id)
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn books_in<'a>(&'a self, volume: &'a Volume) -> impl Iterator<Item = &'a Book> + 'a {
        volume.books.iter().filter_map(|id| self.books.get(id))
    }

    /// Inclusive range of volume ids, or `None` when no volumes are loaded.
    pub fn volume_id_range(&self) -> Option<(u32, u32)> {
        let first = self.volumes.first()?;
        let last = self.volumes.last()?;
        Some((first.id, last.id))
    }

    pub fn volume_for_book(&self, book: &Book) -> Option<&Volume> {
        self.volume(book.parent_book_id)
    }

    pub fn book_chapter_valid(&self, book_id: i64, chapter: i64) -> bool {
        let Some(book) = u32::try_from(book_id).ok().and_then(|id| self.book(id)) else {
            return false;
        };
        if chapter < 0 || chapter > i64::from(book.num_chapters) {
            return false;
        }
        !(chapter == 0 && book.num_chapters > 0)
    }

    pub fn title_for_book_chapter(&self, book_id: u32, chapter: u32) -> Option<String> {
        let book = self.book(book_id)?;
        if chapter > 0 {
            Some(format!("{} {chapter}", book.toc_name))
        } else {
            Some(book.toc_name.clone())
        }
    }

    pub fn next_chapter(&self, book_id: u32, chapter: u32) -> Option<AdjacentChapter> {
        let book = self.book(book_id)?;
        if chapter < book.num_chapters {
            return self.adjacent(book_id, chapter + 1);
        }

        let next_book = self.book(book_id.checked_add(1)?)?;
        let next_chapter = if next_book.num_chapters > 0 { 1 } else { 0 };
        self.adjacent(next_book.id, next_chapter)
    }

    pub fn previous_chapter(&self, book_id: u32, chapter: u32) -> Option<AdjacentChapter> {
        self.book(book_id)?;
        if chapter > 1 {
            return self.adjacent(book_id, chapter - 1);
        }

        let prev_book = self.book(book_id.checked_sub(1)?)?;
        self.adjacent(prev_book.id, prev_book.num_chapters)
    }

    fn adjacent(&self, book_id: u32, chapter: u32) -> Option<AdjacentChapter> {
        Some(AdjacentChapter {
            book_id,
            chapter,
            title: self.title_for_book_chapter(book_id, chapter)?,
        })
    }
}
