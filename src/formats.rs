use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u32,
    pub parent_book_id: u32,
    pub toc_name: String,
    pub grid_name: String,
    pub full_name: String,
    pub num_chapters: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRecord {
    pub id: u32,
    pub full_name: String,
    pub min_book_id: u32,
    pub max_book_id: u32,
}

/// Book table as served by the API: either an array indexed by id (holes are
/// `null`) or an object keyed by decimal id strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BookTable {
    Indexed(Vec<Option<Book>>),
    Keyed(BTreeMap<String, Book>),
}

impl BookTable {
    pub fn into_books(self) -> Vec<Book> {
        match self {
            BookTable::Indexed(entries) => entries.into_iter().flatten().collect(),
            BookTable::Keyed(entries) => entries.into_values().collect(),
        }
    }
}
