//! Domain types for the upstream search API
//!
//! `SearchRequest` is what callers ask for, `SearchResponse` is the upstream
//! JSON body and `Item` is one content record inside it.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A structured search: tags to match and an optional source filter.
///
/// Tag order is preserved into the query string and duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    tags: Vec<String>,
    source: String,
}

impl SearchRequest {
    pub fn new<I, S>(tags: I, source: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            source: source.into(),
        }
    }

    /// Request matching the given tags from any source.
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(tags, String::new())
    }

    /// Restrict the search to one source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn tag_list(&self) -> &[String] {
        &self.tags
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// News/content item as returned by the upstream API.
///
/// Every field is optional on the wire; a missing or `null` field decodes
/// to the zero value of its type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub audio_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub article_url: String,
    /// Length of the audio in seconds
    #[serde(deserialize_with = "null_as_default")]
    pub duration: f32,
    #[serde(rename = "filesize_in_bytes", deserialize_with = "null_as_default")]
    pub file_size_in_bytes: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub num_plays: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub source_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub guid: String,
    /// Publication timestamp, kept verbatim
    #[serde(deserialize_with = "null_as_default")]
    pub published_at: String,
}

/// Upstream search response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<Item>,
    #[serde(deserialize_with = "null_as_default")]
    pub identifiers: HashMap<String, String>,
}

/// Decode `null` as the type's zero value, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
