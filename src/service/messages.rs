//! RPC message types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Item, SearchRequest};

/// Search call payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRpcRequest {
    pub tags: Vec<String>,
    pub source: String,
}

impl From<SearchRpcRequest> for SearchRequest {
    fn from(req: SearchRpcRequest) -> Self {
        SearchRequest::new(req.tags, req.source)
    }
}

/// One streamed search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchReply {
    pub title: String,
    pub summary: String,
    pub date_url: String,
    pub audio_url: String,
    pub image_url: String,
    pub article_url: String,
    pub duration: f32,
    pub file_size_in_bytes: u64,
    pub num_plays: u32,
    pub source_id: String,
    pub guid: String,
    pub published_at: String,
}

impl From<Item> for SearchReply {
    fn from(item: Item) -> Self {
        Self {
            title: item.title,
            summary: item.summary,
            date_url: item.date_url,
            audio_url: item.audio_url,
            image_url: item.image_url,
            article_url: item.article_url,
            duration: item.duration,
            file_size_in_bytes: item.file_size_in_bytes,
            num_plays: item.num_plays,
            source_id: item.source_id,
            guid: item.guid,
            published_at: item.published_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShutdownReply {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
    pub dependencies: Vec<String>,
}

/// Build identity reported by the version call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub binary: String,
    pub dependencies: Vec<String>,
}

impl VersionInfo {
    /// `dependencies` is a semicolon-delimited list such as `"tokio 1.0;axum 0.8"`.
    pub fn new(binary: impl Into<String>, dependencies: &str) -> Self {
        Self {
            binary: binary.into(),
            dependencies: dependencies
                .split(';')
                .map(str::trim)
                .filter(|dep| !dep.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::new("dev-build", "dev-build null")
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binary: {}", self.binary)?;
        for dep in &self.dependencies {
            write!(f, "\n{dep}")?;
        }
        Ok(())
    }
}

impl From<&VersionInfo> for VersionReply {
    fn from(info: &VersionInfo) -> Self {
        Self {
            version: info.binary.clone(),
            dependencies: info.dependencies.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_copies_every_field() {
        let item = Item {
            title: "t".into(),
            summary: "s".into(),
            date_url: "d".into(),
            audio_url: "a".into(),
            image_url: "i".into(),
            article_url: "u".into(),
            duration: 12.5,
            file_size_in_bytes: 42,
            num_plays: 7,
            source_id: "src".into(),
            guid: "g".into(),
            published_at: "2017-03-01T00:00:00Z".into(),
        };

        let reply = SearchReply::from(item);
        assert_eq!(reply.title, "t");
        assert_eq!(reply.article_url, "u");
        assert_eq!(reply.duration, 12.5);
        assert_eq!(reply.file_size_in_bytes, 42);
        assert_eq!(reply.num_plays, 7);
        assert_eq!(reply.published_at, "2017-03-01T00:00:00Z");
    }

    #[test]
    fn version_splits_dependencies() {
        let info = VersionInfo::new("1.2.3", "tokio 1.47;axum 0.8.4; ;reqwest 0.12");
        assert_eq!(info.dependencies, ["tokio 1.47", "axum 0.8.4", "reqwest 0.12"]);
        assert_eq!(
            info.to_string(),
            "binary: 1.2.3\ntokio 1.47\naxum 0.8.4\nreqwest 0.12"
        );
    }

    #[test]
    fn default_version_is_dev_build() {
        let reply = VersionReply::from(&VersionInfo::default());
        assert_eq!(reply.version, "dev-build");
        assert_eq!(reply.dependencies, ["dev-build null"]);
    }

    #[test]
    fn rpc_request_tolerates_missing_fields() {
        let req: SearchRpcRequest = serde_json::from_str(r#"{"tags":["mars"]}"#).unwrap();
        let req = SearchRequest::from(req);
        assert_eq!(req.tag_list(), ["mars"]);
        assert_eq!(req.source(), "");
    }
}
