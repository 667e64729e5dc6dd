use serde::{Deserialize, Serialize};

use crate::models::Tag;

/// Sort orders offered by the post listing endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostOrdering {
    #[default]
    #[serde(rename = "-created_at")]
    Latest,
    #[serde(rename = "-published_at")]
    RecentlyPublished,
    #[serde(rename = "-views_count")]
    MostViewed,
    #[serde(rename = "-likes_count")]
    MostLiked,
}

impl PostOrdering {
    pub const ALL: [PostOrdering; 4] = [
        PostOrdering::Latest,
        PostOrdering::RecentlyPublished,
        PostOrdering::MostViewed,
        PostOrdering::MostLiked,
    ];

    /// Value of the `ordering` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Latest => "-created_at",
            Self::RecentlyPublished => "-published_at",
            Self::MostViewed => "-views_count",
            Self::MostLiked => "-likes_count",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Latest => "Latest",
            Self::RecentlyPublished => "Recently published",
            Self::MostViewed => "Most viewed",
            Self::MostLiked => "Most liked",
        }
    }

    /// The following ordering, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|o| *o == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Query parameters accepted by the post listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Tag slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<PostOrdering>,
}

/// `GET /blog/tags/` answers with a bare list, or with a page when the server
/// paginates it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagListResponse {
    Page { results: Vec<Tag> },
    List(Vec<Tag>),
}

impl From<TagListResponse> for Vec<Tag> {
    fn from(response: TagListResponse) -> Self {
        match response {
            TagListResponse::Page { results } => results,
            TagListResponse::List(tags) => tags,
        }
    }
}
