use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CommentId = i64;

/// Public summary of a comment's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// A comment and, recursively, its replies as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: Author,
    pub content: String,
    #[serde(rename = "parent", default)]
    pub parent_id: Option<CommentId>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_delete: bool,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub likes_count: u32,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// The server bumps `updated_at` on every content change.
    pub fn is_edited(&self) -> bool {
        self.updated_at != self.created_at
    }

    pub fn like_state(&self) -> LikeState {
        LikeState {
            is_liked: self.is_liked,
            likes_count: self.likes_count,
        }
    }
}

/// Viewer's like state on a comment or post, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub is_liked: bool,
    pub likes_count: u32,
}
