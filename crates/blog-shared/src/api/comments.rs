use serde::{Deserialize, Serialize};

use crate::models::{CommentId, LikeState, PostId};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub post: PostId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<CommentId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Liked,
    Unliked,
}

/// Body returned by the like-toggle endpoints of both posts and comments.
#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub status: LikeStatus,
    pub likes_count: u32,
}

impl From<LikeResponse> for LikeState {
    fn from(resp: LikeResponse) -> Self {
        LikeState {
            is_liked: resp.status == LikeStatus::Liked,
            likes_count: resp.likes_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkStatus {
    Bookmarked,
    Unbookmarked,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarkResponse {
    pub status: BookmarkStatus,
}

impl BookmarkResponse {
    pub fn is_bookmarked(&self) -> bool {
        self.status == BookmarkStatus::Bookmarked
    }
}
