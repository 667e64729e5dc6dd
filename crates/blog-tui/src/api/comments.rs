use async_trait::async_trait;
use blog_shared::{
    api::{CreateCommentRequest, LikeResponse, UpdateCommentRequest},
    Comment, CommentId, LikeState, PostId,
};

use super::{ApiClient, ApiError};

/// Remote operations the discussion view needs. Implemented over HTTP by
/// [`ApiClient`]; tests substitute an in-memory server.
#[async_trait]
pub trait CommentApi: Send {
    /// Top-level comments of a post, each with its nested replies.
    async fn list_comments(&mut self, post_id: PostId) -> Result<Vec<Comment>, ApiError>;

    async fn create_comment(
        &mut self,
        post_id: PostId,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<Comment, ApiError>;

    async fn update_comment(
        &mut self,
        comment_id: CommentId,
        content: &str,
    ) -> Result<Comment, ApiError>;

    async fn delete_comment(&mut self, comment_id: CommentId) -> Result<(), ApiError>;

    /// Flips the viewer's like and returns the resulting server state.
    async fn toggle_comment_like(&mut self, comment_id: CommentId) -> Result<LikeState, ApiError>;
}

#[async_trait]
impl CommentApi for ApiClient {
    async fn list_comments(&mut self, post_id: PostId) -> Result<Vec<Comment>, ApiError> {
        let response = self
            .get(&format!("/blog/posts/{}/comments/", post_id))
            .await?;
        self.handle_response(response).await
    }

    async fn create_comment(
        &mut self,
        post_id: PostId,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<Comment, ApiError> {
        let req = CreateCommentRequest {
            post: post_id,
            content: content.to_string(),
            parent,
        };
        let response = self
            .authed_post(&format!("/blog/posts/{}/comments/", post_id), &req)
            .await?;
        self.handle_response(response).await
    }

    async fn update_comment(
        &mut self,
        comment_id: CommentId,
        content: &str,
    ) -> Result<Comment, ApiError> {
        let req = UpdateCommentRequest {
            content: content.to_string(),
        };
        let response = self
            .authed_patch(&format!("/blog/comments/{}/", comment_id), &req)
            .await?;
        self.handle_response(response).await
    }

    async fn delete_comment(&mut self, comment_id: CommentId) -> Result<(), ApiError> {
        let response = self
            .authed_delete(&format!("/blog/comments/{}/", comment_id))
            .await?;
        self.handle_empty_response(response).await
    }

    async fn toggle_comment_like(&mut self, comment_id: CommentId) -> Result<LikeState, ApiError> {
        let response = self
            .authed_post_empty(&format!("/blog/comments/{}/like/", comment_id))
            .await?;
        let like: LikeResponse = self.handle_response(response).await?;
        Ok(like.into())
    }
}
