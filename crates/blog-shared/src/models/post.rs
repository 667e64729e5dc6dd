use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LikeState;

pub type PostId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub author: PostAuthor,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub status: PostStatus,
    #[serde(default)]
    pub views_count: u32,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    /// Estimated reading time in minutes.
    #[serde(default)]
    pub reading_time: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn apply_like(&mut self, like: LikeState) {
        self.is_liked = like.is_liked;
        self.likes_count = like.likes_count;
    }

    /// Text shown in list rows: the excerpt, or the start of the body when
    /// the author left no excerpt.
    pub fn summary(&self, max_chars: usize) -> String {
        let source = if self.excerpt.trim().is_empty() {
            &self.content
        } else {
            &self.excerpt
        };
        source.chars().take(max_chars).collect()
    }
}

/// One page of the paginated post listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPage {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<Post>,
}

impl PostPage {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Tab of the viewer's own post list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Published,
    Drafts,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [
        StatusFilter::All,
        StatusFilter::Published,
        StatusFilter::Drafts,
    ];

    pub fn matches(self, post: &Post) -> bool {
        match self {
            Self::All => true,
            Self::Published => post.status == PostStatus::Published,
            Self::Drafts => post.status == PostStatus::Draft,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Published => "Published",
            Self::Drafts => "Drafts",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Published,
            Self::Published => Self::Drafts,
            Self::Drafts => Self::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_json(excerpt: &str) -> String {
        format!(
            r#"{{
                "id": 10,
                "title": "Hello",
                "slug": "hello",
                "content": "A long body of text",
                "excerpt": "{excerpt}",
                "featured_image": null,
                "author": {{"id": 1, "username": "ada", "email": "ada@example.com", "profile_picture": null}},
                "tags": [{{"id": 1, "name": "Rust", "slug": "rust"}}],
                "status": "published",
                "views_count": 12,
                "likes_count": 2,
                "comments_count": 5,
                "reading_time": 3,
                "is_liked": false,
                "is_bookmarked": true,
                "created_at": "2024-03-01T09:00:00Z",
                "updated_at": "2024-03-01T09:00:00Z",
                "published_at": "2024-03-01T09:30:00Z"
            }}"#
        )
    }

    #[test]
    fn deserializes_post_and_page() {
        let page_json = format!(
            r#"{{"count": 11, "next": "http://x/?page=2", "previous": null, "results": [{}]}}"#,
            post_json("Short intro")
        );
        let page: PostPage = serde_json::from_str(&page_json).unwrap();

        assert!(page.has_next());
        assert!(!page.has_previous());
        let post = &page.results[0];
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.tags[0].slug, "rust");
        assert!(post.is_bookmarked);
    }

    #[test]
    fn summary_falls_back_to_content() {
        let post: Post = serde_json::from_str(&post_json("")).unwrap();
        assert_eq!(post.summary(6), "A long");

        let post: Post = serde_json::from_str(&post_json("Short intro")).unwrap();
        assert_eq!(post.summary(100), "Short intro");
    }

    #[test]
    fn apply_like_uses_server_count() {
        let mut post: Post = serde_json::from_str(&post_json("x")).unwrap();
        post.apply_like(LikeState {
            is_liked: true,
            likes_count: 9,
        });
        assert!(post.is_liked);
        assert_eq!(post.likes_count, 9);
    }

    #[test]
    fn status_filter_splits_drafts_from_published() {
        let published: Post = serde_json::from_str(&post_json("x")).unwrap();
        let draft = Post {
            status: PostStatus::Draft,
            ..published.clone()
        };

        assert!(StatusFilter::All.matches(&published) && StatusFilter::All.matches(&draft));
        assert!(StatusFilter::Published.matches(&published));
        assert!(!StatusFilter::Published.matches(&draft));
        assert!(StatusFilter::Drafts.matches(&draft));
        assert!(!StatusFilter::Drafts.matches(&published));
        assert_eq!(StatusFilter::Drafts.next(), StatusFilter::All);
    }
}
