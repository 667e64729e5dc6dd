use chrono::{TimeZone, Utc};

use super::CommentThread;
use crate::models::{Author, Comment, CommentId};

pub fn comment(id: CommentId, parent_id: Option<CommentId>) -> Comment {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Comment {
        id,
        author: Author {
            id: id % 3,
            username: format!("user{}", id % 3),
            profile_picture: None,
        },
        content: format!("comment {id}"),
        parent_id,
        replies: Vec::new(),
        created_at: created,
        updated_at: created,
        can_edit: false,
        can_delete: false,
        is_liked: id % 2 == 0,
        likes_count: id as u32,
    }
}

pub trait CommentExt {
    fn with_replies(self, replies: Vec<Comment>) -> Comment;
}

impl CommentExt for Comment {
    fn with_replies(mut self, replies: Vec<Comment>) -> Comment {
        self.replies = replies;
        self
    }
}

/// ```text
/// 1
/// ├── 2
/// ├── 3
/// │   └── 4
/// └── 5
/// 6
/// ```
pub fn sample_thread() -> CommentThread {
    CommentThread::new(vec![
        comment(1, None).with_replies(vec![
            comment(2, Some(1)),
            comment(3, Some(1)).with_replies(vec![comment(4, Some(3))]),
            comment(5, Some(1)),
        ]),
        comment(6, None),
    ])
}
