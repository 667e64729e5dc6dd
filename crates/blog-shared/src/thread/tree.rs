use crate::models::{Comment, CommentId, LikeState};

/// The comment tree of a single post.
///
/// Lookups are linear in the number of nodes. Threads are discussion sized,
/// so no index is kept alongside the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentThread {
    roots: Vec<Comment>,
}

impl CommentThread {
    pub fn new(roots: Vec<Comment>) -> Self {
        Self { roots }
    }

    /// Top-level comments in server order.
    pub fn roots(&self) -> &[Comment] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<Comment> {
        self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of comments at every depth.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Depth-first pre-order walk yielding each comment with its depth.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.roots.iter().rev().map(|c| (c, 0)).collect(),
        }
    }

    pub fn find(&self, id: CommentId) -> Option<&Comment> {
        self.iter().map(|(c, _)| c).find(|c| c.id == id)
    }

    pub fn contains(&self, id: CommentId) -> bool {
        self.find(id).is_some()
    }

    pub fn find_mut(&mut self, id: CommentId) -> Option<&mut Comment> {
        let mut stack: Vec<&mut Comment> = self.roots.iter_mut().rev().collect();
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.replies.iter_mut().rev());
        }
        None
    }

    /// Applies `updater` to the comment with `id`, wherever it sits.
    ///
    /// Returns `false` without touching the tree when no such comment exists;
    /// it may have been removed by someone else since the last load.
    pub fn update_node<F>(&mut self, id: CommentId, updater: F) -> bool
    where
        F: FnOnce(&mut Comment),
    {
        match self.find_mut(id) {
            Some(node) => {
                updater(node);
                true
            }
            None => false,
        }
    }

    /// Swaps in a server copy of a comment. The local replies are kept, since
    /// single-comment responses do not carry a complete subtree.
    pub fn replace_node(&mut self, updated: Comment) -> bool {
        let id = updated.id;
        self.update_node(id, move |node| {
            let replies = std::mem::take(&mut node.replies);
            *node = Comment { replies, ..updated };
        })
    }

    /// Detaches the comment with `id` and its whole subtree.
    pub fn remove_node(&mut self, id: CommentId) -> Option<Comment> {
        let mut stack: Vec<&mut Vec<Comment>> = vec![&mut self.roots];
        while let Some(siblings) = stack.pop() {
            if let Some(pos) = siblings.iter().position(|c| c.id == id) {
                return Some(siblings.remove(pos));
            }
            stack.extend(siblings.iter_mut().map(|c| &mut c.replies));
        }
        None
    }

    /// Records the server-reported like state of one comment. Nothing but
    /// `is_liked` and `likes_count` of that comment changes.
    pub fn apply_like(&mut self, id: CommentId, like: LikeState) -> bool {
        self.update_node(id, |node| {
            node.is_liked = like.is_liked;
            node.likes_count = like.likes_count;
        })
    }

    /// Appends a comment as the last child of its parent, or as the last root
    /// when it has none. Returns `false` if the parent is not in the tree.
    pub fn insert_node(&mut self, comment: Comment) -> bool {
        match comment.parent_id {
            None => {
                self.roots.push(comment);
                true
            }
            Some(parent_id) => match self.find_mut(parent_id) {
                Some(parent) => {
                    parent.replies.push(comment);
                    true
                }
                None => false,
            },
        }
    }
}

impl From<Vec<Comment>> for CommentThread {
    fn from(roots: Vec<Comment>) -> Self {
        Self::new(roots)
    }
}

pub struct Iter<'a> {
    stack: Vec<(&'a Comment, usize)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Comment, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        self.stack
            .extend(node.replies.iter().rev().map(|reply| (reply, depth + 1)));
        Some((node, depth))
    }
}
