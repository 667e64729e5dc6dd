use std::collections::HashSet;

use blog_shared::{
    thread::{render_rows, validate_content, CommentAction, CommentThread, DraftError, ThreadRow},
    Comment, CommentId, LikeState, PostId, Profile,
};

use crate::api::{ApiError, CommentApi};

/// A request scope. At most one request per scope is in flight; requests on
/// other comments stay available meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingScope {
    Reload,
    NewComment,
    Reply(CommentId),
    Edit(CommentId),
    Delete(CommentId),
    Like(CommentId),
}

impl PendingScope {
    /// Verb phrase for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Reload => "load comments",
            Self::NewComment => "post comment",
            Self::Reply(_) => "post reply",
            Self::Edit(_) => "save comment",
            Self::Delete(_) => "delete comment",
            Self::Like(_) => "like comment",
        }
    }
}

/// Text being composed against an existing comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub target: CommentId,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscussionError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("A request for this comment is already running")]
    Busy,
    #[error("No comment is being edited or replied to")]
    NoDraft,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A comment mutation taken off the UI thread. Built by the `start_*`
/// methods, which also mark its scope pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentRequest {
    Reload,
    Create {
        parent: Option<CommentId>,
        content: String,
    },
    Update {
        id: CommentId,
        content: String,
    },
    Delete(CommentId),
    Like(CommentId),
}

impl CommentRequest {
    pub fn scope(&self) -> PendingScope {
        match *self {
            Self::Reload => PendingScope::Reload,
            Self::Create { parent: None, .. } => PendingScope::NewComment,
            Self::Create {
                parent: Some(id), ..
            } => PendingScope::Reply(id),
            Self::Update { id, .. } => PendingScope::Edit(id),
            Self::Delete(id) => PendingScope::Delete(id),
            Self::Like(id) => PendingScope::Like(id),
        }
    }

    /// Performs the request. A create is followed by a full reload: reply
    /// counts and ordering are computed by the server.
    pub async fn run<A>(self, api: &mut A, post_id: PostId) -> CommentOutcome
    where
        A: CommentApi + ?Sized,
    {
        match self {
            Self::Reload => CommentOutcome::Reloaded(api.list_comments(post_id).await),
            Self::Create { parent, content } => {
                let created = api.create_comment(post_id, &content, parent).await;
                let reloaded = match created {
                    Ok(_) => Some(api.list_comments(post_id).await),
                    Err(_) => None,
                };
                CommentOutcome::Created {
                    parent,
                    created,
                    reloaded,
                }
            }
            Self::Update { id, content } => CommentOutcome::Updated {
                id,
                result: api.update_comment(id, &content).await,
            },
            Self::Delete(id) => CommentOutcome::Deleted {
                id,
                result: api.delete_comment(id).await,
            },
            Self::Like(id) => CommentOutcome::Liked {
                id,
                result: api.toggle_comment_like(id).await,
            },
        }
    }
}

/// What the server answered to a [`CommentRequest`].
#[derive(Debug)]
pub enum CommentOutcome {
    Reloaded(Result<Vec<Comment>, ApiError>),
    Created {
        parent: Option<CommentId>,
        created: Result<Comment, ApiError>,
        reloaded: Option<Result<Vec<Comment>, ApiError>>,
    },
    Updated {
        id: CommentId,
        result: Result<Comment, ApiError>,
    },
    Deleted {
        id: CommentId,
        result: Result<(), ApiError>,
    },
    Liked {
        id: CommentId,
        result: Result<LikeState, ApiError>,
    },
}

impl CommentOutcome {
    pub fn scope(&self) -> PendingScope {
        match *self {
            Self::Reloaded(_) => PendingScope::Reload,
            Self::Created { parent: None, .. } => PendingScope::NewComment,
            Self::Created {
                parent: Some(id), ..
            } => PendingScope::Reply(id),
            Self::Updated { id, .. } => PendingScope::Edit(id),
            Self::Deleted { id, .. } => PendingScope::Delete(id),
            Self::Liked { id, .. } => PendingScope::Like(id),
        }
    }
}

/// Comment thread of the open post plus the UI state wrapped around it.
pub struct Discussion {
    post_id: PostId,
    thread: CommentThread,
    pub new_comment: String,
    editing: Option<Draft>,
    replying: Option<Draft>,
    pending: HashSet<PendingScope>,
}

impl Discussion {
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            thread: CommentThread::default(),
            new_comment: String::new(),
            editing: None,
            replying: None,
            pending: HashSet::new(),
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn thread(&self) -> &CommentThread {
        &self.thread
    }

    pub fn rows<'a>(&'a self, viewer: Option<&Profile>) -> Vec<ThreadRow<'a>> {
        render_rows(&self.thread, viewer)
    }

    pub fn is_pending(&self, scope: PendingScope) -> bool {
        self.pending.contains(&scope)
    }

    /// Whether any request touching `id` is in flight.
    pub fn is_comment_pending(&self, id: CommentId) -> bool {
        self.pending.iter().any(|scope| match *scope {
            PendingScope::Reply(t)
            | PendingScope::Edit(t)
            | PendingScope::Delete(t)
            | PendingScope::Like(t) => t == id,
            PendingScope::Reload | PendingScope::NewComment => false,
        })
    }

    pub fn editing(&self) -> Option<&Draft> {
        self.editing.as_ref()
    }

    pub fn replying(&self) -> Option<&Draft> {
        self.replying.as_ref()
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> {
        self.editing.as_mut().map(|d| &mut d.text)
    }

    pub fn reply_buffer_mut(&mut self) -> Option<&mut String> {
        self.replying.as_mut().map(|d| &mut d.text)
    }

    /// Opens the inline editor on `id`, seeded with its current text.
    pub fn begin_edit(&mut self, id: CommentId) -> bool {
        let Some(comment) = self.thread.find(id) else {
            return false;
        };
        self.editing = Some(Draft {
            target: id,
            text: comment.content.clone(),
        });
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn begin_reply(&mut self, id: CommentId) -> bool {
        if !self.thread.contains(id) {
            return false;
        }
        self.replying = Some(Draft {
            target: id,
            text: String::new(),
        });
        true
    }

    pub fn cancel_reply(&mut self) {
        self.replying = None;
    }

    fn begin(&mut self, scope: PendingScope) -> Result<(), DiscussionError> {
        if !self.pending.insert(scope) {
            return Err(DiscussionError::Busy);
        }
        Ok(())
    }

    fn finish(&mut self, scope: PendingScope) {
        self.pending.remove(&scope);
    }

    fn failed(&self, action: &str, error: ApiError) -> DiscussionError {
        tracing::error!(post_id = self.post_id, action, error = %error, "comment request failed");
        DiscussionError::Api(error)
    }

    fn start_request(&mut self, request: CommentRequest) -> Result<CommentRequest, DiscussionError> {
        self.begin(request.scope())?;
        Ok(request)
    }

    pub fn start_reload(&mut self) -> Result<CommentRequest, DiscussionError> {
        self.start_request(CommentRequest::Reload)
    }

    /// Top-level comment from `new_comment`.
    pub fn start_comment(&mut self) -> Result<CommentRequest, DiscussionError> {
        let content = validate_content(&self.new_comment)?.to_string();
        self.start_request(CommentRequest::Create {
            parent: None,
            content,
        })
    }

    pub fn start_reply(&mut self) -> Result<CommentRequest, DiscussionError> {
        let draft = self.replying.as_ref().ok_or(DiscussionError::NoDraft)?;
        let request = CommentRequest::Create {
            parent: Some(draft.target),
            content: validate_content(&draft.text)?.to_string(),
        };
        self.start_request(request)
    }

    pub fn start_edit(&mut self) -> Result<CommentRequest, DiscussionError> {
        let draft = self.editing.as_ref().ok_or(DiscussionError::NoDraft)?;
        let request = CommentRequest::Update {
            id: draft.target,
            content: validate_content(&draft.text)?.to_string(),
        };
        self.start_request(request)
    }

    pub fn start_delete(&mut self, id: CommentId) -> Result<CommentRequest, DiscussionError> {
        self.start_request(CommentRequest::Delete(id))
    }

    pub fn start_like(&mut self, id: CommentId) -> Result<CommentRequest, DiscussionError> {
        self.start_request(CommentRequest::Like(id))
    }

    /// Routes a row action. Edit and reply only open a composer, so they
    /// yield no request.
    pub fn start(&mut self, action: CommentAction) -> Result<Option<CommentRequest>, DiscussionError> {
        match action {
            CommentAction::Edit(id) => {
                self.begin_edit(id);
                Ok(None)
            }
            CommentAction::Reply(id) => {
                self.begin_reply(id);
                Ok(None)
            }
            CommentAction::Delete(id) => self.start_delete(id).map(Some),
            CommentAction::ToggleLike(id) => self.start_like(id).map(Some),
        }
    }

    /// Folds a finished request back into the thread and releases its scope.
    pub fn complete(&mut self, outcome: CommentOutcome) -> Result<(), DiscussionError> {
        self.finish(outcome.scope());

        match outcome {
            CommentOutcome::Reloaded(result) => {
                let roots = result.map_err(|e| self.failed("reload", e))?;
                self.replace_thread(roots);
                Ok(())
            }
            CommentOutcome::Created {
                parent,
                created,
                reloaded,
            } => {
                let created = created.map_err(|e| self.failed("create comment", e))?;
                match parent {
                    None => self.new_comment.clear(),
                    Some(target) => {
                        if self.replying.as_ref().map(|d| d.target) == Some(target) {
                            self.replying = None;
                        }
                    }
                }
                match reloaded {
                    Some(Ok(roots)) => {
                        self.replace_thread(roots);
                        Ok(())
                    }
                    Some(Err(e)) => {
                        // Keep the new comment visible until a reload succeeds.
                        if !self.thread.contains(created.id) {
                            self.thread.insert_node(created);
                        }
                        Err(self.failed("reload", e))
                    }
                    None => {
                        self.thread.insert_node(created);
                        Ok(())
                    }
                }
            }
            CommentOutcome::Updated { id, result } => {
                let updated = result.map_err(|e| self.failed("edit", e))?;
                self.thread.replace_node(updated);
                if self.editing.as_ref().map(|d| d.target) == Some(id) {
                    self.editing = None;
                }
                Ok(())
            }
            CommentOutcome::Deleted { id, result } => match result {
                Ok(()) | Err(ApiError::NotFound) => {
                    self.thread.remove_node(id);
                    self.drop_stale_drafts();
                    Ok(())
                }
                Err(e) => Err(self.failed("delete", e)),
            },
            CommentOutcome::Liked { id, result } => {
                let like = result.map_err(|e| self.failed("like", e))?;
                self.thread.apply_like(id, like);
                Ok(())
            }
        }
    }

    fn replace_thread(&mut self, roots: Vec<Comment>) {
        self.thread = CommentThread::new(roots);
        self.drop_stale_drafts();
        tracing::debug!(
            post_id = self.post_id,
            comments = self.thread.node_count(),
            "comments loaded"
        );
    }

    fn drop_stale_drafts(&mut self) {
        if let Some(draft) = &self.editing {
            if !self.thread.contains(draft.target) {
                self.editing = None;
            }
        }
        if let Some(draft) = &self.replying {
            if !self.thread.contains(draft.target) {
                self.replying = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use blog_shared::{Author, Comment, LikeState};
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    /// In-memory stand-in for the blog API. Comments are stored flat and
    /// nested on every listing, the way the server does it.
    #[derive(Default)]
    struct FakeServer {
        comments: Vec<Comment>,
        liked: HashSet<CommentId>,
        next_id: CommentId,
        fail_next: Option<ApiError>,
        calls: usize,
    }

    impl FakeServer {
        fn with_comments(comments: Vec<Comment>) -> Self {
            let next_id = comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
            Self {
                comments,
                next_id,
                ..Default::default()
            }
        }

        fn fail_with(&mut self, error: ApiError) {
            self.fail_next = Some(error);
        }

        fn check(&mut self) -> Result<(), ApiError> {
            self.calls += 1;
            match self.fail_next.take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn nest(&self, parent: Option<CommentId>) -> Vec<Comment> {
            self.comments
                .iter()
                .filter(|c| c.parent_id == parent)
                .map(|c| Comment {
                    replies: self.nest(Some(c.id)),
                    ..c.clone()
                })
                .collect()
        }
    }

    #[async_trait]
    impl CommentApi for FakeServer {
        async fn list_comments(&mut self, _post_id: PostId) -> Result<Vec<Comment>, ApiError> {
            self.check()?;
            Ok(self.nest(None))
        }

        async fn create_comment(
            &mut self,
            _post_id: PostId,
            content: &str,
            parent: Option<CommentId>,
        ) -> Result<Comment, ApiError> {
            self.check()?;
            let mut created = comment(self.next_id, parent);
            created.content = content.to_string();
            created.can_edit = true;
            created.can_delete = true;
            self.next_id += 1;
            self.comments.push(created.clone());
            Ok(created)
        }

        async fn update_comment(
            &mut self,
            comment_id: CommentId,
            content: &str,
        ) -> Result<Comment, ApiError> {
            self.check()?;
            let stored = self
                .comments
                .iter_mut()
                .find(|c| c.id == comment_id)
                .ok_or(ApiError::NotFound)?;
            stored.content = content.to_string();
            stored.updated_at = stored.created_at + Duration::minutes(1);
            Ok(stored.clone())
        }

        async fn delete_comment(&mut self, comment_id: CommentId) -> Result<(), ApiError> {
            self.check()?;
            let before = self.comments.len();
            self.comments.retain(|c| c.id != comment_id);
            if self.comments.len() == before {
                return Err(ApiError::NotFound);
            }
            Ok(())
        }

        async fn toggle_comment_like(
            &mut self,
            comment_id: CommentId,
        ) -> Result<LikeState, ApiError> {
            self.check()?;
            let liked = !self.liked.remove(&comment_id);
            if liked {
                self.liked.insert(comment_id);
            }
            let stored = self
                .comments
                .iter_mut()
                .find(|c| c.id == comment_id)
                .ok_or(ApiError::NotFound)?;
            // Someone else liked it too while we were looking.
            stored.likes_count = if liked { stored.likes_count + 2 } else { stored.likes_count - 1 };
            stored.is_liked = liked;
            Ok(stored.like_state())
        }
    }

    fn comment(id: CommentId, parent_id: Option<CommentId>) -> Comment {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Comment {
            id,
            author: Author {
                id: 1,
                username: "ada".into(),
                profile_picture: None,
            },
            content: format!("comment {id}"),
            parent_id,
            replies: Vec::new(),
            created_at: created,
            updated_at: created,
            can_edit: true,
            can_delete: true,
            is_liked: false,
            likes_count: 0,
        }
    }

    async fn loaded(server: &mut FakeServer) -> Discussion {
        let mut discussion = Discussion::new(1);
        let request = discussion.start_reload().unwrap();
        settle(&mut discussion, server, request).await.unwrap();
        discussion
    }

    async fn settle<A: CommentApi>(
        discussion: &mut Discussion,
        api: &mut A,
        request: CommentRequest,
    ) -> Result<(), DiscussionError> {
        let outcome = request.run(api, discussion.post_id()).await;
        discussion.complete(outcome)
    }

    #[tokio::test]
    async fn reply_then_reload_nests_under_parent() {
        let mut server = FakeServer::with_comments(vec![comment(1, None)]);
        let mut discussion = loaded(&mut server).await;

        assert!(discussion.begin_reply(1));
        discussion.reply_buffer_mut().unwrap().push_str("hi");
        let request = discussion.start_reply().unwrap();
        assert!(discussion.is_pending(PendingScope::Reply(1)));
        settle(&mut discussion, &mut server, request).await.unwrap();

        let parent = discussion.thread().find(1).unwrap();
        assert_eq!(parent.replies.len(), 1);
        assert_eq!(parent.replies[0].content, "hi");
        assert_eq!(parent.replies[0].parent_id, Some(1));
        assert!(discussion.replying().is_none());
        assert!(!discussion.is_pending(PendingScope::Reply(1)));
    }

    #[tokio::test]
    async fn top_level_comment_clears_buffer() {
        let mut server = FakeServer::with_comments(vec![comment(1, None)]);
        let mut discussion = loaded(&mut server).await;

        discussion.new_comment = "new thought".into();
        let request = discussion.start_comment().unwrap();
        settle(&mut discussion, &mut server, request).await.unwrap();

        assert!(discussion.new_comment.is_empty());
        assert!(!discussion.is_pending(PendingScope::NewComment));
        let roots = discussion.thread().roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[1].content, "new thought");
        assert_eq!(roots[1].parent_id, None);
    }

    #[tokio::test]
    async fn blank_content_never_reaches_the_server() {
        let mut server = FakeServer::with_comments(vec![comment(1, None)]);
        let mut discussion = loaded(&mut server).await;
        let calls = server.calls;

        discussion.new_comment = "   ".into();
        let err = discussion.start_comment().unwrap_err();

        assert!(matches!(err, DiscussionError::Draft(DraftError::Empty)));
        assert!(!discussion.is_pending(PendingScope::NewComment));
        assert_eq!(server.calls, calls);
    }

    #[tokio::test]
    async fn failed_reply_keeps_draft_and_clears_pending() {
        let mut server = FakeServer::with_comments(vec![comment(1, None)]);
        let mut discussion = loaded(&mut server).await;

        discussion.begin_reply(1);
        discussion.reply_buffer_mut().unwrap().push_str("hello");
        server.fail_with(ApiError::Server("500: boom".into()));

        let request = discussion.start_reply().unwrap();
        let err = settle(&mut discussion, &mut server, request).await.unwrap_err();

        assert!(matches!(err, DiscussionError::Api(ApiError::Server(_))));
        assert_eq!(discussion.replying().map(|d| d.text.as_str()), Some("hello"));
        assert!(!discussion.is_comment_pending(1));
        assert_eq!(discussion.thread().node_count(), 1);
    }

    #[tokio::test]
    async fn edit_patches_node_and_keeps_replies() {
        let mut server =
            FakeServer::with_comments(vec![comment(1, None), comment(2, Some(1)), comment(3, Some(2))]);
        let mut discussion = loaded(&mut server).await;

        assert!(discussion.begin_edit(2));
        assert_eq!(discussion.editing().unwrap().text, "comment 2");
        let buffer = discussion.edit_buffer_mut().unwrap();
        buffer.clear();
        buffer.push_str("rewritten");
        let request = discussion.start_edit().unwrap();
        settle(&mut discussion, &mut server, request).await.unwrap();

        let edited = discussion.thread().find(2).unwrap();
        assert_eq!(edited.content, "rewritten");
        assert!(edited.is_edited());
        assert_eq!(edited.replies.len(), 1);
        assert_eq!(edited.replies[0].id, 3);
        assert!(discussion.editing().is_none());
    }

    #[tokio::test]
    async fn delete_removes_subtree_and_stale_drafts() {
        let mut server =
            FakeServer::with_comments(vec![comment(1, None), comment(2, Some(1)), comment(3, Some(2))]);
        let mut discussion = loaded(&mut server).await;
        discussion.begin_reply(3);

        let request = discussion.start_delete(2).unwrap();
        settle(&mut discussion, &mut server, request).await.unwrap();

        assert_eq!(discussion.thread().node_count(), 1);
        assert!(discussion.replying().is_none());
    }

    #[tokio::test]
    async fn delete_of_vanished_comment_is_silent() {
        let mut server = FakeServer::with_comments(vec![comment(1, None), comment(2, None)]);
        let mut discussion = loaded(&mut server).await;
        server.comments.retain(|c| c.id != 2);

        let request = discussion.start_delete(2).unwrap();
        settle(&mut discussion, &mut server, request).await.unwrap();

        assert!(!discussion.thread().contains(2));
        assert!(discussion.thread().contains(1));
    }

    #[tokio::test]
    async fn like_uses_server_count() {
        let mut server =
            FakeServer::with_comments(vec![comment(1, None), comment(2, Some(1)), comment(3, Some(1))]);
        let mut discussion = loaded(&mut server).await;

        let request = discussion.start_like(2).unwrap();
        settle(&mut discussion, &mut server, request).await.unwrap();

        let liked = discussion.thread().find(2).unwrap();
        assert!(liked.is_liked);
        assert_eq!(liked.likes_count, 2);
        assert_eq!(discussion.thread().find(1).unwrap().likes_count, 0);
        assert_eq!(discussion.thread().find(3).unwrap().likes_count, 0);
    }

    #[tokio::test]
    async fn failed_like_leaves_tree_untouched() {
        let mut server = FakeServer::with_comments(vec![comment(1, None)]);
        let mut discussion = loaded(&mut server).await;
        let before = discussion.thread().clone();
        server.fail_with(ApiError::Forbidden);

        let request = discussion.start_like(1).unwrap();
        assert!(settle(&mut discussion, &mut server, request).await.is_err());

        assert_eq!(discussion.thread(), &before);
        assert!(!discussion.is_pending(PendingScope::Like(1)));
    }

    #[tokio::test]
    async fn failed_reload_after_create_splices_locally() {
        struct FlakyList(FakeServer);

        #[async_trait]
        impl CommentApi for FlakyList {
            async fn list_comments(&mut self, _post_id: PostId) -> Result<Vec<Comment>, ApiError> {
                Err(ApiError::Server("503: unavailable".into()))
            }
            async fn create_comment(
                &mut self,
                post_id: PostId,
                content: &str,
                parent: Option<CommentId>,
            ) -> Result<Comment, ApiError> {
                self.0.create_comment(post_id, content, parent).await
            }
            async fn update_comment(&mut self, id: CommentId, content: &str) -> Result<Comment, ApiError> {
                self.0.update_comment(id, content).await
            }
            async fn delete_comment(&mut self, id: CommentId) -> Result<(), ApiError> {
                self.0.delete_comment(id).await
            }
            async fn toggle_comment_like(&mut self, id: CommentId) -> Result<LikeState, ApiError> {
                self.0.toggle_comment_like(id).await
            }
        }

        let mut server = FakeServer::with_comments(vec![comment(1, None)]);
        let mut discussion = loaded(&mut server).await;
        let mut flaky = FlakyList(server);

        discussion.begin_reply(1);
        discussion.reply_buffer_mut().unwrap().push_str("still here");
        let request = discussion.start_reply().unwrap();
        assert!(settle(&mut discussion, &mut flaky, request).await.is_err());

        let parent = discussion.thread().find(1).unwrap();
        assert_eq!(parent.replies.len(), 1);
        assert_eq!(parent.replies[0].content, "still here");
        assert!(discussion.replying().is_none());
        assert!(!discussion.is_pending(PendingScope::Reply(1)));
    }

    #[tokio::test]
    async fn start_routes_row_actions() {
        let mut server = FakeServer::with_comments(vec![comment(1, None)]);
        let mut discussion = loaded(&mut server).await;

        assert_eq!(discussion.start(CommentAction::Reply(1)).unwrap(), None);
        assert_eq!(discussion.replying().map(|d| d.target), Some(1));

        assert_eq!(discussion.start(CommentAction::Edit(1)).unwrap(), None);
        assert_eq!(discussion.editing().map(|d| d.target), Some(1));

        let request = discussion.start(CommentAction::ToggleLike(1)).unwrap().unwrap();
        assert_eq!(request, CommentRequest::Like(1));
        settle(&mut discussion, &mut server, request).await.unwrap();
        assert!(discussion.thread().find(1).unwrap().is_liked);

        let request = discussion.start(CommentAction::Delete(1)).unwrap().unwrap();
        settle(&mut discussion, &mut server, request).await.unwrap();
        assert!(discussion.thread().is_empty());
        assert!(discussion.editing().is_none());
        assert!(discussion.replying().is_none());
    }

    #[tokio::test]
    async fn requests_on_other_comments_run_while_one_is_in_flight() {
        let mut server = FakeServer::with_comments(vec![comment(1, None), comment(2, None)]);
        let mut discussion = loaded(&mut server).await;

        let like_one = discussion.start_like(1).unwrap();
        let like_two = discussion.start_like(2).unwrap();
        discussion.begin_reply(1);
        discussion.reply_buffer_mut().unwrap().push_str("meanwhile");
        let reply = discussion.start_reply().unwrap();

        assert!(matches!(discussion.start_like(1), Err(DiscussionError::Busy)));
        assert!(discussion.is_comment_pending(1));
        assert!(discussion.is_comment_pending(2));

        // Answers arrive out of order.
        settle(&mut discussion, &mut server, like_two).await.unwrap();
        assert!(discussion.is_comment_pending(1));
        assert!(!discussion.is_comment_pending(2));
        settle(&mut discussion, &mut server, reply).await.unwrap();
        settle(&mut discussion, &mut server, like_one).await.unwrap();

        assert!(!discussion.is_comment_pending(1));
        assert!(discussion.thread().find(1).unwrap().is_liked);
        assert!(discussion.thread().find(2).unwrap().is_liked);
        assert_eq!(discussion.thread().find(1).unwrap().replies.len(), 1);
    }

    #[tokio::test]
    async fn reply_outcome_keeps_a_newer_draft_elsewhere() {
        let mut server = FakeServer::with_comments(vec![comment(1, None), comment(2, None)]);
        let mut discussion = loaded(&mut server).await;

        discussion.begin_reply(1);
        discussion.reply_buffer_mut().unwrap().push_str("first");
        let request = discussion.start_reply().unwrap();
        discussion.begin_reply(2);
        discussion.reply_buffer_mut().unwrap().push_str("second");

        settle(&mut discussion, &mut server, request).await.unwrap();

        assert_eq!(discussion.replying().map(|d| d.target), Some(2));
        assert_eq!(discussion.replying().map(|d| d.text.as_str()), Some("second"));
    }

    #[test]
    fn second_request_in_same_scope_is_refused() {
        let mut discussion = Discussion::new(1);

        discussion.begin(PendingScope::Like(4)).unwrap();
        assert!(matches!(
            discussion.begin(PendingScope::Like(4)),
            Err(DiscussionError::Busy)
        ));
        discussion.begin(PendingScope::Like(5)).unwrap();
        assert!(discussion.is_comment_pending(4));

        discussion.finish(PendingScope::Like(4));
        assert!(!discussion.is_comment_pending(4));
        assert!(discussion.is_comment_pending(5));
    }

    #[test]
    fn request_and_outcome_share_a_scope() {
        let request = CommentRequest::Create {
            parent: Some(7),
            content: "x".into(),
        };
        assert_eq!(request.scope(), PendingScope::Reply(7));

        let outcome = CommentOutcome::Created {
            parent: Some(7),
            created: Err(ApiError::Forbidden),
            reloaded: None,
        };
        assert_eq!(outcome.scope(), request.scope());
        assert_eq!(
            CommentRequest::Update {
                id: 3,
                content: "x".into()
            }
            .scope(),
            PendingScope::Edit(3)
        );
    }

    #[test]
    fn drafts_need_an_existing_target() {
        let mut discussion = Discussion::new(1);
        assert!(!discussion.begin_edit(1));
        assert!(!discussion.begin_reply(1));
    }
}
