use super::CommentThread;
use crate::models::{Comment, CommentId, Profile};

/// What the viewer may do on a single comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    pub can_reply: bool,
    pub can_like: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Affordances {
    /// Anonymous viewers get a read-only thread. Edit and delete also need
    /// the server's per-comment grant.
    pub fn for_comment(comment: &Comment, viewer: Option<&Profile>) -> Self {
        let logged_in = viewer.is_some();
        Self {
            can_reply: logged_in,
            can_like: logged_in,
            can_edit: logged_in && comment.can_edit,
            can_delete: logged_in && comment.can_delete,
        }
    }
}

/// A row-level action, addressed by comment id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentAction {
    Edit(CommentId),
    Delete(CommentId),
    Reply(CommentId),
    ToggleLike(CommentId),
}

impl CommentAction {
    pub fn target(&self) -> CommentId {
        match *self {
            Self::Edit(id) | Self::Delete(id) | Self::Reply(id) | Self::ToggleLike(id) => id,
        }
    }
}

/// One display line of a flattened thread.
#[derive(Debug, Clone, Copy)]
pub struct ThreadRow<'a> {
    pub comment: &'a Comment,
    pub depth: usize,
    pub affordances: Affordances,
}

impl<'a> ThreadRow<'a> {
    pub fn id(&self) -> CommentId {
        self.comment.id
    }

    pub fn is_edited(&self) -> bool {
        self.comment.is_edited()
    }

    /// Builds `action` for this row if the row allows it.
    pub fn action(&self, kind: ActionKind) -> Option<CommentAction> {
        let id = self.comment.id;
        let allowed = match kind {
            ActionKind::Edit => self.affordances.can_edit,
            ActionKind::Delete => self.affordances.can_delete,
            ActionKind::Reply => self.affordances.can_reply,
            ActionKind::ToggleLike => self.affordances.can_like,
        };
        allowed.then(|| kind.for_comment(id))
    }

    /// All actions available on the row, in menu order.
    pub fn actions(&self) -> Vec<CommentAction> {
        ActionKind::ALL
            .iter()
            .filter_map(|kind| self.action(*kind))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Edit,
    Delete,
    Reply,
    ToggleLike,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::ToggleLike,
        ActionKind::Reply,
        ActionKind::Edit,
        ActionKind::Delete,
    ];

    pub fn for_comment(self, id: CommentId) -> CommentAction {
        match self {
            Self::Edit => CommentAction::Edit(id),
            Self::Delete => CommentAction::Delete(id),
            Self::Reply => CommentAction::Reply(id),
            Self::ToggleLike => CommentAction::ToggleLike(id),
        }
    }
}

/// Flattens `thread` into display rows: each comment before its replies,
/// replies in server order, roots at depth 0.
pub fn render_rows<'a>(thread: &'a CommentThread, viewer: Option<&Profile>) -> Vec<ThreadRow<'a>> {
    thread
        .iter()
        .map(|(comment, depth)| ThreadRow {
            comment,
            depth,
            affordances: Affordances::for_comment(comment, viewer),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::fixtures::{comment, sample_thread, CommentExt};

    fn viewer() -> Profile {
        Profile {
            username: "user1".into(),
            email: "user1@example.com".into(),
            bio: None,
            profile_picture: None,
        }
    }

    #[test]
    fn rows_follow_preorder_with_depth() {
        let thread = CommentThread::new(vec![comment(1, None).with_replies(vec![
            comment(2, Some(1)),
            comment(3, Some(1)).with_replies(vec![comment(4, Some(3))]),
        ])]);

        let rows = render_rows(&thread, None);

        let ids: Vec<CommentId> = rows.iter().map(|r| r.id()).collect();
        let depths: Vec<usize> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(depths, vec![0, 1, 1, 2]);
    }

    #[test]
    fn anonymous_viewer_gets_no_actions() {
        let mut thread = sample_thread();
        thread.update_node(1, |c| {
            c.can_edit = true;
            c.can_delete = true;
        });

        let rows = render_rows(&thread, None);

        assert!(rows.iter().all(|r| r.actions().is_empty()));
    }

    #[test]
    fn edit_and_delete_follow_server_flags() {
        let mut thread = sample_thread();
        thread.update_node(4, |c| c.can_edit = true);
        thread.update_node(5, |c| c.can_delete = true);
        let viewer = viewer();

        let rows = render_rows(&thread, Some(&viewer));
        let row = |id| rows.iter().find(|r| r.id() == id).unwrap();

        assert_eq!(
            row(4).actions(),
            vec![
                CommentAction::ToggleLike(4),
                CommentAction::Reply(4),
                CommentAction::Edit(4),
            ]
        );
        assert_eq!(row(5).action(ActionKind::Edit), None);
        assert_eq!(row(5).action(ActionKind::Delete), Some(CommentAction::Delete(5)));
        assert_eq!(row(2).action(ActionKind::Reply), Some(CommentAction::Reply(2)));
        assert_eq!(row(2).action(ActionKind::Delete), None);
    }

    #[test]
    fn edited_marker_tracks_timestamps() {
        let mut thread = sample_thread();
        thread.update_node(2, |c| c.updated_at = c.created_at + chrono::Duration::minutes(5));

        let rows = render_rows(&thread, None);

        let edited: Vec<CommentId> = rows.iter().filter(|r| r.is_edited()).map(|r| r.id()).collect();
        assert_eq!(edited, vec![2]);
    }

    #[test]
    fn action_target_round_trips_id() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.for_comment(17).target(), 17);
        }
    }
}
