use std::future::Future;

use anyhow::Result;
use blog_shared::{
    api::{PostListParams, PostOrdering},
    thread::{ActionKind, CommentAction},
    CommentId, LikeState, Post, PostId, PostPage, Profile, StatusFilter, Tag,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::api::{ApiClient, ApiError};
use crate::discussion::{CommentOutcome, CommentRequest, Discussion, PendingScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    VerifyingAuth,
    PostList,
    PostDetail,
    MyPosts,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VimMode {
    Normal,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Username,
    Email,
    Password,
    ConfirmPassword,
}

impl InputField {
    fn next(self, mode: AuthMode) -> Self {
        match (mode, self) {
            (AuthMode::Login, InputField::Username) => InputField::Password,
            (AuthMode::Login, _) => InputField::Username,
            (AuthMode::Register, InputField::Username) => InputField::Email,
            (AuthMode::Register, InputField::Email) => InputField::Password,
            (AuthMode::Register, InputField::Password) => InputField::ConfirmPassword,
            (AuthMode::Register, InputField::ConfirmPassword) => InputField::Username,
        }
    }

    fn prev(self, mode: AuthMode) -> Self {
        match (mode, self) {
            (AuthMode::Login, InputField::Password) => InputField::Username,
            (AuthMode::Login, _) => InputField::Password,
            (AuthMode::Register, InputField::Username) => InputField::ConfirmPassword,
            (AuthMode::Register, InputField::Email) => InputField::Username,
            (AuthMode::Register, InputField::Password) => InputField::Email,
            (AuthMode::Register, InputField::ConfirmPassword) => InputField::Password,
        }
    }
}

/// Text box receiving keystrokes on the post detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composer {
    NewComment,
    Reply,
    Edit,
}

/// Input and the results of background requests, drained by the main loop.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    VerifyAuth,
    OpenPost(PostId),
    SessionVerified(Option<Profile>),
    AuthSuccess(Profile),
    AuthFailed(String),
    ProfileLoaded(Profile),
    PostsLoaded(PostPage),
    TagsLoaded(Vec<Tag>),
    PostLoaded {
        post: Post,
        comments: CommentOutcome,
    },
    CommentsUpdated {
        post_id: PostId,
        outcome: CommentOutcome,
    },
    PostLiked {
        post_id: PostId,
        result: Result<LikeState, ApiError>,
    },
    Bookmarked {
        post_id: PostId,
        result: Result<bool, ApiError>,
    },
    MyPostsLoaded(PostPage),
    PostDeleted {
        post_id: PostId,
        result: Result<(), ApiError>,
    },
    LoadFailed(String),
    Error(String),
}

pub struct App {
    pub api: ApiClient,
    pub view: View,
    pub vim_mode: VimMode,

    // Loading state
    pub loading: bool,
    pub loading_message: String,
    pub error_message: Option<String>,

    // Current user
    pub user: Option<Profile>,

    // Login/Register form
    pub auth_mode: AuthMode,
    pub login_username: String,
    pub login_email: String,
    pub login_password: String,
    pub login_password_confirm: String,
    pub login_field: InputField,

    // Post list
    pub posts: Vec<Post>,
    pub post_count: u64,
    pub page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub selected_post: usize,
    pub searching: bool,
    pub search_query: String,
    pub tags: Vec<Tag>,
    pub tag_filter: Option<Tag>,
    pub ordering: PostOrdering,

    // My posts
    pub my_posts: Vec<Post>,
    pub my_posts_filter: StatusFilter,
    pub selected_my_post: usize,
    pub confirming_post_delete: Option<PostId>,

    // Post detail
    pub current_post: Option<Post>,
    pub discussion: Option<Discussion>,
    pub selected_comment: usize,
    pub composer: Option<Composer>,
    pub confirming_delete: Option<CommentId>,
    return_view: View,
}

impl App {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            view: View::VerifyingAuth,
            vim_mode: VimMode::Normal,
            loading: false,
            loading_message: String::new(),
            error_message: None,
            user: None,
            auth_mode: AuthMode::Login,
            login_username: String::new(),
            login_email: String::new(),
            login_password: String::new(),
            login_password_confirm: String::new(),
            login_field: InputField::Username,
            posts: Vec::new(),
            post_count: 0,
            page: 1,
            has_next_page: false,
            has_prev_page: false,
            selected_post: 0,
            searching: false,
            search_query: String::new(),
            tags: Vec::new(),
            tag_filter: None,
            ordering: PostOrdering::default(),
            my_posts: Vec::new(),
            my_posts_filter: StatusFilter::default(),
            selected_my_post: 0,
            confirming_post_delete: None,
            current_post: None,
            discussion: None,
            selected_comment: 0,
            composer: None,
            confirming_delete: None,
            return_view: View::PostList,
        }
    }

    pub fn set_loading(&mut self, loading: bool, message: &str) {
        self.loading = loading;
        self.loading_message = message.to_string();
    }

    pub fn set_error(&mut self, message: String) {
        tracing::warn!(%message, "showing error");
        self.error_message = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Runs `task` off the UI loop and posts its event back.
    fn spawn<F>(&self, tx: &mpsc::Sender<AppEvent>, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            let event = task.await;
            let _ = tx.send(event).await;
        });
    }

    /// The client drops its session when the server rejects the token or a
    /// refresh fails. Mirror that here so the UI stops offering actions that
    /// need a login.
    fn sync_session(&mut self) {
        if self.user.is_none() || self.api.is_authenticated() {
            return;
        }

        tracing::info!("session ended, continuing anonymously");
        self.user = None;
        if let Some(composer) = self.composer {
            self.cancel_composer(composer);
        }
        self.confirming_delete = None;
        self.confirming_post_delete = None;
        if matches!(self.view, View::MyPosts | View::Profile) {
            self.view = View::PostList;
        }
        if self.return_view == View::MyPosts {
            self.return_view = View::PostList;
        }
        self.set_error("Session expired, log in again".to_string());
    }

    /// Applies one event; returns true if the app should quit.
    pub fn handle_event(&mut self, event: AppEvent, tx: &mpsc::Sender<AppEvent>) -> Result<bool> {
        match event {
            AppEvent::Key(key) => return self.handle_key(key, tx),
            AppEvent::Tick => {}
            AppEvent::VerifyAuth => self.verify_auth(tx),
            AppEvent::OpenPost(post_id) => self.open_post(post_id, tx),
            AppEvent::SessionVerified(profile) => self.on_session_verified(profile, tx),
            AppEvent::AuthSuccess(profile) => self.on_auth_success(profile, tx),
            AppEvent::AuthFailed(msg) => self.on_auth_failed(msg),
            AppEvent::ProfileLoaded(profile) => {
                if self.user.is_some() {
                    self.user = Some(profile);
                }
            }
            AppEvent::PostsLoaded(page) => self.on_posts_loaded(page),
            AppEvent::TagsLoaded(tags) => self.tags = tags,
            AppEvent::PostLoaded { post, comments } => self.on_post_loaded(post, comments),
            AppEvent::CommentsUpdated { post_id, outcome } => {
                self.on_comments_updated(post_id, outcome)
            }
            AppEvent::PostLiked { post_id, result } => match result {
                Ok(like) => self.update_post(post_id, |post| post.apply_like(like)),
                Err(e) => self.set_error(format!("Failed to like post: {}", e)),
            },
            AppEvent::Bookmarked { post_id, result } => match result {
                Ok(bookmarked) => self.update_post(post_id, |post| post.is_bookmarked = bookmarked),
                Err(e) => self.set_error(format!("Failed to bookmark post: {}", e)),
            },
            AppEvent::MyPostsLoaded(page) => {
                self.set_loading(false, "");
                self.my_posts = page.results;
                self.clamp_my_post_selection();
            }
            AppEvent::PostDeleted { post_id, result } => self.on_post_deleted(post_id, result),
            AppEvent::LoadFailed(msg) => {
                self.set_loading(false, "");
                self.set_error(msg);
            }
            AppEvent::Error(msg) => self.set_error(msg),
        }

        self.sync_session();
        Ok(false)
    }

    /// Handle key events, returns true if app should quit
    pub fn handle_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) -> Result<bool> {
        // Clear error on any key press
        if self.error_message.is_some() && key.code != KeyCode::Esc {
            self.clear_error();
        }
        self.sync_session();

        // Global quit with Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }

        match self.view {
            View::Login => self.handle_login_key(key, tx),
            View::VerifyingAuth => Ok(false), // No input during verification
            View::PostList => self.handle_post_list_key(key, tx),
            View::PostDetail => self.handle_post_detail_key(key, tx),
            View::MyPosts => self.handle_my_posts_key(key, tx),
            View::Profile => self.handle_profile_key(key),
        }
    }

    // ============ Login ============

    fn handle_login_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) -> Result<bool> {
        if self.loading {
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') if self.vim_mode == VimMode::Normal => return Ok(true),
            KeyCode::Esc => {
                if self.vim_mode == VimMode::Insert {
                    self.vim_mode = VimMode::Normal;
                } else {
                    self.view = View::PostList;
                }
            }
            KeyCode::Char('i') if self.vim_mode == VimMode::Normal => {
                self.vim_mode = VimMode::Insert;
            }
            // Toggle between Login and Register modes
            KeyCode::Char('r') if self.vim_mode == VimMode::Normal => {
                self.auth_mode = AuthMode::Register;
                self.login_field = InputField::Username;
            }
            KeyCode::Char('l') if self.vim_mode == VimMode::Normal => {
                self.auth_mode = AuthMode::Login;
                self.login_field = InputField::Username;
            }
            KeyCode::Tab => {
                self.login_field = self.login_field.next(self.auth_mode);
            }
            KeyCode::BackTab => {
                self.login_field = self.login_field.prev(self.auth_mode);
            }
            KeyCode::Char('j') | KeyCode::Down if self.vim_mode == VimMode::Normal => {
                self.login_field = self.login_field.next(self.auth_mode);
            }
            KeyCode::Char('k') | KeyCode::Up if self.vim_mode == VimMode::Normal => {
                self.login_field = self.login_field.prev(self.auth_mode);
            }
            KeyCode::Enter => match self.auth_mode {
                AuthMode::Login => {
                    if !self.login_username.is_empty() && !self.login_password.is_empty() {
                        self.do_login(tx);
                    }
                }
                AuthMode::Register => {
                    if !self.login_username.is_empty()
                        && !self.login_email.is_empty()
                        && !self.login_password.is_empty()
                    {
                        self.do_register(tx);
                    }
                }
            },
            KeyCode::Char(c) if self.vim_mode == VimMode::Insert => {
                self.login_buffer_mut().push(c);
            }
            KeyCode::Backspace if self.vim_mode == VimMode::Insert => {
                self.login_buffer_mut().pop();
            }
            _ => {}
        }

        Ok(false)
    }

    fn login_buffer_mut(&mut self) -> &mut String {
        match self.login_field {
            InputField::Username => &mut self.login_username,
            InputField::Email => &mut self.login_email,
            InputField::Password => &mut self.login_password,
            InputField::ConfirmPassword => &mut self.login_password_confirm,
        }
    }

    fn do_login(&mut self, tx: &mpsc::Sender<AppEvent>) {
        self.set_loading(true, "Logging in...");

        let api = self.api.clone();
        let username = self.login_username.clone();
        let password = self.login_password.clone();
        self.spawn(tx, async move {
            match api.login(&username, &password).await {
                Ok(user) => AppEvent::AuthSuccess(user),
                Err(e) => AppEvent::AuthFailed(e.to_string()),
            }
        });
    }

    fn do_register(&mut self, tx: &mpsc::Sender<AppEvent>) {
        if self.login_password != self.login_password_confirm {
            self.set_error("Passwords do not match".to_string());
            return;
        }

        self.set_loading(true, "Registering...");

        let api = self.api.clone();
        let username = self.login_username.clone();
        let email = self.login_email.clone();
        let password = self.login_password.clone();
        let confirm = self.login_password_confirm.clone();
        self.spawn(tx, async move {
            let result = match api.register(&username, &email, &password, &confirm).await {
                Ok(()) => api.login(&username, &password).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(user) => AppEvent::AuthSuccess(user),
                Err(e) => AppEvent::LoadFailed(format!("Registration failed: {}", e)),
            }
        });
    }

    /// Restores a stored session, then shows the post list. Anonymous users
    /// browse read-only.
    pub fn verify_auth(&mut self, tx: &mpsc::Sender<AppEvent>) {
        if !self.api.is_authenticated() {
            self.on_session_verified(None, tx);
            return;
        }

        self.set_loading(true, "Verifying authentication...");
        let api = self.api.clone();
        self.spawn(tx, async move {
            match api.profile().await {
                Ok(user) => AppEvent::SessionVerified(Some(user)),
                Err(e) => {
                    // Token invalid, continue anonymously
                    tracing::info!(error = %e, "stored session rejected");
                    if let Err(e) = api.logout().await {
                        tracing::warn!(error = %e, "could not clear rejected session");
                    }
                    AppEvent::SessionVerified(None)
                }
            }
        });
    }

    fn on_session_verified(&mut self, user: Option<Profile>, tx: &mpsc::Sender<AppEvent>) {
        self.set_loading(false, "");
        self.user = user;
        // A deep-linked post may already be showing.
        if self.view == View::VerifyingAuth {
            self.view = View::PostList;
        }
        self.load_posts(tx);
        self.load_tags(tx);
    }

    fn on_auth_success(&mut self, user: Profile, tx: &mpsc::Sender<AppEvent>) {
        tracing::info!(username = %user.username, "session started");
        self.set_loading(false, "");
        self.user = Some(user);
        self.view = View::PostList;
        self.vim_mode = VimMode::Normal;
        self.login_password.clear();
        self.login_password_confirm.clear();
        self.load_posts(tx);
    }

    fn on_auth_failed(&mut self, msg: String) {
        self.set_loading(false, "");
        self.set_error(format!("Login failed: {}", msg));
        self.login_password.clear();
    }

    fn do_logout(&mut self, tx: &mpsc::Sender<AppEvent>) {
        self.user = None;
        self.my_posts.clear();
        self.set_loading(true, "Logging out...");

        let api = self.api.clone();
        let params = self.post_params();
        self.spawn(tx, async move {
            if let Err(e) = api.logout().await {
                tracing::warn!(error = %e, "logout cleanup failed");
            }
            match api.list_posts(&params).await {
                Ok(page) => AppEvent::PostsLoaded(page),
                Err(e) => AppEvent::LoadFailed(format!("Failed to load posts: {}", e)),
            }
        });
    }

    // ============ Post list ============

    fn handle_post_list_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) -> Result<bool> {
        if self.loading {
            return Ok(false);
        }

        if self.searching {
            match key.code {
                KeyCode::Esc => {
                    self.searching = false;
                    self.vim_mode = VimMode::Normal;
                }
                KeyCode::Enter => {
                    self.searching = false;
                    self.vim_mode = VimMode::Normal;
                    self.page = 1;
                    self.load_posts(tx);
                }
                KeyCode::Char(c) => self.search_query.push(c),
                KeyCode::Backspace => {
                    self.search_query.pop();
                }
                _ => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_post < self.posts.len().saturating_sub(1) {
                    self.selected_post += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.selected_post > 0 {
                    self.selected_post -= 1;
                }
            }
            KeyCode::Char('n') if self.has_next_page => {
                self.page += 1;
                self.load_posts(tx);
            }
            KeyCode::Char('p') if self.has_prev_page => {
                self.page = self.page.saturating_sub(1).max(1);
                self.load_posts(tx);
            }
            KeyCode::Char('/') => {
                self.searching = true;
                self.vim_mode = VimMode::Insert;
            }
            KeyCode::Char('t') => {
                self.tag_filter = self.next_tag();
                self.page = 1;
                self.load_posts(tx);
            }
            KeyCode::Char('o') => {
                self.ordering = self.ordering.next();
                self.page = 1;
                self.load_posts(tx);
            }
            KeyCode::Char('R') => self.load_posts(tx),
            KeyCode::Char('a') if self.user.is_none() => {
                self.view = View::Login;
                self.auth_mode = AuthMode::Login;
                self.login_field = InputField::Username;
            }
            KeyCode::Char('L') if self.user.is_some() => self.do_logout(tx),
            KeyCode::Char('m') => {
                if self.user.is_some() {
                    self.open_my_posts(tx);
                } else {
                    self.set_error("Log in to see your posts".to_string());
                }
            }
            KeyCode::Char('P') => {
                if self.user.is_some() {
                    self.open_profile(tx);
                } else {
                    self.set_error("Log in to see your profile".to_string());
                }
            }
            KeyCode::Enter => {
                if let Some(post) = self.posts.get(self.selected_post) {
                    let post_id = post.id;
                    self.return_view = View::PostList;
                    self.open_post(post_id, tx);
                }
            }
            _ => {}
        }

        Ok(false)
    }

    /// Tag after the active one; wraps back to "all tags".
    fn next_tag(&self) -> Option<Tag> {
        let next = match &self.tag_filter {
            None => 0,
            Some(current) => match self.tags.iter().position(|t| t.slug == current.slug) {
                Some(i) => i + 1,
                None => 0,
            },
        };
        self.tags.get(next).cloned()
    }

    fn post_params(&self) -> PostListParams {
        PostListParams {
            page: Some(self.page),
            search: Some(self.search_query.clone()).filter(|q| !q.trim().is_empty()),
            tag: self.tag_filter.as_ref().map(|t| t.slug.clone()),
            ordering: Some(self.ordering),
        }
    }

    fn load_posts(&mut self, tx: &mpsc::Sender<AppEvent>) {
        self.set_loading(true, "Loading posts...");

        let api = self.api.clone();
        let params = self.post_params();
        self.spawn(tx, async move {
            match api.list_posts(&params).await {
                Ok(page) => AppEvent::PostsLoaded(page),
                Err(e) => AppEvent::LoadFailed(format!("Failed to load posts: {}", e)),
            }
        });
    }

    fn on_posts_loaded(&mut self, page: PostPage) {
        self.set_loading(false, "");
        self.post_count = page.count;
        self.has_next_page = page.has_next();
        self.has_prev_page = page.has_previous();
        self.posts = page.results;
        if self.selected_post >= self.posts.len() {
            self.selected_post = self.posts.len().saturating_sub(1);
        }
    }

    fn load_tags(&self, tx: &mpsc::Sender<AppEvent>) {
        let api = self.api.clone();
        self.spawn(tx, async move {
            match api.list_tags().await {
                Ok(tags) => AppEvent::TagsLoaded(tags),
                Err(e) => {
                    tracing::warn!(error = %e, "could not load tags");
                    AppEvent::TagsLoaded(Vec::new())
                }
            }
        });
    }

    // ============ My posts ============

    fn open_my_posts(&mut self, tx: &mpsc::Sender<AppEvent>) {
        self.view = View::MyPosts;
        self.confirming_post_delete = None;
        self.load_my_posts(tx);
    }

    fn load_my_posts(&mut self, tx: &mpsc::Sender<AppEvent>) {
        self.set_loading(true, "Loading your posts...");

        let api = self.api.clone();
        self.spawn(tx, async move {
            match api.my_posts().await {
                Ok(page) => AppEvent::MyPostsLoaded(page),
                Err(e) => AppEvent::LoadFailed(format!("Failed to load your posts: {}", e)),
            }
        });
    }

    /// The viewer's posts under the active status tab.
    pub fn visible_my_posts(&self) -> Vec<&Post> {
        self.my_posts
            .iter()
            .filter(|p| self.my_posts_filter.matches(p))
            .collect()
    }

    fn clamp_my_post_selection(&mut self) {
        let count = self.visible_my_posts().len();
        if self.selected_my_post >= count {
            self.selected_my_post = count.saturating_sub(1);
        }
    }

    fn handle_my_posts_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) -> Result<bool> {
        if self.loading {
            return Ok(false);
        }

        if let Some(post_id) = self.confirming_post_delete {
            match key.code {
                KeyCode::Char('y') => {
                    self.confirming_post_delete = None;
                    self.delete_post(post_id, tx);
                }
                KeyCode::Char('n') | KeyCode::Esc => self.confirming_post_delete = None,
                _ => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc | KeyCode::Char('h') => self.view = View::PostList,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_my_post < self.visible_my_posts().len().saturating_sub(1) {
                    self.selected_my_post += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.selected_my_post > 0 {
                    self.selected_my_post -= 1;
                }
            }
            KeyCode::Tab => {
                self.my_posts_filter = self.my_posts_filter.next();
                self.selected_my_post = 0;
            }
            KeyCode::Char('R') => self.load_my_posts(tx),
            KeyCode::Char('d') => {
                let selected = self.visible_my_posts().get(self.selected_my_post).map(|p| p.id);
                if selected.is_some() {
                    self.confirming_post_delete = selected;
                }
            }
            KeyCode::Enter => {
                let selected = self.visible_my_posts().get(self.selected_my_post).map(|p| p.id);
                if let Some(post_id) = selected {
                    self.return_view = View::MyPosts;
                    self.open_post(post_id, tx);
                }
            }
            _ => {}
        }

        Ok(false)
    }

    fn delete_post(&mut self, post_id: PostId, tx: &mpsc::Sender<AppEvent>) {
        self.set_loading(true, "Deleting post...");

        let api = self.api.clone();
        self.spawn(tx, async move {
            let result = api.delete_post(post_id).await;
            AppEvent::PostDeleted { post_id, result }
        });
    }

    fn on_post_deleted(&mut self, post_id: PostId, result: Result<(), ApiError>) {
        self.set_loading(false, "");
        match result {
            Ok(()) | Err(ApiError::NotFound) => {
                tracing::info!(post_id, "post deleted");
                self.my_posts.retain(|p| p.id != post_id);
                self.posts.retain(|p| p.id != post_id);
                self.clamp_my_post_selection();
                if self.selected_post >= self.posts.len() {
                    self.selected_post = self.posts.len().saturating_sub(1);
                }
            }
            Err(e) => self.set_error(format!("Failed to delete post: {}", e)),
        }
    }

    // ============ Profile ============

    fn open_profile(&mut self, tx: &mpsc::Sender<AppEvent>) {
        self.view = View::Profile;

        let api = self.api.clone();
        self.spawn(tx, async move {
            match api.profile().await {
                Ok(profile) => AppEvent::ProfileLoaded(profile),
                Err(e) => AppEvent::Error(format!("Failed to load profile: {}", e)),
            }
        });
    }

    fn handle_profile_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc | KeyCode::Char('h') => self.view = View::PostList,
            _ => {}
        }
        Ok(false)
    }

    // ============ Post detail ============

    pub fn open_post(&mut self, post_id: PostId, tx: &mpsc::Sender<AppEvent>) {
        self.set_loading(true, "Loading post...");

        let mut api = self.api.clone();
        self.spawn(tx, async move {
            match api.get_post(post_id).await {
                Ok(post) => {
                    let comments = CommentRequest::Reload.run(&mut api, post_id).await;
                    AppEvent::PostLoaded { post, comments }
                }
                Err(e) => AppEvent::LoadFailed(format!("Failed to load post: {}", e)),
            }
        });
    }

    fn on_post_loaded(&mut self, post: Post, comments: CommentOutcome) {
        self.set_loading(false, "");

        let mut discussion = Discussion::new(post.id);
        if let Err(e) = discussion.complete(comments) {
            self.set_error(format!("Failed to load comments: {}", e));
        }
        self.current_post = Some(post);
        self.discussion = Some(discussion);
        self.selected_comment = 0;
        self.composer = None;
        self.confirming_delete = None;
        self.vim_mode = VimMode::Normal;
        self.view = View::PostDetail;
    }

    fn close_post(&mut self) {
        // Carry like/bookmark changes back into the list rows.
        if let Some(post) = self.current_post.take() {
            for list in [&mut self.posts, &mut self.my_posts] {
                if let Some(row) = list.iter_mut().find(|p| p.id == post.id) {
                    *row = post.clone();
                }
            }
        }
        self.discussion = None;
        self.composer = None;
        self.confirming_delete = None;
        self.vim_mode = VimMode::Normal;
        self.view = self.return_view;
    }

    fn update_post(&mut self, post_id: PostId, update: impl Fn(&mut Post)) {
        if let Some(post) = self.current_post.as_mut().filter(|p| p.id == post_id) {
            update(post);
        }
        for list in [&mut self.posts, &mut self.my_posts] {
            if let Some(row) = list.iter_mut().find(|p| p.id == post_id) {
                update(row);
            }
        }
    }

    fn handle_post_detail_key(&mut self, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) -> Result<bool> {
        if let Some(id) = self.confirming_delete {
            match key.code {
                KeyCode::Char('y') => {
                    self.confirming_delete = None;
                    self.delete_comment(id, tx);
                }
                KeyCode::Char('n') | KeyCode::Esc => self.confirming_delete = None,
                _ => {}
            }
            return Ok(false);
        }

        if let Some(composer) = self.composer {
            self.handle_composer_key(composer, key, tx);
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => self.close_post(),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_comment < self.comment_row_count().saturating_sub(1) {
                    self.selected_comment += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.selected_comment > 0 {
                    self.selected_comment -= 1;
                }
            }
            KeyCode::Char('l') => self.run_selected(ActionKind::ToggleLike, tx),
            KeyCode::Char('r') => self.run_selected(ActionKind::Reply, tx),
            KeyCode::Char('e') => self.run_selected(ActionKind::Edit, tx),
            KeyCode::Char('d') => self.run_selected(ActionKind::Delete, tx),
            KeyCode::Char('c') => {
                if self.user.is_some() {
                    self.open_composer(Composer::NewComment);
                } else {
                    self.set_error("Log in to comment ('a' on the post list)".to_string());
                }
            }
            KeyCode::Char('L') => self.toggle_post_like(tx),
            KeyCode::Char('b') => self.toggle_bookmark(tx),
            KeyCode::Char('R') => self.reload_comments(tx),
            _ => {}
        }

        Ok(false)
    }

    /// Whether the composer's text has been sent and awaits an answer.
    pub fn is_composer_pending(&self, composer: Composer) -> bool {
        let Some(discussion) = self.discussion.as_ref() else {
            return false;
        };
        match composer {
            Composer::NewComment => discussion.is_pending(PendingScope::NewComment),
            Composer::Reply => discussion
                .replying()
                .is_some_and(|d| discussion.is_pending(PendingScope::Reply(d.target))),
            Composer::Edit => discussion
                .editing()
                .is_some_and(|d| discussion.is_pending(PendingScope::Edit(d.target))),
        }
    }

    fn handle_composer_key(&mut self, composer: Composer, key: KeyEvent, tx: &mpsc::Sender<AppEvent>) {
        // The sent text stays frozen until the server answers.
        if self.is_composer_pending(composer) {
            return;
        }

        match key.code {
            KeyCode::Esc => self.cancel_composer(composer),
            KeyCode::Enter => self.submit_composer(composer, tx),
            KeyCode::Char(c) => {
                if let Some(buffer) = self.composer_buffer_mut(composer) {
                    buffer.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.composer_buffer_mut(composer) {
                    buffer.pop();
                }
            }
            _ => {}
        }
    }

    fn composer_buffer_mut(&mut self, composer: Composer) -> Option<&mut String> {
        let discussion = self.discussion.as_mut()?;
        match composer {
            Composer::NewComment => Some(&mut discussion.new_comment),
            Composer::Reply => discussion.reply_buffer_mut(),
            Composer::Edit => discussion.edit_buffer_mut(),
        }
    }

    fn open_composer(&mut self, composer: Composer) {
        self.composer = Some(composer);
        self.vim_mode = VimMode::Insert;
    }

    fn close_composer(&mut self) {
        self.composer = None;
        self.vim_mode = VimMode::Normal;
    }

    fn cancel_composer(&mut self, composer: Composer) {
        if let Some(discussion) = self.discussion.as_mut() {
            match composer {
                Composer::Reply => discussion.cancel_reply(),
                Composer::Edit => discussion.cancel_edit(),
                Composer::NewComment => {}
            }
        }
        self.close_composer();
    }

    fn submit_composer(&mut self, composer: Composer, tx: &mpsc::Sender<AppEvent>) {
        let Some(discussion) = self.discussion.as_mut() else {
            return;
        };

        let (started, label) = match composer {
            Composer::NewComment => (discussion.start_comment(), "post comment"),
            Composer::Reply => (discussion.start_reply(), "post reply"),
            Composer::Edit => (discussion.start_edit(), "save comment"),
        };

        match started {
            Ok(request) => self.spawn_comment_request(request, tx),
            Err(e) => self.set_error(format!("Failed to {}: {}", label, e)),
        }
    }

    fn spawn_comment_request(&self, request: CommentRequest, tx: &mpsc::Sender<AppEvent>) {
        let Some(post_id) = self.discussion.as_ref().map(|d| d.post_id()) else {
            return;
        };

        tracing::debug!(post_id, scope = ?request.scope(), "comment request sent");
        let mut api = self.api.clone();
        self.spawn(tx, async move {
            let outcome = request.run(&mut api, post_id).await;
            AppEvent::CommentsUpdated { post_id, outcome }
        });
    }

    fn on_comments_updated(&mut self, post_id: PostId, outcome: CommentOutcome) {
        let Some(discussion) = self.discussion.as_mut().filter(|d| d.post_id() == post_id) else {
            tracing::debug!(post_id, "dropping comment result for a closed post");
            return;
        };

        let scope = outcome.scope();
        let result = discussion.complete(outcome);
        let reply_done = discussion.replying().is_none();
        let edit_done = discussion.editing().is_none();

        let close = match self.composer {
            Some(Composer::Reply) => reply_done,
            Some(Composer::Edit) => edit_done,
            Some(Composer::NewComment) => scope == PendingScope::NewComment && result.is_ok(),
            None => false,
        };
        if close {
            self.close_composer();
        }

        self.clamp_comment_selection();
        if let Err(e) = result {
            self.set_error(format!("Failed to {}: {}", scope.describe(), e));
        }
    }

    fn comment_row_count(&self) -> usize {
        self.discussion
            .as_ref()
            .map(|d| d.thread().node_count())
            .unwrap_or(0)
    }

    fn clamp_comment_selection(&mut self) {
        let count = self.comment_row_count();
        if self.selected_comment >= count {
            self.selected_comment = count.saturating_sub(1);
        }
    }

    /// The action of `kind` on the highlighted comment, if the viewer has it.
    pub fn selected_action(&self, kind: ActionKind) -> Option<CommentAction> {
        let discussion = self.discussion.as_ref()?;
        let rows = discussion.rows(self.user.as_ref());
        rows.get(self.selected_comment)?.action(kind)
    }

    fn run_selected(&mut self, kind: ActionKind, tx: &mpsc::Sender<AppEvent>) {
        let Some(action) = self.selected_action(kind) else {
            if self.user.is_none() {
                self.set_error("Log in to interact with comments".to_string());
            }
            return;
        };

        if let CommentAction::Delete(id) = action {
            self.confirming_delete = Some(id);
            return;
        }
        let Some(discussion) = self.discussion.as_mut() else {
            return;
        };

        let started = discussion.start(action);
        let composer = match action {
            CommentAction::Edit(id) if discussion.editing().map(|d| d.target) == Some(id) => {
                Some(Composer::Edit)
            }
            CommentAction::Reply(id) if discussion.replying().map(|d| d.target) == Some(id) => {
                Some(Composer::Reply)
            }
            _ => None,
        };

        match started {
            Ok(Some(request)) => self.spawn_comment_request(request, tx),
            Ok(None) => {
                if let Some(composer) = composer {
                    self.open_composer(composer);
                }
            }
            Err(e) => self.set_error(format!("Failed to like comment: {}", e)),
        }
    }

    fn delete_comment(&mut self, id: CommentId, tx: &mpsc::Sender<AppEvent>) {
        let Some(discussion) = self.discussion.as_mut() else {
            return;
        };

        match discussion.start_delete(id) {
            Ok(request) => self.spawn_comment_request(request, tx),
            Err(e) => self.set_error(format!("Failed to delete comment: {}", e)),
        }
    }

    fn reload_comments(&mut self, tx: &mpsc::Sender<AppEvent>) {
        let Some(discussion) = self.discussion.as_mut() else {
            return;
        };

        match discussion.start_reload() {
            Ok(request) => self.spawn_comment_request(request, tx),
            Err(e) => self.set_error(format!("Failed to load comments: {}", e)),
        }
    }

    fn toggle_post_like(&mut self, tx: &mpsc::Sender<AppEvent>) {
        if self.user.is_none() {
            self.set_error("Log in to like posts".to_string());
            return;
        }
        let Some(post_id) = self.current_post.as_ref().map(|p| p.id) else {
            return;
        };

        let api = self.api.clone();
        self.spawn(tx, async move {
            let result = api.toggle_post_like(post_id).await;
            AppEvent::PostLiked { post_id, result }
        });
    }

    fn toggle_bookmark(&mut self, tx: &mpsc::Sender<AppEvent>) {
        if self.user.is_none() {
            self.set_error("Log in to bookmark posts".to_string());
            return;
        }
        let Some(post_id) = self.current_post.as_ref().map(|p| p.id) else {
            return;
        };

        let api = self.api.clone();
        self.spawn(tx, async move {
            let result = api.toggle_bookmark(post_id).await;
            AppEvent::Bookmarked { post_id, result }
        });
    }
}
