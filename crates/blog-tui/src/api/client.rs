use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use blog_shared::{
    api::{
        BookmarkResponse, LikeResponse, LoginRequest, LogoutRequest, PostListParams,
        RefreshRequest, RefreshResponse, RegisterRequest, TagListResponse, TokenPair,
    },
    LikeState, Post, PostId, PostPage, Profile, Tag,
};
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, StatusCode};

use super::auth::AuthTokens;
use crate::config::Config;

/// JWT payload claims we need for expiry checking
#[derive(serde::Deserialize)]
struct JwtClaims {
    exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Access forbidden")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Handle to the blog API. Clones share the session, so a request spawned
/// on a clone sees refreshed tokens and a dropped session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token_path: PathBuf,
    tokens: Arc<Mutex<Option<AuthTokens>>>,
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token_path: config.token_path.clone(),
            tokens: Arc::new(Mutex::new(None)),
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    fn session(&self) -> MutexGuard<'_, Option<AuthTokens>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load tokens from disk
    pub fn load_tokens(&self) -> anyhow::Result<bool> {
        let tokens = AuthTokens::load(&self.token_path)?;
        let found = tokens.is_some();
        *self.session() = tokens;
        Ok(found)
    }

    /// Check if authenticated
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Build URL for endpoint
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Add auth header if authenticated
    fn auth_header(&self) -> Option<String> {
        self.session()
            .as_ref()
            .map(|t| format!("Bearer {}", t.access_token))
    }

    fn store_tokens(&self, tokens: AuthTokens) -> Result<(), ApiError> {
        tokens.save(&self.token_path)?;
        *self.session() = Some(tokens);
        Ok(())
    }

    /// Forgets the session in memory and on disk.
    pub fn drop_session(&self) {
        if self.session().take().is_none() {
            return;
        }
        if let Err(e) = AuthTokens::delete(&self.token_path) {
            tracing::warn!(error = %e, "could not delete stored session");
        }
        tracing::info!("session dropped");
    }

    /// Decode JWT payload and extract expiration time
    fn decode_token_exp(token: &str) -> Option<i64> {
        // JWT format: header.payload.signature
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let payload = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
        let claims: JwtClaims = serde_json::from_slice(&payload).ok()?;

        Some(claims.exp)
    }

    /// Check if the access token is expiring soon (within 60 seconds)
    fn is_token_expiring_soon(&self) -> bool {
        let session = self.session();
        let Some(tokens) = session.as_ref() else {
            return true;
        };

        let Some(exp) = Self::decode_token_exp(&tokens.access_token) else {
            return false; // Can't decode = don't refresh proactively
        };

        let now = chrono::Utc::now().timestamp();
        exp < now + 60
    }

    /// Ensure we have a valid token, refreshing if needed.
    /// A failed refresh drops the session so reads fall back to anonymous.
    pub async fn ensure_valid_token(&self) -> bool {
        if !self.is_authenticated() {
            return false;
        }

        if self.is_token_expiring_soon() {
            // One refresh at a time; later callers reuse its result.
            let _guard = self.refresh_lock.lock().await;
            if !self.is_authenticated() {
                return false;
            }
            if self.is_token_expiring_soon() {
                if let Err(e) = self.refresh().await {
                    tracing::warn!(error = %e, "token refresh failed, continuing anonymously");
                    self.drop_session();
                    return false;
                }
            }
        }

        true
    }

    // ============ Request Helpers ============

    /// Start a request, attaching the bearer token when there is a session.
    async fn request(
        &self,
        method: Method,
        path: &str,
        require_auth: bool,
    ) -> Result<RequestBuilder, ApiError> {
        let authenticated = self.ensure_valid_token().await;
        if require_auth && !authenticated {
            return Err(ApiError::Unauthorized);
        }

        tracing::debug!(%method, path, authenticated, "api request");
        let mut builder = self.client.request(method, self.url(path));
        if let Some(header) = self.auth_header() {
            builder = builder.header(AUTHORIZATION, header);
        }
        Ok(builder)
    }

    /// GET that works with or without a session
    pub(super) async fn get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let builder = self.request(Method::GET, path, false).await?;
        builder.send().await.map_err(ApiError::Network)
    }

    /// Make an authenticated GET request, auto-refreshing token if needed
    pub(super) async fn authed_get(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let builder = self.request(Method::GET, path, true).await?;
        builder.send().await.map_err(ApiError::Network)
    }

    /// Make an authenticated POST request, auto-refreshing token if needed
    pub(super) async fn authed_post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        let builder = self.request(Method::POST, path, true).await?;
        builder.json(body).send().await.map_err(ApiError::Network)
    }

    /// Make an authenticated POST request without body, auto-refreshing token if needed
    pub(super) async fn authed_post_empty(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let builder = self.request(Method::POST, path, true).await?;
        builder.send().await.map_err(ApiError::Network)
    }

    /// Make an authenticated PATCH request, auto-refreshing token if needed
    pub(super) async fn authed_patch<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ApiError> {
        let builder = self.request(Method::PATCH, path, true).await?;
        builder.json(body).send().await.map_err(ApiError::Network)
    }

    /// Make an authenticated DELETE request, auto-refreshing token if needed
    pub(super) async fn authed_delete(&self, path: &str) -> Result<reqwest::Response, ApiError> {
        let builder = self.request(Method::DELETE, path, true).await?;
        builder.send().await.map_err(ApiError::Network)
    }

    /// Handle API response
    pub(super) async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        match status {
            StatusCode::OK | StatusCode::CREATED => {
                response.json().await.map_err(ApiError::Network)
            }
            _ => Err(self.error_for(status, response).await),
        }
    }

    /// Handle empty response
    pub(super) async fn handle_empty_response(
        &self,
        response: reqwest::Response,
    ) -> Result<(), ApiError> {
        let status = response.status();

        match status {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(self.error_for(status, response).await),
        }
    }

    async fn error_for(&self, status: StatusCode, response: reqwest::Response) -> ApiError {
        let text = response.text().await.unwrap_or_default();
        tracing::debug!(%status, body = %text, "api error response");

        match status {
            StatusCode::UNAUTHORIZED => {
                // The server no longer accepts our token.
                self.drop_session();
                ApiError::Unauthorized
            }
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(text)
            }
            _ => ApiError::Server(format!("{}: {}", status, text)),
        }
    }

    // ============ Auth ============

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<(), ApiError> {
        let req = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password2: password_confirm.to_string(),
        };

        let response = self
            .client
            .post(self.url("/auth/register/"))
            .json(&req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Logs in and loads the profile. The session is kept only once the
    /// profile has loaded.
    pub async fn login(&self, username: &str, password: &str) -> Result<Profile, ApiError> {
        let req = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/auth/login/"))
            .json(&req)
            .send()
            .await?;

        let pair: TokenPair = self.handle_response(response).await?;

        let response = self
            .client
            .get(self.url("/auth/profile/"))
            .header(AUTHORIZATION, format!("Bearer {}", pair.access))
            .send()
            .await?;
        let profile: Profile = self.handle_response(response).await?;

        self.store_tokens(AuthTokens {
            access_token: pair.access,
            refresh_token: pair.refresh,
        })?;
        tracing::info!(username, "logged in");

        Ok(profile)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let tokens = self.session().take();
        if let Some(tokens) = tokens {
            let req = LogoutRequest {
                refresh_token: tokens.refresh_token,
            };
            let result = self
                .client
                .post(self.url("/auth/logout/"))
                .header(AUTHORIZATION, format!("Bearer {}", tokens.access_token))
                .json(&req)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "logout request failed, discarding tokens anyway");
            }
        }

        AuthTokens::delete(&self.token_path)?;
        Ok(())
    }

    pub async fn refresh(&self) -> Result<(), ApiError> {
        let refresh_token = self
            .session()
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .ok_or(ApiError::Unauthorized)?;

        let req = RefreshRequest {
            refresh: refresh_token.clone(),
        };

        let response = self
            .client
            .post(self.url("/auth/token/refresh/"))
            .json(&req)
            .send()
            .await?;

        let refreshed: RefreshResponse = self.handle_response(response).await?;

        self.store_tokens(AuthTokens {
            access_token: refreshed.access,
            refresh_token: refreshed.refresh.unwrap_or(refresh_token),
        })?;
        tracing::debug!("access token refreshed");

        Ok(())
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let response = self.authed_get("/auth/profile/").await?;
        self.handle_response(response).await
    }

    // ============ Posts ============

    pub async fn list_posts(&self, params: &PostListParams) -> Result<PostPage, ApiError> {
        let path = format!("/blog/posts/{}", Self::post_query(params));
        let response = self.get(&path).await?;
        self.handle_response(response).await
    }

    fn post_query(params: &PostListParams) -> String {
        let mut query_parts = Vec::new();

        if let Some(page) = params.page {
            query_parts.push(format!("page={}", page));
        }
        if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query_parts.push(format!("search={}", urlencoding::encode(search.trim())));
        }
        if let Some(tag) = &params.tag {
            query_parts.push(format!("tag={}", urlencoding::encode(tag)));
        }
        if let Some(ordering) = params.ordering {
            query_parts.push(format!("ordering={}", ordering.as_param()));
        }

        if query_parts.is_empty() {
            String::new()
        } else {
            format!("?{}", query_parts.join("&"))
        }
    }

    /// The viewer's own posts, drafts included.
    pub async fn my_posts(&self) -> Result<PostPage, ApiError> {
        let response = self.authed_get("/blog/posts/my_posts/").await?;
        self.handle_response(response).await
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<Post, ApiError> {
        let response = self.get(&format!("/blog/posts/{}/", post_id)).await?;
        self.handle_response(response).await
    }

    pub async fn delete_post(&self, post_id: PostId) -> Result<(), ApiError> {
        let response = self
            .authed_delete(&format!("/blog/posts/{}/", post_id))
            .await?;
        self.handle_empty_response(response).await
    }

    pub async fn toggle_post_like(&self, post_id: PostId) -> Result<LikeState, ApiError> {
        let response = self
            .authed_post_empty(&format!("/blog/posts/{}/like/", post_id))
            .await?;
        let like: LikeResponse = self.handle_response(response).await?;
        Ok(like.into())
    }

    /// Returns whether the post is bookmarked after the toggle.
    pub async fn toggle_bookmark(&self, post_id: PostId) -> Result<bool, ApiError> {
        let response = self
            .authed_post_empty(&format!("/blog/posts/{}/bookmark/", post_id))
            .await?;
        let bookmark: BookmarkResponse = self.handle_response(response).await?;
        Ok(bookmark.is_bookmarked())
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        let response = self.get("/blog/tags/").await?;
        let tags: TagListResponse = self.handle_response(response).await?;
        Ok(tags.into())
    }
}
