mod auth;
mod client;
mod comments;

pub use client::{ApiClient, ApiError};
pub use comments::CommentApi;

#[cfg(test)]
pub(crate) use client::tests::{serve, session_client};
