mod auth;
mod comments;
mod posts;

pub use auth::*;
pub use comments::*;
pub use posts::*;
