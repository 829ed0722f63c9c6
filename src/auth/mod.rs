//! Local accounts with cookie sessions.

pub mod handlers;
pub mod middleware;
pub mod password;

pub use handlers::*;
pub use middleware::{AuthContext, OptionalAuth, SESSION_COOKIE_NAME};
