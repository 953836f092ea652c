pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod session;

pub use session::{AuthUser, Session};
