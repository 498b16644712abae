//! HTTP surface — one registration flow per browser session, as JSON.

pub mod error;
pub mod routes;

pub use error::AppError;
pub use routes::{AppState, SessionResponse, signup_routes};
