//! Remote registration service — the four operations the flow relies on.

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::error::ApiError;

pub use http::HttpRegistrationApi;
pub use types::{
    ApiReply, CheckCodeRequest, RegistrationRequest, RegistrationStatus, SendCodeRequest,
    ServerErrors, StatusRequest,
};

/// Client for the remote registration service.
///
/// `Ok(ApiReply::Rejected(..))` means the service understood the request and
/// refused it with field errors. `Err` means no field map came back.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    /// Ask whether the chat (and phone) is already registered.
    async fn check_status(&self, request: &StatusRequest) -> Result<RegistrationStatus, ApiError>;

    /// Send a verification code to an email. Accepted replies carry the
    /// request id, if the service issued one.
    async fn send_code(
        &self,
        request: &SendCodeRequest,
    ) -> Result<ApiReply<Option<String>>, ApiError>;

    /// Check a verification code against a previously issued request id.
    async fn check_code(&self, request: &CheckCodeRequest) -> Result<ApiReply<()>, ApiError>;

    /// Submit the final registration.
    async fn register(&self, request: &RegistrationRequest) -> Result<ApiReply<()>, ApiError>;
}

impl<T> ApiReply<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiReply<U> {
        match self {
            Self::Accepted(value) => ApiReply::Accepted(f(value)),
            Self::Rejected(errors) => ApiReply::Rejected(errors),
        }
    }
}
