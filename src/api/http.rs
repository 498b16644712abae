//! reqwest-backed client for the registration service.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{
    ApiReply, CheckCodeRequest, Envelope, RegistrationRequest, RegistrationStatus,
    SendCodeRequest, StatusRequest, request_id_from,
};
use super::RegistrationApi;
use crate::config::ApiConfig;
use crate::error::ApiError;

/// Talks JSON to the registration service over HTTP.
pub struct HttpRegistrationApi {
    config: ApiConfig,
    client: reqwest::Client,
}

impl HttpRegistrationApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// POST `body` and return the status plus raw response text.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(reqwest::StatusCode, String), ApiError> {
        let url = self.url(path);
        debug!(url = %url, "Calling registration service");
        let resp = self.client.post(&url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        Ok((status, text))
    }

    /// POST to an endpoint that answers with the `{status, data, errors}`
    /// envelope.
    async fn post_envelope<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiReply<Value>, ApiError> {
        let (status, text) = self.post(path, body).await?;
        interpret_envelope(path, status, text)
    }
}

/// Turn an HTTP status and body into a reply.
///
/// Error statuses (422 included) whose body carries a non-empty `errors` map
/// are rejections; anything else that is not a success is an `ApiError`.
fn interpret_envelope(
    path: &str,
    status: reqwest::StatusCode,
    text: String,
) -> Result<ApiReply<Value>, ApiError> {
    if status.is_success() {
        let envelope: Envelope = serde_json::from_str(&text)?;
        return Ok(envelope.into_reply(|data| data));
    }

    if let Ok(envelope) = serde_json::from_str::<Envelope>(&text) {
        if !envelope.errors.is_empty() {
            debug!(path, status = status.as_u16(), "Service rejected fields");
            return Ok(ApiReply::Rejected(envelope.errors));
        }
    }

    warn!(path, status = status.as_u16(), "Service returned an error without field errors");
    Err(ApiError::Status {
        status: status.as_u16(),
        body: text,
    })
}

#[async_trait]
impl RegistrationApi for HttpRegistrationApi {
    async fn check_status(&self, request: &StatusRequest) -> Result<RegistrationStatus, ApiError> {
        let (status, text) = self.post(&self.config.status_path, request).await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_code(
        &self,
        request: &SendCodeRequest,
    ) -> Result<ApiReply<Option<String>>, ApiError> {
        let reply = self
            .post_envelope(&self.config.send_code_path, request)
            .await?;
        Ok(reply.map(|data| request_id_from(&data)))
    }

    async fn check_code(&self, request: &CheckCodeRequest) -> Result<ApiReply<()>, ApiError> {
        let reply = self
            .post_envelope(&self.config.check_code_path, request)
            .await?;
        Ok(reply.map(|_| ()))
    }

    async fn register(&self, request: &RegistrationRequest) -> Result<ApiReply<()>, ApiError> {
        let reply = self
            .post_envelope(&self.config.registration_path, request)
            .await?;
        Ok(reply.map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn url_joins_base_and_path() {
        let api = HttpRegistrationApi::new(ApiConfig {
            base_url: "https://svc.test/".into(),
            ..ApiConfig::default()
        });
        assert_eq!(
            api.url("/telegram/auth/registration"),
            "https://svc.test/telegram/auth/registration"
        );
    }

    #[test]
    fn success_with_truthy_status_is_accepted() {
        let reply =
            interpret_envelope("p", StatusCode::OK, r#"{"status":true,"data":{"request_id":"r"}}"#.into())
                .unwrap();
        assert!(matches!(reply, ApiReply::Accepted(_)));
    }

    #[test]
    fn unprocessable_with_errors_is_rejection() {
        let reply = interpret_envelope(
            "p",
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"errors":{"username":["taken"]}}"#.into(),
        )
        .unwrap();
        match reply {
            ApiReply::Rejected(errors) => assert_eq!(errors.get("username"), Some("taken")),
            other => panic!("Expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn server_error_without_errors_is_api_error() {
        let err = interpret_envelope("p", StatusCode::BAD_GATEWAY, "upstream down".into())
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 502, .. }));
    }

    #[test]
    fn malformed_success_body_is_decode_error() {
        let err = interpret_envelope("p", StatusCode::OK, "<html>".into()).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
