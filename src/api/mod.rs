pub mod error;
pub mod transport;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::location::{Location, Page};
pub use error::ApiError;
use transport::{HttpRequest, HttpResponse, Transport};

pub const SESSION_EXPIRED_NOTICE: &str = "Session expired or not authenticated. Please login.";

/// What a successful call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    /// Non-JSON body, e.g. an empty 204.
    Text(String),
}

impl ApiResponse {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::InvalidResponse(format!("Unexpected response shape: {}", e))),
            ApiResponse::Text(_) => Err(ApiError::InvalidResponse(
                "Expected a JSON response".to_string(),
            )),
        }
    }
}

/// The one place that talks to the backend.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    location: Arc<Location>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: &str, location: Arc<Location>) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            location,
        }
    }

    pub fn location(&self) -> &Arc<Location> {
        &self.location
    }

    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        data: Option<&Value>,
        require_auth: bool,
    ) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        log::debug!("[API] {} {} (require_auth={})", method, url, require_auth);
        if let Some(body) = data {
            log::debug!("[API] Request data: {}", body);
        }

        let response = self
            .transport
            .send(HttpRequest {
                method: method.clone(),
                url,
                body: data.cloned(),
            })
            .await
            .map_err(|e| {
                log::error!("[API] Error during {} request to {}: {:#}", method, endpoint, e);
                ApiError::Network(e.to_string())
            })?;
        log::debug!(
            "[API] Received status {} ({:?})",
            response.status,
            response.content_type
        );

        if response.status == 401 && !self.location.current().is_auth_page() {
            log::warn!("[API] Unauthorized on {}, redirecting to login", endpoint);
            self.location.alert(SESSION_EXPIRED_NOTICE);
            self.location.navigate(Page::Login);
            return Err(ApiError::Redirected);
        }

        normalize(response)
    }

    pub fn encode<T: Serialize>(body: &T) -> Result<Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::Validation(format!("Could not encode request: {}", e)))
    }
}

fn status_text(status: u16) -> Option<&'static str> {
    StatusCode::from_u16(status).ok()?.canonical_reason()
}

fn normalize(response: HttpResponse) -> Result<ApiResponse, ApiError> {
    let status = response.status;

    if response.is_json() {
        match serde_json::from_str::<Value>(&response.body) {
            Ok(parsed) if response.is_success() => return Ok(ApiResponse::Json(parsed)),
            Ok(parsed) => {
                let message = parsed
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| status_text(status).map(str::to_string))
                    .unwrap_or_else(|| "An API error occurred".to_string());
                log::warn!("[API] Error {}: {}", status, message);
                return Err(ApiError::Http {
                    status,
                    message,
                    data: Some(parsed),
                });
            }
            Err(e) if response.is_success() => {
                return Err(ApiError::InvalidResponse(format!(
                    "Malformed JSON response: {}",
                    e
                )));
            }
            // Error pages labelled as JSON keep their status and raw text
            Err(_) => {}
        }
    }

    if !response.is_success() {
        let message = if response.body.is_empty() {
            status_text(status).unwrap_or("An API error occurred").to_string()
        } else {
            response.body
        };
        log::warn!("[API] Error (non-JSON) {}: {}", status, message);
        return Err(ApiError::Http {
            status,
            message,
            data: None,
        });
    }

    Ok(ApiResponse::Text(response.body))
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use serde_json::json;

    fn client(transport: ScriptedTransport, page: Page) -> (ApiClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let api = ApiClient::new(
            transport.clone(),
            "http://localhost:5000/api/",
            Arc::new(Location::new(page)),
        );
        (api, transport)
    }

    #[tokio::test]
    async fn success_json_is_returned_unmodified() {
        let body = json!([{"id": 1, "name": "x", "due_date": null, "due_time": null}]);
        let (api, transport) = client(ScriptedTransport::new().json(200, body.clone()), Page::Main);

        let response = api.request("/tasks", Method::GET, None, true).await.unwrap();

        assert_eq!(response, ApiResponse::Json(body));
        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://localhost:5000/api/tasks");
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn payload_is_sent_as_body() {
        let (api, transport) = client(
            ScriptedTransport::new().json(201, json!({"message": "Task created", "task_id": 3})),
            Page::Main,
        );
        let payload = json!({"name": "n", "due_date": null, "due_time": null});

        api.request("/tasks", Method::POST, Some(&payload), true)
            .await
            .unwrap();

        assert_eq!(transport.calls(), vec!["POST /tasks"]);
        assert_eq!(transport.requests()[0].body, Some(payload));
    }

    #[tokio::test]
    async fn json_error_carries_message_status_and_body() {
        let body = json!({"message": "Task not found"});
        let (api, _) = client(ScriptedTransport::new().json(404, body.clone()), Page::Main);

        let err = api
            .request("/tasks/9", Method::DELETE, None, true)
            .await
            .unwrap_err();

        match err {
            ApiError::Http { status, message, data } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Task not found");
                assert_eq!(data, Some(body));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn json_error_without_message_falls_back_to_status_text() {
        let (api, _) = client(ScriptedTransport::new().json(500, json!({})), Page::Main);

        let err = api.request("/tasks", Method::GET, None, true).await.unwrap_err();

        assert_eq!(err.to_string(), "Internal Server Error");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn non_json_error_uses_raw_text() {
        let (api, _) = client(
            ScriptedTransport::new().text(502, "upstream down"),
            Page::Main,
        );

        let err = api.request("/tasks", Method::GET, None, true).await.unwrap_err();

        match err {
            ApiError::Http { status, message, data } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
                assert!(data.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_returns_text() {
        let (api, _) = client(ScriptedTransport::new().text(204, ""), Page::Main);

        let response = api.request("/tasks/1", Method::DELETE, None, true).await.unwrap();

        assert_eq!(response, ApiResponse::Text(String::new()));
    }

    #[tokio::test]
    async fn unauthorized_off_auth_pages_redirects_to_login() {
        let (api, _) = client(
            ScriptedTransport::new().json(401, json!({"message": "Authentication required"})),
            Page::Main,
        );

        let err = api.request("/tasks", Method::GET, None, true).await.unwrap_err();

        assert!(err.is_redirect());
        assert_eq!(api.location().current(), Page::Login);
        assert_eq!(api.location().take_notices(), vec![SESSION_EXPIRED_NOTICE]);
    }

    #[tokio::test]
    async fn unauthorized_on_login_page_is_a_normal_error() {
        let (api, _) = client(
            ScriptedTransport::new().json(401, json!({"message": "Invalid credentials"})),
            Page::Login,
        );
        let body = json!({"identifier": "a", "password": "b"});

        let err = api
            .request("/auth/login", Method::POST, Some(&body), false)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(api.location().take_notices().is_empty());
        assert_eq!(api.location().current(), Page::Login);
    }

    #[tokio::test]
    async fn network_failure_becomes_generic_error() {
        let (api, _) = client(ScriptedTransport::new().fail("connection refused"), Page::Main);

        let err = api.request("/auth/status", Method::GET, None, false).await.unwrap_err();

        match err {
            ApiError::Network(reason) => assert!(reason.contains("connection refused")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let (api, _) = client(ScriptedTransport::new().raw_json(200, "{not json"), Page::Main);

        let err = api.request("/tasks", Method::GET, None, true).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn error_page_labelled_json_keeps_status_and_text() {
        let (api, _) = client(
            ScriptedTransport::new().raw_json(500, "<h1>Internal Server Error</h1>"),
            Page::Main,
        );

        let err = api.request("/tasks", Method::GET, None, true).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        match err {
            ApiError::Http { message, data, .. } => {
                assert_eq!(message, "<h1>Internal Server Error</h1>");
                assert!(data.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn decode_rejects_wrong_shape() {
        let (api, _) = client(ScriptedTransport::new().json(200, json!(null)), Page::Main);

        let decoded: Result<Vec<crate::models::Task>, _> =
            api.request("/tasks", Method::GET, None, true).await.unwrap().decode();

        assert!(matches!(decoded, Err(ApiError::InvalidResponse(_))));
    }
}
