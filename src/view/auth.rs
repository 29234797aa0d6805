use reqwest::Method;

use crate::api::{ApiClient, ApiError};
use crate::location::Page;
use crate::models::{LoginRequest, MessageResponse, SignupRequest};

pub const LOGIN_SUCCESS: &str = "Login successful";
pub const SIGNUP_SUCCESS: &str = "User created successfully";
pub const MIN_PASSWORD_LEN: usize = 6;

/// Submit handlers for the login and signup forms.
pub struct AuthController {
    api: ApiClient,
    pub error: Option<String>,
}

impl AuthController {
    pub fn new(api: ApiClient) -> Self {
        Self { api, error: None }
    }

    fn display_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Returns true and navigates to the main page on success.
    pub async fn login(&mut self, identifier: &str, password: &str) -> bool {
        self.clear_error();
        self.api.location().navigate(Page::Login);

        if identifier.trim().is_empty() || password.is_empty() {
            self.display_error("Please enter your username or email and password.");
            return false;
        }

        let request = LoginRequest {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
        };
        self.submit("/auth/login", &request, LOGIN_SUCCESS, "Login", |err| {
            (err.status() == Some(401)).then(|| "Invalid credentials. Please try again.")
        })
        .await
    }

    pub async fn signup(&mut self, username: &str, email: &str, password: &str) -> bool {
        self.clear_error();
        self.api.location().navigate(Page::Signup);

        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            self.display_error("Please fill in username, email and password.");
            return false;
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            self.display_error(format!(
                "Password must be at least {} characters long.",
                MIN_PASSWORD_LEN
            ));
            return false;
        }

        let request = SignupRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.submit("/auth/signup", &request, SIGNUP_SUCCESS, "Signup", |err| {
            (err.status() == Some(409)).then(|| "Username or email already exists.")
        })
        .await
    }

    async fn submit<T, F>(
        &mut self,
        endpoint: &str,
        request: &T,
        success: &str,
        action: &str,
        status_message: F,
    ) -> bool
    where
        T: serde::Serialize,
        F: Fn(&ApiError) -> Option<&'static str>,
    {
        let result = match ApiClient::encode(request) {
            Ok(body) => self.api.request(endpoint, Method::POST, Some(&body), false).await,
            Err(e) => Err(e),
        };

        match result.and_then(|response| response.decode::<MessageResponse>()) {
            Ok(MessageResponse { message: Some(message) }) if message == success => {
                log::info!("{} succeeded", action);
                self.api.location().navigate(Page::Main);
                true
            }
            Ok(MessageResponse { message }) => {
                self.display_error(message.unwrap_or_else(|| {
                    format!("{} attempt returned an unexpected response.", action)
                }));
                false
            }
            Err(e) => {
                log::error!("{} failed: {}", action, e);
                let message = match status_message(&e) {
                    Some(message) => message.to_string(),
                    None if e.to_string().trim().is_empty() => format!(
                        "{} failed. Could not connect or server error.",
                        action
                    ),
                    None => e.to_string(),
                };
                self.display_error(message);
                false
            }
        }
    }
}
