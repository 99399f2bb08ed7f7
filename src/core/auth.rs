//! Account login against the remote auth service

use crate::store::session::SessionStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> anyhow::Result<LoginResponse>;
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Email and password cannot be empty.")]
    MissingCredentials,

    #[error("Could not reach the login service: {0}")]
    Network(#[source] anyhow::Error),

    #[error("Login failed: {0}")]
    Rejected(String),

    #[error("Could not save the session: {0}")]
    Session(#[source] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedIn {
    pub user_id: String,
    pub name: Option<String>,
}

pub struct LoginService {
    api: Arc<dyn AuthApi>,
    session: Arc<SessionStore>,
}

impl LoginService {
    pub fn new(api: Arc<dyn AuthApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<LoggedIn, LoginError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.api.login(&request).await.map_err(LoginError::Network)?;

        let user_id = match response.user_id {
            Some(id) if response.success && !id.is_empty() => id,
            _ => {
                debug!("Login rejected for {}", email);
                return Err(LoginError::Rejected(rejection_message(&response.message)));
            }
        };

        self.session
            .save_session(email, &user_id, remember_me)
            .await
            .map_err(LoginError::Session)?;
        info!("Logged in as user {}", user_id);

        Ok(LoggedIn {
            user_id,
            name: response.name,
        })
    }

    /// Email to pre-fill, present only when the last login was remembered.
    pub fn remembered_email(&self) -> Option<String> {
        self.session.current().email
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.session.clear_session().await
    }
}

fn rejection_message(message: &str) -> String {
    if message.trim().is_empty() {
        "Invalid credentials".to_string()
    } else {
        message.to_string()
    }
}
