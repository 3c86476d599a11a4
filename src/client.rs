//! Typed calls for the portal screens, layered on the [`Gateway`].

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::claims::decode_claims;
use crate::error::GatewayError;
use crate::gateway::{Gateway, RequestOptions};
use crate::lifecycle::{SchoolAction, TransitionError};
use crate::session::{self, LoginResponse, SessionError, SessionSnapshot};
use crate::types::LifecycleStatus;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("{0}")]
    Validation(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// A school as listed on the super-admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolSummary {
    #[serde(deserialize_with = "id_from_value")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchoolSummary {
    pub fn lifecycle_status(&self) -> Option<LifecycleStatus> {
        self.status.as_deref().and_then(LifecycleStatus::parse)
    }
}

fn id_from_value<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid school id: {}", other))),
    }
}

#[derive(Debug, Deserialize)]
struct SchoolList {
    #[serde(default)]
    data: Vec<SchoolSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub message: String,
    pub logged_out: bool,
}

#[derive(Debug, Clone)]
pub struct PortalClient {
    gateway: Gateway,
}

impl PortalClient {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::load(self.gateway.store().as_ref())
    }

    /// Authenticate and persist the issued session
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let options = RequestOptions::new(Method::POST).with_body(json!({
            "email": email,
            "password": password,
        }));
        let value = self.gateway.execute("/api/auth/login", &options).await?;
        let login: LoginResponse =
            serde_json::from_value(value).map_err(|e| ClientError::UnexpectedResponse(e.to_string()))?;

        session::establish(self.gateway.store().as_ref(), &login)?;
        Ok(login)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        session::logout(self.gateway.store().as_ref())?;
        Ok(())
    }

    /// Change the current principal's password.
    ///
    /// When the server demands it (`forceLogout`), the session is cleared.
    pub async fn change_password(&self, new_password: &str, confirm: &str) -> Result<PasswordChange, ClientError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        if new_password != confirm {
            return Err(ClientError::Validation("Passwords do not match".to_string()));
        }

        let snapshot = self.snapshot();
        let user_id = snapshot
            .token
            .as_deref()
            .and_then(decode_claims)
            .and_then(|claims| claims.id);

        let options = RequestOptions::new(Method::POST).with_body(json!({
            "newPassword": new_password,
            "userId": user_id,
            "role": snapshot.role,
        }));
        let value = self.gateway.execute("/api/auth/change-password", &options).await?;

        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Password updated successfully")
            .to_string();
        let force_logout = value.get("forceLogout").and_then(Value::as_bool).unwrap_or(false);

        if force_logout {
            self.logout()?;
        }

        Ok(PasswordChange {
            message,
            logged_out: force_logout,
        })
    }

    /// Submit the school profile of the logged-in admin and record the
    /// status the server reports (pending approval when it reports none)
    pub async fn submit_profile(&self, profile: Value) -> Result<LifecycleStatus, ClientError> {
        let options = RequestOptions::new(Method::POST).with_body(profile);
        let value = self.gateway.execute("/api/school/profile", &options).await?;

        let status = value
            .get("status")
            .and_then(Value::as_str)
            .and_then(LifecycleStatus::parse)
            .unwrap_or(LifecycleStatus::ProfileSubmitted);

        session::record_status(self.gateway.store().as_ref(), status)?;
        Ok(status)
    }

    pub async fn list_schools(&self) -> Result<Vec<SchoolSummary>, ClientError> {
        let value = self
            .gateway
            .execute("/api/superadmin/schools", &RequestOptions::get())
            .await?;
        let list: SchoolList =
            serde_json::from_value(value).map_err(|e| ClientError::UnexpectedResponse(e.to_string()))?;
        Ok(list.data)
    }

    /// Move a school through its lifecycle.
    ///
    /// When the current status is known the transition is checked locally
    /// first; the server stays authoritative either way.
    pub async fn school_action(
        &self,
        school_id: &str,
        action: SchoolAction,
        current: Option<LifecycleStatus>,
        reason: Option<&str>,
    ) -> Result<LifecycleStatus, ClientError> {
        if let Some(from) = current {
            action.apply(from)?;
        }

        let mut options = RequestOptions::new(Method::PATCH);
        if action.takes_reason() {
            let reason = reason.unwrap_or(match action {
                SchoolAction::Reject => "Incomplete or invalid school details",
                _ => "Policy violation",
            });
            options = options.with_body(json!({ "reason": reason }));
        }

        let path = format!("/api/superadmin/schools/{}/{}", school_id, action.endpoint());
        self.gateway.execute(&path, &options).await?;

        tracing::info!("School {} {}: now {}", school_id, action, action.target_status());
        Ok(action.target_status())
    }
}
