//! Thin transport wrapper over the backend REST API: one attempt per call,
//! Bearer auth on every request, 401 anywhere forces a logout.

use gloo_net::http::{Request, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{
    BudgetConfig, ExpenseRecord, IncomeRecord, IncomeVsExpense, SpendingSummary, TrendsResponse,
};

/// Same-origin by default; overridable at compile time for a split deploy.
pub const API_BASE_URL: &str = match option_env!("API_BASE_URL") {
    Some(url) => url,
    None => "",
};

const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("session expired, please log in again")]
    AuthRequired,
    #[error("request failed: {status} {status_text}")]
    RequestFailed { status: u16, status_text: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

/// Process-scoped auth state, backed by localStorage and passed explicitly
/// so the gateway stays testable in isolation.
#[derive(Clone, PartialEq, Default)]
pub struct Session;

impl Session {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }

    pub fn token(&self) -> Option<String> {
        Self::storage()?.get_item(TOKEN_KEY).ok().flatten()
    }

    pub fn has_token(&self) -> bool {
        self.token().map(|t| !t.is_empty()).unwrap_or(false)
    }

    pub fn store_token(&self, token: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.set_item(TOKEN_KEY, token);
        }
    }

    /// Clears the token and returns to the login entry point.
    pub fn logout(&self) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(TOKEN_KEY);
        }
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    }
}

#[derive(Clone, PartialEq, Default)]
pub struct Api {
    pub session: Session,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("{}{}", API_BASE_URL, path)
    }

    fn headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Content-Type", "application/json");
        match self.session.token() {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn dispatch(
        &self,
        builder: RequestBuilder,
        body: Option<&serde_json::Value>,
    ) -> Result<gloo_net::http::Response, ApiError> {
        self.exchange(builder, body, true).await
    }

    /// Session-bound requests treat 401 as a lost session (token clear plus
    /// reload). Login passes `false`: a rejected password must come back as
    /// an ordinary failure the form can display, not wipe the page.
    async fn exchange(
        &self,
        builder: RequestBuilder,
        body: Option<&serde_json::Value>,
        session_bound: bool,
    ) -> Result<gloo_net::http::Response, ApiError> {
        let builder = self.headers(builder);
        let response = match body {
            Some(value) => builder
                .json(value)
                .map_err(|e| ApiError::Network(e.to_string()))?
                .send()
                .await,
            None => builder.send().await,
        }
        .map_err(|e| ApiError::Network(e.to_string()))?;

        match status_error(response.status(), &response.status_text(), session_bound) {
            None => Ok(response),
            Some(ApiError::AuthRequired) => {
                self.session.logout();
                Err(ApiError::AuthRequired)
            }
            Some(err) => Err(err),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.dispatch(Request::get(&self.url(path)), None).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(builder, Some(body)).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    // --- expenses ---

    pub async fn expenses(&self) -> Result<Vec<ExpenseRecord>, ApiError> {
        self.get_json("/api/expenses").await
    }

    pub async fn create_expense(&self, expense: &ExpenseRecord) -> Result<ExpenseRecord, ApiError> {
        let body = serde_json::to_value(expense).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send_json(Request::post(&self.url("/api/expenses")), &body)
            .await
    }

    pub async fn update_expense(
        &self,
        id: i64,
        expense: &ExpenseRecord,
    ) -> Result<ExpenseRecord, ApiError> {
        let body = serde_json::to_value(expense).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send_json(
            Request::put(&self.url(&format!("/api/expenses/{}", id))),
            &body,
        )
        .await
    }

    pub async fn delete_expense(&self, id: i64) -> Result<(), ApiError> {
        self.dispatch(
            Request::delete(&self.url(&format!("/api/expenses/{}", id))),
            None,
        )
        .await?;
        Ok(())
    }

    // --- incomes ---

    pub async fn create_income(&self, income: &IncomeRecord) -> Result<IncomeRecord, ApiError> {
        let body = serde_json::to_value(income).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send_json(Request::post(&self.url("/api/incomes")), &body)
            .await
    }

    // --- summaries and report data ---

    pub async fn summary(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<SpendingSummary, ApiError> {
        let path = match (year, month) {
            (Some(y), Some(m)) => format!("/api/expenses/summary?year={}&month={}", y, m),
            _ => "/api/expenses/summary".to_string(),
        };
        self.get_json(&path).await
    }

    pub async fn category_spending(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<String, f64>, ApiError> {
        self.get_json(&format!(
            "/api/expenses/category-spending?year={}&month={}",
            year, month
        ))
        .await
    }

    pub async fn income_vs_expense(
        &self,
        year: i32,
        month: u32,
    ) -> Result<IncomeVsExpense, ApiError> {
        self.get_json(&format!(
            "/api/expenses/income-vs-expense?year={}&month={}",
            year, month
        ))
        .await
    }

    pub async fn trends(&self, year: i32) -> Result<TrendsResponse, ApiError> {
        self.get_json(&format!("/api/expenses/trends/{}", year))
            .await
    }

    // --- budgets (plural endpoints; the singular legacy shape is not used) ---

    pub async fn budgets(&self) -> Result<BudgetConfig, ApiError> {
        self.get_json("/api/budgets").await
    }

    pub async fn save_monthly_limit(&self, limit: f64) -> Result<BudgetConfig, ApiError> {
        self.send_json(
            Request::put(&self.url("/api/budgets")),
            &json!({ "monthlyLimit": limit }),
        )
        .await
    }

    pub async fn save_category_limits(
        &self,
        limits: &BTreeMap<String, f64>,
    ) -> Result<BudgetConfig, ApiError> {
        let body = serde_json::to_value(limits).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send_json(Request::put(&self.url("/api/budgets/categories")), &body)
            .await
    }

    // --- misc ---

    pub async fn tips(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("/api/tips").await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = json!({ "username": username, "password": password });
        let response = self
            .exchange(
                Request::post(&self.url("/api/auth/login")),
                Some(&body),
                false,
            )
            .await?;
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        match value.get("token").and_then(|t| t.as_str()) {
            Some(token) => {
                self.session.store_token(token);
                Ok(())
            }
            None => Err(ApiError::Decode("login response carried no token".into())),
        }
    }
}

/// Status-to-error policy, separated from the transport so it stays testable:
/// 2xx is success, 401 on a session-bound call is a lost session, everything
/// else (including 401 on login) is a plain request failure.
fn status_error(status: u16, status_text: &str, session_bound: bool) -> Option<ApiError> {
    if (200..300).contains(&status) {
        return None;
    }
    if status == 401 && session_bound {
        return Some(ApiError::AuthRequired);
    }
    Some(ApiError::RequestFailed {
        status,
        status_text: status_text.to_string(),
    })
}

/// Blocking user-facing notification for a failed operation. AuthRequired is
/// excluded: the gateway has already forced a logout by the time it surfaces.
pub fn surface(context: &str, err: &ApiError) {
    if *err == ApiError::AuthRequired {
        return;
    }
    gloo_console::error!(format!("{}: {}", context, err));
    gloo_dialogs::alert(&format!("{}: {}", context, err));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_message_carries_status() {
        let err = ApiError::RequestFailed {
            status: 500,
            status_text: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "request failed: 500 Internal Server Error");
    }

    #[test]
    fn session_bound_401_loses_the_session() {
        assert_eq!(
            status_error(401, "Unauthorized", true),
            Some(ApiError::AuthRequired)
        );
    }

    #[test]
    fn login_rejection_stays_a_displayable_failure() {
        // A wrong password must not be mapped to AuthRequired, or the forced
        // reload would wipe the login form's error message.
        assert_eq!(
            status_error(401, "Unauthorized", false),
            Some(ApiError::RequestFailed {
                status: 401,
                status_text: "Unauthorized".into()
            })
        );
    }

    #[test]
    fn success_statuses_map_to_no_error() {
        assert_eq!(status_error(200, "OK", true), None);
        assert_eq!(status_error(204, "No Content", true), None);
        assert!(matches!(
            status_error(500, "Internal Server Error", true),
            Some(ApiError::RequestFailed { status: 500, .. })
        ));
    }

    #[test]
    fn auth_required_is_not_a_request_failure() {
        assert_ne!(
            ApiError::AuthRequired,
            ApiError::RequestFailed {
                status: 401,
                status_text: "Unauthorized".into()
            }
        );
    }
}
