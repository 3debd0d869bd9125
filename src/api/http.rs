use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::FinanceApi;
use crate::error::{ApiError, ApiResult};
use crate::models::*;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for a remote finance API, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        // Validate once so every request URL can be built later.
        Url::parse(base_url).map_err(|e| ApiError::Transport(format!("{base_url}: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    fn request(&self, method: Method, path: &str, query: &[(&str, String)]) -> ApiResult<RequestBuilder> {
        let url = build_url(&self.base_url, path, query)?;
        debug!(%method, %url, "api request");
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: &'static str,
    ) -> ApiResult<T> {
        let resp = self.request(Method::GET, path, query)?.send()?;
        decode(resp, resource, path)
    }

    fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        resource: &'static str,
    ) -> ApiResult<T> {
        let resp = self.request(method, path, &[])?.json(body).send()?;
        decode(resp, resource, path)
    }

    fn delete(&self, path: &str, resource: &'static str) -> ApiResult<()> {
        let resp = self.request(Method::DELETE, path, &[])?.send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().unwrap_or_default();
        Err(error_for_status(status, &body, resource, path))
    }
}

impl FinanceApi for HttpApi {
    fn login(&mut self, credentials: &LoginRequest) -> ApiResult<LoginResponse> {
        credentials.validate()?;
        let resp: LoginResponse = self.send(Method::POST, "/auth/login", credentials, "user")?;
        info!(user = %resp.user.email, "logged in");
        self.token = Some(resp.access_token.clone());
        Ok(resp)
    }

    fn categories(&self) -> ApiResult<Vec<Category>> {
        self.get("/categories", &[], "category")
    }

    fn create_category(&mut self, data: &CreateCategory) -> ApiResult<Category> {
        self.send(Method::POST, "/categories", data, "category")
    }

    fn transactions(&self, filters: &TransactionFilters) -> ApiResult<Vec<Transaction>> {
        self.get("/transactions", &filters.query_pairs(), "transaction")
    }

    fn transaction(&self, id: &str) -> ApiResult<Transaction> {
        self.get(&format!("/transactions/{id}"), &[], "transaction")
    }

    fn create_transaction(&mut self, data: &CreateTransaction) -> ApiResult<Transaction> {
        data.validate()?;
        self.send(Method::POST, "/transactions", data, "transaction")
    }

    fn update_transaction(
        &mut self,
        id: &str,
        data: &UpdateTransaction,
    ) -> ApiResult<Transaction> {
        data.validate()?;
        self.send(Method::PUT, &format!("/transactions/{id}"), data, "transaction")
    }

    fn delete_transaction(&mut self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/transactions/{id}"), "transaction")
    }

    fn dashboard_stats(&self, filters: &TransactionFilters) -> ApiResult<DashboardStats> {
        self.get(
            "/transactions/stats/dashboard",
            &filters.period_only().query_pairs(),
            "stats",
        )
    }

    fn category_stats(&self, filters: &TransactionFilters) -> ApiResult<Vec<CategoryStats>> {
        self.get(
            "/transactions/stats/categories",
            &filters.period_only().query_pairs(),
            "stats",
        )
    }

    fn budgets(&self, filters: &BudgetFilters) -> ApiResult<Vec<BudgetWithProgress>> {
        self.get("/budgets", &filters.query_pairs(), "budget")
    }

    fn budget(&self, id: &str) -> ApiResult<BudgetWithProgress> {
        self.get(&format!("/budgets/{id}"), &[], "budget")
    }

    fn create_budget(&mut self, data: &CreateBudget) -> ApiResult<Budget> {
        data.validate()?;
        self.send(Method::POST, "/budgets", data, "budget")
    }

    fn update_budget(&mut self, id: &str, data: &UpdateBudget) -> ApiResult<Budget> {
        data.validate()?;
        self.send(Method::PUT, &format!("/budgets/{id}"), data, "budget")
    }

    fn delete_budget(&mut self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/budgets/{id}"), "budget")
    }
}

pub(crate) fn build_url(base: &str, path: &str, query: &[(&str, String)]) -> ApiResult<Url> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let url = if query.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, query.iter().map(|(k, v)| (*k, v.as_str())))
    };
    url.map_err(|e| ApiError::Transport(format!("{raw}: {e}")))
}

fn decode<T: DeserializeOwned>(resp: Response, resource: &'static str, path: &str) -> ApiResult<T> {
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(error_for_status(status, &body, resource, path));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Map a non-success response to an [`ApiError`], preferring the server's
/// own `message` field.
pub(crate) fn error_for_status(
    status: StatusCode,
    body: &str,
    resource: &'static str,
    path: &str,
) -> ApiError {
    let message = server_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    warn!(status = status.as_u16(), %path, %message, "api error");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => {
            let id = path.rsplit('/').next().unwrap_or_default();
            ApiError::not_found(resource, id)
        }
        StatusCode::CONFLICT => ApiError::Conflict(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
