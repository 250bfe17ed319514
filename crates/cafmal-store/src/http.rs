use crate::error::{Result, StoreError};
use crate::AlertStore;
use async_trait::async_trait;
use cafmal_common::types::{AlertRule, Alerter, AlerterUpsert, Event, NewEvent};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of response body bytes kept in error messages.
const MAX_ERROR_BODY: usize = 500;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "jwt")]
    token: String,
}

/// Client for the monitoring API. Every request carries the bearer token
/// obtained at login.
pub struct HttpAlertStore {
    base_url: String,
    client: Client,
    token: String,
}

impl HttpAlertStore {
    /// Authenticates against `POST /v1/auth` and returns a client bound to
    /// the issued token.
    pub async fn login(
        base_url: &str,
        email: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = build_client(timeout)?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let endpoint = "/v1/auth";

        let response = client
            .post(format!("{base_url}{endpoint}"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let login: LoginResponse = read_json(endpoint, response).await?;
        tracing::debug!(base_url = %base_url, "Authenticated against API");

        Ok(Self {
            base_url,
            client,
            token: login.token,
        })
    }

    /// Builds a client around an already issued token.
    pub fn with_token(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
            token: token.to_string(),
        })
    }

    async fn call<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .request(method, format!("{}{endpoint}", self.base_url))
            .bearer_auth(&self.token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        read_json(endpoint, response).await
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T> {
        self.call::<(), T>(Method::GET, endpoint, query, None).await
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().use_rustls_tls().timeout(timeout).build()?)
}

async fn read_json<T: DeserializeOwned>(endpoint: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StoreError::Auth(format!(
            "{endpoint} returned {status}: {}",
            truncate(&body)
        )));
    }
    if !status.is_success() {
        return Err(StoreError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: truncate(&body),
        });
    }

    Ok(serde_json::from_str(&body)?)
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[async_trait]
impl AlertStore for HttpAlertStore {
    async fn list_alerters(&self) -> Result<Vec<Alerter>> {
        self.get("/v1/alerters", &[]).await
    }

    async fn create_alerter(&self, alerter: &AlerterUpsert) -> Result<Alerter> {
        self.call(Method::POST, "/v1/alerters", &[], Some(alerter)).await
    }

    async fn update_alerter(&self, alerter: &AlerterUpsert) -> Result<Alerter> {
        let id = alerter.id.ok_or_else(|| {
            StoreError::InvalidRequest(format!("alerter {} has no id to update", alerter.uuid))
        })?;
        self.call(Method::PUT, &format!("/v1/alerters/{id}"), &[], Some(alerter))
            .await
    }

    async fn list_alerts(&self) -> Result<Vec<AlertRule>> {
        self.get("/v1/alerts", &[]).await
    }

    async fn update_alert(&self, rule: &AlertRule) -> Result<AlertRule> {
        self.call(Method::PUT, &format!("/v1/alerts/{}", rule.id), &[], Some(rule))
            .await
    }

    async fn list_events(&self, since_secs: u64, window_secs: u64) -> Result<Vec<Event>> {
        self.get(
            "/v1/events",
            &[
                ("since_seconds", since_secs.to_string()),
                ("window_seconds", window_secs.to_string()),
            ],
        )
        .await
    }

    async fn create_event(&self, event: &NewEvent) -> Result<Event> {
        self.call(Method::POST, "/v1/events", &[], Some(event)).await
    }
}
