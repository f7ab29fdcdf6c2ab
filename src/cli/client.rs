use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

/// Failure reported by the server in its `{success: false, error, code}` envelope
#[derive(Debug, thiserror::Error)]
#[error("{message} ({status})")]
pub struct ApiFailure {
    pub status: StatusCode,
    pub code: Option<String>,
    pub message: String,
}

/// Thin HTTP client over the superuser API
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> anyhow::Result<Self> {
        let base = Url::parse(server)
            .map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", server, e))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, base, token })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the server URL, appending `query` pairs encoded
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> anyhow::Result<Url> {
        let mut url = self.base.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(Method::GET, self.url(path, &[])?, None).await
    }

    pub async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> anyhow::Result<Value> {
        self.send(Method::GET, self.url(path, query)?, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> anyhow::Result<Value> {
        self.send(Method::POST, self.url(path, &[])?, body).await
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> anyhow::Result<Value> {
        let mut request = self.http.request(method, url);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(payload);
        }

        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        let code = payload
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string);

        Err(ApiFailure {
            status,
            code,
            message,
        }
        .into())
    }

    /// Fails early when a command needs a bearer token and none was supplied
    pub fn require_token(&self) -> anyhow::Result<()> {
        if self.token.is_none() {
            anyhow::bail!("No API token; pass --token or set SUPERUSER_API_TOKEN");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_server_url() {
        assert!(ApiClient::new("not a url", None).is_err());
    }

    #[test]
    fn test_require_token() {
        let client = ApiClient::new("http://localhost:3000", None).unwrap();
        assert!(client.require_token().is_err());

        let client = ApiClient::new("http://localhost:3000", Some("abc".into())).unwrap();
        assert!(client.require_token().is_ok());
    }

    #[test]
    fn test_joins_paths_against_base() {
        let client = ApiClient::new("http://localhost:3000", None).unwrap();
        let url = client.url("/api/impersonate/status", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/impersonate/status");
    }

    #[test]
    fn test_query_values_are_encoded() {
        let client = ApiClient::new("http://localhost:3000", None).unwrap();
        let url = client
            .url("/api/impersonate/status", &[("impersonation_token", "a b&c=d")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/impersonate/status?impersonation_token=a+b%26c%3Dd"
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("impersonation_token".to_string(), "a b&c=d".to_string())]);
    }
}
