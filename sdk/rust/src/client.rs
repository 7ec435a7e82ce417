//! HTTP client for the admin API

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::error::{AdminError, AdminErrorCode, Result, map_status_to_error_code};
use crate::types::*;

/// Admin API client.
///
/// Holds no credentials: every authenticated call takes the [`Session`]
/// returned by [`AdminClient::login`].
#[derive(Debug, Clone)]
pub struct AdminClient {
    base_url: Url,
    http: reqwest::Client,
}

impl AdminClient {
    /// `base_url` is the server root, e.g. `https://licence.example.com`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AdminError::new(AdminErrorCode::ValidationError, e.to_string()))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(&format!("api/admin/{}", path))
            .map_err(|e| AdminError::new(AdminErrorCode::ValidationError, e.to_string()))?;
        Ok(self.http.request(method, url))
    }

    fn authed(&self, method: Method, path: &str, session: &Session) -> Result<RequestBuilder> {
        Ok(self.request(method, path)?.bearer_auth(&session.token))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| AdminError::network(e.to_string()))?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status().as_u16();
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| AdminError::network(format!("Invalid response body: {}", e)));
        }

        let (message, code) = match response.json::<ErrorBody>().await {
            Ok(body) => (body.error, body.code),
            Err(_) => (format!("Request failed with status {}", status), String::new()),
        };
        Err(AdminError::with_status(
            map_status_to_error_code(status, &code),
            message,
            status,
        ))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let builder = self
            .request(Method::POST, "login")?
            .json(&json!({ "email": email, "password": password }));
        Self::send(builder).await
    }

    pub async fn logout(&self, session: &Session) -> Result<()> {
        let _: serde_json::Value = Self::send(self.authed(Method::POST, "logout", session)?).await?;
        Ok(())
    }

    pub async fn stats(&self, session: &Session) -> Result<Stats> {
        Self::send(self.authed(Method::GET, "stats", session)?).await
    }

    pub async fn list_product_keys(&self, session: &Session) -> Result<Vec<ProductKey>> {
        Self::send(self.authed(Method::GET, "product-keys", session)?).await
    }

    pub async fn generate_product_key(&self, session: &Session) -> Result<GeneratedKey> {
        Self::send(self.authed(Method::POST, "product-keys", session)?).await
    }

    pub async fn list_shops(&self, session: &Session) -> Result<Vec<Shop>> {
        Self::send(self.authed(Method::GET, "shops", session)?).await
    }

    pub async fn delete_shop(&self, session: &Session, shop_id: &str) -> Result<()> {
        let path = format!("shops/{}", shop_id);
        let _: serde_json::Value = Self::send(self.authed(Method::DELETE, &path, session)?).await?;
        Ok(())
    }

    pub async fn list_devices(&self, session: &Session) -> Result<Vec<Device>> {
        Self::send(self.authed(Method::GET, "devices", session)?).await
    }

    pub async fn list_subscriptions(&self, session: &Session) -> Result<Vec<Subscription>> {
        Self::send(self.authed(Method::GET, "subscriptions", session)?).await
    }

    pub async fn mark_paid(&self, session: &Session, shop_id: &str) -> Result<Subscription> {
        let path = format!("subscriptions/{}/mark-paid", shop_id);
        Self::send(self.authed(Method::POST, &path, session)?).await
    }
}
