use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::json;

use crate::api::models::{ChatType, Conversation, Envelope, Message, PartnerQuery, PartnerRecord};
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};

/// REST client for the chat backend. All calls carry the configured
/// client-side timeout and the bearer token when one is set.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {}", token)),
            None => req,
        }
    }

    /// Cheap connectivity probe; returns the HTTP status code.
    pub async fn ping(&self) -> Result<u16> {
        let resp = self
            .with_auth(self.http.get(self.endpoint("/ping")))
            .send()
            .await?;
        Ok(resp.status().as_u16())
    }

    /// Idempotent create-or-get: returns the existing conversation for the
    /// participant pair (and order scope), creating one if none exists.
    /// Safe to call repeatedly with the same arguments.
    pub async fn create_or_get_chat(
        &self,
        user_one_id: &str,
        user_two_id: &str,
        order_id: Option<&str>,
        chat_type: ChatType,
    ) -> Result<Conversation> {
        let body = json!({
            "userOneId": user_one_id,
            "userTwoId": user_two_id,
            "orderId": order_id,
            "chatType": chat_type,
        });
        let resp = self
            .with_auth(self.http.post(self.endpoint("/chat")))
            .json(&body)
            .send()
            .await?;
        let envelope: Envelope<Conversation> = Self::decode(resp).await?;
        Ok(envelope.data)
    }

    /// Full ordered message history for one conversation, oldest first.
    pub async fn messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let endpoint = self.endpoint(&format!("/chat/{}/messages", chat_id));
        let resp = self.with_auth(self.http.get(endpoint)).send().await?;
        let envelope: Envelope<Vec<Message>> = Self::decode(resp).await?;
        Ok(envelope.data)
    }

    /// Counterpart records visible to the querying user, filtered by role,
    /// conversation type, and free-text search over name/email.
    pub async fn chat_partners(&self, query: &PartnerQuery) -> Result<Vec<PartnerRecord>> {
        let mut req = self.http.get(self.endpoint(&format!("/chat/{}", query.user_id)));
        if let Some(search) = &query.search {
            req = req.query(&[("search", search)]);
        }
        if let Some(role) = &query.role {
            req = req.query(&[("role", role)]);
        }
        if let Some(chat_type) = query.chat_type {
            req = req.query(&[("type", chat_type.as_str())]);
        }
        let resp = self.with_auth(req).send().await?;
        let envelope: Envelope<Vec<PartnerRecord>> = Self::decode(resp).await?;
        Ok(envelope.data)
    }

    /// Decode a response, converting non-2xx statuses into an error carrying
    /// the server's `message` field when the body provides one.
    async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json::<T>().await?)
    }
}
