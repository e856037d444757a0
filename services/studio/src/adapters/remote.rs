//! services/studio/src/adapters/remote.rs
//!
//! The client for the remote Freeplotter API. One adapter implements every
//! remote port: question prompts, "show don't tell" rewrites, outline
//! generation, license validation and purchase orders.
//!
//! Every answer is either the expected payload or an error envelope of the
//! form `{ "error": true, "message": ..., "cause": ... }`.

use async_trait::async_trait;
use chrono::SecondsFormat;
use freeplotter_core::domain::{
    GeneratedOutline, LicenseKey, OrderReceipt, OrderSubmission, OutlineRequest, OutlineSection,
    QuestionRequest, ShowingRequest,
};
use freeplotter_core::ports::{
    LicenseService, OrderService, OutlineService, PortError, PortResult, PreferenceStore,
    PromptService, ShowingService,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const LICENSE_HEADER: &str = "X-License-Key";

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Serialize)]
struct QuestionBody<'a> {
    sentences: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    paragraph: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QuestionReply {
    question: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowingBody<'a> {
    paragraph: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_paragraph: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ShowingReply {
    story: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutlineBody<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    genre: &'a str,
    num_chapters: u8,
    plots: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OutlineReply {
    premise: String,
    #[serde(default)]
    outline: Vec<SectionReply>,
}

#[derive(Debug, Deserialize)]
struct SectionReply {
    title: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseReply {
    is_valid: bool,
}

#[derive(Debug, Deserialize)]
struct OrderReply {
    license_key: String,
    start_date: String,
    end_date: String,
}

/// Either the error envelope or the success payload.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Failure {
        error: bool,
        #[serde(default)]
        message: String,
        #[serde(default)]
        cause: serde_json::Value,
    },
    Success(T),
}

impl<T> Envelope<T> {
    fn into_result(self) -> PortResult<T> {
        match self {
            Envelope::Success(payload) => Ok(payload),
            Envelope::Failure {
                error: true,
                message,
                cause,
            } => Err(PortError::Remote {
                message,
                cause: describe_cause(cause),
            }),
            Envelope::Failure { message, .. } => Err(PortError::Transport(format!(
                "Unrecognized response: {}",
                message
            ))),
        }
    }
}

fn describe_cause(cause: serde_json::Value) -> String {
    match cause {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Talks to the Freeplotter API over HTTP.
#[derive(Clone)]
pub struct RemoteApiAdapter {
    client: Client,
    base_url: String,
    preferences: Arc<dyn PreferenceStore>,
}

impl RemoteApiAdapter {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        preferences: Arc<dyn PreferenceStore>,
    ) -> PortResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            preferences,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The stored license key, or an empty header value when there is none.
    async fn license_header(&self) -> PortResult<String> {
        Ok(self
            .preferences
            .license_key()
            .await?
            .map(|key| key.as_str().to_string())
            .unwrap_or_default())
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> PortResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .post(self.api_url(path))
            .header(LICENSE_HEADER, self.license_header().await?)
            .json(body);
        self.send(path, request).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> PortResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;
        debug!("{} answered with status {}", path, status);

        let envelope: Envelope<T> = serde_json::from_slice(&bytes).map_err(|e| {
            PortError::Transport(format!("{} returned an unreadable body ({}): {}", path, status, e))
        })?;
        envelope.into_result()
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl PromptService for RemoteApiAdapter {
    async fn next_question(&self, request: &QuestionRequest) -> PortResult<String> {
        let body = QuestionBody {
            sentences: &request.sentences,
            paragraph: request.paragraph.as_deref(),
        };
        let reply: QuestionReply = self.post_json("/story/question", &body).await?;
        Ok(reply.question)
    }
}

#[async_trait]
impl ShowingService for RemoteApiAdapter {
    async fn show_dont_tell(&self, request: &ShowingRequest) -> PortResult<String> {
        let body = ShowingBody {
            paragraph: &request.paragraph,
            prev_paragraph: request.prev_paragraph.as_deref(),
        };
        let reply: ShowingReply = self.post_json("/story/showing", &body).await?;
        Ok(reply.story)
    }
}

#[async_trait]
impl OutlineService for RemoteApiAdapter {
    async fn generate_outline(&self, request: &OutlineRequest) -> PortResult<GeneratedOutline> {
        let body = OutlineBody {
            title: &request.title,
            summary: request.summary.as_deref(),
            genre: &request.genre,
            num_chapters: request.num_chapters,
            plots: &request.plots,
        };
        let reply: OutlineReply = self.post_json("/outline/generate", &body).await?;
        Ok(GeneratedOutline {
            premise: reply.premise,
            outline: reply
                .outline
                .into_iter()
                .map(|section| OutlineSection {
                    title: section.title,
                    content: section.content,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl LicenseService for RemoteApiAdapter {
    async fn validate_license(&self, key: &LicenseKey) -> PortResult<bool> {
        let path = "/license-key";
        let request = self
            .client
            .get(self.api_url(path))
            .header(LICENSE_HEADER, self.license_header().await?)
            .query(&[("key", key.as_str())]);
        let reply: LicenseReply = self.send(path, request).await?;
        Ok(reply.is_valid)
    }
}

#[async_trait]
impl OrderService for RemoteApiAdapter {
    async fn submit_order(&self, order: &OrderSubmission) -> PortResult<OrderReceipt> {
        let path = "/order";
        let receipt = Part::bytes(order.receipt.bytes.clone())
            .file_name(order.receipt.file_name.clone())
            .mime_str(&order.receipt.content_type)
            .map_err(|e| PortError::Validation(format!("Unsupported receipt type: {}", e)))?;

        let mut form = Form::new()
            .text("name", order.name.clone())
            .text("email", order.email.clone())
            .text("license_type", order.license_type.code().to_string())
            .text("price", order.price.to_string())
            .text(
                "start_date",
                order.start_date.to_rfc3339_opts(SecondsFormat::Millis, true),
            )
            .text(
                "end_date",
                order.end_date.to_rfc3339_opts(SecondsFormat::Millis, true),
            );
        if let Some(phone) = &order.phone {
            form = form.text("phone", phone.clone());
        }
        form = form.part("tximg", receipt);

        let request = self.client.post(self.api_url(path)).multipart(form);
        let reply: OrderReply = self.send(path, request).await?;
        Ok(OrderReceipt {
            license_key: reply.license_key,
            start_date: reply.start_date,
            end_date: reply.end_date,
        })
    }
}
