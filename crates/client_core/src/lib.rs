//! HTTP/websocket client for the proposal server, used by the desktop app's
//! backend worker.

use futures::StreamExt;
use reqwest::{Client as HttpClient, Response, StatusCode};
use thiserror::Error;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::warn;

use shared::{
    domain::ProposalId,
    error::ApiError,
    protocol::{
        CreateOrderRequest, CreateProposalRequest, OrderInfo, PricingInfo, ProposalAnswer,
        ProposalRecord, ServerEvent, UpdatePricingRequest, VerifyPaymentRequest,
        VerifyPaymentResponse,
    },
};

pub mod share;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected request ({status}): {message}")]
    Api {
        status: StatusCode,
        code: shared::error::ErrorCode,
        message: String,
    },
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("event stream failure: {0}")]
    EventStream(String),
}

impl ClientError {
    fn from_api(status: StatusCode, error: ApiError) -> Self {
        Self::Api {
            status,
            code: error.code,
            message: error.message,
        }
    }
}

#[derive(Clone)]
pub struct ProposalClient {
    http: HttpClient,
    base_url: String,
}

impl ProposalClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_proposal(
        &self,
        req: &CreateProposalRequest,
    ) -> Result<ProposalRecord, ClientError> {
        let response = self
            .http
            .post(format!("{}/proposals", self.base_url))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn fetch_proposal(&self, id: &ProposalId) -> Result<ProposalRecord, ClientError> {
        let response = self
            .http
            .get(format!("{}/proposals/{}", self.base_url, id))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn list_proposals(&self) -> Result<Vec<ProposalRecord>, ClientError> {
        let response = self
            .http
            .get(format!("{}/proposals", self.base_url))
            .send()
            .await?;
        decode(response).await
    }

    /// Fire-and-forget from the widget's point of view; the backend worker
    /// still surfaces transport errors to the status line.
    pub async fn answer_proposal(
        &self,
        id: &ProposalId,
        accepted: bool,
    ) -> Result<ProposalRecord, ClientError> {
        let response = self
            .http
            .patch(format!("{}/proposals/{}", self.base_url, id))
            .json(&ProposalAnswer { accepted })
            .send()
            .await?;
        decode(response).await
    }

    pub async fn fetch_pricing(&self) -> Result<PricingInfo, ClientError> {
        let response = self
            .http
            .get(format!("{}/settings/pricing", self.base_url))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn update_pricing(
        &self,
        req: &UpdatePricingRequest,
    ) -> Result<PricingInfo, ClientError> {
        let response = self
            .http
            .post(format!("{}/settings/pricing", self.base_url))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn create_payment_order(
        &self,
        req: &CreateOrderRequest,
    ) -> Result<OrderInfo, ClientError> {
        let response = self
            .http
            .post(format!("{}/payments/orders", self.base_url))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn verify_payment(
        &self,
        req: &VerifyPaymentRequest,
    ) -> Result<VerifyPaymentResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/payments/verify", self.base_url))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    /// Opens the server's event firehose. The subscription ends when the
    /// server closes the socket; callers just loop on `next_event`.
    pub async fn subscribe_events(&self) -> Result<EventSubscription, ClientError> {
        let ws_url = websocket_url(&self.base_url)?;
        let (stream, _) = connect_async(&ws_url)
            .await
            .map_err(|err| ClientError::EventStream(err.to_string()))?;
        Ok(EventSubscription { stream })
    }
}

pub struct EventSubscription {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl EventSubscription {
    /// Next decoded server event, or `None` once the stream ends.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        while let Some(message) = self.stream.next().await {
            let text = match message {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            };
            match serde_json::from_str::<ServerEvent>(&text) {
                Ok(event) => return Some(event),
                Err(err) => {
                    warn!(%err, "skipping undecodable server event");
                    continue;
                }
            }
        }
        None
    }
}

fn websocket_url(base_url: &str) -> Result<String, ClientError> {
    let parsed = url::Url::parse(base_url)?;
    let scheme = match parsed.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let rest = base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    Ok(format!("{scheme}://{rest}/ws"))
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    match response.json::<ApiError>().await {
        Ok(error) => Err(ClientError::from_api(status, error)),
        Err(_) => Err(ClientError::Api {
            status,
            code: shared::error::ErrorCode::Internal,
            message: format!("server returned {status} with an unreadable body"),
        }),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
