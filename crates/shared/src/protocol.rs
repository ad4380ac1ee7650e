use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{OrderId, OrderState, PaymentState, ProposalId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProposalRequest {
    pub valentine_name: String,
    #[serde(default)]
    pub custom_message: Option<String>,
    pub character_choice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub valentine_name: String,
    pub custom_message: String,
    pub character_choice: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    pub paid: bool,
    pub payment_state: PaymentState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProposalAnswer {
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingInfo {
    pub amount_minor: i64,
    pub currency: String,
    pub display_price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePricingRequest {
    pub amount_minor: i64,
    pub display_price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub valentine_name: String,
    #[serde(default)]
    pub custom_message: Option<String>,
    pub character_choice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInfo {
    pub order_id: OrderId,
    pub proposal_id: ProposalId,
    pub amount_minor: i64,
    pub currency: String,
    pub state: OrderState,
    /// Publishable checkout key the client initializes the payment widget
    /// with.
    pub key_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: OrderId,
    pub proposal_id: ProposalId,
    pub payment_ref: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub proposal: ProposalRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    ProposalCreated {
        proposal: ProposalRecord,
    },
    ProposalAnswered {
        proposal_id: ProposalId,
        accepted: bool,
        answered_at: DateTime<Utc>,
    },
    ProposalPaid {
        proposal_id: ProposalId,
        order_id: OrderId,
    },
}
