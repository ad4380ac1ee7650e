use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use shared::{
    domain::{
        OrderId, OrderState, PaymentState, ProposalId, DEFAULT_CUSTOM_MESSAGE,
        MAX_CUSTOM_MESSAGE_CHARS, MAX_VALENTINE_NAME_CHARS,
    },
    error::{ApiError, ErrorCode},
    protocol::{
        CreateOrderRequest, CreateProposalRequest, OrderInfo, PricingInfo, ProposalRecord,
        ServerEvent, VerifyPaymentRequest, VerifyPaymentResponse,
    },
};
use storage::{Storage, StoredOrder, StoredProposal};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_PRICE_MINOR: i64 = 24900;
pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_DISPLAY_PRICE: &str = "₹249";

const LIST_LIMIT: u32 = 1000;

/// Checkout signing material. The gateway itself stays out of scope; the
/// server only checks the signature the checkout flow hands back.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub key_id: String,
    pub secret: String,
}

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub checkout: CheckoutConfig,
}

pub async fn create_proposal(
    ctx: &ApiContext,
    req: CreateProposalRequest,
) -> Result<ProposalRecord, ApiError> {
    let (valentine_name, custom_message) =
        validate_content(&req.valentine_name, req.custom_message.as_deref())?;

    let stored = StoredProposal {
        id: ProposalId::generate(),
        valentine_name,
        custom_message,
        character_choice: req.character_choice,
        created_at: Utc::now(),
        accepted: None,
        accepted_at: None,
        // The free path stores an already-active proposal.
        paid: true,
        payment_state: PaymentState::Completed,
    };
    ctx.storage.insert_proposal(&stored).await.map_err(internal)?;
    Ok(proposal_record(stored))
}

pub async fn fetch_proposal(
    ctx: &ApiContext,
    id: &ProposalId,
) -> Result<ProposalRecord, ApiError> {
    let stored = ctx
        .storage
        .load_proposal(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "proposal not found"))?;
    Ok(proposal_record(stored))
}

pub async fn list_proposals(ctx: &ApiContext) -> Result<Vec<ProposalRecord>, ApiError> {
    let stored = ctx
        .storage
        .list_proposals(LIST_LIMIT)
        .await
        .map_err(internal)?;
    Ok(stored.into_iter().map(proposal_record).collect())
}

/// Records the recipient's answer and returns the updated record plus the
/// event to fan out to live watchers.
pub async fn answer_proposal(
    ctx: &ApiContext,
    id: &ProposalId,
    accepted: bool,
) -> Result<(ProposalRecord, ServerEvent), ApiError> {
    let answered_at = Utc::now();
    let updated = ctx
        .storage
        .record_answer(id, accepted, answered_at)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::new(ErrorCode::NotFound, "proposal not found"));
    }

    let record = fetch_proposal(ctx, id).await?;
    let event = ServerEvent::ProposalAnswered {
        proposal_id: id.clone(),
        accepted,
        answered_at,
    };
    Ok((record, event))
}

/// Reads the fee, seeding the defaults on first access.
pub async fn current_pricing(ctx: &ApiContext) -> Result<PricingInfo, ApiError> {
    if let Some(pricing) = ctx.storage.pricing().await.map_err(internal)? {
        return Ok(PricingInfo {
            amount_minor: pricing.amount_minor,
            currency: pricing.currency,
            display_price: pricing.display_price,
        });
    }

    ctx.storage
        .upsert_pricing(
            DEFAULT_PRICE_MINOR,
            DEFAULT_CURRENCY,
            DEFAULT_DISPLAY_PRICE,
            Utc::now(),
        )
        .await
        .map_err(internal)?;
    Ok(PricingInfo {
        amount_minor: DEFAULT_PRICE_MINOR,
        currency: DEFAULT_CURRENCY.to_string(),
        display_price: DEFAULT_DISPLAY_PRICE.to_string(),
    })
}

pub async fn update_pricing(
    ctx: &ApiContext,
    amount_minor: i64,
    display_price: &str,
) -> Result<PricingInfo, ApiError> {
    if amount_minor <= 0 {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "amount must be positive",
        ));
    }
    ctx.storage
        .upsert_pricing(amount_minor, DEFAULT_CURRENCY, display_price, Utc::now())
        .await
        .map_err(internal)?;
    Ok(PricingInfo {
        amount_minor,
        currency: DEFAULT_CURRENCY.to_string(),
        display_price: display_price.to_string(),
    })
}

/// Creates a pending (unpaid) proposal together with its checkout order,
/// priced from the current settings.
pub async fn create_payment_order(
    ctx: &ApiContext,
    req: CreateOrderRequest,
) -> Result<OrderInfo, ApiError> {
    let (valentine_name, custom_message) =
        validate_content(&req.valentine_name, req.custom_message.as_deref())?;
    let pricing = current_pricing(ctx).await?;

    let stored = StoredProposal {
        id: ProposalId::generate(),
        valentine_name,
        custom_message,
        character_choice: req.character_choice,
        created_at: Utc::now(),
        accepted: None,
        accepted_at: None,
        paid: false,
        payment_state: PaymentState::Pending,
    };
    ctx.storage.insert_proposal(&stored).await.map_err(internal)?;

    let order = StoredOrder {
        order_id: OrderId::generate(),
        proposal_id: stored.id.clone(),
        amount_minor: pricing.amount_minor,
        currency: pricing.currency.clone(),
        state: OrderState::Created,
        created_at: Utc::now(),
        payment_ref: None,
        paid_at: None,
    };
    ctx.storage.insert_order(&order).await.map_err(internal)?;
    tracing::info!(order_id = %order.order_id, proposal_id = %order.proposal_id, "checkout order created");

    Ok(OrderInfo {
        order_id: order.order_id,
        proposal_id: order.proposal_id,
        amount_minor: order.amount_minor,
        currency: order.currency,
        state: order.state,
        key_id: ctx.checkout.key_id.clone(),
    })
}

/// Verifies the checkout signature and activates the proposal. Returns the
/// updated record plus the event for live watchers.
pub async fn verify_payment(
    ctx: &ApiContext,
    req: VerifyPaymentRequest,
) -> Result<(VerifyPaymentResponse, ServerEvent), ApiError> {
    let order = ctx
        .storage
        .load_order(&req.order_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "order not found"))?;
    if order.proposal_id != req.proposal_id {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "order does not belong to proposal",
        ));
    }

    if !verify_checkout_signature(
        &ctx.checkout.secret,
        &req.order_id,
        &req.payment_ref,
        &req.signature,
    ) {
        return Err(ApiError::new(
            ErrorCode::PaymentRejected,
            "invalid payment signature",
        ));
    }

    ctx.storage
        .mark_order_paid(&req.order_id, &req.payment_ref, Utc::now())
        .await
        .map_err(internal)?;
    ctx.storage
        .mark_proposal_paid(&req.proposal_id)
        .await
        .map_err(internal)?;

    let proposal = fetch_proposal(ctx, &req.proposal_id).await?;
    let event = ServerEvent::ProposalPaid {
        proposal_id: req.proposal_id.clone(),
        order_id: req.order_id.clone(),
    };
    Ok((
        VerifyPaymentResponse {
            success: true,
            proposal,
        },
        event,
    ))
}

/// HMAC-SHA256 over `"{order_id}|{payment_ref}"`, hex-encoded. This is the
/// payload the checkout flow signs on completion.
pub fn checkout_signature(secret: &str, order_id: &OrderId, payment_ref: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("{order_id}|{payment_ref}").as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}

pub fn verify_checkout_signature(
    secret: &str,
    order_id: &OrderId,
    payment_ref: &str,
    signature: &str,
) -> bool {
    let Some(provided) = hex_decode(signature) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("{order_id}|{payment_ref}").as_bytes());
    mac.verify_slice(&provided).is_ok()
}

fn validate_content(
    name: &str,
    message: Option<&str>,
) -> Result<(String, String), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "valentine_name cannot be empty",
        ));
    }
    if name.chars().count() > MAX_VALENTINE_NAME_CHARS {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("valentine_name exceeds {MAX_VALENTINE_NAME_CHARS} characters"),
        ));
    }

    let message = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_CUSTOM_MESSAGE);
    if message.chars().count() > MAX_CUSTOM_MESSAGE_CHARS {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("custom_message exceeds {MAX_CUSTOM_MESSAGE_CHARS} characters"),
        ));
    }

    Ok((name.to_string(), message.to_string()))
}

fn proposal_record(stored: StoredProposal) -> ProposalRecord {
    ProposalRecord {
        id: stored.id,
        valentine_name: stored.valentine_name,
        custom_message: stored.custom_message,
        character_choice: stored.character_choice,
        created_at: stored.created_at,
        accepted: stored.accepted,
        accepted_at: stored.accepted_at,
        paid: stored.paid,
        payment_state: stored.payment_state,
    }
}

fn internal(e: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, e.to_string())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn hex_decode(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(text.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
