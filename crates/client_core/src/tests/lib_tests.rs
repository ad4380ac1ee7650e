use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Path, WebSocketUpgrade,
    },
    http::StatusCode as AxumStatus,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use shared::{
    domain::PaymentState,
    error::ErrorCode,
};

use super::*;

fn sample_record(id: &str) -> ProposalRecord {
    ProposalRecord {
        id: ProposalId(id.to_string()),
        valentine_name: "Asha".to_string(),
        custom_message: "Will you be my Valentine?".to_string(),
        character_choice: "bear".to_string(),
        created_at: "2026-02-10T12:00:00Z".parse().expect("timestamp"),
        accepted: None,
        accepted_at: None,
        paid: true,
        payment_state: PaymentState::Completed,
    }
}

async fn mock_create(Json(req): Json<CreateProposalRequest>) -> Json<ProposalRecord> {
    let mut record = sample_record("created-1");
    record.valentine_name = req.valentine_name;
    Json(record)
}

async fn mock_fetch(
    Path(id): Path<String>,
) -> Result<Json<ProposalRecord>, (AxumStatus, Json<ApiError>)> {
    if id == "ghost" {
        return Err((
            AxumStatus::NOT_FOUND,
            Json(ApiError::new(
                shared::error::ErrorCode::NotFound,
                "proposal not found",
            )),
        ));
    }
    Ok(Json(sample_record(&id)))
}

async fn mock_create_order(Json(req): Json<CreateOrderRequest>) -> Json<OrderInfo> {
    Json(OrderInfo {
        order_id: shared::domain::OrderId("order_9".to_string()),
        proposal_id: ProposalId(format!("pending-{}", req.valentine_name.to_lowercase())),
        amount_minor: 24900,
        currency: "INR".to_string(),
        state: shared::domain::OrderState::Created,
        key_id: "devkey".to_string(),
    })
}

async fn mock_verify(
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, (AxumStatus, Json<ApiError>)> {
    if req.signature != "good" {
        return Err((
            AxumStatus::BAD_REQUEST,
            Json(ApiError::new(
                ErrorCode::PaymentRejected,
                "invalid payment signature",
            )),
        ));
    }
    let mut record = sample_record(&req.proposal_id.0);
    record.paid = true;
    Ok(Json(VerifyPaymentResponse {
        success: true,
        proposal: record,
    }))
}

async fn mock_list() -> Json<Vec<ProposalRecord>> {
    Json(vec![sample_record("abc"), sample_record("def")])
}

async fn mock_pricing() -> Json<PricingInfo> {
    Json(PricingInfo {
        amount_minor: 24900,
        currency: "INR".to_string(),
        display_price: "₹249".to_string(),
    })
}

async fn mock_update_pricing(Json(req): Json<UpdatePricingRequest>) -> Json<PricingInfo> {
    Json(PricingInfo {
        amount_minor: req.amount_minor,
        currency: "INR".to_string(),
        display_price: req.display_price,
    })
}

async fn mock_answer(
    Path(id): Path<String>,
    Json(req): Json<ProposalAnswer>,
) -> Json<ProposalRecord> {
    let mut record = sample_record(&id);
    record.accepted = Some(req.accepted);
    Json(record)
}

async fn mock_ws(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(push_one_event)
}

async fn push_one_event(mut socket: WebSocket) {
    let event = ServerEvent::ProposalAnswered {
        proposal_id: ProposalId("created-1".to_string()),
        accepted: true,
        answered_at: "2026-02-14T18:30:00Z".parse().expect("timestamp"),
    };
    let text = serde_json::to_string(&event).expect("serialize event");
    let _ = socket.send(WsMessage::Text(text)).await;
    let _ = socket.send(WsMessage::Close(None)).await;
}

async fn spawn_mock_server() -> String {
    let app = Router::new()
        .route("/proposals", post(mock_create))
        .route("/proposals", get(mock_list))
        .route("/proposals/:id", get(mock_fetch))
        .route("/proposals/:id", patch(mock_answer))
        .route("/settings/pricing", get(mock_pricing))
        .route("/settings/pricing", post(mock_update_pricing))
        .route("/payments/orders", post(mock_create_order))
        .route("/payments/verify", post(mock_verify))
        .route("/ws", get(mock_ws));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn create_round_trips_through_the_wire() {
    let base = spawn_mock_server().await;
    let client = ProposalClient::new(&base);

    let record = client
        .create_proposal(&CreateProposalRequest {
            valentine_name: "Mira".to_string(),
            custom_message: None,
            character_choice: "seal".to_string(),
        })
        .await
        .expect("create");
    assert_eq!(record.valentine_name, "Mira");
    assert_eq!(record.id, ProposalId("created-1".to_string()));
}

#[tokio::test]
async fn not_found_surfaces_as_a_typed_api_error() {
    let base = spawn_mock_server().await;
    let client = ProposalClient::new(&base);

    let err = client
        .fetch_proposal(&ProposalId("ghost".to_string()))
        .await
        .expect_err("missing proposal");
    match err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(matches!(code, ErrorCode::NotFound));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let base = spawn_mock_server().await;
    let client = ProposalClient::new(&format!("{base}/"));
    let record = client
        .fetch_proposal(&ProposalId("abc".to_string()))
        .await
        .expect("fetch");
    assert_eq!(record.id, ProposalId("abc".to_string()));
}

#[tokio::test]
async fn listing_pricing_and_answers_round_trip() {
    let base = spawn_mock_server().await;
    let client = ProposalClient::new(&base);

    let listed = client.list_proposals().await.expect("list");
    assert_eq!(listed.len(), 2);

    let pricing = client.fetch_pricing().await.expect("pricing");
    assert_eq!(pricing.amount_minor, 24900);

    let updated = client
        .update_pricing(&UpdatePricingRequest {
            amount_minor: 19900,
            display_price: "₹199".to_string(),
        })
        .await
        .expect("update pricing");
    assert_eq!(updated.amount_minor, 19900);

    let answered = client
        .answer_proposal(&ProposalId("abc".to_string()), true)
        .await
        .expect("answer");
    assert_eq!(answered.accepted, Some(true));
}

#[tokio::test]
async fn checkout_flow_round_trips_and_rejections_are_typed() {
    let base = spawn_mock_server().await;
    let client = ProposalClient::new(&base);

    let order = client
        .create_payment_order(&CreateOrderRequest {
            valentine_name: "Zoya".to_string(),
            custom_message: None,
            character_choice: "panda".to_string(),
        })
        .await
        .expect("order");
    assert_eq!(order.amount_minor, 24900);

    let verified = client
        .verify_payment(&VerifyPaymentRequest {
            order_id: order.order_id.clone(),
            proposal_id: order.proposal_id.clone(),
            payment_ref: "pay_1".to_string(),
            signature: "good".to_string(),
        })
        .await
        .expect("verify");
    assert!(verified.success);
    assert!(verified.proposal.paid);

    let err = client
        .verify_payment(&VerifyPaymentRequest {
            order_id: order.order_id,
            proposal_id: order.proposal_id,
            payment_ref: "pay_1".to_string(),
            signature: "bad".to_string(),
        })
        .await
        .expect_err("rejected");
    match err {
        ClientError::Api { code, .. } => assert!(matches!(code, ErrorCode::PaymentRejected)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn event_subscription_decodes_broadcast_answers() {
    let base = spawn_mock_server().await;
    let client = ProposalClient::new(&base);

    let mut subscription = client.subscribe_events().await.expect("subscribe");
    match subscription.next_event().await.expect("event") {
        ServerEvent::ProposalAnswered {
            proposal_id,
            accepted,
            ..
        } => {
            assert_eq!(proposal_id, ProposalId("created-1".to_string()));
            assert!(accepted);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(subscription.next_event().await.is_none());
}
