use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use server_api::{ApiContext, CheckoutConfig};
use shared::{
    domain::ProposalId,
    error::{ApiError, ErrorCode},
    protocol::{
        CreateOrderRequest, CreateProposalRequest, OrderInfo, PricingInfo, ProposalAnswer,
        ProposalRecord, ServerEvent, UpdatePricingRequest, VerifyPaymentRequest,
        VerifyPaymentResponse,
    },
};
use storage::Storage;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
    events: broadcast::Sender<ServerEvent>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage,
        checkout: CheckoutConfig {
            key_id: settings.checkout_key_id,
            secret: settings.checkout_secret,
        },
    };
    let (events, _) = broadcast::channel(256);

    let state = AppState { api, events };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "proposal server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/proposals", post(http_create_proposal))
        .route("/proposals", get(http_list_proposals))
        .route("/proposals/:proposal_id", get(http_fetch_proposal))
        .route("/proposals/:proposal_id", patch(http_answer_proposal))
        .route("/settings/pricing", get(http_get_pricing))
        .route("/settings/pricing", post(http_update_pricing))
        .route("/payments/orders", post(http_create_order))
        .route("/payments/verify", post(http_verify_payment))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation | ErrorCode::PaymentRejected => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

async fn http_create_proposal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProposalRequest>,
) -> Result<Json<ProposalRecord>, (StatusCode, Json<ApiError>)> {
    let record = server_api::create_proposal(&state.api, req)
        .await
        .map_err(reject)?;
    let _ = state.events.send(ServerEvent::ProposalCreated {
        proposal: record.clone(),
    });
    Ok(Json(record))
}

async fn http_fetch_proposal(
    State(state): State<Arc<AppState>>,
    Path(proposal_id): Path<String>,
) -> Result<Json<ProposalRecord>, (StatusCode, Json<ApiError>)> {
    let record = server_api::fetch_proposal(&state.api, &ProposalId(proposal_id))
        .await
        .map_err(reject)?;
    Ok(Json(record))
}

async fn http_list_proposals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProposalRecord>>, (StatusCode, Json<ApiError>)> {
    let records = server_api::list_proposals(&state.api).await.map_err(reject)?;
    Ok(Json(records))
}

async fn http_answer_proposal(
    State(state): State<Arc<AppState>>,
    Path(proposal_id): Path<String>,
    Json(req): Json<ProposalAnswer>,
) -> Result<Json<ProposalRecord>, (StatusCode, Json<ApiError>)> {
    let (record, event) =
        server_api::answer_proposal(&state.api, &ProposalId(proposal_id), req.accepted)
            .await
            .map_err(reject)?;
    let _ = state.events.send(event);
    Ok(Json(record))
}

async fn http_get_pricing(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PricingInfo>, (StatusCode, Json<ApiError>)> {
    let pricing = server_api::current_pricing(&state.api).await.map_err(reject)?;
    Ok(Json(pricing))
}

async fn http_update_pricing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdatePricingRequest>,
) -> Result<Json<PricingInfo>, (StatusCode, Json<ApiError>)> {
    let pricing = server_api::update_pricing(&state.api, req.amount_minor, &req.display_price)
        .await
        .map_err(reject)?;
    Ok(Json(pricing))
}

async fn http_create_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<OrderInfo>, (StatusCode, Json<ApiError>)> {
    let order = server_api::create_payment_order(&state.api, req)
        .await
        .map_err(reject)?;
    Ok(Json(order))
}

async fn http_verify_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, (StatusCode, Json<ApiError>)> {
    let (response, event) = server_api::verify_payment(&state.api, req)
        .await
        .map_err(reject)?;
    let _ = state.events.send(event);
    Ok(Json(response))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    async fn test_app() -> (Router, Arc<AppState>) {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let api = ApiContext {
            storage,
            checkout: CheckoutConfig {
                key_id: "devkey".to_string(),
                secret: "devsecret".to_string(),
            },
        };
        let (events, _) = broadcast::channel(32);
        let state = Arc::new(AppState { api, events });
        (build_router(state.clone()), state)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn create_and_fetch_round_trip() {
        let (app, _) = test_app().await;
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/proposals",
                serde_json::json!({
                    "valentine_name": "Asha",
                    "character_choice": "bear"
                }),
            ))
            .await
            .expect("create response");
        assert_eq!(response.status(), StatusCode::OK);
        let created: ProposalRecord = json_body(response).await;
        assert_eq!(created.custom_message, "Will you be my Valentine?");

        let response = app
            .oneshot(
                Request::get(format!("/proposals/{}", created.id))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("fetch response");
        assert_eq!(response.status(), StatusCode::OK);
        let fetched: ProposalRecord = json_body(response).await;
        assert_eq!(fetched.valentine_name, "Asha");
    }

    #[tokio::test]
    async fn unknown_proposal_is_404() {
        let (app, _) = test_app().await;
        let response = app
            .oneshot(
                Request::get("/proposals/ghost")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (app, _) = test_app().await;
        let response = app
            .oneshot(json_request(
                "POST",
                "/proposals",
                serde_json::json!({
                    "valentine_name": "   ",
                    "character_choice": "bear"
                }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn answering_broadcasts_and_stamps_acceptance() {
        let (app, state) = test_app().await;
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/proposals",
                serde_json::json!({
                    "valentine_name": "Mira",
                    "character_choice": "seal"
                }),
            ))
            .await
            .expect("create response");
        let created: ProposalRecord = json_body(response).await;

        let mut events_rx = state.events.subscribe();
        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/proposals/{}", created.id),
                serde_json::json!({ "accepted": true }),
            ))
            .await
            .expect("answer response");
        assert_eq!(response.status(), StatusCode::OK);
        let answered: ProposalRecord = json_body(response).await;
        assert_eq!(answered.accepted, Some(true));
        assert!(answered.accepted_at.is_some());

        match events_rx.try_recv().expect("broadcast event") {
            ServerEvent::ProposalAnswered {
                proposal_id,
                accepted,
                ..
            } => {
                assert_eq!(proposal_id, created.id);
                assert!(accepted);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn pricing_defaults_are_served() {
        let (app, _) = test_app().await;
        let response = app
            .oneshot(
                Request::get("/settings/pricing")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let pricing: PricingInfo = json_body(response).await;
        assert_eq!(pricing.amount_minor, server_api::DEFAULT_PRICE_MINOR);
    }

    #[tokio::test]
    async fn paid_flow_activates_only_with_a_valid_signature() {
        let (app, _) = test_app().await;
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/payments/orders",
                serde_json::json!({
                    "valentine_name": "Zoya",
                    "character_choice": "panda"
                }),
            ))
            .await
            .expect("order response");
        assert_eq!(response.status(), StatusCode::OK);
        let order: OrderInfo = json_body(response).await;
        assert_eq!(order.key_id, "devkey");

        let bad = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/payments/verify",
                serde_json::json!({
                    "order_id": order.order_id,
                    "proposal_id": order.proposal_id,
                    "payment_ref": "pay_1",
                    "signature": "deadbeef"
                }),
            ))
            .await
            .expect("verify response");
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let signature = server_api::checkout_signature("devsecret", &order.order_id, "pay_1");
        let good = app
            .oneshot(json_request(
                "POST",
                "/payments/verify",
                serde_json::json!({
                    "order_id": order.order_id,
                    "proposal_id": order.proposal_id,
                    "payment_ref": "pay_1",
                    "signature": signature
                }),
            ))
            .await
            .expect("verify response");
        assert_eq!(good.status(), StatusCode::OK);
        let verified: VerifyPaymentResponse = json_body(good).await;
        assert!(verified.success);
        assert!(verified.proposal.paid);
    }
}
