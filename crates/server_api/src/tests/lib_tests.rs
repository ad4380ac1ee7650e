use super::*;

async fn test_context() -> ApiContext {
    ApiContext {
        storage: Storage::new("sqlite::memory:").await.expect("db"),
        checkout: CheckoutConfig {
            key_id: "devkey".to_string(),
            secret: "devsecret".to_string(),
        },
    }
}

fn create_request(name: &str) -> CreateProposalRequest {
    CreateProposalRequest {
        valentine_name: name.to_string(),
        custom_message: None,
        character_choice: "bear".to_string(),
    }
}

#[tokio::test]
async fn create_fills_defaults_and_marks_free_proposals_paid() {
    let ctx = test_context().await;
    let record = create_proposal(&ctx, create_request("  Asha  "))
        .await
        .expect("create");
    assert_eq!(record.valentine_name, "Asha");
    assert_eq!(record.custom_message, "Will you be my Valentine?");
    assert!(record.paid);
    assert_eq!(record.accepted, None);

    let fetched = fetch_proposal(&ctx, &record.id).await.expect("fetch");
    assert_eq!(fetched.valentine_name, "Asha");
}

#[tokio::test]
async fn create_rejects_blank_and_oversized_names() {
    let ctx = test_context().await;
    let err = create_proposal(&ctx, create_request("   "))
        .await
        .expect_err("blank name");
    assert!(matches!(err.code, ErrorCode::Validation));

    let err = create_proposal(&ctx, create_request(&"x".repeat(101)))
        .await
        .expect_err("long name");
    assert!(matches!(err.code, ErrorCode::Validation));
}

#[tokio::test]
async fn fetch_unknown_proposal_is_not_found() {
    let ctx = test_context().await;
    let err = fetch_proposal(&ctx, &ProposalId("ghost".to_string()))
        .await
        .expect_err("missing");
    assert!(matches!(err.code, ErrorCode::NotFound));
}

#[tokio::test]
async fn answer_stamps_acceptance_and_emits_the_event() {
    let ctx = test_context().await;
    let record = create_proposal(&ctx, create_request("Mira"))
        .await
        .expect("create");

    let (updated, event) = answer_proposal(&ctx, &record.id, true)
        .await
        .expect("answer");
    assert_eq!(updated.accepted, Some(true));
    assert!(updated.accepted_at.is_some());
    match event {
        ServerEvent::ProposalAnswered {
            proposal_id,
            accepted,
            ..
        } => {
            assert_eq!(proposal_id, record.id);
            assert!(accepted);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn pricing_seeds_defaults_then_honors_updates() {
    let ctx = test_context().await;
    let pricing = current_pricing(&ctx).await.expect("pricing");
    assert_eq!(pricing.amount_minor, DEFAULT_PRICE_MINOR);
    assert_eq!(pricing.display_price, DEFAULT_DISPLAY_PRICE);

    update_pricing(&ctx, 19900, "₹199").await.expect("update");
    let pricing = current_pricing(&ctx).await.expect("pricing");
    assert_eq!(pricing.amount_minor, 19900);
    assert_eq!(pricing.display_price, "₹199");

    let err = update_pricing(&ctx, 0, "free").await.expect_err("zero");
    assert!(matches!(err.code, ErrorCode::Validation));
}

#[tokio::test]
async fn paid_flow_verifies_signature_and_activates_the_proposal() {
    let ctx = test_context().await;
    let order = create_payment_order(
        &ctx,
        CreateOrderRequest {
            valentine_name: "Zoya".to_string(),
            custom_message: Some("Be mine?".to_string()),
            character_choice: "seal".to_string(),
        },
    )
    .await
    .expect("order");
    assert_eq!(order.amount_minor, DEFAULT_PRICE_MINOR);
    assert_eq!(order.key_id, "devkey");

    let pending = fetch_proposal(&ctx, &order.proposal_id)
        .await
        .expect("pending");
    assert!(!pending.paid);
    assert_eq!(pending.payment_state, PaymentState::Pending);

    let signature = checkout_signature(&ctx.checkout.secret, &order.order_id, "pay_42");
    let (response, event) = verify_payment(
        &ctx,
        VerifyPaymentRequest {
            order_id: order.order_id.clone(),
            proposal_id: order.proposal_id.clone(),
            payment_ref: "pay_42".to_string(),
            signature,
        },
    )
    .await
    .expect("verify");
    assert!(response.success);
    assert!(response.proposal.paid);
    assert_eq!(response.proposal.payment_state, PaymentState::Completed);
    assert!(matches!(event, ServerEvent::ProposalPaid { .. }));
}

#[tokio::test]
async fn tampered_signature_is_rejected_and_leaves_the_proposal_unpaid() {
    let ctx = test_context().await;
    let order = create_payment_order(
        &ctx,
        CreateOrderRequest {
            valentine_name: "Noor".to_string(),
            custom_message: None,
            character_choice: "panda".to_string(),
        },
    )
    .await
    .expect("order");

    let err = verify_payment(
        &ctx,
        VerifyPaymentRequest {
            order_id: order.order_id.clone(),
            proposal_id: order.proposal_id.clone(),
            payment_ref: "pay_42".to_string(),
            signature: "deadbeef".to_string(),
        },
    )
    .await
    .expect_err("bad signature");
    assert!(matches!(err.code, ErrorCode::PaymentRejected));

    let still_pending = fetch_proposal(&ctx, &order.proposal_id)
        .await
        .expect("fetch");
    assert!(!still_pending.paid);
}

#[tokio::test]
async fn verify_rejects_mismatched_proposal() {
    let ctx = test_context().await;
    let order = create_payment_order(
        &ctx,
        CreateOrderRequest {
            valentine_name: "Ira".to_string(),
            custom_message: None,
            character_choice: "bear".to_string(),
        },
    )
    .await
    .expect("order");

    let signature = checkout_signature(&ctx.checkout.secret, &order.order_id, "pay_1");
    let err = verify_payment(
        &ctx,
        VerifyPaymentRequest {
            order_id: order.order_id,
            proposal_id: ProposalId("someone-elses".to_string()),
            payment_ref: "pay_1".to_string(),
            signature,
        },
    )
    .await
    .expect_err("mismatch");
    assert!(matches!(err.code, ErrorCode::Validation));
}

#[test]
fn signature_round_trip_and_tamper_detection() {
    let order_id = OrderId("order_abc".to_string());
    let signature = checkout_signature("secret", &order_id, "pay_9");
    assert!(verify_checkout_signature("secret", &order_id, "pay_9", &signature));
    assert!(!verify_checkout_signature("secret", &order_id, "pay_8", &signature));
    assert!(!verify_checkout_signature("other", &order_id, "pay_9", &signature));
    assert!(!verify_checkout_signature("secret", &order_id, "pay_9", "zz"));
    assert!(!verify_checkout_signature("secret", &order_id, "pay_9", "abc"));
}
