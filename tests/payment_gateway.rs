use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    routing::post,
};
use axum_shop_api::{
    config::PaymentConfig,
    payment::{GatewayOrderRequest, PaymentError, PaymentGateway, RazorpayGateway},
};
use serde_json::{Value, json};

/// Serves `app` on an ephemeral local port and returns its base URL.
async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

fn config(api_base: String) -> PaymentConfig {
    PaymentConfig {
        key_id: "rzp_test_key".into(),
        key_secret: "rzp_test_secret".into(),
        api_base,
        currency: "INR".into(),
    }
}

fn order_request() -> GatewayOrderRequest {
    GatewayOrderRequest {
        amount: 49900,
        currency: "INR".into(),
        receipt: "rcpt_test".into(),
    }
}

async fn echo_order(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "description": "missing credentials" } })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": "order_test_1",
            "entity": "order",
            "amount": body["amount"],
            "currency": body["currency"],
            "receipt": body["receipt"],
            "status": "created"
        })),
    )
}

#[tokio::test]
async fn creates_order_with_minor_units_and_basic_auth() {
    let base = spawn(Router::new().route("/v1/orders", post(echo_order))).await;
    let gateway = RazorpayGateway::new(config(base)).expect("client");

    let order = gateway.create_order(&order_request()).await.expect("order");

    assert_eq!(order["id"], "order_test_1");
    assert_eq!(order["amount"], 49900);
    assert_eq!(order["currency"], "INR");
    assert_eq!(order["receipt"], "rcpt_test");
    assert_eq!(gateway.key_id(), "rzp_test_key");
    assert_eq!(gateway.currency(), "INR");
}

#[tokio::test]
async fn provider_error_carries_status_and_description() {
    let app = Router::new().route(
        "/v1/orders",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "code": "BAD_REQUEST_ERROR", "description": "amount exceeds maximum" } })),
            )
        }),
    );
    let base = spawn(app).await;
    let gateway = RazorpayGateway::new(config(base)).expect("client");

    match gateway.create_order(&order_request()).await {
        Err(PaymentError::Provider { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "amount exceeds maximum");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_gateway_is_a_network_error() {
    // Bind then drop so the port is very likely closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let gateway = RazorpayGateway::new(config(format!("http://{addr}"))).expect("client");
    assert!(matches!(
        gateway.create_order(&order_request()).await,
        Err(PaymentError::Network(_))
    ));
}
