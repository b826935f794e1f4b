//! Testes de ponta a ponta pela camada HTTP (router + middleware + handlers).

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn public_routes_answer_without_token() {
    let app = TestApp::new();

    let health = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(health.status(), StatusCode::OK);

    let root = app.request(Method::GET, "/", None, None).await;
    assert_eq!(root.status(), StatusCode::OK);
    let body = response_json(root).await;
    assert!(body["name"].is_string());

    let docs = app.request(Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(docs.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let app = TestApp::new();

    let missing = app.request(Method::GET, "/api/orders", None, None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .request(Method::GET, "/api/auth/me", Some("nao-e-um-jwt"), None)
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(garbage).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn register_login_and_me() {
    let app = TestApp::new();

    let register = app
        .request(
            Method::POST,
            "/api/auth/register/consumer",
            None,
            Some(json!({
                "fullName": "Ana Souza",
                "restaurantName": "Cantina Roma",
                "email": "ana@cantina.test",
                "password": "segredo123"
            })),
        )
        .await;
    assert_eq!(register.status(), StatusCode::CREATED);
    let body = response_json(register).await;
    assert_eq!(body["tokenType"], "bearer");

    let duplicate = app
        .request(
            Method::POST,
            "/api/auth/register/consumer",
            None,
            Some(json!({
                "fullName": "Outra Ana",
                "restaurantName": "Outra Cantina",
                "email": "ana@cantina.test",
                "password": "segredo123"
            })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let invalid = app
        .request(
            Method::POST,
            "/api/auth/register/consumer",
            None,
            Some(json!({
                "fullName": "Bia",
                "restaurantName": "Bistrô",
                "email": "nao-e-email",
                "password": "123"
            })),
        )
        .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let body = response_json(invalid).await;
    assert!(body["details"]["email"].is_array());
    assert!(body["details"]["password"].is_array());

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@cantina.test", "password": "segredo123" })),
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let token = response_json(login).await["accessToken"]
        .as_str()
        .expect("access token")
        .to_string();

    let me = app
        .request(Method::GET, "/api/auth/me", Some(&token), None)
        .await;
    assert_eq!(me.status(), StatusCode::OK);
    let body = response_json(me).await;
    assert_eq!(body["role"], "CONSUMER");
    assert_eq!(body["restaurantName"], "Cantina Roma");
    assert!(body.get("passwordHash").is_none());

    let wrong = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@cantina.test", "password": "errada" })),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_guards_map_to_forbidden() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;

    let consumer_creates_product = app
        .request(
            Method::POST,
            "/api/supplier/products",
            Some(&consumer.token),
            Some(json!({ "name": "Tomate", "unit": "kg", "price": "7.90", "stockQuantity": 10 })),
        )
        .await;
    assert_eq!(consumer_creates_product.status(), StatusCode::FORBIDDEN);

    let owner_lists_suppliers = app
        .request(Method::GET, "/api/suppliers", Some(&supplier.token), None)
        .await;
    assert_eq!(owner_lists_suppliers.status(), StatusCode::FORBIDDEN);

    let consumer_lists_suppliers = app
        .request(Method::GET, "/api/suppliers", Some(&consumer.token), None)
        .await;
    assert_eq!(consumer_lists_suppliers.status(), StatusCode::OK);
    let body = response_json(consumer_lists_suppliers).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn order_flow_over_http() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;
    let consumer = app.register_consumer("Cantina Roma").await;

    // 1. Vínculo: pedido pelo consumidor, aprovação pelo dono
    let link = app
        .request(
            Method::POST,
            "/api/links",
            Some(&consumer.token),
            Some(json!({ "supplierId": supplier.supplier_id })),
        )
        .await;
    assert_eq!(link.status(), StatusCode::CREATED);
    let link_id = response_json(link).await["id"].as_i64().expect("link id");

    let approve = app
        .request(
            Method::POST,
            &format!("/api/links/{}/approve", link_id),
            Some(&supplier.token),
            None,
        )
        .await;
    assert_eq!(approve.status(), StatusCode::OK);
    assert_eq!(response_json(approve).await["status"], "APPROVED");

    // 2. Produto
    let product = app
        .request(
            Method::POST,
            "/api/supplier/products",
            Some(&supplier.token),
            Some(json!({
                "name": "Tomate",
                "unit": "kg",
                "price": "7.90",
                "stockQuantity": 10
            })),
        )
        .await;
    assert_eq!(product.status(), StatusCode::CREATED);
    let product_id = response_json(product).await["id"].as_i64().expect("product id");

    // 3. Pedido
    let order = app
        .request(
            Method::POST,
            "/api/orders",
            Some(&consumer.token),
            Some(json!({
                "supplierId": supplier.supplier_id,
                "items": [{ "productId": product_id, "quantity": 4 }]
            })),
        )
        .await;
    assert_eq!(order.status(), StatusCode::CREATED);
    let body = response_json(order).await;
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["totalAmount"], json!(dec!(31.60)));
    let order_id = body["id"].as_i64().expect("order id");

    // 4. Consumidor não muda status; dono aceita
    let by_consumer = app
        .request(
            Method::PUT,
            &format!("/api/orders/{}", order_id),
            Some(&consumer.token),
            Some(json!({ "status": "ACCEPTED" })),
        )
        .await;
    assert_eq!(by_consumer.status(), StatusCode::FORBIDDEN);

    let accept = app
        .request(
            Method::PUT,
            &format!("/api/orders/{}", order_id),
            Some(&supplier.token),
            Some(json!({ "status": "ACCEPTED" })),
        )
        .await;
    assert_eq!(accept.status(), StatusCode::OK);
    assert_eq!(response_json(accept).await["status"], "ACCEPTED");

    let again = app
        .request(
            Method::PUT,
            &format!("/api/orders/{}", order_id),
            Some(&supplier.token),
            Some(json!({ "status": "ACCEPTED" })),
        )
        .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    // 5. Detalhe e reclamação
    let detail = app
        .request(
            Method::GET,
            &format!("/api/orders/{}", order_id),
            Some(&consumer.token),
            None,
        )
        .await;
    assert_eq!(detail.status(), StatusCode::OK);
    let body = response_json(detail).await;
    assert_eq!(body["hasComplaint"], false);
    assert_eq!(body["items"][0]["product"]["stockQuantity"], 6);

    let complaint = app
        .request(
            Method::POST,
            &format!("/api/orders/{}/complaint", order_id),
            Some(&consumer.token),
            Some(json!({ "description": "Faltaram duas caixas" })),
        )
        .await;
    assert_eq!(complaint.status(), StatusCode::CREATED);
    let complaint_id = response_json(complaint).await["id"].as_i64().expect("complaint id");

    let resolve = app
        .request(
            Method::PUT,
            &format!("/api/complaints/{}", complaint_id),
            Some(&supplier.token),
            Some(json!({ "status": "RESOLVED" })),
        )
        .await;
    assert_eq!(resolve.status(), StatusCode::OK);
    let body = response_json(resolve).await;
    assert_eq!(body["status"], "RESOLVED");
    assert!(body["resolvedAt"].is_string());

    // 6. Mensagens
    let sent = app
        .request(
            Method::POST,
            &format!("/api/messages/{}", link_id),
            Some(&consumer.token),
            Some(json!({ "content": "Obrigada!" })),
        )
        .await;
    assert_eq!(sent.status(), StatusCode::CREATED);

    let thread = app
        .request(
            Method::GET,
            &format!("/api/messages/{}", link_id),
            Some(&supplier.token),
            None,
        )
        .await;
    assert_eq!(thread.status(), StatusCode::OK);
    let body = response_json(thread).await;
    assert_eq!(body[0]["content"], "Obrigada!");
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;

    let missing_order = app
        .request(Method::GET, "/api/orders/999", Some(&supplier.token), None)
        .await;
    assert_eq!(missing_order.status(), StatusCode::NOT_FOUND);

    let missing_product = app
        .request(
            Method::DELETE,
            "/api/supplier/products/999",
            Some(&supplier.token),
            None,
        )
        .await;
    assert_eq!(missing_product.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_prices_are_bounded_to_two_places() {
    let app = TestApp::new();
    let supplier = app.register_supplier("Hortifruti Sol").await;

    for price in ["79228162514264337593543950335", "100000000.00", "0.0001", "-1.00"] {
        let response = app
            .request(
                Method::POST,
                "/api/supplier/products",
                Some(&supplier.token),
                Some(json!({ "name": "Tomate", "unit": "kg", "price": price, "stockQuantity": 10 })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "preço {}", price);
        let body = response_json(response).await;
        assert!(body["details"]["price"].is_array());
    }

    let ceiling = app
        .request(
            Method::POST,
            "/api/supplier/products",
            Some(&supplier.token),
            Some(json!({ "name": "Trufa", "unit": "kg", "price": "99999999.99", "stockQuantity": 1 })),
        )
        .await;
    assert_eq!(ceiling.status(), StatusCode::CREATED);
}
