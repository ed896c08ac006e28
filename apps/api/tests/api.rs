//! End-to-end tests over the HTTP router with an in-memory database.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use zarmind_api::cache::Cache;
use zarmind_api::config::ApiConfig;
use zarmind_api::services::users::UserService;
use zarmind_api::{build_router, AppState};
use zarmind_core::{NewUser, UserRole};
use zarmind_db::{Database, DbConfig};

struct TestApp {
    router: Router,
    state: Arc<AppState>,
}

impl TestApp {
    async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database");
        let state = Arc::new(AppState::new(db, Cache::disabled(), ApiConfig::for_tests()));
        TestApp {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Creates a user with `role` and returns a bearer token for them.
    async fn token(&self, role: UserRole) -> String {
        let name = role.as_str().to_ascii_lowercase();
        let user = UserService::new(&self.state.db)
            .create(NewUser {
                email: format!("{name}@zarmind.test"),
                username: name,
                password: "correct-horse".to_string(),
                role: Some(role),
                ..NewUser::default()
            })
            .await
            .expect("user");
        self.state.jwt.issue(&user, false).expect("token").token
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
    assert_eq!(body["cache"], "disabled");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/suppliers", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_role_guard_rejects_viewer() {
    let app = TestApp::new().await;
    let viewer = app.token(UserRole::Viewer).await;

    let (status, _) = app
        .send(Method::GET, "/api/suppliers", Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::GET, "/api/users", Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/suppliers",
            Some(&viewer),
            Some(json!({ "name": "Tala Gostar" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_record_is_not_found() {
    let app = TestApp::new().await;
    let admin = app.token(UserRole::Admin).await;

    let (status, body) = app
        .send(Method::GET, "/api/suppliers/does-not-exist", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["message"], "Supplier not found");
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new().await;
    app.token(UserRole::Manager).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "manager@zarmind.test", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["accessToken"].as_str().expect("access token").to_string();
    assert_eq!(body["tokenType"], "Bearer");

    let (status, me) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "MANAGER");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "manager@zarmind.test", "password": "wrong-horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_payable_payment_lifecycle() {
    let app = TestApp::new().await;
    let token = app.token(UserRole::Accountant).await;
    let manager = app.token(UserRole::Manager).await;

    let (status, supplier) = app
        .send(
            Method::POST,
            "/api/suppliers",
            Some(&manager),
            Some(json!({ "code": "SUPP-1", "name": "Tala Gostar" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let supplier_id = supplier["id"].as_str().expect("supplier id");

    let (status, record) = app
        .send(
            Method::POST,
            "/api/financials/accounts-payable",
            Some(&token),
            Some(json!({ "supplierId": supplier_id, "amount": 1000, "paidAmount": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["status"], "PENDING");
    assert_eq!(record["remainingAmount"], 1000.0);
    let payment_uri = format!(
        "/api/financials/accounts-payable/{}/payment",
        record["id"].as_str().expect("record id")
    );

    let (status, paid) = app
        .send(Method::POST, &payment_uri, Some(&token), Some(json!({ "paymentAmount": 400 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["success"], true);
    assert_eq!(paid["paidAmount"], 400.0);
    assert_eq!(paid["remainingAmount"], 600.0);
    assert_eq!(paid["status"], "PARTIAL");

    let (_, paid) = app
        .send(Method::POST, &payment_uri, Some(&token), Some(json!({ "paymentAmount": 600 })))
        .await;
    assert_eq!(paid["remainingAmount"], 0.0);
    assert_eq!(paid["status"], "PAID");

    let (status, _) = app
        .send(Method::POST, &payment_uri, Some(&token), Some(json!({ "paymentAmount": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let record_uri = payment_uri.trim_end_matches("/payment").to_string();
    let (_, after) = app.send(Method::GET, &record_uri, Some(&token), None).await;
    assert_eq!(after["paidAmount"], 1000.0);
    assert_eq!(after["remainingAmount"], 0.0);
    assert_eq!(after["status"], "PAID");
}

#[tokio::test]
async fn test_list_second_page() {
    let app = TestApp::new().await;
    let manager = app.token(UserRole::Manager).await;

    for n in 1..=25 {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/suppliers",
                Some(&manager),
                Some(json!({ "code": format!("SUPP-{n:02}"), "name": format!("Supplier {n}") })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = app
        .send(Method::GET, "/api/suppliers?page=2&limit=10", Some(&manager), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(10));
    assert_eq!(page["total"], 25);
    assert_eq!(page["page"], 2);
    assert_eq!(page["limit"], 10);
}

#[tokio::test]
async fn test_adjustment_below_zero_is_rejected() {
    let app = TestApp::new().await;
    let token = app.token(UserRole::WarehouseStaff).await;

    let (status, product) = app
        .send(
            Method::POST,
            "/api/inventory/products",
            Some(&token),
            Some(json!({ "name": "Gold ring", "category": "MANUFACTURED_PRODUCT", "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_uri = format!(
        "/api/inventory/products/{}",
        product["id"].as_str().expect("product id")
    );

    let (status, _) = app
        .send(
            Method::POST,
            &format!("{product_uri}/adjust"),
            Some(&token),
            Some(json!({ "adjustment": -5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after) = app.send(Method::GET, &product_uri, Some(&token), None).await;
    assert_eq!(after["quantity"], 3);
}

#[tokio::test]
async fn test_private_settings_hidden_from_non_admins() {
    let app = TestApp::new().await;
    let admin = app.token(UserRole::Admin).await;
    let viewer = app.token(UserRole::Viewer).await;

    for (key, public) in [("company.name", true), ("security.api_key", false)] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/settings",
                Some(&admin),
                Some(json!({ "key": key, "value": "x", "isPublic": public })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, listed) = app
        .send(Method::GET, "/api/settings?includePrivate=true", Some(&viewer), None)
        .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (_, listed) = app
        .send(Method::GET, "/api/settings?includePrivate=true", Some(&admin), None)
        .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(2));

    let (status, public) = app.send(Method::GET, "/api/settings/public", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public[0]["key"], "company.name");
}

#[tokio::test]
async fn test_out_of_range_amount_is_rejected() {
    let app = TestApp::new().await;
    let token = app.token(UserRole::Accountant).await;
    let manager = app.token(UserRole::Manager).await;

    let (_, customer) = app
        .send(
            Method::POST,
            "/api/crm/customers",
            Some(&manager),
            Some(json!({ "code": "CUST-1", "firstName": "Maryam", "lastName": "Rezaei", "phone": "09121234567" })),
        )
        .await;
    let customer_id = customer["id"].as_str().expect("customer id");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/financials/accounts-receivable",
            Some(&token),
            Some(json!({ "customerId": customer_id, "amount": 1e17 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, listed) = app
        .send(Method::GET, "/api/financials/accounts-receivable", Some(&token), None)
        .await;
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn test_work_order_lifecycle() {
    let app = TestApp::new().await;
    let manager = app.token(UserRole::Manager).await;

    let mut workshop_ids = Vec::new();
    for (code, name) in [("WS-1", "Zargar Tehran"), ("WS-2", "Noor Atelier")] {
        let (status, workshop) = app
            .send(
                Method::POST,
                "/api/workshops",
                Some(&manager),
                Some(json!({ "code": code, "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        workshop_ids.push(workshop["id"].as_str().expect("workshop id").to_string());
    }

    let (status, order) = app
        .send(
            Method::POST,
            "/api/workshops/work-orders",
            Some(&manager),
            Some(json!({ "workshopId": workshop_ids[0], "productName": "Bangle", "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PENDING");
    assert!(order["orderNumber"].as_str().expect("order number").starts_with("WO"));
    let order_uri = format!("/api/workshops/work-orders/{}", order["id"].as_str().expect("id"));

    let (status, started) = app
        .send(
            Method::PATCH,
            &format!("{order_uri}/status"),
            Some(&manager),
            Some(json!({ "status": "IN_PROGRESS" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "IN_PROGRESS");
    assert!(started["startDate"].is_string());

    let (status, moved) = app
        .send(
            Method::PATCH,
            &format!("{order_uri}/transfer"),
            Some(&manager),
            Some(json!({ "workshopId": workshop_ids[1], "reason": "capacity" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["workshopId"], workshop_ids[1].as_str());
    let notes = moved["notes"].as_str().expect("notes");
    assert!(notes.contains("Transferred from \"Zargar Tehran\" to \"Noor Atelier\" - Reason: capacity"));

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("{order_uri}/transfer"),
            Some(&manager),
            Some(json!({ "workshopId": workshop_ids[1] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("{order_uri}/quality"),
            Some(&manager),
            Some(json!({ "qualityRating": 6 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, rated) = app
        .send(
            Method::PATCH,
            &format!("{order_uri}/quality"),
            Some(&manager),
            Some(json!({ "qualityRating": 5, "qualityNotes": "clean solder" })),
        )
        .await;
    assert_eq!(rated["qualityRating"], 5);

    let (_, removed) = app.send(Method::DELETE, &order_uri, Some(&manager), None).await;
    assert_eq!(removed["message"], "Work order cancelled");
    let (_, removed) = app.send(Method::DELETE, &order_uri, Some(&manager), None).await;
    assert_eq!(removed["message"], "Work order deleted");
    let (status, _) = app.send(Method::GET, &order_uri, Some(&manager), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cash_balance_counts_movements_only() {
    let app = TestApp::new().await;
    let admin = app.token(UserRole::Admin).await;
    let cashier = app.token(UserRole::SalesStaff).await;

    let (status, branch) = app
        .send(
            Method::POST,
            "/api/management/branches",
            Some(&admin),
            Some(json!({ "code": "BR-1", "name": "Bazaar" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let branch_id = branch["id"].as_str().expect("branch id");

    for (kind, amount) in [("CASH_IN", 500), ("CASH_OUT", 120), ("OPENING_BALANCE", 9000)] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/financials/cash",
                Some(&cashier),
                Some(json!({ "type": kind, "amount": amount, "branchId": branch_id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, balance) = app
        .send(
            Method::GET,
            &format!("/api/financials/cash/balance?branchId={branch_id}"),
            Some(&cashier),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance["branchId"], branch_id);
    assert_eq!(balance["balance"], 380.0);

    let (_, overall) = app
        .send(Method::GET, "/api/financials/cash/balance", Some(&cashier), None)
        .await;
    assert_eq!(overall["branchId"], "ALL");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/financials/cash",
            Some(&cashier),
            Some(json!({ "type": "CASH_IN", "amount": 0, "branchId": branch_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
