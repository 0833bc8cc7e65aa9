use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use outletops_auth::{JwtClaims, PrincipalId, Role};
use outletops_core::OutletId;
use outletops_infra::config::AppConfig;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let config = AppConfig {
            jwt_secret: SECRET.to_string(),
            low_stock_threshold: 2,
            using_default_secret: false,
            ..AppConfig::default()
        };
        let app = outletops_api::app::build_app(&config);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint(role: Role, outlet_id: Option<OutletId>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        role,
        outlet_id,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn owner() -> String {
    mint(Role::Owner, None)
}

/// Register an outlet and a product, stock the outlet with `quantity`.
async fn seed(srv: &TestServer, quantity: i64) -> (String, String) {
    let owner = owner();
    let (status, outlet) = srv
        .post(
            &owner,
            "/outlets",
            json!({"name": "Kandy", "address": "Temple St", "contact": {"phone": "081222"}}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let outlet_id = outlet["id"].as_str().unwrap().to_string();

    let (status, product) = srv
        .post(
            &owner,
            "/products",
            json!({"name": "Rice", "category": "grocery", "unitPrice": 250, "measuringUnit": "kilogram"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, entry) = srv
        .post(
            &owner,
            &format!("/stock/{outlet_id}/{product_id}/adjust"),
            json!({"delta": quantity}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["quantity"], quantity);

    (outlet_id, product_id)
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .get(srv.url("/orders"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_and_unscoped_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let now = Utc::now();
    let expired = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &JwtClaims {
            sub: PrincipalId::new(),
            role: Role::Owner,
            outlet_id: None,
            issued_at: now - ChronoDuration::hours(2),
            expires_at: now - ChronoDuration::hours(1),
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let (status, _) = srv.get(&expired, "/whoami").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = srv.get(&mint(Role::OutletStaff, None), "/whoami").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_the_token() {
    let srv = TestServer::spawn().await;
    let outlet = OutletId::new();

    let (status, body) = srv.get(&mint(Role::OutletStaff, Some(outlet)), "/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "outlet_staff");
    assert_eq!(body["outletId"], outlet.to_string());
    let actions = body["permittedActions"].as_array().unwrap();
    assert!(actions.iter().any(|a| a == "place_customer_order"));
    assert!(!actions.iter().any(|a| a == "manage_catalog"));
}

#[tokio::test]
async fn customer_order_lifecycle() {
    let srv = TestServer::spawn().await;
    let (outlet_id, product_id) = seed(&srv, 10).await;
    let staff = mint(Role::OutletStaff, Some(outlet_id.parse().unwrap()));

    let (status, order) = srv
        .post(
            &staff,
            "/orders/customer",
            json!({
                "outletId": outlet_id,
                "items": [{"productId": product_id, "quantity": 4, "discountPerUnit": 50}],
                "customerName": "Sunil",
                "customerPhone": "0712345678"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["total"], 800);
    let order_id = order["id"].as_str().unwrap().to_string();

    let (_, stock) = srv.get(&staff, &format!("/stock/{outlet_id}")).await;
    assert_eq!(stock[0]["quantity"], 6);

    let (status, done) = srv
        .put(&staff, &format!("/orders/{order_id}/status"), json!({"status": "completed"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");
    assert!(done["completedAt"].is_string());

    let (status, err) = srv
        .put(&staff, &format!("/orders/{order_id}/status"), json!({"status": "cancelled"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "invalid_transition");

    let (status, listed) = srv.get(&staff, "/orders?status=completed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn insufficient_stock_reports_shortfalls() {
    let srv = TestServer::spawn().await;
    let (outlet_id, product_id) = seed(&srv, 3).await;

    let (status, err) = srv
        .post(
            &owner(),
            "/orders/customer",
            json!({
                "outletId": outlet_id,
                "items": [{"productId": product_id, "quantity": 5}],
                "customerName": "Mala",
                "customerPhone": "0770000000"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "insufficient_stock");
    assert_eq!(err["shortfalls"][0]["productId"], product_id);
    assert_eq!(err["shortfalls"][0]["requested"], 5);
    assert_eq!(err["shortfalls"][0]["available"], 3);

    let (_, orders) = srv.get(&owner(), "/orders").await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn factory_order_delivery_restocks_the_outlet() {
    let srv = TestServer::spawn().await;
    let (outlet_id, product_id) = seed(&srv, 1).await;
    let staff = mint(Role::OutletStaff, Some(outlet_id.parse().unwrap()));
    let factory = mint(Role::FactoryStaff, None);

    let (status, order) = srv
        .post(
            &staff,
            "/orders/factory",
            json!({"outletId": outlet_id, "items": [{"productId": product_id, "quantity": 50}]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    let order_id = order["id"].as_str().unwrap().to_string();

    // Outlet staff cannot deliver factory orders.
    let (status, _) = srv
        .put(&staff, &format!("/orders/{order_id}/status"), json!({"status": "delivered"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, delivered) = srv
        .put(&factory, &format!("/orders/{order_id}/status"), json!({"status": "delivered"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(delivered["deliveredAt"].is_string());

    let (status, again) = srv
        .put(&factory, &format!("/orders/{order_id}/status"), json!({"status": "delivered"}))
        .await;
    assert_eq!(status, 409);
    assert_eq!(again["error"], "invalid_transition");

    let (_, stock) = srv.get(&owner(), &format!("/stock/{outlet_id}")).await;
    assert_eq!(stock[0]["quantity"], 51);
}

#[tokio::test]
async fn mismatched_actor_role_is_forbidden() {
    let srv = TestServer::spawn().await;
    let (outlet_id, product_id) = seed(&srv, 5).await;

    let (_, order) = srv
        .post(
            &owner(),
            "/orders/factory",
            json!({"outletId": outlet_id, "items": [{"productId": product_id, "quantity": 1}]}),
        )
        .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, err) = srv
        .put(
            &mint(Role::FactoryStaff, None),
            &format!("/orders/{order_id}/status"),
            json!({"status": "delivered", "actorRole": "owner"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], "role_mismatch");
}

#[tokio::test]
async fn return_request_and_decision() {
    let srv = TestServer::spawn().await;
    let (outlet_id, product_id) = seed(&srv, 4).await;
    let staff = mint(Role::OutletStaff, Some(outlet_id.parse().unwrap()));
    let factory = mint(Role::FactoryStaff, None);

    let (status, _) = srv
        .post(
            &staff,
            "/returns",
            json!({"outletId": outlet_id, "items": [{"productId": product_id, "quantity": 9}], "reason": "damaged"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, ret) = srv
        .post(
            &staff,
            "/returns",
            json!({"outletId": outlet_id, "items": [{"productId": product_id, "quantity": 3, "reason": "torn"}], "reason": "damaged"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ret["status"], "pending");
    let return_id = ret["id"].as_str().unwrap().to_string();

    let (status, _) = srv
        .put(&staff, &format!("/returns/{return_id}"), json!({"decision": "approved"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, decided) = srv
        .put(
            &factory,
            &format!("/returns/{return_id}"),
            json!({"decision": "approved", "actorRole": "factory_staff"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "approved");

    let (_, stock) = srv.get(&staff, &format!("/stock/{outlet_id}")).await;
    assert_eq!(stock[0]["quantity"], 1);

    let (status, _) = srv
        .put(&factory, &format!("/returns/{return_id}"), json!({"decision": "rejected"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn staff_are_confined_to_their_outlet() {
    let srv = TestServer::spawn().await;
    let (outlet_id, _) = seed(&srv, 2).await;
    let stranger = mint(Role::OutletStaff, Some(OutletId::new()));

    let (status, _) = srv.get(&stranger, &format!("/stock/{outlet_id}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, orders) = srv.get(&stranger, "/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert!(orders.as_array().unwrap().is_empty());

    let (status, _) = srv.get(&stranger, &format!("/orders?outletId={outlet_id}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn catalog_management_is_owner_only() {
    let srv = TestServer::spawn().await;
    let (_, product_id) = seed(&srv, 1).await;
    let factory = mint(Role::FactoryStaff, None);

    let (status, _) = srv
        .put(&factory, &format!("/products/{product_id}/price"), json!({"price": 300}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, err) = srv
        .put(&owner(), &format!("/products/{product_id}/price"), json!({"price": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_argument");

    let (status, product) = srv
        .put(&owner(), &format!("/products/{product_id}/price"), json!({"price": 300}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["unitPrice"], 300);
    assert_eq!(product["priceHistory"][0]["price"], 250);

    let (status, product) = srv
        .put(&owner(), &format!("/products/{product_id}/status"), json!({"active": false}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["active"], false);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let srv = TestServer::spawn().await;

    let (status, err) = srv.get(&owner(), "/orders/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_id");

    let (status, err) = srv
        .get(&owner(), &format!("/products/{}", uuid::Uuid::now_v7()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");

    let (status, err) = srv.post(&owner(), "/outlets", json!({"name": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_body");
}
