#[macro_use]
mod support;

use std::sync::Arc;

use actix_web::{http::StatusCode, test};
use api_billing::{dtos::checkout::CheckoutMode, services::customer::resolve_customer};
use chrono::Utc;
use db::{
    memory::InMemoryStore,
    models::{profile::Profile, subscription::SubscriptionStatus},
};
use serde_json::{Value, json};
use support::{APP_URL, FakeGateway, GatewayCall, bearer, claims_for};
use uuid::Uuid;

fn member_with_status(status: Option<SubscriptionStatus>, customer: Option<&str>) -> Profile {
    let mut profile = Profile::blank(Uuid::new_v4(), Utc::now());
    profile.subscription_status = status;
    profile.stripe_customer_id = customer.map(str::to_string);
    profile
}

#[actix_web::test]
async fn unauthenticated_checkout_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let gateway = FakeGateway::new();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .set_json(json!({ "priceId": "price_plus" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(gateway.calls().is_empty());
}

#[actix_web::test]
async fn missing_price_is_a_bad_request() {
    let store = Arc::new(InMemoryStore::new());
    let gateway = FakeGateway::new();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .insert_header(bearer(Uuid::new_v4()))
        .set_json(json!({ "mode": "subscription" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "Missing priceId");
    assert!(gateway.calls().is_empty());
    assert_eq!(store.writes(), 0);
}

#[actix_web::test]
async fn one_off_purchase_requires_an_active_membership() {
    let lapsed = member_with_status(Some(SubscriptionStatus::Canceled), Some("cus_9"));
    let member_id = lapsed.id;
    let store = Arc::new(InMemoryStore::with_profiles(vec![lapsed]));
    let gateway = FakeGateway::new();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .insert_header(bearer(member_id))
        .set_json(json!({ "priceId": "price_consult", "mode": "payment" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["error"],
        "Services are available to active subscribers only."
    );
    assert!(gateway.calls().is_empty());
}

#[actix_web::test]
async fn one_off_purchase_without_a_profile_is_forbidden() {
    let store = Arc::new(InMemoryStore::new());
    let gateway = FakeGateway::new();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .insert_header(bearer(Uuid::new_v4()))
        .set_json(json!({ "priceId": "price_consult", "mode": "payment" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(gateway.calls().is_empty());
    assert_eq!(store.profile_count(), 0);
}

#[actix_web::test]
async fn trialing_member_can_buy_a_service_with_their_customer() {
    let member = member_with_status(Some(SubscriptionStatus::Trialing), Some("cus_existing"));
    let member_id = member.id;
    let store = Arc::new(InMemoryStore::with_profiles(vec![member]));
    let gateway = FakeGateway::new();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .insert_header(bearer(member_id))
        .set_json(json!({ "priceId": "price_consult", "mode": "payment" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    let GatewayCall::Checkout(params) = &calls[0] else {
        panic!("expected a checkout call, got {:?}", calls[0]);
    };
    assert_eq!(params.mode, CheckoutMode::Payment);
    assert_eq!(params.customer_id, "cus_existing");
    assert_eq!(params.price_id, "price_consult");
}

#[actix_web::test]
async fn unknown_mode_is_a_bad_request() {
    let store = Arc::new(InMemoryStore::new());
    let gateway = FakeGateway::new();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .insert_header(bearer(Uuid::new_v4()))
        .set_json(json!({ "priceId": "price_plus", "mode": "setup" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({ "error": "Invalid request body" }));
    assert!(gateway.calls().is_empty());
}

#[actix_web::test]
async fn unparseable_body_gets_a_json_error() {
    let store = Arc::new(InMemoryStore::new());
    let gateway = FakeGateway::new();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .insert_header(bearer(Uuid::new_v4()))
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"priceId\": ")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(store.writes(), 0);
}

#[actix_web::test]
async fn disabled_billing_answers_service_unavailable() {
    let store = Arc::new(InMemoryStore::new());
    let app = billing_app!(support::context(&store, None));
    let member_id = Uuid::new_v4();

    let checkout = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .insert_header(bearer(member_id))
        .set_json(json!({ "priceId": "price_plus" }))
        .to_request();
    let res = test::call_service(&app, checkout).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let portal = test::TestRequest::post()
        .uri("/api/stripe/create-portal-session")
        .insert_header(bearer(member_id))
        .to_request();
    let res = test::call_service(&app, portal).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(store.writes(), 0);
}

#[actix_web::test]
async fn provider_failure_is_reported_generically() {
    let store = Arc::new(InMemoryStore::new());
    let gateway = FakeGateway::failing_checkout();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-checkout-session")
        .insert_header(bearer(Uuid::new_v4()))
        .set_json(json!({ "priceId": "price_plus" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["error"], "Unable to create checkout session");
}

#[actix_web::test]
async fn portal_returns_to_settings() {
    let member = member_with_status(Some(SubscriptionStatus::Active), Some("cus_42"));
    let member_id = member.id;
    let store = Arc::new(InMemoryStore::with_profiles(vec![member]));
    let gateway = FakeGateway::new();
    let app = billing_app!(support::context(&store, Some(&gateway)));

    let req = test::TestRequest::post()
        .uri("/api/stripe/create-portal-session")
        .insert_header(bearer(member_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["url"], "https://billing.stripe.test/p/session/cus_42");
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::Portal {
            customer_id: "cus_42".to_string(),
            return_url: format!("{}/dashboard/settings", APP_URL),
        }]
    );
}

#[tokio::test]
async fn concurrent_resolution_creates_one_customer() {
    let store = Arc::new(InMemoryStore::new());
    let gateway = FakeGateway::new();
    let ctx = support::context(&store, Some(&gateway));
    let claims = claims_for(Uuid::new_v4());

    let (a, b, c) = tokio::join!(
        resolve_customer(&ctx, gateway.as_ref(), &claims, None),
        resolve_customer(&ctx, gateway.as_ref(), &claims, None),
        resolve_customer(&ctx, gateway.as_ref(), &claims, None),
    );

    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(gateway.customers_created(), 1);
    assert!(ctx.customer_locks.is_empty());
    assert_eq!(
        store.profile(claims.member_id()).unwrap().stripe_customer_id,
        Some(a)
    );
}

#[tokio::test]
async fn racing_processes_converge_on_the_first_bound_customer() {
    // two contexts share a store but not their lock maps, like two instances
    let store = Arc::new(InMemoryStore::new());
    let gateway = FakeGateway::new();
    let first = support::context(&store, Some(&gateway));
    let second = support::context(&store, Some(&gateway));
    let claims = claims_for(Uuid::new_v4());

    let (a, b) = tokio::join!(
        resolve_customer(&first, gateway.as_ref(), &claims, None),
        resolve_customer(&second, gateway.as_ref(), &claims, None),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(gateway.customers_created(), 2);
    assert_eq!(store.profile_count(), 1);
}
