use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use api_profile::{ProfileContext, dtos::profile::ProfileResponse};
use chrono::{Duration, Utc};
use common::{
    env_config::JwtConfig,
    jwt::{SessionClaims, SignupMetadata, generate_jwt},
};
use db::{
    BillingStore,
    memory::InMemoryStore,
    models::{profile::Profile, subscription::SubscriptionStatus},
};
use uuid::Uuid;

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".to_string(),
        audience: "authenticated".to_string(),
    }
}

fn bearer(member_id: Uuid, user_metadata: SignupMetadata) -> (&'static str, String) {
    let claims = SessionClaims {
        sub: member_id,
        email: Some("member@example.com".to_string()),
        aud: "authenticated".to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        user_metadata,
    };
    let token = generate_jwt(&claims, &jwt_config()).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(ProfileContext::new(
                    $store.clone() as Arc<dyn BillingStore>
                )))
                .wrap(auth::session_middleware(jwt_config()))
                .service(web::scope("/api").service(api_profile::mount_profile())),
        )
        .await
    };
}

#[actix_web::test]
async fn profile_requires_a_session() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);

    let req = test::TestRequest::get().uri("/api/profile").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn stored_profile_is_merged_over_defaults() {
    let mut profile = Profile::blank(Uuid::new_v4(), Utc::now());
    profile.full_name = Some("Ada Lovelace".to_string());
    profile.membership_plan = Some("Plus".to_string());
    profile.plan_price = Some("$39.99/month - Billed monthly".to_string());
    profile.subscription_status = Some(SubscriptionStatus::Trialing);
    profile.next_billing_date = Some("March 4, 2026".to_string());
    let member_id = profile.id;
    let store = Arc::new(InMemoryStore::with_profiles(vec![profile]));
    let app = app!(store);

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(member_id, SignupMetadata::default()))
        .to_request();
    let body: ProfileResponse = test::call_and_read_body_json(&app, req).await;

    assert!(body.error.is_none());
    assert_eq!(body.profile.id, member_id);
    assert_eq!(body.profile.full_name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(body.profile.membership_plan, "Plus");
    assert_eq!(body.profile.member_since_months, "1");
    assert_eq!(
        body.profile.subscription_status,
        Some(SubscriptionStatus::Trialing)
    );
    assert_eq!(body.profile.next_billing_date.as_deref(), Some("March 4, 2026"));
}

#[actix_web::test]
async fn missing_row_is_synthesized_from_signup_data() {
    let store = Arc::new(InMemoryStore::new());
    let app = app!(store);
    let member_id = Uuid::new_v4();

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(
            member_id,
            SignupMetadata {
                full_name: Some("Grace Hopper".to_string()),
                phone: Some("555-0100".to_string()),
                ..Default::default()
            },
        ))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: ProfileResponse = test::read_body_json(res).await;
    assert_eq!(body.profile.id, member_id);
    assert_eq!(body.profile.full_name.as_deref(), Some("Grace Hopper"));
    assert_eq!(body.profile.phone.as_deref(), Some("555-0100"));
    assert_eq!(body.profile.membership_plan, "Starter");
    assert_eq!(body.profile.plan_price, "$9.99/month - Billed monthly");
    assert!(body.profile.subscription_status.is_none());
    assert!(body.error.is_none());

    // reading never creates the row
    assert_eq!(store.profile_count(), 0);
    assert_eq!(store.writes(), 0);
}

#[actix_web::test]
async fn datastore_failure_still_returns_a_profile() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_reads();
    let app = app!(store);
    let member_id = Uuid::new_v4();

    let req = test::TestRequest::get()
        .uri("/api/profile")
        .insert_header(bearer(member_id, SignupMetadata::default()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: ProfileResponse = test::read_body_json(res).await;
    assert_eq!(body.profile.id, member_id);
    assert_eq!(body.profile.membership_plan, "Starter");
    assert_eq!(body.profile.member_since_months, "1");
    assert_eq!(body.error.as_deref(), Some("Unable to load your profile"));
}
