//! End-to-end API tests
//!
//! Each test drives the full router (middleware, extractors, handlers) over
//! the in-memory stores, signing in through the OTP flow like a browser.

mod common;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};

use common::{bearer, TestApp, FRONTEND_URL, PUBLIC_BASE_URL};
use core_kernel::{EmailAddress, PhoneNumber};
use domain_accounts::{MemberPort, Moderator, ModeratorPort, ProviderPort};
use test_utils::{AccountFixtures, TEST_OTP_CODE};

const PROVIDER_PHONE: &str = "9800000001";
const GUARDIAN_PHONE: &str = "9800000002";
const MODERATOR_PHONE: &str = "9800000009";

/// Seeds the verified school with one student on the guardian phone
async fn seed_school(app: &TestApp) -> (String, String) {
    let provider = app
        .mock
        .accounts
        .create_provider(AccountFixtures::provider())
        .await
        .unwrap();
    let member = app
        .mock
        .accounts
        .create_member(AccountFixtures::member(provider.id))
        .await
        .unwrap();
    (provider.id.to_string(), member.id.to_string())
}

async fn register_guardian(app: &TestApp) -> String {
    app.request_code("consumer", GUARDIAN_PHONE).await;
    let response = app
        .server
        .post("/api/v1/auth/consumer/register")
        .json(&json!({
            "name": "Meera Iyer",
            "phone": GUARDIAN_PHONE,
            "code": TEST_OTP_CODE
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

async fn create_plan(app: &TestApp, token: &str, member_id: &str, amount: &str) -> Value {
    let response = bearer(
        app.server
            .post(&format!("/api/v1/provider/members/{}/fee-plans", member_id)),
        token,
    )
    .json(&json!({
        "title": "Term 1 tuition",
        "amount": amount,
        "due_date": "2030-06-30"
    }))
    .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_liveness_and_readiness() {
        let app = TestApp::new();

        let live = app.server.get("/health").await;
        live.assert_status_ok();
        assert_eq!(live.json::<Value>()["status"], "healthy");

        let ready = app.server.get("/health/ready").await;
        ready.assert_status_ok();
        let body = ready.json::<Value>();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id_and_cors() {
        let app = TestApp::new();

        let response = app
            .server
            .get("/health")
            .add_header(header::ORIGIN, HeaderValue::from_static(FRONTEND_URL))
            .await;
        response.assert_status_ok();
        assert!(response.headers().get("x-request-id").is_some());
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            HeaderValue::from_static(FRONTEND_URL)
        );
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            HeaderValue::from_static("true")
        );
    }
}

mod sign_in {
    use super::*;

    #[tokio::test]
    async fn test_provider_registers_and_signs_in() {
        let app = TestApp::new();
        app.request_code("provider", "9800000011").await;

        let registered = app
            .server
            .post("/api/v1/auth/provider/register")
            .json(&json!({
                "name": "Sunrise Coaching",
                "phone": "98000 00011",
                "email": "Desk@Sunrise.in",
                "code": TEST_OTP_CODE,
                "category": "COACHING"
            }))
            .await;
        registered.assert_status(StatusCode::CREATED);
        let cookie = registered.header(header::SET_COOKIE);
        assert!(cookie.to_str().unwrap().starts_with("feebook_session="));
        assert!(cookie.to_str().unwrap().contains("HttpOnly"));

        let token = app.sign_in("provider", "9800000011").await;
        let me = bearer(app.server.get("/api/v1/auth/me"), &token).await;
        me.assert_status_ok();
        let body = me.json::<Value>();
        assert_eq!(body["role"], "provider");
        assert_eq!(body["name"], "Sunrise Coaching");

        let profile = bearer(app.server.get("/api/v1/provider/profile"), &token).await;
        profile.assert_status_ok();
        let profile = profile.json::<Value>();
        assert_eq!(profile["phone"], "+919800000011");
        assert_eq!(profile["email"], "desk@sunrise.in");
        assert_eq!(profile["verified"], false);
    }

    #[tokio::test]
    async fn test_code_must_be_requested_and_correct() {
        let app = TestApp::new();
        seed_school(&app).await;

        let unrequested = app
            .server
            .post("/api/v1/auth/provider/login")
            .json(&json!({ "phone": PROVIDER_PHONE, "code": TEST_OTP_CODE }))
            .await;
        unrequested.assert_status(StatusCode::UNAUTHORIZED);

        app.request_code("provider", PROVIDER_PHONE).await;
        let wrong = app
            .server
            .post("/api/v1/auth/provider/login")
            .json(&json!({ "phone": PROVIDER_PHONE, "code": "999999" }))
            .await;
        wrong.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_without_account_is_not_found() {
        let app = TestApp::new();
        app.request_code("consumer", "9800000044").await;

        let response = app
            .server
            .post("/api/v1/auth/consumer/login")
            .json(&json!({ "phone": "9800000044", "code": TEST_OTP_CODE }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = TestApp::new();
        register_guardian(&app).await;

        app.request_code("consumer", GUARDIAN_PHONE).await;
        let again = app
            .server
            .post("/api/v1/auth/consumer/register")
            .json(&json!({
                "name": "Meera Iyer",
                "phone": GUARDIAN_PHONE,
                "code": TEST_OTP_CODE
            }))
            .await;
        again.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_taken_email_keeps_the_code() {
        let app = TestApp::new();
        seed_school(&app).await;
        app.request_code("provider", "9800000022").await;

        let taken = app
            .server
            .post("/api/v1/auth/provider/register")
            .json(&json!({
                "name": "Sunrise Coaching",
                "phone": "9800000022",
                "email": "office@greenfield.school",
                "code": TEST_OTP_CODE
            }))
            .await;
        taken.assert_status(StatusCode::CONFLICT);
        assert!(app.mock.otp.is_pending(&PhoneNumber::from_normalized("+919800000022")).await);

        app.server
            .post("/api/v1/auth/provider/register")
            .json(&json!({
                "name": "Sunrise Coaching",
                "phone": "9800000022",
                "email": "desk@sunrise.in",
                "code": TEST_OTP_CODE
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_inactive_moderator_cannot_sign_in() {
        let app = TestApp::new();
        let moderator = app
            .mock
            .accounts
            .create_moderator(AccountFixtures::moderator())
            .await
            .unwrap();
        moderator_colleague(&app).await;
        app.mock
            .accounts
            .set_moderator_active(moderator.id, false)
            .await
            .unwrap();

        app.request_code("moderator", MODERATOR_PHONE).await;
        let response = app
            .server
            .post("/api/v1/auth/moderator/login")
            .json(&json!({ "phone": MODERATOR_PHONE, "code": TEST_OTP_CODE }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    async fn moderator_colleague(app: &TestApp) {
        app.mock
            .accounts
            .create_moderator(Moderator::new(
                "Second Admin",
                PhoneNumber::from_normalized("+919800000019"),
                EmailAddress::from_normalized("second@feebook.in"),
                None,
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = TestApp::new();
        let response = app.server.post("/api/v1/auth/logout").await;
        response.assert_status(StatusCode::NO_CONTENT);
        let cookie = response.header(header::SET_COOKIE);
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }
}

mod guards {
    use super::*;

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let app = TestApp::new();
        app.server
            .get("/api/v1/provider/profile")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let app = TestApp::new();
        bearer(app.server.get("/api/v1/consumer/profile"), "not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let app = TestApp::new();
        let token = register_guardian(&app).await;

        bearer(app.server.get("/api/v1/provider/members"), &token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        bearer(app.server.get("/api/v1/moderator/queries"), &token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_session_cookie_is_accepted() {
        let app = TestApp::new();
        let token = register_guardian(&app).await;

        let response = app
            .server
            .get("/api/v1/consumer/profile")
            .add_header(
                header::COOKIE,
                HeaderValue::from_str(&format!("theme=dark; feebook_session={}", token)).unwrap(),
            )
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["name"], "Meera Iyer");
    }
}

mod provider_records {
    use super::*;

    #[tokio::test]
    async fn test_member_lifecycle() {
        let app = TestApp::new();
        seed_school(&app).await;
        let token = app.sign_in("provider", PROVIDER_PHONE).await;

        let created = bearer(app.server.post("/api/v1/provider/members"), &token)
            .json(&json!({
                "name": "Kavya Nair",
                "phone": "9800000021",
                "reference": " gps-2026-077 "
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let member = created.json::<Value>();
        assert_eq!(member["reference"], "GPS-2026-077");
        let id = member["id"].as_str().unwrap();

        let updated = bearer(
            app.server.put(&format!("/api/v1/provider/members/{}", id)),
            &token,
        )
        .json(&json!({ "notes": "Bus route 4" }))
        .await;
        updated.assert_status_ok();
        assert_eq!(updated.json::<Value>()["notes"], "Bus route 4");

        let listed = bearer(app.server.get("/api/v1/provider/members"), &token).await;
        assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 2);

        bearer(
            app.server.delete(&format!("/api/v1/provider/members/{}", id)),
            &token,
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_duplicate_reference_conflicts() {
        let app = TestApp::new();
        seed_school(&app).await;
        let token = app.sign_in("provider", PROVIDER_PHONE).await;

        bearer(app.server.post("/api/v1/provider/members"), &token)
            .json(&json!({
                "name": "Another Student",
                "phone": "9800000022",
                "reference": "GPS-2026-041"
            }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_other_providers_records_are_hidden() {
        let app = TestApp::new();
        let (_, member_id) = seed_school(&app).await;

        app.request_code("provider", "9800000031").await;
        let response = app
            .server
            .post("/api/v1/auth/provider/register")
            .json(&json!({
                "name": "Other Academy",
                "phone": "9800000031",
                "email": "office@other.in",
                "code": TEST_OTP_CODE
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let other = response.json::<Value>()["token"].as_str().unwrap().to_string();

        bearer(
            app.server.get(&format!("/api/v1/provider/members/{}", member_id)),
            &other,
        )
        .await
        .assert_status(StatusCode::NOT_FOUND);
        bearer(
            app.server
                .post(&format!("/api/v1/provider/members/{}/fee-plans", member_id)),
            &other,
        )
        .json(&json!({ "title": "Fee", "amount": "100", "due_date": "2030-01-01" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_offline_payment_is_recorded_once() {
        let app = TestApp::new();
        let (_, member_id) = seed_school(&app).await;
        let token = app.sign_in("provider", PROVIDER_PHONE).await;

        let plan = create_plan(&app, &token, &member_id, "4500.00").await;
        assert_eq!(plan["status"], "DUE");
        assert_eq!(plan["currency"], "INR");
        let plan_id = plan["id"].as_str().unwrap();

        let paid = bearer(
            app.server
                .post(&format!("/api/v1/provider/fee-plans/{}/mark-paid", plan_id)),
            &token,
        )
        .json(&json!({ "reference": "RCPT-101" }))
        .await;
        paid.assert_status_ok();
        let body = paid.json::<Value>();
        assert_eq!(body["fee_plan"]["status"], "PAID");
        assert_eq!(body["fee_plan"]["paid_via"], "OFFLINE");
        assert_eq!(body["transaction"]["reference"], "RCPT-101");

        bearer(
            app.server
                .post(&format!("/api/v1/provider/fee-plans/{}/mark-paid", plan_id)),
            &token,
        )
        .await
        .assert_status(StatusCode::CONFLICT);

        // Paid plans are frozen and keep their member in place
        bearer(
            app.server
                .put(&format!("/api/v1/provider/fee-plans/{}", plan_id)),
            &token,
        )
        .json(&json!({ "amount": "10.00" }))
        .await
        .assert_status(StatusCode::CONFLICT);
        bearer(
            app.server
                .delete(&format!("/api/v1/provider/fee-plans/{}", plan_id)),
            &token,
        )
        .await
        .assert_status(StatusCode::CONFLICT);
        bearer(
            app.server
                .delete(&format!("/api/v1/provider/members/{}", member_id)),
            &token,
        )
        .await
        .assert_status(StatusCode::CONFLICT);

        let transactions = bearer(app.server.get("/api/v1/provider/transactions"), &token).await;
        assert_eq!(transactions.json::<Value>().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fee_plan_filters() {
        let app = TestApp::new();
        let (_, member_id) = seed_school(&app).await;
        let token = app.sign_in("provider", PROVIDER_PHONE).await;

        create_plan(&app, &token, &member_id, "1000").await;
        let second = create_plan(&app, &token, &member_id, "2000").await;
        bearer(
            app.server.post(&format!(
                "/api/v1/provider/fee-plans/{}/mark-paid",
                second["id"].as_str().unwrap()
            )),
            &token,
        )
        .await
        .assert_status_ok();

        let due = bearer(app.server.get("/api/v1/provider/fee-plans?status=DUE"), &token).await;
        assert_eq!(due.json::<Value>().as_array().unwrap().len(), 1);

        let overdue = bearer(app.server.get("/api/v1/provider/fee-plans?overdue=true"), &token).await;
        assert!(overdue.json::<Value>().as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_fee_plan_is_rejected() {
        let app = TestApp::new();
        let (_, member_id) = seed_school(&app).await;
        let token = app.sign_in("provider", PROVIDER_PHONE).await;

        let response = bearer(
            app.server
                .post(&format!("/api/v1/provider/members/{}/fee-plans", member_id)),
            &token,
        )
        .json(&json!({ "title": "Refund", "amount": "-5", "due_date": "2030-01-01" }))
        .await;
        assert!(response.status_code().is_client_error());
    }
}

mod consumer_payments {
    use super::*;

    async fn claim(app: &TestApp, token: &str, provider_id: &str) -> Value {
        let response = bearer(app.server.post("/api/v1/consumer/memberships"), token)
            .json(&json!({ "provider_id": provider_id, "reference": "gps-2026-041" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    #[tokio::test]
    async fn test_claim_requires_matching_phone() {
        let app = TestApp::new();
        let (provider_id, _) = seed_school(&app).await;

        app.request_code("consumer", "9800000055").await;
        let response = app
            .server
            .post("/api/v1/auth/consumer/register")
            .json(&json!({ "name": "Stranger", "phone": "9800000055", "code": TEST_OTP_CODE }))
            .await;
        let token = response.json::<Value>()["token"].as_str().unwrap().to_string();

        bearer(app.server.post("/api/v1/consumer/memberships"), &token)
            .json(&json!({ "provider_id": provider_id, "reference": "GPS-2026-041" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_claim_once_and_list() {
        let app = TestApp::new();
        let (provider_id, _) = seed_school(&app).await;
        let token = register_guardian(&app).await;

        let membership = claim(&app, &token, &provider_id).await;
        assert_eq!(membership["member"]["reference"], "GPS-2026-041");
        assert_eq!(membership["provider"]["name"], "Greenfield Public School");

        bearer(app.server.post("/api/v1/consumer/memberships"), &token)
            .json(&json!({ "provider_id": provider_id, "reference": "GPS-2026-041" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let listed = bearer(app.server.get("/api/v1/consumer/memberships"), &token).await;
        assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 1);

        let providers = bearer(app.server.get("/api/v1/consumer/providers?search=green"), &token).await;
        let providers = providers.json::<Value>();
        assert_eq!(providers.as_array().unwrap().len(), 1);
        assert!(providers[0].get("phone").is_none());
    }

    #[tokio::test]
    async fn test_unverified_provider_cannot_be_claimed() {
        let app = TestApp::new();
        let mut provider = AccountFixtures::provider();
        provider.verified = false;
        let provider = app.mock.accounts.create_provider(provider).await.unwrap();
        app.mock
            .accounts
            .create_member(AccountFixtures::member(provider.id))
            .await
            .unwrap();
        let token = register_guardian(&app).await;

        bearer(app.server.post("/api/v1/consumer/memberships"), &token)
            .json(&json!({ "provider_id": provider.id, "reference": "GPS-2026-041" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_online_payment_is_verified_and_settled() {
        let app = TestApp::new();
        let (provider_id, member_id) = seed_school(&app).await;
        let provider_token = app.sign_in("provider", PROVIDER_PHONE).await;
        let plan = create_plan(&app, &provider_token, &member_id, "1250.75").await;
        let plan_id = plan["id"].as_str().unwrap();

        let token = register_guardian(&app).await;
        let membership = claim(&app, &token, &provider_id).await;

        let plans = bearer(
            app.server.get(&format!(
                "/api/v1/consumer/memberships/{}/fee-plans",
                membership["id"].as_str().unwrap()
            )),
            &token,
        )
        .await;
        assert_eq!(plans.json::<Value>()[0]["id"], plan["id"]);

        let checkout = bearer(app.server.post("/api/v1/consumer/payments/orders"), &token)
            .json(&json!({ "fee_plan_id": plan_id }))
            .await;
        checkout.assert_status(StatusCode::CREATED);
        let checkout = checkout.json::<Value>();
        assert_eq!(checkout["key_id"], "rzp_test_mock");
        assert_eq!(checkout["amount_minor"], 125075);
        assert_eq!(
            checkout["callback_url"],
            format!("{}/api/v1/payments/return", PUBLIC_BASE_URL)
        );
        let gateway_order_id = checkout["gateway_order_id"].as_str().unwrap();

        let pending = bearer(app.server.post("/api/v1/consumer/payments/verify"), &token)
            .json(&json!({ "gateway_order_id": gateway_order_id }))
            .await;
        pending.assert_status_ok();
        assert_eq!(pending.json::<Value>()["status"], "pending");

        app.mock.gateway.capture(gateway_order_id).await.unwrap();

        let verified = bearer(app.server.post("/api/v1/consumer/payments/verify"), &token)
            .json(&json!({ "gateway_order_id": gateway_order_id }))
            .await;
        verified.assert_status_ok();
        let verified = verified.json::<Value>();
        assert_eq!(verified["status"], "paid");
        assert_eq!(verified["fee_plan"]["status"], "PAID");
        assert_eq!(verified["order"]["status"], "PAID");

        // Verifying again is idempotent
        let again = bearer(app.server.post("/api/v1/consumer/payments/verify"), &token)
            .json(&json!({ "gateway_order_id": gateway_order_id }))
            .await;
        assert_eq!(again.json::<Value>()["status"], "paid");

        let transactions = bearer(app.server.get("/api/v1/consumer/transactions"), &token).await;
        let transactions = transactions.json::<Value>();
        assert_eq!(transactions.as_array().unwrap().len(), 1);
        assert_eq!(transactions[0]["mode"], "ONLINE");

        bearer(app.server.post("/api/v1/consumer/payments/orders"), &token)
            .json(&json!({ "fee_plan_id": plan_id }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unclaimed_plan_cannot_be_paid() {
        let app = TestApp::new();
        let (_, member_id) = seed_school(&app).await;
        let provider_token = app.sign_in("provider", PROVIDER_PHONE).await;
        let plan = create_plan(&app, &provider_token, &member_id, "500").await;
        let token = register_guardian(&app).await;

        bearer(app.server.post("/api/v1/consumer/payments/orders"), &token)
            .json(&json!({ "fee_plan_id": plan["id"] }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_gateway_return_redirects_to_frontend() {
        let app = TestApp::new();
        let (provider_id, member_id) = seed_school(&app).await;
        let provider_token = app.sign_in("provider", PROVIDER_PHONE).await;
        let plan = create_plan(&app, &provider_token, &member_id, "800").await;
        let token = register_guardian(&app).await;
        claim(&app, &token, &provider_id).await;

        let checkout = bearer(app.server.post("/api/v1/consumer/payments/orders"), &token)
            .json(&json!({ "fee_plan_id": plan["id"] }))
            .await
            .json::<Value>();
        let gateway_order_id = checkout["gateway_order_id"].as_str().unwrap().to_string();
        app.mock.gateway.capture(&gateway_order_id).await.unwrap();

        let response = app
            .server
            .get(&format!("/api/v1/payments/return?razorpay_order_id={}", gateway_order_id))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            response.header(header::LOCATION),
            format!("{}/payments/paid?order_id={}", FRONTEND_URL, gateway_order_id)
        );

        let unknown = app
            .server
            .get("/api/v1/payments/return?order_id=order_missing")
            .await;
        unknown.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            unknown.header(header::LOCATION),
            format!("{}/payments/failed?order_id=order_missing", FRONTEND_URL)
        );

        let cancelled = app.server.get("/api/v1/payments/return").await;
        cancelled.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            cancelled.header(header::LOCATION),
            format!("{}/payments/failed?order_id=", FRONTEND_URL)
        );
    }
}

mod moderation {
    use super::*;

    async fn moderator_token(app: &TestApp) -> String {
        app.mock
            .accounts
            .create_moderator(AccountFixtures::moderator())
            .await
            .unwrap();
        app.sign_in("moderator", MODERATOR_PHONE).await
    }

    #[tokio::test]
    async fn test_provider_verification() {
        let app = TestApp::new();
        let token = moderator_token(&app).await;

        app.request_code("provider", "9800000061").await;
        let registered = app
            .server
            .post("/api/v1/auth/provider/register")
            .json(&json!({
                "name": "Lakeview Society",
                "phone": "9800000061",
                "email": "admin@lakeview.in",
                "code": TEST_OTP_CODE,
                "category": "SOCIETY"
            }))
            .await;
        let provider_id = registered.json::<Value>()["account_id"]
            .as_str()
            .unwrap()
            .to_string();

        let pending = bearer(app.server.get("/api/v1/moderator/providers?verified=false"), &token).await;
        assert_eq!(pending.json::<Value>().as_array().unwrap().len(), 1);

        let verified = bearer(
            app.server
                .put(&format!("/api/v1/moderator/providers/{}/verification", provider_id)),
            &token,
        )
        .json(&json!({ "verified": true }))
        .await;
        verified.assert_status_ok();
        assert_eq!(verified.json::<Value>()["verified"], true);
    }

    #[tokio::test]
    async fn test_moderators_manage_moderators() {
        let app = TestApp::new();
        let token = moderator_token(&app).await;

        let created = bearer(app.server.post("/api/v1/moderator/moderators"), &token)
            .json(&json!({
                "name": "Second Admin",
                "phone": "9800000019",
                "email": "second@feebook.in"
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let second = created.json::<Value>();
        assert_eq!(second["is_active"], true);

        let second_token = app.sign_in("moderator", "9800000019").await;

        bearer(
            app.server.put(&format!(
                "/api/v1/moderator/moderators/{}/active",
                second["id"].as_str().unwrap()
            )),
            &token,
        )
        .json(&json!({ "is_active": false }))
        .await
        .assert_status_ok();

        // The deactivated moderator's session stops working immediately
        bearer(app.server.get("/api/v1/moderator/moderators"), &second_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_moderator_cannot_deactivate_self() {
        let app = TestApp::new();
        let token = moderator_token(&app).await;
        let me = bearer(app.server.get("/api/v1/auth/me"), &token).await.json::<Value>();

        bearer(
            app.server.put(&format!(
                "/api/v1/moderator/moderators/{}/active",
                me["account_id"].as_str().unwrap()
            )),
            &token,
        )
        .json(&json!({ "is_active": false }))
        .await
        .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_policies_are_published() {
        let app = TestApp::new();
        let token = moderator_token(&app).await;

        bearer(app.server.put("/api/v1/moderator/policies/refund-policy"), &token)
            .json(&json!({ "title": "Refunds", "body": "Fees are refundable within 7 days." }))
            .await
            .assert_status_ok();
        let revised = bearer(app.server.put("/api/v1/moderator/policies/refund-policy"), &token)
            .json(&json!({ "title": "Refund policy", "body": "Fees are refundable within 14 days." }))
            .await;
        revised.assert_status_ok();

        let listed = app.server.get("/api/v1/policies").await;
        listed.assert_status_ok();
        let listed = listed.json::<Value>();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["title"], "Refund policy");

        bearer(app.server.delete("/api/v1/moderator/policies/refund-policy"), &token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.server
            .get("/api/v1/policies/refund-policy")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_contact_queries_are_resolved() {
        let app = TestApp::new();
        let token = moderator_token(&app).await;
        let guardian = register_guardian(&app).await;

        let anonymous = app
            .server
            .post("/api/v1/queries")
            .json(&json!({
                "name": "Visitor",
                "email": "visitor@example.com",
                "subject": "Pricing",
                "message": "Is Feebook free for schools?"
            }))
            .await;
        anonymous.assert_status(StatusCode::CREATED);
        assert_eq!(anonymous.json::<Value>()["status"], "OPEN");

        bearer(app.server.post("/api/v1/queries"), &guardian)
            .json(&json!({
                "name": "Meera Iyer",
                "email": "meera@example.com",
                "phone": GUARDIAN_PHONE,
                "subject": "Receipt",
                "message": "Where do I find my receipt?"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let open = bearer(app.server.get("/api/v1/moderator/queries?status=OPEN"), &token).await;
        let open = open.json::<Value>();
        assert_eq!(open.as_array().unwrap().len(), 2);
        let signed_in = open
            .as_array()
            .unwrap()
            .iter()
            .find(|q| q["subject"] == "Receipt")
            .unwrap();
        assert_eq!(signed_in["raised_by_role"], "consumer");

        let id = signed_in["id"].as_str().unwrap();
        let resolved = bearer(app.server.put(&format!("/api/v1/moderator/queries/{}", id)), &token)
            .json(&json!({ "response": "Receipts are under Transactions." }))
            .await;
        resolved.assert_status_ok();
        assert_eq!(resolved.json::<Value>()["status"], "RESOLVED");

        bearer(app.server.put(&format!("/api/v1/moderator/queries/{}", id)), &token)
            .json(&json!({ "response": "Again" }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_all_transactions_visible() {
        let app = TestApp::new();
        let (_, member_id) = seed_school(&app).await;
        let provider_token = app.sign_in("provider", PROVIDER_PHONE).await;
        let plan = create_plan(&app, &provider_token, &member_id, "300").await;
        bearer(
            app.server.post(&format!(
                "/api/v1/provider/fee-plans/{}/mark-paid",
                plan["id"].as_str().unwrap()
            )),
            &provider_token,
        )
        .await
        .assert_status_ok();

        let token = moderator_token(&app).await;
        let all = bearer(app.server.get("/api/v1/moderator/transactions?mode=OFFLINE"), &token).await;
        assert_eq!(all.json::<Value>().as_array().unwrap().len(), 1);
        let online = bearer(app.server.get("/api/v1/moderator/transactions?mode=ONLINE"), &token).await;
        assert!(online.json::<Value>().as_array().unwrap().is_empty());
    }
}

mod uploads {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_serve() {
        let app = TestApp::new();
        let token = register_guardian(&app).await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"\x89PNG\r\n".to_vec())
                .file_name("logo.png")
                .mime_type("image/png"),
        );
        let response = bearer(app.server.post("/api/v1/uploads"), &token)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let url = response.json::<Value>()["url"].as_str().unwrap().to_string();
        assert!(url.starts_with(&format!("{}/uploads/", PUBLIC_BASE_URL)));

        let path = url.trim_start_matches(PUBLIC_BASE_URL);
        let served = app.server.get(path).await;
        served.assert_status_ok();
        assert_eq!(served.as_bytes().as_ref(), b"\x89PNG\r\n");
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let app = TestApp::new();
        let token = register_guardian(&app).await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::text("<script>").file_name("x.html").mime_type("text/html"),
        );
        bearer(app.server.post("/api/v1/uploads"), &token)
            .multipart(form)
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_refused() {
        let app = TestApp::new();
        let token = register_guardian(&app).await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(vec![0u8; 128 * 1024])
                .file_name("scan.png")
                .mime_type("image/png"),
        );
        bearer(app.server.post("/api/v1/uploads"), &token)
            .multipart(form)
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_upload_requires_session() {
        let app = TestApp::new();
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(vec![1, 2, 3]).mime_type("image/png"),
        );
        app.server
            .post("/api/v1/uploads")
            .multipart(form)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
