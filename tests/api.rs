use std::collections::HashMap;
use std::net::SocketAddr;

use actix_web::http::{Method, StatusCode, header};
use actix_web::test::{self, TestRequest};
use actix_web::{App, body::to_bytes};
use serde_json::{Value, json};

use workflow::auth::TokenService;
use workflow::config::Config;
use workflow::routes::{self, Limiters};
use workflow::state::AppState;
use workflow::store::Store;

const SECRET: &str = "integration-secret";

fn config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("STORE_BACKEND".to_string(), "memory".to_string()),
        ("ACCESS_TOKEN_SECRET".to_string(), SECRET.to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(move |key| vars.get(key).cloned()).unwrap()
}

macro_rules! init_app {
    ($config:expr) => {{
        let config = $config;
        let limiters = Limiters::from_config(&config).unwrap();
        let cors = routes::cors(&config);
        let state = AppState::new(config, Store::memory());
        test::init_service(
            App::new()
                .wrap(cors)
                .configure(move |cfg| routes::configure(cfg, &state, &limiters)),
        )
        .await
    }};
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri).peer_addr(peer())
}

fn post(uri: &str) -> TestRequest {
    TestRequest::post().uri(uri).peer_addr(peer())
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

async fn body_text<B>(resp: actix_web::dev::ServiceResponse<B>) -> String
where
    B: actix_web::body::MessageBody,
    B::Error: std::fmt::Debug,
{
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[actix_web::test]
async fn liveness_route_answers_text() {
    let app = init_app!(config(&[]));

    let resp = test::call_service(&app, get("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!body_text(resp).await.is_empty());
}

#[actix_web::test]
async fn admin_query_follows_the_roster() {
    let app = init_app!(config(&[]));

    let issued: Value = test::call_and_read_body_json(
        &app,
        post("/jwt").set_json(json!({"email": "a@x.com"})).to_request(),
    )
    .await;
    let token = issued["token"].as_str().unwrap().to_string();

    let before: Value = test::call_and_read_body_json(
        &app,
        get("/users/admin/a@x.com")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(before, json!({"admin": false}));

    let resp = test::call_service(
        &app,
        post("/users")
            .set_json(json!({"email": "a@x.com", "role": "admin"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let after: Value = test::call_and_read_body_json(
        &app,
        get("/users/admin/a@x.com")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(after, json!({"admin": true}));

    // asking about someone else never says true
    let other: Value = test::call_and_read_body_json(
        &app,
        get("/users/admin/boss@x.com")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(other, json!({"admin": false}));
}

#[actix_web::test]
async fn protected_route_rejects_bad_credentials() {
    let app = init_app!(config(&[]));
    let foreign = TokenService::new(Some("someone-else".into()), 60)
        .issue(&json!({"email": "a@x.com"}))
        .unwrap();

    let requests = vec![
        get("/users/admin/a@x.com").to_request(),
        get("/users/admin/a@x.com")
            .insert_header((header::AUTHORIZATION, "Bearer"))
            .to_request(),
        get("/users/admin/a@x.com")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
            .to_request(),
        get("/users/admin/a@x.com")
            .insert_header(bearer(&foreign))
            .to_request(),
    ];

    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body, json!({"error": true, "message": "Unauthorized access"}));
    }
}

#[actix_web::test]
async fn token_endpoint_fails_without_secret() {
    let app = init_app!(Config {
        jwt_secret: None,
        ..config(&[])
    });

    let resp = test::call_service(
        &app,
        post("/jwt").set_json(json!({"email": "a@x.com"})).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn duplicate_user_is_acknowledged_once() {
    let app = init_app!(config(&[]));
    let user = json!({"email": "a@x.com", "name": "A"});

    let first: Value =
        test::call_and_read_body_json(&app, post("/users").set_json(&user).to_request()).await;
    assert_eq!(first["acknowledged"], true);
    let id = first["insertedId"].as_u64().unwrap();

    let second: Value =
        test::call_and_read_body_json(&app, post("/users").set_json(&user).to_request()).await;
    assert_eq!(second, json!({"message": "User already exists"}));

    let all: Value = test::call_and_read_body_json(&app, get("/users").to_request()).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let by_email: Value =
        test::call_and_read_body_json(&app, get("/employee/a@x.com").to_request()).await;
    assert_eq!(by_email.as_array().unwrap().len(), 1);

    let by_id: Value =
        test::call_and_read_body_json(&app, get(&format!("/users/{id}")).to_request()).await;
    assert_eq!(by_id["email"], "a@x.com");
}

#[actix_web::test]
async fn user_lookup_by_id_answers_in_text() {
    let app = init_app!(config(&[]));

    let missing = test::call_service(&app, get("/users/404").to_request()).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(missing).await, "User not found");

    let malformed = test::call_service(&app, get("/users/64b7f0c2e1").to_request()).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn patch_and_delete_address_users_by_email() {
    let app = init_app!(config(&[]));
    test::call_service(
        &app,
        post("/users")
            .set_json(json!({"email": "a@x.com", "role": "staff"}))
            .to_request(),
    )
    .await;

    let patched = test::call_service(
        &app,
        TestRequest::patch()
            .uri("/users/a@x.com")
            .peer_addr(peer())
            .set_json(json!({"role": "lead"}))
            .to_request(),
    )
    .await;
    assert_eq!(patched.status(), StatusCode::OK);

    let stored: Value =
        test::call_and_read_body_json(&app, get("/employee/a@x.com").to_request()).await;
    assert_eq!(stored[0]["role"], "lead");

    let missing = test::call_service(
        &app,
        TestRequest::patch()
            .uri("/users/ghost@x.com")
            .peer_addr(peer())
            .set_json(json!({"role": "lead"}))
            .to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        serde_json::from_str::<Value>(&body_text(missing).await).unwrap(),
        json!({"message": "User not found"})
    );

    let deleted: Value = test::call_and_read_body_json(
        &app,
        TestRequest::delete()
            .uri("/users/a@x.com")
            .peer_addr(peer())
            .to_request(),
    )
    .await;
    assert_eq!(deleted, json!({"message": "User deleted successfully"}));

    let again = test::call_service(
        &app,
        TestRequest::delete()
            .uri("/users/a@x.com")
            .peer_addr(peer())
            .to_request(),
    )
    .await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn guarded_mutations_require_an_admin_token() {
    let app = init_app!(config(&[("ADMIN_GUARDED_MUTATIONS", "true")]));

    for user in [
        json!({"email": "boss@x.com", "role": "admin"}),
        json!({"email": "a@x.com", "role": "staff"}),
    ] {
        test::call_service(&app, post("/users").set_json(user).to_request()).await;
    }

    let token_for = |email: &str| {
        TokenService::new(Some(SECRET.into()), 60)
            .issue(&json!({ "email": email }))
            .unwrap()
    };

    let anonymous = test::call_service(
        &app,
        TestRequest::delete()
            .uri("/users/a@x.com")
            .peer_addr(peer())
            .to_request(),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let staff = test::call_service(
        &app,
        TestRequest::delete()
            .uri("/users/a@x.com")
            .peer_addr(peer())
            .insert_header(bearer(&token_for("a@x.com")))
            .to_request(),
    )
    .await;
    assert_eq!(staff.status(), StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body_text(staff).await).unwrap();
    assert_eq!(body, json!({"error": true, "message": "Forbidden access"}));

    let admin = test::call_service(
        &app,
        TestRequest::delete()
            .uri("/users/a@x.com")
            .peer_addr(peer())
            .insert_header(bearer(&token_for("boss@x.com")))
            .to_request(),
    )
    .await;
    assert_eq!(admin.status(), StatusCode::OK);

    // reads stay public
    let listed = test::call_service(&app, get("/users").to_request()).await;
    assert_eq!(listed.status(), StatusCode::OK);
}

#[actix_web::test]
async fn attendance_is_one_record_per_day() {
    let app = init_app!(config(&[]));
    let day = json!({"email": "a@x.com", "date": "2024-01-01", "status": "present"});

    let first = test::call_service(&app, post("/attendance").set_json(&day).to_request()).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = test::call_service(&app, post("/attendance").set_json(&day).to_request()).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(second).await.contains("2024-01-01"));

    let all: Value = test::call_and_read_body_json(&app, get("/attendance").to_request()).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn attendance_update_and_delete() {
    let app = init_app!(config(&[]));
    test::call_service(
        &app,
        post("/attendance")
            .set_json(json!({"email": "a@x.com", "date": "2024-01-01", "status": "present"}))
            .to_request(),
    )
    .await;

    let updated: Value = test::call_and_read_body_json(
        &app,
        TestRequest::put()
            .uri("/attendance/a@x.com/2024-01-01")
            .peer_addr(peer())
            .set_json(json!({"status": "late"}))
            .to_request(),
    )
    .await;
    assert_eq!(updated["matchedCount"], 1);
    assert_eq!(updated["modifiedCount"], 1);

    let upserted: Value = test::call_and_read_body_json(
        &app,
        TestRequest::put()
            .uri("/attendance/a@x.com/2024-01-02")
            .peer_addr(peer())
            .set_json(json!({"status": "remote"}))
            .to_request(),
    )
    .await;
    assert_eq!(upserted["upsertedCount"], 1);

    let mine: Value =
        test::call_and_read_body_json(&app, get("/attendance/a@x.com").to_request()).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
    assert_eq!(mine[0]["status"], "late");

    let deleted: Value = test::call_and_read_body_json(
        &app,
        TestRequest::delete()
            .uri("/attendance/a@x.com/2024-01-01")
            .peer_addr(peer())
            .to_request(),
    )
    .await;
    assert_eq!(deleted, json!({"acknowledged": true, "deletedCount": 1}));

    let missing = test::call_service(
        &app,
        TestRequest::delete()
            .uri("/attendance/a@x.com/2024-01-01")
            .peer_addr(peer())
            .to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn require_existing_policy_blocks_upsert() {
    let app = init_app!(config(&[("ATTENDANCE_UPDATE_POLICY", "require-existing")]));

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri("/attendance/a@x.com/2024-01-05")
            .peer_addr(peer())
            .set_json(json!({"status": "remote"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn empty_patch_is_not_found() {
    let app = init_app!(config(&[]));

    let resp = test::call_service(
        &app,
        TestRequest::patch()
            .uri("/users/ghost@x.com")
            .peer_addr(peer())
            .set_json(json!({}))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        serde_json::from_str::<Value>(&body_text(resp).await).unwrap(),
        json!({"message": "User not found"})
    );
}

#[actix_web::test]
async fn moving_attendance_onto_a_taken_day_names_the_new_day() {
    let app = init_app!(config(&[]));
    for date in ["2024-01-01", "2024-01-02"] {
        test::call_service(
            &app,
            post("/attendance")
                .set_json(json!({"email": "a@x.com", "date": date}))
                .to_request(),
        )
        .await;
    }

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri("/attendance/a@x.com/2024-01-01")
            .peer_addr(peer())
            .set_json(json!({"date": "2024-01-02"}))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_text(resp).await,
        "Attendance for 2024-01-02 has already been taken."
    );
}

#[actix_web::test]
async fn overlong_email_is_refused_before_storage() {
    let app = init_app!(config(&[]));
    let email = format!("{}@x.com", "a".repeat(300));

    let resp = test::call_service(
        &app,
        post("/users").set_json(json!({"email": email})).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let all: Value = test::call_and_read_body_json(&app, get("/users").to_request()).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn browsers_may_call_from_any_origin_by_default() {
    let app = init_app!(config(&[]));

    let preflight = test::call_service(
        &app,
        TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/users")
            .peer_addr(peer())
            .insert_header((header::ORIGIN, "http://localhost:5173"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .to_request(),
    )
    .await;
    assert!(preflight.status().is_success());
    assert_eq!(
        preflight.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let listed = test::call_service(
        &app,
        get("/users")
            .insert_header((header::ORIGIN, "http://localhost:5173"))
            .to_request(),
    )
    .await;
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(
        listed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[actix_web::test]
async fn configured_origins_are_echoed() {
    let app = init_app!(config(&[("CORS_ALLOWED_ORIGINS", "https://hr.example.com")]));

    let resp = test::call_service(
        &app,
        get("/")
            .insert_header((header::ORIGIN, "https://hr.example.com"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://hr.example.com"
    );
}
