use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{App, test};
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use hrm_leave::auth::jwt::generate_access_token;
use hrm_leave::clock::FixedClock;
use hrm_leave::config::Config;
use hrm_leave::lifecycle::notify::RecordingNotificationSink;
use hrm_leave::model::category::{CategoryColor, LeaveCategory};
use hrm_leave::model::department::Department;
use hrm_leave::model::holiday::Region;
use hrm_leave::model::person::{KeyMaterial, Person};
use hrm_leave::model::role::Role;
use hrm_leave::routes;
use hrm_leave::state::AppState;
use hrm_leave::store::memory::MemoryStore;

const SECRET: &str = "integration-secret";
const SANDRA: u64 = 1;
const BOSS: u64 = 2;
const MARLENE: u64 = 3;

fn config() -> Config {
    let vars: HashMap<&str, &str> = [("STORAGE_BACKEND", "memory"), ("JWT_SECRET", SECRET)]
        .into_iter()
        .collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new(Region::new("GERMANY_BERLIN")));
    store
        .add_person(
            Person::new(SANDRA, "sandra", "smith", vec![Role::User])
                .with_key(KeyMaterial::new("ed25519", vec![7; 32])),
        )
        .unwrap();
    store
        .add_person(Person::new(BOSS, "bernd", "boss", vec![Role::User, Role::Boss]))
        .unwrap();
    store
        .add_person(Person::new(MARLENE, "marlene", "muster", vec![Role::User]))
        .unwrap();

    let mut admins = Department::new(1, "admins");
    admins.members = vec![SANDRA, BOSS, MARLENE];
    store.add_department(admins).unwrap();

    store
        .add_category(LeaveCategory::new(1, "holiday", CategoryColor::Orange))
        .unwrap();
    store
}

fn bearer(person_id: u64, role: Role) -> (&'static str, String) {
    let token = generate_access_token(
        person_id,
        format!("user{}", person_id),
        role.id(),
        Some(person_id),
        SECRET,
        900,
    )
    .unwrap();
    ("Authorization", format!("Bearer {}", token))
}

fn peer() -> std::net::SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// Days of `person_id` in the first month of an absence overview.
fn days_of(overview: &Value, person_id: u64) -> Vec<Value> {
    overview["months"][0]["persons"]
        .as_array()
        .unwrap()
        .iter()
        .find(|person| person["id"] == json!(person_id))
        .map(|person| person["days"].as_array().unwrap().clone())
        .unwrap()
}

#[actix_web::test]
async fn submit_approve_and_show_in_calendar() {
    let config = config();
    let notifications = Arc::new(RecordingNotificationSink::default());
    let state = AppState::new(
        seeded_store(),
        &config,
        notifications.clone(),
        Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2020, 12, 1).unwrap())),
    );
    let app = test::init_service(
        App::new()
            .app_data(Data::new(state))
            .app_data(Data::new(config.clone()))
            .configure(|cfg| routes::configure(cfg, &config)),
    )
    .await;

    // Sandra applies for Monday and Tuesday
    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .peer_addr(peer())
        .insert_header(bearer(SANDRA, Role::User))
        .set_json(json!({
            "category_id": 1,
            "start_date": "2020-12-07",
            "end_date": "2020-12-08"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "waiting");
    assert_eq!(created["quantity"], "2");
    assert_eq!(created["signed_by_submitter"], true);
    let id = created["id"].as_u64().unwrap();

    // A plain colleague may not decide
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{}/approve", id))
        .peer_addr(peer())
        .insert_header(bearer(MARLENE, Role::User))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The boss has no key on file: approval succeeds unsigned and a notice goes out
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{}/approve", id))
        .peer_addr(peer())
        .insert_header(bearer(BOSS, Role::Boss))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let approved: Value = test::read_body_json(resp).await;
    assert_eq!(approved["status"], "allowed");
    assert_eq!(approved["approver_id"], json!(BOSS));
    assert_eq!(approved["signed_by_approver"], false);
    assert_eq!(notifications.notices().len(), 1);
    assert_eq!(notifications.notices()[0].request_id, id);

    // Approving twice is a conflict
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{}/approve", id))
        .peer_addr(peer())
        .insert_header(bearer(BOSS, Role::Boss))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // The colleague sees a generic marker
    let req = test::TestRequest::get()
        .uri("/api/v1/absences?year=2020&month=12")
        .peer_addr(peer())
        .insert_header(bearer(MARLENE, Role::User))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let overview: Value = test::read_body_json(resp).await;
    assert_eq!(overview["visible_departments"], json!(["admins"]));
    assert_eq!(overview["selected_departments"], json!(["admins"]));
    assert_eq!(overview["months"][0]["days"][0]["today"], true);

    let monday = &days_of(&overview, SANDRA)[6];
    assert_eq!(monday["approved_absence"]["full"], true);
    assert_eq!(monday["color"]["full"], "YELLOW");

    // The boss sees the category color
    let req = test::TestRequest::get()
        .uri("/api/v1/absences?year=2020&month=12")
        .peer_addr(peer())
        .insert_header(bearer(BOSS, Role::Boss))
        .to_request();
    let overview: Value = test::call_and_read_body_json(&app, req).await;
    let tuesday = &days_of(&overview, SANDRA)[7];
    assert_eq!(tuesday["approved_absence"]["full"], true);
    assert_eq!(tuesday["color"]["full"], "ORANGE");

    // Allowed leave can no longer be withdrawn, only cancelled
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{}/revoke", id))
        .peer_addr(peer())
        .insert_header(bearer(SANDRA, Role::User))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{}/cancel", id))
        .peer_addr(peer())
        .insert_header(bearer(SANDRA, Role::User))
        .to_request();
    let cancelled: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cancelled["status"], "cancelled");

    let req = test::TestRequest::get()
        .uri("/api/v1/absences?year=2020&month=12")
        .peer_addr(peer())
        .insert_header(bearer(BOSS, Role::Boss))
        .to_request();
    let overview: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(days_of(&overview, SANDRA)[6]["approved_absence"]["full"], false);
}

#[actix_web::test]
async fn users_only_see_their_own_leave() {
    let config = config();
    let state = AppState::new(
        seeded_store(),
        &config,
        Arc::new(RecordingNotificationSink::default()),
        Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2020, 12, 1).unwrap())),
    );
    let app = test::init_service(
        App::new()
            .app_data(Data::new(state))
            .app_data(Data::new(config.clone()))
            .configure(|cfg| routes::configure(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .peer_addr(peer())
        .insert_header(bearer(SANDRA, Role::User))
        .set_json(json!({
            "category_id": 1,
            "start_date": "2020-12-14",
            "end_date": "2020-12-14",
            "day_length": "morning"
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["quantity"], "0.5");
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/leave/{}", id))
        .peer_addr(peer())
        .insert_header(bearer(MARLENE, Role::User))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/leave")
        .peer_addr(peer())
        .insert_header(bearer(MARLENE, Role::User))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["total"], 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/leave?status=waiting")
        .peer_addr(peer())
        .insert_header(bearer(BOSS, Role::Boss))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["total"], 1);

    // Withdrawing a waiting request is fine
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{}/revoke", id))
        .peer_addr(peer())
        .insert_header(bearer(SANDRA, Role::User))
        .to_request();
    let revoked: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(revoked["status"], "revoked");
}

#[actix_web::test]
async fn rejects_missing_token_and_bad_month() {
    let config = config();
    let state = AppState::new(
        seeded_store(),
        &config,
        Arc::new(RecordingNotificationSink::default()),
        Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2020, 12, 1).unwrap())),
    );
    let app = test::init_service(
        App::new()
            .app_data(Data::new(state))
            .app_data(Data::new(config.clone()))
            .configure(|cfg| routes::configure(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/absences")
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/absences?month=13")
        .peer_addr(peer())
        .insert_header(bearer(SANDRA, Role::User))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Whole year when month is empty
    let req = test::TestRequest::get()
        .uri("/api/v1/absences?year=2020&month=")
        .peer_addr(peer())
        .insert_header(bearer(SANDRA, Role::User))
        .to_request();
    let overview: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(overview["months"].as_array().unwrap().len(), 12);
}

#[actix_web::test]
async fn tokens_must_point_at_an_active_person() {
    let config = config();
    let store = seeded_store();
    store
        .add_person(Person::new(4, "gone", "away", vec![Role::Inactive]))
        .unwrap();
    let state = AppState::new(
        store,
        &config,
        Arc::new(RecordingNotificationSink::default()),
        Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2020, 12, 1).unwrap())),
    );
    let app = test::init_service(
        App::new()
            .app_data(Data::new(state))
            .app_data(Data::new(config.clone()))
            .configure(|cfg| routes::configure(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/leave")
        .peer_addr(peer())
        .insert_header(bearer(4, Role::User))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/leave")
        .peer_addr(peer())
        .insert_header(bearer(99, Role::User))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // A user account without a person behind it
    let token = generate_access_token(50, "service".to_string(), Role::Office.id(), None, SECRET, 900)
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/api/v1/absences")
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
