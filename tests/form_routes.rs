mod common;

use actix_web::http::StatusCode;
use actix_web::{App, test};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use common::FakeBackend;
use queue_booking::{handlers, routes};

const VALID: [(&str, &str); 5] = [
    ("firstName", "Somchai"),
    ("lastName", "ใจดี"),
    ("phone", "0812345678"),
    ("branch", "2"),
    ("appoint_date", "2024-01-05"),
];

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state.clone()).configure(routes::init)).await
    };
}

macro_rules! open_form {
    ($app:expr) => {{
        let resp = test::call_service(&$app, test::TestRequest::post().uri("/form").to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body["id"].as_str().unwrap().to_string()
    }};
}

macro_rules! fill {
    ($app:expr, $id:expr, $fields:expr, $slot:expr) => {{
        for (field, value) in $fields.iter() {
            let req = test::TestRequest::put()
                .uri(&format!("/form/{}/field", $id))
                .set_json(json!({ "field": field, "value": value }))
                .to_request();
            assert_eq!(test::call_service(&$app, req).await.status(), StatusCode::OK);
        }
        let req = test::TestRequest::put()
            .uri(&format!("/form/{}/time", $id))
            .set_json(json!({ "slot": $slot }))
            .to_request();
        assert_eq!(test::call_service(&$app, req).await.status(), StatusCode::OK);
    }};
}

#[actix_web::test]
async fn ping() {
    let state = common::state(Arc::new(FakeBackend::new()));
    let app = app!(state);

    let req = test::TestRequest::get().uri("/health/ping").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "pong");
}

#[actix_web::test]
async fn ready_once_reference_data_is_loaded() {
    let state = common::state(Arc::new(FakeBackend::new()));
    let app = app!(state);

    state.references.refresh().await;

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["branches"]["status"], "loaded");
}

#[actix_web::test]
async fn branches_report_their_load_state() {
    let state = common::state(Arc::new(FakeBackend::new()));
    let app = app!(state);
    state.references.refresh().await;

    let req = test::TestRequest::get().uri("/reference/branches").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "loaded");
    assert_eq!(body["data"], json!([{ "id": 1, "branch": "Siam" }, { "id": 2, "branch": "Ari" }]));
}

#[actix_web::test]
async fn availability_disables_full_slots_for_the_pair_only() {
    let state = common::state(Arc::new(FakeBackend::new()));
    let app = app!(state);
    state.references.refresh().await;

    let slots = |branch: i64, date: &str| {
        test::TestRequest::get()
            .uri(&format!("/reference/availability?branch={branch}&date={date}"))
            .to_request()
    };

    let hit: Value = test::call_and_read_body_json(&app, slots(1, "2024-01-01")).await;
    assert_eq!(hit[0]["slot"], "12");
    assert_eq!(hit[0]["unavailable"], true);
    assert_eq!(hit[1]["unavailable"], false);

    let other_branch: Value = test::call_and_read_body_json(&app, slots(2, "2024-01-01")).await;
    assert!(other_branch.as_array().unwrap().iter().all(|s| s["unavailable"] == false));

    let other_day: Value = test::call_and_read_body_json(&app, slots(1, "2024-01-02")).await;
    assert!(other_day.as_array().unwrap().iter().all(|s| s["unavailable"] == false));

    let bad = test::call_service(&app, slots(1, "Jan%202")).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn valid_submission_books_once_and_clears_the_form() {
    let backend = Arc::new(FakeBackend::new());
    let state = common::state(backend.clone());
    let app = app!(state);
    state.references.refresh().await;

    let id = open_form!(app);
    fill!(app, id, VALID, "14");

    let req = test::TestRequest::post().uri(&format!("/form/{id}/submit")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;

    let created = backend.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].first_name, "Somchai");
    assert_eq!(created[0].branch, 2);
    assert_eq!(created[0].appoint_time.label(), "14");

    assert_eq!(body["notification"]["level"], "success");
    assert_eq!(
        body["notification"]["text"],
        "Somchai ใจดี, Ari on 5 January 2024 at 14:00"
    );
    assert_eq!(body["form"]["form"]["values"]["firstName"], "");
    assert_eq!(body["form"]["form"]["appoint_time"], Value::Null);
    assert_eq!(body["form"]["form"]["submitting"], false);
}

#[actix_web::test]
async fn rejected_submission_keeps_what_was_typed() {
    let backend = Arc::new(FakeBackend::rejecting("this phone already has a booking"));
    let state = common::state(backend.clone());
    let app = app!(state);
    state.references.refresh().await;

    let id = open_form!(app);
    fill!(app, id, VALID, "15");

    let req = test::TestRequest::post().uri(&format!("/form/{id}/submit")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(backend.created().len(), 1);
    assert_eq!(body["notification"]["level"], "error");
    assert_eq!(body["notification"]["text"], "this phone already has a booking");
    assert_eq!(body["form"]["form"]["values"]["phone"], "0812345678");
    assert_eq!(body["form"]["form"]["appoint_time"], "15");
}

#[actix_web::test]
async fn invalid_fields_block_submission() {
    let backend = Arc::new(FakeBackend::new());
    let state = common::state(backend.clone());
    let app = app!(state);
    state.references.refresh().await;

    let id = open_form!(app);
    let mut fields = VALID;
    fields[0] = ("firstName", "Somchai99");
    fields[4] = ("appoint_date", "2024-01-01");
    fill!(app, id, fields, "14");

    let req = test::TestRequest::post().uri(&format!("/form/{id}/submit")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;

    assert!(backend.created().is_empty());
    let errors = body["fields"].as_array().unwrap();
    assert!(errors.contains(&json!({ "field": "firstName", "message": "letters only" })));
    assert!(errors.contains(&json!({ "field": "appoint_date", "message": "please choose another date" })));
}

#[actix_web::test]
async fn blur_reports_a_single_field() {
    let state = common::state(Arc::new(FakeBackend::new()));
    let app = app!(state);

    let id = open_form!(app);
    let req = test::TestRequest::put()
        .uri(&format!("/form/{id}/field"))
        .set_json(json!({ "field": "phone", "value": "081" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/form/{id}/blur"))
        .set_json(json!({ "field": "phone" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"], json!({ "field": "phone", "message": "must be 10 digits" }));
}

#[actix_web::test]
async fn full_slot_cannot_be_chosen() {
    let state = common::state(Arc::new(FakeBackend::new()));
    let app = app!(state);
    state.references.refresh().await;

    let id = open_form!(app);
    fill!(app, id, VALID, "13");

    // 12:00 at branch 2 on the 5th already holds 5 bookings
    let req = test::TestRequest::put()
        .uri(&format!("/form/{id}/time"))
        .set_json(json!({ "slot": "12" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn unknown_form_is_not_found() {
    let state = common::state(Arc::new(FakeBackend::new()));
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/form/6f1c1b3e-3c0c-4a8e-9d55-2f6a3d3f0a11")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn closed_form_is_gone() {
    let state = common::state(Arc::new(FakeBackend::new()));
    let app = app!(state);

    let id = open_form!(app);
    let req = test::TestRequest::delete().uri(&format!("/form/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri(&format!("/form/{id}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn second_submit_is_refused_while_the_first_is_in_flight() {
    let gate = Arc::new(Semaphore::new(0));
    let backend = Arc::new(FakeBackend::gated(gate.clone()));
    let state = common::state(backend.clone());
    let app = app!(state);
    state.references.refresh().await;

    let id = open_form!(app);
    fill!(app, id, VALID, "14");

    let session = state.session(id.parse().unwrap()).await.unwrap();
    let submit = || test::TestRequest::post().uri(&format!("/form/{id}/submit")).to_request();

    let (first, second) = tokio::join!(test::call_service(&app, submit()), async {
        // wait until the first submit is parked on the backend
        while !session.lock().await.is_submitting() {
            tokio::task::yield_now().await;
        }
        let resp = test::call_service(&app, submit()).await;
        gate.add_permits(1);
        resp
    });

    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(backend.created().len(), 1);
}

#[actix_web::test]
async fn submit_dropped_mid_flight_still_settles_the_form() {
    let gate = Arc::new(Semaphore::new(0));
    let backend = Arc::new(FakeBackend {
        gate: Some(gate.clone()),
        ..FakeBackend::rejecting("branch is closed that day")
    });
    let state = common::state(backend.clone());
    let app = app!(state);
    state.references.refresh().await;

    let id = open_form!(app);
    fill!(app, id, VALID, "14");
    let form_id = id.parse().unwrap();

    // the client hangs up while the backend is still answering
    let dropped = tokio::time::timeout(
        Duration::from_millis(50),
        handlers::form::submit(&state, form_id),
    )
    .await;
    assert!(dropped.is_err());

    gate.add_permits(2);
    let session = state.session(form_id).await.unwrap();
    while session.lock().await.is_submitting() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let req = test::TestRequest::post().uri(&format!("/form/{id}/submit")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["form"]["form"]["values"]["phone"], "0812345678");
    assert_eq!(backend.created().len(), 2);
}
