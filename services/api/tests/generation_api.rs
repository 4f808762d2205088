//! Exercises the REST handlers end to end on a paused tokio clock, so the
//! simulated phases complete without real waiting.

use api_lib::adapters::{StdRngSource, TokioClock};
use api_lib::config::Config;
use api_lib::web::rest::CreateSessionRequest;
use api_lib::web::state::AppState;
use api_lib::web::{
    clear_job_handler, create_generation_handler, create_session_handler, delete_session_handler,
    get_job_handler, get_session_handler, list_plans_handler, list_suggestions_handler,
};
use axum::body::Body;
use axum::extract::{FromRequest, Path, State};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use protein_designer_core::{DesignForm, Plan};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn app_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(Config::default()),
        Arc::new(TokioClock),
        Arc::new(StdRngSource::new(Some(11))),
    ))
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_session(state: &Arc<AppState>, request: Option<CreateSessionRequest>) -> Uuid {
    let response = create_session_handler(State(state.clone()), request.map(Json))
        .await
        .unwrap()
        .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["session_id"].as_str().unwrap().parse().unwrap()
}

fn free_user_request(used: u32) -> CreateSessionRequest {
    CreateSessionRequest {
        plan: Some(Plan::Free),
        generations_used: Some(used),
        ..Default::default()
    }
}

fn form(description: &str, target_length: i64) -> DesignForm {
    serde_json::from_value(json!({
        "description": description,
        "target_length": target_length,
        "folding_type": "alpha-helix",
        "stability_preference": "neutral",
        "solubility_requirement": "soluble",
    }))
    .unwrap()
}

async fn submit(state: &Arc<AppState>, session_id: Uuid, form: DesignForm) -> Response {
    match create_generation_handler(State(state.clone()), Path(session_id), Ok(Json(form))).await {
        Ok(ok) => ok.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn job(state: &Arc<AppState>, session_id: Uuid) -> Result<Value, StatusCode> {
    match get_job_handler(State(state.clone()), Path(session_id)).await {
        Ok(Json(job)) => Ok(serde_json::to_value(&job).unwrap()),
        Err(err) => Err(err.status()),
    }
}

async fn session(state: &Arc<AppState>, session_id: Uuid) -> Value {
    let Json(response) = get_session_handler(State(state.clone()), Path(session_id))
        .await
        .unwrap();
    serde_json::to_value(&response).unwrap()
}

#[tokio::test(start_paused = true)]
async fn generation_progresses_and_consumes_quota() {
    let state = app_state();
    let session_id = create_session(&state, Some(free_user_request(0))).await;

    let response = submit(&state, session_id, form("test", 100)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let job_id = body_json(response).await["job_id"].as_str().unwrap().to_string();

    let pending = job(&state, session_id).await.unwrap();
    assert_eq!(pending["job"]["id"], job_id);
    assert_eq!(pending["job"]["status"], "pending");
    assert_eq!(session(&state, session_id).await["is_generating"], true);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let processing = job(&state, session_id).await.unwrap();
    assert_eq!(processing["job"]["status"], "processing");
    assert!(processing["job"]["result"].is_null());

    tokio::time::sleep(Duration::from_secs(3)).await;
    let completed = job(&state, session_id).await.unwrap();
    assert_eq!(completed["job"]["status"], "completed");
    let result = &completed["job"]["result"];
    assert_eq!(result["sequence"].as_str().unwrap().len(), 100);
    assert_eq!(result["target_length"], 100);
    assert_eq!(result["folding_type"], "alpha-helix");
    assert_eq!(result["exported"], false);
    let confidence = result["confidence"].as_f64().unwrap();
    assert!((85.0..95.0).contains(&confidence));
    assert!(completed["confidence_tier"].is_string());

    let after = session(&state, session_id).await;
    assert_eq!(after["user"]["generations_used"], 1);
    assert_eq!(after["remaining"], 2);
    assert_eq!(after["is_generating"], false);
}

#[tokio::test(start_paused = true)]
async fn second_submission_while_running_conflicts() {
    let state = app_state();
    let session_id = create_session(&state, Some(free_user_request(0))).await;

    assert_eq!(
        submit(&state, session_id, form("first", 60)).await.status(),
        StatusCode::ACCEPTED
    );
    assert_eq!(
        submit(&state, session_id, form("second", 60)).await.status(),
        StatusCode::CONFLICT
    );

    tokio::time::sleep(Duration::from_secs(6)).await;
    let done = job(&state, session_id).await.unwrap();
    assert_eq!(done["job"]["description"], "first");
    assert_eq!(done["job"]["status"], "completed");
}

#[tokio::test(start_paused = true)]
async fn exhausted_quota_is_payment_required() {
    let state = app_state();
    let session_id = create_session(&state, Some(free_user_request(3))).await;
    assert_eq!(session(&state, session_id).await["can_generate"], false);

    let response = submit(&state, session_id, form("binder", 80)).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(job(&state, session_id).await, Err(StatusCode::NOT_FOUND));
}

#[tokio::test(start_paused = true)]
async fn invalid_form_is_rejected_without_a_job() {
    let state = app_state();
    let session_id = create_session(&state, None).await;

    for bad in [form("binder", 19), form("binder", 501), form("   ", 100)] {
        assert_eq!(submit(&state, session_id, bad).await.status(), StatusCode::BAD_REQUEST);
    }
    let mut missing = form("binder", 100);
    missing.folding_type = None;
    assert_eq!(submit(&state, session_id, missing).await.status(), StatusCode::BAD_REQUEST);

    assert_eq!(job(&state, session_id).await, Err(StatusCode::NOT_FOUND));
    assert_eq!(session(&state, session_id).await["user"]["generations_used"], 1);
}

#[tokio::test(start_paused = true)]
async fn clearing_a_running_job_cancels_it() {
    let state = app_state();
    let session_id = create_session(&state, Some(free_user_request(0))).await;
    assert_eq!(
        submit(&state, session_id, form("binder", 80)).await.status(),
        StatusCode::ACCEPTED
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    let status = clear_job_handler(State(state.clone()), Path(session_id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(job(&state, session_id).await, Err(StatusCode::NOT_FOUND));
    let after = session(&state, session_id).await;
    assert_eq!(after["user"]["generations_used"], 0);
    assert_eq!(after["is_generating"], false);

    // The session is usable again after clearing.
    assert_eq!(
        submit(&state, session_id, form("binder", 80)).await.status(),
        StatusCode::ACCEPTED
    );
}

#[tokio::test(start_paused = true)]
async fn resubmitting_right_after_clearing_is_accepted() {
    let state = app_state();
    let session_id = create_session(&state, Some(free_user_request(0))).await;
    assert_eq!(
        submit(&state, session_id, form("first", 80)).await.status(),
        StatusCode::ACCEPTED
    );

    // No time passes between the clear and the next submission.
    let status = clear_job_handler(State(state.clone()), Path(session_id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        submit(&state, session_id, form("second", 80)).await.status(),
        StatusCode::ACCEPTED
    );

    tokio::time::sleep(Duration::from_secs(6)).await;
    let done = job(&state, session_id).await.unwrap();
    assert_eq!(done["job"]["description"], "second");
    assert_eq!(done["job"]["status"], "completed");
    assert_eq!(session(&state, session_id).await["user"]["generations_used"], 1);
}

#[tokio::test(start_paused = true)]
async fn deleting_a_session_stops_its_run_and_forgets_it() {
    let state = app_state();
    let session_id = create_session(&state, Some(free_user_request(0))).await;
    assert_eq!(
        submit(&state, session_id, form("binder", 80)).await.status(),
        StatusCode::ACCEPTED
    );
    tokio::time::sleep(Duration::from_secs(1)).await;

    let status = delete_session_handler(State(state.clone()), Path(session_id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(state.sessions.len().await, 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(job(&state, session_id).await, Err(StatusCode::NOT_FOUND));
    let err = get_session_handler(State(state.clone()), Path(session_id))
        .await
        .err()
        .unwrap();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let again = delete_session_handler(State(state.clone()), Path(session_id)).await;
    assert_eq!(again.err().map(|e| e.status()), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let state = app_state();
    let session_id = create_session(&state, None).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/sessions/{}/generations", session_id))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"target_length":100,"folding_type":"triple-helix"}"#))
        .unwrap();
    let payload = Json::<DesignForm>::from_request(request, &()).await;
    assert!(payload.is_err());

    let response = match create_generation_handler(State(state.clone()), Path(session_id), payload)
        .await
    {
        Ok(ok) => ok.into_response(),
        Err(err) => err.into_response(),
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(job(&state, session_id).await, Err(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn default_session_uses_the_demo_user() {
    let state = app_state();
    let session_id = create_session(&state, None).await;
    let body = session(&state, session_id).await;
    assert_eq!(body["user"]["plan"], "free");
    assert_eq!(body["user"]["email"], "user@example.com");
    assert_eq!(body["user"]["generations_used"], 1);
    assert_eq!(body["user"]["generations_limit"], 3);
    assert_eq!(body["remaining"], 2);
    assert_eq!(state.sessions.len().await, 1);
}

#[tokio::test]
async fn plan_choice_sets_the_quota() {
    let state = app_state();

    let basic = create_session(
        &state,
        Some(CreateSessionRequest {
            plan: Some(Plan::Basic),
            generations_used: Some(0),
            ..Default::default()
        }),
    )
    .await;
    assert_eq!(session(&state, basic).await["user"]["generations_limit"], 10);

    let pro = create_session(
        &state,
        Some(CreateSessionRequest {
            plan: Some(Plan::Pro),
            ..Default::default()
        }),
    )
    .await;
    let body = session(&state, pro).await;
    assert_eq!(body["can_generate"], true);
    assert!(body["remaining"].is_null());

    let custom = create_session_handler(
        State(state.clone()),
        Some(Json(CreateSessionRequest {
            plan: Some(Plan::Custom),
            ..Default::default()
        })),
    )
    .await;
    assert_eq!(custom.err().map(|e| e.status()), Some(StatusCode::BAD_REQUEST));

    let custom = create_session(
        &state,
        Some(CreateSessionRequest {
            plan: Some(Plan::Custom),
            generations_limit: Some(250),
            ..Default::default()
        }),
    )
    .await;
    assert_eq!(session(&state, custom).await["remaining"], 249);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let state = app_state();
    let missing = Uuid::new_v4();
    assert_eq!(
        submit(&state, missing, form("binder", 80)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(job(&state, missing).await, Err(StatusCode::NOT_FOUND));
    let err = get_session_handler(State(state.clone()), Path(missing))
        .await
        .err()
        .unwrap();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_endpoints_list_plans_and_suggestions() {
    let Json(plans) = list_plans_handler().await;
    let plans = serde_json::to_value(&plans).unwrap();
    let ids: Vec<&str> = plans["plans"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["free", "basic", "pro"]);
    assert_eq!(plans["plans"][2]["generations"]["kind"], "unlimited");

    let Json(suggestions) = list_suggestions_handler().await;
    assert!(suggestions
        .suggestions
        .contains(&"Enzyme to degrade plastic".to_string()));
}
