//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::generation_task::{start_generation, stop_generation};
use crate::web::state::{AppState, SessionHandle};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use protein_designer_core::catalog;
use protein_designer_core::ports::PortError;
use protein_designer_core::{
    ConfidenceTier, DesignForm, GenerationJob, Plan, PricingPlan, User, UserUpdate,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_plans_handler,
        list_suggestions_handler,
        create_session_handler,
        get_session_handler,
        delete_session_handler,
        create_generation_handler,
        get_job_handler,
        clear_job_handler,
    ),
    components(
        schemas(
            PlansResponse,
            SuggestionsResponse,
            CreateSessionRequest,
            SessionResponse,
            GenerationAccepted,
            JobResponse,
        )
    ),
    tags(
        (name = "Protein Designer API", description = "Mock protein generation with plan-based quotas.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct PlansResponse {
    #[schema(value_type = Vec<Object>)]
    pub plans: Vec<PricingPlan>,
}

#[derive(Serialize, ToSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

/// Optional overrides applied to the demo user a new session starts with.
#[derive(Deserialize, Default, ToSchema)]
pub struct CreateSessionRequest {
    #[schema(value_type = Option<String>, example = "basic")]
    pub plan: Option<Plan>,
    pub email: Option<String>,
    pub generations_used: Option<u32>,
    pub generations_limit: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    #[schema(value_type = Object)]
    pub user: User,
    pub can_generate: bool,
    /// Absent for unlimited plans.
    pub remaining: Option<u32>,
    pub is_generating: bool,
}

#[derive(Serialize, ToSchema)]
pub struct GenerationAccepted {
    pub job_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct JobResponse {
    #[schema(value_type = Object)]
    pub job: GenerationJob,
    #[schema(value_type = Option<String>)]
    pub confidence_tier: Option<ConfidenceTier>,
}

//=========================================================================================
// Catalog Handlers
//=========================================================================================

/// List the pricing tiers.
#[utoipa::path(
    get,
    path = "/plans",
    responses((status = 200, description = "Pricing catalog", body = PlansResponse))
)]
pub async fn list_plans_handler() -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: catalog::pricing_plans(),
    })
}

/// List example descriptions for the designer form.
#[utoipa::path(
    get,
    path = "/suggestions",
    responses((status = 200, description = "Description suggestions", body = SuggestionsResponse))
)]
pub async fn list_suggestions_handler() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        suggestions: catalog::suggestions().iter().map(|s| s.to_string()).collect(),
    })
}

//=========================================================================================
// Session Handlers
//=========================================================================================

/// Create a designer session for the demo user.
///
/// When a plan is given without a limit, the plan's default quota applies.
/// A `custom` plan has no default and must come with `generations_limit`.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 400, description = "Custom plan without a limit")
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let generations_limit = match (request.plan, request.generations_limit) {
        (_, Some(limit)) => Some(limit),
        (Some(Plan::Custom), None) => {
            return Err(ApiError::BadRequest(
                "A custom plan requires generations_limit".to_string(),
            ))
        }
        (Some(plan), None) => Some(catalog::default_limit(plan).unwrap_or(0)),
        (None, None) => None,
    };

    let designer = app_state.new_designer(User::mock(app_state.clock.now()));
    designer.update_user(UserUpdate {
        email: request.email,
        plan: request.plan,
        generations_used: request.generations_used,
        generations_limit,
    });

    let session = app_state.sessions.insert(designer).await;
    info!(session_id = %session.id(), "Designer session created");
    Ok((StatusCode::CREATED, Json(session_response(&session))))
}

/// Show a session's user and entitlement.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session id")),
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = app_state.sessions.get(session_id).await?;
    Ok(Json(session_response(&session)))
}

/// End a session: cancel its running generation, if any, and forget it.
#[utoipa::path(
    delete,
    path = "/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session id")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = app_state.sessions.remove(session_id).await?;
    stop_generation(&session).await;
    info!(%session_id, "Designer session deleted");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Generation Handlers
//=========================================================================================

/// Submit the designer form and start a generation.
///
/// Returns the job id immediately; poll `/sessions/{session_id}/job` for progress.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/generations",
    params(("session_id" = Uuid, Path, description = "The session id")),
    request_body(content_type = "application/json", description = "The designer form: description, target_length, folding_type, stability_preference, solubility_requirement."),
    responses(
        (status = 202, description = "Generation started", body = GenerationAccepted),
        (status = 400, description = "Malformed body or the form failed validation"),
        (status = 402, description = "Generation quota exhausted"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "A generation is already running")
    )
)]
pub async fn create_generation_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    payload: Result<Json<DesignForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(form) = payload?;
    let session = app_state.sessions.get(session_id).await?;
    let job_id = start_generation(session, &form).await?;
    Ok((StatusCode::ACCEPTED, Json(GenerationAccepted { job_id })))
}

/// Show the session's current job.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/job",
    params(("session_id" = Uuid, Path, description = "The session id")),
    responses(
        (status = 200, description = "Current job", body = JobResponse),
        (status = 404, description = "Unknown session or no job")
    )
)]
pub async fn get_job_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<JobResponse>, ApiError> {
    let session = app_state.sessions.get(session_id).await?;
    let job = session
        .designer
        .current_job()
        .ok_or_else(|| PortError::NotFound(format!("job for session {}", session_id)))?;
    let confidence_tier = job.result.as_ref().map(|design| design.confidence_tier());
    Ok(Json(JobResponse {
        job,
        confidence_tier,
    }))
}

/// Cancel a running generation, if any, and clear the job.
#[utoipa::path(
    delete,
    path = "/sessions/{session_id}/job",
    params(("session_id" = Uuid, Path, description = "The session id")),
    responses(
        (status = 204, description = "Job cleared"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn clear_job_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = app_state.sessions.get(session_id).await?;
    stop_generation(&session).await;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Helpers
//=========================================================================================

fn session_response(session: &SessionHandle) -> SessionResponse {
    let designer = &session.designer;
    SessionResponse {
        session_id: session.id(),
        user: designer.user(),
        can_generate: designer.can_generate(),
        remaining: designer.remaining(),
        is_generating: designer.is_generating(),
    }
}
