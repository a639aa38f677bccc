use crate::auth::AuthUser;
use crate::error::Result;
use crate::extractors::{AppJson, AppPath};
use crate::handlers::companies::find_owned_company;
use crate::helpers::converters::{answers_to_json, questionnaire_to_dto};
use crate::helpers::retry::{is_transient_db_error, retry_with_backoff};
use crate::schemas::AppState;
use axum::extract::State;
use chrono::Utc;
use common::{ApiResponse, QuestionnaireAnswers, QuestionnaireDto};
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

/// Answers to store. Replaces whatever was saved before.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SaveQuestionnaireRequest {
    #[schema(value_type = Object)]
    pub answers: QuestionnaireAnswers,
}

/// Read the questionnaire answers of a company
#[utoipa::path(
    get,
    path = "/questionnaire/{company_id}",
    tag = "questionnaire",
    security(("bearer_auth" = [])),
    params(
        ("company_id" = i32, Path, description = "Company ID"),
    ),
    responses(
        (status = 200, description = "Answers retrieved; empty map when none saved", body = ApiResponse<QuestionnaireDto>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller neither owns the company nor is an admin", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_questionnaire(
    auth: AuthUser,
    AppPath(company_id): AppPath<i32>,
    State(state): State<AppState>,
) -> Result<AppJson<ApiResponse<QuestionnaireDto>>> {
    trace!("Entering get_questionnaire function for company_id: {}", company_id);
    let found = find_owned_company(&state.db, &auth, company_id).await?;
    let dto = questionnaire_to_dto(found);
    debug!("Company {} has {} saved answers", company_id, dto.answers.len());
    Ok(AppJson(ApiResponse::ok(dto, "Questionnaire retrieved successfully")))
}

/// Save the questionnaire answers of a company
///
/// The write is retried on transient database contention; concurrent saves
/// resolve as last writer wins.
#[utoipa::path(
    post,
    path = "/questionnaire/{company_id}",
    tag = "questionnaire",
    security(("bearer_auth" = [])),
    params(
        ("company_id" = i32, Path, description = "Company ID"),
    ),
    request_body = SaveQuestionnaireRequest,
    responses(
        (status = 200, description = "Answers saved", body = ApiResponse<QuestionnaireDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller neither owns the company nor is an admin", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn save_questionnaire(
    auth: AuthUser,
    AppPath(company_id): AppPath<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<SaveQuestionnaireRequest>,
) -> Result<AppJson<ApiResponse<QuestionnaireDto>>> {
    trace!("Entering save_questionnaire function for company_id: {}", company_id);
    let found = find_owned_company(&state.db, &auth, company_id).await?;
    debug!("Saving {} answers for company {}", request.answers.len(), company_id);

    let mut active = found.into_active_model();
    active.questionnaire_answers = Set(Some(answers_to_json(&request.answers)));
    active.questionnaire_updated_at = Set(Some(Utc::now()));

    let saved = retry_with_backoff(&state.retry, is_transient_db_error, || {
        active.clone().update(&state.db)
    })
    .await?;

    info!("Questionnaire for company {} saved by '{}'", company_id, auth.0.username);
    Ok(AppJson(ApiResponse::ok(
        questionnaire_to_dto(saved),
        "Questionnaire saved successfully",
    )))
}
