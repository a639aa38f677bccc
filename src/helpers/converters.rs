use common::{CompanyData, CompanyDto, QuestionnaireAnswers, QuestionnaireDto, Role, UserDto};
use model::entities::{company, user};
use serde_json::Value as Json;
use tracing::warn;

/// Map a transport role onto the stored enum
pub fn role_to_model(role: Role) -> user::UserRole {
    match role {
        Role::User => user::UserRole::User,
        Role::Admin => user::UserRole::Admin,
    }
}

/// Map a stored role onto the transport enum
pub fn role_from_model(role: user::UserRole) -> Role {
    match role {
        user::UserRole::User => Role::User,
        user::UserRole::Admin => Role::Admin,
    }
}

/// Strip the password hash and build the public user shape
pub fn user_to_dto(model: user::Model) -> UserDto {
    UserDto {
        id: model.id,
        username: model.username,
        role: role_from_model(model.role),
        created_at: model.created_at,
    }
}

/// Decode a stored data blob.
///
/// Rows written before the blob was typed carry no `kind` tag; those are
/// surfaced as `CompanyData::Custom` instead of failing the whole listing.
pub fn company_data_from_json(company_id: i32, value: Json) -> CompanyData {
    match serde_json::from_value::<CompanyData>(value.clone()) {
        Ok(data) => data,
        Err(e) => {
            warn!("Company {} has untyped data blob ({}), returning it as custom", company_id, e);
            CompanyData::Custom { value }
        }
    }
}

pub fn company_data_to_json(data: &CompanyData) -> Result<Json, serde_json::Error> {
    serde_json::to_value(data)
}

pub fn company_to_dto(model: company::Model) -> CompanyDto {
    let company_id = model.id;
    CompanyDto {
        id: model.id,
        name: model.name,
        data: model.data.map(|value| company_data_from_json(company_id, value)),
        created_by: model.created_by,
        created_at: model.created_at,
        has_questionnaire: model.questionnaire_answers.is_some(),
    }
}

/// Decode the embedded answer map. A missing column means no answers yet.
pub fn answers_from_json(company_id: i32, value: Option<Json>) -> QuestionnaireAnswers {
    match value {
        None | Some(Json::Null) => QuestionnaireAnswers::new(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Company {} has malformed questionnaire answers: {}", company_id, e);
            QuestionnaireAnswers::new()
        }),
    }
}

pub fn answers_to_json(answers: &QuestionnaireAnswers) -> Json {
    Json::Object(
        answers
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

pub fn questionnaire_to_dto(model: company::Model) -> QuestionnaireDto {
    QuestionnaireDto {
        company_id: model.id,
        answers: answers_from_json(model.id, model.questionnaire_answers),
        updated_at: model.questionnaire_updated_at,
    }
}
