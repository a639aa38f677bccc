use sea_orm::entity::prelude::*;

/// A company tracked by the dashboard.
///
/// `data` holds the uploaded dataset blob and `questionnaire_answers` the
/// embedded answer map. Both are stored as JSON; typed views live in the
/// transport layer.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub data: Option<Json>,
    /// Username of the creator. Not a foreign key; ownership checks compare
    /// it against the authenticated username.
    pub created_by: Option<String>,
    pub created_at: DateTimeUtc,
    pub questionnaire_answers: Option<Json>,
    pub questionnaire_updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
