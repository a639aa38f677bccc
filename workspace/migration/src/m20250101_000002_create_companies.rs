use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key on created_by: it holds a username and the
        // dashboard keeps orphaned companies when their creator is removed.
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(pk_auto(Companies::Id))
                    .col(string(Companies::Name))
                    .col(json_null(Companies::Data))
                    .col(string_null(Companies::CreatedBy))
                    .col(timestamp_with_time_zone(Companies::CreatedAt).default(Expr::current_timestamp()))
                    .col(json_null(Companies::QuestionnaireAnswers))
                    .col(timestamp_with_time_zone_null(Companies::QuestionnaireUpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_companies_created_by")
                    .table(Companies::Table)
                    .col(Companies::CreatedBy)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Name,
    Data,
    CreatedBy,
    CreatedAt,
    QuestionnaireAnswers,
    QuestionnaireUpdatedAt,
}
