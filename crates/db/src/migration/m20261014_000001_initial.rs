//! Initial schema: users, trips, participants, categories, costs,
//! transactions and debts.
//!
//! Deleting a trip cascades to everything that belongs to it. Rows that name
//! a user as payer, creditor or debtor block deleting that user.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null())
                    .col(
                        ColumnDef::new(Users::ActivatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActivationTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivationTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivationTokens::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ActivationTokens::TokenHash)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ActivationTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivationTokens::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ActivationTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activation_tokens_user")
                            .from(ActivationTokens::Table, ActivationTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Trips::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trips::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Trips::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Trips::Location).string_len(255).not_null())
                    .col(ColumnDef::new(Trips::Description).text().null())
                    .col(ColumnDef::new(Trips::StartDate).date().not_null())
                    .col(ColumnDef::new(Trips::EndDate).date().not_null())
                    .col(ColumnDef::new(Trips::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(Trips::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Trips::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TripParticipants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TripParticipants::TripId).uuid().not_null())
                    .col(ColumnDef::new(TripParticipants::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(TripParticipants::IsAccepted)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TripParticipants::PresenceStart).date().null())
                    .col(ColumnDef::new(TripParticipants::PresenceEnd).date().null())
                    .col(ColumnDef::new(TripParticipants::InvitedBy).uuid().null())
                    .col(
                        ColumnDef::new(TripParticipants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TripParticipants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(TripParticipants::TripId)
                            .col(TripParticipants::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_participants_trip")
                            .from(TripParticipants::Table, TripParticipants::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_participants_user")
                            .from(TripParticipants::Table, TripParticipants::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_participants_invited_by")
                            .from(TripParticipants::Table, TripParticipants::InvitedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CostCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CostCategories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CostCategories::TripId).uuid().not_null())
                    .col(
                        ColumnDef::new(CostCategories::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CostCategories::Description).text().null())
                    .col(ColumnDef::new(CostCategories::Icon).string_len(64).null())
                    .col(ColumnDef::new(CostCategories::Color).string_len(32).null())
                    .col(
                        ColumnDef::new(CostCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CostCategories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cost_categories_trip")
                            .from(CostCategories::Table, CostCategories::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cost_categories_trip_name")
                    .table(CostCategories::Table)
                    .col(CostCategories::TripId)
                    .col(CostCategories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // category_id is NO ACTION: checked at statement end, so a trip delete
        // that cascades to both categories and costs succeeds while a direct
        // category delete with costs left fails.
        manager
            .create_table(
                Table::create()
                    .table(Costs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Costs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Costs::TripId).uuid().not_null())
                    .col(ColumnDef::new(Costs::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Costs::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Costs::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Costs::Amount).string_len(32).not_null())
                    .col(ColumnDef::new(Costs::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Costs::CostDate).date().not_null())
                    .col(
                        ColumnDef::new(Costs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Costs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_costs_trip")
                            .from(Costs::Table, Costs::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_costs_category")
                            .from(Costs::Table, Costs::CategoryId)
                            .to(CostCategories::Table, CostCategories::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_costs_created_by")
                            .from(Costs::Table, Costs::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_costs_trip")
                    .table(Costs::Table)
                    .col(Costs::TripId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::TripId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::CreditorId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::DebtorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Description).text().null())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::IsConfirmed)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::ConfirmedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Transactions::DeletedBy).uuid().null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_trip")
                            .from(Transactions::Table, Transactions::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_creditor")
                            .from(Transactions::Table, Transactions::CreditorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_debtor")
                            .from(Transactions::Table, Transactions::DebtorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_trip")
                    .table(Transactions::Table)
                    .col(Transactions::TripId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Debts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Debts::TripId).uuid().not_null())
                    .col(ColumnDef::new(Debts::CreditorId).uuid().not_null())
                    .col(ColumnDef::new(Debts::DebtorId).uuid().not_null())
                    .col(ColumnDef::new(Debts::Amount).string_len(32).not_null())
                    .col(ColumnDef::new(Debts::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(Debts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Debts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_trip")
                            .from(Debts::Table, Debts::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_creditor")
                            .from(Debts::Table, Debts::CreditorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_debts_debtor")
                            .from(Debts::Table, Debts::DebtorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // The upsert in the debt ledger targets this index.
        manager
            .create_index(
                Index::create()
                    .name("idx_debts_pair")
                    .table(Debts::Table)
                    .col(Debts::TripId)
                    .col(Debts::CreditorId)
                    .col(Debts::DebtorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Costs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CostCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TripParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Trips::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivationTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    IsActive,
    ActivatedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ActivationTokens {
    Table,
    Id,
    UserId,
    TokenHash,
    ExpiresAt,
    UsedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Trips {
    Table,
    Id,
    Name,
    Location,
    Description,
    StartDate,
    EndDate,
    Currency,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TripParticipants {
    Table,
    TripId,
    UserId,
    IsAccepted,
    PresenceStart,
    PresenceEnd,
    InvitedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CostCategories {
    Table,
    Id,
    TripId,
    Name,
    Description,
    Icon,
    Color,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Costs {
    Table,
    Id,
    TripId,
    CategoryId,
    CreatedBy,
    Name,
    Amount,
    Currency,
    CostDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TripId,
    CreditorId,
    DebtorId,
    Amount,
    Currency,
    Description,
    OccurredAt,
    IsConfirmed,
    ConfirmedAt,
    DeletedAt,
    DeletedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Debts {
    Table,
    Id,
    TripId,
    CreditorId,
    DebtorId,
    Amount,
    Currency,
    CreatedAt,
    UpdatedAt,
}
