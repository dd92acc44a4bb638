//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Peculium:
//!
//! - `users`: account identities and their active-version pointer
//! - `budget_versions`: named containers, each holding one full budget dataset
//! - `accounts`: bank/holding accounts, scoped to one version
//! - `tags`: expense labels, scoped to one version, unique by name within it
//! - `income`: recurring income records
//! - `expenses`: recurring expense records
//! - `expense_tags`: expense/tag join rows
//! - `settings`: opaque per-scope key/value pairs

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    ActiveVersionId,
}

#[derive(Iden)]
enum BudgetVersions {
    Table,
    Id,
    Name,
    Description,
    UserId,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    UserId,
    VersionId,
    Name,
    Bank,
    CurrentBalance,
    RequiredBalance,
    IsPrimary,
    Diff,
}

#[derive(Iden)]
enum Tags {
    Table,
    Id,
    UserId,
    VersionId,
    Name,
    Color,
}

#[derive(Iden)]
enum Income {
    Table,
    Id,
    UserId,
    VersionId,
    Description,
    Amount,
    Frequency,
    NextDue,
    ApplyFuzziness,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    UserId,
    VersionId,
    Description,
    Amount,
    Frequency,
    NextDue,
    ApplyFuzziness,
    Notes,
    AccountId,
}

#[derive(Iden)]
enum ExpenseTags {
    Table,
    ExpenseId,
    TagId,
}

#[derive(Iden)]
enum Settings {
    Table,
    UserId,
    VersionId,
    Key,
    Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        // No FK on active_version_id: users are created before any version
        // exists and the pointer is engine-enforced anyway.
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::ActiveVersionId).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Budget Versions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BudgetVersions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetVersions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetVersions::Name).string().not_null())
                    .col(ColumnDef::new(BudgetVersions::Description).string())
                    .col(ColumnDef::new(BudgetVersions::UserId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_versions-user_id")
                            .from(BudgetVersions::Table, BudgetVersions::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_versions-user_id")
                    .table(BudgetVersions::Table)
                    .col(BudgetVersions::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::UserId).string().not_null())
                    .col(ColumnDef::new(Accounts::VersionId).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::Bank).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::CurrentBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::RequiredBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Accounts::IsPrimary).boolean().not_null())
                    .col(ColumnDef::new(Accounts::Diff).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-version_id")
                            .from(Accounts::Table, Accounts::VersionId)
                            .to(BudgetVersions::Table, BudgetVersions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-version_id")
                    .table(Accounts::Table)
                    .col(Accounts::VersionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Tags
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Tags::UserId).string().not_null())
                    .col(ColumnDef::new(Tags::VersionId).string().not_null())
                    .col(ColumnDef::new(Tags::Name).string().not_null())
                    .col(ColumnDef::new(Tags::Color).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tags-version_id")
                            .from(Tags::Table, Tags::VersionId)
                            .to(BudgetVersions::Table, BudgetVersions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tags-user_id-version_id-name-unique")
                    .table(Tags::Table)
                    .col(Tags::UserId)
                    .col(Tags::VersionId)
                    .col(Tags::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Income
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Income::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Income::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Income::UserId).string().not_null())
                    .col(ColumnDef::new(Income::VersionId).string().not_null())
                    .col(ColumnDef::new(Income::Description).string().not_null())
                    .col(ColumnDef::new(Income::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Income::Frequency).string().not_null())
                    .col(ColumnDef::new(Income::NextDue).timestamp().not_null())
                    .col(ColumnDef::new(Income::ApplyFuzziness).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-income-version_id")
                            .from(Income::Table, Income::VersionId)
                            .to(BudgetVersions::Table, BudgetVersions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-income-version_id")
                    .table(Income::Table)
                    .col(Income::VersionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::UserId).string().not_null())
                    .col(ColumnDef::new(Expenses::VersionId).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).string().not_null())
                    .col(ColumnDef::new(Expenses::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Frequency).string().not_null())
                    .col(ColumnDef::new(Expenses::NextDue).timestamp().not_null())
                    .col(
                        ColumnDef::new(Expenses::ApplyFuzziness)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Notes).string())
                    .col(ColumnDef::new(Expenses::AccountId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-version_id")
                            .from(Expenses::Table, Expenses::VersionId)
                            .to(BudgetVersions::Table, BudgetVersions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-account_id")
                            .from(Expenses::Table, Expenses::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-version_id")
                    .table(Expenses::Table)
                    .col(Expenses::VersionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Expense Tags
        // ───────────────────────────────────────────────────────────────────
        // No FK on tag_id: tag rows can be removed out of band, and dangling
        // links are reaped by the engine's verify pass instead.
        manager
            .create_table(
                Table::create()
                    .table(ExpenseTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ExpenseTags::ExpenseId).string().not_null())
                    .col(ColumnDef::new(ExpenseTags::TagId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(ExpenseTags::ExpenseId)
                            .col(ExpenseTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_tags-expense_id")
                            .from(ExpenseTags::Table, ExpenseTags::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_tags-tag_id")
                    .table(ExpenseTags::Table)
                    .col(ExpenseTags::TagId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Settings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Settings::UserId).string().not_null())
                    .col(ColumnDef::new(Settings::VersionId).string().not_null())
                    .col(ColumnDef::new(Settings::Key).string().not_null())
                    .col(ColumnDef::new(Settings::Value).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(Settings::UserId)
                            .col(Settings::VersionId)
                            .col(Settings::Key),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settings-version_id")
                            .from(Settings::Table, Settings::VersionId)
                            .to(BudgetVersions::Table, BudgetVersions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExpenseTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Income::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetVersions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
