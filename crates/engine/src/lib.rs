pub use accounts::Account;
pub use error::EngineError;
pub use expense_tags::ExpenseTagLink;
pub use expenses::Expense;
pub use frequency::Frequency;
pub use income::Income;
pub use ops::{Engine, EngineBuilder, OrphanedTagLink};
pub use settings::Setting;
pub use snapshot::{
    ImportCounts, ImportSummary, RowId, SkippedRows, SkippedTagLink, Snapshot, SnapshotVersion,
};
pub use tags::Tag;
pub use versions::BudgetVersion;

mod accounts;
mod error;
mod expense_tags;
mod expenses;
mod frequency;
mod income;
mod ops;
mod remap;
mod settings;
mod snapshot;
mod tags;
mod users;
mod versions;

type ResultEngine<T> = Result<T, EngineError>;
