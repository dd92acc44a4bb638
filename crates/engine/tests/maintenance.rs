use chrono::{TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::HashSet;

use engine::{
    Account, Engine, EngineError, Expense, ExpenseTagLink, Frequency, ImportCounts, Income, RowId,
    Setting, Snapshot, SnapshotVersion, Tag,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    add_user(&db, "alice").await;
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn add_user(db: &DatabaseConnection, username: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username) VALUES (?);",
        vec![username.into()],
    ))
    .await
    .unwrap();
}

async fn count_rows(db: &DatabaseConnection, table: &str, version_id: Uuid) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table} WHERE version_id = ?;"),
            vec![version_id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    let count: i64 = row.try_get("", "n").unwrap();
    count
}

async fn count_all(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table};"),
        ))
        .await
        .unwrap()
        .unwrap();
    let count: i64 = row.try_get("", "n").unwrap();
    count
}

async fn count_links(db: &DatabaseConnection, version_id: Uuid) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT COUNT(*) AS n FROM expense_tags et \
             INNER JOIN expenses e ON e.id = et.expense_id \
             WHERE e.version_id = ?;",
            vec![version_id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    let count: i64 = row.try_get("", "n").unwrap();
    count
}

async fn delete_tag(db: &DatabaseConnection, tag_id: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM tags WHERE id = ?;",
        vec![tag_id.into()],
    ))
    .await
    .unwrap();
}

async fn food_tag_id(engine: &Engine, version_id: Uuid, user_id: &str) -> String {
    let exported = engine.export_snapshot(version_id, user_id).await.unwrap();
    exported
        .tags
        .iter()
        .find(|tag| tag.name == "Food")
        .unwrap()
        .id
        .to_string()
}

fn sample_snapshot() -> Snapshot {
    let next_due = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
    Snapshot {
        export_date: Utc::now(),
        version: SnapshotVersion {
            id: RowId::Int(1),
            name: "Main".to_string(),
            description: Some("household budget".to_string()),
        },
        accounts: vec![
            Account {
                id: RowId::Int(10),
                name: "Checking".to_string(),
                bank: "First National".to_string(),
                current_balance: 125_000,
                required_balance: 80_000,
                is_primary: true,
                diff: 45_000,
            },
            Account {
                id: RowId::Int(11),
                name: "Savings".to_string(),
                bank: "Coop".to_string(),
                current_balance: 400_000,
                required_balance: 0,
                is_primary: false,
                diff: 400_000,
            },
        ],
        income: vec![Income {
            id: RowId::Text("i1".to_string()),
            description: "Salary".to_string(),
            amount: 320_000,
            frequency: Frequency::Monthly,
            next_due,
            apply_fuzziness: false,
        }],
        expenses: vec![
            Expense {
                id: RowId::Text("e1".to_string()),
                description: "Rent".to_string(),
                amount: 95_000,
                frequency: Frequency::Monthly,
                next_due,
                apply_fuzziness: false,
                notes: Some("due on the 1st".to_string()),
                account_id: Some(RowId::Int(10)),
            },
            Expense {
                id: RowId::Text("e2".to_string()),
                description: "Groceries".to_string(),
                amount: 40_000,
                frequency: Frequency::Weekly,
                next_due,
                apply_fuzziness: true,
                notes: None,
                account_id: None,
            },
        ],
        tags: vec![
            Tag {
                id: RowId::Int(1),
                name: "Essentials".to_string(),
                color: Some("#ff8800".to_string()),
            },
            Tag {
                id: RowId::Int(2),
                name: "Food".to_string(),
                color: None,
            },
        ],
        settings: vec![Setting {
            key: "currency".to_string(),
            value: "EUR".to_string(),
        }],
        expense_tags: vec![
            ExpenseTagLink {
                expense_id: RowId::Text("e1".to_string()),
                tag_id: RowId::Int(1),
                tag_name: Some("Essentials".to_string()),
            },
            ExpenseTagLink {
                expense_id: RowId::Text("e2".to_string()),
                tag_id: RowId::Int(1),
                tag_name: Some("Essentials".to_string()),
            },
            ExpenseTagLink {
                expense_id: RowId::Text("e2".to_string()),
                tag_id: RowId::Int(2),
                tag_name: Some("Food".to_string()),
            },
        ],
    }
}

#[tokio::test]
async fn verifier_reports_then_repairs_orphaned_links() {
    let (engine, db) = engine_with_db().await;
    let version_id = engine
        .import_snapshot(sample_snapshot(), None, "alice")
        .await
        .unwrap()
        .version_id;

    let exported = engine.export_snapshot(version_id, "alice").await.unwrap();
    let food = exported
        .tags
        .iter()
        .find(|tag| tag.name == "Food")
        .unwrap()
        .id
        .to_string();
    let groceries = exported
        .expenses
        .iter()
        .find(|expense| expense.description == "Groceries")
        .unwrap()
        .id
        .to_string();

    // Only Groceries was linked to Food, so one link goes dangling.
    delete_tag(&db, &food).await;

    let orphans = engine
        .verify_tag_links(version_id, "alice", false)
        .await
        .unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].expense_id, groceries);
    assert_eq!(orphans[0].tag_id, food);
    assert_eq!(orphans[0].version_id, version_id.to_string());
    assert_eq!(orphans[0].user_id, "alice");

    // Reporting alone removes nothing.
    assert_eq!(count_links(&db, version_id).await, 3);

    let repaired = engine
        .verify_tag_links(version_id, "alice", true)
        .await
        .unwrap();
    assert_eq!(repaired, orphans);
    assert_eq!(count_links(&db, version_id).await, 2);
    assert!(
        engine
            .verify_tag_links(version_id, "alice", false)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn verify_all_scans_every_scope() {
    let (engine, db) = engine_with_db().await;
    add_user(&db, "bob").await;
    let alice_version = engine
        .import_snapshot(sample_snapshot(), None, "alice")
        .await
        .unwrap()
        .version_id;
    let bob_version = engine
        .import_snapshot(sample_snapshot(), None, "bob")
        .await
        .unwrap()
        .version_id;

    delete_tag(&db, &food_tag_id(&engine, alice_version, "alice").await).await;
    delete_tag(&db, &food_tag_id(&engine, bob_version, "bob").await).await;

    let orphans = engine.verify_all_tag_links(false).await.unwrap();
    assert_eq!(orphans.len(), 2);
    let users: HashSet<&str> = orphans.iter().map(|orphan| orphan.user_id.as_str()).collect();
    assert_eq!(users, HashSet::from(["alice", "bob"]));

    engine.verify_all_tag_links(true).await.unwrap();
    assert!(engine.verify_all_tag_links(false).await.unwrap().is_empty());
    assert_eq!(count_links(&db, alice_version).await, 2);
    assert_eq!(count_links(&db, bob_version).await, 2);
}

#[tokio::test]
async fn scoped_verify_requires_ownership() {
    let (engine, db) = engine_with_db().await;
    add_user(&db, "bob").await;
    let version_id = engine
        .import_snapshot(sample_snapshot(), None, "alice")
        .await
        .unwrap()
        .version_id;

    let err = engine
        .verify_tag_links(version_id, "bob", false)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("version not exists".to_string())
    );
}

#[tokio::test]
async fn new_version_starts_inactive_and_activates_explicitly() {
    let (engine, _db) = engine_with_db().await;

    let main = engine
        .new_version("Main", Some("first draft"), "alice")
        .await
        .unwrap();
    let versions = engine.list_versions("alice").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert!(!versions[0].active);
    assert_eq!(versions[0].description.as_deref(), Some("first draft"));

    engine.activate_version(main, "alice").await.unwrap();
    let versions = engine.list_versions("alice").await.unwrap();
    assert!(versions[0].active);

    // Activating another version moves the single marker.
    let next = engine.new_version("Next", None, "alice").await.unwrap();
    engine.activate_version(next, "alice").await.unwrap();
    let versions = engine.list_versions("alice").await.unwrap();
    let names: Vec<_> = versions.iter().map(|version| version.name.as_str()).collect();
    assert_eq!(names, ["Main", "Next"]);
    let active: Vec<_> = versions.iter().filter(|version| version.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, next);
}

#[tokio::test]
async fn blank_version_name_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.new_version("   ", None, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidName("version name must not be empty".to_string())
    );
}

#[tokio::test]
async fn activation_requires_an_owned_version() {
    let (engine, db) = engine_with_db().await;
    add_user(&db, "bob").await;
    let main = engine.new_version("Main", None, "alice").await.unwrap();

    let err = engine
        .activate_version(Uuid::new_v4(), "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("version not exists".to_string())
    );

    let err = engine.activate_version(main, "bob").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("version not exists".to_string())
    );
}

#[tokio::test]
async fn delete_guards_active_and_last_version() {
    let (engine, db) = engine_with_db().await;
    add_user(&db, "bob").await;

    let main = engine
        .import_snapshot(sample_snapshot(), None, "alice")
        .await
        .unwrap()
        .version_id;
    let spare = engine.new_version("Spare", None, "alice").await.unwrap();
    engine.activate_version(main, "alice").await.unwrap();

    let err = engine.delete_version(main, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidVersion("cannot delete the active version".to_string())
    );

    let only = engine.new_version("Only", None, "bob").await.unwrap();
    let err = engine.delete_version(only, "bob").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidVersion("cannot delete the last version".to_string())
    );

    let err = engine.delete_version(spare, "bob").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("version not exists".to_string())
    );

    // An inactive sibling with another version left is fair game.
    engine.delete_version(spare, "alice").await.unwrap();
    assert_eq!(engine.list_versions("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_version_removes_every_scope_row() {
    let (engine, db) = engine_with_db().await;
    let keep = engine
        .import_snapshot(sample_snapshot(), None, "alice")
        .await
        .unwrap()
        .version_id;
    let gone = engine
        .import_snapshot(sample_snapshot(), None, "alice")
        .await
        .unwrap()
        .version_id;

    engine.delete_version(gone, "alice").await.unwrap();

    for table in ["accounts", "income", "expenses", "tags", "settings"] {
        assert_eq!(count_rows(&db, table, gone).await, 0, "{table}");
    }
    assert_eq!(count_all(&db, "expense_tags").await, 3);

    assert_eq!(count_rows(&db, "accounts", keep).await, 2);
    assert_eq!(count_links(&db, keep).await, 3);
    let versions = engine.list_versions("alice").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].id, keep);
}

#[tokio::test]
async fn copy_version_duplicates_content_under_new_identity() {
    let (engine, db) = engine_with_db().await;
    let source = engine
        .import_snapshot(sample_snapshot(), None, "alice")
        .await
        .unwrap()
        .version_id;

    let summary = engine.copy_version(source, "Draft", "alice").await.unwrap();
    assert_ne!(summary.version_id, source);
    assert_eq!(
        summary.imported,
        ImportCounts {
            accounts: 2,
            income: 1,
            expenses: 2,
            tags: 2,
            settings: 1,
            expense_tags: 3,
        }
    );

    let versions = engine.list_versions("alice").await.unwrap();
    let names: Vec<_> = versions.iter().map(|version| version.name.as_str()).collect();
    assert_eq!(names, ["Draft", "Main"]);
    let draft = versions.iter().find(|version| version.name == "Draft").unwrap();
    assert_eq!(draft.description.as_deref(), Some("household budget"));

    // The copy carries fresh identities, not the source's keys.
    let original = engine.export_snapshot(source, "alice").await.unwrap();
    let copy = engine
        .export_snapshot(summary.version_id, "alice")
        .await
        .unwrap();
    let expense_ids = |snapshot: &Snapshot| -> HashSet<String> {
        snapshot
            .expenses
            .iter()
            .map(|expense| expense.id.to_string())
            .collect()
    };
    assert!(expense_ids(&original).is_disjoint(&expense_ids(&copy)));
    assert_eq!(count_links(&db, summary.version_id).await, 3);
}
