use std::{error::Error, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use engine::{Engine, Snapshot};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub active_version_id: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Debug, Parser)]
#[command(
    name = "peculium_admin",
    about = "Admin utilities for Peculium (users, versions, snapshot transfer)"
)]
struct Cli {
    /// Database connection string.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./peculium.db?mode=rwc")]
    database_url: String,

    /// Log level for the CLI and the engine.
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage users.
    User(User),
    /// Manage budget versions.
    Version(Version),
    /// Export one version as a JSON snapshot.
    Export(ExportArgs),
    /// Import a JSON snapshot into a new or existing version.
    Import(ImportArgs),
    /// Scan expense/tag links for orphans, optionally removing them.
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// Create a new user.
    Create(UserCreateArgs),
}

#[derive(Debug, Args)]
struct UserCreateArgs {
    /// Name of the user to create.
    #[arg(long)]
    username: String,
}

#[derive(Debug, Args)]
struct Version {
    #[command(subcommand)]
    command: VersionCommand,
}

#[derive(Debug, Subcommand)]
enum VersionCommand {
    /// Create an empty version.
    New(VersionNewArgs),
    /// Duplicate a version under a new name.
    Copy(VersionCopyArgs),
    /// Mark a version as the owner's active one.
    Activate(VersionRefArgs),
    /// Delete a version and everything it contains.
    Delete(VersionRefArgs),
    /// List a user's versions.
    List(VersionListArgs),
}

#[derive(Debug, Args)]
struct VersionNewArgs {
    /// User the version belongs to.
    #[arg(long)]
    owner: String,
    /// Name of the new version.
    #[arg(long)]
    name: String,
    /// Optional description.
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct VersionCopyArgs {
    /// User the versions belong to.
    #[arg(long)]
    owner: String,
    /// Version to copy from.
    #[arg(long)]
    source: Uuid,
    /// Name of the copy.
    #[arg(long)]
    name: String,
}

#[derive(Debug, Args)]
struct VersionRefArgs {
    /// User the version belongs to.
    #[arg(long)]
    owner: String,
    /// Version to operate on.
    #[arg(long)]
    version: Uuid,
}

#[derive(Debug, Args)]
struct VersionListArgs {
    /// User whose versions to list.
    #[arg(long)]
    owner: String,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// User the version belongs to.
    #[arg(long)]
    owner: String,
    /// Version to export.
    #[arg(long)]
    version: Uuid,
    /// File to write the snapshot to; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// User receiving the snapshot.
    #[arg(long)]
    owner: String,
    /// JSON snapshot file to read.
    #[arg(long)]
    file: PathBuf,
    /// Existing version to import into; a fresh one when omitted.
    #[arg(long)]
    into: Option<Uuid>,
}

#[derive(Debug, Args)]
struct VerifyArgs {
    /// Scope the scan to one user; requires --version.
    #[arg(long, requires = "version")]
    owner: Option<String>,
    /// Scope the scan to one version; requires --owner.
    #[arg(long, requires = "owner")]
    version: Option<Uuid>,
    /// Delete the orphaned links instead of only reporting them.
    #[arg(long)]
    repair: bool,
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "peculium_admin={level},engine={level}",
            level = cli.log_level
        ))
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db.clone()).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("user already exists: {}", args.username);
                std::process::exit(1);
            }

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                active_version_id: Set(None),
            };
            users::Entity::insert(user).exec(&db).await?;

            println!("created user: {}", args.username);
        }
        Command::Version(Version { command }) => match command {
            VersionCommand::New(args) => {
                let version_id = engine
                    .new_version(&args.name, args.description.as_deref(), &args.owner)
                    .await?;
                println!("created version: {} ({version_id})", args.name);
            }
            VersionCommand::Copy(args) => {
                let summary = engine
                    .copy_version(args.source, &args.name, &args.owner)
                    .await?;
                println!(
                    "copied version {} into {} ({})",
                    args.source,
                    summary.version_id,
                    serde_json::to_string(&summary.imported)?
                );
            }
            VersionCommand::Activate(args) => {
                engine.activate_version(args.version, &args.owner).await?;
                println!("activated version: {}", args.version);
            }
            VersionCommand::Delete(args) => {
                engine.delete_version(args.version, &args.owner).await?;
                println!("deleted version: {}", args.version);
            }
            VersionCommand::List(args) => {
                for version in engine.list_versions(&args.owner).await? {
                    let marker = if version.active { "*" } else { " " };
                    match &version.description {
                        Some(description) => {
                            println!("{marker} {} {} ({description})", version.id, version.name);
                        }
                        None => println!("{marker} {} {}", version.id, version.name),
                    }
                }
            }
        },
        Command::Export(args) => {
            let snapshot = engine.export_snapshot(args.version, &args.owner).await?;
            let payload = serde_json::to_string_pretty(&snapshot)?;
            match args.out {
                Some(path) => {
                    std::fs::write(&path, payload)?;
                    println!("exported version {} to {}", args.version, path.display());
                }
                None => println!("{payload}"),
            }
        }
        Command::Import(args) => {
            let raw = std::fs::read_to_string(&args.file)?;
            let snapshot: Snapshot = serde_json::from_str(&raw)?;
            let summary = engine.import_snapshot(snapshot, args.into, &args.owner).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Verify(args) => {
            let orphans = match (args.owner, args.version) {
                (Some(owner), Some(version)) => {
                    engine.verify_tag_links(version, &owner, args.repair).await?
                }
                _ => engine.verify_all_tag_links(args.repair).await?,
            };

            if orphans.is_empty() {
                println!("no orphaned expense/tag links");
            } else {
                println!("{}", serde_json::to_string_pretty(&orphans)?);
                if args.repair {
                    println!("removed {} orphaned links", orphans.len());
                }
            }
        }
    }

    Ok(())
}
