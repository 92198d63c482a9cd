//! Kanban API server binary.
//!
//! This binary creates the concrete database implementation and passes it
//! to the API server. The API layer remains agnostic of the storage backend.
//! The `user` subcommands provision accounts and tokens against the same
//! database file.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kanban::api::{self, ApiError, Config};
use kanban::db::{Database, DbError, NewUser, SqliteDatabase, UserRepository};
use kanban::paths::get_db_path;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
enum BinaryError {
    #[error("Database error: {0}")]
    #[diagnostic(code(kanban::binary::database))]
    Database(#[from] DbError),

    #[error("Failed to create data directory: {0}")]
    #[diagnostic(code(kanban::binary::io))]
    Io(#[from] std::io::Error),

    #[error("API server error: {0}")]
    #[diagnostic(code(kanban::binary::api))]
    Api(#[from] ApiError),

    #[error("No user with email '{0}'")]
    #[diagnostic(
        code(kanban::binary::unknown_user),
        help("Create it first with `kanban-api user add --email <EMAIL>`")
    )]
    UnknownUser(String),
}

#[derive(Parser)]
#[command(name = "kanban-api")]
#[command(author, version, about = "Kanban board API server", long_about = None)]
struct Cli {
    /// Database file path (defaults to XDG data directory: ~/.local/share/kanban/kanban.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct ServeArgs {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Media directory for uploads (overrides KANBAN_MEDIA_DIR)
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// Maximum upload size in megabytes
    #[arg(long)]
    max_upload_mb: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Manage accounts
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create an account and print a fresh API token
    Add {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Issue a new API token for an existing account
    Token {
        #[arg(long)]
        email: String,
    },
}

async fn open_db(path: Option<PathBuf>) -> Result<SqliteDatabase, BinaryError> {
    let db_path = path.unwrap_or_else(get_db_path);

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Opening database at {:?}", db_path);
    let db = SqliteDatabase::open(&db_path).await?;
    db.migrate().await?;

    Ok(db)
}

async fn run_user(db: SqliteDatabase, command: UserCommand) -> Result<(), BinaryError> {
    let users = db.users();
    let user = match command {
        UserCommand::Add {
            email,
            first_name,
            last_name,
        } => {
            users
                .create(&NewUser {
                    email,
                    first_name,
                    last_name,
                })
                .await?
        }
        UserCommand::Token { email } => {
            let found = users.find_by_email(&email).await?;
            found.ok_or(BinaryError::UnknownUser(email))?
        }
    };

    let token = users.issue_token(user.id).await?;
    println!("{}", token);
    Ok(())
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let db = open_db(cli.db).await?;

    match cli.command {
        Some(Command::User(command)) => run_user(db, command).await?,
        Some(Command::Serve) | None => {
            let mut config = Config::new()
                .with_host(cli.serve.host)
                .with_port(cli.serve.port);
            if let Some(media_dir) = cli.serve.media_dir {
                config = config.with_media_dir(media_dir);
            }
            if let Some(mb) = cli.serve.max_upload_mb {
                config = config.with_max_upload_mb(mb);
            }

            api::run(config, db).await.map_err(BinaryError::from)?;
        }
    }

    Ok(())
}
