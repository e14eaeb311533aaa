use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use thoughts::config::Config;
use thoughts::mail::SmtpMailer;
use thoughts::media::FsMediaStore;
use thoughts::{AppState, build_app, cli, db, logging};

#[derive(Parser)]
#[command(name = "thoughts", version, about = "Engineered Thoughts blog server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a user that can obtain API tokens
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Import posts from a JSON file
    Import {
        #[arg(long)]
        file: String,
        #[arg(long)]
        author: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, pool).await,
        Command::CreateUser {
            username,
            password,
            email,
        } => {
            let user = cli::create_user(&pool, &username, &password, email.as_deref()).await?;
            println!("Created user:");
            println!("  ID: {}", user.id);
            println!("  Username: {}", user.username);
            Ok(())
        }
        Command::Import { file, author } => {
            let count = cli::import_posts(&pool, &file, &author).await?;
            println!("Imported {count} posts");
            Ok(())
        }
    }
}

async fn serve(config: Config, pool: sqlx::SqlitePool) -> anyhow::Result<()> {
    let mailer = SmtpMailer::from_config(&config.smtp).context("invalid SMTP configuration")?;
    let media = FsMediaStore::new(config.media_root.clone());
    let addr = config.bind_addr();

    let state = AppState::new(pool, config, Arc::new(mailer), Arc::new(media));
    let app = build_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
