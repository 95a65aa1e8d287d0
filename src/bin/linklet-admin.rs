use anyhow::Result;
use clap::{Parser, Subcommand};
use linklet::config::{Config, DatabaseBackend};
use linklet::storage::{LinkStore, PostgresLinkStore, SqliteLinkStore, StoreError};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "linklet-admin")]
#[command(about = "Linklet operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all links owned by a user
    List {
        /// Owner id (subject claim, or anonymous-<timestamp>)
        user_id: String,
    },
    /// Look up a single short code
    Lookup {
        /// Short code to resolve
        code: String,
    },
    /// Delete a link on behalf of its owner
    Delete {
        /// Link id
        id: i64,
        /// Owner id; the delete is refused for anyone else
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let store: Arc<dyn LinkStore> = match config.database.backend {
        DatabaseBackend::Sqlite => Arc::new(
            SqliteLinkStore::new(&config.database.url, config.database.max_connections).await?,
        ),
        DatabaseBackend::Postgres => Arc::new(
            PostgresLinkStore::new(&config.database.url, config.database.max_connections).await?,
        ),
    };

    // Ensure database is initialized
    store.init().await?;

    match cli.command {
        Commands::List { user_id } => {
            let links = store.list_by_user(&user_id).await?;
            if links.is_empty() {
                println!("No links owned by '{}'.", user_id);
            } else {
                println!("{:<8} {:<20} {:<8} {}", "ID", "Code", "Clicks", "Destination");
                println!("{}", "-".repeat(80));
                for link in links {
                    println!(
                        "{:<8} {:<20} {:<8} {}",
                        link.id, link.short_code, link.clicks, link.original_url
                    );
                }
            }
        }
        Commands::Lookup { code } => match store.get_by_code(&code).await? {
            Some(link) => {
                println!("id:              {}", link.id);
                println!("short code:      {}", link.short_code);
                println!("destination:     {}", link.original_url);
                println!("owner:           {}", link.user_id);
                println!("created at:      {}", link.created_at);
                println!("clicks:          {}", link.clicks);
                match link.last_clicked_at {
                    Some(ts) => println!("last clicked at: {}", ts),
                    None => println!("last clicked at: never"),
                }
            }
            None => println!("No link found for '{}'.", code),
        },
        Commands::Delete { id, user_id } => match store.delete(id, &user_id).await {
            Ok(removed) => println!("✓ Deleted '{}' (id {})", removed.short_code, id),
            Err(StoreError::NotFound) => println!("⚠ No link with id {}", id),
            Err(StoreError::NotOwner) => {
                println!("⚠ Link {} is not owned by '{}'; refusing to delete", id, user_id)
            }
            Err(err) => return Err(err.into()),
        },
    }

    Ok(())
}
