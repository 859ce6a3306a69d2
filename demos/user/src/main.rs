use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use strata::{EventStore, KeyRepository, Root};
use strata_inmemory::{InMemoryEventStore, InMemoryKeyStore};
use strata_user::User;
use tracing::{error, info};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Registers a user, renames them, and optionally crypto-shreds their data
#[derive(Parser, Debug)]
#[command(name = "strata-user", version, about, long_about = None)]
struct Cli {
    /// User id, generated when omitted
    #[clap(long, env = "STRATA_USER_ID")]
    id: Option<String>,
    /// First name
    #[clap(long, env = "STRATA_USER_FIRST_NAME", default_value = "Ada")]
    first_name: String,
    /// Last name
    #[clap(long, env = "STRATA_USER_LAST_NAME", default_value = "Lovelace")]
    last_name: String,
    /// Last name after the rename
    #[clap(long, env = "STRATA_USER_NEW_LAST_NAME", default_value = "King")]
    new_last_name: String,
    /// Birth date as YYYY-MM-DD
    #[clap(long, env = "STRATA_USER_BIRTH_DATE", default_value = "1815-12-10")]
    birth_date: NaiveDate,
    /// Delete the user's key before the final reload
    #[clap(long, env = "STRATA_USER_SHRED")]
    shred: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("strata=info,strata_user=info")),
        )
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        error!("{err}");
        err.chain()
            .skip(1)
            .for_each(|cause| eprintln!("because: {}", cause));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let id = cli
        .id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let keys = KeyRepository::new(InMemoryKeyStore::new());
    let store = InMemoryEventStore::new(
        strata_user::codec(keys.clone())?,
        strata_user::registry()?,
    );

    let mut user = Root::<User>::create(User::register(
        id.clone(),
        cli.first_name.clone(),
        cli.last_name,
        cli.birth_date,
    )?);
    store.save(&id, &mut user).await?;
    info!(%id, "registered user");

    let mut user = store.load::<User>(&id).await?;
    user.handle(|user| user.rename(cli.first_name, cli.new_last_name))?;
    store
        .save(&id, &mut user)
        .await
        .context("failed to rename user")?;

    let user = store.load::<User>(&id).await?;
    info!(version = user.version(), user = ?user.state(), "loaded user");

    if cli.shred {
        keys.delete(&id)?;
        let user = store.load::<User>(&id).await?;
        info!(version = user.version(), user = ?user.state(), "loaded shredded user");
    }

    store.print()?;

    Ok(())
}
