//! # Town Chronicle Binary
//!
//! The entry point that assembles the application based on compile-time
//! features and runtime settings.
//!
//! `town-chronicle` serves the API. One-shot commands:
//! - `issue-token <user-uuid>` prints a bearer token for that user.
//! - `export-town <town-id>` prints a town archive from the local store.
//! - `import-town <file>` restores an archive into the local store and
//!   recomputes the town.

mod config;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{bail, Context};
use tc_api::handlers::AppState;
use tc_api::{configure_routes, middleware};
use tc_core::traits::{AuthProvider, TownRepo};
use tc_core::{Chronicle, Lexicon};
use uuid::Uuid;

use crate::config::{Backend, Settings};

// Feature-gated imports
#[cfg(feature = "db-sqlite")]
use tc_db_sqlite::SqliteTownRepo;

#[cfg(feature = "storage-local")]
use tc_storage_local::{restore_town, LocalTownStore};

#[cfg(feature = "auth-simple")]
use tc_auth_simple::SimpleAuthProvider;

async fn build_repo(settings: &Settings) -> anyhow::Result<Arc<dyn TownRepo>> {
    match settings.backend {
        #[cfg(feature = "db-sqlite")]
        Backend::Sqlite => Ok(Arc::new(SqliteTownRepo::new(&settings.database_url).await?)),
        #[cfg(feature = "storage-local")]
        Backend::Local => Ok(Arc::new(LocalTownStore::open(settings.local_path.clone()).await?)),
        #[allow(unreachable_patterns)]
        other => bail!("backend {other:?} is not compiled into this build"),
    }
}

/// Treats every caller as a guest when no auth plugin is compiled in.
#[cfg(not(feature = "auth-simple"))]
struct GuestsOnly;

#[cfg(not(feature = "auth-simple"))]
impl AuthProvider for GuestsOnly {
    fn authenticate(&self, _token: &str) -> Option<Uuid> {
        None
    }
}

fn build_auth(settings: &Settings) -> Box<dyn AuthProvider> {
    #[cfg(feature = "auth-simple")]
    {
        Box::new(SimpleAuthProvider::new(&settings.auth_secret))
    }
    #[cfg(not(feature = "auth-simple"))]
    {
        let _ = settings;
        log::warn!("no auth plugin compiled in; all requests are guests");
        Box::new(GuestsOnly)
    }
}

#[cfg(feature = "auth-simple")]
fn issue_token(settings: &Settings, user: &str) -> anyhow::Result<()> {
    let user_id = Uuid::parse_str(user).with_context(|| format!("'{user}' is not a uuid"))?;
    println!("{}", SimpleAuthProvider::new(&settings.auth_secret).issue_token(user_id));
    Ok(())
}

#[cfg(not(feature = "auth-simple"))]
fn issue_token(_settings: &Settings, _user: &str) -> anyhow::Result<()> {
    bail!("issue-token needs the auth-simple feature")
}

#[cfg(feature = "storage-local")]
async fn export_town(settings: &Settings, town: &str) -> anyhow::Result<()> {
    let town_id = Uuid::parse_str(town).with_context(|| format!("'{town}' is not a uuid"))?;
    let store = LocalTownStore::open(settings.local_path.clone()).await?;
    match store.export_town(town_id).await? {
        Some(encoded) => println!("{encoded}"),
        None => bail!("no town {town_id} in {}", settings.local_path.display()),
    }
    Ok(())
}

#[cfg(feature = "storage-local")]
async fn import_town(settings: &Settings, file: &str) -> anyhow::Result<()> {
    let encoded = std::fs::read_to_string(file).with_context(|| format!("reading archive {file}"))?;
    let store = Arc::new(LocalTownStore::open(settings.local_path.clone()).await?);
    let town = restore_town(&store, &encoded).await?;
    log::info!("restored town {} ({} stories)", town.id, town.stats.total_stories);
    println!("{}", town.id);
    Ok(())
}

#[cfg(not(feature = "storage-local"))]
async fn export_town(_settings: &Settings, _town: &str) -> anyhow::Result<()> {
    bail!("export-town needs the storage-local feature")
}

#[cfg(not(feature = "storage-local"))]
async fn import_town(_settings: &Settings, _file: &str) -> anyhow::Result<()> {
    bail!("import-town needs the storage-local feature")
}

const USAGE: &str =
    "usage: town-chronicle [issue-token <user-uuid> | export-town <town-id> | import-town <file>]";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {}
        [cmd, arg] => {
            return match cmd.as_str() {
                "issue-token" => issue_token(&settings, arg),
                "export-town" => export_town(&settings, arg).await,
                "import-town" => import_town(&settings, arg).await,
                _ => bail!(USAGE),
            }
        }
        _ => bail!(USAGE),
    }

    // 1. Initialize the repository implementation
    let repo = build_repo(&settings).await?;

    // 2. Load keyword tables
    let mut chronicle = Chronicle::new(repo);
    if let Some(path) = &settings.lexicon_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading lexicon {}", path.display()))?;
        chronicle = chronicle.with_lexicon(Lexicon::from_json(&raw)?);
        log::info!("loaded lexicon from {}", path.display());
    }

    // 3. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState {
        chronicle,
        auth: build_auth(&settings),
    });

    log::info!("Town Chronicle starting on http://{} ({:?})", settings.bind, settings.profile);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::cors_policy())
            .wrap(middleware::standard_middleware())
            .configure(configure_routes)
    })
    .bind(settings.bind.as_str())?
    .run()
    .await?;

    Ok(())
}
