use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use shopsync::config::Config;
use shopsync::db::{AppState, DbPool, LicensePolicy, create_pool, init_db, queries};
use shopsync::handlers;
use shopsync::jwt::SessionSigner;
use shopsync::sweep;

#[derive(Parser)]
#[command(name = "shopsync", version, about = "ShopSync licence and subscription server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopsync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = create_pool(&config.database_path, 10)
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;
    {
        let conn = pool.get()?;
        init_db(&conn).context("Failed to initialize schema")?;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::CreateAdmin { email, password } => {
            let conn = pool.get()?;
            let admin = queries::create_admin(&conn, &email, &password, config.bcrypt_cost)?;
            tracing::info!("Created admin {} ({})", admin.email, admin.id);
            Ok(())
        }
        Command::Serve => serve(config, pool).await,
    }
}

fn bootstrap_admin(config: &Config, pool: &DbPool) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (
        &config.bootstrap_admin_email,
        &config.bootstrap_admin_password,
    ) else {
        return Ok(());
    };

    let conn = pool.get()?;
    if queries::count_admins(&conn)? > 0 {
        return Ok(());
    }

    let admin = queries::create_admin(&conn, email, password, config.bcrypt_cost)?;
    tracing::info!("Bootstrapped admin {}", admin.email);
    Ok(())
}

async fn serve(config: Config, pool: DbPool) -> anyhow::Result<()> {
    bootstrap_admin(&config, &pool)?;

    let sessions = match (&config.jwt_secret, config.dev_mode) {
        (Some(secret), _) => SessionSigner::new(secret.as_bytes(), config.session_ttl_hours),
        (None, true) => {
            tracing::warn!("JWT_SECRET not set, using an ephemeral secret (dev mode)");
            SessionSigner::ephemeral(config.session_ttl_hours)
        }
        (None, false) => bail!("JWT_SECRET must be set outside dev mode"),
    };

    let state = AppState {
        db: pool.clone(),
        sessions: Arc::new(sessions),
        policy: LicensePolicy {
            license_period_days: config.license_period_days,
            max_devices_per_shop: config.max_devices_per_shop,
        },
    };

    tokio::spawn(sweep::run(pool, config.expiry_sweep_secs));

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(100)
            .finish()
            .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    let cors = match &config.cors_origin {
        Some(origin) => CorsLayer::new().allow_origin(AllowOrigin::exact(
            HeaderValue::from_str(origin).context("Invalid CORS_ORIGIN")?,
        )),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    let app = handlers::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(GovernorLayer::new(governor_conf))
            .layer(cors),
    );

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        "ShopSync v{} listening on {}{}",
        env!("CARGO_PKG_VERSION"),
        addr,
        if config.dev_mode { " (dev mode)" } else { "" }
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
