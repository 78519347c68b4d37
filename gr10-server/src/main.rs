mod handlers;
mod state;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gr10_core::{config_path, AppConfig, SmtpMailer, StaticCredentials};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_file = config_path()?;
    AppConfig::create_default(&config_file)?;
    let config = AppConfig::load(&config_file)?;

    let verifier = Box::new(StaticCredentials::new(config.users.clone()));
    let mailer = Box::new(SmtpMailer::from_config(&config.smtp));
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, verifier, mailer);

    let app = Router::new()
        .route("/", get(handlers::index))
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login_submit),
        )
        .route("/logout", get(handlers::logout))
        .route("/pesquisar", post(handlers::pesquisar))
        .route("/formulario", get(handlers::formulario))
        .route("/salvar_json", post(handlers::salvar_json))
        .route("/visualizar_pdf", get(handlers::visualizar_pdf))
        .route("/relatorios", get(handlers::relatorios))
        .route("/relatorios/pdf", post(handlers::relatorios_pdf))
        .route("/enviar_email", post(handlers::enviar_email))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("Plataforma GR10 listening on {bind_addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
