use bug_busters::{
    config::AppConfig,
    handler::http,
    persistence,
    question_bank::QuestionBank,
    server::{AppState, start_ws_server},
};
use log::*;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    info!("Starting Bug Busters quiz backend");

    let config = AppConfig::from_env()?;
    let bank = match &config.questions_file {
        Some(path) => QuestionBank::from_file(path)?,
        None => QuestionBank::embedded()?,
    };
    let store = persistence::store_from_config(&config).await;

    let ws_listener = TcpListener::bind(&config.ws_addr).await?;
    let http_listener = TcpListener::bind(&config.http_addr).await?;
    info!("HTTP listening on: {}", config.http_addr);

    let app_state = Arc::new(AppState::new(config, Arc::new(bank), store));

    tokio::select! {
        _ = start_ws_server(ws_listener, app_state.clone()) => {},
        result = axum::serve(http_listener, http::router(app_state)) => {
            result?;
        },
    }

    Ok(())
}
