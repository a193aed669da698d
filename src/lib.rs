pub mod api;
pub mod config;
pub mod diagnosis;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{start_api_server, ApiContext, ServerError};
use crate::config::{ConfigError, ServiceConfig};
use crate::diagnosis::{
    DiagnosisError, Diagnoser, FallbackDiagnoser, KnowledgeBase, KnowledgeError, Lexicon,
    RemoteDiagnoser, RuleBasedDiagnoser, UrgencyPolicy,
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),
    #[error("Remote diagnoser setup failed: {0}")]
    Remote(#[from] DiagnosisError),
    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),
    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Assemble the diagnoser described by `config`: the rule engine alone, or a
/// remote classifier that falls back to the rule engine.
///
/// Builds a blocking HTTP client when remote is configured, so this must run
/// outside the async runtime.
pub fn build_diagnoser(
    config: &ServiceConfig,
    knowledge: Arc<KnowledgeBase>,
    lexicon: Lexicon,
) -> Result<Arc<dyn Diagnoser>, StartupError> {
    let rule_based = RuleBasedDiagnoser::new(
        knowledge,
        lexicon,
        config.scoring.clone(),
        UrgencyPolicy::default(),
    )?;

    let diagnoser: Arc<dyn Diagnoser> = match &config.remote_url {
        Some(url) => {
            let remote = RemoteDiagnoser::new(url, config.remote_timeout_secs)?;
            tracing::info!(url = remote.base_url(), "Remote classifier enabled, rule engine as fallback");
            Arc::new(FallbackDiagnoser::new(Box::new(remote), Box::new(rule_based)))
        }
        None => Arc::new(rule_based),
    };
    Ok(diagnoser)
}

/// Process entry point: configure, fail fast on bad static data, then serve
/// until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env()?;

    let knowledge = Arc::new(match &config.knowledge_path {
        Some(path) => KnowledgeBase::load(path)?,
        None => KnowledgeBase::builtin()?,
    });
    let lexicon = config.lexicon.load();
    let lexicon_available = lexicon.is_available();

    let diagnoser = build_diagnoser(&config, knowledge.clone(), lexicon)?;
    let ctx = ApiContext::new(diagnoser.clone(), knowledge, lexicon_available);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(async move {
        let mut server = start_api_server(ctx, config.socket_addr()).await?;

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C, shutting down: {e}");
        }
        server.shutdown();
        server.stopped().await;
        Ok::<(), StartupError>(())
    })?;

    drop(runtime);
    // Last reference: a blocking HTTP client must not be dropped on the runtime.
    drop(diagnoser);
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
