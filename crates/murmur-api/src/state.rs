//! Shared application state for the REST API.

use std::path::PathBuf;
use std::sync::Arc;

use murmur_core::chat::service::ChatService;
use murmur_core::image::dispatcher::{DispatcherConfig, ImageDispatcher};
use murmur_infra::config::{load_global_config, resolve_renderer_token};
use murmur_infra::llm::ollama::OllamaProvider;
use murmur_infra::renderer::HttpImageRenderer;
use murmur_infra::sqlite::chat::SqliteChatRepository;
use murmur_infra::sqlite::pool::DatabasePool;
use murmur_infra::storage::FsImageStore;
use murmur_types::config::GlobalConfig;

/// The fully wired chat service with concrete infra implementations.
pub type ConcreteChatService =
    ChatService<SqliteChatRepository, OllamaProvider, HttpImageRenderer, FsImageStore>;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub db_pool: DatabasePool,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl AppState {
    /// Initialize all services: config, database, provider, renderer, storage.
    pub async fn init(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;

        let db_pool = DatabasePool::open(&data_dir.join("murmur.db")).await?;

        let repository = SqliteChatRepository::new(db_pool.clone());
        let provider = OllamaProvider::new(&config.provider.base_url)?;

        let auth_token = resolve_renderer_token(&config.renderer);
        let renderer = HttpImageRenderer::new(&config.renderer.base_url, auth_token)?;

        let images_dir = data_dir.join("images");
        let store = FsImageStore::new(&images_dir)?;

        let dispatcher = ImageDispatcher::new(
            renderer,
            store,
            DispatcherConfig {
                enabled: config.renderer.enabled,
                model: config.renderer.model.clone(),
                negative_prompt: config.renderer.negative_prompt.clone(),
            },
        );

        // Startup probe; the dispatcher rechecks lazily later if this fails.
        if config.renderer.enabled {
            let available = dispatcher.check_availability().await;
            tracing::info!(available, "image renderer startup probe");
        }

        let chat_service = Arc::new(ChatService::new(
            repository,
            provider,
            dispatcher,
            config.provider.clone(),
        ));

        Ok(Self {
            chat_service,
            db_pool,
            config,
            data_dir,
            images_dir,
        })
    }
}
