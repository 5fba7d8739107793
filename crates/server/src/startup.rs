use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::{AppConfig, StoreBackend, StoreConfig};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, PromoState, TodoState};
use service::{
    promo::{PromoService, ThreadRandom},
    storage::{FileStoreProvider, KvStore, KvStoreProvider, MemoryStoreProvider},
    todo::TodoService,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load config from `config.toml` (or `CONFIG_PATH`), falling back to env vars.
pub fn load_config() -> Result<AppConfig, StartupError> {
    AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

/// Open the configured namespace. The file backend creates its data directory first.
pub async fn open_store(cfg: &StoreConfig) -> Result<Arc<dyn KvStore>, StartupError> {
    let provider: Box<dyn KvStoreProvider> = match cfg.backend {
        StoreBackend::File => {
            common::env::ensure_env(&cfg.data_dir).await?;
            Box::new(FileStoreProvider::new(&cfg.data_dir))
        }
        StoreBackend::Memory => Box::new(MemoryStoreProvider::new()),
    };
    let store = provider.open(&cfg.namespace).await?;
    info!(backend = ?cfg.backend, namespace = %cfg.namespace, "kv store opened");
    Ok(store)
}

fn bind_addr(host: &str, port: u16) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("{host}:{port}: {e}")))
}

async fn serve(name: &'static str, app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!(service = name, %addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Router for the todo service over an already opened store.
pub fn todo_app(store: Arc<dyn KvStore>) -> Router {
    let state = TodoState { todos: TodoService::new(store) };
    routes::build_todo_router(state, build_cors())
}

/// Router for the promo service over an already opened store, using process randomness.
pub fn promo_app(store: Arc<dyn KvStore>, seed_count: usize) -> Router {
    let state = PromoState {
        promos: PromoService::new(store),
        rng: Arc::new(ThreadRandom),
        seed_count,
    };
    routes::build_promo_router(state, build_cors())
}

/// Public entry: build the todo app and run the HTTP server
pub async fn run_todo() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = load_config()?;
    let store = open_store(&cfg.store).await?;
    let addr = bind_addr(&cfg.server.host, cfg.todo.port)?;
    serve("todo", todo_app(store), addr).await
}

/// Public entry: build the promo app and run the HTTP server
pub async fn run_promo() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = load_config()?;
    let store = open_store(&cfg.store).await?;
    let addr = bind_addr(&cfg.server.host, cfg.promo.port)?;
    serve("promo", promo_app(store, cfg.promo.seed_count), addr).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_garbage_host() {
        assert!(bind_addr("127.0.0.1", 8081).is_ok());
        assert!(matches!(bind_addr("not a host", 8081), Err(StartupError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn memory_backend_opens_without_touching_disk() -> anyhow::Result<()> {
        let cfg = StoreConfig {
            backend: StoreBackend::Memory,
            data_dir: String::new(),
            namespace: "default".into(),
        };
        let store = open_store(&cfg).await?;
        assert!(!store.exists("all_todos").await?);
        Ok(())
    }
}
