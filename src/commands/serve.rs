//! `edgehost serve`
//!
//! Serves the current deployment of every function in the store, routed
//! by the first label of `Host`. The store directory is watched; after a
//! deploy, only functions whose `current` id changed are reloaded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{AppState, Config, Routing, Site};
use crate::error::{IoResultExt, Result};
use crate::logger;
use crate::server::{self, SignalHandler};
use crate::store;
use crate::watch;

pub async fn run(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
    store_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let addr = config.get_socket_addr()?;

    let store_dir = store_dir.unwrap_or_else(|| config.store.dir.clone());
    // The watcher needs the directory to exist before the first deploy
    std::fs::create_dir_all(&store_dir).with_path(&store_dir)?;

    let state = Arc::new(AppState::new(config, Routing::ByHost));
    sync(&state, &store_dir).await?;
    let functions = state.site_names().await;
    if functions.is_empty() {
        logger::log_warning(&format!(
            "No deployed functions in {}, waiting for deploys",
            store_dir.display()
        ));
    }

    let listener = server::create_reusable_listener(addr)?;
    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;
    let _watcher = watch::watch_dir(&store_dir, Arc::clone(&signals.reload))?;

    let reload_state = Arc::clone(&state);
    let reloader = tokio::spawn(watch::debounced(Arc::clone(&signals.reload), move || {
        let state = Arc::clone(&reload_state);
        let store_dir = store_dir.clone();
        async move {
            if let Err(e) = sync(&state, &store_dir).await {
                logger::log_error(&format!("Failed to read deployment store: {e}"));
            }
        }
    }));

    logger::log_server_start(&addr, &state.config, &functions);
    server::run(listener, state, signals).await;

    reloader.abort();
    Ok(())
}

/// Bring the loaded functions in line with the store
///
/// Returns how many functions were loaded, replaced or dropped. A
/// function that fails to load keeps serving its previous deployment.
async fn sync(state: &AppState, store_dir: &Path) -> Result<usize> {
    let dir = store_dir.to_path_buf();
    let current = tokio::task::spawn_blocking(move || store::current_ids(&dir)).await??;
    let loaded = state.deployment_ids().await;
    let mut changed = 0;

    for (name, id) in &current {
        if loaded.get(name).and_then(Option::as_deref) == Some(id.as_str()) {
            continue;
        }

        let dir = store_dir.to_path_buf();
        let function = name.clone();
        match tokio::task::spawn_blocking(move || store::load(&dir, &function)).await? {
            Ok(deployment) => {
                logger::log_assets_loaded(
                    name,
                    deployment.assets.len(),
                    deployment.assets.total_bytes(),
                );
                tracing::info!(function = %name, id = %deployment.manifest.deployment_id, "Deployment live");
                state
                    .install(Site {
                        name: name.clone(),
                        deployment_id: Some(deployment.manifest.deployment_id),
                        assets: deployment.assets,
                        env: deployment.manifest.env,
                    })
                    .await;
                changed += 1;
            }
            Err(e) => logger::log_error(&format!("Failed to load {name}/{id}: {e}")),
        }
    }

    for name in loaded.keys().filter(|name| !current.contains_key(*name)) {
        if state.remove(name).await {
            tracing::info!(function = %name, "Function removed");
            changed += 1;
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetsConfig;
    use crate::function::FunctionConfig;
    use crate::store::DeployRequest;
    use std::collections::BTreeMap;
    use std::fs;

    fn deploy(root: &Path, store_dir: &Path, name: &str) -> String {
        let function = FunctionConfig {
            name: name.to_string(),
            index: PathBuf::from("index.ts"),
            public: Some(PathBuf::from("public")),
        };
        store::deploy(
            store_dir,
            &DeployRequest {
                root,
                function: &function,
                env: BTreeMap::new(),
                assets: &AssetsConfig::default(),
                keep: 5,
            },
        )
        .unwrap()
        .deployment_id
    }

    #[tokio::test]
    async fn test_sync_loads_reloads_and_drops() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("src");
        fs::create_dir_all(root.join("public")).unwrap();
        fs::write(root.join("index.ts"), "export function handler() {}").unwrap();
        fs::write(root.join("public/favicon.ico"), b"ico").unwrap();
        let store_dir = dir.path().join("store");

        let config = Config::load_from("/nonexistent/edgehost-test-config").unwrap();
        let state = AppState::new(config, Routing::ByHost);

        deploy(&root, &store_dir, "hello");
        deploy(&root, &store_dir, "other");
        assert_eq!(sync(&state, &store_dir).await.unwrap(), 2);
        assert_eq!(sync(&state, &store_dir).await.unwrap(), 0);

        fs::write(root.join("public/robots.txt"), b"User-agent: *").unwrap();
        let id = deploy(&root, &store_dir, "hello");
        assert_eq!(sync(&state, &store_dir).await.unwrap(), 1);
        let site = state.resolve_site(Some("hello.localhost")).await.unwrap();
        assert_eq!(site.deployment_id.as_deref(), Some(id.as_str()));
        assert!(site.assets.find("/robots.txt").is_some());

        fs::remove_dir_all(store_dir.join("other")).unwrap();
        assert_eq!(sync(&state, &store_dir).await.unwrap(), 1);
        assert_eq!(state.site_names().await, vec!["hello"]);
    }
}
