//! `edgehost dev`
//!
//! Serves one function straight from its source directory. Every request
//! goes to that function regardless of `Host`; the public directory is
//! watched and rescanned after changes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::assets::AssetSet;
use crate::cli::FunctionArgs;
use crate::config::{AppState, AssetsConfig, Config, Routing, Site};
use crate::error::Result;
use crate::function::{self, ResolveOptions};
use crate::logger;
use crate::server::{self, SignalHandler};
use crate::watch;

use super::load_env;

pub async fn run(mut config: Config, args: FunctionArgs, hostname: String, port: u16) -> Result<()> {
    let opts = ResolveOptions {
        name: None,
        index: args.index.clone(),
        public: args.public.clone(),
    };
    let (root, function_config) = function::resolve(&args.path, &opts)?;
    let env = load_env(args.env.as_deref())?;
    let public = function_config.public_dir(&root);

    config.server.host = hostname;
    config.server.port = port;
    let addr = config.get_socket_addr()?;

    let name = function_config.name.clone();
    let state = Arc::new(AppState::new(config, Routing::Single(name.clone())));
    let site = scan(&name, public.clone(), env.clone(), &state.config.assets).await?;
    state.install(site).await;

    let listener = server::create_reusable_listener(addr)?;
    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    // Dropping the watcher stops it, so it lives until the server returns
    let _watcher = match public {
        Some(ref dir) => Some(watch::watch_dir(dir, Arc::clone(&signals.reload))?),
        None => None,
    };

    let reload_state = Arc::clone(&state);
    let reloader = tokio::spawn(watch::debounced(Arc::clone(&signals.reload), move || {
        rescan(
            Arc::clone(&reload_state),
            name.clone(),
            public.clone(),
            env.clone(),
        )
    }));

    tracing::info!(root = %root.display(), entry = %function_config.index.display(), "Serving from source");
    logger::log_server_start(&addr, &state.config, &state.site_names().await);
    server::run(listener, state, signals).await;

    reloader.abort();
    Ok(())
}

/// Build the site from the public directory, if there is one
async fn scan(
    name: &str,
    public: Option<PathBuf>,
    env: BTreeMap<String, String>,
    options: &AssetsConfig,
) -> Result<Site> {
    let assets = match public {
        Some(dir) => {
            let options = options.clone();
            tokio::task::spawn_blocking(move || AssetSet::load(&dir, &options)).await??
        }
        None => AssetSet::new(),
    };
    logger::log_assets_loaded(name, assets.len(), assets.total_bytes());

    Ok(Site {
        name: name.to_string(),
        deployment_id: None,
        assets,
        env,
    })
}

/// Rescan after a change; on failure the previous assets stay live
async fn rescan(
    state: Arc<AppState>,
    name: String,
    public: Option<PathBuf>,
    env: BTreeMap<String, String>,
) {
    match scan(&name, public, env, &state.config.assets).await {
        Ok(site) => state.install(site).await,
        Err(e) => logger::log_error(&format!("Failed to reload assets of {name}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    async fn rescan_dir(state: Arc<AppState>, name: &str, dir: &Path) {
        rescan(state, name.to_string(), Some(dir.to_path_buf()), BTreeMap::new()).await;
    }

    fn state() -> Arc<AppState> {
        let config = Config::load_from("/nonexistent/edgehost-test-config").unwrap();
        Arc::new(AppState::new(config, Routing::Single("hello".to_string())))
    }

    #[tokio::test]
    async fn test_scan_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("favicon.ico"), b"ico").unwrap();
        fs::write(dir.path().join("images/image.png"), b"png").unwrap();

        let site = scan(
            "hello",
            Some(dir.path().to_path_buf()),
            BTreeMap::new(),
            &AssetsConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(site.assets.len(), 2);
        assert!(site.assets.find("/images/image.png").is_some());
        assert!(site.deployment_id.is_none());
    }

    #[tokio::test]
    async fn test_scan_without_public() {
        let site = scan("hello", None, BTreeMap::new(), &AssetsConfig::default())
            .await
            .unwrap();
        assert!(site.assets.is_empty());
    }

    #[tokio::test]
    async fn test_rescan_picks_up_new_files_and_keeps_old_on_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let state = state();

        rescan_dir(Arc::clone(&state), "hello", dir.path()).await;
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        rescan_dir(Arc::clone(&state), "hello", dir.path()).await;
        let site = state.resolve_site(None).await.unwrap();
        assert_eq!(site.assets.len(), 2);

        rescan_dir(Arc::clone(&state), "hello", &dir.path().join("gone")).await;
        let site = state.resolve_site(None).await.unwrap();
        assert_eq!(site.assets.len(), 2);
    }
}
