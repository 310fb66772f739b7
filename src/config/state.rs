// Application state module
// Holds the served functions and the values read on every request

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::types::Config;
use crate::assets::AssetSet;
use crate::function::{FunctionBackend, NotFoundBackend};
use crate::http::cache::CachePolicy;

/// One servable function
#[derive(Debug, Clone)]
pub struct Site {
    pub name: String,
    /// `None` when serving straight from source (`dev`)
    pub deployment_id: Option<String>,
    pub assets: AssetSet,
    pub env: BTreeMap<String, String>,
}

/// How a request picks its function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing {
    /// Every request goes to this function
    Single(String),
    /// First label of the Host header names the function
    ByHost,
}

/// Application state
pub struct AppState {
    pub config: Config,
    pub routing: Routing,
    pub sites: RwLock<HashMap<String, Arc<Site>>>,
    pub backend: Arc<dyn FunctionBackend>,
    /// Rendered once; assets of every function share it
    pub cache_control: String,
}

impl AppState {
    pub fn new(config: Config, routing: Routing) -> Self {
        let cache_control = CachePolicy::for_max_age(config.assets.cache_max_age).to_header_value();
        Self {
            config,
            routing,
            sites: RwLock::new(HashMap::new()),
            backend: Arc::new(NotFoundBackend),
            cache_control,
        }
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn FunctionBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Add or replace a site
    pub async fn install(&self, site: Site) {
        let mut sites = self.sites.write().await;
        sites.insert(site.name.clone(), Arc::new(site));
    }

    pub async fn remove(&self, name: &str) -> bool {
        self.sites.write().await.remove(name).is_some()
    }

    pub async fn site_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sites.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Loaded deployment id per function
    pub async fn deployment_ids(&self) -> HashMap<String, Option<String>> {
        self.sites
            .read()
            .await
            .iter()
            .map(|(name, site)| (name.clone(), site.deployment_id.clone()))
            .collect()
    }

    /// Pick the site for a request with the given Host header
    pub async fn resolve_site(&self, host: Option<&str>) -> Option<Arc<Site>> {
        let sites = self.sites.read().await;
        match &self.routing {
            Routing::Single(name) => sites.get(name).cloned(),
            Routing::ByHost => host
                .and_then(host_label)
                .and_then(|label| sites.get(&label))
                .or_else(|| {
                    self.config
                        .server
                        .default_function
                        .as_ref()
                        .and_then(|name| sites.get(name))
                })
                .cloned(),
        }
    }
}

/// First DNS label of a Host header value, port stripped and lowercased
///
/// `Hello.localhost:8080` -> `hello`. IP literals yield `None`.
pub fn host_label(host: &str) -> Option<String> {
    if host.starts_with('[') {
        return None;
    }
    let host = host.split(':').next().unwrap_or(host);
    if host.parse::<std::net::Ipv4Addr>().is_ok() {
        return None;
    }
    host.split('.')
        .next()
        .filter(|label| !label.is_empty())
        .map(str::to_ascii_lowercase)
}
