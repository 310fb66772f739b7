//! `edgehost deploy`

use std::path::PathBuf;

use crate::cli::FunctionArgs;
use crate::config::Config;
use crate::error::Result;
use crate::function::{self, ResolveOptions};
use crate::store::{self, DeployRequest, Manifest};

use super::{human_bytes, load_env};

/// Resolve the function, remember its settings and write a deployment
pub fn run(
    config: &Config,
    args: &FunctionArgs,
    name: Option<String>,
    store_dir: Option<PathBuf>,
) -> Result<Manifest> {
    let opts = ResolveOptions {
        name,
        index: args.index.clone(),
        public: args.public.clone(),
    };
    let (root, function_config) = function::resolve(&args.path, &opts)?;
    function::save(&root, &function_config)?;

    let env = load_env(args.env.as_deref())?;
    let store_dir = store_dir.unwrap_or_else(|| config.store.dir.clone());

    tracing::info!(
        function = %function_config.name,
        root = %root.display(),
        public = ?function_config.public,
        "Deploying"
    );

    let manifest = store::deploy(
        &store_dir,
        &DeployRequest {
            root: &root,
            function: &function_config,
            env,
            assets: &config.assets,
            keep: config.store.keep,
        },
    )?;

    print!("{}", summary(&manifest, config));
    Ok(manifest)
}

fn summary(manifest: &Manifest, config: &Config) -> String {
    format!(
        "Deployed {} ({})\n  entry:  {}\n  assets: {} file(s), {}, {} gzip-encoded\n  url:    http://{}.localhost:{}/\n",
        manifest.function,
        manifest.deployment_id,
        manifest.index,
        manifest.assets.len(),
        human_bytes(manifest.total_size()),
        manifest.gzip_count(),
        manifest.function,
        config.server.port,
    )
}
