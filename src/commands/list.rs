//! `edgehost ls`

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::store::{self, FunctionSummary};

pub fn run(config: &Config, store_dir: Option<PathBuf>) -> Result<()> {
    let store_dir = store_dir.unwrap_or_else(|| config.store.dir.clone());
    let functions = store::list(&store_dir)?;

    if functions.is_empty() {
        println!("No functions deployed in {}", store_dir.display());
        return Ok(());
    }
    print!("{}", render(&functions));
    Ok(())
}

fn render(functions: &[FunctionSummary]) -> String {
    let width = functions
        .iter()
        .map(|f| f.name.len())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(4);

    let mut out = format!("{:<width$}  {:<21}  DEPLOYMENTS\n", "NAME", "CURRENT");
    for function in functions {
        let _ = writeln!(
            out,
            "{:<width$}  {:<21}  {}",
            function.name,
            function.current.as_deref().unwrap_or("-"),
            function.deployments
        );
    }
    out
}
