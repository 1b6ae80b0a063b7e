mod config;
mod errors;
mod logging;
mod server;
mod store;

use crate::config::Config;
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("cubby.toml");
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--config requires a path");
                    std::process::exit(2);
                }
                config_path = PathBuf::from(&args[i]);
            }
            _ => {}
        }
        i += 1;
    }

    let cfg = Config::load(&config_path).context("loading config")?;
    cfg.validate().context("validating config")?;

    let root = config::canonical_root(&cfg.root.root_dir).context("preparing root directory")?;
    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);

    info!(addr = %addr, root = %root.display(), "cubby ready");
    println!("cubby ready addr={} root={}", addr, root.display());

    server::serve(cfg, root).await
}
