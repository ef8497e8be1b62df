// src/main.rs

use anyhow::Context;
use rundag::{cli, config, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("rundag error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    let cfg = config::load_and_validate(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let log_file = args.log_file.as_deref().or(cfg.log_file());
    logging::init_logging(args.log_level, log_file)?;

    run(&args, &cfg).await
}
