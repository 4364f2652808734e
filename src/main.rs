use clap::Parser;
use colored::Colorize;

use uxlog::cli::{Cli, Commands};
use uxlog::config::{StaticConfig, get_config, init_config_from};
use uxlog::errors::UxlogError;
use uxlog::runtime::modes::{run_drain_once, run_server};
use uxlog::system::init_logging;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig { output_path }) = &cli.command {
        return generate_config(output_path.clone());
    }

    init_config_from(&cli.config);
    let config = get_config();

    // guard 必须存活到进程结束，否则缓冲中的日志会丢失
    let _log_guard = init_logging(&config.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async move {
        match cli.command {
            Some(Commands::Drain) => run_drain_once().await.map(|_| ()),
            _ => run_server().await,
        }
    });

    if let Err(e) = &result {
        match e.downcast_ref::<UxlogError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("{} {:#}", "[ERROR]".red().bold(), e),
        }
    }
    result
}

fn generate_config(output_path: Option<String>) -> anyhow::Result<()> {
    let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());
    println!(
        "{} {}",
        "Generating configuration file...".yellow(),
        path.blue()
    );

    match StaticConfig::default().save_to_file(&path) {
        Ok(()) => {
            println!(
                "{} {}",
                "Configuration file generated successfully".green(),
                path.blue()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "  {} {}",
                "Failed to generate configuration file".red(),
                e.to_string().red()
            );
            Err(e)
        }
    }
}
