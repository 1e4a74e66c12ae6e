use clap::Parser;

use visitlog::cli::{Cli, Commands};
use visitlog::config::{StaticConfig, get_config, init_config};
use visitlog::runtime::modes::run_server;
use visitlog::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig { output }) = &cli.command {
        match output {
            Some(path) => {
                StaticConfig::default()
                    .save_to_file(path)
                    .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;
                println!("Sample configuration written to {}", path);
            }
            None => print!("{}", StaticConfig::generate_sample_config()),
        }
        return Ok(());
    }

    init_config(cli.config.as_deref());
    let config = get_config();

    // 必须持有 guard 直到进程退出，否则日志可能丢失
    let _guard = init_logging(&config.logging)?;

    run_server(&config).await
}
