use clap::Parser;
use contract_etl::core::orchestrator::Admission;
use contract_etl::core::{ConfigProvider, Pipeline};
use contract_etl::utils::{logger, validation::Validate};
use contract_etl::{BatchOrchestrator, EtlEngine, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Contract ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "contract-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override worker count from config
    #[arg(long)]
    workers: Option<usize>,

    /// Dry run - show admission decisions without writing output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let verbose = args.verbose || config.monitoring.log_level.as_deref() == Some("debug");
    if config.monitoring.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based contract ETL");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(workers) = args.workers {
        config.processing.workers = workers;
        tracing::info!("🔧 Worker count overridden to: {}", workers);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let orchestrator = BatchOrchestrator::new(config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No output will be written");
        perform_dry_run(&orchestrator).await?;
        return Ok(());
    }

    let engine = EtlEngine::new_with_monitoring(orchestrator, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            println!(
                "✅ Processed {}/{} files ({} failed, {} skipped)",
                summary.processed,
                summary.total_files,
                summary.failed,
                summary.skipped()
            );
            println!("📁 Inventory: {}", summary.inventory_path.display());
            println!("📁 Rates: {}", summary.rates_path.display());
            if let Some(bundle) = &summary.bundle_path {
                println!("📦 Bundle: {}", bundle.display());
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Contract ETL failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Input: {}", config.input_root());
    if !config.destination_prefix().is_empty() {
        println!("  Destination prefix: {}", config.destination_prefix());
    }
    println!("  Contract prefix: {}", config.contract_prefix());
    println!("  Max file size: {} bytes", config.max_file_size());
    println!("  Output: {}", config.output_dir());
    println!("  Workers: {}", config.workers());

    if let Some(bundle) = config.bundle_file() {
        println!("  Compression: {} (ZIP)", bundle);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(orchestrator: &BatchOrchestrator<TomlConfig>) -> anyhow::Result<()> {
    let files = orchestrator.discover().await?;
    let admissions = orchestrator.plan(&files).await;

    println!("🔍 Dry Run Analysis: {} contract files", files.len());
    println!();

    let mut accepted = 0usize;
    for (file, admission) in files.iter().zip(&admissions) {
        let decision = match admission {
            Admission::Accepted { hotel_id, size } => {
                accepted += 1;
                format!("✅ hotel {} ({} bytes)", hotel_id, size)
            }
            Admission::Oversize { size } => format!("⏭️ oversize ({} bytes)", size),
            Admission::NoHotelId => "⏭️ no hotel id".to_string(),
            Admission::Unreadable { reason } => format!("❌ unreadable: {}", reason),
        };
        println!("  {} -> {}", file.path.display(), decision);
    }

    println!();
    println!(
        "✅ Dry run complete: {} of {} files would be processed.",
        accepted,
        files.len()
    );

    Ok(())
}
