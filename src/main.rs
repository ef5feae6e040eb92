use clap::Parser;
use contract_etl::utils::{logger, validation::Validate};
use contract_etl::{BatchOrchestrator, CliConfig, EtlEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting contract-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let orchestrator = BatchOrchestrator::new(config);
    let engine = EtlEngine::new_with_monitoring(orchestrator, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            println!(
                "✅ Processed {}/{} files ({} failed, {} skipped) in {} ms",
                summary.processed,
                summary.total_files,
                summary.failed,
                summary.skipped(),
                summary.elapsed_ms
            );
            println!(
                "📁 {} inventory rows -> {}",
                summary.inventory_rows,
                summary.inventory_path.display()
            );
            println!(
                "📁 {} rate rows -> {}",
                summary.rate_rows,
                summary.rates_path.display()
            );
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Contract ETL failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = e.severity().exit_code();

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
