use chrono::Utc;
use clap::Parser;
use epg_etl::config::toml_config::TomlConfig;
use epg_etl::core::{timefmt, ConfigProvider};
use epg_etl::domain::model::ChannelLineup;
use epg_etl::utils::{logger, validation::Validate};
use epg_etl::{EpgPipeline, EtlEngine, LocalStorage};

#[derive(Parser)]
#[command(name = "epg-etl")]
#[command(about = "Fetches EPG listings and writes an XMLTV guide")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "epg-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON log lines (for scheduled/CI runs)
    #[arg(long)]
    log_json: bool,

    /// Dry run - show what would be fetched without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.log_json {
        logger::init_scheduled_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting EPG to XMLTV converter");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(3);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(3);
    }

    let lineup = match config.load_lineup() {
        Ok(lineup) => lineup,
        Err(e) => {
            tracing::error!("❌ Channel lineup could not be loaded: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(3);
        }
    };

    tracing::info!("✅ Configuration loaded: {} channels in the lineup", lineup.len());
    display_config_summary(&config, &lineup, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No fetch or write will occur");
        perform_dry_run(&config, &lineup);
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = match EpgPipeline::new(storage, config, lineup) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("❌ Could not build the HTTP client: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ EPG conversion completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ EPG conversion completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ EPG conversion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                epg_etl::utils::error::ErrorSeverity::Low => 0,
                epg_etl::utils::error::ErrorSeverity::Medium => 2,
                epg_etl::utils::error::ErrorSeverity::High => 1,
                epg_etl::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, lineup: &ChannelLineup, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Source: {}", config.api_endpoint());
    println!("  Channels: {}", lineup.len());
    println!("  Timezone: {}", config.timezone());
    println!("  Output: {}/{}", config.output_path(), config.output_filename());
    println!("  Gzip duplicate: {}", config.gzip_output());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig, lineup: &ChannelLineup) {
    let window = config.window().resolve(Utc::now());

    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Data Source:");
    println!("  Endpoint: {}", config.api_endpoint());
    println!(
        "  Window: {} to {}",
        timefmt::format_query(window.start),
        timefmt::format_query(window.end)
    );
    println!(
        "  Query: reg={} dt={} client={} pageNumber={} pageSize={}",
        config.region(),
        config.device_type(),
        config.client_tag(),
        config.page_number(),
        config.page_size()
    );
    if config.insecure_tls() {
        println!("  ⚠️ TLS certificate verification is DISABLED");
    }

    println!();
    println!("📺 Channel Lineup:");
    for (name, channel_id) in lineup.iter() {
        println!("  {} -> {}", name, channel_id);
    }

    println!();
    println!("💾 Output:");
    println!("  Path: {}/{}", config.output_path(), config.output_filename());
    if config.gzip_output() {
        println!("  Gzip: {}/{}.gz", config.output_path(), config.output_filename());
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during an actual run.");
}
