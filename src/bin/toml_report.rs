use clap::Parser;
use fra_monitor::adapters::{ConfiguredSource, SourceSpec};
use fra_monitor::core::session::{DirectoryProvider, SessionStore};
use fra_monitor::core::ReportSettings;
use fra_monitor::utils::{logger, validation::Validate};
use fra_monitor::{LocalStorage, ReportConfig, ReportEngine, ReportPipeline};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "FRA claims report driven by a TOML configuration")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "fra-report.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Sign in as this user when the config lists users
    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    password: Option<String>,

    /// Forget the stored session and exit
    #[arg(long)]
    logout: bool,

    /// Show what would be produced without fetching or writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match ReportConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(args.verbose || config.verbose(), config.log_json());
    tracing::info!("🚀 Starting TOML-based report");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let sessions = SessionStore::new(LocalStorage::new(config.output_path().to_string()));
    if args.logout {
        sessions.clear().await?;
        println!("👋 Signed out");
        return Ok(());
    }

    if config.requires_login() {
        let session = match sessions.load().await? {
            Some(session) => session,
            None => {
                let provider = DirectoryProvider::new(config.users.clone());
                let user = args.user.as_deref().unwrap_or_default();
                let password = args.password.as_deref().unwrap_or_default();
                match sessions.login(&provider, user, password).await {
                    Ok(session) => session,
                    Err(e) => {
                        eprintln!("❌ {}", e.user_friendly_message());
                        std::process::exit(e.severity().exit_code());
                    }
                }
            }
        };
        tracing::info!("👤 Running as {} ({})", session.name, session.role);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let source = ConfiguredSource::build(&config.source_spec()?, LocalStorage::new(".".to_string()))?;
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = ReportPipeline::new(storage, source, config);
    let engine = ReportEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Report completed successfully!");
            println!("✅ Report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &ReportConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Report: {} v{}",
        config.report.name,
        config.report.version.as_deref().unwrap_or("-")
    );
    match config.source_spec() {
        Ok(SourceSpec::Sample) => println!("  Source: built-in sample claims"),
        Ok(SourceSpec::File(path)) => println!("  Source: {}", path),
        Ok(SourceSpec::Api { endpoint, .. }) => println!("  Source: {}", endpoint),
        Err(_) => println!("  Source: invalid"),
    }
    println!("  Output: {}", config.output_path());

    let query = config.query();
    let exact: Vec<String> = query
        .filters
        .exact
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| format!("{}={}", field, value))
        .collect();
    if !exact.is_empty() {
        println!("  Filters: {}", exact.join(", "));
    }
    if let Some(sort) = &query.sort {
        println!("  Sort: {}", sort);
    }
    if query.page.size > 0 {
        println!(
            "  Page: {} ({} per page)",
            query.page.index.saturating_add(1),
            query.page.size
        );
    }
    if let Some(field) = config.summary_field() {
        println!("  Summary: {:?} chart of '{}'", config.summary_chart(), field);
    }
    if config.bundle() {
        println!("  Bundle: {}.zip", config.export_filename());
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
