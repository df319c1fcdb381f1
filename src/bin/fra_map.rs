use clap::Parser;
use fra_monitor::adapters::{load_feature_collection, ConfiguredSource, SourceSpec};
use fra_monitor::core::export::{claim_columns, export_csv};
use fra_monitor::core::geo::{map_view, FeatureCollection, MapSelection, DEFAULT_PADDING};
use fra_monitor::core::{RecordSource, Storage};
use fra_monitor::utils::logger;
use fra_monitor::{FraError, LocalStorage};

#[derive(Parser)]
#[command(name = "fra-map")]
#[command(about = "Fit the claims map to a state or district boundary")]
struct Args {
    /// District boundaries (GeoJSON FeatureCollection)
    #[arg(long)]
    districts: Option<String>,

    /// State boundaries (GeoJSON FeatureCollection)
    #[arg(long)]
    states: Option<String>,

    /// Village boundaries (GeoJSON FeatureCollection)
    #[arg(long)]
    villages: Option<String>,

    /// Claim records: 'sample', a JSON file or an http(s) URL
    #[arg(long, default_value = "sample")]
    claims: String,

    #[arg(long, default_value = "")]
    state: String,

    #[arg(long, default_value = "")]
    district: String,

    #[arg(long, default_value = "")]
    village: String,

    #[arg(long, default_value = "")]
    tribe: String,

    /// Margin around the focused boundary, in degrees
    #[arg(long, default_value_t = DEFAULT_PADDING)]
    padding: f64,

    #[arg(long, default_value = "./output")]
    output_path: String,

    #[arg(short, long)]
    verbose: bool,
}

async fn load_layer(storage: &LocalStorage, path: Option<&str>) -> fra_monitor::Result<FeatureCollection> {
    match path {
        Some(path) => load_feature_collection(storage, path).await,
        None => Ok(FeatureCollection::new(Vec::new())),
    }
}

async fn run(args: Args) -> fra_monitor::Result<String> {
    let input = LocalStorage::new(".".to_string());
    let districts = load_layer(&input, args.districts.as_deref()).await?;
    let states = load_layer(&input, args.states.as_deref()).await?;
    let villages = load_layer(&input, args.villages.as_deref()).await?;
    tracing::info!(
        "Loaded {} district, {} state and {} village boundaries",
        districts.len(),
        states.len(),
        villages.len()
    );

    let selection = MapSelection {
        state: args.state.clone(),
        district: args.district.clone(),
        village: args.village.clone(),
        tribe: args.tribe.clone(),
    };
    let source = ConfiguredSource::build(&SourceSpec::parse(&args.claims), input)?;
    let records = source.fetch().await?;
    let view = map_view(
        &selection,
        &districts,
        &states,
        &villages,
        &records,
        args.padding,
    );

    let output = LocalStorage::new(args.output_path.clone());
    output
        .write_file("map_claims.csv", export_csv(&view.claims, &claim_columns())?.as_bytes())
        .await?;
    output
        .write_file("map_view.json", serde_json::to_string_pretty(&view)?.as_bytes())
        .await?;

    println!(
        "🗺️  Center ({:.4}, {:.4}), {} claims in view",
        view.viewport.center.0,
        view.viewport.center.1,
        view.claims.len()
    );
    Ok(format!("{}/map_view.json", args.output_path))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match run(args).await {
        Ok(path) => println!("📁 Output saved to: {}", path),
        Err(e) => {
            report_failure(&e);
            std::process::exit(e.severity().exit_code().max(1));
        }
    }
    Ok(())
}

fn report_failure(e: &FraError) {
    tracing::error!("❌ Map view failed: {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
}
