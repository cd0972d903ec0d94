use clap::Parser;
use std::{error::Error, fs::File, path::PathBuf, process};

use customer_enrichment::{
    assign_trip_endpoints, enrich_uploaded_data, generate_customer_summary, load_customer_data,
    read_table, write_summary, write_table, CustomerSource, DEFAULT_CUSTOMER_FILE,
};

/// Enriches uploaded order data with customer details and prints one summary
/// row per customer.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Uploaded transactions (.csv)
    uploaded: String,

    /// Customer reference file
    #[arg(long, default_value = DEFAULT_CUSTOMER_FILE)]
    customers: PathBuf,

    /// Text encoding of the customer reference file
    #[arg(long, default_value = "latin1")]
    encoding: String,

    /// Resolve trip origin and destination from boarding-pass segments first
    #[arg(long)]
    trips: bool,

    /// Also write the enriched rows to this file
    #[arg(long)]
    enriched: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    check_csv_extension(&cli.uploaded);

    let source = CustomerSource::new(&cli.customers)
        .with_encoding_label(&cli.encoding)
        .unwrap_or_else(|e| abort("Error loading customer data", e));
    let customers =
        load_customer_data(&source).unwrap_or_else(|e| abort("Error loading customer data", e));

    let mut uploaded =
        read_table(&cli.uploaded).unwrap_or_else(|e| abort("Error reading the uploaded data", e));
    if cli.trips {
        assign_trip_endpoints(&mut uploaded)
            .unwrap_or_else(|e| abort("Error resolving trip endpoints", e));
    }

    let enriched = enrich_uploaded_data(uploaded, &customers)
        .unwrap_or_else(|e| abort("Error enriching the uploaded data", e));
    if let Some(path) = &cli.enriched {
        write_table(&enriched, File::create(path)?)?;
    }

    let summary = generate_customer_summary(&enriched)
        .unwrap_or_else(|e| abort("Error generating customer summary", e));
    write_summary(&summary, std::io::stdout())?;

    Ok(())
}

fn check_csv_extension(file_path: &str) {
    const CSV_EXTENSION: &str = ".csv";

    if !file_path.ends_with(CSV_EXTENSION) {
        eprintln!("Error: The file must have a .csv extension");
        process::exit(1);
    }
}

fn abort(stage: &str, err: customer_enrichment::Error) -> ! {
    tracing::error!("{stage}: {err}");
    process::exit(1);
}
