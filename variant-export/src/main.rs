use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use variant_export::model::ProjectData;
use variant_export::stores::{JsonPopulationStore, JsonReference, JsonVariantStore};
use variant_export::{ExportError, ExportJob};

/// Export rare moderate-impact variant calls for a set of individuals.
#[derive(Debug, Parser)]
#[command(name = "variant-export", version)]
struct Args {
    /// Project to export from.
    project_id: String,

    /// File of individual ids, one per line.
    individuals_file: PathBuf,

    /// Directory holding the project, variant, reference and population
    /// JSON files.
    #[arg(long, env = "VARIANT_EXPORT_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Where to write the output archive.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn run(args: &Args) -> Result<(), ExportError> {
    let project: ProjectData = {
        let path = args.data_dir.join(format!("{}.json", args.project_id));
        let file = std::fs::File::open(&path)
            .map_err(|e| ExportError::DataLoad(format!("{}: {}", path.display(), e)))?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| ExportError::DataLoad(format!("{}: {}", path.display(), e)))?
    };

    let variants = JsonVariantStore::load(&args.data_dir.join("variants.json"))?;
    let reference = JsonReference::load(&args.data_dir.join("genes.json"))?;
    let populations = JsonPopulationStore::load(&args.data_dir.join("populations.json"))?;

    let job = ExportJob::new(&project, &variants, &reference, &populations);
    job.run(&args.individuals_file, &args.output_dir)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}
