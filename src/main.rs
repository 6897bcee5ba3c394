use clap::Parser;
use galley::{DocumentBuilder, PipelineError, RunConfig, Template, load_directives, logging};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Composes a JSON directive stream into a paginated document and exports
/// the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "galley", version, about)]
struct Cli {
    /// Content directives (JSON array).
    #[arg(long)]
    content: PathBuf,

    /// Template with page geometry and styles.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Run configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory images are resolved against.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Where to write the exported document; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Append the event log to this file instead of stderr.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Do not try jpg/jpeg/png siblings for missing images.
    #[arg(long)]
    no_ext_fallback: bool,
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if cli.log.is_some() {
        config.log.file = cli.log.clone();
    }
    if cli.no_ext_fallback {
        config.assets.extension_fallback = false;
    }
    logging::init(&config.log)?;

    let template = Template::load(cli.template.as_deref())?;
    let asset_dir = cli.assets.clone().or_else(|| config.assets.base_dir.clone());
    let directives = load_directives(&cli.content)?;
    log::info!("Loaded {} directives from '{}'.", directives.len(), cli.content.display());

    let mut builder = DocumentBuilder::new().with_config(config).with_template(template);
    if let Some(dir) = asset_dir {
        builder = builder.with_asset_dir(dir);
    }
    let outcome = builder.build(&directives)?;

    let json = outcome.host.snapshot().to_json()?;
    match &cli.out {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("Wrote {} pages to '{}'.", outcome.report.pages, path.display());
        }
        None => println!("{}", json),
    }
    log::logger().flush();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            log::logger().flush();
            eprintln!("galley: {}", e);
            ExitCode::FAILURE
        }
    }
}
