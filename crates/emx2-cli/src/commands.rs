use anyhow::Result;
use tracing::debug;

use emx2_cli::config::{RunConfig, load_config};
use emx2_cli::pipeline::{inspect_document, run_codebook, run_conversion};
use emx2_cli::types::{CodebookSummary, InstrumentSummary, RunSummary};

use crate::cli::{Cli, ConvertArgs, InspectArgs};

pub fn run_convert(cli: &Cli, args: &ConvertArgs) -> Result<RunSummary> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_convert_overrides(&mut config, args);
    debug!(?config, "resolved run config");
    let edc = config.edc()?;
    run_conversion(&args.input, edc, &config.conversion, args.dry_run)
}

pub fn run_codelist(cli: &Cli, args: &ConvertArgs) -> Result<CodebookSummary> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_convert_overrides(&mut config, args);
    let edc = config.edc()?;
    run_codebook(&args.input, edc, &config.conversion, args.dry_run)
}

pub fn run_inspect(cli: &Cli, args: &InspectArgs) -> Result<Vec<InstrumentSummary>> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(edc) = &args.edc {
        config.edc.clone_from(edc);
    }
    let edc = config.edc()?;
    inspect_document(&args.input, edc, &config.conversion)
}

fn apply_convert_overrides(config: &mut RunConfig, args: &ConvertArgs) {
    if let Some(edc) = &args.edc {
        config.edc.clone_from(edc);
    }
    if let Some(dir) = &args.output_dir {
        config.conversion.output_folder.clone_from(dir);
    }
    if args.keep_output {
        config.conversion.clear_output = false;
    }
}
