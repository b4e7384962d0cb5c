
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::feature_assigner::{AssignConfig, AssignConfigBuilder, DarValue};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct AssignSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    dar_version: String,

    /// DAR table produced by the compute step (TSV)
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "dar")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub dar_filename: PathBuf,

    /// Features to assign scores to (BED)
    #[clap(required = true)]
    #[clap(short = 'b')]
    #[clap(long = "features")]
    #[clap(value_name = "BED")]
    #[clap(help_heading = Some("Input/Output"))]
    pub features_filename: PathBuf,

    /// Output feature table (TSV)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: PathBuf,

    /// The score to average onto each feature
    #[clap(long = "dar-val")]
    #[clap(value_name = "VALUE")]
    #[clap(help_heading = Some("Assignment parameters"))]
    #[clap(default_value = "region")]
    pub dar_val: DarValue,

    /// Value given to features without any overlapping score [default: NA]
    #[clap(long = "fill")]
    #[clap(value_name = "FLOAT")]
    #[clap(help_heading = Some("Assignment parameters"))]
    pub fill: Option<f64>,

    /// Restricts the output to these contrasts; repeatable [default: all]
    #[clap(short = 'c')]
    #[clap(long = "contrast")]
    #[clap(value_name = "NAME")]
    #[clap(help_heading = Some("Assignment parameters"))]
    pub contrasts: Vec<String>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

impl AssignSettings {
    /// Builds the library configuration for the feature assigner
    pub fn assign_config(&self) -> anyhow::Result<AssignConfig> {
        let config = AssignConfigBuilder::default()
            .dar_val(self.dar_val)
            .fill(self.fill)
            .build()?;
        Ok(config)
    }
}

pub fn check_assign_settings(mut settings: AssignSettings) -> anyhow::Result<AssignSettings> {
    // hard code the version in
    settings.dar_version = FULL_VERSION.clone();
    info!("DAR version: {:?}", &settings.dar_version);
    info!("Sub-command: assign");
    info!("Inputs:");

    check_required_filename(&settings.dar_filename, "DAR table")?;
    check_required_filename(&settings.features_filename, "Features BED")?;
    info!("\tDAR table: {:?}", &settings.dar_filename);
    info!("\tFeatures: {:?}", &settings.features_filename);

    info!("Outputs:");
    info!("\tFeature table: {:?}", &settings.output_filename);

    info!("Assignment parameters:");
    info!("\tDAR value: {}", settings.dar_val);
    if let Some(fill) = settings.fill {
        ensure!(fill.is_finite(), "--fill must be a finite number");
        info!("\tFill value: {fill}");
    } else {
        info!("\tFill value: NA");
    }
    if settings.contrasts.is_empty() {
        info!("\tContrasts: all");
    } else {
        info!("\tContrasts: {:?}", settings.contrasts);
    }

    Ok(settings)
}
