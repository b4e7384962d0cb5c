
use anyhow::{ensure, Context};
use clap::Args;
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::dar_calculator::{DarConfig, DarConfigBuilder};
use crate::data_types::contrast::Contrast;
use crate::locus_filter::{LocusPredicate, DEFAULT_PREDICATE};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ComputeSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    dar_version: String,

    /// Input multi-sample variant call file (VCF/BCF)
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub vcf_filename: PathBuf,

    /// Sample to group assignments (TSV: sample, group)
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "groups")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub groups_filename: PathBuf,

    /// Output folder for the DAR tables
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Group contrast, e.g. "case-control" or "name=a - 0.5*b - 0.5*c"; repeatable [default: all pairwise]
    #[clap(short = 'c')]
    #[clap(long = "contrast")]
    #[clap(value_name = "CONTRAST")]
    #[clap(help_heading = Some("DAR parameters"))]
    pub contrasts: Vec<String>,

    /// Locus filter applied to each group independently, over n_called, n_missing, n_0..n_3
    #[clap(long = "filter")]
    #[clap(value_name = "EXPR")]
    #[clap(help_heading = Some("DAR parameters"))]
    #[clap(default_value = DEFAULT_PREDICATE)]
    pub filter: String,

    /// Smoothing window span in basepairs, takes precedence over --region-loci
    #[clap(long = "region-fixed")]
    #[clap(value_name = "BP")]
    #[clap(help_heading = Some("Smoothing"))]
    pub region_fixed: Option<u64>,

    /// Smoothing window as an odd number of loci centered on each locus
    #[clap(long = "region-loci")]
    #[clap(value_name = "LOCI")]
    #[clap(help_heading = Some("Smoothing"))]
    pub region_loci: Option<usize>,

    /// Requires smoothing; fails if no window was provided
    #[clap(long = "smooth")]
    #[clap(help_heading = Some("Smoothing"))]
    pub smooth: bool,

    /// Also writes the scores as smoothing windows (dar_region.tsv)
    #[clap(long = "flip-ranges")]
    #[clap(help_heading = Some("Smoothing"))]
    pub flip_ranges: bool,

    /// Stretches the outer windows of each chromosome to its edges when flipping
    #[clap(long = "extend-edges")]
    #[clap(help_heading = Some("Smoothing"))]
    pub extend_edges: bool,

    /// Number of threads to use
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8
}

impl ComputeSettings {
    /// Builds the library configuration for the DAR calculator
    pub fn dar_config(&self) -> anyhow::Result<DarConfig> {
        let config = DarConfigBuilder::default()
            .region_fixed(self.region_fixed)
            .region_loci(self.region_loci)
            .smooth(self.smooth)
            .build()?;
        Ok(config)
    }

    /// Parses the filter expression
    pub fn predicate(&self) -> anyhow::Result<LocusPredicate> {
        let predicate = self.filter.parse::<LocusPredicate>()
            .with_context(|| format!("Error while parsing --filter {:?}:", self.filter))?;
        Ok(predicate)
    }

    /// Parses the provided contrasts; an empty list means all pairwise contrasts of `group_names`
    /// # Arguments
    /// * `group_names` - the groups in file order
    pub fn parse_contrasts(&self, group_names: &[String]) -> anyhow::Result<Vec<Contrast>> {
        if self.contrasts.is_empty() {
            let contrasts = Contrast::all_pairwise(group_names)?;
            ensure!(!contrasts.is_empty(), "At least two groups are required to build a contrast");
            return Ok(contrasts);
        }
        self.contrasts.iter()
            .map(|c| c.parse::<Contrast>().with_context(|| format!("Error while parsing --contrast {c:?}:")))
            .collect()
    }
}

pub fn check_compute_settings(mut settings: ComputeSettings) -> anyhow::Result<ComputeSettings> {
    // hard code the version in
    settings.dar_version = FULL_VERSION.clone();
    info!("DAR version: {:?}", &settings.dar_version);
    info!("Sub-command: compute");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.vcf_filename, "Input VCF")?;
    check_required_filename(&settings.groups_filename, "Groups file")?;
    info!("\tVCF: {:?}", &settings.vcf_filename);
    info!("\tGroups: {:?}", &settings.groups_filename);

    // outputs
    info!("Outputs:");
    info!("\tOutput folder: {:?}", &settings.output_folder);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    info!("DAR parameters:");
    settings.predicate()?;
    info!("\tLocus filter: {:?}", &settings.filter);
    if settings.contrasts.is_empty() {
        info!("\tContrasts: all pairwise");
    } else {
        // only syntax here, group names are checked once the groups are loaded
        for contrast in settings.contrasts.iter() {
            let parsed = contrast.parse::<Contrast>()
                .with_context(|| format!("Error while parsing --contrast {contrast:?}:"))?;
            info!("\tContrast: {} = {:?}", parsed.name(), parsed.coefficients());
        }
    }

    info!("Smoothing:");
    let window = settings.dar_config()?.smoothing_window()?;
    match window {
        Some(w) => info!("\tWindow: {w:?}"),
        None => info!("\tWindow: None")
    };
    if settings.flip_ranges {
        ensure!(window.is_some(), "--flip-ranges requires --region-fixed or --region-loci");
    }
    if settings.extend_edges && !settings.flip_ranges {
        warn!("--extend-edges has no effect without --flip-ranges");
    }
    info!("\tFlip ranges: {}", if settings.flip_ranges { "ENABLED" } else { "DISABLED" });
    info!("\tExtend edges: {}", if settings.extend_edges { "ENABLED" } else { "DISABLED" });

    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ComputeSettings {
        ComputeSettings {
            vcf_filename: PathBuf::from("test_data/small_cohort/cohort.vcf"),
            groups_filename: PathBuf::from("test_data/small_cohort/groups.tsv"),
            output_folder: PathBuf::from("unused"),
            filter: DEFAULT_PREDICATE.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_check_settings() {
        let mut s = settings();
        s.region_loci = Some(3);
        s.flip_ranges = true;
        let checked = check_compute_settings(s).unwrap();
        assert_eq!(checked.threads, 1);
        assert_eq!(checked.dar_version, *FULL_VERSION);
    }

    #[test]
    fn test_bad_settings() {
        let mut s = settings();
        s.flip_ranges = true;
        assert!(check_compute_settings(s).is_err());

        let mut s = settings();
        s.region_loci = Some(4);
        assert!(check_compute_settings(s).is_err());

        let mut s = settings();
        s.filter = "n_5 > 1".to_string();
        assert!(check_compute_settings(s).is_err());

        let mut s = settings();
        s.vcf_filename = PathBuf::from("test_data/missing.vcf");
        assert!(check_compute_settings(s).is_err());
    }

    #[test]
    fn test_default_contrasts() {
        let groups = vec!["control".to_string(), "case".to_string()];
        let contrasts = settings().parse_contrasts(&groups).unwrap();
        assert_eq!(contrasts.len(), 1);
        assert_eq!(contrasts[0].name(), "control-case");

        assert!(settings().parse_contrasts(&groups[..1]).is_err());

        let mut s = settings();
        s.contrasts = vec!["case-control".to_string()];
        assert_eq!(s.parse_contrasts(&groups).unwrap()[0].name(), "case-control");
    }
}
