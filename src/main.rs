
use indicatif::ParallelProgressIterator;
use log::{LevelFilter, error, info, warn};
use rayon::prelude::*;
use std::time::Instant;

use dar::allele_counter::count_alleles;
use dar::cli::assign::{AssignSettings, check_assign_settings};
use dar::cli::compute::{ComputeSettings, check_compute_settings};
use dar::cli::core::{Commands, get_cli};
use dar::dar_calculator::{compute_dar, DarError};
use dar::data_types::scored_range::DarTable;
use dar::feature_assigner::assign_table_dar;
use dar::locus_filter::filter_loci;
use dar::parsing::dar_reader::load_dar_tables;
use dar::parsing::features::load_bed_features;
use dar::parsing::genotype_loader::load_vcf_genotypes;
use dar::parsing::sample_groups::load_sample_groups;
use dar::proportions::counts_to_proportions;
use dar::range_flipper::flip_ranges;
use dar::util::json_io::save_json;
use dar::util::progress_bar::get_progress_style;
use dar::writers::dar_writer::write_dar_tables;
use dar::writers::feature_writer::FeatureWriter;
use dar::writers::run_summary::RunSummary;

/// Sets up the logger from the verbosity count
fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

fn run_compute(settings: ComputeSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    init_logging(settings.verbosity);
    let settings = match check_compute_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(settings.threads).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    if let Err(e) = std::fs::create_dir_all(&settings.output_folder) {
        error!("Error while creating output folder: {e}");
        std::process::exit(exitcode::IOERR);
    }

    // create a debug folder if specified
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        if let Err(e) = std::fs::create_dir_all(debug_folder) {
            error!("Error while creating debug folder: {e}");
            std::process::exit(exitcode::IOERR);
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // these were all checked with the settings, so failures here are unexpected
    let (predicate, dar_config) = match (settings.predicate(), settings.dar_config()) {
        (Ok(p), Ok(c)) => (p, c),
        (Err(e), _) | (_, Err(e)) => {
            error!("Error while building configuration: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    info!("Loading sample groups...");
    let sample_groups = match load_sample_groups(&settings.groups_filename) {
        Ok(sg) => sg,
        Err(e) => {
            error!("Error while loading sample groups: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    let contrasts = match settings.parse_contrasts(&sample_groups.group_names()) {
        Ok(c) => c,
        Err(e) => {
            error!("Error while building contrasts: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };
    for contrast in contrasts.iter() {
        info!("Contrast {}: {:?}", contrast.name(), contrast.coefficients());
    }

    info!("Loading genotypes...");
    let loaded_genotypes = match load_vcf_genotypes(&settings.vcf_filename) {
        Ok(lg) => lg,
        Err(e) => {
            error!("Error while loading genotypes: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    let genotypes = loaded_genotypes.table();

    info!("Counting alleles for {} groups...", sample_groups.len());
    let counts = match count_alleles(genotypes, &sample_groups) {
        Ok(c) => c,
        Err(e) => {
            error!("Error while counting alleles: {e:#}");
            std::process::exit(exitcode::DATAERR);
        }
    };

    info!("Filtering loci with {predicate}...");
    let filtered = filter_loci(&counts, &predicate);
    for (group, table) in filtered.iter() {
        info!("\t{group}: {} of {} loci retained", table.len(), counts[group].len());
        if table.is_empty() {
            warn!("No loci remain for group {group} after filtering");
        }
    }
    let proportions = counts_to_proportions(&filtered);

    info!("Computing DAR for {} contrasts...", contrasts.len());
    let dar_tables = match compute_dar(&proportions, &contrasts, &dar_config) {
        Ok(dt) => dt,
        Err(e) => {
            error!("Error while computing DAR: {e:#}");
            let code = match e {
                DarError::DuplicateLocus { .. } => exitcode::DATAERR,
                _ => exitcode::CONFIG
            };
            std::process::exit(code);
        }
    };

    let dar_fn = settings.output_folder.join("dar.tsv");
    info!("Saving DAR scores to {dar_fn:?}...");
    if let Err(e) = write_dar_tables(&dar_fn, &dar_tables) {
        error!("Error while saving DAR scores: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    if settings.flip_ranges {
        info!("Flipping DAR scores to region ranges...");
        let style = get_progress_style();
        let chrom_lengths = loaded_genotypes.chrom_lengths();
        let region_tables: Vec<DarTable> = match dar_tables.par_iter()
            .map(|table| flip_ranges(table, settings.extend_edges, Some(chrom_lengths)))
            .progress_with_style(style)
            .collect::<Result<Vec<DarTable>, _>>() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Error while flipping ranges: {e:#}");
                    std::process::exit(exitcode::SOFTWARE);
                }
            };

        let region_fn = settings.output_folder.join("dar_region.tsv");
        info!("Saving region DAR scores to {region_fn:?}...");
        if let Err(e) = write_dar_tables(&region_fn, &region_tables) {
            error!("Error while saving region DAR scores: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        let summary = RunSummary::new(
            genotypes, loaded_genotypes.skipped_records(), &counts, &filtered, &proportions, &dar_tables
        );
        let summary_json = debug_folder.join("run_summary.json");
        info!("Saving run summary to {summary_json:?}...");
        if let Err(e) = save_json(&summary, &summary_json) {
            error!("Error while saving run summary: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    info!("Compute completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_assign(settings: AssignSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    init_logging(settings.verbosity);
    let settings = match check_assign_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };
    let assign_config = match settings.assign_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Error while building assign config: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    info!("Loading DAR scores...");
    let mut dar_tables = match load_dar_tables(&settings.dar_filename) {
        Ok(dt) => dt,
        Err(e) => {
            error!("Error while loading DAR scores: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    if !settings.contrasts.is_empty() {
        if let Some(missing) = settings.contrasts.iter().find(|c| !dar_tables.iter().any(|t| t.contrast() == c.as_str())) {
            error!("Contrast {missing:?} was not found in {:?}", settings.dar_filename);
            std::process::exit(exitcode::DATAERR);
        }
        dar_tables.retain(|t| settings.contrasts.iter().any(|c| c == t.contrast()));
    }

    info!("Loading features...");
    let features = match load_bed_features(&settings.features_filename) {
        Ok(f) => f,
        Err(e) => {
            error!("Error while loading features: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    let num_metadata = features.iter().map(|f| f.metadata().len()).max().unwrap_or(0);

    let mut feature_writer = match FeatureWriter::new(&settings.output_filename, num_metadata) {
        Ok(fw) => fw,
        Err(e) => {
            error!("Error while opening feature output: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    for table in dar_tables.iter() {
        info!("Assigning {} scores from contrast {} to {} features...", table.len(), table.contrast(), features.len());
        let assignment = match assign_table_dar(table, features.clone(), &assign_config) {
            Ok(a) => a,
            Err(e) => {
                error!("Error while assigning contrast {}: {e:#}", table.contrast());
                std::process::exit(exitcode::DATAERR);
            }
        };
        let num_assigned = assignment.features().iter().filter(|f| f.num_overlaps() > 0).count();
        info!("\t{num_assigned} features overlap at least one score");

        if let Err(e) = feature_writer.write_features(table.contrast(), assignment.features()) {
            error!("Error while saving features: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }
    if let Err(e) = feature_writer.flush() {
        error!("Error while saving features: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Assign completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Compute(settings) => {
            run_compute(*settings);
        },
        Commands::Assign(settings) => {
            run_assign(*settings);
        }
    }

    info!("Process finished successfully.");
}
