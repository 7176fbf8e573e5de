use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;

use gt_prep::logging;
use gt_prep::{
    find_invalid_groups, generate, remove_invalid_groups_with, CleanOptions, FileOutcome, InvalidGroup, RemovalReport,
    RenderParams, SampleOptions, SampleReport, Text2Image,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate, clean and generate Tesseract ground-truth triplets (.tif/.box/.gt.txt)")]
struct Args {
    ///Log level: off, error, warn, info, debug or trace. RUST_LOG takes precedence. DEFAULT:info
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the invalid file groups of a ground-truth directory
    Check {
        /// The ground-truth directory
        dir: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove every file of the invalid groups
    Clean {
        /// The ground-truth directory
        dir: PathBuf,

        /// Only report what would be removed
        #[arg(long)]
        dry_run: bool,

        /// Move the files into a new GT_quarantine_<random> folder inside this path instead of deleting them
        #[arg(long)]
        quarantine: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sample lines of a training-text corpus and render them with text2image
    Generate {
        /// The line-oriented training text, e.g. langdata/vie.training_text
        #[arg(long)]
        corpus: PathBuf,

        /// The ground-truth output directory, created if missing
        #[arg(long)]
        output: PathBuf,

        /// Number of sampled lines. DEFAULT:1000
        #[arg(long, default_value_t = 1000)]
        count: usize,

        /// Seed for a reproducible sample
        #[arg(long)]
        seed: Option<u64>,

        /// File prefix. DEFAULT: the corpus file stem
        #[arg(long)]
        prefix: Option<String>,

        /// Font directory passed to text2image
        #[arg(long, env = "FONTS_DIR")]
        fonts_dir: Option<PathBuf>,

        #[arg(long, default_value = "ARIAL")]
        font: String,

        /// Unicharset file passed to text2image
        #[arg(long)]
        unicharset: Option<PathBuf>,

        /// Path to the text2image executable
        #[arg(long, default_value = "text2image")]
        text2image: PathBuf,

        #[arg(long, default_value_t = 32)]
        leading: u32,

        #[arg(long, default_value_t = 3600)]
        xsize: u32,

        #[arg(long, default_value_t = 480)]
        ysize: u32,

        #[arg(long, default_value_t = 1.0)]
        char_spacing: f32,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        exposure: i32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let args: Args = Args::parse();
    logging::init_logging(&args.log_level);

    match run(args.command) {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Check { dir, json } => check(&dir, json),
        Commands::Clean {
            dir,
            dry_run,
            quarantine,
            json,
        } => clean(&dir, &CleanOptions { dry_run, quarantine }, json),
        Commands::Generate {
            corpus,
            output,
            count,
            seed,
            prefix,
            fonts_dir,
            font,
            unicharset,
            text2image,
            leading,
            xsize,
            ysize,
            char_spacing,
            exposure,
            json,
        } => {
            let renderer: Text2Image = Text2Image::new()
                .with_binary(text2image)
                .with_fonts_dir(fonts_dir)
                .with_font(font)
                .with_unicharset(unicharset)
                .with_params(RenderParams {
                    max_pages: 1,
                    leading,
                    xsize,
                    ysize,
                    char_spacing,
                    exposure,
                });
            let options: SampleOptions = SampleOptions { count, seed, prefix };
            let report: SampleReport = generate(&corpus, &output, &renderer, &options)?;
            print_sample_report(&report, json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(dir: &Path, json: bool) -> anyhow::Result<ExitCode> {
    let invalid: Vec<InvalidGroup> =
        find_invalid_groups(dir).with_context(|| format!("failed to scan {}", dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&invalid)?);
    } else if invalid.is_empty() {
        println!("All file groups are valid.");
    } else {
        println!("Invalid file groups found:");
        for group in &invalid {
            println!("Prefix: {}", group.prefix);
            for message in group.messages() {
                println!("  - {}", message);
            }
        }
        println!("Total invalid file groups: {}", invalid.len());
    }

    //Codigo 1 para poder usarlo en scripts: hay grupos invalidos
    Ok(if invalid.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn clean(dir: &Path, options: &CleanOptions, json: bool) -> anyhow::Result<ExitCode> {
    let report: RemovalReport =
        remove_invalid_groups_with(dir, options).with_context(|| format!("failed to clean {}", dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }
    if report.prefixes.is_empty() {
        println!("No invalid file groups found to remove.");
        return Ok(ExitCode::SUCCESS);
    }

    for action in &report.actions {
        match &action.outcome {
            FileOutcome::Deleted => println!("Deleted: {}", action.path.display()),
            FileOutcome::Quarantined { to } => println!("Moved: {} -> {}", action.path.display(), to.display()),
            FileOutcome::WouldDelete => println!("Would delete: {}", action.path.display()),
            FileOutcome::Failed { reason } => println!("Failed to delete {}: {}", action.path.display(), reason),
        }
    }
    if options.dry_run {
        println!("Would remove the following invalid file groups:");
    } else {
        println!("Removed the following invalid file groups:");
    }
    for prefix in &report.prefixes {
        println!("  - {}", prefix);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_sample_report(report: &SampleReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("Wrote {} ground-truth files.", report.written.len());
    if !report.render_failures.is_empty() {
        println!("text2image failed for {} of them:", report.render_failures.len());
        for prefix in &report.render_failures {
            println!("  - {}", prefix);
        }
    }
    Ok(())
}
