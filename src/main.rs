use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use annotate_landmarks::{config, viewer, Batch, LandmarkWriter, Source};
use anyhow::{Context, Result};
use clap::{ArgGroup, CommandFactory, Parser};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "annotate-landmarks")]
#[command(
    version,
    about = "Annotate one or more face images with 68 landmarks. Output to stdout."
)]
#[command(group(ArgGroup::new("source").args(["dirimgs", "img"])))]
struct Cli {
    /// Directory with images
    #[arg(short, long)]
    dirimgs: Option<PathBuf>,

    /// Single image
    #[arg(short, long)]
    img: Option<PathBuf>,

    /// Number of images for -d mode (accepted, every image is processed)
    #[arg(short, long, default_value_t = 1)]
    nimgs: usize,

    /// Landmark output file, appended to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let source = match (cli.dirimgs, cli.img) {
        (Some(dir), _) => Source::Directory(dir),
        (None, Some(img)) => Source::Single(img),
        (None, None) => {
            Cli::command().print_help()?;
            return Ok(ExitCode::SUCCESS);
        }
    };
    if cli.nimgs != 1 {
        warn!("--nimgs {} ignored: every image is processed", cli.nimgs);
    }

    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        cfg.output = output;
    }

    let images = source.images().context("collecting images")?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.output)
        .with_context(|| format!("opening output {}", cfg.output.display()))?;
    let writer =
        LandmarkWriter::new(file, std::io::stdout()).repeat_header(cfg.repeat_header);
    info!("appending landmarks to {}", cfg.output.display());

    let summary = viewer::run(Batch::new(images, writer), cfg)?;
    info!(
        "{} completed, {} skipped{}",
        summary.completed,
        summary.skipped,
        if summary.aborted { ", aborted" } else { "" }
    );
    Ok(ExitCode::from(summary.exit_code()))
}
