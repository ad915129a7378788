use clap::{Parser, Subcommand};
use imgpress::batch::start_batch;
use imgpress::config::{self, OutputFormat, ProcessingConfig, QuantizeOptions, ResizeOptions};
use imgpress::imaging::{RustBackend, probe_images};
use imgpress::naming::expand_inputs;
use imgpress::output;
use imgpress::types::BatchEvent;
use log::{LevelFilter, warn};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "imgpress")]
#[command(about = "Batch image processor: resize, quantize, optimize, convert")]
#[command(long_about = "\
Batch image processor: resize, quantize, optimize, convert

Every input is written as <stem><suffix>.<png|webp>, next to the source or in
--output-dir. Stages run in a fixed order:

  png:   [resize] → [quantize] → [optimize]   (at least one required)
  webp:  [resize] → webp encode               (quality 100 = lossless)

A failing image is reported and skipped; the rest of the batch continues.
The exit status is non-zero when any image failed.

Run 'imgpress gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process images and write the results
    Process(ProcessArgs),
    /// Print dimensions and file size of images without processing them
    Probe(InputArgs),
    /// Print a stock config file with all options documented
    GenConfig,
}

/// Shared flags for commands that take image paths.
#[derive(clap::Args)]
struct InputArgs {
    /// Image files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct ProcessArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Config file, merged over the stock defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: png or webp
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Target width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Stretch to exactly --width x --height instead of keeping the aspect ratio
    #[arg(long)]
    stretch: bool,

    /// Reduce PNG colors with a palette quantizer
    #[arg(long)]
    quantize: bool,

    /// Losslessly recompress PNG output
    #[arg(long)]
    optimize: bool,

    /// Quality 1-100
    #[arg(long)]
    quality: Option<u32>,

    /// Write results here instead of next to each source (created if missing)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Appended to each output file stem
    #[arg(long)]
    suffix: Option<String>,

    /// Process this many images at once
    #[arg(long)]
    workers: Option<usize>,
}

impl ProcessArgs {
    /// Layer command-line flags over a loaded config.
    fn apply(&self, config: &mut ProcessingConfig) {
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if self.width.is_some() || self.height.is_some() {
            let resize = config.resize.get_or_insert_with(ResizeOptions::default);
            if self.width.is_some() {
                resize.width = self.width;
            }
            if self.height.is_some() {
                resize.height = self.height;
            }
        }
        if self.stretch {
            match config.resize.as_mut() {
                Some(resize) => resize.maintain_aspect_ratio = false,
                None => warn!("--stretch ignored: no --width/--height and no [resize] in the config"),
            }
        }
        if self.quantize && config.quantize.is_none() {
            config.quantize = Some(QuantizeOptions::default());
        }
        if self.optimize {
            config.optimize = true;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(suffix) = &self.suffix {
            config.suffix = suffix.clone();
        }
        if self.workers.is_some() {
            config.processing.workers = self.workers;
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match cli.command {
        Command::Process(args) => run_process(args),
        Command::Probe(args) => {
            let paths = expand_inputs(&args.paths, args.recursive);
            let infos = probe_images(&RustBackend::new(), &paths)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else {
                output::print_image_info(&infos);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_process(args: ProcessArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = config::load_config(args.config.as_deref())?;
    args.apply(&mut config);

    let paths = expand_inputs(&args.input.paths, args.input.recursive);
    if paths.is_empty() {
        return Err("no supported images found in the given paths".into());
    }
    if let Some(dir) = &config.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let json = args.input.json;
    let (tx, rx) = std::sync::mpsc::channel::<BatchEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("cannot serialize event: {e}"),
                }
            } else {
                output::print_batch_event(&event);
            }
        }
    });

    let handle = start_batch(RustBackend::new(), paths, config, tx)?;
    let report = handle.join()?;
    printer.join().map_err(|_| "printer thread panicked")?;

    Ok(if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_args(args: &[&str]) -> ProcessArgs {
        let cli = Cli::try_parse_from(["imgpress", "process"].iter().chain(args)).unwrap();
        match cli.command {
            Command::Process(args) => args,
            _ => unreachable!("parsed a process command"),
        }
    }

    #[test]
    fn stretch_without_resize_leaves_config_unchanged() {
        let mut config = ProcessingConfig::default();
        process_args(&["--stretch", "a.png"]).apply(&mut config);
        assert!(config.resize.is_none());
    }

    #[test]
    fn stretch_applies_to_flag_dimensions() {
        let mut config = ProcessingConfig::default();
        process_args(&["--stretch", "--width", "40", "--height", "20", "a.png"]).apply(&mut config);
        let resize = config.resize.unwrap();
        assert_eq!((resize.width, resize.height), (Some(40), Some(20)));
        assert!(!resize.maintain_aspect_ratio);
    }

    #[test]
    fn stretch_applies_to_config_resize_table() {
        let mut config = ProcessingConfig {
            resize: Some(ResizeOptions {
                width: Some(100),
                ..ResizeOptions::default()
            }),
            ..ProcessingConfig::default()
        };
        process_args(&["--stretch", "a.png"]).apply(&mut config);
        assert_eq!(config.resize.map(|r| r.maintain_aspect_ratio), Some(false));
    }
}
