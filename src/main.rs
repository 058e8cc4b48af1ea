//! BatchResize CLI - Concurrent Batch Image Resizer
//!
//! ```text
//! batchresize ./path/to/image.jpg -h 300
//! batchresize ./path/to/dir -w 500
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use console::style;
use tracing::debug;

use batchresize::{
    init_logging, BatchReport, BatchResizer, Config, ResizeSpec, SaveStrategy,
};

/// BatchResize - resize an image or a directory of images by height or width
#[derive(Parser, Debug)]
#[command(
    name = "batchresize",
    version,
    about = "Resize an image, or every image in a directory, by height or width",
    long_about = "Resizes a single image, or every image directly inside a directory, to the \
                  given height (-h) or width (-w) while preserving the aspect ratio. Results \
                  are written to a Resized_Images directory next to the input, named \
                  h<value>-<name> or w<value>-<name>.",
    disable_help_flag = true,
    group(ArgGroup::new("axis").required(true).args(["height", "width"]))
)]
struct Cli {
    /// Image file or directory
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Target height in pixels, width follows the aspect ratio
    #[arg(short = 'h', value_name = "PIXELS", value_parser = clap::value_parser!(u32).range(1..))]
    height: Option<u32>,

    /// Target width in pixels, height follows the aspect ratio
    #[arg(short = 'w', value_name = "PIXELS", value_parser = clap::value_parser!(u32).range(1..))]
    width: Option<u32>,

    /// Configuration file path (.toml or .yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of images processed at once (default: CPU count)
    #[arg(short = 'j', long, value_name = "COUNT", env = "BATCHRESIZE_WORKERS",
          value_parser = clap::value_parser!(u64).range(1..))]
    workers: Option<u64>,

    /// When resized images are written
    #[arg(long, value_enum, value_name = "STRATEGY")]
    save: Option<CliSaveStrategy>,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

/// CLI-compatible save strategy enum
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliSaveStrategy {
    /// Each task saves its image as soon as it is resized
    Immediate,
    /// Save everything in one pass after all images were resized
    Deferred,
}

impl From<CliSaveStrategy> for SaveStrategy {
    fn from(strategy: CliSaveStrategy) -> Self {
        match strategy {
            CliSaveStrategy::Immediate => SaveStrategy::Immediate,
            CliSaveStrategy::Deferred => SaveStrategy::Deferred,
        }
    }
}

impl Cli {
    fn resize_spec(&self) -> batchresize::Result<ResizeSpec> {
        match (self.height, self.width) {
            (Some(height), None) => ResizeSpec::height(height),
            (None, Some(width)) => ResizeSpec::width(width),
            _ => Err(batchresize::BatchResizeError::usage("exactly one of -h or -w is required")),
        }
    }

    /// Configuration file merged with command-line overrides
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load configuration {:?}", path))?,
            None => Config::default(),
        };

        if let Some(workers) = self.workers {
            config.processing.workers = Some(usize::try_from(workers)?);
        }
        if let Some(save) = self.save {
            config.processing.save_strategy = save.into();
        }
        if self.quiet {
            config.logging.level = "error".to_string();
        } else if self.verbose {
            config.logging.level = "debug".to_string();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("{}: {:#}", style("Error").red().bold(), e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let spec = cli.resize_spec()?;
    let config = cli.load_config()?;

    init_logging(&config.logging);
    debug!("Effective configuration: {:?}", config);

    let resizer = BatchResizer::new(&config.processing);
    let report = resizer.run(&cli.path, spec).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Print processing summary
fn print_summary(report: &BatchReport) {
    println!();
    println!("{}", style("Processing Summary:").bold());
    println!("  {}: {}", style("Images found").cyan(), report.discovered);
    println!("  {}: {}", style("Saved").green(), report.saved_count());
    if let Some(dir) = &report.output_dir {
        println!("  {}: {}", style("Output").cyan(), dir.display());
    }
    println!("  {}: {:.2}s", style("Duration").blue(), report.processing_time.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_height_flag() {
        let cli = Cli::try_parse_from(["batchresize", "img.jpg", "-h", "300"]).unwrap();
        assert_eq!(cli.resize_spec().unwrap(), ResizeSpec::height(300).unwrap());
    }

    #[test]
    fn test_width_flag() {
        let cli = Cli::try_parse_from(["batchresize", "./dir", "-w", "500"]).unwrap();
        assert_eq!(cli.resize_spec().unwrap(), ResizeSpec::width(500).unwrap());
    }

    #[test]
    fn test_usage_errors() {
        assert!(Cli::try_parse_from(["batchresize", "img.jpg", "-h"]).is_err());
        assert!(Cli::try_parse_from(["batchresize", "img.jpg", "-x", "300"]).is_err());
        assert!(Cli::try_parse_from(["batchresize", "img.jpg", "-h", "abc"]).is_err());
        assert!(Cli::try_parse_from(["batchresize", "img.jpg", "-h", "0"]).is_err());
        assert!(Cli::try_parse_from(["batchresize", "img.jpg"]).is_err());
        assert!(Cli::try_parse_from(["batchresize", "img.jpg", "-h", "3", "-w", "4"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "batchresize", "img.jpg", "-w", "50", "-j", "3", "--save", "immediate", "-v",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.processing.workers, Some(3));
        assert_eq!(config.processing.save_strategy, SaveStrategy::Immediate);
        assert_eq!(config.logging.level, "debug");
    }
}
