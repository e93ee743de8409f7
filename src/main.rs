//! masecret - mask secret information in images using OCR
//!
//! Recognizes the characters in each input image, finds the text matching
//! the configured regular expressions and paints opaque rectangles over it.

mod analysis;
mod app;
mod config;
mod error;
mod mask;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::analysis::{load_secret_patterns, SecretLocator, SecretPattern};
use crate::app::MaskJob;
use crate::config::AppConfig;
use crate::error::MaskError;
use crate::vision::TesseractOcr;

/// Environment variable enabling per-character debug output
const DEBUG_ENV: &str = "DEBUG";

/// masecret - mask secret information in images using OCR
#[derive(Parser, Debug)]
#[command(name = "masecret", version)]
#[command(about = "Mask secret text in screenshots with opaque rectangles")]
struct Args {
    /// Images to process
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Output file, or directory when several inputs are given
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Overwrite the input images
    #[arg(short, long)]
    in_place: bool,

    /// A single secret regular expression
    #[arg(short, long, value_name = "REGEX")]
    regex: Option<String>,

    /// File with one secret regular expression per line
    #[arg(short, long, value_name = "FILE")]
    secrets: Option<PathBuf>,

    /// OCR language(s), e.g. "eng+jpn"
    #[arg(short, long, value_name = "LANG")]
    lang: Option<String>,

    /// Fill color as #RRGGBB or R,G,B
    #[arg(short, long, value_name = "COLOR")]
    color: Option<String>,

    /// Pixels added around each secret
    #[arg(short, long, value_name = "PIXELS",
          value_parser = clap::value_parser!(u32).range(..=i64::from(i32::MAX)))]
    padding: Option<u32>,

    /// Only run OCR inside X,Y,WIDTH,HEIGHT
    #[arg(long, value_name = "REGION", value_parser = parse_crop)]
    crop: Option<(u32, u32, u32, u32)>,

    /// Comma separated Tesseract configs, replacing the defaults
    #[arg(long, value_name = "CONFIGS", value_delimiter = ',')]
    tesseract_configs: Option<Vec<String>>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the effective settings to the configuration file before masking
    #[arg(long)]
    save_config: bool,
}

fn parse_crop(value: &str) -> Result<(u32, u32, u32, u32), MaskError> {
    config::parse_region(value)
}

/// Mistakes in how the command was invoked
#[derive(Debug, Error, PartialEq, Eq)]
enum UsageError {
    #[error("-r/--regex and -s/--secrets cannot be used together.")]
    RegexAndSecrets,
    #[error("-i/--in-place and -o/--output cannot be used together.")]
    InPlaceAndOutput,
    #[error("Either -o/--output or -i/--in-place is required.")]
    NoOutput,
    #[error("OUTPUT must be a directory when there are multiple INPUTs.")]
    MultipleInputsNeedDirectory,
}

impl Args {
    /// Check flag combinations clap cannot express
    fn validate(&self) -> Result<(), UsageError> {
        if self.regex.is_some() && self.secrets.is_some() {
            return Err(UsageError::RegexAndSecrets);
        }
        match (&self.output, self.in_place) {
            (Some(_), true) => Err(UsageError::InPlaceAndOutput),
            (None, false) => Err(UsageError::NoOutput),
            (Some(output), false) if self.inputs.len() >= 2 && !output.is_dir() => {
                Err(UsageError::MultipleInputsNeedDirectory)
            }
            _ => Ok(()),
        }
    }

    /// Output path for `input`
    fn output_for(&self, input: &Path) -> Result<PathBuf> {
        match &self.output {
            Some(output) => storage::resolve_output_path(input, output),
            None => Ok(input.to_path_buf()),
        }
    }

    /// Secret patterns from `-r`, or else from the configured secrets file
    ///
    /// No patterns at all is allowed; every image is then saved unchanged.
    fn secret_patterns(&self, config: &AppConfig) -> Result<Vec<SecretPattern>> {
        let patterns = match &self.regex {
            Some(regex) => vec![SecretPattern::new(regex)
                .map_err(|source| MaskError::InvalidPattern { line: 1, source })?],
            None => load_secret_patterns(&config.mask.secrets_file)?,
        };
        if patterns.is_empty() {
            warn!("No secret patterns given; images will be saved unchanged");
        }
        Ok(patterns)
    }

    /// Fold command line overrides into the loaded configuration
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(lang) = &self.lang {
            config.ocr.language = lang.clone();
        }
        if let Some(configs) = &self.tesseract_configs {
            config.ocr.tesseract_configs = configs.clone();
        }
        if self.crop.is_some() {
            config.ocr.crop = self.crop;
        }
        if let Some(color) = &self.color {
            config.mask.color = color.clone();
        }
        if let Some(padding) = self.padding {
            config.mask.padding = padding;
        }
        if let Some(secrets) = &self.secrets {
            config.mask.secrets_file = secrets.clone();
        }
    }
}

fn main() -> ExitCode {
    let debug = std::env::var_os(DEBUG_ENV).is_some();
    if let Err(e) = init_logging(debug) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    if let Err(usage) = args.validate() {
        eprintln!("{usage}");
        return ExitCode::from(1);
    }

    match run(&args, debug) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging to stderr; `RUST_LOG` takes precedence over the default level
fn init_logging(debug: bool) -> Result<()> {
    let level = if debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(args: &Args, debug: bool) -> Result<()> {
    // --save-config may name a file that does not exist yet
    let creating = args.save_config && args.config.as_ref().is_some_and(|p| !p.exists());
    let mut config = if creating {
        AppConfig::default()
    } else {
        load_or_default_config(args.config.as_deref())?
    };
    args.apply_to(&mut config);

    // Everything the user supplied is checked before the first image is touched
    let color = config.mask.rgb()?;
    let patterns = args.secret_patterns(&config)?;

    if args.save_config {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => storage::default_config_path()?,
        };
        save_config_file(&config, &path)?;
    }

    let engine = TesseractOcr::new(config.ocr.tesseract_cmd.clone());
    let locator = SecretLocator::new(patterns, config.mask.padding);
    info!("Loaded {} secret pattern(s)", locator.patterns().len());
    let job = MaskJob {
        engine: &engine,
        locator: &locator,
        ocr: &config.ocr,
        color,
        debug,
    };

    let mut total = 0;
    for input in &args.inputs {
        let output = args.output_for(input)?;
        total += job.mask_secrets(input, &output)?;
    }

    info!("Masked {} secrets in {} image(s)", total, args.inputs.len());
    Ok(())
}

/// Load the configuration file
///
/// An explicitly requested file must load; a missing default file means defaults.
fn load_or_default_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(path) = storage::default_config_path() {
        if path.exists() {
            let config = config::load_config(&path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            info!("Loaded configuration from {:?}", path);
            return Ok(config);
        }
    }

    Ok(AppConfig::default())
}

/// Write `config` to `path`, creating its directory when needed
fn save_config_file(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    config::save_config(config, path)
        .with_context(|| format!("failed to save configuration to {}", path.display()))?;
    info!("Saved configuration to {:?}", path);
    Ok(())
}
