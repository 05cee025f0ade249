//! Ears Codec CLI
//!
//! Inspects and edits the feature data and Alfalfa side-channel store of raw
//! 64x64 skin dumps (16384 bytes of big-endian ARGB words).

use clap::{Parser, Subcommand};
use ears_codec::{
    config::{ConfigError, FileConfig},
    Alfalfa, AlfalfaError, EarsFeatures, FeatureFormat, ImageError, Texture,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(version = ears_codec::VERSION, about = "Inspect and edit Ears skin data")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the decoded features and Alfalfa entries as TOML
    Inspect {
        /// Raw ARGB texture dump
        texture: PathBuf,
    },
    /// Add or replace one Alfalfa entry
    Embed {
        /// Raw ARGB texture dump
        texture: PathBuf,
        /// Entry key
        #[arg(short, long)]
        key: String,
        /// File holding the entry value
        #[arg(short, long)]
        value: PathBuf,
        /// Output path (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove all embedded Alfalfa data
    Strip {
        /// Raw ARGB texture dump
        texture: PathBuf,
        /// Output path (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the framed Alfalfa wire payload as hex
    DumpAlfalfa {
        /// Raw ARGB texture dump
        texture: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Alfalfa(#[from] AlfalfaError),
    #[error("failed to render report: {0}")]
    Report(#[from] toml::ser::Error),
}

#[derive(Serialize)]
struct Report {
    /// Format of the feature block, absent when none was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<FeatureFormat>,
    features: EarsFeatures,
    alfalfa: AlfalfaReport,
}

#[derive(Serialize)]
struct AlfalfaReport {
    version: u8,
    entries: Vec<EntryReport>,
}

#[derive(Serialize)]
struct EntryReport {
    key: String,
    len: usize,
    blake3: String,
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => FileConfig::default(),
    };

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!("Ears codec v{}", ears_codec::VERSION);

    if let Err(e) = run(cli.command, &config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command, config: &FileConfig) -> Result<(), CliError> {
    match command {
        Command::Inspect { texture } => {
            let skin = load(&texture)?;
            println!("{}", inspect(&skin, config)?);
        }
        Command::Embed {
            texture,
            key,
            value,
            output,
        } => {
            let mut skin = load(&texture)?;
            let bytes = std::fs::read(&value).map_err(|source| CliError::Io {
                path: value.clone(),
                source,
            })?;
            let len = bytes.len();
            let alfalfa = Alfalfa::read(&skin).with_entry(key.clone(), bytes);
            alfalfa.write(&mut skin)?;
            let out = output.unwrap_or(texture);
            save(&out, &skin)?;
            info!(key = %key, bytes = len, path = %out.display(), "Embedded Alfalfa entry");
        }
        Command::Strip { texture, output } => {
            let mut skin = load(&texture)?;
            let before = Alfalfa::read(&skin);
            Alfalfa::NONE.write(&mut skin)?;
            let out = output.unwrap_or(texture);
            save(&out, &skin)?;
            info!(
                entries = before.data().len(),
                path = %out.display(),
                "Stripped Alfalfa data"
            );
        }
        Command::DumpAlfalfa { texture } => {
            let skin = load(&texture)?;
            let payload = Alfalfa::read(&skin).encode()?;
            if payload.is_empty() {
                info!("No Alfalfa data present");
                return Ok(());
            }
            let mut framed = Vec::with_capacity(payload.len() + 1);
            framed.push(config.encode.format_byte);
            framed.extend_from_slice(&payload);
            println!("{}", to_hex(&framed));
        }
    }
    Ok(())
}

fn inspect(skin: &Texture, config: &FileConfig) -> Result<String, CliError> {
    let format = config
        .decode
        .format
        .forced()
        .or_else(|| FeatureFormat::detect(skin));
    let alfalfa = Alfalfa::read(skin);
    let entries = alfalfa
        .data()
        .iter()
        .map(|(key, value)| EntryReport {
            key: key.clone(),
            len: value.len(),
            blake3: blake3::hash(value.as_bytes()).to_hex().to_string(),
        })
        .collect();
    let report = AlfalfaReport {
        version: alfalfa.version(),
        entries,
    };
    let features = match format {
        Some(format) => EarsFeatures::parse_with(skin, format, alfalfa),
        None => EarsFeatures::DISABLED,
    };

    Ok(toml::to_string(&Report {
        format,
        features,
        alfalfa: report,
    })?)
}

fn load(path: &Path) -> Result<Texture, CliError> {
    let data = std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Texture::from_argb_bytes(&data)?)
}

fn save(path: &Path, skin: &Texture) -> Result<(), CliError> {
    std::fs::write(path, skin.to_argb_bytes()).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
