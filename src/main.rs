use artfolio::imaging::{self, ImageBackend, metadata};
use artfolio::settings::{MemorySettings, SettingsStore, TomlFileSettings};
use artfolio::storage::StorageLayout;
use artfolio::upload::{PipelineOptions, UploadPipeline, UploadStatus, UploadedFile};
use artfolio::{config, output, render};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "artfolio")]
#[command(about = "Image upload pipeline for artist portfolios")]
#[command(long_about = "\
Image upload pipeline for artist portfolios

Turns an uploaded image into a normalized artifact set under the public root:

  public/
  ├── uploads/                 # Main image, capped at images.max_width
  │   ├── thumbs/              # Thumbnail derived from the main image
  │   └── webp/                # WebP variant (when the backend can encode it)

Every upload is content-sniffed (JPEG, PNG, WebP only), auto-oriented,
stripped of EXIF/XMP/IPTC metadata and stored under a fresh random name.
Either the whole set is written or nothing is.

Run 'artfolio gen-config' to generate a documented config.toml.
Set RUST_LOG=debug for detailed logs.")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Public root; overrides storage.root from config.toml
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process an uploaded image into an artifact set
    Process {
        /// The uploaded file
        file: PathBuf,
        /// Client-supplied filename (advisory only)
        #[arg(long)]
        name: Option<String>,
        /// Client-supplied MIME type (advisory only)
        #[arg(long)]
        mime: Option<String>,
        /// Flat TOML settings file (max_upload_size, ...)
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Upload limit in MB (1-50); takes precedence over --settings
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=50))]
        max_upload_mb: Option<u32>,
        /// Print the artifact set as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Delete an artifact set (paths relative to the public root)
    Delete {
        original: String,
        thumbnail: String,
        webp: Option<String>,
    },
    /// Show the detected format, size and embedded metadata of an image
    Inspect { file: PathBuf },
    /// Show which image backend would be used and what it can encode
    Backend,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let load = || -> Result<(config::PipelineConfig, StorageLayout), config::ConfigError> {
        let config = config::load_config(&cli.config_dir)?;
        let mut layout = StorageLayout::from_config(&config.storage);
        if let Some(root) = &cli.root {
            layout = layout.with_root(root.clone());
        }
        Ok((config, layout))
    };

    match &cli.command {
        Command::Process {
            file,
            name,
            mime,
            settings,
            max_upload_mb,
            json,
        } => {
            let (config, layout) = load()?;
            let mut store: Box<dyn SettingsStore> = match settings {
                Some(path) => Box::new(TomlFileSettings::load(path)?),
                None => Box::new(MemorySettings::new()),
            };
            if let Some(mb) = max_upload_mb {
                store = Box::new(MemorySettings::new().with(
                    artfolio::settings::MAX_UPLOAD_SIZE_KEY,
                    &mb.to_string(),
                ));
            }
            let options = PipelineOptions::resolve(&config, store.as_ref());
            let backend = imaging::select_backend(config.backend.kind);
            let pipeline = UploadPipeline::new(backend.as_ref(), layout, options);

            let upload = uploaded_file(file, name.clone(), mime.clone());
            match pipeline.process_upload(&upload) {
                Ok(set) if *json => {
                    println!("{}", serde_json::to_string_pretty(&set)?);
                }
                Ok(set) => {
                    let alt = upload.declared_name.as_deref().unwrap_or("");
                    output::print_artifact_set(&set, &render::picture(&set, alt).into_string());
                }
                Err(e) => {
                    output::print_upload_error(&e);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Delete {
            original,
            thumbnail,
            webp,
        } => {
            let (_, layout) = load()?;
            let all_deleted = layout.delete_artifacts(original, thumbnail, webp.as_deref());
            output::print_delete_result(original, thumbnail, webp.as_deref(), all_deleted);
            if !all_deleted {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Inspect { file } => {
            let bytes = std::fs::read(file)?;
            let format = imaging::sniff_format(&bytes);
            let size = match &format {
                Ok(_) => imaging::RustBackend::new()
                    .decode(&bytes)
                    .map(|decoded| decoded.dimensions())
                    .ok(),
                Err(_) => None,
            };
            let blocks = metadata::scan_metadata(&bytes);
            output::print_inspection(&display_name(file), &format, size, &blocks);
        }
        Command::Backend => {
            let (config, _) = load()?;
            let backend = imaging::select_backend(config.backend.kind);
            output::print_backend(config.backend.kind, &backend.capabilities());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Describe a local file the way the web layer describes an upload.
///
/// A missing file still yields an upload record; the pipeline reports it as
/// "no file" with the user-facing message.
fn uploaded_file(path: &Path, name: Option<String>, mime: Option<String>) -> UploadedFile {
    let mut upload = UploadedFile::from_path(path).unwrap_or_else(|_| UploadedFile {
        source_path: path.to_path_buf(),
        declared_name: None,
        declared_mime: None,
        declared_size: 0,
        status: UploadStatus::Complete,
    });
    if name.is_some() {
        upload.declared_name = name;
    }
    upload.declared_mime = mime.or(upload.declared_mime);
    upload
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
