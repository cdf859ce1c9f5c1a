use clap::{Parser, Subcommand};
use imgvault::config::{self, ServiceConfig};
use imgvault::lookup::{self, LookupError};
use imgvault::naming::FixedClock;
use imgvault::request::{self, CompressSpec, RequestError};
use imgvault::store::DirectoryStore;
use imgvault::{UploadError, Uploader, output};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "imgvault")]
#[command(about = "Upload images and store resized variants")]
#[command(long_about = "\
Upload images and store resized variants

Each upload stores the original file unchanged plus one resized copy per
requested size, all keyed by the original filename and one timestamp:

  photo.jpg with --size 800x600 --size 400x300
    photo_1234567890.jpg
    photo_800x600_1234567890.jpg
    photo_400x300_1234567890.jpg

Variants keep the input format (JPEG or PNG). A variant that fails is left
out of the result; the upload still succeeds.

Exit codes: 0 success, 1 storage failure, 2 bad input or unknown key.

Run 'imgvault gen-config' to generate a documented imgvault.toml.")]
#[command(version)]
struct Cli {
    /// Config file; stock defaults apply when it does not exist
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Object store directory (overrides storage.root)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct UploadArgs {
    /// JPEG or PNG file to upload
    file: PathBuf,

    /// Variant sizes as JSON: '[{"width":800,"height":600}]'
    #[arg(long)]
    sizes: Option<String>,

    /// Variant size as WIDTHxHEIGHT (repeatable)
    #[arg(long = "size", value_name = "WxH")]
    size: Vec<CompressSpec>,

    /// Filename to key the upload by (defaults to the file's name)
    #[arg(long)]
    name: Option<String>,

    /// Fixed timestamp in nanoseconds, for reproducible keys
    #[arg(long)]
    timestamp: Option<u128>,
}

#[derive(Subcommand)]
enum Command {
    /// Upload an image and store its resized variants
    Upload(UploadArgs),
    /// Show the URL, size, and recorded type of a stored key
    Get {
        key: String,
    },
    /// List every stored key
    List,
    /// Print a stock imgvault.toml with all options documented
    GenConfig,
}

/// Client-side faults exit with 2, server-side with 1.
const EXIT_SERVER_ERROR: u8 = 1;
const EXIT_CLIENT_ERROR: u8 = 2;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg);

    let root = cli
        .store
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.storage.root));
    let store = DirectoryStore::open(root, cfg.public_url())?;

    match cli.command {
        Command::Upload(args) => run_upload(store, &cfg, args),
        Command::Get { key } => match lookup::image_details(&store, &key) {
            Ok(details) => {
                output::print_image_info(&details);
                Ok(ExitCode::SUCCESS)
            }
            Err(e @ LookupError::NotFound(_)) => Ok(fail(e, EXIT_CLIENT_ERROR)),
            Err(e) => Ok(fail(e, EXIT_SERVER_ERROR)),
        },
        Command::List => {
            let keys = lookup::list_images(&store)?;
            output::print_key_list(&keys);
            Ok(ExitCode::SUCCESS)
        }
        Command::GenConfig => Ok(ExitCode::SUCCESS),
    }
}

fn run_upload(
    store: DirectoryStore,
    cfg: &ServiceConfig,
    args: UploadArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (filename, bytes, specs) = match read_request(cfg, &args) {
        Ok(request) => request,
        Err(e) => return Ok(fail(e, EXIT_CLIENT_ERROR)),
    };

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_upload_event(&event);
        }
    });

    let result = {
        let uploader = Uploader::new(store)
            .with_options(cfg.upload_options())
            .with_events(tx);
        let uploader = match args.timestamp {
            Some(ts) => uploader.with_clock(FixedClock(ts)),
            None => uploader,
        };
        uploader.process(&bytes, &filename, &specs)
    };
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;

    match result {
        Ok(result) => {
            println!("{}", output::format_upload_result(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(fail(&e, exit_code_for(&e))),
    }
}

/// Validate the request and read the upload into memory.
fn read_request(
    cfg: &ServiceConfig,
    args: &UploadArgs,
) -> Result<(String, Vec<u8>, Vec<CompressSpec>), Box<dyn std::error::Error>> {
    let filename = match &args.name {
        Some(name) => name.clone(),
        None => file_name_of(&args.file)?,
    };
    request::check_extension(&filename)?;
    let specs = request::combine_specs(args.sizes.as_deref(), &args.size)?;
    request::check_size(
        std::fs::metadata(&args.file)?.len(),
        cfg.limits.max_upload_bytes,
    )?;
    let bytes = std::fs::read(&args.file)?;
    Ok((filename, bytes, specs))
}

fn file_name_of(path: &Path) -> Result<String, RequestError> {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .ok_or_else(|| RequestError::UnsupportedExtension(path.display().to_string()))
}

fn exit_code_for(err: &UploadError) -> u8 {
    if err.is_client_error() {
        EXIT_CLIENT_ERROR
    } else {
        EXIT_SERVER_ERROR
    }
}

fn fail(err: impl Display, code: u8) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(code)
}

/// Log to stderr. `RUST_LOG` wins over the configured filter.
fn init_tracing(cfg: &ServiceConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
