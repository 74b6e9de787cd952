use clap::{Parser, Subcommand};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use towerdoc::server::{AppState, router};
use towerdoc::store::parse_record;
use towerdoc::{CompositorBuilder, JsonDirectoryStore, PageSize, ReportError, batch};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "towerdoc", about = "Tower inspection report compositor")]
struct Cli {
    /// JSON compositor configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory images and redline documents are loaded from.
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Overrides the configured paper size.
    #[arg(long, global = true, value_parser = parse_page_size)]
    page_size: Option<PageSize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one record file.
    Render {
        record: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Single pass, no table-of-contents capture.
        #[arg(long)]
        preview: bool,
    },
    /// Render every record in a directory in parallel.
    Batch {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Serve reports over HTTP.
    Serve {
        #[arg(long)]
        store: PathBuf,
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
}

fn parse_page_size(value: &str) -> Result<PageSize, String> {
    match value.to_ascii_lowercase().as_str() {
        "a4" => Ok(PageSize::A4),
        "letter" => Ok(PageSize::Letter),
        other => Err(format!("unknown page size '{other}' (expected a4 or letter)")),
    }
}

fn main() -> Result<(), ReportError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut builder = CompositorBuilder::new();
    if let Some(config) = &cli.config {
        builder = builder.with_config_file(config)?;
    }
    if let Some(assets) = &cli.assets {
        builder = builder.with_asset_dir(assets)?;
    }
    if let Some(page_size) = cli.page_size {
        builder = builder.with_page_size(page_size);
    }
    let compositor = builder.build()?;

    match cli.command {
        Command::Render {
            record,
            output,
            preview,
        } => {
            let id = record_id(&record);
            let record = parse_record(&id, &fs::read_to_string(&record)?)?;
            let rendered = if preview {
                compositor.preview_record(&record)?
            } else {
                compositor.compose_record(&record)?
            };
            fs::write(&output, &rendered.pdf)?;
            log::info!(
                "Wrote {} ({} pages, reported {}).",
                output.display(),
                rendered.page_count,
                rendered.reported_page_count
            );
        }
        Command::Batch { input, output } => {
            let summary = batch::render_directory(&compositor, &input, &output)?;
            if !summary.is_success() {
                return Err(ReportError::Internal(format!(
                    "{} of {} records failed",
                    summary.failed.len(),
                    summary.failed.len() + summary.rendered.len()
                )));
            }
        }
        Command::Serve { store, bind } => {
            let state = AppState::new(Arc::new(compositor), Arc::new(JsonDirectoryStore::new(store)));
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind(bind).await?;
                log::info!("Listening on {}", bind);
                axum::serve(listener, router(state)).await
            })?;
        }
    }
    Ok(())
}

fn record_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}
