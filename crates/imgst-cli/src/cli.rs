use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use imgst_types::Resolution;

#[derive(Parser)]
#[command(
    name = "imgstore",
    about = "ImgStore: a single-file JPEG store with deduplication and cached resolutions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the header and every live image
    List(StoreArgs),
    /// Create a new, empty store
    Create(CreateArgs),
    /// Export one image at a resolution to a .jpg file
    Read(ReadArgs),
    /// Add a JPEG file under an identifier
    Insert(InsertArgs),
    /// Remove an image
    Delete(DeleteArgs),
    /// Compact the store, dropping deleted images and orphaned bytes
    Gc(StoreArgs),
}

#[derive(Args)]
pub struct StoreArgs {
    pub store: PathBuf,
}

#[derive(Args)]
pub struct CreateArgs {
    pub store: PathBuf,
    /// Maximum number of images
    #[arg(long)]
    pub max_files: Option<u32>,
    /// Thumbnail bounding box
    #[arg(long, num_args = 2, value_names = ["W", "H"])]
    pub thumb_res: Option<Vec<u16>>,
    /// Small-resolution bounding box
    #[arg(long, num_args = 2, value_names = ["W", "H"])]
    pub small_res: Option<Vec<u16>>,
    /// TOML file with defaults; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReadArgs {
    pub store: PathBuf,
    pub id: String,
    /// thumb, small, or orig
    #[arg(default_value = "orig")]
    pub resolution: Resolution,
    /// Directory to write into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct InsertArgs {
    pub store: PathBuf,
    pub id: String,
    pub file: PathBuf,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub store: PathBuf,
    pub id: String,
}
