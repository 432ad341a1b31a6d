use std::path::PathBuf;

use phantom2d::config::demo::Config;
use phantom2d::io::Format;

/// Command line interface for `phantom2d-demo` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "phantom2d-demo",
    about = "Analytical phantom, corrupted sinogram, and four reconstructions",
)]
pub (super) struct Cli {
    /// TOML configuration; without it the full demo run is performed
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Model number in the phantom library
    #[clap(short, long)]
    pub model: Option<u32>,

    /// Side of the square image, in pixels
    #[clap(short, long)]
    pub size: Option<usize>,

    /// Phantom library file, instead of the built-in one
    #[clap(short, long)]
    pub library: Option<PathBuf>,

    /// Seed for the artifact generator
    #[clap(long)]
    pub seed: Option<u64>,

    /// Directory for output arrays and report
    #[clap(short, long, default_value = "phantom2d-out")]
    pub out: PathBuf,

    /// Output array format: npy or raw
    #[clap(short, long, default_value = "npy", value_parser = parse_format)]
    pub format: Format,

    /// Maximum number of rayon threads
    #[clap(short = 'j', long)]
    pub threads: Option<usize>,

    /// More logging: -v for debug, -vv for trace. RUST_LOG takes precedence
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_format(s: &str) -> Result<Format, String> {
    s.parse().map_err(|e: phantom2d::Error| e.to_string())
}

impl Cli {
    /// Flags given on the command line take precedence over the config file
    pub (super) fn apply(&self, config: &mut Config) {
        if let Some(model)   = self.model           { config.model   = model; }
        if let Some(size)    = self.size            { config.size    = size; }
        if let Some(library) = self.library.clone() { config.library = Some(library); }
        if let Some(seed)    = self.seed            { config.seed    = Some(seed); }
    }
}
