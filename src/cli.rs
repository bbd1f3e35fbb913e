use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::api::DEFAULT_BASE_URL;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the scriptures API.
    #[arg(long, global = true, env = "SCRIPMAP_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the view a location hash resolves to.
    View(ViewArgs),
    /// Print the map markers and viewport for a chapter.
    Markers(MarkersArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Json,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Location hash, e.g. `#`, `#2`, `#2:15` or `#0:15:3`.
    #[arg(long, default_value = "")]
    pub hash: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct MarkersArgs {
    #[arg(long)]
    pub book: u32,

    /// Chapter number (0 for books without chapters).
    #[arg(long)]
    pub chapter: u32,

    /// Verse selection passed through to the chapter endpoint.
    #[arg(long)]
    pub verses: Option<String>,

    /// Request the JST rendition of the chapter.
    #[arg(long)]
    pub jst: bool,
}
