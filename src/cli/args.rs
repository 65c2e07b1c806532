//! Command-line interface definitions.

use crate::core::ModeArg;
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// assetpipe asset build pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: assetpipe.toml)
    #[arg(short = 'C', long, global = true, default_value = "assetpipe.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Build mode; defaults to ASSETPIPE_ENV (or NODE_ENV), `development` enables watching
    #[arg(short, long, global = true, value_enum)]
    pub mode: Option<ModeArg>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Compile CSS entry modules (and watch in development)
    Css,

    /// Bundle JS entry modules (and watch in development)
    Js,

    /// Write content-hashed `manifest.json` for built assets
    #[command(visible_alias = "m")]
    Manifest,

    /// Check built asset sizes against configured limits
    #[command(visible_alias = "s")]
    Size {
        /// Exit with an error when any file is over its limit
        #[arg(long)]
        strict: bool,
    },

    /// Run CSS and JS tasks together; production also writes the manifest and checks sizes
    #[command(visible_alias = "b")]
    Build,
}

impl Commands {
    pub fn uses_css(&self) -> bool {
        matches!(self, Self::Css | Self::Build)
    }

    pub fn uses_js(&self) -> bool {
        matches!(self, Self::Js | Self::Build)
    }

    pub fn uses_manifest(&self) -> bool {
        matches!(self, Self::Manifest | Self::Build)
    }

    pub fn uses_size(&self) -> bool {
        matches!(self, Self::Size { .. } | Self::Build)
    }
}
