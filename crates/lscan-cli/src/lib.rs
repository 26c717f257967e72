//! Shared CLI definitions for lscan.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Which chart the console shows.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Real part of L(r+it) for the selected character
    Real,
    /// Real and imaginary parts of L(r+it) for the selected character
    Complex,
    /// log|L(1/2+it)| for every character mod q on one chart
    Overlay,
    /// One small chart per character mod q
    Grid,
    /// Selberg central limit histogram for the selected character
    Clt,
}

impl ViewMode {
    pub const ALL: [Self; 5] = [
        Self::Real,
        Self::Complex,
        Self::Overlay,
        Self::Grid,
        Self::Clt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Complex => "complex",
            Self::Overlay => "overlay",
            Self::Grid => "grid",
            Self::Clt => "clt",
        }
    }

    /// Parse a view name as written in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name.trim()))
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// File format for chart export.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    /// Raster image
    Png,
    /// Vector image
    Svg,
    /// The chart description as JSON
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Json => "json",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Command-line arguments for lscan
#[derive(Clone, Parser, Debug, Default)]
#[command(
    name = "lscan",
    version,
    about = "Dirichlet L-function scans on the critical line, in the terminal",
    long_about = "Interactive console for a numeric L-function backend. Pick a modulus q, \
                  a character mod q and a range of t; lscan fetches samples of L(r+it) \
                  and charts them. Click a chart to zoom in 4x around the nearest point."
)]
pub struct Args {
    /// Base URL of the numeric backend (overrides config [backend] url)
    #[arg(long = "backend-url", value_name = "URL")]
    pub backend_url: Option<String>,

    /// Modulus q (values below 1 are treated as 1)
    #[arg(short = 'q', long = "modulus", value_name = "Q")]
    pub modulus: Option<u64>,

    /// 1-based index of the character in the list of residues coprime to q
    #[arg(short = 'c', long = "character", value_name = "IDX")]
    pub character: Option<usize>,

    /// Start of the scan range in t
    #[arg(long = "start", value_name = "T", allow_negative_numbers = true)]
    pub start: Option<f64>,

    /// End of the scan range in t
    #[arg(long = "end", value_name = "T", allow_negative_numbers = true)]
    pub end: Option<f64>,

    /// Real part r of s = r + it for the single-character views
    #[arg(long = "real-part", value_name = "R", allow_negative_numbers = true)]
    pub real_part: Option<f64>,

    /// Initial view
    #[arg(long = "view", value_enum)]
    pub view: Option<ViewMode>,

    /// Lower bound of t for central limit sampling
    #[arg(long = "clt-start", value_name = "T")]
    pub clt_start: Option<f64>,

    /// Upper bound of t for central limit sampling
    #[arg(long = "clt-end", value_name = "T")]
    pub clt_end: Option<f64>,

    /// Number of samples for central limit sampling
    #[arg(long = "samples", value_name = "N")]
    pub samples: Option<usize>,

    /// Format used by the export key (png, svg, json)
    #[arg(long = "export-format", value_enum)]
    pub export_format: Option<ExportFormat>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Write the log here instead of the cache directory
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Clear all cache data and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/lscan/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let mut parts = Vec::new();
        if let Some(s) = arg.get_short() {
            parts.push(format!("-{s}"));
        }
        if let Some(l) = arg.get_long() {
            parts.push(format!("--{l}"));
        }
        let mut option_str = parts.join(", ");
        if arg.get_action().takes_values() {
            if let Some(names) = arg.get_value_names() {
                let placeholder = names
                    .iter()
                    .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                    .collect::<Vec<_>>()
                    .join(" ");
                option_str = format!("{option_str} {placeholder}");
            }
        }

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
