use crate::core::prompt::Locale;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "place-constraints")]
#[command(about = "Extract place constraints from travel requests and merge them with default places")]
pub struct CliConfig {
    /// Default places: JSON array, {"place_constraints": [...]} object, or CSV
    #[arg(short, long)]
    pub defaults: Option<PathBuf>,

    /// User request text; read from stdin when omitted
    #[arg(short, long)]
    pub input: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the instruction locale from config (ja or en)
    #[arg(long)]
    pub locale: Option<Locale>,

    /// Return the default places when the AI service call fails
    #[arg(long)]
    pub fallback_on_service_error: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}
