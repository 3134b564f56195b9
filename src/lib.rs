pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{load_default_places, OpenAiService};
pub use config::AppConfig;
pub use crate::core::extractor::{parse_reply, ConstraintExtractor};
pub use crate::core::merger::{merge, merge_constraints};
pub use crate::core::pipeline::{
    ConstraintPipeline, ExtractionStatus, MergeReport, ServiceErrorPolicy,
};
pub use crate::core::prompt::Locale;
pub use domain::model::{
    ConstraintSet, ErrorPayload, ExtractionPayload, PlaceConstraint, PlaceType, TimePreference,
};
pub use domain::ports::TextService;
pub use utils::error::{ConstraintError, Result};
