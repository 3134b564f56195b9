use crate::core::extractor::ConstraintExtractor;
use crate::core::merger::{merge, merge_entries};
use crate::domain::model::{ConstraintSet, ExtractionPayload, PlaceConstraint};
use crate::domain::ports::TextService;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to do when the service call itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorPolicy {
    #[default]
    Propagate,
    FallbackToDefaults,
}

impl FromStr for ServiceErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "propagate" => Ok(Self::Propagate),
            "fallback_to_defaults" => Ok(Self::FallbackToDefaults),
            _ => Err(format!(
                "unknown service error policy: {} (use propagate or fallback_to_defaults)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    Parsed { accepted: usize, rejected: usize },
    ParseFailed { raw_output: String },
    ServiceFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub constraints: ConstraintSet,
    pub status: ExtractionStatus,
}

impl MergeReport {
    /// True when the set is defaults-only because extraction did not succeed.
    pub fn is_degraded(&self) -> bool {
        !matches!(self.status, ExtractionStatus::Parsed { .. })
    }
}

/// Extract-then-merge for one request.
pub struct ConstraintPipeline<S: TextService> {
    extractor: ConstraintExtractor<S>,
    on_service_error: ServiceErrorPolicy,
}

impl<S: TextService> ConstraintPipeline<S> {
    pub fn new(extractor: ConstraintExtractor<S>, on_service_error: ServiceErrorPolicy) -> Self {
        Self {
            extractor,
            on_service_error,
        }
    }

    pub async fn run(&self, defaults: &[PlaceConstraint], user_text: &str) -> Result<MergeReport> {
        tracing::info!("🚀 Starting constraint pipeline with {} default places", defaults.len());

        let extracted = match self
            .extractor
            .extract_with_defaults(user_text, defaults)
            .await
        {
            Ok(payload) => payload,
            Err(e) if e.category() == crate::utils::error::ErrorCategory::Service => {
                match self.on_service_error {
                    ServiceErrorPolicy::Propagate => return Err(e),
                    ServiceErrorPolicy::FallbackToDefaults => {
                        tracing::warn!("❌ Extraction failed, falling back to defaults: {}", e);
                        return Ok(MergeReport {
                            constraints: merge_entries(defaults, &[]),
                            status: ExtractionStatus::ServiceFailed {
                                message: e.to_string(),
                            },
                        });
                    }
                }
            }
            Err(e) => return Err(e),
        };

        let status = match &extracted {
            ExtractionPayload::Parsed {
                place_constraints,
                rejected,
            } => ExtractionStatus::Parsed {
                accepted: place_constraints.len(),
                rejected: rejected.len(),
            },
            ExtractionPayload::Failed(failure) => ExtractionStatus::ParseFailed {
                raw_output: failure.raw_output.clone(),
            },
        };

        let constraints = merge(defaults, &extracted);
        tracing::info!("✅ Pipeline produced {} constraints", constraints.len());

        Ok(MergeReport {
            constraints,
            status,
        })
    }
}
