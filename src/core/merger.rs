use crate::core::extractor::parse_constraints_value;
use crate::domain::model::{ConstraintSet, ExtractionPayload, PlaceConstraint};
use crate::utils::error::Result;
use serde_json::Value;
use std::collections::HashMap;

/// Merge extracted constraints into a copy of `defaults`, keyed by `place`.
///
/// Existing places only take a specified `time_preference` and non-empty `notes`
/// from the extracted entry; `type` stays as the default had it. New places are
/// appended in extraction order. A failed extraction contributes nothing.
pub fn merge(defaults: &[PlaceConstraint], extracted: &ExtractionPayload) -> ConstraintSet {
    merge_entries(defaults, extracted.constraints())
}

pub fn merge_entries(defaults: &[PlaceConstraint], extracted: &[PlaceConstraint]) -> ConstraintSet {
    let mut merged: Vec<PlaceConstraint> = Vec::with_capacity(defaults.len() + extracted.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(defaults.len() + extracted.len());

    for default in defaults {
        match index.get(&default.place) {
            Some(&i) => {
                tracing::warn!("Duplicate default place {:?}, keeping the later one", default.place);
                merged[i] = default.clone();
            }
            None => {
                index.insert(default.place.clone(), merged.len());
                merged.push(default.clone());
            }
        }
    }

    for c in extracted {
        match index.get(&c.place) {
            Some(&i) => {
                let existing = &mut merged[i];
                if c.time_preference.is_specified() {
                    existing.time_preference = c.time_preference;
                }
                if !c.notes.is_empty() {
                    existing.notes = c.notes.clone();
                }
            }
            None => {
                index.insert(c.place.clone(), merged.len());
                merged.push(c.clone());
            }
        }
    }

    tracing::debug!(
        "Merged {} defaults with {} extracted constraints into {}",
        defaults.len(),
        extracted.len(),
        merged.len()
    );
    ConstraintSet::from_unique(merged)
}

/// JSON-shaped entry point. `ai_constraints` is whatever the extractor returned;
/// an `{error, raw_output}` payload or an unshaped value leaves the defaults as they are.
pub fn merge_constraints(default_places: &[PlaceConstraint], ai_constraints: &Value) -> Result<Value> {
    let extracted = parse_constraints_value(ai_constraints.clone());
    if let ExtractionPayload::Failed(failure) = &extracted {
        tracing::info!("Extraction failed ({}), using defaults only", failure.error);
    }
    Ok(serde_json::to_value(merge(default_places, &extracted))?)
}
