use crate::core::prompt::{build_instruction, Locale};
use crate::domain::model::{
    ErrorPayload, ExtractionPayload, PlaceConstraint, PlaceType, RejectedEntry, TimePreference,
};
use crate::domain::ports::TextService;
use crate::utils::error::{ConstraintError, Result};
use serde_json::Value;

/// Turns free text into validated place constraints through a [`TextService`].
pub struct ConstraintExtractor<S: TextService> {
    service: S,
    locale: Locale,
}

impl<S: TextService> ConstraintExtractor<S> {
    pub fn new(service: S, locale: Locale) -> Self {
        Self { service, locale }
    }

    pub async fn extract(&self, user_text: &str) -> Result<ExtractionPayload> {
        self.extract_with_defaults(user_text, &[]).await
    }

    /// Like [`extract`](Self::extract), naming the caller's default places in the
    /// instruction so the service can leave them out.
    pub async fn extract_with_defaults(
        &self,
        user_text: &str,
        defaults: &[PlaceConstraint],
    ) -> Result<ExtractionPayload> {
        let default_names: Vec<&str> = defaults.iter().map(|d| d.place.as_str()).collect();
        let instruction = build_instruction(self.locale, &default_names);

        tracing::debug!(
            "Requesting constraint extraction ({} chars of user text, {} default places)",
            user_text.chars().count(),
            default_names.len()
        );
        let reply = self.service.complete(&instruction, user_text).await?;

        let payload = parse_reply(&reply);
        match &payload {
            ExtractionPayload::Parsed {
                place_constraints,
                rejected,
            } => {
                tracing::info!(
                    "✅ Extracted {} constraints ({} rejected)",
                    place_constraints.len(),
                    rejected.len()
                );
            }
            ExtractionPayload::Failed(failure) => {
                tracing::warn!(
                    "⚠️ {} ({} bytes of raw output)",
                    failure.error,
                    failure.raw_output.len()
                );
            }
        }
        Ok(payload)
    }

    /// JSON-shaped entry point: the success payload or `{error, raw_output}`.
    /// Only service failures are returned as `Err`.
    pub async fn parse_user_constraints(&self, user_text: &str) -> Result<Value> {
        self.extract(user_text).await?.to_json()
    }
}

/// Parse a service reply as strict JSON. Anything that is not JSON becomes an error payload.
pub fn parse_reply(raw: &str) -> ExtractionPayload {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => parse_value(value, raw),
        Err(e) => {
            tracing::debug!("Reply is not valid JSON: {}", e);
            ExtractionPayload::Failed(ErrorPayload::not_json(raw))
        }
    }
}

/// Validate an already-decoded `{"place_constraints": [...]}` value.
///
/// An `{error, raw_output}` payload is passed back as a failure. Entries that fail
/// validation are dropped individually.
pub fn parse_constraints_value(value: Value) -> ExtractionPayload {
    if let Some(payload) = as_error_payload(&value) {
        return ExtractionPayload::Failed(payload);
    }
    let raw = value.to_string();
    parse_value(value, &raw)
}

fn as_error_payload(value: &Value) -> Option<ErrorPayload> {
    let obj = value.as_object()?;
    let error = obj.get("error")?.as_str()?;
    Some(ErrorPayload {
        error: error.to_string(),
        raw_output: obj
            .get("raw_output")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn parse_value(value: Value, raw: &str) -> ExtractionPayload {
    let entries = match value {
        Value::Object(mut obj) => match obj.remove("place_constraints") {
            Some(Value::Array(entries)) => entries,
            _ => return ExtractionPayload::Failed(ErrorPayload::not_json(raw)),
        },
        _ => return ExtractionPayload::Failed(ErrorPayload::not_json(raw)),
    };

    let mut place_constraints = Vec::with_capacity(entries.len());
    let mut rejected = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match validate_entry(entry) {
            Ok(constraint) => place_constraints.push(constraint),
            Err(e) => {
                tracing::warn!("Dropping constraint #{}: {}", index, e);
                rejected.push(RejectedEntry {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    ExtractionPayload::Parsed {
        place_constraints,
        rejected,
    }
}

fn invalid(message: impl Into<String>) -> ConstraintError {
    ConstraintError::ValidationError {
        message: message.into(),
    }
}

fn validate_entry(entry: &Value) -> Result<PlaceConstraint> {
    let obj = entry
        .as_object()
        .ok_or_else(|| invalid("entry is not an object"))?;

    let place = match obj.get("place") {
        Some(Value::String(place)) if !place.trim().is_empty() => place.clone(),
        Some(Value::String(_)) => return Err(invalid("place is empty")),
        _ => return Err(invalid("place is missing")),
    };

    let place_type = match obj.get("type") {
        Some(Value::String(label)) => label.parse::<PlaceType>().map_err(invalid)?,
        _ => return Err(invalid(format!("type is missing for {}", place))),
    };

    let time_preference = match obj.get("time_preference") {
        None | Some(Value::Null) => TimePreference::Unspecified,
        Some(Value::String(label)) => label.parse::<TimePreference>().map_err(invalid)?,
        Some(other) => return Err(invalid(format!("time_preference is not a string: {}", other))),
    };

    let notes = match obj.get("notes") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(notes)) => notes.clone(),
        Some(other) => return Err(invalid(format!("notes is not a string: {}", other))),
    };

    Ok(PlaceConstraint {
        place,
        place_type,
        time_preference,
        notes,
    })
}
