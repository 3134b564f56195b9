use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of place. Serialized with the Japanese label, English ids accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceType {
    #[serde(rename = "観光地", alias = "tourist_spot")]
    TouristSpot,
    #[serde(rename = "飲食店", alias = "restaurant")]
    Restaurant,
}

impl PlaceType {
    pub const ALL: [PlaceType; 2] = [PlaceType::TouristSpot, PlaceType::Restaurant];

    pub fn label(&self) -> &'static str {
        match self {
            PlaceType::TouristSpot => "観光地",
            PlaceType::Restaurant => "飲食店",
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            PlaceType::TouristSpot => "tourist_spot",
            PlaceType::Restaurant => "restaurant",
        }
    }
}

impl FromStr for PlaceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlaceType::ALL
            .into_iter()
            .find(|t| t.label() == s || t.id() == s)
            .ok_or_else(|| format!("unknown place type: {:?}", s))
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Preferred time of day for a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimePreference {
    #[serde(rename = "午前", alias = "morning")]
    Morning,
    #[serde(rename = "午後", alias = "afternoon")]
    Afternoon,
    #[serde(rename = "夜", alias = "evening")]
    Evening,
    #[default]
    #[serde(rename = "指定なし", alias = "unspecified")]
    Unspecified,
}

impl TimePreference {
    pub const ALL: [TimePreference; 4] = [
        TimePreference::Morning,
        TimePreference::Afternoon,
        TimePreference::Evening,
        TimePreference::Unspecified,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimePreference::Morning => "午前",
            TimePreference::Afternoon => "午後",
            TimePreference::Evening => "夜",
            TimePreference::Unspecified => "指定なし",
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            TimePreference::Morning => "morning",
            TimePreference::Afternoon => "afternoon",
            TimePreference::Evening => "evening",
            TimePreference::Unspecified => "unspecified",
        }
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, TimePreference::Unspecified)
    }
}

impl FromStr for TimePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimePreference::ALL
            .into_iter()
            .find(|t| t.label() == s || t.id() == s)
            .ok_or_else(|| format!("unknown time preference: {:?}", s))
    }
}

impl fmt::Display for TimePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceConstraint {
    pub place: String,
    #[serde(rename = "type")]
    pub place_type: PlaceType,
    #[serde(default)]
    pub time_preference: TimePreference,
    #[serde(default)]
    pub notes: String,
}

impl PlaceConstraint {
    pub fn new(
        place: impl Into<String>,
        place_type: PlaceType,
        time_preference: TimePreference,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            place: place.into(),
            place_type,
            time_preference,
            notes: notes.into(),
        }
    }
}

/// Ordered constraints with unique `place` keys. Only built by the merger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ConstraintSet {
    place_constraints: Vec<PlaceConstraint>,
}

impl ConstraintSet {
    pub(crate) fn from_unique(place_constraints: Vec<PlaceConstraint>) -> Self {
        Self { place_constraints }
    }

    pub fn as_slice(&self) -> &[PlaceConstraint] {
        &self.place_constraints
    }

    pub fn get(&self, place: &str) -> Option<&PlaceConstraint> {
        self.place_constraints.iter().find(|c| c.place == place)
    }

    pub fn len(&self) -> usize {
        self.place_constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.place_constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlaceConstraint> {
        self.place_constraints.iter()
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a PlaceConstraint;
    type IntoIter = std::slice::Iter<'a, PlaceConstraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Returned instead of a constraint list when the service reply cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub raw_output: String,
}

impl ErrorPayload {
    pub const NOT_JSON: &'static str = "JSON形式に変換できませんでした";

    pub fn not_json(raw_output: impl Into<String>) -> Self {
        Self {
            error: Self::NOT_JSON.to_string(),
            raw_output: raw_output.into(),
        }
    }
}

/// An entry dropped during validation of the service reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub index: usize,
    pub reason: String,
}

/// Result of one extraction: validated constraints or the parse-failure payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtractionPayload {
    Parsed {
        place_constraints: Vec<PlaceConstraint>,
        #[serde(skip)]
        rejected: Vec<RejectedEntry>,
    },
    Failed(ErrorPayload),
}

impl ExtractionPayload {
    pub fn parsed(place_constraints: Vec<PlaceConstraint>) -> Self {
        ExtractionPayload::Parsed {
            place_constraints,
            rejected: Vec::new(),
        }
    }

    /// Constraints this payload contributes to a merge; none for a failure.
    pub fn constraints(&self) -> &[PlaceConstraint] {
        match self {
            ExtractionPayload::Parsed {
                place_constraints, ..
            } => place_constraints,
            ExtractionPayload::Failed(_) => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExtractionPayload::Failed(_))
    }

    /// Strict view for callers that want parse failures as errors.
    pub fn into_result(self) -> crate::utils::error::Result<Vec<PlaceConstraint>> {
        match self {
            ExtractionPayload::Parsed {
                place_constraints, ..
            } => Ok(place_constraints),
            ExtractionPayload::Failed(payload) => Err(crate::utils::error::ConstraintError::ParseError {
                raw_output: payload.raw_output,
            }),
        }
    }

    pub fn to_json(&self) -> crate::utils::error::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
