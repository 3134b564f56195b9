use crate::domain::model::{PlaceConstraint, PlaceType, TimePreference};
use crate::utils::error::{ConstraintError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefaultsDocument {
    List(Vec<PlaceConstraint>),
    Wrapped { place_constraints: Vec<PlaceConstraint> },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    place: String,
    #[serde(rename = "type")]
    place_type: String,
    #[serde(default)]
    time_preference: String,
    #[serde(default)]
    notes: String,
}

/// Load the caller's default places from a `.csv` or JSON file.
pub fn load_default_places<P: AsRef<Path>>(path: P) -> Result<Vec<PlaceConstraint>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let content = std::fs::read_to_string(path)?;
    let places = if is_csv {
        parse_csv_defaults(&content)?
    } else {
        parse_json_defaults(&content)?
    };

    check_defaults(&places)?;
    tracing::info!("📋 Loaded {} default places from {}", places.len(), path.display());
    Ok(places)
}

pub fn parse_json_defaults(content: &str) -> Result<Vec<PlaceConstraint>> {
    let document: DefaultsDocument = serde_json::from_str(content)?;
    Ok(match document {
        DefaultsDocument::List(places) => places,
        DefaultsDocument::Wrapped { place_constraints } => place_constraints,
    })
}

/// CSV with header `place,type,time_preference,notes`; an empty time preference means unspecified.
pub fn parse_csv_defaults(content: &str) -> Result<Vec<PlaceConstraint>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers()?.clone();
    let mut places = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());
        let row: CsvRow = record.deserialize(Some(&headers))?;
        let invalid = |reason: String| ConstraintError::ValidationError {
            message: format!("defaults line {}: {}", line, reason),
        };
        let place_type = row.place_type.trim().parse::<PlaceType>().map_err(invalid)?;
        let time_preference = match row.time_preference.trim() {
            "" => TimePreference::Unspecified,
            label => label.parse::<TimePreference>().map_err(invalid)?,
        };
        places.push(PlaceConstraint {
            place: row.place,
            place_type,
            time_preference,
            notes: row.notes,
        });
    }

    Ok(places)
}

fn check_defaults(places: &[PlaceConstraint]) -> Result<()> {
    let mut seen = HashSet::new();
    for place in places {
        if place.place.trim().is_empty() {
            return Err(ConstraintError::ValidationError {
                message: "default place name cannot be empty".to_string(),
            });
        }
        if !seen.insert(place.place.as_str()) {
            tracing::warn!("Default place {:?} is listed more than once", place.place);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_json_list_and_wrapped_forms() {
        let list = parse_json_defaults(
            r#"[{"place": "新宿歌舞伎町", "type": "観光地", "time_preference": "指定なし", "notes": "デフォルト設定"}]"#,
        )
        .unwrap();
        let wrapped = parse_json_defaults(
            r#"{"place_constraints": [{"place": "新宿歌舞伎町", "type": "観光地", "time_preference": "指定なし", "notes": "デフォルト設定"}]}"#,
        )
        .unwrap();
        assert_eq!(list, wrapped);
        assert_eq!(list[0].notes, "デフォルト設定");
    }

    #[test]
    fn test_parse_csv_defaults() {
        let csv_content = "place,type,time_preference,notes\n\
                           浅草寺,観光地,午前,雷門から\n\
                           築地,restaurant,,\n";
        let places = parse_csv_defaults(csv_content).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].time_preference, TimePreference::Morning);
        assert_eq!(places[1].place_type, PlaceType::Restaurant);
        assert_eq!(places[1].time_preference, TimePreference::Unspecified);
    }

    #[test]
    fn test_csv_with_unknown_type_is_rejected() {
        let err = parse_csv_defaults("place,type,time_preference,notes\n東京駅,駅,,\n").unwrap_err();
        assert!(matches!(err, ConstraintError::ValidationError { .. }));
    }

    #[test]
    fn test_csv_error_names_the_file_line() {
        let csv_content = "place,type,time_preference,notes\n\
                           浅草寺,観光地,午前,\n\
                           上野公園,観光地,深夜,\n";
        match parse_csv_defaults(csv_content).unwrap_err() {
            ConstraintError::ValidationError { message } => {
                assert!(message.starts_with("defaults line 3:"), "{}", message)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_load_default_places_from_files() {
        let mut json_file = Builder::new().suffix(".json").tempfile().unwrap();
        json_file
            .write_all(r#"[{"place": "上野公園", "type": "tourist_spot"}]"#.as_bytes())
            .unwrap();
        let places = load_default_places(json_file.path()).unwrap();
        assert_eq!(places[0].place, "上野公園");

        let mut csv_file = Builder::new().suffix(".csv").tempfile().unwrap();
        csv_file
            .write_all("place,type,time_preference,notes\n,観光地,,\n".as_bytes())
            .unwrap();
        assert!(load_default_places(csv_file.path()).is_err());
    }
}
