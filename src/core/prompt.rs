//! System instructions sent to the text-understanding service.

use crate::domain::model::{PlaceType, TimePreference};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Language of the system instruction and of the labels it asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ja" => Ok(Locale::Ja),
            "en" => Ok(Locale::En),
            _ => Err(format!("unknown locale: {} (use ja or en)", s)),
        }
    }
}

fn join_labels<T>(items: &[T], label: impl Fn(&T) -> &'static str, sep: &str) -> String {
    items.iter().map(label).collect::<Vec<_>>().join(sep)
}

/// Build the fixed instruction. `default_places` are the places the caller already fixed.
pub fn build_instruction(locale: Locale, default_places: &[&str]) -> String {
    match locale {
        Locale::Ja => ja_instruction(default_places),
        Locale::En => en_instruction(default_places),
    }
}

fn ja_instruction(default_places: &[&str]) -> String {
    let types = join_labels(&PlaceType::ALL, |t| t.label(), " または ");
    let times = join_labels(&TimePreference::ALL, |t| t.label(), "/");
    let mut prompt = format!(
        r#"あなたは旅行プランAIです。ユーザーの文章から、観光地または飲食店に関する制約だけをJSONで整理してください。
{{
    "place_constraints": [
        {{
            "place": "観光地または飲食店名",
            "type": "{types}",
            "time_preference": "{times}",
            "notes": "ユーザーの補足情報や希望"
        }}
    ]
}}
注意:
- 座標は出力しない
- デフォルトの場所に関しては出力しない
- "type" は必ず "{tourist}" か "{restaurant}"
- "time_preference" は必ず {times} のいずれか
- JSON形式に厳密にしてください
"#,
        tourist = PlaceType::TouristSpot.label(),
        restaurant = PlaceType::Restaurant.label(),
    );
    if !default_places.is_empty() {
        prompt.push_str("デフォルトの場所: ");
        prompt.push_str(&default_places.join("、"));
        prompt.push('\n');
    }
    prompt
}

fn en_instruction(default_places: &[&str]) -> String {
    let types = join_labels(&PlaceType::ALL, |t| t.id(), " or ");
    let times = join_labels(&TimePreference::ALL, |t| t.id(), "/");
    let mut prompt = format!(
        r#"You are a travel planning assistant. From the user's text, extract only the constraints about tourist spots or restaurants as JSON.
{{
    "place_constraints": [
        {{
            "place": "name of the tourist spot or restaurant",
            "type": "{types}",
            "time_preference": "{times}",
            "notes": "additional details or wishes from the user"
        }}
    ]
}}
Rules:
- Do not output coordinates
- Do not output the default places
- "type" must be exactly "{tourist}" or "{restaurant}"
- "time_preference" must be exactly one of {times}
- Reply with strict JSON only
"#,
        tourist = PlaceType::TouristSpot.id(),
        restaurant = PlaceType::Restaurant.id(),
    );
    if !default_places.is_empty() {
        prompt.push_str("Default places: ");
        prompt.push_str(&default_places.join(", "));
        prompt.push('\n');
    }
    prompt
}
