use chrono::{DateTime, Utc};
use serde::Serialize;

use satchel_inventory::{BackpackLine, CharacterProfile, TitleLine, Weight};

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfileResponse {
    pub first_name: String,
    pub last_name: String,
    pub current_weight: Weight,
    pub max_weight: Weight,
    pub backpack_items: Vec<BackpackItemResponse>,
    pub titles: Vec<TitleResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackpackItemResponse {
    pub item_name: String,
    pub item_weight: Weight,
    pub amount: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleResponse {
    pub title: String,
    pub acquired_at: DateTime<Utc>,
}

impl From<CharacterProfile> for CharacterProfileResponse {
    fn from(p: CharacterProfile) -> Self {
        Self {
            first_name: p.first_name,
            last_name: p.last_name,
            current_weight: p.current_weight,
            max_weight: p.max_weight,
            backpack_items: p.backpack.into_iter().map(Into::into).collect(),
            titles: p.titles.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<BackpackLine> for BackpackItemResponse {
    fn from(l: BackpackLine) -> Self {
        Self {
            item_name: l.item_name,
            item_weight: l.item_weight,
            amount: l.amount,
        }
    }
}

impl From<TitleLine> for TitleResponse {
    fn from(t: TitleLine) -> Self {
        Self {
            title: t.title,
            acquired_at: t.acquired_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use satchel_core::{CharacterId, ItemId, TitleId};

    use super::*;

    #[test]
    fn profile_serializes_with_camel_case_keys() {
        let profile = CharacterProfile {
            character_id: CharacterId::new(1),
            first_name: "Name1".into(),
            last_name: "a".into(),
            current_weight: 100,
            max_weight: 120,
            backpack: vec![BackpackLine {
                item_id: ItemId::new(1),
                item_name: "item1".into(),
                item_weight: 15,
                amount: 1,
            }],
            titles: vec![TitleLine {
                title_id: TitleId::new(1),
                title: "Title1".into(),
                acquired_at: DateTime::parse_from_rfc3339("2021-02-15T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            }],
        };

        let json = serde_json::to_value(CharacterProfileResponse::from(profile)).unwrap();
        assert_eq!(json["firstName"], "Name1");
        assert_eq!(json["currentWeight"], 100);
        assert_eq!(json["backpackItems"][0]["itemName"], "item1");
        assert_eq!(json["backpackItems"][0]["itemWeight"], 15);
        assert_eq!(json["titles"][0]["title"], "Title1");
        assert!(json["titles"][0]["acquiredAt"].as_str().unwrap().starts_with("2021-02-15"));
        assert!(json.get("characterId").is_none());
    }
}
