use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "חימום")]
    WarmUp,
    #[serde(rename = "עיקרי")]
    Main,
    #[serde(rename = "סיום")]
    CoolDown,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::WarmUp, Category::Main, Category::CoolDown];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WarmUp => "חימום",
            Self::Main => "עיקרי",
            Self::CoolDown => "סיום",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::WarmUp => "warm-up",
            Self::Main => "main",
            Self::CoolDown => "cool-down",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(category) = Self::ALL.into_iter().find(|category| category.as_str() == trimmed) {
            return Ok(category);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "warm-up" | "warmup" | "warm_up" => Ok(Self::WarmUp),
            "main" => Ok(Self::Main),
            "cool-down" | "cooldown" | "cool_down" => Ok(Self::CoolDown),
            _ => Err(format!("Unknown category '{}'", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Activity {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTitles {
    pub warm_up: Vec<String>,
    pub main: Vec<String>,
    pub cool_down: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AddActivityPayload {
    pub category: Category,
    pub title: String,
    pub bullets: Vec<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteActivityPayload {
    pub category: Option<String>,
    pub activity_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentPayload {
    pub warmup: Option<String>,
    pub main: Option<String>,
    pub cooldown: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CleanupOutcome {
    NotManaged,
    StillReferenced,
    Removed,
    Missing,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteActivityResponse {
    pub category: Category,
    pub removed: Activity,
    pub asset_cleanup: CleanupOutcome,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_keys_and_slugs() {
        assert_eq!("חימום".parse::<Category>(), Ok(Category::WarmUp));
        assert_eq!("Warmup".parse::<Category>(), Ok(Category::WarmUp));
        assert_eq!(" main ".parse::<Category>(), Ok(Category::Main));
        assert_eq!("cool-down".parse::<Category>(), Ok(Category::CoolDown));
        assert!("stretching".parse::<Category>().is_err());
    }

    #[test]
    fn activity_without_id_omits_it_when_serialized() {
        let activity: Activity =
            serde_json::from_value(serde_json::json!({"title": "Tag", "bullets": ["Run"], "image": ""}))
                .expect("activity");
        assert_eq!(activity.id, None);
        assert_eq!(activity.id(), "");
        let value = serde_json::to_value(&activity).expect("serialize");
        assert!(value.get("id").is_none());
        assert_eq!(value["title"], "Tag");
    }

    #[test]
    fn empty_id_key_is_kept_when_serialized() {
        let raw = serde_json::json!({"id": "", "title": "T", "bullets": [], "image": ""});
        let activity: Activity = serde_json::from_value(raw.clone()).expect("activity");
        assert_eq!(activity.id.as_deref(), Some(""));
        assert_eq!(serde_json::to_value(&activity).expect("serialize"), raw);
    }

    #[test]
    fn null_image_reads_as_no_image() {
        let activity: Activity =
            serde_json::from_value(serde_json::json!({"id": "a1", "title": "T", "bullets": [], "image": null}))
                .expect("activity");
        assert_eq!(activity.image, "");
    }
}
