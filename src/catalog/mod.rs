pub mod repository;

use crate::errors::{AppError, AppResult};
use crate::models::{Activity, Category, CatalogTitles};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

pub use repository::{CatalogRepository, JsonCatalogRepository};

/// The whole persisted catalog. Category keys serialize in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "חימום")]
    pub warm_up: Vec<Activity>,
    #[serde(rename = "עיקרי")]
    pub main: Vec<Activity>,
    #[serde(rename = "סיום")]
    pub cool_down: Vec<Activity>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Catalog {
    pub fn activities(&self, category: Category) -> &[Activity] {
        match category {
            Category::WarmUp => &self.warm_up,
            Category::Main => &self.main,
            Category::CoolDown => &self.cool_down,
        }
    }

    pub fn activities_mut(&mut self, category: Category) -> &mut Vec<Activity> {
        match category {
            Category::WarmUp => &mut self.warm_up,
            Category::Main => &mut self.main,
            Category::CoolDown => &mut self.cool_down,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &Activity)> {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.activities(category).iter().map(move |activity| (category, activity)))
    }

    pub fn len(&self) -> usize {
        self.warm_up.len() + self.main.len() + self.cool_down.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn new_activity_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Gives every activity lacking an id a fresh one. Returns whether anything changed.
/// An id that is present and non-empty is never rewritten, whatever it contains.
pub fn ensure_identities(catalog: &mut Catalog) -> bool {
    let mut changed = false;
    for category in Category::ALL {
        for activity in catalog.activities_mut(category).iter_mut() {
            if activity.id().is_empty() {
                activity.id = Some(new_activity_id());
                changed = true;
            }
        }
    }
    changed
}

pub fn append(catalog: &mut Catalog, category: Category, activity: Activity) {
    catalog.activities_mut(category).push(activity);
}

pub fn delete_by_id(catalog: &mut Catalog, category: Category, activity_id: &str) -> AppResult<Activity> {
    let activities = catalog.activities_mut(category);
    let index = activities
        .iter()
        .position(|activity| activity.id() == activity_id)
        .ok_or_else(|| {
            AppError::NotFound(format!("Activity '{}' not found in {}", activity_id, category))
        })?;
    Ok(activities.remove(index))
}

/// First activity in insertion order whose title matches exactly. Titles are not unique.
pub fn find_by_title<'a>(catalog: &'a Catalog, category: Category, title: &str) -> Option<&'a Activity> {
    catalog
        .activities(category)
        .iter()
        .find(|activity| activity.title == title)
}

pub fn titles(catalog: &Catalog) -> CatalogTitles {
    let collect = |category| {
        catalog
            .activities(category)
            .iter()
            .map(|activity| activity.title.clone())
            .collect::<Vec<_>>()
    };
    CatalogTitles {
        warm_up: collect(Category::WarmUp),
        main: collect(Category::Main),
        cool_down: collect(Category::CoolDown),
    }
}

pub fn is_image_referenced(catalog: &Catalog, filename: &str) -> bool {
    catalog.iter().any(|(_, activity)| activity.image == filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(id: &str, title: &str, image: &str) -> Activity {
        Activity {
            id: Some(id.to_string()),
            title: title.to_string(),
            bullets: vec!["Run".to_string()],
            image: image.to_string(),
            extra: BTreeMap::new(),
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog {
            warm_up: vec![activity("w1", "Tag", "")],
            main: vec![activity("a1", "Relay", "x.png"), activity("a2", "Dodgeball", "")],
            cool_down: vec![activity("c1", "Stretch", "x.png")],
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn ensure_identities_fills_missing_ids_once() {
        let mut catalog = sample_catalog();
        catalog.main.push(activity("", "New game", ""));
        catalog.cool_down.push(Activity {
            id: None,
            ..activity("", "Breathing", "")
        });

        assert!(ensure_identities(&mut catalog));
        let after_first = catalog.clone();
        assert!(!ensure_identities(&mut catalog));
        assert_eq!(catalog, after_first);

        assert_eq!(catalog.main[0].id(), "a1");
        assert_eq!(catalog.main[2].id().len(), 32);
        assert_eq!(catalog.cool_down[1].id().len(), 32);
        assert_ne!(catalog.main[2].id, catalog.cool_down[1].id);
    }

    #[test]
    fn ensure_identities_keeps_whitespace_ids() {
        let mut catalog = sample_catalog();
        catalog.main.push(activity("  ", "Odd id", ""));

        assert!(!ensure_identities(&mut catalog));
        assert_eq!(catalog.main[2].id(), "  ");
    }

    #[test]
    fn delete_by_id_only_touches_named_category() {
        let mut catalog = sample_catalog();
        let before = catalog.clone();

        let removed = delete_by_id(&mut catalog, Category::Main, "a1").expect("removed");
        assert_eq!(removed.title, "Relay");
        assert_eq!(catalog.main.len(), 1);
        assert_eq!(catalog.main[0].id(), "a2");
        assert_eq!(catalog.warm_up, before.warm_up);
        assert_eq!(catalog.cool_down, before.cool_down);
    }

    #[test]
    fn delete_by_id_reports_not_found_without_mutation() {
        let mut catalog = sample_catalog();
        let before = catalog.clone();
        let error = delete_by_id(&mut catalog, Category::Main, "does-not-exist").expect_err("missing id");
        assert!(matches!(error, AppError::NotFound(_)));
        assert_eq!(catalog, before);

        let error = delete_by_id(&mut catalog, Category::WarmUp, "a1").expect_err("wrong category");
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[test]
    fn find_by_title_takes_first_match_in_insertion_order() {
        let mut catalog = sample_catalog();
        append(&mut catalog, Category::Main, activity("a3", "Relay", ""));

        let found = find_by_title(&catalog, Category::Main, "Relay").expect("match");
        assert_eq!(found.id(), "a1");
        assert_eq!(catalog.main.last().map(Activity::id), Some("a3"));
        assert!(find_by_title(&catalog, Category::WarmUp, "Relay").is_none());
        assert!(find_by_title(&catalog, Category::Main, "relay").is_none());
    }

    #[test]
    fn titles_and_image_references_span_all_categories() {
        let catalog = sample_catalog();
        let listed = titles(&catalog);
        assert_eq!(listed.warm_up, vec!["Tag".to_string()]);
        assert_eq!(listed.main, vec!["Relay".to_string(), "Dodgeball".to_string()]);
        assert_eq!(listed.cool_down, vec!["Stretch".to_string()]);

        assert!(is_image_referenced(&catalog, "x.png"));
        assert!(!is_image_referenced(&catalog, "y.png"));
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn unknown_fields_survive_serialization() {
        let value = json!({
            "חימום": [{"id": "w1", "title": "Tag", "bullets": [], "image": "", "difficulty": 2}],
            "עיקרי": [],
            "סיום": [],
            "notes": "hand edited"
        });
        let catalog: Catalog = serde_json::from_value(value.clone()).expect("catalog");
        assert_eq!(catalog.warm_up[0].extra.get("difficulty"), Some(&json!(2)));
        assert_eq!(serde_json::to_value(&catalog).expect("serialize"), value);
    }
}
