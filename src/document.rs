use crate::catalog::{find_by_title, Catalog};
use crate::images::{file_uri, ImageResolver};
use crate::models::{Activity, Category};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: String,
    pub title: String,
    pub bullets: Vec<String>,
    pub image: String,
    /// `None` when the activity has no image or it could not be found.
    pub image_locator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentSlot {
    Selected(ActivityView),
    NoSelection,
}

impl DocumentSlot {
    pub fn selected(&self) -> Option<&ActivityView> {
        match self {
            Self::Selected(view) => Some(view),
            Self::NoSelection => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentModel {
    pub warm_up: DocumentSlot,
    pub main: DocumentSlot,
    pub cool_down: DocumentSlot,
    pub today_date: String,
    pub logo_locator: String,
}

impl DocumentModel {
    pub fn slot(&self, category: Category) -> &DocumentSlot {
        match category {
            Category::WarmUp => &self.warm_up,
            Category::Main => &self.main,
            Category::CoolDown => &self.cool_down,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    resolver: ImageResolver,
    logo_path: PathBuf,
}

impl DocumentAssembler {
    pub fn new(resolver: ImageResolver, logo_path: &Path) -> Self {
        Self {
            resolver,
            logo_path: logo_path.to_path_buf(),
        }
    }

    pub fn assemble(
        &self,
        catalog: &Catalog,
        warmup_title: Option<&str>,
        main_title: Option<&str>,
        cooldown_title: Option<&str>,
        today: NaiveDate,
    ) -> DocumentModel {
        DocumentModel {
            warm_up: self.slot(catalog, Category::WarmUp, warmup_title),
            main: self.slot(catalog, Category::Main, main_title),
            cool_down: self.slot(catalog, Category::CoolDown, cooldown_title),
            today_date: today.format(DATE_FORMAT).to_string(),
            logo_locator: file_uri(&self.logo_path),
        }
    }

    fn slot(&self, catalog: &Catalog, category: Category, title: Option<&str>) -> DocumentSlot {
        let Some(title) = title.filter(|value| !value.is_empty()) else {
            return DocumentSlot::NoSelection;
        };
        match find_by_title(catalog, category, title) {
            Some(activity) => DocumentSlot::Selected(self.view(activity)),
            None => {
                tracing::info!(category = %category, title, "no activity matches selected title");
                DocumentSlot::NoSelection
            }
        }
    }

    fn view(&self, activity: &Activity) -> ActivityView {
        ActivityView {
            id: activity.id().to_string(),
            title: activity.title.clone(),
            bullets: activity.bullets.clone(),
            image: activity.image.clone(),
            image_locator: self.resolver.resolve(&activity.image),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;

    fn activity(id: &str, title: &str, bullets: &[&str], image: &str) -> Activity {
        Activity {
            id: Some(id.to_string()),
            title: title.to_string(),
            bullets: bullets.iter().map(|value| value.to_string()).collect(),
            image: image.to_string(),
            extra: BTreeMap::new(),
        }
    }

    fn assembler(root: &Path) -> DocumentAssembler {
        let uploads = root.join("uploads");
        fs::create_dir_all(&uploads).expect("uploads dir");
        let resolver = ImageResolver::new(&uploads, root, &root.join("static"));
        DocumentAssembler::new(resolver, &root.join("logo.png"))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).expect("valid date")
    }

    #[test]
    fn single_selection_leaves_other_slots_empty() {
        let root = tempfile::tempdir().expect("temp root");
        let catalog = Catalog {
            warm_up: vec![activity("w1", "Tag", &["Run", "Stretch"], "")],
            ..Catalog::default()
        };

        let model = assembler(root.path()).assemble(&catalog, Some("Tag"), Some(""), Some(""), today());

        let warm = model.warm_up.selected().expect("warm-up selected");
        assert_eq!(warm.title, "Tag");
        assert_eq!(warm.bullets.len(), 2);
        assert_eq!(warm.image_locator, None);
        assert_eq!(model.main, DocumentSlot::NoSelection);
        assert_eq!(model.cool_down, DocumentSlot::NoSelection);
        assert_eq!(model.today_date, "07/03/2026");
        assert!(model.logo_locator.ends_with("/logo.png"));
    }

    #[test]
    fn missing_image_is_distinct_from_missing_selection() {
        let root = tempfile::tempdir().expect("temp root");
        fs::create_dir_all(root.path().join("uploads")).expect("uploads");
        fs::write(root.path().join("uploads/relay.png"), b"img").expect("asset");
        let catalog = Catalog {
            main: vec![
                activity("m1", "Relay", &["Go"], "relay.png"),
                activity("m2", "Relay", &["Other"], ""),
            ],
            cool_down: vec![activity("c1", "Walk", &["Slow"], "gone.png")],
            ..Catalog::default()
        };

        let model = assembler(root.path()).assemble(&catalog, None, Some("Relay"), Some("Walk"), today());

        assert_eq!(model.slot(Category::WarmUp), &DocumentSlot::NoSelection);
        let main = model.main.selected().expect("main selected");
        assert_eq!(main.id, "m1");
        assert!(main.image_locator.as_deref().expect("locator").ends_with("/uploads/relay.png"));
        let cool = model.cool_down.selected().expect("cool-down selected");
        assert_eq!(cool.image, "gone.png");
        assert_eq!(cool.image_locator, None);
    }

    #[test]
    fn unknown_title_is_no_selection() {
        let root = tempfile::tempdir().expect("temp root");
        let catalog = Catalog {
            warm_up: vec![activity("w1", "Tag", &["Run"], "")],
            ..Catalog::default()
        };
        let model = assembler(root.path()).assemble(&catalog, Some("Freeze tag"), None, None, today());
        assert_eq!(model.warm_up, DocumentSlot::NoSelection);
    }
}
