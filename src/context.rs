use crate::catalog::{self, Catalog, CatalogRepository, JsonCatalogRepository};
use crate::config::AppConfig;
use crate::document::{DocumentAssembler, DocumentModel};
use crate::errors::{AppError, AppResult};
use crate::images::ImageResolver;
use crate::janitor::AssetJanitor;
use crate::models::{
    Activity, AddActivityPayload, CatalogTitles, Category, DeleteActivityPayload, DeleteActivityResponse,
    GenerateDocumentPayload, RenderedDocument,
};
use crate::render::{build_renderer, load_stylesheet, DocumentRenderer};
use crate::uploads::UploadStore;
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Catalog mutations run under `write_lock` from load until save.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<AppConfig>,
    repository: Arc<dyn CatalogRepository>,
    uploads: UploadStore,
    janitor: AssetJanitor,
    assembler: DocumentAssembler,
    renderer: Arc<dyn DocumentRenderer>,
    write_lock: Arc<Mutex<()>>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let repository = JsonCatalogRepository::new(&config.catalog_path);
        repository.ensure_initialized()?;
        let renderer: Arc<dyn DocumentRenderer> = Arc::from(build_renderer(&config));
        Self::with_parts(config, Arc::new(repository), renderer)
    }

    pub fn with_parts(
        config: AppConfig,
        repository: Arc<dyn CatalogRepository>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> AppResult<Self> {
        let uploads = UploadStore::new(
            &config.upload_dir,
            config.allowed_image_extensions.clone(),
            config.max_upload_bytes,
        );
        uploads.ensure_dir()?;
        let resolver = ImageResolver::new(&config.upload_dir, &config.project_root, &config.static_dir);

        Ok(Self {
            janitor: AssetJanitor::new(&config.upload_dir),
            assembler: DocumentAssembler::new(resolver, &config.logo_path),
            uploads,
            repository,
            renderer,
            config: Arc::new(config),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn list_catalog_titles(&self) -> AppResult<CatalogTitles> {
        let catalog = self.repository.load()?;
        Ok(catalog::titles(&catalog))
    }

    pub fn list_catalog(&self) -> AppResult<Catalog> {
        let _guard = self.lock_writes()?;
        let mut catalog = self.repository.load()?;
        if catalog::ensure_identities(&mut catalog) {
            self.repository.save(&catalog)?;
            tracing::info!("assigned ids to legacy activities");
        }
        Ok(catalog)
    }

    pub fn add_activity(&self, payload: AddActivityPayload) -> AppResult<Activity> {
        let AddActivityPayload {
            category,
            title,
            bullets,
            image,
        } = payload;

        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Activity title is required".to_string()));
        }
        let bullets = normalize_bullets(&bullets);
        if bullets.is_empty() {
            return Err(AppError::InvalidInput("At least one explanation line is required".to_string()));
        }

        let _guard = self.lock_writes()?;
        let mut catalog = self.repository.load()?;

        let stored_image = match image.as_ref() {
            Some(upload) => Some(self.uploads.store(upload)?),
            None => None,
        };
        let activity = Activity {
            id: Some(catalog::new_activity_id()),
            title,
            bullets,
            image: stored_image.clone().unwrap_or_default(),
            extra: BTreeMap::new(),
        };
        catalog::append(&mut catalog, category, activity.clone());

        if let Err(error) = self.repository.save(&catalog) {
            if let Some(filename) = stored_image.as_deref() {
                self.uploads.discard(filename);
            }
            return Err(error);
        }

        tracing::info!(
            category = %category,
            activity_id = %activity.id(),
            image = %activity.image,
            "activity added"
        );
        Ok(activity)
    }

    pub fn delete_activity(&self, payload: DeleteActivityPayload) -> AppResult<DeleteActivityResponse> {
        let (Some(category), Some(activity_id)) = (
            payload.category.as_deref().map(str::trim).filter(|value| !value.is_empty()),
            payload.activity_id.as_deref().map(str::trim).filter(|value| !value.is_empty()),
        ) else {
            return Err(AppError::NotFound("Invalid deletion request: category and id are required".to_string()));
        };
        let category: Category = category
            .parse()
            .map_err(|error: String| AppError::NotFound(error))?;

        let _guard = self.lock_writes()?;
        let mut catalog = self.repository.load()?;
        let removed = catalog::delete_by_id(&mut catalog, category, activity_id)?;
        self.repository.save(&catalog)?;

        let asset_cleanup = self.janitor.maybe_delete_asset(&catalog, &removed.image);
        tracing::info!(category = %category, activity_id = %removed.id(), "activity deleted");
        Ok(DeleteActivityResponse {
            category,
            removed,
            asset_cleanup,
        })
    }

    pub fn assemble_document(&self, payload: &GenerateDocumentPayload) -> AppResult<DocumentModel> {
        self.assemble_document_on(payload, Local::now().date_naive())
    }

    pub fn assemble_document_on(&self, payload: &GenerateDocumentPayload, today: NaiveDate) -> AppResult<DocumentModel> {
        let catalog = self.repository.load()?;
        Ok(self.assembler.assemble(
            &catalog,
            payload.warmup.as_deref(),
            payload.main.as_deref(),
            payload.cooldown.as_deref(),
            today,
        ))
    }

    pub fn generate_document(&self, payload: &GenerateDocumentPayload) -> AppResult<RenderedDocument> {
        let model = self.assemble_document(payload)?;
        let stylesheet = load_stylesheet(&self.config.stylesheet_path);
        let rendered = self.renderer.render(&model, &stylesheet)?;
        tracing::info!(filename = %rendered.filename, bytes = rendered.bytes.len(), "lesson plan generated");
        Ok(rendered)
    }

    fn lock_writes(&self) -> AppResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| AppError::Internal("catalog write lock poisoned".to_string()))
    }
}

/// Splits every entry into lines and drops the blank ones.
fn normalize_bullets(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|entry| entry.lines())
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullets_are_split_and_blank_lines_dropped() {
        let raw = vec!["Run to the cone\r\n\r\n  Jog back".to_string(), "   ".to_string(), "Rest".to_string()];
        assert_eq!(
            normalize_bullets(&raw),
            vec!["Run to the cone".to_string(), "  Jog back".to_string(), "Rest".to_string()]
        );
    }
}
