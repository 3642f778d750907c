//! Artwork records and their file lifecycle.
//!
//! The artwork store itself is a collaborator behind [`ArtworkStore`]; this
//! module owns the rules that tie records to artifact sets:
//!
//! - **create**: validate the form, process the upload, insert. If the insert
//!   fails, the freshly written artifacts are deleted again.
//! - **update**: an optional new image is processed first. If the record
//!   update then fails, the *new* artifacts are deleted and the old ones kept.
//!   Only once the update succeeds are the *old* artifacts deleted.
//! - **delete**: remove the record, then its artifacts. A failed file delete
//!   is logged, never fatal.
//!
//! No record ever points at files that are gone, and no successful request
//! leaves files that no record points at.

use crate::upload::{ArtifactSet, UploadError, UploadPipeline, UploadedFile};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub type ArtworkId = u64;

const MIN_YEAR: i32 = 1900;
const MAX_TITLE_CHARS: usize = 180;
const MAX_TECHNIQUE_CHARS: usize = 180;
const MAX_DIMENSIONS_CHARS: usize = 120;
const DEFAULT_CURRENCY: &str = "GBP";

// ============================================================================
// Errors
// ============================================================================

/// One invalid form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("artwork store unavailable: {0}")]
    Unavailable(String),
    #[error("slug {0:?} is already in use")]
    DuplicateSlug(String),
}

#[derive(Error, Debug)]
pub enum ArtworkError {
    #[error("invalid artwork: {}", join_fields(.0))]
    Invalid(Vec<FieldError>),
    #[error("artwork {0} not found")]
    NotFound(ArtworkId),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ArtworkError {
    /// Text for the admin UI error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(_) => "Please correct the highlighted fields and try again.".into(),
            Self::NotFound(_) => "Artwork not found.".into(),
            Self::Upload(e) => e.user_message(),
            Self::Store(_) => "Could not save the artwork, please try again.".into(),
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Form input
// ============================================================================

/// Raw artwork form, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArtworkDraft {
    pub title: String,
    pub description: String,
    pub year: Option<i32>,
    pub technique: String,
    pub dimensions: String,
    pub price: Option<f64>,
    pub currency: String,
    pub is_featured: bool,
    pub is_published: bool,
}

/// Validated, normalized artwork fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtworkFields {
    pub title: String,
    pub description: String,
    pub year: Option<i32>,
    pub technique: Option<String>,
    pub dimensions: Option<String>,
    pub price: Option<f64>,
    pub currency: String,
    pub is_featured: bool,
    pub is_published: bool,
}

impl ArtworkDraft {
    /// Check every field, collecting all problems rather than the first.
    ///
    /// Strings are trimmed; empty optional strings become `None`; the
    /// currency is upper-cased and defaults to GBP.
    pub fn validate(&self, current_year: i32) -> Result<ArtworkFields, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut fail = |field, message: String| errors.push(FieldError { field, message });

        let title = self.title.trim();
        let title_len = title.chars().count();
        if title_len == 0 {
            fail("title", "is required".into());
        } else if title_len > MAX_TITLE_CHARS {
            fail("title", format!("must be at most {MAX_TITLE_CHARS} characters"));
        }

        if let Some(year) = self.year {
            if !(MIN_YEAR..=current_year).contains(&year) {
                fail("year", format!("must be between {MIN_YEAR} and {current_year}"));
            }
        }

        let technique = self.technique.trim();
        if technique.chars().count() > MAX_TECHNIQUE_CHARS {
            fail(
                "technique",
                format!("must be at most {MAX_TECHNIQUE_CHARS} characters"),
            );
        }
        let dimensions = self.dimensions.trim();
        if dimensions.chars().count() > MAX_DIMENSIONS_CHARS {
            fail(
                "dimensions",
                format!("must be at most {MAX_DIMENSIONS_CHARS} characters"),
            );
        }

        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                fail("price", "must be zero or more".into());
            }
        }

        let currency = match self.currency.trim() {
            "" => DEFAULT_CURRENCY.to_string(),
            other => other.to_ascii_uppercase(),
        };
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            fail("currency", "must be a three-letter code".into());
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ArtworkFields {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            year: self.year,
            technique: non_empty(technique),
            dimensions: non_empty(dimensions),
            price: self.price,
            currency,
            is_featured: self.is_featured,
            is_published: self.is_published,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// URL slug for a title: lower-case ASCII alphanumerics joined by `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "artwork".to_string()
    } else {
        slug.to_string()
    }
}

// ============================================================================
// Records and store
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub uuid: Uuid,
    pub slug: String,
    pub fields: ArtworkFields,
    pub image: ArtifactSet,
}

/// Artwork persistence collaborator.
pub trait ArtworkStore {
    /// Insert a record; the store assigns and returns the id (the `id`
    /// field of `artwork` is ignored).
    fn insert(&mut self, artwork: Artwork) -> Result<ArtworkId, StoreError>;
    fn update(&mut self, artwork: &Artwork) -> Result<(), StoreError>;
    /// Remove a record, returning it if it existed.
    fn delete(&mut self, id: ArtworkId) -> Result<Option<Artwork>, StoreError>;
    fn find(&self, id: ArtworkId) -> Result<Option<Artwork>, StoreError>;
    fn find_by_slug(&self, slug: &str) -> Result<Option<Artwork>, StoreError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryArtworkStore {
    rows: BTreeMap<ArtworkId, Artwork>,
    next_id: ArtworkId,
}

impl MemoryArtworkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &Artwork> {
        self.rows.values()
    }

    fn slug_taken(&self, slug: &str, except: ArtworkId) -> bool {
        self.rows
            .values()
            .any(|row| row.slug == slug && row.id != except)
    }
}

impl ArtworkStore for MemoryArtworkStore {
    fn insert(&mut self, mut artwork: Artwork) -> Result<ArtworkId, StoreError> {
        if self.slug_taken(&artwork.slug, ArtworkId::MAX) {
            return Err(StoreError::DuplicateSlug(artwork.slug));
        }
        self.next_id += 1;
        artwork.id = self.next_id;
        self.rows.insert(artwork.id, artwork);
        Ok(self.next_id)
    }

    fn update(&mut self, artwork: &Artwork) -> Result<(), StoreError> {
        if self.slug_taken(&artwork.slug, artwork.id) {
            return Err(StoreError::DuplicateSlug(artwork.slug.clone()));
        }
        match self.rows.get_mut(&artwork.id) {
            Some(row) => {
                *row = artwork.clone();
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!(
                "no row with id {}",
                artwork.id
            ))),
        }
    }

    fn delete(&mut self, id: ArtworkId) -> Result<Option<Artwork>, StoreError> {
        Ok(self.rows.remove(&id))
    }

    fn find(&self, id: ArtworkId) -> Result<Option<Artwork>, StoreError> {
        Ok(self.rows.get(&id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Artwork>, StoreError> {
        Ok(self.rows.values().find(|row| row.slug == slug).cloned())
    }
}

/// First free slug for `title`: `base`, then `base-2`, `base-3`, ...
///
/// A slug held by `ignore` (the artwork being renamed) counts as free.
pub fn unique_slug(
    store: &impl ArtworkStore,
    title: &str,
    ignore: Option<ArtworkId>,
) -> Result<String, StoreError> {
    let base = slugify(title);
    let mut candidate = base.clone();
    let mut counter = 2;
    while let Some(existing) = store.find_by_slug(&candidate)? {
        if Some(existing.id) == ignore {
            break;
        }
        candidate = format!("{base}-{counter}");
        counter += 1;
    }
    Ok(candidate)
}

// ============================================================================
// Service
// ============================================================================

pub struct ArtworkService<'a, S: ArtworkStore> {
    pipeline: UploadPipeline<'a>,
    store: S,
}

impl<'a, S: ArtworkStore> ArtworkService<'a, S> {
    pub fn new(pipeline: UploadPipeline<'a>, store: S) -> Self {
        Self { pipeline, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, process the image, insert the record.
    pub fn create(
        &mut self,
        draft: &ArtworkDraft,
        file: &UploadedFile,
    ) -> Result<Artwork, ArtworkError> {
        let fields = draft.validate(current_year()).map_err(ArtworkError::Invalid)?;
        let image = self.pipeline.process_upload(file)?;

        let inserted = unique_slug(&self.store, &fields.title, None).and_then(|slug| {
            let artwork = Artwork {
                id: 0,
                uuid: image.uuid,
                slug,
                fields,
                image: image.clone(),
            };
            let id = self.store.insert(artwork.clone())?;
            Ok(Artwork { id, ..artwork })
        });

        match inserted {
            Ok(artwork) => {
                info!(id = artwork.id, slug = %artwork.slug, "artwork created");
                Ok(artwork)
            }
            Err(e) => {
                warn!(error = %e, "insert failed, discarding new artifacts");
                self.discard(&image);
                Err(e.into())
            }
        }
    }

    /// Update fields and optionally replace the image.
    pub fn update(
        &mut self,
        id: ArtworkId,
        draft: &ArtworkDraft,
        file: Option<&UploadedFile>,
    ) -> Result<Artwork, ArtworkError> {
        let existing = self.store.find(id)?.ok_or(ArtworkError::NotFound(id))?;
        let fields = draft.validate(current_year()).map_err(ArtworkError::Invalid)?;

        let new_image = file
            .map(|file| self.pipeline.process_upload(file))
            .transpose()?;

        let slug = if fields.title != existing.fields.title {
            unique_slug(&self.store, &fields.title, Some(id))
        } else {
            Ok(existing.slug.clone())
        };
        let updated = slug.and_then(|slug| {
            let artwork = Artwork {
                id,
                uuid: existing.uuid,
                slug,
                fields,
                image: new_image.clone().unwrap_or_else(|| existing.image.clone()),
            };
            self.store.update(&artwork)?;
            Ok(artwork)
        });

        match updated {
            Ok(artwork) => {
                if new_image.is_some() {
                    self.discard(&existing.image);
                }
                info!(id, slug = %artwork.slug, replaced_image = new_image.is_some(), "artwork updated");
                Ok(artwork)
            }
            Err(e) => {
                if let Some(image) = &new_image {
                    warn!(id, error = %e, "update failed, discarding new artifacts");
                    self.discard(image);
                }
                Err(e.into())
            }
        }
    }

    /// Remove the record, then its files. Returns whether every file went.
    pub fn delete(&mut self, id: ArtworkId) -> Result<bool, ArtworkError> {
        let removed = self.store.delete(id)?.ok_or(ArtworkError::NotFound(id))?;
        let files_deleted = self.discard(&removed.image);
        info!(id, files_deleted, "artwork deleted");
        Ok(files_deleted)
    }

    pub fn set_published(&mut self, id: ArtworkId, published: bool) -> Result<Artwork, ArtworkError> {
        self.modify(id, |fields| fields.is_published = published)
    }

    pub fn set_featured(&mut self, id: ArtworkId, featured: bool) -> Result<Artwork, ArtworkError> {
        self.modify(id, |fields| fields.is_featured = featured)
    }

    fn modify(
        &mut self,
        id: ArtworkId,
        change: impl FnOnce(&mut ArtworkFields),
    ) -> Result<Artwork, ArtworkError> {
        let mut artwork = self.store.find(id)?.ok_or(ArtworkError::NotFound(id))?;
        change(&mut artwork.fields);
        self.store.update(&artwork)?;
        Ok(artwork)
    }

    fn discard(&self, image: &ArtifactSet) -> bool {
        self.pipeline.delete_artifacts(
            &image.original_path,
            &image.thumbnail_path,
            image.webp_path.as_deref(),
        )
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::imaging::backend::tests::MockBackend;
    use crate::storage::StorageLayout;
    use crate::test_helpers::*;
    use crate::upload::{PipelineOptions, ValidationError};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn draft(title: &str) -> ArtworkDraft {
        ArtworkDraft {
            title: title.to_string(),
            ..ArtworkDraft::default()
        }
    }

    /// Store whose writes can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryArtworkStore,
        fail_writes: bool,
    }

    impl ArtworkStore for FlakyStore {
        fn insert(&mut self, artwork: Artwork) -> Result<ArtworkId, StoreError> {
            if self.fail_writes {
                return Err(StoreError::Unavailable("disk I/O error".into()));
            }
            self.inner.insert(artwork)
        }
        fn update(&mut self, artwork: &Artwork) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Unavailable("disk I/O error".into()));
            }
            self.inner.update(artwork)
        }
        fn delete(&mut self, id: ArtworkId) -> Result<Option<Artwork>, StoreError> {
            self.inner.delete(id)
        }
        fn find(&self, id: ArtworkId) -> Result<Option<Artwork>, StoreError> {
            self.inner.find(id)
        }
        fn find_by_slug(&self, slug: &str) -> Result<Option<Artwork>, StoreError> {
            self.inner.find_by_slug(slug)
        }
    }

    struct Fixture {
        _tmp: TempDir,
        incoming: PathBuf,
        public: PathBuf,
        backend: MockBackend,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let incoming = tmp.path().join("incoming");
            let public = tmp.path().join("public");
            std::fs::create_dir_all(&incoming).unwrap();
            Self {
                _tmp: tmp,
                incoming,
                public,
                backend: MockBackend::new(800, 600),
            }
        }

        fn service(&self) -> ArtworkService<'_, FlakyStore> {
            let layout =
                StorageLayout::from_config(&StorageConfig::default()).with_root(&self.public);
            let pipeline = UploadPipeline::new(&self.backend, layout, PipelineOptions::default());
            ArtworkService::new(pipeline, FlakyStore::default())
        }

        fn upload(&self, name: &str) -> UploadedFile {
            let path = write_file(&self.incoming, name, &jpeg_bytes(8, 8));
            uploaded(&path, name)
        }

        fn files(&self) -> Vec<String> {
            files_under(&self.public)
        }

        fn exists(&self, relative: &str) -> bool {
            Path::new(&self.public).join(relative).exists()
        }
    }

    // =========================================================================
    // Draft validation
    // =========================================================================

    #[test]
    fn valid_draft_is_normalized() {
        let fields = ArtworkDraft {
            title: "  Azure Coastline ".into(),
            description: " Oil study ".into(),
            year: Some(2021),
            technique: " ".into(),
            dimensions: "50 x 70 cm".into(),
            price: Some(450.0),
            currency: "eur".into(),
            is_featured: true,
            is_published: false,
        }
        .validate(2025)
        .unwrap();

        assert_eq!(fields.title, "Azure Coastline");
        assert_eq!(fields.description, "Oil study");
        assert_eq!(fields.technique, None);
        assert_eq!(fields.dimensions.as_deref(), Some("50 x 70 cm"));
        assert_eq!(fields.currency, "EUR");
        assert!(fields.is_featured);
    }

    #[test]
    fn currency_defaults_to_gbp() {
        let fields = draft("Sunrise").validate(2025).unwrap();
        assert_eq!(fields.currency, "GBP");
    }

    #[test]
    fn all_field_errors_are_collected() {
        let errors = ArtworkDraft {
            title: " ".into(),
            year: Some(1899),
            technique: "x".repeat(181),
            dimensions: "x".repeat(121),
            price: Some(-1.0),
            currency: "POUNDS".into(),
            ..ArtworkDraft::default()
        }
        .validate(2025)
        .unwrap_err();

        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["title", "year", "technique", "dimensions", "price", "currency"]
        );
    }

    #[test]
    fn year_bounds_are_inclusive() {
        let mut d = draft("Sunrise");
        d.year = Some(1900);
        assert!(d.validate(2025).is_ok());
        d.year = Some(2025);
        assert!(d.validate(2025).is_ok());
        d.year = Some(2026);
        assert!(d.validate(2025).is_err());
    }

    #[test]
    fn title_length_counts_characters() {
        assert!(draft(&"é".repeat(180)).validate(2025).is_ok());
        assert!(draft(&"é".repeat(181)).validate(2025).is_err());
    }

    #[test]
    fn zero_price_is_allowed() {
        let mut d = draft("Gift");
        d.price = Some(0.0);
        assert!(d.validate(2025).is_ok());
        d.price = Some(f64::NAN);
        assert!(d.validate(2025).is_err());
    }

    // =========================================================================
    // Slugs
    // =========================================================================

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Azure Coastline"), "azure-coastline");
        assert_eq!(slugify("  Still Life -- No. 3!  "), "still-life-no-3");
        assert_eq!(slugify("Café"), "caf");
        assert_eq!(slugify("???"), "artwork");
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[test]
    fn create_persists_record_and_files() {
        let fx = Fixture::new();
        let mut service = fx.service();

        let artwork = service.create(&draft("Azure Coastline"), &fx.upload("a.jpg")).unwrap();
        assert_eq!(artwork.id, 1);
        assert_eq!(artwork.slug, "azure-coastline");
        assert_eq!(artwork.uuid, artwork.image.uuid);
        assert!(fx.exists(&artwork.image.original_path));
        assert!(fx.exists(&artwork.image.thumbnail_path));
        assert_eq!(service.store().find(1).unwrap(), Some(artwork));
    }

    #[test]
    fn duplicate_titles_get_numbered_slugs() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let slugs: Vec<_> = (0..3)
            .map(|i| {
                service
                    .create(&draft("Sunrise"), &fx.upload(&format!("{i}.jpg")))
                    .unwrap()
                    .slug
            })
            .collect();
        assert_eq!(slugs, vec!["sunrise", "sunrise-2", "sunrise-3"]);
    }

    #[test]
    fn invalid_draft_writes_nothing() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let err = service.create(&draft(""), &fx.upload("a.jpg")).unwrap_err();
        assert!(matches!(err, ArtworkError::Invalid(_)));
        assert!(fx.files().is_empty());
        assert!(fx.backend.get_operations().is_empty());
    }

    #[test]
    fn upload_failure_surfaces_validation_message() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let path = write_file(&fx.incoming, "notes.jpg", b"not an image");
        let err = service
            .create(&draft("Sunrise"), &uploaded(&path, "notes.jpg"))
            .unwrap_err();
        assert!(matches!(
            &err,
            ArtworkError::Upload(UploadError::Validation(ValidationError::NotAnImage))
        ));
        assert_eq!(err.user_message(), "The file is not a valid image.");
        assert!(service.store().inner.is_empty());
    }

    #[test]
    fn failed_insert_removes_new_artifacts() {
        let fx = Fixture::new();
        let mut service = fx.service();
        service.store.fail_writes = true;

        let err = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap_err();
        assert!(matches!(err, ArtworkError::Store(_)));
        assert!(fx.files().is_empty());
    }

    #[test]
    fn update_with_new_image_deletes_old_files_after_success() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let original = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap();

        let updated = service
            .update(original.id, &draft("Sunrise"), Some(&fx.upload("b.jpg")))
            .unwrap();
        assert_ne!(updated.image.original_path, original.image.original_path);
        assert_eq!(updated.uuid, original.uuid);
        assert!(!fx.exists(&original.image.original_path));
        assert!(!fx.exists(&original.image.thumbnail_path));
        assert!(fx.exists(&updated.image.original_path));
        assert_eq!(fx.files().len(), 3);
    }

    #[test]
    fn failed_update_keeps_old_files_and_removes_new() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let original = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap();
        let before = fx.files();

        service.store.fail_writes = true;
        let err = service
            .update(original.id, &draft("Sunrise"), Some(&fx.upload("b.jpg")))
            .unwrap_err();
        assert!(matches!(err, ArtworkError::Store(_)));
        assert_eq!(fx.files(), before);
        assert_eq!(service.store().find(original.id).unwrap(), Some(original));
    }

    #[test]
    fn update_without_image_keeps_files() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let original = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap();

        let updated = service.update(original.id, &draft("Dawn"), None).unwrap();
        assert_eq!(updated.slug, "dawn");
        assert_eq!(updated.image, original.image);
        assert!(fx.exists(&original.image.original_path));
    }

    #[test]
    fn retitle_keeps_own_slug_free() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let a = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap();
        service.create(&draft("Dawn"), &fx.upload("b.jpg")).unwrap();

        // Title differs only in case, slug stays the same
        let renamed = service.update(a.id, &draft("SUNRISE"), None).unwrap();
        assert_eq!(renamed.slug, "sunrise");
        // Taking another artwork's title gets a suffix
        let clash = service.update(a.id, &draft("Dawn"), None).unwrap();
        assert_eq!(clash.slug, "dawn-2");
    }

    #[test]
    fn update_missing_artwork_is_not_found() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let err = service
            .update(42, &draft("Sunrise"), Some(&fx.upload("a.jpg")))
            .unwrap_err();
        assert!(matches!(err, ArtworkError::NotFound(42)));
        assert!(fx.files().is_empty());
    }

    #[test]
    fn delete_removes_record_then_files() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let artwork = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap();

        assert!(service.delete(artwork.id).unwrap());
        assert_eq!(service.store().find(artwork.id).unwrap(), None);
        assert!(fx.files().is_empty());
        assert!(matches!(
            service.delete(artwork.id),
            Err(ArtworkError::NotFound(_))
        ));
    }

    #[test]
    fn delete_with_missing_files_still_succeeds() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let artwork = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap();
        std::fs::remove_file(fx.public.join(&artwork.image.original_path)).unwrap();

        assert!(service.delete(artwork.id).unwrap());
        assert!(fx.files().is_empty());
    }

    #[test]
    fn publish_and_feature_toggles() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let artwork = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap();
        assert!(!artwork.fields.is_published);

        let published = service.set_published(artwork.id, true).unwrap();
        assert!(published.fields.is_published);
        let featured = service.set_featured(artwork.id, true).unwrap();
        assert!(featured.fields.is_featured && featured.fields.is_published);
        assert!(matches!(
            service.set_featured(99, true),
            Err(ArtworkError::NotFound(99))
        ));
    }

    #[test]
    fn memory_store_rejects_duplicate_slug() {
        let fx = Fixture::new();
        let mut service = fx.service();
        let artwork = service.create(&draft("Sunrise"), &fx.upload("a.jpg")).unwrap();

        let mut store = MemoryArtworkStore::new();
        store.insert(artwork.clone()).unwrap();
        assert_eq!(
            store.insert(artwork),
            Err(StoreError::DuplicateSlug("sunrise".into()))
        );
        assert_eq!(store.len(), 1);
    }
}
