//! Version operations

use super::{filter_lookup, name_free, require_app, restore_entity, Cms};
use crate::error::{CmsError, CmsResult};
use crate::{sync, validate};
use chrono::Utc;
use cms_cache::keys;
use cms_model::{CreateVersion, LookupEntry, UpdateVersion, Version, VersionId};
use cms_store::{EntityRef, StoreTx, TreeStore, VersionDraft};

impl<S: TreeStore> Cms<S> {
    /// Whether a version name is free within an app
    pub async fn version_name_available(
        &self,
        app_name: &str,
        name: &str,
        ignore: Option<&str>,
    ) -> CmsResult<bool> {
        let mut tx = self.begin().await?;
        let versions = tx.versions_of_app(app_name).await?;
        Ok(name_free(versions.iter().map(|v| v.name.as_str()), name, ignore))
    }

    /// Get or create a version with exactly these attributes
    ///
    /// # Errors
    /// - `NotFound` if the app does not exist
    /// - `NameCollision` if a version of that name exists with other attributes
    pub async fn create_version(&self, request: &CreateVersion) -> CmsResult<Version> {
        validate::name("app name", &request.app_name)?;
        validate::name("version name", &request.name)?;

        let mut tx = self.begin().await?;
        require_app(&mut tx, &request.app_name).await?;
        let version = tx
            .first_or_create_version(VersionDraft {
                app_name: request.app_name.clone(),
                name: request.name.clone(),
                enabled_at: request.enabled_at,
            })
            .await?;
        tx.commit().await?;

        tracing::info!(version_id = %version.id, app = %version.app_name, "created version");
        self.invalidate_versions(&version.app_name).await;
        Ok(version)
    }

    /// Overwrite name and enabled-at
    ///
    /// # Errors
    /// - `OutOfSync` if the version changed since the client read it
    /// - `Validation` if the published version would become disabled
    /// - `NameCollision` if the new name is taken in the app
    pub async fn update_version(
        &self,
        id: VersionId,
        request: &UpdateVersion,
    ) -> CmsResult<Version> {
        validate::name("version name", &request.name)?;

        let stored = self.get_version(id).await?;
        sync::check_record(&EntityRef::Version(id), request.updated_at, stored.updated_at)?;
        if stored.published_at.is_some() && request.enabled_at.is_none() {
            return Err(CmsError::validation(format!(
                "published version {id} must stay enabled"
            )));
        }

        let mut tx = self.begin().await?;
        let mut version = tx
            .version(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Version(id)))?;
        let versions = tx.versions_of_app(&version.app_name).await?;
        if !name_free(
            versions.iter().map(|v| v.name.as_str()),
            &request.name,
            Some(&version.name),
        ) {
            return Err(CmsError::NameCollision(format!(
                "version '{}' already exists in app '{}'",
                request.name, version.app_name
            )));
        }
        version.name.clone_from(&request.name);
        version.enabled_at = request.enabled_at;
        let version = tx.save_version(&version).await?;
        tx.commit().await?;

        tracing::info!(version_id = %id, "updated version");
        self.invalidate_versions(&version.app_name).await;
        Ok(version)
    }

    /// Make `id` the only published version of its app
    ///
    /// # Errors
    /// `Validation` if the version is disabled or already published.
    pub async fn publish_version(&self, id: VersionId) -> CmsResult<Version> {
        let mut tx = self.begin().await?;
        let mut target = tx
            .version(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Version(id)))?;
        if target.enabled_at.is_none() {
            return Err(CmsError::validation(format!("version {id} is not enabled")));
        }
        if target.published_at.is_some() {
            return Err(CmsError::validation(format!("version {id} is already published")));
        }

        for mut other in tx.versions_of_app(&target.app_name).await? {
            if other.id != id && other.published_at.is_some() {
                other.published_at = None;
                tx.save_version(&other).await?;
            }
        }
        target.published_at = Some(Utc::now());
        let published = tx.save_version(&target).await?;
        tx.commit().await?;

        tracing::info!(version_id = %id, app = %published.app_name, "published version");
        self.invalidate_versions(&published.app_name).await;
        Ok(published)
    }

    /// Fetch a live version
    pub async fn get_version(&self, id: VersionId) -> CmsResult<Version> {
        let mut tx = self.begin().await?;
        tx.version(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Version(id)))
    }

    /// The published version of an app, if any
    pub async fn published_version(&self, app_name: &str) -> CmsResult<Option<Version>> {
        let mut tx = self.begin().await?;
        let versions = tx.versions_of_app(app_name).await?;
        Ok(versions.into_iter().find(|v| v.published_at.is_some()))
    }

    /// Soft-delete a version
    ///
    /// # Errors
    /// `Validation` if the version is the published one.
    pub async fn delete_version(&self, id: VersionId) -> CmsResult<()> {
        let mut tx = self.begin().await?;
        let version = tx
            .version(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Version(id)))?;
        if version.published_at.is_some() {
            return Err(CmsError::validation(format!(
                "published version {id} cannot be deleted"
            )));
        }
        tx.soft_delete(EntityRef::Version(id)).await?;
        tx.commit().await?;

        tracing::info!(version_id = %id, "deleted version");
        self.invalidate_versions(&version.app_name).await;
        Ok(())
    }

    /// Restore a soft-deleted version
    pub async fn restore_version(&self, id: VersionId) -> CmsResult<Version> {
        let mut tx = self.begin().await?;
        let live = tx.version(id).await?.is_some();
        restore_entity(&mut tx, EntityRef::Version(id), live).await?;
        let version = tx
            .version(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Version(id)))?;
        tx.commit().await?;

        tracing::info!(version_id = %id, "restored version");
        self.invalidate_versions(&version.app_name).await;
        Ok(version)
    }

    /// Id/name list of an app's enabled versions, served from cache
    pub async fn version_lookup(
        &self,
        app_name: &str,
        name: Option<&str>,
    ) -> CmsResult<Vec<LookupEntry<VersionId>>> {
        let entries = self
            .cache
            .read_through(&keys::versions_lookup(app_name), || async {
                let mut tx = self.begin().await?;
                let versions = tx.versions_of_app(app_name).await?;
                Ok::<_, CmsError>(
                    versions
                        .into_iter()
                        .filter(|v| v.enabled_at.is_some())
                        .map(|v| LookupEntry::new(v.id, v.name))
                        .collect(),
                )
            })
            .await?;
        Ok(filter_lookup(entries, name))
    }

    async fn invalidate_versions(&self, app_name: &str) {
        self.cache.invalidate(&keys::versions_lookup(app_name)).await;
    }
}
