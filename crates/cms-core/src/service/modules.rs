//! Module operations

use super::{filter_lookup, name_free, require_app, restore_entity, Cms};
use crate::error::{CmsError, CmsResult};
use crate::{sync, validate};
use cms_cache::keys;
use cms_model::{CreateModule, LookupEntry, Module, ModuleId, UpdateModule};
use cms_store::{EntityRef, ModuleDraft, StoreTx, TreeStore};

impl<S: TreeStore> Cms<S> {
    /// Whether a module name is free within an app
    pub async fn module_name_available(
        &self,
        app_name: &str,
        name: &str,
        ignore: Option<&str>,
    ) -> CmsResult<bool> {
        let mut tx = self.begin().await?;
        let modules = tx.modules_of_app(app_name).await?;
        Ok(name_free(modules.iter().map(|m| m.name.as_str()), name, ignore))
    }

    /// Create a module
    ///
    /// # Errors
    /// - `NotFound` if the app does not exist
    /// - `NameCollision` if the app already has a module of that name
    pub async fn create_module(&self, request: &CreateModule) -> CmsResult<Module> {
        validate::name("app name", &request.app_name)?;
        validate::name("module name", &request.name)?;
        validate::name("module type", &request.module_type)?;

        let mut tx = self.begin().await?;
        require_app(&mut tx, &request.app_name).await?;
        let modules = tx.modules_of_app(&request.app_name).await?;
        if !name_free(modules.iter().map(|m| m.name.as_str()), &request.name, None) {
            return Err(CmsError::NameCollision(format!(
                "module '{}' already exists in app '{}'",
                request.name, request.app_name
            )));
        }
        let module = tx
            .first_or_create_module(ModuleDraft {
                app_name: request.app_name.clone(),
                module_type: request.module_type.clone(),
                name: request.name.clone(),
                settings: request.settings.clone(),
            })
            .await?;
        tx.commit().await?;

        tracing::info!(module_id = %module.id, app = %module.app_name, "created module");
        self.invalidate_modules(&module.app_name).await;
        Ok(module)
    }

    /// Overwrite type, name and settings
    ///
    /// # Errors
    /// `OutOfSync` if the module changed since the client read it.
    pub async fn update_module(&self, id: ModuleId, request: &UpdateModule) -> CmsResult<Module> {
        validate::name("module name", &request.name)?;
        validate::name("module type", &request.module_type)?;

        let stored = self.get_module(id).await?;
        sync::check_record(&EntityRef::Module(id), request.updated_at, stored.updated_at)?;

        let mut tx = self.begin().await?;
        let mut module = tx
            .module(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Module(id)))?;
        let modules = tx.modules_of_app(&module.app_name).await?;
        if !name_free(
            modules.iter().map(|m| m.name.as_str()),
            &request.name,
            Some(&module.name),
        ) {
            return Err(CmsError::NameCollision(format!(
                "module '{}' already exists in app '{}'",
                request.name, module.app_name
            )));
        }
        module.module_type.clone_from(&request.module_type);
        module.name.clone_from(&request.name);
        module.settings = request.settings.clone();
        let module = tx.save_module(&module).await?;
        tx.commit().await?;

        tracing::info!(module_id = %id, "updated module");
        self.invalidate_modules(&module.app_name).await;
        Ok(module)
    }

    /// Fetch a live module
    pub async fn get_module(&self, id: ModuleId) -> CmsResult<Module> {
        let mut tx = self.begin().await?;
        tx.module(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Module(id)))
    }

    /// Soft-delete a module
    pub async fn delete_module(&self, id: ModuleId) -> CmsResult<()> {
        let mut tx = self.begin().await?;
        let module = tx
            .module(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Module(id)))?;
        tx.soft_delete(EntityRef::Module(id)).await?;
        tx.commit().await?;

        tracing::info!(module_id = %id, "deleted module");
        self.invalidate_modules(&module.app_name).await;
        Ok(())
    }

    /// Restore a soft-deleted module
    pub async fn restore_module(&self, id: ModuleId) -> CmsResult<Module> {
        let mut tx = self.begin().await?;
        let live = tx.module(id).await?.is_some();
        restore_entity(&mut tx, EntityRef::Module(id), live).await?;
        let module = tx
            .module(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Module(id)))?;
        tx.commit().await?;

        self.invalidate_modules(&module.app_name).await;
        Ok(module)
    }

    /// Id/name list of an app's modules, served from cache
    pub async fn module_lookup(
        &self,
        app_name: &str,
        name: Option<&str>,
    ) -> CmsResult<Vec<LookupEntry<ModuleId>>> {
        let entries = self
            .cache
            .read_through(&keys::modules_lookup(app_name), || async {
                let mut tx = self.begin().await?;
                let modules = tx.modules_of_app(app_name).await?;
                Ok::<_, CmsError>(
                    modules
                        .into_iter()
                        .map(|m| LookupEntry::new(m.id, m.name))
                        .collect(),
                )
            })
            .await?;
        Ok(filter_lookup(entries, name))
    }

    async fn invalidate_modules(&self, app_name: &str) {
        self.cache.invalidate(&keys::modules_lookup(app_name)).await;
    }
}
