//! App operations

use super::Cms;
use crate::error::CmsResult;
use crate::validate;
use cms_model::App;
use cms_store::{StoreTx, TreeStore};

impl<S: TreeStore> Cms<S> {
    /// Every app, ordered by name
    pub async fn list_apps(&self) -> CmsResult<Vec<App>> {
        let mut tx = self.begin().await?;
        Ok(tx.apps().await?)
    }

    /// Whether an app of that name exists
    pub async fn app_exists(&self, name: &str) -> CmsResult<bool> {
        let mut tx = self.begin().await?;
        Ok(tx.app(name).await?.is_some())
    }

    /// Get or create an app
    pub async fn create_app(&self, name: &str) -> CmsResult<App> {
        validate::name("app name", name)?;

        let mut tx = self.begin().await?;
        let app = tx.first_or_create_app(name).await?;
        tx.commit().await?;

        tracing::info!(app = %app.name, "created app");
        Ok(app)
    }
}
