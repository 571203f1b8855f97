//! Page and page-partial operations

use super::{name_free, restore_entity, Cms};
use crate::error::{CmsError, CmsResult};
use crate::reconcile::indexing::{self, IndexingOwner};
use crate::{loader, reconcile, sync, validate};
use cms_cache::keys;
use cms_model::{
    CreatePartial, MenuItemId, Page, PageKey, PagePartial, PartialId, PublishedPage, UpdatePage,
    UpdatePartial, VersionId,
};
use cms_store::{EntityRef, StoreTx, TreeStore};

impl<S: TreeStore> Cms<S> {
    /// Fetch a live page
    pub async fn get_page(&self, key: &PageKey) -> CmsResult<Page> {
        let mut tx = self.begin().await?;
        tx.page(key)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Page(key.clone())))
    }

    /// Return the page of a menu item in a locale, creating a disabled one
    pub async fn get_or_create_page(&self, key: &PageKey, name: &str) -> CmsResult<Page> {
        validate::locale(&key.locale)?;
        validate::name("page name", name)?;

        let mut tx = self.begin().await?;
        if tx.menu_item(key.menu_item_id).await?.is_none() {
            return Err(CmsError::not_found(&EntityRef::MenuItem(key.menu_item_id)));
        }
        let page = tx.get_or_create_page(key, name).await?;
        tx.commit().await?;
        Ok(page)
    }

    /// Overwrite a page's metadata and replace its indexing set
    ///
    /// Only the published-menus view of this page's locale is invalidated.
    ///
    /// # Errors
    /// - `Validation` for a blank name or a repeated indexing option
    /// - `OutOfSync` if the page changed since the client read it
    pub async fn update_page(&self, key: &PageKey, request: &UpdatePage) -> CmsResult<Page> {
        validate::update_page(request)?;

        let stored = self.get_page(key).await?;
        sync::check_record(&EntityRef::Page(key.clone()), request.updated_at, stored.updated_at)?;

        let mut tx = self.begin().await?;
        let mut page = tx
            .page(key)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Page(key.clone())))?;
        page.name.clone_from(&request.name);
        page.plugin.clone_from(&request.plugin);
        page.meta_title.clone_from(&request.meta_title);
        page.meta_description.clone_from(&request.meta_description);
        page.hashtag.clone_from(&request.hashtag);
        page.new_tab_enabled = request.new_tab_enabled;
        page.url_enabled = request.url_enabled;
        page.url.clone_from(&request.url);
        page.enabled_at = request.enabled_at;
        tx.save_page(&page).await?;
        indexing::replace(&mut tx, IndexingOwner::Page(key), &page.indexing, &request.indexing)
            .await?;
        let page = tx
            .page(key)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Page(key.clone())))?;
        let version_id = tx.menu_item(key.menu_item_id).await?.map(|item| item.version_id);
        tx.commit().await?;

        tracing::info!(
            menu_item_id = %key.menu_item_id,
            locale = %key.locale,
            indexing = page.indexing.len(),
            "updated page"
        );
        self.invalidate_page(key, version_id).await;
        Ok(page)
    }

    /// A page as published, with its ordered partials, served from cache
    ///
    /// # Errors
    /// `NotFound` unless both the page and its menu item are live and enabled.
    pub async fn published_page(&self, key: &PageKey) -> CmsResult<PublishedPage> {
        validate::locale(&key.locale)?;
        let published = self
            .cache
            .read_through_field_entry(
                &keys::pages_by_menu_item(key.menu_item_id),
                &key.locale,
                || async {
                    let mut tx = self.begin().await?;
                    let item = tx.menu_item(key.menu_item_id).await?;
                    if !item.is_some_and(|item| item.is_enabled()) {
                        return Ok(None);
                    }
                    let Some(page) = tx.page(key).await?.filter(Page::is_enabled) else {
                        return Ok(None);
                    };
                    let mut partials = Vec::new();
                    for partial in tx.partials_of_page(key).await? {
                        partials.push(loader::partial(&mut tx, partial.id).await?);
                    }
                    Ok::<_, CmsError>(Some(PublishedPage::new(page, partials)))
                },
            )
            .await?;
        published.ok_or_else(|| CmsError::not_found(&EntityRef::Page(key.clone())))
    }

    /// Soft-delete a page
    pub async fn delete_page(&self, key: &PageKey) -> CmsResult<()> {
        let mut tx = self.begin().await?;
        if tx.page(key).await?.is_none() {
            return Err(CmsError::not_found(&EntityRef::Page(key.clone())));
        }
        tx.soft_delete(EntityRef::Page(key.clone())).await?;
        let version_id = tx.menu_item(key.menu_item_id).await?.map(|item| item.version_id);
        tx.commit().await?;

        self.invalidate_page(key, version_id).await;
        Ok(())
    }

    /// Restore a soft-deleted page
    pub async fn restore_page(&self, key: &PageKey) -> CmsResult<Page> {
        let mut tx = self.begin().await?;
        let live = tx.page(key).await?.is_some();
        restore_entity(&mut tx, EntityRef::Page(key.clone()), live).await?;
        let page = tx
            .page(key)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Page(key.clone())))?;
        let version_id = tx.menu_item(key.menu_item_id).await?.map(|item| item.version_id);
        tx.commit().await?;

        self.invalidate_page(key, version_id).await;
        Ok(page)
    }

    /// Whether a partial name is free on a page
    pub async fn partial_name_available(
        &self,
        key: &PageKey,
        name: &str,
        ignore: Option<&str>,
    ) -> CmsResult<bool> {
        let mut tx = self.begin().await?;
        let partials = tx.partials_of_page(key).await?;
        Ok(name_free(partials.iter().map(|p| p.name.as_str()), name, ignore))
    }

    /// Create a partial on a page with its rows and columns
    ///
    /// # Errors
    /// - `NotFound` if the page or a referenced module does not exist
    /// - `NameCollision` if the page already has a partial of that name
    pub async fn create_partial(
        &self,
        key: &PageKey,
        request: &CreatePartial,
    ) -> CmsResult<PagePartial> {
        validate::create_partial(request)?;

        let mut tx = self.begin().await?;
        if tx.page(key).await?.is_none() {
            return Err(CmsError::not_found(&EntityRef::Page(key.clone())));
        }
        let partials = tx.partials_of_page(key).await?;
        if !name_free(partials.iter().map(|p| p.name.as_str()), &request.name, None) {
            return Err(CmsError::NameCollision(format!(
                "partial '{}' already exists on page {}/{}",
                request.name, key.menu_item_id, key.locale
            )));
        }

        let partial = tx.first_or_create_partial(key, &request.name).await?;
        reconcile::partial::create_rows(&mut tx, &partial, &request.rows).await?;
        let partial = loader::partial(&mut tx, partial.id).await?;
        tx.commit().await?;

        tracing::info!(partial_id = %partial.id, rows = partial.rows.len(), "created partial");
        self.invalidate_item_pages(key.menu_item_id).await;
        Ok(partial)
    }

    /// Reconcile a partial against a full client snapshot
    ///
    /// # Errors
    /// - `OutOfSync` if the partial, any row or any column is stale
    /// - `NotFound` for an unknown row or column id
    /// - `NameCollision` if the new name is taken on the page
    pub async fn update_partial(
        &self,
        id: PartialId,
        request: &UpdatePartial,
    ) -> CmsResult<PagePartial> {
        validate::update_partial(request)?;

        let stored = self.get_partial(id).await?;
        sync::check_partial(&stored, request)?;

        let mut tx = self.begin().await?;
        let mut partial = loader::partial(&mut tx, id).await?;
        if request.name != partial.name {
            let partials = tx.partials_of_page(&partial.page).await?;
            if !name_free(partials.iter().map(|p| p.name.as_str()), &request.name, None) {
                return Err(CmsError::NameCollision(format!(
                    "partial '{}' already exists on page {}/{}",
                    request.name, partial.page.menu_item_id, partial.page.locale
                )));
            }
        }
        partial.name.clone_from(&request.name);
        tx.save_partial(&partial).await?;

        reconcile::partial::update_rows(&mut tx, &partial, &request.rows).await?;
        let partial = loader::partial(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(partial_id = %id, rows = partial.rows.len(), "updated partial");
        self.invalidate_item_pages(partial.page.menu_item_id).await;
        Ok(partial)
    }

    /// Fetch a live partial with ordered rows and columns
    pub async fn get_partial(&self, id: PartialId) -> CmsResult<PagePartial> {
        let mut tx = self.begin().await?;
        loader::partial(&mut tx, id).await
    }

    /// Every live partial of a page
    pub async fn page_partials(&self, key: &PageKey) -> CmsResult<Vec<PagePartial>> {
        let mut tx = self.begin().await?;
        let mut partials = Vec::new();
        for partial in tx.partials_of_page(key).await? {
            partials.push(loader::partial(&mut tx, partial.id).await?);
        }
        Ok(partials)
    }

    /// Soft-delete a partial
    pub async fn delete_partial(&self, id: PartialId) -> CmsResult<()> {
        let mut tx = self.begin().await?;
        let partial = tx
            .partial(id)
            .await?
            .ok_or_else(|| CmsError::not_found(&EntityRef::Partial(id)))?;
        tx.soft_delete(EntityRef::Partial(id)).await?;
        tx.commit().await?;

        tracing::info!(partial_id = %id, "deleted partial");
        self.invalidate_item_pages(partial.page.menu_item_id).await;
        Ok(())
    }

    /// Restore a soft-deleted partial
    pub async fn restore_partial(&self, id: PartialId) -> CmsResult<PagePartial> {
        let mut tx = self.begin().await?;
        let live = tx.partial(id).await?.is_some();
        restore_entity(&mut tx, EntityRef::Partial(id), live).await?;
        let partial = loader::partial(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(partial_id = %id, "restored partial");
        self.invalidate_item_pages(partial.page.menu_item_id).await;
        Ok(partial)
    }

    async fn invalidate_item_pages(&self, item: MenuItemId) {
        self.cache.invalidate(&keys::pages_by_menu_item(item)).await;
    }

    async fn invalidate_page(&self, key: &PageKey, version_id: Option<VersionId>) {
        self.invalidate_item_pages(key.menu_item_id).await;
        if let Some(version_id) = version_id {
            self.cache
                .invalidate_field(&keys::version_locales(version_id), &key.locale)
                .await;
        }
    }
}
