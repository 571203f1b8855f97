//! Cached reads stay coherent with committed writes

use cms_cache::{keys, CacheClient, CacheResult};
use cms_core::{Cms, CmsConfig, CmsError};
use cms_model::{
    CreateMenu, CreateMenuItem, CreatePartial, CreateVersion, IndexingDirective, IndexingOption,
    MenuItemId, PageKey, UpdateVersion, Version, VersionId,
};
use cms_store::MemoryStore;
use cms_test_utils::{
    menu_snapshot, page_snapshot, partial_snapshot, seed_app, seed_version, setup_cms_with_cache,
    setup_test_cms, ts, CacheOp, FailingCache, RecordingCache, TEST_APP,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

mockall::mock! {
    pub Cache {}

    #[async_trait::async_trait]
    impl CacheClient for Cache {
        async fn exists(&self, key: &str) -> CacheResult<bool>;
        async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;
        async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;
        async fn delete(&self, key: &str) -> CacheResult<()>;
    }
}

fn version_request(name: &str) -> CreateVersion {
    CreateVersion {
        app_name: TEST_APP.to_string(),
        name: name.to_string(),
        enabled_at: Some(ts(1_000)),
    }
}

/// Enabled and published version in [`TEST_APP`]
async fn seed_published(cms: &Cms<MemoryStore>, name: &str) -> Version {
    let version = seed_version(cms, name).await;
    cms.publish_version(version.id).await.unwrap()
}

/// Enabled page for `item` in `locale`
async fn enable_page(cms: &Cms<MemoryStore>, item: MenuItemId, locale: &str, name: &str) {
    let key = PageKey::new(item, locale);
    let page = cms.get_or_create_page(&key, name).await.unwrap();
    let mut update = page_snapshot(&page);
    update.enabled_at = Some(ts(2_000));
    cms.update_page(&key, &update).await.unwrap();
}

fn lookup_names<I>(entries: &[cms_model::LookupEntry<I>]) -> Vec<&str> {
    entries.iter().map(|entry| entry.name.as_str()).collect()
}

#[tokio::test]
async fn new_version_shows_up_in_cached_lookup() {
    let recording = Arc::new(RecordingCache::new());
    let cms = setup_cms_with_cache(recording.clone());
    seed_app(&cms).await;
    cms.create_version(&version_request("v1")).await.unwrap();

    let first = cms.version_lookup(TEST_APP, None).await.unwrap();
    assert_eq!(lookup_names(&first), vec!["v1"]);
    assert!(recording.contains(&keys::versions_lookup(TEST_APP)));

    recording.clear_ops();
    cms.create_version(&version_request("v2")).await.unwrap();
    assert_eq!(
        recording.deleted_keys(),
        vec![keys::versions_lookup(TEST_APP)]
    );

    let second = cms.version_lookup(TEST_APP, None).await.unwrap();
    assert_eq!(lookup_names(&second), vec!["v1", "v2"]);
}

#[tokio::test]
async fn lookup_is_served_from_cache_between_writes() {
    let recording = Arc::new(RecordingCache::new());
    let cms = setup_cms_with_cache(recording.clone());
    seed_app(&cms).await;
    cms.create_version(&version_request("v1")).await.unwrap();

    cms.version_lookup(TEST_APP, None).await.unwrap();
    recording.clear_ops();
    let filtered = cms.version_lookup(TEST_APP, Some("V1")).await.unwrap();

    assert_eq!(lookup_names(&filtered), vec!["v1"]);
    assert_eq!(
        recording.ops(),
        vec![CacheOp::Get(keys::versions_lookup(TEST_APP))]
    );
}

#[tokio::test]
async fn moka_backed_lookup_sees_new_menu() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;
    cms.create_menu(&CreateMenu {
        version_id: version.id,
        name: "Main".to_string(),
        items: Vec::new(),
    })
    .await
    .unwrap();
    assert_eq!(
        lookup_names(&cms.menu_lookup(version.id, None).await.unwrap()),
        vec!["Main"]
    );

    cms.create_menu(&CreateMenu {
        version_id: version.id,
        name: "Footer".to_string(),
        items: Vec::new(),
    })
    .await
    .unwrap();

    let mut names = lookup_names(&cms.menu_lookup(version.id, None).await.unwrap())
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["Footer", "Main"]);
}

#[tokio::test]
async fn cache_outage_never_fails_an_operation() {
    let failing = Arc::new(FailingCache::new());
    let cms = setup_cms_with_cache(failing.clone());

    seed_app(&cms).await;
    let version = cms.create_version(&version_request("v1")).await.unwrap();
    cms.publish_version(version.id).await.unwrap();
    let lookup = cms.version_lookup(TEST_APP, None).await.unwrap();
    assert_eq!(lookup_names(&lookup), vec!["v1"]);

    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home")],
        })
        .await
        .unwrap();
    cms.update_menu(menu.menu.id, &menu_snapshot(&menu)).await.unwrap();
    assert!(cms.published_menus(version.id, "en").await.unwrap()[0]
        .relations
        .is_empty());

    assert!(failing.calls() > 0);
}

#[tokio::test]
async fn menu_update_clears_menu_and_page_entries() {
    let recording = Arc::new(RecordingCache::new());
    let cms = setup_cms_with_cache(recording.clone());
    let version = seed_version(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home")],
        })
        .await
        .unwrap();
    let home = menu.relations[0].child.id;

    recording.clear_ops();
    cms.update_menu(menu.menu.id, &menu_snapshot(&menu)).await.unwrap();

    let deleted = recording.deleted_keys();
    assert!(deleted.contains(&keys::menus_lookup(version.id)));
    assert!(deleted.contains(&keys::version_locales(version.id)));
    assert!(deleted.contains(&keys::pages_by_menu_item(home)));
}

#[tokio::test]
async fn page_update_refreshes_only_its_locale() {
    let cms = setup_test_cms();
    let version = seed_published(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home").enabled(ts(2_000))],
        })
        .await
        .unwrap();
    let home = menu.relations[0].child.id;
    for locale in ["en", "de"] {
        enable_page(&cms, home, locale, "Home").await;
    }

    let en = cms.published_menus(version.id, "en").await.unwrap();
    let de = cms.published_menus(version.id, "de").await.unwrap();
    assert_eq!(en[0].root_names(), vec!["Home"]);
    assert_eq!(de[0].root_names(), vec!["Home"]);

    let key = PageKey::new(home, "de");
    let mut update = page_snapshot(&cms.get_page(&key).await.unwrap());
    update.name = "Startseite".to_string();
    update.enabled_at = None;
    cms.update_page(&key, &update).await.unwrap();

    assert!(cms.published_menus(version.id, "de").await.unwrap()[0]
        .relations
        .is_empty());
    assert_eq!(
        cms.published_menus(version.id, "en").await.unwrap()[0].root_names(),
        vec!["Home"]
    );
}

#[tokio::test]
async fn published_menus_drop_children_of_hidden_items() {
    let cms = setup_test_cms();
    let version = seed_published(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Shop")
                .with_items(vec![CreateMenuItem::new("Cart").enabled(ts(2_000))])],
        })
        .await
        .unwrap();
    for view in &menu.relations {
        enable_page(&cms, view.child.id, "en", &view.child.name).await;
    }

    let published = cms.published_menus(version.id, "en").await.unwrap();
    assert!(published[0].relations.is_empty());
}

#[tokio::test]
async fn menu_delete_and_restore_clear_menu_entries() {
    let recording = Arc::new(RecordingCache::new());
    let cms = setup_cms_with_cache(recording.clone());
    let version = seed_published(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home")],
        })
        .await
        .unwrap();
    cms.menu_lookup(version.id, None).await.unwrap();
    cms.published_menus(version.id, "en").await.unwrap();
    assert!(recording.contains(&keys::menus_lookup(version.id)));
    assert!(recording.contains(&keys::version_locales(version.id)));

    recording.clear_ops();
    cms.delete_menu(menu.menu.id).await.unwrap();
    assert_eq!(
        recording.deleted_keys(),
        vec![keys::menus_lookup(version.id), keys::version_locales(version.id)]
    );
    assert!(cms.menu_lookup(version.id, None).await.unwrap().is_empty());

    cms.published_menus(version.id, "en").await.unwrap();
    recording.clear_ops();
    cms.restore_menu(menu.menu.id).await.unwrap();
    assert_eq!(
        recording.deleted_keys(),
        vec![keys::menus_lookup(version.id), keys::version_locales(version.id)]
    );
    assert_eq!(
        lookup_names(&cms.menu_lookup(version.id, None).await.unwrap()),
        vec!["Main"]
    );
}

#[tokio::test]
async fn published_page_is_cached_until_its_content_changes() {
    let recording = Arc::new(RecordingCache::new());
    let cms = setup_cms_with_cache(recording.clone());
    let version = seed_version(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home").enabled(ts(2_000))],
        })
        .await
        .unwrap();
    let home = menu.relations[0].child.id;
    let key = PageKey::new(home, "en");
    let page = cms.get_or_create_page(&key, "Home").await.unwrap();
    let update = page_snapshot(&page)
        .enabled(ts(2_000))
        .with_meta("Welcome", "Landing page")
        .with_indexing(vec![IndexingDirective::new(IndexingOption::NoArchive)]);
    cms.update_page(&key, &update).await.unwrap();
    let partial = cms
        .create_partial(
            &key,
            &CreatePartial {
                name: "hero".to_string(),
                rows: Vec::new(),
            },
        )
        .await
        .unwrap();

    let first = cms.published_page(&key).await.unwrap();
    assert_eq!(first.meta_title.as_deref(), Some("Welcome"));
    assert_eq!(first.indexing.len(), 1);
    assert_eq!(first.partials.len(), 1);
    assert!(recording.contains(&keys::pages_by_menu_item(home)));

    recording.clear_ops();
    assert_eq!(cms.published_page(&key).await.unwrap(), first);
    assert_eq!(
        recording.ops(),
        vec![CacheOp::Get(keys::pages_by_menu_item(home))]
    );

    let mut rename = partial_snapshot(&partial);
    rename.name = "banner".to_string();
    recording.clear_ops();
    cms.update_partial(partial.id, &rename).await.unwrap();
    assert_eq!(recording.deleted_keys(), vec![keys::pages_by_menu_item(home)]);
    assert_eq!(cms.published_page(&key).await.unwrap().partials[0].name, "banner");

    let mut disable = page_snapshot(&cms.get_page(&key).await.unwrap());
    disable.enabled_at = None;
    cms.update_page(&key, &disable).await.unwrap();
    assert!(matches!(
        cms.published_page(&key).await,
        Err(CmsError::NotFound { .. })
    ));
}

#[tokio::test]
async fn hidden_item_has_no_published_page() {
    let recording = Arc::new(RecordingCache::new());
    let cms = setup_cms_with_cache(recording.clone());
    let version = seed_version(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Draft")],
        })
        .await
        .unwrap();
    let item = menu.relations[0].child.id;
    enable_page(&cms, item, "en", "Draft").await;

    recording.clear_ops();
    let err = cms.published_page(&PageKey::new(item, "en")).await.unwrap_err();
    assert!(matches!(err, CmsError::NotFound { .. }));
    assert!(!recording.contains(&keys::pages_by_menu_item(item)));
    assert!(!recording
        .ops()
        .iter()
        .any(|op| matches!(op, CacheOp::Set(_))));
}

#[tokio::test]
async fn page_and_partial_delete_restore_clear_page_entries() {
    let recording = Arc::new(RecordingCache::new());
    let cms = setup_cms_with_cache(recording.clone());
    let version = seed_published(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home").enabled(ts(2_000))],
        })
        .await
        .unwrap();
    let home = menu.relations[0].child.id;
    enable_page(&cms, home, "en", "Home").await;
    let key = PageKey::new(home, "en");
    let partial = cms
        .create_partial(
            &key,
            &CreatePartial {
                name: "hero".to_string(),
                rows: Vec::new(),
            },
        )
        .await
        .unwrap();
    let pages_key = keys::pages_by_menu_item(home);

    cms.published_page(&key).await.unwrap();
    recording.clear_ops();
    cms.delete_partial(partial.id).await.unwrap();
    assert_eq!(recording.deleted_keys(), vec![pages_key.clone()]);
    assert!(cms.published_page(&key).await.unwrap().partials.is_empty());

    recording.clear_ops();
    cms.restore_partial(partial.id).await.unwrap();
    assert_eq!(recording.deleted_keys(), vec![pages_key.clone()]);
    assert_eq!(cms.published_page(&key).await.unwrap().partials.len(), 1);

    cms.published_menus(version.id, "en").await.unwrap();
    recording.clear_ops();
    cms.delete_page(&key).await.unwrap();
    assert_eq!(
        recording.deleted_keys(),
        vec![pages_key.clone(), keys::version_locales(version.id)]
    );
    assert!(cms.published_menus(version.id, "en").await.unwrap()[0]
        .relations
        .is_empty());

    recording.clear_ops();
    cms.restore_page(&key).await.unwrap();
    assert_eq!(
        recording.deleted_keys(),
        vec![pages_key, keys::version_locales(version.id)]
    );
    assert_eq!(
        cms.published_menus(version.id, "en").await.unwrap()[0].root_names(),
        vec!["Home"]
    );
}

#[tokio::test]
async fn version_write_deletes_its_lookup_key() {
    let mut mock = MockCache::new();
    mock.expect_delete()
        .withf(|key| key == "versions:lookup:site")
        .times(1)
        .returning(|_| Ok(()));
    let cms: Cms<MemoryStore> = Cms::new(MemoryStore::new(), Arc::new(mock), CmsConfig::new());

    cms.create_app(TEST_APP).await.unwrap();
    cms.create_version(&version_request("v1")).await.unwrap();
}

#[tokio::test]
async fn rejected_write_touches_no_cache_entry() {
    // any call on an expectation-free mock panics
    let mock = MockCache::new();
    let cms: Cms<MemoryStore> = Cms::new(MemoryStore::new(), Arc::new(mock), CmsConfig::new());

    let err = cms
        .update_version(
            VersionId(1),
            &UpdateVersion {
                name: "v2".to_string(),
                enabled_at: None,
                updated_at: ts(1_000),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CmsError::NotFound { .. }));
}
