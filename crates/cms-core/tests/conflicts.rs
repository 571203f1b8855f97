//! Stale snapshots are rejected before anything is written

use chrono::Duration;
use cms_core::CmsError;
use cms_model::{
    CreateColumn, CreateMenu, CreateMenuItem, CreateModule, CreatePartial, CreateRow, PageKey,
    UpdateMenuItem, UpdateModule, UpdateVersion,
};
use cms_test_utils::{
    column_layout, find_item_mut, menu_snapshot, page_snapshot, partial_snapshot, seed_version,
    setup_test_cms, TEST_APP,
};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn stale_menu_root_is_rejected() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;
    let created = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("A")],
        })
        .await
        .unwrap();

    let mut snapshot = menu_snapshot(&created);
    snapshot.updated_at -= Duration::seconds(30);
    snapshot.items.push(UpdateMenuItem::new("B"));
    let err = cms.update_menu(created.menu.id, &snapshot).await.unwrap_err();

    assert!(err.is_out_of_sync());
    assert_eq!(cms.get_menu(created.menu.id).await.unwrap().root_names(), vec!["A"]);
}

#[tokio::test]
async fn stale_item_deep_in_the_tree_is_rejected() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;
    let created = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("A").with_items(vec![
                CreateMenuItem::new("B").with_items(vec![CreateMenuItem::new("C")]),
            ])],
        })
        .await
        .unwrap();

    let mut snapshot = menu_snapshot(&created);
    let deep = find_item_mut(&mut snapshot.items, "C").unwrap();
    let stored = deep.updated_at.unwrap();
    deep.updated_at = Some(stored - Duration::seconds(5));
    deep.name = "C renamed".to_string();

    let err = cms.update_menu(created.menu.id, &snapshot).await.unwrap_err();
    match err {
        CmsError::OutOfSync {
            entity,
            stored: reported,
            ..
        } => {
            assert!(entity.starts_with("menu item "));
            assert_eq!(reported, stored);
        }
        other => panic!("expected out of sync, got {other:?}"),
    }
    let fetched = cms.get_menu(created.menu.id).await.unwrap();
    assert!(fetched.relations.iter().any(|view| view.child.name == "C"));
}

#[tokio::test]
async fn sub_second_difference_is_not_stale() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;
    let created = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("A")],
        })
        .await
        .unwrap();

    let mut snapshot = menu_snapshot(&created);
    let whole_second = chrono::DateTime::from_timestamp(snapshot.updated_at.timestamp(), 0).unwrap();
    snapshot.updated_at = whole_second;
    snapshot.name = "Primary".to_string();

    let updated = cms.update_menu(created.menu.id, &snapshot).await.unwrap();
    assert_eq!(updated.menu.name, "Primary");
}

#[tokio::test]
async fn new_items_carry_no_stamp_and_are_exempt() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;
    let created = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: Vec::new(),
        })
        .await
        .unwrap();

    let mut snapshot = menu_snapshot(&created);
    snapshot.items.push(UpdateMenuItem::new("Fresh"));
    let updated = cms.update_menu(created.menu.id, &snapshot).await.unwrap();

    assert_eq!(updated.root_names(), vec!["Fresh"]);
}

#[tokio::test]
async fn stale_row_under_fresh_partial_is_rejected() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home")],
        })
        .await
        .unwrap();
    let key = PageKey::new(menu.relations[0].child.id, "en");
    cms.get_or_create_page(&key, "Home").await.unwrap();
    let partial = cms
        .create_partial(
            &key,
            &CreatePartial {
                name: "hero".to_string(),
                rows: vec![CreateRow {
                    position: Some(0),
                    layout: Default::default(),
                    columns: vec![CreateColumn {
                        position: Some(0),
                        module_id: None,
                        layout: column_layout("12"),
                    }],
                }],
            },
        )
        .await
        .unwrap();

    let mut snapshot = partial_snapshot(&partial);
    let row_stamp = snapshot.rows[0].updated_at.unwrap();
    snapshot.rows[0].updated_at = Some(row_stamp - Duration::seconds(60));
    snapshot.rows[0].columns.clear();

    let err = cms.update_partial(partial.id, &snapshot).await.unwrap_err();
    match &err {
        CmsError::OutOfSync { entity, .. } => {
            assert_eq!(entity, &format!("row {}", partial.rows[0].id));
        }
        other => panic!("expected out of sync, got {other:?}"),
    }
    let stored = cms.get_partial(partial.id).await.unwrap();
    assert_eq!(stored.rows[0].columns.len(), 1);
}

#[tokio::test]
async fn stale_column_is_rejected() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home")],
        })
        .await
        .unwrap();
    let key = PageKey::new(menu.relations[0].child.id, "en");
    cms.get_or_create_page(&key, "Home").await.unwrap();
    let partial = cms
        .create_partial(
            &key,
            &CreatePartial {
                name: "hero".to_string(),
                rows: vec![CreateRow {
                    position: None,
                    layout: Default::default(),
                    columns: vec![CreateColumn {
                        position: None,
                        module_id: None,
                        layout: column_layout("6"),
                    }],
                }],
            },
        )
        .await
        .unwrap();

    let mut snapshot = partial_snapshot(&partial);
    let column = &mut snapshot.rows[0].columns[0];
    column.updated_at = column.updated_at.map(|at| at - Duration::seconds(2));

    let err = cms.update_partial(partial.id, &snapshot).await.unwrap_err();
    assert!(err.is_out_of_sync());
    assert!(err.to_string().starts_with("column "));
}

#[tokio::test]
async fn stale_version_is_rejected() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;

    let request = UpdateVersion {
        name: "v1-renamed".to_string(),
        enabled_at: version.enabled_at,
        updated_at: version.updated_at - Duration::seconds(5),
    };
    let err = cms.update_version(version.id, &request).await.unwrap_err();

    match &err {
        CmsError::OutOfSync { entity, .. } => {
            assert_eq!(entity, &format!("version {}", version.id));
        }
        other => panic!("expected out of sync, got {other:?}"),
    }
    assert_eq!(cms.get_version(version.id).await.unwrap().name, "v1");
}

#[tokio::test]
async fn stale_module_is_rejected() {
    let cms = setup_test_cms();
    seed_version(&cms, "v1").await;
    let module = cms
        .create_module(&CreateModule {
            app_name: TEST_APP.to_string(),
            module_type: "banner".to_string(),
            name: "hero".to_string(),
            settings: serde_json::json!({"image": "a.png"}),
        })
        .await
        .unwrap();

    let request = UpdateModule {
        module_type: "banner".to_string(),
        name: "hero".to_string(),
        settings: serde_json::json!({"image": "b.png"}),
        updated_at: module.updated_at - Duration::seconds(5),
    };
    let err = cms.update_module(module.id, &request).await.unwrap_err();

    assert!(err.is_out_of_sync());
    assert!(err.to_string().starts_with(&format!("module {} ", module.id)));
    assert_eq!(cms.get_module(module.id).await.unwrap().settings["image"], "a.png");
}

#[tokio::test]
async fn stale_page_is_rejected() {
    let cms = setup_test_cms();
    let version = seed_version(&cms, "v1").await;
    let menu = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home")],
        })
        .await
        .unwrap();
    let key = PageKey::new(menu.relations[0].child.id, "en");
    let page = cms.get_or_create_page(&key, "Home").await.unwrap();

    let mut request = page_snapshot(&page).with_meta("Welcome", "Landing page");
    request.updated_at -= Duration::seconds(5);
    let err = cms.update_page(&key, &request).await.unwrap_err();

    assert!(err.is_out_of_sync());
    assert_eq!(cms.get_page(&key).await.unwrap().meta_title, None);
}
