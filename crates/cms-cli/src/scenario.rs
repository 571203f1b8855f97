//! Create-then-reorder walkthrough
//!
//! Creates menu "Main" with a single indexed "Home" item, then submits an
//! update moving "Home" to position 1 and adding "About" at position 0.

use cms_core::{Cms, CmsResult};
use cms_model::{
    CreateMenu, CreateMenuItem, CreateVersion, IndexingDirective, IndexingOption, MenuNode,
    MenuTree, UpdateMenu, UpdateMenuItem,
};
use cms_store::TreeStore;
use serde::Serialize;
use std::fmt::Write as _;

/// App the walkthrough version belongs to
pub const SCENARIO_APP: &str = "demo";

/// Trees observed during the walkthrough
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Tree returned by the create call
    pub created: Vec<MenuNode>,
    /// Tree fetched after the update
    pub fetched: Vec<MenuNode>,
}

/// Run the walkthrough against `cms`
pub async fn run<S: TreeStore>(cms: &Cms<S>) -> CmsResult<ScenarioReport> {
    cms.create_app(SCENARIO_APP).await?;
    let version = cms
        .create_version(&CreateVersion {
            app_name: SCENARIO_APP.to_string(),
            name: "1".to_string(),
            enabled_at: None,
        })
        .await?;

    let created = cms
        .create_menu(&CreateMenu {
            version_id: version.id,
            name: "Main".to_string(),
            items: vec![CreateMenuItem::new("Home")
                .at(0)
                .with_indexing(vec![IndexingDirective::new(IndexingOption::Index)])],
        })
        .await?;

    let update = reorder(&created);
    cms.update_menu(created.menu.id, &update).await?;
    let fetched = cms.get_menu(created.menu.id).await?;

    Ok(ScenarioReport {
        created: created.nest(),
        fetched: fetched.nest(),
    })
}

fn reorder(tree: &MenuTree) -> UpdateMenu {
    let mut items: Vec<UpdateMenuItem> = tree
        .children_of(None)
        .map(|view| {
            UpdateMenuItem::existing(view.child.id, view.child.name.clone(), view.child.updated_at)
                .at(1)
                .with_indexing(view.child.indexing.clone())
        })
        .collect();
    items.push(UpdateMenuItem::new("About").at(0));

    UpdateMenu {
        name: tree.menu.name.clone(),
        updated_at: tree.menu.updated_at,
        items,
    }
}

/// Indented plain-text rendering of a nested tree
#[must_use]
pub fn render(nodes: &[MenuNode]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(usize, &MenuNode)> = nodes.iter().rev().map(|node| (0, node)).collect();
    while let Some((depth, node)) = stack.pop() {
        let indexing: Vec<&str> = node
            .item
            .indexing
            .iter()
            .map(|directive| directive.option.as_str())
            .collect();
        let _ = writeln!(
            out,
            "{:indent$}- [{}] {} (id {}){}",
            "",
            node.position,
            node.item.name,
            node.item.id,
            if indexing.is_empty() {
                String::new()
            } else {
                format!(" robots: {}", indexing.join(", "))
            },
            indent = depth * 2
        );
        stack.extend(node.items.iter().rev().map(|child| (depth + 1, child)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cms_test_utils::setup_test_cms;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn walkthrough_ends_with_about_first() {
        let cms = setup_test_cms();
        let report = run(&cms).await.unwrap();

        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].item.name, "Home");
        assert_eq!(report.created[0].position, 0);
        assert_eq!(
            report.created[0].item.indexing,
            vec![IndexingDirective::new(IndexingOption::Index)]
        );

        let names: Vec<_> = report.fetched.iter().map(|n| n.item.name.as_str()).collect();
        assert_eq!(names, vec!["About", "Home"]);
        assert_eq!(report.fetched[1].item.id, report.created[0].item.id);
    }

    #[tokio::test]
    async fn render_indents_children() {
        let cms = setup_test_cms();
        let report = run(&cms).await.unwrap();

        let text = render(&report.fetched);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("- [0] About"));
        assert!(lines[1].ends_with("robots: index"));
    }
}
