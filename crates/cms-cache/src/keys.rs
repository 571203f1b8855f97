//! Cache key scheme
//!
//! Keys are plain strings so they stay readable in any shared backend.

use std::fmt::Display;

/// Menu lookup list of a version
pub fn menus_lookup(version_id: impl Display) -> String {
    format!("menus:lookup:{version_id}")
}

/// Published menus of a version, keyed by locale inside
pub fn version_locales(version_id: impl Display) -> String {
    format!("menus:version:{version_id}:locales")
}

/// Version lookup list of an app
pub fn versions_lookup(app_name: &str) -> String {
    format!("versions:lookup:{app_name}")
}

/// Module lookup list of an app
pub fn modules_lookup(app_name: &str) -> String {
    format!("modules:lookup:{app_name}")
}

/// Published pages of a menu item, keyed by locale inside
pub fn pages_by_menu_item(menu_item_id: impl Display) -> String {
    format!("pages:menu_item:{menu_item_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats() {
        assert_eq!(menus_lookup(7), "menus:lookup:7");
        assert_eq!(version_locales(7), "menus:version:7:locales");
        assert_eq!(versions_lookup("site"), "versions:lookup:site");
        assert_eq!(modules_lookup("site"), "modules:lookup:site");
        assert_eq!(pages_by_menu_item(12), "pages:menu_item:12");
    }
}
