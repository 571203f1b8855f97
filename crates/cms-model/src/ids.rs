//! Entity identifiers
//!
//! Every persisted entity is addressed by an opaque integer assigned by the
//! store. Each entity kind gets its own newtype so a row id can never be
//! passed where a menu item id is expected.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw integer value
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Version identifier (a version groups menus and items of one app)
    VersionId
);
define_id!(
    /// Menu (tree root) identifier
    MenuId
);
define_id!(
    /// Menu item (tree node) identifier
    MenuItemId
);
define_id!(
    /// Page partial (tree root) identifier
    PartialId
);
define_id!(
    /// Partial row identifier
    RowId
);
define_id!(
    /// Partial column identifier
    ColumnId
);
define_id!(
    /// Module identifier
    ModuleId
);
