//! Boolean permission attributes carried on a principal record.
//!
//! The flag set is fixed domain configuration: four top-level menu-access
//! flags, one access flag per page, and view/create/update/delete flags per
//! page. Declaring the fields through `permission_flags!` also generates the
//! static name→accessor table, so lookups by permission name are checked at
//! compile time instead of matching field names at runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::PermissionName;

fn is_false(v: &bool) -> bool {
    !*v
}

macro_rules! permission_flags {
    ($($field:ident),+ $(,)?) => {
        /// The recognized boolean permission attributes of a principal.
        ///
        /// Serializes as a name→bool map with false flags omitted, so backends
        /// can persist the whole set as a single document column.
        #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct PermissionFlags {
            $(
                #[serde(default, skip_serializing_if = "is_false")]
                pub $field: bool,
            )+
        }

        /// Every recognized flag name, in declaration order.
        pub const RECOGNIZED_FLAGS: &[&str] = &[$(stringify!($field)),+];

        impl PermissionFlags {
            /// Read a flag by permission name. `None` if the name is not a
            /// recognized attribute.
            pub fn get(&self, name: &str) -> Option<bool> {
                match name {
                    $(stringify!($field) => Some(self.$field),)+
                    _ => None,
                }
            }

            /// Set a flag by permission name. Returns whether the name was
            /// recognized; unrecognized names are skipped, not an error.
            pub fn set(&mut self, name: &str, value: bool) -> bool {
                match name {
                    $(stringify!($field) => { self.$field = value; true },)+
                    _ => false,
                }
            }
        }
    };
}

permission_flags! {
    // Data management
    can_access_data,
    can_access_data_entry,
    can_view_data_entry,
    can_create_data_entry,
    can_update_data_entry,
    can_delete_data_entry,
    can_access_data_edit,
    can_view_data_edit,
    can_create_data_edit,
    can_update_data_edit,
    can_delete_data_edit,
    can_access_enquiry,
    can_view_enquiry,
    can_create_enquiry,
    can_update_enquiry,
    can_delete_enquiry,

    // Setup
    can_access_setup,
    can_access_department,
    can_view_department,
    can_create_department,
    can_update_department,
    can_delete_department,
    can_access_sub_department,
    can_view_sub_department,
    can_create_sub_department,
    can_update_sub_department,
    can_delete_sub_department,
    can_access_division_branch,
    can_view_division_branch,
    can_create_division_branch,
    can_update_division_branch,
    can_delete_division_branch,
    can_access_branch_dep_link,
    can_view_branch_dep_link,
    can_create_branch_dep_link,
    can_update_branch_dep_link,
    can_delete_branch_dep_link,
    can_access_logo_upload,
    can_view_logo_upload,
    can_create_logo_upload,
    can_update_logo_upload,
    can_delete_logo_upload,
    can_access_bulk_upload,
    can_view_bulk_upload,
    can_create_bulk_upload,
    can_update_bulk_upload,
    can_delete_bulk_upload,

    // User management
    can_access_user,
    can_access_users,
    can_view_users,
    can_create_users,
    can_update_users,
    can_delete_users,
    can_access_user_rights,
    can_view_user_rights,
    can_create_user_rights,
    can_update_user_rights,
    can_delete_user_rights,
    can_access_password_change,
    can_view_password_change,
    can_create_password_change,
    can_update_password_change,
    can_delete_password_change,

    // Reports
    can_access_report,
    can_access_log_report,
    can_view_log_report,
    can_create_log_report,
    can_update_log_report,
    can_delete_log_report,
    can_access_register,
    can_view_register,
    can_create_register,
    can_update_register,
    can_delete_register,
}

impl PermissionFlags {
    /// Reset every flag to false.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Names of all flags currently set true.
    pub fn granted(&self) -> BTreeSet<PermissionName> {
        RECOGNIZED_FLAGS
            .iter()
            .filter(|name| self.get(name) == Some(true))
            .map(|name| PermissionName::from(*name))
            .collect()
    }

    /// True if no flag is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
