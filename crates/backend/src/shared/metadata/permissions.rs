//! Per-entity read and edit permissions
//!
//! Admins bypass every check. Everyone else needs a grant from the profile
//! assigned to them under `[permissions]`. Views answer a denied request
//! exactly like a missing record.

use contracts::system::auth::TokenClaims;

use super::entity::EntityType;
use super::registry::MetadataRegistry;
use crate::shared::config::{EntityGrant, PermissionsConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// List and detail views
    Read,
    /// Update form and submit
    Edit,
}

#[derive(Debug, Clone, Default)]
pub struct PermissionPolicy {
    config: PermissionsConfig,
}

impl PermissionPolicy {
    pub fn new(config: PermissionsConfig) -> Self {
        let assigned = config.users.values().chain(config.default_profile.iter());
        for profile in assigned {
            if !config.profiles.contains_key(profile) {
                tracing::warn!("Profile '{}' is assigned but grants nothing", profile);
            }
        }
        Self { config }
    }

    /// Warn about grants naming entity types nobody registered
    pub fn check(&self, registry: &MetadataRegistry) {
        for (profile, grants) in &self.config.profiles {
            for entity in grants.keys() {
                let known = registry.list_all().any(|e| e.entity.name_lower() == *entity);
                if !known {
                    tracing::warn!(
                        "Profile '{}' grants access to unknown entity type '{}'",
                        profile,
                        entity
                    );
                }
            }
        }
    }

    pub fn profile_of(&self, user_id: &str) -> Option<&str> {
        self.config
            .users
            .get(user_id)
            .or(self.config.default_profile.as_ref())
            .map(String::as_str)
    }

    fn grant(&self, user_id: &str, entity: &EntityType) -> EntityGrant {
        self.profile_of(user_id)
            .and_then(|profile| self.config.profiles.get(profile))
            .and_then(|grants| grants.get(&entity.name_lower()))
            .copied()
            .unwrap_or_default()
    }

    pub fn allows(&self, claims: &TokenClaims, entity: &EntityType, access: Access) -> bool {
        if claims.is_admin {
            return true;
        }
        let grant = self.grant(&claims.sub, entity);
        match access {
            Access::Read => grant.allow_read,
            Access::Edit => grant.allow_edit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::parse_config;
    use crate::shared::metadata::entity::{ColumnType, FieldDef, PrimaryKey};

    const INVOICE: EntityType = EntityType {
        name: "InvoiceLine",
        app_label: "billing",
        table_name: "billing_invoice_line",
        primary_key: PrimaryKey::Uuid,
        fields: &[FieldDef::new("amount", ColumnType::Real)],
        display_field: None,
        owned: None,
        owner_field: None,
        metadata_column: None,
        ordering: None,
    };

    fn policy() -> PermissionPolicy {
        let config = parse_config(
            r#"
            [database]
            path = "admin.db"

            [apps]
            installed = []

            [permissions]
            default_profile = "clerk"

            [permissions.users]
            carol = "auditor"
            dave = "nobody"

            [permissions.profiles.clerk]
            invoice_line = { allow_read = true, allow_edit = true }

            [permissions.profiles.auditor]
            invoice_line = { allow_read = true }
            "#,
        )
        .unwrap();
        PermissionPolicy::new(config.permissions)
    }

    fn claims(user: &str, is_admin: bool) -> TokenClaims {
        TokenClaims {
            sub: user.to_string(),
            username: user.to_string(),
            is_admin,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_default_profile_applies_to_unlisted_users() {
        let policy = policy();
        assert_eq!(policy.profile_of("erin"), Some("clerk"));
        assert!(policy.allows(&claims("erin", false), &INVOICE, Access::Edit));
    }

    #[test]
    fn test_grants_are_per_access_kind() {
        let policy = policy();
        let carol = claims("carol", false);
        assert!(policy.allows(&carol, &INVOICE, Access::Read));
        assert!(!policy.allows(&carol, &INVOICE, Access::Edit));
    }

    #[test]
    fn test_undefined_profile_denies_everything() {
        let policy = policy();
        let dave = claims("dave", false);
        assert!(!policy.allows(&dave, &INVOICE, Access::Read));
        assert!(!policy.allows(&dave, &INVOICE, Access::Edit));
    }

    #[test]
    fn test_admin_bypasses_grants() {
        let policy = PermissionPolicy::default();
        assert!(!policy.allows(&claims("root", false), &INVOICE, Access::Read));
        assert!(policy.allows(&claims("root", true), &INVOICE, Access::Edit));
    }
}
