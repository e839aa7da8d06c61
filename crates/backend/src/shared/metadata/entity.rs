//! Static descriptors for admin-managed entity types
//!
//! Each entity type declares its table, columns and ownership
//! capabilities once, as a `const`. Handlers never probe the data layer to
//! find out how a type is shaped.

use contracts::system::auth::TokenClaims;
use convert_case::{Case, Casing};
use sea_orm::Value;

/// Primary key scheme of an entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKey {
    Uuid,
    Integer,
    Text,
}

/// Storage type of a column (SQLite affinity plus how values are encoded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Boolean,
    /// UUID stored as hyphenated text
    Uuid,
    /// RFC 3339 text
    DateTime,
    /// JSON document stored as text
    Json,
}

/// Foreign key to another table, displayed as `{id, name}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    pub table: &'static str,
    pub display_column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub relation: Option<RelationDef>,
}

impl FieldDef {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            relation: None,
        }
    }

    pub const fn foreign_key(
        name: &'static str,
        table: &'static str,
        display_column: &'static str,
    ) -> Self {
        Self {
            name,
            column_type: ColumnType::Uuid,
            relation: Some(RelationDef {
                table,
                display_column,
            }),
        }
    }
}

/// Who is asking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: String,
}

impl From<&TokenClaims> for Requester {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            id: claims.sub.clone(),
        }
    }
}

/// SQL predicate restricting rows, with positional `?` bindings.
/// `sql` may reference the entity's own columns unqualified.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScopeFilter {
    pub sql: Option<String>,
    pub values: Vec<Value>,
}

impl ScopeFilter {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: Some(sql.into()),
            values,
        }
    }
}

/// Rows a requester may reach through the entity's own accessor
pub type OwnedAccessor = fn(&Requester) -> ScopeFilter;

/// Descriptor of one entity type
#[derive(Debug, Clone, Copy)]
pub struct EntityType {
    /// Declared name; route segments keep its casing
    pub name: &'static str,
    /// Owning application package
    pub app_label: &'static str,
    pub table_name: &'static str,
    pub primary_key: PrimaryKey,
    /// Columns other than the primary key `id`
    pub fields: &'static [FieldDef],
    /// Column used as the display `name`
    pub display_field: Option<&'static str>,
    pub owned: Option<OwnedAccessor>,
    pub owner_field: Option<&'static str>,
    /// JSON column holding extra keys not modelled as columns
    pub metadata_column: Option<&'static str>,
    /// ORDER BY clause for list queries
    pub ordering: Option<&'static str>,
}

impl EntityType {
    /// `DataSource` -> `data_source`
    pub fn name_lower(&self) -> String {
        self.name.to_case(Case::Snake)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == "id" || self.field(name).is_some()
    }

    /// Columns that input never writes
    pub fn is_protected(&self, name: &str) -> bool {
        matches!(name, "id" | "created_at" | "updated_at")
            || self.owner_field == Some(name)
            || self.metadata_column == Some(name)
    }

    /// Can `name` be shown: a column, the display name, or a metadata key
    pub fn knows_field(&self, name: &str) -> bool {
        name == "name" || self.has_column(name) || self.metadata_column.is_some()
    }
}

/// Ownership rule for one request, derived from the descriptor
#[derive(Debug, Clone, Copy)]
pub enum OwnershipPolicy {
    FilterByOwnedManager(OwnedAccessor),
    FilterByOwnerField(&'static str),
    NoFilter,
}

impl OwnershipPolicy {
    /// The owned accessor wins over the owner field when both exist
    pub fn for_entity(entity: &EntityType) -> Self {
        if let Some(accessor) = entity.owned {
            Self::FilterByOwnedManager(accessor)
        } else if let Some(column) = entity.owner_field {
            Self::FilterByOwnerField(column)
        } else {
            Self::NoFilter
        }
    }

    pub fn scope(&self, requester: &Requester) -> ScopeFilter {
        match self {
            Self::FilterByOwnedManager(accessor) => accessor(requester),
            Self::FilterByOwnerField(column) => {
                ScopeFilter::new(format!("\"{}\" = ?", column), vec![requester.id.clone().into()])
            }
            Self::NoFilter => ScopeFilter::unrestricted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_or_owned(requester: &Requester) -> ScopeFilter {
        ScopeFilter::new(
            "(owner = ? OR id IN (SELECT agent_id FROM shares WHERE user_id = ?))",
            vec![requester.id.clone().into(), requester.id.clone().into()],
        )
    }

    const BASE: EntityType = EntityType {
        name: "DataSource",
        app_label: "core_agent",
        table_name: "core_agent_data_source",
        primary_key: PrimaryKey::Uuid,
        fields: &[
            FieldDef::new("name", ColumnType::Text),
            FieldDef::new("owner", ColumnType::Text),
        ],
        display_field: Some("name"),
        owned: None,
        owner_field: None,
        metadata_column: None,
        ordering: None,
    };

    fn requester() -> Requester {
        Requester { id: "user-a".into() }
    }

    #[test]
    fn test_name_lower_is_snake_case() {
        assert_eq!(BASE.name_lower(), "data_source");
        let agent = EntityType { name: "Agent", ..BASE };
        assert_eq!(agent.name_lower(), "agent");
    }

    #[test]
    fn test_owned_accessor_takes_priority_over_owner_field() {
        let entity = EntityType {
            owned: Some(shared_or_owned as OwnedAccessor),
            owner_field: Some("owner"),
            ..BASE
        };
        let policy = OwnershipPolicy::for_entity(&entity);
        assert!(matches!(policy, OwnershipPolicy::FilterByOwnedManager(_)));
        let scope = policy.scope(&requester());
        assert!(scope.sql.unwrap().contains("shares"));
        assert_eq!(scope.values.len(), 2);
    }

    #[test]
    fn test_owner_field_policy() {
        let entity = EntityType {
            owner_field: Some("owner"),
            ..BASE
        };
        let scope = OwnershipPolicy::for_entity(&entity).scope(&requester());
        assert_eq!(scope.sql.as_deref(), Some("\"owner\" = ?"));
        assert_eq!(scope.values, vec![Value::from("user-a".to_string())]);
    }

    #[test]
    fn test_no_filter_policy() {
        let policy = OwnershipPolicy::for_entity(&BASE);
        assert!(matches!(policy, OwnershipPolicy::NoFilter));
        assert_eq!(policy.scope(&requester()), ScopeFilter::unrestricted());
    }

    #[test]
    fn test_protected_columns() {
        let entity = EntityType {
            owner_field: Some("owner"),
            ..BASE
        };
        assert!(entity.is_protected("id"));
        assert!(entity.is_protected("owner"));
        assert!(entity.is_protected("updated_at"));
        assert!(!entity.is_protected("name"));
    }
}
