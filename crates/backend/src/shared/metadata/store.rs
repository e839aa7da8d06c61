//! Row access for registered entity types
//!
//! Statements are built from the static descriptors. Every query carries
//! the ownership scope, so an out-of-scope row looks exactly like a
//! missing one.

use contracts::shared::admin::FieldErrors;
use contracts::shared::metadata::INVALID_CHOICE_MESSAGE;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DbErr, QueryResult, Statement, TransactionTrait,
    Value as DbValue,
};
use serde_json::{Map, Value};

use super::entity::{ColumnType, EntityType, PrimaryKey, ScopeFilter};
use super::forms::{CleanedData, FormSpec};

/// One decoded row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// `id` and every declared column
    pub columns: Map<String, Value>,
    /// Display value of each foreign key, keyed by the key column
    pub relations: Map<String, Value>,
}

impl Record {
    pub fn id(&self) -> String {
        match self.columns.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// The metadata JSON column as an object, empty when unset
    pub fn metadata(&self, entity: &EntityType) -> Map<String, Value> {
        entity
            .metadata_column
            .and_then(|col| self.columns.get(col))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

/// Validated input split by destination
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Changes {
    pub columns: Vec<(&'static str, Value)>,
    /// Keys merged into the metadata JSON column
    pub metadata: Map<String, Value>,
}

impl Changes {
    pub fn classify(entity: &EntityType, form: &FormSpec, cleaned: CleanedData) -> Self {
        let mut changes = Self::default();
        for (name, value) in cleaned {
            let into_metadata = form.metadata_fields.contains(&name)
                || (!entity.has_column(name) && entity.metadata_column.is_some());

            if into_metadata && entity.metadata_column.is_some() {
                changes.metadata.insert(name.to_string(), value);
            } else if entity.field(name).is_some() && !entity.is_protected(name) {
                changes.columns.push((name, value));
            } else {
                tracing::warn!("{}: ignoring input for unwritable field {}", entity.name, name);
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.metadata.is_empty()
    }
}

/// Result of a scoped update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The row as stored after the update
    Updated(Record),
    /// Absent or outside the scope
    NotFound,
    /// A foreign key points at a missing row; nothing was written
    Rejected(FieldErrors),
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn relation_alias(column: &str) -> String {
    format!("{}__display", column)
}

fn select_sql(entity: &EntityType, scope: &ScopeFilter, by_id: bool) -> String {
    let mut columns = vec![format!("t.{}", quote("id"))];
    for field in entity.fields {
        columns.push(format!("t.{}", quote(field.name)));
        if let Some(rel) = field.relation {
            columns.push(format!(
                "(SELECT r.{display} FROM {table} AS r WHERE r.{id} = t.{col}) AS {alias}",
                display = quote(rel.display_column),
                table = quote(rel.table),
                id = quote("id"),
                col = quote(field.name),
                alias = quote(&relation_alias(field.name)),
            ));
        }
    }

    let mut conditions = Vec::new();
    if let Some(sql) = &scope.sql {
        conditions.push(format!("({})", sql));
    }
    if by_id {
        conditions.push(format!("t.{} = ?", quote("id")));
    }

    let mut sql = format!(
        "SELECT {} FROM {} AS t",
        columns.join(", "),
        quote(entity.table_name)
    );
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    if !by_id {
        match (entity.ordering, entity.display_field) {
            (Some(ordering), _) => sql.push_str(&format!(" ORDER BY {}", ordering)),
            (None, Some(display)) => sql.push_str(&format!(" ORDER BY t.{}", quote(display))),
            (None, None) => sql.push_str(&format!(" ORDER BY t.{}", quote("id"))),
        }
    }
    sql
}

fn decode(entity: &EntityType, row: &QueryResult) -> Result<Record, DbErr> {
    let mut record = Record::default();
    let id = match entity.primary_key {
        PrimaryKey::Integer => row
            .try_get::<Option<i64>>("", "id")?
            .map(Value::from)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>>("", "id")?
            .map(Value::from)
            .unwrap_or(Value::Null),
    };
    record.columns.insert("id".to_string(), id);

    for field in entity.fields {
        let value = decode_column(row, field.name, field.column_type)?;
        record.columns.insert(field.name.to_string(), value);
        if field.relation.is_some() {
            let display = row
                .try_get::<Option<String>>("", &relation_alias(field.name))?
                .map(Value::from)
                .unwrap_or(Value::Null);
            record.relations.insert(field.name.to_string(), display);
        }
    }
    Ok(record)
}

fn decode_column(row: &QueryResult, name: &str, column_type: ColumnType) -> Result<Value, DbErr> {
    let value = match column_type {
        ColumnType::Integer => row.try_get::<Option<i64>>("", name)?.map(Value::from),
        ColumnType::Real => row.try_get::<Option<f64>>("", name)?.map(Value::from),
        ColumnType::Boolean => row.try_get::<Option<bool>>("", name)?.map(Value::from),
        ColumnType::Json => row
            .try_get::<Option<String>>("", name)?
            .map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw))),
        ColumnType::Text | ColumnType::Uuid | ColumnType::DateTime => {
            row.try_get::<Option<String>>("", name)?.map(Value::from)
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Convert a JSON value into a bind parameter for a column of `column_type`
fn bind(column_type: ColumnType, value: Value) -> Result<DbValue, DbErr> {
    let invalid = |v: &Value| DbErr::Type(format!("cannot store {} in a {:?} column", v, column_type));
    Ok(match (column_type, value) {
        (ColumnType::Integer, Value::Null) => Option::<i64>::None.into(),
        (ColumnType::Integer, Value::Bool(b)) => (b as i64).into(),
        (ColumnType::Integer, v @ Value::Number(_)) => v.as_i64().ok_or_else(|| invalid(&v))?.into(),
        (ColumnType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(&Value::String(s.clone())))?
            .into(),
        (ColumnType::Real, Value::Null) => Option::<f64>::None.into(),
        (ColumnType::Real, v @ Value::Number(_)) => v.as_f64().ok_or_else(|| invalid(&v))?.into(),
        (ColumnType::Real, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(&Value::String(s.clone())))?
            .into(),
        (ColumnType::Boolean, Value::Null) => Option::<bool>::None.into(),
        (ColumnType::Boolean, Value::Bool(b)) => b.into(),
        (ColumnType::Boolean, Value::Number(n)) => (n.as_f64().unwrap_or(0.0) != 0.0).into(),
        (ColumnType::Boolean, Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "on" | "1" | "yes").into()
        }
        (ColumnType::Json, Value::Null) => Option::<String>::None.into(),
        (ColumnType::Json, v) => serde_json::to_string(&v)
            .map_err(|e| DbErr::Type(e.to_string()))?
            .into(),
        (_, Value::Null) => Option::<String>::None.into(),
        (_, Value::String(s)) => s.into(),
        (_, v @ (Value::Bool(_) | Value::Number(_))) => v.to_string().into(),
        (_, v) => return Err(invalid(&v)),
    })
}

async fn row_exists<C: ConnectionTrait>(db: &C, table: &str, id: &str) -> Result<bool, DbErr> {
    let sql = format!("SELECT 1 FROM {} WHERE {} = ? LIMIT 1", quote(table), quote("id"));
    let stmt = Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, vec![id.into()]);
    Ok(db.query_one(stmt).await?.is_some())
}

/// Rows visible through `scope`, in the entity's ordering
pub async fn list<C: ConnectionTrait>(
    db: &C,
    entity: &EntityType,
    scope: &ScopeFilter,
) -> Result<Vec<Record>, DbErr> {
    let sql = select_sql(entity, scope, false);
    let stmt = Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, scope.values.clone());
    db.query_all(stmt)
        .await?
        .iter()
        .map(|row| decode(entity, row))
        .collect()
}

/// Single row by id, `None` when absent or outside `scope`
pub async fn find<C: ConnectionTrait>(
    db: &C,
    entity: &EntityType,
    id: &str,
    scope: &ScopeFilter,
) -> Result<Option<Record>, DbErr> {
    let sql = select_sql(entity, scope, true);
    let mut values = scope.values.clone();
    values.push(id.into());
    let stmt = Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, values);
    db.query_one(stmt)
        .await?
        .map(|row| decode(entity, &row))
        .transpose()
}

/// Apply `changes` to one scoped row in a single transaction.
///
/// Empty input on a foreign key clears it. A foreign key pointing at a
/// missing row rejects the whole update.
pub async fn update<C>(
    db: &C,
    entity: &EntityType,
    id: &str,
    scope: &ScopeFilter,
    changes: Changes,
) -> Result<UpdateOutcome, DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let Some(current) = find(&txn, entity, id, scope).await? else {
        txn.rollback().await?;
        return Ok(UpdateOutcome::NotFound);
    };

    let mut assignments = Vec::new();
    let mut values: Vec<DbValue> = Vec::new();
    let mut errors = FieldErrors::new();

    for (name, value) in changes.columns {
        let Some(field) = entity.field(name) else {
            continue;
        };
        let value = match (field.relation, value) {
            (Some(_), Value::String(s)) if s.trim().is_empty() => Value::Null,
            (_, value) => value,
        };
        if let (Some(relation), Some(target)) = (field.relation, value.as_str()) {
            if !row_exists(&txn, relation.table, target).await? {
                errors
                    .entry(name.to_string())
                    .or_default()
                    .push(INVALID_CHOICE_MESSAGE.to_string());
                continue;
            }
        }
        assignments.push(format!("{} = ?", quote(name)));
        values.push(bind(field.column_type, value)?);
    }

    if !errors.is_empty() {
        txn.rollback().await?;
        return Ok(UpdateOutcome::Rejected(errors));
    }

    if let Some(column) = entity.metadata_column {
        if !changes.metadata.is_empty() {
            let mut merged = current.metadata(entity);
            merged.extend(changes.metadata);
            assignments.push(format!("{} = ?", quote(column)));
            values.push(bind(ColumnType::Json, Value::Object(merged))?);
        }
    }

    if !assignments.is_empty() {
        if entity.field("updated_at").is_some() {
            assignments.push(format!("{} = ?", quote("updated_at")));
            values.push(chrono::Utc::now().to_rfc3339().into());
        }
        values.push(id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote(entity.table_name),
            assignments.join(", "),
            quote("id")
        );
        txn.execute(Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, values))
            .await?;
    }

    let stored = find(&txn, entity, id, &ScopeFilter::unrestricted()).await?;
    txn.commit().await?;
    Ok(stored.map_or(UpdateOutcome::NotFound, UpdateOutcome::Updated))
}
