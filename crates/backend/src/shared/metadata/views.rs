//! Request handlers bound to generated routes
//!
//! Each handler captures the entity name of its route and looks the entry
//! up in the registry per request. All three handlers check the requester's
//! permission first, then apply the ownership scope before touching a row.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Path, Request, State},
    http::{header, HeaderMap},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, MethodRouter},
    Form, Json,
};
use contracts::shared::admin::{DetailResponse, ListResponse, UpdateFormResponse, UpdateSuccess};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::entity::{OwnershipPolicy, Requester, ScopeFilter};
use super::error::{AdminError, ConfigError};
use super::forms::{FormInput, FormResolver};
use super::permissions::{Access, PermissionPolicy};
use super::registry::{MetadataRegistry, RegistryEntry};
use super::serialize;
use super::store::{self, Changes, Record, UpdateOutcome};
use super::templates::{detail_chain, list_chain, RenderOutcome, TemplateSet};
use super::urls::{GeneratedRoute, RouteKind};
use crate::system::auth::extractor::CurrentUser;
use crate::system::auth::jwt::JwtKeys;
use crate::system::auth::middleware::require_auth;

/// Shared state of the generated admin routes
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<MetadataRegistry>,
    pub routes: Arc<Vec<GeneratedRoute>>,
    pub db: DatabaseConnection,
    pub templates: Arc<TemplateSet>,
    pub forms: FormResolver,
    pub permissions: Arc<PermissionPolicy>,
    pub keys: Arc<JwtKeys>,
}

impl AdminState {
    fn entry(&self, entity_name: &str) -> Result<&RegistryEntry, AdminError> {
        self.registry
            .get(entity_name)
            .ok_or_else(|| ConfigError::NotRegistered(entity_name.to_string()).into())
    }

    /// Denied requests look like missing records
    fn authorize(
        &self,
        entry: &RegistryEntry,
        user: &CurrentUser,
        access: Access,
    ) -> Result<(), AdminError> {
        if self.permissions.allows(&user.0, entry.entity, access) {
            return Ok(());
        }
        tracing::debug!("{:?} on {} denied for {}", access, entry.entity.name, user.0.sub);
        Err(AdminError::NotFound {
            entity: entry.entity.name.to_string(),
        })
    }
}

/// Handler for one generated route, guarded by bearer authentication
pub fn bind(route: &GeneratedRoute, keys: Arc<JwtKeys>) -> MethodRouter<AdminState> {
    let entity: &'static str = route.entity;
    let router = match route.kind {
        RouteKind::List => get(
            move |State(state): State<AdminState>, user: CurrentUser, headers: HeaderMap| async move {
                list_view(state, entity, user, headers).await
            },
        ),
        RouteKind::DetailView => get(
            move |State(state): State<AdminState>,
                  user: CurrentUser,
                  Path(id): Path<String>,
                  headers: HeaderMap| async move {
                detail_view(state, entity, user, id, headers).await
            },
        ),
        RouteKind::DetailUpdate => get(
            move |State(state): State<AdminState>, user: CurrentUser, Path(id): Path<String>| async move {
                update_form(state, entity, user, id).await
            },
        )
        .post(
            move |State(state): State<AdminState>,
                  user: CurrentUser,
                  Path(id): Path<String>,
                  UpdatePayload(input): UpdatePayload| async move {
                update_submit(state, entity, user, id, input).await
            },
        ),
    };
    router.route_layer(middleware::from_fn_with_state(keys, require_auth))
}

/// Request body of an update: a JSON object or an urlencoded form
pub struct UpdatePayload(pub FormInput);

#[async_trait]
impl<S> FromRequest<S> for UpdatePayload
where
    S: Send + Sync,
{
    type Rejection = AdminError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.starts_with("application/json") {
            let Json(input) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|e| AdminError::BadRequest(e.body_text()))?;
            Ok(Self(input))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(input) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AdminError::BadRequest(e.body_text()))?;
            Ok(Self(
                input.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
            ))
        } else {
            Err(AdminError::BadRequest(format!(
                "expected application/json or application/x-www-form-urlencoded, got '{}'",
                content_type
            )))
        }
    }
}

/// JSON clients skip template rendering
fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json") && !accept.contains("text/html"))
        .unwrap_or(false)
}

fn context_of<T: Serialize>(body: &T) -> Map<String, Value> {
    match serde_json::to_value(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn scope_for(entry: &RegistryEntry, user: &CurrentUser) -> ScopeFilter {
    OwnershipPolicy::for_entity(entry.entity).scope(&Requester::from(&user.0))
}

fn parse_id(entity: &str, raw: &str) -> Result<String, AdminError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AdminError::InvalidId {
            entity: entity.to_string(),
            raw: raw.to_string(),
        })
}

async fn find_scoped(
    state: &AdminState,
    entry: &RegistryEntry,
    user: &CurrentUser,
    id: &str,
) -> Result<Record, AdminError> {
    store::find(&state.db, entry.entity, id, &scope_for(entry, user))
        .await?
        .ok_or_else(|| AdminError::NotFound {
            entity: entry.entity.name.to_string(),
        })
}

fn render_or_json<T: Serialize>(
    templates: &TemplateSet,
    headers: &HeaderMap,
    candidates: &[String],
    body: T,
    extra: impl FnOnce(&mut Map<String, Value>),
) -> Result<Response, AdminError> {
    if !wants_json(headers) {
        let mut context = context_of(&body);
        extra(&mut context);
        if let RenderOutcome::Rendered(html) = templates.render_chain(candidates, &context)? {
            return Ok(Html(html).into_response());
        }
    }
    Ok(Json(body).into_response())
}

async fn list_view(
    state: AdminState,
    entity_name: &'static str,
    user: CurrentUser,
    headers: HeaderMap,
) -> Result<Response, AdminError> {
    let entry = state.entry(entity_name)?;
    state.authorize(entry, &user, Access::Read)?;
    let (entity, declaration) = (entry.entity, &entry.metadata);
    serialize::check_declaration(entity, declaration)?;

    let records = store::list(&state.db, entity, &scope_for(entry, &user)).await?;
    let body = ListResponse {
        items: records
            .iter()
            .map(|r| serialize::list_item(entity, declaration, r))
            .collect(),
        model_name: entity.name.to_string(),
        model_name_lower: entity.name_lower(),
        title: format!("{} List", entity.name),
    };

    let candidates = list_chain(entity.app_label, &entity.name_lower());
    render_or_json(&state.templates, &headers, &candidates, body, |context| {
        let columns = serde_json::to_value(serialize::list_columns(entity, declaration))
            .unwrap_or(Value::Null);
        context.insert("columns".to_string(), columns);
        context.insert("app_label".to_string(), Value::from(entity.app_label));
    })
}

async fn detail_view(
    state: AdminState,
    entity_name: &'static str,
    user: CurrentUser,
    raw_id: String,
    headers: HeaderMap,
) -> Result<Response, AdminError> {
    let entry = state.entry(entity_name)?;
    state.authorize(entry, &user, Access::Read)?;
    let (entity, declaration) = (entry.entity, &entry.metadata);
    let id = parse_id(entity.name, &raw_id)?;
    serialize::check_declaration(entity, declaration)?;

    let record = find_scoped(&state, entry, &user, &id).await?;
    let body = DetailResponse {
        object: serialize::raw_object(&record),
        object_data: serialize::object_data(entity, declaration, &record),
        fieldsets: declaration.fieldsets_json(),
        model_name: entity.name.to_string(),
        model_name_lower: entity.name_lower(),
        title: format!("{} Detail", entity.name),
    };

    let candidates = detail_chain(entity.app_label, &entity.name_lower());
    render_or_json(&state.templates, &headers, &candidates, body, |context| {
        let form = state.forms.resolve(entity, declaration);
        let form_data = serde_json::to_value(form.field_configs()).unwrap_or(Value::Null);
        context.insert("form_data".to_string(), form_data);
        context.insert("app_label".to_string(), Value::from(entity.app_label));
    })
}

async fn update_form(
    state: AdminState,
    entity_name: &'static str,
    user: CurrentUser,
    raw_id: String,
) -> Result<Json<UpdateFormResponse>, AdminError> {
    let entry = state.entry(entity_name)?;
    state.authorize(entry, &user, Access::Edit)?;
    let (entity, declaration) = (entry.entity, &entry.metadata);
    let id = parse_id(entity.name, &raw_id)?;

    let record = find_scoped(&state, entry, &user, &id).await?;
    let form = state.forms.resolve(entity, declaration);

    Ok(Json(UpdateFormResponse {
        object_id: id,
        model_name: entity.name.to_string(),
        initial: serialize::initial_values(
            entity,
            declaration,
            &record,
            form.fields.iter().map(|f| f.name),
        ),
        fields: form.field_configs(),
    }))
}

async fn update_submit(
    state: AdminState,
    entity_name: &'static str,
    user: CurrentUser,
    raw_id: String,
    input: FormInput,
) -> Result<Json<UpdateSuccess>, AdminError> {
    let entry = state.entry(entity_name)?;
    state.authorize(entry, &user, Access::Edit)?;
    let (entity, declaration) = (entry.entity, &entry.metadata);
    let id = parse_id(entity.name, &raw_id)?;
    let scope = scope_for(entry, &user);

    // Existence and ownership are checked before validation
    find_scoped(&state, entry, &user, &id).await?;

    let form = state.forms.resolve(entity, declaration);
    let cleaned = form.validate(&input).map_err(AdminError::Validation)?;
    let changes = Changes::classify(entity, &form, cleaned);

    let record = match store::update(&state.db, entity, &id, &scope, changes).await? {
        UpdateOutcome::Updated(record) => record,
        UpdateOutcome::Rejected(errors) => return Err(AdminError::Validation(errors)),
        UpdateOutcome::NotFound => {
            return Err(AdminError::NotFound {
                entity: entity.name.to_string(),
            })
        }
    };

    tracing::info!("{} {} updated by {}", entity.name, id, user.0.sub);

    Ok(Json(UpdateSuccess {
        success: true,
        message: format!("{} updated successfully", entity.name),
        redirect_url: Some(format!("/r/{}/{}/view", entity.name, id)),
        fields: serialize::object_data(entity, declaration, &record),
    }))
}
