//! Route synthesis from the registry
//!
//! Every registered entity type gets exactly three routes: a list, a
//! detail view and a detail update. Path segments keep the declared casing
//! of the entity name.

use std::collections::HashSet;

use axum::{routing::MethodRouter, Router};
use serde::Serialize;

use super::entity::PrimaryKey;
use super::error::ConfigError;
use super::registry::MetadataRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    List,
    DetailView,
    DetailUpdate,
}

impl RouteKind {
    pub const ALL: [RouteKind; 3] = [Self::List, Self::DetailView, Self::DetailUpdate];

    fn suffix(&self) -> &'static str {
        match self {
            Self::List => "listview",
            Self::DetailView => "detailview",
            Self::DetailUpdate => "update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedRoute {
    pub kind: RouteKind,
    /// Pattern as shown to operators, e.g. `r/Agent/<uuid>/view`
    pub template: String,
    /// Path registered with the router, e.g. `/r/Agent/:id/view`
    pub path: String,
    /// Stable name for reverse lookup, e.g. `agent_detailview`
    pub name: String,
    pub entity: &'static str,
}

impl GeneratedRoute {
    fn new(kind: RouteKind, entity: &'static str) -> Self {
        let (template, path) = match kind {
            RouteKind::List => (format!("m/{}/list", entity), format!("/m/{}/list", entity)),
            RouteKind::DetailView => (
                format!("r/{}/<uuid>/view", entity),
                format!("/r/{}/:id/view", entity),
            ),
            RouteKind::DetailUpdate => (
                format!("r/{}/<uuid>/update", entity),
                format!("/r/{}/:id/update", entity),
            ),
        };
        Self {
            kind,
            template,
            path,
            name: format!("{}_{}", entity.to_lowercase(), kind.suffix()),
            entity,
        }
    }

    /// Concrete URL for this route
    pub fn url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => self.path.replace(":id", id),
            None => self.path.clone(),
        }
    }
}

/// Routes for every registered entity, in registration order.
///
/// Fails when an entity's primary key cannot be matched by `<uuid>`.
pub fn synthesize(registry: &MetadataRegistry) -> Result<Vec<GeneratedRoute>, ConfigError> {
    let mut routes = Vec::with_capacity(registry.len() * RouteKind::ALL.len());
    for entry in registry.list_all() {
        let entity = entry.entity;
        if entity.primary_key != PrimaryKey::Uuid {
            return Err(ConfigError::UnsupportedKeyType {
                entity: entity.name.to_string(),
                key: entity.primary_key,
            });
        }
        for kind in RouteKind::ALL {
            routes.push(GeneratedRoute::new(kind, entity.name));
        }
    }
    Ok(routes)
}

/// Look up a generated route by name and build its URL
pub fn reverse(routes: &[GeneratedRoute], name: &str, id: Option<&str>) -> Option<String> {
    routes.iter().find(|r| r.name == name).map(|r| r.url(id))
}

/// Path with every `:param` and `*wildcard` segment replaced by one
/// placeholder, so `/r/Agent/:agent_id/view` and `/r/Agent/:id/view` collide
fn route_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.chars().next() {
            Some(':') => ":",
            Some('*') => "*",
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Hand-written routes take precedence over generated ones with the same
/// path shape
pub struct RouteTable<S = ()> {
    router: Router<S>,
    /// Shapes of mounted paths, see `route_shape`
    declared: HashSet<String>,
    skipped: Vec<String>,
}

impl<S> Default for RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            router: Router::new(),
            declared: HashSet::new(),
            skipped: Vec::new(),
        }
    }
}

impl<S> RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, handler: MethodRouter<S>) -> Self {
        self.declared.insert(route_shape(path));
        self.router = self.router.route(path, handler);
        self
    }

    /// Mount generated routes after the hand-written ones
    pub fn generated<F>(mut self, routes: &[GeneratedRoute], mut bind: F) -> Self
    where
        F: FnMut(&GeneratedRoute) -> MethodRouter<S>,
    {
        for route in routes {
            if !self.declared.insert(route_shape(&route.path)) {
                tracing::warn!(
                    "Generated route {} ({}) shadowed by a hand-written route",
                    route.name,
                    route.path
                );
                self.skipped.push(route.name.clone());
                continue;
            }
            self.router = self.router.route(&route.path, bind(route));
        }
        self
    }

    /// Names of generated routes that were not mounted
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn into_router(self) -> Router<S> {
        self.router
    }
}
