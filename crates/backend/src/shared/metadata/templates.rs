//! Template lookup with an ordered fallback chain
//!
//! Each candidate is tried in order and yields [`RenderOutcome::Rendered`]
//! or [`RenderOutcome::NotApplicable`] when the file does not exist. The
//! caller supplies the final JSON fallback.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template {template}: undefined variable `{key}`")]
    UndefinedVariable { template: String, key: String },

    #[error("template {template}: unterminated tag at byte {offset}")]
    UnterminatedTag { template: String, offset: usize },

    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(String),
    NotApplicable,
}

pub fn list_chain(app_label: &str, name_lower: &str) -> Vec<String> {
    vec![
        format!("{}/{}_listview.html", app_label, name_lower),
        "core/base_list_view.html".to_string(),
        "core/generic_list_view.html".to_string(),
    ]
}

pub fn detail_chain(app_label: &str, name_lower: &str) -> Vec<String> {
    vec![
        format!("{}/{}_detail.html", app_label, name_lower),
        "core/base_detail_view.html".to_string(),
        "core/generic_detail_view.html".to_string(),
    ]
}

/// Templates loaded once at startup, keyed by path relative to the root
#[derive(Debug, Default, Clone)]
pub struct TemplateSet {
    templates: HashMap<String, String>,
}

impl TemplateSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            templates: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load every `.html` file below `root`. A missing root gives an empty set.
    pub fn load(root: &Path) -> Result<Self, TemplateError> {
        let mut templates = HashMap::new();
        if root.is_dir() {
            collect(root, root, &mut templates)?;
        } else {
            tracing::info!(
                "Template directory {} not found, views will answer with JSON",
                root.display()
            );
        }
        tracing::info!("Loaded {} templates from {}", templates.len(), root.display());
        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn render(&self, name: &str, context: &Map<String, Value>) -> Result<RenderOutcome, TemplateError> {
        match self.templates.get(name) {
            Some(source) => render_source(name, source, context).map(RenderOutcome::Rendered),
            None => Ok(RenderOutcome::NotApplicable),
        }
    }

    /// First candidate that renders wins. When candidates exist but all
    /// fail, the last failure is returned.
    pub fn render_chain(
        &self,
        candidates: &[String],
        context: &Map<String, Value>,
    ) -> Result<RenderOutcome, TemplateError> {
        let mut last_error = None;
        for name in candidates {
            match self.render(name, context) {
                Ok(RenderOutcome::Rendered(html)) => {
                    tracing::debug!("Rendered template {}", name);
                    return Ok(RenderOutcome::Rendered(html));
                }
                Ok(RenderOutcome::NotApplicable) => continue,
                Err(e) => {
                    tracing::warn!("{}", e);
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(RenderOutcome::NotApplicable),
        }
    }
}

fn collect(root: &Path, dir: &Path, out: &mut HashMap<String, String>) -> Result<(), TemplateError> {
    let io_error = |path: &Path, source| TemplateError::Io {
        path: path.display().to_string(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let path = entry.map_err(|e| io_error(dir, e))?.path();
        if path.is_dir() {
            collect(root, &path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("html") {
            let source = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.insert(key, source);
        }
    }
    Ok(())
}

/// Substitute `{{ key }}` and `{{ key.sub }}` placeholders
fn render_source(name: &str, source: &str, context: &Map<String, Value>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or(TemplateError::UnterminatedTag {
            template: name.to_string(),
            offset: offset + start,
        })?;
        let key = after[..end].trim();
        let value = lookup(context, key).ok_or_else(|| TemplateError::UndefinedVariable {
            template: name.to_string(),
            key: key.to_string(),
        })?;
        match value {
            Value::String(s) => push_escaped(&mut out, s),
            other => push_escaped(&mut out, &other.to_string()),
        }
        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup<'a>(context: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let mut current = context.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> Map<String, Value> {
        json!({
            "title": "Agent List",
            "model_name": "Agent",
            "object_data": {"name": "<Helper>", "tags": ["a", "b"]},
            "count": 2
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_placeholders_are_substituted_and_escaped() {
        let set = TemplateSet::from_pairs([(
            "core/generic_detail_view.html",
            "<h1>{{ title }}</h1><p>{{object_data.name}}</p><i>{{ count }}</i><b>{{ object_data.tags.1 }}</b>",
        )]);
        let outcome = set.render("core/generic_detail_view.html", &context()).unwrap();
        assert_eq!(
            outcome,
            RenderOutcome::Rendered(
                "<h1>Agent List</h1><p>&lt;Helper&gt;</p><i>2</i><b>b</b>".to_string()
            )
        );
    }

    #[test]
    fn test_missing_template_is_not_applicable() {
        let set = TemplateSet::empty();
        assert_eq!(
            set.render_chain(&list_chain("core_agent", "agent"), &context()).unwrap(),
            RenderOutcome::NotApplicable
        );
    }

    #[test]
    fn test_chain_uses_first_existing_template() {
        let set = TemplateSet::from_pairs([
            ("core/generic_list_view.html", "generic {{ title }}"),
            ("core/base_list_view.html", "base {{ title }}"),
        ]);
        let outcome = set
            .render_chain(&list_chain("core_agent", "agent"), &context())
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered("base Agent List".to_string()));
    }

    #[test]
    fn test_chain_continues_past_render_errors() {
        let set = TemplateSet::from_pairs([
            ("core_agent/agent_listview.html", "{{ missing }}"),
            ("core/generic_list_view.html", "generic {{ model_name }}"),
        ]);
        let outcome = set
            .render_chain(&list_chain("core_agent", "agent"), &context())
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Rendered("generic Agent".to_string()));
    }

    #[test]
    fn test_last_error_surfaces_when_nothing_renders() {
        let set = TemplateSet::from_pairs([("core/base_detail_view.html", "{{ title ")]);
        let err = set
            .render_chain(&detail_chain("core_agent", "agent"), &context())
            .unwrap_err();
        assert!(matches!(err, TemplateError::UnterminatedTag { offset: 0, .. }));
    }

    #[test]
    fn test_load_missing_directory_is_empty() {
        let set = TemplateSet::load(Path::new("/nonexistent/templates/dir")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_keys_by_relative_path() {
        let root = std::env::temp_dir().join(format!("templates-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("core")).unwrap();
        std::fs::write(root.join("core/generic_list_view.html"), "{{ title }}").unwrap();
        std::fs::write(root.join("core/notes.txt"), "ignored").unwrap();

        let set = TemplateSet::load(&root).unwrap();
        assert_eq!(set.len(), 1);
        let context = json!({"title": "Agents"}).as_object().cloned().unwrap();
        let rendered = set.render("core/generic_list_view.html", &context).unwrap();
        assert!(matches!(rendered, RenderOutcome::Rendered(ref html) if html == "Agents"));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
