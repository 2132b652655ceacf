use crate::error::CatalogError;
use serde_json::Value;

/// Source of the keyed content document. Fetching and caching belong to the
/// host.
pub trait ContentRepository {
    fn fetch_document(&self) -> Result<Value, String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    pub id: String,
    pub body: Value,
}

impl ContentRecord {
    pub fn title(&self) -> Option<&str> {
        self.body.get("title").and_then(Value::as_str)
    }
}

pub fn fetch_by_id(repo: &dyn ContentRepository, id: &str) -> Result<ContentRecord, CatalogError> {
    let document = repo
        .fetch_document()
        .map_err(CatalogError::RepositoryUnavailable)?;
    if !document.is_object() {
        return Err(CatalogError::RepositoryUnavailable(
            "content document is not an object".to_string(),
        ));
    }
    match document.get(id) {
        Some(body) if !body.is_null() => Ok(ContentRecord {
            id: id.to_string(),
            body: body.clone(),
        }),
        _ => Err(CatalogError::NotFound(id.to_string())),
    }
}

/// Last non-empty path segment of an entity reference, e.g. `/bbb/` -> `bbb`.
pub fn entity_id(entity: &str) -> Option<&str> {
    entity.split('/').rev().find(|s| !s.is_empty())
}
