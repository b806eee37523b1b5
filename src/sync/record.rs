use crate::sync::normalize::StatusKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A page as returned by the store. Property containers are kept as raw JSON
/// and decoded on demand by `normalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Record {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, created_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_time,
            properties: Map::new(),
        }
    }

    #[cfg(test)]
    pub fn with_property(mut self, name: &str, container: Value) -> Self {
        self.properties.insert(name.to_string(), container);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Replace each patched container in place, keeping the property id.
    pub fn apply_patch(&mut self, patch: &PropertyPatch) {
        for (name, container) in patch.iter() {
            let property_id = self
                .properties
                .get(name)
                .and_then(|existing| existing.get("id"))
                .cloned();
            let mut replacement = Map::new();
            if let Some(id) = property_id {
                replacement.insert("id".to_string(), id);
            }
            if let Some(fields) = container.as_object() {
                for (key, value) in fields {
                    replacement.insert("type".to_string(), Value::String(key.clone()));
                    replacement.insert(key.clone(), value.clone());
                }
            }
            self.properties
                .insert(name.clone(), Value::Object(replacement));
        }
    }
}

/// Partial property write: property name -> typed container.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyPatch(Map<String, Value>);

impl PropertyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, container: Value) -> Self {
        self.insert(name, container);
        self
    }

    pub fn insert(&mut self, name: &str, container: Value) {
        self.0.insert(name.to_string(), container);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

pub fn checkbox(value: bool) -> Value {
    json!({ "checkbox": value })
}

pub fn relation<I, S>(ids: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let refs: Vec<Value> = ids
        .into_iter()
        .map(|id| json!({ "id": id.as_ref() }))
        .collect();
    json!({ "relation": refs })
}

pub fn status(kind: StatusKind, label: &str) -> Value {
    let mut container = Map::new();
    container.insert(kind.key().to_string(), json!({ "name": label }));
    Value::Object(container)
}

pub fn title(text: &str) -> Value {
    json!({
        "title": [
            { "type": "text", "text": { "content": text } }
        ]
    })
}

pub fn date(day: NaiveDate) -> Value {
    json!({ "date": { "start": day.format("%Y-%m-%d").to_string() } })
}

/// The (id, title) pair surfaced in run outcomes and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRef {
    pub id: String,
    pub title: String,
}
