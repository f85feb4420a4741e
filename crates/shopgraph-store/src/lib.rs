//! Shopgraph store: typed node collections with cross-references
//!
//! Holds the ingested catalog as a graph of collections:
//! - Collections are named, insertion-ordered buckets of nodes
//! - Nodes are JSON records with a unique id per collection
//! - References are (typeName, id) pairs, resolved lazily at read time
//!
//! Nodes are immutable after insertion, with one exception: designated
//! array-valued back-reference fields (e.g. a collection's `products`
//! list) may be appended to via [`ShopStore::push_field`], because the
//! referencing side of a relationship is processed later in the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Core Types
// ============================================================================

/// A typed pointer to a node in another (or the same) collection.
///
/// References do not own their target. A reference to an id that has not
/// been inserted yet is valid as long as the node materializes by the end
/// of the run; the downstream consumer resolves references at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "typeName")]
    pub type_name: String,
    pub id: String,
}

impl Reference {
    /// Direct form: point at a known id in the given collection.
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Reflexive form: point at a freshly created node.
    pub fn to_node(type_name: impl Into<String>, node: &Node) -> Self {
        Self::new(type_name, node.id.clone())
    }

    /// Serialize into the `{"typeName": ..., "id": ...}` field value.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "typeName": self.type_name, "id": self.id })
    }

    /// Recognize a reference-shaped field value.
    pub fn from_value(value: &Value) -> Option<Reference> {
        let obj = value.as_object()?;
        if obj.len() != 2 {
            return None;
        }
        Some(Reference {
            type_name: obj.get("typeName")?.as_str()?.to_string(),
            id: obj.get("id")?.as_str()?.to_string(),
        })
    }
}

/// A single record in a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Node {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Declared reference target for a field, for downstream schema purposes.
/// Has no effect on the store's own invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceField {
    pub field: String,
    pub target_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection `{0}` already exists")]
    DuplicateCollection(String),
    #[error("collection `{0}` does not exist")]
    UnknownCollection(String),
    #[error("duplicate node id `{id}` in collection `{type_name}`")]
    DuplicateNode { type_name: String, id: String },
    #[error("no node `{id}` in collection `{type_name}`")]
    UnknownNode { type_name: String, id: String },
    #[error("field `{field}` of node `{id}` is not an array")]
    NotAnArray { id: String, field: String },
    #[error("record is not a JSON object: {0}")]
    InvalidRecord(String),
}

// ============================================================================
// Collection
// ============================================================================

/// A named, typed bucket of nodes. Insertion order is preserved; node ids
/// are unique within the collection.
#[derive(Debug, Clone)]
pub struct Collection {
    type_name: String,
    nodes: Vec<Node>,
    by_id: HashMap<String, usize>,
    reference_fields: Vec<ReferenceField>,
}

impl Collection {
    fn new(type_name: String) -> Self {
        Self {
            type_name,
            nodes: Vec::new(),
            by_id: HashMap::new(),
            reference_fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Insert a record (a JSON object). If the record carries no `id`
    /// field, a fresh UUID is assigned. Returns a reflexive reference to
    /// the inserted node.
    pub fn add_node(&mut self, record: Value) -> Result<Reference, StoreError> {
        let mut fields = match record {
            Value::Object(map) => map,
            other => return Err(StoreError::InvalidRecord(other.to_string())),
        };
        let id = match fields.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                fields.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        if self.by_id.contains_key(&id) {
            return Err(StoreError::DuplicateNode {
                type_name: self.type_name.clone(),
                id,
            });
        }
        self.by_id.insert(id.clone(), self.nodes.len());
        self.nodes.push(Node { id: id.clone(), fields });
        Ok(Reference::new(self.type_name.clone(), id))
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.by_id.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declare that `field` holds references into `target_type`. Schema
    /// metadata only.
    pub fn add_reference_field(
        &mut self,
        field: impl Into<String>,
        target_type: impl Into<String>,
    ) {
        self.reference_fields.push(ReferenceField {
            field: field.into(),
            target_type: target_type.into(),
        });
    }

    pub fn reference_fields(&self) -> &[ReferenceField] {
        &self.reference_fields
    }

    /// Append to an array-valued field of an already-inserted node. The
    /// one permitted post-insertion mutation, used for back-reference
    /// synthesis.
    pub fn push_field(&mut self, id: &str, field: &str, value: Value) -> Result<(), StoreError> {
        let idx = *self.by_id.get(id).ok_or_else(|| StoreError::UnknownNode {
            type_name: self.type_name.clone(),
            id: id.to_string(),
        })?;
        let node = &mut self.nodes[idx];
        match node.fields.get_mut(field) {
            Some(Value::Array(items)) => {
                items.push(value);
                Ok(())
            }
            _ => Err(StoreError::NotAnArray {
                id: id.to_string(),
                field: field.to_string(),
            }),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// The full node graph: one collection per entity type, in creation order.
#[derive(Debug, Default)]
pub struct ShopStore {
    collections: Vec<Collection>,
    by_type: HashMap<String, usize>,
}

impl ShopStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection. Type names are unique per store; a collection
    /// exists before any node is inserted into it and is never deleted.
    pub fn add_collection(
        &mut self,
        type_name: impl Into<String>,
    ) -> Result<&mut Collection, StoreError> {
        let type_name = type_name.into();
        if self.by_type.contains_key(&type_name) {
            return Err(StoreError::DuplicateCollection(type_name));
        }
        self.by_type.insert(type_name.clone(), self.collections.len());
        self.collections.push(Collection::new(type_name));
        Ok(self.collections.last_mut().unwrap())
    }

    pub fn collection(&self, type_name: &str) -> Option<&Collection> {
        self.by_type.get(type_name).map(|&i| &self.collections[i])
    }

    pub fn collection_mut(&mut self, type_name: &str) -> Result<&mut Collection, StoreError> {
        match self.by_type.get(type_name) {
            Some(&i) => Ok(&mut self.collections[i]),
            None => Err(StoreError::UnknownCollection(type_name.to_string())),
        }
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// Append `value` to an array field of the node `(type_name, id)`.
    pub fn push_field(
        &mut self,
        type_name: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.collection_mut(type_name)?.push_field(id, field, value)
    }

    /// Scan every reference value in the store and report those pointing
    /// at a collection in `included_types` whose target node never
    /// materialized. Test-facing consistency check; the pipeline does not
    /// call this at runtime.
    pub fn dangling_references(&self, included_types: &[&str]) -> Vec<Reference> {
        let mut dangling = Vec::new();
        for collection in &self.collections {
            for node in collection.nodes() {
                for value in node.fields.values() {
                    collect_dangling(self, included_types, value, &mut dangling);
                }
            }
        }
        dangling
    }
}

fn collect_dangling(
    store: &ShopStore,
    included_types: &[&str],
    value: &Value,
    out: &mut Vec<Reference>,
) {
    if let Some(reference) = Reference::from_value(value) {
        if included_types.contains(&reference.type_name.as_str()) {
            let resolved = store
                .collection(&reference.type_name)
                .is_some_and(|c| c.contains(&reference.id));
            if !resolved {
                out.push(reference);
            }
        }
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                collect_dangling(store, included_types, item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_dangling(store, included_types, item, out);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Tests
// ============================================================================
