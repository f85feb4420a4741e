//! Per-entity normalizers.
//!
//! Each function takes one raw API node and makes it store-ready:
//! embedded sub-entities (images, prices, variants) become nodes in their
//! own collections and are replaced in the parent by typed references;
//! fields naming another top-level entity by id become references when
//! that entity type is included in the run, and are dropped entirely when
//! it is not. Forward references to nodes that have not been inserted yet
//! are valid; the store resolves references at read time.
//!
//! Back-reference synthesis (collection.products) is two-phase: product
//! normalization returns [`CollectionMembership`] patch records, which
//! the orchestrator applies in one pass after the product stage drains.

use crate::config::{EntityKind, ResolvedConfig};
use crate::error::SourceError;
use serde_json::{Map, Value};
use shopgraph_store::{Reference, ShopStore};

/// A product's membership in a collection, to be patched into the
/// collection node's `products` array after the product stage completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMembership {
    pub collection_id: String,
    pub product_id: String,
}

fn into_object(raw: Value, what: &str) -> Result<Map<String, Value>, SourceError> {
    match raw {
        Value::Object(map) => Ok(map),
        other => Err(SourceError::Protocol(format!(
            "{what} node is not an object: {other}"
        ))),
    }
}

fn node_id(fields: &Map<String, Value>, what: &str) -> Result<String, SourceError> {
    fields
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SourceError::Protocol(format!("{what} node has no id")))
}

/// Unwrap a nested `{edges: [{node}]}` connection into its nodes.
fn connection_nodes(value: Value, what: &str) -> Result<Vec<Value>, SourceError> {
    let mut connection = into_object(value, what)?;
    let edges = match connection.remove("edges") {
        Some(Value::Array(edges)) => edges,
        _ => {
            return Err(SourceError::Protocol(format!(
                "{what} connection has no edges array"
            )))
        }
    };
    Ok(edges
        .into_iter()
        .map(|mut edge| edge.get_mut("node").map(Value::take).unwrap_or(Value::Null))
        .collect())
}

/// Insert a price snapshot into the shared price collection. Prices have
/// no natural id; the store assigns a fresh one. Every occurrence becomes
/// its own node, value-identical or not.
fn add_price(
    store: &mut ShopStore,
    config: &ResolvedConfig,
    price: Value,
) -> Result<Value, SourceError> {
    let reference = store
        .collection_mut(&config.type_names.price)?
        .add_node(price)?;
    Ok(reference.to_value())
}

/// Insert an embedded image into the shared image collection, keeping its
/// API id, and return a reference to it.
fn add_image(
    store: &mut ShopStore,
    config: &ResolvedConfig,
    image: Value,
) -> Result<Value, SourceError> {
    let reference = store
        .collection_mut(&config.type_names.image)?
        .add_node(image)?;
    Ok(reference.to_value())
}

/// Extract a singular embedded image field, when present and non-null.
fn extract_image_field(
    store: &mut ShopStore,
    config: &ResolvedConfig,
    fields: &mut Map<String, Value>,
) -> Result<(), SourceError> {
    if fields.get("image").is_some_and(Value::is_object) {
        let image = fields.remove("image").unwrap();
        let reference = add_image(store, config, image)?;
        fields.insert("image".to_string(), reference);
    }
    Ok(())
}

// ============================================================================
// Top-level entities
// ============================================================================

/// Collection: extracts the embedded image, and initializes an empty
/// `products` back-reference array when products are part of this run.
/// Collections are ingested before products so the array exists by the
/// time membership patches arrive.
pub fn collection(
    store: &mut ShopStore,
    config: &ResolvedConfig,
    raw: Value,
) -> Result<(), SourceError> {
    let mut fields = into_object(raw, "collection")?;
    if config.includes(EntityKind::Product) {
        fields.insert("products".to_string(), Value::Array(Vec::new()));
    }
    extract_image_field(store, config, &mut fields)?;
    store
        .collection_mut(&config.type_names.collection)?
        .add_node(Value::Object(fields))?;
    Ok(())
}

/// Product: the densest normalizer. Extracts images, variants (with their
/// own prices and image references), and the price range; rewrites
/// collection membership into references and returns the back-reference
/// patches for the orchestrator.
pub fn product(
    store: &mut ShopStore,
    config: &ResolvedConfig,
    raw: Value,
) -> Result<Vec<CollectionMembership>, SourceError> {
    let mut fields = into_object(raw, "product")?;
    let product_id = node_id(&fields, "product")?;
    let mut memberships = Vec::new();

    // Collection membership: references plus back-reference patches,
    // only when collections are part of this run.
    if config.includes(EntityKind::Collection) {
        let connection = fields
            .remove("collections")
            .ok_or_else(|| SourceError::Protocol("product has no collections field".to_string()))?;
        let mut references = Vec::new();
        for node in connection_nodes(connection, "product.collections")? {
            let collection = into_object(node, "product.collections")?;
            let collection_id = node_id(&collection, "product.collections")?;
            memberships.push(CollectionMembership {
                collection_id: collection_id.clone(),
                product_id: product_id.clone(),
            });
            references.push(Reference::new(&config.type_names.collection, collection_id).to_value());
        }
        fields.insert("collections".to_string(), Value::Array(references));
    } else {
        fields.remove("collections");
    }

    // Price range min/max, each its own price node
    if let Some(range) = fields.remove("priceRange") {
        let mut range = into_object(range, "product.priceRange")?;
        let min = range
            .remove("minVariantPrice")
            .ok_or_else(|| SourceError::Protocol("priceRange missing minVariantPrice".to_string()))?;
        let max = range
            .remove("maxVariantPrice")
            .ok_or_else(|| SourceError::Protocol("priceRange missing maxVariantPrice".to_string()))?;
        let min_ref = add_price(store, config, min)?;
        let max_ref = add_price(store, config, max)?;
        fields.insert(
            "priceRange".to_string(),
            serde_json::json!({ "minVariantPrice": min_ref, "maxVariantPrice": max_ref }),
        );
    }

    // Embedded images, keeping API ids
    if let Some(connection) = fields.remove("images") {
        let mut references = Vec::new();
        for image in connection_nodes(connection, "product.images")? {
            references.push(add_image(store, config, image)?);
        }
        fields.insert("images".to_string(), Value::Array(references));
    }

    // Variants: each becomes its own node, its price extracted and its
    // image rewritten to a reference into the already-populated image
    // collection.
    if let Some(connection) = fields.remove("variants") {
        let mut references = Vec::new();
        for variant in connection_nodes(connection, "product.variants")? {
            let mut variant = into_object(variant, "product.variants")?;

            if variant.get("image").is_some_and(Value::is_object) {
                let image = variant.remove("image").unwrap();
                let image = into_object(image, "variant.image")?;
                let image_id = node_id(&image, "variant.image")?;
                variant.insert(
                    "image".to_string(),
                    Reference::new(&config.type_names.image, image_id).to_value(),
                );
            }

            if let Some(price) = variant.remove("price") {
                let price_ref = add_price(store, config, price)?;
                variant.insert("price".to_string(), price_ref);
            }

            let reference = store
                .collection_mut(&config.type_names.product_variant)?
                .add_node(Value::Object(variant))?;
            references.push(reference.to_value());
        }
        fields.insert("variants".to_string(), Value::Array(references));
    }

    store
        .collection_mut(&config.type_names.product)?
        .add_node(Value::Object(fields))?;
    Ok(memberships)
}

/// Blog: inserted as-is.
pub fn blog(store: &mut ShopStore, config: &ResolvedConfig, raw: Value) -> Result<(), SourceError> {
    let fields = into_object(raw, "blog")?;
    store
        .collection_mut(&config.type_names.blog)?
        .add_node(Value::Object(fields))?;
    Ok(())
}

/// Article: extracts the embedded image and rewrites the blog link to a
/// reference when blogs are included; drops the field otherwise. Plain
/// reference only, no back-reference list is maintained on the blog.
pub fn article(
    store: &mut ShopStore,
    config: &ResolvedConfig,
    raw: Value,
) -> Result<(), SourceError> {
    let mut fields = into_object(raw, "article")?;
    extract_image_field(store, config, &mut fields)?;

    if config.includes(EntityKind::Blog) {
        let blog = fields
            .remove("blog")
            .ok_or_else(|| SourceError::Protocol("article has no blog field".to_string()))?;
        let blog = into_object(blog, "article.blog")?;
        let blog_id = node_id(&blog, "article.blog")?;
        fields.insert(
            "blog".to_string(),
            Reference::new(&config.type_names.blog, blog_id).to_value(),
        );
    } else {
        fields.remove("blog");
    }

    store
        .collection_mut(&config.type_names.article)?
        .add_node(Value::Object(fields))?;
    Ok(())
}

/// Page: inserted as-is.
pub fn page(store: &mut ShopStore, config: &ResolvedConfig, raw: Value) -> Result<(), SourceError> {
    let fields = into_object(raw, "page")?;
    store
        .collection_mut(&config.type_names.page)?
        .add_node(Value::Object(fields))?;
    Ok(())
}

/// Product type: the API yields bare strings; empty ones are skipped and
/// the rest are wrapped into `{title}` records with generated ids.
pub fn product_type(
    store: &mut ShopStore,
    config: &ResolvedConfig,
    raw: Value,
) -> Result<(), SourceError> {
    let title = match raw.as_str() {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => return Ok(()),
    };
    store
        .collection_mut(&config.type_names.product_type)?
        .add_node(serde_json::json!({ "title": title }))?;
    Ok(())
}
