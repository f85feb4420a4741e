//! Source configuration.
//!
//! Raw options arrive as [`SourceConfig`] (what a config file or CLI
//! flags provide) and are validated once, before any network activity,
//! into an immutable [`ResolvedConfig`]: derived store URL, resolved
//! type names, and the inclusion set of entity kinds. Everything
//! downstream reads the resolved form; nothing consults ambient state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Entity kinds the pipeline can ingest, in stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    ProductType,
    Collection,
    Product,
    Blog,
    Article,
    Page,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::ProductType,
        EntityKind::Collection,
        EntityKind::Product,
        EntityKind::Blog,
        EntityKind::Article,
        EntityKind::Page,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::ProductType => "ProductType",
            EntityKind::Collection => "Collection",
            EntityKind::Product => "Product",
            EntityKind::Blog => "Blog",
            EntityKind::Article => "Article",
            EntityKind::Page => "Page",
        }
    }

    pub fn parse(name: &str) -> Option<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing store name or url")]
    MissingStoreIdentity,
    #[error("missing storefront access token")]
    MissingToken,
    #[error("unknown entity type `{0}`")]
    UnknownType(String),
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Raw source options, serde-loadable from a JSON config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfig {
    pub store_name: String,
    pub store_url: String,
    pub storefront_token: String,
    /// Display type-name prefix, e.g. `"Shopify"` produces
    /// `ShopifyProduct`. Empty falls back per field, see [`TypeNames`].
    pub type_name: String,
    /// Entity types to ingest; empty means all.
    pub types: Vec<String>,
    pub per_page: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            store_name: String::new(),
            store_url: String::new(),
            storefront_token: String::new(),
            type_name: "Shopify".to_string(),
            types: Vec::new(),
            per_page: 100,
        }
    }
}

impl SourceConfig {
    /// Validate and resolve. Fails fast on missing store identity or
    /// token, before any request is issued.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        if self.store_url.is_empty() && self.store_name.is_empty() {
            return Err(ConfigError::MissingStoreIdentity);
        }
        if self.storefront_token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.per_page == 0 {
            return Err(ConfigError::ZeroPageSize);
        }

        let store_url = if self.store_url.is_empty() {
            format!("https://{}.myshopify.com", self.store_name)
        } else {
            self.store_url.clone()
        };

        let included = if self.types.is_empty() {
            EntityKind::ALL.into_iter().collect()
        } else {
            let mut set = HashSet::new();
            for name in &self.types {
                let kind =
                    EntityKind::parse(name).ok_or_else(|| ConfigError::UnknownType(name.clone()))?;
                set.insert(kind);
            }
            set
        };

        Ok(ResolvedConfig {
            store_url,
            storefront_token: self.storefront_token,
            type_names: TypeNames::with_prefix(&self.type_name),
            included,
            per_page: self.per_page,
        })
    }
}

/// Validated, immutable configuration passed explicitly to every stage.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub store_url: String,
    pub storefront_token: String,
    pub type_names: TypeNames,
    pub included: HashSet<EntityKind>,
    pub per_page: u32,
}

impl ResolvedConfig {
    pub fn includes(&self, kind: EntityKind) -> bool {
        self.included.contains(&kind)
    }
}

/// Derived collection type names, computed once from the configured
/// prefix. Sub-entity collections (image, price) are always named with
/// the `Shopify` prefix regardless of configuration, as is any entity
/// whose bare name would collide with generator-internal types (`Page`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNames {
    pub article: String,
    pub blog: String,
    pub collection: String,
    pub product: String,
    pub product_variant: String,
    pub page: String,
    pub product_type: String,
    pub image: String,
    pub price: String,
}

impl TypeNames {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            article: derive_type_name(prefix, "Article"),
            blog: derive_type_name(prefix, "Blog"),
            collection: derive_type_name(prefix, "Collection"),
            product: derive_type_name(prefix, "Product"),
            product_variant: derive_type_name(prefix, "ProductVariant"),
            page: derive_type_name(prefix, "Page"),
            product_type: derive_type_name(prefix, "ProductType"),
            image: "ShopifyImage".to_string(),
            price: "ShopifyPrice".to_string(),
        }
    }

    pub fn for_kind(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::ProductType => &self.product_type,
            EntityKind::Collection => &self.collection,
            EntityKind::Product => &self.product,
            EntityKind::Blog => &self.blog,
            EntityKind::Article => &self.article,
            EntityKind::Page => &self.page,
        }
    }
}

/// Deterministic PascalCase type-name derivation: `("shop", "Product")`
/// becomes `ShopProduct`. Names that would collide with generator
/// internals keep a `Shopify` prefix even when the configured prefix is
/// empty.
fn derive_type_name(prefix: &str, name: &str) -> String {
    const PREFIXED_ALWAYS: [&str; 1] = ["Page"];
    let prefix = if prefix.is_empty() && PREFIXED_ALWAYS.contains(&name) {
        "Shopify"
    } else {
        prefix
    };
    format!("{}{}", pascal_case(prefix), name)
}

fn pascal_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
