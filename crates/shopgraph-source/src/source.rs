//! Pipeline orchestrator.
//!
//! Linear stage machine, no back-edges:
//!
//! ```text
//! Init -> sub-entity collections (Image, Price)
//!      -> ProductTypes -> Collections -> Products (+ membership patches)
//!      -> Blogs -> Articles -> Pages -> Done
//! ```
//!
//! Stage order is fixed by the back-reference dependency: collections
//! must be fully drained before products, because products patch
//! `collection.products` by id lookup. Blogs precede articles for
//! consistency (articles hold a plain reference, so ordering is not
//! strictly required there).
//!
//! Everything runs on one logical task: stages are sequential, and pages
//! within a stage are sequential since each cursor depends on the
//! previous page. A stage failure aborts the remaining stages; collections
//! populated by earlier stages remain as partial state.

use crate::config::{EntityKind, ResolvedConfig};
use crate::error::SourceError;
use crate::normalize::{self, CollectionMembership};
use serde_json::Value;
use shopgraph_client::{paginate_all, queries, Transport};
use shopgraph_store::ShopStore;

pub struct Source {
    config: ResolvedConfig,
}

impl Source {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Run the full ingestion pipeline against `transport`, materializing
    /// the catalog into `store`. Fatal on first unrecovered error.
    pub async fn run<T: Transport + ?Sized>(
        &self,
        transport: &T,
        store: &mut ShopStore,
    ) -> Result<(), SourceError> {
        tracing::info!(store_url = %self.config.store_url, "loading catalog");

        // Sub-entity collections exist unconditionally: any included
        // top-level type may extract images or prices into them.
        store.add_collection(&self.config.type_names.price)?;
        store.add_collection(&self.config.type_names.image)?;

        self.product_types(transport, store).await?;
        self.collections(transport, store).await?;
        self.products(transport, store).await?;
        self.blogs(transport, store).await?;
        self.articles(transport, store).await?;
        self.pages(transport, store).await?;

        tracing::info!("catalog loaded");
        Ok(())
    }

    async fn drain<T: Transport + ?Sized>(
        &self,
        transport: &T,
        query: &str,
    ) -> Result<Vec<Value>, SourceError> {
        Ok(paginate_all(transport, query, self.config.per_page).await?)
    }

    async fn product_types<T: Transport + ?Sized>(
        &self,
        transport: &T,
        store: &mut ShopStore,
    ) -> Result<(), SourceError> {
        if !self.config.includes(EntityKind::ProductType) {
            return Ok(());
        }
        store.add_collection(&self.config.type_names.product_type)?;
        let nodes = self.drain(transport, queries::PRODUCT_TYPES_QUERY).await?;
        tracing::info!(count = nodes.len(), "ingesting product types");
        for raw in nodes {
            normalize::product_type(store, &self.config, raw)?;
        }
        Ok(())
    }

    async fn collections<T: Transport + ?Sized>(
        &self,
        transport: &T,
        store: &mut ShopStore,
    ) -> Result<(), SourceError> {
        if !self.config.includes(EntityKind::Collection) {
            return Ok(());
        }
        let collections = store.add_collection(&self.config.type_names.collection)?;
        collections.add_reference_field("products", &self.config.type_names.product);
        let nodes = self.drain(transport, queries::COLLECTIONS_QUERY).await?;
        tracing::info!(count = nodes.len(), "ingesting collections");
        for raw in nodes {
            normalize::collection(store, &self.config, raw)?;
        }
        Ok(())
    }

    async fn products<T: Transport + ?Sized>(
        &self,
        transport: &T,
        store: &mut ShopStore,
    ) -> Result<(), SourceError> {
        if !self.config.includes(EntityKind::Product) {
            return Ok(());
        }
        store.add_collection(&self.config.type_names.product)?;
        store.add_collection(&self.config.type_names.product_variant)?;
        let nodes = self.drain(transport, queries::PRODUCTS_QUERY).await?;
        tracing::info!(count = nodes.len(), "ingesting products");

        let mut memberships = Vec::new();
        for raw in nodes {
            memberships.extend(normalize::product(store, &self.config, raw)?);
        }
        self.apply_memberships(store, memberships)?;
        Ok(())
    }

    /// Phase two of back-reference synthesis: push each product id into
    /// its collections' `products` arrays, now that both sides exist. The
    /// API can name collections the collections query never returned
    /// (e.g. unpublished ones); those patches are skipped, while the
    /// forward reference on the product stays and resolves to nothing
    /// downstream.
    fn apply_memberships(
        &self,
        store: &mut ShopStore,
        memberships: Vec<CollectionMembership>,
    ) -> Result<(), SourceError> {
        if !self.config.includes(EntityKind::Collection) {
            return Ok(());
        }
        let type_name = self.config.type_names.collection.clone();
        for membership in memberships {
            let known = store
                .collection(&type_name)
                .is_some_and(|c| c.contains(&membership.collection_id));
            if !known {
                tracing::warn!(
                    collection_id = %membership.collection_id,
                    product_id = %membership.product_id,
                    "skipping membership patch for unknown collection"
                );
                continue;
            }
            store.push_field(
                &type_name,
                &membership.collection_id,
                "products",
                Value::String(membership.product_id),
            )?;
        }
        Ok(())
    }

    async fn blogs<T: Transport + ?Sized>(
        &self,
        transport: &T,
        store: &mut ShopStore,
    ) -> Result<(), SourceError> {
        if !self.config.includes(EntityKind::Blog) {
            return Ok(());
        }
        store.add_collection(&self.config.type_names.blog)?;
        let nodes = self.drain(transport, queries::BLOGS_QUERY).await?;
        tracing::info!(count = nodes.len(), "ingesting blogs");
        for raw in nodes {
            normalize::blog(store, &self.config, raw)?;
        }
        Ok(())
    }

    async fn articles<T: Transport + ?Sized>(
        &self,
        transport: &T,
        store: &mut ShopStore,
    ) -> Result<(), SourceError> {
        if !self.config.includes(EntityKind::Article) {
            return Ok(());
        }
        store.add_collection(&self.config.type_names.article)?;
        let nodes = self.drain(transport, queries::ARTICLES_QUERY).await?;
        tracing::info!(count = nodes.len(), "ingesting articles");
        for raw in nodes {
            normalize::article(store, &self.config, raw)?;
        }
        Ok(())
    }

    async fn pages<T: Transport + ?Sized>(
        &self,
        transport: &T,
        store: &mut ShopStore,
    ) -> Result<(), SourceError> {
        if !self.config.includes(EntityKind::Page) {
            return Ok(());
        }
        store.add_collection(&self.config.type_names.page)?;
        let nodes = self.drain(transport, queries::PAGES_QUERY).await?;
        tracing::info!(count = nodes.len(), "ingesting pages");
        for raw in nodes {
            normalize::page(store, &self.config, raw)?;
        }
        Ok(())
    }
}
