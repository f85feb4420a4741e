//! Shopgraph ingestion pipeline
//!
//! Drains a Shopify Storefront catalog (products, collections, blogs,
//! articles, pages) through cursor-paginated GraphQL queries and
//! materializes it as a graph of typed, cross-referencing node
//! collections in a [`shopgraph_store::ShopStore`].
//!
//! The pipeline is a fixed sequence of stages gated by an inclusion set;
//! each stage fully drains its query, normalizes every raw node
//! (extracting images, prices and variants into their own collections and
//! rewriting embedded objects into references), and product ingestion
//! additionally patches `collection.products` back-references in a second
//! phase. See [`source::Source::run`].

pub mod config;
pub mod error;
pub mod normalize;
pub mod source;

pub use config::{ConfigError, EntityKind, ResolvedConfig, SourceConfig, TypeNames};
pub use error::SourceError;
pub use source::Source;
