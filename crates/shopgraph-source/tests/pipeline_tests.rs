//! End-to-end pipeline scenarios against scripted transports.

use serde_json::{json, Value};
use shopgraph_client::testing::RoutedTransport;
use shopgraph_client::PageVariables;
use shopgraph_source::{Source, SourceConfig, SourceError};
use shopgraph_store::{Reference, ShopStore};

fn config(types: &[&str], per_page: u32) -> SourceConfig {
    SourceConfig {
        store_name: "demo".to_string(),
        storefront_token: "token".to_string(),
        types: types.iter().map(|s| s.to_string()).collect(),
        per_page,
        ..SourceConfig::default()
    }
}

fn page(nodes: Vec<Value>, cursor_base: usize, has_next: bool) -> Value {
    let edges: Vec<Value> = nodes
        .into_iter()
        .enumerate()
        .map(|(i, node)| json!({"cursor": format!("cur{}", cursor_base + i), "node": node}))
        .collect();
    json!({"data": {"pageInfo": {"hasNextPage": has_next}, "edges": edges}})
}

fn run(source: &Source, transport: &RoutedTransport) -> Result<ShopStore, SourceError> {
    let mut store = ShopStore::new();
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    rt.block_on(source.run(transport, &mut store))?;
    Ok(store)
}

fn product_node(id: &str, collection_ids: &[&str]) -> Value {
    let collection_edges: Vec<Value> = collection_ids
        .iter()
        .map(|cid| json!({"node": {"id": cid}}))
        .collect();
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "collections": {"edges": collection_edges},
        "images": {"edges": [{"node": {"altText": "studio shot", "originalSrc": "https://cdn/img.png"}}]},
        "variants": {"edges": [{"node": {
            "id": format!("{id}-v1"),
            "title": "Default",
            "price": {"amount": "12.0", "currencyCode": "USD"},
        }}]},
        "priceRange": {
            "minVariantPrice": {"amount": "12.0", "currencyCode": "USD"},
            "maxVariantPrice": {"amount": "12.0", "currencyCode": "USD"},
        },
    })
}

#[test]
fn test_reference_integrity_between_products_and_collections() {
    let transport = RoutedTransport::new()
        .route(
            "GetCollections",
            vec![page(
                vec![
                    json!({"id": "c1", "title": "Hats"}),
                    json!({"id": "c2", "title": "Sale"}),
                ],
                0,
                false,
            )],
        )
        .route(
            "GetProducts",
            vec![page(
                vec![
                    product_node("p1", &["c1", "c2"]),
                    product_node("p2", &["c2"]),
                ],
                0,
                false,
            )],
        );

    let source = Source::new(
        config(&["Collection", "Product"], 100)
            .resolve()
            .unwrap(),
    );
    let store = run(&source, &transport).unwrap();

    // Every collection reference on a product resolves to a collection
    // whose products array lists the product back.
    let products = store.collection("ShopifyProduct").unwrap();
    for product in products.nodes() {
        let references = product.get("collections").unwrap().as_array().unwrap();
        for value in references {
            let reference = Reference::from_value(value).unwrap();
            let target = store
                .collection(&reference.type_name)
                .unwrap()
                .get_node(&reference.id)
                .unwrap();
            let members = target.get("products").unwrap().as_array().unwrap();
            assert!(members.contains(&json!(product.id)));
        }
    }

    let c1 = store
        .collection("ShopifyCollection")
        .unwrap()
        .get_node("c1")
        .unwrap();
    assert_eq!(c1.get("products").unwrap(), &json!(["p1"]));
    let c2 = store
        .collection("ShopifyCollection")
        .unwrap()
        .get_node("c2")
        .unwrap();
    assert_eq!(c2.get("products").unwrap(), &json!(["p1", "p2"]));

    // Nothing dangles across the whole run
    assert!(store
        .dangling_references(&["ShopifyCollection", "ShopifyProduct"])
        .is_empty());
}

#[test]
fn test_sub_entity_isolation_for_identical_images() {
    // Two products whose embedded images are value-identical and carry no
    // API id: each occurrence still becomes its own image node.
    let transport = RoutedTransport::new().route(
        "GetProducts",
        vec![page(
            vec![product_node("p1", &[]), product_node("p2", &[])],
            0,
            false,
        )],
    );

    let source = Source::new(config(&["Product"], 100).resolve().unwrap());
    let store = run(&source, &transport).unwrap();

    let images = store.collection("ShopifyImage").unwrap();
    assert_eq!(images.len(), 2);
    assert_ne!(images.nodes()[0].id, images.nodes()[1].id);
    assert_eq!(
        images.nodes()[0].get("originalSrc"),
        images.nodes()[1].get("originalSrc")
    );
}

#[test]
fn test_inclusion_filtering_products_only() {
    let transport = RoutedTransport::new().route(
        "GetProducts",
        vec![page(vec![product_node("p1", &["c1"])], 0, false)],
    );

    let source = Source::new(config(&["Product"], 100).resolve().unwrap());
    let store = run(&source, &transport).unwrap();

    let names: Vec<&str> = store
        .collections()
        .iter()
        .map(|c| c.type_name())
        .collect();
    assert_eq!(
        names,
        vec![
            "ShopifyPrice",
            "ShopifyImage",
            "ShopifyProduct",
            "ShopifyProductVariant",
        ]
    );

    // The collections field is omitted entirely, not left dangling
    let product = store
        .collection("ShopifyProduct")
        .unwrap()
        .get_node("p1")
        .unwrap();
    assert!(product.get("collections").is_none());
}

#[test]
fn test_article_ingestion_end_to_end() {
    // Page size 2 against three articles with no embedded images and no
    // Blog included: two requests, three nodes, no image or blog fields.
    let articles: Vec<Value> = (1..=3)
        .map(|i| json!({"id": format!("a{i}"), "title": format!("Article {i}"), "blog": {"id": "b1"}}))
        .collect();
    let transport = RoutedTransport::new().route(
        "GetArticles",
        vec![
            page(articles[..2].to_vec(), 0, true),
            page(articles[2..].to_vec(), 2, false),
        ],
    );

    let source = Source::new(config(&["Article"], 2).resolve().unwrap());
    let store = run(&source, &transport).unwrap();

    let requests = transport.requests_for("GetArticles");
    assert_eq!(
        requests,
        vec![
            PageVariables {
                first: 2,
                after: None
            },
            PageVariables {
                first: 2,
                after: Some("cur1".to_string())
            },
        ]
    );

    let stored = store.collection("ShopifyArticle").unwrap();
    assert_eq!(stored.len(), 3);
    for article in stored.nodes() {
        assert!(article.get("image").is_none());
        assert!(article.get("blog").is_none());
    }
}

#[test]
fn test_articles_link_blogs_when_included() {
    let transport = RoutedTransport::new()
        .route(
            "GetBlogs",
            vec![page(vec![json!({"id": "b1", "title": "News"})], 0, false)],
        )
        .route(
            "GetArticles",
            vec![page(
                vec![json!({"id": "a1", "title": "Hello", "blog": {"id": "b1"}})],
                0,
                false,
            )],
        );

    let source = Source::new(config(&["Blog", "Article"], 100).resolve().unwrap());
    let store = run(&source, &transport).unwrap();

    let article = store
        .collection("ShopifyArticle")
        .unwrap()
        .get_node("a1")
        .unwrap();
    assert_eq!(
        article.get("blog").unwrap(),
        &Reference::new("ShopifyBlog", "b1").to_value()
    );
    assert!(store
        .dangling_references(&["ShopifyBlog", "ShopifyArticle"])
        .is_empty());
}

#[test]
fn test_membership_patch_skips_unknown_collection() {
    // The products query names a collection the collections query never
    // returned; the patch is skipped, the run succeeds, and the forward
    // reference stays on the product.
    let transport = RoutedTransport::new()
        .route(
            "GetCollections",
            vec![page(vec![json!({"id": "c1", "title": "Hats"})], 0, false)],
        )
        .route(
            "GetProducts",
            vec![page(vec![product_node("p1", &["c1", "c-hidden"])], 0, false)],
        );

    let source = Source::new(
        config(&["Collection", "Product"], 100)
            .resolve()
            .unwrap(),
    );
    let store = run(&source, &transport).unwrap();

    let c1 = store
        .collection("ShopifyCollection")
        .unwrap()
        .get_node("c1")
        .unwrap();
    assert_eq!(c1.get("products").unwrap(), &json!(["p1"]));

    let product = store
        .collection("ShopifyProduct")
        .unwrap()
        .get_node("p1")
        .unwrap();
    let references = product.get("collections").unwrap().as_array().unwrap();
    assert_eq!(references.len(), 2);
}

#[test]
fn test_product_types_wrapped_and_stage_ordering() {
    let transport = RoutedTransport::new()
        .route(
            "GetProductTypes",
            vec![page(vec![json!("Hats"), json!(""), json!("Shoes")], 0, false)],
        )
        .route(
            "GetPages",
            vec![page(
                vec![json!({"id": "pg1", "title": "About", "body": "x"})],
                0,
                false,
            )],
        );

    let source = Source::new(
        config(&["ProductType", "Page"], 100).resolve().unwrap(),
    );
    let store = run(&source, &transport).unwrap();

    let names: Vec<&str> = store
        .collections()
        .iter()
        .map(|c| c.type_name())
        .collect();
    assert_eq!(
        names,
        vec![
            "ShopifyPrice",
            "ShopifyImage",
            "ShopifyProductType",
            "ShopifyPage",
        ]
    );
    let types = store.collection("ShopifyProductType").unwrap();
    assert_eq!(types.len(), 2);
}

#[test]
fn test_stage_failure_keeps_prior_collections() {
    // Collections drain fine; products have no scripted route, so the
    // product stage fails. The run aborts with no rollback.
    let transport = RoutedTransport::new().route(
        "GetCollections",
        vec![page(vec![json!({"id": "c1", "title": "Hats"})], 0, false)],
    );

    let source = Source::new(
        config(&["Collection", "Product"], 100)
            .resolve()
            .unwrap(),
    );
    let mut store = ShopStore::new();
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let err = rt
        .block_on(source.run(&transport, &mut store))
        .unwrap_err();
    assert!(matches!(err, SourceError::Transport(_)));

    // Prior stages' collections survive the abort
    let collections = store.collection("ShopifyCollection").unwrap();
    assert_eq!(collections.len(), 1);
    // The product collection was created before its drain failed
    assert!(store.collection("ShopifyProduct").is_some());
}
