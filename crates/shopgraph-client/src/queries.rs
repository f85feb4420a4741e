//! Storefront GraphQL documents.
//!
//! Every paginated query aliases its connection to `data` and returns the
//! cursor envelope `{pageInfo{hasNextPage}, edges[{cursor, node}]}` that
//! [`crate::paginate_all`] expects. Nested sub-lists (images, variants,
//! comments, metafields) are fetched with `first: 250`, the Storefront
//! maximum; anything past that ceiling is truncated.

pub const ARTICLES_QUERY: &str = r#"
  query GetArticles($first: Int!, $after: String) {
    data: articles(first: $first, after: $after) {
      pageInfo {
        hasNextPage
      }
      edges {
        cursor
        node {
          author: authorV2 {
            bio
            email
            firstName
            lastName
            name
          }
          blog {
            id
          }
          comments(first: 250) {
            edges {
              node {
                author {
                  email
                  name
                }
                content
                contentHtml
                id
              }
            }
          }
          content
          contentHtml
          excerpt
          excerptHtml
          handle
          id
          image {
            altText
            id
            originalSrc
          }
          publishedAt
          seo {
            description
            title
          }
          tags
          title
          url
        }
      }
    }
  }
"#;

pub const BLOGS_QUERY: &str = r#"
  query GetBlogs($first: Int!, $after: String) {
    data: blogs(first: $first, after: $after) {
      pageInfo {
        hasNextPage
      }
      edges {
        cursor
        node {
          authors {
            email
          }
          handle
          id
          title
          url
        }
      }
    }
  }
"#;

pub const COLLECTIONS_QUERY: &str = r#"
  query GetCollections($first: Int!, $after: String) {
    data: collections(first: $first, after: $after) {
      pageInfo {
        hasNextPage
      }
      edges {
        cursor
        node {
          description
          descriptionHtml
          handle
          id
          image {
            altText
            id
            originalSrc
          }
          title
          updatedAt
        }
      }
    }
  }
"#;

pub const PRODUCTS_QUERY: &str = r#"
  query GetProducts($first: Int!, $after: String) {
    data: products(first: $first, after: $after) {
      pageInfo {
        hasNextPage
      }
      edges {
        cursor
        node {
          collections(first: $first) {
            edges {
              node {
                id
              }
            }
          }
          images(first: 250) {
            edges {
              node {
                id
                altText
                originalSrc
              }
            }
          }
          variants(first: 250) {
            edges {
              node {
                availableForSale
                compareAtPrice: compareAtPriceV2 {
                  amount
                  currencyCode
                }
                id
                image {
                  altText
                  id
                  originalSrc
                }
                price: priceV2 {
                  amount
                  currencyCode
                }
                selectedOptions {
                  name
                  value
                }
                sku
                title
                weight
                weightUnit
              }
            }
          }
          availableForSale
          createdAt
          description
          descriptionHtml
          handle
          id
          onlineStoreUrl
          options {
            id
            name
            values
          }
          priceRange {
            minVariantPrice {
              amount
              currencyCode
            }
            maxVariantPrice {
              amount
              currencyCode
            }
          }
          productType
          publishedAt
          tags
          title
          updatedAt
          vendor
          metafields(first: 250) {
            edges {
              node {
                key
                value
              }
            }
          }
        }
      }
    }
  }
"#;

pub const PRODUCT_TYPES_QUERY: &str = r#"
  query GetProductTypes($first: Int!) {
    data: productTypes(first: $first) {
      pageInfo {
        hasNextPage
      }
      edges {
        node
      }
    }
  }
"#;

pub const PAGES_QUERY: &str = r#"
  query GetPages($first: Int!, $after: String) {
    data: pages(first: $first, after: $after) {
      pageInfo {
        hasNextPage
      }
      edges {
        cursor
        node {
          id
          title
          handle
          body
          bodySummary
        }
      }
    }
  }
"#;
