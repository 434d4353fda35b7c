//! Product service contract and its in-memory implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use wms_core::{DomainError, DomainResult, Entity, ProductCode};

use crate::product::{Product, ProductRequest};

/// Product lookups and registration.
#[async_trait]
pub trait ProductService: Send + Sync {
    /// Look up a product by code; `Ok(None)` when no such record exists.
    async fn get_by_code(&self, code: &ProductCode) -> DomainResult<Option<Product>>;

    /// Register a new product.
    async fn create(&self, request: ProductRequest) -> DomainResult<Product>;
}

/// In-memory product store for tests/dev. Product codes are unique.
#[derive(Debug, Default)]
pub struct InMemoryProductService {
    inner: RwLock<BTreeMap<ProductCode, Product>>,
}

impl InMemoryProductService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProductService for InMemoryProductService {
    async fn get_by_code(&self, code: &ProductCode) -> DomainResult<Option<Product>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::unavailable("product store lock poisoned"))?;
        Ok(map.get(code).cloned())
    }

    async fn create(&self, request: ProductRequest) -> DomainResult<Product> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::unavailable("product store lock poisoned"))?;

        if map.contains_key(&request.product_code) {
            return Err(DomainError::conflict(format!(
                "{} {} already exists",
                Product::entity_name(),
                request.product_code
            )));
        }

        let product = Product::from_request(request, Utc::now());
        map.insert(product.code().clone(), product.clone());
        tracing::debug!(product_code = %product.code(), "product created");
        Ok(product)
    }
}
