//! Sales order service contract and its in-memory implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use wms_core::{DomainError, DomainResult, Entity, OrderNumber};

use crate::order::{SalesOrder, SalesOrderRequest};

/// Sales order registration.
#[async_trait]
pub trait SalesOrderService: Send + Sync {
    async fn create(&self, request: SalesOrderRequest) -> DomainResult<SalesOrder>;
}

/// In-memory sales order store for tests/dev. Order ids are unique.
#[derive(Debug, Default)]
pub struct InMemorySalesOrderService {
    inner: RwLock<BTreeMap<OrderNumber, SalesOrder>>,
}

impl InMemorySalesOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<SalesOrder> {
        match self.inner.read() {
            Ok(m) => m.values().cloned().collect(),
            Err(_) => vec![],
        }
    }
}

#[async_trait]
impl SalesOrderService for InMemorySalesOrderService {
    async fn create(&self, request: SalesOrderRequest) -> DomainResult<SalesOrder> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::unavailable("sales order store lock poisoned"))?;

        if map.contains_key(&request.order_id) {
            return Err(DomainError::conflict(format!(
                "{} {} already exists",
                SalesOrder::entity_name(),
                request.order_id
            )));
        }

        let order = SalesOrder::place(request, Utc::now())?;
        map.insert(order.order_id().clone(), order.clone());
        tracing::debug!(order_id = %order.order_id(), lines = order.lines().len(), "sales order created");
        Ok(order)
    }
}
