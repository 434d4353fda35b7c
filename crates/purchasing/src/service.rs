//! Purchase order service contract and its in-memory implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use wms_core::{DomainError, DomainResult, Entity, OrderNumber};

use crate::order::{PurchaseOrder, PurchaseOrderRequest};

/// Purchase order registration.
#[async_trait]
pub trait PurchaseOrderService: Send + Sync {
    async fn create(&self, request: PurchaseOrderRequest) -> DomainResult<PurchaseOrder>;
}

/// In-memory purchase order store for tests/dev. Order ids are unique.
#[derive(Debug, Default)]
pub struct InMemoryPurchaseOrderService {
    inner: RwLock<BTreeMap<OrderNumber, PurchaseOrder>>,
}

impl InMemoryPurchaseOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<PurchaseOrder> {
        match self.inner.read() {
            Ok(m) => m.values().cloned().collect(),
            Err(_) => vec![],
        }
    }
}

#[async_trait]
impl PurchaseOrderService for InMemoryPurchaseOrderService {
    async fn create(&self, request: PurchaseOrderRequest) -> DomainResult<PurchaseOrder> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::unavailable("purchase order store lock poisoned"))?;

        if map.contains_key(&request.order_id) {
            return Err(DomainError::conflict(format!(
                "{} {} already exists",
                PurchaseOrder::entity_name(),
                request.order_id
            )));
        }

        let order = PurchaseOrder::place(request, Utc::now())?;
        map.insert(order.order_id().clone(), order.clone());
        tracing::debug!(order_id = %order.order_id(), lines = order.lines().len(), "purchase order created");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::PurchaseOrderItemRequest;
    use rust_decimal::Decimal;
    use wms_core::{CustomerId, ProductCode};

    fn request(order_id: &str) -> PurchaseOrderRequest {
        PurchaseOrderRequest {
            order_id: OrderNumber::new(order_id).unwrap(),
            processing_date: Utc::now(),
            customer_id: CustomerId::new(1),
            items: vec![PurchaseOrderItemRequest {
                product_code: ProductCode::new("P001").unwrap(),
                quantity: 2,
                unit_price: Decimal::ZERO,
            }],
        }
    }

    #[tokio::test]
    async fn orders_are_stored_by_order_id() {
        let service = InMemoryPurchaseOrderService::new();
        service.create(request("PO-1")).await.unwrap();

        let stored = service.list();
        assert_eq!(stored.len(), 1);
        let stored = &stored[0];
        assert_eq!(stored.order_id().as_str(), "PO-1");
        assert_eq!(stored.lines().len(), 1);
        assert_eq!(stored.lines()[0].quantity, 2);
    }

    #[tokio::test]
    async fn duplicate_order_id_is_a_conflict() {
        let service = InMemoryPurchaseOrderService::new();
        service.create(request("PO-1")).await.unwrap();

        let err = service.create(request("PO-1")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(service.list().len(), 1);
    }
}
