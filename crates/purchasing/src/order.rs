use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use wms_core::{CustomerId, DomainError, DomainResult, Entity, OrderNumber, ProductCode, ValueObject};

/// Request line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderItemRequest {
    pub product_code: ProductCode,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Request: place a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderRequest {
    pub order_id: OrderNumber,
    pub processing_date: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub items: Vec<PurchaseOrderItemRequest>,
}

/// Stored purchase order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub line_no: u32,
    pub product_code: ProductCode,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl ValueObject for LineItem {}

/// Purchase order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    order_id: OrderNumber,
    processing_date: DateTime<Utc>,
    customer_id: CustomerId,
    lines: Vec<LineItem>,
    created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// Build a record from a request, numbering lines in request order.
    ///
    /// Orders must carry at least one line and every quantity must be positive.
    pub fn place(request: PurchaseOrderRequest, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if request.items.is_empty() {
            return Err(DomainError::validation(
                "purchase order must contain at least one item",
            ));
        }

        let mut lines = Vec::with_capacity(request.items.len());
        for (idx, item) in request.items.into_iter().enumerate() {
            if item.quantity <= 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            lines.push(LineItem {
                line_no: idx as u32 + 1,
                product_code: item.product_code,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        Ok(Self {
            order_id: request.order_id,
            processing_date: request.processing_date,
            customer_id: request.customer_id,
            lines,
            created_at,
        })
    }

    pub fn order_id(&self) -> &OrderNumber {
        &self.order_id
    }

    pub fn processing_date(&self) -> DateTime<Utc> {
        self.processing_date
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for PurchaseOrder {
    type Id = OrderNumber;

    fn id(&self) -> &Self::Id {
        &self.order_id
    }

    fn entity_name() -> &'static str {
        "PurchaseOrder"
    }
}
