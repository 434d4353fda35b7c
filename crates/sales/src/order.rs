use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use wms_core::{CustomerId, DomainError, DomainResult, Entity, OrderNumber, ProductCode, ValueObject};

/// Request line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderItemRequest {
    pub product_code: ProductCode,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Request: place a sales order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderRequest {
    pub order_id: OrderNumber,
    pub processing_date: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub shipment_address: String,
    pub items: Vec<SalesOrderItemRequest>,
}

/// Order line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_code: ProductCode,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl ValueObject for OrderLine {}

/// Sales order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrder {
    order_id: OrderNumber,
    processing_date: DateTime<Utc>,
    customer_id: CustomerId,
    shipment_address: String,
    lines: Vec<OrderLine>,
    created_at: DateTime<Utc>,
}

impl SalesOrder {
    /// Build a record from a request, numbering lines in request order.
    pub fn place(request: SalesOrderRequest, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if request.items.is_empty() {
            return Err(DomainError::validation(
                "sales order must contain at least one item",
            ));
        }

        if request.shipment_address.trim().is_empty() {
            return Err(DomainError::validation("shipment address is required"));
        }

        let mut lines = Vec::with_capacity(request.items.len());
        for item in request.items {
            if item.quantity <= 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            let next_line_no = (lines.len() as u32) + 1;
            lines.push(OrderLine {
                line_no: next_line_no,
                product_code: item.product_code,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        Ok(Self {
            order_id: request.order_id,
            processing_date: request.processing_date,
            customer_id: request.customer_id,
            shipment_address: request.shipment_address,
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

    pub fn shipment_address(&self) -> &str {
        &self.shipment_address
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for SalesOrder {
    type Id = OrderNumber;

    fn id(&self) -> &Self::Id {
        &self.order_id
    }

    fn entity_name() -> &'static str {
        "SalesOrder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(address: &str, items: Vec<(&str, i32)>) -> SalesOrderRequest {
        SalesOrderRequest {
            order_id: OrderNumber::new("SO-1").unwrap(),
            processing_date: Utc::now(),
            customer_id: CustomerId::new(1),
            shipment_address: address.to_string(),
            items: items
                .into_iter()
                .map(|(code, quantity)| SalesOrderItemRequest {
                    product_code: ProductCode::new(code).unwrap(),
                    quantity,
                    unit_price: Decimal::ZERO,
                })
                .collect(),
        }
    }

    #[test]
    fn place_numbers_lines_in_order() {
        let order = SalesOrder::place(request("Dock 4", vec![("P001", 3), ("P002", 1)]), Utc::now()).unwrap();

        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.lines()[0].line_no, 1);
        assert_eq!(order.lines()[0].quantity, 3);
        assert_eq!(order.lines()[1].product_code.as_str(), "P002");
        assert_eq!(order.shipment_address(), "Dock 4");
    }

    #[test]
    fn orders_without_lines_are_rejected() {
        let err = SalesOrder::place(request("Dock 4", vec![]), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_shipment_address_is_rejected() {
        let err = SalesOrder::place(request("  ", vec![("P001", 1)]), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("shipment address is required"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any non-positive quantity rejects the whole order.
            #[test]
            fn non_positive_quantity_rejects_order(bad in i32::MIN..=0, good in 1i32..1000) {
                let result = SalesOrder::place(
                    request("Dock 4", vec![("P001", good), ("P002", bad)]),
                    Utc::now(),
                );
                prop_assert!(result.is_err());
            }
        }
    }
}
