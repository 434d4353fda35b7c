//! Document model converters: parsed tree → typed service request.
//!
//! Converters are pure. They expect validated input but still fail cleanly
//! (never panic or default a required field) when handed an unvalidated tree:
//! a missing required element is a validation failure, an unparseable value is
//! malformed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use wms_core::{CustomerId, OrderNumber, ProductCode};
use wms_parties::CustomerRequest;
use wms_products::{Dimensions, ProductRequest};
use wms_purchasing::{PurchaseOrderItemRequest, PurchaseOrderRequest};
use wms_sales::{SalesOrderItemRequest, SalesOrderRequest};

use crate::document::{ParsedDocument, XmlElement};
use crate::error::{IngestError, IngestResult};
use crate::kind::DocumentKind;
use crate::values;

/// Typed request built from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertedRequest {
    Customer(CustomerRequest),
    Product(ProductRequest),
    PurchaseOrder(PurchaseOrderRequest),
    SalesOrder(SalesOrderRequest),
}

impl ConvertedRequest {
    pub fn kind(&self) -> DocumentKind {
        match self {
            ConvertedRequest::Customer(_) => DocumentKind::Customer,
            ConvertedRequest::Product(_) => DocumentKind::Product,
            ConvertedRequest::PurchaseOrder(_) => DocumentKind::PurchaseOrder,
            ConvertedRequest::SalesOrder(_) => DocumentKind::SalesOrder,
        }
    }
}

/// Line as read from an `Items/Item` element.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemLine {
    product_code: ProductCode,
    quantity: i32,
}

/// Header fields shared by purchase and sales orders.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderHeader {
    order_id: OrderNumber,
    processing_date: DateTime<Utc>,
    customer_id: CustomerId,
    items: Vec<ItemLine>,
}

/// Convert a document of `kind`. `processed_at` is used when an order carries
/// no `ProcessingDate`.
pub fn convert(
    document: &ParsedDocument,
    kind: DocumentKind,
    processed_at: DateTime<Utc>,
) -> IngestResult<ConvertedRequest> {
    let root = document.root();
    match kind {
        DocumentKind::Customer => convert_customer(root).map(ConvertedRequest::Customer),
        DocumentKind::Product => convert_product(root).map(ConvertedRequest::Product),
        DocumentKind::PurchaseOrder => {
            convert_purchase_order(root, processed_at).map(ConvertedRequest::PurchaseOrder)
        }
        DocumentKind::SalesOrder => {
            convert_sales_order(root, processed_at).map(ConvertedRequest::SalesOrder)
        }
    }
}

pub fn convert_customer(root: &XmlElement) -> IngestResult<CustomerRequest> {
    Ok(CustomerRequest {
        customer_identifier: required_text(root, "CustomerIdentifier")?.to_string(),
        name: required_text(root, "Name")?.to_string(),
        address: required_text(root, "Address")?.to_string(),
    })
}

pub fn convert_product(root: &XmlElement) -> IngestResult<ProductRequest> {
    let product_code = ProductCode::new(required_text(root, "Code")?)
        .map_err(|e| IngestError::validation("Code", e.to_string()))?;

    let description = root
        .child_text("Description")
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(ProductRequest {
        product_code,
        title: required_text(root, "Title")?.to_string(),
        description,
        dimensions: Dimensions {
            length: dimension(root, "Length")?,
            width: dimension(root, "Width")?,
            height: dimension(root, "Height")?,
            weight: dimension(root, "Weight")?,
        },
    })
}

pub fn convert_purchase_order(
    root: &XmlElement,
    processed_at: DateTime<Utc>,
) -> IngestResult<PurchaseOrderRequest> {
    let header = order_header(root, processed_at)?;
    Ok(PurchaseOrderRequest {
        order_id: header.order_id,
        processing_date: header.processing_date,
        customer_id: header.customer_id,
        items: header
            .items
            .into_iter()
            .map(|line| PurchaseOrderItemRequest {
                product_code: line.product_code,
                quantity: line.quantity,
                unit_price: Decimal::ZERO,
            })
            .collect(),
    })
}

pub fn convert_sales_order(
    root: &XmlElement,
    processed_at: DateTime<Utc>,
) -> IngestResult<SalesOrderRequest> {
    let shipment_address = required_text(root, "ShipmentAddress")?.to_string();
    let header = order_header(root, processed_at)?;
    Ok(SalesOrderRequest {
        order_id: header.order_id,
        processing_date: header.processing_date,
        customer_id: header.customer_id,
        shipment_address,
        items: header
            .items
            .into_iter()
            .map(|line| SalesOrderItemRequest {
                product_code: line.product_code,
                quantity: line.quantity,
                unit_price: Decimal::ZERO,
            })
            .collect(),
    })
}

fn order_header(root: &XmlElement, processed_at: DateTime<Utc>) -> IngestResult<OrderHeader> {
    let order_id = OrderNumber::new(required_text(root, "OrderId")?)
        .map_err(|e| IngestError::validation("OrderId", e.to_string()))?;

    let processing_date = match root.child_text("ProcessingDate") {
        Some(text) => values::parse_date(text).map_err(IngestError::Malformed)?,
        None => processed_at,
    };

    let customer_id = CustomerId::new(
        values::parse_integer(required_text(root, "CustomerId")?).map_err(IngestError::Malformed)?,
    );

    let container = root
        .child("Items")
        .ok_or_else(|| IngestError::validation("Items", "is required"))?;

    let items = container
        .children_named("Item")
        .map(item_line)
        .collect::<IngestResult<Vec<_>>>()?;

    if items.is_empty() {
        return Err(IngestError::validation(
            "Items",
            "must contain at least 1 `Item` element(s), found 0",
        ));
    }

    Ok(OrderHeader {
        order_id,
        processing_date,
        customer_id,
        items,
    })
}

fn item_line(item: &XmlElement) -> IngestResult<ItemLine> {
    let product_code = ProductCode::new(required_text(item, "ProductCode")?)
        .map_err(|e| IngestError::validation("Item/ProductCode", e.to_string()))?;
    let quantity =
        values::parse_integer(required_text(item, "Quantity")?).map_err(IngestError::Malformed)?;
    Ok(ItemLine {
        product_code,
        quantity,
    })
}

fn required_text<'a>(parent: &'a XmlElement, name: &str) -> IngestResult<&'a str> {
    match parent.child_text(name) {
        Some(text) if !text.is_empty() => Ok(text),
        Some(_) => Err(IngestError::validation(name, "must not be empty")),
        None => Err(IngestError::validation(name, "is required")),
    }
}

/// Dimensional fields default to zero only when the element is absent.
fn dimension(root: &XmlElement, name: &str) -> IngestResult<Decimal> {
    match root.child_text(name) {
        None => Ok(Decimal::ZERO),
        Some(text) => values::parse_decimal(text).map_err(IngestError::Malformed),
    }
}
