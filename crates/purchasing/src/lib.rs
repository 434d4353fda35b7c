//! Purchasing domain module (Purchase Orders).
//!
//! Purchase order records, the request used to place one, and the service
//! contract the ingestion pipeline submits through.

pub mod order;
pub mod service;

pub use order::{LineItem, PurchaseOrder, PurchaseOrderItemRequest, PurchaseOrderRequest};
pub use service::{InMemoryPurchaseOrderService, PurchaseOrderService};
