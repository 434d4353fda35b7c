//! Sales Orders domain module.
//!
//! Sales order records, the request used to place one, and the service
//! contract the ingestion pipeline submits through.

pub mod order;
pub mod service;

pub use order::{OrderLine, SalesOrder, SalesOrderItemRequest, SalesOrderRequest};
pub use service::{InMemorySalesOrderService, SalesOrderService};
