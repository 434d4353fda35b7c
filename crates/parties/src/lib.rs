//! Parties domain module (customers).
//!
//! Customer records, the request used to register one, and the service
//! contract the ingestion pipeline submits through.

pub mod customer;
pub mod service;

pub use customer::{Customer, CustomerRequest};
pub use service::{CustomerService, InMemoryCustomerService};
