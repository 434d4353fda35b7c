//! Products domain module.
//!
//! Product master data keyed by product code, plus the service contract used
//! for lookups and registration.

pub mod product;
pub mod service;

pub use product::{Dimensions, Product, ProductRequest};
pub use service::{InMemoryProductService, ProductService};
