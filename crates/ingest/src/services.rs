//! Domain service wiring for processing units.
//!
//! Each unit asks the [`ServiceProvider`] for a fresh [`ServiceScope`] and
//! drops it when the file has been placed.

use std::sync::Arc;

use serde::Serialize;

use wms_core::Entity;

use wms_parties::{CustomerService, InMemoryCustomerService};
use wms_products::{InMemoryProductService, ProductService};
use wms_purchasing::{InMemoryPurchaseOrderService, PurchaseOrderService};
use wms_sales::{InMemorySalesOrderService, SalesOrderService};

use crate::convert::ConvertedRequest;
use crate::error::IngestResult;
use crate::kind::DocumentKind;
use crate::resolve::ReferenceResolver;

/// Services available to one processing unit.
#[derive(Clone)]
pub struct ServiceScope {
    pub customers: Arc<dyn CustomerService>,
    pub products: Arc<dyn ProductService>,
    pub purchase_orders: Arc<dyn PurchaseOrderService>,
    pub sales_orders: Arc<dyn SalesOrderService>,
}

impl core::fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceScope").finish_non_exhaustive()
    }
}

/// What a successful submission created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub kind: DocumentKind,
    /// Business key of the created record (customer id, product code, order id).
    pub key: String,
}

impl ServiceScope {
    pub fn resolver(&self) -> ReferenceResolver<'_> {
        ReferenceResolver::new(self.customers.as_ref(), self.products.as_ref())
    }

    /// Hand a resolved request to the service for its kind.
    ///
    /// Any service error is reported as transient.
    pub async fn submit(&self, request: ConvertedRequest) -> IngestResult<Submission> {
        let kind = request.kind();
        let key = match request {
            ConvertedRequest::Customer(r) => self.customers.create(r).await?.id().to_string(),
            ConvertedRequest::Product(r) => self.products.create(r).await?.id().to_string(),
            ConvertedRequest::PurchaseOrder(r) => {
                self.purchase_orders.create(r).await?.id().to_string()
            }
            ConvertedRequest::SalesOrder(r) => self.sales_orders.create(r).await?.id().to_string(),
        };
        Ok(Submission { kind, key })
    }
}

/// Source of service scopes.
pub trait ServiceProvider: Send + Sync {
    fn scope(&self) -> ServiceScope;
}

/// Provider backed by in-memory services shared across all scopes.
#[derive(Debug, Default, Clone)]
pub struct InMemoryServiceProvider {
    customers: Arc<InMemoryCustomerService>,
    products: Arc<InMemoryProductService>,
    purchase_orders: Arc<InMemoryPurchaseOrderService>,
    sales_orders: Arc<InMemorySalesOrderService>,
}

impl InMemoryServiceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customers(&self) -> &Arc<InMemoryCustomerService> {
        &self.customers
    }

    pub fn products(&self) -> &Arc<InMemoryProductService> {
        &self.products
    }

    pub fn purchase_orders(&self) -> &Arc<InMemoryPurchaseOrderService> {
        &self.purchase_orders
    }

    pub fn sales_orders(&self) -> &Arc<InMemorySalesOrderService> {
        &self.sales_orders
    }
}

impl ServiceProvider for InMemoryServiceProvider {
    fn scope(&self) -> ServiceScope {
        ServiceScope {
            customers: self.customers.clone(),
            products: self.products.clone(),
            purchase_orders: self.purchase_orders.clone(),
            sales_orders: self.sales_orders.clone(),
        }
    }
}
