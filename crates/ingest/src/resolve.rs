//! Referential resolver: every customer id and product code an order refers to
//! must already exist before the order is submitted.

use wms_core::{CustomerId, ProductCode};
use wms_parties::CustomerService;
use wms_products::ProductService;

use crate::convert::ConvertedRequest;
use crate::error::{IngestError, IngestResult, MissingReference};

/// Checks references against the lookup services of one service scope.
pub struct ReferenceResolver<'a> {
    customers: &'a dyn CustomerService,
    products: &'a dyn ProductService,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(customers: &'a dyn CustomerService, products: &'a dyn ProductService) -> Self {
        Self { customers, products }
    }

    /// Customer first, then items in document order; stops at the first miss.
    pub async fn resolve(&self, request: &ConvertedRequest) -> IngestResult<()> {
        match request {
            ConvertedRequest::Customer(_) | ConvertedRequest::Product(_) => Ok(()),
            ConvertedRequest::PurchaseOrder(po) => {
                self.resolve_order(po.customer_id, po.items.iter().map(|i| &i.product_code))
                    .await
            }
            ConvertedRequest::SalesOrder(so) => {
                self.resolve_order(so.customer_id, so.items.iter().map(|i| &i.product_code))
                    .await
            }
        }
    }

    async fn resolve_order<'c>(
        &self,
        customer_id: CustomerId,
        product_codes: impl Iterator<Item = &'c ProductCode>,
    ) -> IngestResult<()> {
        self.ensure_customer(customer_id).await?;
        for code in product_codes {
            self.ensure_product(code).await?;
        }
        Ok(())
    }

    async fn ensure_customer(&self, id: CustomerId) -> IngestResult<()> {
        match self.customers.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(IngestError::ReferenceNotFound(MissingReference::Customer(id))),
        }
    }

    async fn ensure_product(&self, code: &ProductCode) -> IngestResult<()> {
        match self.products.get_by_code(code).await? {
            Some(_) => Ok(()),
            None => Err(IngestError::ReferenceNotFound(MissingReference::Product(
                code.clone(),
            ))),
        }
    }
}
