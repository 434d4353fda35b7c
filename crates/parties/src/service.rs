//! Customer service contract and its in-memory implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use wms_core::{CustomerId, DomainError, DomainResult, Entity};

use crate::customer::{Customer, CustomerRequest};

/// Customer lookups and registration.
#[async_trait]
pub trait CustomerService: Send + Sync {
    /// Look up a customer by store id; `Ok(None)` when no such record exists.
    async fn get_by_id(&self, id: CustomerId) -> DomainResult<Option<Customer>>;

    /// Register a new customer.
    async fn create(&self, request: CustomerRequest) -> DomainResult<Customer>;
}

#[derive(Debug, Default)]
struct CustomerTable {
    next_id: i32,
    rows: BTreeMap<CustomerId, Customer>,
}

/// In-memory customer store for tests/dev.
///
/// Ids are assigned sequentially starting at 1; customer identifiers are unique.
#[derive(Debug, Default)]
pub struct InMemoryCustomerService {
    inner: RwLock<CustomerTable>,
}

impl InMemoryCustomerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored customers.
    pub fn len(&self) -> usize {
        self.inner.read().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, request: CustomerRequest) -> DomainResult<Customer> {
        let mut table = self
            .inner
            .write()
            .map_err(|_| DomainError::unavailable("customer store lock poisoned"))?;

        if table
            .rows
            .values()
            .any(|c| c.customer_identifier() == request.customer_identifier)
        {
            return Err(DomainError::conflict(format!(
                "{} {} already exists",
                Customer::entity_name(),
                request.customer_identifier
            )));
        }

        table.next_id += 1;
        let id = CustomerId::new(table.next_id);
        let customer = Customer::from_request(id, request, Utc::now());
        table.rows.insert(id, customer.clone());
        Ok(customer)
    }
}

#[async_trait]
impl CustomerService for InMemoryCustomerService {
    async fn get_by_id(&self, id: CustomerId) -> DomainResult<Option<Customer>> {
        let table = self
            .inner
            .read()
            .map_err(|_| DomainError::unavailable("customer store lock poisoned"))?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn create(&self, request: CustomerRequest) -> DomainResult<Customer> {
        let customer = self.insert(request)?;
        tracing::debug!(customer_id = %customer.id_typed(), "customer created");
        Ok(customer)
    }
}
