use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wms_core::{CustomerId, Entity};

/// Request: register a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRequest {
    pub customer_identifier: String,
    pub name: String,
    pub address: String,
}

/// Customer record as held by the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    customer_identifier: String,
    name: String,
    address: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl Customer {
    pub fn from_request(id: CustomerId, request: CustomerRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_identifier: request.customer_identifier,
            name: request.name,
            address: request.address,
            is_active: true,
            created_at,
        }
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn customer_identifier(&self) -> &str {
        &self.customer_identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_name() -> &'static str {
        "Customer"
    }
}
