use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use wms_core::{Entity, ProductCode, ValueObject};

/// Physical dimensions and weight of a product.
///
/// Units are whatever the sending system uses; the values are stored as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub weight: Decimal,
}

impl ValueObject for Dimensions {}

/// Request: register a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRequest {
    pub product_code: ProductCode,
    pub title: String,
    pub description: Option<String>,
    pub dimensions: Dimensions,
}

/// Product record as held by the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    code: ProductCode,
    title: String,
    description: Option<String>,
    dimensions: Dimensions,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl Product {
    pub fn from_request(request: ProductRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            code: request.product_code,
            title: request.title,
            description: request.description,
            dimensions: request.dimensions,
            is_active: true,
            created_at,
        }
    }

    pub fn code(&self) -> &ProductCode {
        &self.code
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Product {
    type Id = ProductCode;

    fn id(&self) -> &Self::Id {
        &self.code
    }

    fn entity_name() -> &'static str {
        "Product"
    }
}
