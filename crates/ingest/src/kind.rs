use serde::Serialize;

/// Classification of an inbound file by its root tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DocumentKind {
    Customer,
    Product,
    PurchaseOrder,
    SalesOrder,
}

/// Root tag → kind. Anything not listed here is an unknown document type.
const ROOT_TAGS: [(&str, DocumentKind); 4] = [
    ("Customer", DocumentKind::Customer),
    ("Product", DocumentKind::Product),
    ("PurchaseOrder", DocumentKind::PurchaseOrder),
    ("SalesOrder", DocumentKind::SalesOrder),
];

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Customer,
        DocumentKind::Product,
        DocumentKind::PurchaseOrder,
        DocumentKind::SalesOrder,
    ];

    /// Exact, case-sensitive lookup of a root tag.
    pub fn from_root_tag(tag: &str) -> Option<Self> {
        ROOT_TAGS
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, kind)| *kind)
    }

    /// Root tag of documents of this kind.
    pub fn root_tag(&self) -> &'static str {
        match self {
            DocumentKind::Customer => "Customer",
            DocumentKind::Product => "Product",
            DocumentKind::PurchaseOrder => "PurchaseOrder",
            DocumentKind::SalesOrder => "SalesOrder",
        }
    }

    pub fn is_order(&self) -> bool {
        matches!(self, DocumentKind::PurchaseOrder | DocumentKind::SalesOrder)
    }
}

impl core::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.root_tag())
    }
}
