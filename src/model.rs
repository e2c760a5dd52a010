//! Core domain types for the storefront: catalog, cart, contact details and order rows.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::Taka;
use crate::order_number::OrderNumber;
use crate::pricing::PriceBreakdown;

/// Catalog variant identifier (`"500g"`).
pub type VariantId = String;

/// Row identifier issued by the record store.
pub type RecordId = u64;

/// A purchasable size of the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductVariant {
    pub id: VariantId,
    /// Display name handed to the confirmation page.
    pub name: String,
    /// Short package label (`"500g Jar"`).
    pub label: String,
    pub unit_price: Taka,
}

impl ProductVariant {
    pub fn new(
        id: impl Into<VariantId>,
        name: impl Into<String>,
        label: impl Into<String>,
        unit_price: Taka,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            label: label.into(),
            unit_price,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no variants")]
    Empty,
    #[error("duplicate variant id '{0}'")]
    DuplicateId(VariantId),
    #[error("variant '{0}' has unit price {1} outside 1..={max}", max = MAX_UNIT_PRICE.value())]
    InvalidPrice(VariantId, Taka),
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),
}

/// Largest accepted unit price. Keeps `price * Quantity::MAX * 100` inside `i64`, so
/// pricing never overflows.
pub const MAX_UNIT_PRICE: Taka = Taka::new(i64::MAX / (Quantity::MAX as i64 * 100));

/// The ordered, immutable set of variants offered by the storefront.
#[derive(Debug, Clone)]
pub struct Catalog {
    variants: Vec<ProductVariant>,
    default_index: usize,
}

impl Catalog {
    /// Build a catalog, the first variant being the default selection.
    pub fn new(variants: Vec<ProductVariant>) -> Result<Self, CatalogError> {
        if variants.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(variants.len());
        for variant in &variants {
            if !seen.insert(variant.id.as_str()) {
                return Err(CatalogError::DuplicateId(variant.id.clone()));
            }
            if variant.unit_price <= Taka::ZERO || variant.unit_price > MAX_UNIT_PRICE {
                return Err(CatalogError::InvalidPrice(
                    variant.id.clone(),
                    variant.unit_price,
                ));
            }
        }

        Ok(Self {
            variants,
            default_index: 0,
        })
    }

    /// The three jars sold on the landing page, 500g preselected.
    pub fn standard() -> Self {
        Self {
            variants: vec![
                ProductVariant::new(
                    "250g",
                    "Organic Beetroot Powder 250g",
                    "250g Jar",
                    Taka::new(850),
                ),
                ProductVariant::new(
                    "500g",
                    "Organic Beetroot Powder 500g",
                    "500g Jar",
                    Taka::new(1450),
                ),
                ProductVariant::new(
                    "1kg",
                    "Organic Beetroot Powder 1kg",
                    "1kg Jar",
                    Taka::new(2650),
                ),
            ],
            default_index: 1,
        }
    }

    /// Change which variant a fresh checkout starts on.
    pub fn with_default(mut self, id: &str) -> Result<Self, CatalogError> {
        self.default_index = self
            .variants
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| CatalogError::UnknownVariant(id.to_string()))?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn default_variant(&self) -> &ProductVariant {
        &self.variants[self.default_index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductVariant> + '_ {
        self.variants.iter()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Number of jars in the cart, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u8);

impl Quantity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(Quantity(value))
    }

    pub const fn one() -> Self {
        Quantity(Self::MIN)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Whether the "+" control is enabled.
    pub fn can_increment(self) -> bool {
        self.0 < Self::MAX
    }

    /// Whether the "-" control is enabled.
    pub fn can_decrement(self) -> bool {
        self.0 > Self::MIN
    }

    /// Returns `false` when already at the upper bound.
    pub fn increment(&mut self) -> bool {
        if !self.can_increment() {
            return false;
        }
        self.0 += 1;
        true
    }

    /// Returns `false` when already at the lower bound.
    pub fn decrement(&mut self) -> bool {
        if !self.can_decrement() {
            return false;
        }
        self.0 -= 1;
        true
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::one()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The chosen variant and how many of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSelection {
    variant: ProductVariant,
    quantity: Quantity,
}

impl CartSelection {
    pub fn new(variant: ProductVariant) -> Self {
        Self {
            variant,
            quantity: Quantity::one(),
        }
    }

    pub fn variant(&self) -> &ProductVariant {
        &self.variant
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn quantity_mut(&mut self) -> &mut Quantity {
        &mut self.quantity
    }

    /// Switch variant; quantity goes back to one.
    pub fn select_variant(&mut self, variant: ProductVariant) {
        self.variant = variant;
        self.quantity = Quantity::one();
    }

    pub fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
    }

    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown::compute(self.variant.unit_price, self.quantity)
    }
}

/// Checkout form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Phone,
    Email,
    Address,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Phone, Field::Email, Field::Address];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::Address => "address",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw customer-entered text, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl ContactInfo {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Phone => &self.phone,
            Field::Email => &self.email,
            Field::Address => &self.address,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Phone => &mut self.phone,
            Field::Email => &mut self.email,
            Field::Address => &mut self.address,
        };
        *slot = value.into();
    }
}

/// Lifecycle of a stored order in the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

pub const PAYMENT_CASH_ON_DELIVERY: &str = "cod";

/// What the checkout hands to the record store once validation has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub contact: ContactInfo,
    pub variant: ProductVariant,
    pub quantity: Quantity,
    pub breakdown: PriceBreakdown,
    pub placed_at: DateTime<Utc>,
}

impl OrderDraft {
    pub fn placed_on(&self) -> NaiveDate {
        self.placed_at.date_naive()
    }
}

/// An order as stored and shown in the back-office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: RecordId,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub customer_address: String,
    pub product_name: String,
    pub variation: String,
    pub quantity: u8,
    pub unit_price: Taka,
    pub subtotal: Taka,
    pub discount: Taka,
    pub discount_pct: u8,
    pub total: Taka,
    pub status: OrderStatus,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Materialize a draft once the store has assigned its identity.
    pub fn from_draft(id: RecordId, order_number: OrderNumber, draft: OrderDraft) -> Self {
        let OrderDraft {
            contact,
            variant,
            quantity,
            breakdown,
            placed_at,
        } = draft;

        Self {
            id,
            order_number,
            customer_name: contact.name.trim().to_string(),
            customer_phone: contact.phone.split_whitespace().collect(),
            customer_email: contact.email.trim().to_string(),
            customer_address: contact.address.trim().to_string(),
            product_name: variant.name,
            variation: variant.label,
            quantity: quantity.get(),
            unit_price: variant.unit_price,
            subtotal: breakdown.subtotal,
            discount: breakdown.discount_amount,
            discount_pct: breakdown.discount_percent,
            total: breakdown.total,
            status: OrderStatus::Pending,
            payment_method: PAYMENT_CASH_ON_DELIVERY.to_string(),
            notes: None,
            created_at: placed_at,
        }
    }
}

/// Catalog entry as managed from the back-office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub variation: String,
    pub price: Taka,
    pub original_price: Option<Taka>,
    pub stock: u32,
    pub is_active: bool,
    pub badge: Option<String>,
    pub description: Option<String>,
}

impl Product {
    /// Savings against the struck-through price, if any.
    pub fn savings(&self) -> Option<Taka> {
        self.original_price
            .filter(|original| *original > self.price)
            .map(|original| original - self.price)
    }

    pub fn to_variant(&self) -> ProductVariant {
        ProductVariant::new(
            self.variation.clone(),
            format!("{} {}", self.name, self.variation),
            self.variation.clone(),
            self.price,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Testimonial {
    pub id: RecordId,
    pub name: String,
    pub location: String,
    /// 1..=5 stars.
    pub rating: u8,
    pub review: String,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferDiscount {
    Percentage(u8),
    Fixed(Taka),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub discount: OfferDiscount,
    pub min_quantity: u8,
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// Active flag set and `today` inside the (inclusive, open-ended) window.
    pub fn is_running(&self, today: NaiveDate) -> bool {
        self.is_active
            && self.start_date.is_none_or(|start| start <= today)
            && self.end_date.is_none_or(|end| today <= end)
    }
}

/// Contact details captured from a checkout that never reached submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UncompletedOrder {
    pub id: RecordId,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub product_name: Option<String>,
    pub variation: Option<String>,
    pub quantity: Option<u8>,
    pub total: Option<Taka>,
    pub converted: bool,
}
