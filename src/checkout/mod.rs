//! Cash-on-delivery checkout.
//!
//! A [`Checkout`] owns one customer's form and cart selection and walks the
//! submit state machine:
//!
//! ```text
//! Idle -> Validating -> Invalid    -> (edit/dismiss) -> Idle
//!                    -> Submitting -> Submitted
//!                                  -> Idle (store failure, retryable)
//! ```
//!
//! Prices and errors are never cached: both are recomputed from the current
//! selection and form on every read.

use std::time::Duration;

use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{info, warn};

use crate::Taka;
use crate::config::{DEFAULT_SUBMIT_DELAY, MAX_SUBMIT_DELAY, MIN_SUBMIT_DELAY};
use crate::model::{
    CartSelection, Catalog, CatalogError, Field, OrderDraft, OrderRecord, Quantity,
    UncompletedOrder,
};
use crate::order_number::OrderNumber;
use crate::pricing::PriceBreakdown;
use crate::store::{OrderSink, StoreError};
use crate::validate::FieldErrors;

mod state;
pub use state::FormState;

mod error;
pub use error::CheckoutError;

/// Where the checkout is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Invalid,
    Submitting,
    Submitted,
}

/// Form-level message shown above the submit button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    /// Submit was attempted with `errors` invalid fields.
    Incomplete { errors: usize },
    /// The store refused the order; submitting again may work.
    SubmissionFailed { reason: String },
}

/// Payload handed to the confirmation page, exactly once per placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub order_number: OrderNumber,
    pub product_name: String,
    pub quantity: u8,
    pub total: Taka,
}

impl Confirmation {
    pub fn from_record(record: &OrderRecord) -> Self {
        Self {
            order_number: record.order_number.clone(),
            product_name: record.product_name.clone(),
            quantity: record.quantity,
            total: record.total,
        }
    }

    /// Query string for a redirect to the thank-you page.
    pub fn to_query(&self) -> String {
        format!(
            "order={}&product={}&qty={}&total={}",
            encode_component(self.order_number.as_str()),
            encode_component(&self.product_name),
            self.quantity,
            self.total.value()
        )
    }
}

/// Unreserved characters (RFC 3986) stay literal, everything else is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

/// One customer's checkout session.
pub struct Checkout<'a, S> {
    catalog: &'a Catalog,
    sink: &'a S,
    cart: CartSelection,
    form: FormState,
    phase: Phase,
    banner: Option<Banner>,
    confirmation: Option<Confirmation>,
    submit_delay: Duration,
}

/// Public API
impl<'a, S: OrderSink> Checkout<'a, S> {
    pub fn new(catalog: &'a Catalog, sink: &'a S) -> Self {
        Self {
            catalog,
            sink,
            cart: CartSelection::new(catalog.default_variant().clone()),
            form: FormState::default(),
            phase: Phase::Idle,
            banner: None,
            confirmation: None,
            submit_delay: DEFAULT_SUBMIT_DELAY,
        }
    }

    /// Latency inserted before the order reaches the store, clamped to
    /// `MIN_SUBMIT_DELAY..=MAX_SUBMIT_DELAY`.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay.clamp(MIN_SUBMIT_DELAY, MAX_SUBMIT_DELAY);
        self
    }

    pub fn submit_delay(&self) -> Duration {
        self.submit_delay
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn cart(&self) -> &CartSelection {
        &self.cart
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// The confirmation of the order this session placed, if any.
    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    pub fn breakdown(&self) -> PriceBreakdown {
        self.cart.breakdown()
    }

    pub fn errors(&self) -> FieldErrors {
        self.form.errors()
    }

    pub fn visible_errors(&self) -> FieldErrors {
        self.form.visible_errors()
    }

    /// The submit control is disabled while an order is in flight or already placed.
    pub fn is_locked(&self) -> bool {
        matches!(self.phase, Phase::Submitting | Phase::Submitted)
    }

    /// Switch variant. Quantity resets to one. Returns `Ok(false)` if the form is locked.
    pub fn select_variant(&mut self, id: &str) -> Result<bool, CatalogError> {
        let variant = self
            .catalog
            .get(id)
            .ok_or_else(|| CatalogError::UnknownVariant(id.to_string()))?;
        if self.is_locked() {
            return Ok(false);
        }
        self.cart.select_variant(variant.clone());
        Ok(true)
    }

    pub fn increment(&mut self) -> bool {
        !self.is_locked() && self.cart.quantity_mut().increment()
    }

    pub fn decrement(&mut self) -> bool {
        !self.is_locked() && self.cart.quantity_mut().decrement()
    }

    /// Set quantity directly; out-of-range values are refused.
    pub fn set_quantity(&mut self, quantity: u8) -> bool {
        match Quantity::new(quantity) {
            Some(q) if !self.is_locked() => {
                self.cart.set_quantity(q);
                true
            }
            _ => false,
        }
    }

    /// Replace a field's text. Fixing the last error after a failed submit clears the banner.
    pub fn edit(&mut self, field: Field, value: impl Into<String>) -> bool {
        if self.is_locked() {
            return false;
        }
        self.form.edit(field, value);

        if self.phase == Phase::Invalid && self.form.errors().is_valid() {
            self.phase = Phase::Idle;
            self.banner = None;
        }
        true
    }

    /// The customer left `field`; its error, if any, becomes visible.
    pub fn blur(&mut self, field: Field) -> bool {
        if self.is_locked() {
            return false;
        }
        self.form.touch(field);
        true
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
        if self.phase == Phase::Invalid {
            self.phase = Phase::Idle;
        }
    }

    /// Validate everything and, if clean, lock the form and produce the draft to place.
    ///
    /// All fields are marked touched so every error shows at once.
    pub fn begin_submit(&mut self) -> Result<OrderDraft, CheckoutError> {
        match self.phase {
            Phase::Submitting => return Err(CheckoutError::InProgress),
            Phase::Submitted => return Err(CheckoutError::AlreadySubmitted),
            Phase::Idle | Phase::Validating | Phase::Invalid => {}
        }

        self.phase = Phase::Validating;
        self.form.touch_all();

        let errors = self.form.errors();
        if !errors.is_valid() {
            info!(errors = %errors, "checkout rejected");
            self.phase = Phase::Invalid;
            self.banner = Some(Banner::Incomplete {
                errors: errors.len(),
            });
            return Err(CheckoutError::Invalid(errors));
        }

        self.phase = Phase::Submitting;
        self.banner = None;

        let draft = OrderDraft {
            contact: self.form.contact.clone(),
            variant: self.cart.variant().clone(),
            quantity: self.cart.quantity(),
            breakdown: self.breakdown(),
            placed_at: Utc::now(),
        };
        info!(
            variant = %draft.variant.id,
            quantity = %draft.quantity,
            total = %draft.breakdown.total,
            "checkout submitting"
        );
        Ok(draft)
    }

    /// Settle an in-flight submission with the store's answer.
    pub fn finish_submit(
        &mut self,
        outcome: Result<OrderRecord, StoreError>,
    ) -> Result<Confirmation, CheckoutError> {
        if self.phase != Phase::Submitting {
            return Err(CheckoutError::NotSubmitting);
        }

        match outcome {
            Ok(record) => {
                let confirmation = Confirmation::from_record(&record);
                info!(
                    order = %confirmation.order_number,
                    total = %confirmation.total,
                    "checkout submitted"
                );
                self.phase = Phase::Submitted;
                self.confirmation = Some(confirmation.clone());
                Ok(confirmation)
            }
            Err(e) => {
                warn!(reason = %e, retryable = e.is_retryable(), "checkout submission failed");
                self.phase = Phase::Idle;
                self.banner = Some(Banner::SubmissionFailed {
                    reason: e.to_string(),
                });
                Err(CheckoutError::Submission(e))
            }
        }
    }

    /// Validate, wait out the submit delay, place the order and settle.
    pub async fn submit(&mut self) -> Result<Confirmation, CheckoutError> {
        let draft = self.begin_submit()?;
        tokio::time::sleep(self.submit_delay).await;
        let outcome = self.sink.place(draft).await;
        self.finish_submit(outcome)
    }

    /// Start over with an empty form on the catalog's default variant.
    pub fn reset(&mut self) {
        self.form.clear();
        self.cart = CartSelection::new(self.catalog.default_variant().clone());
        self.phase = Phase::Idle;
        self.banner = None;
        self.confirmation = None;
    }

    /// What the customer has typed so far, for follow-up on abandoned checkouts.
    ///
    /// `None` once the order is placed or while every field is blank.
    pub fn abandoned_snapshot(&self) -> Option<UncompletedOrder> {
        if self.phase == Phase::Submitted {
            return None;
        }

        let non_blank = |field| {
            let value = self.form.contact.get(field).trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        let capture = UncompletedOrder {
            id: 0,
            customer_name: non_blank(Field::Name),
            customer_phone: non_blank(Field::Phone),
            customer_email: non_blank(Field::Email),
            customer_address: non_blank(Field::Address),
            product_name: Some(self.cart.variant().name.clone()),
            variation: Some(self.cart.variant().label.clone()),
            quantity: Some(self.cart.quantity().get()),
            total: Some(self.breakdown().total),
            converted: false,
        };

        let any_contact = capture.customer_name.is_some()
            || capture.customer_phone.is_some()
            || capture.customer_email.is_some()
            || capture.customer_address.is_some();
        any_contact.then_some(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::validate::FieldError;

    // test utils

    fn fill_valid<S: OrderSink>(checkout: &mut Checkout<'_, S>) {
        checkout.edit(Field::Name, "Rahim Uddin");
        checkout.edit(Field::Phone, "01712345678");
        checkout.edit(Field::Address, "House 12, Road 5, Dhanmondi, Dhaka");
    }

    fn checkout<'a>(catalog: &'a Catalog, store: &'a MemoryStore) -> Checkout<'a, MemoryStore> {
        Checkout::new(catalog, store).with_submit_delay(Duration::from_millis(1))
    }

    #[test]
    fn new_checkout_starts_idle_on_default_variant() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let checkout = checkout(&catalog, &store);

        assert_eq!(checkout.phase(), Phase::Idle);
        assert_eq!(checkout.cart().variant().id, "500g");
        assert_eq!(checkout.cart().quantity().get(), 1);
        assert!(checkout.banner().is_none());
        assert!(checkout.visible_errors().is_empty());
    }

    // Cart

    #[test]
    fn breakdown_follows_selection() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);

        assert!(checkout.set_quantity(5));
        let breakdown = checkout.breakdown();
        assert_eq!(breakdown.subtotal, Taka::new(7250));
        assert_eq!(breakdown.total, Taka::new(6670));
    }

    #[test]
    fn changing_variant_resets_quantity() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);

        checkout.increment();
        checkout.increment();
        assert_eq!(checkout.cart().quantity().get(), 3);

        assert_eq!(checkout.select_variant("1kg"), Ok(true));
        assert_eq!(checkout.cart().quantity().get(), 1);
        assert_eq!(checkout.breakdown().total, Taka::new(2650));
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);

        assert_eq!(
            checkout.select_variant("2kg"),
            Err(CatalogError::UnknownVariant("2kg".into()))
        );
        assert_eq!(checkout.cart().variant().id, "500g");
    }

    #[test]
    fn quantity_controls_stop_at_bounds() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);

        assert!(!checkout.decrement());
        assert!(!checkout.set_quantity(0));
        assert!(!checkout.set_quantity(11));
        assert!(checkout.set_quantity(10));
        assert!(!checkout.increment());
        assert_eq!(checkout.cart().quantity().get(), 10);
    }

    // Field errors

    #[test]
    fn errors_only_visible_once_touched() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);

        checkout.edit(Field::Phone, "0171234567");
        assert!(checkout.visible_errors().is_empty());

        checkout.blur(Field::Phone);
        assert_eq!(
            checkout.visible_errors().get(Field::Phone),
            Some(FieldError::PhoneLength)
        );

        checkout.edit(Field::Phone, "01712345678");
        assert!(checkout.visible_errors().is_empty());
    }

    // Submission

    #[tokio::test]
    async fn submit_with_empty_name_is_invalid_and_creates_nothing() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);
        fill_valid(&mut checkout);
        checkout.edit(Field::Name, "");

        let err = checkout.submit().await.unwrap_err();
        match err {
            CheckoutError::Invalid(errors) => {
                assert_eq!(errors.get(Field::Name), Some(FieldError::Required(Field::Name)));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected invalid, got {other:?}"),
        }

        assert_eq!(checkout.phase(), Phase::Invalid);
        assert_eq!(checkout.banner(), Some(&Banner::Incomplete { errors: 1 }));
        assert!(checkout.confirmation().is_none());
        assert!(store.orders.is_empty().await);
    }

    #[tokio::test]
    async fn submit_touches_every_field() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);

        let _ = checkout.submit().await;
        let visible = checkout.visible_errors();
        assert!(visible.get(Field::Name).is_some());
        assert!(visible.get(Field::Phone).is_some());
        assert!(visible.get(Field::Address).is_some());
        assert!(visible.get(Field::Email).is_none());
    }

    #[tokio::test]
    async fn valid_submit_places_order_and_hands_off_confirmation() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);
        fill_valid(&mut checkout);
        checkout.set_quantity(5);
        let expected_total = checkout.breakdown().total;

        let confirmation = checkout.submit().await.unwrap();

        assert_eq!(checkout.phase(), Phase::Submitted);
        assert_eq!(confirmation.total, expected_total);
        assert_eq!(confirmation.total, Taka::new(6670));
        assert_eq!(confirmation.quantity, 5);
        assert_eq!(confirmation.product_name, "Organic Beetroot Powder 500g");
        assert!(
            confirmation
                .order_number
                .as_str()
                .parse::<OrderNumber>()
                .is_ok()
        );
        assert_eq!(checkout.confirmation(), Some(&confirmation));
        assert_eq!(store.orders.len().await, 1);
    }

    #[tokio::test]
    async fn second_submit_after_success_is_refused() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);
        fill_valid(&mut checkout);

        checkout.submit().await.unwrap();
        assert_eq!(
            checkout.submit().await.unwrap_err(),
            CheckoutError::AlreadySubmitted
        );
        assert_eq!(store.orders.len().await, 1);
    }

    #[test]
    fn double_begin_is_refused_while_submitting() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);
        fill_valid(&mut checkout);

        checkout.begin_submit().unwrap();
        assert_eq!(checkout.phase(), Phase::Submitting);
        assert_eq!(checkout.begin_submit().unwrap_err(), CheckoutError::InProgress);
    }

    #[test]
    fn form_is_read_only_while_submitting() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);
        fill_valid(&mut checkout);
        checkout.begin_submit().unwrap();

        assert!(checkout.is_locked());
        assert!(!checkout.edit(Field::Name, "Someone Else"));
        assert!(!checkout.increment());
        assert_eq!(checkout.select_variant("1kg"), Ok(false));
        assert_eq!(checkout.form().contact.name, "Rahim Uddin");
    }

    #[test]
    fn finish_without_begin_is_refused() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);

        let err = checkout
            .finish_submit(Err(StoreError::Unavailable("down".into())))
            .unwrap_err();
        assert_eq!(err, CheckoutError::NotSubmitting);
        assert_eq!(checkout.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn store_failure_returns_to_idle_with_retryable_banner() {
        let catalog = Catalog::standard();
        let store = MemoryStore::failing();
        let mut checkout = checkout(&catalog, &store);
        fill_valid(&mut checkout);

        let err = checkout.submit().await.unwrap_err();
        assert!(matches!(err, CheckoutError::Submission(StoreError::Unavailable(_))));
        assert_eq!(checkout.phase(), Phase::Idle);
        assert!(matches!(
            checkout.banner(),
            Some(Banner::SubmissionFailed { .. })
        ));
        assert_eq!(checkout.form().contact.name, "Rahim Uddin");

        // retry once the store is back
        store.set_offline(false);
        checkout.submit().await.unwrap();
        assert_eq!(checkout.phase(), Phase::Submitted);
        assert!(checkout.banner().is_none());
    }

    #[tokio::test]
    async fn correcting_fields_clears_invalid_state() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);
        fill_valid(&mut checkout);
        checkout.edit(Field::Phone, "123");

        assert!(checkout.submit().await.is_err());
        assert_eq!(checkout.phase(), Phase::Invalid);

        checkout.edit(Field::Phone, "01712345678");
        assert_eq!(checkout.phase(), Phase::Idle);
        assert!(checkout.banner().is_none());
    }

    #[test]
    fn dismissing_banner_returns_to_idle() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);

        assert!(checkout.begin_submit().is_err());
        assert_eq!(checkout.phase(), Phase::Invalid);

        checkout.dismiss_banner();
        assert_eq!(checkout.phase(), Phase::Idle);
        assert!(checkout.banner().is_none());
        // errors stay visible; only the banner goes away
        assert!(!checkout.visible_errors().is_empty());
    }

    #[tokio::test]
    async fn reset_after_submit_starts_fresh() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);
        fill_valid(&mut checkout);
        checkout.select_variant("1kg").unwrap();
        checkout.submit().await.unwrap();

        checkout.reset();
        assert_eq!(checkout.phase(), Phase::Idle);
        assert_eq!(checkout.form(), &FormState::default());
        assert_eq!(checkout.cart().variant().id, "500g");
        assert!(checkout.confirmation().is_none());
    }

    // Abandoned checkouts

    #[tokio::test]
    async fn abandoned_snapshot_captures_partial_contact() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let mut checkout = checkout(&catalog, &store);
        assert!(checkout.abandoned_snapshot().is_none());

        checkout.edit(Field::Phone, " 01712345678 ");
        checkout.set_quantity(3);
        let capture = checkout.abandoned_snapshot().unwrap();
        assert_eq!(capture.customer_phone.as_deref(), Some("01712345678"));
        assert_eq!(capture.customer_name, None);
        assert_eq!(capture.quantity, Some(3));
        assert_eq!(capture.total, Some(checkout.breakdown().total));

        fill_valid(&mut checkout);
        checkout.submit().await.unwrap();
        assert!(checkout.abandoned_snapshot().is_none());
    }

    // Confirmation handoff

    #[test]
    fn confirmation_query_is_encoded() {
        let confirmation = Confirmation {
            order_number: "ORD-20261018-0042".parse().unwrap(),
            product_name: "Beetroot 500g & more".into(),
            quantity: 2,
            total: Taka::new(2900),
        };
        assert_eq!(
            confirmation.to_query(),
            "order=ORD-20261018-0042&product=Beetroot%20500g%20%26%20more&qty=2&total=2900"
        );
    }

    #[test]
    fn confirmation_query_escapes_non_ascii_and_keeps_unreserved() {
        let confirmation = Confirmation {
            order_number: "ORD-20261018-0042".parse().unwrap(),
            product_name: "Jar_1.5~kg/৳".into(),
            quantity: 1,
            total: Taka::new(1450),
        };
        assert_eq!(
            confirmation.to_query(),
            "order=ORD-20261018-0042&product=Jar_1.5~kg%2F%E0%A7%B3&qty=1&total=1450"
        );
    }

    #[test]
    fn submit_delay_is_kept_within_bounds() {
        let catalog = Catalog::standard();
        let store = MemoryStore::new();
        let checkout = Checkout::new(&catalog, &store).with_submit_delay(Duration::ZERO);
        assert_eq!(checkout.submit_delay(), MIN_SUBMIT_DELAY);

        let checkout = Checkout::new(&catalog, &store).with_submit_delay(Duration::from_secs(60));
        assert_eq!(checkout.submit_delay(), MAX_SUBMIT_DELAY);

        let checkout =
            Checkout::new(&catalog, &store).with_submit_delay(Duration::from_millis(250));
        assert_eq!(checkout.submit_delay(), Duration::from_millis(250));
    }
}
