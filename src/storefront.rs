//! Batch driver: each request is filled into its own checkout session.

use std::time::Duration;

use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::checkout::{Checkout, CheckoutError, Confirmation};
use crate::config::Config;
use crate::model::{Catalog, CatalogError, Field, Quantity};
use crate::store::OrderSink;

/// One customer's form as it would be filled in on the landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Source line, for log messages.
    pub line: usize,
    pub variant: String,
    pub quantity: Quantity,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub confirmations: Vec<Confirmation>,
    pub rejected: usize,
}

pub struct Storefront<S> {
    catalog: Catalog,
    sink: S,
    submit_delay: Duration,
}

/// Public API
impl<S: OrderSink> Storefront<S> {
    pub fn new(catalog: Catalog, sink: S) -> Self {
        Self {
            catalog,
            sink,
            submit_delay: Config::default().submit_delay,
        }
    }

    pub fn with_config(mut self, config: &Config) -> Self {
        self.submit_delay = config.submit_delay;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// A fresh checkout session on this storefront's catalog and store.
    pub fn open(&self) -> Checkout<'_, S> {
        Checkout::new(&self.catalog, &self.sink).with_submit_delay(self.submit_delay)
    }

    /// Run the storefront over a stream of requests
    pub async fn run(&self, mut stream: impl Stream<Item = CheckoutRequest> + Unpin) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(request) = stream.next().await {
            // a rejected request must not stop the batch
            match self.process(request).await {
                Ok(confirmation) => summary.confirmations.push(confirmation),
                Err(_) => summary.rejected += 1,
            }
        }
        summary
    }

    /// Fill a single request into a new session and submit it
    pub async fn process(&self, request: CheckoutRequest) -> Result<Confirmation, RequestError> {
        let line = request.line;
        let result = self.fill_and_submit(request).await;
        Self::log_result(line, &result);
        result
    }
}

/// Private API
impl<S: OrderSink> Storefront<S> {
    async fn fill_and_submit(&self, request: CheckoutRequest) -> Result<Confirmation, RequestError> {
        let mut checkout = self.open();

        checkout.select_variant(&request.variant)?;
        checkout.set_quantity(request.quantity.get());

        for (field, value) in [
            (Field::Name, request.name),
            (Field::Phone, request.phone),
            (Field::Email, request.email),
            (Field::Address, request.address),
        ] {
            checkout.edit(field, value);
            checkout.blur(field);
        }

        Ok(checkout.submit().await?)
    }

    fn log_result(line: usize, result: &Result<Confirmation, RequestError>) {
        match result {
            Ok(confirmation) => {
                info!(
                    line,
                    order = %confirmation.order_number,
                    total = %confirmation.total,
                    "request placed"
                );
            }
            Err(e) => {
                warn!(line, reason = %e, "request rejected");
            }
        }
    }
}
