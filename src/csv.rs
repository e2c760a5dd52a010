use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::Taka;
use crate::checkout::Confirmation;
use crate::model::{OrderRecord, ProductVariant, Quantity};
use crate::storefront::CheckoutRequest;

/// Errors that can occur when reading or writing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: quantity {quantity} outside {}..={}", Quantity::MIN, Quantity::MAX)]
    QuantityOutOfRange { line: usize, quantity: u8 },

    #[error("failed to write csv: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush csv writer: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    name: String,
    label: String,
    unit_price: i64,
}

#[derive(Debug, Deserialize)]
struct RequestRow {
    variant: String,
    quantity: u8,
    name: String,
    phone: String,
    #[serde(default)]
    email: String,
    address: String,
}

#[derive(Debug, Serialize)]
struct ConfirmationRow<'a> {
    order: &'a str,
    product: &'a str,
    qty: u8,
    total: i64,
}

#[derive(Debug, Serialize)]
struct OrderRow<'a> {
    order_number: &'a str,
    created_at: String,
    customer_name: &'a str,
    customer_phone: &'a str,
    customer_address: &'a str,
    variation: &'a str,
    quantity: u8,
    unit_price: i64,
    subtotal: i64,
    discount: i64,
    discount_pct: u8,
    total: i64,
    status: &'a str,
    payment_method: &'a str,
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, CsvError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// Read catalog variants (`id,name,label,unit_price`) from a csv file
pub fn read_catalog(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<ProductVariant, CsvError>>, CsvError> {
    let reader = reader(path.as_ref())?;

    Ok(reader
        .into_deserialize::<CatalogRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            Ok(ProductVariant::new(
                row.id,
                row.name,
                row.label,
                Taka::new(row.unit_price),
            ))
        }))
}

/// Read checkout requests (`variant,quantity,name,phone,email,address`) from a csv file
pub fn read_requests(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<CheckoutRequest, CsvError>>, CsvError> {
    let reader = reader(path.as_ref())?;

    Ok(reader
        .into_deserialize::<RequestRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2;
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let quantity = Quantity::new(row.quantity).ok_or(CsvError::QuantityOutOfRange {
                line,
                quantity: row.quantity,
            })?;
            Ok(CheckoutRequest {
                line,
                variant: row.variant,
                quantity,
                name: row.name,
                phone: row.phone,
                email: row.email,
                address: row.address,
            })
        }))
}

/// Write confirmations in the thank-you page's field names
pub fn write_confirmations<'a, W: io::Write>(
    writer: W,
    confirmations: impl IntoIterator<Item = &'a Confirmation>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for confirmation in confirmations {
        writer.serialize(ConfirmationRow {
            order: confirmation.order_number.as_str(),
            product: &confirmation.product_name,
            qty: confirmation.quantity,
            total: confirmation.total.value(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Export stored orders for bookkeeping
pub fn write_orders<'a, W: io::Write>(
    writer: W,
    orders: impl IntoIterator<Item = &'a OrderRecord>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for order in orders {
        writer.serialize(OrderRow {
            order_number: order.order_number.as_str(),
            created_at: order.created_at.to_rfc3339(),
            customer_name: &order.customer_name,
            customer_phone: &order.customer_phone,
            customer_address: &order.customer_address,
            variation: &order.variation,
            quantity: order.quantity,
            unit_price: order.unit_price.value(),
            subtotal: order.subtotal.value(),
            discount: order.discount.value(),
            discount_pct: order.discount_pct,
            total: order.total.value(),
            status: order.status.as_str(),
            payment_method: &order.payment_method,
        })?;
    }

    writer.flush()?;
    Ok(())
}
