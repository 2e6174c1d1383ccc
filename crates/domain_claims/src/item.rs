//! Claim line items

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, InvoiceId, ItemId, Money, MoneyError};
use crate::error::ClaimError;
use crate::invoice::Invoice;

/// Unit of measure used when none is given
pub const DEFAULT_UNIT: &str = "pcs";

/// Longest accepted item name
pub const MAX_NAME_LEN: usize = 200;
/// Longest accepted unit of measure
pub const MAX_UNIT_LEN: usize = 20;
/// Largest accepted unit price
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

/// Item fields as entered by the applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLine {
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit: Option<String>,
    pub price: Decimal,
}

impl ItemLine {
    pub fn new(name: impl Into<String>, quantity: u32, price: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: None,
            price,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    fn validated(&self) -> Result<(String, u32, String, Money), ClaimError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClaimError::validation("item.name", "Item name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ClaimError::validation(
                "item.name",
                format!("Item name is longer than {} characters", MAX_NAME_LEN),
            ));
        }
        if self.quantity == 0 {
            return Err(ClaimError::validation("item.quantity", "Quantity must be at least 1"));
        }
        let unit = match self.unit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_UNIT.to_string(),
            Some(unit) if unit.chars().count() > MAX_UNIT_LEN => {
                return Err(ClaimError::validation(
                    "item.unit",
                    format!("Unit is longer than {} characters", MAX_UNIT_LEN),
                ))
            }
            Some(unit) => unit.to_string(),
        };
        if self.price > MAX_PRICE {
            return Err(ClaimError::validation(
                "item.price",
                format!("Unit price may not exceed {}", MAX_PRICE),
            ));
        }
        let price = Money::price(self.price).map_err(|e| match e {
            MoneyError::NotPositive(_) => {
                ClaimError::validation("item.price", "Unit price must be greater than zero")
            }
            MoneyError::TooPrecise(_) => {
                ClaimError::validation("item.price", "Unit price may have at most two decimals")
            }
            MoneyError::Overflow => ClaimError::validation("item.price", "Unit price is too large"),
        })?;
        Ok((name.to_string(), self.quantity, unit, price))
    }
}

/// Stored item fields, used to rebuild an item from storage
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub id: ItemId,
    pub claim_id: ClaimId,
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    pub price: Money,
    pub invoices: Vec<Invoice>,
}

/// One expense line of a claim
///
/// `amount` is always `quantity * price`; it is recomputed whenever the
/// line changes and is never accepted from outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    claim_id: ClaimId,
    name: String,
    quantity: u32,
    unit: String,
    price: Money,
    amount: Money,
    invoices: Vec<Invoice>,
}

impl Item {
    pub(crate) fn new(claim_id: ClaimId, line: &ItemLine) -> Result<Self, ClaimError> {
        let (name, quantity, unit, price) = line.validated()?;
        let amount = line_amount(price, quantity)?;
        Ok(Self {
            id: ItemId::new_v7(),
            claim_id,
            name,
            quantity,
            unit,
            price,
            amount,
            invoices: Vec::new(),
        })
    }

    /// Rebuilds an item from storage, recomputing its amount
    pub fn restore(record: ItemRecord) -> Result<Self, ClaimError> {
        let amount = line_amount(record.price, record.quantity)?;
        Ok(Self {
            id: record.id,
            claim_id: record.claim_id,
            name: record.name,
            quantity: record.quantity,
            unit: record.unit,
            price: record.price,
            amount,
            invoices: record.invoices,
        })
    }

    pub(crate) fn apply(&mut self, line: &ItemLine) -> Result<(), ClaimError> {
        let (name, quantity, unit, price) = line.validated()?;
        self.amount = line_amount(price, quantity)?;
        self.name = name;
        self.quantity = quantity;
        self.unit = unit;
        self.price = price;
        Ok(())
    }

    pub(crate) fn push_invoice(&mut self, invoice: Invoice) {
        self.invoices.push(invoice);
    }

    pub(crate) fn take_invoice(&mut self, invoice_id: InvoiceId) -> Option<Invoice> {
        let index = self.invoices.iter().position(|i| i.id == invoice_id)?;
        Some(self.invoices.remove(index))
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn claim_id(&self) -> ClaimId {
        self.claim_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }
}

fn line_amount(price: Money, quantity: u32) -> Result<Money, ClaimError> {
    price
        .checked_times(quantity)
        .map_err(|_| ClaimError::validation("item.quantity", "Item amount is too large"))
}
