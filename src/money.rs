// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Money and pricing ledger primitives.
//!
//! Amounts are [`Decimal`] so that many small increments never drift. No
//! currency conversion happens anywhere in this crate.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use trip_booking_ledger::{Currency, Money};
//!
//! let inr = Currency::new("inr").unwrap();
//! let price = Money::new(dec!(5000), inr).unwrap();
//! assert_eq!(price.currency().as_str(), "INR");
//! ```

use crate::BookingError;
use crate::service::ServiceKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-letter upper-case currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: &str) -> Result<Self, BookingError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BookingError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bookings are priced in Indian rupees unless told otherwise.
impl Default for Currency {
    fn default() -> Self {
        Self("INR".to_string())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Currency {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = BookingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// A non-negative amount in a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMoney")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

/// Unchecked wire form of [`Money`].
#[derive(Deserialize)]
struct RawMoney {
    amount: Decimal,
    currency: Currency,
}

impl TryFrom<RawMoney> for Money {
    type Error = BookingError;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Money::new(raw.amount, raw.currency)
    }
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self, BookingError> {
        if amount < Decimal::ZERO {
            return Err(BookingError::NegativeAmount);
        }
        Ok(Self { amount, currency })
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Per-category subtotals of a booking.
///
/// Every field is a non-negative contribution to the booking total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub flights: Decimal,
    pub hotels: Decimal,
    pub cabs: Decimal,
    pub activities: Decimal,
    pub taxes: Decimal,
    pub fees: Decimal,
    pub discounts: Decimal,
}

impl Breakdown {
    /// Subtotal for one service category.
    pub fn get(&self, kind: ServiceKind) -> Decimal {
        match kind {
            ServiceKind::Flight => self.flights,
            ServiceKind::Hotel => self.hotels,
            ServiceKind::Cab => self.cabs,
            ServiceKind::Activity => self.activities,
        }
    }

    fn slot_mut(&mut self, kind: ServiceKind) -> &mut Decimal {
        match kind {
            ServiceKind::Flight => &mut self.flights,
            ServiceKind::Hotel => &mut self.hotels,
            ServiceKind::Cab => &mut self.cabs,
            ServiceKind::Activity => &mut self.activities,
        }
    }

    /// Sum of every field.
    pub fn sum(&self) -> Decimal {
        self.flights
            + self.hotels
            + self.cabs
            + self.activities
            + self.taxes
            + self.fees
            + self.discounts
    }
}

/// Running financial totals of a parent booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub total_amount: Decimal,
    pub currency: Currency,
    pub breakdown: Breakdown,
}

impl Pricing {
    /// Decimal places used when presenting amounts.
    pub const MINOR_UNITS: u32 = 2;

    /// Zeroed ledger in the given currency.
    pub fn new(currency: Currency) -> Self {
        Self {
            total_amount: Decimal::ZERO,
            currency,
            breakdown: Breakdown::default(),
        }
    }

    /// Adds `amount` to both the total and the category subtotal.
    pub(crate) fn add_service(&mut self, kind: ServiceKind, amount: Decimal) {
        self.total_amount += amount;
        *self.breakdown.slot_mut(kind) += amount;
    }

    pub fn is_balanced(&self) -> bool {
        self.total_amount == self.breakdown.sum()
    }
}
