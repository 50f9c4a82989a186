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

//! Parent trip booking aggregate.
//!
//! Implemented State Machine
//!
//! ```text
//!  Draft ──checkout──► Pending ──confirm / paid──► Confirmed ──complete──► Completed
//!    │                                              ▲
//!    └────────────────────paid──────────────────────┘
//!
//!  Draft / Pending / Confirmed ──cancel──► Cancelled
//! ```
//!
//! `Cancelled` and `Completed` are terminal: every event sent to a terminal
//! booking fails with [`BookingError::InvalidTransition`].
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use trip_booking_ledger::{
//!     BookingEvent, BookingStatus, Currency, ParentBooking, PaymentStatus, PaymentUpdate,
//!     TripId, UserId,
//! };
//!
//! let mut booking = ParentBooking::draft(
//!     UserId::new(),
//!     TripId::new(),
//!     "BK-1-ABC123".to_string(),
//!     Currency::default(),
//! );
//! let paid = PaymentUpdate::new(PaymentStatus::Paid, dec!(0));
//! booking.apply(BookingEvent::Payment(paid)).unwrap();
//! assert_eq!(booking.status, BookingStatus::Confirmed);
//! ```

use crate::BookingError;
use crate::base::{BookingId, TravelerId, TripId, UserId};
use crate::money::{Currency, Money, Pricing};
use crate::service::{ServiceRef, Services};
use crate::settings::CurrencyPolicy;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by parent and service bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Draft,
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_paid: Decimal,
    pub total_refunded: Decimal,
    pub payment_status: PaymentStatus,
    /// Identifier of the last payment reported by the payment collaborator.
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingChannel {
    #[default]
    Web,
    Mobile,
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Traveler {
    pub traveler_id: TravelerId,
    pub is_lead: bool,
}

/// Payment callback payload. Treated as authoritative; amounts left out keep
/// their recorded values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub total_paid: Option<Decimal>,
    #[serde(default)]
    pub total_refunded: Option<Decimal>,
    #[serde(default)]
    pub payment_id: Option<String>,
}

impl PaymentUpdate {
    pub fn new(payment_status: PaymentStatus, total_paid: Decimal) -> Self {
        Self {
            payment_status,
            total_paid: Some(total_paid),
            total_refunded: None,
            payment_id: None,
        }
    }

    /// Refund callback that only reports the refunded total.
    pub fn refund(total_refunded: Decimal) -> Self {
        Self {
            payment_status: PaymentStatus::Refunded,
            total_paid: None,
            total_refunded: Some(total_refunded),
            payment_id: None,
        }
    }

    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    pub fn with_refunded(mut self, total_refunded: Decimal) -> Self {
        self.total_refunded = Some(total_refunded);
        self
    }
}

/// Events driving the booking state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEvent {
    /// Checkout started, `draft -> pending`.
    Checkout,
    /// Payment collaborator callback.
    Payment(PaymentUpdate),
    /// Manual confirmation, `pending -> confirmed`.
    Confirm,
    Cancel { reason: Option<String> },
    /// Trip taken, `confirmed -> completed`.
    Complete,
}

impl BookingEvent {
    fn action(&self) -> &'static str {
        match self {
            Self::Checkout => "check out",
            Self::Payment(_) => "record a payment for",
            Self::Confirm => "confirm",
            Self::Cancel { .. } => "cancel",
            Self::Complete => "complete",
        }
    }
}

/// The consolidated trip-level booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentBooking {
    pub id: BookingId,
    pub trip_id: TripId,
    pub user_id: UserId,
    pub booking_reference: String,
    pub travelers: Vec<Traveler>,
    pub services: Services,
    pub pricing: Pricing,
    pub payment_summary: PaymentSummary,
    pub status: BookingStatus,
    pub booking_channel: BookingChannel,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl ParentBooking {
    /// Insert-only defaults for a fresh draft: zeroed ledger, no services,
    /// payment pending.
    pub fn draft(
        user_id: UserId,
        trip_id: TripId,
        booking_reference: String,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BookingId::new(),
            trip_id,
            user_id,
            booking_reference,
            travelers: Vec::new(),
            services: Services::default(),
            pricing: Pricing::new(currency),
            payment_summary: PaymentSummary::default(),
            status: BookingStatus::Draft,
            booking_channel: BookingChannel::default(),
            special_requests: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.pricing.is_balanced(),
            "Invariant violated: total {} does not match breakdown sum {}",
            self.pricing.total_amount,
            self.pricing.breakdown.sum()
        );
        debug_assert!(
            self.pricing.total_amount >= Decimal::ZERO,
            "Invariant violated: total went negative: {}",
            self.pricing.total_amount
        );
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), BookingError> {
        if self.status.is_terminal() {
            return Err(BookingError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        Ok(())
    }

    /// Appends a service reference and adds its price to the totals.
    ///
    /// Only drafts accept new services. Linking never changes `status`.
    pub fn link_service(
        &mut self,
        service: ServiceRef,
        price: &Money,
        policy: CurrencyPolicy,
    ) -> Result<(), BookingError> {
        if self.status != BookingStatus::Draft {
            return Err(BookingError::InvalidTransition {
                from: self.status,
                action: "link a service to",
            });
        }
        if policy == CurrencyPolicy::Reject && price.currency() != &self.pricing.currency {
            return Err(BookingError::CurrencyMismatch {
                expected: self.pricing.currency.to_string(),
                actual: price.currency().to_string(),
            });
        }

        self.services.push(service);
        self.pricing.add_service(service.kind, price.amount());
        self.updated_at = Utc::now();
        self.assert_invariants();
        Ok(())
    }

    /// Runs one state machine event. Nothing changes on error.
    pub fn apply(&mut self, event: BookingEvent) -> Result<(), BookingError> {
        let action = event.action();
        self.ensure_open(action)?;
        let invalid = BookingError::InvalidTransition {
            from: self.status,
            action,
        };
        let now = Utc::now();

        match event {
            BookingEvent::Checkout => {
                if self.status != BookingStatus::Draft {
                    return Err(invalid);
                }
                self.status = BookingStatus::Pending;
            }
            BookingEvent::Confirm => {
                if self.status != BookingStatus::Pending {
                    return Err(invalid);
                }
                self.status = BookingStatus::Confirmed;
                self.confirmed_at = Some(now);
            }
            BookingEvent::Cancel { reason } => {
                // Refunds are handled by the payment flow, not here.
                self.status = BookingStatus::Cancelled;
                self.cancelled_at = Some(now);
                self.cancellation_reason = reason;
            }
            BookingEvent::Complete => {
                if self.status != BookingStatus::Confirmed {
                    return Err(invalid);
                }
                self.status = BookingStatus::Completed;
            }
            BookingEvent::Payment(update) => {
                self.apply_payment(update, now, invalid)?;
            }
        }

        self.updated_at = now;
        self.assert_invariants();
        Ok(())
    }

    fn apply_payment(
        &mut self,
        update: PaymentUpdate,
        now: DateTime<Utc>,
        invalid: BookingError,
    ) -> Result<(), BookingError> {
        if update.total_paid.is_some_and(|paid| paid < Decimal::ZERO)
            || update.total_refunded.is_some_and(|refunded| refunded < Decimal::ZERO)
        {
            return Err(BookingError::NegativeAmount);
        }

        if update.payment_status == PaymentStatus::Paid {
            if !matches!(self.status, BookingStatus::Draft | BookingStatus::Pending) {
                return Err(invalid);
            }
            self.status = BookingStatus::Confirmed;
            self.confirmed_at = Some(now);
        }

        let summary = &mut self.payment_summary;
        summary.payment_status = update.payment_status;
        if let Some(paid) = update.total_paid {
            summary.total_paid = paid;
        }
        if let Some(refunded) = update.total_refunded {
            summary.total_refunded = refunded;
        }
        if update.payment_id.is_some() {
            summary.payment_id = update.payment_id;
        }
        Ok(())
    }

    /// Adds a traveler, or updates the lead flag of one already listed.
    ///
    /// Several travelers may be flagged as lead.
    pub fn add_traveler(&mut self, traveler: Traveler) -> Result<(), BookingError> {
        self.ensure_open("add a traveler to")?;
        match self
            .travelers
            .iter_mut()
            .find(|existing| existing.traveler_id == traveler.traveler_id)
        {
            Some(existing) => existing.is_lead = traveler.is_lead,
            None => self.travelers.push(traveler),
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The first traveler flagged as lead.
    pub fn lead_traveler(&self) -> Option<TravelerId> {
        self.travelers
            .iter()
            .find(|traveler| traveler.is_lead)
            .map(|traveler| traveler.traveler_id)
    }

    pub fn set_special_requests(&mut self, requests: Option<String>) -> Result<(), BookingError> {
        self.ensure_open("edit")?;
        self.special_requests = requests;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_channel(&mut self, channel: BookingChannel) -> Result<(), BookingError> {
        self.ensure_open("edit")?;
        self.booking_channel = channel;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Flat, rounded view used for reporting.
    pub fn summary(&self) -> BookingSummary {
        let round = |amount: Decimal| amount.round_dp(Pricing::MINOR_UNITS);
        let breakdown = &self.pricing.breakdown;
        BookingSummary {
            reference: self.booking_reference.clone(),
            user: self.user_id,
            trip: self.trip_id,
            status: self.status,
            payment_status: self.payment_summary.payment_status,
            currency: self.pricing.currency.clone(),
            total: round(self.pricing.total_amount),
            flights: round(breakdown.flights),
            hotels: round(breakdown.hotels),
            cabs: round(breakdown.cabs),
            activities: round(breakdown.activities),
            paid: round(self.payment_summary.total_paid),
            refunded: round(self.payment_summary.total_refunded),
        }
    }
}

/// One-row report of a parent booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingSummary {
    pub reference: String,
    pub user: UserId,
    pub trip: TripId,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub currency: Currency,
    pub total: Decimal,
    pub flights: Decimal,
    pub hotels: Decimal,
    pub cabs: Decimal,
    pub activities: Decimal,
    pub paid: Decimal,
    pub refunded: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ServiceId;
    use crate::service::ServiceKind;
    use rust_decimal_macros::dec;

    fn draft() -> ParentBooking {
        ParentBooking::draft(
            UserId::new(),
            TripId::new(),
            "BK-1-TEST01".to_string(),
            Currency::default(),
        )
    }

    fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::default()).unwrap()
    }

    fn service(kind: ServiceKind) -> ServiceRef {
        ServiceRef::new(kind, ServiceId::new())
    }

    fn in_status(status: BookingStatus) -> ParentBooking {
        let mut booking = draft();
        booking.status = status;
        booking
    }

    fn paid(amount: Decimal) -> BookingEvent {
        BookingEvent::Payment(PaymentUpdate::new(PaymentStatus::Paid, amount))
    }

    // === Insert defaults ===

    #[test]
    fn draft_has_zeroed_ledger() {
        let booking = draft();
        assert_eq!(booking.status, BookingStatus::Draft);
        assert_eq!(booking.pricing.total_amount, Decimal::ZERO);
        assert_eq!(booking.pricing.breakdown.sum(), Decimal::ZERO);
        assert!(booking.services.is_empty());
        assert_eq!(booking.payment_summary.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.booking_channel, BookingChannel::Web);
    }

    // === Linking ===

    #[test]
    fn link_adds_to_total_and_breakdown() {
        let mut booking = draft();
        let flight = service(ServiceKind::Flight);
        let hotel = service(ServiceKind::Hotel);
        booking
            .link_service(flight, &inr(dec!(5000)), CurrencyPolicy::Reject)
            .unwrap();
        booking
            .link_service(hotel, &inr(dec!(8000)), CurrencyPolicy::Reject)
            .unwrap();

        assert_eq!(booking.pricing.total_amount, dec!(13000));
        assert_eq!(booking.pricing.breakdown.flights, dec!(5000));
        assert_eq!(booking.pricing.breakdown.hotels, dec!(8000));
        assert_eq!(booking.services.flights, vec![flight.id]);
        assert_eq!(booking.services.hotels, vec![hotel.id]);
        assert_eq!(booking.status, BookingStatus::Draft);
    }

    #[test]
    fn link_rejects_foreign_currency_under_reject_policy() {
        let mut booking = draft();
        let usd = Money::new(dec!(10), Currency::new("USD").unwrap()).unwrap();
        let result = booking.link_service(service(ServiceKind::Cab), &usd, CurrencyPolicy::Reject);

        assert_eq!(
            result,
            Err(BookingError::CurrencyMismatch {
                expected: "INR".to_string(),
                actual: "USD".to_string()
            })
        );
        assert!(booking.services.is_empty());
        assert_eq!(booking.pricing.total_amount, Decimal::ZERO);
    }

    #[test]
    fn link_sums_foreign_currency_under_trust_policy() {
        let mut booking = draft();
        let usd = Money::new(dec!(10), Currency::new("USD").unwrap()).unwrap();
        booking
            .link_service(service(ServiceKind::Cab), &usd, CurrencyPolicy::Trust)
            .unwrap();
        assert_eq!(booking.pricing.total_amount, dec!(10));
    }

    #[test]
    fn link_requires_draft() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            let mut booking = in_status(status);
            let result = booking.link_service(
                service(ServiceKind::Activity),
                &inr(dec!(1)),
                CurrencyPolicy::Trust,
            );
            assert_eq!(
                result,
                Err(BookingError::InvalidTransition {
                    from: status,
                    action: "link a service to"
                })
            );
            assert!(booking.services.is_empty());
        }
    }

    // === Payment transitions ===

    #[test]
    fn paid_confirms_draft() {
        let mut booking = draft();
        booking
            .apply(BookingEvent::Payment(
                PaymentUpdate::new(PaymentStatus::Paid, dec!(13000)).with_payment_id("pay_1"),
            ))
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_summary.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.payment_summary.total_paid, dec!(13000));
        assert_eq!(booking.payment_summary.payment_id.as_deref(), Some("pay_1"));
        assert!(booking.confirmed_at.is_some());
    }

    #[test]
    fn paid_confirms_pending() {
        let mut booking = in_status(BookingStatus::Pending);
        booking.apply(paid(dec!(1))).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn paid_on_confirmed_is_rejected() {
        let mut booking = in_status(BookingStatus::Confirmed);
        let result = booking.apply(paid(dec!(1)));
        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Confirmed,
                ..
            })
        ));
        assert_eq!(booking.payment_summary.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn partial_payment_keeps_status() {
        for status in [
            BookingStatus::Draft,
            BookingStatus::Pending,
            BookingStatus::Confirmed,
        ] {
            let mut booking = in_status(status);
            booking
                .apply(BookingEvent::Payment(PaymentUpdate::new(
                    PaymentStatus::Partial,
                    dec!(2500),
                )))
                .unwrap();
            assert_eq!(booking.status, status);
            assert_eq!(booking.payment_summary.payment_status, PaymentStatus::Partial);
            assert_eq!(booking.payment_summary.total_paid, dec!(2500));
        }
    }

    #[test]
    fn refund_records_refunded_amount() {
        let mut booking = in_status(BookingStatus::Confirmed);
        booking
            .apply(BookingEvent::Payment(
                PaymentUpdate::new(PaymentStatus::Refunded, dec!(13000)).with_refunded(dec!(13000)),
            ))
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_summary.payment_status, PaymentStatus::Refunded);
        assert_eq!(booking.payment_summary.total_refunded, dec!(13000));
    }

    #[test]
    fn refund_without_paid_amount_keeps_total_paid() {
        let mut booking = draft();
        booking.apply(paid(dec!(13000))).unwrap();
        booking
            .apply(BookingEvent::Payment(PaymentUpdate::refund(dec!(5000))))
            .unwrap();

        let summary = &booking.payment_summary;
        assert_eq!(summary.payment_status, PaymentStatus::Refunded);
        assert_eq!(summary.total_paid, dec!(13000));
        assert_eq!(summary.total_refunded, dec!(5000));
    }

    #[test]
    fn callback_without_amounts_deserializes() {
        let update: PaymentUpdate =
            serde_json::from_str(r#"{"paymentStatus":"refunded","totalRefunded":"5000"}"#)
                .unwrap();
        assert_eq!(update, PaymentUpdate::refund(dec!(5000)));
    }

    #[test]
    fn negative_payment_amount_is_rejected() {
        let mut booking = draft();
        let result = booking.apply(paid(dec!(-1)));
        assert_eq!(result, Err(BookingError::NegativeAmount));
        assert_eq!(booking.status, BookingStatus::Draft);
    }

    // === Explicit transitions ===

    #[test]
    fn checkout_then_confirm_then_complete() {
        let mut booking = draft();
        booking.apply(BookingEvent::Checkout).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        booking.apply(BookingEvent::Confirm).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        booking.apply(BookingEvent::Complete).unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
    }

    #[test]
    fn manual_confirm_requires_pending() {
        let mut booking = draft();
        let result = booking.apply(BookingEvent::Confirm);
        assert_eq!(
            result,
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Draft,
                action: "confirm"
            })
        );
    }

    #[test]
    fn cancel_keeps_payment_status_and_records_reason() {
        let mut booking = in_status(BookingStatus::Confirmed);
        booking.payment_summary.payment_status = PaymentStatus::Paid;
        booking
            .apply(BookingEvent::Cancel {
                reason: Some("change of plans".to_string()),
            })
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.payment_summary.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.cancellation_reason.as_deref(), Some("change of plans"));
        assert!(booking.cancelled_at.is_some());
    }

    #[test]
    fn draft_can_be_cancelled_directly() {
        let mut booking = draft();
        booking.apply(BookingEvent::Cancel { reason: None }).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn terminal_states_reject_every_event() {
        for status in [BookingStatus::Cancelled, BookingStatus::Completed] {
            let events = [
                BookingEvent::Checkout,
                BookingEvent::Confirm,
                BookingEvent::Complete,
                BookingEvent::Cancel { reason: None },
                paid(dec!(1)),
            ];
            for event in events {
                let mut booking = in_status(status);
                let result = booking.apply(event);
                assert!(
                    matches!(result, Err(BookingError::InvalidTransition { from, .. }) if from == status)
                );
                assert_eq!(booking.status, status);
            }
        }
    }

    // === Travelers ===

    #[test]
    fn several_leads_are_kept() {
        let mut booking = draft();
        let first = TravelerId::new();
        let second = TravelerId::new();
        booking
            .add_traveler(Traveler {
                traveler_id: first,
                is_lead: true,
            })
            .unwrap();
        booking
            .add_traveler(Traveler {
                traveler_id: second,
                is_lead: true,
            })
            .unwrap();

        assert_eq!(booking.travelers.len(), 2);
        assert!(booking.travelers.iter().all(|traveler| traveler.is_lead));
        assert_eq!(booking.lead_traveler(), Some(first));
    }

    #[test]
    fn re_adding_traveler_updates_lead_flag() {
        let mut booking = draft();
        let traveler_id = TravelerId::new();
        booking
            .add_traveler(Traveler {
                traveler_id,
                is_lead: true,
            })
            .unwrap();
        booking
            .add_traveler(Traveler {
                traveler_id,
                is_lead: false,
            })
            .unwrap();

        assert_eq!(booking.travelers.len(), 1);
        assert_eq!(booking.lead_traveler(), None);
    }

    #[test]
    fn cancelled_booking_rejects_edits() {
        let mut booking = in_status(BookingStatus::Cancelled);
        assert!(booking.set_special_requests(Some("window seat".to_string())).is_err());
        assert!(booking.set_channel(BookingChannel::Mobile).is_err());
        assert!(
            booking
                .add_traveler(Traveler {
                    traveler_id: TravelerId::new(),
                    is_lead: false
                })
                .is_err()
        );
    }

    // === Reporting ===

    #[test]
    fn summary_rounds_to_minor_units() {
        let mut booking = draft();
        booking
            .link_service(
                service(ServiceKind::Flight),
                &inr(dec!(100.456)),
                CurrencyPolicy::Reject,
            )
            .unwrap();
        let summary = booking.summary();
        assert_eq!(summary.total, dec!(100.46));
        assert_eq!(summary.flights, dec!(100.46));
        assert_eq!(summary.hotels, dec!(0));
    }

    #[test]
    fn serializes_as_camel_case_document() {
        let booking = draft();
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["bookingReference"], "BK-1-TEST01");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["paymentSummary"]["paymentStatus"], "pending");
        assert_eq!(json["services"]["flights"], serde_json::json!([]));
    }
}
