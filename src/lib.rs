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

//! # Trip Booking Ledger
//!
//! This library consolidates independently created flight, hotel, cab and
//! activity bookings into a single trip booking per user and trip, keeping
//! running totals and a booking/payment state machine consistent under
//! concurrent writers.
//!
//! ## Core Components
//!
//! - [`Engine`]: Get-or-create of parent drafts, service linking, payment callbacks
//! - [`ParentBooking`]: The trip booking aggregate and its state machine
//! - [`ServiceBooking`]: An individual service reservation
//! - [`BookingStore`]: Atomic single-document store contract, with [`MemoryStore`]
//! - [`BookingError`]: Error types, classified by [`ErrorKind`]
//!
//! ## Example
//!
//! ```
//! use trip_booking_ledger::{
//!     BookingStatus, Currency, Engine, Money, PaymentStatus, PaymentUpdate, ServiceId,
//!     ServiceKind, ServiceRef, TripId, UserId,
//! };
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let inr = Currency::new("INR").unwrap();
//! let (user, trip) = (UserId::new(), TripId::new());
//!
//! // Each booking flow finds or opens the same draft
//! let parent = engine.get_or_create_parent_booking(user, trip, &inr).unwrap();
//!
//! let flight = ServiceRef::new(ServiceKind::Flight, ServiceId::new());
//! let price = Money::new(dec!(5000), inr.clone()).unwrap();
//! engine.link_service_to_booking(parent.id, flight, &price).unwrap();
//!
//! // Payment confirms the trip booking
//! let paid = PaymentUpdate::new(PaymentStatus::Paid, dec!(5000));
//! let booking = engine.apply_payment(parent.id, paid).unwrap();
//! assert_eq!(booking.status, BookingStatus::Confirmed);
//! assert_eq!(booking.pricing.total_amount, dec!(5000));
//! ```
//!
//! ## Thread Safety
//!
//! Apart from its journal the engine keeps no state outside the store.
//! Concurrent callers are coordinated by the store's atomic per-document
//! operations.

mod base;
pub mod booking;
mod engine;
pub mod error;
pub mod flow;
pub mod journal;
pub mod money;
pub mod reference;
pub mod service;
pub mod settings;
pub mod store;

pub use base::{BookingId, ServiceId, TravelerId, TripId, UserId};
pub use booking::{
    BookingChannel, BookingEvent, BookingStatus, BookingSummary, ParentBooking, PaymentStatus,
    PaymentSummary, PaymentUpdate, Traveler,
};
pub use engine::Engine;
pub use error::{BookingError, ErrorKind};
pub use flow::{BookedService, FlowError, book_service};
pub use journal::{Journal, JournalEntry};
pub use money::{Breakdown, Currency, Money, Pricing};
pub use service::{ServiceBooking, ServiceKind, ServiceRef, Services};
pub use settings::{CurrencyPolicy, EngineConfig};
pub use store::{BookingStore, MemoryStore, Mutation};
