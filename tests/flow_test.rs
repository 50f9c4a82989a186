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


//! Create-then-link flow tests, including a store that fails mid-flow.

use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use trip_booking_ledger::{
    BookingError, BookingId, BookingStatus, BookingStore, Currency, CurrencyPolicy, Engine,
    EngineConfig, ErrorKind, FlowError, MemoryStore, Money, Mutation, ParentBooking,
    ServiceBooking, ServiceId, ServiceKind, TripId, UserId, book_service,
};

/// Delegates to [`MemoryStore`] but can refuse booking updates.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_updates: AtomicBool,
}

impl FlakyStore {
    fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

impl BookingStore for FlakyStore {
    fn find_or_insert_draft(&self, draft: ParentBooking) -> Result<ParentBooking, BookingError> {
        self.inner.find_or_insert_draft(draft)
    }

    fn update(
        &self,
        id: BookingId,
        mutation: Mutation<'_, ParentBooking>,
    ) -> Result<ParentBooking, BookingError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(BookingError::StoreUnavailable("write timed out".to_string()));
        }
        self.inner.update(id, mutation)
    }

    fn get(&self, id: BookingId) -> Result<Option<ParentBooking>, BookingError> {
        self.inner.get(id)
    }

    fn find_draft(
        &self,
        user: UserId,
        trip: TripId,
    ) -> Result<Option<ParentBooking>, BookingError> {
        self.inner.find_draft(user, trip)
    }

    fn list(&self) -> Result<Vec<ParentBooking>, BookingError> {
        self.inner.list()
    }

    fn insert_service(&self, service: ServiceBooking) -> Result<ServiceBooking, BookingError> {
        self.inner.insert_service(service)
    }

    fn update_service(
        &self,
        id: ServiceId,
        mutation: Mutation<'_, ServiceBooking>,
    ) -> Result<ServiceBooking, BookingError> {
        self.inner.update_service(id, mutation)
    }

    fn get_service(&self, id: ServiceId) -> Result<Option<ServiceBooking>, BookingError> {
        self.inner.get_service(id)
    }

    fn list_services(&self) -> Result<Vec<ServiceBooking>, BookingError> {
        self.inner.list_services()
    }
}

fn inr(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, Currency::new("INR").unwrap()).unwrap()
}

#[test]
fn flows_for_same_trip_share_one_parent() {
    let engine = Engine::new();
    let (user, trip) = (UserId::new(), TripId::new());

    let flight = book_service(&engine, user, trip, ServiceKind::Flight, inr(dec!(5000))).unwrap();
    let hotel = book_service(&engine, user, trip, ServiceKind::Hotel, inr(dec!(8000))).unwrap();

    assert_eq!(flight.booking.id, hotel.booking.id);
    assert_eq!(hotel.booking.pricing.total_amount, dec!(13000));
    assert_eq!(hotel.service.parent_booking_id, Some(hotel.booking.id));
    assert!(hotel.booking.services.contains(flight.service.service_ref()));
    assert!(engine.orphaned_services().unwrap().is_empty());
}

#[test]
fn flow_opens_parent_in_price_currency() {
    let engine = Engine::new();
    let dollars = Money::new(dec!(90), Currency::new("USD").unwrap()).unwrap();

    let booked = book_service(
        &engine,
        UserId::new(),
        TripId::new(),
        ServiceKind::Activity,
        dollars,
    )
    .unwrap();

    assert_eq!(booked.booking.pricing.currency.as_str(), "USD");
    assert_eq!(booked.booking.pricing.breakdown.activities, dec!(90));
}

#[test]
fn failed_link_leaves_orphan_with_its_id() {
    let engine = Engine::with_store(FlakyStore::default(), EngineConfig::default());
    let (user, trip) = (UserId::new(), TripId::new());
    engine.store().fail_updates(true);

    let err = book_service(&engine, user, trip, ServiceKind::Cab, inr(dec!(300))).unwrap_err();

    let FlowError::Unlinked { service_id, source } = &err else {
        panic!("expected unlinked service, got {err:?}");
    };
    assert_eq!(source.kind(), ErrorKind::Transient);
    assert!(err.booking_error().is_retryable());

    let orphans = engine.orphaned_services().unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, *service_id);

    let parent = engine.find_draft(user, trip).unwrap().unwrap();
    assert_eq!(parent.pricing.total_amount, dec!(0));
    assert_eq!(orphans[0].parent_booking_id, Some(parent.id));

    // Relinking once the store recovers clears the orphan.
    engine.store().fail_updates(false);
    let booking = engine
        .link_service_to_booking(parent.id, orphans[0].service_ref(), &orphans[0].price)
        .unwrap();
    assert_eq!(booking.pricing.total_amount, dec!(300));
    assert!(engine.orphaned_services().unwrap().is_empty());
}

#[test]
fn rejected_currency_writes_no_service_record() {
    let engine = Engine::new();
    let (user, trip) = (UserId::new(), TripId::new());
    book_service(&engine, user, trip, ServiceKind::Flight, inr(dec!(5000))).unwrap();

    let dollars = Money::new(dec!(120), Currency::new("USD").unwrap()).unwrap();
    let err = book_service(&engine, user, trip, ServiceKind::Hotel, dollars).unwrap_err();

    assert_eq!(
        err,
        FlowError::Booking(BookingError::CurrencyMismatch {
            expected: "INR".to_string(),
            actual: "USD".to_string(),
        })
    );
    assert!(engine.orphaned_services().unwrap().is_empty());
    assert_eq!(engine.store().list_services().unwrap().len(), 1);
}

#[test]
fn trusted_foreign_currency_is_linked() {
    let config = EngineConfig {
        currency_policy: CurrencyPolicy::Trust,
        ..EngineConfig::default()
    };
    let engine = Engine::with_store(MemoryStore::new(), config);
    let (user, trip) = (UserId::new(), TripId::new());
    book_service(&engine, user, trip, ServiceKind::Flight, inr(dec!(5000))).unwrap();

    let dollars = Money::new(dec!(120), Currency::new("USD").unwrap()).unwrap();
    let booked = book_service(&engine, user, trip, ServiceKind::Hotel, dollars).unwrap();

    assert_eq!(booked.booking.pricing.currency.as_str(), "INR");
    assert_eq!(booked.booking.pricing.total_amount, dec!(5120));
}

#[test]
fn flow_after_confirmation_starts_new_parent() {
    let engine = Engine::new();
    let (user, trip) = (UserId::new(), TripId::new());
    let first = book_service(&engine, user, trip, ServiceKind::Flight, inr(dec!(10))).unwrap();
    engine.checkout(first.booking.id).unwrap();
    engine.confirm(first.booking.id).unwrap();

    let second = book_service(&engine, user, trip, ServiceKind::Cab, inr(dec!(4))).unwrap();

    assert_ne!(first.booking.id, second.booking.id);
    assert_eq!(second.booking.status, BookingStatus::Draft);
    assert_eq!(second.booking.pricing.total_amount, dec!(4));
}
