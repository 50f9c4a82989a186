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

//! Document store contract and a concurrent in-memory implementation.
//!
//! The engine never reads a document, edits it and writes it back. Every
//! mutation goes through one of two atomic primitives:
//!
//! - [`BookingStore::find_or_insert_draft`]: find the open draft for a
//!   `(user, trip)` pair or insert the given defaults, in one step.
//! - [`BookingStore::update`]: apply a conditional change to one document.
//!   If the change returns an error nothing is written.
//!
//! # Thread Safety
//!
//! [`MemoryStore`] keeps documents in [`DashMap`] shards, each behind its own
//! [`Mutex`], so writers to different bookings never wait on each other and
//! writers to the same booking are serialized. The draft and reference
//! indexes use the entry API for atomic check-and-insert.
//!
//! Lock order is index entry, then document. A document lock is always
//! released before an index entry is touched.

use crate::BookingError;
use crate::base::{BookingId, ServiceId, TripId, UserId};
use crate::booking::{BookingStatus, ParentBooking};
use crate::service::ServiceBooking;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

/// Conditional change applied to a single document.
pub type Mutation<'a, T> = &'a mut dyn FnMut(&mut T) -> Result<(), BookingError>;

/// Atomic single-document operations the aggregation engine relies on.
///
/// Implementations report connectivity failures as
/// [`BookingError::StoreUnavailable`].
pub trait BookingStore: Send + Sync {
    /// Returns the draft for `(draft.user_id, draft.trip_id)`, inserting
    /// `draft` if none exists. Concurrent callers for the same pair all
    /// observe the same document.
    ///
    /// # Errors
    ///
    /// [`BookingError::DuplicateReference`] if `draft.booking_reference` is
    /// taken by another booking.
    fn find_or_insert_draft(&self, draft: ParentBooking) -> Result<ParentBooking, BookingError>;

    /// Applies `mutation` to booking `id` atomically and returns the result.
    ///
    /// # Errors
    ///
    /// [`BookingError::BookingNotFound`] if `id` does not exist, or the
    /// mutation's own error.
    fn update(
        &self,
        id: BookingId,
        mutation: Mutation<'_, ParentBooking>,
    ) -> Result<ParentBooking, BookingError>;

    fn get(&self, id: BookingId) -> Result<Option<ParentBooking>, BookingError>;

    fn find_draft(&self, user: UserId, trip: TripId)
    -> Result<Option<ParentBooking>, BookingError>;

    fn list(&self) -> Result<Vec<ParentBooking>, BookingError>;

    /// # Errors
    ///
    /// [`BookingError::DuplicateReference`] if the service reference is taken.
    fn insert_service(&self, service: ServiceBooking) -> Result<ServiceBooking, BookingError>;

    fn update_service(
        &self,
        id: ServiceId,
        mutation: Mutation<'_, ServiceBooking>,
    ) -> Result<ServiceBooking, BookingError>;

    fn get_service(&self, id: ServiceId) -> Result<Option<ServiceBooking>, BookingError>;

    fn list_services(&self) -> Result<Vec<ServiceBooking>, BookingError>;
}

/// In-process store with per-document locking.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bookings: DashMap<BookingId, Mutex<ParentBooking>>,
    /// Open draft per `(user, trip)`.
    drafts: DashMap<(UserId, TripId), BookingId>,
    /// Unique index on `booking_reference`.
    references: DashMap<String, BookingId>,
    services: DashMap<ServiceId, Mutex<ServiceBooking>>,
    /// Unique index on service `reference`.
    service_references: DashMap<String, ServiceId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, id: BookingId) -> Option<ParentBooking> {
        self.bookings.get(&id).map(|doc| doc.lock().clone())
    }

    /// Claims the reference and stores the document.
    fn insert_booking(&self, booking: &ParentBooking) -> Result<(), BookingError> {
        match self.references.entry(booking.booking_reference.clone()) {
            Entry::Occupied(_) => Err(BookingError::DuplicateReference(
                booking.booking_reference.clone(),
            )),
            Entry::Vacant(entry) => {
                entry.insert(booking.id);
                self.bookings.insert(booking.id, Mutex::new(booking.clone()));
                Ok(())
            }
        }
    }
}

impl BookingStore for MemoryStore {
    fn find_or_insert_draft(&self, draft: ParentBooking) -> Result<ParentBooking, BookingError> {
        // The entry guard serializes every caller for this (user, trip) pair.
        match self.drafts.entry((draft.user_id, draft.trip_id)) {
            Entry::Occupied(mut entry) => {
                if let Some(existing) = self.snapshot(*entry.get()) {
                    if existing.status == BookingStatus::Draft {
                        return Ok(existing);
                    }
                }
                // The indexed booking has left draft; open a new one.
                self.insert_booking(&draft)?;
                entry.insert(draft.id);
                Ok(draft)
            }
            Entry::Vacant(entry) => {
                self.insert_booking(&draft)?;
                entry.insert(draft.id);
                Ok(draft)
            }
        }
    }

    fn update(
        &self,
        id: BookingId,
        mutation: Mutation<'_, ParentBooking>,
    ) -> Result<ParentBooking, BookingError> {
        let updated = {
            let doc = self
                .bookings
                .get(&id)
                .ok_or(BookingError::BookingNotFound(id))?;
            let mut current = doc.lock();
            let mut candidate = current.clone();
            mutation(&mut candidate)?;
            *current = candidate.clone();
            candidate
        };

        if updated.status != BookingStatus::Draft {
            self.drafts
                .remove_if(&(updated.user_id, updated.trip_id), |_, draft_id| {
                    *draft_id == id
                });
        }
        Ok(updated)
    }

    fn get(&self, id: BookingId) -> Result<Option<ParentBooking>, BookingError> {
        Ok(self.snapshot(id))
    }

    fn find_draft(
        &self,
        user: UserId,
        trip: TripId,
    ) -> Result<Option<ParentBooking>, BookingError> {
        let Some(id) = self.drafts.get(&(user, trip)).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self
            .snapshot(id)
            .filter(|booking| booking.status == BookingStatus::Draft))
    }

    fn list(&self) -> Result<Vec<ParentBooking>, BookingError> {
        Ok(self
            .bookings
            .iter()
            .map(|doc| doc.value().lock().clone())
            .collect())
    }

    fn insert_service(&self, service: ServiceBooking) -> Result<ServiceBooking, BookingError> {
        match self.service_references.entry(service.reference.clone()) {
            Entry::Occupied(_) => Err(BookingError::DuplicateReference(service.reference)),
            Entry::Vacant(entry) => {
                entry.insert(service.id);
                self.services
                    .insert(service.id, Mutex::new(service.clone()));
                Ok(service)
            }
        }
    }

    fn update_service(
        &self,
        id: ServiceId,
        mutation: Mutation<'_, ServiceBooking>,
    ) -> Result<ServiceBooking, BookingError> {
        let doc = self
            .services
            .get(&id)
            .ok_or(BookingError::ServiceNotFound(id))?;
        let mut current = doc.lock();
        let mut candidate = current.clone();
        mutation(&mut candidate)?;
        *current = candidate.clone();
        Ok(candidate)
    }

    fn get_service(&self, id: ServiceId) -> Result<Option<ServiceBooking>, BookingError> {
        Ok(self.services.get(&id).map(|doc| doc.lock().clone()))
    }

    fn list_services(&self) -> Result<Vec<ServiceBooking>, BookingError> {
        Ok(self
            .services
            .iter()
            .map(|doc| doc.value().lock().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};
    use crate::service::ServiceKind;
    use rust_decimal_macros::dec;

    fn draft_for(user: UserId, trip: TripId, reference: &str) -> ParentBooking {
        ParentBooking::draft(user, trip, reference.to_string(), Currency::default())
    }

    #[test]
    fn second_insert_returns_first_draft() {
        let store = MemoryStore::new();
        let (user, trip) = (UserId::new(), TripId::new());

        let first = store
            .find_or_insert_draft(draft_for(user, trip, "BK-1-AAAAAA"))
            .unwrap();
        let second = store
            .find_or_insert_draft(draft_for(user, trip, "BK-2-BBBBBB"))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.booking_reference, "BK-1-AAAAAA");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_reference_is_a_conflict() {
        let store = MemoryStore::new();
        store
            .find_or_insert_draft(draft_for(UserId::new(), TripId::new(), "BK-1-SAME00"))
            .unwrap();

        let result =
            store.find_or_insert_draft(draft_for(UserId::new(), TripId::new(), "BK-1-SAME00"));
        assert_eq!(
            result,
            Err(BookingError::DuplicateReference("BK-1-SAME00".to_string()))
        );
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let store = MemoryStore::new();
        let booking = store
            .find_or_insert_draft(draft_for(UserId::new(), TripId::new(), "BK-1-AAAAAA"))
            .unwrap();

        let result = store.update(booking.id, &mut |doc| {
            doc.special_requests = Some("late checkout".to_string());
            Err(BookingError::NegativeAmount)
        });

        assert_eq!(result, Err(BookingError::NegativeAmount));
        let stored = store.get(booking.id).unwrap().unwrap();
        assert_eq!(stored.special_requests, None);
    }

    #[test]
    fn update_unknown_booking_is_not_found() {
        let store = MemoryStore::new();
        let id = BookingId::new();
        let result = store.update(id, &mut |_| Ok(()));
        assert_eq!(result, Err(BookingError::BookingNotFound(id)));
    }

    #[test]
    fn leaving_draft_frees_the_pair() {
        let store = MemoryStore::new();
        let (user, trip) = (UserId::new(), TripId::new());
        let first = store
            .find_or_insert_draft(draft_for(user, trip, "BK-1-AAAAAA"))
            .unwrap();

        store
            .update(first.id, &mut |doc| {
                doc.status = BookingStatus::Cancelled;
                Ok(())
            })
            .unwrap();
        assert_eq!(store.find_draft(user, trip).unwrap(), None);

        let second = store
            .find_or_insert_draft(draft_for(user, trip, "BK-2-BBBBBB"))
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.find_draft(user, trip).unwrap().unwrap().id, second.id);
    }

    #[test]
    fn service_references_are_unique() {
        let store = MemoryStore::new();
        let price = Money::new(dec!(100), Currency::default()).unwrap();
        let first = ServiceBooking::new(ServiceKind::Cab, "CB-1-X".to_string(), price.clone(), None);
        let second = ServiceBooking::new(ServiceKind::Cab, "CB-1-X".to_string(), price, None);

        store.insert_service(first.clone()).unwrap();
        assert_eq!(
            store.insert_service(second),
            Err(BookingError::DuplicateReference("CB-1-X".to_string()))
        );
        assert_eq!(store.get_service(first.id).unwrap(), Some(first));
        assert_eq!(store.list_services().unwrap().len(), 1);
    }

    #[test]
    fn update_unknown_service_is_not_found() {
        let store = MemoryStore::new();
        let id = ServiceId::new();
        assert_eq!(
            store.update_service(id, &mut |_| Ok(())),
            Err(BookingError::ServiceNotFound(id))
        );
    }
}
