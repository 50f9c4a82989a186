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

//! Booking aggregation engine.
//!
//! The [`Engine`] consolidates independently created service bookings into a
//! single parent booking per user and trip, and drives the parent through its
//! payment lifecycle.
//!
//! # Operations
//!
//! - **Get or create**: return the open draft for a user and trip, creating it
//!   in the same store round trip if needed.
//! - **Link**: append a service reference and add its price to the totals.
//! - **Payment callbacks**: update the payment summary; a `paid` report
//!   confirms the booking.
//! - **Explicit transitions**: checkout, confirm, cancel, complete.
//!
//! # Thread Safety
//!
//! The engine holds no mutable state of its own. All coordination happens in
//! the [`BookingStore`] primitives, so any number of threads (or processes
//! sharing a store) may call it concurrently.
//!
//! Creating a service record and linking it are two separate writes. A crash
//! in between leaves an orphan, which [`Engine::orphaned_services`] reports.

use crate::base::{BookingId, ServiceId, TravelerId, TripId, UserId};
use crate::booking::{BookingChannel, BookingEvent, BookingStatus, ParentBooking, PaymentUpdate, Traveler};
use crate::journal::{Journal, JournalEntry};
use crate::money::{Currency, Money};
use crate::reference::{self, BOOKING_SUFFIX_LEN, SERVICE_SUFFIX_LEN};
use crate::service::{ServiceBooking, ServiceKind, ServiceRef};
use crate::settings::EngineConfig;
use crate::store::{BookingStore, MemoryStore};
use crate::BookingError;
use tracing::{debug, info, warn};

/// Booking aggregation engine over a [`BookingStore`].
///
/// # Invariants
///
/// - At most one draft exists per `(user, trip)` pair.
/// - `pricing.total_amount` always equals the sum of the breakdown.
/// - Linking a service never changes the booking status.
/// - `cancelled` and `completed` bookings never change status again.
pub struct Engine<S = MemoryStore> {
    store: S,
    config: EngineConfig,
    journal: Journal,
}

impl Engine<MemoryStore> {
    /// Creates an engine over an empty in-memory store with default settings.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), EngineConfig::default())
    }
}

impl Default for Engine<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BookingStore> Engine<S> {
    pub fn with_store(store: S, config: EngineConfig) -> Self {
        Engine {
            store,
            config,
            journal: Journal::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Changes recorded so far. Stays empty unless [`EngineConfig::journal`]
    /// is set.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn record(&self, entry: JournalEntry) {
        if self.config.journal {
            self.journal.record(entry);
        }
    }

    /// Returns the open draft for `(user, trip)`, creating it if none exists.
    ///
    /// Concurrent callers for the same pair receive the same booking. An
    /// existing draft is reused as-is, whatever it contains; `currency` only
    /// applies to a newly created draft.
    ///
    /// # Errors
    ///
    /// - [`BookingError::DuplicateReference`] - Every generated reference collided.
    /// - [`BookingError::StoreUnavailable`] - Store failure; safe to retry.
    pub fn get_or_create_parent_booking(
        &self,
        user: UserId,
        trip: TripId,
        currency: &Currency,
    ) -> Result<ParentBooking, BookingError> {
        let attempts = self.config.reference_attempts.max(1);
        let mut attempt = 1;
        loop {
            let candidate = ParentBooking::draft(
                user,
                trip,
                reference::generate(&self.config.reference_prefix, BOOKING_SUFFIX_LEN),
                currency.clone(),
            );
            let candidate_id = candidate.id;

            match self.store.find_or_insert_draft(candidate) {
                Ok(booking) => {
                    if booking.id == candidate_id {
                        info!(
                            booking_id = %booking.id,
                            reference = %booking.booking_reference,
                            user_id = %user,
                            trip_id = %trip,
                            currency = %currency,
                            "parent booking created"
                        );
                        self.record(JournalEntry::DraftOpened {
                            booking_id: booking.id,
                            reference: booking.booking_reference.clone(),
                            user_id: user,
                            trip_id: trip,
                        });
                    } else {
                        debug!(booking_id = %booking.id, user_id = %user, trip_id = %trip, "reusing draft booking");
                    }
                    return Ok(booking);
                }
                Err(BookingError::DuplicateReference(reference)) if attempt < attempts => {
                    warn!(%reference, attempt, "booking reference collision, regenerating");
                    attempt += 1;
                }
                Err(err) => {
                    warn!(user_id = %user, trip_id = %trip, error = %err, "get or create parent booking failed");
                    return Err(err);
                }
            }
        }
    }

    /// [`Engine::get_or_create_parent_booking`] in the configured default currency.
    pub fn get_or_create_default(
        &self,
        user: UserId,
        trip: TripId,
    ) -> Result<ParentBooking, BookingError> {
        let currency = self.config.default_currency.clone();
        self.get_or_create_parent_booking(user, trip, &currency)
    }

    /// Appends `service` to the booking and adds `price` to both the total and
    /// the service's breakdown category, in one atomic update.
    ///
    /// Not idempotent: calling twice counts the price twice. After an
    /// ambiguous [`BookingError::StoreUnavailable`], check
    /// [`crate::Services::contains`] on the booking before retrying.
    ///
    /// # Errors
    ///
    /// - [`BookingError::BookingNotFound`] - `parent` does not exist.
    /// - [`BookingError::InvalidTransition`] - `parent` is no longer a draft.
    /// - [`BookingError::CurrencyMismatch`] - Currencies differ under
    ///   [`crate::CurrencyPolicy::Reject`].
    pub fn link_service_to_booking(
        &self,
        parent: BookingId,
        service: ServiceRef,
        price: &Money,
    ) -> Result<ParentBooking, BookingError> {
        let policy = self.config.currency_policy;
        let result = self
            .store
            .update(parent, &mut |booking| booking.link_service(service, price, policy));

        match result {
            Ok(booking) => {
                info!(
                    booking_id = %parent,
                    service_kind = %service.kind,
                    service_id = %service.id,
                    price = %price,
                    new_total = %booking.pricing.total_amount,
                    "service linked to booking"
                );
                self.record(JournalEntry::ServiceLinked {
                    booking_id: parent,
                    service,
                    amount: price.amount(),
                    total: booking.pricing.total_amount,
                });
                Ok(booking)
            }
            Err(err) => {
                warn!(
                    booking_id = %parent,
                    service_kind = %service.kind,
                    service_id = %service.id,
                    error = %err,
                    "linking service to booking failed"
                );
                Err(err)
            }
        }
    }

    /// Runs a state machine event against a booking.
    ///
    /// | Event | From | To |
    /// |-------|------|----|
    /// | Checkout | draft | pending |
    /// | Payment `paid` | draft, pending | confirmed |
    /// | Payment `partial`/`refunded`/`pending` | any non-terminal | unchanged |
    /// | Confirm | pending | confirmed |
    /// | Cancel | draft, pending, confirmed | cancelled |
    /// | Complete | confirmed | completed |
    ///
    /// # Errors
    ///
    /// - [`BookingError::BookingNotFound`] - Unknown booking.
    /// - [`BookingError::InvalidTransition`] - Event not allowed from the
    ///   current status; the booking is left untouched.
    pub fn transition(
        &self,
        id: BookingId,
        event: BookingEvent,
    ) -> Result<ParentBooking, BookingError> {
        let payment = match &event {
            BookingEvent::Payment(update) => Some(update.payment_status),
            _ => None,
        };
        let mut from = BookingStatus::Draft;
        let result = self.store.update(id, &mut |booking| {
            from = booking.status;
            booking.apply(event.clone())
        });

        let booking = match result {
            Ok(booking) => booking,
            Err(err) => {
                warn!(booking_id = %id, ?event, error = %err, "booking transition rejected");
                return Err(err);
            }
        };

        if let Some(payment_status) = payment {
            info!(
                booking_id = %id,
                %payment_status,
                total_paid = %booking.payment_summary.total_paid,
                "payment recorded"
            );
            self.record(JournalEntry::PaymentRecorded {
                booking_id: id,
                payment_status,
                total_paid: booking.payment_summary.total_paid,
            });
        }
        if booking.status != from {
            info!(booking_id = %id, %from, to = %booking.status, "booking status changed");
            self.record(JournalEntry::StatusChanged {
                booking_id: id,
                from,
                to: booking.status,
            });
        }
        Ok(booking)
    }

    /// Payment collaborator callback.
    pub fn apply_payment(
        &self,
        id: BookingId,
        update: PaymentUpdate,
    ) -> Result<ParentBooking, BookingError> {
        self.transition(id, BookingEvent::Payment(update))
    }

    pub fn checkout(&self, id: BookingId) -> Result<ParentBooking, BookingError> {
        self.transition(id, BookingEvent::Checkout)
    }

    /// Manual confirmation of a pending booking.
    pub fn confirm(&self, id: BookingId) -> Result<ParentBooking, BookingError> {
        self.transition(id, BookingEvent::Confirm)
    }

    pub fn cancel(
        &self,
        id: BookingId,
        reason: Option<String>,
    ) -> Result<ParentBooking, BookingError> {
        self.transition(id, BookingEvent::Cancel { reason })
    }

    pub fn complete(&self, id: BookingId) -> Result<ParentBooking, BookingError> {
        self.transition(id, BookingEvent::Complete)
    }

    pub fn add_traveler(
        &self,
        id: BookingId,
        traveler_id: TravelerId,
        is_lead: bool,
    ) -> Result<ParentBooking, BookingError> {
        let traveler = Traveler {
            traveler_id,
            is_lead,
        };
        self.store
            .update(id, &mut |booking| booking.add_traveler(traveler))
            .inspect(|_| info!(booking_id = %id, traveler_id = %traveler_id, is_lead, "traveler added"))
            .inspect_err(|err| {
                warn!(booking_id = %id, traveler_id = %traveler_id, error = %err, "adding traveler failed");
            })
    }

    pub fn set_special_requests(
        &self,
        id: BookingId,
        requests: Option<String>,
    ) -> Result<ParentBooking, BookingError> {
        self.store
            .update(id, &mut |booking| booking.set_special_requests(requests.clone()))
            .inspect(|_| info!(booking_id = %id, "special requests updated"))
            .inspect_err(|err| {
                warn!(booking_id = %id, error = %err, "updating special requests failed");
            })
    }

    pub fn set_channel(
        &self,
        id: BookingId,
        channel: BookingChannel,
    ) -> Result<ParentBooking, BookingError> {
        self.store
            .update(id, &mut |booking| booking.set_channel(channel))
            .inspect(|_| info!(booking_id = %id, ?channel, "booking channel updated"))
            .inspect_err(|err| {
                warn!(booking_id = %id, ?channel, error = %err, "updating booking channel failed");
            })
    }

    /// # Errors
    ///
    /// [`BookingError::BookingNotFound`] if `id` does not exist.
    pub fn get_booking(&self, id: BookingId) -> Result<ParentBooking, BookingError> {
        debug!(booking_id = %id, "fetching booking");
        self.store.get(id)?.ok_or(BookingError::BookingNotFound(id))
    }

    pub fn find_draft(
        &self,
        user: UserId,
        trip: TripId,
    ) -> Result<Option<ParentBooking>, BookingError> {
        self.store.find_draft(user, trip)
    }

    /// Every parent booking, oldest first.
    pub fn bookings(&self) -> Result<Vec<ParentBooking>, BookingError> {
        let mut bookings = self.store.list()?;
        bookings.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.booking_reference.cmp(&b.booking_reference))
        });
        Ok(bookings)
    }

    /// Persists a new service record with a kind-prefixed reference.
    ///
    /// `parent` may be given when the parent booking already exists; the
    /// record is still not counted until it is linked.
    pub fn create_service_booking(
        &self,
        kind: ServiceKind,
        price: Money,
        parent: Option<BookingId>,
    ) -> Result<ServiceBooking, BookingError> {
        let attempts = self.config.reference_attempts.max(1);
        let mut attempt = 1;
        loop {
            let reference = reference::generate(kind.reference_prefix(), SERVICE_SUFFIX_LEN);
            let candidate = ServiceBooking::new(kind, reference, price.clone(), parent);

            match self.store.insert_service(candidate) {
                Ok(service) => {
                    info!(
                        service_id = %service.id,
                        %kind,
                        reference = %service.reference,
                        price = %service.price,
                        "service booking created"
                    );
                    self.record(JournalEntry::ServiceCreated {
                        service_id: service.id,
                        kind,
                        reference: service.reference.clone(),
                    });
                    return Ok(service);
                }
                Err(BookingError::DuplicateReference(reference)) if attempt < attempts => {
                    warn!(%reference, attempt, "service reference collision, regenerating");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Sets the service record's back-reference to its parent.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ServiceNotFound`] - Unknown service.
    /// - [`BookingError::ServiceAlreadyLinked`] - Record belongs to another parent.
    pub fn attach_parent(
        &self,
        service: ServiceId,
        parent: BookingId,
    ) -> Result<ServiceBooking, BookingError> {
        self.store
            .update_service(service, &mut |record| record.attach_parent(parent))
            .inspect(|_| info!(service_id = %service, booking_id = %parent, "service attached to parent"))
            .inspect_err(|err| {
                warn!(service_id = %service, booking_id = %parent, error = %err, "attaching service to parent failed");
            })
    }

    /// Records supplier-side status of a service record.
    pub fn set_service_status(
        &self,
        service: ServiceId,
        status: BookingStatus,
    ) -> Result<ServiceBooking, BookingError> {
        self.store
            .update_service(service, &mut |record| record.set_status(status))
            .inspect(|_| info!(service_id = %service, %status, "service status changed"))
            .inspect_err(|err| {
                warn!(service_id = %service, %status, error = %err, "service status change rejected");
            })
    }

    /// # Errors
    ///
    /// [`BookingError::ServiceNotFound`] if `id` does not exist.
    pub fn get_service(&self, id: ServiceId) -> Result<ServiceBooking, BookingError> {
        self.store
            .get_service(id)?
            .ok_or(BookingError::ServiceNotFound(id))
    }

    /// Service records not counted in any parent booking.
    ///
    /// A record is orphaned when it has no parent, its parent does not exist,
    /// or its parent does not list it. This is input for an external
    /// reconciliation sweep; nothing is repaired here.
    pub fn orphaned_services(&self) -> Result<Vec<ServiceBooking>, BookingError> {
        let mut orphans = Vec::new();
        for service in self.store.list_services()? {
            let linked = match service.parent_booking_id {
                Some(parent) => self
                    .store
                    .get(parent)?
                    .is_some_and(|booking| booking.services.contains(service.service_ref())),
                None => false,
            };
            if !linked {
                warn!(
                    service_id = %service.id,
                    kind = %service.kind,
                    reference = %service.reference,
                    "orphaned service booking"
                );
                orphans.push(service);
            }
        }
        orphans.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(orphans)
    }
}
