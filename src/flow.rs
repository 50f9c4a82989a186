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

//! The create-then-link sequence every service booking flow runs.
//!
//! 1. Get or create the parent draft for the user and trip.
//! 2. Persist the service record, already pointing at the parent. A price the
//!    parent would refuse under [`CurrencyPolicy::Reject`] stops here, before
//!    anything is written.
//! 3. Link the record into the parent's services and totals.
//!
//! Steps 2 and 3 are separate writes. When step 3 fails the record exists but
//! is not counted; the error carries its id so the caller can clean up or
//! retry.

use crate::base::{ServiceId, TripId, UserId};
use crate::booking::ParentBooking;
use crate::engine::Engine;
use crate::money::Money;
use crate::service::{ServiceBooking, ServiceKind};
use crate::settings::CurrencyPolicy;
use crate::store::BookingStore;
use crate::BookingError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Failed before anything was written for this service
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// Service record exists but its price is not in the parent totals
    #[error("service booking {service_id} was created but not linked: {source}")]
    Unlinked {
        service_id: ServiceId,
        #[source]
        source: BookingError,
    },
}

impl FlowError {
    /// The error reported by the failing step.
    pub fn booking_error(&self) -> &BookingError {
        match self {
            Self::Booking(err) | Self::Unlinked { source: err, .. } => err,
        }
    }
}

/// Result of a completed flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedService {
    pub booking: ParentBooking,
    pub service: ServiceBooking,
}

/// Books one service for a user's trip and consolidates it into the trip
/// booking. The parent draft is opened in the price's currency.
pub fn book_service<S: BookingStore>(
    engine: &Engine<S>,
    user: UserId,
    trip: TripId,
    kind: ServiceKind,
    price: Money,
) -> Result<BookedService, FlowError> {
    let parent = engine.get_or_create_parent_booking(user, trip, price.currency())?;
    if engine.config().currency_policy == CurrencyPolicy::Reject
        && price.currency() != &parent.pricing.currency
    {
        return Err(BookingError::CurrencyMismatch {
            expected: parent.pricing.currency.to_string(),
            actual: price.currency().to_string(),
        }
        .into());
    }
    let service = engine.create_service_booking(kind, price, Some(parent.id))?;

    match engine.link_service_to_booking(parent.id, service.service_ref(), &service.price) {
        Ok(booking) => Ok(BookedService { booking, service }),
        Err(source) => Err(FlowError::Unlinked {
            service_id: service.id,
            source,
        }),
    }
}
