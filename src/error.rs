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

//! Error types for booking aggregation.

use crate::base::{BookingId, ServiceId};
use crate::booking::BookingStatus;
use thiserror::Error;

/// Coarse classification callers use to decide what to do with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed identifiers, currencies or amounts.
    Validation,
    /// A booking or service id does not resolve.
    NotFound,
    /// A uniqueness constraint was hit.
    Conflict,
    /// The state machine rejected the event.
    InvalidTransition,
    /// The store could not be reached; the operation may be retried.
    Transient,
}

/// Booking aggregation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Identifier text could not be converted
    #[error("invalid {entity} identifier: {value:?}")]
    InvalidId { entity: &'static str, value: String },

    /// Currency code is not three ASCII letters
    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Amount field is missing
    #[error("missing amount")]
    MissingAmount,

    /// Amount is negative
    #[error("invalid amount (must not be negative)")]
    NegativeAmount,

    /// Service price currency differs from the booking currency
    #[error("currency mismatch: booking is priced in {expected}, service in {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// Parent booking does not exist
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    /// Service booking does not exist
    #[error("service booking {0} not found")]
    ServiceNotFound(ServiceId),

    /// Generated reference collided with an existing one
    #[error("reference {0} already exists")]
    DuplicateReference(String),

    /// Service booking already belongs to another parent
    #[error("service booking {service_id} is already linked to booking {booking_id}")]
    ServiceAlreadyLinked {
        service_id: ServiceId,
        booking_id: BookingId,
    },

    /// Event is not allowed from the current status
    #[error("cannot {action} a booking in {from} state")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },

    /// Backing store failed or timed out
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId { .. }
            | Self::InvalidCurrency(_)
            | Self::MissingAmount
            | Self::NegativeAmount
            | Self::CurrencyMismatch { .. } => ErrorKind::Validation,
            Self::BookingNotFound(_) | Self::ServiceNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateReference(_) | Self::ServiceAlreadyLinked { .. } => {
                ErrorKind::Conflict
            }
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::StoreUnavailable(_) => ErrorKind::Transient,
        }
    }

    /// Whether repeating the whole operation can succeed.
    ///
    /// A transient failure of a service link is ambiguous: the increment may
    /// already have been applied. Callers must check the booking before
    /// retrying a link.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::DuplicateReference(_))
    }
}
