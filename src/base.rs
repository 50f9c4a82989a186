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

//! Core identifier types for users, trips, bookings, services and travelers.
//!
//! All identifiers are opaque UUIDs. Parsing from text is the only place an
//! identifier can be malformed; it fails with [`BookingError::InvalidId`].

use crate::BookingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = BookingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| BookingError::InvalidId {
                        entity: $entity,
                        value: s.to_string(),
                    })
            }
        }
    };
}

opaque_id!(
    /// Identifier of the user owning a trip. Owned outside this crate.
    UserId,
    "user"
);

opaque_id!(
    /// Identifier of a trip. Owned outside this crate.
    TripId,
    "trip"
);

opaque_id!(
    /// Identifier of a parent trip booking, assigned at creation.
    BookingId,
    "booking"
);

opaque_id!(
    /// Identifier of a single flight, hotel, cab or activity booking.
    ServiceId,
    "service"
);

opaque_id!(
    /// Identifier of a traveler attached to a booking.
    TravelerId,
    "traveler"
);
