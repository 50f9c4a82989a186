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

//! Individual service bookings and typed references to them.
//!
//! A [`ServiceBooking`] is created by its own booking flow and persisted on
//! its own. The parent booking only stores [`ServiceId`]s grouped by
//! [`ServiceKind`]; the service record optionally points back at the parent.

use crate::BookingError;
use crate::base::{BookingId, ServiceId};
use crate::booking::BookingStatus;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four kinds of service a trip booking aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Flight,
    Hotel,
    Cab,
    Activity,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [Self::Flight, Self::Hotel, Self::Cab, Self::Activity];

    /// Prefix used for the human-facing reference of a service record.
    pub fn reference_prefix(self) -> &'static str {
        match self {
            Self::Flight => "FL",
            Self::Hotel => "HB",
            Self::Cab => "CB",
            Self::Activity => "AC",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Flight => "flight",
            Self::Hotel => "hotel",
            Self::Cab => "cab",
            Self::Activity => "activity",
        };
        f.write_str(name)
    }
}

/// Accepts both singular and plural names, case-insensitively.
impl FromStr for ServiceKind {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flight" | "flights" => Ok(Self::Flight),
            "hotel" | "hotels" => Ok(Self::Hotel),
            "cab" | "cabs" => Ok(Self::Cab),
            "activity" | "activities" => Ok(Self::Activity),
            _ => Err(BookingError::InvalidId {
                entity: "service kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Typed reference to a service record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRef {
    pub kind: ServiceKind,
    pub id: ServiceId,
}

impl ServiceRef {
    pub fn new(kind: ServiceKind, id: ServiceId) -> Self {
        Self { kind, id }
    }
}

/// Service ids linked to a parent booking, one list per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Services {
    pub flights: Vec<ServiceId>,
    pub hotels: Vec<ServiceId>,
    pub cabs: Vec<ServiceId>,
    pub activities: Vec<ServiceId>,
}

impl Services {
    pub fn get(&self, kind: ServiceKind) -> &[ServiceId] {
        match kind {
            ServiceKind::Flight => &self.flights,
            ServiceKind::Hotel => &self.hotels,
            ServiceKind::Cab => &self.cabs,
            ServiceKind::Activity => &self.activities,
        }
    }

    pub(crate) fn push(&mut self, service: ServiceRef) {
        let list = match service.kind {
            ServiceKind::Flight => &mut self.flights,
            ServiceKind::Hotel => &mut self.hotels,
            ServiceKind::Cab => &mut self.cabs,
            ServiceKind::Activity => &mut self.activities,
        };
        list.push(service.id);
    }

    pub fn contains(&self, service: ServiceRef) -> bool {
        self.get(service.kind).contains(&service.id)
    }

    pub fn len(&self) -> usize {
        ServiceKind::ALL.iter().map(|kind| self.get(*kind).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single flight, hotel, cab or activity reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBooking {
    pub id: ServiceId,
    pub kind: ServiceKind,
    /// Unset until the record is attached to a parent booking.
    pub parent_booking_id: Option<BookingId>,
    pub reference: String,
    pub price: Money,
    /// Supplier-side status, independent of the parent status.
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl ServiceBooking {
    pub fn new(
        kind: ServiceKind,
        reference: String,
        price: Money,
        parent_booking_id: Option<BookingId>,
    ) -> Self {
        Self {
            id: ServiceId::new(),
            kind,
            parent_booking_id,
            reference,
            price,
            status: BookingStatus::Draft,
            created_at: Utc::now(),
        }
    }

    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef::new(self.kind, self.id)
    }

    /// Sets the back-reference to the parent booking.
    ///
    /// Re-attaching to the same parent is a no-op.
    pub(crate) fn attach_parent(&mut self, parent: BookingId) -> Result<(), BookingError> {
        match self.parent_booking_id {
            Some(existing) if existing != parent => Err(BookingError::ServiceAlreadyLinked {
                service_id: self.id,
                booking_id: existing,
            }),
            _ => {
                self.parent_booking_id = Some(parent);
                Ok(())
            }
        }
    }

    /// Records supplier-side progress. Terminal records cannot move again.
    pub(crate) fn set_status(&mut self, status: BookingStatus) -> Result<(), BookingError> {
        if self.status.is_terminal() && status != self.status {
            return Err(BookingError::InvalidTransition {
                from: self.status,
                action: "update the status of",
            });
        }
        self.status = status;
        Ok(())
    }
}
