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

//! Thread-safe journal of applied booking changes.
//!
//! Downstream collaborators (notifications, the orphan sweep) drain it to
//! learn what the engine did. Only successful changes are recorded.

use crate::base::{BookingId, ServiceId, TripId, UserId};
use crate::booking::{BookingStatus, PaymentStatus};
use crate::service::{ServiceKind, ServiceRef};
use crossbeam::queue::SegQueue;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEntry {
    DraftOpened {
        booking_id: BookingId,
        reference: String,
        user_id: UserId,
        trip_id: TripId,
    },
    ServiceCreated {
        service_id: ServiceId,
        kind: ServiceKind,
        reference: String,
    },
    ServiceLinked {
        booking_id: BookingId,
        service: ServiceRef,
        amount: Decimal,
        total: Decimal,
    },
    StatusChanged {
        booking_id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },
    PaymentRecorded {
        booking_id: BookingId,
        payment_status: PaymentStatus,
        total_paid: Decimal,
    },
}

/// A lock-free FIFO of [`JournalEntry`] values.
#[derive(Debug, Default)]
pub struct Journal {
    entries: SegQueue<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self {
            entries: SegQueue::new(),
        }
    }

    pub fn record(&self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Removes and returns everything recorded so far, oldest first.
    pub fn drain(&self) -> Vec<JournalEntry> {
        std::iter::from_fn(|| self.entries.pop()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
