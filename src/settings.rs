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

//! Engine configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! file, and `TRIP_LEDGER__*` environment variables.

use crate::money::Currency;
use serde::Deserialize;
use std::path::Path;

/// What to do when a service is priced in a different currency than its
/// parent booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyPolicy {
    /// Sum the amount as-is.
    Trust,
    /// Refuse the link with a validation error.
    #[default]
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub currency_policy: CurrencyPolicy,
    /// Currency for new parent bookings when the caller has none.
    pub default_currency: Currency,
    /// Prefix of parent booking references.
    pub reference_prefix: String,
    /// Fresh references tried before a collision is reported.
    pub reference_attempts: u32,
    /// Record applied changes in the engine journal. Only enable it when
    /// something drains the journal.
    pub journal: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency_policy: CurrencyPolicy::default(),
            default_currency: Currency::default(),
            reference_prefix: "BK".to_string(),
            reference_attempts: 3,
            journal: false,
        }
    }
}

impl EngineConfig {
    pub const ENV_PREFIX: &'static str = "TRIP_LEDGER";

    /// Loads configuration, layering the optional file and the environment
    /// over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        builder
            .add_source(::config::Environment::with_prefix(Self::ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}
