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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use trip_booking_ledger::{
    BookingError, BookingEvent, BookingId, Currency, Engine, EngineConfig, MemoryStore, Money,
    PaymentStatus, PaymentUpdate, ServiceKind, TripId, UserId, book_service,
};

/// Trip Booking Ledger - Replay booking flow CSV files
///
/// Reads booking flow events from a CSV file and outputs the consolidated
/// trip bookings to stdout. Logs go to stderr (`RUST_LOG` controls the level).
#[derive(Parser, Debug)]
#[command(name = "trip-booking-ledger")]
#[command(about = "Consolidates service bookings into trip bookings", long_about = None)]
struct Args {
    /// Path to CSV file with booking events
    ///
    /// Expected format: type,user,trip,service,amount,currency
    /// Example: cargo run -- events.csv > bookings.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Optional engine configuration file (TOML, JSON or YAML)
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trip_booking_ledger=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match EngineConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            error!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let engine = match process_events(BufReader::new(file), config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Error processing events: {}", e);
            process::exit(1);
        }
    };

    match engine.orphaned_services() {
        Ok(orphans) => info!(orphans = orphans.len(), "replay finished"),
        Err(e) => error!("Error listing orphaned services: {}", e),
    }

    let entries = engine.journal().drain();
    for entry in &entries {
        debug!(?entry, "journal");
    }
    info!(entries = entries.len(), "journal drained");

    if let Err(e) = write_bookings(&engine, std::io::stdout()) {
        error!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, user, trip, service, amount, currency`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    event_type: String,
    user: String,
    trip: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    service: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    currency: Option<String>,
}

/// Parsed row for one `(user, trip)` pair.
#[derive(Debug)]
enum Event {
    /// Runs the whole booking flow.
    Book { kind: ServiceKind, price: Money },
    /// Applies to the latest trip booking of the pair.
    Booking(BookingEvent),
}

impl CsvRecord {
    fn into_event(
        self,
        default_currency: &Currency,
    ) -> Result<(UserId, TripId, Event), BookingError> {
        let user: UserId = self.user.parse()?;
        let trip: TripId = self.trip.parse()?;
        let amount = self.amount.ok_or(BookingError::MissingAmount);

        let event = match self.event_type.to_lowercase().as_str() {
            "book" => {
                let kind: ServiceKind = self.service.as_deref().unwrap_or_default().parse()?;
                let currency = match self.currency.as_deref() {
                    Some(code) => code.parse()?,
                    None => default_currency.clone(),
                };
                Event::Book {
                    kind,
                    price: Money::new(amount?, currency)?,
                }
            }
            "checkout" => Event::Booking(BookingEvent::Checkout),
            "pay" => payment(PaymentUpdate::new(PaymentStatus::Paid, amount?)),
            "partial" => payment(PaymentUpdate::new(PaymentStatus::Partial, amount?)),
            "refund" => payment(PaymentUpdate::refund(amount?)),
            "confirm" => Event::Booking(BookingEvent::Confirm),
            "cancel" => Event::Booking(BookingEvent::Cancel { reason: None }),
            "complete" => Event::Booking(BookingEvent::Complete),
            other => {
                return Err(BookingError::InvalidId {
                    entity: "event type",
                    value: other.to_string(),
                });
            }
        };
        Ok((user, trip, event))
    }
}

fn payment(update: PaymentUpdate) -> Event {
    Event::Booking(BookingEvent::Payment(update))
}

/// Replays booking events from a CSV reader.
///
/// Each `book` row runs the full booking flow for its user and trip. The
/// other rows act on the most recent trip booking of that user and trip.
/// Malformed rows and rejected events are skipped and logged at debug level.
///
/// # CSV Format
///
/// Expected columns: `type, user, trip, service, amount, currency`
/// - `type`: book, checkout, pay, partial, refund, confirm, cancel, complete
/// - `user`, `trip`: UUIDs
/// - `service`: flight, hotel, cab or activity (book only)
/// - `amount`: price for book, amount paid or refunded for payments
/// - `currency`: optional, defaults to the configured currency
///
/// # Example
///
/// ```csv
/// type,user,trip,service,amount,currency
/// book,<user>,<trip>,flight,5000,INR
/// book,<user>,<trip>,hotel,8000,INR
/// pay,<user>,<trip>,,13000,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_events<R: Read>(
    reader: R,
    config: EngineConfig,
) -> Result<Engine<MemoryStore>, csv::Error> {
    let default_currency = config.default_currency.clone();
    let engine = Engine::with_store(MemoryStore::new(), config);
    let mut latest: HashMap<(UserId, TripId), BookingId> = HashMap::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping malformed row: {}", e);
                continue;
            }
        };

        let (user, trip, event) = match record.into_event(&default_currency) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Skipping invalid event: {}", e);
                continue;
            }
        };

        let outcome = match event {
            Event::Book { kind, price } => match book_service(&engine, user, trip, kind, price) {
                Ok(booked) => {
                    latest.insert((user, trip), booked.booking.id);
                    Ok(())
                }
                Err(e) => Err(e.booking_error().clone()),
            },
            Event::Booking(event) => match latest.get(&(user, trip)) {
                Some(&booking_id) => engine.transition(booking_id, event).map(drop),
                None => {
                    debug!(user_id = %user, trip_id = %trip, "Skipping event for unknown trip booking");
                    continue;
                }
            },
        };

        if let Err(e) = outcome {
            debug!(user_id = %user, trip_id = %trip, "Skipping event: {}", e);
        }
    }

    Ok(engine)
}

/// Write trip bookings to a CSV writer, oldest first.
///
/// # CSV Format
///
/// Columns: `reference, user, trip, status, payment_status, currency, total,
/// flights, hotels, cabs, activities, paid, refunded`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_bookings<W: Write>(
    engine: &Engine<MemoryStore>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let bookings = engine
        .bookings()
        .map_err(|e| csv::Error::from(std::io::Error::other(e)))?;
    for booking in &bookings {
        wtr.serialize(booking.summary())?;
    }

    wtr.flush()?;
    Ok(())
}
