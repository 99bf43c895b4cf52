//! Storage layer for resource booking.
//!
//! Provides persistence for events, resources, and allocations using `rusqlite`.
//!
//! # Thread Safety
//!
//! `rusqlite::Connection` is `Send` but not `Sync`, so [`Database`] keeps its
//! connection behind a `Mutex`. One `Database` can be shared across threads;
//! each call holds the connection for the duration of one statement or
//! transaction.
//!
//! # Concurrent Writers
//!
//! [`Database::insert_allocation`] runs its overlap check and insert inside a
//! `BEGIN IMMEDIATE` transaction, which takes the database write lock up
//! front. A second process allocating against the same file either waits up
//! to the configured busy timeout or fails with `SQLITE_BUSY`, surfaced as
//! [`StoreError::Busy`]. The default timeout is zero: never wait.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in `YYYY-MM-DDTHH:MM:SS` form (timezone-naive,
//! see [`bk_core::types::TIMESTAMP_FORMAT`]). The fixed width means:
//! - Lexicographic ordering matches chronological ordering
//! - Overlap and range filters can compare the columns directly
//! - `strftime('%s', ...)` can compute durations in SQL

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bk_core::types::{TIMESTAMP_FORMAT, format_timestamp};
use bk_core::{
    Allocation, Entity, Event, EventId, NewEvent, NewResource, Resource, ResourceHours,
    ResourceId, Store, StoreError,
};
use chrono::NaiveDateTime;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp in {column}: {value}")]
    TimestampParse {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },
    /// The resource is already allocated during an overlapping window.
    #[error("resource {resource_id} is already allocated during event {event_id}'s window")]
    Conflict {
        event_id: EventId,
        resource_id: ResourceId,
    },
}

impl DbError {
    /// Returns true if SQLite refused because another connection holds a lock.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Sqlite(err) => matches!(
                err.sqlite_error_code(),
                Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        if err.is_busy() {
            return Self::Busy;
        }
        match err {
            DbError::NotFound { entity, id } => Self::NotFound { entity, id },
            DbError::Conflict {
                event_id,
                resource_id,
            } => Self::Conflict {
                event_id,
                resource_id,
            },
            other => Self::backend(other),
        }
    }
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub events: i64,
    pub resources: i64,
    pub allocations: i64,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open. Lock
    /// contention fails immediately.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        Self::open_with_busy_timeout(path, Duration::ZERO)
    }

    /// Opens a database, waiting up to `busy_timeout` for locks held by
    /// other connections.
    pub fn open_with_busy_timeout(path: &Path, busy_timeout: Duration) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn();
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(
            "
            -- start_time/end_time: 'YYYY-MM-DDTHH:MM:SS', timezone-naive
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL CHECK (title <> ''),
                description TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                CHECK (start_time < end_time)
            );

            CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_time);

            -- type: free-text category
            CREATE TABLE IF NOT EXISTS resources (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL CHECK (name <> ''),
                type TEXT NOT NULL CHECK (type <> '')
            );

            CREATE TABLE IF NOT EXISTS event_resource_allocation (
                event_id INTEGER NOT NULL,
                resource_id INTEGER NOT NULL,
                PRIMARY KEY (event_id, resource_id),
                FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE,
                FOREIGN KEY (resource_id) REFERENCES resources(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_allocation_resource
                ON event_resource_allocation(resource_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts a validated event.
    pub fn insert_event(&self, event: &NewEvent) -> Result<Event, DbError> {
        let interval = event.interval();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO events (title, description, start_time, end_time) VALUES (?, ?, ?, ?)",
            params![
                event.title(),
                event.description(),
                format_timestamp(interval.start()),
                format_timestamp(interval.end()),
            ],
        )?;
        let id = EventId::new(conn.last_insert_rowid());
        tracing::debug!(%id, title = event.title(), "inserted event");
        Ok(Event {
            id,
            title: event.title().to_string(),
            description: event.description().map(String::from),
            start_time: interval.start(),
            end_time: interval.end(),
        })
    }

    /// Inserts a validated resource.
    pub fn insert_resource(&self, resource: &NewResource) -> Result<Resource, DbError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO resources (name, type) VALUES (?, ?)",
            params![resource.name(), resource.kind()],
        )?;
        let id = ResourceId::new(conn.last_insert_rowid());
        tracing::debug!(%id, name = resource.name(), "inserted resource");
        Ok(Resource {
            id,
            name: resource.name().to_string(),
            kind: resource.kind().to_string(),
        })
    }

    /// Looks up an event by ID.
    pub fn get_event(&self, id: EventId) -> Result<Event, DbError> {
        let row = self
            .conn()
            .query_row(
                "SELECT id, title, description, start_time, end_time FROM events WHERE id = ?",
                [id.get()],
                EventRow::from_row,
            )
            .optional()?;
        row.ok_or(DbError::NotFound {
            entity: Entity::Event,
            id: id.get(),
        })?
        .into_event()
    }

    /// Looks up a resource by ID.
    pub fn get_resource(&self, id: ResourceId) -> Result<Resource, DbError> {
        self.conn()
            .query_row(
                "SELECT id, name, type FROM resources WHERE id = ?",
                [id.get()],
                resource_from_row,
            )
            .optional()?
            .ok_or(DbError::NotFound {
                entity: Entity::Resource,
                id: id.get(),
            })
    }

    /// Lists all events ordered by ID.
    pub fn list_events(&self) -> Result<Vec<Event>, DbError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "
            SELECT id, title, description, start_time, end_time
            FROM events
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], EventRow::from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }

    /// Lists all resources ordered by ID.
    pub fn list_resources(&self) -> Result<Vec<Resource>, DbError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, type FROM resources ORDER BY id ASC")?;
        let rows = stmt.query_map([], resource_from_row)?;
        let mut resources = Vec::new();
        for row in rows {
            resources.push(row?);
        }
        Ok(resources)
    }

    /// Lists all allocations ordered by event then resource.
    pub fn list_allocations(&self) -> Result<Vec<Allocation>, DbError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "
            SELECT event_id, resource_id
            FROM event_resource_allocation
            ORDER BY event_id ASC, resource_id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Allocation {
                event_id: EventId::new(row.get(0)?),
                resource_id: ResourceId::new(row.get(1)?),
            })
        })?;
        let mut allocations = Vec::new();
        for row in rows {
            allocations.push(row?);
        }
        Ok(allocations)
    }

    /// Lists the events holding a resource, ordered by start time.
    pub fn allocations_for_resource(&self, resource_id: ResourceId) -> Result<Vec<Event>, DbError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "
            SELECT e.id, e.title, e.description, e.start_time, e.end_time
            FROM events e
            JOIN event_resource_allocation a ON a.event_id = e.id
            WHERE a.resource_id = ?
            ORDER BY e.start_time ASC, e.id ASC
            ",
        )?;
        let rows = stmt.query_map([resource_id.get()], EventRow::from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }

    /// Allocates a resource to an event if its window is free.
    ///
    /// The existence checks, the overlap check, and the insert share one
    /// immediate transaction, so no other writer can commit in between.
    pub fn insert_allocation(
        &self,
        event_id: EventId,
        resource_id: ResourceId,
    ) -> Result<Allocation, DbError> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (start, end): (String, String) = tx
            .query_row(
                "SELECT start_time, end_time FROM events WHERE id = ?",
                [event_id.get()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or(DbError::NotFound {
                entity: Entity::Event,
                id: event_id.get(),
            })?;

        let resource_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM resources WHERE id = ?)",
            [resource_id.get()],
            |row| row.get(0),
        )?;
        if !resource_exists {
            return Err(DbError::NotFound {
                entity: Entity::Resource,
                id: resource_id.get(),
            });
        }

        // Half-open overlap: touching endpoints are allowed.
        let overlapping: bool = tx.query_row(
            "
            SELECT EXISTS(
                SELECT 1
                FROM event_resource_allocation a
                JOIN events e ON e.id = a.event_id
                WHERE a.resource_id = ?1
                  AND e.start_time < ?3
                  AND e.end_time > ?2
            )
            ",
            params![resource_id.get(), start, end],
            |row| row.get(0),
        )?;
        if overlapping {
            return Err(DbError::Conflict {
                event_id,
                resource_id,
            });
        }

        tx.execute(
            "INSERT INTO event_resource_allocation (event_id, resource_id) VALUES (?, ?)",
            params![event_id.get(), resource_id.get()],
        )?;
        tx.commit()?;
        Ok(Allocation {
            event_id,
            resource_id,
        })
    }

    /// Whole hours allocated per resource for events starting within
    /// `[range_start, range_end]`, ordered by resource ID.
    ///
    /// Hours are truncated per event, then summed. Resources without a
    /// matching allocation are omitted.
    pub fn aggregate_hours_by_resource(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<Vec<ResourceHours>, DbError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "
            SELECT r.id, r.name,
                   SUM((CAST(strftime('%s', e.end_time) AS INTEGER)
                        - CAST(strftime('%s', e.start_time) AS INTEGER)) / 3600) AS hours
            FROM resources r
            JOIN event_resource_allocation a ON r.id = a.resource_id
            JOIN events e ON e.id = a.event_id
            WHERE e.start_time BETWEEN ? AND ?
            GROUP BY r.id, r.name
            ORDER BY r.id ASC
            ",
        )?;
        let rows = stmt.query_map(
            [format_timestamp(range_start), format_timestamp(range_end)],
            |row| {
                Ok(ResourceHours {
                    resource_id: ResourceId::new(row.get(0)?),
                    resource_name: row.get(1)?,
                    hours: row.get(2)?,
                })
            },
        )?;
        let mut report = Vec::new();
        for row in rows {
            report.push(row?);
        }
        Ok(report)
    }

    /// Counts rows in each table.
    pub fn counts(&self) -> Result<TableCounts, DbError> {
        let conn = self.conn();
        let count = |table: &str| -> Result<i64, DbError> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?)
        };
        Ok(TableCounts {
            events: count("events")?,
            resources: count("resources")?,
            allocations: count("event_resource_allocation")?,
        })
    }
}

impl Store for Database {
    fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        Ok(Self::insert_event(self, event)?)
    }

    fn insert_resource(&self, resource: &NewResource) -> Result<Resource, StoreError> {
        Ok(Self::insert_resource(self, resource)?)
    }

    fn get_event(&self, id: EventId) -> Result<Event, StoreError> {
        Ok(Self::get_event(self, id)?)
    }

    fn get_resource(&self, id: ResourceId) -> Result<Resource, StoreError> {
        Ok(Self::get_resource(self, id)?)
    }

    fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(Self::list_events(self)?)
    }

    fn list_resources(&self) -> Result<Vec<Resource>, StoreError> {
        Ok(Self::list_resources(self)?)
    }

    fn list_allocations(&self) -> Result<Vec<Allocation>, StoreError> {
        Ok(Self::list_allocations(self)?)
    }

    fn allocations_for_resource(&self, resource_id: ResourceId) -> Result<Vec<Event>, StoreError> {
        Ok(Self::allocations_for_resource(self, resource_id)?)
    }

    fn insert_allocation(
        &self,
        event_id: EventId,
        resource_id: ResourceId,
    ) -> Result<Allocation, StoreError> {
        Ok(Self::insert_allocation(self, event_id, resource_id)?)
    }

    fn aggregate_hours_by_resource(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<Vec<ResourceHours>, StoreError> {
        Ok(Self::aggregate_hours_by_resource(
            self,
            range_start,
            range_end,
        )?)
    }
}

/// Raw `events` row with timestamps still as text.
struct EventRow {
    id: i64,
    title: String,
    description: Option<String>,
    start_time: String,
    end_time: String,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
        })
    }

    fn into_event(self) -> Result<Event, DbError> {
        Ok(Event {
            id: EventId::new(self.id),
            title: self.title,
            description: self.description,
            start_time: parse_timestamp("start_time", self.start_time)?,
            end_time: parse_timestamp("end_time", self.end_time)?,
        })
    }
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: ResourceId::new(row.get(0)?),
        name: row.get(1)?,
        kind: row.get(2)?,
    })
}

fn parse_timestamp(column: &'static str, value: String) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT)
        .map_err(|source| DbError::TimestampParse {
            column,
            value,
            source,
        })
}
