//! In-memory [`Store`] used by unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{Allocation, Event, NewEvent, NewResource, Resource, ResourceHours};
use crate::store::{Entity, Store, StoreError};
use crate::types::{EventId, ResourceId};

#[derive(Debug, Default)]
struct Tables {
    events: Vec<Event>,
    resources: Vec<Resource>,
    allocations: Vec<Allocation>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    busy: AtomicBool,
}

impl MemoryStore {
    /// Makes every following allocation insert fail with [`StoreError::Busy`].
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// Records an allocation without any overlap check.
    pub fn force_allocation(&self, event_id: EventId, resource_id: ResourceId) {
        self.tables().allocations.push(Allocation {
            event_id,
            resource_id,
        });
    }

    pub fn allocation_count(&self, resource_id: ResourceId) -> usize {
        self.tables()
            .allocations
            .iter()
            .filter(|a| a.resource_id == resource_id)
            .count()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_event(tables: &Tables, id: EventId) -> Result<Event, StoreError> {
    tables
        .events
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .ok_or(StoreError::NotFound {
            entity: Entity::Event,
            id: id.get(),
        })
}

fn events_for(tables: &Tables, resource_id: ResourceId) -> Vec<Event> {
    let mut events: Vec<Event> = tables
        .allocations
        .iter()
        .filter(|a| a.resource_id == resource_id)
        .filter_map(|a| tables.events.iter().find(|e| e.id == a.event_id).cloned())
        .collect();
    events.sort_by_key(|e| e.start_time);
    events
}

impl Store for MemoryStore {
    fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        let mut tables = self.tables();
        let id = EventId::new(i64::try_from(tables.events.len()).map_err(StoreError::backend)? + 1);
        let stored = Event {
            id,
            title: event.title().to_string(),
            description: event.description().map(String::from),
            start_time: event.interval().start(),
            end_time: event.interval().end(),
        };
        tables.events.push(stored.clone());
        Ok(stored)
    }

    fn insert_resource(&self, resource: &NewResource) -> Result<Resource, StoreError> {
        let mut tables = self.tables();
        let id = ResourceId::new(
            i64::try_from(tables.resources.len()).map_err(StoreError::backend)? + 1,
        );
        let stored = Resource {
            id,
            name: resource.name().to_string(),
            kind: resource.kind().to_string(),
        };
        tables.resources.push(stored.clone());
        Ok(stored)
    }

    fn get_event(&self, id: EventId) -> Result<Event, StoreError> {
        find_event(&self.tables(), id)
    }

    fn get_resource(&self, id: ResourceId) -> Result<Resource, StoreError> {
        self.tables()
            .resources
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: Entity::Resource,
                id: id.get(),
            })
    }

    fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.tables().events.clone())
    }

    fn list_resources(&self) -> Result<Vec<Resource>, StoreError> {
        Ok(self.tables().resources.clone())
    }

    fn list_allocations(&self) -> Result<Vec<Allocation>, StoreError> {
        let mut allocations = self.tables().allocations.clone();
        allocations.sort_by_key(|a| (a.event_id, a.resource_id));
        Ok(allocations)
    }

    fn allocations_for_resource(&self, resource_id: ResourceId) -> Result<Vec<Event>, StoreError> {
        Ok(events_for(&self.tables(), resource_id))
    }

    fn insert_allocation(
        &self,
        event_id: EventId,
        resource_id: ResourceId,
    ) -> Result<Allocation, StoreError> {
        if self.busy.load(Ordering::SeqCst) {
            return Err(StoreError::Busy);
        }
        let mut tables = self.tables();
        let event = find_event(&tables, event_id)?;
        if !tables.resources.iter().any(|r| r.id == resource_id) {
            return Err(StoreError::NotFound {
                entity: Entity::Resource,
                id: resource_id.get(),
            });
        }
        let clash = events_for(&tables, resource_id)
            .iter()
            .any(|held| event.start_time < held.end_time && event.end_time > held.start_time);
        if clash {
            return Err(StoreError::Conflict {
                event_id,
                resource_id,
            });
        }
        let allocation = Allocation {
            event_id,
            resource_id,
        };
        tables.allocations.push(allocation);
        Ok(allocation)
    }

    fn aggregate_hours_by_resource(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<Vec<ResourceHours>, StoreError> {
        let tables = self.tables();
        let mut rows: Vec<ResourceHours> = Vec::new();
        let mut resources = tables.resources.clone();
        resources.sort_by_key(|r| r.id);
        for resource in resources {
            let hours: Vec<i64> = events_for(&tables, resource.id)
                .iter()
                .filter(|e| e.start_time >= range_start && e.start_time <= range_end)
                .map(|e| e.interval().map_or(0, |w| w.whole_hours()))
                .collect();
            if !hours.is_empty() {
                rows.push(ResourceHours {
                    resource_id: resource.id,
                    resource_name: resource.name,
                    hours: hours.iter().sum(),
                });
            }
        }
        Ok(rows)
    }
}

/// 2025-03-10 at the given hour and minute.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap()
}

pub fn seed_event(store: &MemoryStore, title: &str, start: NaiveDateTime, end: NaiveDateTime) -> Event {
    store
        .insert_event(&NewEvent::new(title, None, start, end).unwrap())
        .unwrap()
}

pub fn seed_resource(store: &MemoryStore, name: &str) -> Resource {
    store
        .insert_resource(&NewResource::new(name, "equipment").unwrap())
        .unwrap()
}
