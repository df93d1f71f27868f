//! Transformation pipelines
//!
//! Pure functions from input record sets to star-schema tables. Nothing in
//! here touches storage; the engine feeds these from a `RecordStore` and
//! hands the results back to it.
//!
//! # Overview
//!
//! - `build_catalog_tables` - songs and artists from catalog records
//! - `build_event_tables` - users, time and songplays from event logs
//!   joined against the full catalog
//! - `decompose_ts` - epoch millis to calendar attributes

mod catalog;
mod events;
mod join;
mod project;
mod time;

pub use catalog::{build_catalog_tables, CatalogTables};
pub use events::{build_event_tables, filter_plays, EventOptions, EventTables, PLAY_PAGE};
pub use join::inner_join_indices;
pub use project::{project, take_rows};
pub use time::{decompose_ts, CalendarParts};

#[cfg(test)]
mod tests;
