//! Record and table schemas
//!
//! Fixed Arrow schemas for the two JSON inputs and the column layout of
//! every star-schema table the job writes.
//!
//! # Tables
//!
//! - `songs` - song dimension, partitioned by year and artist
//! - `artists` - artist dimension
//! - `users` - user dimension
//! - `time` - calendar decomposition of play timestamps, partitioned by year and month
//! - `songplays` - play fact table, partitioned by year and month

pub mod col;
mod types;

pub use types::{
    catalog_schema, event_schema, TableSpec, ALL_TABLES, ARTISTS, SONGPLAYS, SONGS, TIME, USERS,
};
