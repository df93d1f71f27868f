//! Catalog pipeline: songs and artists dimensions

use super::project::project;
use crate::error::Result;
use crate::schema::{ARTISTS, SONGS};
use crate::types::RecordSet;
use tracing::debug;

/// Dimension tables derived from catalog records
#[derive(Debug, Clone)]
pub struct CatalogTables {
    /// song_id, title, artist_id, year, duration
    pub songs: RecordSet,
    /// artist_id, artist_name, artist_location, artist_latitude, artist_longitude
    pub artists: RecordSet,
}

/// Project catalog records onto the songs and artists tables
///
/// Both are pure projections: one output row per catalog record, values
/// unchanged, no filtering and no deduplication.
pub fn build_catalog_tables(catalog: &RecordSet) -> Result<CatalogTables> {
    let songs = project(catalog, SONGS.columns)?;
    let artists = project(catalog, ARTISTS.columns)?;

    debug!(rows = catalog.num_rows(), "Built catalog tables");

    Ok(CatalogTables { songs, artists })
}
