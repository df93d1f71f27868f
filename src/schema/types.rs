//! Schema types

use super::col;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

/// Schema of a song catalog record (one JSON object per song)
pub fn catalog_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(col::ARTIST_ID, DataType::Utf8, true),
        Field::new(col::ARTIST_LATITUDE, DataType::Float64, true),
        Field::new(col::ARTIST_LOCATION, DataType::Utf8, true),
        Field::new(col::ARTIST_LONGITUDE, DataType::Float64, true),
        Field::new(col::ARTIST_NAME, DataType::Utf8, true),
        Field::new(col::DURATION, DataType::Float64, true),
        Field::new(col::NUM_SONGS, DataType::Int64, true),
        Field::new(col::SONG_ID, DataType::Utf8, true),
        Field::new(col::TITLE, DataType::Utf8, true),
        Field::new(col::YEAR, DataType::Int64, true),
    ]))
}

/// Schema of a user activity log line
///
/// `userId` is kept as a string: the logs carry it quoted, and logged-out
/// rows carry an empty string.
pub fn event_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(col::ARTIST, DataType::Utf8, true),
        Field::new(col::AUTH, DataType::Utf8, true),
        Field::new(col::FIRST_NAME, DataType::Utf8, true),
        Field::new(col::GENDER, DataType::Utf8, true),
        Field::new(col::ITEM_IN_SESSION, DataType::Int64, true),
        Field::new(col::LAST_NAME, DataType::Utf8, true),
        Field::new(col::LENGTH, DataType::Float64, true),
        Field::new(col::LEVEL, DataType::Utf8, true),
        Field::new(col::LOCATION, DataType::Utf8, true),
        Field::new(col::METHOD, DataType::Utf8, true),
        Field::new(col::PAGE, DataType::Utf8, true),
        Field::new(col::REGISTRATION, DataType::Float64, true),
        Field::new(col::SESSION_ID, DataType::Int64, true),
        Field::new(col::SONG, DataType::Utf8, true),
        Field::new(col::STATUS, DataType::Int64, true),
        Field::new(col::TS, DataType::Int64, true),
        Field::new(col::USER_AGENT, DataType::Utf8, true),
        Field::new(col::USER_ID, DataType::Utf8, true),
    ]))
}

/// Layout of one output table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Subdirectory under the output root
    pub name: &'static str,
    /// Columns of the table, in output order
    pub columns: &'static [&'static str],
    /// Columns whose values become `col=value` directories
    pub partition_by: &'static [&'static str],
}

impl TableSpec {
    /// Output location of this table under `root`
    pub fn path_under(&self, root: &str) -> String {
        let root = root.trim_end_matches('/');
        if root.is_empty() {
            self.name.to_string()
        } else {
            format!("{root}/{}", self.name)
        }
    }

    /// Columns that end up inside the data files
    pub fn data_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .copied()
            .filter(|c| !self.partition_by.contains(c))
    }
}

/// Song dimension
pub const SONGS: TableSpec = TableSpec {
    name: "songs",
    columns: &[col::SONG_ID, col::TITLE, col::ARTIST_ID, col::YEAR, col::DURATION],
    partition_by: &[col::YEAR, col::ARTIST_ID],
};

/// Artist dimension
pub const ARTISTS: TableSpec = TableSpec {
    name: "artists",
    columns: &[
        col::ARTIST_ID,
        col::ARTIST_NAME,
        col::ARTIST_LOCATION,
        col::ARTIST_LATITUDE,
        col::ARTIST_LONGITUDE,
    ],
    partition_by: &[],
};

/// User dimension
pub const USERS: TableSpec = TableSpec {
    name: "users",
    columns: &[
        col::USER_ID,
        col::FIRST_NAME,
        col::LAST_NAME,
        col::GENDER,
        col::LEVEL,
    ],
    partition_by: &[],
};

/// Time dimension
pub const TIME: TableSpec = TableSpec {
    name: "time",
    columns: &[
        col::START_TIME,
        col::HOUR,
        col::DAY,
        col::WEEK,
        col::MONTH,
        col::YEAR,
        col::WEEKDAY,
    ],
    partition_by: &[col::YEAR, col::MONTH],
};

/// Play fact table; `year` and `month` only serve as partition keys
pub const SONGPLAYS: TableSpec = TableSpec {
    name: "songplays",
    columns: &[
        col::START_TIME,
        col::USER_ID,
        col::LEVEL,
        col::SONG_ID,
        col::ARTIST_ID,
        col::SESSION_ID,
        col::LOCATION,
        col::USER_AGENT,
        col::YEAR,
        col::MONTH,
    ],
    partition_by: &[col::YEAR, col::MONTH],
};

/// Every table the job writes, in write order
pub const ALL_TABLES: [TableSpec; 5] = [SONGS, ARTISTS, USERS, TIME, SONGPLAYS];
