//! Event pipeline: users, time and songplays

use super::join::inner_join_indices;
use super::project::{project, take_rows};
use super::time::{decompose_ts, CalendarParts};
use crate::error::{Error, Result};
use crate::schema::{col, SONGPLAYS, TIME, USERS};
use crate::types::{LevelPolicy, RecordSet, TimestampPolicy};
use arrow::array::{
    Array, ArrayRef, AsArray, Int32Array, StringArray, TimestampMillisecondArray, UInt32Array,
};
use arrow::compute::filter_record_batch;
use arrow::compute::kernels::cmp::eq;
use arrow::datatypes::{DataType, Field, Int64Type, Schema, TimeUnit};
use chrono::{FixedOffset, Offset, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Page value marking a song play
pub const PLAY_PAGE: &str = "NextSong";

/// Row policies of the event pipeline
#[derive(Debug, Clone, Copy)]
pub struct EventOptions {
    pub level_policy: LevelPolicy,
    pub bad_timestamp: TimestampPolicy,
    pub utc_offset: FixedOffset,
}

impl Default for EventOptions {
    fn default() -> Self {
        Self {
            level_policy: LevelPolicy::default(),
            bad_timestamp: TimestampPolicy::default(),
            utc_offset: Utc.fix(),
        }
    }
}

impl EventOptions {
    /// Options with the calendar read at `minutes` east of UTC
    pub fn new(
        level_policy: LevelPolicy,
        bad_timestamp: TimestampPolicy,
        utc_offset_minutes: i32,
    ) -> Result<Self> {
        let utc_offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::invalid_value(
                    "events.utc_offset_minutes",
                    format!("{utc_offset_minutes} is not a valid offset"),
                )
            })?;

        Ok(Self {
            level_policy,
            bad_timestamp,
            utc_offset,
        })
    }
}

/// Tables derived from play events
#[derive(Debug, Clone)]
pub struct EventTables {
    /// userId, firstName, lastName, gender, level
    pub users: RecordSet,
    /// start_time and its calendar attributes
    pub time: RecordSet,
    /// One row per matched (play, catalog record) pair
    pub songplays: RecordSet,
    /// Plays kept after timestamp decoding
    pub plays: usize,
    /// Plays whose song matched no catalog title
    pub unmatched_plays: usize,
    /// Plays dropped for an undecodable `ts`
    pub skipped_timestamps: usize,
}

/// Keep only events whose page is `NextSong`
///
/// A null page never matches.
pub fn filter_plays(events: &RecordSet) -> Result<RecordSet> {
    let page = string_column(events, col::PAGE)?;
    let mask = eq(page, &StringArray::new_scalar(PLAY_PAGE))?;
    Ok(filter_record_batch(events, &mask)?)
}

/// Build users, time and songplays from events and the full catalog
pub fn build_event_tables(
    events: &RecordSet,
    catalog: &RecordSet,
    options: &EventOptions,
) -> Result<EventTables> {
    let plays = filter_plays(events)?;
    debug!(
        events = events.num_rows(),
        plays = plays.num_rows(),
        "Filtered play events"
    );

    let (plays, parts, skipped_timestamps) = decode_timestamps(&plays, options)?;
    let plays = with_calendar_columns(&plays, &parts)?;

    let users = match options.level_policy {
        LevelPolicy::KeepAll => project(&plays, USERS.columns)?,
        LevelPolicy::Latest => {
            let latest = latest_per_user(&plays, &parts)?;
            project(&take_rows(&plays, &latest)?, USERS.columns)?
        }
    };

    let time = project(&plays, TIME.columns)?;

    let (songplays, unmatched_plays) = join_songplays(catalog, &plays)?;
    if unmatched_plays > 0 {
        info!(
            unmatched = unmatched_plays,
            plays = plays.num_rows(),
            "Plays without a catalog match"
        );
    }

    Ok(EventTables {
        users,
        time,
        songplays,
        plays: plays.num_rows(),
        unmatched_plays,
        skipped_timestamps,
    })
}

// ============================================================================
// Timestamps
// ============================================================================

/// Decompose every `ts`, applying the timestamp policy once
///
/// Returns the surviving plays, their calendar parts in the same order and
/// the number of dropped rows.
fn decode_timestamps(
    plays: &RecordSet,
    options: &EventOptions,
) -> Result<(RecordSet, Vec<CalendarParts>, usize)> {
    let ts = plays
        .column_by_name(col::TS)
        .ok_or_else(|| Error::missing_column(col::TS))?
        .as_primitive_opt::<Int64Type>()
        .ok_or_else(|| Error::decode("column 'ts' is not Int64"))?;

    let mut parts = Vec::with_capacity(ts.len());
    let mut kept = Vec::with_capacity(ts.len());

    for row in 0..ts.len() {
        let decoded = if ts.is_null(row) {
            Err("missing value")
        } else {
            decompose_ts(ts.value(row), &options.utc_offset)
        };

        match decoded {
            Ok(calendar) => {
                parts.push(calendar);
                kept.push(row as u32);
            }
            Err(message) => {
                let raw = if ts.is_null(row) {
                    "null".to_string()
                } else {
                    ts.value(row).to_string()
                };
                match options.bad_timestamp {
                    TimestampPolicy::Fail => return Err(Error::timestamp(row, raw, message)),
                    TimestampPolicy::Skip => {
                        warn!(row, ts = %raw, reason = message, "Skipping play with bad ts")
                    }
                }
            }
        }
    }

    let skipped = ts.len() - kept.len();
    if skipped == 0 {
        return Ok((plays.clone(), parts, 0));
    }

    let plays = take_rows(plays, &UInt32Array::from(kept))?;
    Ok((plays, parts, skipped))
}

/// Append start_time and the calendar columns to the plays
fn with_calendar_columns(plays: &RecordSet, parts: &[CalendarParts]) -> Result<RecordSet> {
    let int_column = |get: fn(&CalendarParts) -> i32| -> ArrayRef {
        Arc::new(Int32Array::from(parts.iter().map(get).collect::<Vec<_>>()))
    };

    let calendar: [(&str, DataType, ArrayRef); 7] = [
        (
            col::START_TIME,
            DataType::Timestamp(TimeUnit::Millisecond, None),
            Arc::new(TimestampMillisecondArray::from(
                parts.iter().map(|p| p.start_time).collect::<Vec<_>>(),
            )),
        ),
        (col::HOUR, DataType::Int32, int_column(|p| p.hour)),
        (col::DAY, DataType::Int32, int_column(|p| p.day)),
        (col::WEEK, DataType::Int32, int_column(|p| p.week)),
        (col::MONTH, DataType::Int32, int_column(|p| p.month)),
        (col::YEAR, DataType::Int32, int_column(|p| p.year)),
        (col::WEEKDAY, DataType::Int32, int_column(|p| p.weekday)),
    ];

    let mut fields: Vec<Field> = plays
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    let mut columns: Vec<ArrayRef> = plays.columns().to_vec();

    for (name, data_type, array) in calendar {
        fields.push(Field::new(name, data_type, false));
        columns.push(array);
    }

    Ok(RecordSet::try_new(Arc::new(Schema::new(fields)), columns)?)
}

// ============================================================================
// Users
// ============================================================================

/// Row of each user's most recent play
///
/// Ties on the timestamp go to the later row. Rows come back in input order.
fn latest_per_user(plays: &RecordSet, parts: &[CalendarParts]) -> Result<UInt32Array> {
    let user_id = string_column(plays, col::USER_ID)?;

    let mut latest: HashMap<Option<&str>, (i64, u32)> = HashMap::new();
    for (row, user) in user_id.iter().enumerate() {
        let start = parts[row].start_time;
        latest
            .entry(user)
            .and_modify(|seen| {
                if start >= seen.0 {
                    *seen = (start, row as u32);
                }
            })
            .or_insert((start, row as u32));
    }

    let mut rows: Vec<u32> = latest.into_values().map(|(_, row)| row).collect();
    rows.sort_unstable();
    Ok(UInt32Array::from(rows))
}

// ============================================================================
// Songplays
// ============================================================================

/// Inner join of catalog titles with play songs
///
/// `song_id` and `artist_id` come from the catalog side, everything else
/// from the play. Returns the table and the number of unmatched plays.
fn join_songplays(catalog: &RecordSet, plays: &RecordSet) -> Result<(RecordSet, usize)> {
    let titles = string_column(catalog, col::TITLE)?;
    let songs = string_column(plays, col::SONG)?;

    let (catalog_rows, play_rows) = inner_join_indices(titles, songs);

    let mut matched = vec![false; plays.num_rows()];
    for row in play_rows.values() {
        matched[*row as usize] = true;
    }
    let unmatched = matched.iter().filter(|m| !**m).count();

    let catalog_side = take_rows(
        &project(catalog, &[col::SONG_ID, col::ARTIST_ID])?,
        &catalog_rows,
    )?;
    let play_side = take_rows(plays, &play_rows)?;

    let mut fields = Vec::with_capacity(SONGPLAYS.columns.len());
    let mut columns = Vec::with_capacity(SONGPLAYS.columns.len());
    for name in SONGPLAYS.columns {
        let source = if *name == col::SONG_ID || *name == col::ARTIST_ID {
            &catalog_side
        } else {
            &play_side
        };
        let index = source
            .schema()
            .index_of(name)
            .map_err(|_| Error::missing_column(*name))?;
        fields.push(source.schema().field(index).clone());
        columns.push(source.column(index).clone());
    }

    let songplays = RecordSet::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok((songplays, unmatched))
}

fn string_column<'a>(batch: &'a RecordSet, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::missing_column(name))?
        .as_string_opt::<i32>()
        .ok_or_else(|| Error::decode(format!("column '{name}' is not Utf8")))
}
