//! Occupancy aggregation over rooms and sub-rooms.
//!
//! Reduces occupant records from the external data-access collaborator to
//! an occupancy percentage and a "currently occupied by" set. The bulk path
//! fans fetches out in bounded batches, yields between batches, and honors
//! cooperative cancellation — partial results are kept, not discarded.
//! Fetch failures degrade to zero occupants: dashboard completeness beats
//! hard failure here.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::engine::to_minutes;
use crate::limits::{DEFAULT_FETCH_BATCH, DEFAULT_FETCH_TIMEOUT_MS};
use crate::model::{Minutes, Now, OccupancyWindow, OccupantRecord};
use crate::observability;

/// Academic year/session pair scoping every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicTerm {
    pub year: String,
    pub session: String,
}

impl AcademicTerm {
    pub fn new(year: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            session: session.into(),
        }
    }
}

/// Query key the data-access collaborator is addressed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantQuery {
    pub room_id: Ulid,
    pub subroom_id: Option<Ulid>,
    pub term: AcademicTerm,
    pub window: OccupancyWindow,
}

/// Failure reported by the collaborator. The aggregator degrades on it;
/// it never propagates past this module.
#[derive(Debug)]
pub struct FetchError(pub String);

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fetch failed: {}", self.0)
    }
}

impl std::error::Error for FetchError {}

/// External data access: occupant rows keyed by room/sub-room and window.
#[async_trait]
pub trait OccupantSource: Send + Sync {
    async fn fetch_occupants(
        &self,
        query: &OccupantQuery,
    ) -> Result<Vec<OccupantRecord>, FetchError>;
}

/// A room as the dashboard sees it: optionally split into sub-rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    pub id: Ulid,
    pub subrooms: Vec<Ulid>,
}

/// Published per-room numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomOccupancy {
    pub room_id: Ulid,
    /// 0..=100; a parent with sub-rooms publishes the mean across them.
    pub percent: f64,
    /// Flattened across sub-rooms, not deduplicated.
    pub current: Vec<OccupantRecord>,
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// External fetches in flight per batch.
    pub batch_size: usize,
    /// Nominal bookable hours per day (the 09:00–18:00 working window).
    pub work_hours_per_day: u32,
    /// Per-fetch deadline; a timeout degrades like a failed fetch.
    pub fetch_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_FETCH_BATCH,
            work_hours_per_day: 9,
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
        }
    }
}

/// Percentage of the window's working time covered by occupant records.
///
/// Reversed times contribute zero minutes; absent or unparsable times are
/// skipped. Overlapping records are summed as-is, so double-booking can push
/// the raw ratio past 100 — the published value is clamped there.
pub fn compute_occupancy(
    occupants: &[OccupantRecord],
    window: &OccupancyWindow,
    work_hours_per_day: u32,
) -> f64 {
    let denominator = window.days() * i64::from(work_hours_per_day) * 60;
    if denominator <= 0 {
        return 0.0;
    }
    let mut booked: i64 = 0;
    for occ in occupants {
        if !window.contains(occ.scheduled_date) {
            continue;
        }
        let (Some(start), Some(end)) = (
            parse_time(occ.start_time.as_deref()),
            parse_time(occ.end_time.as_deref()),
        ) else {
            debug!(occupant = %occ.occupant_id, "occupant without usable times, skipping");
            continue;
        };
        booked += i64::from((end - start).max(0));
    }
    let percent = booked as f64 / denominator as f64 * 100.0;
    percent.min(100.0)
}

/// Occupants whose record covers `now` on today's date (half-open, so an
/// occupant whose slot ends exactly now is no longer present).
pub fn current_occupants<'a>(occupants: &'a [OccupantRecord], now: Now) -> Vec<&'a OccupantRecord> {
    occupants
        .iter()
        .filter(|occ| occ.scheduled_date == now.date)
        .filter(|occ| {
            match (
                parse_time(occ.start_time.as_deref()),
                parse_time(occ.end_time.as_deref()),
            ) {
                (Some(start), Some(end)) => start <= now.minute && now.minute < end,
                _ => false,
            }
        })
        .collect()
}

fn parse_time(s: Option<&str>) -> Option<Minutes> {
    s.and_then(|v| to_minutes(v).ok())
}

/// One fetch unit: a room, or one sub-room of a room.
struct FetchUnit {
    room_idx: usize,
    subroom_id: Option<Ulid>,
}

/// Bulk dashboard aggregation: one result per room, sub-rooms averaged in.
///
/// Fetch units run `cfg.batch_size` at a time; the token is checked at each
/// batch boundary. Once cancelled, no further fetch is issued — in-flight
/// fetches complete and everything gathered so far is still reduced.
pub async fn aggregate_rooms(
    source: &dyn OccupantSource,
    rooms: &[RoomRef],
    term: &AcademicTerm,
    window: OccupancyWindow,
    now: Now,
    cfg: &AggregatorConfig,
    cancel: &CancellationToken,
) -> Vec<RoomOccupancy> {
    let units: Vec<FetchUnit> = rooms
        .iter()
        .enumerate()
        .flat_map(|(idx, room)| {
            if room.subrooms.is_empty() {
                vec![FetchUnit {
                    room_idx: idx,
                    subroom_id: None,
                }]
            } else {
                room.subrooms
                    .iter()
                    .map(|sid| FetchUnit {
                        room_idx: idx,
                        subroom_id: Some(*sid),
                    })
                    .collect()
            }
        })
        .collect();

    // room index → occupant lists for the units actually fetched
    let mut fetched: Vec<Vec<Vec<OccupantRecord>>> = vec![Vec::new(); rooms.len()];

    let batch_size = cfg.batch_size.max(1);
    for batch in units.chunks(batch_size) {
        if cancel.is_cancelled() {
            info!("occupancy aggregation cancelled, keeping partial results");
            metrics::counter!(observability::AGGREGATIONS_CANCELLED_TOTAL).increment(1);
            break;
        }
        let results = futures::future::join_all(batch.iter().map(|unit| {
            let query = OccupantQuery {
                room_id: rooms[unit.room_idx].id,
                subroom_id: unit.subroom_id,
                term: term.clone(),
                window,
            };
            fetch_degraded(source, query, cfg.fetch_timeout)
        }))
        .await;
        for (unit, occupants) in batch.iter().zip(results) {
            fetched[unit.room_idx].push(occupants);
        }
        debug!(batch = batch.len(), "occupancy batch done");
        // Stay cooperative between batches.
        tokio::task::yield_now().await;
    }

    rooms
        .iter()
        .enumerate()
        .map(|(idx, room)| reduce_room(room, &fetched[idx], &window, now, cfg))
        .collect()
}

/// Single-room aggregation — the same reduction without the fan-out.
pub async fn room_occupancy(
    source: &dyn OccupantSource,
    room: &RoomRef,
    term: &AcademicTerm,
    window: OccupancyWindow,
    now: Now,
    cfg: &AggregatorConfig,
    cancel: &CancellationToken,
) -> RoomOccupancy {
    aggregate_rooms(
        source,
        std::slice::from_ref(room),
        term,
        window,
        now,
        cfg,
        cancel,
    )
    .await
    .pop()
    .expect("one room in, one result out")
}

/// One collaborator fetch with a deadline, degraded to empty on any failure.
async fn fetch_degraded(
    source: &dyn OccupantSource,
    query: OccupantQuery,
    timeout: Duration,
) -> Vec<OccupantRecord> {
    let started = Instant::now();
    metrics::counter!(observability::FETCHES_TOTAL).increment(1);
    let outcome = tokio::time::timeout(timeout, source.fetch_occupants(&query)).await;
    metrics::histogram!(observability::FETCH_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
    match outcome {
        Ok(Ok(occupants)) => occupants,
        Ok(Err(e)) => {
            warn!(room = %query.room_id, "occupant fetch failed, treating as empty: {e}");
            metrics::counter!(observability::FETCH_FAILURES_TOTAL).increment(1);
            Vec::new()
        }
        Err(_) => {
            warn!(room = %query.room_id, "occupant fetch timed out, treating as empty");
            metrics::counter!(observability::FETCH_FAILURES_TOTAL).increment(1);
            Vec::new()
        }
    }
}

/// Fold fetched unit results into the room's published numbers.
///
/// Percent is the arithmetic mean across fetched units; current occupants
/// are concatenated. Units never fetched (cancellation) don't participate.
fn reduce_room(
    room: &RoomRef,
    unit_results: &[Vec<OccupantRecord>],
    window: &OccupancyWindow,
    now: Now,
    cfg: &AggregatorConfig,
) -> RoomOccupancy {
    let percent = if unit_results.is_empty() {
        0.0
    } else {
        let sum: f64 = unit_results
            .iter()
            .map(|occ| compute_occupancy(occ, window, cfg.work_hours_per_day))
            .sum();
        sum / unit_results.len() as f64
    };
    let current: Vec<OccupantRecord> = unit_results
        .iter()
        .flat_map(|occ| current_occupants(occ, now).into_iter().cloned())
        .collect();
    RoomOccupancy {
        room_id: room.id,
        percent,
        current,
    }
}
