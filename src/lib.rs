//! Recurring-slot scheduling and conflict resolution for room booking,
//! plus occupancy aggregation across room/sub-room hierarchies.
//!
//! The crate is a library core and performs no I/O of its own. The booking
//! path is: expand a [`model::RecurrenceSpec`] with [`engine::generate`],
//! check the result against committed allocations with
//! [`engine::detect_conflicts`], and — when conflicts exist — walk an
//! [`engine::ResolutionSession`] until the caller commits. Persisting the
//! accepted slots is the caller's job. The occupancy side reaches the
//! external store only through the [`occupancy::OccupantSource`] trait.

pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod occupancy;
