//! Multimodal journey planning over a road network and a transit timetable.
//!
//! The crate combines three routing engines into one query surface: a modular
//! Dijkstra/A*/ALT engine on a directed road multigraph, the Connection Scan
//! Algorithm on a departure-sorted timetable, and a hybrid combinator that
//! stitches road and transit legs together through access stops discovered
//! with a metric cover tree.
//!
//! The graph and timetable are built once during an ingestion phase (see
//! [`loading`]) and served read-only afterwards; every query is independent
//! and safe to run on parallel worker threads.

pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod spatial;
pub mod units;

pub use error::Error;

/// Internal identifier of a graph node.
pub type NodeId = usize;
/// Internal identifier of a timetable stop.
pub type StopId = usize;
/// Internal identifier of a timetable trip.
pub type TripId = usize;
/// A point in time or a duration, in seconds. Points in time are seconds
/// since midnight and may exceed one day after midnight normalization.
pub type Time = u32;

/// Seconds of one day, the period of the timetable.
pub const SECONDS_PER_DAY: Time = 24 * 60 * 60;
