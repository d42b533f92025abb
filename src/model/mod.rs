//! Data model for multimodal routing.
//!
//! [`graph`] holds the directed road multigraph, [`timetable`] the scheduled
//! transit network. Each container exclusively owns its entities; routing
//! algorithms only borrow them.

pub mod graph;
pub mod timetable;

pub use graph::{Edge, EdgeKind, Graph, HighwayType, ModeSet, Node, Orientation, TransportMode};
pub use timetable::{Connection, Footpath, Stop, Timetable, Trip};
