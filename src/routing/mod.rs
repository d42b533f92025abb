//! Query engines: the modular Dijkstra/A*/ALT road engine, the timetable
//! connection scan, and the hybrid combinator stitching both together.

pub mod csa;
pub mod dijkstra;
pub mod factory;
pub mod hybrid;
pub mod landmarks;
pub mod metric;
pub mod path;
