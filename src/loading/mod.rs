//! Ingestion-facing contracts: configuration, raw OSM views, the graph
//! build callbacks, id generation and chunked batching. File decoding and
//! persistence live outside this crate.

pub mod batch;
pub mod builder;
pub mod config;
pub mod ids;
pub mod osm;

pub use batch::ChunkBuffer;
pub use builder::{RoadGraphBuilder, SpatialDataResolver};
pub use config::{AccessStrategy, LandmarkStrategy, RoutingConfig};
pub use ids::UniqueIdGenerator;
pub use osm::{RawOsmNode, RawOsmWay, WayDirection};
