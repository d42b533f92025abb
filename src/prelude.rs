//! Convenience re-exports of the crate's main API surface.

pub use crate::error::Error;
pub use crate::loading::{
    AccessStrategy, ChunkBuffer, LandmarkStrategy, RawOsmNode, RawOsmWay, RoadGraphBuilder,
    RoutingConfig, SpatialDataResolver, UniqueIdGenerator,
};
pub use crate::model::graph::{
    Edge, EdgeKind, Graph, HighwayType, ModeSet, Node, Orientation, Spatial, TransportMode,
};
pub use crate::model::timetable::{Connection, Footpath, Stop, Timetable, Trip};
pub use crate::routing::csa::{ConnectionScan, ScanSource};
pub use crate::routing::dijkstra::{
    AStarModule, AbortAfterModule, DijkstraModule, ModularDijkstra, MultiModalModule,
};
pub use crate::routing::factory::ComputationFactory;
pub use crate::routing::hybrid::{
    AccessNodeComputation, HybridRoadTimetable, KNearestTransitAccess, PerimeterTransitAccess,
    TransitAccessIndex,
};
pub use crate::routing::landmarks::{
    GreedyFarthestLandmarks, LandmarkMetric, LandmarkProvider, RandomLandmarks,
};
pub use crate::routing::metric::{Metric, TravelTimeMetric};
pub use crate::routing::path::{EdgePath, Path, PathEdge, RoutePath, TripletonPath};
pub use crate::spatial::CoverTree;
pub use crate::{NodeId, SECONDS_PER_DAY, StopId, Time, TripId};
