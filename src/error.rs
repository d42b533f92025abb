use thiserror::Error;

use crate::{NodeId, StopId, TripId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("node {0} is not part of the graph")]
    MissingNode(NodeId),
    #[error("stop {0} is not part of the timetable")]
    UnknownStop(StopId),
    #[error("trip {0} is not part of the timetable")]
    UnknownTrip(TripId),
    #[error("trip {0} has more than one connection with sequence index {1}")]
    InvalidSequenceIndex(TripId, usize),
    #[error("no more unique identifiers available")]
    IdSpaceExhausted,
    #[error("no internal mapping registered for raw identifier {0}")]
    MissingIdMapping(i64),
    #[error("journey backtracking visited stop {0} twice")]
    JourneyLoop(StopId),
    #[error("footpaths changed after correction, rerun correct_footpaths first")]
    FootpathsInconsistent,
    #[error("transit routing requires source nodes carrying a departure time")]
    MissingDepartureTime,
    #[error("departure instant {0} is outside the representable range")]
    DepartureTimeOutOfRange(i64),
}
