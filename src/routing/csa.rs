//! Connection Scan Algorithm: earliest-arrival queries over the timetable
//! and journey reconstruction via journey pointers.

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use log::warn;

use crate::model::graph::{Edge, Node};
use crate::model::timetable::{Connection, Footpath, Timetable};
use crate::routing::path::{EdgePath, PathEdge};
use crate::{Error, SECONDS_PER_DAY, StopId, Time};

/// A scan entry point: be at `stop` no earlier than `time` (seconds since
/// midnight; larger values mean later days).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSource {
    pub stop: StopId,
    pub time: Time,
}

impl ScanSource {
    pub fn new(stop: StopId, time: Time) -> Self {
        Self { stop, time }
    }

    /// A source from a transit query node, whose id names the stop and whose
    /// timestamp is the earliest boarding time. Nodes without a timestamp
    /// cannot seed a scan.
    pub fn from_node(node: &Node) -> Result<Self, Error> {
        let time = node.time().ok_or(Error::MissingDepartureTime)?;
        Ok(Self::new(node.id(), time))
    }
}

/// How a stop's earliest arrival was achieved, for backtracking.
#[derive(Debug, Clone, Copy)]
enum Reached {
    /// The stop is a query source.
    Source,
    /// An initial footpath straight out of a source.
    Footpath(Footpath),
    /// Riding a trip from its boarding connection `enter` to `exit`, both
    /// indices into the sorted connection list, optionally followed by a
    /// trailing footpath.
    Trip { enter: usize, exit: usize, footpath: Option<Footpath> },
}

struct ScanState {
    /// Earliest arrival per stop on the validated timeline.
    arrivals: HashMap<StopId, Time>,
    pointers: HashMap<StopId, Reached>,
    /// First catchable connection per trip.
    boarded: HashMap<usize, usize>,
}

/// Earliest-arrival scans over a borrowed timetable. Each query is an
/// independent pass over the sorted connection list; queries may run in
/// parallel as long as the timetable is not mutated.
pub struct ConnectionScan<'t> {
    timetable: &'t Timetable,
}

impl<'t> ConnectionScan<'t> {
    pub fn new(timetable: &'t Timetable) -> Self {
        Self { timetable }
    }

    /// Earliest arrival time at `destination`, on the same timeline as the
    /// source times (arrivals on the following day exceed one day's seconds).
    pub fn earliest_arrival(
        &self,
        sources: &[ScanSource],
        destination: StopId,
    ) -> Result<Option<Time>, Error> {
        self.check_stop(destination)?;
        let state = self.scan(sources, Some(destination))?;
        Ok(state.arrivals.get(&destination).copied())
    }

    /// Earliest arrivals at every reachable stop.
    pub fn earliest_arrivals(
        &self,
        sources: &[ScanSource],
    ) -> Result<HashMap<StopId, Time>, Error> {
        Ok(self.scan(sources, None)?.arrivals)
    }

    /// Journey to `destination` as a path of transit and footpath edges. The
    /// path's total cost is the elapsed time from the earliest source time,
    /// including waits; unreachable destinations yield `None`.
    pub fn journey(
        &self,
        sources: &[ScanSource],
        destination: StopId,
    ) -> Result<Option<EdgePath>, Error> {
        self.check_stop(destination)?;
        let state = self.scan(sources, Some(destination))?;
        let Some(&arrival) = state.arrivals.get(&destination) else {
            return Ok(None);
        };
        let start = sources.iter().map(|source| source.time).min().unwrap_or(0);
        self.backtrack(&state, destination, arrival, start).map(Some)
    }

    fn check_stop(&self, stop: StopId) -> Result<(), Error> {
        if self.timetable.contains_stop(stop) {
            Ok(())
        } else {
            Err(Error::UnknownStop(stop))
        }
    }

    fn scan(
        &self,
        sources: &[ScanSource],
        destination: Option<StopId>,
    ) -> Result<ScanState, Error> {
        if !self.timetable.footpaths_corrected() {
            return Err(Error::FootpathsInconsistent);
        }
        let mut state = ScanState {
            arrivals: HashMap::new(),
            pointers: HashMap::new(),
            boarded: HashMap::new(),
        };

        let mut start = Time::MAX;
        for source in sources {
            self.check_stop(source.stop)?;
            start = start.min(source.time);
            if state
                .arrivals
                .get(&source.stop)
                .is_none_or(|&known| source.time < known)
            {
                state.arrivals.insert(source.stop, source.time);
                state.pointers.insert(source.stop, Reached::Source);
            }
        }
        for source in sources {
            for footpath in self.timetable.footpaths_from(source.stop) {
                let arrival = source.time + footpath.duration;
                if state
                    .arrivals
                    .get(&footpath.arrival_stop)
                    .is_none_or(|&known| arrival < known)
                {
                    state.arrivals.insert(footpath.arrival_stop, arrival);
                    state.pointers.insert(footpath.arrival_stop, Reached::Footpath(*footpath));
                }
            }
        }
        if sources.is_empty() {
            return Ok(state);
        }

        // One scan over a full day window, wrapping past midnight: the tail
        // of the sorted list on the query's day, then the head shifted one
        // day forward.
        let day_offset = start - start % SECONDS_PER_DAY;
        let first = self.timetable.first_departure_at(start % SECONDS_PER_DAY);
        let connections = self.timetable.connections();
        let tail = (first..connections.len()).map(|index| (index, day_offset));
        let head = (0..first).map(|index| (index, day_offset + SECONDS_PER_DAY));
        for (index, offset) in tail.chain(head) {
            let connection = &connections[index];
            let departure = connection.departure_time + offset;
            let arrival = Self::validated_arrival(connection) + offset;

            if let Some(destination) = destination
                && state
                    .arrivals
                    .get(&destination)
                    .is_some_and(|&known| known <= departure)
            {
                break;
            }

            let enter = match state.boarded.get(&connection.trip) {
                Some(&enter) => enter,
                None => {
                    let catchable = state
                        .arrivals
                        .get(&connection.departure_stop)
                        .is_some_and(|&at| at <= departure);
                    if !catchable {
                        continue;
                    }
                    state.boarded.insert(connection.trip, index);
                    index
                }
            };

            if state
                .arrivals
                .get(&connection.arrival_stop)
                .is_none_or(|&known| arrival < known)
            {
                state.arrivals.insert(connection.arrival_stop, arrival);
                state
                    .pointers
                    .insert(connection.arrival_stop, Reached::Trip { enter, exit: index, footpath: None });
                for footpath in self.timetable.footpaths_from(connection.arrival_stop) {
                    let transferred = arrival + footpath.duration;
                    if state
                        .arrivals
                        .get(&footpath.arrival_stop)
                        .is_none_or(|&known| transferred < known)
                    {
                        state.arrivals.insert(footpath.arrival_stop, transferred);
                        state.pointers.insert(
                            footpath.arrival_stop,
                            Reached::Trip { enter, exit: index, footpath: Some(*footpath) },
                        );
                    }
                }
            }
        }

        Ok(state)
    }

    /// Arrival time normalized to depart-before-arrive within the
    /// connection, for hops that cross midnight.
    fn validated_arrival(connection: &Connection) -> Time {
        if connection.arrival_time < connection.departure_time {
            connection.arrival_time + SECONDS_PER_DAY
        } else {
            connection.arrival_time
        }
    }

    fn backtrack(
        &self,
        state: &ScanState,
        destination: StopId,
        arrival: Time,
        start: Time,
    ) -> Result<EdgePath, Error> {
        let bound = self
            .timetable
            .stops()
            .map(|stop| stop.id())
            .max()
            .map_or(0, |id| id + 1);
        let mut visited = FixedBitSet::with_capacity(bound);
        let mut edges = Vec::new();
        let mut current = destination;

        loop {
            if visited.put(current) {
                warn!("journey backtracking revisited stop {current}, aborting the query");
                return Err(Error::JourneyLoop(current));
            }
            match state.pointers.get(&current) {
                None | Some(Reached::Source) => break,
                Some(Reached::Footpath(footpath)) => {
                    Self::push_footpath(&mut edges, footpath);
                    current = footpath.departure_stop;
                }
                Some(Reached::Trip { enter, exit, footpath }) => {
                    if let Some(footpath) = footpath {
                        Self::push_footpath(&mut edges, footpath);
                    }
                    let connections = self.timetable.connections();
                    let trip = self.timetable.trip(connections[*exit].trip)?;
                    let order = trip.connections();
                    let enter_at = Self::trip_position(order, *enter, connections[*exit].trip)?;
                    let exit_at = Self::trip_position(order, *exit, connections[*exit].trip)?;
                    for &leg in order[enter_at..=exit_at].iter().rev() {
                        let connection = &connections[leg];
                        let cost = Self::validated_arrival(connection) - connection.departure_time;
                        edges.push(PathEdge {
                            edge: Edge::transit(
                                connection.departure_stop,
                                connection.arrival_stop,
                                f64::from(cost),
                            ),
                            cost: f64::from(cost),
                        });
                    }
                    current = connections[*enter].departure_stop;
                }
            }
        }

        edges.reverse();
        let mut path = EdgePath::new(current);
        for hop in edges {
            let destination = hop.edge.destination();
            path.push(hop.edge, destination, hop.cost);
        }
        path.set_cost(f64::from(arrival - start));
        Ok(path)
    }

    fn push_footpath(edges: &mut Vec<PathEdge>, footpath: &Footpath) {
        // Self-loops carry no movement
        if footpath.departure_stop == footpath.arrival_stop {
            return;
        }
        let cost = f64::from(footpath.duration);
        edges.push(PathEdge {
            edge: Edge::footpath(footpath.departure_stop, footpath.arrival_stop, cost),
            cost,
        });
    }

    fn trip_position(order: &[usize], connection: usize, trip: usize) -> Result<usize, Error> {
        order
            .iter()
            .position(|&index| index == connection)
            .ok_or(Error::UnknownTrip(trip))
    }
}
