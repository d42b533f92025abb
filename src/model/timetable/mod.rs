//! Scheduled transit network: stops, trips, departure-sorted connections and
//! the footpath side-graph with its consistency correction.

mod types;

pub use types::{Connection, Footpath, Stop, Trip};

use fixedbitset::FixedBitSet;
use hashbrown::{HashMap, HashSet};
use log::info;
use rayon::prelude::*;
use std::collections::VecDeque;

use crate::model::graph::storage::DenseMap;
use crate::{Error, StopId, Time, TripId, units};

#[derive(Debug, Clone, Default)]
pub struct Timetable {
    stops: DenseMap<Stop>,
    /// Sorted ascending by departure time. Connection scans rely on this.
    connections: Vec<Connection>,
    trips: DenseMap<Trip>,
    /// Outgoing footpaths per departure stop.
    footpaths: DenseMap<Vec<Footpath>>,
    /// Set whenever a footpath is added and cleared by correction.
    /// Connection scans refuse to run on a dirty footpath graph because
    /// inconsistent footpaths can produce cyclic journeys.
    footpaths_dirty: bool,
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stop(&mut self, stop: Stop) -> Option<Stop> {
        self.stops.insert(stop.id(), stop)
    }

    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn contains_stop(&self, id: StopId) -> bool {
        self.stops.contains_key(id)
    }

    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Appends a batch of connections, re-sorts the full list by departure
    /// time and rebuilds the per-trip index. Meant for bulk loading, not for
    /// one-at-a-time inserts.
    pub fn add_connections(
        &mut self,
        connections: impl IntoIterator<Item = Connection>,
    ) -> Result<(), Error> {
        for connection in connections {
            for stop in [connection.departure_stop, connection.arrival_stop] {
                if !self.stops.contains_key(stop) {
                    return Err(Error::UnknownStop(stop));
                }
            }
            self.connections.push(connection);
        }
        self.connections.sort_by_key(|connection| connection.departure_time);
        self.rebuild_trips()
    }

    fn rebuild_trips(&mut self) -> Result<(), Error> {
        self.trips = DenseMap::new();
        for (index, connection) in self.connections.iter().enumerate() {
            self.trips
                .get_or_insert_with(connection.trip, Trip::default)
                .connections
                .push(index);
        }
        let connections = &self.connections;
        for (trip_id, trip) in self.trips.iter_mut() {
            trip.connections
                .sort_by_key(|&index| connections[index].sequence);
            for pair in trip.connections.windows(2) {
                let sequence = connections[pair[1]].sequence;
                if connections[pair[0]].sequence == sequence {
                    return Err(Error::InvalidSequenceIndex(trip_id, sequence));
                }
            }
        }
        Ok(())
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn trip(&self, id: TripId) -> Result<&Trip, Error> {
        self.trips.get(id).ok_or(Error::UnknownTrip(id))
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// Index of the first connection departing at or after `time`.
    pub fn first_departure_at(&self, time: Time) -> usize {
        self.connections
            .partition_point(|connection| connection.departure_time < time)
    }

    /// Adds a footpath, replacing a slower one over the same stop pair. The
    /// footpath graph becomes uncorrected and must be corrected again before
    /// it can be scanned.
    pub fn add_footpath(&mut self, footpath: Footpath) -> Result<(), Error> {
        for stop in [footpath.departure_stop, footpath.arrival_stop] {
            if !self.stops.contains_key(stop) {
                return Err(Error::UnknownStop(stop));
            }
        }
        let outgoing = self
            .footpaths
            .get_or_insert_with(footpath.departure_stop, Vec::new);
        match outgoing
            .iter_mut()
            .find(|existing| existing.arrival_stop == footpath.arrival_stop)
        {
            Some(existing) => existing.duration = existing.duration.min(footpath.duration),
            None => outgoing.push(footpath),
        }
        self.footpaths_dirty = true;
        Ok(())
    }

    pub fn footpaths_from(&self, stop: StopId) -> &[Footpath] {
        self.footpaths.get(stop).map_or(&[], Vec::as_slice)
    }

    /// Whether the footpath graph is consistent: either no footpath was ever
    /// added, or [`Timetable::correct_footpaths`] has run since the last
    /// footpath mutation.
    pub fn footpaths_corrected(&self) -> bool {
        !self.footpaths_dirty
    }

    /// Makes the footpath graph consistent in four passes:
    ///
    /// 1. raise every duration below `transfer_delay` to the delay,
    /// 2. give every stop a self-loop of the delay,
    /// 3. connect every stop pair within `reachability_radius` metres with a
    ///    footpath at walking speed,
    /// 4. close the graph transitively, so any two stops connected by a
    ///    footpath chain also have a direct footpath satisfying the triangle
    ///    inequality.
    pub fn correct_footpaths(&mut self, transfer_delay: Time, reachability_radius: f64) {
        for outgoing in self.footpaths.values_mut() {
            for footpath in outgoing.iter_mut() {
                footpath.duration = footpath.duration.max(transfer_delay);
            }
        }

        let mut direct: HashSet<(StopId, StopId)> = self
            .footpaths
            .iter()
            .flat_map(|(_, outgoing)| outgoing.iter())
            .map(|footpath| (footpath.departure_stop, footpath.arrival_stop))
            .collect();

        let ids: Vec<StopId> = self.stops.keys().collect();
        for &id in &ids {
            if direct.insert((id, id)) {
                self.footpaths
                    .get_or_insert_with(id, Vec::new)
                    .push(Footpath::new(id, id, transfer_delay));
            }
        }

        let nearby: Vec<Footpath> = {
            let reachable = &direct;
            let table = &*self;
            ids.par_iter()
                .flat_map_iter(|&from| {
                    ids.iter().filter_map(move |&to| {
                        if from == to || reachable.contains(&(from, to)) {
                            return None;
                        }
                        (table.stop_distance(from, to) <= reachability_radius).then(|| {
                            let duration = table.walking_duration(from, to, transfer_delay);
                            Footpath::new(from, to, duration)
                        })
                    })
                })
                .collect()
        };
        for footpath in &nearby {
            direct.insert((footpath.departure_stop, footpath.arrival_stop));
        }

        // Snapshot of the direct adjacency; the closure footpaths added below
        // stay within existing components and cannot extend reachability.
        let adjacency: HashMap<StopId, Vec<StopId>> = {
            let mut adjacency: HashMap<StopId, Vec<StopId>> = HashMap::new();
            for &(from, to) in &direct {
                adjacency.entry(from).or_default().push(to);
            }
            adjacency
        };
        let capacity = ids.iter().max().map_or(0, |&id| id + 1);
        let transitive: Vec<Footpath> = {
            let reachable = &direct;
            let adjacency = &adjacency;
            let table = &*self;
            ids.par_iter()
                .flat_map_iter(|&from| {
                    let mut visited = FixedBitSet::with_capacity(capacity);
                    visited.insert(from);
                    let mut queue = VecDeque::from([from]);
                    while let Some(current) = queue.pop_front() {
                        let Some(next) = adjacency.get(&current) else { continue };
                        for &to in next {
                            if !visited.put(to) {
                                queue.push_back(to);
                            }
                        }
                    }
                    visited.into_ones().filter_map(move |to| {
                        if reachable.contains(&(from, to)) {
                            return None;
                        }
                        let duration = table.walking_duration(from, to, transfer_delay);
                        Some(Footpath::new(from, to, duration))
                    })
                })
                .collect()
        };

        info!(
            "footpath correction added {} nearby and {} transitive footpaths over {} stops",
            nearby.len(),
            transitive.len(),
            ids.len()
        );
        for footpath in nearby.into_iter().chain(transitive) {
            self.footpaths
                .get_or_insert_with(footpath.departure_stop, Vec::new)
                .push(footpath);
        }

        self.footpaths_dirty = false;
    }

    fn stop_distance(&self, from: StopId, to: StopId) -> f64 {
        match (self.stops.get(from), self.stops.get(to)) {
            (Some(from), Some(to)) => units::distance(from, to),
            _ => f64::INFINITY,
        }
    }

    /// Walking time over the great-circle distance, never below the transfer
    /// delay. Rounded up so chained footpaths keep the triangle inequality
    /// under integer durations.
    fn walking_duration(&self, from: StopId, to: StopId, transfer_delay: Time) -> Time {
        let distance = self.stop_distance(from, to);
        let walk = units::travel_time(distance, units::MAX_FOOT_SPEED).ceil() as Time;
        walk.max(transfer_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_row(count: usize) -> Timetable {
        let mut timetable = Timetable::new();
        for id in 0..count {
            timetable.add_stop(Stop::new(id, 48.0, 7.8 + id as f64 * 0.002));
        }
        timetable
    }

    fn footpath_duration(timetable: &Timetable, from: StopId, to: StopId) -> Option<Time> {
        timetable
            .footpaths_from(from)
            .iter()
            .find(|footpath| footpath.arrival_stop == to)
            .map(|footpath| footpath.duration)
    }

    #[test]
    fn connections_are_sorted_and_indexed_by_trip() {
        let mut timetable = stop_row(3);
        timetable
            .add_connections([
                Connection {
                    departure_stop: 1,
                    arrival_stop: 2,
                    departure_time: 300,
                    arrival_time: 400,
                    trip: 0,
                    sequence: 1,
                },
                Connection {
                    departure_stop: 0,
                    arrival_stop: 1,
                    departure_time: 100,
                    arrival_time: 250,
                    trip: 0,
                    sequence: 0,
                },
            ])
            .unwrap();

        let departures: Vec<Time> = timetable
            .connections()
            .iter()
            .map(|connection| connection.departure_time)
            .collect();
        assert_eq!(departures, vec![100, 300]);

        let trip = timetable.trip(0).unwrap();
        assert_eq!(trip.connections(), &[0, 1]);
        assert_eq!(timetable.first_departure_at(150), 1);
        assert!(matches!(timetable.trip(9), Err(Error::UnknownTrip(9))));
    }

    #[test]
    fn duplicate_sequence_is_rejected() {
        let mut timetable = stop_row(2);
        let connection = Connection {
            departure_stop: 0,
            arrival_stop: 1,
            departure_time: 100,
            arrival_time: 200,
            trip: 3,
            sequence: 0,
        };
        let result = timetable.add_connections([connection, connection]);
        assert!(matches!(result, Err(Error::InvalidSequenceIndex(3, 0))));
    }

    #[test]
    fn connections_need_known_stops() {
        let mut timetable = stop_row(1);
        let result = timetable.add_connections([Connection {
            departure_stop: 0,
            arrival_stop: 5,
            departure_time: 0,
            arrival_time: 1,
            trip: 0,
            sequence: 0,
        }]);
        assert!(matches!(result, Err(Error::UnknownStop(5))));
    }

    #[test]
    fn correction_adds_self_loops_and_raises_durations() {
        let mut timetable = stop_row(2);
        timetable.add_footpath(Footpath::new(0, 1, 5)).unwrap();
        timetable.correct_footpaths(60, 1.0);

        assert_eq!(footpath_duration(&timetable, 0, 0), Some(60));
        assert_eq!(footpath_duration(&timetable, 1, 1), Some(60));
        assert_eq!(footpath_duration(&timetable, 0, 1), Some(60));
        assert!(timetable.footpaths_corrected());
    }

    #[test]
    fn correction_connects_nearby_stops_and_closes_chains() {
        // Stops 0..3 in a row about 150 m apart; only adjacent pairs fall
        // within the radius, the closure must still connect 0 and 3.
        let mut timetable = stop_row(4);
        timetable.correct_footpaths(30, 200.0);

        assert!(footpath_duration(&timetable, 0, 1).is_some());
        assert!(footpath_duration(&timetable, 0, 3).is_some());

        let ids: Vec<StopId> = (0..4).collect();
        for &a in &ids {
            for &b in &ids {
                for &c in &ids {
                    let (Some(ab), Some(bc), Some(ac)) = (
                        footpath_duration(&timetable, a, b),
                        footpath_duration(&timetable, b, c),
                        footpath_duration(&timetable, a, c),
                    ) else {
                        continue;
                    };
                    assert!(ac <= ab + bc, "{a}->{c} violates the triangle inequality");
                }
            }
        }
    }

    #[test]
    fn stops_round_trip_through_json() {
        let stop = Stop::named(3, "Hauptbahnhof", 48.0, 7.84);
        let json = serde_json::to_string(&stop).unwrap();
        let back: Stop = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stop);
        assert_eq!(back.name(), Some("Hauptbahnhof"));

        let footpath = Footpath::new(0, 1, 90);
        let json = serde_json::to_string(&footpath).unwrap();
        assert_eq!(serde_json::from_str::<Footpath>(&json).unwrap(), footpath);
    }

    #[test]
    fn adding_a_footpath_invalidates_correction() {
        let mut timetable = stop_row(2);
        timetable.correct_footpaths(30, 500.0);
        assert!(timetable.footpaths_corrected());

        timetable.add_footpath(Footpath::new(0, 1, 10)).unwrap();
        assert!(!timetable.footpaths_corrected());
    }
}
