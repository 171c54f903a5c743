use crate::field_reader::FieldReader;
use crate::objects::*;
use crate::snapshot_reader::{SnapshotConfig, SnapshotReader};
use crate::Error;
use chrono::NaiveDate;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// All the GTFS objects running on one date within one time window
///
/// The snapshot is filled step by step, and the order matters:
/// 1. [GtfsSnapshot::add_routes] and [GtfsSnapshot::add_stops], in any order
/// 2. [GtfsSnapshot::add_services], which keeps the services running on the date
/// 3. [GtfsSnapshot::add_trips_for_date], which keeps the trips of those services
/// 4. [GtfsSnapshot::add_stop_times_for_date], which keeps the stop times in the window,
///    then removes the trips and stops without any of them
/// 5. [GtfsSnapshot::add_transfers], between the remaining stops
///
/// See [crate::SnapshotReader] to load a whole feed in this order.
#[derive(Debug)]
pub struct GtfsSnapshot {
    date: NaiveDate,
    window: TimeWindow,
    routes: HashMap<u32, Route>,
    routes_by_number: HashMap<String, Vec<u32>>,
    stops: HashMap<u32, Stop>,
    services: HashSet<String>,
    trips: HashMap<String, Trip>,
    transfers: Vec<Transfer>,
    transfer_stops: HashSet<u32>,
    stop_time_count: usize,
    all_stop_times_loaded: bool,
    pub(crate) read_duration: i64,
    pub(crate) sha256: Option<String>,
}

impl GtfsSnapshot {
    pub fn new(config: &SnapshotConfig) -> Self {
        GtfsSnapshot {
            date: config.date,
            window: config.window(),
            routes: HashMap::new(),
            routes_by_number: HashMap::new(),
            stops: HashMap::new(),
            services: HashSet::new(),
            trips: HashMap::new(),
            transfers: Vec::new(),
            transfer_stops: HashSet::new(),
            stop_time_count: 0,
            all_stop_times_loaded: false,
            read_duration: 0,
            sha256: None,
        }
    }

    /// Reads a local directory or zip archive with the default [SnapshotReader]
    pub fn from_path<P: AsRef<Path>>(path: P, config: &SnapshotConfig) -> Result<Self, Error> {
        SnapshotReader::default().read(path, config)
    }

    pub fn add_routes<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.add_routes_from(FieldReader::from_path(path)?)
    }

    pub fn add_routes_from<R: Read>(&mut self, rows: FieldReader<R>) -> Result<(), Error> {
        let routes: Vec<Route> = rows.read_all()?;
        info!("{} routes read", routes.len());
        for route in routes {
            self.upsert_route(route);
        }
        Ok(())
    }

    /// Inserts the route, replacing the one with the same id in both indexes
    pub fn upsert_route(&mut self, route: Route) {
        if let Some(previous) = self.routes.get(&route.id) {
            if let Some(ids) = self.routes_by_number.get_mut(&previous.number) {
                ids.retain(|id| *id != route.id);
                if ids.is_empty() {
                    self.routes_by_number.remove(&previous.number);
                }
            }
        }
        self.routes_by_number
            .entry(route.number.clone())
            .or_insert_with(Vec::new)
            .push(route.id);
        self.routes.insert(route.id, route);
    }

    pub fn add_stops<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.add_stops_from(FieldReader::from_path(path)?)
    }

    pub fn add_stops_from<R: Read>(&mut self, rows: FieldReader<R>) -> Result<(), Error> {
        let stops: Vec<Stop> = rows.read_all()?;
        info!("{} stops read", stops.len());
        for stop in stops {
            self.upsert_stop(stop);
        }
        Ok(())
    }

    /// Inserts the stop, a previous stop with the same id is replaced along with its stop times
    pub fn upsert_stop(&mut self, stop: Stop) {
        self.stops.insert(stop.id, stop);
    }

    /// Keeps the services explicitly added on the date of the snapshot
    ///
    /// Only the exceptions of `calendar_dates.txt` are considered, the regular
    /// weekly calendar is not.
    pub fn add_services<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.add_services_from(FieldReader::from_path(path)?)
    }

    pub fn add_services_from<R: Read>(&mut self, rows: FieldReader<R>) -> Result<(), Error> {
        let calendar_dates: Vec<CalendarDate> = rows.read_all()?;
        let nb_dates = calendar_dates.len();
        let date = self.date;
        self.services.extend(
            calendar_dates
                .into_iter()
                .filter(|c| c.exception_type == Exception::Added && c.date == date)
                .map(|c| c.service_id),
        );
        info!(
            "{} services running on {} among {} calendar dates",
            self.services.len(),
            self.date,
            nb_dates
        );
        Ok(())
    }

    /// Keeps the trips whose service runs on the date of the snapshot
    pub fn add_trips_for_date<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.add_trips_for_date_from(FieldReader::from_path(path)?)
    }

    pub fn add_trips_for_date_from<R: Read>(&mut self, rows: FieldReader<R>) -> Result<(), Error> {
        let raw_trips: Vec<RawTrip> = rows.read_all()?;
        if self.services.is_empty() {
            warn!(
                "no service running on {}, all the {} trips will be discarded",
                self.date,
                raw_trips.len()
            );
        }
        let nb_raw_trips = raw_trips.len();
        let mut nb_kept = 0;
        for raw_trip in raw_trips {
            if self.services.contains(&raw_trip.service_id) {
                self.upsert_trip(Trip::from(raw_trip));
                nb_kept += 1;
            }
        }
        info!(
            "{} trips kept out of {} for {}",
            nb_kept, nb_raw_trips, self.date
        );
        Ok(())
    }

    /// Inserts the trip, a previous trip with the same id is replaced along with its stop times
    pub fn upsert_trip(&mut self, trip: Trip) {
        self.trips.insert(trip.id.clone(), trip);
    }

    /// Attaches the stop times within the window to their trip and stop
    ///
    /// A stop time is kept if its trip and stop are known, it arrives before the end of
    /// the window and leaves at or after its start. Once all are read, the trips and
    /// the stops without any stop time are removed.
    ///
    /// Afterwards [GtfsSnapshot::all_stop_times_loaded] is true.
    pub fn add_stop_times_for_date<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.add_stop_times_for_date_from(FieldReader::from_path(path)?)
    }

    pub fn add_stop_times_for_date_from<R: Read>(
        &mut self,
        rows: FieldReader<R>,
    ) -> Result<(), Error> {
        let raw_stop_times: Vec<RawStopTime> = rows.read_all()?;
        let nb_raw_stop_times = raw_stop_times.len();
        let mut nb_admitted = 0;
        for raw in raw_stop_times {
            if !self
                .window
                .contains_stop_time(raw.arrival_time, raw.departure_time)
            {
                continue;
            }
            let trip = match self.trips.get_mut(&raw.trip_id) {
                Some(trip) => trip,
                None => continue,
            };
            let stop = match self.stops.get_mut(&raw.stop_id) {
                Some(stop) => stop,
                None => {
                    debug!(
                        "stop time of trip {} ignored, stop {} is unknown",
                        raw.trip_id, raw.stop_id
                    );
                    continue;
                }
            };
            let stop_time = Arc::new(StopTime::from(raw));
            trip.stop_times.push(Arc::clone(&stop_time));
            stop.stop_times.push(stop_time);
            nb_admitted += 1;
        }
        self.stop_time_count += nb_admitted;
        info!(
            "{} stop times kept out of {} in {}",
            nb_admitted, nb_raw_stop_times, self.window
        );

        self.prune();
        self.all_stop_times_loaded = true;
        Ok(())
    }

    /// Removes the trips, then the stops, that have no stop time left
    fn prune(&mut self) {
        let empty_trips: Vec<String> = self
            .trips
            .values()
            .filter(|t| t.stop_times.is_empty())
            .map(|t| t.id.clone())
            .collect();
        for id in &empty_trips {
            self.trips.remove(id);
        }
        for trip in self.trips.values_mut() {
            trip.stop_times
                .sort_by(|a, b| a.stop_sequence.cmp(&b.stop_sequence));
        }

        let empty_stops: Vec<u32> = self
            .stops
            .values()
            .filter(|s| s.stop_times.is_empty())
            .map(|s| s.id)
            .collect();
        for id in &empty_stops {
            self.stops.remove(id);
        }

        info!(
            "{} trips and {} stops without stop time in {} removed",
            empty_trips.len(),
            empty_stops.len(),
            self.window
        );
        debug!("removed trips: {}", empty_trips.iter().sorted().join(", "));
        debug!("removed stops: {}", empty_stops.iter().sorted().join(", "));
    }

    /// Keeps the transfers between two stops of the snapshot
    ///
    /// Can only be called once [GtfsSnapshot::add_stop_times_for_date] is done, otherwise
    /// stops that will eventually be removed would be considered.
    pub fn add_transfers<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.check_all_stop_times_loaded()?;
        self.add_transfers_from(FieldReader::from_path(path)?)
    }

    pub fn add_transfers_from<R: Read>(&mut self, rows: FieldReader<R>) -> Result<(), Error> {
        self.check_all_stop_times_loaded()?;
        let raw_transfers: Vec<RawTransfer> = rows.read_all()?;
        let nb_raw_transfers = raw_transfers.len();
        let mut nb_kept = 0;
        for raw in raw_transfers {
            if self.stops.contains_key(&raw.from_stop_id) && self.stops.contains_key(&raw.to_stop_id)
            {
                // Only the origin is a transfer stop
                self.transfer_stops.insert(raw.from_stop_id);
                self.transfers.push(Transfer::from(raw));
                nb_kept += 1;
            }
        }
        info!("{} transfers kept out of {}", nb_kept, nb_raw_transfers);
        Ok(())
    }

    fn check_all_stop_times_loaded(&self) -> Result<(), Error> {
        if self.all_stop_times_loaded {
            Ok(())
        } else {
            Err(Error::StopTimesNotLoaded)
        }
    }
}

impl GtfsSnapshot {
    pub fn print_stats(&self) {
        println!("GTFS snapshot of {} in {}:", self.date, self.window);
        println!("  Read in {} ms", self.read_duration);
        println!("  Routes: {}", self.routes.len());
        println!("  Stops: {}", self.stops.len());
        println!("  Services: {}", self.services.len());
        println!("  Trips: {}", self.trips.len());
        println!("  Stop times: {}", self.stop_time_count);
        println!("  Transfers: {}", self.transfers.len());
        println!("  Transfer stops: {}", self.transfer_stops.len());
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn routes(&self) -> &HashMap<u32, Route> {
        &self.routes
    }

    pub fn get_route(&self, id: u32) -> Result<&Route, Error> {
        self.routes
            .get(&id)
            .ok_or_else(|| Error::ReferenceError(id.to_string()))
    }

    /// All the routes sharing a number shown to riders
    pub fn routes_with_number<'a>(&'a self, number: &str) -> impl Iterator<Item = &'a Route> + 'a {
        self.routes_by_number
            .get(number)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.routes.get(id))
    }

    pub fn stops(&self) -> &HashMap<u32, Stop> {
        &self.stops
    }

    pub fn get_stop(&self, id: u32) -> Result<&Stop, Error> {
        self.stops
            .get(&id)
            .ok_or_else(|| Error::ReferenceError(id.to_string()))
    }

    /// The services running on the date of the snapshot
    pub fn services(&self) -> &HashSet<String> {
        &self.services
    }

    pub fn is_service_active(&self, service_id: &str) -> bool {
        self.services.contains(service_id)
    }

    pub fn trips(&self) -> &HashMap<String, Trip> {
        &self.trips
    }

    pub fn get_trip(&self, id: &str) -> Result<&Trip, Error> {
        self.trips
            .get(id)
            .ok_or_else(|| Error::ReferenceError(id.to_owned()))
    }

    /// Number of stop times kept in the window
    pub fn stop_time_count(&self) -> usize {
        self.stop_time_count
    }

    pub fn all_stop_times_loaded(&self) -> bool {
        self.all_stop_times_loaded
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Stops from which at least one transfer leaves
    pub fn transfer_stops(&self) -> &HashSet<u32> {
        &self.transfer_stops
    }

    pub fn is_transfer_stop(&self, stop_id: u32) -> bool {
        self.transfer_stops.contains(&stop_id)
    }

    /// Time needed to read the whole feed in milliseconds, 0 if loaded step by step
    pub fn read_duration(&self) -> i64 {
        self.read_duration
    }

    /// sha256 sum of the feed, only known when read from a zip archive
    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }
}
