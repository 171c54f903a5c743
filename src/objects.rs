use crate::field_reader::{FromRow, Row};
use crate::serde_helpers::*;
use crate::Error;
use chrono::NaiveDate;
use rgb::RGB8;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A time of the service day, stored as seconds since its start
///
/// Hours can go past 23: a trip leaving at `25:10:00` runs at 1:10 am the next
/// calendar day but still belongs to the service day it started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        TimeOfDay(hours * 3600 + minutes * 60 + seconds)
    }

    /// Seconds since the start of the service day
    pub fn seconds(&self) -> u32 {
        self.0
    }

    pub fn hours(&self) -> u32 {
        self.0 / 3600
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time(s).map(TimeOfDay)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", format_time(self.0))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_time(self, serializer)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<TimeOfDay, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_time(deserializer)
    }
}

/// Half-open interval `[start, end)` of the service day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// A vehicle is in the window if it arrives before its end and leaves at or after its start
    pub fn contains_stop_time(&self, arrival: TimeOfDay, departure: TimeOfDay) -> bool {
        arrival < self.end && departure >= self.start
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Kind of bus service, as advertised by the color of the route
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum BusCategory {
    MetroBus,
    LeBus,
    Express,
    LateNight,
}

impl BusCategory {
    pub fn from_color(color: RGB8) -> BusCategory {
        match (color.r, color.g, color.b) {
            (0x97, 0xBF, 0x0D) => BusCategory::MetroBus,
            (0x01, 0x38, 0x88) | (0x1A, 0x17, 0x1B) | (0x00, 0x38, 0x88) => BusCategory::LeBus,
            (0xE0, 0x45, 0x03) => BusCategory::Express,
            _ => BusCategory::LateNight,
        }
    }
}

impl fmt::Display for BusCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            BusCategory::MetroBus => "Metrobus",
            BusCategory::LeBus => "leBus",
            BusCategory::Express => "Express",
            BusCategory::LateNight => "Late night",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub id: u32,
    /// Number shown to riders, several routes can share it
    pub number: String,
    pub description: String,
    #[serde(serialize_with = "serialize_color")]
    pub color: RGB8,
    pub category: BusCategory,
}

impl FromRow for Route {
    fn from_row(row: &Row) -> Result<Self, Error> {
        let color = parse_color(row.get(7)?, default_route_color)?;
        Ok(Route {
            id: row.parse(0)?,
            number: row.get(2)?.to_owned(),
            description: row.get(4)?.to_owned(),
            color,
            category: BusCategory::from_color(color),
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} - {} ({})", self.number, self.description, self.category)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Stop {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub coordinates: Coordinates,
    #[serde(skip)]
    pub stop_times: Vec<Arc<StopTime>>,
}

impl FromRow for Stop {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(Stop {
            id: row.parse(0)?,
            name: row.get(1)?.to_owned(),
            description: row.get(2)?.to_owned(),
            coordinates: Coordinates::new(row.parse(3)?, row.parse(4)?),
            stop_times: Vec::new(),
        })
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Exception {
    Added,
    Deleted,
    Other(String),
}

impl From<&str> for Exception {
    fn from(code: &str) -> Self {
        match code {
            "1" => Exception::Added,
            "2" => Exception::Deleted,
            other => Exception::Other(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarDate {
    pub service_id: String,
    pub date: NaiveDate,
    pub exception_type: Exception,
}

impl FromRow for CalendarDate {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(CalendarDate {
            service_id: row.get(0)?.to_owned(),
            date: parse_date(row.get(1)?)?,
            exception_type: Exception::from(row.get(2)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawTrip {
    pub id: String,
    pub route_id: u32,
    pub service_id: String,
    pub headsign: String,
}

impl FromRow for RawTrip {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(RawTrip {
            route_id: row.parse(0)?,
            service_id: row.get(1)?.to_owned(),
            id: row.get(2)?.to_owned(),
            headsign: row.get(3)?.to_owned(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RawStopTime {
    pub trip_id: String,
    pub arrival_time: TimeOfDay,
    pub departure_time: TimeOfDay,
    pub stop_id: u32,
    pub stop_sequence: u32,
}

impl FromRow for RawStopTime {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(RawStopTime {
            trip_id: row.get(0)?.to_owned(),
            arrival_time: row.parse(1)?,
            departure_time: row.parse(2)?,
            stop_id: row.parse(3)?,
            stop_sequence: row.parse(4)?,
        })
    }
}

/// A scheduled visit of a trip at a stop
///
/// Both the [Trip] and the [Stop] hold the same record.
#[derive(Debug, PartialEq, Serialize)]
pub struct StopTime {
    pub stop_id: u32,
    pub arrival_time: TimeOfDay,
    pub departure_time: TimeOfDay,
    pub stop_sequence: u32,
    pub trip_id: String,
}

impl From<RawStopTime> for StopTime {
    fn from(raw: RawStopTime) -> Self {
        Self {
            stop_id: raw.stop_id,
            arrival_time: raw.arrival_time,
            departure_time: raw.departure_time,
            stop_sequence: raw.stop_sequence,
            trip_id: raw.trip_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Trip {
    pub id: String,
    pub route_id: u32,
    pub service_id: String,
    pub headsign: String,
    /// Sorted by `stop_sequence` once the stop times are loaded
    pub stop_times: Vec<Arc<StopTime>>,
}

impl From<RawTrip> for Trip {
    fn from(raw: RawTrip) -> Self {
        Self {
            id: raw.id,
            route_id: raw.route_id,
            service_id: raw.service_id,
            headsign: raw.headsign,
            stop_times: Vec::new(),
        }
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "route id: {}, service id: {}, headsign: {}",
            self.route_id, self.service_id, self.headsign
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub from_stop_id: u32,
    pub to_stop_id: u32,
    /// In seconds, never 0
    pub min_transfer_time: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RawTransfer {
    pub from_stop_id: u32,
    pub to_stop_id: u32,
    pub min_transfer_time: u32,
}

impl FromRow for RawTransfer {
    fn from_row(row: &Row) -> Result<Self, Error> {
        Ok(RawTransfer {
            from_stop_id: row.parse(0)?,
            to_stop_id: row.parse(1)?,
            min_transfer_time: row.parse(3)?,
        })
    }
}

impl From<RawTransfer> for Transfer {
    /// A transfer of 0 seconds would always be catchable, it is read as 1 second
    fn from(raw: RawTransfer) -> Self {
        Self {
            from_stop_id: raw.from_stop_id,
            to_stop_id: raw.to_stop_id,
            min_transfer_time: raw.min_transfer_time.max(1),
        }
    }
}
