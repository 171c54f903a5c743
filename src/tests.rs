use crate::objects::*;
use crate::{Error, FieldReader, GtfsSnapshot, SnapshotConfig, SnapshotReader};
use chrono::NaiveDate;
use rgb::RGB8;
use std::collections::HashSet;
use std::sync::Arc;

fn config() -> SnapshotConfig {
    SnapshotConfig::new(
        NaiveDate::from_ymd_opt(2017, 1, 15).unwrap(),
        TimeOfDay::from_hms(8, 0, 0),
        TimeOfDay::from_hms(9, 0, 0),
    )
}

fn rows(file_name: &str, data: &'static str) -> FieldReader<&'static [u8]> {
    FieldReader::from_reader(data.as_bytes(), file_name).expect("impossible to read headers")
}

fn read_until_trips() -> GtfsSnapshot {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_routes("fixtures/basic/routes.txt")
        .expect("impossible to read routes");
    snapshot
        .add_stops("fixtures/basic/stops.txt")
        .expect("impossible to read stops");
    snapshot
        .add_services("fixtures/basic/calendar_dates.txt")
        .expect("impossible to read services");
    snapshot
        .add_trips_for_date("fixtures/basic/trips.txt")
        .expect("impossible to read trips");
    snapshot
}

#[test]
fn read_routes() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_routes("fixtures/basic/routes.txt")
        .expect("impossible to read routes");
    assert_eq!(4, snapshot.routes().len());

    let route = snapshot.get_route(1).unwrap();
    assert_eq!("800", route.number);
    assert_eq!("Metrobus 800", route.description);
    assert_eq!(RGB8::new(0x97, 0xBF, 0x0D), route.color);
    assert_eq!(BusCategory::MetroBus, route.category);
    assert_eq!(BusCategory::LeBus, snapshot.get_route(3).unwrap().category);
    assert_eq!(BusCategory::Express, snapshot.get_route(4).unwrap().category);
    assert!(matches!(snapshot.get_route(42), Err(Error::ReferenceError(_))));
}

#[test]
fn routes_sharing_a_number() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_routes("fixtures/basic/routes.txt")
        .expect("impossible to read routes");

    let ids: HashSet<u32> = snapshot.routes_with_number("800").map(|r| r.id).collect();
    assert_eq!(vec![1, 3].into_iter().collect::<HashSet<_>>(), ids);
    assert_eq!(1, snapshot.routes_with_number("11").count());
    assert_eq!(0, snapshot.routes_with_number("999").count());
}

#[test]
fn route_reinserted_with_another_number() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_routes_from(rows(
            "routes.txt",
            "route_id,agency_id,route_short_name,route_long_name,route_desc,route_type,route_url,route_color\n\
             7,,\"800\",,first,3,,97BF0D\n\
             7,,\"801\",,second,3,,97BF0D\n",
        ))
        .expect("impossible to read routes");

    assert_eq!(1, snapshot.routes().len());
    assert_eq!("second", snapshot.get_route(7).unwrap().description);
    assert_eq!(0, snapshot.routes_with_number("800").count());
    assert_eq!(1, snapshot.routes_with_number("801").count());
}

#[test]
fn read_stops() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_stops("fixtures/basic/stops.txt")
        .expect("impossible to read stops");
    assert_eq!(5, snapshot.stops().len());

    let stop = snapshot.get_stop(2).unwrap();
    assert_eq!("Stop B", stop.name);
    assert_eq!("Corner B", stop.description);
    assert_eq!(Coordinates::new(46.779122, -71.268876), stop.coordinates);
    assert!(stop.stop_times.is_empty());
}

#[test]
fn read_services() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_services("fixtures/basic/calendar_dates.txt")
        .expect("impossible to read services");

    assert_eq!(1, snapshot.services().len());
    assert!(snapshot.is_service_active("weekday"));
    // removed on the date
    assert!(!snapshot.is_service_active("sunday"));
    // added on another date
    assert!(!snapshot.is_service_active("other"));
}

#[test]
fn read_trips_of_active_services() {
    let snapshot = read_until_trips();
    assert_eq!(2, snapshot.trips().len());
    assert_eq!("Downtown", snapshot.get_trip("T1").unwrap().headsign);
    assert_eq!(1, snapshot.get_trip("T1").unwrap().route_id);
    assert!(snapshot.get_trip("T3").is_ok());
    assert!(snapshot.get_trip("T2").is_err());
}

#[test]
fn trips_without_services() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_trips_for_date("fixtures/basic/trips.txt")
        .expect("impossible to read trips");
    assert!(snapshot.trips().is_empty());
}

#[test]
fn stop_times_before_trips_and_stops() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_stop_times_for_date("fixtures/basic/stop_times.txt")
        .expect("stop times of unknown trips should be ignored");
    assert_eq!(0, snapshot.stop_time_count());
    assert!(snapshot.trips().is_empty());
    assert!(snapshot.all_stop_times_loaded());
}

#[test]
fn stop_times_window_bounds() {
    let mut snapshot = read_until_trips();
    snapshot
        .add_stop_times_for_date_from(rows(
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,07:58:00,08:00:00,1,1\n\
             T1,09:00:00,09:00:00,2,2\n\
             T3,08:59:59,09:00:10,3,1\n",
        ))
        .expect("impossible to read stop times");

    assert_eq!(2, snapshot.stop_time_count());
    let t1 = snapshot.get_trip("T1").unwrap();
    assert_eq!(1, t1.stop_times.len());
    assert_eq!(1, t1.stop_times[0].stop_id);
    assert!(snapshot.get_stop(1).is_ok());
    assert!(snapshot.get_stop(2).is_err());
    assert!(snapshot.get_stop(3).is_ok());
}

#[test]
fn stop_times_of_unknown_stops() {
    let mut snapshot = read_until_trips();
    snapshot
        .add_stop_times_for_date_from(rows(
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,08:10:00,08:10:00,99,1\n",
        ))
        .expect("impossible to read stop times");
    assert_eq!(0, snapshot.stop_time_count());
    assert!(snapshot.trips().is_empty());
    assert!(snapshot.stops().is_empty());
}

#[test]
fn prune_trips_and_stops() {
    let mut snapshot = read_until_trips();
    snapshot
        .add_stop_times_for_date("fixtures/basic/stop_times.txt")
        .expect("impossible to read stop times");
    assert!(snapshot.all_stop_times_loaded());
    assert_eq!(2, snapshot.stop_time_count());

    assert_eq!(1, snapshot.trips().len());
    let trip = snapshot.get_trip("T1").unwrap();
    let sequences: Vec<u32> = trip.stop_times.iter().map(|st| st.stop_sequence).collect();
    assert_eq!(vec![2, 3], sequences);
    assert_eq!(TimeOfDay::from_hms(8, 10, 0), trip.stop_times[0].arrival_time);
    assert_eq!(TimeOfDay::from_hms(8, 50, 10), trip.stop_times[1].departure_time);
    // only after midnight
    assert!(snapshot.get_trip("T3").is_err());

    let stop_ids: HashSet<u32> = snapshot.stops().keys().copied().collect();
    assert_eq!(vec![2, 3].into_iter().collect::<HashSet<_>>(), stop_ids);

    let stop = snapshot.get_stop(2).unwrap();
    assert_eq!(1, stop.stop_times.len());
    assert!(Arc::ptr_eq(&stop.stop_times[0], &trip.stop_times[0]));
    assert_eq!("T1", stop.stop_times[0].trip_id);
}

#[test]
fn transfers_before_stop_times() {
    let mut snapshot = read_until_trips();
    let err = snapshot
        .add_transfers("fixtures/basic/transfers.txt")
        .expect_err("transfers read before the stop times");
    assert!(err.is_precondition());

    let err = snapshot
        .add_transfers("fixtures/basic/does_not_exist.txt")
        .expect_err("transfers read before the stop times");
    assert!(err.is_precondition());

    let err = snapshot
        .add_transfers_from(rows(
            "transfers.txt",
            "from_stop_id,to_stop_id,transfer_type,min_transfer_time\n2,3,2,60\n",
        ))
        .expect_err("transfers read before the stop times");
    assert!(err.is_precondition());
    assert!(snapshot.transfers().is_empty());
}

#[test]
fn read_transfers() {
    let mut snapshot = read_until_trips();
    snapshot
        .add_stop_times_for_date("fixtures/basic/stop_times.txt")
        .expect("impossible to read stop times");
    snapshot
        .add_transfers("fixtures/basic/transfers.txt")
        .expect("impossible to read transfers");

    assert_eq!(
        &[
            Transfer {
                from_stop_id: 2,
                to_stop_id: 3,
                min_transfer_time: 1,
            },
            Transfer {
                from_stop_id: 2,
                to_stop_id: 2,
                min_transfer_time: 180,
            },
        ],
        snapshot.transfers()
    );
    assert!(snapshot.is_transfer_stop(2));
    // destinations are not transfer stops
    assert!(!snapshot.is_transfer_stop(3));
    assert_eq!(1, snapshot.transfer_stops().len());
}

#[test]
fn missing_file() {
    let mut snapshot = GtfsSnapshot::new(&config());
    let err = snapshot
        .add_routes("fixtures/basic/does_not_exist.txt")
        .expect_err("the file does not exist");
    assert!(err.is_file_access());
    assert!(snapshot.routes().is_empty());
}

#[test]
fn malformed_row_leaves_catalog_untouched() {
    let mut snapshot = GtfsSnapshot::new(&config());
    let err = snapshot
        .add_stops_from(rows(
            "stops.txt",
            "stop_id,stop_name,stop_desc,stop_lat,stop_lon\n\
             1,Stop A,,46.77,-71.27\n\
             two,Stop B,,46.78,-71.26\n",
        ))
        .expect_err("the stop id is not a number");
    assert!(matches!(err, Error::InvalidRow { line: 3, .. }));
    assert!(snapshot.stops().is_empty());
}

#[test]
fn malformed_time() {
    let mut snapshot = read_until_trips();
    let err = snapshot
        .add_stop_times_for_date_from(rows(
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,8h10,08:10:00,2,1\n",
        ))
        .expect_err("the arrival time is invalid");
    assert!(matches!(err, Error::InvalidRow { .. }));
    assert!(!snapshot.all_stop_times_loaded());
    assert_eq!(2, snapshot.trips().len());
}

#[test]
fn stop_times_with_overflowing_hour() {
    let mut snapshot = read_until_trips();
    let err = snapshot
        .add_stop_times_for_date_from(rows(
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             T1,9999999:00:00,08:10:00,2,1\n",
        ))
        .expect_err("the arrival time does not fit in a day count");
    assert!(
        matches!(err, Error::InvalidRow { source, .. } if matches!(*source, Error::InvalidField { column: 1, .. }))
    );
    assert!(!snapshot.all_stop_times_loaded());
    assert_eq!(0, snapshot.stop_time_count());
}

#[test]
fn route_with_non_ascii_color() {
    let mut snapshot = GtfsSnapshot::new(&config());
    let err = snapshot
        .add_routes_from(rows(
            "routes.txt",
            "route_id,agency_id,route_short_name,route_long_name,route_desc,route_type,route_url,route_color\n\
             1,STQ,800,,Metrobus 800,3,,aébcd\n",
        ))
        .expect_err("the color is not hexadecimal");
    assert!(
        matches!(err, Error::InvalidRow { source, .. } if matches!(*source, Error::InvalidColor(_)))
    );
    assert!(snapshot.routes().is_empty());
}

#[test]
fn stop_reinserted() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_stops_from(rows(
            "stops.txt",
            "stop_id,stop_name,stop_desc,stop_lat,stop_lon\n\
             1,Stop A,Corner A,46.77,-71.27\n\
             1,Stop A moved,Corner B,46.78,-71.26\n",
        ))
        .expect("impossible to read stops");

    assert_eq!(1, snapshot.stops().len());
    let stop = snapshot.get_stop(1).unwrap();
    assert_eq!("Stop A moved", stop.name);
    assert_eq!("Corner B", stop.description);
    assert_eq!(Coordinates::new(46.78, -71.26), stop.coordinates);
}

#[test]
fn stop_name_keeps_its_spaces() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_stops_from(rows(
            "stops.txt",
            "stop_id,stop_name,stop_desc,stop_lat,stop_lon\n\
             1,\" Stop A\",,46.77,-71.27\n",
        ))
        .expect("impossible to read stops");
    assert_eq!(" Stop A", snapshot.get_stop(1).unwrap().name);
}

#[test]
fn trip_reinserted() {
    let mut snapshot = GtfsSnapshot::new(&config());
    snapshot
        .add_services("fixtures/basic/calendar_dates.txt")
        .expect("impossible to read services");
    snapshot
        .add_trips_for_date_from(rows(
            "trips.txt",
            "route_id,service_id,trip_id,trip_headsign\n\
             1,weekday,T1,Downtown\n\
             2,weekday,T1,Uptown\n",
        ))
        .expect("impossible to read trips");

    assert_eq!(1, snapshot.trips().len());
    let trip = snapshot.get_trip("T1").unwrap();
    assert_eq!("Uptown", trip.headsign);
    assert_eq!(2, trip.route_id);
}

#[test]
fn read_from_directory() {
    let snapshot =
        GtfsSnapshot::from_path("fixtures/basic", &config()).expect("impossible to read gtfs");
    assert_eq!(4, snapshot.routes().len());
    assert_eq!(1, snapshot.trips().len());
    assert_eq!(2, snapshot.stops().len());
    assert_eq!(2, snapshot.transfers().len());
    assert_eq!(None, snapshot.sha256());
}

#[test]
fn read_from_zip() {
    let snapshot = GtfsSnapshot::from_path("fixtures/zips/gtfs.zip", &config())
        .expect("impossible to read gtfs");
    assert_eq!(4, snapshot.routes().len());
    assert_eq!(1, snapshot.trips().len());
    assert_eq!(2, snapshot.stops().len());
    assert_eq!(2, snapshot.stop_time_count());
    assert_eq!(2, snapshot.transfers().len());
    assert_eq!(64, snapshot.sha256().unwrap().len());
}

#[test]
fn read_without_transfers_file() {
    let snapshot = GtfsSnapshot::from_path("fixtures/no_transfers", &config())
        .expect("impossible to read gtfs");
    assert!(snapshot.all_stop_times_loaded());
    assert!(snapshot.transfers().is_empty());
    assert_eq!(2, snapshot.stops().len());
}

#[test]
fn read_skipping_transfers() {
    let snapshot = SnapshotReader::default()
        .without_transfers()
        .read("fixtures/basic", &config())
        .expect("impossible to read gtfs");
    assert!(snapshot.transfers().is_empty());
    assert!(snapshot.transfer_stops().is_empty());
}

#[test]
fn read_neither_file_nor_directory() {
    let err = GtfsSnapshot::from_path("fixtures/nothing_here", &config())
        .expect_err("nothing to read");
    assert!(matches!(err, Error::NotFileNorDirectory(_)));
}

#[test]
fn read_config() {
    let config: SnapshotConfig = serde_json::from_str(
        r#"{"date": "20170115", "window_start": "08:00:00", "window_end": "25:30:00"}"#,
    )
    .expect("invalid config");
    assert_eq!(NaiveDate::from_ymd_opt(2017, 1, 15).unwrap(), config.date);
    assert_eq!(TimeOfDay::from_hms(25, 30, 0), config.window_end);

    let snapshot = GtfsSnapshot::new(&config);
    assert_eq!(config.window(), snapshot.window());

    assert!(serde_json::from_str::<SnapshotConfig>(
        r#"{"date": "2017-01-15", "window_start": "08:00:00", "window_end": "09:00:00"}"#
    )
    .is_err());
}
