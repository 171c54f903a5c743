use gtfs_snapshot::{GtfsSnapshot, SnapshotConfig, TimeOfDay};

fn main() {
    let config = SnapshotConfig::new(
        chrono::NaiveDate::from_ymd_opt(2017, 1, 15).expect("invalid date"),
        TimeOfDay::from_hms(8, 0, 0),
        TimeOfDay::from_hms(9, 0, 0),
    );
    // a directory or a zip archive
    let snapshot =
        GtfsSnapshot::from_path("fixtures/basic", &config).expect("impossible to read gtfs");
    snapshot.print_stats();

    for route in snapshot.routes_with_number("800") {
        println!("{}", route);
    }

    let trip = snapshot.get_trip("T1").expect("no trip T1 in the window");
    for stop_time in &trip.stop_times {
        let stop = snapshot
            .get_stop(stop_time.stop_id)
            .expect("stops of a trip are always kept");
        println!(
            "{} at {}: {} transfer stop",
            stop_time.departure_time,
            stop,
            if snapshot.is_transfer_stop(stop.id) {
                "is a"
            } else {
                "not a"
            }
        );
    }
}
