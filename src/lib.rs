/*! A snapshot of a [GTFS](https://gtfs.org/) feed restricted to a single date and a single time window

The snapshot keeps the routes and the stops of the feed, the services running on the date,
the trips of those services and their stop times within the window. Trips and stops left
without any stop time are then removed, and only the transfers between the remaining stops
are kept.

```
let config = gtfs_snapshot::SnapshotConfig::new(
    chrono::NaiveDate::from_ymd_opt(2017, 1, 15).unwrap(),
    "08:00:00".parse()?,
    "09:00:00".parse()?,
);
let snapshot = gtfs_snapshot::GtfsSnapshot::from_path("fixtures/basic", &config)?;
assert!(snapshot.all_stop_times_loaded());
# Ok::<(), gtfs_snapshot::Error>(())
```

To build it step by step (from other sources than files for instance), see [GtfsSnapshot].
*/
#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod error;
pub mod field_reader;
mod objects;
mod serde_helpers;
mod snapshot;
mod snapshot_reader;

#[cfg(test)]
mod tests;

pub use error::Error;
pub use field_reader::{FieldReader, FromRow, Row};
pub use objects::*;
pub use snapshot::GtfsSnapshot;
pub use snapshot_reader::{SnapshotConfig, SnapshotReader};
