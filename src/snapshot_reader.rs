use crate::field_reader::FieldReader;
use crate::objects::{TimeOfDay, TimeWindow};
use crate::serde_helpers::{deserialize_date, serialize_date};
use crate::{Error, GtfsSnapshot};
use chrono::{NaiveDate, Utc};
use sha2::digest::Digest;
use sha2::Sha256;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

const ROUTES: &str = "routes.txt";
const STOPS: &str = "stops.txt";
const CALENDAR_DATES: &str = "calendar_dates.txt";
const TRIPS: &str = "trips.txt";
const STOP_TIMES: &str = "stop_times.txt";
const TRANSFERS: &str = "transfers.txt";

/// The date and the time window a snapshot is restricted to
///
/// ```
/// let config: gtfs_snapshot::SnapshotConfig = serde_json::from_str(
///     r#"{"date": "20170115", "window_start": "08:00:00", "window_end": "09:00:00"}"#,
/// )?;
/// assert_eq!("[08:00:00, 09:00:00)", config.window().to_string());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(
        deserialize_with = "deserialize_date",
        serialize_with = "serialize_date"
    )]
    pub date: NaiveDate,
    pub window_start: TimeOfDay,
    /// Excluded from the window
    pub window_end: TimeOfDay,
}

impl SnapshotConfig {
    pub fn new(date: NaiveDate, window_start: TimeOfDay, window_end: TimeOfDay) -> Self {
        Self {
            date,
            window_start,
            window_end,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.window_start, self.window_end)
    }
}

/// Allows to parameterize how a whole feed is read
///
/// The files are always read in the order the snapshot needs them.
#[derive(Derivative)]
#[derivative(Default, Debug)]
pub struct SnapshotReader {
    /// `transfers.txt` is optional in a feed and can be skipped altogether
    #[derivative(Default(value = "true"))]
    pub read_transfers: bool,
}

impl SnapshotReader {
    /// Configures the reader to not read the transfers
    ///
    /// Returns Self and can be chained
    pub fn without_transfers(&mut self) -> &mut Self {
        self.read_transfers = false;
        self
    }

    /// Reads a local path, either a directory or a zipped file
    pub fn read<P: AsRef<Path>>(
        &self,
        path: P,
        config: &SnapshotConfig,
    ) -> Result<GtfsSnapshot, Error> {
        let p = path.as_ref();
        if p.is_file() {
            let reader = File::open(p)?;
            self.read_zip(reader, config)
        } else if p.is_dir() {
            self.read_directory(p, config)
        } else {
            Err(Error::NotFileNorDirectory(format!("{}", p.display())))
        }
    }

    fn read_directory(&self, p: &Path, config: &SnapshotConfig) -> Result<GtfsSnapshot, Error> {
        let now = Utc::now();
        let mut snapshot = GtfsSnapshot::new(config);
        snapshot.add_routes(p.join(ROUTES))?;
        snapshot.add_stops(p.join(STOPS))?;
        snapshot.add_services(p.join(CALENDAR_DATES))?;
        snapshot.add_trips_for_date(p.join(TRIPS))?;
        snapshot.add_stop_times_for_date(p.join(STOP_TIMES))?;
        if self.read_transfers {
            let transfers = p.join(TRANSFERS);
            if transfers.exists() {
                snapshot.add_transfers(transfers)?;
            } else {
                info!("no {} in {}, no transfer loaded", TRANSFERS, p.display());
            }
        }
        snapshot.read_duration = Utc::now().signed_duration_since(now).num_milliseconds();
        Ok(snapshot)
    }

    /// Reads a zip archive, the files can be in any sub directory
    pub fn read_zip<T: Read + Seek>(
        &self,
        reader: T,
        config: &SnapshotConfig,
    ) -> Result<GtfsSnapshot, Error> {
        let now = Utc::now();
        let mut hasher = Sha256::new();
        let mut buf_reader = std::io::BufReader::new(reader);
        let _n = std::io::copy(&mut buf_reader, &mut hasher)?;
        let hash = hasher.finalize();
        let mut archive = zip::ZipArchive::new(buf_reader)?;
        let mut file_mapping = HashMap::new();

        for i in 0..archive.len() {
            let archive_file = archive.by_index(i)?;
            for gtfs_file in &[ROUTES, STOPS, CALENDAR_DATES, TRIPS, STOP_TIMES, TRANSFERS] {
                let path = std::path::Path::new(archive_file.name());
                if path.file_name() == Some(std::ffi::OsStr::new(gtfs_file)) {
                    file_mapping.insert(*gtfs_file, i);
                    break;
                }
            }
        }

        let mut snapshot = GtfsSnapshot::new(config);
        snapshot.add_routes_from(open_in_archive(&file_mapping, &mut archive, ROUTES)?)?;
        snapshot.add_stops_from(open_in_archive(&file_mapping, &mut archive, STOPS)?)?;
        snapshot.add_services_from(open_in_archive(
            &file_mapping,
            &mut archive,
            CALENDAR_DATES,
        )?)?;
        snapshot.add_trips_for_date_from(open_in_archive(&file_mapping, &mut archive, TRIPS)?)?;
        snapshot.add_stop_times_for_date_from(open_in_archive(
            &file_mapping,
            &mut archive,
            STOP_TIMES,
        )?)?;
        if self.read_transfers {
            if file_mapping.contains_key(TRANSFERS) {
                snapshot.add_transfers_from(open_in_archive(
                    &file_mapping,
                    &mut archive,
                    TRANSFERS,
                )?)?;
            } else {
                info!("no {} in the archive, no transfer loaded", TRANSFERS);
            }
        }
        snapshot.read_duration = Utc::now().signed_duration_since(now).num_milliseconds();
        snapshot.sha256 = Some(format!("{:x}", hash));
        Ok(snapshot)
    }
}

fn open_in_archive<'a, T>(
    file_mapping: &HashMap<&str, usize>,
    archive: &'a mut zip::ZipArchive<T>,
    file_name: &str,
) -> Result<FieldReader<zip::read::ZipFile<'a>>, Error>
where
    T: Read + Seek,
{
    let i = file_mapping
        .get(file_name)
        .ok_or_else(|| Error::MissingFile(file_name.to_owned()))?;
    let file = archive.by_index(*i).map_err(|e| match e {
        zip::result::ZipError::Io(source) => Error::NamedFileIO {
            file_name: file_name.to_owned(),
            source,
        },
        e => Error::Zip(e),
    })?;
    FieldReader::from_reader(file, file_name)
}
