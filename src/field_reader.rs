use crate::error::LineError;
use crate::Error;
use csv::StringRecord;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Builds an object from the fields of one line, columns are read by position
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, Error>;
}

/// The fields of a data line, quotes already removed
pub struct Row<'a> {
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    pub fn new(record: &'a StringRecord) -> Self {
        Row { record }
    }

    pub fn get(&self, column: usize) -> Result<&'a str, Error> {
        self.record.get(column).ok_or(Error::MissingField(column))
    }

    pub fn parse<T>(&self, column: usize) -> Result<T, Error>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.get(column)?;
        value.parse().map_err(|e: T::Err| Error::InvalidField {
            column,
            value: value.to_owned(),
            reason: e.to_string(),
        })
    }
}

/// Reads a comma separated GTFS file, skipping its header line
pub struct FieldReader<R> {
    file_name: String,
    headers: StringRecord,
    reader: csv::Reader<BufReader<R>>,
}

impl FieldReader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("invalid_file_name")
            .to_string();
        if !path.exists() {
            return Err(Error::MissingFile(file_name));
        }
        let file = File::open(path).map_err(|e| Error::NamedFileIO {
            file_name: file_name.to_owned(),
            source: e,
        })?;
        Self::from_reader(file, &file_name)
    }
}

impl<R: Read> FieldReader<R> {
    pub fn from_reader(reader: R, file_name: &str) -> Result<Self, Error> {
        let mut buffered = BufReader::new(reader);
        let starts_with_bom = buffered
            .fill_buf()
            .map_err(|e| Error::NamedFileIO {
                file_name: file_name.to_owned(),
                source: e,
            })?
            .starts_with(&UTF8_BOM);
        if starts_with_bom {
            buffered.consume(UTF8_BOM.len());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(buffered);
        // We store the headers to be able to return them in case of errors
        let headers = reader
            .headers()
            .map_err(|e| Error::CSVError {
                file_name: file_name.to_owned(),
                source: e,
                line_in_error: None,
            })?
            .clone();

        Ok(FieldReader {
            file_name: file_name.to_owned(),
            headers,
            reader,
        })
    }

    /// Parses every data line, stopping at the first one in error
    pub fn read_all<O: FromRow>(self) -> Result<Vec<O>, Error> {
        let FieldReader {
            file_name,
            headers,
            mut reader,
        } = self;
        let mut res = Vec::new();
        for rec in reader.records() {
            let r = rec.map_err(|e| Error::CSVError {
                file_name: file_name.to_owned(),
                source: e,
                line_in_error: None,
            })?;
            let o = O::from_row(&Row::new(&r)).map_err(|e| Error::InvalidRow {
                file_name: file_name.to_owned(),
                line: r.position().map(|p| p.line()).unwrap_or_default(),
                source: Box::new(e),
                line_in_error: LineError {
                    headers: headers.iter().map(|s| s.to_owned()).collect(),
                    values: r.iter().map(|s| s.to_owned()).collect(),
                },
            })?;
            res.push(o);
        }

        Ok(res)
    }
}
