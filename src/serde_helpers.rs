use crate::objects::TimeOfDay;
use chrono::NaiveDate;
use rgb::RGB8;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::Serializer;

pub fn parse_date(s: &str) -> Result<NaiveDate, crate::Error> {
    let mk_err = || crate::Error::InvalidDate(s.to_owned());

    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(mk_err());
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| mk_err())
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s).map_err(de::Error::custom)
}

pub fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.format("%Y%m%d").to_string())
}

fn parse_time_impl(h: &str, m: &str, s: &str) -> Option<u32> {
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    let seconds: u32 = s.parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)
}

/// Parses `H:MM:SS` into seconds, hours can go over 23 for trips running after midnight
pub fn parse_time(s: &str) -> Result<u32, crate::Error> {
    let mk_err = || crate::Error::InvalidTime(s.to_owned());

    if s.len() < 7 {
        Err(mk_err())
    } else {
        let mut parts = s.split(':');

        let hour = parts.next().ok_or_else(mk_err)?;
        let min = parts.next().ok_or_else(mk_err)?;
        let sec = parts.next().ok_or_else(mk_err)?;
        if parts.next().is_some() {
            return Err(mk_err());
        }

        if hour.is_empty() || min.len() != 2 || sec.len() != 2 {
            return Err(mk_err());
        }

        parse_time_impl(hour, min, sec).ok_or_else(mk_err)
    }
}

pub fn format_time(time: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time / 3600,
        time % 3600 / 60,
        time % 60
    )
}

pub fn deserialize_time<'de, D>(deserializer: D) -> Result<TimeOfDay, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(de::Error::custom)
}

pub fn serialize_time<S>(time: &TimeOfDay, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_time(time.seconds()))
}

pub fn parse_color(
    s: &str,
    default: impl std::ops::FnOnce() -> RGB8,
) -> Result<RGB8, crate::Error> {
    if s.is_empty() {
        return Ok(default());
    }
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(crate::Error::InvalidColor(s.to_owned()));
    }
    let r =
        u8::from_str_radix(&s[0..2], 16).map_err(|_| crate::Error::InvalidColor(s.to_owned()))?;
    let g =
        u8::from_str_radix(&s[2..4], 16).map_err(|_| crate::Error::InvalidColor(s.to_owned()))?;
    let b =
        u8::from_str_radix(&s[4..6], 16).map_err(|_| crate::Error::InvalidColor(s.to_owned()))?;
    Ok(RGB8::new(r, g, b))
}

pub fn serialize_color<S>(color: &RGB8, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(format!("{:02X}{:02X}{:02X}", color.r, color.g, color.b).as_str())
}

pub fn default_route_color() -> RGB8 {
    RGB8::new(255, 255, 255)
}

#[test]
fn test_parse_time() {
    assert_eq!(3600 + 60 + 1, parse_time("01:01:01").unwrap());
    assert_eq!((25 * 3600) + (35 * 60) + 42, parse_time("25:35:42").unwrap());
    assert_eq!(8 * 3600, parse_time("8:00:00").unwrap());
    assert!(parse_time("08:00").is_err());
    assert!(parse_time("08:0:000").is_err());
    assert!(parse_time("aa:00:00").is_err());
    assert!(parse_time("08:00:00:00").is_err());
    assert!(parse_time("08:60:00").is_err());
    assert!(parse_time("08:00:75").is_err());
    assert!(matches!(
        parse_time("9999999:00:00"),
        Err(crate::Error::InvalidTime(_))
    ));
}

#[test]
fn test_parse_date() {
    assert_eq!(
        NaiveDate::from_ymd_opt(2017, 1, 15),
        parse_date("20170115").ok()
    );
    assert!(parse_date("2017015").is_err());
    assert!(parse_date("20170230").is_err());
    assert!(parse_date("2017-01-15").is_err());
}

#[test]
fn test_parse_color() {
    assert_eq!(
        RGB8::new(0x97, 0xBF, 0x0D),
        parse_color("97bf0d", default_route_color).unwrap()
    );
    assert_eq!(
        default_route_color(),
        parse_color("", default_route_color).unwrap()
    );
    assert!(parse_color("12345", default_route_color).is_err());
    assert!(parse_color("GGGGGG", default_route_color).is_err());
    assert!(matches!(
        parse_color("aébcd", default_route_color),
        Err(crate::Error::InvalidColor(_))
    ));
}

#[test]
fn test_serialize_time() {
    #[derive(Serialize, Deserialize)]
    struct Test {
        #[serde(
            deserialize_with = "deserialize_time",
            serialize_with = "serialize_time"
        )]
        time: TimeOfDay,
    }
    let data_in = "time\n172:35:42\n";
    let parsed: Test = csv::Reader::from_reader(data_in.as_bytes())
        .deserialize()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!((172 * 3600) + (35 * 60) + 42, parsed.time.seconds());

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.serialize(parsed).unwrap();
    let data_out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    assert_eq!(data_in, data_out);
}
