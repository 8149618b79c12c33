//! Parser for the station observation XML feed.
//!
//! Expected shape:
//!
//! ```xml
//! <observations timestamp="1700000000">
//!   <station>
//!     <name>Tallinn-Harku</name>
//!     <wmocode>26038</wmocode>
//!     <phenomenon>Light snow shower</phenomenon>
//!     <airtemperature>-2.1</airtemperature>
//!     <windspeed>4.7</windspeed>
//!     ...
//!   </station>
//! </observations>
//! ```

use quick_xml::{Reader, events::Event};

use super::{FeedError, ObservationDocument, StationObservation};

pub fn parse_observations(xml: &str) -> Result<ObservationDocument, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut timestamp = None;
    let mut stations = Vec::new();
    let mut current: Option<StationObservation> = None;
    let mut tag: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "observations" => timestamp = Some(read_timestamp(&e)?),
                    "station" => current = Some(StationObservation::default()),
                    _ => {}
                }
                tag = Some(name);
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"observations" {
                    timestamp = Some(read_timestamp(&e)?);
                }
            }
            Event::Text(t) => {
                if let (Some(station), Some(tag)) = (current.as_mut(), tag.as_deref()) {
                    let text = t.unescape()?.into_owned();
                    match tag {
                        "name" => station.name = text,
                        "wmocode" => station.wmo_code = text,
                        "airtemperature" => station.air_temperature = text,
                        "windspeed" => station.wind_speed = text,
                        "phenomenon" => station.phenomenon = text,
                        _ => {}
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"station" {
                    if let Some(station) = current.take() {
                        stations.push(station);
                    }
                }
                tag = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| FeedError::Malformed("missing <observations timestamp=...>".into()))?;

    Ok(ObservationDocument { timestamp, stations })
}

fn read_timestamp(e: &quick_xml::events::BytesStart<'_>) -> Result<i64, FeedError> {
    let attr = e
        .try_get_attribute("timestamp")
        .map_err(|err| FeedError::Malformed(err.to_string()))?
        .ok_or_else(|| FeedError::Malformed("missing timestamp attribute".into()))?;
    let value = attr.unescape_value()?;

    value
        .trim()
        .parse::<i64>()
        .map_err(|_| FeedError::Malformed(format!("invalid timestamp '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<observations timestamp="1700000000">
  <station>
    <name>Kuressaare linn</name>
    <wmocode></wmocode>
    <phenomenon>Clear</phenomenon>
    <airtemperature>3.1</airtemperature>
    <windspeed>2.0</windspeed>
  </station>
  <station>
    <name>Tallinn-Harku</name>
    <wmocode>26038</wmocode>
    <longitude>24.602891</longitude>
    <phenomenon>Light snow shower</phenomenon>
    <airtemperature>-2.1</airtemperature>
    <windspeed>4.7</windspeed>
  </station>
  <station>
    <name>P&#228;rnu</name>
    <wmocode>41803</wmocode>
    <phenomenon/>
    <airtemperature>0.4</airtemperature>
    <windspeed>11.3</windspeed>
  </station>
</observations>"#;

    #[test]
    fn parses_document_timestamp_and_all_stations() {
        let doc = parse_observations(SAMPLE).unwrap();

        assert_eq!(doc.timestamp, 1_700_000_000);
        assert_eq!(doc.stations.len(), 3);
        assert_eq!(
            doc.stations[1],
            StationObservation {
                name: "Tallinn-Harku".into(),
                wmo_code: "26038".into(),
                air_temperature: "-2.1".into(),
                wind_speed: "4.7".into(),
                phenomenon: "Light snow shower".into(),
            }
        );
    }

    #[test]
    fn empty_elements_read_as_empty_strings() {
        let doc = parse_observations(SAMPLE).unwrap();

        assert_eq!(doc.stations[0].wmo_code, "");
        assert_eq!(doc.stations[2].name, "Pärnu");
        assert_eq!(doc.stations[2].phenomenon, "");
        assert_eq!(doc.stations[2].wind_speed, "11.3");
    }

    #[test]
    fn document_without_stations_is_valid() {
        let doc = parse_observations(r#"<observations timestamp="42"/>"#).unwrap();
        assert_eq!(doc.timestamp, 42);
        assert!(doc.stations.is_empty());
    }

    #[test]
    fn missing_timestamp_is_malformed() {
        let err = parse_observations("<observations><station/></observations>").unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }

    #[test]
    fn non_numeric_timestamp_is_malformed() {
        let err = parse_observations(r#"<observations timestamp="soon"></observations>"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid timestamp 'soon'"));
    }

    #[test]
    fn broken_xml_is_an_error() {
        let broken = r#"<observations timestamp="1"><station></observations>"#;
        assert!(parse_observations(broken).is_err());
    }
}
