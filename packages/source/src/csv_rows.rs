//! Itinerary CSV row parser.
//!
//! Reads the spreadsheet export with the `csv` crate and yields one
//! [`ItineraryRow`] per data record. Columns are addressed by header name,
//! so the sheet owner can reorder or add columns freely.

use trip_map_itinerary_models::ItineraryRow;

use crate::SourceError;
use crate::parsing::parse_lat_lng;

const PLACE_HEADERS: &[&str] = &["lieu", "place"];
const TITLE_HEADERS: &[&str] = &["titre", "title"];
const DATE_HEADERS: &[&str] = &["date"];
const DESCRIPTION_HEADERS: &[&str] = &["description"];
const TRANSPORT_HEADERS: &[&str] = &["transport"];
const LAT_HEADERS: &[&str] = &["lat", "latitude"];
const LNG_HEADERS: &[&str] = &["lng", "lon", "longitude"];

/// Positions of the known columns in the header row.
#[derive(Debug, Clone, Default)]
struct ColumnIndex {
    place: Option<usize>,
    title: Option<usize>,
    date: Option<usize>,
    description: Option<usize>,
    transport: Option<usize>,
    lat: Option<usize>,
    lng: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));

        Self {
            place: find(PLACE_HEADERS),
            title: find(TITLE_HEADERS),
            date: find(DATE_HEADERS),
            description: find(DESCRIPTION_HEADERS),
            transport: find(TRANSPORT_HEADERS),
            lat: find(LAT_HEADERS),
            lng: find(LNG_HEADERS),
        }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parses the raw feed text into a lazy sequence of rows.
///
/// # Errors
///
/// Returns [`SourceError::MalformedInput`] if the payload is empty after
/// trimming or its header line carries no column names. Individual bad
/// records are skipped with a warning instead.
pub fn parse_rows(text: &str) -> Result<RowIter<'_>, SourceError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SourceError::MalformedInput {
            message: "itinerary feed is empty".to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(trimmed.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SourceError::MalformedInput {
            message: format!("unreadable header line: {e}"),
        })?
        .clone();

    if headers.iter().all(|h| normalize_header(h).is_empty()) {
        return Err(SourceError::MalformedInput {
            message: "header line has no column names".to_string(),
        });
    }

    let columns = ColumnIndex::from_headers(&headers);
    if columns.place.is_none() {
        log::warn!(
            "Itinerary header has no place column (expected one of {PLACE_HEADERS:?}), \
             no rows will be produced: {:?}",
            headers.iter().collect::<Vec<_>>()
        );
    }

    Ok(RowIter {
        records: reader.into_records(),
        columns,
        header_len: headers.len(),
    })
}

/// Iterator over the data rows of an itinerary feed.
///
/// Rows without a place are skipped, so the number of rows produced is at
/// most the number of data records.
pub struct RowIter<'a> {
    records: csv::StringRecordsIntoIter<&'a [u8]>,
    columns: ColumnIndex,
    header_len: usize,
}

impl Iterator for RowIter<'_> {
    type Item = ItineraryRow;

    fn next(&mut self) -> Option<Self::Item> {
        let place_idx = self.columns.place?;

        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("Skipping malformed itinerary record: {e}");
                    continue;
                }
            };

            let spill_idx = self
                .columns
                .description
                .unwrap_or(self.header_len.saturating_sub(1));
            let fields = fold_overflow(&record, self.header_len, place_idx, spill_idx);
            let get = |idx: Option<usize>| cell(&fields, idx);

            let place = get(Some(place_idx));
            if place.is_empty() {
                log::debug!(
                    "Skipping itinerary record without a place at line {}",
                    record.position().map_or(0, csv::Position::line)
                );
                continue;
            }

            let transport = get(self.columns.transport);
            let coordinates = match (self.columns.lat, self.columns.lng) {
                (Some(_), Some(_)) => parse_lat_lng(get(self.columns.lat), get(self.columns.lng)),
                _ => None,
            };

            return Some(ItineraryRow {
                place: place.to_string(),
                title: get(self.columns.title).to_string(),
                date: get(self.columns.date).to_string(),
                description: get(self.columns.description).to_string(),
                transport: (!transport.is_empty()).then(|| transport.to_string()),
                coordinates,
            });
        }
    }
}

fn cell(fields: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| fields.get(i)).map_or("", |s| s.trim())
}

/// Returns the record's fields, folding surplus fields back into one cell.
///
/// An unquoted `Paris, France` splits into two fields. When a record has
/// more non-empty fields than the header has columns, the surplus is joined
/// back with commas into the place cell, unless that cell already holds a
/// comma. A comma inside a field means it was quoted, so the surplus came
/// from a free-text column and is joined into `spill_idx` instead. Trailing
/// empty fields past the header width are ignored.
fn fold_overflow(
    record: &csv::StringRecord,
    header_len: usize,
    place_idx: usize,
    spill_idx: usize,
) -> Vec<String> {
    let used = record
        .iter()
        .collect::<Vec<_>>()
        .iter()
        .rposition(|f| !f.trim().is_empty())
        .map_or(0, |i| i + 1);
    let width = used.max(header_len).min(record.len());
    let overflow = width.saturating_sub(header_len);

    let fields: Vec<&str> = record.iter().take(width).collect();
    if overflow == 0 || place_idx >= fields.len() {
        return fields.into_iter().map(str::to_string).collect();
    }

    let target = if fields[place_idx].contains(',') {
        log::warn!(
            "Record has {overflow} surplus field(s) and a quoted place, \
             joining them into column {spill_idx}"
        );
        spill_idx
    } else {
        log::debug!("Folding {overflow} surplus field(s) into the place cell");
        place_idx
    };

    let merged_end = target + overflow + 1;
    let mut out = Vec::with_capacity(header_len);
    out.extend(fields[..target].iter().map(|s| (*s).to_string()));
    out.push(fields[target..merged_end].join(","));
    out.extend(fields[merged_end..].iter().map(|s| (*s).to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(text: &str) -> Vec<ItineraryRow> {
        parse_rows(text).unwrap().collect()
    }

    #[test]
    fn parses_rows_by_header_name() {
        let parsed = rows(
            "date,titre,lieu,description\n\
             2024-01-01,Arrival,\"Paris, France\",First day\n",
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].place, "Paris, France");
        assert_eq!(parsed[0].title, "Arrival");
        assert_eq!(parsed[0].date, "2024-01-01");
        assert_eq!(parsed[0].description, "First day");
        assert_eq!(parsed[0].transport, None);
        assert_eq!(parsed[0].coordinates, None);
    }

    #[test]
    fn accepts_english_headers_and_bom() {
        let parsed = rows("\u{feff}Place,Title,Date\nLisbon,Tram,2024-03-02\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].place, "Lisbon");
        assert_eq!(parsed[0].title, "Tram");
    }

    #[test]
    fn pads_short_rows_with_empty_strings() {
        let parsed = rows("lieu,titre,date,description\n\"Rome, Italy\"\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].place, "Rome, Italy");
        assert_eq!(parsed[0].title, "");
        assert_eq!(parsed[0].date, "");
        assert_eq!(parsed[0].description, "");
    }

    #[test]
    fn skips_blank_lines_and_rows_without_place() {
        let parsed = rows(
            "lieu,titre,date,description\n\
             \n\
             Berlin,Day one,2024-02-01,\n\
             ,Orphan,2024-02-02,No place\n\
             \n\
             Prague,Day two,2024-02-03,\n",
        );
        let places: Vec<_> = parsed.iter().map(|r| r.place.as_str()).collect();
        assert_eq!(places, ["Berlin", "Prague"]);
    }

    #[test]
    fn folds_unquoted_place_commas() {
        let parsed = rows(
            "lieu,titre,date,description\n\
             Paris, France,Arrival,2024-01-01,First day\n\
             Vienna, Austria,Concert,2024-01-05,Second day\n",
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].place, "Paris, France");
        assert_eq!(parsed[0].title, "Arrival");
        assert_eq!(parsed[0].date, "2024-01-01");
        assert_eq!(parsed[1].place, "Vienna, Austria");
        assert_eq!(parsed[1].description, "Second day");
    }

    #[test]
    fn quoted_place_keeps_description_commas() {
        let parsed = rows(
            "lieu,titre,date,description\n\
             \"Paris, France\",Arrival,2024-01-01,Great day, really\n",
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].place, "Paris, France");
        assert_eq!(parsed[0].title, "Arrival");
        assert_eq!(parsed[0].date, "2024-01-01");
        assert_eq!(parsed[0].description, "Great day, really");
    }

    #[test]
    fn description_commas_do_not_shift_later_columns() {
        let parsed = rows(
            "lieu,titre,date,description,transport\n\
             \"Vienna, Austria\",Opera,2024-01-05,Late, loud, great,Train\n",
        );
        assert_eq!(parsed[0].place, "Vienna, Austria");
        assert_eq!(parsed[0].description, "Late, loud, great");
        assert_eq!(parsed[0].transport.as_deref(), Some("Train"));
    }

    #[test]
    fn ignores_trailing_empty_fields() {
        let parsed = rows("lieu,titre,date,description\nOslo,Fjord,2024-04-01,Cold,,\n");
        assert_eq!(parsed[0].place, "Oslo");
        assert_eq!(parsed[0].description, "Cold");
    }

    #[test]
    fn reads_transport_and_pre_resolved_coordinates() {
        let parsed = rows(
            "lieu,titre,date,description,transport,lat,lng\n\
             Madrid,Tapas,2024-05-01,,Train,40.4168,-3.7038\n\
             Seville,Heat,2024-05-04,,,not-a-number,\n",
        );
        assert_eq!(parsed[0].transport.as_deref(), Some("Train"));
        let coords = parsed[0].coordinates.unwrap();
        assert!((coords.latitude - 40.4168).abs() < 1e-9);
        assert_eq!(parsed[1].transport, None);
        assert_eq!(parsed[1].coordinates, None);
    }

    #[test]
    fn never_yields_more_rows_than_records() {
        let text = "lieu,titre,date,description\na,,,\n,,,\nb,,,\nc,,,\n";
        let data_rows = text.lines().count() - 1;
        let non_empty = 3;
        let parsed = rows(text);
        assert!(parsed.len() <= data_rows);
        assert!(parsed.len() >= non_empty);
    }

    #[test]
    fn missing_place_column_yields_nothing() {
        let parsed = rows("titre,date\nArrival,2024-01-01\n");
        assert!(parsed.is_empty());
    }

    #[test]
    fn empty_payload_is_malformed() {
        assert!(matches!(
            parse_rows("  \n \n"),
            Err(SourceError::MalformedInput { .. })
        ));
    }

    #[test]
    fn blank_header_is_malformed() {
        assert!(matches!(
            parse_rows(",,\nParis,x,y\n"),
            Err(SourceError::MalformedInput { .. })
        ));
    }

    #[test]
    fn header_only_yields_no_rows() {
        assert!(rows("lieu,titre,date,description").is_empty());
    }
}
