//! Parsing probe responses into lookup-table rows.

use tracing::warn;

use crate::ortho::OrthoUrlRecord;

/// Parses one settled probe into a lookup row.
///
/// `raw` is the Content-Disposition header joined to the probed URL with
/// a `__` separator, so the URL's trailing ID digits and the filename
/// markers are all reachable by position:
///
/// - the URL ID is the longest all-digit suffix of 2 to 6 characters;
/// - the year is the 4 characters after the filename's `th` marker
///   (e.g. `..._th_2019.zip` probed at `...id=200123`);
/// - the tile number is the 8 characters after `_32_`, falling back to
///   the 8 characters after a bare `_32`.
///
/// Probes whose filename carries no tile marker are header junk (archive
/// listings, non-tile attachments) and are silently discarded. Returns
/// `None` for those and for rows whose fields do not parse.
pub fn parse_probe(raw: &str) -> Option<OrthoUrlRecord> {
    let url_id = trailing_id(raw)?;

    let tile_number = match tile_number(raw) {
        Some(tile) if tile != "tachment" => tile,
        _ => return None,
    };

    let th_position = raw.find("th")?;
    let year = match raw
        .get(th_position + 3..th_position + 7)
        .and_then(|y| y.parse::<i32>().ok())
    {
        Some(year) => year,
        None => {
            warn!(url_id, "Probe response carries no parseable year, skipping");
            return None;
        }
    };

    Some(OrthoUrlRecord {
        url_id,
        year,
        tile_number: tile_number.to_string(),
    })
}

/// Extracts the numeric ID a failed probe was issued for.
///
/// Failed probes settle to the bare URL, whose ID parameter is the same
/// trailing digit run the success path uses.
pub fn trailing_id(raw: &str) -> Option<u64> {
    for width in (2..=6).rev() {
        if raw.len() < width {
            continue;
        }
        let suffix = raw.get(raw.len() - width..)?;
        if suffix.bytes().all(|b| b.is_ascii_digit()) {
            return suffix.parse().ok();
        }
    }
    None
}

fn tile_number(raw: &str) -> Option<&str> {
    if let Some(position) = raw.find("_32_") {
        return raw.get(position + 4..position + 12);
    }
    let position = raw.find("_32")?;
    raw.get(position + 3..position + 11)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str =
        "https://geoportal.geoportal-th.de/gaialight-th/_apps/dladownload/download.php?type=op&id=";

    fn raw(disposition: &str, id: u64) -> String {
        format!("{}__{}{}", disposition, URL, id)
    }

    #[test]
    fn test_parses_full_probe() {
        let raw = raw("attachment; filename=\"dop20rgbi_32_650_5606_1_th_2019.zip\"", 200123);
        let record = parse_probe(&raw).unwrap();
        assert_eq!(record.url_id, 200123);
        assert_eq!(record.year, 2019);
        assert_eq!(record.tile_number, "650_5606");
    }

    #[test]
    fn test_tile_marker_without_trailing_underscore() {
        let raw = raw("attachment; filename=\"dop_32650_5606_th_2016.zip\"", 20042);
        let record = parse_probe(&raw).unwrap();
        assert_eq!(record.url_id, 20042);
        assert_eq!(record.year, 2016);
        assert_eq!(record.tile_number, "650_5606");
    }

    #[test]
    fn test_junk_attachment_is_discarded() {
        // No tile marker in the filename: the row is header junk.
        let raw = raw("attachment; filename=\"readme.zip\"", 200001);
        assert!(parse_probe(&raw).is_none());
    }

    #[test]
    fn test_trailing_id_widths() {
        assert_eq!(trailing_id(&format!("{}42", URL)), Some(42));
        assert_eq!(trailing_id(&format!("{}200123", URL)), Some(200123));
        // A 7-digit run never matches as a whole; the longest probed
        // suffix is 6 digits.
        assert_eq!(trailing_id(&format!("{}1234567", URL)), Some(234567));
    }

    #[test]
    fn test_trailing_id_requires_digits() {
        assert_eq!(trailing_id("no digits here"), None);
        assert_eq!(trailing_id(&format!("{}4x", URL)), None);
    }

    #[test]
    fn test_unparseable_year_is_skipped() {
        let raw = raw("attachment; filename=\"dop_32_650_5606.zip\"", 200001);
        assert!(parse_probe(&raw).is_none());
    }
}
