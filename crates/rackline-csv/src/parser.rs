//! CSV tokenizing into header and record maps.

use crate::error::CsvImportError;
use indexmap::IndexMap;

/// Column name to optional related-object accessor (`site.slug` maps `site`
/// to `Some("slug")`). Keeps header order.
pub type CsvHeaderMap = IndexMap<String, Option<String>>;

/// Column name to stripped cell value for one data row.
pub type CsvRecord = IndexMap<String, String>;

/// Parsed CSV input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvImport {
    pub headers: CsvHeaderMap,
    pub records: Vec<CsvRecord>,
}

/// Split a header into its field name and optional accessor.
///
/// Only the first dot separates: `a.b.c` yields `("a", Some("b.c"))`. A
/// trailing dot with nothing after it (`site.`) carries no accessor.
pub fn split_header(header: &str) -> (String, Option<String>) {
    match header.split_once('.') {
        Some((field, to_field)) => (
            field.to_string(),
            Some(to_field.to_string()).filter(|t| !t.is_empty()),
        ),
        None => (header.to_string(), None),
    }
}

/// Parse already-tokenized rows. The first row holds the column headers.
pub fn parse_rows<I, R, S>(rows: I) -> Result<CsvImport, CsvImportError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rows = rows.into_iter();
    let header_row = rows.next().ok_or(CsvImportError::EmptyInput)?;

    let mut headers = CsvHeaderMap::new();
    for header in header_row {
        let (field, to_field) = split_header(header.as_ref());
        headers.insert(field, to_field);
    }
    if headers.is_empty() {
        return Err(CsvImportError::EmptyInput);
    }

    let mut records = Vec::new();
    for (i, row) in rows.enumerate() {
        let cells: Vec<String> = row
            .into_iter()
            .map(|cell| cell.as_ref().trim().to_string())
            .collect();
        if cells.len() != headers.len() {
            return Err(CsvImportError::RowArity {
                row: i + 1,
                expected: headers.len(),
                found: cells.len(),
            });
        }
        records.push(headers.keys().cloned().zip(cells).collect());
    }

    tracing::debug!(
        columns = headers.len(),
        records = records.len(),
        "Parsed CSV data"
    );

    Ok(CsvImport { headers, records })
}

/// Tokenize CSV text and parse it.
///
/// Surrounding whitespace is trimmed first. Values containing commas or line
/// breaks may be wrapped in double quotes. A blank line inside the data is an
/// empty row, so it fails the column count with its own row number.
pub fn parse_csv(text: &str) -> Result<CsvImport, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.trim().as_bytes());

    let mut rows = Vec::new();
    let mut next_line: u64 = 1;
    for result in reader.records() {
        let record = result?;
        if let Some(pos) = record.position() {
            // The reader drops blank lines; the gap before this record holds them.
            while next_line < pos.line() {
                rows.push(Vec::new());
                next_line += 1;
            }
            let spanned: u64 = record.iter().map(|f| f.matches('\n').count() as u64).sum();
            next_line = pos.line() + 1 + spanned;
        }
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    parse_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headers_and_records() {
        let parsed = parse_csv("name,site.slug,status\nrouter1 , dc1,active\nrouter2,dc2, planned").unwrap();

        assert_eq!(parsed.headers.len(), 3);
        assert_eq!(parsed.headers["name"], None);
        assert_eq!(parsed.headers["site"], Some("slug".to_string()));
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0]["name"], "router1");
        assert_eq!(parsed.records[0]["site"], "dc1");
        assert_eq!(parsed.records[1]["status"], "planned");
    }

    #[test]
    fn test_header_order_preserved() {
        let parsed = parse_csv("z,a,m\n1,2,3").unwrap();
        let keys: Vec<_> = parsed.headers.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_split_on_first_dot_only() {
        assert_eq!(
            split_header("tenant.group.slug"),
            ("tenant".to_string(), Some("group.slug".to_string()))
        );
    }

    #[test]
    fn test_quoted_values() {
        let parsed = parse_csv("name,description\nsw1,\"core, row 3\"").unwrap();
        assert_eq!(parsed.records[0]["description"], "core, row 3");
    }

    #[test]
    fn test_row_arity_reports_one_based_index() {
        let err = parse_csv("name,status\na,active\nb\nc,active").unwrap_err();
        match err {
            CsvImportError::RowArity { row, expected, found } => {
                assert_eq!(row, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            parse_csv("a,b\n1,2,3").unwrap_err().to_string(),
            "Row 1: Expected 2 columns but found 3"
        );
    }

    #[test]
    fn test_blank_line_is_an_empty_row() {
        let err = parse_csv("name,status\na,active\n\nb,planned").unwrap_err();
        assert_eq!(err.to_string(), "Row 2: Expected 2 columns but found 0");

        let err = parse_csv("name,status\n\na,b,c").unwrap_err();
        assert_eq!(err.to_string(), "Row 1: Expected 2 columns but found 0");
    }

    #[test]
    fn test_quoted_line_break_keeps_row_numbers() {
        let parsed = parse_csv("name,description\nsw1,\"row 3\nrack 2\"\nsw2,edge").unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0]["description"], "row 3\nrack 2");
        assert_eq!(parsed.records[1]["name"], "sw2");
    }

    #[test]
    fn test_trailing_dot_has_no_accessor() {
        assert_eq!(split_header("site."), ("site".to_string(), None));
        let parsed = parse_csv("site.,name\ndc1,a").unwrap();
        assert_eq!(parsed.headers["site"], None);
    }

    #[test]
    fn test_header_only_yields_no_records() {
        let parsed = parse_rows(vec![vec!["name", "slug"]]).unwrap();
        assert_eq!(parsed.headers.len(), 2);
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_csv("   \n"), Err(CsvImportError::EmptyInput)));
        let no_rows: Vec<Vec<&str>> = Vec::new();
        assert!(matches!(parse_rows(no_rows), Err(CsvImportError::EmptyInput)));
    }

    #[test]
    fn test_record_count_matches_rows() {
        for n in 0..20 {
            let mut rows = vec![vec!["a".to_string(), "b".to_string()]];
            for i in 0..n {
                rows.push(vec![format!("x{i}"), format!("y{i}")]);
            }
            let parsed = parse_rows(rows).unwrap();
            assert_eq!(parsed.records.len(), n);
        }
    }
}
