//! Delimited text previews (CSV, TSV)
//!
//! Parsing is lenient: quoted fields may span lines and contain delimiters,
//! and records may have any length. A quoted field that never closes is
//! reported, and the records from its line on are read without quoting
//! instead of collapsing into one field. The decoded text is always kept as
//! a fallback.

use super::{BuildRequest, decode_prefix, line_break_offsets};
use crate::preview::limits::PreviewLimits;
use crate::preview::registry;
use crate::preview::types::{BuiltPreview, Delimiter, PreviewContent};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;

/// Records inspected per candidate when sniffing the delimiter
const SNIFF_RECORDS: usize = 10;

/// Build a table preview from a fetched prefix
#[must_use]
pub fn build(request: &BuildRequest<'_>, limits: &PreviewLimits) -> BuiltPreview {
    let byte_truncated = request.is_byte_truncated();
    let raw_text = decode_prefix(request.bytes, byte_truncated);
    let body = raw_text.strip_prefix('\u{FEFF}').unwrap_or(&raw_text);

    let delimiter = if registry::extension(request.key) == "tsv" {
        Delimiter::Tab
    } else {
        sniff_delimiter(body)
    };

    let keep = limits.max_table_rows + 1;
    let unclosed = unclosed_quote(body, delimiter);
    let (parsed, parse_error) = match unclosed {
        // An open quote at the end of a cut prefix is just the cut record.
        Some(start) if !byte_truncated => parse_around_unclosed(body, delimiter, keep, start),
        _ => (parse_records(body, delimiter, keep, true), None),
    };
    let mut records = parsed.records;

    // A cut prefix that does not end on a line break ends mid-record.
    let ends_mid_record =
        byte_truncated && (unclosed.is_some() || !raw_text.ends_with(['\n', '\r']));
    if !parsed.more && ends_mid_record {
        records.pop();
    }

    let widest = records.iter().map(StringRecord::len).max().unwrap_or(0);
    let column_count = widest.min(limits.max_table_columns);
    let truncated_columns = widest > limits.max_table_columns;
    let truncated_rows = parsed.more || byte_truncated;

    let mut records = records.into_iter();
    let columns = records
        .next()
        .map(|header| header_labels(&header, column_count))
        .unwrap_or_default();
    let rows = records
        .map(|record| {
            (0..column_count)
                .map(|idx| record.get(idx).unwrap_or_default().to_string())
                .collect()
        })
        .collect();

    let message = match parse_error {
        Some(err) => Some(format!("{err}. Raw text is available as a fallback.")),
        None => limit_message(truncated_rows, truncated_columns).map(str::to_string),
    };

    BuiltPreview {
        content: PreviewContent::Table {
            columns,
            rows,
            truncated_rows,
            truncated_columns,
            raw_text,
            delimiter,
        },
        is_truncated: truncated_rows || truncated_columns,
        message,
    }
}

struct ParsedRecords {
    records: Vec<StringRecord>,
    more: bool,
}

/// Read up to `keep` non-blank records, noting whether another follows
fn parse_records(text: &str, delimiter: Delimiter, keep: usize, quoting: bool) -> ParsedRecords {
    let mut parsed = ParsedRecords {
        records: Vec::new(),
        more: false,
    };

    let records = reader(text, delimiter, quoting)
        .into_records()
        .filter_map(Result::ok)
        .filter(|record| !is_blank(record));
    for record in records {
        if parsed.records.len() == keep {
            parsed.more = true;
            break;
        }
        parsed.records.push(record);
    }

    parsed
}

/// Parse a body whose quoted field opened in the record at `start` never
/// closes
///
/// Records before `start` parse normally. The rest is read with quoting off,
/// so its lines still become rows. The error is only reported when the
/// affected records are part of the preview.
fn parse_around_unclosed(
    text: &str,
    delimiter: Delimiter,
    keep: usize,
    start: usize,
) -> (ParsedRecords, Option<String>) {
    let (head, tail) = text.split_at(start);
    let mut parsed = parse_records(head, delimiter, keep, true);
    if parsed.more {
        return (parsed, None);
    }

    let rest = parse_records(tail, delimiter, keep - parsed.records.len(), false);
    parsed.records.extend(rest.records);
    parsed.more = rest.more;

    let line = line_break_offsets(head).count() + 1;
    (parsed, Some(format!("Quoted field unterminated on line {line}")))
}

/// Byte offset of the record holding a quoted field that is still open at
/// the end of `text`
///
/// A quote opens a field only at the start of the field; inside a quoted
/// field a doubled quote is an escaped quote.
fn unclosed_quote(text: &str, delimiter: Delimiter) -> Option<usize> {
    let delimiter = delimiter.as_byte();
    let mut record_start = 0;
    let mut field_start = true;
    let mut quoted = false;

    let mut bytes = text.bytes().enumerate().peekable();
    while let Some((idx, byte)) = bytes.next() {
        if quoted {
            if byte == b'"' && bytes.next_if(|&(_, next)| next == b'"').is_none() {
                quoted = false;
            }
            continue;
        }
        match byte {
            b'"' if field_start => {
                quoted = true;
                field_start = false;
            }
            b'\n' | b'\r' => {
                field_start = true;
                record_start = idx + 1;
            }
            _ if byte == delimiter => field_start = true,
            _ => field_start = false,
        }
    }

    quoted.then_some(record_start)
}

/// Pick the candidate whose sampled records most consistently split into
/// the same number of fields
///
/// Candidates that never produce more than one field are ignored. Ties keep
/// the earlier candidate; with no usable candidate the result is a comma.
fn sniff_delimiter(text: &str) -> Delimiter {
    let mut best: Option<(Delimiter, (usize, usize))> = None;

    for candidate in Delimiter::CANDIDATES {
        let mut frequencies: HashMap<usize, usize> = HashMap::new();
        reader(text, candidate, true)
            .into_records()
            .filter_map(Result::ok)
            .filter(|record| !is_blank(record))
            .take(SNIFF_RECORDS)
            .for_each(|record| *frequencies.entry(record.len()).or_default() += 1);

        let modal = frequencies
            .into_iter()
            .max_by_key(|&(fields, seen)| (seen, fields))
            .map(|(fields, seen)| (seen, fields));

        if let Some(score) = modal
            && score.1 > 1
            && best.is_none_or(|(_, current)| score > current)
        {
            best = Some((candidate, score));
        }
    }

    best.map_or(Delimiter::Comma, |(delimiter, _)| delimiter)
}

fn reader(text: &str, delimiter: Delimiter, quoting: bool) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(quoting)
        .delimiter(delimiter.as_byte())
        .from_reader(text.as_bytes())
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn header_labels(header: &StringRecord, column_count: usize) -> Vec<String> {
    (0..column_count)
        .map(|idx| match header.get(idx).map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("Column {}", idx + 1),
        })
        .collect()
}

const fn limit_message(truncated_rows: bool, truncated_columns: bool) -> Option<&'static str> {
    match (truncated_rows, truncated_columns) {
        (true, true) => Some("Preview limited to the first rows and columns for performance."),
        (true, false) => Some("Preview limited to the first rows for performance."),
        (false, true) => Some("Preview limited to the first columns for readability."),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(key: &'static str, bytes: &'static [u8]) -> BuildRequest<'static> {
        BuildRequest {
            key,
            bytes,
            byte_limit: 1 << 20,
            object_size: Some(bytes.len() as u64),
        }
    }

    struct Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        truncated_rows: bool,
        truncated_columns: bool,
        delimiter: Delimiter,
    }

    fn table(built: &BuiltPreview) -> Table {
        match &built.content {
            PreviewContent::Table {
                columns,
                rows,
                truncated_rows,
                truncated_columns,
                delimiter,
                ..
            } => Table {
                columns: columns.clone(),
                rows: rows.clone(),
                truncated_rows: *truncated_rows,
                truncated_columns: *truncated_columns,
                delimiter: *delimiter,
            },
            other => panic!("expected table content, got {}", other.kind()),
        }
    }

    #[test]
    fn test_simple_csv() {
        let built = build(
            &complete("people.csv", b"name,city\nAlice,NYC\nBob,LA\n"),
            &PreviewLimits::default(),
        );
        let table = table(&built);
        assert_eq!(table.columns, vec!["name", "city"]);
        assert_eq!(
            table.rows,
            vec![vec!["Alice", "NYC"], vec!["Bob", "LA"]]
        );
        assert!(!table.truncated_rows);
        assert!(!table.truncated_columns);
        assert!(!built.is_truncated);
        assert!(built.message.is_none());
    }

    #[test]
    fn test_quoted_fields_keep_delimiters_and_quotes() {
        let built = build(
            &complete(
                "q.csv",
                b"name,city,note\n\"Bob\",\"Bangkok\",\"comma, inside\"\n\"Ann\",\"Oslo\",\"say \"\"hi\"\"\"\n",
            ),
            &PreviewLimits::default(),
        );
        let table = table(&built);
        assert_eq!(table.rows[0], vec!["Bob", "Bangkok", "comma, inside"]);
        assert_eq!(table.rows[1], vec!["Ann", "Oslo", "say \"hi\""]);
    }

    #[test]
    fn test_tsv_uses_tab() {
        let built = build(
            &complete("data.tsv", b"a,b\tc\n1,2\t3\n"),
            &PreviewLimits::default(),
        );
        let table = table(&built);
        assert_eq!(table.delimiter, Delimiter::Tab);
        assert_eq!(table.columns, vec!["a,b", "c"]);
    }

    #[test]
    fn test_sniffs_semicolon() {
        let built = build(
            &complete("eu.csv", b"name;price\nTea;1,50\nCake;3,20\n"),
            &PreviewLimits::default(),
        );
        let table = table(&built);
        assert_eq!(table.delimiter, Delimiter::Semicolon);
        assert_eq!(table.rows[0], vec!["Tea", "1,50"]);
    }

    #[test]
    fn test_single_column_defaults_to_comma() {
        assert_eq!(sniff_delimiter("alpha\nbeta\n"), Delimiter::Comma);
        assert_eq!(sniff_delimiter(""), Delimiter::Comma);
        assert_eq!(sniff_delimiter("a|b|c\n1|2|3\n"), Delimiter::Pipe);
    }

    #[test]
    fn test_headers_and_padding() {
        let built = build(
            &complete("h.csv", b" id ,,\n1\n2,x,y\n"),
            &PreviewLimits::default(),
        );
        let table = table(&built);
        assert_eq!(table.columns, vec!["id", "Column 2", "Column 3"]);
        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["2", "x", "y"]);
    }

    #[test]
    fn test_blank_records_are_skipped() {
        let built = build(
            &complete("b.csv", b"a,b\n , \n1,2\n\n3,4\n"),
            &PreviewLimits::default(),
        );
        assert_eq!(table(&built).rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_row_and_column_caps() {
        let limits = PreviewLimits {
            max_table_rows: 2,
            max_table_columns: 2,
            ..PreviewLimits::default()
        };
        let built = build(
            &complete("big.csv", b"a,b,c\n1,2,3\n4,5,6\n7,8,9\n"),
            &limits,
        );
        let table = table(&built);
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["4", "5"]]);
        assert!(table.truncated_rows);
        assert!(table.truncated_columns);
        assert!(built.is_truncated);
        assert_eq!(
            built.message.as_deref(),
            Some("Preview limited to the first rows and columns for performance.")
        );
    }

    #[test]
    fn test_exact_row_cap_is_not_truncated() {
        let limits = PreviewLimits {
            max_table_rows: 2,
            ..PreviewLimits::default()
        };
        let built = build(&complete("r.csv", b"a,b\n1,2\n3,4\n"), &limits);
        assert!(!table(&built).truncated_rows);
        assert!(built.message.is_none());
    }

    #[test]
    fn test_column_only_message() {
        let limits = PreviewLimits {
            max_table_columns: 1,
            ..PreviewLimits::default()
        };
        let built = build(&complete("c.csv", b"a,b\n1,2\n"), &limits);
        assert_eq!(
            built.message.as_deref(),
            Some("Preview limited to the first columns for readability.")
        );
    }

    #[test]
    fn test_partial_final_record_is_dropped() {
        let request = BuildRequest {
            key: "cut.csv",
            bytes: b"a,b\n1,2\n3,4\n5,",
            byte_limit: 15,
            object_size: Some(4096),
        };
        let built = build(&request, &PreviewLimits::default());
        let table = table(&built);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
        assert!(table.truncated_rows);
        assert!(built.is_truncated);
        assert_eq!(
            built.message.as_deref(),
            Some("Preview limited to the first rows for performance.")
        );
        match &built.content {
            PreviewContent::Table { raw_text, .. } => assert!(raw_text.ends_with("5,")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_cut_on_line_break_keeps_last_record() {
        let request = BuildRequest {
            key: "cut.csv",
            bytes: b"a,b\n1,2\n",
            byte_limit: 8,
            object_size: Some(4096),
        };
        let built = build(&request, &PreviewLimits::default());
        assert_eq!(table(&built).rows, vec![vec!["1", "2"]]);
        assert!(built.is_truncated);
    }

    #[test]
    fn test_empty_object() {
        let built = build(&complete("empty.csv", b""), &PreviewLimits::default());
        let table = table(&built);
        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
        assert!(!built.is_truncated);
    }

    #[test]
    fn test_bom_is_not_part_of_first_label() {
        let built = build(
            &complete("bom.csv", "\u{FEFF}id,name\n1,a\n".as_bytes()),
            &PreviewLimits::default(),
        );
        assert_eq!(table(&built).columns, vec!["id", "name"]);
    }

    #[test]
    fn test_more_rows_never_shrinks_truncation() {
        let limits = PreviewLimits {
            max_table_rows: 1,
            ..PreviewLimits::default()
        };
        let short = build(&complete("m.csv", b"a\n1\n"), &limits);
        let long = build(&complete("m.csv", b"a\n1\n2\n"), &limits);
        assert!(!short.is_truncated);
        assert!(long.is_truncated);
    }

    #[test]
    fn test_unterminated_quote_is_reported() {
        let built = build(
            &complete("people.csv", b"name,city\n\"Bob,Bangkok\nAlice,NYC\nCarol,LA\n"),
            &PreviewLimits::default(),
        );
        let table = table(&built);
        assert_eq!(table.columns, ["name", "city"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["\"Bob", "Bangkok"],
                vec!["Alice", "NYC"],
                vec!["Carol", "LA"],
            ]
        );
        assert!(!built.is_truncated);
        assert_eq!(
            built.message.as_deref(),
            Some("Quoted field unterminated on line 2. Raw text is available as a fallback.")
        );
    }

    #[test]
    fn test_unterminated_quote_past_row_cap_is_not_reported() {
        let limits = PreviewLimits {
            max_table_rows: 1,
            ..PreviewLimits::default()
        };
        let built = build(&complete("a.csv", b"a,b\n1,2\n3,4\n\"5,6\n"), &limits);
        let table = table(&built);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
        assert!(table.truncated_rows);
        assert_eq!(
            built.message.as_deref(),
            Some("Preview limited to the first rows for performance.")
        );
    }

    #[test]
    fn test_quote_open_at_cut_is_a_partial_record() {
        let request = BuildRequest {
            key: "cut.csv",
            bytes: b"a,b\n1,2\n3,\"multi\nline",
            byte_limit: 21,
            object_size: Some(4096),
        };
        let built = build(&request, &PreviewLimits::default());
        let table = table(&built);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
        assert!(table.truncated_rows);
        assert_eq!(
            built.message.as_deref(),
            Some("Preview limited to the first rows for performance.")
        );
    }

    #[test]
    fn test_escaped_quotes_do_not_open_fields() {
        assert_eq!(unclosed_quote("a,\"say \"\"hi\"\"\"\nb,c\n", Delimiter::Comma), None);
        assert_eq!(unclosed_quote("a,b\"c\n", Delimiter::Comma), None);
        assert_eq!(unclosed_quote("a,b\r\n\"c\n", Delimiter::Comma), Some(5));
    }
}
