use tracing::debug;
use crate::domain::models::{InsertBatch, Record};

/// Splits `text` into lines on `newline` and each line into fields on
/// `delimiter`. Empty lines, including the one after a trailing
/// newline, produce no record. Fields are kept verbatim with no quoting
/// rules applied.
pub fn split_records(text: &str, newline: &str, delimiter: &str) -> InsertBatch {
    debug!("Splitting {} bytes on newline {:?} and delimiter {:?}", text.len(), newline, delimiter);

    let mut records = Vec::new();
    let mut skipped = 0;

    for line in text.split(newline) {
        if line.is_empty() {
            skipped += 1;
            continue;
        }
        let fields = line.split(delimiter).map(str::to_string).collect();
        records.push(Record::new(fields));

        if records.len() % 1000 == 0 {
            debug!("Split {} records", records.len());
        }
    }

    if skipped > 0 {
        debug!("Skipped {} empty lines", skipped);
    }
    InsertBatch::new(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = "1234567,http://web.uk,left,2019-01-01T00:01:000Z,87646675465\n8901234,https://web.com,right,2020-01-01T00:00:000Z,99999999999";

    fn fields(batch: &InsertBatch, index: usize) -> Vec<&str> {
        batch.records()[index].fields().iter().map(String::as_str).collect()
    }

    #[test]
    fn splits_lines_and_fields_in_order() {
        let batch = split_records(BLOB, "\n", ",");
        assert_eq!(batch.len(), 2);
        assert_eq!(
            fields(&batch, 0),
            ["1234567", "http://web.uk", "left", "2019-01-01T00:01:000Z", "87646675465"]
        );
        assert_eq!(fields(&batch, 1)[1], "https://web.com");
    }

    #[test]
    fn trailing_newline_does_not_add_a_record() {
        let batch = split_records("a,b\nc,d\n", "\n", ",");
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn blank_lines_in_the_middle_are_skipped() {
        let batch = split_records("a,b\n\n\nc,d", "\n", ",");
        assert_eq!(batch.len(), 2);
        assert_eq!(fields(&batch, 1), ["c", "d"]);
    }

    #[test]
    fn empty_blob_yields_empty_batch() {
        assert!(split_records("", "\n", ",").is_empty());
    }

    #[test]
    fn delimiter_changes_fields_but_not_record_count() {
        let by_comma = split_records(BLOB, "\n", ",");
        let by_colon = split_records(BLOB, "\n", ":");
        assert_eq!(by_comma.len(), by_colon.len());
        assert_eq!(by_comma.records()[0].len(), 5);
        assert_eq!(by_colon.records()[0].len(), 4);
    }

    #[test]
    fn multi_character_tokens_are_supported() {
        let batch = split_records("a||b\r\nc||d||e\r\n", "\r\n", "||");
        assert_eq!(batch.len(), 2);
        assert_eq!(fields(&batch, 1), ["c", "d", "e"]);
    }

    #[test]
    fn empty_fields_are_preserved() {
        let batch = split_records("a,,c,", "\n", ",");
        assert_eq!(fields(&batch, 0), ["a", "", "c", ""]);
    }
}
