use crate::error::{FlattenError, Result};
use crate::flatten::types::{ParsePolicy, RecordParser};
use serde_json::{Map, Value};
use std::io::BufRead;

/// Decode one input line into a record.
///
/// `line` is 1-based and only used for error reporting.
pub fn parse_record(bytes: &[u8], line: usize, parser: RecordParser) -> Result<Map<String, Value>> {
    let value: Value = match parser {
        RecordParser::Serde => serde_json::from_slice(bytes).map_err(|e| FlattenError::Parse {
            line,
            message: e.to_string(),
        })?,
        RecordParser::Simd => {
            // simd-json parses in place, so it needs its own copy of the line
            let mut owned = bytes.to_vec();
            simd_json::serde::from_slice(&mut owned).map_err(|e| FlattenError::Parse {
                line,
                message: e.to_string(),
            })?
        }
    };

    match value {
        Value::Object(obj) => Ok(obj),
        _ => Err(FlattenError::NotAnObject { line }),
    }
}

/// Streams records out of newline-delimited JSON.
///
/// Blank lines are ignored. Malformed lines either end the stream with an
/// error or are skipped, depending on the `ParsePolicy`.
pub struct Records<R> {
    reader: R,
    parser: RecordParser,
    policy: ParsePolicy,
    line: usize,
    skipped: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> Records<R> {
    pub fn new(reader: R, parser: RecordParser, policy: ParsePolicy) -> Self {
        Records {
            reader,
            parser,
            policy,
            line: 0,
            skipped: 0,
            buf: Vec::new(),
        }
    }

    /// Malformed lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of the last line read
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Map<String, Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(FlattenError::Stream(e))),
            }
            self.line += 1;

            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match parse_record(&self.buf, self.line, self.parser) {
                Ok(record) => return Some(Ok(record)),
                Err(err) => match self.policy {
                    ParsePolicy::FailFast => return Some(Err(err)),
                    ParsePolicy::SkipAndWarn => {
                        tracing::warn!(line = self.line, error = %err, "skipping malformed record");
                        self.skipped += 1;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "{\"b\": 1, \"a\": {\"c\": 2}}\n\n   \n{\"d\": [1, 2]}\r\n";

    #[test]
    fn test_parsers_agree_and_keep_order() {
        for parser in [RecordParser::Serde, RecordParser::Simd] {
            let records: Vec<_> = Records::new(INPUT.as_bytes(), parser, ParsePolicy::FailFast)
                .collect::<Result<_>>()
                .unwrap();

            assert_eq!(records.len(), 2);
            let keys: Vec<_> = records[0].keys().cloned().collect();
            assert_eq!(keys, ["b", "a"]);
            assert!(records[1].contains_key("d"));
        }
    }

    #[test]
    fn test_serde_parser_keeps_number_text() {
        let line = br#"{"id": 12345678901234567890123, "tiny": 2.2250738585072011e-308, "huge": 1E400}"#;
        let record = parse_record(line, 1, RecordParser::Serde).unwrap();

        let text: Vec<_> = record.values().map(|v| v.to_string()).collect();
        assert_eq!(text, ["12345678901234567890123", "2.2250738585072011e-308", "1E400"]);
    }

    #[test]
    fn test_fail_fast_reports_line() {
        let input = "{\"a\": 1}\n{not json}\n{\"a\": 2}\n";
        let mut records = Records::new(input.as_bytes(), RecordParser::Serde, ParsePolicy::FailFast);

        assert!(records.next().unwrap().is_ok());
        let err = records.next().unwrap().unwrap_err();
        assert!(matches!(err, FlattenError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = parse_record(b"[1, 2]", 7, RecordParser::Serde).unwrap_err();
        assert!(matches!(err, FlattenError::NotAnObject { line: 7 }));

        let err = parse_record(b"\"text\"", 3, RecordParser::Simd).unwrap_err();
        assert!(matches!(err, FlattenError::NotAnObject { line: 3 }));
    }

    #[test]
    fn test_skip_and_warn_counts_skips() {
        let input = "{\"a\": 1}\n{oops\n42\n{\"a\": 2}\n";
        let mut records =
            Records::new(input.as_bytes(), RecordParser::Serde, ParsePolicy::SkipAndWarn);

        let parsed: Vec<_> = (&mut records).collect::<Result<_>>().unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(records.skipped(), 2);
        assert_eq!(records.line(), 4);
    }
}
