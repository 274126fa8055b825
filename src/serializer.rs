use crate::enrich::EnrichedRecord;
use serde_json::Value;
use thiserror::Error;

/// Error type returned by serializer implementations.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to encode record as JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How a batch of records is rendered by [`RecordSerializer::serialize_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// One JSON document per line (newline-delimited JSON).
    Newlines,
    /// A single JSON array containing every record.
    Json,
}

/// Generic serialization flags, passed through to the serializer unchanged
/// by the enricher.
#[derive(Debug, Clone)]
pub struct SerializeFlags {
    pub batch_mode: BatchMode,
    /// Append a trailing newline to single-record output.
    pub append_newline: bool,
    /// Drop top-level entries whose value is an empty object or array.
    pub ignore_empty: bool,
    /// Include exception stack traces when rendering context exceptions.
    pub include_stacktraces: bool,
}

impl Default for SerializeFlags {
    fn default() -> Self {
        SerializeFlags {
            batch_mode: BatchMode::Newlines,
            append_newline: true,
            ignore_empty: false,
            include_stacktraces: false,
        }
    }
}

/// Renders enriched records to JSON text.
///
/// The enricher hands over a fully-populated mapping; implementations own
/// the textual encoding and nothing else. Kept narrow so hosts can swap in
/// their own encoder without touching enrichment.
pub trait RecordSerializer: Send + Sync {
    /// Serialize a single record.
    ///
    /// **Parameters**
    /// - `record`: fully-enriched mapping produced by the enricher.
    /// - `flags`: generic serialization flags from the formatter config.
    ///
    /// **Returns**
    /// - `Ok(text)` with the encoded record, newline-terminated when
    ///   `flags.append_newline` is set.
    /// - `Err(..)` if the mapping contained a non-encodable value.
    fn serialize(&self, record: &EnrichedRecord, flags: &SerializeFlags) -> Result<String, FormatError>;

    /// Serialize a batch of records according to `flags.batch_mode`.
    ///
    /// Default implementation serializes each record individually and joins
    /// per the batch mode; implementations may override for efficiency.
    fn serialize_batch(
        &self,
        records: &[EnrichedRecord],
        flags: &SerializeFlags,
    ) -> Result<String, FormatError> {
        match flags.batch_mode {
            BatchMode::Newlines => {
                let line_flags = SerializeFlags { append_newline: false, ..flags.clone() };
                let mut lines = Vec::with_capacity(records.len());
                for record in records {
                    lines.push(self.serialize(record, &line_flags)?);
                }
                let mut out = lines.join("\n");
                if flags.append_newline {
                    out.push('\n');
                }
                Ok(out)
            }
            BatchMode::Json => {
                let values: Vec<Value> = records
                    .iter()
                    .map(|record| Value::Object(prepared(record, flags)))
                    .collect();
                let mut out = serde_json::to_string(&values)?;
                if flags.append_newline {
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }
}

/// Default serializer backed by `serde_json`.
#[derive(Clone, Default)]
pub struct JsonSerializer;

impl RecordSerializer for JsonSerializer {
    fn serialize(&self, record: &EnrichedRecord, flags: &SerializeFlags) -> Result<String, FormatError> {
        let mut out = serde_json::to_string(&Value::Object(prepared(record, flags)))?;
        if flags.append_newline {
            out.push('\n');
        }
        Ok(out)
    }
}

fn prepared(record: &EnrichedRecord, flags: &SerializeFlags) -> EnrichedRecord {
    if !flags.ignore_empty {
        return record.clone();
    }
    record
        .iter()
        .filter(|(_, value)| !is_empty_container(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> EnrichedRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn single_record_gets_trailing_newline() {
        let rec = record(&[("severity", json!("INFO"))]);
        let out = JsonSerializer.serialize(&rec, &SerializeFlags::default()).unwrap();
        assert!(out.ends_with('\n'));
        assert_eq!(out.trim_end(), r#"{"severity":"INFO"}"#);

        let flags = SerializeFlags { append_newline: false, ..Default::default() };
        let out = JsonSerializer.serialize(&rec, &flags).unwrap();
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn ignore_empty_drops_hollow_containers() {
        let rec = record(&[
            ("message", json!("hi")),
            ("empty_map", json!({})),
            ("empty_list", json!([])),
            ("zero", json!(0)),
        ]);
        let flags = SerializeFlags { ignore_empty: true, append_newline: false, ..Default::default() };
        let out = JsonSerializer.serialize(&rec, &flags).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert!(value.get("empty_map").is_none());
        assert!(value.get("empty_list").is_none());
        assert_eq!(value["zero"], 0);
    }

    #[test]
    fn batch_newlines_emits_one_line_per_record() {
        let records = vec![
            record(&[("message", json!("a"))]),
            record(&[("message", json!("b"))]),
        ];
        let out = JsonSerializer.serialize_batch(&records, &SerializeFlags::default()).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn batch_newlines_honors_the_newline_flag() {
        let records = vec![
            record(&[("message", json!("a"))]),
            record(&[("message", json!("b"))]),
        ];
        let flags = SerializeFlags { append_newline: false, ..Default::default() };
        let out = JsonSerializer.serialize_batch(&records, &flags).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn batch_json_emits_an_array() {
        let records = vec![
            record(&[("message", json!("a"))]),
            record(&[("message", json!("b"))]),
        ];
        let flags = SerializeFlags {
            batch_mode: BatchMode::Json,
            append_newline: false,
            ..Default::default()
        };
        let out = JsonSerializer.serialize_batch(&records, &flags).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(2));
        assert_eq!(value[1]["message"], "b");
    }
}
