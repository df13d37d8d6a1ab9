//! Thin decoding of raw query replies.
//!
//! Full decoding of the remote store's compact protocol is a separate
//! concern; this module understands just enough of the reply shape for
//! catalog procedures and write statistics: an optional header row, an
//! optional block of scalar result rows, and the trailing statistic
//! lines.

use crate::error::{Error, Result};
use crate::transport::Reply;
use crate::value::Value;

/// Decoded result of one query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    /// Column names from the reply header, when one was present.
    pub columns: Vec<String>,
    /// Scalar rows.
    pub result_set: Vec<Vec<Value>>,
    /// Write/timing statistics.
    pub statistics: Statistics,
}

impl QueryResult {
    /// Decodes a raw reply.
    ///
    /// Accepted shapes: `[stats]` for write-only queries,
    /// `[header, rows]`, and `[header, rows, stats]`. An empty array
    /// decodes to an empty result.
    pub fn decode(reply: Reply) -> Result<Self> {
        let mut sections = reply.into_array()?;
        match sections.len() {
            0 => Ok(Self::default()),
            1 => {
                let statistics = Statistics::decode(sections.remove(0))?;
                Ok(Self {
                    statistics,
                    ..Self::default()
                })
            }
            2 | 3 => {
                let stats = if sections.len() == 3 {
                    Statistics::decode(sections.remove(2))?
                } else {
                    Statistics::default()
                };
                let rows = sections.remove(1).into_array()?;
                let header = sections.remove(0).into_array()?;
                Ok(Self {
                    columns: decode_header(header)?,
                    result_set: decode_rows(rows)?,
                    statistics: stats,
                })
            }
            n => Err(Error::Response(format!("reply has {n} sections"))),
        }
    }
}

fn decode_header(header: Vec<Reply>) -> Result<Vec<String>> {
    header
        .into_iter()
        .map(|column| match column {
            Reply::Text(name) => Ok(name),
            // Compact headers tag each column as [type, name].
            Reply::Array(parts) => match parts.into_iter().next_back() {
                Some(Reply::Text(name)) => Ok(name),
                other => Err(Error::Response(format!("bad header column: {other:?}"))),
            },
            other => Err(Error::Response(format!("bad header column: {other:?}"))),
        })
        .collect()
}

fn decode_rows(rows: Vec<Reply>) -> Result<Vec<Vec<Value>>> {
    rows.into_iter()
        .map(|row| row.into_array()?.into_iter().map(decode_scalar).collect())
        .collect()
}

fn decode_scalar(cell: Reply) -> Result<Value> {
    match cell {
        Reply::Nil => Ok(Value::Null),
        Reply::Integer(i) => Ok(Value::Int(i)),
        Reply::Text(s) => Ok(Value::Text(s)),
        // Compact value pairs [type, payload] collapse to their payload.
        Reply::Array(parts) => match parts.into_iter().next_back() {
            Some(payload) => decode_scalar(payload),
            None => Ok(Value::Null),
        },
    }
}

/// Write and timing statistics reported alongside a query reply.
///
/// The store reports these as `"Label: value"` text lines; unknown
/// labels are kept and reachable through [`Statistics::get`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    entries: Vec<(String, String)>,
}

impl Statistics {
    fn decode(reply: Reply) -> Result<Self> {
        let lines = reply.into_array()?;
        let mut entries = Vec::with_capacity(lines.len());
        for line in lines {
            let Some(text) = line.as_text() else {
                return Err(Error::Response(format!("bad statistic line: {line:?}")));
            };
            match text.split_once(": ") {
                Some((label, value)) => entries.push((label.to_owned(), value.to_owned())),
                None => entries.push((text.to_owned(), String::new())),
            }
        }
        Ok(Self { entries })
    }

    /// Returns the raw value reported under `label`, if any.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    fn count(&self, label: &str) -> u64 {
        self.get(label)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    /// Number of nodes created by the query.
    pub fn nodes_created(&self) -> u64 {
        self.count("Nodes created")
    }

    /// Number of nodes deleted by the query.
    pub fn nodes_deleted(&self) -> u64 {
        self.count("Nodes deleted")
    }

    /// Number of relationships created by the query.
    pub fn relationships_created(&self) -> u64 {
        self.count("Relationships created")
    }

    /// Number of relationships deleted by the query.
    pub fn relationships_deleted(&self) -> u64 {
        self.count("Relationships deleted")
    }

    /// Number of properties set by the query.
    pub fn properties_set(&self) -> u64 {
        self.count("Properties set")
    }

    /// Server-side execution time in milliseconds, when reported.
    pub fn execution_time_ms(&self) -> Option<f64> {
        let raw = self.get("Query internal execution time")?;
        raw.split_whitespace().next()?.parse().ok()
    }
}
