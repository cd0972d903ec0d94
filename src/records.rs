use std::{borrow::Cow, fmt, fs::File, io, path::Path};

use csv::{ByteRecord, StringRecord};
use encoding_rs::Encoding;

use crate::error::Result;

/// A single cell of an uploaded or enriched table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form of the value, `None` for nulls.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(Cow::Borrowed(s)),
            Value::Integer(i) => Some(Cow::Owned(i.to_string())),
            Value::Float(f) => Some(Cow::Owned(f.to_string())),
        }
    }

    /// Coerces the value to `Value::Text`, leaving nulls alone.
    pub fn to_text(&self) -> Value {
        match self.as_text() {
            Some(text) => Value::Text(text.into_owned()),
            None => Value::Null,
        }
    }

    /// Null when the value is null or an empty string.
    pub fn non_empty_text(&self) -> Option<Cow<'_, str>> {
        self.as_text().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Column-named rows. Every row holds exactly one value per header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Pads short rows with nulls and drops extra trailing values.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.headers.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Appends a column. Missing values are null, extra values are ignored.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.headers.push(name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or_default());
        }
    }

    pub fn rename_column(&mut self, from: &str, to: impl Into<String>) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.headers[idx] = to.into();
                true
            }
            None => false,
        }
    }

    /// Replaces every value of a column in place. Returns false when the
    /// column does not exist.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };

        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }

        true
    }

    /// Overwrites a column with the given values, row by row.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };

        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }

        true
    }
}

pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let file = File::open(path)?;
    // The CSV reader is buffered automatically, so it does not needed to
    // wrap rdr in a buffered reader like io::BufReader
    let mut rdr = csv::Reader::from_reader(file);

    let mut table = Table::new(rdr.headers()?.iter());
    for record in rdr.records() {
        let record = record?;
        table.push_row(record.iter().map(cell).collect());
    }

    Ok(table)
}

pub fn write_table<W: io::Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.headers())?;

    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.as_text().unwrap_or_default().into_owned()))?;
    }

    wtr.flush()?;

    Ok(())
}

/// Decodes every field of a raw record from a single-byte encoding.
pub fn decode_record(record: &ByteRecord, encoding: &'static Encoding) -> StringRecord {
    record
        .iter()
        .map(|field| encoding.decode_without_bom_handling(field).0)
        .collect()
}

fn cell(field: &str) -> Value {
    if field.is_empty() {
        Value::Null
    } else {
        Value::Text(field.to_owned())
    }
}
