//! Row Field Accessor
//!
//! A row is an ordered list of field strings taken from one delimited line.
//! Field order is load-bearing: every inserted column shifts its right-hand
//! neighbours, so the pipeline assembles output rows with `RowBuilder`
//! instead of chaining positional inserts.

use crate::error::{EnrichError, Result};

/// One delimited record, positionally addressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Split a raw line on `delimiter`. No quoting or escaping is honoured.
    ///
    /// A trailing carriage return is dropped so CRLF input behaves like LF.
    pub fn parse(line: &str, delimiter: char) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        Self {
            fields: line.split(delimiter).map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    /// Insert `value` at `index`, shifting later fields right.
    ///
    /// `index == len` appends; anything past that is a column error.
    pub fn insert(&mut self, index: usize, value: impl Into<String>) -> Result<()> {
        if index > self.fields.len() {
            return Err(EnrichError::Column {
                index,
                len: self.fields.len(),
            });
        }
        self.fields.insert(index, value.into());
        Ok(())
    }

    /// Append empty fields until the row holds `len` fields.
    ///
    /// Returns how many fields were added.
    pub fn pad_to(&mut self, len: usize) -> usize {
        let missing = len.saturating_sub(self.fields.len());
        self.fields.extend(std::iter::repeat_with(String::new).take(missing));
        missing
    }

    pub fn to_line(&self, delimiter: char) -> String {
        let mut buf = [0u8; 4];
        self.fields.join(&*delimiter.encode_utf8(&mut buf))
    }
}

/// Append-only row assembly in a single fixed field order.
#[derive(Debug, Default)]
pub struct RowBuilder {
    fields: Vec<String>,
}

impl RowBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: impl Into<String>) -> &mut Self {
        self.fields.push(value.into());
        self
    }

    pub fn extend<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn build(self) -> Row {
        Row::new(self.fields)
    }
}
