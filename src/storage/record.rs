//! Delimited record parsing.
//!
//! Every backing file is one record per line, fields separated by a fixed
//! delimiter, with an optional header line. A line that cannot be parsed is
//! rejected on its own; the rest of the file still loads.
//!
//! Fields are split by a `csv` reader configured for these files: no
//! quoting, every field trimmed, and a field count that may vary per line.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{AppError, Result};

/// Description of one flat-file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFormat {
    /// Name used in logs and errors
    pub name: &'static str,

    /// Field separator, an ASCII byte
    pub delimiter: u8,

    /// First field of the header line, if the file carries one
    pub header_token: &'static str,

    /// Lines with fewer fields are rejected
    pub min_fields: usize,
}

impl RecordFormat {
    pub const fn new(
        name: &'static str,
        delimiter: u8,
        header_token: &'static str,
        min_fields: usize,
    ) -> Self {
        Self {
            name,
            delimiter,
            header_token,
            min_fields,
        }
    }

    /// Whether a line is this format's header.
    ///
    /// The header token is matched exactly and must be followed by the
    /// delimiter or end the line, so a data row whose ID merely begins
    /// with the token, or spells it in another case, stays data.
    pub fn is_header(&self, line: &str) -> bool {
        let token = self.header_token;
        let Some(rest) = line.trim_start().strip_prefix(token) else {
            return false;
        };
        !token.is_empty()
            && rest
                .trim_start()
                .chars()
                .next()
                .is_none_or(|c| c == char::from(self.delimiter))
    }

    /// Split one line into trimmed fields.
    pub fn parse_line(&self, line: &str) -> Result<Vec<String>> {
        let fields = split_fields(self.delimiter, line)
            .map_err(|e| AppError::malformed(self.name, e))?;

        if fields.len() < self.min_fields {
            return Err(AppError::malformed(
                self.name,
                format!(
                    "expected at least {} fields, found {}",
                    self.min_fields,
                    fields.len()
                ),
            ));
        }
        Ok(fields)
    }

    /// Iterate over the data lines of a whole file.
    ///
    /// Yields the 1-based line number with either the fields or the reason
    /// the line was rejected. Blank lines are skipped, and the first
    /// non-blank line is dropped when it is a header.
    pub fn records<'a>(
        &'a self,
        content: &'a str,
    ) -> impl Iterator<Item = (usize, Result<Vec<String>>)> + 'a {
        let mut first = true;
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter(move |(_, line)| {
                let skip = first && self.is_header(line);
                first = false;
                !skip
            })
            .map(move |(idx, line)| (idx + 1, self.parse_line(line)))
    }

    /// The header line of a file, if its first non-blank line is one.
    pub fn header_of(&self, content: &str) -> Option<String> {
        content
            .lines()
            .find(|line| !line.trim().is_empty())
            .filter(|line| self.is_header(line))
            .map(|line| line.trim_end().to_string())
    }

    /// Join fields back into one line.
    pub fn join<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(char::from(self.delimiter));
            }
            line.push_str(field.as_ref());
        }
        line
    }
}

/// Read a single line as one record of trimmed fields.
///
/// Quotes carry no meaning in these files and are kept as text. An empty
/// line yields no fields.
fn split_fields(delimiter: u8, line: &str) -> std::result::Result<Vec<String>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(Vec::new());
    }
    Ok(record.iter().map(str::to_string).collect())
}

/// Split a nested comma-separated list, dropping empty tokens.
pub fn split_list(value: &str) -> Vec<String> {
    match split_fields(b',', value) {
        Ok(tokens) => tokens.into_iter().filter(|token| !token.is_empty()).collect(),
        Err(e) => {
            log::warn!("Unreadable list '{}': {}", value, e);
            Vec::new()
        }
    }
}

/// Join a list back into its nested comma-separated form.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a numeric field, naming the field on failure.
pub fn parse_number<T: std::str::FromStr>(
    format: &'static str,
    field: &str,
    value: &str,
) -> Result<T> {
    value
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|_| AppError::malformed(format, format!("{field} is not a number: '{value}'")))
}

/// Like [`parse_number`], but an empty field yields the default.
pub fn parse_number_or_default<T: std::str::FromStr + Default>(
    format: &'static str,
    field: &str,
    value: &str,
) -> Result<T> {
    if value.trim().is_empty() {
        return Ok(T::default());
    }
    parse_number(format, field, value)
}

/// An empty field becomes `None`.
pub fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
