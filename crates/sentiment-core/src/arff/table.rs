//! Header/data split of attribute-relation text into a flat table

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::{ConvertError, Result};

/// Keyword opening a column declaration
pub const ATTRIBUTE_KEYWORD: &str = "@attribute";

/// Keyword ending the header section
pub const DATA_KEYWORD: &str = "@data";

/// A header row of column names followed by verbatim data lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Declared column names, in declaration order (duplicates kept).
    pub header: Vec<String>,
    /// Data lines exactly as they appeared after the `@data` marker.
    pub rows: Vec<String>,
}

impl Table {
    /// Header as a single comma-joined line without a trailing separator
    pub fn header_line(&self) -> String {
        self.header.join(",")
    }

    /// Write the table as comma-separated text, overwriting `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path).map_err(|e| ConvertError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        let write_all = |writer: &mut BufWriter<fs::File>| -> std::io::Result<()> {
            writeln!(writer, "{}", self.header_line())?;
            for row in &self.rows {
                writeln!(writer, "{}", row)?;
            }
            writer.flush()
        };

        write_all(&mut writer).map_err(|e| ConvertError::io(path, e))?;
        log::debug!(
            "Wrote table {:?} ({} columns, {} rows)",
            path,
            self.header.len(),
            self.rows.len()
        );
        Ok(())
    }
}

/// Which part of the file the parser is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Data,
}

/// Does the first whitespace-delimited token of `line` equal `keyword`?
fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|token| token.eq_ignore_ascii_case(keyword))
}

/// Build a [`Table`] from the lines of an attribute-relation file.
///
/// Only lines whose first token is `@attribute` declare columns; the next
/// token is the column name. A line whose first token is `@data` ends the
/// header, and every later line is kept verbatim as a data row. Other header
/// lines (`@relation`, `%` comments, blanks) are skipped.
///
/// `source` is only used to name the file in a [`ConvertError::MissingDataSection`].
pub fn to_table<I, S>(lines: I, source: &Path) -> Result<Table>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut section = Section::Header;
    let mut table = Table::default();

    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim_end_matches(['\r', '\n']);

        match section {
            Section::Header => {
                if starts_with_keyword(line, ATTRIBUTE_KEYWORD) {
                    let name = line.split_whitespace().nth(1).ok_or_else(|| {
                        ConvertError::MalformedDeclaration {
                            line: idx + 1,
                            content: line.to_string(),
                        }
                    })?;
                    table.header.push(name.to_string());
                } else if starts_with_keyword(line, DATA_KEYWORD) {
                    section = Section::Data;
                }
            }
            Section::Data => table.rows.push(line.to_string()),
        }
    }

    if section == Section::Header {
        return Err(ConvertError::MissingDataSection {
            path: PathBuf::from(source),
        });
    }

    Ok(table)
}
