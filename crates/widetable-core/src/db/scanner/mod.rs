//! Row decoding.
//!
//! The scanner walks the statement's field order for each row, resolves
//! every column to a slot in the destination record's field table and
//! assigns it. Destination shape (single record, sequence, any depth of
//! `Option`/`Box` indirection) comes from the `Destination` impls.

#[cfg(test)]
mod tests;

use crate::{
    db::{executor::RowIter, statement::SelectStatement},
    error::Error,
    model::column::ColumnType,
    traits::{Destination, FieldTable, Record, Target},
    value::{FieldMap, Value, normalize_fields},
};
use thiserror::Error as ThisError;

///
/// ScanError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ScanError {
    #[error("cannot decode field '{field}': expected {expected}, found {found}")]
    Decode {
        field: String,
        expected: ColumnType,
        found: &'static str,
    },

    #[error("no rows returned from {table}")]
    NoRows { table: String },
}

///
/// Scanner
///
/// One decode session over one destination.
///
/// Sequence destinations are cleared, then receive one freshly decoded
/// record per row until the iterator is exhausted. Single destinations are
/// decoded in place from exactly one row; the iterator is left open so a
/// later scan can pick up the next row.
///

pub struct Scanner<'s, D: Destination + ?Sized> {
    stmt: &'s SelectStatement,
    dest: &'s mut D,
    rows_read: usize,
}

impl<'s, D: Destination + ?Sized> Scanner<'s, D> {
    pub fn new(stmt: &'s SelectStatement, dest: &'s mut D) -> Self {
        Self {
            stmt,
            dest,
            rows_read: 0,
        }
    }

    /// Rows decoded by the last `scan_iter`, including on failure.
    #[must_use]
    pub const fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Drive `iter` and decode into the destination.
    ///
    /// Iterator errors are returned as the engine produced them. A single
    /// destination over zero rows fails with `ScanError::NoRows`.
    pub fn scan_iter(&mut self, iter: &mut dyn RowIter) -> Result<usize, Error> {
        let stmt = self.stmt;
        let fields = stmt.fields();
        self.rows_read = 0;

        match self.dest.target() {
            Target::Many(seq) => {
                seq.clear();

                while let Some(row) = iter.next_row() {
                    let mut record = D::Record::default();
                    decode_row(fields, row, &mut record)?;
                    seq.push_record(record);
                    self.rows_read += 1;
                }

                iter.close().map_err(Error::Engine)?;
            }

            Target::One(record) => {
                let Some(row) = iter.next_row() else {
                    iter.close().map_err(Error::Engine)?;

                    return Err(ScanError::NoRows {
                        table: stmt.table().to_string(),
                    }
                    .into());
                };

                decode_row(fields, row, record)?;
                self.rows_read = 1;
            }
        }

        Ok(self.rows_read)
    }
}

///
/// ScanSink
///
/// Object-safe view of a destination so pending reads can be stored
/// alongside writes.
///

pub trait ScanSink {
    fn scan(&mut self, stmt: &SelectStatement, iter: &mut dyn RowIter) -> Result<usize, Error>;
}

impl<D: Destination> ScanSink for D {
    fn scan(&mut self, stmt: &SelectStatement, iter: &mut dyn RowIter) -> Result<usize, Error> {
        Scanner::new(stmt, self).scan_iter(iter)
    }
}

// Columns absent from the row leave the record untouched; columns without a
// matching slot are ignored.
fn decode_row<R: Record>(fields: &[String], row: FieldMap, record: &mut R) -> Result<(), ScanError> {
    let table = R::field_table();
    let mut row = normalize_fields(row);

    if fields.is_empty() {
        for (name, value) in row {
            assign(table, &name, value, record)?;
        }
    } else {
        for name in fields {
            if let Some(value) = row.remove(name) {
                assign(table, name, value, record)?;
            }
        }
    }

    Ok(())
}

fn assign<R: Record>(
    table: &FieldTable<R>,
    name: &str,
    value: Value,
    record: &mut R,
) -> Result<(), ScanError> {
    let Some(slot) = table.slot(name) else {
        return Ok(());
    };

    slot.assign(record, &value.without_sentinel())
        .map_err(|mismatch| ScanError::Decode {
            field: slot.name().to_string(),
            expected: mismatch.expected,
            found: mismatch.found,
        })
}
