use crate::{
    db::statement::{SelectStatement, Statement},
    error::EngineError,
    value::FieldMap,
};

///
/// QueryExecutor
///
/// The execution engine this crate drives. Connections, retries and
/// consistency all live behind it; tables only borrow one.
///

pub trait QueryExecutor: Send + Sync {
    /// Run a statement that returns no rows.
    fn execute(&self, stmt: &Statement) -> Result<(), EngineError>;

    /// Run several statements as one atomic batch.
    fn execute_atomically(&self, stmts: &[Statement]) -> Result<(), EngineError>;

    /// Run a read, returning a lazy row iterator.
    fn query(&self, stmt: &SelectStatement) -> Result<Box<dyn RowIter + '_>, EngineError>;
}

///
/// RowIter
///
/// Lazily produced rows of one read. After a failure `next_row` yields
/// nothing more and `close` reports the failure.
///

pub trait RowIter {
    fn next_row(&mut self) -> Option<FieldMap>;

    /// Release the iterator, surfacing any error hit while iterating.
    /// Subsequent calls return `Ok(())`.
    fn close(&mut self) -> Result<(), EngineError>;
}

///
/// Rows
///
/// Buffered row iterator, optionally failing once the buffer is drained.
///

pub struct Rows {
    rows: std::vec::IntoIter<FieldMap>,
    error: Option<EngineError>,
}

impl Rows {
    #[must_use]
    pub fn new(rows: Vec<FieldMap>) -> Self {
        Self {
            rows: rows.into_iter(),
            error: None,
        }
    }

    /// Yield `rows`, then fail with `error`.
    #[must_use]
    pub fn failing(rows: Vec<FieldMap>, error: impl Into<EngineError>) -> Self {
        Self {
            rows: rows.into_iter(),
            error: Some(error.into()),
        }
    }
}

impl RowIter for Rows {
    fn next_row(&mut self) -> Option<FieldMap> {
        self.rows.next()
    }

    fn close(&mut self) -> Result<(), EngineError> {
        self.rows = Vec::new().into_iter();

        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
