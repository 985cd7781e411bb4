use crate::ValueWrap;
use keel_core::{Row, RowLabeled, RowNames};
use mysql_async::{FromRowError, prelude::FromRow};

pub(crate) struct RowWrap(pub(crate) RowLabeled);

impl FromRow for RowWrap {
    fn from_row_opt(mut row: mysql_async::Row) -> Result<Self, FromRowError>
    where
        Self: Sized,
    {
        let names: RowNames = row
            .columns()
            .iter()
            .map(|v| v.name_str().into_owned())
            .collect();
        let mut values = Vec::with_capacity(row.len());
        for i in 0..row.len() {
            match row.take_opt::<ValueWrap, _>(i) {
                Some(Ok(v)) => values.push(v.0),
                _ => return Err(FromRowError(row)),
            }
        }
        let values: Row = values.into();
        Ok(RowWrap(RowLabeled::new(names, values)))
    }
}
