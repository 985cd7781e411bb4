use crate::{Error, Model, ModelMeta, Result, RowLabeled, stream::Stream};
use futures::StreamExt;
use std::{marker::PhantomData, pin::Pin};

type RowStream<'e> = Pin<Box<dyn Stream<Item = Result<RowLabeled>> + Send + 'e>>;

/// Streaming cursor over the rows of a collection query.
///
/// The underlying result set (and its pooled connection) stays open until the
/// rows are exhausted, [`Cursor::close`] is called or the cursor is dropped.
pub struct Cursor<'e, M> {
    rows: Option<RowStream<'e>>,
    meta: &'static ModelMeta,
    error: Option<String>,
    _model: PhantomData<fn(&mut M)>,
}

impl<'e, M: Model> Cursor<'e, M> {
    pub(crate) fn new(
        rows: impl Stream<Item = Result<RowLabeled>> + Send + 'e,
        meta: &'static ModelMeta,
    ) -> Self {
        Self {
            rows: Some(Box::pin(rows)),
            meta,
            error: None,
            _model: PhantomData,
        }
    }

    /// Reads the next row into `model`.
    ///
    /// Returns `Ok(false)` once every row was read, closing the cursor. After
    /// a failure the cursor keeps reporting the same error.
    pub async fn next(&mut self, model: &mut M) -> Result<bool> {
        if let Some(error) = &self.error {
            return Err(Error::msg(error.clone()));
        }
        let Some(rows) = self.rows.as_mut() else {
            return Ok(false);
        };
        match rows.next().await {
            None => {
                self.close();
                Ok(false)
            }
            Some(Err(e)) => {
                self.error = Some(format!("{e:#}"));
                Err(e)
            }
            Some(Ok(row)) => {
                if let Err(e) = self.meta.scan(model, row.values.into_vec()) {
                    self.error = Some(format!("{e:#}"));
                    self.rows = None;
                    return Err(e);
                }
                model.tracking_mut().after_get();
                Ok(true)
            }
        }
    }

    /// Releases the result set, calling it again is a no op.
    pub fn close(&mut self) {
        self.rows = None;
    }

    pub fn is_closed(&self) -> bool {
        self.rows.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Value, introspect, introspect::tests::Item, stream};
    use std::sync::Arc;

    fn row(id: i64, code: &str) -> Result<RowLabeled> {
        Ok(RowLabeled::new(
            Arc::from(["id", "item_code", "note", "revision"].map(String::from)),
            [
                Value::Int64(Some(id)),
                Value::Varchar(Some(code.into())),
                Value::Null,
                Value::Int64(Some(0)),
            ]
            .into(),
        ))
    }

    #[tokio::test]
    async fn drains_then_closes() {
        let meta = introspect::<Item>().unwrap();
        let mut cursor = Cursor::<Item>::new(stream::iter([row(1, "a"), row(2, "b")]), meta);
        let mut item = Item::default();
        assert!(cursor.next(&mut item).await.unwrap());
        assert_eq!(item.id, 1);
        assert!(item.tracking.is_inserted());
        assert_eq!(item.tracking.stored_revision(), 0);
        assert!(cursor.next(&mut item).await.unwrap());
        assert_eq!(item.code, "b");
        assert!(!cursor.next(&mut item).await.unwrap());
        assert!(cursor.is_closed());
        cursor.close();
        cursor.close();
        assert!(!cursor.next(&mut item).await.unwrap());
    }

    #[tokio::test]
    async fn keeps_reporting_errors() {
        let meta = introspect::<Item>().unwrap();
        let mut cursor = Cursor::<Item>::new(
            stream::iter([Err(Error::msg("connection lost")), row(1, "a")]),
            meta,
        );
        let mut item = Item::default();
        assert!(cursor.next(&mut item).await.is_err());
        let error = cursor.next(&mut item).await.unwrap_err();
        assert!(error.to_string().contains("connection lost"));
        assert_eq!(item, Item::default());
    }

    #[tokio::test]
    async fn decode_failure_is_sticky() {
        let meta = introspect::<Item>().unwrap();
        let broken = Ok(RowLabeled::new(
            Arc::from(["id", "item_code", "note", "revision"].map(String::from)),
            [
                Value::Varchar(Some("not a number".into())),
                Value::Varchar(Some("a".into())),
                Value::Null,
                Value::Int64(Some(0)),
            ]
            .into(),
        ));
        let mut cursor = Cursor::<Item>::new(stream::iter([broken, row(2, "b")]), meta);
        let mut item = Item::default();
        let first = cursor.next(&mut item).await.unwrap_err();
        assert!(format!("{first:#}").contains("`id`"));
        assert_eq!(item, Item::default());
        let second = cursor.next(&mut item).await.unwrap_err();
        assert_eq!(format!("{second}"), format!("{first:#}"));
        assert_eq!(item.id, 0);
    }
}
