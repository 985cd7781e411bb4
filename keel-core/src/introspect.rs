use crate::{AsValue, ColumnTag, Context, Error, FieldKind, Model, Result, Value, quote_identifier};
use std::{
    any::{TypeId, type_name},
    collections::HashMap,
    sync::{LazyLock, RwLock},
};

/// Writable location of a property on a live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Index into [`Model::fields`].
    Field(usize),
    /// The tracking revision counter.
    Revision,
}

/// Column descriptor computed once per model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    /// Quoted column identifier.
    pub name: String,
    /// Unquoted column name.
    pub column: String,
    pub field: &'static str,
    pub slot: Slot,
    pub primary_key: bool,
    pub omit_empty: bool,
}

/// A [`PropertyDef`] bound to the value read from one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub def: &'static PropertyDef,
    pub value: Value,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.def.name
    }
    pub fn field(&self) -> &'static str {
        self.def.field
    }
    pub fn is_primary_key(&self) -> bool {
        self.def.primary_key
    }
    /// Omitted from writes: flagged `omitempty` (or primary key) and holding a zero value.
    pub fn is_omitted(&self) -> bool {
        self.def.omit_empty && self.value.is_zero()
    }
}

/// Table and column metadata of a model type.
#[derive(Debug, PartialEq, Eq)]
pub struct ModelMeta {
    /// Quoted table identifier.
    pub table: String,
    pub table_name: &'static str,
    pub properties: Vec<PropertyDef>,
}

impl ModelMeta {
    fn build<M: Model>() -> Result<Self> {
        let mut properties = Vec::new();
        let mut tracking = false;
        for (i, field) in M::fields().iter().enumerate() {
            if field.kind == FieldKind::Tracking {
                if tracking {
                    return Err(Error::msg(format!(
                        "Model `{}` has more than one tracking field",
                        type_name::<M>()
                    )));
                }
                tracking = true;
                properties.push(PropertyDef {
                    name: quote_identifier("revision"),
                    column: "revision".into(),
                    field: field.field,
                    slot: Slot::Revision,
                    primary_key: false,
                    omit_empty: false,
                });
                continue;
            }
            let tag = ColumnTag::parse(field.tag).with_context(|| {
                format!(
                    "Invalid tag on field `{}` of `{}`",
                    field.field,
                    type_name::<M>()
                )
            })?;
            if tag.excluded {
                continue;
            }
            let column = tag.name.unwrap_or(field.field);
            properties.push(PropertyDef {
                name: quote_identifier(column),
                column: column.into(),
                field: field.field,
                slot: Slot::Field(i),
                primary_key: tag.primary_key,
                omit_empty: tag.omit_empty,
            });
        }
        Ok(Self {
            table: quote_identifier(M::table_name()),
            table_name: M::table_name(),
            properties,
        })
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &PropertyDef> {
        self.properties.iter().filter(|v| v.primary_key)
    }

    /// Rebind: reads the current value of every property from `model`.
    pub fn bind<M: Model>(&'static self, model: &M) -> Result<Vec<Property>> {
        self.properties
            .iter()
            .map(|def| {
                let value = match def.slot {
                    Slot::Field(i) => model.field_value(i).with_context(|| {
                        format!("Could not read field `{}` of `{}`", def.field, type_name::<M>())
                    })?,
                    Slot::Revision => Value::Int64(Some(model.tracking().revision())),
                };
                Ok(Property { def, value })
            })
            .collect()
    }

    /// Writes the values of a result row into `model`, aligned with [`ModelMeta::properties`].
    ///
    /// On failure every field already written and the tracking state are put back,
    /// so `model` is left as it was before the call.
    pub fn scan<M: Model>(&self, model: &mut M, values: impl IntoIterator<Item = Value>) -> Result<()> {
        let tracking = *model.tracking();
        let mut previous = Vec::with_capacity(self.properties.len());
        let result = self.write_row(model, values, &mut previous);
        if result.is_err() {
            for (i, value) in previous.into_iter().rev() {
                if let Err(e) = model.set_field_value(i, value) {
                    log::warn!("Could not restore field {i} of `{}`: {e:#}", type_name::<M>());
                }
            }
            *model.tracking_mut() = tracking;
        }
        result
    }

    fn write_row<M: Model>(
        &self,
        model: &mut M,
        values: impl IntoIterator<Item = Value>,
        previous: &mut Vec<(usize, Value)>,
    ) -> Result<()> {
        let mut count = 0;
        for (def, value) in self.properties.iter().zip(values) {
            count += 1;
            match def.slot {
                Slot::Field(i) => {
                    previous.push((i, model.field_value(i)?));
                    model.set_field_value(i, value).with_context(|| {
                        format!(
                            "Could not decode column {} into `{}::{}`",
                            def.name,
                            type_name::<M>(),
                            def.field
                        )
                    })?
                }
                Slot::Revision => {
                    let revision = if value.is_null() {
                        0
                    } else {
                        i64::try_from_value(value)
                            .context("Could not decode the `revision` column")?
                    };
                    model.tracking_mut().load_revision(revision);
                }
            }
        }
        if count != self.properties.len() {
            return Err(Error::msg(format!(
                "Expected {} columns for `{}`, the row has {}",
                self.properties.len(),
                type_name::<M>(),
                count
            )));
        }
        Ok(())
    }
}

static REGISTRY: LazyLock<RwLock<HashMap<TypeId, &'static ModelMeta>>> =
    LazyLock::new(Default::default);

/// Column metadata of `M`, computed on first use and cached for the process lifetime.
pub fn introspect<M: Model>() -> Result<&'static ModelMeta> {
    let id = TypeId::of::<M>();
    if let Some(meta) = REGISTRY
        .read()
        .map_err(|_| Error::msg("Model registry lock is poisoned"))?
        .get(&id)
    {
        return Ok(*meta);
    }
    let meta = ModelMeta::build::<M>()?;
    let mut registry = REGISTRY
        .write()
        .map_err(|_| Error::msg("Model registry lock is poisoned"))?;
    Ok(*registry
        .entry(id)
        .or_insert_with(|| Box::leak(Box::new(meta))))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{FieldDef, ModelTracking};

    #[derive(Default, Debug, Clone, PartialEq)]
    pub(crate) struct Item {
        pub id: i64,
        pub code: String,
        pub note: Option<String>,
        pub scratch: u8,
        pub tracking: ModelTracking,
    }

    impl Model for Item {
        fn table_name() -> &'static str {
            "items"
        }
        fn fields() -> &'static [FieldDef] {
            &[
                FieldDef {
                    field: "id",
                    tag: ",pk",
                    kind: FieldKind::Column,
                },
                FieldDef {
                    field: "code",
                    tag: "item_code",
                    kind: FieldKind::Column,
                },
                FieldDef {
                    field: "note",
                    tag: ",omitempty",
                    kind: FieldKind::Column,
                },
                FieldDef {
                    field: "scratch",
                    tag: "-",
                    kind: FieldKind::Column,
                },
                FieldDef {
                    field: "tracking",
                    tag: "",
                    kind: FieldKind::Tracking,
                },
            ]
        }
        fn tracking(&self) -> &ModelTracking {
            &self.tracking
        }
        fn tracking_mut(&mut self) -> &mut ModelTracking {
            &mut self.tracking
        }
        fn field_value(&self, index: usize) -> Result<Value> {
            Ok(match index {
                0 => self.id.as_value(),
                1 => self.code.clone().as_value(),
                2 => self.note.clone().as_value(),
                _ => return Err(Error::msg(format!("No column field at {index}"))),
            })
        }
        fn set_field_value(&mut self, index: usize, value: Value) -> Result<()> {
            match index {
                0 => self.id = AsValue::try_from_value(value)?,
                1 => self.code = AsValue::try_from_value(value)?,
                2 => self.note = AsValue::try_from_value(value)?,
                _ => return Err(Error::msg(format!("No column field at {index}"))),
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Broken {
        tracking: ModelTracking,
    }

    impl Model for Broken {
        fn table_name() -> &'static str {
            "broken"
        }
        fn fields() -> &'static [FieldDef] {
            &[FieldDef {
                field: "a",
                tag: "a,unique",
                kind: FieldKind::Column,
            }]
        }
        fn tracking(&self) -> &ModelTracking {
            &self.tracking
        }
        fn tracking_mut(&mut self) -> &mut ModelTracking {
            &mut self.tracking
        }
        fn field_value(&self, _index: usize) -> Result<Value> {
            Ok(Value::Null)
        }
        fn set_field_value(&mut self, _index: usize, _value: Value) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn properties() {
        let meta = introspect::<Item>().unwrap();
        assert_eq!(meta.table, "`items`");
        assert_eq!(meta.table_name, "items");
        let names: Vec<_> = meta.properties.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["`id`", "`item_code`", "`note`", "`revision`"]);
        assert_eq!(meta.properties[0].slot, Slot::Field(0));
        assert!(meta.properties[0].primary_key);
        assert!(meta.properties[0].omit_empty);
        assert_eq!(meta.properties[1].field, "code");
        assert!(!meta.properties[2].primary_key);
        assert!(meta.properties[2].omit_empty);
        assert_eq!(meta.properties[3].slot, Slot::Revision);
        assert_eq!(meta.primary_keys().count(), 1);
    }

    #[test]
    fn cached() {
        let a = introspect::<Item>().unwrap();
        let b = introspect::<Item>().unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn invalid_tag() {
        let error = introspect::<Broken>().unwrap_err();
        assert!(format!("{error:#}").contains("unique"));
    }

    #[test]
    fn bind_and_scan() {
        let meta = introspect::<Item>().unwrap();
        let mut item = Item {
            id: 3,
            code: "abc".into(),
            ..Default::default()
        };
        item.tracking.after_put();
        let bound = meta.bind(&item).unwrap();
        assert_eq!(bound.len(), meta.properties.len());
        assert_eq!(bound[0].value, Value::Int64(Some(3)));
        assert!(!bound[0].is_omitted());
        assert!(bound[2].is_omitted());
        assert_eq!(bound[3].value, Value::Int64(Some(1)));

        let mut loaded = Item::default();
        meta.scan(
            &mut loaded,
            [
                Value::Int32(Some(9)),
                Value::Varchar(Some("xyz".into())),
                Value::Null,
                Value::Int64(Some(4)),
            ],
        )
        .unwrap();
        assert_eq!(loaded.id, 9);
        assert_eq!(loaded.code, "xyz");
        assert_eq!(loaded.note, None);
        assert_eq!(loaded.tracking.revision(), 4);
        assert!(meta.scan(&mut loaded, [Value::Int32(Some(9))]).is_err());
    }

    #[test]
    fn failed_scan_restores_the_model() {
        let meta = introspect::<Item>().unwrap();
        let mut item = Item {
            id: 3,
            code: "local".into(),
            note: Some("keep".into()),
            ..Default::default()
        };
        item.tracking.after_put();
        let before = item.clone();
        let result = meta.scan(
            &mut item,
            [
                Value::Int64(Some(4)),
                Value::Varchar(Some("from-db".into())),
                Value::Null,
                Value::Varchar(Some("x".into())),
            ],
        );
        assert!(result.is_err());
        assert_eq!(item, before);

        let result = meta.scan(
            &mut item,
            [Value::Int64(Some(4)), Value::Varchar(Some("from-db".into()))],
        );
        assert!(result.is_err());
        assert_eq!(item, before);
    }
}
