use crate::{Error, Result};

/// Role of a struct field inside a model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Regular field mapped through its `db` tag.
    #[default]
    Column,
    /// The embedded [`ModelTracking`](crate::ModelTracking) state, stored as the `revision` column.
    Tracking,
}

/// Static description of one struct field, emitted in declaration order by `#[derive(Model)]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Struct field identifier.
    pub field: &'static str,
    /// Raw content of the `db` tag, empty when the field has none.
    pub tag: &'static str,
    pub kind: FieldKind,
}

/// Parsed `db` tag: `"<column-or-empty>,<modifier>"` or `"-"`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnTag<'a> {
    /// Explicit column name, `None` keeps the field identifier.
    pub name: Option<&'a str>,
    pub excluded: bool,
    pub primary_key: bool,
    pub omit_empty: bool,
}

impl<'a> ColumnTag<'a> {
    /// Parse a tag. Unknown modifiers and more than one modifier are configuration errors.
    pub fn parse(tag: &'a str) -> Result<Self> {
        let mut result = ColumnTag::default();
        if tag.is_empty() {
            return Ok(result);
        }
        let mut parts = tag.split(',');
        let name = parts.next().unwrap_or_default();
        let modifier = parts.next();
        if let Some(extra) = parts.next() {
            return Err(Error::msg(format!(
                "Unknown struct tag `{extra}` in `{tag}`, only one modifier is allowed"
            )));
        }
        if name == "-" {
            result.excluded = true;
        } else if !name.is_empty() {
            result.name = Some(name);
        }
        match modifier {
            None => {}
            Some("pk") => {
                result.primary_key = true;
                result.omit_empty = true;
            }
            Some("omitempty") => result.omit_empty = true,
            Some(other) => {
                return Err(Error::msg(format!(
                    "Unknown struct tag `{other}` in `{tag}`, expected `pk` or `omitempty`"
                )));
            }
        }
        Ok(result)
    }
}
