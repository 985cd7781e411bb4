use keel_core::ColumnTag;
use syn::{Field, Ident, LitStr, Type};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    /// Raw `db` tag content.
    pub(crate) tag: String,
    pub(crate) tracking: bool,
    pub(crate) excluded: bool,
}

impl FieldMetadata {
    pub(crate) fn is_column(&self) -> bool {
        !self.tracking && !self.excluded
    }
}

fn is_tracking(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|v| v.ident == "ModelTracking")
}

/// Reads the `#[db("...")]` tag of a field, rejecting malformed tags at compile time.
pub(crate) fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Model fields are expected to have a name");
    let mut tag = String::new();
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("db") {
            continue;
        }
        let Ok(v) = meta.require_list().and_then(|v| v.parse_args::<LitStr>()) else {
            panic!("Error while parsing `db` on `{ident}`, use it like: `#[db(\"column,pk\")]`");
        };
        tag = v.value();
    }
    let tracking = is_tracking(&field.ty);
    let excluded = if tracking {
        false
    } else {
        match ColumnTag::parse(&tag) {
            Ok(v) => v.excluded,
            Err(e) => panic!("Invalid `db` tag on `{ident}`: {e}"),
        }
    };
    FieldMetadata {
        ident,
        tag,
        tracking,
        excluded,
    }
}
