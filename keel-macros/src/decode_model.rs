use crate::table_name::default_table_name;
use syn::{ItemStruct, LitStr, Path, parse::ParseBuffer};

pub(crate) struct ModelMetadata {
    pub(crate) table_name: String,
    pub(crate) before_put: Option<Path>,
    pub(crate) after_put: Option<Path>,
}

/// Reads `#[model(table = "...", before_put = path, after_put = path)]`.
pub(crate) fn decode_model(item: &ItemStruct) -> ModelMetadata {
    let mut metadata = ModelMetadata {
        table_name: default_table_name(&item.ident.to_string()),
        before_put: None,
        after_put: None,
    };
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("model") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `model`, use it like: `#[model(table = \"users\")]`");
        };
        let result = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("table") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `table`, use it like: `#[model(table = \"users\")]`");
                };
                metadata.table_name = v.value();
            } else if arg.path.is_ident("before_put") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Path>) else {
                    panic!(
                        "Error while parsing `before_put`, use it like: `#[model(before_put = Self::touch)]`"
                    );
                };
                metadata.before_put = Some(v);
            } else if arg.path.is_ident("after_put") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Path>) else {
                    panic!(
                        "Error while parsing `after_put`, use it like: `#[model(after_put = Self::audit)]`"
                    );
                };
                metadata.after_put = Some(v);
            } else {
                return Err(arg.error("unknown attribute inside `model`"));
            }
            Ok(())
        });
        if let Err(e) = result {
            panic!("Error while parsing `model`: {e}");
        }
    }
    metadata
}
