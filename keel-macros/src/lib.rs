mod decode_field;
mod decode_model;
mod table_name;

use decode_field::decode_field;
use decode_model::decode_model;
use proc_macro::TokenStream;
use quote::quote;
use syn::{Fields, ItemStruct, parse_macro_input};

/// Implements `keel::Model` for a struct with named fields.
///
/// The struct must embed exactly one `ModelTracking` field. Columns are
/// configured with `#[db("<column>,<modifier>")]` where the modifier is `pk`
/// or `omitempty`, `#[db("-")]` skips a field. The table defaults to the
/// snake case plural of the struct name, override it with
/// `#[model(table = "...")]`, hooks go in the same attribute.
#[proc_macro_derive(Model, attributes(model, db))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let name = &item.ident;
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    if !matches!(item.fields, Fields::Named(..)) {
        panic!("`Model` can only be derived on structs with named fields");
    }
    let model = decode_model(&item);
    let fields: Vec<_> = item.fields.iter().map(decode_field).collect();
    let trackings: Vec<_> = fields.iter().filter(|v| v.tracking).collect();
    let [tracking] = trackings.as_slice() else {
        panic!(
            "Model `{name}` must contain exactly one `ModelTracking` field, found {}",
            trackings.len()
        );
    };
    let tracking = &tracking.ident;
    let table_name = &model.table_name;
    let field_defs = fields.iter().map(|f| {
        let field = f.ident.to_string();
        let tag = &f.tag;
        let kind = if f.tracking {
            quote!(::keel::FieldKind::Tracking)
        } else {
            quote!(::keel::FieldKind::Column)
        };
        quote! {
            ::keel::FieldDef {
                field: #field,
                tag: #tag,
                kind: #kind,
            }
        }
    });
    let columns: Vec<_> = fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_column())
        .collect();
    let getters = columns.iter().map(|(i, f)| {
        let ident = &f.ident;
        quote!(#i => Ok(::keel::AsValue::as_value(::std::clone::Clone::clone(&self.#ident))))
    });
    let setters = columns.iter().map(|(i, f)| {
        let ident = &f.ident;
        quote! {
            #i => {
                self.#ident = ::keel::AsValue::try_from_value(value)?;
                Ok(())
            }
        }
    });
    let hook = |path: &Option<syn::Path>| match path {
        Some(path) => quote!(Some(#path as ::keel::Hook<Self>)),
        None => quote!(None),
    };
    let before_put = hook(&model.before_put);
    let after_put = hook(&model.after_put);
    quote! {
        impl #impl_generics ::keel::Model for #name #ty_generics #where_clause {
            fn table_name() -> &'static str {
                #table_name
            }

            fn fields() -> &'static [::keel::FieldDef] {
                static FIELDS: &[::keel::FieldDef] = &[#(#field_defs),*];
                FIELDS
            }

            fn tracking(&self) -> &::keel::ModelTracking {
                &self.#tracking
            }

            fn tracking_mut(&mut self) -> &mut ::keel::ModelTracking {
                &mut self.#tracking
            }

            fn field_value(&self, index: usize) -> ::keel::Result<::keel::Value> {
                match index {
                    #(#getters,)*
                    _ => Err(::keel::Error::msg(format!(
                        "`{}` has no column field at index {}",
                        stringify!(#name),
                        index
                    ))),
                }
            }

            fn set_field_value(&mut self, index: usize, value: ::keel::Value) -> ::keel::Result<()> {
                match index {
                    #(#setters)*
                    _ => Err(::keel::Error::msg(format!(
                        "`{}` has no column field at index {}",
                        stringify!(#name),
                        index
                    ))),
                }
            }

            fn hooks() -> ::keel::Hooks<Self> {
                ::keel::Hooks {
                    before_put: #before_put,
                    after_put: #after_put,
                }
            }
        }
    }
    .into()
}
