//! Procedural macros for the docmap project.
//!
//! This crate provides the `Schema` derive, which turns a plain struct
//! describing a document's shape into the field table an entity type needs.

#[allow(unused_extern_crates)]
extern crate self as docmap_macros;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Data, DeriveInput, Error, Expr, Fields, LitStr, Result, parse_macro_input};

const IDENTITY_FIELD: &str = "_id";

/// Derives `docmap::schema::Schema` for a struct with named fields.
///
/// # Attributes
///
/// On the struct:
/// - `#[schema(collection = "name")]` - the collection entities are stored in;
///   defaults to the struct name in snake case.
///
/// On fields:
/// - `#[schema(default = expr)]` - the value an unset field reads as; `expr`
///   must convert into `bson::Bson`.
/// - `#[schema(rename = "key")]` - the stored key, if it differs from the field name.
///
/// The identity key `_id` is managed by the entity and cannot be declared.
///
/// # Example
///
/// ```ignore
/// #[derive(Schema)]
/// #[schema(collection = "users")]
/// pub struct User {
///     name: String,
///     #[schema(default = "member")]
///     role: String,
///     #[schema(default = Vec::<String>::new())]
///     tags: Vec<String>,
/// }
/// ```
#[proc_macro_derive(Schema, attributes(schema))]
pub fn derive_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_schema(input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

struct FieldSpec {
    key: String,
    default: Option<Expr>,
}

fn expand_schema(input: DeriveInput) -> Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Schema cannot be derived for generic types",
        ));
    }

    let name = &input.ident;
    let collection = collection_name(&input)?;
    let fields = field_specs(&input)?;

    let keys = fields.iter().map(|field| &field.key);
    let defaults = fields.iter().filter_map(|field| {
        let key = &field.key;
        field.default.as_ref().map(|expr| {
            quote! {
                defaults.insert(#key, ::std::convert::Into::<::docmap::bson::Bson>::into(#expr));
            }
        })
    });

    Ok(quote! {
        impl ::docmap::schema::Schema for #name {
            fn collection_name() -> &'static str {
                #collection
            }

            fn fields() -> &'static [&'static str] {
                &[#(#keys),*]
            }

            fn defaults() -> &'static ::docmap::bson::Document {
                static DEFAULTS: ::std::sync::OnceLock<::docmap::bson::Document> = ::std::sync::OnceLock::new();

                DEFAULTS.get_or_init(|| {
                    #[allow(unused_mut)]
                    let mut defaults = ::docmap::bson::Document::new();
                    #(#defaults)*
                    defaults
                })
            }
        }
    })
}

fn collection_name(input: &DeriveInput) -> Result<LitStr> {
    let mut collection = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("schema")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                collection = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;
    }

    Ok(collection.unwrap_or_else(|| {
        LitStr::new(&snake_case(&input.ident.to_string()), Span::call_site())
    }))
}

fn field_specs(input: &DeriveInput) -> Result<Vec<FieldSpec>> {
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(Error::new_spanned(
                    &input.ident,
                    "Schema can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input.ident,
                "Schema can only be derived for structs",
            ));
        }
    };

    let mut specs: Vec<FieldSpec> = Vec::with_capacity(named.named.len());

    for field in &named.named {
        let Some(ident) = &field.ident else {
            continue;
        };
        let mut key = ident.to_string().trim_start_matches("r#").to_string();
        let mut default = None;

        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("schema")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    default = Some(meta.value()?.parse::<Expr>()?);
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    key = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else {
                    Err(meta.error("expected `default = ...` or `rename = \"...\"`"))
                }
            })?;
        }

        if key == IDENTITY_FIELD {
            return Err(Error::new_spanned(
                ident,
                "`_id` is the identity key and cannot be declared as a field",
            ));
        }
        if specs.iter().any(|spec| spec.key == key) {
            return Err(Error::new_spanned(
                ident,
                format!("field key `{key}` is declared more than once"),
            ));
        }

        specs.push(FieldSpec { key, default });
    }

    Ok(specs)
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}
