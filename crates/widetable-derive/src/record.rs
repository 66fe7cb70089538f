use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Field, Fields, LitStr};

///
/// FieldMode
///

enum FieldMode {
    Column(String),
    Flatten,
    Skip,
}

// derive_record
pub fn derive_record(input: TokenStream) -> TokenStream {
    match expand(input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: TokenStream) -> Result<TokenStream, Error> {
    let input: DeriveInput = syn::parse2(input)?;
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            ident,
            "Record can only be derived for structs with named fields",
        ));
    };

    let fields = match &data.fields {
        Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(Error::new_spanned(
                &data.fields,
                "Record can only be derived for structs with named fields",
            ));
        }
    };

    let mut steps = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;

        match field_mode(field)? {
            FieldMode::Column(name) => steps.push(quote! {
                .field::<#ty>(#name, |r| &r.#field_ident, |r| &mut r.#field_ident)
            }),
            FieldMode::Flatten => steps.push(quote! {
                .flatten::<#ty>(|r| &r.#field_ident, |r| &mut r.#field_ident)
            }),
            FieldMode::Skip => {}
        }
    }

    Ok(quote! {
        impl ::widetable::traits::Record for #ident {
            fn field_table() -> &'static ::widetable::traits::FieldTable<Self> {
                static TABLE: ::std::sync::OnceLock<::widetable::traits::FieldTable<#ident>> =
                    ::std::sync::OnceLock::new();

                TABLE.get_or_init(|| {
                    ::widetable::traits::FieldTable::<#ident>::builder()
                        #(#steps)*
                        .build()
                })
            }
        }

        ::widetable::__impl_record_shapes!(#ident);
    })
}

fn field_mode(field: &Field) -> Result<FieldMode, Error> {
    let mut rename = None;
    let mut skip = false;
    let mut flatten = false;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let name: LitStr = meta.value()?.parse()?;
                rename = Some(name.value());
            } else if meta.path.is_ident("skip") {
                skip = true;
            } else if meta.path.is_ident("flatten") {
                flatten = true;
            } else {
                return Err(meta.error("unsupported record attribute"));
            }

            Ok(())
        })?;
    }

    if [skip, flatten, rename.is_some()].iter().filter(|set| **set).count() > 1 {
        return Err(Error::new_spanned(
            field,
            "rename, skip and flatten are mutually exclusive",
        ));
    }

    if skip {
        return Ok(FieldMode::Skip);
    }
    if flatten {
        return Ok(FieldMode::Flatten);
    }

    let name = match (rename, field.ident.as_ref()) {
        (Some(name), _) => name,
        (None, Some(ident)) => ident.to_string().trim_start_matches("r#").to_string(),
        (None, None) => String::new(),
    };

    Ok(FieldMode::Column(name))
}
