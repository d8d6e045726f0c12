//! Record derive macro implementation

use crate::attrs::{parse_field_attrs, parse_struct_attrs};
use crate::common::syn_types::option_inner;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

fn column_expr(db: Option<String>, json: Option<String>) -> TokenStream {
    let pick = |name: Option<String>| match name {
        Some(name) => quote! { ::core::option::Option::Some(#name) },
        None => quote! { ::core::option::Option::<&'static str>::None },
    };
    let db = pick(db);
    let json = pick(json);
    quote! {
        match family {
            ::sqlrunner::TagFamily::Db => #db,
            ::sqlrunner::TagFamily::Json => #json,
        }
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let struct_attrs = parse_struct_attrs(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut push_columns = Vec::new();
    let mut push_values = Vec::new();
    let mut push_targets = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let attrs = parse_field_attrs(field)?;

        if attrs.flatten {
            if option_inner(ty).and_then(option_inner).is_some() {
                return Err(syn::Error::new_spanned(
                    ty,
                    "#[orm(flatten)] does not support nested Option embeds",
                ));
            }
            push_columns.push(quote! {
                <#ty as ::sqlrunner::Embedded>::embed_columns(family, out);
            });
            push_values.push(quote! {
                ::sqlrunner::Embedded::embed_values(&self.#ident, family, out)?;
            });
            push_targets.push(quote! {
                ::sqlrunner::Embedded::embed_targets(&mut self.#ident, family, out);
            });
            continue;
        }

        let (db, json) = (attrs.db_column(), attrs.json_column());
        if db.is_none() && json.is_none() {
            continue;
        }
        let column = column_expr(db, json);
        push_columns.push(quote! {
            if let ::core::option::Option::Some(column) = #column {
                out.push(column);
            }
        });
        push_values.push(quote! {
            if let ::core::option::Option::Some(column) = #column {
                out.push((column, ::sqlrunner::ToValue::to_value(&self.#ident)));
            }
        });
        push_targets.push(quote! {
            if let ::core::option::Option::Some(column) = #column {
                out.push(::sqlrunner::ScanTarget::new(column, &mut self.#ident));
            }
        });
    }

    let table_impl = struct_attrs.table.map(|table| {
        quote! {
            impl #impl_generics ::sqlrunner::TableName for #name #ty_generics #where_clause {
                fn table_name() -> &'static str {
                    #table
                }
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::sqlrunner::Record for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn push_columns(
                family: ::sqlrunner::TagFamily,
                out: &mut ::std::vec::Vec<&'static str>,
            ) {
                #(#push_columns)*
            }

            #[allow(unused_variables)]
            fn push_values(
                &self,
                family: ::sqlrunner::TagFamily,
                out: &mut ::std::vec::Vec<(&'static str, ::sqlrunner::Value)>,
            ) -> ::sqlrunner::RunnerResult<()> {
                #(#push_values)*
                ::core::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn push_targets<'__a>(
                &'__a mut self,
                family: ::sqlrunner::TagFamily,
                out: &mut ::std::vec::Vec<::sqlrunner::ScanTarget<'__a>>,
            ) {
                #(#push_targets)*
            }
        }

        impl #impl_generics ::sqlrunner::Embedded for #name #ty_generics #where_clause {
            fn embed_columns(
                family: ::sqlrunner::TagFamily,
                out: &mut ::std::vec::Vec<&'static str>,
            ) {
                <Self as ::sqlrunner::Record>::push_columns(family, out)
            }

            fn embed_values(
                &self,
                family: ::sqlrunner::TagFamily,
                out: &mut ::std::vec::Vec<(&'static str, ::sqlrunner::Value)>,
            ) -> ::sqlrunner::RunnerResult<()> {
                ::sqlrunner::Record::push_values(self, family, out)
            }

            fn embed_targets<'__a>(
                &'__a mut self,
                family: ::sqlrunner::TagFamily,
                out: &mut ::std::vec::Vec<::sqlrunner::ScanTarget<'__a>>,
            ) {
                ::sqlrunner::Record::push_targets(self, family, out)
            }
        }

        #table_impl
    })
}
