//! Request derive macro implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse2};

use crate::attrs::{named_fields, parse_container_options, parse_field_options, wire_name};

/// Expand the `#[derive(Request)]` macro.
pub fn expand_request_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let container = parse_container_options(&input.attrs)?;
    let fields = named_fields(&input, "Request")?;

    let mut field_encoders = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let options = parse_field_options(&field.attrs)?;
        if options.skip {
            continue;
        }
        let key = wire_name(field_name, &options, &container);
        field_encoders.push(quote! {
            encoder.field(#key, &self.#field_name)?;
        });
    }

    Ok(quote! {
        impl #impl_generics ::courier::EncodeRequest for #name #ty_generics #where_clause {
            fn encode(&self, encoder: &mut ::courier::RequestEncoder) -> ::courier::Result<()> {
                #(#field_encoders)*
                ::core::result::Result::Ok(())
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use quote::quote;

    use super::*;

    #[test]
    fn fields_are_listed_in_declaration_order() {
        let output = expand_request_derive(quote! {
            #[courier(rename_all = "camelCase")]
            struct Search {
                #[courier(rename = "q")]
                query: String,
                page_size: u32,
                #[courier(skip)]
                cache_key: String,
            }
        })
        .expect("expand")
        .to_string();

        let query = output.find("\"q\"").expect("query field");
        let page_size = output.find("\"pageSize\"").expect("page size field");
        assert!(query < page_size);
        assert!(!output.contains("cache_key"));
        assert!(output.contains("EncodeRequest for Search"));
    }

    #[test]
    fn rejects_tuple_structs() {
        let error = expand_request_derive(quote! { struct Search(String); }).expect_err("tuple");
        insta::assert_snapshot!(error.to_string(), @"Request derive only supports structs with named fields");
    }

    #[test]
    fn rejects_unknown_attributes() {
        let error = expand_request_derive(quote! {
            struct Search {
                #[courier(flatten)]
                query: String,
            }
        })
        .expect_err("unknown attribute");
        insta::assert_snapshot!(error.to_string(), @"unsupported courier field attribute");
    }
}
