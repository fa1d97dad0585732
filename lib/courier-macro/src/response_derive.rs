//! Response derive macro implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse2};

use crate::attrs::{named_fields, parse_container_options, parse_field_options, wire_name};

/// Expand the `#[derive(Response)]` macro.
pub fn expand_response_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let container = parse_container_options(&input.attrs)?;
    let fields = named_fields(&input, "Response")?;

    let mut field_decoders = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let options = parse_field_options(&field.attrs)?;
        if options.skip {
            field_decoders.push(quote! {
                #field_name: ::core::default::Default::default()
            });
            continue;
        }
        let key = wire_name(field_name, &options, &container);
        field_decoders.push(quote! {
            #field_name: decoder.field(#key)?
        });
    }

    Ok(quote! {
        impl #impl_generics ::courier::DecodeResponse for #name #ty_generics #where_clause {
            fn decode(decoder: &mut ::courier::ResponseDecoder<'_>) -> ::courier::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#field_decoders,)*
                })
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use quote::quote;

    use super::*;

    #[test]
    fn skipped_fields_use_default() {
        let output = expand_response_derive(quote! {
            struct UserResponse {
                status: StatusCode,
                #[courier(rename = "X-Request-Id")]
                request_id: Header<String>,
                #[courier(skip)]
                received_at: Option<u64>,
            }
        })
        .expect("expand")
        .to_string();

        assert!(output.contains("\"status\""));
        assert!(output.contains("\"X-Request-Id\""));
        assert!(!output.contains("\"received_at\""));
        assert!(output.contains("Default :: default ()"));
    }

    #[test]
    fn rejects_enums() {
        let error = expand_response_derive(quote! { enum Reply { Ok, Err } }).expect_err("enum");
        insta::assert_snapshot!(error.to_string(), @"Response derive only supports structs");
    }
}
