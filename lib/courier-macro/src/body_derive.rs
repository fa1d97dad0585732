//! Body derive macro implementation.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::{DeriveInput, parse2};

use crate::attrs::parse_container_options;

/// Expand the `#[derive(Body)]` macro.
pub fn expand_body_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let options = parse_container_options(&input.attrs)?;
    if options.rename_all.is_some() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "rename_all is not supported on Body, use serde's rename_all instead",
        ));
    }
    let format = Ident::new(options.format.variant(), Span::call_site());
    let encoding = Ident::new(options.encoding.variant(), Span::call_site());

    Ok(quote! {
        impl #impl_generics ::courier::Formatted for #name #ty_generics #where_clause {
            const FORMAT: ::courier::BodyFormat = ::courier::BodyFormat::#format;
            const TEXT_ENCODING: ::courier::TextEncoding = ::courier::TextEncoding::#encoding;
        }
    })
}

#[cfg(test)]
mod tests {
    use quote::quote;

    use super::*;

    #[test]
    fn defaults_to_json() {
        let output = expand_body_derive(quote! { struct User { id: u64 } })
            .expect("expand")
            .to_string();
        assert!(output.contains("BodyFormat :: Json"));
        assert!(output.contains("TextEncoding :: Utf8"));
    }

    #[test]
    fn format_and_encoding() {
        let output = expand_body_derive(quote! {
            #[courier(format = "form", encoding = "iso-8859-1")]
            enum Login { Password { user: String } }
        })
        .expect("expand")
        .to_string();
        assert!(output.contains("BodyFormat :: FormUrlEncoded"));
        assert!(output.contains("TextEncoding :: Latin1"));
    }

    #[test]
    fn rejects_unknown_format() {
        let error = expand_body_derive(quote! {
            #[courier(format = "yaml")]
            struct User { id: u64 }
        })
        .expect_err("unknown format");
        insta::assert_snapshot!(error.to_string(), @r#"unknown format: "yaml". Expected one of: json, xml, form, plain"#);
    }
}
