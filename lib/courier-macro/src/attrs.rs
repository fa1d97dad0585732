//! Attribute parsing for courier derive macros.

use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Field, Fields, LitStr, Token};

/// Case conversion rules for `rename_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub(crate) enum RenameRule {
    /// `lowercase`
    LowerCase,
    /// `UPPERCASE`
    UpperCase,
    /// `camelCase`
    CamelCase,
    /// `PascalCase`
    PascalCase,
    /// `snake_case`
    SnakeCase,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnakeCase,
    /// `kebab-case`
    KebabCase,
    /// `Train-Case`, the usual header spelling
    TrainCase,
}

impl RenameRule {
    /// Parse a rename rule from a string.
    fn parse(s: &str) -> Option<Self> {
        match s {
            "lowercase" => Some(Self::LowerCase),
            "UPPERCASE" => Some(Self::UpperCase),
            "camelCase" => Some(Self::CamelCase),
            "PascalCase" => Some(Self::PascalCase),
            "snake_case" => Some(Self::SnakeCase),
            "SCREAMING_SNAKE_CASE" => Some(Self::ScreamingSnakeCase),
            "kebab-case" => Some(Self::KebabCase),
            "Train-Case" => Some(Self::TrainCase),
            _ => None,
        }
    }

    /// Apply the rename rule to a `snake_case` field name.
    pub(crate) fn apply(self, name: &str) -> String {
        match self {
            Self::LowerCase => name.replace('_', "").to_lowercase(),
            Self::UpperCase => name.replace('_', "").to_uppercase(),
            Self::CamelCase => to_camel_case(name),
            Self::PascalCase => capitalize_words(name, ""),
            Self::SnakeCase => name.to_string(),
            Self::ScreamingSnakeCase => name.to_uppercase(),
            Self::KebabCase => name.replace('_', "-"),
            Self::TrainCase => capitalize_words(name, "-"),
        }
    }
}

/// `user_name` to `userName`.
fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// `user_name` to `User<sep>Name`.
fn capitalize_words(s: &str, separator: &str) -> String {
    s.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Body format named in `#[courier(format = "...")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FormatAttr {
    #[default]
    Json,
    Xml,
    Form,
    Plain,
}

impl FormatAttr {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "xml" => Some(Self::Xml),
            "form" | "form-urlencoded" | "urlencoded" => Some(Self::Form),
            "plain" | "text" => Some(Self::Plain),
            _ => None,
        }
    }

    /// The `BodyFormat` variant name.
    pub(crate) const fn variant(self) -> &'static str {
        match self {
            Self::Json => "Json",
            Self::Xml => "Xml",
            Self::Form => "FormUrlEncoded",
            Self::Plain => "Plain",
        }
    }
}

/// Text encoding named in `#[courier(encoding = "...")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EncodingAttr {
    #[default]
    Utf8,
    Ascii,
    Latin1,
    Utf16Be,
    Utf16Le,
}

impl EncodingAttr {
    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "ascii" | "us-ascii" => Some(Self::Ascii),
            "latin1" | "iso-8859-1" => Some(Self::Latin1),
            "utf-16be" | "utf16be" => Some(Self::Utf16Be),
            "utf-16le" | "utf16le" => Some(Self::Utf16Le),
            _ => None,
        }
    }

    /// The `TextEncoding` variant name.
    pub(crate) const fn variant(self) -> &'static str {
        match self {
            Self::Utf8 => "Utf8",
            Self::Ascii => "Ascii",
            Self::Latin1 => "Latin1",
            Self::Utf16Be => "Utf16Be",
            Self::Utf16Le => "Utf16Le",
        }
    }
}

/// Container options from `#[courier(...)]`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContainerOptions {
    pub(crate) rename_all: Option<RenameRule>,
    pub(crate) format: FormatAttr,
    pub(crate) encoding: EncodingAttr,
}

/// Field options from `#[courier(...)]`.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldOptions {
    pub(crate) rename: Option<String>,
    pub(crate) skip: bool,
}

/// Parse container-level `#[courier(...)]` attributes.
pub(crate) fn parse_container_options(attrs: &[syn::Attribute]) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("courier") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let value: LitStr = meta.value()?.parse()?;
                let rule = RenameRule::parse(&value.value()).ok_or_else(|| {
                    syn::Error::new_spanned(
                        &value,
                        format!(
                            "unknown rename_all value: \"{}\". Expected one of: \
                             lowercase, UPPERCASE, camelCase, PascalCase, \
                             snake_case, SCREAMING_SNAKE_CASE, kebab-case, Train-Case",
                            value.value()
                        ),
                    )
                })?;
                options.rename_all = Some(rule);
            } else if meta.path.is_ident("format") {
                let value: LitStr = meta.value()?.parse()?;
                options.format = FormatAttr::parse(&value.value()).ok_or_else(|| {
                    syn::Error::new_spanned(
                        &value,
                        format!(
                            "unknown format: \"{}\". Expected one of: json, xml, form, plain",
                            value.value()
                        ),
                    )
                })?;
            } else if meta.path.is_ident("encoding") {
                let value: LitStr = meta.value()?.parse()?;
                options.encoding = EncodingAttr::parse(&value.value()).ok_or_else(|| {
                    syn::Error::new_spanned(
                        &value,
                        format!(
                            "unknown encoding: \"{}\". Expected one of: \
                             utf-8, us-ascii, iso-8859-1, utf-16be, utf-16le",
                            value.value()
                        ),
                    )
                })?;
            } else {
                return Err(meta.error("unsupported courier attribute"));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

/// Parse field-level `#[courier(...)]` attributes.
pub(crate) fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("courier") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                options.rename = Some(value.value());
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else {
                return Err(meta.error("unsupported courier field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

/// The named fields of a struct, or an error naming the derive.
pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a Punctuated<Field, Token![,]>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{derive} derive only supports structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{derive} derive only supports structs"),
        )),
    }
}

/// Wire name of a field: explicit rename, then `rename_all`, then the field name.
pub(crate) fn wire_name(
    field_name: &syn::Ident,
    field: &FieldOptions,
    container: &ContainerOptions,
) -> String {
    let name = field_name.to_string();
    let name = name.strip_prefix("r#").unwrap_or(&name);
    if let Some(rename) = &field.rename {
        rename.clone()
    } else if let Some(rule) = container.rename_all {
        rule.apply(name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_rules() {
        assert_eq!(RenameRule::CamelCase.apply("optional_given_value"), "optionalGivenValue");
        assert_eq!(RenameRule::PascalCase.apply("user_name"), "UserName");
        assert_eq!(RenameRule::TrainCase.apply("content_type"), "Content-Type");
        assert_eq!(RenameRule::KebabCase.apply("x_request_id"), "x-request-id");
        assert_eq!(RenameRule::ScreamingSnakeCase.apply("page"), "PAGE");
        assert_eq!(RenameRule::LowerCase.apply("page_size"), "pagesize");
    }

    #[test]
    fn parse_formats_and_encodings() {
        assert_eq!(FormatAttr::parse("JSON"), Some(FormatAttr::Json));
        assert_eq!(FormatAttr::parse("form"), Some(FormatAttr::Form));
        assert_eq!(FormatAttr::parse("yaml"), None);
        assert_eq!(EncodingAttr::parse("UTF-16LE"), Some(EncodingAttr::Utf16Le));
        assert_eq!(EncodingAttr::parse("ebcdic"), None);
    }

    #[test]
    fn wire_name_precedence() {
        let ident: syn::Ident = syn::parse_quote!(page_size);
        let container = ContainerOptions {
            rename_all: Some(RenameRule::CamelCase),
            ..ContainerOptions::default()
        };

        let plain = FieldOptions::default();
        assert_eq!(wire_name(&ident, &plain, &ContainerOptions::default()), "page_size");
        assert_eq!(wire_name(&ident, &plain, &container), "pageSize");

        let renamed = FieldOptions {
            rename: Some("limit".to_string()),
            skip: false,
        };
        assert_eq!(wire_name(&ident, &renamed, &container), "limit");
    }

    #[test]
    fn raw_identifiers_lose_their_prefix() {
        let ident: syn::Ident = syn::parse_quote!(r#type);
        assert_eq!(
            wire_name(&ident, &FieldOptions::default(), &ContainerOptions::default()),
            "type"
        );
    }
}
