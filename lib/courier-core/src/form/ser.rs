use serde::Serialize;
use serde_json::Value;

use super::element::{ElementMap, push};
use super::{KeyEncoding, encode_pair};
use crate::format::BodyFormat;
use crate::{Error, Result};

/// Serialize a struct or map to a form string.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the value fails to serialize or is
/// not a struct or map at the top level.
pub fn to_string<T>(value: &T, keys: KeyEncoding) -> Result<String>
where
    T: Serialize + ?Sized,
{
    to_elements(value, keys).map(|elements| serialize_elements(&elements))
}

/// Flatten a struct or map into its wire elements.
///
/// # Errors
///
/// Same as [`to_string`].
pub fn to_elements<T>(value: &T, keys: KeyEncoding) -> Result<ElementMap>
where
    T: Serialize + ?Sized,
{
    let tree = serde_json::to_value(value)
        .map_err(|e| Error::serialization(BodyFormat::FormUrlEncoded, e.to_string()))?;
    let Value::Object(fields) = tree else {
        return Err(Error::serialization(
            BodyFormat::FormUrlEncoded,
            "top-level value must be a struct or map",
        ));
    };

    let mut elements = ElementMap::new();
    for (key, value) in fields {
        flatten(&mut elements, keys.apply(&key).into_owned(), value, keys);
    }
    Ok(elements)
}

/// Render elements as `name=value` pairs joined by `&`, sorted by name.
#[must_use]
pub fn serialize_elements(elements: &ElementMap) -> String {
    elements
        .iter()
        .flat_map(|(name, element)| element.values().map(move |value| encode_pair(name, value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn flatten(elements: &mut ElementMap, path: String, value: Value, keys: KeyEncoding) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => push(elements, path, flag.to_string()),
        Value::Number(number) => push(elements, path, number.to_string()),
        Value::String(text) => push(elements, path, text),
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        flatten(elements, format!("{path}[{index}]"), item, keys);
                    }
                    scalar => flatten(elements, path.clone(), scalar, keys),
                }
            }
        }
        Value::Object(fields) => {
            for (key, value) in fields {
                flatten(
                    elements,
                    format!("{path}.{}", keys.apply(&key)),
                    value,
                    keys,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Serialize;

    use super::*;
    use crate::form::UrlEncodedElement;

    #[derive(Serialize)]
    struct Address {
        city: String,
        zip_code: Option<String>,
    }

    #[derive(Serialize)]
    struct Item {
        name: String,
        quantity: u32,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Order {
        customer_name: String,
        home_address: Address,
        items: Vec<Item>,
        tags: Vec<String>,
        note: Option<String>,
        express: bool,
    }

    fn order() -> Order {
        Order {
            customer_name: "Ada Lovelace".to_string(),
            home_address: Address {
                city: "London".to_string(),
                zip_code: None,
            },
            items: vec![
                Item {
                    name: "pen".to_string(),
                    quantity: 2,
                },
                Item {
                    name: "ink".to_string(),
                    quantity: 1,
                },
            ],
            tags: vec!["gift".to_string(), "urgent".to_string()],
            note: None,
            express: true,
        }
    }

    #[test]
    fn flattens_nested_values() {
        let elements = to_elements(&order(), KeyEncoding::UseDefaultKeys).expect("encode");
        let expected: BTreeMap<_, _> = [
            ("customerName", UrlEncodedElement::Text("Ada Lovelace".to_string())),
            ("express", UrlEncodedElement::Text("true".to_string())),
            ("homeAddress.city", UrlEncodedElement::Text("London".to_string())),
            ("items[0].name", UrlEncodedElement::Text("pen".to_string())),
            ("items[0].quantity", UrlEncodedElement::Text("2".to_string())),
            ("items[1].name", UrlEncodedElement::Text("ink".to_string())),
            ("items[1].quantity", UrlEncodedElement::Text("1".to_string())),
            (
                "tags",
                UrlEncodedElement::List(vec!["gift".to_string(), "urgent".to_string()]),
            ),
        ]
        .into_iter()
        .map(|(name, element)| (name.to_string(), element))
        .collect();
        assert_eq!(elements, expected);
    }

    #[test]
    fn sorted_and_snake_cased() {
        let encoded = to_string(&order(), KeyEncoding::ConvertToSnakeCase).expect("encode");
        insta::assert_snapshot!(encoded, @"customer_name=Ada%20Lovelace&express=true&home_address.city=London&items%5B0%5D.name=pen&items%5B0%5D.quantity=2&items%5B1%5D.name=ink&items%5B1%5D.quantity=1&tags=gift&tags=urgent");
    }

    #[test]
    fn rejects_scalars_at_top_level() {
        let error = to_string(&42, KeyEncoding::UseDefaultKeys).expect_err("scalar");
        assert!(matches!(
            error,
            Error::Serialization {
                format: BodyFormat::FormUrlEncoded,
                ..
            }
        ));
    }

    #[test]
    fn empty_struct_is_empty_string() {
        #[derive(Serialize)]
        struct Empty {}
        assert_eq!(to_string(&Empty {}, KeyEncoding::UseDefaultKeys).expect("encode"), "");
    }
}
