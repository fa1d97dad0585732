//! Key casing helpers shared by the body codecs and header matching.

use serde_json::{Map, Value};

/// Convert a `camelCase` key to `snake_case`.
///
/// Acronyms stay together (`myURLValue` → `my_url_value`); leading and
/// trailing underscores are kept; keys already in `snake_case` are unchanged.
#[must_use]
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut result = String::with_capacity(key.len() + 4);

    for (index, &c) in chars.iter().enumerate() {
        if !c.is_uppercase() {
            result.push(c);
            continue;
        }
        let previous = index.checked_sub(1).and_then(|p| chars.get(p));
        let next = chars.get(index + 1);
        let boundary = match previous {
            Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
            Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
            _ => false,
        };
        if boundary {
            result.push('_');
        }
        result.extend(c.to_lowercase());
    }
    result
}

/// Convert a `snake_case` key to `camelCase`.
///
/// The first word is kept as is, later words are capitalized. Leading and
/// trailing underscores are kept.
#[must_use]
pub fn to_camel_case(key: &str) -> String {
    let trimmed = key.trim_matches('_');
    if trimmed.is_empty() || !trimmed.contains('_') {
        return key.to_string();
    }
    let leading = key.len() - key.trim_start_matches('_').len();
    let trailing = key.len() - key.trim_end_matches('_').len();

    let mut result = "_".repeat(leading);
    for (index, word) in trimmed.split('_').filter(|w| !w.is_empty()).enumerate() {
        if index == 0 {
            result.push_str(word);
        } else {
            result.push_str(&titlecase(word));
        }
    }
    result.push_str(&"_".repeat(trailing));
    result
}

/// Normalise a header or field name to `camelCase`.
///
/// Splits on `-` and `_`, lowercases the first segment and titlecases the
/// others: `Content-Type` → `contentType`, `X-RATE-limit` → `xRateLimit`.
#[must_use]
pub fn normalize_header_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for (index, segment) in name
        .split(['-', '_'])
        .filter(|segment| !segment.is_empty())
        .enumerate()
    {
        if index == 0 {
            result.push_str(&segment.to_lowercase());
        } else {
            result.push_str(&titlecase(segment));
        }
    }
    result
}

/// Returns `true` when two header/field names designate the same header.
#[must_use]
pub fn header_names_match(left: &str, right: &str) -> bool {
    normalize_header_name(left).eq_ignore_ascii_case(&normalize_header_name(right))
}

fn titlecase(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Rewrite every object key of a JSON tree.
pub(crate) fn convert_json_keys(value: Value, convert: fn(&str) -> String) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .map(|(key, value)| (convert(&key), convert_json_keys(value, convert)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_json_keys(item, convert))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("oneTwo"), "one_two");
        assert_eq!(to_snake_case("myURLProperty"), "my_url_property");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("ID"), "id");
        assert_eq!(to_snake_case("_privateValue"), "_private_value");
        assert_eq!(to_snake_case("value2Name"), "value2_name");
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(to_camel_case("one_two"), "oneTwo");
        assert_eq!(to_camel_case("my_url_property"), "myUrlProperty");
        assert_eq!(to_camel_case("single"), "single");
        assert_eq!(to_camel_case("_leading_value"), "_leadingValue");
        assert_eq!(to_camel_case("double__underscore"), "doubleUnderscore");
    }

    #[test]
    fn header_name_normalization() {
        assert_eq!(normalize_header_name("Content-Type"), "contentType");
        assert_eq!(normalize_header_name("content-type"), "contentType");
        assert_eq!(normalize_header_name("X-RATE-limit"), "xRateLimit");
        assert_eq!(normalize_header_name("content_type"), "contentType");
        assert_eq!(normalize_header_name("contentType"), "contenttype");
    }

    #[test]
    fn header_names_match_across_conventions() {
        assert!(header_names_match("Content-Type", "contentType"));
        assert!(header_names_match("content-type", "Content-Type"));
        assert!(header_names_match("CONTENT-TYPE", "content_type"));
        assert!(!header_names_match("Content-Length", "contentType"));
    }

    #[test]
    fn json_keys_are_rewritten_recursively() {
        let value = serde_json::json!({
            "userName": "alice",
            "homeAddress": { "zipCode": "1000" },
            "pastOrders": [{ "orderId": 1 }]
        });
        let converted = convert_json_keys(value, to_snake_case);
        assert_eq!(
            converted,
            serde_json::json!({
                "user_name": "alice",
                "home_address": { "zip_code": "1000" },
                "past_orders": [{ "order_id": 1 }]
            })
        );
    }
}
