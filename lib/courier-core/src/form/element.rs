use std::collections::BTreeMap;

/// A flattened form map, keyed by wire name.
pub type ElementMap = BTreeMap<String, UrlEncodedElement>;

/// The value stored under one wire name.
///
/// A name seen once holds [`Text`](Self::Text); every further occurrence
/// turns it into a [`List`](Self::List) in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UrlEncodedElement {
    /// A single value.
    Text(String),
    /// Repeated values.
    List(Vec<String>),
}

impl UrlEncodedElement {
    /// Add another value under the same name.
    #[must_use]
    pub fn accumulate(self, value: String) -> Self {
        match self {
            Self::Text(first) => Self::List(vec![first, value]),
            Self::List(mut values) => {
                values.push(value);
                Self::List(values)
            }
        }
    }

    /// All values, in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Text(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        };
        values.iter().map(String::as_str)
    }

    /// The value when there is exactly one.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::List(_) => None,
        }
    }
}

/// Insert `value` under `name`, accumulating repeated names.
pub(crate) fn push(elements: &mut ElementMap, name: String, value: String) {
    let element = match elements.remove(&name) {
        Some(existing) => existing.accumulate(value),
        None => UrlEncodedElement::Text(value),
    };
    elements.insert(name, element);
}
