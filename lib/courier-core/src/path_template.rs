//! Path templates with `{name}` placeholders.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{Error, Result};

/// Characters escaped in a substituted path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// The path template a request was built from, before substitution.
///
/// Carried on the encoded [`Request`](crate::Request) so that transports
/// and middleware can group requests by route (`/users/{id}`) rather than by
/// resolved path (`/users/42`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// Create a new path template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Get the template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute every `{name}` occurrence with its percent-encoded value.
    ///
    /// Placeholders without a parameter are left as they are.
    ///
    /// ```
    /// use courier_core::PathTemplate;
    ///
    /// let template = PathTemplate::new("/a/{id}/b/{id}/{missing}");
    /// let path = template.resolve(&[("id".to_string(), "4 2".to_string())]);
    /// assert_eq!(path, "/a/4%202/b/4%202/{missing}");
    /// ```
    #[must_use]
    pub fn resolve(&self, parameters: &[(String, String)]) -> String {
        let mut path = self.0.clone();
        for (name, value) in parameters {
            let placeholder = format!("{{{name}}}");
            if path.contains(&placeholder) {
                let encoded = utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string();
                path = path.replace(&placeholder, &encoded);
            } else {
                tracing::debug!(parameter = %name, template = %self.0, "path parameter has no placeholder");
            }
        }
        path
    }

    /// Names of the `{name}` placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.0
            .split('{')
            .skip(1)
            .filter_map(|rest| rest.split_once('}').map(|(name, _)| name))
    }
}

/// Check that `name` can appear inside a `{name}` placeholder.
///
/// # Errors
///
/// Returns [`Error::InvalidPathParameterName`] for an empty name or one
/// containing `{`, `}` or `/`.
pub fn validate_parameter_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['{', '}', '/']) {
        return Err(Error::InvalidPathParameterName(name.to_string()));
    }
    Ok(())
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let template = PathTemplate::new("/a/{id}/b/{id}");
        assert_eq!(template.resolve(&params(&[("id", "42")])), "/a/42/b/42");
    }

    #[test]
    fn unmatched_placeholder_stays() {
        let template = PathTemplate::new("/x/{missing}");
        assert_eq!(template.resolve(&params(&[("other", "1")])), "/x/{missing}");
    }

    #[test]
    fn values_are_segment_encoded() {
        let template = PathTemplate::new("/files/{name}");
        assert_eq!(
            template.resolve(&params(&[("name", "a/b c?d%")])),
            "/files/a%2Fb%20c%3Fd%25"
        );
    }

    #[test]
    fn placeholders_in_order() {
        let template = PathTemplate::new("/users/{user_id}/posts/{post_id}");
        assert_eq!(
            template.placeholders().collect::<Vec<_>>(),
            ["user_id", "post_id"]
        );
    }

    #[test]
    fn parameter_names() {
        assert!(validate_parameter_name("id").is_ok());
        for name in ["", "{id}", "a/b", "x}"] {
            let error = validate_parameter_name(name).expect_err("invalid name");
            assert!(matches!(error, Error::InvalidPathParameterName(n) if n == name));
        }
    }

    #[test]
    fn path_template_as_ref() {
        let template = PathTemplate::new("/users/{id}");
        let s: &str = template.as_ref();
        assert_eq!(s, "/users/{id}");
        assert_eq!(template.to_string(), "/users/{id}");
    }
}
