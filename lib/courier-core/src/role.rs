//! Field roles and how repeated roles merge.
//!
//! A request definition may list several fields with the same role. Some
//! roles keep the first value, others overwrite by name, others append.
//! The table lives in [`FieldRole::merge_rule`].

use derive_more::Display;

/// Where a request field goes on the HTTP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FieldRole {
    /// The HTTP method.
    #[display("method")]
    Method,
    /// The path template.
    #[display("path")]
    Path,
    /// A `{name}` path parameter.
    #[display("path parameter")]
    PathParameter,
    /// A query item.
    #[display("query item")]
    QueryItem,
    /// A header field.
    #[display("header")]
    Header,
    /// Cookies for the `Cookie` header.
    #[display("cookies")]
    Cookies,
    /// A URL replacing the base URL.
    #[display("custom URL")]
    CustomUrl,
    /// The cache policy.
    #[display("cache policy")]
    CachePolicy,
    /// The request body.
    #[display("body")]
    Body,
}

/// How a repeated role is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum MergeRule {
    /// The first declared field wins; later ones are ignored.
    #[display("first wins")]
    FirstWins,
    /// A later field with the same name replaces the earlier value.
    #[display("overwrite by name")]
    Overwrite,
    /// Every occurrence is kept, in declaration order.
    #[display("append")]
    Append,
}

impl FieldRole {
    /// Every role.
    pub const ALL: [Self; 9] = [
        Self::Method,
        Self::Path,
        Self::PathParameter,
        Self::QueryItem,
        Self::Header,
        Self::Cookies,
        Self::CustomUrl,
        Self::CachePolicy,
        Self::Body,
    ];

    /// The merge rule for this role.
    #[must_use]
    pub const fn merge_rule(self) -> MergeRule {
        match self {
            Self::Method | Self::Path | Self::CustomUrl | Self::CachePolicy | Self::Body => {
                MergeRule::FirstWins
            }
            Self::PathParameter | Self::Header => MergeRule::Overwrite,
            Self::QueryItem | Self::Cookies => MergeRule::Append,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_rule_table() {
        let table: Vec<String> = FieldRole::ALL
            .iter()
            .map(|role| format!("{role}: {}", role.merge_rule()))
            .collect();
        insta::assert_snapshot!(table.join("\n"), @r"
        method: first wins
        path: first wins
        path parameter: overwrite by name
        query item: append
        header: overwrite by name
        cookies: append
        custom URL: first wins
        cache policy: first wins
        body: first wins
        ");
    }
}
