use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex_lite::Regex;

use super::{encode_query, Params, RouteParser};
use crate::error::{Result, ViewError};

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*([A-Za-z_][A-Za-z0-9_-]*)\s*(?::[^{}]*)?\}").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern like `/hello/{name}` or `/users/{id:[0-9]+}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| ViewError::InvalidRoutePattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("patterns must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER_RE.captures_iter(pattern) {
            let whole = caps.get(0).expect("group 0 always matches");
            let literal = &pattern[last..whole.start()];
            if literal.contains(['{', '}']) {
                return Err(invalid("unbalanced braces"));
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.to_string()));
            }
            segments.push(Segment::Param(caps[1].to_string()));
            last = whole.end();
        }

        let rest = &pattern[last..];
        if rest.contains(['{', '}']) {
            return Err(invalid("unbalanced braces"));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the placeholders, in order of appearance.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

/// Named routes, enough to drive the URL helpers without a full router.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, RoutePattern>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `name = "pattern"` pairs, e.g. the `[routes]` config table.
    pub fn from_patterns<'a>(
        patterns: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Result<Self> {
        let mut table = Self::new();
        for (name, pattern) in patterns {
            table.add(name.clone(), pattern)?;
        }
        Ok(table)
    }

    /// Register a named route, replacing any previous route with the same name.
    pub fn add(&mut self, name: impl Into<String>, pattern: &str) -> Result<()> {
        let pattern = RoutePattern::parse(pattern)?;
        self.routes.insert(name.into(), pattern);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RoutePattern> {
        self.routes.get(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteParser for RouteTable {
    fn build_path(&self, name: &str, data: &Params, query: &Params) -> Result<String> {
        let pattern = self.routes.get(name).ok_or_else(|| ViewError::RouteNotFound {
            name: name.to_string(),
        })?;

        let mut path = String::new();
        for segment in &pattern.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param(param) => {
                    let value = data.get(param).ok_or_else(|| ViewError::MissingRouteData {
                        route: name.to_string(),
                        param: param.clone(),
                    })?;
                    path.push_str(value);
                }
            }
        }

        let query = encode_query(query)?;
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table.add("hello", "/hello/{name}").unwrap();
        table.add("post", "/blog/{year:[0-9]+}/{ slug }").unwrap();
        table.add("home", "/").unwrap();
        table
    }

    #[rstest]
    #[case("hello", &[("name", "world")], &[], "/hello/world")]
    #[case("hello", &[("name", "world")], &[("foo", "bar")], "/hello/world?foo=bar")]
    #[case("home", &[], &[("q", "a b"), ("page", "2")], "/?page=2&q=a+b")]
    #[case("hello", &[("name", "world"), ("extra", "x")], &[], "/hello/world")]
    fn test_build_path(
        #[case] name: &str,
        #[case] data: &[(&str, &str)],
        #[case] query: &[(&str, &str)],
        #[case] expected: &str,
    ) {
        let path = table()
            .build_path(name, &params(data), &params(query))
            .unwrap();
        assert_eq!(path, expected);
    }

    #[test]
    fn test_unknown_route() {
        let result = table().build_path("nope", &Params::new(), &Params::new());
        assert!(matches!(result, Err(ViewError::RouteNotFound { name }) if name == "nope"));
    }

    #[test]
    fn test_missing_route_data() {
        let result = table().build_path("hello", &Params::new(), &Params::new());
        assert!(matches!(
            result,
            Err(ViewError::MissingRouteData { route, param }) if route == "hello" && param == "name"
        ));
    }

    #[rstest]
    #[case("hello/{name}")]
    #[case("/hello/{name")]
    #[case("/hello/name}")]
    #[case("/hello/{}")]
    fn test_invalid_patterns(#[case] pattern: &str) {
        let result = RoutePattern::parse(pattern);
        assert!(matches!(result, Err(ViewError::InvalidRoutePattern { .. })));
    }

    #[test]
    fn test_pattern_params() {
        let pattern = RoutePattern::parse("/blog/{year:[0-9]+}/{slug}").unwrap();
        assert_eq!(pattern.params().collect::<Vec<_>>(), vec!["year", "slug"]);
        assert_eq!(pattern.as_str(), "/blog/{year:[0-9]+}/{slug}");
    }
}
