use crate::error::{Result, ViewError};

/// Compute the relative reference that leads from `from` to `to`.
///
/// Both inputs must be absolute, already-normalized URL paths. The last
/// segment of `from` is treated as a file name unless `from` ends in `/`.
/// Identical inputs yield `./`.
pub fn relative_path(to: &str, from: &str) -> Result<String> {
    for path in [to, from] {
        if !path.starts_with('/') {
            return Err(ViewError::NotAbsolutePath {
                path: path.to_string(),
            });
        }
    }

    if to == from {
        return Ok("./".to_string());
    }

    let mut from_dirs: Vec<&str> = from[1..].split('/').collect();
    from_dirs.pop();

    let mut to_dirs: Vec<&str> = to[1..].split('/').collect();
    let target = to_dirs.pop().unwrap_or_default();

    let common = from_dirs
        .iter()
        .zip(&to_dirs)
        .take_while(|(a, b)| a == b)
        .count();

    let mut tail = to_dirs[common..].to_vec();
    tail.push(target);

    let path = format!(
        "{}{}",
        "../".repeat(from_dirs.len() - common),
        tail.join("/")
    );

    if path.is_empty() || path.starts_with('/') || colon_in_first_segment(&path) {
        Ok(format!("./{path}"))
    } else {
        Ok(path)
    }
}

// A leading "a:b" segment would parse as a scheme (RFC 3986 section 4.2).
fn colon_in_first_segment(path: &str) -> bool {
    match (path.find(':'), path.find('/')) {
        (Some(colon), Some(slash)) => colon < slash,
        (Some(_), None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("/a", "/a", "./")]
    #[case("/", "/a/b", "../")]
    #[case("/a", "/b/c", "../a")]
    #[case("/a/b/c", "/a/b/", "c")]
    #[case("/a/", "/a/x", "./")]
    #[case("/a/", "/a/b/c", "../")]
    #[case("/c/", "/a/b", "../c/")]
    #[case("/a", "/a/", "../a")]
    #[case("/x/y/z", "/a/b/c/d", "../../../x/y/z")]
    #[case("/a/b/page", "/a/b/other", "page")]
    #[case("/a/b/", "/a/b/", "./")]
    #[case("/a:b", "/c", "./a:b")]
    #[case("/a:b/c", "/d", "./a:b/c")]
    #[case("/a/b:c", "/d", "a/b:c")]
    fn test_relative_path(#[case] to: &str, #[case] from: &str, #[case] expected: &str) {
        assert_eq!(relative_path(to, from).unwrap(), expected);
    }

    #[rstest]
    #[case("a/b", "/c")]
    #[case("/a", "c")]
    #[case("", "/")]
    fn test_relative_path_requires_absolute(#[case] to: &str, #[case] from: &str) {
        let err = relative_path(to, from).unwrap_err();
        assert!(matches!(err, ViewError::NotAbsolutePath { .. }));
    }

    /// Resolve a relative reference produced by `relative_path` against `base`.
    fn resolve(reference: &str, base: &str) -> String {
        let dir_end = base.rfind('/').unwrap();
        let mut dirs: Vec<&str> = base[1..=dir_end]
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut rest = reference.strip_prefix("./").unwrap_or(reference);
        while let Some(r) = rest.strip_prefix("../") {
            dirs.pop();
            rest = r;
        }

        let mut out = String::from("/");
        for dir in dirs {
            out.push_str(dir);
            out.push('/');
        }
        out.push_str(rest);
        out
    }

    fn absolute_path() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..5),
            any::<bool>(),
        )
            .prop_map(|(segments, dir)| {
                let mut path = format!("/{}", segments.join("/"));
                if dir && !segments.is_empty() {
                    path.push('/');
                }
                path
            })
    }

    proptest! {
        #[test]
        fn resolving_relative_path_yields_target(to in absolute_path(), from in absolute_path()) {
            prop_assume!(to != from || to.ends_with('/'));
            let relative = relative_path(&to, &from).unwrap();
            prop_assert_eq!(resolve(&relative, &from), to);
        }
    }
}
