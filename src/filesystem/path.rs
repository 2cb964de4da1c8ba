//! `/`-separated path keys.
//!
//! Paths are relative keys into a bucket. The root is the empty string. All
//! helpers here produce cleaned paths: no empty or `.` segments, `..` folds
//! into its parent, no leading or trailing separator.

/// path separator used for every key
pub const SEPARATOR: char = '/';

/// normalize a path
pub fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// join `segment` onto `base`
pub fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        return clean(segment);
    }
    if segment.is_empty() {
        return clean(base);
    }
    clean(&format!("{}{}{}", base, SEPARATOR, segment))
}

/// every prefix of `path`, root first and `path` itself last
///
/// `"a/b"` yields `["", "a", "a/b"]`.
pub fn prefixes(path: &str) -> Vec<String> {
    let path = clean(path);
    let mut out = vec![String::new()];
    if path.is_empty() {
        return out;
    }
    let mut current = String::new();
    for segment in path.split(SEPARATOR) {
        current = join(&current, segment);
        out.push(current.clone());
    }
    out
}

/// split a path into its parent directory and final name
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind(SEPARATOR) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// the name of `path` relative to `dir` if `path` is a direct child of `dir`
///
/// deeper descendants, `dir` itself, and unrelated paths yield `None`.
pub fn child_name<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    let rest = if dir.is_empty() {
        path
    } else {
        path.strip_prefix(dir)?.strip_prefix(SEPARATOR)?
    };
    if rest.is_empty() || rest.contains(SEPARATOR) {
        return None;
    }
    Some(rest)
}

/// prefix shared by every descendant of `dir`
pub(crate) fn descendant_prefix(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{}{}", dir, SEPARATOR)
    }
}

/// the segments of a cleaned path
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}
