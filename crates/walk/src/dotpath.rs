use std::path::Path;

/// Returns true iff `path`'s basename begins with `.`, or the path contains
/// the substring `/.` anywhere.
///
/// Deliberately coarse (spec.md 4.A): this also flags e.g. `/path/to/.git/xxx`
/// even though `xxx` itself is not dot-named, because the path passes through
/// a dot component. Matches upstream `isDotPath` exactly, including its use
/// of a `path.Base`-style basename (so `"."` and `"./"` both resolve to a
/// basename of `"."`, unlike `Path::file_name`).
pub fn is_dot_path(path: &Path) -> bool {
    let s = path.to_string_lossy();
    basename(&s).starts_with('.') || s.contains("/.")
}

/// Go `path.Base`-equivalent basename: trailing separators are trimmed
/// first, an all-separator or empty input yields `"/"`, and no remaining
/// separator yields `"."`.
fn basename(s: &str) -> &str {
    let trimmed = s.trim_end_matches('/');
    if trimmed.is_empty() {
        return if s.is_empty() { "." } else { "/" };
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_path_vectors() {
        let yes = ["/.", "/..", "./", ".", "..", ".git", "/path/to/.git/xxx"];
        for p in yes {
            assert!(is_dot_path(Path::new(p)), "expected dot path: {p}");
        }

        let no = ["/", "xxx", "/path/to/xxx", "/path/to/git./xxx"];
        for p in no {
            assert!(!is_dot_path(Path::new(p)), "expected not dot path: {p}");
        }
    }
}
