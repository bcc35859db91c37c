//! Normalization of `includedPackages` prefixes (base spec §6) and the
//! small amount of FQ-name arithmetic the rest of the workspace shares.

/// Normalize a raw list of dotted package prefixes:
///
/// 1. Trim; drop empty entries.
/// 2. Replace `"*"` and `*.…` with their non-wildcard equivalents (strip a
///    trailing `.*`).
/// 3. If any entry became empty (originally `"*"`), the result means "all
///    packages" and the empty list is returned.
/// 4. Sort; absorb sub-prefixes: if `com.a` is present, remove any later
///    `com.a.b`.
pub fn normalize_prefixes<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries: Vec<String> = Vec::new();

    for item in raw {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }

        let stripped = trimmed.strip_suffix(".*").unwrap_or(trimmed);
        let stripped = if stripped == "*" { "" } else { stripped };

        if stripped.is_empty() {
            // "*" (bare or with a wildcard suffix) means "all packages".
            return Vec::new();
        }

        entries.push(stripped.to_string());
    }

    entries.sort();
    entries.dedup();
    absorb_sub_prefixes(entries)
}

fn absorb_sub_prefixes(sorted: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(sorted.len());
    for entry in sorted {
        let is_sub_prefix_of_existing = result
            .iter()
            .any(|kept: &String| is_sub_prefix(kept, &entry));
        if !is_sub_prefix_of_existing {
            result.push(entry);
        }
    }
    result
}

/// True iff `candidate` is `prefix` itself or a dotted descendant of it,
/// e.g. `is_sub_prefix("com.a", "com.a.b")`.
fn is_sub_prefix(prefix: &str, candidate: &str) -> bool {
    candidate == prefix || candidate.starts_with(&format!("{prefix}."))
}

/// Does `fq_name` fall under one of the normalized `prefixes`? An empty
/// prefix list means "accept everything".
pub fn matches_any_prefix(fq_name: &str, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return true;
    }
    prefixes.iter().any(|p| is_sub_prefix(p, fq_name))
}

/// The simple (unqualified) name of a dotted fully-qualified class name.
pub fn simple_name(fq_name: &str) -> &str {
    fq_name.rsplit('.').next().unwrap_or(fq_name)
}

/// True iff `fq_name` denotes a nested/inner class (`Outer$Inner`), which
/// the Indexer filters out before indexing.
pub fn is_nested_class(fq_name: &str) -> bool {
    fq_name.contains('$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_wildcard_and_subprefixes() {
        let result = normalize_prefixes(["com.test.*", "com.test", "com.test.demo", "com.other"]);
        assert_eq!(result, vec!["com.other".to_string(), "com.test".to_string()]);
    }

    #[test]
    fn bare_star_means_all() {
        assert!(normalize_prefixes(["*"]).is_empty());
        assert!(normalize_prefixes([""]).is_empty());
    }

    #[test]
    fn unrelated_prefixes_are_kept_distinct() {
        let result = normalize_prefixes(["com.a", "com.b", "org.c"]);
        assert_eq!(result, vec!["com.a", "com.b", "org.c"]);
    }

    #[test]
    fn prefix_match_is_dot_bounded() {
        let prefixes = vec!["com.test".to_string()];
        assert!(matches_any_prefix("com.test.Foo", &prefixes));
        assert!(matches_any_prefix("com.test", &prefixes));
        assert!(!matches_any_prefix("com.testing.Foo", &prefixes));
    }

    #[test]
    fn empty_prefix_list_accepts_everything() {
        assert!(matches_any_prefix("anything.Goes", &[]));
    }

    #[test]
    fn nested_class_detection() {
        assert!(is_nested_class("com.example.Outer$Inner"));
        assert!(!is_nested_class("com.example.Outer"));
    }
}
