//! Shell-style variable expansion for paths taken from the environment.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Match: `$NAME` or `${NAME}`
static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("Invalid variable regex")
});

/// Expand `$NAME` and `${NAME}` references using `lookup`.
///
/// References that `lookup` cannot resolve are left unchanged, the same way
/// a shell leaves a single-quoted `$NAME` alone.
///
/// # Examples
/// ```
/// use hivenet::utils::expand::expand_variables;
///
/// let lookup = |name: &str| (name == "BUILD").then(|| "/opt/hive/build".to_string());
/// assert_eq!(expand_variables("${BUILD}/programs/hived/hived", lookup), "/opt/hive/build/programs/hived/hived");
/// assert_eq!(expand_variables("$MISSING/hived", lookup), "$MISSING/hived");
/// ```
pub fn expand_variables<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    VARIABLE
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            lookup(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Expand references against the process environment
pub fn expand_env(input: &str) -> String {
    expand_variables(input, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_both_reference_forms() {
        let vars: HashMap<&str, &str> = [("ROOT", "/srv"), ("NAME", "hived")].into_iter().collect();
        let lookup = |name: &str| vars.get(name).map(|v| v.to_string());

        assert_eq!(expand_variables("$ROOT/bin/${NAME}", lookup), "/srv/bin/hived");
        assert_eq!(expand_variables("${ROOT}${NAME}", lookup), "/srvhived");
    }

    #[test]
    fn test_text_without_references_is_unchanged() {
        assert_eq!(expand_variables("/usr/bin/hived", |_| None), "/usr/bin/hived");
        assert_eq!(expand_variables("cost$", |_| None), "cost$");
    }
}
