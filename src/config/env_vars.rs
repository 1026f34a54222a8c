use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// `${VAR}` or `$VAR`
    static ref UNIX_VAR: Regex = Regex::new(r"\$\{([^}]+)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap();

    /// `%VAR%`
    static ref WINDOWS_VAR: Regex = Regex::new(r"%([^%]+)%").unwrap();
}

/// Expand Unix-style environment variables (`$VAR` and `${VAR}`).
///
/// Variables that are not set are left untouched.
pub fn expand_unix_env_vars(path: &str) -> Cow<'_, str> {
    UNIX_VAR.replace_all(path, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    })
}

/// Expand Windows-style environment variables (`%VAR%`).
///
/// Variables that are not set are left untouched.
pub fn expand_windows_env_vars(path: &str) -> Cow<'_, str> {
    WINDOWS_VAR.replace_all(path, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
}

/// Expand every environment variable form understood on this platform.
pub fn expand_env_vars(path: &str) -> String {
    let expanded = expand_unix_env_vars(path);
    if cfg!(windows) {
        expand_windows_env_vars(&expanded).into_owned()
    } else {
        expanded.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_expand_unix_dollar_style() {
        env::set_var("EGRESS_TEST_HOME", "/home/user");

        assert_eq!(expand_unix_env_vars("$EGRESS_TEST_HOME"), "/home/user");
        assert_eq!(
            expand_unix_env_vars("$EGRESS_TEST_HOME/out/*.txt"),
            "/home/user/out/*.txt"
        );

        env::remove_var("EGRESS_TEST_HOME");
    }

    #[test]
    fn test_expand_unix_brace_style() {
        env::set_var("EGRESS_TEST_BRACE", "logs");

        assert_eq!(expand_unix_env_vars("${EGRESS_TEST_BRACE}/**/*.log"), "logs/**/*.log");
        assert_eq!(
            expand_unix_env_vars("prefix-${EGRESS_TEST_BRACE}-suffix"),
            "prefix-logs-suffix"
        );

        env::remove_var("EGRESS_TEST_BRACE");
    }

    #[test]
    fn test_unset_variables_are_kept() {
        assert_eq!(expand_unix_env_vars("$EGRESS_DOES_NOT_EXIST/a"), "$EGRESS_DOES_NOT_EXIST/a");
        assert_eq!(expand_unix_env_vars("${EGRESS_DOES_NOT_EXIST}"), "${EGRESS_DOES_NOT_EXIST}");
        assert_eq!(expand_windows_env_vars("%EGRESS_DOES_NOT_EXIST%\\a"), "%EGRESS_DOES_NOT_EXIST%\\a");
    }

    #[test]
    fn test_edge_cases() {
        assert_eq!(expand_unix_env_vars("$"), "$");
        assert_eq!(expand_unix_env_vars("${"), "${");
        assert_eq!(expand_unix_env_vars("${incomplete"), "${incomplete");
        assert_eq!(expand_unix_env_vars("*.txt"), "*.txt");
        assert_eq!(expand_windows_env_vars("%"), "%");
        assert_eq!(expand_windows_env_vars("100%"), "100%");
    }

    #[test]
    fn test_expand_windows_style() {
        env::set_var("EGRESS_TEST_WIN", "C:\\batch");

        assert_eq!(expand_windows_env_vars("%EGRESS_TEST_WIN%\\out"), "C:\\batch\\out");

        env::remove_var("EGRESS_TEST_WIN");
    }
}
