use std::env;

/// Source of configuration variables.
///
/// Does **not** require `Send + Sync`; configuration is read once at startup.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, env::VarError>;

    /// Trimmed value of `key`, treating unset and blank variables alike.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Untrimmed value of `key`, or `None` when unset or blank.
    fn raw_non_empty(&self, key: &str) -> Option<String> {
        self.var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Boolean flag in the `true/1/yes/on` convention (case-insensitive).
    /// Any other present value is `false`; an absent variable yields `None`.
    fn flag(&self, key: &str) -> Option<bool> {
        self.non_empty(key).map(|v| {
            matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
        })
    }
}
