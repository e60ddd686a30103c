//! Secret reference resolver.
//!
//! Token values in `config.toml` can point at secrets stored outside the
//! file:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and uses the first line
//! - `env::VAR_NAME` reads `$VAR_NAME` from the environment
//! - anything else is used as-is

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    let resolved = if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)?
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)?
    } else {
        value.to_string()
    };

    if resolved.trim().is_empty() {
        return Err(format!("`{}` resolved to an empty value", redact(value)));
    }
    Ok(resolved.trim().to_string())
}

/// Plain-text tokens are never echoed back in errors.
fn redact(value: &str) -> &str {
    if value.starts_with("pass::") || value.starts_with("env::") {
        value
    } else {
        "<inline token>"
    }
}

/// Runs `pass show <path>` and returns the first line of stdout.
fn resolve_pass(path: &str) -> Result<String, String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed (exit {}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(|s| s.to_string())
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("ya29.a0AfH6SM").unwrap(), "ya29.a0AfH6SM");
        assert_eq!(resolve("  padded-token\n").unwrap(), "padded-token");
    }

    #[test]
    fn empty_value_errors_without_leaking() {
        let err = resolve("   ").unwrap_err();
        assert!(err.contains("<inline token>"));
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_INVITESCAN_TEST_SECRET", "graph-token");
        }
        assert_eq!(resolve("env::_INVITESCAN_TEST_SECRET").unwrap(), "graph-token");
        unsafe {
            std::env::remove_var("_INVITESCAN_TEST_SECRET");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let result = resolve("env::_INVITESCAN_NONEXISTENT_VAR_12345");
        assert!(result.unwrap_err().contains("not set"));
    }

    #[test]
    fn pass_prefix_missing_entry_errors() {
        // Fails whether or not `pass` is installed.
        let result = resolve("pass::nonexistent/entry/that/should/not/exist/12345");
        assert!(result.is_err());
    }
}
