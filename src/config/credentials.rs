use tracing::debug;

/// `$NAME` reads the environment variable; anything else is a literal.
/// An unset variable resolves to an empty key, which disables the provider.
pub fn resolve_credential(value: &str) -> String {
    match value.strip_prefix('$') {
        Some(var_name) => match std::env::var(var_name) {
            Ok(resolved) => {
                debug!(var = %var_name, "Resolved API key from environment");
                resolved
            }
            Err(_) => {
                debug!(var = %var_name, "API key variable not set");
                String::new()
            }
        },
        None => value.to_string(),
    }
}

/// Mask secrets in text bound for reports or logs. Secrets shorter than
/// eight characters are left alone; they match too much ordinary text.
pub fn redact_secret(text: &str, secret: &str) -> String {
    if secret.len() < 8 {
        return text.to_string();
    }
    text.replace(secret, "[REDACTED]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_key() {
        assert_eq!(resolve_credential("sk-live-123"), "sk-live-123");
    }

    #[test]
    fn test_env_reference() {
        std::env::set_var("STAGECRAFT_TEST_KEY", "from-env");
        assert_eq!(resolve_credential("$STAGECRAFT_TEST_KEY"), "from-env");
        std::env::remove_var("STAGECRAFT_TEST_KEY");
    }

    #[test]
    fn test_missing_env_reference_is_empty() {
        assert_eq!(resolve_credential("$STAGECRAFT_UNSET_KEY_VAR"), "");
    }

    #[test]
    fn test_redact_secret() {
        let text = "401 from api with key sk-ant-abcdef123";
        assert_eq!(redact_secret(text, "sk-ant-abcdef123"), "401 from api with key [REDACTED]");
        assert_eq!(redact_secret("key=abc", "abc"), "key=abc");
    }
}
