/// API token lookup
use std::path::Path;

use lichess_arena::{BotError, Result};

pub const TOKEN_ENV_VAR: &str = "LICHESS_API_TOKEN";
pub const DEFAULT_TOKEN_FILE: &str = "config/lichess_api.yml";

/// Token from the environment, else from the `api_token:` line of `file`
pub fn resolve_token(file: &Path) -> Result<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        let token = token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    match std::fs::read_to_string(file) {
        Ok(contents) => parse_token_file(&contents).ok_or(BotError::CredentialMissing),
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", file.display(), e);
            Err(BotError::CredentialMissing)
        }
    }
}

/// Value of the first `api_token:` line, with optional quotes removed
fn parse_token_file(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let value = line.trim().strip_prefix("api_token:")?.trim();
        let value = value.trim_matches(|c| c == '"' || c == '\'').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_token_line() {
        let contents = "# Lichess credentials\napi_token: lip_abc123\n";
        assert_eq!(parse_token_file(contents), Some("lip_abc123".to_string()));
    }

    #[test]
    fn test_quoted_token_line() {
        assert_eq!(
            parse_token_file("api_token: \"lip_double\""),
            Some("lip_double".to_string())
        );
        assert_eq!(
            parse_token_file("  api_token:'lip_single'  "),
            Some("lip_single".to_string())
        );
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(parse_token_file("username: someone\n"), None);
        assert_eq!(parse_token_file("api_token: \"\"\n"), None);
        assert_eq!(parse_token_file(""), None);
    }

    #[test]
    fn test_unreadable_file_is_credential_missing() {
        // Only meaningful when the variable is not set for the test run
        if std::env::var(TOKEN_ENV_VAR).is_ok() {
            return;
        }
        let result = resolve_token(Path::new("/nonexistent/lichess_api.yml"));
        assert!(matches!(result, Err(BotError::CredentialMissing)));
    }
}
