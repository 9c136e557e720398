// SPDX-FileCopyrightText: 2026 Tradechat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tradechat check-config` command implementation.

use tradechat_config::ChatConfig;
use tradechat_core::ChatError;

const REDACTED: &str = "[REDACTED]";

/// Renders the effective configuration as TOML with the inline token masked.
pub fn render_effective(config: &ChatConfig) -> Result<String, ChatError> {
    let mut shown = config.clone();
    if shown.auth.token.is_some() {
        shown.auth.token = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| ChatError::Internal(format!("failed to render configuration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted() {
        let mut config = ChatConfig::default();
        config.auth.token = Some("very-secret".into());
        let rendered = render_effective(&config).unwrap();
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("[session]"));
    }

    #[test]
    fn rendered_config_loads_back() {
        let rendered = render_effective(&ChatConfig::default()).unwrap();
        let config = tradechat_config::load_and_validate_str(&rendered).unwrap();
        assert_eq!(config.server.endpoint, ChatConfig::default().server.endpoint);
    }
}
