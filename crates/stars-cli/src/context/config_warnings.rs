use stars_config::StarsConfig;

/// Warn about `STARS_*` variables that look like credentials but were not
/// picked up because of a single-underscore separator.
pub fn warn_unconfigured(config: &StarsConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &StarsConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();
    let mut warnings = Vec::new();

    if !config.github.is_configured() && has_env_prefix(&env_keys, "STARS_GITHUB") {
        warnings.push(
            "GitHub token is empty while STARS_GITHUB* env vars exist. Use double underscores (example: STARS_GITHUB__TOKEN)."
                .to_string(),
        );
    }

    if !config.llm.is_configured() && has_env_prefix(&env_keys, "STARS_LLM") {
        warnings.push(
            "LLM API key is empty while STARS_LLM* env vars exist. Use double underscores (example: STARS_LLM__API_KEY)."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use stars_config::{GithubConfig, LlmConfig, StarsConfig};

    use super::collect_unconfigured_warnings;

    #[test]
    fn warns_for_single_underscore_keys() {
        let warnings = collect_unconfigured_warnings(
            &StarsConfig::default(),
            vec![
                ("STARS_GITHUB_TOKEN".to_string(), "ghp_x".to_string()),
                ("STARS_LLM_API_KEY".to_string(), "sk-x".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ],
        );
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn quiet_when_sections_are_configured() {
        let config = StarsConfig {
            github: GithubConfig {
                token: "ghp_x".to_string(),
                ..Default::default()
            },
            llm: LlmConfig {
                api_key: "sk-x".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let warnings = collect_unconfigured_warnings(
            &config,
            vec![
                ("STARS_GITHUB__TOKEN".to_string(), "ghp_x".to_string()),
                ("STARS_LLM__API_KEY".to_string(), "sk-x".to_string()),
            ],
        );
        assert!(warnings.is_empty());
    }
}
