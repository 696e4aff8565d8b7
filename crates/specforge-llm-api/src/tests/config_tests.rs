#[cfg(test)]
mod config_tests {
    use crate::config::{
        detect_backend_kind, get_default_model_for_backend, get_default_url_for_backend,
        normalize_base_url, resolve_provider_config, Settings, ANTHROPIC_API_URL,
        DEFAULT_ANTHROPIC_MODEL, DEFAULT_OPENAI_MODEL, OPENAI_API_URL,
    };
    use pretty_assertions::assert_eq;
    use specforge_models::BackendKind;

    fn settings(key: Option<&str>, url: Option<&str>, model: Option<&str>) -> Settings {
        Settings {
            api_key: key.map(str::to_string),
            base_url: url.map(str::to_string),
            model_id: model.map(str::to_string),
            preferred_backend: None,
        }
    }

    #[test]
    fn test_no_key_means_no_direct_backend() {
        assert_eq!(resolve_provider_config(&settings(None, None, None), None), None);
        assert_eq!(
            resolve_provider_config(&settings(Some("   "), Some("https://api.openai.com/v1"), None), None),
            None
        );
    }

    #[test]
    fn test_plain_key_defaults_to_openai() {
        let config = resolve_provider_config(&settings(Some("sk-test"), None, None), None).unwrap();

        assert_eq!(config.backend_kind, BackendKind::OpenAICompatible);
        assert_eq!(config.base_url, OPENAI_API_URL);
        assert_eq!(config.model_id, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.api_key, "sk-test");
    }

    #[test]
    fn test_anthropic_key_prefix_selects_anthropic() {
        let config =
            resolve_provider_config(&settings(Some("sk-ant-abc123"), None, None), None).unwrap();

        assert_eq!(config.backend_kind, BackendKind::Anthropic);
        assert_eq!(config.base_url, ANTHROPIC_API_URL);
        assert_eq!(config.model_id, DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn test_anthropic_url_selects_anthropic() {
        let config = resolve_provider_config(
            &settings(Some("key"), Some("https://gateway.example.com/anthropic/v1/"), None),
            None,
        )
        .unwrap();

        assert_eq!(config.backend_kind, BackendKind::Anthropic);
        assert_eq!(config.base_url, "https://gateway.example.com/anthropic/v1");
    }

    #[test]
    fn test_conflicting_signals_follow_key_prefix() {
        assert_eq!(
            detect_backend_kind("sk-ant-abc", Some("https://api.openai.com/v1")),
            BackendKind::Anthropic
        );
    }

    #[test]
    fn test_pinned_backend_overrides_detection() {
        let config = resolve_provider_config(
            &settings(Some("sk-ant-abc"), Some("http://localhost:8080/v1"), None),
            Some(BackendKind::OpenAICompatible),
        )
        .unwrap();

        assert_eq!(config.backend_kind, BackendKind::OpenAICompatible);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_pinned_host_does_not_change_detection() {
        let config = resolve_provider_config(
            &settings(Some("sk-ant-abc"), None, None),
            Some(BackendKind::HostModel),
        )
        .unwrap();

        assert_eq!(config.backend_kind, BackendKind::Anthropic);
    }

    #[test]
    fn test_settings_model_wins_over_default() {
        let config =
            resolve_provider_config(&settings(Some("sk-test"), None, Some(" llama-3.1-8b ")), None)
                .unwrap();
        assert_eq!(config.model_id, "llama-3.1-8b");
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("https://api.openai.com/v1/"), "https://api.openai.com/v1");
        assert_eq!(
            normalize_base_url("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1"
        );
        assert_eq!(
            normalize_base_url(" https://api.anthropic.com/v1/messages/ "),
            "https://api.anthropic.com/v1"
        );
    }

    #[test]
    fn test_default_urls_and_models() {
        assert_eq!(get_default_url_for_backend(BackendKind::OpenAICompatible), Some(OPENAI_API_URL));
        assert_eq!(get_default_url_for_backend(BackendKind::Anthropic), Some(ANTHROPIC_API_URL));
        assert_eq!(get_default_url_for_backend(BackendKind::HostModel), None);
        assert_eq!(get_default_model_for_backend(BackendKind::HostModel), None);
    }
}
