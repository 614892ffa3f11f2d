pub const DEFAULT_HF_BASE: &str = "https://router.huggingface.co";
pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com";
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

pub const DEFAULT_HF_TEXT_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";
pub const DEFAULT_HF_VISION_MODEL: &str = "Qwen/Qwen2.5-VL-7B-Instruct";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_LOCAL_MODEL: &str = "llava";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_UI_DIR: &str = "web";

/**
 * \brief Provider credentials and endpoints, resolved once at start-up.
 * \details An empty environment value counts as absent.
 */
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub hf_token: Option<String>,
    pub hf_base_url: Option<String>,
    pub hf_text_model: Option<String>,
    pub hf_vision_model: Option<String>,

    pub openai_api_key: Option<String>,
    /** \brief Presence selects a local/self-hosted target. */
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    pub openai_local_model: Option<String>,

    pub gemini_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    pub gemini_model: Option<String>,

    /** \brief Try lower-priority providers when the selected one fails. */
    pub fallback_on_error: bool,
    pub telemetry_enabled: bool,
    /** \brief Static client build served behind the API routes. */
    pub ui_dir: Option<String>,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /**
     * \brief Build the config from an arbitrary variable source.
     */
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };
        let flag = |key: &str| {
            get(&[key])
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        Self {
            hf_token: get(&["HF_TOKEN", "HUGGINGFACE_API_KEY"]),
            hf_base_url: get(&["HF_BASE_URL"]),
            hf_text_model: get(&["HF_TEXT_MODEL"]),
            hf_vision_model: get(&["HF_VISION_MODEL"]),
            openai_api_key: get(&["OPENAI_API_KEY"]),
            openai_base_url: get(&["OPENAI_BASE_URL"]),
            openai_model: get(&["OPENAI_MODEL"]),
            openai_local_model: get(&["OPENAI_LOCAL_MODEL"]),
            gemini_api_key: get(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]),
            gemini_base_url: get(&["GEMINI_BASE_URL"]),
            gemini_model: get(&["GEMINI_MODEL"]),
            fallback_on_error: flag("DESCRIBO_PROVIDER_FALLBACK"),
            telemetry_enabled: flag("DESCRIBO_TELEMETRY"),
            ui_dir: get(&["DESCRIBO_UI_DIR"]),
        }
    }

    pub fn ui_dir(&self) -> &str {
        self.ui_dir.as_deref().unwrap_or(DEFAULT_UI_DIR)
    }

    pub fn hf_enabled(&self) -> bool {
        self.hf_token.is_some()
    }

    pub fn openai_enabled(&self) -> bool {
        self.openai_api_key.is_some() || self.openai_base_url.is_some()
    }

    pub fn gemini_enabled(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ProviderConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProviderConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_empty_environment_enables_nothing() {
        let cfg = config_from(&[]);
        assert!(!cfg.hf_enabled());
        assert!(!cfg.openai_enabled());
        assert!(!cfg.gemini_enabled());
        assert!(!cfg.fallback_on_error);
        assert_eq!(cfg.ui_dir(), DEFAULT_UI_DIR);
    }

    #[test]
    fn test_ui_dir_override() {
        let cfg = config_from(&[("DESCRIBO_UI_DIR", "client/dist")]);
        assert_eq!(cfg.ui_dir(), "client/dist");
    }

    #[test]
    fn test_blank_values_count_as_absent() {
        let cfg = config_from(&[("HF_TOKEN", "  "), ("OPENAI_BASE_URL", "")]);
        assert!(!cfg.hf_enabled());
        assert!(!cfg.openai_enabled());
    }

    #[test]
    fn test_base_url_alone_enables_openai() {
        let cfg = config_from(&[("OPENAI_BASE_URL", "http://localhost:11434/v1")]);
        assert!(cfg.openai_enabled());
        assert!(cfg.openai_api_key.is_none());
    }

    #[test]
    fn test_aliases_and_flags() {
        let cfg = config_from(&[
            ("HUGGINGFACE_API_KEY", "hf_x"),
            ("GOOGLE_API_KEY", "g"),
            ("DESCRIBO_PROVIDER_FALLBACK", "TRUE"),
            ("DESCRIBO_TELEMETRY", "0"),
        ]);
        assert_eq!(cfg.hf_token.as_deref(), Some("hf_x"));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("g"));
        assert!(cfg.fallback_on_error);
        assert!(!cfg.telemetry_enabled);
    }
}
