use super::*;
use crate::core::config::CredentialStoreKind;
use std::time::Duration;

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn set(key: &str, values: &[&str], config: &mut Config) -> Result<String, SettingError> {
    SettingRegistry::new()
        .get(key)
        .unwrap_or_else(|| panic!("no handler for {key}"))
        .set(&args(values), config)
}

fn unset(key: &str, arg: Option<&str>, config: &mut Config) -> Result<String, SettingError> {
    SettingRegistry::new()
        .get(key)
        .unwrap_or_else(|| panic!("no handler for {key}"))
        .unset(arg, config)
}

#[test]
fn registry_knows_every_key() {
    assert_eq!(
        SettingRegistry::new().keys_sorted(),
        vec![
            "base-url",
            "credential-store",
            "default-model",
            "default-provider",
            "reprompt-delay-ms",
            "resume-after-save",
        ]
    );
    assert!(SettingRegistry::new().get("theme").is_none());
}

#[test]
fn default_provider_is_canonicalized() {
    let mut config = Config::default();
    set("default-provider", &["Gemini"], &mut config).unwrap();
    assert_eq!(config.default_provider.as_deref(), Some("gemini"));

    let err = set("default-provider", &["anthropic"], &mut config).unwrap_err();
    assert!(matches!(err, SettingError::UnknownProvider { ref input } if input == "anthropic"));

    unset("default-provider", None, &mut config).unwrap();
    assert!(config.default_provider.is_none());
}

#[test]
fn default_model_joins_words_and_requires_provider() {
    let mut config = Config::default();
    let err = set("default-model", &["openai"], &mut config).unwrap_err();
    assert!(matches!(err, SettingError::MissingArgs { .. }));

    set("default-model", &["GROK", "grok", "beta"], &mut config).unwrap();
    assert_eq!(config.get_default_model("grok").map(String::as_str), Some("grok beta"));

    assert!(unset("default-model", None, &mut config).is_err());
    unset("default-model", Some("grok"), &mut config).unwrap();
    assert!(config.default_models.is_empty());
}

#[test]
fn base_url_is_normalized() {
    let mut config = Config::default();
    set("base-url", &["openai", "http://localhost:8080/v1/"], &mut config).unwrap();
    assert_eq!(
        config.base_urls.get("openai").map(String::as_str),
        Some("http://localhost:8080/v1")
    );
}

#[test]
fn credential_store_and_delay_validate_input() {
    let mut config = Config::default();
    set("credential-store", &["file"], &mut config).unwrap();
    assert_eq!(config.credential_store(), CredentialStoreKind::File);
    assert!(matches!(
        set("credential-store", &["vault"], &mut config),
        Err(SettingError::InvalidValue { .. })
    ));

    set("reprompt-delay-ms", &["250"], &mut config).unwrap();
    assert_eq!(config.reprompt_delay(), Duration::from_millis(250));
    assert!(set("reprompt-delay-ms", &["soon"], &mut config).is_err());
    unset("reprompt-delay-ms", None, &mut config).unwrap();
    assert_eq!(config.reprompt_delay_ms, None);
}

#[test]
fn resume_after_save_accepts_on_off_words() {
    let mut config = Config::default();
    set("resume-after-save", &["off"], &mut config).unwrap();
    assert!(!config.resume_after_save());
    assert!(matches!(
        set("resume-after-save", &["maybe"], &mut config),
        Err(SettingError::InvalidBoolean(_))
    ));
    unset("resume-after-save", None, &mut config).unwrap();
    assert!(config.resume_after_save());
}
