use mediadrop_config::{ALL_KEYS, AppConfig, EnvSettings, SettingsProvider, StaticSettings};

#[test]
fn env_and_static_providers_agree_on_defaults() -> anyhow::Result<()> {
    let env = EnvSettings::new();
    if ALL_KEYS.iter().any(|key| env.get(key).is_some()) {
        eprintln!("skipping env_and_static_providers_agree_on_defaults: MEDIADROP_* set");
        return Ok(());
    }
    let from_env = AppConfig::load(&env)?;
    let from_static = AppConfig::load(&StaticSettings::new())?;
    assert_eq!(from_env, from_static);
    Ok(())
}

#[test]
fn provider_is_object_safe() -> anyhow::Result<()> {
    let providers: Vec<Box<dyn SettingsProvider>> = vec![
        Box::new(EnvSettings::new()),
        Box::new(StaticSettings::new().with("MEDIADROP_HTTP_PORT", "8181")),
    ];
    let ports: Vec<u16> = providers
        .iter()
        .filter_map(|provider| AppConfig::load(provider.as_ref()).ok())
        .map(|config| config.http.port)
        .collect();
    assert!(ports.contains(&8181));
    Ok(())
}
