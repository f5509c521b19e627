use crate::conf::{ConfigError, EngineConfig, validate};

#[test]
fn default_config_is_valid() {
    assert!(validate(&EngineConfig::default()).is_ok());
}

#[test]
fn validation_collects_every_violation() {
    // Arrange
    let mut cfg = EngineConfig::default();
    cfg.index.batch_size = 0;
    cfg.search.default_limit = cfg.search.max_limit + 1;
    cfg.enrichment.enable_geoip = true;

    // Act
    let err = validate(&cfg).unwrap_err();

    // Assert
    match err {
        ConfigError::Invalid { violations } => {
            assert_eq!(violations.len(), 3);
            assert!(violations[0].contains("batch_size"));
            assert!(violations[1].contains("default_limit"));
            assert!(violations[2].contains("geoip_db"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rate_limit_is_only_checked_when_enabled() {
    // Arrange
    let mut cfg = EngineConfig::default();
    cfg.rate_limit.requests_per_second = 0.0;

    // Act / Assert
    assert!(validate(&cfg).is_ok());

    cfg.rate_limit.enabled = true;
    assert!(validate(&cfg).is_err());
}
