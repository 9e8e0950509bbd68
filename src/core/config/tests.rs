use super::*;
use crate::core::errors::DiscrimError;

fn expect_validation_error<T: std::fmt::Debug>(result: Result<T>) -> DiscrimError {
    result.expect_err("expected validation failure")
}

#[test]
fn default_configs_validate_successfully() {
    DiscrimConfig::default().validate().expect("discrim default");
    ExtractionConfig::default()
        .validate()
        .expect("extraction default");
    AggregationConfig::default()
        .validate()
        .expect("aggregation default");
    OutputConfig::default().validate().expect("output default");
}

#[test]
fn defaults_follow_job_conventions() {
    let config = DiscrimConfig::default();
    assert_eq!(config.extraction.unconditioned_marker, "0");
    assert_eq!(config.extraction.field_delimiter, ",");
    assert_eq!(config.output.field_delimiter, ",");
    assert_eq!(config.aggregation.num_reducers, 1);
    assert!(config.aggregation.enable_combiner);
}

#[test]
fn class_ordinal_must_not_be_a_feature() {
    let mut config = ExtractionConfig::default();
    config.feature_ordinals = vec![0, 2];
    config.class_ordinal = 2;
    let err = expect_validation_error(config.validate());
    assert!(matches!(err, DiscrimError::Config { .. }));
    assert!(format!("{err}").contains("class ordinal 2"));
}

#[test]
fn aggregation_rejects_zero_sizes() {
    let mut config = AggregationConfig::default();
    config.num_reducers = 0;
    let err = expect_validation_error(config.validate());
    assert!(format!("{err}").contains("num_reducers"));

    let mut config = AggregationConfig::default();
    config.shard_size = 0;
    assert!(config.validate().is_err());

    let mut config = AggregationConfig::default();
    config.num_workers = Some(0);
    assert!(config.validate().is_err());
}

#[test]
fn empty_marker_and_delimiters_are_rejected() {
    let mut config = DiscrimConfig::default();
    config.extraction.unconditioned_marker.clear();
    assert!(config.validate().is_err());

    let mut config = DiscrimConfig::default();
    config.output.field_delimiter.clear();
    assert!(config.validate().is_err());
}

#[test]
fn partial_yaml_fills_defaults() {
    let yaml = r#"
extraction:
  feature_ordinals: [2, 3]
  class_ordinal: 5
aggregation:
  num_reducers: 4
"#;
    let config: DiscrimConfig = serde_yaml::from_str(yaml).expect("parse yaml");
    assert_eq!(config.extraction.feature_ordinals, vec![2, 3]);
    assert_eq!(config.extraction.class_ordinal, 5);
    assert_eq!(config.extraction.unconditioned_marker, "0");
    assert_eq!(config.aggregation.num_reducers, 4);
    assert_eq!(config.aggregation.shard_size, 10_000);
    assert_eq!(config.output, OutputConfig::default());
    config.validate().expect("valid partial config");
}

#[test]
fn yaml_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("discrim.yml");

    let mut config = DiscrimConfig::default();
    config.extraction.feature_ordinals = vec![1, 4];
    config.extraction.class_ordinal = 0;
    config.output.field_delimiter = "\t".to_string();
    config.to_yaml_file(&path).expect("write config");

    let loaded = DiscrimConfig::from_yaml_file(&path).expect("read config");
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.extraction.features(),
        vec![FeatureId(1), FeatureId(4)]
    );
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = DiscrimConfig::from_yaml_file("/definitely/not/here.yml").unwrap_err();
    assert!(matches!(err, DiscrimError::Io { .. }));
}
