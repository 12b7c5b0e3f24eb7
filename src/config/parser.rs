use std::path::Path;
use crate::errors::PipelineError;
use super::types::StagecraftConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::{debug, warn};

/// Picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "stagecraft.yaml";

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<StagecraftConfig, PipelineError> {
    parse_config_with_warnings(path).await.map(|(config, _)| config)
}

/// Parse a config file, returning schema warnings alongside the config.
/// Schema problems are advisory; semantic problems are errors.
pub async fn parse_config_with_warnings(path: &Path) -> Result<(StagecraftConfig, Vec<String>), PipelineError> {
    if !path.exists() {
        return Err(PipelineError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(PipelineError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
        .map_err(|e| PipelineError::Config(format!("Invalid YAML in {}: {}", path.display(), e)))?;

    // An empty file is a valid, all-defaults config
    if yaml.is_null() {
        return Ok((StagecraftConfig::default(), Vec::new()));
    }

    let warnings = validate_schema(&yaml)?;

    let config: StagecraftConfig = serde_yaml::from_value(yaml)
        .map_err(|e| PipelineError::Config(format!("Invalid config {}: {}", path.display(), e)))?;

    validate_semantics(&config)?;

    debug!(path = %path.display(), warnings = warnings.len(), "Config loaded");
    Ok((config, warnings))
}

/// Load `explicit` if given, else `stagecraft.yaml` when present, else defaults.
pub async fn load_config(explicit: Option<&Path>) -> Result<StagecraftConfig, PipelineError> {
    match explicit {
        Some(path) => parse_config(path).await,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                parse_config(default_path).await
            } else {
                debug!("No config file, using defaults");
                Ok(StagecraftConfig::default())
            }
        }
    }
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<Vec<String>, PipelineError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| PipelineError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| PipelineError::Config(format!("Schema compilation error: {}", e)))?;

    let messages: Vec<String> = match compiled.validate(&json_value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect(),
    };
    for msg in &messages {
        warn!(validation_error = %msg, "Config schema warning");
    }
    Ok(messages)
}

/// Reject values that parse but cannot drive a run.
fn validate_semantics(config: &StagecraftConfig) -> Result<(), PipelineError> {
    if config.retry.max_attempts == 0 {
        return Err(PipelineError::Config("retry.max_attempts must be at least 1".into()));
    }
    if config.retry.attempt_timeout_secs == 0 {
        return Err(PipelineError::Config("retry.attempt_timeout_secs must be at least 1".into()));
    }
    if config.deploy.provision && config.deploy.provision_attempts == 0 {
        return Err(PipelineError::Config("deploy.provision_attempts must be at least 1".into()));
    }

    let synthetic = &config.log_analysis.synthetic;
    let numbers = [
        ("retry.delay_secs", config.retry.delay_secs),
        ("retry.max_delay_secs", config.retry.max_delay_secs),
        ("deploy.provision_delay_secs", config.deploy.provision_delay_secs),
        ("log_analysis.error_rate_threshold", config.log_analysis.error_rate_threshold),
        ("log_analysis.synthetic.response_mean_ms", synthetic.response_mean_ms),
        ("log_analysis.synthetic.response_std_dev_ms", synthetic.response_std_dev_ms),
        ("log_analysis.synthetic.response_min_ms", synthetic.response_min_ms),
        ("log_analysis.synthetic.response_max_ms", synthetic.response_max_ms),
    ];
    if let Some((key, value)) = numbers.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
        return Err(PipelineError::Config(format!(
            "{} must be a finite, non-negative number, got {}",
            key, value
        )));
    }
    if synthetic.count == 0 {
        return Err(PipelineError::Config("log_analysis.synthetic.count must be at least 1".into()));
    }
    let ratios = [synthetic.warning_ratio, synthetic.error_ratio, synthetic.auth_failure_ratio];
    if ratios.iter().any(|r| !(0.0..=1.0).contains(r)) {
        return Err(PipelineError::Config("log_analysis.synthetic ratios must lie in [0, 1]".into()));
    }
    if synthetic.warning_ratio + synthetic.error_ratio > 1.0 {
        return Err(PipelineError::Config(format!(
            "log_analysis.synthetic warning_ratio + error_ratio = {} exceeds 1",
            synthetic.warning_ratio + synthetic.error_ratio
        )));
    }
    if synthetic.response_min_ms > synthetic.response_max_ms {
        return Err(PipelineError::Config(
            "log_analysis.synthetic.response_min_ms exceeds response_max_ms".into(),
        ));
    }

    if !config.test.endpoint.starts_with("http://") && !config.test.endpoint.starts_with("https://") {
        return Err(PipelineError::Config(format!(
            "test.endpoint must be an http(s) URL, got '{}'",
            config.test.endpoint
        )));
    }
    if config.build.image_name.trim().is_empty() || config.build.tag.trim().is_empty() {
        return Err(PipelineError::Config("build.image_name and build.tag must not be empty".into()));
    }

    if config.analyzer.provider.is_some() && config.analyzer.evidence_chars == 0 {
        warn!("analyzer.evidence_chars is 0; the analyzer will see no raw evidence");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_parse_full_config() {
        let file = write_config(
            "output:\n  report_dir: reports\nretry:\n  max_attempts: 5\n  backoff: exponential\n\
             deploy:\n  provision: false\nlog_analysis:\n  synthetic:\n    count: 100\n    error_ratio: 0.12\n",
        );
        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert!(!config.deploy.provision);
        assert_eq!(config.log_analysis.synthetic.count, 100);
        assert_eq!(config.output.report_dir, std::path::PathBuf::from("reports"));
    }

    #[tokio::test]
    async fn test_empty_file_is_defaults() {
        let file = write_config("");
        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = parse_config(Path::new("/nonexistent/stagecraft.yaml")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn test_schema_problems_are_warnings() {
        let file = write_config("surprise: true\n");
        let (_, warnings) = parse_config_with_warnings(file.path()).await.unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_config_error() {
        let file = write_config("retry: [unclosed\n");
        assert!(matches!(parse_config(file.path()).await, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = StagecraftConfig::default();
        config.retry.max_attempts = 0;
        assert!(validate_semantics(&config).is_err());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let mut config = StagecraftConfig::default();
        config.retry.delay_secs = f64::INFINITY;
        let err = validate_semantics(&config).unwrap_err();
        assert!(err.to_string().contains("retry.delay_secs"));

        let mut config = StagecraftConfig::default();
        config.log_analysis.synthetic.response_min_ms = f64::NAN;
        assert!(matches!(validate_semantics(&config), Err(PipelineError::Config(_))));

        let mut config = StagecraftConfig::default();
        config.deploy.provision_delay_secs = -1.0;
        assert!(validate_semantics(&config).is_err());
    }

    #[tokio::test]
    async fn test_yaml_infinity_delay_rejected() {
        let file = write_config("retry:\n  delay_secs: .inf\n");
        let err = parse_config(file.path()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_ratio_overflow_rejected() {
        let mut config = StagecraftConfig::default();
        config.log_analysis.synthetic.warning_ratio = 0.7;
        config.log_analysis.synthetic.error_ratio = 0.4;
        assert!(validate_semantics(&config).is_err());
    }

    #[test]
    fn test_endpoint_must_be_http() {
        let mut config = StagecraftConfig::default();
        config.test.endpoint = "localhost:5000".into();
        assert!(validate_semantics(&config).is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_semantics(&StagecraftConfig::default()).is_ok());
    }
}
