use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::log_record::{LogLevel, LogRecord};

/// Shape of the generated log set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticLogPolicy {
    pub count: usize,
    pub warning_ratio: f64,
    pub error_ratio: f64,
    /// Share of error records that are authentication failures.
    pub auth_failure_ratio: f64,
    pub response_mean_ms: f64,
    pub response_std_dev_ms: f64,
    pub response_min_ms: f64,
    pub response_max_ms: f64,
    pub seed: Option<u64>,
}

impl Default for SyntheticLogPolicy {
    fn default() -> Self {
        Self {
            count: 50,
            warning_ratio: 0.2,
            error_ratio: 0.1,
            auth_failure_ratio: 0.0,
            response_mean_ms: 100.0,
            response_std_dev_ms: 50.0,
            response_min_ms: 10.0,
            response_max_ms: 1000.0,
            seed: None,
        }
    }
}

impl SyntheticLogPolicy {
    /// Record counts per level; info takes whatever is left.
    pub fn level_counts(&self) -> (usize, usize, usize) {
        let errors = ((self.count as f64) * self.error_ratio.clamp(0.0, 1.0)).round() as usize;
        let errors = errors.min(self.count);
        let warnings = ((self.count as f64) * self.warning_ratio.clamp(0.0, 1.0)).round() as usize;
        let warnings = warnings.min(self.count - errors);
        (self.count - errors - warnings, warnings, errors)
    }
}

/// Generate `policy.count` records, one minute apart, the last one at `end`.
pub fn generate_logs(policy: &SyntheticLogPolicy, end: DateTime<Utc>) -> Vec<LogRecord> {
    let mut rng = match policy.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let (info, warnings, errors) = policy.level_counts();
    let auth_failures = ((errors as f64) * policy.auth_failure_ratio.clamp(0.0, 1.0)).round() as usize;

    let mut levels: Vec<LogLevel> = std::iter::repeat(LogLevel::Info)
        .take(info)
        .chain(std::iter::repeat(LogLevel::Warning).take(warnings))
        .chain(std::iter::repeat(LogLevel::Error).take(errors))
        .collect();
    levels.shuffle(&mut rng);

    let mut auth_left = auth_failures;
    let total = levels.len();
    levels
        .into_iter()
        .enumerate()
        .map(|(i, level)| {
            let pod = format!("microservice-pod-{}", i % 3);
            let response_time = sample_response_time(&mut rng, policy);
            let timestamp = end - Duration::minutes((total - 1 - i) as i64);

            let (status_code, message) = match level {
                LogLevel::Info => (200, "Request processed successfully".to_string()),
                LogLevel::Warning => (
                    200,
                    format!("High response time detected: {:.2}ms", response_time),
                ),
                LogLevel::Error if auth_left > 0 => {
                    auth_left -= 1;
                    (500, "HTTP 500 error: Login failed for user admin".to_string())
                }
                LogLevel::Error => {
                    if rng.gen_bool(0.5) {
                        (500, "HTTP 500 error: Internal Server Error".to_string())
                    } else {
                        (404, "HTTP 404 error: Not Found".to_string())
                    }
                }
            };

            LogRecord {
                timestamp,
                level,
                status_code: Some(status_code),
                response_time_ms: Some(response_time),
                message,
                source: Some(pod),
            }
        })
        .collect()
}

/// Normal sample via Box-Muller, clipped to the policy bounds.
fn sample_response_time(rng: &mut StdRng, policy: &SyntheticLogPolicy) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    let value = policy.response_mean_ms + z * policy.response_std_dev_ms;
    // Unlike clamp, max/min accept NaN and inverted bounds
    value.max(policy.response_min_ms).min(policy.response_max_ms).round()
}
