use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "output": {
                "type": "object",
                "properties": {
                    "report_dir": { "type": "string" },
                    "history_db": { "type": "string" }
                }
            },
            "retry": {
                "type": "object",
                "properties": {
                    "max_attempts": { "type": "integer", "minimum": 1 },
                    "backoff": { "type": "string", "enum": ["fixed", "exponential"] },
                    "delay_secs": { "type": "number", "minimum": 0 },
                    "max_delay_secs": { "type": "number", "minimum": 0 },
                    "attempt_timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "analyzer": {
                "type": "object",
                "properties": {
                    "provider": { "type": "string", "enum": ["anthropic", "claude", "openai", "local", "ollama", "openai-compatible", "openai_compatible"] },
                    "model": { "type": "string" },
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string" },
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "max_attempts": { "type": "integer", "minimum": 1 },
                    "evidence_chars": { "type": "integer", "minimum": 1 },
                    "history_depth": { "type": "integer", "minimum": 0 },
                    "prompts_dir": { "type": "string" }
                }
            },
            "build": {
                "type": "object",
                "properties": {
                    "registry": { "type": "string" },
                    "actor": { "type": "string" },
                    "image_name": { "type": "string", "minLength": 1 },
                    "tag": { "type": "string", "minLength": 1 },
                    "context": { "type": "string" },
                    "push": { "type": "boolean" }
                }
            },
            "test": {
                "type": "object",
                "properties": {
                    "endpoint": { "type": "string" },
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "max_attempts": { "type": "integer", "minimum": 1 }
                }
            },
            "deploy": {
                "type": "object",
                "properties": {
                    "manifest": { "type": "string" },
                    "deployment_name": { "type": "string" },
                    "namespace": { "type": "string" },
                    "pod_selector": { "type": "string" },
                    "provision": { "type": "boolean" },
                    "cluster_name": { "type": "string" },
                    "provision_attempts": { "type": "integer", "minimum": 1 },
                    "provision_delay_secs": { "type": "number", "minimum": 0 }
                }
            },
            "log_analysis": {
                "type": "object",
                "properties": {
                    "namespace": { "type": "string" },
                    "selector": { "type": "string" },
                    "error_rate_threshold": { "type": "number", "minimum": 0, "maximum": 100 },
                    "synthetic_only": { "type": "boolean" },
                    "markdown_report": { "type": "boolean" },
                    "synthetic": {
                        "type": "object",
                        "properties": {
                            "count": { "type": "integer", "minimum": 1 },
                            "warning_ratio": { "type": "number", "minimum": 0, "maximum": 1 },
                            "error_ratio": { "type": "number", "minimum": 0, "maximum": 1 },
                            "auth_failure_ratio": { "type": "number", "minimum": 0, "maximum": 1 },
                            "response_mean_ms": { "type": "number" },
                            "response_std_dev_ms": { "type": "number", "minimum": 0 },
                            "response_min_ms": { "type": "number", "minimum": 0 },
                            "response_max_ms": { "type": "number", "minimum": 0 },
                            "seed": { "type": "integer", "minimum": 0 }
                        }
                    }
                }
            }
        }
    })
});
