use std::path::{Path, PathBuf};
use crate::errors::PipelineError;
use tracing::debug;

pub const SYSTEM_PROMPT: &str = "You review CI/CD stage results. Be concrete and brief. \
Never restate an issue that is already listed in the summary.";

const STAGE_ANALYSIS: &str = "\
Stage: {{AGENT}}

Structured summary of this run:
```json
{{SUMMARY}}
```

Raw evidence (truncated):
```
{{EVIDENCE}}
```

Previous runs of this stage, newest first:
{{HISTORY}}

List additional issues and mitigations the summary does not already contain.
Reply with one fenced block:
```json
{\"issues\": [\"...\"], \"mitigations\": [\"...\"]}
```
Use empty lists if there is nothing to add.";

const TRAINING: &str = "\
Stage: {{AGENT}}

Recent run summaries, newest first:
{{HISTORY}}

Suggest how this stage's configuration or the service it exercises could be
improved so future runs fail less often. Answer in at most two sentences.";

/// Variables available for template interpolation.
#[derive(Debug, Clone, Default)]
pub struct PromptVariables {
    pub agent: String,
    pub summary: Option<String>,
    pub evidence: Option<String>,
    pub history: Option<String>,
}

/// Built-in prompt templates, optionally overridden by `<name>.txt` files.
#[derive(Debug, Clone, Default)]
pub struct PromptLoader {
    prompts_dir: Option<PathBuf>,
}

impl PromptLoader {
    pub fn new(prompts_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = &prompts_dir {
            debug!(dir = %dir.display(), "Prompt overrides enabled");
        }
        Self { prompts_dir }
    }

    /// Load a template by name (`stage-analysis` or `training`).
    pub fn load(&self, prompt_name: &str) -> Result<String, PipelineError> {
        if let Some(dir) = &self.prompts_dir {
            let file_path = dir.join(format!("{}.txt", prompt_name));
            if file_path.exists() {
                return std::fs::read_to_string(&file_path).map_err(|e| {
                    PipelineError::Analyzer(format!("Failed to read prompt {}: {}", file_path.display(), e))
                });
            }
        }
        builtin(prompt_name)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::Analyzer(format!("Unknown prompt: {}", prompt_name)))
    }

    /// Replace {{VARIABLE}} placeholders. None values become "(none)".
    pub fn interpolate(&self, template: &str, vars: &PromptVariables) -> String {
        let mut result = template.replace("{{AGENT}}", &vars.agent);

        let optional_replacements: &[(&str, &Option<String>)] = &[
            ("{{SUMMARY}}", &vars.summary),
            ("{{EVIDENCE}}", &vars.evidence),
            ("{{HISTORY}}", &vars.history),
        ];
        for (placeholder, value) in optional_replacements {
            let replacement = value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or("(none)");
            result = result.replace(placeholder, replacement);
        }

        result
    }

    pub fn prompts_dir(&self) -> Option<&Path> {
        self.prompts_dir.as_deref()
    }
}

fn builtin(prompt_name: &str) -> Option<&'static str> {
    match prompt_name {
        "stage-analysis" => Some(STAGE_ANALYSIS),
        "training" => Some(TRAINING),
        _ => None,
    }
}
