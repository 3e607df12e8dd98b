//! Evaluator configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gradeforge_core::processor::AttemptPolicy;
use gradeforge_core::traits::AnswerEvaluator;

use crate::heuristic::HeuristicEvaluator;
use crate::openai::OpenAiEvaluator;

/// Configuration for the answer evaluator.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EvaluatorConfig {
    Heuristic,
    OpenAI {
        api_key: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for EvaluatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluatorConfig::Heuristic => f.debug_struct("Heuristic").finish(),
            EvaluatorConfig::OpenAI {
                api_key: _,
                model,
                base_url,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .finish(),
        }
    }
}

/// Top-level gradeforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeforgeConfig {
    /// Which evaluator scores free-text answers.
    #[serde(default = "default_evaluator")]
    pub evaluator: EvaluatorConfig,
    /// Whether repeat submissions are accepted.
    #[serde(default = "default_attempt_policy")]
    pub attempt_policy: AttemptPolicy,
    /// Max submissions graded concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for analytics and report artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_evaluator() -> EvaluatorConfig {
    EvaluatorConfig::Heuristic
}
fn default_attempt_policy() -> AttemptPolicy {
    AttemptPolicy::Multiple
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./gradeforge-out")
}

impl Default for GradeforgeConfig {
    fn default() -> Self {
        Self {
            evaluator: default_evaluator(),
            attempt_policy: default_attempt_policy(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in an evaluator config.
fn resolve_evaluator_config(config: &EvaluatorConfig) -> EvaluatorConfig {
    match config {
        EvaluatorConfig::Heuristic => EvaluatorConfig::Heuristic,
        EvaluatorConfig::OpenAI {
            api_key,
            model,
            base_url,
        } => EvaluatorConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            model: model.clone(),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradeforge.toml` in the current directory
/// 2. `~/.config/gradeforge/config.toml`
///
/// When `GRADEFORGE_OPENAI_KEY` is set and the configured evaluator is
/// OpenAI, the key from the environment replaces the one in the file.
pub fn load_config() -> Result<GradeforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradeforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("gradeforge.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<GradeforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradeforgeConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("GRADEFORGE_OPENAI_KEY") {
        if let EvaluatorConfig::OpenAI { api_key, .. } = &mut config.evaluator {
            *api_key = key;
        }
    }

    config.evaluator = resolve_evaluator_config(&config.evaluator);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradeforge"))
}

/// Create an evaluator instance from its configuration.
pub fn create_evaluator(config: &EvaluatorConfig) -> Result<Arc<dyn AnswerEvaluator>> {
    match config {
        EvaluatorConfig::Heuristic => Ok(Arc::new(HeuristicEvaluator::new())),
        EvaluatorConfig::OpenAI {
            api_key,
            model,
            base_url,
        } => Ok(Arc::new(OpenAiEvaluator::new(
            api_key,
            model.clone(),
            base_url.clone(),
        ))),
    }
}
