//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use medbot_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the built-in medical question-answering prompt.
pub const DEFAULT_PROMPT_ID: &str = "medical.qa.default";

const DEFAULT_SYSTEM_TEMPLATE: &str = "You are an Medical assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\n{{context}}";

const DEFAULT_HUMAN_TEMPLATE: &str = "{{input}}";

/// The built-in prompt used when no override file exists.
pub fn default_prompt() -> PromptDefinition {
    PromptDefinition {
        id: DEFAULT_PROMPT_ID.to_string(),
        title: "Medical question answering".to_string(),
        api_version: "1.0".to_string(),
        system: DEFAULT_SYSTEM_TEMPLATE.to_string(),
        human: DEFAULT_HUMAN_TEMPLATE.to_string(),
    }
}

/// Load a prompt definition by ID from a prompts directory.
///
/// This function looks for a file named `<id>.yml` in `prompts_dir`.
///
/// # Arguments
/// * `prompts_dir` - Directory holding prompt definitions
/// * `prompt_id` - Prompt identifier (e.g., "medical.qa.default")
///
/// # Returns
/// A parsed `PromptDefinition` or an error if not found/invalid.
///
/// # Example
/// ```no_run
/// use medbot_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("prompts"), "medical.qa.default")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load a prompt override if one exists, otherwise the built-in default.
///
/// A file that exists but fails to parse or validate is an error; only a
/// missing directory or file falls back.
pub fn load_or_default(prompts_dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        if dir.join(format!("{}.yml", prompt_id)).exists() {
            return load_prompt(dir, prompt_id);
        }
        tracing::debug!(
            "No override for prompt '{}' in {:?}, using built-in",
            prompt_id,
            dir
        );
    }

    if prompt_id == DEFAULT_PROMPT_ID {
        Ok(default_prompt())
    } else {
        Err(AppError::Prompt(format!(
            "Unknown prompt '{}' and no override file found",
            prompt_id
        )))
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if def.system.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt system template cannot be empty".to_string(),
        ));
    }

    if !def.human.contains("{{input}}") {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' human template must reference {{{{input}}}}",
            def.id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_prompt(dir: &Path, id: &str, valid: bool) -> PathBuf {
        let content = if valid {
            format!(
                r#"
id: {}
title: "Test Prompt"
apiVersion: "1.0"
system: "Context: {{{{context}}}}"
human: "{{{{input}}}}"
"#,
                id
            )
        } else {
            "invalid: yaml: content:".to_string()
        };

        let file_path = dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_default_prompt_is_valid() {
        let prompt = default_prompt();
        assert!(validate_prompt(&prompt).is_ok());
        assert!(prompt.system.starts_with("You are an Medical assistant"));
        assert!(prompt.system.ends_with("\n\n{{context}}"));
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "test.prompt", true);

        let prompt = load_prompt(temp_dir.path(), "test.prompt").unwrap();
        assert_eq!(prompt.id, "test.prompt");
        assert_eq!(prompt.title, "Test Prompt");
        assert_eq!(prompt.system, "Context: {{context}}");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "invalid", false);

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_human_template_requires_input() {
        let mut prompt = default_prompt();
        prompt.human = "no placeholder".to_string();
        assert!(validate_prompt(&prompt).is_err());
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let temp_dir = TempDir::new().unwrap();

        let prompt = load_or_default(Some(temp_dir.path()), DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(prompt, default_prompt());

        let prompt = load_or_default(None, DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(prompt, default_prompt());

        assert!(load_or_default(None, "missing.prompt").is_err());
    }

    #[test]
    fn test_load_or_default_prefers_override() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), DEFAULT_PROMPT_ID, true);

        let prompt = load_or_default(Some(temp_dir.path()), DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Test Prompt");
    }
}
