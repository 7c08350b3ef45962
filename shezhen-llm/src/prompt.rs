//! Instruction prompt for tongue analysis.
//!
//! The built-in template is Simplified Chinese and asks for the four output
//! sections; `{response_shape}` is filled with a sketch derived from the
//! output schema. A TOML file can replace the template without a rebuild.

use std::path::Path;

use serde::Deserialize;
use shezhen_core::ShezhenError;

use crate::schema;

/// Built-in instruction template.
pub const TONGUE_ANALYSIS_INSTRUCTION: &str = r"你是一位资深的中医专家。请分析这张舌像照片，并根据中医理论提供详细解读。

要求：
1. 识别舌色、舌形、苔质、津液。
2. 给出具体的中医辨证（体质或证型），并说明依据。
3. 提供具体的饮食建议、生活起居建议和食疗用的药食同源食材。
4. 所有描述请使用专业且通俗易懂的简体中文。

请直接返回符合以下结构的 JSON，不要附加任何其他文字：
{response_shape}";

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// TOML layout of a prompt override file.
#[derive(Debug, Clone, Deserialize)]
struct TomlPromptFile {
    prompt: TomlPromptData,
}

#[derive(Debug, Clone, Deserialize)]
struct TomlPromptData {
    version: String,
    instruction: String,
}

/// A loaded, ready-to-render instruction template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    /// Template version string (`builtin` for the compiled-in one).
    pub version: String,
    /// Instruction text, may contain `{response_shape}`.
    pub instruction: String,
}

impl Default for AnalysisPrompt {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AnalysisPrompt {
    /// The compiled-in template.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            version: "builtin".into(),
            instruction: TONGUE_ANALYSIS_INSTRUCTION.into(),
        }
    }

    /// Parse an override from TOML:
    ///
    /// ```toml
    /// [prompt]
    /// version = "2"
    /// instruction = "..."
    /// ```
    ///
    /// # Errors
    /// Returns `ShezhenError::Config` if the TOML is invalid or the
    /// instruction is blank.
    pub fn from_toml_str(content: &str) -> shezhen_core::error::Result<Self> {
        let parsed: TomlPromptFile =
            toml::from_str(content).map_err(|e| ShezhenError::Config(e.to_string()))?;
        if parsed.prompt.instruction.trim().is_empty() {
            return Err(ShezhenError::Config("prompt instruction is empty".into()));
        }
        Ok(Self {
            version: parsed.prompt.version,
            instruction: parsed.prompt.instruction,
        })
    }

    /// Load an override from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> shezhen_core::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The final instruction text sent with the image.
    #[must_use]
    pub fn render(&self) -> String {
        render_template(
            &self.instruction,
            &[("response_shape", schema::shape_sketch().as_str())],
        )
    }
}
