//! Tool specification types for OpenAI-compatible function calling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A tool specification compatible with OpenAI's function calling format.
///
/// The same shape is used for the built-in specs and for entries of a
/// `tools.json` manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The type of tool (always "function" for function calling).
    #[serde(rename = "type", default = "function_type")]
    pub spec_type: String,

    /// The function definition.
    pub function: FunctionDefinition,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            spec_type: function_type(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters: FunctionParameters::Empty,
            },
        }
    }

    pub fn with_parameters(mut self, parameters: FunctionParameters) -> Self {
        self.function.parameters = parameters;
        self
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn read_file() -> Self {
        Self::new(
            "read_file",
            "Read the full contents of a text file inside the working directory.",
        )
        .with_parameters(FunctionParameters::object(
            [("path", "string", "File path, relative to the working directory")],
            [("path", true)],
        ))
    }

    pub fn write_file() -> Self {
        Self::new(
            "write_file",
            "Create or overwrite a file with the given content. Parent directories are created as needed.",
        )
        .with_parameters(FunctionParameters::object(
            [
                ("path", "string", "File path, relative to the working directory"),
                ("content", "string", "Complete new file content"),
            ],
            [("path", true), ("content", true)],
        ))
    }

    pub fn edit_file() -> Self {
        Self::new(
            "edit_file",
            "Replace exactly one occurrence of old_string with new_string in a file. \
             Include enough surrounding context in old_string to make the match unique.",
        )
        .with_parameters(FunctionParameters::object(
            [
                ("path", "string", "File path, relative to the working directory"),
                ("old_string", "string", "Exact text to replace"),
                ("new_string", "string", "Replacement text"),
            ],
            [("path", true), ("old_string", true), ("new_string", true)],
        ))
    }

    pub fn run_shell() -> Self {
        Self::new(
            "run_shell",
            "Execute a command in the user's default shell and return the exit code with captured stdout/stderr.",
        )
        .with_parameters(FunctionParameters::object(
            [
                ("command", "string", "Shell command to execute"),
                ("description", "string", "What the command does and why"),
                (
                    "safety",
                    "string",
                    "One of: read-only, modify, destructive, network, privileged",
                ),
                ("timeout_ms", "number", "Timeout in milliseconds (default: 10000)"),
            ],
            [("command", true), ("description", true), ("safety", true)],
        ))
    }

    pub fn shell_agent() -> Self {
        Self::new(
            "shell_agent",
            "Delegate a self-contained shell task to a sub-agent that can only run shell commands. \
             Returns the sub-agent's final report.",
        )
        .with_parameters(FunctionParameters::object(
            [("task", "string", "The task for the sub-agent, stated completely")],
            [("task", true)],
        ))
    }

    /// Specs sent to the model when no manifest overrides them.
    pub fn builtin() -> Vec<ToolSpec> {
        vec![
            Self::read_file(),
            Self::write_file(),
            Self::edit_file(),
            Self::run_shell(),
            Self::shell_agent(),
        ]
    }

    /// Parse a manifest: a JSON array of function tool definitions.
    pub fn parse_manifest(raw: &str) -> serde_json::Result<Vec<ToolSpec>> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Value {
        json!(self)
    }
}

/// Function definition containing name, description, and parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: FunctionParameters,
}

/// Function parameters definition (JSON Schema format).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionParameters {
    /// No parameters.
    #[default]
    Empty,
    /// Object with properties.
    Object {
        #[serde(rename = "type")]
        param_type: String,
        #[serde(default)]
        properties: Map<String, Value>,
        #[serde(default)]
        required: Vec<String>,
    },
}

impl FunctionParameters {
    /// Create object parameters from `(name, type, description)` and `(name, is_required)` tuples.
    pub fn object<const N: usize, const M: usize>(
        properties: [(&str, &str, &str); N],
        required: [(&str, bool); M],
    ) -> Self {
        let mut props = Map::new();
        for (name, param_type, description) in properties {
            props.insert(
                name.to_string(),
                json!({
                    "type": param_type,
                    "description": description
                }),
            );
        }

        let required = required
            .into_iter()
            .filter(|(_, is_required)| *is_required)
            .map(|(name, _)| name.to_string())
            .collect();

        Self::Object {
            param_type: "object".to_string(),
            properties: props,
            required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_shell_requires_description_and_safety() {
        let spec = ToolSpec::run_shell();
        let FunctionParameters::Object { required, .. } = &spec.function.parameters else {
            panic!("run_shell should take an object");
        };
        assert_eq!(required, &["command", "description", "safety"]);
    }

    #[test]
    fn test_parse_manifest() {
        let raw = r#"[
            {
                "type": "function",
                "function": {
                    "name": "run_shell",
                    "description": "Run a command",
                    "parameters": {
                        "type": "object",
                        "properties": {"command": {"type": "string"}}
                    }
                }
            },
            {"function": {"name": "noop"}}
        ]"#;
        let specs = ToolSpec::parse_manifest(raw).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name(), "run_shell");
        assert!(matches!(
            &specs[0].function.parameters,
            FunctionParameters::Object { required, .. } if required.is_empty()
        ));
        assert_eq!(specs[1].spec_type, "function");
        assert_eq!(specs[1].function.parameters, FunctionParameters::Empty);
    }

    #[test]
    fn test_parse_manifest_rejects_non_array() {
        assert!(ToolSpec::parse_manifest(r#"{"name": "x"}"#).is_err());
    }
}
