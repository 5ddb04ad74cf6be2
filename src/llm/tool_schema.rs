//! Typed tool descriptors and their translation into provider formats.
//!
//! A [`ToolDescriptor`] is read from the lowercase JSON schema a tool
//! advertises over MCP (`inputSchema`) and mapped onto the uppercase-typed
//! function declaration Gemini's function-calling API expects. Both steps
//! are pure.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Primitive type tag of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// JSON-schema spelling (`"number"`).
    pub fn json_type(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Gemini spelling (`"NUMBER"`).
    pub fn gemini_type(self) -> String {
        self.json_type().to_uppercase()
    }

    pub fn from_json_type(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "string" => Some(ParamType::String),
            "number" => Some(ParamType::Number),
            "integer" => Some(ParamType::Integer),
            "boolean" => Some(ParamType::Boolean),
            "array" => Some(ParamType::Array),
            "object" => Some(ParamType::Object),
            _ => None,
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

/// Name, description and ordered parameter list of a callable tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolDescriptor {
    /// Names of required parameters, in declaration order.
    pub fn required(&self) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Build a descriptor from an MCP `inputSchema`.
    ///
    /// Properties without a recognised `type` are treated as strings.
    pub fn from_input_schema(name: &str, description: &str, schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let parameters = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(key, prop)| ToolParameter {
                        name: key.clone(),
                        kind: prop
                            .get("type")
                            .and_then(Value::as_str)
                            .and_then(ParamType::from_json_type)
                            .unwrap_or(ParamType::String),
                        description: prop
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or("")
                            .to_string(),
                        required: required.contains(&key.as_str()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Gemini OpenAPI-subset schema node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, GeminiSchema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// A Gemini function declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: GeminiSchema,
}

/// The `tools` entry of a Gemini request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Map a descriptor onto a Gemini function declaration.
pub fn to_function_declaration(tool: &ToolDescriptor) -> FunctionDeclaration {
    let properties = tool
        .parameters
        .iter()
        .map(|p| {
            (
                p.name.clone(),
                GeminiSchema {
                    schema_type: p.kind.gemini_type(),
                    description: p.description.clone(),
                    properties: BTreeMap::new(),
                    required: Vec::new(),
                },
            )
        })
        .collect();

    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: GeminiSchema {
            schema_type: "OBJECT".to_string(),
            description: String::new(),
            properties,
            required: tool.required(),
        },
    }
}

/// Wrap a descriptor as a single-function Gemini tool.
pub fn to_gemini_tool(tool: &ToolDescriptor) -> GeminiTool {
    GeminiTool {
        function_declarations: vec![to_function_declaration(tool)],
    }
}

/// Rewrite every `"type"` tag of a JSON schema to Gemini's uppercase form.
pub fn gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("type", Value::String(tag)) => Value::String(tag.to_uppercase()),
                        _ => gemini_schema(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(gemini_schema).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn param(name: &str, kind: ParamType, description: &str, required: bool) -> ToolParameter {
        ToolParameter {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required,
        }
    }

    fn divide_tool() -> ToolDescriptor {
        ToolDescriptor {
            name: "divide".to_string(),
            description: "Divide two floats.".to_string(),
            parameters: vec![
                param("a", ParamType::Number, "The first float", true),
                param("b", ParamType::Number, "The second float", true),
            ],
        }
    }

    #[test]
    fn test_function_declaration_uppercases_types() {
        let decl = to_function_declaration(&divide_tool());
        assert_eq!(decl.name, "divide");
        assert_eq!(decl.parameters.schema_type, "OBJECT");
        assert_eq!(decl.parameters.properties["a"].schema_type, "NUMBER");
        assert_eq!(decl.parameters.required, vec!["a", "b"]);

        let json = serde_json::to_value(to_gemini_tool(&divide_tool())).unwrap();
        assert_eq!(
            json["functionDeclarations"][0]["parameters"]["properties"]["b"]["type"],
            "NUMBER"
        );
    }

    #[test]
    fn test_optional_params_not_required() {
        let tool = ToolDescriptor {
            name: "search".to_string(),
            description: "Search the web".to_string(),
            parameters: vec![
                param("query", ParamType::String, "Query", true),
                param("max_results", ParamType::Integer, "Limit", false),
            ],
        };
        assert_eq!(tool.required(), vec!["query"]);
        assert_eq!(
            to_function_declaration(&tool).parameters.properties["max_results"].schema_type,
            "INTEGER"
        );
    }

    #[test]
    fn test_from_input_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "target_language": {"type": "string", "description": "The target language"},
                "text": {"description": "The text to translate"}
            },
            "required": ["text"]
        });

        let tool = ToolDescriptor::from_input_schema("translate", "Translate text", &schema);
        let text = tool.parameters.iter().find(|p| p.name == "text").unwrap();
        assert_eq!(text.kind, ParamType::String);
        assert!(text.required);

        let lang = tool
            .parameters
            .iter()
            .find(|p| p.name == "target_language")
            .unwrap();
        assert!(!lang.required);
        assert_eq!(lang.description, "The target language");
    }

    #[test]
    fn test_from_input_schema_ignores_extra_keywords() {
        // Shape produced by schemars for `struct { a: f64, b: f64 }`
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": "MathArgs",
            "type": "object",
            "properties": {
                "a": {"type": "number", "format": "double", "description": "The first float"},
                "b": {"type": "number", "format": "double", "description": "The second float"}
            },
            "required": ["a", "b"]
        });

        let tool = ToolDescriptor::from_input_schema("divide", "Divide two floats.", &schema);
        assert_eq!(tool, divide_tool());
    }

    #[test]
    fn test_gemini_schema_rewrites_nested_types() {
        let schema = json!({
            "type": "object",
            "properties": {
                "search_queries": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["search_queries"]
        });

        let converted = gemini_schema(&schema);
        assert_eq!(converted["type"], "OBJECT");
        assert_eq!(converted["properties"]["search_queries"]["type"], "ARRAY");
        assert_eq!(
            converted["properties"]["search_queries"]["items"]["type"],
            "STRING"
        );
        assert_eq!(converted["required"], json!(["search_queries"]));
    }
}
