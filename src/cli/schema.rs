//! `schema` command: infer a schema from captured fields

use anyhow::{bail, Result};
use serde_json::Value;
use std::path::Path;

use super::output::{print_json, read_json};
use crate::schema::{
    AttributeLabels, Mapping, RuleSet, RuntimeValue, SchemaInferenceEngine, SchemaNode,
};

/// Infer the schema for a data file with optional rules and attribute titles
pub fn infer_schema_from_files(
    data: &Path,
    rules: Option<&Path>,
    attributes: Option<&Path>,
) -> Result<SchemaNode> {
    let fields = match RuntimeValue::from(read_json::<Value>(data)?) {
        RuntimeValue::Mapping(fields) => fields,
        _ => bail!("{} must contain a JSON object", data.display()),
    };
    let rules: RuleSet = rules.map(read_json).transpose()?.unwrap_or_default();
    let attributes: AttributeLabels = attributes.map(read_json).transpose()?.unwrap_or_default();

    Ok(infer_schema(&fields, &rules, &attributes))
}

fn infer_schema(fields: &Mapping, rules: &RuleSet, attributes: &AttributeLabels) -> SchemaNode {
    SchemaInferenceEngine::new().gen_schema(fields, rules, attributes)
}

pub fn handle_schema_command(
    data: &Path,
    rules: Option<&Path>,
    attributes: Option<&Path>,
) -> Result<()> {
    let schema = infer_schema_from_files(data, rules, attributes)?;
    print_json(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(value: Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    #[test]
    fn test_infer_schema_from_files() {
        let data = json_file(json!({"name": "Ada"}));
        let rules = json_file(json!({"name": "required|string", "age": "required|integer"}));
        let attributes = json_file(json!({"age": "Age"}));

        let schema =
            infer_schema_from_files(data.path(), Some(rules.path()), Some(attributes.path()))
                .unwrap();
        let json = schema.to_json();
        assert_eq!(json["required"], json!(["name", "age"]));
        assert_eq!(json["properties"]["age"]["type"], "number");
        assert_eq!(json["properties"]["age"]["title"], "Age");
    }

    #[test]
    fn test_data_must_be_an_object() {
        let data = json_file(json!([1, 2]));
        assert!(infer_schema_from_files(data.path(), None, None).is_err());
    }
}
