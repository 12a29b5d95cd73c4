//! CLI command implementations.

pub mod definitions;
pub mod deploy;
pub mod start;
pub mod tasks;

use anyhow::{Context, Result};
use chrono::DateTime;
use flowable_client::{ApiFamily, Variable, VariableValue};
use serde_json::Value;

/// Engine selected by the `--bpmn` flag.
pub fn family(bpmn: bool) -> ApiFamily {
    if bpmn { ApiFamily::Bpmn } else { ApiFamily::Cmmn }
}

/// Print a JSON document to stdout.
pub fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format output")?;
    println!("{}", text);
    Ok(())
}

/// Parse a `name=value` argument into a variable.
pub fn parse_var(arg: &str) -> std::result::Result<Variable, String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("variable name is empty in '{}'", arg));
    }
    Ok(Variable::new(name, infer_value(raw)))
}

/// Integer, float, boolean, RFC 3339 date-time, else string.
fn infer_value(raw: &str) -> VariableValue {
    if let Ok(n) = raw.parse::<i64>() {
        return VariableValue::Long(n);
    }
    // `inf` and `NaN` parse as floats but are meant as text here
    if raw.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(x) = raw.parse::<f64>() {
            return VariableValue::Double(x);
        }
    }
    match raw {
        "true" => return VariableValue::Boolean(true),
        "false" => return VariableValue::Boolean(false),
        _ => {}
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => VariableValue::from(dt),
        Err(_) => VariableValue::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowable_client::VariableType;
    use serde_json::json;

    #[test]
    fn test_parse_var_inference() {
        let v = parse_var("amount=500").unwrap();
        assert_eq!(v.name, "amount");
        assert_eq!(v.value, json!(500));
        assert_eq!(v.var_type, Some(VariableType::Long));

        let v = parse_var("rate=0.25").unwrap();
        assert_eq!(v.var_type, Some(VariableType::Double));

        let v = parse_var("approved=true").unwrap();
        assert_eq!(v.value, json!(true));
        assert_eq!(v.var_type, Some(VariableType::Boolean));

        let v = parse_var("due=2024-03-01T12:00:00Z").unwrap();
        assert_eq!(v.var_type, Some(VariableType::Date));

        let v = parse_var("note=a=b").unwrap();
        assert_eq!(v.value, json!("a=b"));
        assert_eq!(v.var_type, Some(VariableType::String));

        let v = parse_var("label=inf").unwrap();
        assert_eq!(v.var_type, Some(VariableType::String));
    }

    #[test]
    fn test_parse_var_rejects_bad_input() {
        assert!(parse_var("no-equals").is_err());
        assert!(parse_var("=5").is_err());
    }

    #[test]
    fn test_family() {
        assert_eq!(family(true), ApiFamily::Bpmn);
        assert_eq!(family(false), ApiFamily::Cmmn);
    }
}
