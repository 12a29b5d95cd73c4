//! Conversion between Rust values and Flowable's typed variable format.
//!
//! Flowable exchanges variables as `{"name": ..., "value": ..., "type": ...}`
//! objects. The type tag is inferred from the kind of the Rust value unless
//! the caller overrides it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt::{self, Display};

/// Wire-level type tag of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// `string`
    String,
    /// `long`
    Long,
    /// `double`
    Double,
    /// `boolean`
    Boolean,
    /// `date`
    Date,
    /// Any other tag the server reports (`integer`, `json`, ...).
    Other(String),
}

impl VariableType {
    /// The tag as sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Long => "long",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for VariableType {
    fn from(tag: &str) -> Self {
        match tag {
            "string" => Self::String,
            "long" => Self::Long,
            "double" => Self::Double,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VariableType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VariableType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from(tag.as_str()))
    }
}

/// Scope of a task or execution variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    /// Visible only on the task or execution itself.
    Local,
    /// Visible on the owning instance.
    Global,
}

impl VariableScope {
    /// The scope as used in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
        }
    }
}

/// A Rust value classified into one of the kinds Flowable can type.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    /// Integers.
    Long(i64),
    /// Floating point numbers.
    Double(f64),
    /// Booleans.
    Boolean(bool),
    /// Date-times, already rendered as ISO-8601.
    Date(String),
    /// Text and everything else.
    String(String),
    /// JSON `null`, sent as a `string` typed null.
    Null,
}

impl VariableValue {
    /// Infer the wire type of this value.
    pub fn infer_type(&self) -> VariableType {
        match self {
            Self::Long(_) => VariableType::Long,
            Self::Double(_) => VariableType::Double,
            Self::Boolean(_) => VariableType::Boolean,
            Self::Date(_) => VariableType::Date,
            Self::String(_) | Self::Null => VariableType::String,
        }
    }

    /// The JSON value sent as `value`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Long(n) => Value::from(*n),
            Self::Double(n) => Value::from(*n),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Date(s) | Self::String(s) => Value::String(s.clone()),
            Self::Null => Value::Null,
        }
    }
}

macro_rules! long_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for VariableValue {
            fn from(n: $ty) -> Self {
                Self::Long(i64::from(n))
            }
        })*
    };
}

long_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for VariableValue {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or_else(|_| Self::String(n.to_string()), Self::Long)
    }
}

impl From<usize> for VariableValue {
    fn from(n: usize) -> Self {
        Self::from(n as u64)
    }
}

impl From<f32> for VariableValue {
    fn from(n: f32) -> Self {
        Self::Double(f64::from(n))
    }
}

impl From<f64> for VariableValue {
    fn from(n: f64) -> Self {
        Self::Double(n)
    }
}

impl From<bool> for VariableValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for VariableValue {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<char> for VariableValue {
    fn from(c: char) -> Self {
        Self::String(c.to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for VariableValue
where
    Tz::Offset: Display,
{
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Date(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<NaiveDateTime> for VariableValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Date(dt.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<NaiveDate> for VariableValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d.format("%Y-%m-%d").to_string())
    }
}

impl From<Value> for VariableValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Long(i),
                None if n.is_u64() => Self::String(n.to_string()),
                None => n.as_f64().map_or_else(|| Self::String(n.to_string()), Self::Double),
            },
            Value::String(s) => Self::String(s),
            other => Self::String(other.to_string()),
        }
    }
}

impl<T: Into<VariableValue>> From<Option<T>> for VariableValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A typed variable in the shape Flowable expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name.
    pub name: String,
    /// Variable value.
    #[serde(default)]
    pub value: Value,
    /// Wire type tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub var_type: Option<VariableType>,
    /// Scope for task and execution variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<VariableScope>,
}

impl Variable {
    /// A variable whose type is inferred from `value`.
    pub fn new(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            var_type: Some(value.infer_type()),
            value: value.to_json(),
            scope: None,
        }
    }

    /// A variable with an explicit type tag, bypassing inference.
    pub fn with_type(
        name: impl Into<String>,
        value: impl Into<VariableValue>,
        var_type: VariableType,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into().to_json(),
            var_type: Some(var_type),
            scope: None,
        }
    }

    /// Set the variable scope.
    #[must_use]
    pub fn in_scope(mut self, scope: VariableScope) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Build a variable list from `(name, value)` pairs, keeping their order.
pub fn variables<I, K, V>(pairs: I) -> Vec<Variable>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<VariableValue>,
{
    pairs
        .into_iter()
        .map(|(name, value)| Variable::new(name, value))
        .collect()
}

/// Turn a `[{name, value, ...}]` array into a `name -> value` map.
///
/// Entries without a string `name` are skipped.
pub fn variables_to_map(list: &[Value]) -> Map<String, Value> {
    list.iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            let value = entry.get("value").cloned().unwrap_or(Value::Null);
            Some((name.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_inference_per_kind() {
        assert_eq!(VariableValue::from(500).infer_type(), VariableType::Long);
        assert_eq!(VariableValue::from(7u32).infer_type(), VariableType::Long);
        assert_eq!(VariableValue::from(0.25).infer_type(), VariableType::Double);
        assert_eq!(VariableValue::from(true).infer_type(), VariableType::Boolean);
        assert_eq!(
            VariableValue::from(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap())
                .infer_type(),
            VariableType::Date
        );
        assert_eq!(
            VariableValue::from(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()).infer_type(),
            VariableType::Date
        );
        assert_eq!(VariableValue::from("Alice").infer_type(), VariableType::String);
        assert_eq!(VariableValue::from('x').infer_type(), VariableType::String);
        assert_eq!(
            VariableValue::from(json!({"nested": [1, 2]})).infer_type(),
            VariableType::String
        );
    }

    #[test]
    fn test_wire_shape() {
        let amount = serde_json::to_value(Variable::new("amount", 500)).unwrap();
        assert_eq!(amount, json!({"name": "amount", "value": 500, "type": "long"}));

        let approved = serde_json::to_value(Variable::new("approved", true)).unwrap();
        assert_eq!(
            approved,
            json!({"name": "approved", "value": true, "type": "boolean"})
        );

        let rate = serde_json::to_value(Variable::new("rate", 1.5)).unwrap();
        assert_eq!(rate, json!({"name": "rate", "value": 1.5, "type": "double"}));

        let due = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let due = serde_json::to_value(Variable::new("due", due)).unwrap();
        assert_eq!(
            due,
            json!({"name": "due", "value": "2024-01-15T10:30:00.000Z", "type": "date"})
        );
    }

    #[test]
    fn test_unrecognized_values_become_strings() {
        let var = Variable::new("tags", json!(["a", "b"]));
        assert_eq!(var.value, json!("[\"a\",\"b\"]"));
        assert_eq!(var.var_type, Some(VariableType::String));

        let var = Variable::new("nothing", Value::Null);
        assert_eq!(var.value, Value::Null);
        assert_eq!(var.var_type, Some(VariableType::String));

        let var = Variable::new("maybe", None::<i64>);
        assert_eq!(var.value, Value::Null);
    }

    #[test]
    fn test_json_numbers() {
        assert_eq!(VariableValue::from(json!(42)), VariableValue::Long(42));
        assert_eq!(VariableValue::from(json!(4.2)), VariableValue::Double(4.2));
        assert_eq!(
            VariableValue::from(json!(u64::MAX)),
            VariableValue::String(u64::MAX.to_string())
        );
    }

    #[test]
    fn test_explicit_type_override() {
        let var = Variable::with_type("code", "42", VariableType::Long);
        let wire = serde_json::to_value(var).unwrap();
        assert_eq!(wire, json!({"name": "code", "value": "42", "type": "long"}));
    }

    #[test]
    fn test_scope_serialization() {
        let var = Variable::new("note", "hi").in_scope(VariableScope::Local);
        let wire = serde_json::to_value(var).unwrap();
        assert_eq!(wire["scope"], json!("local"));
    }

    #[test]
    fn test_variables_keeps_order() {
        let list = variables([("b", 1), ("a", 2)]);
        assert_eq!(list[0].name, "b");
        assert_eq!(list[1].name, "a");
        assert!(variables(Vec::<(&str, i32)>::new()).is_empty());
    }

    #[test]
    fn test_read_back_unknown_type_tag() {
        let var: Variable = serde_json::from_value(json!({
            "name": "payload",
            "type": "json",
            "value": {"a": 1},
            "scope": "global"
        }))
        .unwrap();
        assert_eq!(var.var_type, Some(VariableType::Other("json".to_string())));
        assert_eq!(var.scope, Some(VariableScope::Global));
    }

    #[test]
    fn test_variables_to_map() {
        let list = vec![
            json!({"name": "amount", "value": 500, "type": "long"}),
            json!({"value": "orphan"}),
            json!({"name": "approved", "value": true}),
            json!({"name": "empty"}),
        ];
        let map = variables_to_map(&list);
        assert_eq!(map.len(), 3);
        assert_eq!(map["amount"], json!(500));
        assert_eq!(map["approved"], json!(true));
        assert_eq!(map["empty"], Value::Null);
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["amount", "approved", "empty"]);
    }
}
