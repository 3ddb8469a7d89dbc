//! Schema validation over raw JSON values.
//!
//! Runs before typed deserialization so that every problem is reported with
//! the path of the offending field (`functions[2].source.line`) instead of
//! serde's first-error-wins line/column message. Unknown keys are not
//! checked; the typed records carry them through untouched.

use crate::model::{FunctionType, Realm};
use serde_json::{Map, Value};
use std::fmt;

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Required field is absent.
    Missing,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    /// String outside a closed set (e.g. `function_type`).
    UnknownVariant {
        value: String,
        allowed: &'static [&'static str],
    },
    /// String that must not be empty.
    Empty,
    /// Line number of zero or below.
    NotPositive,
    /// Integer too large to be a line number.
    OutOfRange,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "$" } else { &self.path };
        match &self.kind {
            ViolationKind::Missing => write!(f, "{path}: missing required field"),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "{path}: expected {expected}, found {found}")
            }
            ViolationKind::UnknownVariant { value, allowed } => write!(
                f,
                "{path}: unknown value {value:?}, expected one of {}",
                allowed.join(", ")
            ),
            ViolationKind::Empty => write!(f, "{path}: must not be empty"),
            ViolationKind::NotPositive => write!(f, "{path}: must be a positive integer"),
            ViolationKind::OutOfRange => write!(f, "{path}: line number out of range"),
        }
    }
}

const CLASS_KEYS: &[&str] = &[
    "functions", "properties", "types", "name", "desc", "tags", "since", "deprecated",
    "private", "realm", "source",
];
const FUNCTION_KEYS: &[&str] = &[
    "name", "desc", "params", "returns", "function_type", "tags", "since", "deprecated",
    "private", "unreleased", "yields", "errors", "realm", "source",
];
const PROPERTY_KEYS: &[&str] = &[
    "name", "desc", "lua_type", "readonly", "tags", "since", "deprecated", "private",
    "unreleased", "realm", "source",
];
const TYPE_KEYS: &[&str] = &["name", "desc", "lua_type", "fields", "tags", "private", "source"];
const PARAM_KEYS: &[&str] = &["name", "desc", "lua_type"];
const RETURN_KEYS: &[&str] = &["desc", "lua_type"];
const ERROR_KEYS: &[&str] = &["lua_type", "desc"];
const FIELD_KEYS: &[&str] = &["name", "lua_type", "desc"];
const DEPRECATION_KEYS: &[&str] = &["version", "desc"];
const SOURCE_KEYS: &[&str] = &["line", "path"];

/// Keys of which at least one marks a value as an API record.
const RECORD_MARKERS: &[&str] = &["functions", "properties", "types", "source"];

/// Whether a value is meant to be an API record at all. Doc-site chunks
/// embed other JSON (route metadata, plugin data, sidebars) the same way;
/// those carry none of the record's structural keys.
pub fn looks_like_record(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| RECORD_MARKERS.iter().any(|key| obj.contains_key(*key)))
}

/// Check a value against the record schema. An empty result means the value
/// will deserialize into a [`ClassDoc`](crate::ClassDoc).
pub fn validate(value: &Value) -> Vec<Violation> {
    let mut checker = Checker::default();
    checker.class(value);
    checker.violations
}

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn class(&mut self, value: &Value) {
        let Some(obj) = self.object(value, "") else {
            return;
        };
        self.unknown_keys(obj, "", CLASS_KEYS);

        if let Some(items) = self.required_array(obj, "functions", "") {
            for (i, item) in items.iter().enumerate() {
                self.function(item, &index("functions", i));
            }
        }
        if let Some(items) = self.required_array(obj, "properties", "") {
            for (i, item) in items.iter().enumerate() {
                self.property(item, &index("properties", i));
            }
        }
        if let Some(items) = self.required_array(obj, "types", "") {
            for (i, item) in items.iter().enumerate() {
                self.type_doc(item, &index("types", i));
            }
        }
        self.required_str(obj, "name", "");
        self.required_str(obj, "desc", "");
        self.annotations(obj, "");
        self.source(obj, "");
    }

    fn function(&mut self, value: &Value, path: &str) {
        let Some(obj) = self.object(value, path) else {
            return;
        };
        self.unknown_keys(obj, path, FUNCTION_KEYS);
        self.required_str(obj, "name", path);
        self.required_str(obj, "desc", path);

        if let Some(params) = self.required_array(obj, "params", path) {
            let base = child(path, "params");
            for (i, param) in params.iter().enumerate() {
                self.leaf(param, &index(&base, i), PARAM_KEYS);
            }
        }
        if let Some(returns) = self.required_array(obj, "returns", path) {
            let base = child(path, "returns");
            for (i, ret) in returns.iter().enumerate() {
                self.leaf(ret, &index(&base, i), RETURN_KEYS);
            }
        }
        if let Some(yields) = self.optional_array(obj, "yields", path) {
            let base = child(path, "yields");
            for (i, ret) in yields.iter().enumerate() {
                self.leaf(ret, &index(&base, i), RETURN_KEYS);
            }
        }
        if let Some(errors) = self.optional_array(obj, "errors", path) {
            let base = child(path, "errors");
            for (i, err) in errors.iter().enumerate() {
                self.leaf(err, &index(&base, i), ERROR_KEYS);
            }
        }

        if let Some(kind) = self.required_str(obj, "function_type", path) {
            if !FunctionType::VALUES.contains(&kind) {
                self.push(
                    child(path, "function_type"),
                    ViolationKind::UnknownVariant {
                        value: kind.to_string(),
                        allowed: FunctionType::VALUES,
                    },
                );
            }
        }
        self.annotations(obj, path);
        self.optional_bool(obj, "unreleased", path);
        self.source(obj, path);
    }

    fn property(&mut self, value: &Value, path: &str) {
        let Some(obj) = self.object(value, path) else {
            return;
        };
        self.unknown_keys(obj, path, PROPERTY_KEYS);
        self.required_str(obj, "name", path);
        self.required_str(obj, "desc", path);
        self.required_str(obj, "lua_type", path);
        self.optional_bool(obj, "readonly", path);
        self.optional_bool(obj, "unreleased", path);
        self.annotations(obj, path);
        self.source(obj, path);
    }

    fn type_doc(&mut self, value: &Value, path: &str) {
        let Some(obj) = self.object(value, path) else {
            return;
        };
        self.unknown_keys(obj, path, TYPE_KEYS);
        self.required_str(obj, "name", path);
        self.required_str(obj, "desc", path);
        self.required_str(obj, "lua_type", path);
        if let Some(fields) = self.optional_array(obj, "fields", path) {
            let base = child(path, "fields");
            for (i, field) in fields.iter().enumerate() {
                self.leaf(field, &index(&base, i), FIELD_KEYS);
            }
        }
        self.string_array(obj, "tags", path);
        self.optional_bool(obj, "private", path);
        self.source(obj, path);
    }

    /// Object whose keys are all required strings.
    fn leaf(&mut self, value: &Value, path: &str, keys: &[&str]) {
        let Some(obj) = self.object(value, path) else {
            return;
        };
        self.unknown_keys(obj, path, keys);
        for key in keys {
            self.required_str(obj, key, path);
        }
    }

    /// Optional annotations shared by classes, functions and properties.
    fn annotations(&mut self, obj: &Map<String, Value>, path: &str) {
        self.string_array(obj, "tags", path);
        self.optional_str(obj, "since", path);
        self.optional_bool(obj, "private", path);

        if let Some(value) = obj.get("deprecated") {
            let dep_path = child(path, "deprecated");
            if let Some(dep) = self.object(value, &dep_path) {
                self.unknown_keys(dep, &dep_path, DEPRECATION_KEYS);
                self.required_str(dep, "version", &dep_path);
                self.optional_str(dep, "desc", &dep_path);
            }
        }

        if let Some(realms) = self.optional_array(obj, "realm", path) {
            let base = child(path, "realm");
            for (i, realm) in realms.iter().enumerate() {
                let item_path = index(&base, i);
                match realm {
                    Value::String(s) if Realm::VALUES.contains(&s.as_str()) => {}
                    Value::String(s) => self.push(
                        item_path,
                        ViolationKind::UnknownVariant {
                            value: s.clone(),
                            allowed: Realm::VALUES,
                        },
                    ),
                    other => self.wrong_type(item_path, "string", other),
                }
            }
        }
    }

    fn source(&mut self, obj: &Map<String, Value>, path: &str) {
        let src_path = child(path, "source");
        let Some(value) = obj.get("source") else {
            self.push(src_path, ViolationKind::Missing);
            return;
        };
        let Some(src) = self.object(value, &src_path) else {
            return;
        };
        self.unknown_keys(src, &src_path, SOURCE_KEYS);

        if let Some(p) = self.required_str(src, "path", &src_path) {
            if p.is_empty() {
                self.push(child(&src_path, "path"), ViolationKind::Empty);
            }
        }

        let line_path = child(&src_path, "line");
        match src.get("line") {
            None => self.push(line_path, ViolationKind::Missing),
            Some(Value::Number(n)) => {
                if let Some(line) = n.as_u64() {
                    if line == 0 {
                        self.push(line_path, ViolationKind::NotPositive);
                    } else if line > u64::from(u32::MAX) {
                        self.push(line_path, ViolationKind::OutOfRange);
                    }
                } else if n.as_i64().is_some() {
                    self.push(line_path, ViolationKind::NotPositive);
                } else {
                    self.push(
                        line_path,
                        ViolationKind::WrongType {
                            expected: "integer",
                            found: "fractional number",
                        },
                    );
                }
            }
            Some(other) => self.wrong_type(line_path, "integer", other),
        }
    }

    fn object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(obj) => Some(obj),
            other => {
                self.wrong_type(path.to_string(), "object", other);
                None
            }
        }
    }

    fn required_str<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v str> {
        match obj.get(key) {
            None => {
                self.push(child(path, key), ViolationKind::Missing);
                None
            }
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                self.wrong_type(child(path, key), "string", other);
                None
            }
        }
    }

    fn optional_str(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        match obj.get(key) {
            None | Some(Value::String(_)) => {}
            Some(other) => self.wrong_type(child(path, key), "string", other),
        }
    }

    fn optional_bool(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        match obj.get(key) {
            None | Some(Value::Bool(_)) => {}
            Some(other) => self.wrong_type(child(path, key), "boolean", other),
        }
    }

    fn required_array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v Vec<Value>> {
        if obj.contains_key(key) {
            self.optional_array(obj, key, path)
        } else {
            self.push(child(path, key), ViolationKind::Missing);
            None
        }
    }

    fn optional_array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v Vec<Value>> {
        match obj.get(key) {
            None => None,
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                self.wrong_type(child(path, key), "array", other);
                None
            }
        }
    }

    fn string_array(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        if let Some(items) = self.optional_array(obj, key, path) {
            let base = child(path, key);
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    self.wrong_type(index(&base, i), "string", item);
                }
            }
        }
    }

    fn unknown_keys(&mut self, obj: &Map<String, Value>, path: &str, known: &[&str]) {
        for key in obj.keys() {
            if !known.contains(&key.as_str()) {
                tracing::debug!(path = %child(path, key), "unrecognized field, passing through");
            }
        }
    }

    fn wrong_type(&mut self, path: String, expected: &'static str, found: &Value) {
        self.push(
            path,
            ViolationKind::WrongType {
                expected,
                found: type_name(found),
            },
        );
    }

    fn push(&mut self, path: String, kind: ViolationKind) {
        self.violations.push(Violation { path, kind });
    }
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{path}[{i}]")
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
