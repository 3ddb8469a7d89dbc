//! Typed API-documentation records.
//!
//! Field order in every struct matches the key order the doc extractor
//! emits, so serializing a parsed record reproduces its original layout.
//! Optional annotations are skipped on output when absent. Keys the model
//! does not know are kept in each record's `extra` map and written back
//! after the known fields.

use crate::error::ModelError;
use crate::validate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One documented API object (a Luau class or module table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDoc {
    pub functions: Vec<FunctionDoc>,
    pub properties: Vec<PropertyDoc>,
    pub types: Vec<TypeDoc>,
    pub name: String,
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<Vec<Realm>>,
    pub source: SourceLocation,
    /// Keys not modelled above, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDoc {
    pub name: String,
    pub desc: String,
    pub params: Vec<ParamDoc>,
    pub returns: Vec<ReturnDoc>,
    pub function_type: FunctionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unreleased: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yields: Option<Vec<ReturnDoc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDoc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<Vec<Realm>>,
    pub source: SourceLocation,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDoc {
    pub name: String,
    pub desc: String,
    pub lua_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A return (or yield) value. Returns carry no name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnDoc {
    pub desc: String,
    pub lua_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDoc {
    pub lua_type: String,
    pub desc: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDoc {
    pub name: String,
    pub desc: String,
    pub lua_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unreleased: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<Vec<Realm>>,
    pub source: SourceLocation,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Type alias or interface documented alongside the class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDoc {
    pub name: String,
    pub desc: String,
    pub lua_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDoc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    pub source: SourceLocation,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    pub lua_type: String,
    pub desc: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deprecation {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Location of the documented item in the upstream library's source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

/// How a function is called: `Class.fn(...)` or `object:fn(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionType {
    Static,
    Method,
}

impl FunctionType {
    /// Accepted wire values, in declaration order.
    pub const VALUES: &'static [&'static str] = &["static", "method"];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Method => "method",
        }
    }

    /// Luau call separator between the class and function name.
    pub const fn separator(self) -> char {
        match self {
            Self::Static => '.',
            Self::Method => ':',
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roblox execution context an item is available in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Realm {
    Client,
    Server,
    Plugin,
}

impl Realm {
    pub const VALUES: &'static [&'static str] = &["Client", "Server", "Plugin"];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Server => "Server",
            Self::Plugin => "Plugin",
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared view over the annotations used for filtering and badges.
pub trait Annotated {
    fn tags(&self) -> &[String];
    fn is_private(&self) -> bool;

    fn is_deprecated(&self) -> bool {
        false
    }

    fn is_unreleased(&self) -> bool {
        false
    }

    fn since(&self) -> Option<&str> {
        None
    }

    fn realm(&self) -> &[Realm] {
        &[]
    }
}

macro_rules! impl_annotated {
    ($($ty:ty),*) => {
        $(impl Annotated for $ty {
            fn tags(&self) -> &[String] {
                self.tags.as_deref().unwrap_or_default()
            }

            fn is_private(&self) -> bool {
                self.private.unwrap_or(false)
            }

            fn is_deprecated(&self) -> bool {
                self.deprecated.is_some()
            }

            fn is_unreleased(&self) -> bool {
                self.unreleased.unwrap_or(false)
            }

            fn since(&self) -> Option<&str> {
                self.since.as_deref()
            }

            fn realm(&self) -> &[Realm] {
                self.realm.as_deref().unwrap_or_default()
            }
        })*
    };
}

impl_annotated!(FunctionDoc, PropertyDoc);

impl Annotated for TypeDoc {
    fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    fn is_private(&self) -> bool {
        self.private.unwrap_or(false)
    }
}

impl ClassDoc {
    /// Parse, validate and deserialize a record from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed value, then deserialize it.
    ///
    /// Every violation is reported with its field path; deserialization only
    /// runs on values that passed validation.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        let violations = validate::validate(&value);
        if !violations.is_empty() {
            return Err(ModelError::Invalid(violations));
        }
        let doc = serde_json::from_value(value)?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDoc> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDoc> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Static functions whose single return value is this class.
    pub fn constructors(&self) -> impl Iterator<Item = &FunctionDoc> {
        self.static_functions().filter(move |f| {
            matches!(f.returns.as_slice(), [ret] if ret.lua_type == self.name)
        })
    }

    pub fn static_functions(&self) -> impl Iterator<Item = &FunctionDoc> {
        self.functions
            .iter()
            .filter(|f| f.function_type == FunctionType::Static)
    }

    pub fn methods(&self) -> impl Iterator<Item = &FunctionDoc> {
        self.functions
            .iter()
            .filter(|f| f.function_type == FunctionType::Method)
    }

    pub fn is_private(&self) -> bool {
        self.private.unwrap_or(false)
    }
}

impl FunctionDoc {
    /// One-line Luau signature, e.g. `Channel:AppendToFDI(Inst: Instance) -> ()`.
    pub fn signature(&self, class_name: &str) -> String {
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.lua_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}{}{}({}) -> {}",
            class_name,
            self.function_type.separator(),
            self.name,
            params,
            return_list(&self.returns)
        )
    }
}

impl PropertyDoc {
    pub fn is_readonly(&self) -> bool {
        self.readonly.unwrap_or(false)
    }

    /// Field declaration, e.g. `Channel._Name: string`.
    pub fn declaration(&self, class_name: &str) -> String {
        format!("{}.{}: {}", class_name, self.name, self.lua_type)
    }
}

/// Luau-style return list: `()` for none, the bare type for one, a tuple otherwise.
pub fn return_list(returns: &[ReturnDoc]) -> String {
    match returns {
        [] => "()".to_string(),
        [single] => single.lua_type.clone(),
        many => format!(
            "({})",
            many.iter()
                .map(|r| r.lua_type.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(line: u32) -> SourceLocation {
        SourceLocation {
            line,
            path: "src/init.lua".to_string(),
            extra: Map::new(),
        }
    }

    fn function(name: &str, function_type: FunctionType, returns: Vec<ReturnDoc>) -> FunctionDoc {
        FunctionDoc {
            name: name.to_string(),
            desc: String::new(),
            params: Vec::new(),
            returns,
            function_type,
            tags: None,
            since: None,
            deprecated: None,
            private: None,
            unreleased: None,
            yields: None,
            errors: None,
            realm: None,
            source: source(1),
            extra: Map::new(),
        }
    }

    fn ret(lua_type: &str) -> ReturnDoc {
        ReturnDoc {
            desc: String::new(),
            lua_type: lua_type.to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn source_location_display() {
        assert_eq!(source(161).to_string(), "src/init.lua:161");
    }

    #[test]
    fn function_type_wire_names() {
        assert_eq!(serde_json::to_value(FunctionType::Static).unwrap(), json!("static"));
        assert_eq!(serde_json::to_value(FunctionType::Method).unwrap(), json!("method"));
        assert!(serde_json::from_value::<FunctionType>(json!("Method")).is_err());
    }

    #[test]
    fn signature_static_uses_dot() {
        let mut f = function("new", FunctionType::Static, vec![ret("Channel")]);
        f.params.push(ParamDoc {
            name: "ChannelName".to_string(),
            desc: String::new(),
            lua_type: "string".to_string(),
            extra: Map::new(),
        });
        assert_eq!(f.signature("Channel"), "Channel.new(ChannelName: string) -> Channel");
    }

    #[test]
    fn signature_method_uses_colon() {
        let f = function("Destroy", FunctionType::Method, Vec::new());
        assert_eq!(f.signature("Channel"), "Channel:Destroy() -> ()");
    }

    #[test]
    fn return_list_tuple() {
        assert_eq!(return_list(&[ret("boolean"), ret("string?")]), "(boolean, string?)");
    }

    #[test]
    fn optional_annotations_are_omitted() {
        let f = function("Destroy", FunctionType::Method, Vec::new());
        let value = serde_json::to_value(&f).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = vec!["name", "desc", "params", "returns", "function_type", "source"];
        expected.sort_unstable();
        let mut keys = keys;
        keys.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn annotated_defaults() {
        let mut f = function("Destroy", FunctionType::Method, Vec::new());
        assert!(f.tags().is_empty());
        assert!(!f.is_private());
        f.private = Some(true);
        f.tags = Some(vec!["core".to_string()]);
        assert!(f.is_private());
        assert_eq!(f.tags(), ["core".to_string()]);
    }

    #[test]
    fn unmodelled_keys_survive_round_trip() {
        let value = json!({
            "functions": [{
                "name": "Destroy",
                "desc": "",
                "params": [{ "name": "Now", "desc": "", "lua_type": "boolean", "default": "false" }],
                "returns": [],
                "function_type": "method",
                "within": "Channel",
                "source": { "line": 3, "path": "src/init.lua", "column": 5 }
            }],
            "properties": [],
            "types": [],
            "name": "Channel",
            "desc": "",
            "external": true,
            "source": { "line": 1, "path": "src/init.lua" }
        });
        let doc = ClassDoc::from_value(value.clone()).unwrap();
        assert_eq!(doc.extra.get("external"), Some(&json!(true)));
        assert_eq!(doc.functions[0].extra.get("within"), Some(&json!("Channel")));
        assert_eq!(doc.functions[0].source.line, 3);
        assert_eq!(serde_json::to_value(&doc).unwrap(), value);
    }
}
