//! Typed decoding of stored configuration variables.
//!
//! A configuration variable is a record naming the kind of object it holds
//! (`DtoObject`, optionally wrapped as `List[...]`) and the object itself as a
//! JSON string (`Value`), often written with single quotes. The kind is looked
//! up in a fixed registry of decoders; unknown kinds are rejected.

use crate::config::api_config::{ApiConfig, Header, Id, Settings};
use crate::error::{FunifierError, Result};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigVar {
    #[serde(rename = "DtoObject")]
    pub dto_object: String,
    #[serde(rename = "DtoPath", default)]
    pub dto_path: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// One decoded configuration object
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEntry {
    ApiConfig(ApiConfig),
    Header(Header),
    Settings(Settings),
    Id(Id),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Single(ConfigEntry),
    List(Vec<ConfigEntry>),
}

type EntryDecoder = fn(Value) -> Result<ConfigEntry>;

/// Known object names and their decoders
const REGISTRY: &[(&str, EntryDecoder)] = &[
    ("APIConfigsDTO", decode_api_config),
    ("Header", decode_header),
    ("Settings", decode_settings),
    ("Id", decode_id),
];

fn list_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^List\[([^\]]*)\]$").expect("list pattern is valid"))
}

impl ConfigVar {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FunifierError::Config(format!("invalid configuration variable: {}", e)))
    }

    /// Split `List[Name]` into `(true, "Name")`, or return `(false, name)`
    pub fn object_name(&self) -> (bool, &str) {
        let trimmed = self.dto_object.trim();
        match list_pattern().captures(trimmed) {
            Some(caps) => (true, caps.get(1).map_or("", |m| m.as_str()).trim()),
            None => (false, trimmed),
        }
    }

    /// Decode the stored value into the registered type
    pub fn decode(&self) -> Result<ConfigValue> {
        let (is_list, name) = self.object_name();
        let decoder = lookup(name)?;
        debug!(
            "Decoding configuration variable {} (path '{}', list: {})",
            name, self.dto_path, is_list
        );

        let normalised = self.value.replace('\'', "\"");
        let json: Value = serde_json::from_str(&normalised).map_err(|e| {
            FunifierError::Config(format!("value of {} is not valid JSON: {}", name, e))
        })?;

        if is_list {
            let items = match json {
                Value::Array(items) => items,
                other => {
                    return Err(FunifierError::Config(format!(
                        "expected a list of {} but got {}",
                        name,
                        json_kind(&other)
                    )))
                }
            };
            let entries = items
                .into_iter()
                .map(decoder)
                .collect::<Result<Vec<_>>>()?;
            Ok(ConfigValue::List(entries))
        } else {
            Ok(ConfigValue::Single(decoder(json)?))
        }
    }

    /// Decode a variable that must hold exactly one API configuration
    pub fn into_api_config(&self) -> Result<ApiConfig> {
        match self.decode()? {
            ConfigValue::Single(ConfigEntry::ApiConfig(config)) => Ok(config),
            _ => Err(FunifierError::Config(format!(
                "configuration variable holds '{}', not a single APIConfigsDTO",
                self.dto_object
            ))),
        }
    }
}

/// Names accepted in `DtoObject`
pub fn registered_names() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

fn lookup(name: &str) -> Result<EntryDecoder> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, decoder)| *decoder)
        .ok_or_else(|| {
            FunifierError::validation(format!(
                "unknown configuration object '{}' (known: {})",
                name,
                registered_names().join(", ")
            ))
        })
}

fn from_json<T: DeserializeOwned>(value: Value, name: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| FunifierError::Config(format!("invalid {}: {}", name, e)))
}

fn decode_api_config(value: Value) -> Result<ConfigEntry> {
    from_json(value, "APIConfigsDTO").map(ConfigEntry::ApiConfig)
}

fn decode_header(value: Value) -> Result<ConfigEntry> {
    from_json(value, "Header").map(ConfigEntry::Header)
}

fn decode_settings(value: Value) -> Result<ConfigEntry> {
    from_json(value, "Settings").map(ConfigEntry::Settings)
}

fn decode_id(value: Value) -> Result<ConfigEntry> {
    from_json(value, "Id").map(ConfigEntry::Id)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_CONFIG_VAR: &str = r#"{
        "DtoObject": "APIConfigsDTO",
        "DtoPath": "domain_objects.dto.common.api_config_dto",
        "Value": "{'ApiKey': 'key-1','AppSecret':'s3cret','Url':'eu1.service.funifier.com','Version':'v3','Header': {'ContentType':'application/json','Range':'items=0-100'}}"
    }"#;

    #[test]
    fn test_decode_api_config() {
        let var = ConfigVar::from_json_str(API_CONFIG_VAR).unwrap();
        let config = var.into_api_config().unwrap();
        assert_eq!(config.api_key(), "key-1");
        assert_eq!(config.app_secret(), "s3cret");
        assert_eq!(config.base_url(), "eu1.service.funifier.com");
        assert_eq!(config.header().range.as_deref(), Some("items=0-100"));
        assert_eq!(config.header().accept, None);
    }

    #[test]
    fn test_decode_list_of_ids() {
        let var = ConfigVar {
            dto_object: "List[Id]".to_string(),
            dto_path: String::new(),
            value: "[{'name':'a','value':'1','type':'int'},{'name':'b','value':'x'}]".to_string(),
        };
        assert_eq!(var.object_name(), (true, "Id"));

        match var.decode().unwrap() {
            ConfigValue::List(entries) => {
                assert_eq!(entries.len(), 2);
                assert!(matches!(&entries[0], ConfigEntry::Id(id) if id.name.as_deref() == Some("a")));
            }
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_object_is_rejected() {
        let var = ConfigVar {
            dto_object: "os.system".to_string(),
            dto_path: "builtins".to_string(),
            value: "{}".to_string(),
        };
        let err = var.decode().unwrap_err();
        assert!(matches!(err, FunifierError::Validation(_)));
        assert!(err.to_string().contains("APIConfigsDTO"));
    }

    #[test]
    fn test_list_kind_requires_array() {
        let var = ConfigVar {
            dto_object: "List[Header]".to_string(),
            dto_path: String::new(),
            value: "{'ContentType':'text/plain'}".to_string(),
        };
        assert!(matches!(var.decode(), Err(FunifierError::Config(_))));
    }

    #[test]
    fn test_header_var_is_not_an_api_config() {
        let var = ConfigVar {
            dto_object: "Header".to_string(),
            dto_path: String::new(),
            value: "{'Accept':'application/json'}".to_string(),
        };
        assert!(var.into_api_config().is_err());
        assert_eq!(
            var.decode().unwrap(),
            ConfigValue::Single(ConfigEntry::Header(
                Header::new().with_accept("application/json")
            ))
        );
    }
}
