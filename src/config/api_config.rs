use crate::error::{FunifierError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Static headers sent with every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = non_blank(content_type.into());
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = non_blank(accept.into());
        self
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = non_blank(range.into());
        self
    }

    /// Drop values that are empty or whitespace only
    pub fn normalized(self) -> Self {
        Self {
            content_type: self.content_type.and_then(non_blank),
            accept: self.accept.and_then(non_blank),
            range: self.range.and_then(non_blank),
        }
    }
}

/// Scalar kinds an [`Id`] value can be converted into
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// A named identifier whose value is stored as text together with its type name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Id {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Id {
    /// Convert the stored text into the declared scalar type.
    ///
    /// Accepted type names are `str`, `int`, `float` and `bool`.
    pub fn typed_value(&self) -> Result<TypedValue> {
        let value = self
            .value
            .as_deref()
            .ok_or_else(|| FunifierError::validation("id has no value"))?;
        let kind = self.kind.as_deref().unwrap_or("str");

        let invalid = || {
            FunifierError::validation(format!("id value '{}' is not a valid {}", value, kind))
        };

        match kind {
            "str" => Ok(TypedValue::Str(value.to_string())),
            "int" => value.trim().parse().map(TypedValue::Int).map_err(|_| invalid()),
            "float" => value
                .trim()
                .parse()
                .map(TypedValue::Float)
                .map_err(|_| invalid()),
            "bool" => match value.trim() {
                "True" | "true" | "1" => Ok(TypedValue::Bool(true)),
                "False" | "false" | "0" | "" => Ok(TypedValue::Bool(false)),
                _ => Err(invalid()),
            },
            other => Err(FunifierError::validation(format!(
                "unsupported id type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<Id>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
}

/// Connection parameters for one Funifier application.
///
/// Built once per session and only read afterwards. The constructor rejects
/// blank credentials, host or version so a malformed request is never sent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ApiConfigRecord")]
pub struct ApiConfig {
    #[serde(rename = "ApiKey")]
    api_key: String,
    #[serde(rename = "AppSecret")]
    app_secret: String,
    #[serde(rename = "Url")]
    base_url: String,
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Header")]
    header: Header,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<Vec<String>>,
    #[serde(rename = "Settings", skip_serializing_if = "Option::is_none")]
    settings: Option<Settings>,
}

impl ApiConfig {
    pub fn new(
        api_key: impl Into<String>,
        app_secret: impl Into<String>,
        base_url: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            api_key: api_key.into(),
            app_secret: app_secret.into(),
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            version: version.into().trim().trim_matches('/').to_string(),
            header: Header::default(),
            scope: None,
            settings: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    pub fn with_scope(mut self, scope: Vec<String>) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn scope(&self) -> Option<&[String]> {
        self.scope.as_deref()
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("API key", &self.api_key),
            ("app secret", &self.app_secret),
            ("base URL", &self.base_url),
            ("API version", &self.version),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(FunifierError::validation(format!("{} is empty", label)));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.api_key)
            .field("app_secret", &"***")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field("header", &self.header)
            .field("scope", &self.scope)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Wire shape of a stored API configuration, where every field is optional
#[derive(Debug, Deserialize)]
struct ApiConfigRecord {
    #[serde(rename = "ApiKey", default)]
    api_key: Option<String>,
    #[serde(rename = "AppSecret", default)]
    app_secret: Option<String>,
    #[serde(rename = "Url", default)]
    base_url: Option<String>,
    #[serde(rename = "Version", default)]
    version: Option<String>,
    #[serde(rename = "Header", default)]
    header: Option<Header>,
    #[serde(default)]
    scope: Option<Vec<String>>,
    #[serde(rename = "Settings", default)]
    settings: Option<Settings>,
}

impl TryFrom<ApiConfigRecord> for ApiConfig {
    type Error = FunifierError;

    fn try_from(record: ApiConfigRecord) -> Result<Self> {
        let mut config = ApiConfig::new(
            record.api_key.unwrap_or_default(),
            record.app_secret.unwrap_or_default(),
            record.base_url.unwrap_or_default(),
            record.version.unwrap_or_default(),
        )?
        .with_header(record.header.unwrap_or_default().normalized());
        config.scope = record.scope;
        config.settings = record.settings;
        Ok(config)
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
