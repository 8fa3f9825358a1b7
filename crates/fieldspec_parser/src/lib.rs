//! Parser for field declaration files (YAML/TOML formats).
//!
//! This module reads field declarations from YAML and TOML documents and
//! compiles each one into a `FieldInfo` against a `CheckRegistry`.
//!
//! # Example
//!
//! ```rust
//! use fieldspec_core::CheckRegistry;
//! use fieldspec_parser::parse_yaml;
//!
//! let yaml = r#"
//! fields:
//!   - name: age
//!     nullable: false
//!     checks:
//!       ge: 0
//!       in_range:
//!         min_value: 0
//!         max_value: 150
//! "#;
//!
//! let document = parse_yaml(yaml).expect("Failed to parse declarations");
//! let fields = document.compile(&CheckRegistry::new()).expect("Failed to compile");
//! assert_eq!(fields[0].checks().unwrap().len(), 2);
//! ```

use fieldspec_core::{CheckOptions, CheckRegistry, ConstraintArg, FieldBuilder, FieldError, FieldInfo};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while parsing or compiling declarations.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// A declared field failed to compile
    #[error("Field '{name}': {source}")]
    Field {
        /// Declared field name
        name: String,
        /// Compilation error
        source: FieldError,
    },
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported declaration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// A document holding field declarations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpecDocument {
    /// Declared fields, in document order
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

impl FieldSpecDocument {
    /// Compiles every declared field independently.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::Field` for the first field that fails, carrying
    /// the field name and the compilation error.
    pub fn compile(&self, registry: &CheckRegistry) -> Result<Vec<FieldInfo>> {
        self.fields
            .iter()
            .map(|declaration| {
                declaration
                    .compile(registry)
                    .map_err(|source| ParserError::Field {
                        name: declaration.name.clone(),
                        source,
                    })
            })
            .collect()
    }
}

/// A single field as written in a declaration file.
///
/// `checks` maps constraint keywords to their argument: a table is passed as
/// named parameters, a null leaves the keyword unset, anything else is passed
/// positionally. Keys outside this struct are rejected, so a constraint written
/// at field level fails to parse instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDeclaration {
    /// Name in the schema definition
    pub name: String,

    /// Public name of the column/index
    pub alias: Option<String>,

    /// Whether the name or alias is a regular expression
    #[serde(default)]
    pub regex: bool,

    /// Whether the field may hold nulls
    #[serde(default)]
    pub nullable: bool,

    /// Whether values must be unique
    #[serde(default)]
    pub unique: bool,

    /// Whether the dtype is coerced
    #[serde(default)]
    pub coerce: bool,

    /// Whether the column name is checked during validation
    pub check_name: Option<bool>,

    /// Human-readable label
    pub title: Option<String>,

    /// Free-form description
    pub description: Option<String>,

    /// Default value
    pub default: Option<Value>,

    /// Parameters forwarded to the dtype
    pub dtype_kwargs: Option<Map<String, Value>>,

    /// Arbitrary key-value metadata
    pub metadata: Option<Map<String, Value>>,

    /// Whether name resolution yields a column selector
    #[serde(default)]
    pub emit_as_expression: bool,

    /// Options shared by all checks of this field
    #[serde(default)]
    pub options: CheckOptions,

    /// Constraint keywords and their arguments
    #[serde(default)]
    pub checks: BTreeMap<String, ConstraintArg>,
}

impl FieldDeclaration {
    /// Converts the declaration into a field builder.
    pub fn builder(&self) -> FieldBuilder {
        let mut builder = FieldBuilder::new()
            .options(self.options.clone())
            .regex(self.regex)
            .nullable(self.nullable)
            .unique(self.unique)
            .coerce(self.coerce)
            .emit_as_expression(self.emit_as_expression);

        if let Some(alias) = &self.alias {
            builder = builder.alias(alias.clone());
        }
        if let Some(check_name) = self.check_name {
            builder = builder.check_name(check_name);
        }
        if let Some(title) = &self.title {
            builder = builder.title(title.clone());
        }
        if let Some(description) = &self.description {
            builder = builder.description(description.clone());
        }
        if let Some(default) = &self.default {
            builder = builder.default_value(default.clone());
        }
        if let Some(dtype_kwargs) = &self.dtype_kwargs {
            builder = builder.dtype_kwargs(dtype_kwargs.clone());
        }
        if let Some(metadata) = &self.metadata {
            builder = builder.metadata(metadata.clone());
        }

        self.checks
            .iter()
            .fold(builder, |builder, (keyword, arg)| {
                builder.constraint(keyword, arg.clone())
            })
    }

    /// Compiles the declaration and assigns its declared name.
    pub fn compile(&self, registry: &CheckRegistry) -> std::result::Result<FieldInfo, FieldError> {
        debug!(field = %self.name, keywords = self.checks.len(), "compiling field declaration");
        Ok(self.builder().build(registry)?.with_original_name(&self.name))
    }
}

/// Parse declarations from a YAML string.
///
/// # Example
///
/// ```rust
/// use fieldspec_parser::parse_yaml;
///
/// let yaml = r#"
/// fields:
///   - name: country
///     checks:
///       isin: [IT, FR, DE]
/// "#;
///
/// let document = parse_yaml(yaml).unwrap();
/// assert_eq!(document.fields[0].name, "country");
/// ```
pub fn parse_yaml(content: &str) -> Result<FieldSpecDocument> {
    let document: FieldSpecDocument = serde_yaml_ng::from_str(content)?;
    Ok(document)
}

/// Parse declarations from a TOML string.
///
/// # Example
///
/// ```rust
/// use fieldspec_parser::parse_toml;
///
/// let toml = r#"
/// [[fields]]
/// name = "country"
///
/// [fields.checks]
/// isin = ["IT", "FR", "DE"]
/// "#;
///
/// let document = parse_toml(toml).unwrap();
/// assert_eq!(document.fields[0].name, "country");
/// ```
pub fn parse_toml(content: &str) -> Result<FieldSpecDocument> {
    let document: FieldSpecDocument =
        toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))?;
    Ok(document)
}

/// Detect the declaration format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.yaml`, `.yml` → `DeclarationFormat::Yaml`
/// * `.toml` → `DeclarationFormat::Toml`
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<DeclarationFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(DeclarationFormat::Yaml),
        "toml" => Ok(DeclarationFormat::Toml),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse declarations from a file with automatic format detection.
///
/// ```no_run
/// use fieldspec_parser::parse_file;
/// use std::path::Path;
///
/// let document = parse_file(Path::new("schemas/invoices.yml")).unwrap();
/// println!("Loaded {} fields", document.fields.len());
/// ```
pub fn parse_file(path: &Path) -> Result<FieldSpecDocument> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        DeclarationFormat::Yaml => parse_yaml(&content),
        DeclarationFormat::Toml => parse_toml(&content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldspec_core::{CheckValue, FieldName, Signature};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_parse_yaml_minimal() {
        let yaml = r#"
fields:
  - name: id
"#;

        let document = parse_yaml(yaml).expect("Failed to parse valid YAML");

        assert_eq!(document.fields.len(), 1);
        let id = &document.fields[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.alias, None);
        assert!(!id.regex);
        assert!(!id.nullable);
        assert_eq!(id.options, CheckOptions::default());
        assert!(id.checks.is_empty());
    }

    #[test]
    fn test_parse_yaml_with_checks() {
        let yaml = r#"
fields:
  - name: email
    alias: Email
    nullable: true
    description: Contact address
    options:
      raise_warning: true
      n_failure_cases: 5
    checks:
      str_matches: ^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$
      str_length:
        max_value: 254
      eq: null
"#;

        let document = parse_yaml(yaml).expect("Failed to parse YAML with checks");
        let email = &document.fields[0];

        assert_eq!(email.alias, Some("Email".to_string()));
        assert!(email.options.raise_warning);
        assert!(email.options.ignore_na);
        assert_eq!(email.options.n_failure_cases, Some(5));
        assert_eq!(
            email.checks["str_length"],
            ConstraintArg::named([("max_value", 254)])
        );
        assert!(email.checks["eq"].is_absent());

        let field = email.compile(&CheckRegistry::new()).unwrap();
        let names: Vec<&str> = field.checks().unwrap().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["str_matches", "str_length"]);
        assert_eq!(field.original_name(), Some("email"));
        assert_eq!(field.name().unwrap(), FieldName::Plain("Email".to_string()));
    }

    #[test]
    fn test_parse_yaml_passthrough() {
        let yaml = r#"
fields:
  - name: amount
    coerce: true
    unique: true
    check_name: false
    title: Amount
    default: 0
    dtype_kwargs:
      precision: 10
    metadata:
      owner: billing
"#;

        let document = parse_yaml(yaml).unwrap();
        let field = document.compile(&CheckRegistry::new()).unwrap().remove(0);

        assert!(field.coerce());
        assert!(field.unique());
        assert!(field.checks().is_none());
        assert_eq!(field.check_name(), Some(false));
        assert_eq!(field.title(), Some("Amount"));
        assert_eq!(field.default_value(), Some(&serde_json::json!(0)));
        assert_eq!(field.dtype_kwargs().unwrap()["precision"], 10);
        assert_eq!(field.metadata().unwrap()["owner"], "billing");
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let yaml = r#"
fields:
  - alias: missing name
"#;

        let result = parse_yaml(yaml);
        assert!(matches!(result.unwrap_err(), ParserError::YamlError(_)));
    }

    #[test]
    fn test_parse_yaml_field_level_constraint_rejected() {
        let yaml = r#"
fields:
  - name: amount
    gt: 0
"#;

        let err = parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, ParserError::YamlError(_)));
        assert!(err.to_string().contains("gt"), "unexpected message: {err}");
    }

    #[test]
    fn test_parse_unknown_keys_rejected() {
        let misspelled = "fields:\n  - name: code\n    regx: true\n";
        assert!(matches!(parse_yaml(misspelled), Err(ParserError::YamlError(_))));

        let top_level = "fields: []\nversion: 2\n";
        assert!(matches!(parse_yaml(top_level), Err(ParserError::YamlError(_))));

        let option = "[[fields]]\nname = \"code\"\n[fields.options]\nignore_nan = true\n";
        assert!(matches!(parse_toml(option), Err(ParserError::TomlError(_))));
    }

    #[test]
    fn test_parse_yaml_large_integer_is_exact() {
        let yaml = r#"
fields:
  - name: counter
    checks:
      eq: 18446744073709551615
"#;

        let fields = parse_yaml(yaml)
            .unwrap()
            .compile(&CheckRegistry::new())
            .unwrap();
        let check = &fields[0].checks().unwrap()[0];
        assert_eq!(check.statistic("value"), Some(&CheckValue::UInt(u64::MAX)));
        assert_eq!(check.error(), "equal_to(18446744073709551615)");
    }

    #[test]
    fn test_parse_toml_with_checks() {
        let toml = r#"
[[fields]]
name = "price_.*"
regex = true
emit_as_expression = true

[fields.checks]
ge = 0
in_range = { min_value = 0, max_value = 1000.5 }

[[fields]]
name = "country"

[fields.checks]
isin = ["IT", "FR"]
"#;

        let document = parse_toml(toml).expect("Failed to parse TOML with checks");
        assert_eq!(document.fields.len(), 2);

        let fields = document.compile(&CheckRegistry::new()).unwrap();
        let price = &fields[0];
        let range = &price.checks().unwrap()[1];
        assert_eq!(range.name(), "in_range");
        assert_eq!(range.statistic("max_value"), Some(&CheckValue::Float(1000.5)));

        let name = price.name().unwrap();
        assert_eq!(name.as_expr().unwrap().as_str(), "^price_.*$");

        let country = &fields[1];
        assert_eq!(
            country.checks().unwrap()[0].statistic("allowed_values"),
            Some(&CheckValue::from(["IT", "FR"]))
        );
    }

    #[test]
    fn test_parse_invalid_toml() {
        let toml = r#"
[[fields]]
name = "id"
[[[invalid syntax
"#;

        let result = parse_toml(toml);
        assert!(matches!(result.unwrap_err(), ParserError::TomlError(_)));
    }

    #[test]
    fn test_compile_unknown_custom_check() {
        let yaml = r#"
fields:
  - name: id
    checks:
      gt: 0
  - name: quantity
    checks:
      is_even: true
"#;

        let document = parse_yaml(yaml).unwrap();
        let err = document.compile(&CheckRegistry::new()).unwrap_err();

        match err {
            ParserError::Field { name, source } => {
                assert_eq!(name, "quantity");
                assert!(matches!(source, FieldError::UnknownCheck(ref k) if k == "is_even"));
            }
            other => panic!("expected field error, got {other:?}"),
        }
    }

    #[test]
    fn test_compile_registered_custom_check() {
        let yaml = r#"
fields:
  - name: quantity
    checks:
      is_divisible_by:
        divisor: 4
"#;

        let mut registry = CheckRegistry::new();
        registry
            .register_signature("is_divisible_by", Signature::new(&["divisor"], &[]))
            .unwrap();

        let fields = parse_yaml(yaml).unwrap().compile(&registry).unwrap();
        let check = &fields[0].checks().unwrap()[0];
        assert_eq!(check.name(), "is_divisible_by");
        assert_eq!(check.statistic("divisor"), Some(&CheckValue::Int(4)));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("fields.yaml")).unwrap(),
            DeclarationFormat::Yaml
        );
        assert_eq!(
            detect_format(Path::new("fields.yml")).unwrap(),
            DeclarationFormat::Yaml
        );
        assert_eq!(
            detect_format(Path::new("fields.toml")).unwrap(),
            DeclarationFormat::Toml
        );
    }

    #[test]
    fn test_detect_format_unsupported() {
        let result = detect_format(Path::new("fields.json"));
        assert!(matches!(
            result.unwrap_err(),
            ParserError::UnsupportedFormat(_)
        ));
    }

    #[test]
    fn test_detect_format_no_extension() {
        let result = detect_format(Path::new("fields"));
        assert!(matches!(result.unwrap_err(), ParserError::InvalidExtension));
    }

    #[test]
    fn test_parse_file_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "fields:\n  - name: id\n    checks:\n      gt: 0").unwrap();

        let document = parse_file(file.path()).expect("Failed to parse YAML file");
        assert_eq!(document.fields[0].name, "id");
        assert_eq!(document.fields[0].checks["gt"], ConstraintArg::from(0));
    }

    #[test]
    fn test_parse_file_missing() {
        let result = parse_file(Path::new("does/not/exist.toml"));
        assert!(matches!(result.unwrap_err(), ParserError::IoError(_)));
    }
}
