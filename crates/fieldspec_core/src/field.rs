//! Field descriptors.
//!
//! [`FieldBuilder`] collects constraint keywords and descriptor properties,
//! and [`FieldBuilder::build`] compiles them into a [`FieldInfo`] whose check
//! collection is fixed from then on. [`FieldInfo::name`] resolves the field's
//! identity for the schema engine or the query engine.

use crate::{
    Check, CheckOptions, CheckRegistry, ColumnSelector, Constraint, ConstraintArg, Dispatch,
    FieldError, Result,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

/// The resolved identity of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldName {
    /// Literal column or index name
    Plain(String),
    /// Column selector for the query engine
    Expr(ColumnSelector),
}

impl FieldName {
    /// The literal name, if resolution was not in expression mode.
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            FieldName::Plain(name) => Some(name),
            FieldName::Expr(_) => None,
        }
    }

    /// The selector, if resolution was in expression mode.
    pub fn as_expr(&self) -> Option<&ColumnSelector> {
        match self {
            FieldName::Plain(_) => None,
            FieldName::Expr(selector) => Some(selector),
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldName::Plain(name) => f.write_str(name),
            FieldName::Expr(selector) => write!(f, "{selector}"),
        }
    }
}

/// Builder for creating a [`FieldInfo`].
///
/// # Example
///
/// ```rust
/// use fieldspec_core::{CheckRegistry, ConstraintArg, FieldBuilder};
///
/// let registry = CheckRegistry::new();
/// let field = FieldBuilder::new()
///     .ge(0)
///     .str_length(ConstraintArg::named([("max_value", 12)]))
///     .nullable(false)
///     .build(&registry)
///     .unwrap();
///
/// let names: Vec<&str> = field.checks().unwrap().iter().map(|c| c.name()).collect();
/// assert_eq!(names, vec!["greater_than_or_equal_to", "str_length"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldBuilder {
    constraints: BTreeMap<Constraint, ConstraintArg>,
    custom: IndexMap<String, ConstraintArg>,
    options: CheckOptions,
    alias: Option<String>,
    regex: bool,
    nullable: bool,
    unique: bool,
    coerce: bool,
    check_name: Option<bool>,
    title: Option<String>,
    description: Option<String>,
    default: Option<Value>,
    dtype_kwargs: Option<Map<String, Value>>,
    metadata: Option<Map<String, Value>>,
    emit_as_expression: bool,
}

macro_rules! constraint_setters {
    ($($(#[$doc:meta])* $method:ident => $constraint:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $method(mut self, arg: impl Into<ConstraintArg>) -> Self {
                self.constraints.insert(Constraint::$constraint, arg.into());
                self
            }
        )*
    };
}

impl FieldBuilder {
    /// Creates a builder with no constraints and default options.
    pub fn new() -> Self {
        Self::default()
    }

    constraint_setters! {
        /// Values must equal the argument.
        eq => Eq;
        /// Values must differ from the argument.
        ne => Ne;
        /// Values must be greater than the argument.
        gt => Gt;
        /// Values must be greater than or equal to the argument.
        ge => Ge;
        /// Values must be less than the argument.
        lt => Lt;
        /// Values must be less than or equal to the argument.
        le => Le;
        /// Values must lie in a range; takes named `min_value`/`max_value`.
        in_range => InRange;
        /// Values must lie in a range; takes named `min_value`/`max_value`.
        between => Between;
        /// Values must belong to the list.
        isin => Isin;
        /// Values must not belong to the list.
        notin => Notin;
        /// Strings must contain the pattern.
        str_contains => StrContains;
        /// Strings must end with the argument.
        str_endswith => StrEndswith;
        /// Strings must match the pattern.
        str_matches => StrMatches;
        /// String length bounds.
        str_length => StrLength;
        /// Strings must start with the argument.
        str_startswith => StrStartswith;
        /// Unique values must equal the list.
        unique_values_eq => UniqueValuesEq;
    }

    /// Sets a constraint by keyword.
    ///
    /// Built-in keywords are stored as such; any other keyword is taken as
    /// a custom check and must be registered when [`build`](Self::build) runs.
    pub fn constraint(mut self, keyword: &str, arg: impl Into<ConstraintArg>) -> Self {
        match Constraint::from_keyword(keyword) {
            Some(constraint) => {
                self.constraints.insert(constraint, arg.into());
            }
            None => {
                self.custom.insert(keyword.to_string(), arg.into());
            }
        }
        self
    }

    /// Sets a custom check argument. Same as [`constraint`](Self::constraint).
    pub fn custom(self, name: &str, arg: impl Into<ConstraintArg>) -> Self {
        self.constraint(name, arg)
    }

    /// Sets whether checks skip null values.
    pub fn ignore_na(mut self, ignore_na: bool) -> Self {
        self.options.ignore_na = ignore_na;
        self
    }

    /// Sets whether check failures are reported as warnings.
    pub fn raise_warning(mut self, raise_warning: bool) -> Self {
        self.options.raise_warning = raise_warning;
        self
    }

    /// Limits the failure cases each check reports.
    pub fn n_failure_cases(mut self, n: usize) -> Self {
        self.options.n_failure_cases = Some(n);
        self
    }

    /// Replaces all shared check options.
    pub fn options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the public name of the field.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets whether the name or alias is a regular expression.
    pub fn regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Sets whether the field may hold nulls.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets whether values must be unique. Enforced by the schema engine.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets whether the dtype is coerced.
    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    /// Sets whether the schema engine checks the column name.
    pub fn check_name(mut self, check_name: bool) -> Self {
        self.check_name = Some(check_name);
        self
    }

    /// Sets a human-readable label.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets a free-form description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets parameters forwarded to the field's dtype.
    pub fn dtype_kwargs(mut self, dtype_kwargs: Map<String, Value>) -> Self {
        self.dtype_kwargs = Some(dtype_kwargs);
        self
    }

    /// Sets arbitrary key-value metadata.
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets whether name resolution yields a column selector.
    pub fn emit_as_expression(mut self, emit_as_expression: bool) -> Self {
        self.emit_as_expression = emit_as_expression;
        self
    }

    /// Compiles the constraints and builds the field.
    ///
    /// Custom keywords are checked against `registry` before any check is
    /// built. Checks are then built in dispatch order: built-in keywords in
    /// declaration order, custom checks in registration order.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::UnknownCheck` for a keyword that is neither built
    /// in nor registered, and `FieldError::Check` when a constructor rejects
    /// its argument.
    pub fn build(self, registry: &CheckRegistry) -> Result<FieldInfo> {
        if let Some(unknown) = self.custom.keys().find(|name| !registry.contains(name)) {
            return Err(FieldError::UnknownCheck(unknown.clone()));
        }

        let mut checks = Vec::new();
        for dispatch in registry.dispatch_table() {
            let arg = match dispatch {
                Dispatch::Builtin(constraint) => self.constraints.get(&constraint),
                Dispatch::Custom(custom) => self.custom.get(custom.name()),
            };
            let Some(arg) = arg.filter(|arg| !arg.is_absent()) else {
                continue;
            };

            let check = dispatch.construct(arg.clone(), &self.options)?;
            trace!(keyword = dispatch.keyword(), check = %check, "constructed check");
            checks.push(check);
        }

        debug!(
            alias = ?self.alias,
            regex = self.regex,
            checks = checks.len(),
            "compiled field constraints"
        );

        Ok(FieldInfo {
            original_name: None,
            alias: self.alias,
            regex: self.regex,
            checks: (!checks.is_empty()).then_some(checks),
            emit_as_expression: self.emit_as_expression,
            nullable: self.nullable,
            unique: self.unique,
            coerce: self.coerce,
            check_name: self.check_name,
            title: self.title,
            description: self.description,
            default: self.default,
            dtype_kwargs: self.dtype_kwargs,
            metadata: self.metadata,
        })
    }
}

/// The compiled contract of one column or index.
///
/// Checks are fixed at construction. The schema model assigns the declared
/// name afterwards with [`FieldInfo::with_original_name`]; the alias, when
/// set, always takes precedence over it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    original_name: Option<String>,
    alias: Option<String>,
    regex: bool,
    checks: Option<Vec<Check>>,
    emit_as_expression: bool,
    nullable: bool,
    unique: bool,
    coerce: bool,
    check_name: Option<bool>,
    title: Option<String>,
    description: Option<String>,
    default: Option<Value>,
    dtype_kwargs: Option<Map<String, Value>>,
    metadata: Option<Map<String, Value>>,
}

impl FieldInfo {
    /// Assigns the name declared in the schema definition.
    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    /// Resolves the name used to locate the field's data.
    ///
    /// The alias wins over the declared name. In expression mode the name
    /// becomes a [`ColumnSelector`], anchored as `^name$` first when the
    /// field is a regex field; otherwise the plain name is returned as is.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::Unnamed` when neither a name nor an alias is set,
    /// and `FieldError::Selector` when an anchored pattern does not compile.
    pub fn name(&self) -> Result<FieldName> {
        let name = self
            .alias
            .as_deref()
            .or(self.original_name.as_deref())
            .ok_or(FieldError::Unnamed)?;

        if !self.emit_as_expression {
            return Ok(FieldName::Plain(name.to_string()));
        }

        let selector = if self.regex {
            ColumnSelector::new(format!("^{name}$"))?
        } else {
            ColumnSelector::new(name)?
        };
        Ok(FieldName::Expr(selector))
    }

    /// Name declared in the schema definition.
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    /// Public name override.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Whether the name is a regular expression.
    pub fn regex(&self) -> bool {
        self.regex
    }

    /// Compiled checks; `None` when the field has no constraints.
    pub fn checks(&self) -> Option<&[Check]> {
        self.checks.as_deref()
    }

    /// Whether name resolution yields a column selector.
    pub fn emit_as_expression(&self) -> bool {
        self.emit_as_expression
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    pub fn coerce(&self) -> bool {
        self.coerce
    }

    pub fn check_name(&self) -> Option<bool> {
        self.check_name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn dtype_kwargs(&self) -> Option<&Map<String, Value>> {
        self.dtype_kwargs.as_ref()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckError, CheckValue, Signature};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn check_names(field: &FieldInfo) -> Vec<&str> {
        field
            .checks()
            .map(|checks| checks.iter().map(Check::name).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_no_constraints_means_no_checks() {
        let field = FieldBuilder::new().build(&CheckRegistry::new()).unwrap();
        assert!(field.checks().is_none());
    }

    #[test]
    fn test_null_argument_is_skipped() {
        let field = FieldBuilder::new()
            .gt(CheckValue::Null)
            .build(&CheckRegistry::new())
            .unwrap();
        assert!(field.checks().is_none());
    }

    #[test]
    fn test_keyword_and_typed_setter_agree() {
        let registry = CheckRegistry::new();
        let typed = FieldBuilder::new().isin([1, 2, 3]).build(&registry).unwrap();
        let keyed = FieldBuilder::new()
            .constraint("isin", [1, 2, 3])
            .build(&registry)
            .unwrap();
        assert_eq!(typed, keyed);
    }

    #[test]
    fn test_later_value_replaces_earlier() {
        let field = FieldBuilder::new()
            .gt(1)
            .gt(2)
            .build(&CheckRegistry::new())
            .unwrap();
        let checks = field.checks().unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].statistic("min_value"), Some(&CheckValue::Int(2)));
    }

    #[test]
    fn test_custom_checks_follow_builtins_in_registration_order() {
        let mut registry = CheckRegistry::new();
        registry
            .register_signature("is_even", Signature::new(&[], &["enabled"]))
            .unwrap();
        registry
            .register_signature("divisible_by", Signature::new(&["divisor"], &[]))
            .unwrap();

        let field = FieldBuilder::new()
            .custom("divisible_by", 3)
            .custom("is_even", true)
            .lt(100)
            .build(&registry)
            .unwrap();

        assert_eq!(check_names(&field), vec!["less_than", "is_even", "divisible_by"]);
    }

    #[test]
    fn test_unknown_check_fails_before_construction() {
        let err = FieldBuilder::new()
            .str_matches("[invalid(regex")
            .constraint("is_positive", true)
            .build(&CheckRegistry::new())
            .unwrap_err();

        assert!(matches!(err, FieldError::UnknownCheck(ref name) if name == "is_positive"));
        assert!(err.to_string().contains("'is_positive'"));
        assert!(err.to_string().contains("register"));
    }

    #[test]
    fn test_constructor_error_propagates() {
        let err = FieldBuilder::new()
            .in_range(5)
            .build(&CheckRegistry::new())
            .unwrap_err();
        assert!(matches!(
            err,
            FieldError::Check(CheckError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_unique_produces_no_check() {
        let field = FieldBuilder::new()
            .unique(true)
            .build(&CheckRegistry::new())
            .unwrap();
        assert!(field.unique());
        assert!(field.checks().is_none());
    }

    #[test]
    fn test_passthrough_properties() {
        let mut metadata = Map::new();
        metadata.insert("owner".to_string(), json!("billing"));

        let field = FieldBuilder::new()
            .nullable(true)
            .coerce(true)
            .check_name(false)
            .title("Amount")
            .description("Invoice amount")
            .default_value(0)
            .metadata(metadata.clone())
            .build(&CheckRegistry::new())
            .unwrap();

        assert!(field.nullable());
        assert!(field.coerce());
        assert_eq!(field.check_name(), Some(false));
        assert_eq!(field.title(), Some("Amount"));
        assert_eq!(field.description(), Some("Invoice amount"));
        assert_eq!(field.default_value(), Some(&json!(0)));
        assert_eq!(field.metadata(), Some(&metadata));
        assert!(field.dtype_kwargs().is_none());
    }

    #[test]
    fn test_alias_wins_regardless_of_assignment_order() {
        let field = FieldBuilder::new()
            .alias("b")
            .build(&CheckRegistry::new())
            .unwrap()
            .with_original_name("a");
        assert_eq!(field.name().unwrap(), FieldName::Plain("b".to_string()));
    }

    #[test]
    fn test_original_name_without_alias() {
        let field = FieldBuilder::new()
            .build(&CheckRegistry::new())
            .unwrap()
            .with_original_name("a");
        assert_eq!(field.name().unwrap().as_plain(), Some("a"));
    }

    #[test]
    fn test_unnamed_field() {
        let field = FieldBuilder::new().build(&CheckRegistry::new()).unwrap();
        assert!(matches!(field.name(), Err(FieldError::Unnamed)));
    }

    #[test]
    fn test_expression_without_regex_is_literal() {
        let field = FieldBuilder::new()
            .emit_as_expression(true)
            .build(&CheckRegistry::new())
            .unwrap()
            .with_original_name("amount");
        let name = field.name().unwrap();
        let selector = name.as_expr().unwrap();
        assert_eq!(selector.as_str(), "amount");
        assert!(!selector.is_pattern());
    }

    #[test]
    fn test_invalid_regex_name() {
        let field = FieldBuilder::new()
            .alias("(unclosed")
            .regex(true)
            .emit_as_expression(true)
            .build(&CheckRegistry::new())
            .unwrap();
        assert!(matches!(field.name(), Err(FieldError::Selector(_))));
    }
}
