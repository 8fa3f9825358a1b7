//! Check objects and their constructors.
//!
//! A [`Check`] records which predicate to run, the parameters it was built
//! with and the options governing how a schema engine applies it. Checks are
//! never evaluated here; they are collected on a field and handed over.

use crate::{CheckError, CheckValue, Constraint, ConstraintArg};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters bound to a check, in signature order.
pub type Statistics = IndexMap<String, CheckValue>;

/// Options shared by every check built for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    /// Skip null values when evaluating the check
    pub ignore_na: bool,

    /// Emit a warning instead of failing validation
    pub raise_warning: bool,

    /// Report only the first n unique failure cases (all when unset)
    pub n_failure_cases: Option<usize>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            ignore_na: true,
            raise_warning: false,
            n_failure_cases: None,
        }
    }
}

impl CheckOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether nulls are ignored.
    pub fn with_ignore_na(mut self, ignore_na: bool) -> Self {
        self.ignore_na = ignore_na;
        self
    }

    /// Sets warning mode.
    pub fn with_raise_warning(mut self, raise_warning: bool) -> Self {
        self.raise_warning = raise_warning;
        self
    }

    /// Limits the number of reported failure cases.
    pub fn with_n_failure_cases(mut self, n: usize) -> Self {
        self.n_failure_cases = Some(n);
        self
    }
}

/// Parameter list of a check constructor.
///
/// A positional argument binds to the first parameter, required parameters
/// first. Named arguments bind by name; nulls given for optional parameters
/// are treated as not given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

impl Signature {
    /// Creates a signature from required and optional parameter names.
    pub const fn new(required: &'static [&'static str], optional: &'static [&'static str]) -> Self {
        Self { required, optional }
    }

    /// Required parameters.
    pub fn required(&self) -> &'static [&'static str] {
        self.required
    }

    /// Optional parameters.
    pub fn optional(&self) -> &'static [&'static str] {
        self.optional
    }

    /// The parameter a positional value binds to.
    pub fn leading(&self) -> Option<&'static str> {
        self.params().next()
    }

    fn params(&self) -> impl Iterator<Item = &'static str> {
        self.required.iter().chain(self.optional).copied()
    }

    /// Binds an argument to this signature.
    ///
    /// # Errors
    ///
    /// Fails on a parameter the signature does not declare and on a missing
    /// required parameter.
    pub fn bind(&self, check: &str, arg: ConstraintArg) -> Result<Statistics, CheckError> {
        let mut named = match arg {
            ConstraintArg::Named(params) => params,
            ConstraintArg::Value(value) => {
                let first = self
                    .params()
                    .next()
                    .ok_or_else(|| CheckError::unexpected(check, value.to_string()))?;
                [(first.to_string(), value)].into_iter().collect()
            }
        };

        if let Some(unknown) = named.keys().find(|k| !self.params().any(|p| p == k.as_str())) {
            return Err(CheckError::unexpected(check, unknown.clone()));
        }

        let mut statistics = Statistics::new();
        for param in self.required {
            let value = named
                .remove(*param)
                .ok_or_else(|| CheckError::missing(check, *param))?;
            statistics.insert(param.to_string(), value);
        }
        for param in self.optional {
            if let Some(value) = named.remove(*param).filter(|v| !v.is_null()) {
                statistics.insert(param.to_string(), value);
            }
        }

        Ok(statistics)
    }
}

/// Where a check came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "keyword", rename_all = "snake_case")]
pub enum CheckOrigin {
    /// Built-in constraint keyword
    Builtin(Constraint),
    /// Registered custom check
    Custom(String),
}

/// A validation predicate, ready for a schema engine to evaluate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    name: String,
    origin: CheckOrigin,
    statistics: Statistics,
    options: CheckOptions,
    error: String,
}

impl Check {
    fn new(
        name: String,
        origin: CheckOrigin,
        statistics: Statistics,
        leading: Option<&str>,
        options: &CheckOptions,
    ) -> Self {
        let error = describe(&name, &statistics, leading);
        Self {
            name,
            origin,
            statistics,
            options: options.clone(),
            error,
        }
    }

    /// Builds a check for a registered custom check.
    pub fn custom(name: impl Into<String>, statistics: Statistics, options: &CheckOptions) -> Self {
        let name = name.into();
        let leading = statistics.keys().next().cloned();
        Self::new(name.clone(), CheckOrigin::Custom(name), statistics, leading.as_deref(), options)
    }

    /// Builds a custom check whose statistics were bound with `signature`.
    pub fn custom_bound(
        name: impl Into<String>,
        statistics: Statistics,
        signature: &Signature,
        options: &CheckOptions,
    ) -> Self {
        let name = name.into();
        Self::new(name.clone(), CheckOrigin::Custom(name), statistics, signature.leading(), options)
    }

    /// Constructor name, e.g. `greater_than`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keyword or registration this check came from.
    pub fn origin(&self) -> &CheckOrigin {
        &self.origin
    }

    /// Parameters the check was built with.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Looks up a single bound parameter.
    pub fn statistic(&self, param: &str) -> Option<&CheckValue> {
        self.statistics.get(param)
    }

    /// Options shared with the other checks of the field.
    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Human-readable description used in failure reports.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Values equal to `value`.
    pub fn equal_to(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Eq, arg.into(), options)
    }

    /// Values not equal to `value`.
    pub fn not_equal_to(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Ne, arg.into(), options)
    }

    /// Values strictly greater than `min_value`.
    pub fn greater_than(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Gt, arg.into(), options)
    }

    /// Values greater than or equal to `min_value`.
    pub fn greater_than_or_equal_to(
        arg: impl Into<ConstraintArg>,
        options: &CheckOptions,
    ) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Ge, arg.into(), options)
    }

    /// Values strictly less than `max_value`.
    pub fn less_than(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Lt, arg.into(), options)
    }

    /// Values less than or equal to `max_value`.
    pub fn less_than_or_equal_to(
        arg: impl Into<ConstraintArg>,
        options: &CheckOptions,
    ) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Le, arg.into(), options)
    }

    /// Values between `min_value` and `max_value`, bounds inclusive unless
    /// `include_min`/`include_max` say otherwise.
    pub fn in_range(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::InRange, arg.into(), options)
    }

    /// Same parameters as [`Check::in_range`].
    pub fn between(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Between, arg.into(), options)
    }

    /// Values contained in `allowed_values`.
    pub fn isin(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Isin, arg.into(), options)
    }

    /// Values absent from `forbidden_values`.
    pub fn notin(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::Notin, arg.into(), options)
    }

    /// Strings containing a match of `pattern`.
    pub fn str_contains(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::StrContains, arg.into(), options)
    }

    /// Strings ending with `string`.
    pub fn str_endswith(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::StrEndswith, arg.into(), options)
    }

    /// Strings matching `pattern` from their start.
    pub fn str_matches(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::StrMatches, arg.into(), options)
    }

    /// Strings whose length lies within `min_value`/`max_value`.
    pub fn str_length(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::StrLength, arg.into(), options)
    }

    /// Strings starting with `string`.
    pub fn str_startswith(arg: impl Into<ConstraintArg>, options: &CheckOptions) -> Result<Self, CheckError> {
        Self::builtin(Constraint::StrStartswith, arg.into(), options)
    }

    /// Unique values exactly equal to `values`.
    pub fn unique_values_eq(
        arg: impl Into<ConstraintArg>,
        options: &CheckOptions,
    ) -> Result<Self, CheckError> {
        Self::builtin(Constraint::UniqueValuesEq, arg.into(), options)
    }

    fn builtin(constraint: Constraint, arg: ConstraintArg, options: &CheckOptions) -> Result<Self, CheckError> {
        let name = constraint.check_name();
        let statistics = constraint.signature().bind(name, arg)?;
        validate(constraint, name, &statistics)?;
        Ok(Self::new(
            name.to_string(),
            CheckOrigin::Builtin(constraint),
            statistics,
            constraint.signature().leading(),
            options,
        ))
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error)
    }
}

/// Renders `name(value)` when only the leading parameter is bound,
/// `name(key=value, ...)` otherwise.
fn describe(name: &str, statistics: &Statistics, leading: Option<&str>) -> String {
    let params: Vec<String> = match statistics.first() {
        Some((key, value)) if statistics.len() == 1 && Some(key.as_str()) == leading => {
            vec![value.to_string()]
        }
        _ => statistics.iter().map(|(k, v)| format!("{k}={v}")).collect(),
    };
    format!("{name}({})", params.join(", "))
}

/// Rejects parameter values a built-in check cannot work with.
fn validate(constraint: Constraint, name: &str, statistics: &Statistics) -> Result<(), CheckError> {
    match constraint {
        Constraint::Eq | Constraint::Ne => Ok(()),
        Constraint::Gt | Constraint::Ge | Constraint::Lt | Constraint::Le => {
            for (param, value) in statistics {
                expect_scalar(name, param, value)?;
            }
            Ok(())
        }
        Constraint::InRange | Constraint::Between => {
            let min = &statistics["min_value"];
            let max = &statistics["max_value"];
            expect_scalar(name, "min_value", min)?;
            expect_scalar(name, "max_value", max)?;
            for flag in ["include_min", "include_max"] {
                if let Some(value) = statistics.get(flag) {
                    expect_bool(name, flag, value)?;
                }
            }
            if let (Some(min), Some(max)) = (min.as_float(), max.as_float()) {
                if min > max {
                    return Err(CheckError::invalid(
                        name,
                        "min_value",
                        format!("min_value {min} is greater than max_value {max}"),
                    ));
                }
            }
            Ok(())
        }
        Constraint::Isin | Constraint::Notin | Constraint::UniqueValuesEq => {
            for (param, value) in statistics {
                if value.as_list().is_none() {
                    return Err(CheckError::invalid(
                        name,
                        param,
                        format!("expected a list, found {}", value.type_name()),
                    ));
                }
            }
            Ok(())
        }
        Constraint::StrContains | Constraint::StrMatches => {
            let pattern = expect_str(name, "pattern", &statistics["pattern"])?;
            Regex::new(pattern).map_err(|source| CheckError::InvalidPattern {
                check: name.to_string(),
                source,
            })?;
            Ok(())
        }
        Constraint::StrEndswith | Constraint::StrStartswith => {
            expect_str(name, "string", &statistics["string"])?;
            Ok(())
        }
        Constraint::StrLength => {
            if statistics.is_empty() {
                return Err(CheckError::invalid(
                    name,
                    "min_value",
                    "at least a minimum or a maximum length must be specified",
                ));
            }
            let mut bounds = Vec::with_capacity(2);
            for (param, value) in statistics {
                match value.as_uint() {
                    Some(len) => bounds.push(len),
                    _ => {
                        return Err(CheckError::invalid(
                            name,
                            param,
                            format!("expected a non-negative integer, found {value}"),
                        ));
                    }
                }
            }
            if let [min, max] = bounds[..] {
                if min > max {
                    return Err(CheckError::invalid(
                        name,
                        "min_value",
                        format!("min_value {min} is greater than max_value {max}"),
                    ));
                }
            }
            Ok(())
        }
    }
}

fn expect_scalar(check: &str, param: &str, value: &CheckValue) -> Result<(), CheckError> {
    match value {
        CheckValue::Null | CheckValue::List(_) => Err(CheckError::invalid(
            check,
            param,
            format!("expected a scalar, found {}", value.type_name()),
        )),
        _ => Ok(()),
    }
}

fn expect_bool(check: &str, param: &str, value: &CheckValue) -> Result<(), CheckError> {
    value.as_bool().map(|_| ()).ok_or_else(|| {
        CheckError::invalid(
            check,
            param,
            format!("expected a boolean, found {}", value.type_name()),
        )
    })
}

fn expect_str<'a>(check: &str, param: &str, value: &'a CheckValue) -> Result<&'a str, CheckError> {
    value.as_str().ok_or_else(|| {
        CheckError::invalid(
            check,
            param,
            format!("expected a string, found {}", value.type_name()),
        )
    })
}
