//! Constraint registry.
//!
//! Maps constraint keywords to check constructors. The sixteen built-in
//! keywords form the closed [`Constraint`] enum; custom checks live in a
//! [`CheckRegistry`] handle that callers populate during setup and pass by
//! reference to every field compilation.

use crate::{Check, CheckError, CheckOptions, ConstraintArg, FieldError, RegistryError, Signature};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Constructor handle for a built-in constraint.
pub type BuiltinConstructor = fn(ConstraintArg, &CheckOptions) -> Result<Check, CheckError>;

/// Constructor handle for a custom check.
pub type CustomConstructor =
    Arc<dyn Fn(ConstraintArg, &CheckOptions) -> Result<Check, CheckError> + Send + Sync>;

/// Built-in constraint keywords.
///
/// Variants are declared in dispatch order: compiled checks always follow
/// this order, whatever order the keywords were supplied in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// `eq`: values equal a given value
    Eq,
    /// `ne`: values differ from a given value
    Ne,
    /// `gt`: values strictly greater than a bound
    Gt,
    /// `ge`: values greater than or equal to a bound
    Ge,
    /// `lt`: values strictly less than a bound
    Lt,
    /// `le`: values less than or equal to a bound
    Le,
    /// `in_range`: values within a range
    InRange,
    /// `between`: values within a range
    Between,
    /// `isin`: values belong to a set
    Isin,
    /// `notin`: values do not belong to a set
    Notin,
    /// `str_contains`: strings contain a pattern
    StrContains,
    /// `str_endswith`: strings end with a suffix
    StrEndswith,
    /// `str_matches`: strings match a pattern from the start
    StrMatches,
    /// `str_length`: string length within bounds
    StrLength,
    /// `str_startswith`: strings start with a prefix
    StrStartswith,
    /// `unique_values_eq`: the set of unique values equals a given set
    UniqueValuesEq,
}

impl Constraint {
    /// All built-in constraints in dispatch order.
    pub const ALL: [Constraint; 16] = [
        Constraint::Eq,
        Constraint::Ne,
        Constraint::Gt,
        Constraint::Ge,
        Constraint::Lt,
        Constraint::Le,
        Constraint::InRange,
        Constraint::Between,
        Constraint::Isin,
        Constraint::Notin,
        Constraint::StrContains,
        Constraint::StrEndswith,
        Constraint::StrMatches,
        Constraint::StrLength,
        Constraint::StrStartswith,
        Constraint::UniqueValuesEq,
    ];

    /// The declaration keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            Constraint::Eq => "eq",
            Constraint::Ne => "ne",
            Constraint::Gt => "gt",
            Constraint::Ge => "ge",
            Constraint::Lt => "lt",
            Constraint::Le => "le",
            Constraint::InRange => "in_range",
            Constraint::Between => "between",
            Constraint::Isin => "isin",
            Constraint::Notin => "notin",
            Constraint::StrContains => "str_contains",
            Constraint::StrEndswith => "str_endswith",
            Constraint::StrMatches => "str_matches",
            Constraint::StrLength => "str_length",
            Constraint::StrStartswith => "str_startswith",
            Constraint::UniqueValuesEq => "unique_values_eq",
        }
    }

    /// Name of the check built for this keyword.
    pub fn check_name(&self) -> &'static str {
        match self {
            Constraint::Eq => "equal_to",
            Constraint::Ne => "not_equal_to",
            Constraint::Gt => "greater_than",
            Constraint::Ge => "greater_than_or_equal_to",
            Constraint::Lt => "less_than",
            Constraint::Le => "less_than_or_equal_to",
            other => other.keyword(),
        }
    }

    /// Parameters accepted by this keyword's constructor.
    pub fn signature(&self) -> Signature {
        const RANGE: Signature =
            Signature::new(&["min_value", "max_value"], &["include_min", "include_max"]);

        match self {
            Constraint::Eq | Constraint::Ne => Signature::new(&["value"], &[]),
            Constraint::Gt | Constraint::Ge => Signature::new(&["min_value"], &[]),
            Constraint::Lt | Constraint::Le => Signature::new(&["max_value"], &[]),
            Constraint::InRange | Constraint::Between => RANGE,
            Constraint::Isin => Signature::new(&["allowed_values"], &[]),
            Constraint::Notin => Signature::new(&["forbidden_values"], &[]),
            Constraint::StrContains | Constraint::StrMatches => Signature::new(&["pattern"], &[]),
            Constraint::StrEndswith | Constraint::StrStartswith => {
                Signature::new(&["string"], &[])
            }
            Constraint::StrLength => Signature::new(&[], &["min_value", "max_value"]),
            Constraint::UniqueValuesEq => Signature::new(&["values"], &[]),
        }
    }

    /// The check constructor this keyword dispatches to.
    pub fn constructor(&self) -> BuiltinConstructor {
        match self {
            Constraint::Eq => |arg, options| Check::equal_to(arg, options),
            Constraint::Ne => |arg, options| Check::not_equal_to(arg, options),
            Constraint::Gt => |arg, options| Check::greater_than(arg, options),
            Constraint::Ge => |arg, options| Check::greater_than_or_equal_to(arg, options),
            Constraint::Lt => |arg, options| Check::less_than(arg, options),
            Constraint::Le => |arg, options| Check::less_than_or_equal_to(arg, options),
            Constraint::InRange => |arg, options| Check::in_range(arg, options),
            Constraint::Between => |arg, options| Check::between(arg, options),
            Constraint::Isin => |arg, options| Check::isin(arg, options),
            Constraint::Notin => |arg, options| Check::notin(arg, options),
            Constraint::StrContains => |arg, options| Check::str_contains(arg, options),
            Constraint::StrEndswith => |arg, options| Check::str_endswith(arg, options),
            Constraint::StrMatches => |arg, options| Check::str_matches(arg, options),
            Constraint::StrLength => |arg, options| Check::str_length(arg, options),
            Constraint::StrStartswith => |arg, options| Check::str_startswith(arg, options),
            Constraint::UniqueValuesEq => |arg, options| Check::unique_values_eq(arg, options),
        }
    }

    /// Looks up a built-in constraint by keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.keyword() == keyword)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Constraint {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_keyword(s).ok_or_else(|| FieldError::UnknownCheck(s.to_string()))
    }
}

/// A check constructor registered under a caller-chosen name.
#[derive(Clone)]
pub struct CustomCheck {
    name: String,
    constructor: CustomConstructor,
}

impl CustomCheck {
    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the constructor.
    pub fn construct(&self, arg: ConstraintArg, options: &CheckOptions) -> Result<Check, CheckError> {
        (self.constructor)(arg, options)
    }
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCheck")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One entry of the dispatch table.
#[derive(Debug, Clone, Copy)]
pub enum Dispatch<'a> {
    /// Built-in keyword
    Builtin(Constraint),
    /// Registered custom check
    Custom(&'a CustomCheck),
}

impl Dispatch<'_> {
    /// Keyword this entry answers to.
    pub fn keyword(&self) -> &str {
        match self {
            Dispatch::Builtin(constraint) => constraint.keyword(),
            Dispatch::Custom(custom) => custom.name(),
        }
    }

    /// Builds a check from the argument and shared options.
    pub fn construct(&self, arg: ConstraintArg, options: &CheckOptions) -> Result<Check, CheckError> {
        match self {
            Dispatch::Builtin(constraint) => (constraint.constructor())(arg, options),
            Dispatch::Custom(custom) => custom.construct(arg, options),
        }
    }
}

/// Registry of custom checks.
///
/// Populate it during setup, then share it by reference. Every compilation
/// reads the registry as it is at that moment, so checks registered later
/// are visible to later compilations.
///
/// # Example
///
/// ```rust
/// use fieldspec_core::{CheckRegistry, FieldBuilder, Signature};
///
/// let mut registry = CheckRegistry::new();
/// registry
///     .register_signature("is_divisible_by", Signature::new(&["divisor"], &[]))
///     .unwrap();
///
/// let field = FieldBuilder::new()
///     .constraint("is_divisible_by", 3)
///     .build(&registry)
///     .unwrap();
/// assert_eq!(field.checks().unwrap()[0].name(), "is_divisible_by");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    custom: IndexMap<String, CustomCheck>,
}

impl CheckRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom check constructor.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ReservedName` if `name` is a built-in keyword
    /// and `RegistryError::AlreadyRegistered` if it is already taken.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn(ConstraintArg, &CheckOptions) -> Result<Check, CheckError> + Send + Sync + 'static,
    {
        let name = name.into();
        if Constraint::from_keyword(&name).is_some() {
            return Err(RegistryError::ReservedName(name));
        }
        if self.custom.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }

        debug!(check = %name, "registered custom check");
        self.custom.insert(
            name.clone(),
            CustomCheck {
                name,
                constructor: Arc::new(constructor),
            },
        );
        Ok(())
    }

    /// Registers a custom check whose arguments bind like a built-in's.
    pub fn register_signature(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let check_name = name.clone();
        self.register(name, move |arg, options| {
            let statistics = signature.bind(&check_name, arg)?;
            Ok(Check::custom_bound(check_name.clone(), statistics, &signature, options))
        })
    }

    /// Whether `name` is a registered custom check.
    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// Whether `keyword` is built in or registered.
    pub fn is_known(&self, keyword: &str) -> bool {
        self.lookup(keyword).is_some()
    }

    /// Registered custom check names, in registration order.
    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }

    /// Number of registered custom checks.
    pub fn len(&self) -> usize {
        self.custom.len()
    }

    /// Whether no custom check is registered.
    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }

    /// Resolves a keyword to its constructor.
    pub fn lookup(&self, keyword: &str) -> Option<Dispatch<'_>> {
        Constraint::from_keyword(keyword)
            .map(Dispatch::Builtin)
            .or_else(|| self.custom.get(keyword).map(Dispatch::Custom))
    }

    /// The full dispatch table: built-ins in declaration order, then custom
    /// checks in registration order.
    pub fn dispatch_table(&self) -> impl Iterator<Item = Dispatch<'_>> {
        Constraint::ALL
            .into_iter()
            .map(Dispatch::Builtin)
            .chain(self.custom.values().map(Dispatch::Custom))
    }
}
