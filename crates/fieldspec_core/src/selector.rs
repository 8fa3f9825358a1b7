//! Column selectors for the query engine.
//!
//! A selector is built from a single string. Strings anchored with `^` and
//! `$` select every column whose name matches the pattern; anything else
//! selects the column with that exact name.

use crate::SelectorError;
use arrow_schema::Schema;
use datafusion::common::Column;
use datafusion::logical_expr::Expr;
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone)]
enum Target {
    Name,
    Pattern(Regex),
}

/// A column selection expression.
///
/// # Example
///
/// ```rust
/// use fieldspec_core::ColumnSelector;
///
/// let selector = ColumnSelector::new("^price_.*$").unwrap();
/// assert!(selector.is_pattern());
/// assert!(selector.matches("price_usd"));
/// assert!(!selector.matches("unit_price"));
/// ```
#[derive(Debug, Clone)]
pub struct ColumnSelector {
    source: String,
    target: Target,
}

impl ColumnSelector {
    /// Builds a selector from a column name or an anchored pattern.
    ///
    /// # Errors
    ///
    /// Returns `SelectorError::InvalidPattern` if an anchored string is not
    /// a valid regular expression.
    pub fn new(source: impl Into<String>) -> Result<Self, SelectorError> {
        let source = source.into();
        let target = if source.len() > 1 && source.starts_with('^') && source.ends_with('$') {
            let regex = Regex::new(&source).map_err(|e| SelectorError::InvalidPattern {
                pattern: source.clone(),
                source: e,
            })?;
            Target::Pattern(regex)
        } else {
            Target::Name
        };

        Ok(Self { source, target })
    }

    /// The string the selector was built from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the selector is a pattern rather than a literal name.
    pub fn is_pattern(&self) -> bool {
        matches!(self.target, Target::Pattern(_))
    }

    /// Whether the selector picks the given column.
    pub fn matches(&self, column: &str) -> bool {
        match &self.target {
            Target::Name => self.source == column,
            Target::Pattern(regex) => regex.is_match(column),
        }
    }

    /// Names of the schema columns picked by this selector, in schema order.
    pub fn select<'a>(&self, schema: &'a Schema) -> Vec<&'a str> {
        schema
            .fields()
            .iter()
            .map(|field| field.name().as_str())
            .filter(|name| self.matches(name))
            .collect()
    }

    /// Column expressions for every schema column picked by this selector.
    pub fn exprs(&self, schema: &Schema) -> Vec<Expr> {
        self.select(schema)
            .into_iter()
            .map(|name| Expr::Column(Column::from_name(name)))
            .collect()
    }

    /// The column expression of a literal selector. Patterns need a schema.
    pub fn column_expr(&self) -> Option<Expr> {
        match self.target {
            Target::Name => Some(Expr::Column(Column::from_name(self.source.as_str()))),
            Target::Pattern(_) => None,
        }
    }
}

impl PartialEq for ColumnSelector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ColumnSelector {}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col(\"{}\")", self.source)
    }
}
