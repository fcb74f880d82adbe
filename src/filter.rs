//! Attribute filters over feature properties.
//!
//! A filter is a combinator (`all` or `any`) over per-property comparison
//! clauses, mirroring the JSON grammar
//! `["all"|"any", [[key, op, operand], ...]]`. A clause whose key is absent
//! from a feature carries no evidence either way: under `all` it does not
//! fail the filter, under `any` it does not satisfy it.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TileQueryError};
use crate::wire;

/// Absolute tolerance for numeric equality comparisons. Fixed; does not
/// scale with operand magnitude.
const EQ_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCombinator {
    /// Every clause with evidence must hold.
    All,
    /// At least one clause must hold.
    Any,
}

impl FilterCombinator {
    fn as_str(&self) -> &'static str {
        match self {
            FilterCombinator::All => "all",
            FilterCombinator::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FilterOp {
    fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "=" => Some(FilterOp::Eq),
            "!=" => Some(FilterOp::Ne),
            "<" => Some(FilterOp::Lt),
            "<=" => Some(FilterOp::Le),
            ">" => Some(FilterOp::Gt),
            ">=" => Some(FilterOp::Ge),
            _ => None,
        }
    }
}

/// The right-hand side of a clause. Strings are not comparable.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperand {
    Number(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub key: String,
    pub op: FilterOp,
    pub operand: FilterOperand,
}

impl FilterClause {
    pub fn new(key: impl Into<String>, op: FilterOp, operand: FilterOperand) -> Self {
        Self {
            key: key.into(),
            op,
            operand,
        }
    }

    /// Evaluate this clause against a property value that is present.
    ///
    /// Numeric comparisons widen both sides to doubles and accept any
    /// numeric wire type; a type mismatch between operand and value is
    /// false, as is a boolean clause with an operator other than `=`/`!=`.
    fn matches(&self, value: &wire::Value) -> bool {
        match self.operand {
            FilterOperand::Number(operand) => {
                let Some(actual) = numeric_value(value) else {
                    return false;
                };
                match self.op {
                    FilterOp::Eq => (actual - operand).abs() < EQ_TOLERANCE,
                    FilterOp::Ne => (actual - operand).abs() >= EQ_TOLERANCE,
                    FilterOp::Lt => actual < operand,
                    FilterOp::Le => actual <= operand,
                    FilterOp::Gt => actual > operand,
                    FilterOp::Ge => actual >= operand,
                }
            }
            FilterOperand::Bool(operand) => {
                let Some(actual) = value.bool_value else {
                    return false;
                };
                match self.op {
                    FilterOp::Eq => actual == operand,
                    FilterOp::Ne => actual != operand,
                    _ => false,
                }
            }
        }
    }
}

fn numeric_value(value: &wire::Value) -> Option<f64> {
    if let Some(f) = value.float_value {
        return Some(f64::from(f));
    }
    if let Some(d) = value.double_value {
        return Some(d);
    }
    if let Some(i) = value.int_value {
        return Some(i as f64);
    }
    if let Some(u) = value.uint_value {
        return Some(u as f64);
    }
    value.sint_value.map(|s| s as f64)
}

/// An `all`/`any` combination of property comparison clauses.
///
/// # Examples
///
/// ```
/// use tilequery::{FilterClause, FilterOp, FilterOperand, PropertyFilter};
///
/// let filter = PropertyFilter::all(vec![
///     FilterClause::new("population", FilterOp::Gt, FilterOperand::Number(10.0)),
///     FilterClause::new("population", FilterOp::Lt, FilterOperand::Number(1000.0)),
/// ]);
///
/// // the same filter, from the wire grammar
/// let json = serde_json::json!(["all", [
///     ["population", ">", 10.0],
///     ["population", "<", 1000.0],
/// ]]);
/// assert_eq!(PropertyFilter::from_json(&json).unwrap(), filter);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub combinator: FilterCombinator,
    pub clauses: Vec<FilterClause>,
}

impl PropertyFilter {
    pub fn all(clauses: Vec<FilterClause>) -> Self {
        Self {
            combinator: FilterCombinator::All,
            clauses,
        }
    }

    pub fn any(clauses: Vec<FilterClause>) -> Self {
        Self {
            combinator: FilterCombinator::Any,
            clauses,
        }
    }

    /// Parse the `["all"|"any", [[key, op, operand], ...]]` grammar.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| TileQueryError::InvalidArgument(format!("'basic-filters': {}", e)))
    }

    /// Evaluate against a property lookup, short-circuiting on the first
    /// decisive clause. Clauses whose key has no value are skipped.
    pub(crate) fn evaluate<'a, F>(&self, mut lookup: F) -> bool
    where
        F: FnMut(&str) -> Option<&'a wire::Value>,
    {
        match self.combinator {
            FilterCombinator::All => {
                for clause in &self.clauses {
                    if let Some(value) = lookup(&clause.key) {
                        if !clause.matches(value) {
                            return false;
                        }
                    }
                }
                true
            }
            FilterCombinator::Any => {
                for clause in &self.clauses {
                    if let Some(value) = lookup(&clause.key) {
                        if clause.matches(value) {
                            return true;
                        }
                    }
                }
                false
            }
        }
    }

    fn build(
        combinator: &str,
        clauses: Vec<(String, String, serde_json::Value)>,
    ) -> std::result::Result<Self, String> {
        let combinator = match combinator {
            "all" => FilterCombinator::All,
            "any" => FilterCombinator::Any,
            other => {
                return Err(format!(
                    "first item must be \"all\" or \"any\", got \"{}\"",
                    other
                ));
            }
        };

        let clauses = clauses
            .into_iter()
            .map(|(key, op, operand)| {
                let op = FilterOp::parse(&op)
                    .ok_or_else(|| format!("\"{}\" is not a valid comparison operator", op))?;
                let operand = match operand {
                    serde_json::Value::Number(n) => {
                        let n = n
                            .as_f64()
                            .ok_or_else(|| format!("filter value for '{}' is not finite", key))?;
                        FilterOperand::Number(n)
                    }
                    serde_json::Value::Bool(b) => FilterOperand::Bool(b),
                    _ => {
                        return Err(format!(
                            "filter value for '{}' must be a number or boolean",
                            key
                        ));
                    }
                };
                Ok(FilterClause { key, op, operand })
            })
            .collect::<std::result::Result<Vec<_>, String>>()?;

        Ok(Self {
            combinator,
            clauses,
        })
    }
}

impl Serialize for PropertyFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let clauses: Vec<(String, String, serde_json::Value)> = self
            .clauses
            .iter()
            .map(|c| {
                let operand = match c.operand {
                    FilterOperand::Number(n) => serde_json::json!(n),
                    FilterOperand::Bool(b) => serde_json::json!(b),
                };
                (c.key.clone(), c.op.as_str().to_string(), operand)
            })
            .collect();
        (self.combinator.as_str(), clauses).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (combinator, clauses): (String, Vec<(String, String, serde_json::Value)>) =
            Deserialize::deserialize(deserializer)?;
        Self::build(&combinator, clauses).map_err(D::Error::custom)
    }
}
