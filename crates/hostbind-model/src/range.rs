//! Inclusive decimal ranges.
//!
//! A [`NumberRange`] serves two purposes: how many instances a requirement
//! wants (its cardinality) and how much capacity a leaf wants to consume.
//! Bounds are exact decimals; capacity bookkeeping never touches floats.

use std::cmp::Ordering;
use std::fmt;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Inclusive range `[start, end]` over non-negative decimals.
///
/// `end == None` is an open upper bound (`[start, ∞)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RangeRepr", into = "RangeRepr")]
pub struct NumberRange {
    start: BigDecimal,
    end: Option<BigDecimal>,
}

#[derive(Serialize, Deserialize)]
struct RangeRepr {
    #[serde(deserialize_with = "crate::decimal::deserialize")]
    start: BigDecimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::decimal::deserialize_option"
    )]
    end: Option<BigDecimal>,
}

impl TryFrom<RangeRepr> for NumberRange {
    type Error = ModelError;

    fn try_from(repr: RangeRepr) -> ModelResult<Self> {
        match repr.end {
            Some(end) => NumberRange::new(repr.start, end),
            None => NumberRange::at_least(repr.start),
        }
    }
}

impl From<NumberRange> for RangeRepr {
    fn from(range: NumberRange) -> Self {
        RangeRepr {
            start: range.start,
            end: range.end,
        }
    }
}

impl NumberRange {
    /// Build `[start, end]`, rejecting negative or inverted bounds.
    pub fn new(start: BigDecimal, end: BigDecimal) -> ModelResult<Self> {
        if start < BigDecimal::zero() {
            return Err(ModelError::InvalidRange(format!("start {start} is negative")));
        }
        if end < start {
            return Err(ModelError::InvalidRange(format!(
                "end {end} is below start {start}"
            )));
        }
        Ok(Self {
            start: start.normalized(),
            end: Some(end.normalized()),
        })
    }

    /// Build `[start, ∞)`.
    pub fn at_least(start: BigDecimal) -> ModelResult<Self> {
        if start < BigDecimal::zero() {
            return Err(ModelError::InvalidRange(format!("start {start} is negative")));
        }
        Ok(Self {
            start: start.normalized(),
            end: None,
        })
    }

    /// Integer shorthand for `[start, end]`.
    pub fn of(start: u64, end: u64) -> ModelResult<Self> {
        Self::new(BigDecimal::from(start), BigDecimal::from(end))
    }

    pub fn start(&self) -> &BigDecimal {
        &self.start
    }

    /// Upper bound, `None` when unbounded.
    pub fn end(&self) -> Option<&BigDecimal> {
        self.end.as_ref()
    }

    pub fn is_unbounded(&self) -> bool {
        self.end.is_none()
    }

    /// True when both bounds are whole numbers.
    pub fn is_non_fractional(&self) -> bool {
        self.start.is_integer() && self.end.as_ref().is_none_or(|end| end.is_integer())
    }

    /// Smallest range covering both `self` and `other`.
    pub fn combine(&self, other: &NumberRange) -> NumberRange {
        let start = (&self.start).min(&other.start).clone();
        let end = match (&self.end, &other.end) {
            (Some(a), Some(b)) => Some(a.max(b).clone()),
            _ => None,
        };
        NumberRange { start, end }
    }

    /// Reduce the range by `n` already-satisfied units.
    ///
    /// The new start is clamped to 1 so that whatever remains still asks
    /// for at least one more unit. Returns `None` once the upper bound is
    /// used up.
    pub fn subtract(&self, n: &BigDecimal) -> Option<NumberRange> {
        let end = match &self.end {
            Some(end) => {
                let end = end - n;
                if end <= BigDecimal::zero() {
                    return None;
                }
                Some(end.normalized())
            }
            None => None,
        };
        let one = BigDecimal::from(1);
        let start = &self.start - n;
        let start = if start < one { one } else { start.normalized() };
        // A fractional end can fall below the clamped start; the quota is met.
        if end.as_ref().is_some_and(|end| *end < start) {
            return None;
        }
        Some(NumberRange { start, end })
    }

    /// [`subtract`](Self::subtract) for whole counts.
    pub fn subtract_count(&self, n: usize) -> Option<NumberRange> {
        self.subtract(&BigDecimal::from(n as u64))
    }

    pub fn contains(&self, value: &BigDecimal) -> bool {
        *value >= self.start && self.end.as_ref().is_none_or(|end| value <= end)
    }

    /// Compare the start bound against `value`.
    pub fn compare_start(&self, value: &BigDecimal) -> Ordering {
        self.start.cmp(value)
    }

    /// Compare the end bound against `value`; an open end is always greater.
    pub fn compare_end(&self, value: &BigDecimal) -> Ordering {
        match &self.end {
            Some(end) => end.cmp(value),
            None => Ordering::Greater,
        }
    }

    /// True when `n` units already reach the upper bound.
    pub fn is_reached_by(&self, n: usize) -> bool {
        self.compare_end(&BigDecimal::from(n as u64)) != Ordering::Greater
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "[{}, {}]", self.start, end),
            None => write!(f, "[{}, ∞)", self.start),
        }
    }
}

/// How many instances of a requirement are wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// One virtual instance pooled across every sibling specification.
    Any,
    /// Between `start` and `end` distinct specification nodes.
    Range(NumberRange),
}

impl Cardinality {
    /// `[1, 1]`, the default for a requirement that names no count.
    pub fn single() -> Self {
        Cardinality::Range(NumberRange {
            start: BigDecimal::from(1),
            end: Some(BigDecimal::from(1)),
        })
    }

    pub fn range(&self) -> Option<&NumberRange> {
        match self {
            Cardinality::Range(range) => Some(range),
            Cardinality::Any => None,
        }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::single()
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Any => f.write_str("?"),
            Cardinality::Range(range) => range.fmt(f),
        }
    }
}

/// How an entry's cardinality is counted when its parent requirement is
/// matched against several specification nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardinalityPolicy {
    /// Every matched parent must satisfy the range on its own.
    #[default]
    Each,
    /// The range is a single budget spread over all matched parents.
    Total,
}
