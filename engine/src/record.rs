//! Bib values and per-place records.

use crate::conflict::is_conflict;
use crate::FinishTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bib number as captured by one collection method.
///
/// Zero and null both mean "not recorded" and collapse to [`Bib::Unset`].
/// Operator input that is not a canonical bib number is kept verbatim as
/// [`Bib::Text`] so validation can name it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawBib", into = "RawBib")]
pub enum Bib {
    #[default]
    Unset,
    Number(u32),
    Text(String),
}

impl Bib {
    /// Parse operator or wire input.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Bib::Unset;
        }
        if text.bytes().all(|b| b.is_ascii_digit()) && !has_leading_zero(text) {
            if let Ok(n) = text.parse::<u32>() {
                return Bib::from(n);
            }
        }
        Bib::Text(text.to_string())
    }

    /// True unless the bib is unset.
    pub fn is_set(&self) -> bool {
        !matches!(self, Bib::Unset)
    }

    /// The bib number, if this is a canonical number.
    pub fn number(&self) -> Option<u32> {
        match self {
            Bib::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer form used by the persisted raw arrays; anything that is not a
    /// canonical number is stored as zero.
    pub fn raw(&self) -> u32 {
        self.number().unwrap_or(0)
    }
}

impl From<u32> for Bib {
    fn from(n: u32) -> Self {
        if n == 0 {
            Bib::Unset
        } else {
            Bib::Number(n)
        }
    }
}

impl fmt::Display for Bib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bib::Unset => Ok(()),
            Bib::Number(n) => write!(f, "{n}"),
            Bib::Text(text) => f.write_str(text),
        }
    }
}

/// `"07"` style input: all digits, more than one, starting with zero.
pub(crate) fn has_leading_zero(text: &str) -> bool {
    text.len() > 1 && text.starts_with('0') && text.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawBib {
    Number(u32),
    Text(String),
}

impl From<RawBib> for Bib {
    fn from(raw: RawBib) -> Self {
        match raw {
            RawBib::Number(n) => Bib::from(n),
            RawBib::Text(text) => Bib::parse(&text),
        }
    }
}

impl From<Bib> for RawBib {
    fn from(bib: Bib) -> Self {
        match bib {
            Bib::Unset => RawBib::Number(0),
            Bib::Number(n) => RawBib::Number(n),
            Bib::Text(text) => RawBib::Text(text),
        }
    }
}

/// One finish place. Its position in the record set is its rank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Authoritative bib for display and export
    pub bib_num: Bib,
    /// Finish time at this place
    pub finish_time: FinishTime,
    /// Bib from the independent second collection method
    pub checker_bib: Bib,
}

impl Record {
    /// Create a record from raw bib numbers, zero meaning unset.
    pub fn new(bib_num: u32, finish_time: FinishTime, checker_bib: u32) -> Self {
        Self {
            bib_num: Bib::from(bib_num),
            finish_time,
            checker_bib: Bib::from(checker_bib),
        }
    }

    /// Whether the two bib sources disagree.
    pub fn has_conflict(&self) -> bool {
        is_conflict(&self.bib_num, &self.checker_bib)
    }

    /// Set both bib fields, closing any conflict.
    pub fn settle(&mut self, bib: Bib) {
        self.checker_bib = bib.clone();
        self.bib_num = bib;
    }

    /// If exactly one bib field is recorded, copy it into the other.
    ///
    /// Returns true when a value was copied.
    pub fn absorb(&mut self) -> bool {
        match (self.bib_num.is_set(), self.checker_bib.is_set()) {
            (true, false) => {
                self.checker_bib = self.bib_num.clone();
                true
            }
            (false, true) => {
                self.bib_num = self.checker_bib.clone();
                true
            }
            _ => false,
        }
    }
}
