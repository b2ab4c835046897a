//! Budget domain model - monthly budget with category splits

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// A monthly budget, unique per (user, month)
///
/// Aggregate root: category rows have no lifecycle of their own. Saving a
/// budget replaces the whole category list; deleting it removes them all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Zero-padded `YYYY-MM`; lexicographic order matches chronological order
    pub month: String,
    pub total: Decimal,
    pub categories: Vec<CategoryBudget>,
}

/// A per-category allocation inside a budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBudget {
    pub category: String,
    pub amount: Decimal,
}

impl Budget {
    pub fn new(user_id: Uuid, month: impl Into<String>, total: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            month: month.into(),
            total,
            categories: Vec::new(),
        }
    }
}

/// Parse a `YYYY-MM` month label into (year, month)
///
/// Strict about zero padding: a non-padded month like `2026-5` would break
/// the lexicographic fallback ordering, so it is rejected.
pub fn parse_month(month: &str) -> Result<(i32, u32)> {
    let bytes = month.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(|b| b.is_ascii_digit())
        && bytes[5..].iter().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(Error::validation(format!(
            "Month must be in YYYY-MM format, got '{}'",
            month
        )));
    }

    let year: i32 = month[..4].parse().unwrap();
    let m: u32 = month[5..].parse().unwrap();
    if !(1..=12).contains(&m) {
        return Err(Error::validation(format!("Invalid month number: {}", m)));
    }

    Ok((year, m))
}

/// Calendar range of a `YYYY-MM` month: first day through last day, inclusive
pub fn month_date_range(month: &str) -> Result<(NaiveDate, NaiveDate)> {
    let (year, m) = parse_month(month)?;

    let start = NaiveDate::from_ymd_opt(year, m, 1)
        .ok_or_else(|| Error::validation(format!("Invalid month: {}", month)))?;
    let first_of_next = if m == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, m + 1, 1)
    }
    .ok_or_else(|| Error::validation(format!("Invalid month: {}", month)))?;
    let end = first_of_next.pred_opt().unwrap();

    Ok((start, end))
}
