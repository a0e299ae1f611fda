//! Project validation
//!
//! Only the date rule is enforced. Empty locations and free-form dates are
//! accepted as entered.

use crate::{Error, Result};

/// Validator for project-related operations
pub struct ProjectValidator;

impl ProjectValidator {
    /// Validate the start/end pair
    ///
    /// Rules:
    /// - Active projects are not checked (their end date gets cleared)
    /// - An empty or missing end date is always fine
    /// - Otherwise the end date must not sort before the start date
    pub fn validate_dates(start_date: &str, end_date: Option<&str>, active: bool) -> Result<()> {
        if active {
            return Ok(());
        }

        match end_date {
            Some(end) if !end.is_empty() && end < start_date => Err(Error::Validation(
                "End Date must not precede Start Date.".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// End date to persist: cleared while active, `None` when blank
    pub fn effective_end_date(end_date: Option<&str>, active: bool) -> Option<String> {
        if active {
            return None;
        }
        end_date.filter(|d| !d.is_empty()).map(str::to_string)
    }
}
