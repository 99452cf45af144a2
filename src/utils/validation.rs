//! Validation utilities

use crate::traits::*;
use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that an amount is not zero
///
/// Bank activities are signed, so negative amounts are legitimate; a zero
/// amount on a record that carries one is not.
pub fn validate_nonzero_amount(amount: &BigDecimal) -> BudgetResult<()> {
    if *amount == BigDecimal::from(0) {
        Err(BudgetError::Validation(
            "Amount cannot be zero".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a record ID is valid
pub fn validate_record_id(id: &str) -> BudgetResult<()> {
    if id.trim().is_empty() {
        return Err(BudgetError::Validation("ID cannot be empty".to_string()));
    }

    if id.len() > 64 {
        return Err(BudgetError::Validation(
            "ID cannot exceed 64 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(BudgetError::Validation(
            "ID can only contain alphanumeric characters, dashes, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a currency code is a three-letter ISO 4217 code
pub fn validate_currency(currency: &str) -> BudgetResult<()> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(BudgetError::Validation(format!(
            "'{currency}' is not a three-letter currency code"
        )));
    }

    Ok(())
}

/// Validate that a description fits storage limits
pub fn validate_description(description: &str) -> BudgetResult<()> {
    if description.len() > 500 {
        return Err(BudgetError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Enhanced activity validator with detailed checks
pub struct EnhancedActivityValidator;

impl ActivityValidator for EnhancedActivityValidator {
    fn validate_activity(&self, activity: &PaymentActivity) -> BudgetResult<()> {
        // Basic validation
        DefaultActivityValidator.validate_activity(activity)?;

        // Enhanced validations
        validate_record_id(&activity.id)?;
        validate_currency(&activity.currency)?;
        validate_description(&activity.description)?;

        // A missing amount is tolerated; a zero amount is not
        if let Some(ref amount) = activity.amount {
            validate_nonzero_amount(amount)?;
        }

        Ok(())
    }
}

/// Enhanced account validator with detailed checks
pub struct EnhancedAccountValidator;

impl AccountValidator for EnhancedAccountValidator {
    fn validate_account(&self, account: &PaymentAccount) -> BudgetResult<()> {
        DefaultAccountValidator.validate_account(account)?;

        validate_record_id(&account.id)?;
        validate_currency(&account.currency)?;

        if account.display_name.len() > 100 {
            return Err(BudgetError::Validation(
                "Account name cannot exceed 100 characters".to_string(),
            ));
        }

        Ok(())
    }
}
