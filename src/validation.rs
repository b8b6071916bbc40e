use std::collections::HashSet;

use crate::constants::{EMAIL_MAX_LENGTH, MAX_COOKING_TIME, MAX_INGREDIENT_AMOUNT, USERNAME_MAX_LENGTH};
use crate::error::ApiError;
use crate::serializers::IngredientAmount;

/// "me" is routed to the principal's own profile and can never be a
/// login name. Everything outside `[A-Za-z0-9_-]` is rejected.
pub fn validate_username(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::invalid_input("username", "must not be empty"));
    }
    if name.len() > USERNAME_MAX_LENGTH {
        return Err(ApiError::invalid_input("username", "too long"));
    }
    if name.eq_ignore_ascii_case("me") {
        return Err(ApiError::invalid_input("username", "'me' is reserved"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::invalid_input(
            "username",
            "only letters, digits, '_' and '-' are allowed",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::invalid_input("email", "must not be empty"));
    }
    if email.len() > EMAIL_MAX_LENGTH {
        return Err(ApiError::invalid_input("email", "too long"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::invalid_input("email", "not a valid address")),
    }
}

pub fn validate_cooking_time(minutes: i32) -> Result<(), ApiError> {
    if minutes <= 0 {
        return Err(ApiError::invalid_input(
            "cooking_time",
            "must be at least 1 minute",
        ));
    }
    if minutes > MAX_COOKING_TIME {
        return Err(ApiError::invalid_input(
            "cooking_time",
            "exceeds the maximum cooking time",
        ));
    }
    Ok(())
}

pub fn validate_amount(amount: i32) -> Result<(), ApiError> {
    if amount <= 0 {
        return Err(ApiError::invalid_input("amount", "must be at least 1"));
    }
    if amount > MAX_INGREDIENT_AMOUNT {
        return Err(ApiError::invalid_input(
            "amount",
            "exceeds the maximum amount",
        ));
    }
    Ok(())
}

/// A recipe name must contain at least one letter; names made of
/// digits and punctuation alone are rejected.
pub fn validate_recipe_name(name: &str) -> Result<(), ApiError> {
    if !name.chars().any(char::is_alphabetic) {
        return Err(ApiError::invalid_input(
            "name",
            "must contain at least one letter",
        ));
    }
    Ok(())
}

pub fn validate_tags(tags: &[i32]) -> Result<(), ApiError> {
    if tags.is_empty() {
        return Err(ApiError::invalid_input("tags", "must not be empty"));
    }
    Ok(())
}

pub fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), ApiError> {
    if ingredients.is_empty() {
        return Err(ApiError::invalid_input("ingredients", "must not be empty"));
    }
    let mut seen = HashSet::new();
    for entry in ingredients {
        if !seen.insert(entry.id) {
            return Err(ApiError::invalid_input(
                "ingredients",
                "the same ingredient is listed more than once",
            ));
        }
        validate_amount(entry.amount)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_username_is_rejected_in_any_case() {
        assert!(validate_username("me").is_err());
        assert!(validate_username("ME").is_err());
        assert!(validate_username("Me").is_err());
    }

    #[test]
    fn valid_username_passes() {
        assert!(validate_username("john_doe-1").is_ok());
    }

    #[test]
    fn username_with_invalid_characters_is_rejected() {
        assert!(validate_username("john doe").is_err());
        assert!(validate_username("john@doe").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn email_shape_and_length() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("cook@").is_err());

        let long = format!("{}@example.com", "a".repeat(EMAIL_MAX_LENGTH));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn cooking_time_bounds() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(-5).is_err());
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_cooking_time(MAX_COOKING_TIME).is_ok());
        assert!(validate_cooking_time(MAX_COOKING_TIME + 1).is_err());
    }

    #[test]
    fn amount_bounds() {
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(MAX_INGREDIENT_AMOUNT).is_ok());
        assert!(validate_amount(MAX_INGREDIENT_AMOUNT + 1).is_err());
    }

    #[test]
    fn recipe_name_needs_a_letter() {
        assert!(validate_recipe_name("12345").is_err());
        assert!(validate_recipe_name("?!...").is_err());
        assert!(validate_recipe_name("Pasta 101").is_ok());
    }

    #[test]
    fn empty_tag_list_is_rejected() {
        assert!(validate_tags(&[]).is_err());
        assert!(validate_tags(&[1]).is_ok());
    }

    #[test]
    fn duplicate_ingredient_ids_are_rejected() {
        let list = vec![
            IngredientAmount { id: 1, amount: 1 },
            IngredientAmount { id: 1, amount: 2 },
        ];
        assert!(validate_ingredients(&list).is_err());
    }

    #[test]
    fn distinct_ingredients_pass() {
        let list = vec![
            IngredientAmount { id: 1, amount: 3 },
            IngredientAmount { id: 2, amount: 1 },
        ];
        assert!(validate_ingredients(&list).is_ok());
    }

    #[test]
    fn empty_ingredient_list_is_rejected() {
        assert!(validate_ingredients(&[]).is_err());
    }
}
