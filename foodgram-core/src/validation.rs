//! Field rules for recipe and account input.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::Error;
use crate::models::IngredientLine;

/// Lower bound for cooking time (minutes) and ingredient amounts.
pub const MIN_UNIT: i32 = 1;
/// Upper bound for cooking time (minutes) and ingredient amounts.
pub const MAX_UNIT: i32 = 32_000;

pub const MAX_RECIPE_NAME_LEN: usize = 256;
pub const MAX_PERSON_NAME_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 8;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));

static PERSON_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[А-Яа-яЁёA-Za-z]+$").expect("valid name pattern"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

fn check_bounds(field: &str, value: i32) -> Result<(), Error> {
    if (MIN_UNIT..=MAX_UNIT).contains(&value) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "{field} must be between {MIN_UNIT} and {MAX_UNIT}"
        )))
    }
}

pub fn validate_cooking_time(minutes: i32) -> Result<(), Error> {
    check_bounds("Cooking time", minutes)
}

pub fn validate_ingredient_lines(lines: &[IngredientLine]) -> Result<(), Error> {
    if lines.is_empty() {
        return Err(Error::validation(
            "A recipe needs at least one ingredient",
        ));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if !seen.insert(line.ingredient_id) {
            return Err(Error::validation("Ingredients must be unique"));
        }
        check_bounds("Ingredient amount", line.amount)?;
    }

    Ok(())
}

pub fn validate_tag_ids(tag_ids: &[Uuid]) -> Result<(), Error> {
    if tag_ids.is_empty() {
        return Err(Error::validation("A recipe needs at least one tag"));
    }
    let unique: HashSet<&Uuid> = tag_ids.iter().collect();
    if unique.len() != tag_ids.len() {
        return Err(Error::validation("Tags must be unique"));
    }
    Ok(())
}

pub fn validate_recipe_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::validation("Name cannot be empty"));
    }
    if name.chars().count() > MAX_RECIPE_NAME_LEN {
        return Err(Error::validation(format!(
            "Name cannot be longer than {MAX_RECIPE_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_text(text: &str) -> Result<(), Error> {
    if text.trim().is_empty() {
        return Err(Error::validation("Text cannot be empty"));
    }
    Ok(())
}

pub fn validate_image_ref(image: &str) -> Result<(), Error> {
    if image.trim().is_empty() {
        return Err(Error::validation("Image is required"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Registration input, borrowed from the request.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
}

pub fn validate_new_account(account: &NewAccount<'_>) -> Result<(), Error> {
    if account.email.chars().count() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(account.email) {
        return Err(Error::validation("Enter a valid email address"));
    }

    if account.username.chars().count() > MAX_PERSON_NAME_LEN
        || !USERNAME_RE.is_match(account.username)
    {
        return Err(Error::validation(
            "Username may contain only letters, digits and @/./+/-/_",
        ));
    }

    for (field, value) in [
        ("First name", account.first_name),
        ("Last name", account.last_name),
    ] {
        if value.chars().count() > MAX_PERSON_NAME_LEN || !PERSON_NAME_RE.is_match(value) {
            return Err(Error::validation(format!(
                "{field} must contain only letters"
            )));
        }
    }

    validate_password(account.password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(amount: i32) -> IngredientLine {
        IngredientLine {
            ingredient_id: Uuid::new_v4(),
            amount,
        }
    }

    fn account() -> NewAccount<'static> {
        NewAccount {
            email: "cook@example.com",
            username: "cook_42",
            first_name: "Anna",
            last_name: "Иванова",
            password: "correct-horse",
        }
    }

    #[test]
    fn test_cooking_time_bounds() {
        assert!(validate_cooking_time(MIN_UNIT).is_ok());
        assert!(validate_cooking_time(MAX_UNIT).is_ok());
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(MAX_UNIT + 1).is_err());
    }

    #[test]
    fn test_ingredient_lines_empty() {
        assert!(matches!(
            validate_ingredient_lines(&[]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_ingredient_lines_duplicate_ids() {
        let first = line(10);
        let again = IngredientLine {
            amount: 20,
            ..first
        };
        assert!(matches!(
            validate_ingredient_lines(&[first, again]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_ingredient_lines_amount_bounds() {
        assert!(validate_ingredient_lines(&[line(1), line(MAX_UNIT)]).is_ok());
        assert!(validate_ingredient_lines(&[line(0)]).is_err());
        assert!(validate_ingredient_lines(&[line(-5)]).is_err());
        assert!(validate_ingredient_lines(&[line(MAX_UNIT + 1)]).is_err());
    }

    #[test]
    fn test_tag_ids() {
        let id = Uuid::new_v4();
        assert!(validate_tag_ids(&[id]).is_ok());
        assert!(validate_tag_ids(&[]).is_err());
        assert!(validate_tag_ids(&[id, id]).is_err());
    }

    #[test]
    fn test_recipe_name() {
        assert!(validate_recipe_name("Borscht").is_ok());
        assert!(validate_recipe_name("   ").is_err());
        assert!(validate_recipe_name(&"x".repeat(MAX_RECIPE_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_valid_account() {
        assert!(validate_new_account(&account()).is_ok());
    }

    #[test]
    fn test_account_rejects_bad_email() {
        let bad = NewAccount {
            email: "not-an-email",
            ..account()
        };
        assert!(validate_new_account(&bad).is_err());
    }

    #[test]
    fn test_account_rejects_bad_username() {
        let bad = NewAccount {
            username: "has space",
            ..account()
        };
        assert!(validate_new_account(&bad).is_err());
    }

    #[test]
    fn test_account_rejects_digits_in_names() {
        let bad = NewAccount {
            first_name: "Anna2",
            ..account()
        };
        assert!(validate_new_account(&bad).is_err());
    }

    #[test]
    fn test_account_rejects_short_password() {
        let bad = NewAccount {
            password: "short",
            ..account()
        };
        assert!(validate_new_account(&bad).is_err());
    }
}
