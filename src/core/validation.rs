//! Form field rules shared by the registration and catalog pages.

use crate::core::error::{MensableError, Result};

/// Names of users, languages and tables may only hold letters and digits
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(char::is_alphanumeric)
}

pub fn check_username(username: &str) -> Result<()> {
    if is_valid_name(username) {
        Ok(())
    } else {
        Err(MensableError::Validation(
            "Please enter a valid alphanumeric username.".to_string(),
        ))
    }
}

/// Check a password and its confirmation as typed into the register form
pub fn check_new_password(password: &str, confirmation: &str) -> Result<()> {
    if password.is_empty() {
        return Err(MensableError::Validation("Please enter a password.".to_string()));
    }
    if password != confirmation {
        return Err(MensableError::Validation(
            "Password and confirmation must match.".to_string(),
        ));
    }
    Ok(())
}

pub fn check_language_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(MensableError::Validation(
            "Language name can only contain alphanumeric characters.".to_string(),
        ))
    }
}

pub fn check_table_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(MensableError::Validation(
            "Table name can only contain alphanumeric characters.".to_string(),
        ))
    }
}

/// Trim a submitted word pair, rejecting it when either side ends up empty
pub fn clean_word_pair(foreign_word: &str, translation: &str) -> Result<(String, String)> {
    let foreign_word = foreign_word.trim();
    let translation = translation.trim();
    if foreign_word.is_empty() || translation.is_empty() {
        return Err(MensableError::Validation(
            "Please enter both a word and a translation.".to_string(),
        ));
    }
    Ok((foreign_word.to_string(), translation.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("Testese"));
        assert!(is_valid_name("Table2"));
        assert!(is_valid_name("Français"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("new_user"));
        assert!(!is_valid_name(" *)^ "));
        assert!(!is_valid_name("two words"));
    }

    // Registration rejects a mismatched confirmation and an empty password
    #[test]
    fn test_check_new_password() {
        assert!(check_new_password("secret", "secret").is_ok());
        assert!(check_new_password("", "").is_err());
        assert!(check_new_password("secret", "secrets").is_err());
    }

    #[test]
    fn test_clean_word_pair_trims() {
        let (foreign, translation) = clean_word_pair("  testo ", "\ttest\n").unwrap();
        assert_eq!(foreign, "testo");
        assert_eq!(translation, "test");
        assert!(clean_word_pair("   ", "test").is_err());
        assert!(clean_word_pair("wordo", "").is_err());
    }
}
