//! Name rules for lists and todos.
//!
//! Callers trim surrounding whitespace before validating. Lengths count
//! characters, not bytes.

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::models::ListSummary;

const NAME_LENGTH: RangeInclusive<usize> = 1..=100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The list name must be between 1 and 100 characters.")]
    ListNameLength,
    #[error("The list name must be unique.")]
    ListNameTaken,
    #[error("The list item must be between 1 and 100 characters.")]
    TodoNameLength,
}

pub fn validate_list_name(name: &str, existing: &[ListSummary]) -> Result<(), ValidationError> {
    if !NAME_LENGTH.contains(&name.chars().count()) {
        return Err(ValidationError::ListNameLength);
    }
    if existing.iter().any(|list| list.name == name) {
        return Err(ValidationError::ListNameTaken);
    }
    Ok(())
}

pub fn validate_todo_name(name: &str) -> Result<(), ValidationError> {
    if !NAME_LENGTH.contains(&name.chars().count()) {
        return Err(ValidationError::TodoNameLength);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListId;

    fn existing(names: &[&str]) -> Vec<ListSummary> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ListSummary {
                id: ListId(i as i64 + 1),
                name: name.to_string(),
                todos_count: 0,
                todos_remaining_count: 0,
            })
            .collect()
    }

    #[test]
    fn test_list_name_length_bounds() {
        let lists = existing(&[]);
        assert_eq!(
            validate_list_name("", &lists),
            Err(ValidationError::ListNameLength)
        );
        assert_eq!(
            validate_list_name(&"x".repeat(101), &lists),
            Err(ValidationError::ListNameLength)
        );
        for len in [1, 2, 50, 99, 100] {
            assert_eq!(validate_list_name(&"x".repeat(len), &lists), Ok(()));
        }
    }

    #[test]
    fn test_list_name_length_counts_chars() {
        assert_eq!(validate_list_name(&"é".repeat(100), &[]), Ok(()));
    }

    #[test]
    fn test_list_name_must_be_unique() {
        let lists = existing(&["Work", "Groceries"]);
        let err = validate_list_name("Groceries", &lists).unwrap_err();
        assert_eq!(err.to_string(), "The list name must be unique.");
    }

    #[test]
    fn test_list_name_uniqueness_is_case_sensitive() {
        let lists = existing(&["Groceries"]);
        assert_eq!(validate_list_name("groceries", &lists), Ok(()));
        assert_eq!(validate_list_name("Groceries ", &lists), Ok(()));
    }

    #[test]
    fn test_todo_name() {
        assert_eq!(
            validate_todo_name(""),
            Err(ValidationError::TodoNameLength)
        );
        assert_eq!(
            validate_todo_name(&"a".repeat(101)),
            Err(ValidationError::TodoNameLength)
        );
        assert_eq!(validate_todo_name("Milk"), Ok(()));
        assert_eq!(
            ValidationError::TodoNameLength.to_string(),
            "The list item must be between 1 and 100 characters."
        );
    }
}
