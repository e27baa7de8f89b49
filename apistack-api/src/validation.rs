//! Validation Traits
//!
//! Input checks shared by the actor handlers. Everything here runs before
//! the store is touched.

use apistack_core::{ActorNames, ListQuery};

use crate::constants::{MAX_LIST_LIMIT, MAX_NAME_LEN, MAX_SEARCH_LEN};
use crate::error::{ApiError, ApiResult};
use crate::types::{ActorRequest, ListActorsParams};

/// Trait for validating non-empty strings.
///
/// # Example
/// ```ignore
/// use apistack_api::validation::ValidateNonEmpty;
///
/// fn rename(first_name: &str) -> ApiResult<()> {
///     first_name.validate_non_empty("FirstName")?;
///     Ok(())
/// }
/// ```
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty.
    ///
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Trait for validating numeric ranges.
pub trait ValidateRange {
    /// Validate that the value is within an inclusive range.
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()>
    where
        Self: Sized;
}

macro_rules! impl_validate_range {
    ($($t:ty),*) => {
        $(
            impl ValidateRange for $t {
                fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()> {
                    if *self < min || *self > max {
                        return Err(ApiError::invalid_range(field_name, min, max));
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_validate_range!(i32, i64, u32, u64);

/// Validate that a trimmed value is at most `max_len` characters.
pub fn validate_max_length(value: &str, field_name: &str, max_len: usize) -> ApiResult<()> {
    let len = value.trim().chars().count();
    if len > max_len {
        return Err(ApiError::validation_failed(format!(
            "Field '{}' must be at most {} characters",
            field_name, max_len
        ))
        .with_details(serde_json::json!({ "field": field_name, "max_length": max_len })));
    }
    Ok(())
}

/// Reject control characters (NUL included), which the database will not
/// store in a text column.
pub fn validate_printable(value: &str, field_name: &str) -> ApiResult<()> {
    if value.chars().any(char::is_control) {
        return Err(ApiError::invalid_format(
            field_name,
            "text without control characters",
        ));
    }
    Ok(())
}

impl ActorRequest {
    /// Validate both names and return them trimmed.
    pub fn validate(&self) -> ApiResult<ActorNames> {
        for (value, field) in [(&self.first_name, "FirstName"), (&self.last_name, "LastName")] {
            value.validate_non_empty(field)?;
            validate_max_length(value, field, MAX_NAME_LEN)?;
            validate_printable(value, field)?;
        }
        Ok(self.to_names())
    }
}

impl ListActorsParams {
    /// Check the search term and pagination bounds and build the store query.
    pub fn into_query(self) -> ApiResult<ListQuery> {
        let search = self.search.unwrap_or_default();
        validate_max_length(&search, "search", MAX_SEARCH_LEN)?;
        validate_printable(&search, "search")?;

        let limit = self.limit.unwrap_or(0);
        limit.validate_range("limit", 0, i64::from(MAX_LIST_LIMIT))?;

        let offset = self.offset.unwrap_or(0);
        offset.validate_range("offset", 0, i64::MAX)?;

        Ok(ListQuery::new(search)
            .with_limit(u32::try_from(limit).unwrap_or(MAX_LIST_LIMIT))
            .with_offset(u64::try_from(offset).unwrap_or(0))
            .descending(self.order_by.unwrap_or(false)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_validate_non_empty_str() {
        assert!("hello".validate_non_empty("test").is_ok());
        assert!("".validate_non_empty("test").is_err());
        assert!("   ".validate_non_empty("test").is_err());
    }

    #[test]
    fn test_validate_non_empty_option() {
        let some: Option<String> = Some("value".to_string());
        assert!(some.validate_non_empty("test").is_ok());
        let none: Option<String> = None;
        assert!(none.validate_non_empty("test").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(5i64.validate_range("n", 0, 10).is_ok());
        assert!(0i64.validate_range("n", 0, 10).is_ok());
        assert!(10i64.validate_range("n", 0, 10).is_ok());
        assert!((-1i64).validate_range("n", 0, 10).is_err());
        assert!(11i64.validate_range("n", 0, 10).is_err());
    }

    #[test]
    fn test_actor_request_validation() -> ApiResult<()> {
        let names = ActorRequest::new(" Ada ", "Lovelace").validate()?;
        assert_eq!(names, ActorNames::new("Ada", "Lovelace"));

        let err = ActorRequest::new("", "Lovelace").validate();
        assert!(matches!(err, Err(e) if e.code == ErrorCode::MissingField));

        let err = ActorRequest::new("Ada", " ").validate();
        assert!(matches!(err, Err(e) if e.message.contains("LastName")));

        let long = "x".repeat(MAX_NAME_LEN + 1);
        let err = ActorRequest::new(long, "Lovelace").validate();
        assert!(matches!(err, Err(e) if e.code == ErrorCode::ValidationFailed));
        Ok(())
    }

    #[test]
    fn test_list_params_into_query() -> ApiResult<()> {
        let query = ListActorsParams::default().into_query()?;
        assert_eq!(query, ListQuery::default());

        let query = ListActorsParams {
            search: Some("smith".to_string()),
            limit: Some(1000),
            offset: Some(20),
            order_by: Some(true),
        }
        .into_query()?;
        assert_eq!(query.search, "smith");
        assert_eq!(query.limit, 1000);
        assert_eq!(query.offset, 20);
        assert!(query.order_descending);
        Ok(())
    }

    #[test]
    fn test_control_characters_are_rejected() {
        for (first, last) in [("Ada\u{0}", "Lovelace"), ("Ada", "Love\nlace"), ("\u{7f}", "x")] {
            let err = ActorRequest::new(first, last).validate();
            assert!(matches!(err, Err(e) if e.code == ErrorCode::InvalidFormat));
        }
        // Non-ASCII letters are fine.
        assert!(ActorRequest::new("Zoë", "Ångström").validate().is_ok());

        let err = ListActorsParams {
            search: Some("smi\u{0}th".to_string()),
            ..Default::default()
        }
        .into_query();
        assert!(matches!(err, Err(e) if e.code == ErrorCode::InvalidFormat));
    }

    #[test]
    fn test_search_length_is_bounded() -> ApiResult<()> {
        let at_limit = ListActorsParams {
            search: Some("s".repeat(MAX_SEARCH_LEN)),
            ..Default::default()
        };
        assert_eq!(at_limit.into_query()?.search.chars().count(), MAX_SEARCH_LEN);

        let err = ListActorsParams {
            search: Some("s".repeat(MAX_SEARCH_LEN + 1)),
            ..Default::default()
        }
        .into_query();
        assert!(matches!(err, Err(e) if e.code == ErrorCode::ValidationFailed));
        Ok(())
    }

    #[test]
    fn test_list_params_out_of_range() {
        for params in [
            ListActorsParams { limit: Some(1001), ..Default::default() },
            ListActorsParams { limit: Some(-1), ..Default::default() },
            ListActorsParams { offset: Some(-5), ..Default::default() },
        ] {
            let err = params.into_query();
            assert!(matches!(err, Err(e) if e.code == ErrorCode::InvalidRange));
        }
    }
}
