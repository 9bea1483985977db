use crate::constants::{MAX_NEARBY_WINDOW, MAX_PAGE_LIMIT};
use crate::error::{AppError, Result};

/// Resolve a `limit` query parameter, clamping to the page maximum
pub fn resolve_limit(limit: Option<i64>, default: usize) -> Result<usize> {
    bounded("limit", limit, default, MAX_PAGE_LIMIT)
}

/// Resolve an `offset` query parameter; offsets are never clamped
pub fn resolve_offset(offset: Option<i64>) -> Result<usize> {
    match offset {
        None => Ok(0),
        Some(value) if value < 0 => Err(negative("offset")),
        Some(value) => Ok(value as usize),
    }
}

/// Resolve the `window` of the nearby view, clamping to its maximum
pub fn resolve_window(window: Option<i64>, default: usize) -> Result<usize> {
    bounded("window", window, default, MAX_NEARBY_WINDOW)
}

/// Resolve a `level` query parameter; levels start at 1
pub fn resolve_level(level: Option<i64>, default: u64) -> Result<u64> {
    match level {
        None => Ok(default),
        Some(value) if value < 1 => Err(AppError::InvalidParameter(
            "level must be a positive integer".to_string(),
        )),
        Some(value) => Ok(value as u64),
    }
}

fn bounded(name: &str, value: Option<i64>, default: usize, max: usize) -> Result<usize> {
    match value {
        None => Ok(default.min(max)),
        Some(v) if v < 0 => Err(negative(name)),
        Some(v) => Ok((v as u64).min(max as u64) as usize),
    }
}

fn negative(name: &str) -> AppError {
    tracing::debug!("Rejected negative {} parameter", name);
    AppError::InvalidParameter(format!("{} must not be negative", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(resolve_limit(None, 50).unwrap(), 50);
        assert_eq!(resolve_limit(Some(0), 50).unwrap(), 0);
        assert_eq!(resolve_limit(Some(10), 50).unwrap(), 10);
        assert_eq!(resolve_limit(Some(5_000), 50).unwrap(), MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(matches!(
            resolve_limit(Some(-1), 50),
            Err(AppError::InvalidParameter(_))
        ));
        assert!(matches!(
            resolve_offset(Some(-3)),
            Err(AppError::InvalidParameter(_))
        ));
        assert!(matches!(
            resolve_window(Some(-2), 5),
            Err(AppError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_offset_is_not_clamped() {
        assert_eq!(resolve_offset(None).unwrap(), 0);
        assert_eq!(resolve_offset(Some(1_000)).unwrap(), 1_000);
    }

    #[test]
    fn test_window_clamps() {
        assert_eq!(resolve_window(None, 5).unwrap(), 5);
        assert_eq!(resolve_window(Some(100), 5).unwrap(), MAX_NEARBY_WINDOW);
    }

    #[test]
    fn test_level_must_be_positive() {
        assert_eq!(resolve_level(None, 1).unwrap(), 1);
        assert_eq!(resolve_level(Some(7), 1).unwrap(), 7);
        assert!(resolve_level(Some(0), 1).is_err());
        assert!(resolve_level(Some(-4), 1).is_err());
    }
}
