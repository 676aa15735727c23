use crate::error::ApiError;

/// A closed set of string tags accepted by an enumerated field.
pub trait Tag: Sized + Copy + 'static {
    /// Field name used in validation messages.
    const FIELD: &'static str;
    const ALLOWED: &'static [Self];

    fn as_tag(&self) -> &'static str;

    fn from_tag(value: &str) -> Option<Self> {
        Self::ALLOWED.iter().copied().find(|tag| tag.as_tag() == value)
    }

    fn allowed_list() -> String {
        Self::ALLOWED.iter().map(|tag| tag.as_tag()).collect::<Vec<_>>().join(", ")
    }
}

/// Validate `value` against the whitelist of `T`.
pub fn parse_tag<T: Tag>(value: &str) -> Result<T, ApiError> {
    T::from_tag(value.trim()).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Invalid {}. Must be one of: {}",
            T::FIELD,
            T::allowed_list()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Color {
        Red,
        Blue,
    }

    impl Tag for Color {
        const FIELD: &'static str = "color";
        const ALLOWED: &'static [Self] = &[Color::Red, Color::Blue];

        fn as_tag(&self) -> &'static str {
            match self {
                Color::Red => "red",
                Color::Blue => "blue",
            }
        }
    }

    #[test]
    fn known_tags_parse() {
        assert_eq!(parse_tag::<Color>("red").unwrap(), Color::Red);
        assert_eq!(parse_tag::<Color>(" blue ").unwrap(), Color::Blue);
    }

    #[test]
    fn unknown_tag_names_the_allowed_set() {
        let err = parse_tag::<Color>("green").unwrap_err();
        assert_eq!(err.message(), "Invalid color. Must be one of: red, blue");
    }
}
