use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps customer data (emails, addresses) so it never shows up in `Debug`
/// or `Display` output, e.g. `tracing::info!("{:?}", order)`.
///
/// Serialization passes the real value through: API responses and stored
/// documents need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_value_in_debug() {
        let email = Masked::new("buyer@example.com".to_string());
        assert_eq!(format!("{:?}", email), "********");
        assert_eq!(email.to_string(), "********");
    }

    #[test]
    fn test_masked_serializes_real_value() {
        let email = Masked::new("buyer@example.com".to_string());
        let json = serde_json::to_value(&email).unwrap();
        assert_eq!(json, serde_json::json!("buyer@example.com"));

        let back: Masked<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back.expose(), "buyer@example.com");
    }
}
