/// Defines an opaque identifier assigned by the backend. Backends send these either as JSON strings
/// or as integers, so both are accepted and held as text.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                use serde::de::Error as _;
                match <serde_json::Value as serde::Deserialize>::deserialize(deserializer)? {
                    serde_json::Value::String(s) => Ok(Self(s)),
                    serde_json::Value::Number(n) => Ok(Self(n.to_string())),
                    other => Err(D::Error::custom(format!(
                        "expected a string or integer {}, found {other}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

opaque_id!(
    /// Identifies a budget envelope.
    EnvelopeId
);

opaque_id!(
    /// Identifies a yearly budget plan.
    PlanId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_string_or_number() {
        let a: EnvelopeId = serde_json::from_str("\"env-1\"").unwrap();
        assert_eq!(a.as_str(), "env-1");
        let b: PlanId = serde_json::from_str("42").unwrap();
        assert_eq!(b.as_str(), "42");
        assert!(serde_json::from_str::<PlanId>("null").is_err());
    }

    #[test]
    fn test_serialize_transparent() {
        let id = EnvelopeId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
