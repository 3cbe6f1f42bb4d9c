//! Identity value type and pluggable format validators.
//!
//! # Responsibility
//! - Wrap raw identifier strings produced by any storage backend.
//! - Classify each identifier against an explicit, extensible validator
//!   registry.
//!
//! # Invariants
//! - The raw value is non-empty after trimming.
//! - The raw value is accepted by at least one registered validator.
//! - The first validator (registration order) that accepts the raw value
//!   determines `type_name()`.
//! - Equality is exact, case-sensitive raw string comparison.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid uuid regex")
});

static OBJECT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("valid object id regex"));

/// Identity construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Raw value is empty or whitespace-only.
    Empty,
    /// No registered validator accepts the raw value.
    InvalidFormat { raw: String, supported: Vec<String> },
    /// Registry has no validators; every identity would be rejected.
    EmptyRegistry,
    /// Two classification passes over the same registry disagreed.
    InconsistentClassification { raw: String },
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "identity cannot be empty"),
            Self::InvalidFormat { raw, supported } => write!(
                f,
                "identity `{raw}` does not match any supported format ({})",
                supported.join(", ")
            ),
            Self::EmptyRegistry => write!(f, "identity validator registry is empty"),
            Self::InconsistentClassification { raw } => write!(
                f,
                "identity `{raw}` was accepted but could not be classified consistently"
            ),
        }
    }
}

impl Error for IdentityError {}

/// Format check for one identifier family.
///
/// Implementations must be pure: the same input always yields the same
/// answer.
pub trait IdentityValidator: Send + Sync {
    fn is_valid(&self, raw: &str) -> bool;
    fn type_name(&self) -> &str;
}

/// Canonical hyphenated UUID (`8-4-4-4-12` hex digits, either case).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidValidator;

impl IdentityValidator for UuidValidator {
    fn is_valid(&self, raw: &str) -> bool {
        UUID_PATTERN.is_match(raw)
    }

    fn type_name(&self) -> &str {
        "uuid"
    }
}

/// Document-store native id: 12 bytes rendered as 24 hex digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdValidator;

impl IdentityValidator for ObjectIdValidator {
    fn is_valid(&self, raw: &str) -> bool {
        OBJECT_ID_PATTERN.is_match(raw)
    }

    fn type_name(&self) -> &str {
        "object_id"
    }
}

/// Ordered validator list used to build identities.
///
/// Constructed once by the composition root and shared (usually behind an
/// `Arc`) with every repository that needs to turn stored ids back into
/// `Identity` values.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: Vec<Arc<dyn IdentityValidator>>,
}

impl ValidatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `uuid` and `object_id`
    /// validators, in that order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add_validator(UuidValidator);
        registry.add_validator(ObjectIdValidator);
        registry
    }

    /// Appends one validator after all existing ones.
    pub fn add_validator<V>(&mut self, validator: V)
    where
        V: IdentityValidator + 'static,
    {
        self.validators.push(Arc::new(validator));
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Returns validator type names in registration order.
    pub fn type_names(&self) -> Vec<String> {
        self.validators
            .iter()
            .map(|validator| validator.type_name().to_string())
            .collect()
    }

    /// Validates and classifies `raw`.
    pub fn identity(&self, raw: &str) -> Result<Identity, IdentityError> {
        Identity::parse(raw, self)
    }

    fn classify(&self, raw: &str) -> Result<String, IdentityError> {
        if self.validators.is_empty() {
            return Err(IdentityError::EmptyRegistry);
        }

        let Some(position) = self
            .validators
            .iter()
            .position(|validator| validator.is_valid(raw))
        else {
            return Err(IdentityError::InvalidFormat {
                raw: raw.to_string(),
                supported: self.type_names(),
            });
        };

        // Second pass must land on the same validator.
        match self
            .validators
            .iter()
            .find(|validator| validator.is_valid(raw))
        {
            Some(found) if Arc::ptr_eq(found, &self.validators[position]) => {
                Ok(found.type_name().to_string())
            }
            _ => Err(IdentityError::InconsistentClassification {
                raw: raw.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validators", &self.type_names())
            .finish()
    }
}

/// Validated, classified identifier of a persisted todo.
#[derive(Debug, Clone)]
pub struct Identity {
    raw: String,
    type_name: String,
}

impl Identity {
    /// Validates `raw` against `registry`.
    ///
    /// # Errors
    /// - `Empty` when `raw` is blank.
    /// - `InvalidFormat` when no validator accepts `raw`.
    /// - `EmptyRegistry` / `InconsistentClassification` on registry faults.
    pub fn parse(raw: &str, registry: &ValidatorRegistry) -> Result<Self, IdentityError> {
        if raw.trim().is_empty() {
            return Err(IdentityError::Empty);
        }

        let type_name = registry.classify(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            type_name,
        })
    }

    /// Factory alias of [`Identity::parse`] for string-typed call sites.
    pub fn from_string(
        raw: impl AsRef<str>,
        registry: &ValidatorRegistry,
    ) -> Result<Self, IdentityError> {
        Self::parse(raw.as_ref(), registry)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Name of the validator that classified this identity.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn into_string(self) -> String {
        self.raw
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl serde::Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}
