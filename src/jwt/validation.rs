use alloc::string::String;
use core::time::Duration;

use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use super::{Claim, Claims, NumericDate};

/// Map from claim name to the predicate the claim must satisfy.
type ConstraintMap = IndexMap<String, ClaimValidator, DefaultHashBuilder>;

/// The rules one verification attempt checks a set of [`Claims`]
/// against.
///
/// A context is built up front through its `with_*` methods and never
/// changes afterwards. [`validate`](Self::validate) runs the temporal
/// checks on `exp` and `nbf` and then every registered constraint, in
/// registration order.
///
/// ```
/// use core::time::Duration;
///
/// use jwx::jwt::{ClaimValidator, NumericDate, ValidationContext};
///
/// let context = ValidationContext::new()
///     .with_reference_time(NumericDate::new(1300819380))
///     .with_leeway(Duration::from_secs(60))
///     .with_constraint("iss", ClaimValidator::Equals("joe".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    reference_time: Option<NumericDate>,
    leeway: Duration,
    constraints: ConstraintMap,
}

impl ValidationContext {
    /// Creates a context without constraints, zero leeway and the
    /// system clock as the reference time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the point in time the temporal claims are checked against.
    ///
    /// Without the `std` feature there is no clock to fall back on and
    /// a reference time must be set for validation to succeed.
    #[must_use]
    pub fn with_reference_time(mut self, reference_time: impl Into<NumericDate>) -> Self {
        self.reference_time = Some(reference_time.into());
        self
    }

    /// Sets the tolerated clock skew for the temporal claims.
    ///
    /// The leeway works in both directions: a check passes if it holds
    /// with the reference time moved forward *or* backward by this
    /// duration.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Requires the claim named `claim` to satisfy `validator`.
    ///
    /// Registering a second validator for the same claim replaces the
    /// first one.
    #[must_use]
    pub fn with_constraint(mut self, claim: impl Into<String>, validator: ClaimValidator) -> Self {
        self.constraints.insert(claim.into(), validator);
        self
    }

    /// Checks `claims` against this context.
    ///
    /// An `exp` claim must lie strictly after the reference time and an
    /// `nbf` claim at or before it, each within the leeway. `iat` is
    /// not checked automatically, constrain it explicitly if issuance
    /// times matter. Claims without a constraint pass unseen.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, or
    /// [`ValidationError::MissingClaim`] if a constraint names a claim
    /// that is not present.
    pub fn validate(&self, claims: &Claims) -> Result<(), ValidationError> {
        let now = self.effective_time()?;

        if let Some(expiration) = claims.expiration_time() {
            if !self.holds_within_leeway(now, |time| expiration > time) {
                return Err(ValidationError::Expired { expiration });
            }
        }

        if let Some(not_before) = claims.not_before() {
            if !self.holds_within_leeway(now, |time| not_before <= time) {
                return Err(ValidationError::NotYetValid { not_before });
            }
        }

        for (name, validator) in &self.constraints {
            let claim = claims
                .get(name)
                .ok_or_else(|| ValidationError::MissingClaim(name.clone()))?;
            if !validator.matches(claim) {
                return Err(ValidationError::FailedConstraint(name.clone()));
            }
        }

        Ok(())
    }

    /// Evaluates `check` at both ends of the leeway window around
    /// `now`. A temporal claim is accepted if it holds at either end,
    /// tolerating clocks that run ahead as well as clocks that lag.
    fn holds_within_leeway(&self, now: NumericDate, check: impl Fn(NumericDate) -> bool) -> bool {
        check(now - self.leeway) || check(now + self.leeway)
    }

    /// The time the temporal claims are compared against.
    fn effective_time(&self) -> Result<NumericDate, ValidationError> {
        match self.reference_time {
            Some(time) => Ok(time),
            #[cfg(feature = "std")]
            None => Ok(NumericDate::now()),
            #[cfg(not(feature = "std"))]
            None => Err(ValidationError::NoReferenceTime),
        }
    }
}

/// A predicate a single [`Claim`] must satisfy.
///
/// Validators make claim checks declarative: a
/// [`ValidationContext`] holds `claim name -> validator` pairs instead
/// of open coded comparisons.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ClaimValidator {
    /// The raw JSON value of the claim must equal the given value.
    Equals(Value),
    /// The claim must contain the given string. An audience contains
    /// each of its entries, an array claim each of its string elements
    /// and a string claim only itself.
    Contains(String),
    /// The claim must be a date strictly after the given one.
    GreaterThan(NumericDate),
    /// The claim must be a date strictly before the given one.
    LessThan(NumericDate),
    /// The claim must be a date at or after the given one.
    GreaterOrEqual(NumericDate),
    /// The claim must be a date at or before the given one.
    LessOrEqual(NumericDate),
}

impl ClaimValidator {
    /// Returns `true` if `claim` satisfies this predicate.
    ///
    /// The date comparisons require a claim with a date view, that is
    /// one of the registered temporal claims or an unregistered claim
    /// holding a non-negative integer. A claim without one fails them.
    pub fn matches(&self, claim: &Claim) -> bool {
        match self {
            Self::Equals(expected) => claim.to_value() == *expected,
            Self::Contains(needle) => contains(claim, needle),
            Self::GreaterThan(date) => numeric_date(claim).is_some_and(|d| d > *date),
            Self::LessThan(date) => numeric_date(claim).is_some_and(|d| d < *date),
            Self::GreaterOrEqual(date) => numeric_date(claim).is_some_and(|d| d >= *date),
            Self::LessOrEqual(date) => numeric_date(claim).is_some_and(|d| d <= *date),
        }
    }
}

/// The date view of a claim, if it has one.
fn numeric_date(claim: &Claim) -> Option<NumericDate> {
    match claim {
        Claim::ExpirationTime(date) | Claim::NotBefore(date) | Claim::IssuedAt(date) => Some(*date),
        Claim::Other(_, value) => value.as_u64().map(NumericDate::new),
        _ => None,
    }
}

fn contains(claim: &Claim, needle: &str) -> bool {
    match claim {
        Claim::Audience(audience) => audience.contains(needle),
        Claim::Issuer(value) | Claim::Subject(value) | Claim::JwtId(value) => value == needle,
        Claim::Other(_, Value::String(value)) => value == needle,
        Claim::Other(_, Value::Array(values)) => {
            values.iter().any(|value| value.as_str() == Some(needle))
        }
        _ => false,
    }
}

/// The reasons a set of [`Claims`] can fail validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// The `exp` claim lies at or before the reference time.
    #[error("the token expired at {expiration} seconds since the epoch")]
    Expired {
        /// The value of the `exp` claim.
        expiration: NumericDate,
    },
    /// The `nbf` claim lies after the reference time.
    #[error("the token must not be used before {not_before} seconds since the epoch")]
    NotYetValid {
        /// The value of the `nbf` claim.
        not_before: NumericDate,
    },
    /// A constraint names a claim that is not present.
    #[error("the constrained `{0}` claim is not present")]
    MissingClaim(String),
    /// A claim does not satisfy the validator registered for it.
    #[error("the `{0}` claim does not satisfy its constraint")]
    FailedConstraint(String),
    /// No reference time was set and there is no clock to fall back on.
    #[error("claim validation without the `std` feature requires an explicit reference time")]
    NoReferenceTime,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn at(reference_time: u64) -> ValidationContext {
        ValidationContext::new().with_reference_time(NumericDate::new(reference_time))
    }

    fn claims(json: &str) -> Claims {
        Claims::from_json(json).unwrap()
    }

    #[test]
    fn expiration_is_strict() {
        let claims = claims(r#"{"exp":100}"#);

        assert!(at(99).validate(&claims).is_ok());
        assert_eq!(
            at(100).validate(&claims),
            Err(ValidationError::Expired {
                expiration: NumericDate::new(100)
            })
        );
        assert!(at(130).validate(&claims).is_err());
    }

    #[test]
    fn leeway_saves_an_expired_token() {
        let claims = claims(r#"{"exp":100}"#);
        let context = at(130).with_leeway(Duration::from_secs(60));

        assert!(context.validate(&claims).is_ok());

        // the backward shifted time is 100, and expiration is strict
        let context = at(160).with_leeway(Duration::from_secs(60));
        assert!(context.validate(&claims).is_err());
    }

    #[test]
    fn not_before_is_inclusive() {
        let claims = claims(r#"{"nbf":100}"#);

        assert!(at(100).validate(&claims).is_ok());
        assert_eq!(
            at(99).validate(&claims),
            Err(ValidationError::NotYetValid {
                not_before: NumericDate::new(100)
            })
        );
    }

    #[test]
    fn leeway_admits_a_token_from_the_near_future() {
        let claims = claims(r#"{"nbf":150}"#);

        assert!(at(130)
            .with_leeway(Duration::from_secs(60))
            .validate(&claims)
            .is_ok());
        assert!(at(89)
            .with_leeway(Duration::from_secs(60))
            .validate(&claims)
            .is_err());
    }

    #[test]
    fn issuance_time_is_not_checked_automatically() {
        // an `iat` far in the future passes unless constrained
        let claims = claims(r#"{"iat":5000}"#);
        assert!(at(100).validate(&claims).is_ok());

        let context =
            at(100).with_constraint("iat", ClaimValidator::LessOrEqual(NumericDate::new(100)));
        assert_eq!(
            context.validate(&claims),
            Err(ValidationError::FailedConstraint("iat".into()))
        );
    }

    #[test]
    fn constraints_require_their_claim() {
        let context = at(100).with_constraint("iss", ClaimValidator::Equals(json!("joe")));

        assert_eq!(
            context.validate(&claims("{}")),
            Err(ValidationError::MissingClaim("iss".into()))
        );
        assert!(context.validate(&claims(r#"{"iss":"joe"}"#)).is_ok());
        assert_eq!(
            context.validate(&claims(r#"{"iss":"mallory"}"#)),
            Err(ValidationError::FailedConstraint("iss".into()))
        );
    }

    #[test]
    fn an_audience_constraint_matches_any_entry() {
        let context = at(100).with_constraint("aud", ClaimValidator::Contains("worker".into()));

        assert!(context
            .validate(&claims(r#"{"aud":["printer","worker"]}"#))
            .is_ok());
        assert!(context.validate(&claims(r#"{"aud":"worker"}"#)).is_ok());
        assert!(context.validate(&claims(r#"{"aud":"printer"}"#)).is_err());
    }

    #[test]
    fn date_validators_need_a_date_view() {
        let context =
            at(100).with_constraint("iss", ClaimValidator::GreaterThan(NumericDate::new(10)));
        assert_eq!(
            context.validate(&claims(r#"{"iss":"joe"}"#)),
            Err(ValidationError::FailedConstraint("iss".into()))
        );

        // unregistered integer claims have one
        let context = at(100)
            .with_constraint("generation", ClaimValidator::GreaterOrEqual(NumericDate::new(3)));
        assert!(context.validate(&claims(r#"{"generation":3}"#)).is_ok());
        assert!(context.validate(&claims(r#"{"generation":2}"#)).is_err());
    }

    #[test]
    fn constraints_run_in_registration_order() {
        let context = at(100)
            .with_constraint("a", ClaimValidator::Equals(json!(1)))
            .with_constraint("b", ClaimValidator::Equals(json!(2)));

        // both constraints are violated, the first registered one wins
        assert_eq!(
            context.validate(&claims(r#"{"a":9,"b":9}"#)),
            Err(ValidationError::FailedConstraint("a".into()))
        );
    }
}
