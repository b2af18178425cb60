//! Domain model for compliance policies and validation outcomes.

mod error;
mod ids;
mod outcome;
mod policy;
mod rule;

pub use error::{CheckerFault, ParsePolicySeverityError};
pub use ids::PolicyId;
pub use outcome::{denies, CheckOutcome, ValidationOutcome, Violation, Warning};
pub use policy::{Policy, PolicySeverity};
pub use rule::{
    BannedPhraseRule, BudgetLimitRule, BudgetScope, BudgetWindow, Checkpoint, ClaimLockRule,
    ContentConstraintRule, DomainAllowlistRule, HourRange, PhraseLocation, PolicyKind, PolicyRule,
    RateLimitRule, RateScope, RateWindow, RequiredPhraseRule, SuppressionRule, TimeWindowRule,
};
