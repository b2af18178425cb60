//! Rule payloads: a closed tagged union over the nine rule kinds.
//!
//! The source-of-truth mapping from rule kind to checkpoint lives here as
//! [`PolicyKind::applies_at`], so adding a kind forces both a checker (the
//! engine matches exhaustively) and a stage decision.

use crate::task::domain::TaskType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three fixed validation checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    /// Before drafting begins.
    PreDraft,
    /// Against freshly drafted content.
    Content,
    /// Against final content, immediately before delivery.
    PreExecute,
}

impl Checkpoint {
    /// Returns the canonical checkpoint name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreDraft => "pre_draft",
            Self::Content => "content",
            Self::PreExecute => "pre_execute",
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of the nine rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Sliding-window task count cap.
    RateLimit,
    /// Forbidden phrases in content.
    BannedPhrase,
    /// Phrases that must appear in content.
    RequiredPhrase,
    /// Product claim restrictions.
    ClaimLock,
    /// Link destinations restricted to allowed domains.
    DomainAllowlist,
    /// Recipient suppression-list advisory.
    Suppression,
    /// Scheduled send restricted to a weekly time window.
    TimeWindow,
    /// Cumulative spend cap.
    BudgetLimit,
    /// Structural content constraints.
    ContentRule,
}

impl PolicyKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit",
            Self::BannedPhrase => "banned_phrase",
            Self::RequiredPhrase => "required_phrase",
            Self::ClaimLock => "claim_lock",
            Self::DomainAllowlist => "domain_allowlist",
            Self::Suppression => "suppression",
            Self::TimeWindow => "time_window",
            Self::BudgetLimit => "budget_limit",
            Self::ContentRule => "content_rule",
        }
    }

    /// Returns whether rules of this kind are evaluated at `checkpoint`.
    ///
    /// Pre-draft runs the scheduling-shaped kinds, the content checkpoint
    /// runs the content-inspection kinds, and pre-execute is a comprehensive
    /// final gate running all nine.
    #[must_use]
    pub const fn applies_at(self, checkpoint: Checkpoint) -> bool {
        match checkpoint {
            Checkpoint::PreDraft => {
                matches!(self, Self::RateLimit | Self::TimeWindow | Self::BudgetLimit)
            }
            Checkpoint::Content => matches!(
                self,
                Self::BannedPhrase
                    | Self::RequiredPhrase
                    | Self::ClaimLock
                    | Self::DomainAllowlist
                    | Self::ContentRule
            ),
            Checkpoint::PreExecute => true,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sliding window for rate-limit counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateWindow {
    /// Rolling hour.
    Hour,
    /// Rolling day.
    Day,
    /// Rolling week.
    Week,
    /// Rolling month (30 days).
    Month,
}

impl RateWindow {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// Scope over which rate-limited tasks are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateScope {
    /// Tasks sharing the connector.
    Connector,
    /// Tasks in the campaign.
    Campaign,
    /// Tasks for the product.
    Product,
    /// Tasks across the organization.
    Organization,
}

impl RateScope {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connector => "connector",
            Self::Campaign => "campaign",
            Self::Product => "product",
            Self::Organization => "organization",
        }
    }
}

/// Rate-limit rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRule {
    /// Maximum matching tasks inside the window.
    pub limit: u32,
    /// Sliding window length.
    pub window: RateWindow,
    /// Counting scope; defaults to the organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<RateScope>,
    /// Restricts counting to these task types when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_types: Option<Vec<TaskType>>,
}

/// Banned-phrase rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannedPhraseRule {
    /// Phrases that must not appear.
    pub phrases: Vec<String>,
    /// Match case-sensitively.
    #[serde(default)]
    pub case_sensitive: bool,
    /// Match only at word boundaries.
    #[serde(default)]
    pub whole_word: bool,
    /// Treat each phrase as a regular expression.
    #[serde(default)]
    pub regex: bool,
}

/// Where a required phrase must appear within the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhraseLocation {
    /// Anywhere in the content.
    #[default]
    Anywhere,
    /// The first 20% of the content.
    Header,
    /// The last 20% of the content.
    Footer,
}

/// Required-phrase rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredPhraseRule {
    /// Phrases that must appear.
    pub phrases: Vec<String>,
    /// Pass when any one phrase is present instead of requiring all.
    #[serde(default)]
    pub at_least_one: bool,
    /// Match case-sensitively.
    #[serde(default)]
    pub case_sensitive: bool,
    /// Region of the content to search.
    #[serde(default)]
    pub location: PhraseLocation,
}

/// Claim-lock rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLockRule {
    /// Require content to stick to the product's verified claims.
    pub require_verified: bool,
    /// Additional claims allowed beyond the product's verified list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_claims: Option<Vec<String>>,
    /// Claims that must never appear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_claims: Option<Vec<String>>,
}

/// Domain-allowlist rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAllowlistRule {
    /// Domains links may point to (suffix match).
    pub allowed_domains: Vec<String>,
    /// Forbid links entirely.
    #[serde(default)]
    pub block_all: bool,
}

/// Suppression rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionRule {
    /// Specific suppression list to consult.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppression_list_id: Option<String>,
    /// Cross-check the organization-wide suppression list.
    pub check_global_list: bool,
    /// Cross-check the product-level suppression list.
    pub check_product_list: bool,
}

/// Half-open hour range `[start, end)` in the rule's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    /// First permitted hour (0-23).
    pub start: u8,
    /// First hour past the window (1-24).
    pub end: u8,
}

/// Time-window rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowRule {
    /// Permitted weekdays, 0 = Sunday through 6 = Saturday.
    pub allowed_days: Vec<u8>,
    /// Permitted hours within each allowed day.
    pub allowed_hours: HourRange,
    /// Timezone the window is expressed in (`UTC` or a fixed `±HH:MM`
    /// offset).
    pub timezone: String,
}

/// Aggregation window for budget accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetWindow {
    /// Rolling day.
    Day,
    /// Rolling week.
    Week,
    /// Rolling month (30 days).
    Month,
    /// The campaign's whole lifetime.
    Campaign,
    /// All-time.
    Lifetime,
}

impl BudgetWindow {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Campaign => "campaign",
            Self::Lifetime => "lifetime",
        }
    }
}

/// Scope over which spend is summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetScope {
    /// Spend within the campaign.
    Campaign,
    /// Spend for the product.
    Product,
    /// Spend across the organization.
    Organization,
}

impl BudgetScope {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::Product => "product",
            Self::Organization => "organization",
        }
    }
}

/// Budget-limit rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLimitRule {
    /// Spend cap in cents.
    pub max_spend_cents: i64,
    /// Aggregation window.
    pub window: BudgetWindow,
    /// Aggregation scope.
    pub scope: BudgetScope,
}

/// Structural content-constraint rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentConstraintRule {
    /// Maximum serialized content length in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Minimum serialized content length in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Literal substrings that must be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_elements: Option<Vec<String>>,
    /// Literal substrings that must be absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbidden_elements: Option<Vec<String>>,
}

/// Closed tagged union over the nine rule kinds.
///
/// Serialized with a `type` tag matching the kind's canonical name, so stored
/// payloads structurally match their kind by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyRule {
    /// Sliding-window task count cap.
    RateLimit(RateLimitRule),
    /// Forbidden phrases in content.
    BannedPhrase(BannedPhraseRule),
    /// Phrases that must appear in content.
    RequiredPhrase(RequiredPhraseRule),
    /// Product claim restrictions.
    ClaimLock(ClaimLockRule),
    /// Link destinations restricted to allowed domains.
    DomainAllowlist(DomainAllowlistRule),
    /// Recipient suppression-list advisory.
    Suppression(SuppressionRule),
    /// Scheduled send restricted to a weekly time window.
    TimeWindow(TimeWindowRule),
    /// Cumulative spend cap.
    BudgetLimit(BudgetLimitRule),
    /// Structural content constraints.
    ContentRule(ContentConstraintRule),
}

impl PolicyRule {
    /// Returns the rule kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> PolicyKind {
        match self {
            Self::RateLimit(_) => PolicyKind::RateLimit,
            Self::BannedPhrase(_) => PolicyKind::BannedPhrase,
            Self::RequiredPhrase(_) => PolicyKind::RequiredPhrase,
            Self::ClaimLock(_) => PolicyKind::ClaimLock,
            Self::DomainAllowlist(_) => PolicyKind::DomainAllowlist,
            Self::Suppression(_) => PolicyKind::Suppression,
            Self::TimeWindow(_) => PolicyKind::TimeWindow,
            Self::BudgetLimit(_) => PolicyKind::BudgetLimit,
            Self::ContentRule(_) => PolicyKind::ContentRule,
        }
    }
}
