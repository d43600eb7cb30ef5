//! Core domain models and strongly-typed identifiers.
//!
//! Defines the lead record, its submission form, validation errors and the
//! newtype ID wrappers used for compile-time type safety. Includes database
//! serialization traits for the identifiers stored in PostgreSQL.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::Row;
use uuid::Uuid;

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Strongly-typed tenant identifier.
///
/// Derived from the authenticated caller, never from the client document.
/// All leads are scoped to the tenant that submitted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

impl TenantId {
    /// Creates a new random tenant ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TenantId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl sqlx::Type<PgDb> for TenantId {
    fn type_info() -> PgTypeInfo {
        <Uuid as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for TenantId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let uuid = <Uuid as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(uuid))
    }
}

impl sqlx::Encode<'_, PgDb> for TenantId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <Uuid as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Correlation identifier tracing one lead across storage and queues.
///
/// Supplied by the caller or generated at ingestion. Unique across all
/// stored leads; the database enforces this with a unique index.
///
/// # Example
///
/// ```
/// use leadflow_core::models::CorrelationId;
///
/// let id: CorrelationId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
/// assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// Creates a new random correlation ID.
    ///
    /// Uses UUID v4 for globally unique identifiers without coordination.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl sqlx::Type<PgDb> for CorrelationId {
    fn type_info() -> PgTypeInfo {
        <Uuid as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for CorrelationId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let uuid = <Uuid as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(uuid))
    }
}

impl sqlx::Encode<'_, PgDb> for CorrelationId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <Uuid as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Storage-assigned lead identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(pub i64);

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel a lead came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    /// Web form on the tenant's site.
    Website,
    /// Referred by an existing customer or partner.
    Referral,
    /// Social network.
    Social,
    /// Inbound email.
    Email,
    /// Inbound call.
    Phone,
    /// Paid advertisement.
    Advertisement,
    /// Trade show, webinar or similar event.
    Event,
    /// Anything else.
    Other,
}

impl LeadSource {
    /// All accepted sources, in schema order.
    pub const ALL: [Self; 8] = [
        Self::Website,
        Self::Referral,
        Self::Social,
        Self::Email,
        Self::Phone,
        Self::Advertisement,
        Self::Event,
        Self::Other,
    ];

    /// Wire and database representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Referral => "referral",
            Self::Social => "social",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Advertisement => "advertisement",
            Self::Event => "event",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("invalid lead source: {s}"))
    }
}

/// A single schema violation.
///
/// `property` is a dotted path into the document; an empty path refers to
/// the whole document (used for schema resolution failures).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted field path, empty for document-level errors.
    pub property: String,
    /// Human-readable message.
    pub message: String,
    /// Identifier of the violated constraint (`required`, `format`, ...).
    pub constraint: String,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(
        property: impl Into<String>,
        message: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self { property: property.into(), message: message.into(), constraint: constraint.into() }
    }

    /// Whether the schema itself could not be loaded or compiled.
    pub fn is_schema_failure(&self) -> bool {
        self.property.is_empty() && self.constraint == "schema"
    }

    /// Key used when grouping errors by field for responses.
    pub fn field_key(&self) -> &str {
        if self.property.is_empty() {
            "schema"
        } else {
            &self.property
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field_key(), self.message, self.constraint)
    }
}

/// Lead fields as submitted by a client, after schema validation.
///
/// Unknown keys (including any client-sent `tenant_id`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeadSubmission {
    /// Contact email address.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Company name.
    #[serde(default)]
    pub company: Option<String>,
    /// Acquisition channel.
    #[serde(default)]
    pub source: Option<LeadSource>,
    /// Free-form mapping.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    /// Caller-supplied correlation id.
    #[serde(default)]
    pub correlation_id: Option<CorrelationId>,
}

/// A lead ready to be persisted.
///
/// Created exactly once per ingestion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadRecord {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Correlation id, generated when the submission had none.
    pub correlation_id: CorrelationId,
    /// Contact email address.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Acquisition channel.
    pub source: Option<LeadSource>,
    /// Free-form mapping.
    pub metadata: Option<Map<String, Value>>,
}

impl LeadRecord {
    /// Builds a record for `tenant_id` from a validated submission.
    pub fn from_submission(tenant_id: TenantId, submission: LeadSubmission) -> Self {
        Self {
            tenant_id,
            correlation_id: submission.correlation_id.unwrap_or_default(),
            email: submission.email,
            first_name: submission.first_name,
            last_name: submission.last_name,
            phone: submission.phone,
            company: submission.company,
            source: submission.source,
            metadata: submission.metadata,
        }
    }

    /// Contact fields as carried in the `lead_data` section of events.
    pub fn lead_data(&self) -> Value {
        serde_json::json!({
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "phone": self.phone,
            "company": self.company,
            "source": self.source,
            "metadata": self.metadata,
        })
    }
}

/// A lead as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredLead {
    /// Storage-assigned identifier.
    pub id: LeadId,
    /// The persisted record.
    #[serde(flatten)]
    pub record: LeadRecord,
    /// Insert time.
    pub created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredLead {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        let source: Option<String> = row.try_get("source")?;
        let source = source
            .map(|s| s.parse::<LeadSource>())
            .transpose()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        let metadata: Option<sqlx::types::Json<Map<String, Value>>> = row.try_get("metadata")?;

        Ok(Self {
            id: LeadId(row.try_get("id")?),
            record: LeadRecord {
                tenant_id: row.try_get("tenant_id")?,
                correlation_id: row.try_get("correlation_id")?,
                email: row.try_get("email")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                phone: row.try_get("phone")?,
                company: row.try_get("company")?,
                source,
                metadata: metadata.map(|json| json.0),
            },
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lead_source_round_trips_through_str() {
        for source in LeadSource::ALL {
            assert_eq!(source.as_str().parse::<LeadSource>().unwrap(), source);
        }
        assert!("billboard".parse::<LeadSource>().is_err());
    }

    #[test]
    fn submission_ignores_client_tenant() {
        let submission: LeadSubmission = serde_json::from_value(json!({
            "email": "a@b.com",
            "tenant_id": "someone-else",
        }))
        .unwrap();

        assert_eq!(submission.email, "a@b.com");
        assert!(submission.correlation_id.is_none());
    }

    #[test]
    fn record_generates_correlation_id_when_absent() {
        let submission: LeadSubmission =
            serde_json::from_value(json!({ "email": "a@b.com" })).unwrap();
        let tenant = TenantId::new();

        let first = LeadRecord::from_submission(tenant, submission.clone());
        let second = LeadRecord::from_submission(tenant, submission);

        assert_ne!(first.correlation_id, second.correlation_id);
        assert_eq!(first.tenant_id, tenant);
    }

    #[test]
    fn record_keeps_supplied_correlation_id() {
        let submission: LeadSubmission = serde_json::from_value(json!({
            "email": "a@b.com",
            "correlation_id": "550e8400-e29b-41d4-a716-446655440000",
            "source": "referral",
        }))
        .unwrap();

        let record = LeadRecord::from_submission(TenantId::new(), submission);

        assert_eq!(record.correlation_id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(record.source, Some(LeadSource::Referral));
    }

    #[test]
    fn empty_property_groups_under_schema_key() {
        let error = ValidationError::new("", "Schema validation failed: missing", "schema");
        assert_eq!(error.field_key(), "schema");

        let error = ValidationError::new("email", "Invalid email", "format");
        assert_eq!(error.field_key(), "email");
    }

    #[test]
    fn only_unloadable_schema_is_schema_failure() {
        let unloadable = ValidationError::new("", "Schema validation failed: missing", "schema");
        assert!(unloadable.is_schema_failure());
        assert!(!ValidationError::new("", "Must be of type object", "type").is_schema_failure());
        assert!(!ValidationError::new("email", "Invalid email", "format").is_schema_failure());
    }
}
