//! Donor record model.
//!
//! A donor moves through three shapes:
//! - [`DonorDraft`]: unvalidated field bag produced by CSV rows and request
//!   bodies;
//! - [`NewDonor`]: a record that satisfies every field rule and may be handed
//!   to the store;
//! - [`Donor`]: a persisted record with its store-assigned identifier and
//!   timestamps.
//!
//! Email uniqueness is not checked here; the store enforces it.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// Days that must elapse after a donation before the donor is eligible again.
pub const ELIGIBILITY_WINDOW_DAYS: i64 = 90;

/// Validation errors raised while shaping donor records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DonorValidationError {
    InvalidId,
    MissingField { field: &'static str },
    EmptyField { field: &'static str },
    LatitudeOutOfRange,
    LongitudeOutOfRange,
}

impl fmt::Display for DonorValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "donor id must be a valid UUID"),
            Self::MissingField { field } => write!(f, "{field} is required"),
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::LatitudeOutOfRange => {
                write!(f, "latitude must be finite and within [-90, 90]")
            }
            Self::LongitudeOutOfRange => {
                write!(f, "longitude must be finite and within [-180, 180]")
            }
        }
    }
}

impl std::error::Error for DonorValidationError {}

/// Store-assigned donor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DonorId(Uuid);

impl DonorId {
    /// Parse an identifier supplied by a caller.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{DonorId, DonorValidationError};
    ///
    /// assert!(DonorId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").is_ok());
    /// assert_eq!(DonorId::new("42"), Err(DonorValidationError::InvalidId));
    /// ```
    pub fn new(id: impl AsRef<str>) -> Result<Self, DonorValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() || raw.trim() != raw {
            return Err(DonorValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| DonorValidationError::InvalidId)
    }

    /// Generate a fresh identifier; used by stores that assign keys in process.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID loaded from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DonorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Email address, trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalise and validate an email address.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new("  Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    pub fn new(email: impl AsRef<str>) -> Result<Self, DonorValidationError> {
        let normalised = email.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(DonorValidationError::EmptyField { field: "email" });
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Blood group label, trimmed and uppercased.
///
/// Labels are not restricted to the ABO/Rh set; any non-empty value is kept
/// so imports from other registries are not rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BloodGroup(String);

impl BloodGroup {
    /// Normalise and validate a blood group label.
    pub fn new(label: impl AsRef<str>) -> Result<Self, DonorValidationError> {
        let normalised = label.as_ref().trim().to_uppercase();
        if normalised.is_empty() {
            return Err(DonorValidationError::EmptyField {
                field: "blood_group",
            });
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for BloodGroup {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Unvalidated donor fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorDraft {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub blood_group: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub last_donation_date: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Partial update applied to an existing donor.
///
/// Outer `None` leaves a field untouched. For the optional fields the inner
/// `None` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorPatch {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub blood_group: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub last_donation_date: Option<Option<DateTime<Utc>>>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
}

/// Donor record that satisfies every field rule.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonor {
    name: String,
    age: i32,
    blood_group: BloodGroup,
    contact_number: String,
    email: EmailAddress,
    address: String,
    last_donation_date: Option<DateTime<Utc>>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

fn required_text(
    value: Option<String>,
    field: &'static str,
) -> Result<String, DonorValidationError> {
    let value = value.ok_or(DonorValidationError::MissingField { field })?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DonorValidationError::EmptyField { field });
    }
    Ok(trimmed.to_owned())
}

fn validate_latitude(value: Option<f64>) -> Result<Option<f64>, DonorValidationError> {
    match value {
        Some(lat) if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) => {
            Err(DonorValidationError::LatitudeOutOfRange)
        }
        other => Ok(other),
    }
}

fn validate_longitude(value: Option<f64>) -> Result<Option<f64>, DonorValidationError> {
    match value {
        Some(lng) if !(lng.is_finite() && (-180.0..=180.0).contains(&lng)) => {
            Err(DonorValidationError::LongitudeOutOfRange)
        }
        other => Ok(other),
    }
}

impl TryFrom<DonorDraft> for NewDonor {
    type Error = DonorValidationError;

    fn try_from(draft: DonorDraft) -> Result<Self, Self::Error> {
        let DonorDraft {
            name,
            age,
            blood_group,
            contact_number,
            email,
            address,
            last_donation_date,
            latitude,
            longitude,
        } = draft;

        let name = required_text(name, "name")?;
        let age = age.ok_or(DonorValidationError::MissingField { field: "age" })?;
        let blood_group = BloodGroup::new(
            blood_group.ok_or(DonorValidationError::MissingField {
                field: "blood_group",
            })?,
        )?;
        let contact_number = required_text(contact_number, "contact_number")?;
        let email = EmailAddress::new(
            email.ok_or(DonorValidationError::MissingField { field: "email" })?,
        )?;
        let address = required_text(address, "address")?;

        Ok(Self {
            name,
            age,
            blood_group,
            contact_number,
            email,
            address,
            last_donation_date,
            latitude: validate_latitude(latitude)?,
            longitude: validate_longitude(longitude)?,
        })
    }
}

impl NewDonor {
    /// Trimmed donor name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Age in years; not range checked.
    pub fn age(&self) -> i32 {
        self.age
    }

    /// Normalised blood group.
    pub fn blood_group(&self) -> &BloodGroup {
        &self.blood_group
    }

    /// Trimmed contact number.
    pub fn contact_number(&self) -> &str {
        self.contact_number.as_str()
    }

    /// Normalised, store-unique email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Trimmed postal address.
    pub fn address(&self) -> &str {
        self.address.as_str()
    }

    /// Last donation instant; `None` means the donor never donated.
    pub fn last_donation_date(&self) -> Option<DateTime<Utc>> {
        self.last_donation_date
    }

    /// Optional latitude in degrees.
    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    /// Optional longitude in degrees.
    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    fn into_draft(self) -> DonorDraft {
        DonorDraft {
            name: Some(self.name),
            age: Some(self.age),
            blood_group: Some(self.blood_group.0),
            contact_number: Some(self.contact_number),
            email: Some(self.email.0),
            address: Some(self.address),
            last_donation_date: self.last_donation_date,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Persisted donor record.
#[derive(Debug, Clone, PartialEq)]
pub struct Donor {
    id: DonorId,
    record: NewDonor,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Donor {
    /// Assemble a persisted donor from its stored parts.
    pub fn new(
        id: DonorId,
        record: NewDonor,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            record,
            created_at,
            updated_at,
        }
    }

    /// Store-assigned identifier.
    pub fn id(&self) -> DonorId {
        self.id
    }

    /// Validated donor fields.
    pub fn record(&self) -> &NewDonor {
        &self.record
    }

    /// Creation instant; list results are ordered newest first on this.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification instant.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the donor may donate at `now`.
    pub fn is_eligible_at(&self, now: DateTime<Utc>) -> bool {
        is_eligible(self.record.last_donation_date, eligibility_cutoff(now))
    }

    /// Overlay `patch` on the stored fields and re-run record validation.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{Donor, DonorDraft, DonorId, DonorPatch, NewDonor};
    /// use chrono::Utc;
    ///
    /// let record = NewDonor::try_from(DonorDraft {
    ///     name: Some("Ada".into()),
    ///     age: Some(36),
    ///     blood_group: Some("o+".into()),
    ///     contact_number: Some("555-0100".into()),
    ///     email: Some("ada@example.com".into()),
    ///     address: Some("1 Analytical Row".into()),
    ///     ..DonorDraft::default()
    /// })
    /// .expect("valid donor");
    /// let donor = Donor::new(DonorId::random(), record, Utc::now(), Utc::now());
    ///
    /// let patched = donor
    ///     .apply_patch(DonorPatch { blood_group: Some("ab-".into()), ..DonorPatch::default() })
    ///     .expect("valid patch");
    /// assert_eq!(patched.blood_group().as_ref(), "AB-");
    /// assert_eq!(patched.name(), "Ada");
    /// ```
    pub fn apply_patch(&self, patch: DonorPatch) -> Result<NewDonor, DonorValidationError> {
        let mut draft = self.record.clone().into_draft();
        let DonorPatch {
            name,
            age,
            blood_group,
            contact_number,
            email,
            address,
            last_donation_date,
            latitude,
            longitude,
        } = patch;

        if name.is_some() {
            draft.name = name;
        }
        if age.is_some() {
            draft.age = age;
        }
        if blood_group.is_some() {
            draft.blood_group = blood_group;
        }
        if contact_number.is_some() {
            draft.contact_number = contact_number;
        }
        if email.is_some() {
            draft.email = email;
        }
        if address.is_some() {
            draft.address = address;
        }
        if let Some(value) = last_donation_date {
            draft.last_donation_date = value;
        }
        if let Some(value) = latitude {
            draft.latitude = value;
        }
        if let Some(value) = longitude {
            draft.longitude = value;
        }

        NewDonor::try_from(draft)
    }
}

/// Latest donation instant that still leaves a donor eligible at `now`.
pub fn eligibility_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(ELIGIBILITY_WINDOW_DAYS)
}

/// Eligibility rule shared by every store: never donated, or donated at or
/// before `cutoff`.
pub fn is_eligible(last_donation_date: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    last_donation_date.is_none_or(|date| date <= cutoff)
}

/// Parse a donation date as written in CSV files and request bodies.
///
/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339 timestamps and naive
/// `YYYY-MM-DDTHH:MM:SS` timestamps (read as UTC).
///
/// # Examples
/// ```
/// use backend::domain::parse_donation_date;
///
/// assert!(parse_donation_date("2024-01-15").is_some());
/// assert!(parse_donation_date("2024-01-15T08:30:00Z").is_some());
/// assert!(parse_donation_date("last tuesday").is_none());
/// ```
pub fn parse_donation_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
