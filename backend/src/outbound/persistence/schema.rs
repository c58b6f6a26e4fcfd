//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate with `diesel print-schema` or
//! update by hand.

diesel::table! {
    /// Donor records.
    ///
    /// `email` carries a unique index; the repository maps violations of it
    /// to a duplicate-email error.
    donors (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        name -> Varchar,
        age -> Int4,
        /// Uppercased blood group label.
        blood_group -> Varchar,
        contact_number -> Varchar,
        /// Lowercased email address (unique).
        email -> Varchar,
        address -> Text,
        /// Null when the donor never donated.
        last_donation_date -> Nullable<Timestamptz>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}
