//! # Input Payloads
//!
//! Create/update payloads as they arrive over HTTP, plus their validation.
//!
//! Each payload has a `validated(self)` method that checks every field and
//! returns a normalized copy: text trimmed, blank optionals turned into
//! `None`, emails lowercased. Repositories only ever receive validated
//! payloads.
//!
//! ```text
//! JSON body ──► NewMedicine ──validated()──► NewMedicine (normalized) ──► repository
//!                                  │
//!                                  └── Err(ValidationError) → 400
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::Role;
use crate::validation::{
    validate_batch_number, validate_email, validate_non_negative, validate_optional_text,
    validate_password, validate_range, validate_required_text, validate_username,
    ValidationResult,
};
use crate::DEFAULT_MIN_STOCK_LEVEL;

fn default_min_stock_level() -> i64 {
    DEFAULT_MIN_STOCK_LEVEL
}

fn validate_optional_email(field: &str, email: Option<String>) -> ValidationResult<Option<String>> {
    match email.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(e) => validate_email(field, e).map(Some),
    }
}

// =============================================================================
// Medicine
// =============================================================================

/// Payload for creating or replacing a medicine.
///
/// Updates are full replacements, so the same shape serves both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMedicine {
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub batch_number: String,
    pub quantity: i64,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_price_cents: Option<i64>,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default = "default_min_stock_level")]
    pub min_stock_level: i64,
    #[serde(default)]
    pub is_prescription_required: bool,
}

impl NewMedicine {
    pub fn validated(self) -> ValidationResult<Self> {
        let name = validate_required_text("name", &self.name, 100)?;
        let generic_name = validate_optional_text("generic_name", self.generic_name.as_deref(), 100)?;
        let category = validate_optional_text("category", self.category.as_deref(), 50)?;
        let batch_number = validate_batch_number(&self.batch_number)?;
        let barcode = validate_optional_text("barcode", self.barcode.as_deref(), 100)?;

        validate_non_negative("quantity", self.quantity)?;
        validate_non_negative("price_cents", self.price_cents)?;
        if let Some(cost) = self.cost_price_cents {
            validate_non_negative("cost_price_cents", cost)?;
        }
        validate_non_negative("min_stock_level", self.min_stock_level)?;

        if let Some(supplier_id) = self.supplier_id {
            if supplier_id <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "supplier_id".to_string(),
                });
            }
        }

        Ok(Self {
            name,
            generic_name,
            category,
            batch_number,
            barcode,
            ..self
        })
    }
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
}

impl NewSupplier {
    pub fn validated(self) -> ValidationResult<Self> {
        Ok(Self {
            name: validate_required_text("name", &self.name, 100)?,
            contact_person: validate_optional_text(
                "contact_person",
                self.contact_person.as_deref(),
                100,
            )?,
            email: validate_optional_email("email", self.email)?,
            phone: validate_optional_text("phone", self.phone.as_deref(), 20)?,
            address: validate_optional_text("address", self.address.as_deref(), 500)?,
            tax_id: validate_optional_text("tax_id", self.tax_id.as_deref(), 50)?,
            payment_terms: validate_optional_text(
                "payment_terms",
                self.payment_terms.as_deref(),
                100,
            )?,
        })
    }
}

// =============================================================================
// Prescription
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrescription {
    pub patient_name: String,
    #[serde(default)]
    pub patient_age: Option<i64>,
    #[serde(default)]
    pub patient_gender: Option<String>,
    pub doctor_name: String,
    #[serde(default)]
    pub doctor_license: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub prescribed_medicines: Option<String>,
    pub date_issued: NaiveDate,
}

impl NewPrescription {
    pub fn validated(self) -> ValidationResult<Self> {
        if let Some(age) = self.patient_age {
            validate_range("patient_age", age, 0, 150)?;
        }

        Ok(Self {
            patient_name: validate_required_text("patient_name", &self.patient_name, 100)?,
            patient_age: self.patient_age,
            patient_gender: validate_optional_text(
                "patient_gender",
                self.patient_gender.as_deref(),
                10,
            )?,
            doctor_name: validate_required_text("doctor_name", &self.doctor_name, 100)?,
            doctor_license: validate_optional_text(
                "doctor_license",
                self.doctor_license.as_deref(),
                50,
            )?,
            diagnosis: validate_optional_text("diagnosis", self.diagnosis.as_deref(), 2000)?,
            prescribed_medicines: validate_optional_text(
                "prescribed_medicines",
                self.prescribed_medicines.as_deref(),
                4000,
            )?,
            date_issued: self.date_issued,
        })
    }
}

// =============================================================================
// Users
// =============================================================================

/// Payload for an administrator creating an account.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    pub fn validated(self) -> ValidationResult<Self> {
        validate_password(&self.password)?;
        Ok(Self {
            username: validate_username(&self.username)?,
            email: validate_email("email", &self.email)?,
            password: self.password,
            role: self.role,
        })
    }
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Payload for a user editing their own profile.
///
/// `password` is only changed when present and non-empty.
#[derive(Clone, Deserialize)]
pub struct ProfileUpdate {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn validated(self) -> ValidationResult<Self> {
        let password = match self.password {
            Some(p) if !p.is_empty() => {
                validate_password(&p)?;
                Some(p)
            }
            _ => None,
        };

        Ok(Self {
            email: validate_email("email", &self.email)?,
            password,
        })
    }
}

impl std::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("email", &self.email)
            .field("password_changed", &self.password.is_some())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
