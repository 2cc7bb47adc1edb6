//! # Prescription Repository
//!
//! Prescriptions are free-text records; `prescribed_medicines` is never
//! resolved against the catalog or linked to a sale.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use medisync_core::input::NewPrescription;
use medisync_core::Prescription;

const PRESCRIPTION_COLUMNS: &str = "id, patient_name, patient_age, patient_gender, doctor_name, \
     doctor_license, diagnosis, prescribed_medicines, date_issued, is_fulfilled, created_at";

/// Repository for prescription database operations.
#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    pool: SqlitePool,
}

impl PrescriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PrescriptionRepository { pool }
    }

    pub async fn get(&self, id: i64) -> DbResult<Prescription> {
        let sql = format!(
            "SELECT {} FROM prescriptions WHERE id = ?1",
            PRESCRIPTION_COLUMNS
        );
        sqlx::query_as::<_, Prescription>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Prescription", id))
    }

    /// Newest first.
    pub async fn list(&self) -> DbResult<Vec<Prescription>> {
        let sql = format!(
            "SELECT {} FROM prescriptions ORDER BY created_at DESC, id DESC",
            PRESCRIPTION_COLUMNS
        );
        let prescriptions = sqlx::query_as::<_, Prescription>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(prescriptions)
    }

    pub async fn create(&self, input: &NewPrescription) -> DbResult<Prescription> {
        debug!(doctor = %input.doctor_name, "Creating prescription");

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO prescriptions (
                patient_name, patient_age, patient_gender, doctor_name, doctor_license,
                diagnosis, prescribed_medicines, date_issued, is_fulfilled, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)
            RETURNING id
            "#,
        )
        .bind(&input.patient_name)
        .bind(input.patient_age)
        .bind(&input.patient_gender)
        .bind(&input.doctor_name)
        .bind(&input.doctor_license)
        .bind(&input.diagnosis)
        .bind(&input.prescribed_medicines)
        .bind(input.date_issued)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id, "Prescription created");
        self.get(id).await
    }

    /// Marks a prescription fulfilled. Fulfilling twice is a no-op.
    pub async fn fulfill(&self, id: i64) -> DbResult<Prescription> {
        let result = sqlx::query("UPDATE prescriptions SET is_fulfilled = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Prescription", id));
        }

        info!(id, "Prescription fulfilled");
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use chrono::NaiveDate;

    fn rx(patient: &str) -> NewPrescription {
        NewPrescription {
            patient_name: patient.to_string(),
            patient_age: Some(42),
            patient_gender: Some("F".to_string()),
            doctor_name: "Dr. Rao".to_string(),
            doctor_license: Some("MCI-1234".to_string()),
            diagnosis: None,
            prescribed_medicines: Some("Amoxicillin 500mg, 3x daily".to_string()),
            date_issued: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_list_fulfill() {
        let db = test_db().await;
        let first = db.prescriptions().create(&rx("Asha")).await.unwrap();
        let second = db.prescriptions().create(&rx("Ben")).await.unwrap();
        assert!(!first.is_fulfilled);
        assert_eq!(first.patient_age, Some(42));

        let listed = db.prescriptions().list().await.unwrap();
        assert_eq!(
            listed.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let fulfilled = db.prescriptions().fulfill(first.id).await.unwrap();
        assert!(fulfilled.is_fulfilled);
        assert!(db.prescriptions().fulfill(first.id).await.unwrap().is_fulfilled);
    }

    #[tokio::test]
    async fn test_fulfill_missing() {
        let db = test_db().await;
        assert!(matches!(
            db.prescriptions().fulfill(77).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
