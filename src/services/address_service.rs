use chrono::Utc;
use sqlx::SqlitePool;

use crate::dtos::address_dtos::AddressPayload;
use crate::errors::Result;
use crate::models::address::{Address, AddressFields};

/// Owner scoping lives in the WHERE clauses.
const ADDRESS_COLUMNS: &str = "id, house_flat, street, landmark, area, district, \
                               city, state, postal_code, country, created_at, updated_at";

/// Field name paired with the catalog code describing what is wrong with it.
pub type FieldErrors = Vec<(&'static str, &'static str)>;

#[derive(Clone)]
pub struct AddressService {
    db: SqlitePool,
}

impl AddressService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// The address shown on a profile: the user's earliest one.
    pub async fn first_for_user(&self, user_id: i64) -> Result<Option<Address>> {
        let sql = format!(
            "SELECT {} FROM addresses WHERE user_id = ? ORDER BY id LIMIT 1",
            ADDRESS_COLUMNS
        );
        Ok(sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?)
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Address>> {
        let sql = format!(
            "SELECT {} FROM addresses WHERE user_id = ? ORDER BY id",
            ADDRESS_COLUMNS
        );
        Ok(sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?)
    }

    /// Scoped to the owner; someone else's address reads as missing.
    pub async fn get(&self, id: i64, user_id: i64) -> Result<Option<Address>> {
        let sql = format!(
            "SELECT {} FROM addresses WHERE id = ? AND user_id = ?",
            ADDRESS_COLUMNS
        );
        Ok(sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?)
    }

    pub async fn create(&self, user_id: i64, fields: AddressFields) -> Result<Address> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO addresses \
             (user_id, house_flat, street, landmark, area, district, city, state, postal_code, country, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&fields.house_flat)
        .bind(&fields.street)
        .bind(&fields.landmark)
        .bind(&fields.area)
        .bind(&fields.district)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.postal_code)
        .bind(&fields.country)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;

        self.get(result.last_insert_rowid(), user_id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        fields: AddressFields,
    ) -> Result<Option<Address>> {
        let result = sqlx::query(
            "UPDATE addresses SET house_flat = ?, street = ?, landmark = ?, area = ?, \
             district = ?, city = ?, state = ?, postal_code = ?, country = ?, updated_at = ? \
             WHERE id = ? AND user_id = ?",
        )
        .bind(&fields.house_flat)
        .bind(&fields.street)
        .bind(&fields.landmark)
        .bind(&fields.area)
        .bind(&fields.district)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.postal_code)
        .bind(&fields.country)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(id, user_id).await
    }
}

fn allowed_text(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | ',' | '.' | '/'))
}

fn pick(given: &Option<String>, existing: Option<&String>) -> String {
    given
        .as_ref()
        .or(existing)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Applies the payload over `base` (if any) and validates the result.
pub fn validate_address(
    payload: &AddressPayload,
    base: Option<&Address>,
) -> std::result::Result<AddressFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let mut required = |name: &'static str, value: String| -> String {
        if value.is_empty() {
            errors.push((name, "EA004"));
        } else if !allowed_text(&value) {
            errors.push((name, "EA003"));
        }
        value
    };

    let house_flat = required("house_flat", pick(&payload.house_flat, base.map(|a| &a.house_flat)));
    let street = required("street", pick(&payload.street, base.map(|a| &a.street)));
    let area = required("area", pick(&payload.area, base.map(|a| &a.area)));
    let district = required("district", pick(&payload.district, base.map(|a| &a.district)));
    let city = required("city", pick(&payload.city, base.map(|a| &a.city)));
    let state = required("state", pick(&payload.state, base.map(|a| &a.state)));
    let country = required("country", pick(&payload.country, base.map(|a| &a.country)));

    let landmark = pick(
        &payload.landmark,
        base.and_then(|a| a.landmark.as_ref()),
    );
    if !landmark.is_empty() && !allowed_text(&landmark) {
        errors.push(("landmark", "EA003"));
    }

    let postal_code = pick(&payload.postal_code, base.map(|a| &a.postal_code));
    if postal_code.is_empty() {
        errors.push(("postal_code", "EA008"));
    } else if !postal_code.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push(("postal_code", "EA005"));
    } else if !(4..=10).contains(&postal_code.len()) {
        errors.push(("postal_code", "EA006"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(AddressFields {
        house_flat,
        street,
        landmark: (!landmark.is_empty()).then_some(landmark),
        area,
        district,
        city,
        state,
        postal_code,
        country,
    })
}

#[cfg(test)]
pub mod testing {
    use crate::dtos::address_dtos::AddressPayload;

    pub fn payload() -> AddressPayload {
        AddressPayload {
            house_flat: Some("12B".to_string()),
            street: Some("MG Road".to_string()),
            landmark: None,
            area: Some("Indiranagar".to_string()),
            district: Some("Bangalore Urban".to_string()),
            city: Some("Bengaluru".to_string()),
            state: Some("Karnataka".to_string()),
            postal_code: Some("560038".to_string()),
            country: Some("India".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::payload;
    use super::*;
    use crate::database::connection::test_pool;
    use crate::models::user::Role;
    use crate::services::user_service::{testing::seed_user, UserService};

    #[test]
    fn valid_payload_passes() {
        let fields = validate_address(&payload(), None).unwrap();
        assert_eq!(fields.city, "Bengaluru");
        assert_eq!(fields.landmark, None);
    }

    #[test]
    fn postal_code_rules() {
        let mut p = payload();
        p.postal_code = None;
        assert_eq!(validate_address(&p, None).unwrap_err(), vec![("postal_code", "EA008")]);

        p.postal_code = Some("56-38".to_string());
        assert_eq!(validate_address(&p, None).unwrap_err(), vec![("postal_code", "EA005")]);

        p.postal_code = Some("123".to_string());
        assert_eq!(validate_address(&p, None).unwrap_err(), vec![("postal_code", "EA006")]);
    }

    #[test]
    fn required_and_charset_rules() {
        let mut p = payload();
        p.city = Some("   ".to_string());
        p.street = Some("Main <script>".to_string());
        p.landmark = Some("Near #5".to_string());

        let errors = validate_address(&p, None).unwrap_err();
        assert!(errors.contains(&("city", "EA004")));
        assert!(errors.contains(&("street", "EA003")));
        assert!(errors.contains(&("landmark", "EA003")));
    }

    #[tokio::test]
    async fn addresses_are_scoped_to_their_owner() {
        let db = test_pool().await;
        let users = UserService::new(db.clone());
        let owner = seed_user(&users, "owner", "owner@example.com", Role::User).await;
        let other = seed_user(&users, "other", "other@example.com", Role::User).await;

        let addresses = AddressService::new(db);
        let created = addresses
            .create(owner.id, validate_address(&payload(), None).unwrap())
            .await
            .unwrap();

        assert!(addresses.get(created.id, other.id).await.unwrap().is_none());
        assert_eq!(
            addresses.first_for_user(owner.id).await.unwrap().unwrap().id,
            created.id
        );

        let mut change = AddressPayload::default();
        change.city = Some("Mysuru".to_string());
        let fields = validate_address(&change, Some(&created)).unwrap();

        assert!(addresses.update(created.id, other.id, fields.clone()).await.unwrap().is_none());
        let updated = addresses.update(created.id, owner.id, fields).await.unwrap().unwrap();
        assert_eq!(updated.city, "Mysuru");
        assert_eq!(updated.street, "MG Road");
    }
}
