//! Companion-symmetry maintainer
//!
//! The companion relation is a mutual, at-most-one, opposite-gender pairing
//! between two persons. Both sides of the relation are always written in
//! one transaction, so a crash can never leave the link half-made.
//!
//! Invariants enforced here:
//! - a person is never their own companion;
//! - paired persons have opposite genders;
//! - if A points at B then B points at A, and nobody else points at either.

use crate::error::{AppError, Result};
use crate::models::Person;
use sqlx::{Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

/// Validate a prospective pairing before any row is written.
///
/// Failures surface as inline companion field errors and abort the save.
pub fn validate_pair(person: &Person, companion: &Person) -> Result<()> {
    if person.id == companion.id {
        return Err(AppError::Validation(
            "companion: cannot pair a person with themselves".to_string(),
        ));
    }
    if person.gender == companion.gender {
        return Err(AppError::Validation(
            "companion: companion must be of the opposite gender".to_string(),
        ));
    }
    Ok(())
}

async fn fetch_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Person> {
    let person = sqlx::query_as::<_, Person>(
        "SELECT id, title, slug, content, photo, status, gender, \
         companion_id, category_id, author_id, created_at, updated_at \
         FROM persons WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    person.ok_or_else(|| AppError::NotFound(format!("person {} not found", id)))
}

/// Link `a` and `b` as companions, both directions, in the caller's
/// transaction.
///
/// Any third person currently pointing at either side is unlinked first,
/// so reassigning a companion never leaves a stale back-pointer behind.
/// Returns every person id whose row changed (for cache invalidation).
pub async fn set_companion(
    tx: &mut Transaction<'_, Postgres>,
    a_id: Uuid,
    b_id: Uuid,
) -> Result<Vec<Uuid>> {
    let a = fetch_for_update(tx, a_id).await?;
    let b = fetch_for_update(tx, b_id).await?;
    validate_pair(&a, &b)?;

    // Unwind old partners of both sides.
    let unlinked = sqlx::query_as::<_, (Uuid,)>(
        "UPDATE persons SET companion_id = NULL, updated_at = NOW() \
         WHERE companion_id IN ($1, $2) AND id NOT IN ($1, $2) \
         RETURNING id",
    )
    .bind(a_id)
    .bind(b_id)
    .fetch_all(&mut **tx)
    .await?;

    sqlx::query("UPDATE persons SET companion_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(a_id)
        .bind(b_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("UPDATE persons SET companion_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(b_id)
        .bind(a_id)
        .execute(&mut **tx)
        .await?;

    debug!(%a_id, %b_id, "companion link established");

    let mut touched = vec![a_id, b_id];
    touched.extend(unlinked.into_iter().map(|(id,)| id));
    Ok(touched)
}

/// Clear `a`'s companion and the back-pointer of whoever pointed at `a`,
/// in the caller's transaction.
///
/// Returns every person id whose row changed.
pub async fn clear_companion(
    tx: &mut Transaction<'_, Postgres>,
    a_id: Uuid,
) -> Result<Vec<Uuid>> {
    // Make sure the row exists and hold its lock for the duration.
    let _a = fetch_for_update(tx, a_id).await?;

    let unlinked = sqlx::query_as::<_, (Uuid,)>(
        "UPDATE persons SET companion_id = NULL, updated_at = NOW() \
         WHERE companion_id = $1 AND id <> $1 \
         RETURNING id",
    )
    .bind(a_id)
    .fetch_all(&mut **tx)
    .await?;

    sqlx::query(
        "UPDATE persons SET companion_id = NULL, updated_at = NOW() \
         WHERE id = $1 AND companion_id IS NOT NULL",
    )
    .bind(a_id)
    .execute(&mut **tx)
    .await?;

    debug!(%a_id, "companion link cleared");

    let mut touched = vec![a_id];
    touched.extend(unlinked.into_iter().map(|(id,)| id));
    Ok(touched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Status};
    use chrono::Utc;

    fn person(gender: Gender) -> Person {
        Person {
            id: Uuid::new_v4(),
            title: "Test".to_string(),
            slug: format!("test-{}", Uuid::new_v4()),
            content: String::new(),
            photo: None,
            status: Status::Published,
            gender,
            companion_id: None,
            category_id: Uuid::new_v4(),
            author_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_self_pairing_rejected() {
        let a = person(Gender::Male);
        let err = validate_pair(&a, &a).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.starts_with("companion:")));
    }

    #[test]
    fn test_same_gender_rejected() {
        let a = person(Gender::Female);
        let b = person(Gender::Female);
        let err = validate_pair(&a, &b).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("opposite gender")));
    }

    #[test]
    fn test_opposite_gender_accepted() {
        let a = person(Gender::Male);
        let b = person(Gender::Female);
        assert!(validate_pair(&a, &b).is_ok());
    }
}
