use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use sophia_shared::errors::{AppError, AppResult, ErrorCode};
use sophia_shared::types::business::BusinessStatus;
use sophia_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{Business, BusinessChanges, NewBusiness};
use crate::schema::{
    business_metrics, businesses, conversion_events, deployments, marketing_campaigns,
};

/// Ownership gate used by every owner-scoped operation. A mismatch is an
/// owner error, deliberately distinct from not-found.
pub fn ensure_owner(business: &Business, owner_id: Uuid) -> AppResult<()> {
    if business.owner_id != owner_id {
        return Err(AppError::new(
            ErrorCode::NotBusinessOwner,
            "business belongs to another account",
        ));
    }
    Ok(())
}

/// Fetch by id without an owner filter; unknown ids are `None`, not errors.
pub fn get(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Business>> {
    let business = businesses::table
        .find(id)
        .first::<Business>(conn)
        .optional()?;
    Ok(business)
}

/// Fetch by id and enforce ownership.
pub fn get_owned(conn: &mut PgConnection, id: Uuid, owner_id: Uuid) -> AppResult<Business> {
    let business = get(conn, id)?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound, "business not found"))?;
    ensure_owner(&business, owner_id)?;
    Ok(business)
}

/// Create a business. Names are unique per owner; new records always start
/// in PLANNING regardless of what the caller sent.
pub fn create(conn: &mut PgConnection, mut new_business: NewBusiness) -> AppResult<Business> {
    let collision: i64 = businesses::table
        .filter(businesses::owner_id.eq(new_business.owner_id))
        .filter(businesses::name.eq(&new_business.name))
        .count()
        .get_result(conn)?;

    if collision > 0 {
        return Err(AppError::new(
            ErrorCode::BusinessNameTaken,
            format!("a business named '{}' already exists", new_business.name),
        ));
    }

    new_business.status = BusinessStatus::Planning.to_string();

    let business: Business = diesel::insert_into(businesses::table)
        .values(&new_business)
        .get_result(conn)?;

    tracing::info!(business_id = %business.id, owner_id = %business.owner_id, "business created");

    Ok(business)
}

pub fn list(
    conn: &mut PgConnection,
    owner_id: Uuid,
    params: &PaginationParams,
) -> AppResult<Paginated<Business>> {
    let total: i64 = businesses::table
        .filter(businesses::owner_id.eq(owner_id))
        .count()
        .get_result(conn)?;

    let items: Vec<Business> = businesses::table
        .filter(businesses::owner_id.eq(owner_id))
        .order(businesses::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load(conn)?;

    Ok(Paginated::new(items, total as u64, params))
}

pub fn update(
    conn: &mut PgConnection,
    id: Uuid,
    owner_id: Uuid,
    mut changes: BusinessChanges,
) -> AppResult<Business> {
    let existing = get_owned(conn, id, owner_id)?;

    if let Some(ref new_name) = changes.name {
        if *new_name != existing.name {
            let collision: i64 = businesses::table
                .filter(businesses::owner_id.eq(owner_id))
                .filter(businesses::name.eq(new_name))
                .filter(businesses::id.ne(id))
                .count()
                .get_result(conn)?;
            if collision > 0 {
                return Err(AppError::new(
                    ErrorCode::BusinessNameTaken,
                    format!("a business named '{new_name}' already exists"),
                ));
            }
        }
    }

    changes.updated_at = Some(Utc::now());

    let business: Business = diesel::update(businesses::table.find(id))
        .set(&changes)
        .get_result(conn)?;

    Ok(business)
}

pub fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    owner_id: Uuid,
    status: BusinessStatus,
) -> AppResult<Business> {
    get_owned(conn, id, owner_id)?;

    let business: Business = diesel::update(businesses::table.find(id))
        .set((
            businesses::status.eq(status.to_string()),
            businesses::updated_at.eq(Utc::now()),
        ))
        .get_result(conn)?;

    tracing::info!(business_id = %id, status = %status, "business status changed");

    Ok(business)
}

/// Delete a business and everything hanging off it: metrics, conversion
/// events, campaigns, deployments.
pub fn delete(conn: &mut PgConnection, id: Uuid, owner_id: Uuid) -> AppResult<()> {
    get_owned(conn, id, owner_id)?;

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::delete(business_metrics::table.filter(business_metrics::business_id.eq(id)))
            .execute(conn)?;
        diesel::delete(conversion_events::table.filter(conversion_events::business_id.eq(id)))
            .execute(conn)?;
        diesel::delete(marketing_campaigns::table.filter(marketing_campaigns::business_id.eq(id)))
            .execute(conn)?;
        diesel::delete(deployments::table.filter(deployments::business_id.eq(id)))
            .execute(conn)?;
        diesel::delete(businesses::table.find(id)).execute(conn)?;
        Ok(())
    })?;

    tracing::info!(business_id = %id, "business deleted");

    Ok(())
}

/// Case-insensitive substring match over name, description, and industry.
pub fn matches_query(business: &Business, query: &str) -> bool {
    let q = query.to_lowercase();
    business.name.to_lowercase().contains(&q)
        || business
            .description
            .as_deref()
            .map(|d| d.to_lowercase().contains(&q))
            .unwrap_or(false)
        || business.industry.to_lowercase().contains(&q)
}

pub fn search(
    conn: &mut PgConnection,
    owner_id: Option<Uuid>,
    query: &str,
) -> AppResult<Vec<Business>> {
    let mut scope = businesses::table.into_boxed();
    if let Some(owner) = owner_id {
        scope = scope.filter(businesses::owner_id.eq(owner));
    }

    let rows: Vec<Business> = scope.order(businesses::created_at.desc()).load(conn)?;

    Ok(rows.into_iter().filter(|b| matches_query(b, query)).collect())
}

#[derive(Debug, serde::Serialize)]
pub struct BusinessStatistics {
    pub total: i64,
    pub planning: i64,
    pub developing: i64,
    pub active: i64,
    pub paused: i64,
    pub closed: i64,
}

pub fn statistics(conn: &mut PgConnection, owner_id: Option<Uuid>) -> AppResult<BusinessStatistics> {
    let counts: Vec<(String, i64)> = match owner_id {
        Some(owner) => businesses::table
            .filter(businesses::owner_id.eq(owner))
            .group_by(businesses::status)
            .select((businesses::status, diesel::dsl::count_star()))
            .load(conn)?,
        None => businesses::table
            .group_by(businesses::status)
            .select((businesses::status, diesel::dsl::count_star()))
            .load(conn)?,
    };

    let count_of = |status: BusinessStatus| -> i64 {
        counts
            .iter()
            .find(|(s, _)| *s == status.to_string())
            .map(|(_, c)| *c)
            .unwrap_or(0)
    };

    let stats = BusinessStatistics {
        total: counts.iter().map(|(_, c)| c).sum(),
        planning: count_of(BusinessStatus::Planning),
        developing: count_of(BusinessStatus::Developing),
        active: count_of(BusinessStatus::Active),
        paused: count_of(BusinessStatus::Paused),
        closed: count_of(BusinessStatus::Closed),
    };

    Ok(stats)
}

/// Unscoped ACTIVE list for the monitoring loop; not exposed to users.
pub fn active_businesses(conn: &mut PgConnection) -> AppResult<Vec<Business>> {
    let rows: Vec<Business> = businesses::table
        .filter(businesses::status.eq(BusinessStatus::Active.to_string()))
        .load(conn)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn business(owner: Uuid) -> Business {
        Business {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "Inbox Zero Club".to_string(),
            description: Some("Email productivity coaching".to_string()),
            industry: "Productivity".to_string(),
            monthly_price: 29.0,
            currency: "USD".to_string(),
            status: "PLANNING".to_string(),
            website_url: None,
            repo_url: None,
            landing_url: None,
            analytics_property_id: None,
            analytics_measurement_id: None,
            analytics_stream_id: None,
            stripe_product_id: None,
            stripe_price_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_mismatch_is_rejected() {
        let owner = Uuid::new_v4();
        let b = business(owner);

        assert!(ensure_owner(&b, owner).is_ok());

        let err = ensure_owner(&b, Uuid::new_v4()).unwrap_err();
        match err {
            AppError::Known { code, .. } => assert_eq!(code, ErrorCode::NotBusinessOwner),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn search_matches_any_text_field_case_insensitively() {
        let b = business(Uuid::new_v4());

        assert!(matches_query(&b, "inbox"));
        assert!(matches_query(&b, "EMAIL"));
        assert!(matches_query(&b, "productivity"));
        assert!(!matches_query(&b, "bakery"));
    }

    #[test]
    fn search_handles_missing_description() {
        let mut b = business(Uuid::new_v4());
        b.description = None;
        assert!(!matches_query(&b, "email"));
        assert!(matches_query(&b, "inbox"));
    }
}
