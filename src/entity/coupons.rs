use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    /// Hundredths of a percent: 1250 is 12.50%.
    pub discount_basis_points: i32,
    pub valid_from: DateTimeWithTimeZone,
    pub valid_to: DateTimeWithTimeZone,
    pub active: bool,
}

impl Model {
    /// Active and `now` inside the inclusive `[valid_from, valid_to]` window.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.active && self.valid_from <= now && now <= self.valid_to
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn coupon(active: bool, from: DateTime<Utc>, to: DateTime<Utc>) -> Model {
        Model {
            id: Uuid::new_v4(),
            code: "SPRING".into(),
            discount_basis_points: 1000,
            valid_from: from.into(),
            valid_to: to.into(),
            active,
        }
    }

    #[test]
    fn boundaries_are_inclusive() {
        let from = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap();
        let c = coupon(true, from, to);

        assert!(c.is_valid(from));
        assert!(c.is_valid(to));
        assert!(c.is_valid(from + Duration::days(10)));
    }

    #[test]
    fn outside_window_is_invalid() {
        let from = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap();
        let c = coupon(true, from, to);

        assert!(!c.is_valid(from - Duration::seconds(1)));
        assert!(!c.is_valid(to + Duration::seconds(1)));
    }

    #[test]
    fn inactive_coupon_is_never_valid() {
        let from = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap();
        let c = coupon(false, from, to);

        assert!(!c.is_valid(from + Duration::days(1)));
    }
}
