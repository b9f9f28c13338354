use super::TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Daily follower/activity snapshot row from the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Transition {
    pub user_id: u64,
    pub follower_count: u64,
    pub friend_count: u64,
    pub listed_count: u64,
    pub favorite_count: u64,
    pub status_count: u64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: NaiveDateTime,
}

fn serialize_timestamp<S: Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_serializes_timestamp_in_wire_layout() {
        let row = Transition {
            user_id: 42,
            follower_count: 10,
            friend_count: 2,
            listed_count: 0,
            favorite_count: 7,
            status_count: 99,
            created_at: NaiveDate::from_ymd_opt(2023, 2, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["created_at"], "2023-02-01 09:30:00");
        assert_eq!(json["follower_count"], 10);
    }
}
