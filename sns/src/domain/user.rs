use crate::search::{Decode, DecodeContext, Fields};
use crate::Result;
use serde::Serialize;

/// Snapshot of a user profile from the monthly `user-*` shards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: String,
    pub user_screen_name: String,
    pub user_name: String,
    pub user_description: String,
    pub user_image_profile: String,
    pub verified: bool,
    pub follower_count: u64,
    pub status_count: u64,
    pub favorite_count: u64,
    pub follow_count: u64,
    pub list_count: u64,
    pub sr_score: f64,
    pub created_at: String,
}

impl Decode for User {
    const RECORD: &'static str = "user";

    fn decode(hit: &Fields<'_>, _ctx: &DecodeContext) -> Result<Self> {
        Ok(Self {
            user_id: hit.required("_source.id")?,
            user_screen_name: hit.required("_source.screen_name")?,
            user_name: hit.required("_source.name")?,
            user_description: hit.optional("_source.description"),
            user_image_profile: hit.required("_source.profile_image_url_https")?,
            verified: hit.required("_source.verified")?,
            follower_count: hit.required("_source.followers_count")?,
            status_count: hit.required("_source.statuses_count")?,
            favorite_count: hit.required("_source.favourites_count")?,
            follow_count: hit.required("_source.friends_count")?,
            list_count: hit.required("_source.listed_count")?,
            sr_score: hit.optional("_source.sr_score"),
            // user documents keep the engine's timestamp as-is
            created_at: hit.required("_source.created_at")?,
        })
    }
}
