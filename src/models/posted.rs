use super::feed::Feed;
use crate::schema::*;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Durable record of every episode guid ever announced for a feed.
///
/// The guid list is stored as a single comma-delimited column so the row
/// can be replaced atomically with `replace_into`.
#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Insertable, Associations, PartialEq)]
#[diesel(belongs_to(Feed))]
#[diesel(table_name = posted)]
#[diesel(primary_key(feed_id))]
pub struct PostedRecord {
    pub feed_id: String,
    pub guids: String,
}

impl PostedRecord {
    pub fn for_feed(conn: &mut SqliteConnection, feed: &str) -> QueryResult<Option<PostedRecord>> {
        posted::table.find(feed).first(conn).optional()
    }

    /// Writes the full guid list for a feed, creating the row if absent.
    pub fn replace(conn: &mut SqliteConnection, feed: &str, guid_list: &[String]) -> QueryResult<usize> {
        let record = PostedRecord {
            feed_id: feed.to_string(),
            guids: join_guids(guid_list),
        };
        diesel::replace_into(posted::table).values(&record).execute(conn)
    }

    /// Empties every feed's guid list while keeping the rows themselves.
    pub fn clear_all(conn: &mut SqliteConnection) -> QueryResult<usize> {
        use crate::schema::posted::dsl::*;
        diesel::update(posted).set(guids.eq("")).execute(conn)
    }

    /// Every tracked feed URL with its posted guids, present or not.
    pub fn all_by_feed_url(conn: &mut SqliteConnection) -> QueryResult<Vec<(String, Vec<String>)>> {
        let rows: Vec<(String, Option<String>)> = feeds::table
            .left_join(posted::table)
            .select((feeds::url, posted::guids.nullable()))
            .load(conn)?;
        Ok(rows
            .into_iter()
            .map(|(url, guids)| (url, split_guids(guids.as_deref().unwrap_or(""))))
            .collect())
    }

    pub fn guid_list(&self) -> Vec<String> {
        split_guids(&self.guids)
    }
}

pub fn split_guids(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_guids(guids: &[String]) -> String {
    guids.join(",")
}
