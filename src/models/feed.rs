use crate::schema::*;
use diesel::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, PartialEq)]
#[diesel(table_name = feeds)]
pub struct Feed {
    /// Opaque 6-char hex token, generated on first subscribe.
    pub id: String,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, Insertable)]
#[diesel(table_name = feeds)]
pub struct NewFeed<'a> {
    pub id: String,
    pub url: &'a str,
    pub title: &'a str,
}

/// Short opaque identifier, 3 random bytes as lowercase hex.
fn generate_id() -> String {
    let bytes: [u8; 3] = rand::thread_rng().gen();
    hex::encode(bytes)
}

impl Feed {
    /// Inserts the feed under a fresh id, or refreshes the title when the
    /// URL is already known. The id of an existing feed never changes.
    pub fn upsert(conn: &mut SqliteConnection, feed_url: &str, title: &str) -> QueryResult<Feed> {
        use crate::schema::feeds::dsl::{feeds, title as title_col, url as url_col};

        let new_feed = NewFeed {
            id: generate_id(),
            url: feed_url,
            title,
        };
        diesel::insert_into(feeds)
            .values(&new_feed)
            .on_conflict(url_col)
            .do_update()
            .set(title_col.eq(title))
            .execute(conn)?;

        feeds.filter(url_col.eq(feed_url)).first(conn)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, feed_id: &str) -> QueryResult<Option<Feed>> {
        use crate::schema::feeds::dsl::feeds;
        feeds.find(feed_id).first::<Feed>(conn).optional()
    }

    pub fn get_by_url(conn: &mut SqliteConnection, feed_url: &str) -> QueryResult<Option<Feed>> {
        use crate::schema::feeds::dsl::{feeds, url as url_col};
        feeds
            .filter(url_col.eq(feed_url))
            .first::<Feed>(conn)
            .optional()
    }

    /// Feeds a channel is subscribed to, ordered by title.
    pub fn for_channel(conn: &mut SqliteConnection, channel: &str) -> QueryResult<Vec<Feed>> {
        feeds::table
            .inner_join(channels::table)
            .filter(channels::channel_id.eq(channel))
            .order(feeds::title.asc())
            .select(feeds::all_columns)
            .load::<Feed>(conn)
    }
}
