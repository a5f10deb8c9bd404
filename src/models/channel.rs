use super::feed::Feed;
use crate::schema::*;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One (feed, destination channel) subscription pair.
#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Associations, PartialEq)]
#[diesel(belongs_to(Feed))]
#[diesel(table_name = channels)]
pub struct Channel {
    pub id: i32,
    pub feed_id: String,
    pub channel_id: String,
}

#[derive(Debug, Serialize, Deserialize, Insertable)]
#[diesel(table_name = channels)]
pub struct NewChannel<'a> {
    pub feed_id: &'a str,
    pub channel_id: &'a str,
}

impl<'a> NewChannel<'a> {
    /// Inserts the pair; an already-present pair is left alone.
    pub fn insert_or_ignore(&self, conn: &mut SqliteConnection) -> QueryResult<usize> {
        diesel::insert_into(channels::table)
            .values(self)
            .on_conflict_do_nothing()
            .execute(conn)
    }
}

impl Channel {
    /// Removes exactly one subscription pair. Returns the number of rows
    /// deleted, zero when the pair did not exist.
    pub fn remove(conn: &mut SqliteConnection, feed: &str, channel: &str) -> QueryResult<usize> {
        use crate::schema::channels::dsl::{channel_id, channels, feed_id};
        diesel::delete(
            channels
                .filter(feed_id.eq(feed))
                .filter(channel_id.eq(channel)),
        )
        .execute(conn)
    }

    /// Channel ids subscribed to a feed URL, in insertion order.
    pub fn ids_for_feed_url(conn: &mut SqliteConnection, feed_url: &str) -> QueryResult<Vec<String>> {
        channels::table
            .inner_join(feeds::table)
            .filter(feeds::url.eq(feed_url))
            .order(channels::id.asc())
            .select(channels::channel_id)
            .load::<String>(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::get_test_db_connection;

    #[test]
    fn test_duplicate_pair_is_ignored() {
        let mut conn = get_test_db_connection();
        let feed = Feed::upsert(&mut conn, "https://example.com/rss", "Show").unwrap();
        let pair = NewChannel {
            feed_id: &feed.id,
            channel_id: "chan-1",
        };
        assert_eq!(pair.insert_or_ignore(&mut conn).unwrap(), 1);
        assert_eq!(pair.insert_or_ignore(&mut conn).unwrap(), 0);
        assert_eq!(
            Channel::ids_for_feed_url(&mut conn, "https://example.com/rss").unwrap(),
            vec!["chan-1"]
        );
    }

    #[test]
    fn test_ids_for_feed_url_keeps_insertion_order() {
        let mut conn = get_test_db_connection();
        let feed = Feed::upsert(&mut conn, "https://example.com/rss", "Show").unwrap();
        for channel in ["z-chan", "a-chan", "m-chan"] {
            NewChannel {
                feed_id: &feed.id,
                channel_id: channel,
            }
            .insert_or_ignore(&mut conn)
            .unwrap();
        }
        assert_eq!(
            Channel::ids_for_feed_url(&mut conn, "https://example.com/rss").unwrap(),
            vec!["z-chan", "a-chan", "m-chan"]
        );
    }

    #[test]
    fn test_remove_absent_pair_is_noop() {
        let mut conn = get_test_db_connection();
        let feed = Feed::upsert(&mut conn, "https://example.com/rss", "Show").unwrap();
        assert_eq!(Channel::remove(&mut conn, &feed.id, "chan-1").unwrap(), 0);
    }
}
