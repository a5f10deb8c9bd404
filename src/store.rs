use crate::cache::GuidCache;
use crate::models::channel::{Channel, NewChannel};
use crate::models::feed::Feed;
use crate::models::posted::PostedRecord;
use crate::{DbPool, MIGRATIONS};
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::SqliteConnection;
use diesel_migrations::MigrationHarness;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;

type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store is closed")]
    Closed,
    #[error("could not get a database connection: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("feed is not tracked: {0}")]
    UnknownFeed(String),
}

/// Durable posted-state plus the in-memory dedup cache, behind one handle.
///
/// The cache holds the most recent guids per feed url and answers the
/// scheduler's dedup checks; the database keeps the full append-only history.
/// All methods are synchronous. The cache mutex doubles as the posted-state
/// write lock: every compound read-merge-replace runs under it, so a mark
/// racing a reset cannot write a stale guid set back. Connections are
/// acquired before the mutex, never under it.
pub struct PodcastStore {
    pool: DbPool,
    cache: Mutex<GuidCache>,
    closed: AtomicBool,
}

impl PodcastStore {
    pub fn new(pool: DbPool, cache_capacity: usize) -> Self {
        PodcastStore {
            pool,
            cache: Mutex::new(GuidCache::new(cache_capacity)),
            closed: AtomicBool::new(false),
        }
    }

    fn conn(&self) -> Result<PooledConn, StoreError> {
        self.ensure_open()?;
        Ok(self.pool.get()?)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Runs any pending migrations. Idempotent.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Rebuilds the cache from the database: every tracked feed url becomes
    /// a key, populated oldest-first from its durable guid list.
    pub fn load_cache(&self) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let mut cache = self.cache.lock().unwrap();
        Self::refill_cache(&mut conn, &mut cache)
    }

    fn refill_cache(conn: &mut SqliteConnection, cache: &mut GuidCache) -> Result<(), StoreError> {
        let rows = PostedRecord::all_by_feed_url(conn)?;
        cache.clear();
        for (url, guids) in rows {
            cache.track(&url);
            for guid in &guids {
                cache.add(&url, guid);
            }
        }
        Ok(())
    }

    /// Tracks a feed url without subscribing anyone: the feed row is created
    /// on first sight (title refreshed after) and its durable guids are
    /// copied into the cache, so a re-added feed does not re-announce old
    /// episodes.
    pub fn track_feed(&self, url: &str, title: &str) -> Result<Feed, StoreError> {
        let mut conn = self.conn()?;
        self.track_feed_on(&mut conn, url, title)
    }

    fn track_feed_on(
        &self,
        conn: &mut SqliteConnection,
        url: &str,
        title: &str,
    ) -> Result<Feed, StoreError> {
        let feed = Feed::upsert(conn, url, title)?;

        // The lock spans the durable read and the cache fill so a concurrent
        // reset cannot slip in between.
        let mut cache = self.cache.lock().unwrap();
        let guids = PostedRecord::for_feed(conn, &feed.id)?
            .map(|record| record.guid_list())
            .unwrap_or_default();
        cache.track(url);
        for guid in &guids {
            cache.add(url, guid);
        }
        Ok(feed)
    }

    /// Subscribes a channel to a feed url, tracking the feed first.
    /// Idempotent for an existing (feed, channel) pair.
    pub fn subscribe(&self, url: &str, title: &str, channel: &str) -> Result<Feed, StoreError> {
        let mut conn = self.conn()?;
        let feed = self.track_feed_on(&mut conn, url, title)?;

        NewChannel {
            feed_id: &feed.id,
            channel_id: channel,
        }
        .insert_or_ignore(&mut conn)?;
        Ok(feed)
    }

    /// Removes one (feed, channel) pair. Returns false when the pair was not
    /// subscribed.
    pub fn unsubscribe(&self, feed_id: &str, channel: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let deleted = Channel::remove(&mut conn, feed_id, channel)?;
        Ok(deleted > 0)
    }

    pub fn feed_by_id(&self, feed_id: &str) -> Result<Option<Feed>, StoreError> {
        let mut conn = self.conn()?;
        Ok(Feed::get_by_id(&mut conn, feed_id)?)
    }

    /// Feeds a channel is subscribed to, ordered by title.
    pub fn feeds_for_channel(&self, channel: &str) -> Result<Vec<Feed>, StoreError> {
        let mut conn = self.conn()?;
        Ok(Feed::for_channel(&mut conn, channel)?)
    }

    /// Channel ids subscribed to a feed url, in subscription order.
    pub fn channels_for_feed(&self, url: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn()?;
        Ok(Channel::ids_for_feed_url(&mut conn, url)?)
    }

    /// Records an announced guid. The cache is updated before the database
    /// so dedup checks see the guid as soon as possible. The durable list
    /// only ever grows; marking an already-present guid changes nothing.
    pub fn mark_posted(&self, url: &str, guid: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;

        // Held across the read-merge-replace below so a concurrent reset
        // cannot interleave between the read and the write.
        let mut cache = self.cache.lock().unwrap();
        cache.add(url, guid);

        let feed = Feed::get_by_url(&mut conn, url)?
            .ok_or_else(|| StoreError::UnknownFeed(url.to_string()))?;
        let mut guids = PostedRecord::for_feed(&mut conn, &feed.id)?
            .map(|record| record.guid_list())
            .unwrap_or_default();
        if !guids.iter().any(|g| g == guid) {
            guids.push(guid.to_string());
            PostedRecord::replace(&mut conn, &feed.id, &guids)?;
        }
        Ok(())
    }

    /// Cache-only dedup check.
    pub fn is_posted(&self, url: &str, guid: &str) -> Result<bool, StoreError> {
        self.ensure_open()?;
        Ok(self.cache.lock().unwrap().has(url, guid))
    }

    /// Cached guids for a feed url, oldest first.
    pub fn posted_guids(&self, url: &str) -> Result<Vec<String>, StoreError> {
        self.ensure_open()?;
        Ok(self.cache.lock().unwrap().get(url))
    }

    /// Forgets every announced guid while keeping feeds tracked. After this
    /// every known feed url has an empty posted collection. The clear and
    /// the cache rebuild run under the same lock marking takes.
    pub fn reset_all(&self) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let mut cache = self.cache.lock().unwrap();
        PostedRecord::clear_all(&mut conn)?;
        Self::refill_cache(&mut conn, &mut cache)
    }

    pub fn tracked_feed_count(&self) -> Result<usize, StoreError> {
        self.ensure_open()?;
        Ok(self.cache.lock().unwrap().count())
    }

    /// Fails every subsequent operation with [`StoreError::Closed`]. Calls
    /// already past the closed check run to completion.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
