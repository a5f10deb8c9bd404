use super::types::PollerConfig;
use crate::fetch::FeedFetch;
use crate::notify::Notify;
use crate::podcast::Episode;
use crate::store::PodcastStore;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to the running poll scheduler.
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawns the control loop. The first cycle fires one full period after
    /// start, then every `period` thereafter.
    pub fn start(
        store: Arc<PodcastStore>,
        fetcher: Arc<dyn FeedFetch + Send + Sync>,
        notifier: Arc<dyn Notify + Send + Sync>,
        config: PollerConfig,
    ) -> Poller {
        let handle = tokio::spawn(run(store, fetcher, notifier, config));
        Poller { handle }
    }

    /// Halts future cycles. Fetches already in flight run to completion;
    /// their store calls fail once the store has been closed.
    pub fn stop(&self) {
        self.handle.abort();
        log::info!("Poll scheduler stopped");
    }
}

async fn run(
    store: Arc<PodcastStore>,
    fetcher: Arc<dyn FeedFetch + Send + Sync>,
    notifier: Arc<dyn Notify + Send + Sync>,
    config: PollerConfig,
) {
    let mut timer = tokio::time::interval(config.period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Consume the immediate first tick so cycles start one period in.
    timer.tick().await;

    let cycle_active = Arc::new(AtomicBool::new(false));
    let remaining = Arc::new(AtomicUsize::new(0));

    loop {
        timer.tick().await;

        if config.feeds.is_empty() {
            log::debug!("No feeds configured, nothing to poll");
            continue;
        }

        // Single-flight: a tick that lands while the previous cycle's
        // fetches are outstanding is dropped, not queued.
        if cycle_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Previous poll cycle still running, skipping this tick");
            continue;
        }

        log::debug!("Polling {} feeds", config.feeds.len());
        remaining.store(config.feeds.len(), Ordering::SeqCst);

        for (index, url) in config.feeds.iter().enumerate() {
            let delay = config.stagger * index as u32;
            let url = url.clone();
            let store = Arc::clone(&store);
            let fetcher = Arc::clone(&fetcher);
            let notifier = Arc::clone(&notifier);
            let channels = config.channels.clone();
            let cycle_active = Arc::clone(&cycle_active);
            let remaining = Arc::clone(&remaining);

            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let result = fetcher.fetch(&url).await;

                // Completion accounting happens before result handling so a
                // slow notify or store write cannot wedge the guard open.
                // Errors count too.
                if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                    cycle_active.store(false, Ordering::SeqCst);
                    log::debug!("Poll cycle complete");
                }

                match result {
                    Ok(episode) => {
                        handle_episode(&store, notifier.as_ref(), &url, episode, &channels).await
                    }
                    Err(e) => log::warn!("Error fetching feed {}: {}", url, e),
                }
            });
        }
    }
}

/// Dedup-checks one fetched episode and announces it when new.
async fn handle_episode(
    store: &PodcastStore,
    notifier: &(dyn Notify + Send + Sync),
    url: &str,
    episode: Episode,
    channels: &[String],
) {
    match store.is_posted(url, &episode.guid) {
        Ok(true) => {
            log::debug!("Feed {} episode {} already posted", url, episode.guid);
            return;
        }
        Ok(false) => {}
        Err(e) => {
            log::warn!("Error checking posted state for feed {}: {}", url, e);
            return;
        }
    }

    log::info!("New episode {} on feed {}", episode.guid, url);

    // Pin the feed row and refresh its title before announcing. A feed that
    // arrives via configuration alone has no row until now, and marking
    // needs one.
    if let Err(e) = store.track_feed(url, &episode.show_title) {
        log::warn!("Error tracking feed {}: {}", url, e);
        return;
    }

    // Configured broadcast channels show up like any API subscription.
    for channel in channels {
        if let Err(e) = store.subscribe(url, &episode.show_title, channel) {
            log::warn!("Error subscribing channel {} to feed {}: {}", channel, url, e);
            return;
        }
    }

    let destinations = match store.channels_for_feed(url) {
        Ok(destinations) => destinations,
        Err(e) => {
            log::warn!("Error listing channels for feed {}: {}", url, e);
            return;
        }
    };

    if notifier.is_latest(&episode).await {
        log::debug!(
            "Episode {} is already the latest delivered for feed {}, skipping send",
            episode.guid,
            url
        );
    } else {
        for destination in &destinations {
            if let Err(e) = notifier.send(&episode, destination).await {
                log::warn!("Error announcing to channel {}: {}", destination, e);
            }
        }
    }

    if let Err(e) = store.mark_posted(url, &episode.guid) {
        log::warn!("Error marking episode {} posted for feed {}: {}", episode.guid, url, e);
    }
}
