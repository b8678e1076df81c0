//! Quote of the day and today's challenge.
//!
//! Selection is a pure function of the calendar day ([`pick_for_date`]). The
//! "already chosen today" record, and the challenge completion flag with it,
//! lives in a [`PickStore`] supplied by the caller: SQLite in the server, an
//! in-memory map in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Key-value storage for per-user daily picks.
#[async_trait]
pub trait PickStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Process-local [`PickStore`]. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryPickStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryPickStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PickStore for MemoryPickStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
}

pub const QUOTES: &[Quote] = &[
    Quote {
        text: "Self-care is not self-indulgence, it is self-preservation.",
        author: "Audre Lorde",
    },
    Quote {
        text: "The strongest people are those who win battles we know nothing about.",
        author: "Unknown",
    },
    Quote {
        text: "Recovery is not one and done. It is a lifelong journey that takes place one day, one step at a time.",
        author: "Unknown",
    },
    Quote {
        text: "Be proud of yourself for how hard you're trying.",
        author: "Unknown",
    },
    Quote {
        text: "There is hope, even when your brain tells you there isn't.",
        author: "John Green",
    },
    Quote {
        text: "Mental health is not a destination, but a process.",
        author: "Noam Shpancer",
    },
];

pub const CHALLENGES: &[Challenge] = &[
    Challenge {
        id: 1,
        title: "Smile at 3 strangers",
        description: "A small smile can lift someone else's day and your own.",
    },
    Challenge {
        id: 2,
        title: "Compliment 2 people",
        description: "Say something genuine and notice how it feels.",
    },
    Challenge {
        id: 3,
        title: "Take a 15-minute walk outside",
        description: "Time outdoors lowers stress and clears the head.",
    },
    Challenge {
        id: 4,
        title: "Try a 5-minute meditation",
        description: "Sit, breathe and let your thoughts settle.",
    },
    Challenge {
        id: 5,
        title: "Write down 3 things you're grateful for",
        description: "Gratitude shifts attention towards what is going well.",
    },
    Challenge {
        id: 6,
        title: "Drink 8 glasses of water",
        description: "Hydration helps mood, focus and energy.",
    },
    Challenge {
        id: 7,
        title: "Cook a new healthy recipe",
        description: "Make something nourishing you haven't tried before.",
    },
];

/// Index of the item for `date` in a pool of `len` items.
pub fn pick_index(len: usize, date: NaiveDate) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let day = i64::from(date.num_days_from_ce());
    Some(day.rem_euclid(len as i64) as usize)
}

/// The item for `date`. Stable for a given day, rotates day to day.
pub fn pick_for_date<T>(pool: &[T], date: NaiveDate) -> Option<&T> {
    pick_index(pool.len(), date).map(|index| &pool[index])
}

/// What is remembered about a user's pick for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPickRecord {
    pub date: NaiveDate,
    pub index: usize,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuoteOfTheDay {
    pub date: NaiveDate,
    pub quote: Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TodaysChallenge {
    pub date: NaiveDate,
    pub challenge: Challenge,
    pub completed: bool,
}

/// Clones share the store and the update lock.
#[derive(Clone)]
pub struct DailyPicker {
    store: Arc<dyn PickStore>,
    /// Held across every load-modify-store sequence so concurrent requests
    /// for the same record cannot lose an update.
    update_lock: Arc<Mutex<()>>,
    quotes: &'static [Quote],
    challenges: &'static [Challenge],
}

impl DailyPicker {
    pub fn new(store: Arc<dyn PickStore>) -> Self {
        Self::with_pools(store, QUOTES, CHALLENGES)
    }

    pub fn with_pools(
        store: Arc<dyn PickStore>,
        quotes: &'static [Quote],
        challenges: &'static [Challenge],
    ) -> Self {
        Self {
            store,
            update_lock: Arc::new(Mutex::new(())),
            quotes,
            challenges,
        }
    }

    pub async fn quote_of_the_day(
        &self,
        user: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<QuoteOfTheDay>> {
        let key = format!("quote:{user}");
        let _guard = self.update_lock.lock().await;
        let Some(record) = self.load_or_pick(&key, self.quotes.len(), date).await? else {
            return Ok(None);
        };
        Ok(Some(QuoteOfTheDay {
            date,
            quote: self.quotes[record.index],
        }))
    }

    pub async fn todays_challenge(
        &self,
        user: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<TodaysChallenge>> {
        let key = format!("challenge:{user}");
        let _guard = self.update_lock.lock().await;
        let Some(record) = self.load_or_pick(&key, self.challenges.len(), date).await? else {
            return Ok(None);
        };
        Ok(Some(self.challenge_view(record)))
    }

    /// Flip the completion flag of today's challenge.
    pub async fn toggle_challenge(
        &self,
        user: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<TodaysChallenge>> {
        let key = format!("challenge:{user}");
        let _guard = self.update_lock.lock().await;
        let Some(mut record) = self.load_or_pick(&key, self.challenges.len(), date).await? else {
            return Ok(None);
        };
        record.completed = !record.completed;
        self.store.put(&key, &serde_json::to_string(&record)?).await?;

        debug!(user, %date, completed = record.completed, "Challenge toggled");
        Ok(Some(self.challenge_view(record)))
    }

    fn challenge_view(&self, record: DailyPickRecord) -> TodaysChallenge {
        TodaysChallenge {
            date: record.date,
            challenge: self.challenges[record.index],
            completed: record.completed,
        }
    }

    /// Return the stored record for `date`, or pick and store a fresh one.
    async fn load_or_pick(
        &self,
        key: &str,
        pool_len: usize,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailyPickRecord>> {
        if let Some(raw) = self.store.get(key).await? {
            match serde_json::from_str::<DailyPickRecord>(&raw) {
                Ok(record) if record.date == date && record.index < pool_len => {
                    return Ok(Some(record));
                }
                Ok(_) => {}
                Err(e) => warn!(key, error = %e, "Discarding unreadable daily pick"),
            }
        }

        let Some(index) = pick_index(pool_len, date) else {
            return Ok(None);
        };
        let record = DailyPickRecord {
            date,
            index,
            completed: false,
        };
        self.store.put(key, &serde_json::to_string(&record)?).await?;
        Ok(Some(record))
    }
}
