//! Kill and death statistics.
//!
//! Subscribes to `playerKill` and keeps per-character counters the way
//! killboards consume them: kills, deaths, and queen kills.

use std::sync::Arc;

use indexmap::IndexMap;
use kq_protocol::{Character, EventKind, PlayerKill};
use kq_runtime::{ListenerId, next_listener_id};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stream::KqStream;

/// The statistics tracked per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Kills,
    Deaths,
    QueenKills,
}

/// One statistic change, as handed to change listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KqStat {
    pub character: Character,
    pub statistic: Statistic,
    pub value: u64,
}

/// Counters for one character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub kills: u64,
    pub deaths: u64,
    pub queen_kills: u64,
}

impl CharacterStats {
    pub fn get(&self, statistic: Statistic) -> u64 {
        match statistic {
            Statistic::Kills => self.kills,
            Statistic::Deaths => self.deaths,
            Statistic::QueenKills => self.queen_kills,
        }
    }
}

type ChangeCallback = Arc<dyn Fn(&KqStat) + Send + Sync>;

#[derive(Default)]
struct GameStatsInner {
    stats: Mutex<IndexMap<Character, CharacterStats>>,
    listeners: Mutex<IndexMap<ListenerId, ChangeCallback>>,
    subscription: Mutex<Option<ListenerId>>,
}

/// Accumulates kill, death, and queen-kill counters from a stream.
///
/// Cheap to clone; clones share the same counters.
#[derive(Clone)]
pub struct GameStats {
    inner: Arc<GameStatsInner>,
}

impl GameStats {
    /// A fresh table with every roster character at zero.
    pub fn new() -> GameStats {
        let mut stats = IndexMap::new();
        for character in Character::ALL {
            stats.insert(character, CharacterStats::default());
        }
        GameStats {
            inner: Arc::new(GameStatsInner {
                stats: Mutex::new(stats),
                ..GameStatsInner::default()
            }),
        }
    }

    /// Starts accumulating from a stream's `playerKill` events. No-op when
    /// already started.
    pub fn start(&self, stream: &KqStream) {
        let mut subscription = self.inner.subscription.lock();
        if subscription.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        *subscription = Some(stream.on_player_kill(move |kill| record_kill(&inner, kill)));
    }

    /// Stops accumulating. Returns true iff the aggregator was started on
    /// this stream.
    pub fn stop(&self, stream: &KqStream) -> bool {
        match self.inner.subscription.lock().take() {
            Some(id) => stream.off(EventKind::PlayerKill, id),
            None => false,
        }
    }

    /// Current counters, in roster order.
    pub fn snapshot(&self) -> IndexMap<Character, CharacterStats> {
        self.inner.stats.lock().clone()
    }

    /// Registers a change listener; every counter change emits one
    /// [`KqStat`].
    pub fn on_change<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&KqStat) + Send + Sync + 'static,
    {
        let id = next_listener_id();
        self.inner.listeners.lock().insert(id, Arc::new(callback));
        id
    }

    /// Removes one change listener. Returns true iff it existed.
    pub fn off_change(&self, id: ListenerId) -> bool {
        self.inner.listeners.lock().shift_remove(&id).is_some()
    }

    /// Re-emits the whole table to every change listener. Newly attached
    /// consumers call this to catch up on the current standings.
    pub fn trigger_change(&self) {
        let stats = self.inner.stats.lock().clone();
        for (character, counters) in stats {
            for statistic in [Statistic::Kills, Statistic::Deaths, Statistic::QueenKills] {
                emit(
                    &self.inner,
                    KqStat {
                        character,
                        statistic,
                        value: counters.get(statistic),
                    },
                );
            }
        }
    }
}

impl Default for GameStats {
    fn default() -> GameStats {
        GameStats::new()
    }
}

fn record_kill(inner: &Arc<GameStatsInner>, kill: &PlayerKill) {
    let killer = kill.by.character();
    let victim = kill.killed.character();
    if killer.is_none() || victim.is_none() {
        debug!(?kill, "kill with unresolvable character id");
    }

    let mut changes = Vec::new();
    {
        let mut stats = inner.stats.lock();
        if let Some(killer) = killer {
            let counters = stats.entry(killer).or_default();
            counters.kills += 1;
            changes.push(KqStat {
                character: killer,
                statistic: Statistic::Kills,
                value: counters.kills,
            });
            if victim.is_some_and(Character::is_queen) {
                counters.queen_kills += 1;
                changes.push(KqStat {
                    character: killer,
                    statistic: Statistic::QueenKills,
                    value: counters.queen_kills,
                });
            }
        }
        if let Some(victim) = victim {
            let counters = stats.entry(victim).or_default();
            counters.deaths += 1;
            changes.push(KqStat {
                character: victim,
                statistic: Statistic::Deaths,
                value: counters.deaths,
            });
        }
    }
    // Listeners run outside the stats lock so they can read the snapshot.
    for change in &changes {
        emit(inner, *change);
    }
}

fn emit(inner: &GameStatsInner, stat: KqStat) {
    let snapshot: Vec<ChangeCallback> = inner.listeners.lock().values().cloned().collect();
    for callback in snapshot {
        callback(&stat);
    }
}
