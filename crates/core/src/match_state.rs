//! Match state tracking.
//!
//! Keeps what tournament overlays need from `currentmatch`: series
//! settings, the two teams on the cabinet, and the game score, with
//! per-concern change notifications. Nothing here is persisted — this is
//! an in-memory view of the feed.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use kq_protocol::ActiveMatch;
use kq_runtime::{ListenerId, next_listener_id};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::stream::KqStream;

/// The two cabinet sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CabColor {
    Blue,
    Gold,
}

/// One side's team, as far as the feed tells us.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTeam {
    pub name: Option<String>,
    pub players: Option<Vec<String>>,
}

/// Series configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    pub series_length: u32,
}

/// A score notification for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub cab: CabColor,
    pub score: u32,
}

/// Teams currently on the cabinet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTeams {
    pub blue: MatchTeam,
    pub gold: MatchTeam,
}

impl CurrentTeams {
    pub fn team(&self, cab: CabColor) -> &MatchTeam {
        match cab {
            CabColor::Blue => &self.blue,
            CabColor::Gold => &self.gold,
        }
    }
}

/// Game scores per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub blue: u32,
    pub gold: u32,
}

impl Scores {
    pub fn score(&self, cab: CabColor) -> u32 {
        match cab {
            CabColor::Blue => self.blue,
            CabColor::Gold => self.gold,
        }
    }

    fn score_mut(&mut self, cab: CabColor) -> &mut u32 {
        match cab {
            CabColor::Blue => &mut self.blue,
            CabColor::Gold => &mut self.gold,
        }
    }
}

/// Full tracked state of the match on a cabinet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub settings: MatchSettings,
    pub current_teams: CurrentTeams,
    pub scores: Scores,
}

/// Which notifications a listener wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchEventKind {
    Change,
    Score,
    Configured,
    Teams,
}

/// One notification to a match listener.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchNotification {
    Change(MatchState),
    Score(MatchScore),
    Configured(MatchSettings),
    Teams(CurrentTeams),
}

type MatchCallback = Arc<dyn Fn(&MatchNotification) + Send + Sync>;

#[derive(Default)]
struct MatchInner {
    state: Mutex<MatchState>,
    listeners: Mutex<HashMap<MatchEventKind, IndexMap<ListenerId, MatchCallback>>>,
}

/// Tracks match state and fans out per-concern notifications.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone, Default)]
pub struct Match {
    inner: Arc<MatchInner>,
}

impl Match {
    pub fn new() -> Match {
        Match::default()
    }

    pub fn state(&self) -> MatchState {
        self.inner.state.lock().clone()
    }

    /// Forgets everything back to an empty match.
    pub fn reset(&self) {
        self.set_match_state(MatchState::default());
    }

    pub fn configure(&self, settings: MatchSettings) {
        self.inner.state.lock().settings = settings;
        self.trigger(MatchEventKind::Change);
        self.trigger(MatchEventKind::Configured);
    }

    /// Credits one game win to a side.
    pub fn record_game_victory(&self, cab: CabColor) {
        let score = {
            let mut state = self.inner.state.lock();
            let score = state.scores.score_mut(cab);
            *score += 1;
            *score
        };
        self.trigger(MatchEventKind::Change);
        self.emit(
            MatchEventKind::Score,
            &MatchNotification::Score(MatchScore { cab, score }),
        );
    }

    /// Replaces the whole state, the way a score-control surface does.
    pub fn set_match_state(&self, new_state: MatchState) {
        *self.inner.state.lock() = new_state;
        self.trigger(MatchEventKind::Change);
        self.trigger(MatchEventKind::Configured);
        self.trigger(MatchEventKind::Score);
        self.trigger(MatchEventKind::Teams);
    }

    /// Registers a callback for one notification kind.
    pub fn on<F>(&self, kind: MatchEventKind, callback: F) -> ListenerId
    where
        F: Fn(&MatchNotification) + Send + Sync + 'static,
    {
        let id = next_listener_id();
        self.inner
            .listeners
            .lock()
            .entry(kind)
            .or_default()
            .insert(id, Arc::new(callback));
        id
    }

    /// Removes one listener. Returns true iff it existed.
    pub fn off(&self, kind: MatchEventKind, id: ListenerId) -> bool {
        self.inner
            .listeners
            .lock()
            .get_mut(&kind)
            .is_some_and(|set| set.shift_remove(&id).is_some())
    }

    /// Re-emits the current state to listeners of one kind. Newly attached
    /// consumers call this to catch up; `Score` emits one notification per
    /// side.
    pub fn trigger(&self, kind: MatchEventKind) {
        let state = self.state();
        match kind {
            MatchEventKind::Change => self.emit(kind, &MatchNotification::Change(state)),
            MatchEventKind::Configured => {
                self.emit(kind, &MatchNotification::Configured(state.settings));
            }
            MatchEventKind::Teams => {
                self.emit(kind, &MatchNotification::Teams(state.current_teams));
            }
            MatchEventKind::Score => {
                for cab in [CabColor::Blue, CabColor::Gold] {
                    self.emit(
                        kind,
                        &MatchNotification::Score(MatchScore {
                            cab,
                            score: state.scores.score(cab),
                        }),
                    );
                }
            }
        }
    }

    fn emit(&self, kind: MatchEventKind, notification: &MatchNotification) {
        let snapshot: Vec<MatchCallback> = match self.inner.listeners.lock().get(&kind) {
            Some(set) => set.values().cloned().collect(),
            None => return,
        };
        for callback in snapshot {
            callback(notification);
        }
    }

    /// Follows a stream's `currentmatch` events: best-of becomes the
    /// series length, team one is blue, team two is gold.
    pub fn attach(&self, stream: &KqStream) -> ListenerId {
        let tracker = self.clone();
        stream.on_current_match(move |current| {
            tracker.set_match_state(match_state_from(current));
        })
    }
}

fn match_state_from(current: &ActiveMatch) -> MatchState {
    MatchState {
        settings: MatchSettings {
            series_length: saturating_u32(current.best_of),
        },
        current_teams: CurrentTeams {
            blue: MatchTeam {
                name: Some(current.teams[0].clone()),
                players: None,
            },
            gold: MatchTeam {
                name: Some(current.teams[1].clone()),
                players: None,
            },
        },
        scores: Scores {
            blue: saturating_u32(current.scores[0]),
            gold: saturating_u32(current.scores[1]),
        },
    }
}

// NaN casts to zero, which is what an unparsed score should read as.
fn saturating_u32(value: f64) -> u32 {
    value as u32
}
