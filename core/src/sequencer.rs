use crate::diff::diff;
use crate::plan::{plan, AnimationPhase, CommitCue, PhaseKind, Release, SequencerConfig};
use crate::state::GameSnapshot;

/// What happened during an [`Sequencer::offer`] or [`Sequencer::tick`] call.
/// The render tree redraws on `Committed`, the sound bank listens to
/// `PhaseStarted` and `Cue`.
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent {
    /// Local action buttons are disabled for the rest of the sequence.
    ActionsGated,
    PhaseStarted(PhaseKind),
    Committed(Release),
    Cue(CommitCue),
}

/// Owns the rendered/pending snapshot pair and the phase queue. This is the
/// single writer of the rendered snapshot; everything else reads it through
/// [`Sequencer::rendered`].
///
/// The sequencer keeps no timers. Callers pass a millisecond clock into
/// `offer` and `tick`, drive `tick` whenever `next_deadline` elapses, and
/// can substitute any clock in tests.
pub struct Sequencer {
    config: SequencerConfig,
    rendered: GameSnapshot,
    pending: Option<GameSnapshot>,
    queue: Vec<AnimationPhase>,
    cursor: usize,
    phase_deadline: Option<u64>,
    superseding: Option<GameSnapshot>,
}

impl Sequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self::with_rendered(GameSnapshot::empty(), config)
    }

    /// Starts from a previously rendered snapshot (session cache restore).
    /// The next fetch diffs against it, so a reload shows the stale board
    /// instead of replaying the whole game as animations.
    pub fn with_rendered(rendered: GameSnapshot, config: SequencerConfig) -> Self {
        Self {
            config,
            rendered,
            pending: None,
            queue: Vec::new(),
            cursor: 0,
            phase_deadline: None,
            superseding: None,
        }
    }

    /// The state the UI is allowed to show right now.
    pub fn rendered(&self) -> &GameSnapshot {
        &self.rendered
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn is_animating(&self) -> bool {
        self.pending.is_some()
    }

    /// When the in-flight phase completes; the driver arms its timer off
    /// this.
    pub fn next_deadline(&self) -> Option<u64> {
        self.phase_deadline
    }

    /// Feeds a freshly fetched authoritative snapshot into the gate.
    ///
    /// If a sequence is already running, the in-flight phase is left to
    /// finish but every not-yet-started phase is discarded; once the queue
    /// drains, a fresh diff+plan runs against the rendered state as of that
    /// moment. Only the newest superseding snapshot is kept, so rapid pushes
    /// cannot grow the queue without bound.
    pub fn offer(&mut self, next: GameSnapshot, now_ms: u64) -> Vec<SequencerEvent> {
        if self.pending.is_some() {
            self.superseding = Some(next);
            self.queue.truncate(self.cursor + 1);
            return Vec::new();
        }
        self.begin(next, now_ms)
    }

    /// Completes every phase whose deadline has passed, merging exactly that
    /// phase's released fields into the rendered snapshot.
    pub fn tick(&mut self, now_ms: u64) -> Vec<SequencerEvent> {
        let mut events = Vec::new();
        while let Some(deadline) = self.phase_deadline {
            if now_ms < deadline {
                break;
            }
            let phase = self.queue[self.cursor].clone();
            self.merge(&phase);
            events.push(SequencerEvent::Committed(phase.releases));
            if let PhaseKind::Commit(cues) = phase.kind {
                for cue in cues {
                    events.push(SequencerEvent::Cue(cue));
                }
            }
            self.cursor += 1;
            if self.cursor < self.queue.len() {
                let next_phase = &self.queue[self.cursor];
                events.push(SequencerEvent::PhaseStarted(next_phase.kind.clone()));
                // Chain off the previous deadline so phase lengths do not
                // drift with tick latency.
                self.phase_deadline = Some(deadline + u64::from(next_phase.duration_ms));
            } else {
                self.queue.clear();
                self.cursor = 0;
                self.pending = None;
                self.phase_deadline = None;
                if let Some(newest) = self.superseding.take() {
                    events.extend(self.begin(newest, now_ms));
                }
            }
        }
        events
    }

    fn begin(&mut self, next: GameSnapshot, now_ms: u64) -> Vec<SequencerEvent> {
        let result = diff(&self.rendered, &next);
        self.queue = plan(&result, &self.config);
        self.cursor = 0;
        self.pending = Some(next);

        let mut events = Vec::new();
        let timed = self.queue.iter().any(|phase| phase.duration_ms > 0);
        if timed && !self.rendered.valid_actions.is_empty() {
            // No action button may be interactable mid-animation.
            self.rendered.valid_actions.clear();
            events.push(SequencerEvent::ActionsGated);
        }
        let first = &self.queue[0];
        events.push(SequencerEvent::PhaseStarted(first.kind.clone()));
        self.phase_deadline = Some(now_ms + u64::from(first.duration_ms));
        events.extend(self.tick(now_ms));
        events
    }

    /// Atomic per-phase merge: observers only ever see the declared fields
    /// swapped in together, never a torn update.
    fn merge(&mut self, phase: &AnimationPhase) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        match phase.releases {
            Release::Dice => {
                self.rendered.dice1 = pending.dice1;
                self.rendered.dice2 = pending.dice2;
            }
            Release::Positions => {
                for (id, state) in &pending.players {
                    if let Some(current) = self.rendered.players.get_mut(id) {
                        current.board_position = state.board_position;
                    }
                }
            }
            Release::Full => {
                self.rendered = pending.clone();
            }
        }
    }
}
