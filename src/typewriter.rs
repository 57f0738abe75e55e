//! Character-by-character text reveal.
//!
//! After mounting, the typewriter waits `delay_ms`, then reveals one
//! character every `speed_ms`. At full length it either holds forever or,
//! in loop mode, clears after a pause and starts over.
//!
//! The revealed length `t` milliseconds after mounting is
//!
//! ```text
//! 0                              if t < delay + speed
//! min(len, (t - delay) / speed)  otherwise
//! ```
//!
//! so "Hello" at 100 ms per char with a 500 ms delay shows "" at 500 ms,
//! "H" at 600 ms and "Hello" at 1000 ms.
//!
//! Progress is driven by [`Scheduler`] timers; [`Typewriter::revealed_at`]
//! computes the same value directly from time.

use serde::{Deserialize, Serialize};

use crate::schedule::{FiredTimer, OwnerId, Scheduler, TimerId};

const STEP: u32 = 0;
const RESTART: u32 = 1;

/// What happens after the whole text is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypewriterMode {
    /// Keep the full text on screen.
    Hold,
    /// Clear after `pause_ms` and type it again.
    Loop { pause_ms: u64 },
}

impl Default for TypewriterMode {
    fn default() -> Self {
        TypewriterMode::Loop { pause_ms: 5000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    pub text: String,
    /// Milliseconds per character.
    pub speed_ms: u64,
    /// Milliseconds before the first character starts.
    pub delay_ms: u64,
    pub mode: TypewriterMode,
}

impl TypewriterConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed_ms: u64) -> Self {
        self.speed_ms = speed_ms;
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_mode(mut self, mode: TypewriterMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            speed_ms: 120,
            delay_ms: 500,
            mode: TypewriterMode::default(),
        }
    }
}

/// Where the typewriter is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypewriterState {
    /// Waiting for the initial delay (or not mounted).
    Idle,
    /// Showing this many characters, more to come.
    Revealing(usize),
    /// Full text shown.
    Holding,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    config: TypewriterConfig,
    char_count: usize,
    state: TypewriterState,
    owner: Option<OwnerId>,
    timer: Option<TimerId>,
}

impl Typewriter {
    pub fn new(config: TypewriterConfig) -> Self {
        let char_count = config.text.chars().count();
        Self {
            config,
            char_count,
            state: TypewriterState::Idle,
            owner: None,
            timer: None,
        }
    }

    pub fn config(&self) -> &TypewriterConfig {
        &self.config
    }

    pub fn state(&self) -> TypewriterState {
        self.state
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn is_mounted(&self) -> bool {
        self.owner.is_some()
    }

    /// Number of characters currently shown.
    pub fn revealed(&self) -> usize {
        match self.state {
            TypewriterState::Idle => 0,
            TypewriterState::Revealing(n) => n,
            TypewriterState::Holding => self.char_count,
        }
    }

    /// The visible prefix of the text.
    pub fn text(&self) -> &str {
        prefix(&self.config.text, self.revealed())
    }

    /// Characters shown `elapsed_ms` after mounting, without a scheduler.
    pub fn revealed_at(&self, elapsed_ms: u64) -> usize {
        let t = match self.config.mode {
            TypewriterMode::Hold => elapsed_ms,
            TypewriterMode::Loop { pause_ms } => elapsed_ms % self.cycle_ms(pause_ms),
        };
        let speed = self.speed();
        if t < self.config.delay_ms.saturating_add(speed) {
            0
        } else {
            (((t - self.config.delay_ms) / speed) as usize).min(self.char_count)
        }
    }

    /// Visible prefix `elapsed_ms` after mounting.
    pub fn text_at(&self, elapsed_ms: u64) -> &str {
        prefix(&self.config.text, self.revealed_at(elapsed_ms))
    }

    /// Start typing from an empty line at `now`.
    pub fn mount(&mut self, scheduler: &mut Scheduler, now: u64) {
        if let Some(owner) = self.owner.take() {
            scheduler.release(owner);
        }
        let owner = scheduler.register_owner();
        self.owner = Some(owner);
        self.start_cycle(scheduler, now);
        log::debug!("Typewriter mounted at {} ms ({} chars)", now, self.char_count);
    }

    /// Cancel all pending timers. The text is cleared.
    pub fn unmount(&mut self, scheduler: &mut Scheduler) {
        if let Some(owner) = self.owner.take() {
            scheduler.release(owner);
            log::debug!("Typewriter unmounted");
        }
        self.timer = None;
        self.state = TypewriterState::Idle;
    }

    /// Handle a timer fired for this typewriter. Others are ignored.
    pub fn on_timer(&mut self, scheduler: &mut Scheduler, fired: &FiredTimer) {
        if self.owner != Some(fired.owner) || self.timer != Some(fired.id) {
            return;
        }
        self.timer = None;
        let at = fired.deadline;

        match (fired.token, self.state) {
            (RESTART, _) => self.start_cycle(scheduler, at),
            (STEP, state) => {
                let next = match state {
                    TypewriterState::Idle => 1,
                    TypewriterState::Revealing(n) => n + 1,
                    TypewriterState::Holding => return,
                };
                if next >= self.char_count {
                    self.state = TypewriterState::Holding;
                    if let TypewriterMode::Loop { pause_ms } = self.config.mode {
                        self.schedule(scheduler, at.saturating_add(pause_ms), RESTART);
                    }
                } else {
                    self.state = TypewriterState::Revealing(next);
                    self.schedule(scheduler, at.saturating_add(self.speed()), STEP);
                }
            }
            _ => {}
        }
    }

    fn start_cycle(&mut self, scheduler: &mut Scheduler, at: u64) {
        self.state = TypewriterState::Idle;
        let first = at.saturating_add(self.config.delay_ms).saturating_add(self.speed());
        self.schedule(scheduler, first, STEP);
    }

    fn schedule(&mut self, scheduler: &mut Scheduler, at: u64, token: u32) {
        if let Some(owner) = self.owner {
            self.timer = Some(scheduler.set_timeout(owner, at, token));
        }
    }

    fn speed(&self) -> u64 {
        self.config.speed_ms.max(1)
    }

    /// Length of one loop: delay, typing, pause. Saturates at `u64::MAX`.
    fn cycle_ms(&self, pause_ms: u64) -> u64 {
        let typing = (self.char_count.max(1) as u64).saturating_mul(self.speed());
        self.config
            .delay_ms
            .saturating_add(typing)
            .saturating_add(pause_ms)
            .max(1)
    }
}

/// First `n` characters of `text`, cut on a char boundary.
fn prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello(mode: TypewriterMode) -> Typewriter {
        Typewriter::new(
            TypewriterConfig::new("Hello")
                .with_speed(100)
                .with_delay(500)
                .with_mode(mode),
        )
    }

    /// Drive the typewriter through the scheduler up to `now`.
    fn run_until(tw: &mut Typewriter, s: &mut Scheduler, now: u64) {
        loop {
            let due = s.pop_due(now);
            if due.is_empty() {
                break;
            }
            for fired in &due {
                tw.on_timer(s, fired);
            }
        }
    }

    #[test]
    fn test_defaults() {
        let config = TypewriterConfig::default();
        assert_eq!(config.speed_ms, 120);
        assert_eq!(config.delay_ms, 500);
        assert_eq!(config.mode, TypewriterMode::Loop { pause_ms: 5000 });
    }

    #[test]
    fn test_revealed_at_formula() {
        let tw = hello(TypewriterMode::Hold);
        assert_eq!(tw.text_at(0), "");
        assert_eq!(tw.text_at(500), "");
        assert_eq!(tw.text_at(599), "");
        assert_eq!(tw.text_at(600), "H");
        assert_eq!(tw.text_at(750), "He");
        assert_eq!(tw.text_at(1000), "Hello");
        assert_eq!(tw.text_at(1_000_000), "Hello");
    }

    #[test]
    fn test_scheduled_matches_formula() {
        let mut s = Scheduler::new();
        let mut tw = hello(TypewriterMode::Loop { pause_ms: 2000 });
        tw.mount(&mut s, 0);
        for now in (0..8000).step_by(25) {
            run_until(&mut tw, &mut s, now);
            assert_eq!(tw.text(), tw.text_at(now), "at {} ms", now);
        }
    }

    #[test]
    fn test_hold_mode_stops_scheduling() {
        let mut s = Scheduler::new();
        let mut tw = hello(TypewriterMode::Hold);
        tw.mount(&mut s, 0);
        run_until(&mut tw, &mut s, 1000);
        assert_eq!(tw.state(), TypewriterState::Holding);
        assert_eq!(s.pending_for(tw.owner().unwrap()), 0);
    }

    #[test]
    fn test_loop_restarts_after_pause() {
        let mut s = Scheduler::new();
        let mut tw = hello(TypewriterMode::Loop { pause_ms: 5000 });
        tw.mount(&mut s, 0);

        run_until(&mut tw, &mut s, 1000);
        assert_eq!(tw.text(), "Hello");
        run_until(&mut tw, &mut s, 5999);
        assert_eq!(tw.text(), "Hello");
        run_until(&mut tw, &mut s, 6000);
        assert_eq!(tw.state(), TypewriterState::Idle);
        run_until(&mut tw, &mut s, 6600);
        assert_eq!(tw.text(), "H");
    }

    #[test]
    fn test_unmount_cancels_timers() {
        let mut s = Scheduler::new();
        let mut tw = hello(TypewriterMode::default());
        tw.mount(&mut s, 0);
        run_until(&mut tw, &mut s, 700);
        let owner = tw.owner().unwrap();

        tw.unmount(&mut s);

        assert_eq!(s.pending_for(owner), 0);
        assert!(s.pop_due(u64::MAX - 1).is_empty());
        assert_eq!(tw.text(), "");
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let tw = Typewriter::new(
            TypewriterConfig::new("héllo 世界")
                .with_speed(10)
                .with_delay(0)
                .with_mode(TypewriterMode::Hold),
        );
        assert_eq!(tw.text_at(20), "hé");
        assert_eq!(tw.text_at(80), "héllo 世界");
    }

    #[test]
    fn test_empty_text() {
        let mut s = Scheduler::new();
        let mut tw = Typewriter::new(TypewriterConfig::new(""));
        tw.mount(&mut s, 0);
        run_until(&mut tw, &mut s, 10_000);
        assert_eq!(tw.text(), "");
        assert_eq!(tw.revealed_at(10_000), 0);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config: TypewriterConfig = serde_json::from_str(
            r#"{"text":"Hi","speed_ms":100,"delay_ms":0,"mode":{"loop":{"pause_ms":18446744073709551615}}}"#,
        )
        .unwrap();
        let mut s = Scheduler::new();
        let mut tw = Typewriter::new(config);
        assert_eq!(tw.text_at(150), "H");
        assert_eq!(tw.text_at(u64::MAX), "");

        tw.mount(&mut s, 0);
        run_until(&mut tw, &mut s, 10_000);
        assert_eq!(tw.text(), "Hi");
        assert_eq!(s.next_deadline(), Some(u64::MAX));

        let mut late =
            Typewriter::new(TypewriterConfig::new("Hi").with_delay(u64::MAX).with_speed(u64::MAX));
        assert_eq!(late.revealed_at(u64::MAX - 1), 0);
        late.mount(&mut s, 1_000);
        assert_eq!(late.text(), "");
    }

    #[test]
    fn test_mode_json() {
        let config: TypewriterConfig =
            serde_json::from_str(r#"{"text":"Hi","mode":"hold"}"#).unwrap();
        assert_eq!(config.mode, TypewriterMode::Hold);
        assert_eq!(config.speed_ms, 120);

        let looped: TypewriterConfig =
            serde_json::from_str(r#"{"mode":{"loop":{"pause_ms":100}}}"#).unwrap();
        assert_eq!(looped.mode, TypewriterMode::Loop { pause_ms: 100 });
    }
}
