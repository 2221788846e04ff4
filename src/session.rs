use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use crate::keys::TypingKey;
use crate::scanner::{
    leading_skip_end, line_start, skippable_region_end, skipped_region_start, CommentConfig,
};

/// Source of timestamps for a session
pub trait Clock {
    fn now(&self) -> SystemTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Hand-driven clock for tests and replays. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<SystemTime>>,
}

impl ManualClock {
    pub fn at_millis(ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(SystemTime::UNIX_EPOCH + Duration::from_millis(ms))),
        }
    }

    pub fn set_millis(&self, ms: u64) {
        self.now.set(SystemTime::UNIX_EPOCH + Duration::from_millis(ms));
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }
}

/// Final metrics of a completed session
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TypingResult {
    pub elapsed_secs: f64,
    pub total_keystrokes: usize,
    pub keystrokes_per_second: f64,
    pub backspace_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum TypingPhase {
    Idle,
    Typing,
    Erroring,
    Complete,
}

/// One attempt at typing a fixed target text.
///
/// `position` is the index of the next expected character. While
/// `error_input` is non-empty the position is frozen and every key except
/// Backspace is absorbed into the error run.
#[derive(Debug)]
pub struct TypingSession<C: Clock = SystemClock> {
    target: Vec<char>,
    comments: CommentConfig,
    clock: C,
    position: usize,
    initial_position: usize,
    error_input: String,
    started_at: Option<SystemTime>,
    ended_at: Option<SystemTime>,
    backspace_count: usize,
    total_keystrokes: usize,
}

impl TypingSession<SystemClock> {
    pub fn new(target: &str, comments: CommentConfig) -> Self {
        Self::with_clock(target, comments, SystemClock)
    }
}

impl<C: Clock> TypingSession<C> {
    pub fn with_clock(target: &str, comments: CommentConfig, clock: C) -> Self {
        let target: Vec<char> = target.chars().collect();
        let initial_position = leading_skip_end(&target, &comments);

        Self {
            target,
            comments,
            clock,
            position: initial_position,
            initial_position,
            error_input: String::new(),
            started_at: None,
            ended_at: None,
            backspace_count: 0,
            total_keystrokes: 0,
        }
    }

    /// Feed one key into the session. Keys after completion are ignored.
    pub fn handle_key(&mut self, key: TypingKey) {
        if self.is_complete() {
            return;
        }

        match key.to_char() {
            None => self.backspace(),
            Some(typed) => self.write(key, typed),
        }
    }

    fn backspace(&mut self) {
        if self.error_input.pop().is_some() {
            self.backspace_count += 1;
            return;
        }

        if self.position == 0 {
            return;
        }

        let target = match skipped_region_start(&self.target, self.position, &self.comments) {
            // also undo the newline that triggered the skip
            Some(start) if start > 0 && line_start(&self.target, start) == start => start - 1,
            Some(start) => start,
            None => self.position - 1,
        };

        self.position = target;
        self.backspace_count += 1;
    }

    fn write(&mut self, key: TypingKey, typed: char) {
        let now = self.clock.now();

        if !self.error_input.is_empty() {
            self.error_input.push(typed);
            self.record_keystroke(now);
            return;
        }

        if key == TypingKey::Tab {
            let end = skippable_region_end(&self.target, self.position, &self.comments);
            if end > self.position {
                self.advance_to(end, now);
                return;
            }
        }

        if self.target.get(self.position) == Some(&typed) {
            let end = skippable_region_end(&self.target, self.position + 1, &self.comments);
            self.advance_to(end, now);
        } else {
            self.error_input.push(typed);
            self.record_keystroke(now);
        }
    }

    fn advance_to(&mut self, position: usize, now: SystemTime) {
        self.position = position;
        self.record_keystroke(now);
        if self.is_complete() {
            self.ended_at.get_or_insert(now);
        }
    }

    fn record_keystroke(&mut self, now: SystemTime) {
        self.started_at.get_or_insert(now);
        self.total_keystrokes += 1;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn initial_position(&self) -> usize {
        self.initial_position
    }

    pub fn error_input(&self) -> &str {
        &self.error_input
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<SystemTime> {
        self.ended_at
    }

    pub fn backspace_count(&self) -> usize {
        self.backspace_count
    }

    pub fn total_keystrokes(&self) -> usize {
        self.total_keystrokes
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    /// Text before the cursor, including auto-skipped regions.
    pub fn typed_text(&self) -> String {
        self.target[..self.position].iter().collect()
    }

    pub fn remaining_text(&self) -> String {
        self.target[self.position..].iter().collect()
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.position == self.target.len()
    }

    pub fn expected_char(&self) -> Option<char> {
        self.target.get(self.position).copied()
    }

    pub fn phase(&self) -> TypingPhase {
        if self.is_complete() {
            TypingPhase::Complete
        } else if !self.error_input.is_empty() {
            TypingPhase::Erroring
        } else if self.started_at.is_some() {
            TypingPhase::Typing
        } else {
            TypingPhase::Idle
        }
    }

    /// Time since the first keystroke, frozen once the session completes.
    pub fn elapsed(&self) -> Option<Duration> {
        let started_at = self.started_at?;
        let until = self.ended_at.unwrap_or_else(|| self.clock.now());
        Some(until.duration_since(started_at).unwrap_or_default())
    }

    /// Metrics of the finished session, derived from the current state.
    pub fn result(&self) -> Option<TypingResult> {
        if !self.is_complete() {
            return None;
        }

        let elapsed_secs = self
            .ended_at?
            .duration_since(self.started_at?)
            .unwrap_or_default()
            .as_secs_f64();

        let keystrokes_per_second = if elapsed_secs > 0.0 {
            self.total_keystrokes as f64 / elapsed_secs
        } else {
            0.0
        };

        Some(TypingResult {
            elapsed_secs,
            total_keystrokes: self.total_keystrokes,
            keystrokes_per_second,
            backspace_count: self.backspace_count,
        })
    }
}
