//! Character-at-a-time parser for the console's escape-sequence language.

use core::mem;

use heapless::Vec;
use log::debug;

pub const ESCAPE: char = '\x1b';
pub const MAX_PARAMS: usize = 16;
const MAX_DIGITS: u8 = 3;

/// Parameter value when none was given.
pub const UNSET: i32 = -1;

/// A complete sequence: optional `~` prefix, terminating letter and its
/// parameters in order. Empty parameters are `UNSET`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    pub tilde: bool,
    pub letter: char,
    pub params: Vec<i32, MAX_PARAMS>,
}

impl Sequence {
    #[inline(always)]
    pub fn param(&self, index: usize) -> i32 {
        self.params.get(index).copied().unwrap_or(UNSET)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Print(char),
    Tab,
    NewLine,
    Sequence(Sequence),
}

#[derive(Clone, Debug, Default)]
struct Pending {
    params: Vec<i32, MAX_PARAMS>,
    value: Option<i32>,
    digits: u8,
}

impl Pending {
    /// Pushes the value being collected; false when there is no room.
    fn finish_value(&mut self) -> bool {
        let value = self.value.take().unwrap_or(UNSET);
        self.digits = 0;
        self.params.push(value).is_ok()
    }
}

#[derive(Clone, Debug, Default)]
enum State {
    #[default]
    Idle,
    CollectingParams(Pending),
    CollectingOpcode(Pending),
    /// A sequence just completed; `[` starts another without a new escape.
    Chained,
}

#[derive(Debug, Default)]
pub struct EscapeParser {
    state: State,
}

impl EscapeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_sequence(&self) -> bool {
        matches!(self.state, State::CollectingParams(_) | State::CollectingOpcode(_))
    }

    pub fn feed(&mut self, c: char) -> Option<Action> {
        match mem::take(&mut self.state) {
            State::Idle => self.idle(c),
            State::Chained if c == '[' => {
                self.state = State::CollectingParams(Pending::default());
                None
            }
            State::Chained => self.idle(c),
            State::CollectingParams(pending) => self.collect_param(pending, c),
            State::CollectingOpcode(pending) => {
                if c.is_ascii_alphabetic() {
                    self.complete(pending, true, c)
                } else {
                    self.malformed(c)
                }
            }
        }
    }

    /// Ends the current burst of input. An unterminated sequence is dropped.
    pub fn finish(&mut self) {
        if self.in_sequence() {
            debug!(target: "console", "dropping unterminated escape sequence");
        }
        self.state = State::Idle;
    }

    fn idle(&mut self, c: char) -> Option<Action> {
        match c {
            ESCAPE => {
                self.state = State::CollectingParams(Pending::default());
                None
            }
            '\t' => Some(Action::Tab),
            '\n' => Some(Action::NewLine),
            c => Some(Action::Print(c)),
        }
    }

    fn collect_param(&mut self, mut pending: Pending, c: char) -> Option<Action> {
        match c {
            '[' => {
                self.state = State::CollectingParams(Pending::default());
                None
            }
            '0'..='9' => {
                if pending.digits == MAX_DIGITS {
                    return self.malformed(c);
                }
                let digit = c as i32 - '0' as i32;
                pending.value = Some(pending.value.unwrap_or(0) * 10 + digit);
                pending.digits += 1;
                self.state = State::CollectingParams(pending);
                None
            }
            ';' => {
                if !pending.finish_value() {
                    return self.malformed(c);
                }
                self.state = State::CollectingParams(pending);
                None
            }
            '~' => {
                self.state = State::CollectingOpcode(pending);
                None
            }
            c if c.is_ascii_alphabetic() => self.complete(pending, false, c),
            c => self.malformed(c),
        }
    }

    fn complete(&mut self, mut pending: Pending, tilde: bool, letter: char) -> Option<Action> {
        if !pending.finish_value() {
            return self.malformed(letter);
        }
        self.state = State::Chained;
        Some(Action::Sequence(Sequence { tilde, letter, params: pending.params }))
    }

    fn malformed(&mut self, c: char) -> Option<Action> {
        debug!(target: "console", "malformed escape sequence at {:?}", c);
        self.state = State::Idle;
        None
    }
}
