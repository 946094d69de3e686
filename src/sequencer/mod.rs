/// Core sequencer logic - cursor state and tick scheduling
/// Single-threaded: the host calls `poll` and due ticks run inline
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::encoder::{Frame, Symbol};
use crate::error::SequencerError;

pub mod clock;
pub mod playback;

pub use clock::{ManualClock, SystemClock, TimeSource};

/// Default tick interval when none is given.
pub const DEFAULT_RATE: Duration = Duration::from_millis(200);

type SymbolHook = Box<dyn FnMut(Symbol)>;

struct PlaybackSession {
    frame: Frame,
    rate: Duration,
    cursor: usize,
    next_deadline: Instant,
    ticks: u64,
    on_symbol: SymbolHook,
}

impl PlaybackSession {
    /// Returns false once the following deadline can no longer be represented.
    fn tick(&mut self) -> bool {
        // Frames are never empty, so the cursor is always in range.
        if let Some(symbol) = self.frame.get(self.cursor) {
            trace!("tick {} cursor {} -> {:?}", self.ticks, self.cursor, symbol);
            (self.on_symbol)(symbol);
        }
        self.cursor = (self.cursor + 1) % self.frame.len();
        self.ticks += 1;
        match self.next_deadline.checked_add(self.rate) {
            Some(deadline) => {
                self.next_deadline = deadline;
                true
            }
            None => false,
        }
    }
}

pub struct Sequencer<C: TimeSource = SystemClock> {
    clock: C,
    session: Option<PlaybackSession>,
}

impl Sequencer<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Sequencer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TimeSource> Sequencer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            session: None,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Begin looping playback of `frame`, one symbol every `rate`.
    ///
    /// The first symbol is emitted once a full `rate` has elapsed, not at start.
    pub fn start(
        &mut self,
        frame: Frame,
        rate: Duration,
        on_symbol: impl FnMut(Symbol) + 'static,
    ) -> Result<(), SequencerError> {
        if self.session.is_some() {
            warn!("start rejected: playback already running");
            return Err(SequencerError::AlreadyRunning);
        }
        if rate.is_zero() {
            warn!("start rejected: invalid rate {:?}", rate);
            return Err(SequencerError::InvalidRate(format!("{:?}", rate)));
        }

        let now = self.clock.now();
        let Some(first_deadline) = now.checked_add(rate) else {
            warn!("start rejected: rate {:?} overflows the clock", rate);
            return Err(SequencerError::InvalidRate(format!("{:?}", rate)));
        };
        debug!(
            "starting playback of {} symbols every {:?}",
            frame.len(),
            rate
        );
        self.session = Some(PlaybackSession {
            frame,
            rate,
            cursor: 0,
            next_deadline: first_deadline,
            ticks: 0,
            on_symbol: Box::new(on_symbol),
        });
        Ok(())
    }

    /// Cancel playback. Does nothing when idle.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("stopped playback after {} ticks", session.ticks);
        }
    }

    /// Fire every tick whose deadline has passed, in order. Returns how many fired.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return 0;
        };

        let mut fired = 0;
        let mut exhausted = false;
        while session.next_deadline <= now {
            fired += 1;
            if !session.tick() {
                exhausted = true;
                break;
            }
        }
        if exhausted {
            warn!("next deadline overflows the clock, stopping playback");
            self.stop();
        }
        fired
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.cursor)
    }

    pub fn rate(&self) -> Option<Duration> {
        self.session.as_ref().map(|s| s.rate)
    }

    pub fn ticks(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.ticks)
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.session.as_ref().map(|s| &s.frame)
    }

    /// Time left until the next tick is due, zero if it is already overdue.
    pub fn next_tick_in(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.session
            .as_ref()
            .map(|s| s.next_deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use std::cell::RefCell;
    use std::rc::Rc;

    const RATE: Duration = Duration::from_millis(200);

    fn recording() -> (Rc<RefCell<Vec<Symbol>>>, impl FnMut(Symbol) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |symbol| sink.borrow_mut().push(symbol))
    }

    fn manual() -> (ManualClock, Sequencer<ManualClock>) {
        let clock = ManualClock::new();
        (clock.clone(), Sequencer::with_clock(clock))
    }

    #[test]
    fn test_first_tick_waits_one_interval() {
        let (clock, mut seq) = manual();
        let (seen, hook) = recording();
        seq.start(encode("fffff").unwrap(), RATE, hook).unwrap();

        assert_eq!(seq.poll(), 0);
        clock.advance(RATE - Duration::from_millis(1));
        assert_eq!(seq.poll(), 0);
        assert!(seen.borrow().is_empty());

        clock.advance(Duration::from_millis(1));
        assert_eq!(seq.poll(), 1);
        assert_eq!(*seen.borrow(), vec![Symbol::One]);
        assert_eq!(seq.cursor(), Some(1));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let (_clock, mut seq) = manual();
        let frame = encode("abcde").unwrap();
        seq.start(frame.clone(), RATE, |_| {}).unwrap();
        assert_eq!(
            seq.start(frame, RATE, |_| {}),
            Err(SequencerError::AlreadyRunning)
        );
        assert!(seq.is_running());
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let (_clock, mut seq) = manual();
        let result = seq.start(encode("abcde").unwrap(), Duration::ZERO, |_| {});
        assert!(matches!(result, Err(SequencerError::InvalidRate(_))));
        assert!(!seq.is_running());
    }

    #[test]
    fn test_unrepresentable_rate_is_rejected() {
        let (_clock, mut seq) = manual();
        let result = seq.start(encode("abcde").unwrap(), Duration::MAX, |_| {});
        assert!(matches!(result, Err(SequencerError::InvalidRate(_))));
        assert!(!seq.is_running());
    }

    #[test]
    fn test_playback_ends_when_deadline_overflows() {
        let (clock, mut seq) = manual();
        let now = clock.now();

        // Largest whole-second offset the clock can still represent.
        let (mut lo, mut hi) = (0u64, u64::MAX);
        while lo < hi {
            let mid = lo + (hi - lo) / 2 + 1;
            if now.checked_add(Duration::from_secs(mid)).is_some() {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        let rate = Duration::from_secs(lo / 2 + 1);

        let (seen, hook) = recording();
        seq.start(encode("fffff").unwrap(), rate, hook).unwrap();
        clock.advance(rate);
        assert_eq!(seq.poll(), 1);
        assert_eq!(*seen.borrow(), vec![Symbol::One]);
        assert!(!seq.is_running());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (_clock, mut seq) = manual();
        seq.stop();
        seq.stop();
        assert!(!seq.is_running());
        assert_eq!(seq.cursor(), None);
    }

    #[test]
    fn test_no_emission_after_stop() {
        let (clock, mut seq) = manual();
        let (seen, hook) = recording();
        seq.start(encode("abcde").unwrap(), RATE, hook).unwrap();
        clock.advance(RATE * 3);
        assert_eq!(seq.poll(), 3);

        seq.stop();
        seq.stop();
        clock.advance(RATE * 10);
        assert_eq!(seq.poll(), 0);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_restart_after_stop_begins_at_zero() {
        let (clock, mut seq) = manual();
        seq.start(encode("abcde").unwrap(), RATE, |_| {}).unwrap();
        clock.advance(RATE * 5);
        seq.poll();
        seq.stop();

        seq.start(encode("00000").unwrap(), RATE, |_| {}).unwrap();
        assert_eq!(seq.cursor(), Some(0));
        assert_eq!(seq.ticks(), 0);
    }

    #[test]
    fn test_cursor_wraps_after_terminator() {
        for k in [0u32, 1, 7, 40, 41, 100] {
            let (clock, mut seq) = manual();
            let (seen, hook) = recording();
            seq.start(encode("abcde").unwrap(), RATE, hook).unwrap();

            clock.advance(RATE * (41 + k));
            seq.poll();
            assert_eq!(seq.cursor(), Some((k % 41) as usize));
            assert_eq!(seen.borrow()[40], Symbol::Terminator);
            if k > 0 {
                assert_eq!(seen.borrow()[41], Symbol::One);
            }
        }
    }

    #[test]
    fn test_deadlines_do_not_drift() {
        let (clock, mut seq) = manual();
        seq.start(encode("abcde").unwrap(), RATE, |_| {}).unwrap();

        // Poll late every time; ticks still land on multiples of the rate.
        for _ in 0..10 {
            clock.advance(RATE + Duration::from_millis(30));
            seq.poll();
        }
        assert_eq!(seq.ticks(), 11);
        assert_eq!(seq.next_tick_in(), Some(Duration::from_millis(100)));
    }
}
