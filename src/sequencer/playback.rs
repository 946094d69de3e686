/// Playback engine - drives a sequencer on the calling thread and reports events
use std::ops::ControlFlow;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use log::debug;

use super::{Sequencer, SystemClock, TimeSource};
use crate::encoder::{Frame, Symbol};
use crate::error::SequencerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    SymbolEmitted { index: usize, symbol: Symbol },
    FrameCompleted { frames: u64 },
    Stopped,
}

pub struct PlaybackEngine<C: TimeSource = SystemClock> {
    sequencer: Sequencer<C>,
    sender: Sender<PlaybackEvent>,
    receiver: Receiver<PlaybackEvent>,
}

impl PlaybackEngine<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for PlaybackEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TimeSource> PlaybackEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        let (sender, receiver) = channel();

        Self {
            sequencer: Sequencer::with_clock(clock),
            sender,
            receiver,
        }
    }

    pub fn sequencer(&self) -> &Sequencer<C> {
        &self.sequencer
    }

    pub fn start(
        &mut self,
        frame: Frame,
        rate: Duration,
        mut on_symbol: impl FnMut(Symbol) + 'static,
    ) -> Result<(), SequencerError> {
        let sender = self.sender.clone();
        let frame_len = frame.len();
        let mut index = 0;
        let mut frames = 0;

        self.sequencer.start(frame, rate, move |symbol| {
            on_symbol(symbol);
            let _ = sender.send(PlaybackEvent::SymbolEmitted { index, symbol });

            index = (index + 1) % frame_len;
            if index == 0 {
                frames += 1;
                let _ = sender.send(PlaybackEvent::FrameCompleted { frames });
            }
        })
    }

    pub fn stop(&mut self) {
        if self.sequencer.is_running() {
            self.sequencer.stop();
            let _ = self.sender.send(PlaybackEvent::Stopped);
        }
    }

    pub fn is_running(&self) -> bool {
        self.sequencer.is_running()
    }

    pub fn poll(&mut self) -> usize {
        self.sequencer.poll()
    }

    pub fn poll_events(&self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Sleep from deadline to deadline until `on_event` breaks or playback stops.
    pub fn run(&mut self, mut on_event: impl FnMut(&PlaybackEvent) -> ControlFlow<()>) {
        while let Some(wait) = self.sequencer.next_tick_in() {
            if !wait.is_zero() {
                self.sequencer.clock().sleep(wait);
            }
            self.sequencer.poll();

            for event in self.poll_events() {
                if on_event(&event).is_break() {
                    debug!("run loop interrupted by caller");
                    self.stop();
                    self.poll_events();
                    return;
                }
            }
        }
    }
}
