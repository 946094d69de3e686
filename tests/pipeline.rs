use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use blinkseq::transport::{parse_rate, resolve_key, LaunchParams};
use blinkseq::{encode, Color, Identifier, ManualClock, Sequencer, SequencerError, Symbol};

#[test]
fn test_launch_url_to_colors() {
    let params = LaunchParams::from_query("key=ABCDE&rate=250").unwrap();
    let key = resolve_key(params.key.as_deref(), Some("fffff")).unwrap();
    let rate = params.rate.unwrap_or(parse_rate(None).unwrap());
    assert_eq!(rate, Duration::from_millis(250));

    let frame = Identifier::parse(&key).unwrap().to_frame().unwrap();
    let clock = ManualClock::new();
    let mut seq = Sequencer::with_clock(clock.clone());

    let colors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&colors);
    seq.start(frame, rate, move |symbol: Symbol| sink.borrow_mut().push(symbol.color()))
        .unwrap();

    // Two full frames plus the first bit of the third.
    clock.advance(rate * 83);
    assert_eq!(seq.poll(), 83);
    seq.stop();
    clock.advance(rate * 10);
    assert_eq!(seq.poll(), 0);

    let colors = colors.borrow();
    assert_eq!(colors.len(), 83);
    // 0xA = 1010
    assert_eq!(
        &colors[..8],
        &[
            Color::GREEN,
            Color::BLACK,
            Color::BLUE,
            Color::BLACK,
            Color::GREEN,
            Color::BLACK,
            Color::BLUE,
            Color::BLACK
        ]
    );
    assert_eq!(colors[40], Color::RED);
    assert_eq!(colors[81], Color::RED);
    assert_eq!(colors[82], Color::GREEN);
    assert_eq!(colors.iter().filter(|c| **c == Color::RED).count(), 2);
}

#[test]
fn test_independent_sequencers() {
    let clock = ManualClock::new();
    let mut a = Sequencer::with_clock(clock.clone());
    let mut b = Sequencer::with_clock(clock.clone());

    a.start(encode("00000").unwrap(), Duration::from_millis(100), |_| {})
        .unwrap();
    b.start(encode("fffff").unwrap(), Duration::from_millis(300), |_| {})
        .unwrap();
    assert_eq!(
        a.start(encode("12345").unwrap(), Duration::from_millis(100), |_| {}),
        Err(SequencerError::AlreadyRunning)
    );

    clock.advance(Duration::from_millis(900));
    a.poll();
    b.poll();
    assert_eq!(a.cursor(), Some(9));
    assert_eq!(b.cursor(), Some(3));

    a.stop();
    assert!(!a.is_running());
    assert!(b.is_running());
}
