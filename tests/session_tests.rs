//! Read/write transaction tests against the simulated backend.

use siscom_gpio::sim::{SimHandle, SimPins};
use siscom_gpio::{
    Cursor, Error, GroupKey, Selector, SessionPolicy, Siscom, SiscomConfig, CMD_SENSOR1,
    CMD_SENSOR2,
};
use std::io::{Read, Write};

const GROUP1: [u8; 2] = [10, 11];
const GROUP2: [u8; 4] = [12, 13, 19, 26];

fn start(config: SiscomConfig) -> (Siscom, SimHandle) {
    let _ = env_logger::builder().is_test(true).try_init();
    let pins = SimPins::new();
    let handle = pins.handle();
    let device = Siscom::start_detached(config, pins).expect("device should start");
    (device, handle)
}

fn set_pattern(sim: &SimHandle, lines: &[u8], pattern: u32) {
    for (i, &line) in lines.iter().enumerate() {
        sim.set_input(line, pattern & (1 << i) != 0);
    }
}

/// Writes `command` and reads once in a fresh session.
fn select_and_read(device: &Siscom, command: &str, buf_len: usize) -> Vec<u8> {
    let mut session = device.open().unwrap();
    assert_eq!(session.write(command.as_bytes()).unwrap(), command.len());
    let mut buf = vec![0u8; buf_len];
    let n = session.read(&mut buf).unwrap();
    buf.truncate(n);
    buf
}

#[test]
fn test_sensor1_reads_every_pattern() {
    let (device, sim) = start(SiscomConfig::default());
    for pattern in 0..4 {
        set_pattern(&sim, &GROUP1, pattern);
        let text = select_and_read(&device, CMD_SENSOR1, 16);
        assert_eq!(text, pattern.to_string().into_bytes());
    }
}

#[test]
fn test_sensor2_reads_every_pattern() {
    let (device, sim) = start(SiscomConfig::default());
    for pattern in 0..16 {
        set_pattern(&sim, &GROUP2, pattern);
        let text = select_and_read(&device, CMD_SENSOR2, 16);
        let value: u32 = String::from_utf8(text).unwrap().parse().unwrap();
        assert_eq!(value, pattern);
    }
}

#[test]
fn test_first_pin_is_least_significant() {
    let (device, sim) = start(SiscomConfig::default());
    sim.set_inputs(&[(12, false), (13, true), (19, false), (26, true)]);
    assert_eq!(select_and_read(&device, CMD_SENSOR2, 8), b"10");
    sim.set_inputs(&[(10, true), (11, false)]);
    assert_eq!(select_and_read(&device, CMD_SENSOR1, 8), b"1");
}

#[test]
fn test_unknown_command_reads_nothing() {
    let (device, sim) = start(SiscomConfig::default());
    sim.set_input(10, true);
    for command in ["sensor3", "SENSOR1", "sensor1 ", "sensor", ""] {
        assert!(select_and_read(&device, command, 8).is_empty(), "{:?}", command);
        assert_eq!(device.selector(), Selector::None);
    }
}

#[test]
fn test_unknown_command_clears_previous_selection() {
    let (device, _sim) = start(SiscomConfig::default());
    let mut session = device.open().unwrap();
    session.write(b"sensor2").unwrap();
    assert_eq!(device.selector(), Selector::Group(GroupKey(2)));
    session.write(b"bogus").unwrap();
    assert_eq!(device.selector(), Selector::None);
    let mut buf = [0u8; 4];
    assert_eq!(session.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_disabled_read_keeps_session_fresh() {
    let (device, sim) = start(SiscomConfig::default());
    sim.set_inputs(&[(10, true), (11, true)]);
    let mut session = device.open().unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(session.read(&mut buf).unwrap(), 0);
    assert_eq!(session.cursor(), Cursor::Fresh);

    session.write(b"sensor1").unwrap();
    assert_eq!(session.read(&mut buf).unwrap(), 1);
    assert_eq!(&buf[..1], b"3");
    assert_eq!(session.cursor(), Cursor::Exhausted);
}

#[test]
fn test_second_read_is_end_of_stream() {
    let (device, sim) = start(SiscomConfig::default());
    let mut session = device.open().unwrap();
    session.write(b"sensor2").unwrap();

    let mut buf = [0u8; 8];
    assert_eq!(session.read(&mut buf).unwrap(), 1);
    assert_eq!(&buf[..1], b"0");

    set_pattern(&sim, &GROUP2, 15);
    assert_eq!(session.read(&mut buf).unwrap(), 0);
    session.write(b"sensor1").unwrap();
    assert_eq!(session.read(&mut buf).unwrap(), 0);
    session.close();

    let mut session = device.open().unwrap();
    session.write(b"sensor2").unwrap();
    assert_eq!(session.read(&mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"15");
}

#[test]
fn test_short_buffer_truncates() {
    let (device, sim) = start(SiscomConfig::default());
    set_pattern(&sim, &GROUP2, 15);
    assert_eq!(select_and_read(&device, CMD_SENSOR2, 1), b"1");
    assert_eq!(select_and_read(&device, CMD_SENSOR2, 2), b"15");
    assert_eq!(select_and_read(&device, CMD_SENSOR2, 64), b"15");
}

#[test]
fn test_empty_buffer_does_not_consume_reading() {
    let (device, sim) = start(SiscomConfig::default());
    set_pattern(&sim, &GROUP1, 2);
    let mut session = device.open().unwrap();
    session.write(b"sensor1").unwrap();
    assert_eq!(session.read(&mut []).unwrap(), 0);
    assert_eq!(session.cursor(), Cursor::Fresh);
    let mut buf = [0u8; 4];
    assert_eq!(session.read(&mut buf).unwrap(), 1);
    assert_eq!(&buf[..1], b"2");
}

#[test]
fn test_write_consumes_whole_payload() {
    let (device, _sim) = start(SiscomConfig::default());
    let mut session = device.open().unwrap();
    let long = vec![b'x'; 300];
    assert_eq!(session.write(&long).unwrap(), 300);
    assert_eq!(session.write(b"sensor1").unwrap(), 7);
    assert_eq!(session.write(b"").unwrap(), 0);
}

#[test]
fn test_indicator_follows_selection_with_idle() {
    let (device, sim) = start(SiscomConfig::board());
    assert_eq!(device.lit_indicators(), vec![0]);
    assert!(sim.output(16));

    let mut session = device.open().unwrap();
    for (command, expected) in [("sensor1", 1), ("sensor2", 2), ("nope", 0), ("sensor2", 2)] {
        session.write(command.as_bytes()).unwrap();
        assert_eq!(device.lit_indicators(), vec![expected], "after {:?}", command);
        let lit: Vec<bool> = [16u8, 20, 21].iter().map(|&l| sim.output(l)).collect();
        assert_eq!(lit.iter().filter(|&&on| on).count(), 1);
        assert!(lit[expected]);
    }
}

#[test]
fn test_indicator_without_idle() {
    let (device, sim) = start(SiscomConfig::default());
    assert!(device.lit_indicators().is_empty());

    let mut session = device.open().unwrap();
    session.write(b"sensor1").unwrap();
    assert_eq!(device.lit_indicators(), vec![1]);
    assert!(sim.output(20));
    session.write(b"other").unwrap();
    assert!(device.lit_indicators().is_empty());
    assert!(!sim.output(16) && !sim.output(20) && !sim.output(21));
}

#[test]
fn test_exclusive_sessions() {
    let (device, _sim) = start(SiscomConfig::default());
    let first = device.open().unwrap();
    assert!(matches!(device.open(), Err(Error::Busy)));
    assert_eq!(device.open_sessions(), 1);
    drop(first);
    assert_eq!(device.open_sessions(), 0);
    let second = device.open().unwrap();
    second.close();
}

#[test]
fn test_busy_leaves_state_alone() {
    let (device, _sim) = start(SiscomConfig::board());
    let mut first = device.open().unwrap();
    first.write(b"sensor2").unwrap();
    assert!(device.open().is_err());
    assert_eq!(device.selector(), Selector::Group(GroupKey(2)));
    assert_eq!(device.lit_indicators(), vec![2]);
}

#[test]
fn test_shared_sessions() {
    let (device, sim) = start(SiscomConfig::default().with_sessions(SessionPolicy::Shared));
    set_pattern(&sim, &GROUP1, 1);
    let mut a = device.open().unwrap();
    let mut b = device.open().unwrap();
    assert_eq!(device.open_sessions(), 2);

    a.write(b"sensor1").unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(b.read(&mut buf).unwrap(), 1);
    assert_eq!(a.read(&mut buf).unwrap(), 1);
    assert_eq!(b.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_io_traits() {
    let (device, sim) = start(SiscomConfig::default());
    set_pattern(&sim, &GROUP2, 9);
    let mut session = device.open().unwrap();
    session.write_all(b"sensor2").unwrap();
    session.flush().unwrap();
    let mut text = String::new();
    session.read_to_string(&mut text).unwrap();
    assert_eq!(text, "9");
}

#[test]
fn test_initial_selection() {
    let config = SiscomConfig::board().with_initial_selection(Some(GroupKey(1)));
    let (device, sim) = start(config);
    assert_eq!(device.lit_indicators(), vec![1]);
    set_pattern(&sim, &GROUP1, 3);
    let mut session = device.open().unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(session.read(&mut buf).unwrap(), 1);
    assert_eq!(&buf[..1], b"3");
}

#[test]
fn test_sample_failure_is_an_error() {
    let (device, sim) = start(SiscomConfig::default());
    sim.fail_reads(19, true);
    let mut session = device.open().unwrap();
    session.write(b"sensor2").unwrap();
    let mut buf = [0u8; 4];
    assert!(matches!(
        session.read(&mut buf),
        Err(Error::ResourceUnavailable { .. })
    ));
    assert_eq!(session.cursor(), Cursor::Fresh);

    sim.fail_reads(19, false);
    assert_eq!(session.read(&mut buf).unwrap(), 1);
}

#[test]
fn test_open_after_shutdown() {
    let (mut device, _sim) = start(SiscomConfig::default());
    device.shutdown();
    assert!(!device.is_running());
    assert!(matches!(device.open(), Err(Error::NotRunning)));
}
