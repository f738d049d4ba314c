//! Integration tests for tempnode host-testable logic.

use core::cell::RefCell;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tempnode::ble::{DisconnectAction, PeripheralEventAdapter, PeripheralEvents};
use tempnode::config::{
    DisconnectPolicy, ACTIVITY_TIMEOUT_SECONDS, AWAKE_SECONDS, BUTTON_HOLD_MS, SLEEP_SECONDS,
    TEMP_MAX_C, TEMP_MIN_C,
};
use tempnode::sensor::{decode_temperature, RandomTemperature, SensorValueProvider};
use tempnode::ui::{Command, InputDispatcher};
use tempnode::{
    ActivitySleepScheduler, Decision, ManualClock, NodeConfig, PersistentClock, PersistentState,
    RetainedImage, SharedScheduler, Timestamp,
};

fn config(policy: DisconnectPolicy) -> NodeConfig {
    NodeConfig {
        disconnect_policy: policy,
        ..NodeConfig::DEFAULT
    }
}

#[test]
fn duty_cycle_off_then_on_then_sleep() {
    let clock = ManualClock::new(0);
    let mut s = ActivitySleepScheduler::new(
        &clock,
        PersistentState::zeroed(),
        config(DisconnectPolicy::ResumeAdvertising),
    );
    s.boot();

    clock.set(60);
    assert_eq!(s.evaluate(), Decision::Continue);

    s.toggle_duty_cycle();
    assert_eq!(s.evaluate(), Decision::Continue);

    clock.set(60 + u64::from(AWAKE_SECONDS) + 1);
    assert_eq!(s.evaluate(), Decision::EnterSleep(SLEEP_SECONDS));
}

#[test]
fn connect_keeps_node_awake_for_activity_timeout() {
    let clock = ManualClock::new(1_000);
    let shared = RefCell::new(ActivitySleepScheduler::new(
        &clock,
        PersistentState::zeroed(),
        config(DisconnectPolicy::ResumeAdvertising),
    ));
    shared.with(|s| s.set_duty_cycle(true));

    let source = RandomTemperature::new(SmallRng::seed_from_u64(1));
    let events = PeripheralEventAdapter::new(
        &shared,
        SensorValueProvider::new(source, ACTIVITY_TIMEOUT_SECONDS),
    );
    events.on_connect();

    let timeout = u64::from(ACTIVITY_TIMEOUT_SECONDS);
    clock.set(1_000 + timeout - 1);
    assert_eq!(shared.with(|s| s.evaluate()), Decision::Continue);
    clock.set(1_000 + timeout + 1);
    assert_eq!(shared.with(|s| s.evaluate()), Decision::EnterSleep(SLEEP_SECONDS));
}

#[test]
fn reads_stay_in_bounds_and_extend_deadline() {
    let clock = ManualClock::new(10);
    let shared = RefCell::new(ActivitySleepScheduler::new(
        &clock,
        PersistentState::zeroed(),
        config(DisconnectPolicy::ResumeAdvertising),
    ));
    let source = RandomTemperature::new(SmallRng::seed_from_u64(42));
    let events = PeripheralEventAdapter::new(
        &shared,
        SensorValueProvider::new(source, ACTIVITY_TIMEOUT_SECONDS),
    );

    for t in 10..200 {
        clock.set(t);
        let payload = events.on_read_requested();
        let celsius = decode_temperature(&payload).expect("two-byte payload");
        assert!((i16::from(TEMP_MIN_C)..=i16::from(TEMP_MAX_C)).contains(&celsius));

        let state = shared.borrow().state();
        assert_eq!(i16::from(state.last_value), celsius);
        assert_eq!(
            state.sleep_deadline,
            Timestamp(t + u64::from(ACTIVITY_TIMEOUT_SECONDS))
        );
    }
}

#[test]
fn resume_advertising_leaves_scheduler_alone() {
    let clock = ManualClock::new(5);
    let shared = RefCell::new(ActivitySleepScheduler::new(
        &clock,
        PersistentState::zeroed(),
        config(DisconnectPolicy::ResumeAdvertising),
    ));
    let source = RandomTemperature::new(SmallRng::seed_from_u64(3));
    let events = PeripheralEventAdapter::new(&shared, SensorValueProvider::new(source, 8));

    events.on_connect();
    let before = shared.borrow().state();
    assert_eq!(events.on_disconnect(), DisconnectAction::Advertise);
    assert_eq!(shared.borrow().state(), before);
}

#[test]
fn halt_and_resume_through_retained_image() {
    let uptime = ManualClock::new(0);
    let cfg = config(DisconnectPolicy::ResumeAdvertising);

    let mut first = ActivitySleepScheduler::new(
        PersistentClock::new(Timestamp::ZERO, &uptime),
        PersistentState::zeroed(),
        cfg,
    );
    first.boot();
    first.set_duty_cycle(true);
    first.remember_value(23);

    uptime.set(u64::from(AWAKE_SECONDS) + 1);
    let secs = match first.evaluate() {
        Decision::EnterSleep(secs) => secs,
        Decision::Continue => panic!("expected the node to sleep"),
    };
    let halted_at = first.state().now;
    let image: RetainedImage = first.halt_for(secs);

    // Reset: uptime starts over, the image brings the clock and state back.
    uptime.set(0);
    let restored = image.restore().expect("image written by halt_for");
    let mut second = ActivitySleepScheduler::new(
        PersistentClock::new(restored.clock_base, &uptime),
        restored.state,
        cfg,
    );
    assert_eq!(second.state(), first.state());
    assert!(second.now() >= halted_at);

    second.boot();
    assert!(second.duty_cycle_enabled());
    assert_eq!(second.state().last_value, 23);
    assert_eq!(second.evaluate(), Decision::Continue);
}

#[test]
fn button_b_toggles_duty_cycle() {
    let clock = ManualClock::new(0);
    let mut s = ActivitySleepScheduler::new(
        &clock,
        PersistentState::zeroed(),
        config(DisconnectPolicy::ResumeAdvertising),
    );
    let mut input = InputDispatcher::new(BUTTON_HOLD_MS);

    let mut t = 0;
    let mut press = |levels: [bool; 3], s: &mut ActivitySleepScheduler<&ManualClock>| {
        for command in input.poll(levels, t) {
            if command == Command::ToggleDutyCycle {
                s.toggle_duty_cycle();
            }
        }
        t += 10;
    };

    press([false, true, false], &mut s);
    press([false, true, false], &mut s);
    assert!(!s.duty_cycle_enabled());
    press([false, false, false], &mut s);
    assert!(s.duty_cycle_enabled());
}
