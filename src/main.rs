//! tempnode firmware entry point.
//!
//! Startup restores whatever the last halt left in retained RAM, brings
//! up the display, buttons and SoftDevice, then runs the control loop:
//! every tick it polls the buttons, asks the scheduler whether to halt,
//! and redraws the console when it changed.

#![no_std]
#![no_main]

#[macro_use]
mod fmt;

mod ble;
mod clock;
mod config;
mod error;
mod power;
mod power_logic;
mod sensor;
mod storage;
mod ui;

use core::cell::RefCell;

use defmt::unwrap;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::gpio::Pin as _;
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant, Ticker};
use nrf_softdevice::Softdevice;
use panic_probe as _;
use static_cell::StaticCell;

use crate::ble::adv_data::format_uuid128;
use crate::ble::events::PeripheralEventAdapter;
use crate::ble::server::TemperatureServer;
use crate::clock::{PersistentClock, Timestamp};
use crate::config::{
    DebugLevel, NodeConfig, BUTTON_HOLD_MS, CONTROL_TICK_MS, DEVICE_NAME, SERVICE_UUID,
    TEMPERATURE_CHAR_UUID,
};
use crate::power::{SchedulerCell, Uptime};
use crate::power_logic::{ActivitySleepScheduler, Decision, SharedScheduler};
use crate::sensor::{RandomTemperature, SensorValueProvider};
use crate::storage::PersistentState;
use crate::ui::buttons::Buttons;
use crate::ui::{Command, Console, ConsoleCell, InputDispatcher};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static SCHEDULER: StaticCell<SchedulerCell> = StaticCell::new();
static CONSOLE: StaticCell<ConsoleCell> = StaticCell::new();
static SERVER: StaticCell<TemperatureServer> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice, server: &'static TemperatureServer) {
    ble::server::run(sd, server).await;
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("tempnode starting");

    // The SoftDevice owns priorities 0, 1 and 4.
    let mut hw = embassy_nrf::config::Config::default();
    hw.gpiote_interrupt_priority = Priority::P2;
    hw.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(hw);

    let node = NodeConfig::DEFAULT;
    let (state, base) = match power::take_retained() {
        Some(restored) => {
            info!("Power: resumed, clock at {}", restored.clock_base.as_secs());
            (restored.state, restored.clock_base)
        }
        None => {
            info!("Power: cold boot");
            (PersistentState::zeroed(), Timestamp::ZERO)
        }
    };

    let scheduler: &'static SchedulerCell = SCHEDULER.init(Mutex::new(RefCell::new(
        ActivitySleepScheduler::new(PersistentClock::new(base, Uptime), state, node),
    )));
    let console: &'static ConsoleCell =
        CONSOLE.init(Mutex::new(RefCell::new(Console::new(node.debug_level))));

    // Display + buttons
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let mut display = unwrap!(ui::display::init(i2c));
    let buttons = Buttons::new(p.P0_11.degrade(), p.P0_12.degrade(), p.P0_24.degrade());

    // BLE
    let sd = Softdevice::enable(&ble::server::softdevice_config());
    let rng = unwrap!(ble::server::seed_rng(sd));
    let events = PeripheralEventAdapter::new(
        scheduler,
        SensorValueProvider::new(RandomTemperature::new(rng), node.activity_timeout_secs),
    );
    let server: &'static TemperatureServer =
        SERVER.init(unwrap!(TemperatureServer::new(sd, events, console)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(ble_task(sd, server)));

    let duty_cycle = scheduler.with(|s| s.duty_cycle_enabled());
    log_banner(console, duty_cycle);

    scheduler.with(|s| s.boot());

    let mut input = InputDispatcher::new(BUTTON_HOLD_MS);
    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_TICK_MS));

    loop {
        for command in input.poll(buttons.levels(), Instant::now().as_millis()) {
            match command {
                Command::ClearDisplay => console.lock(|c| c.borrow_mut().clear()),
                Command::ToggleDutyCycle => {
                    let enabled = scheduler.with(|s| s.toggle_duty_cycle());
                    ui::log_fmt(
                        console,
                        DebugLevel::Light,
                        format_args!("duty cycle: {}", on_off(enabled)),
                    );
                }
                Command::HardReset => power::hard_reset(),
            }
        }

        let halt_secs = match scheduler.with(|s| s.evaluate()) {
            Decision::EnterSleep(secs) => Some(secs),
            Decision::Continue => power::HALT_REQUEST.try_take(),
        };
        if let Some(secs) = halt_secs {
            ui::display::power_off(&mut display);
            let image = scheduler.with(|s| s.halt_for(secs));
            power::halt(secs, image).await;
        }

        // Snapshot under the lock, draw outside it: the I²C flush is slow.
        let snapshot = console.lock(|c| {
            let mut c = c.borrow_mut();
            c.take_dirty().then(|| c.clone())
        });
        if let Some(snapshot) = snapshot {
            ui::display::draw_console(&mut display, &snapshot);
        }

        ticker.next().await;
    }
}

fn log_banner(console: &ConsoleCell, duty_cycle: bool) {
    let uuid = format_uuid128(&SERVICE_UUID);
    // 36 characters do not fit on one row.
    let (head, tail) = uuid.as_str().split_at(18);

    ui::log(console, DebugLevel::Light, DEVICE_NAME);
    ui::log(console, DebugLevel::Light, head);
    ui::log(console, DebugLevel::Light, tail);
    ui::log_fmt(
        console,
        DebugLevel::Light,
        format_args!("char 0x{:04X}", TEMPERATURE_CHAR_UUID),
    );
    ui::log_fmt(
        console,
        DebugLevel::Light,
        format_args!("duty cycle: {}", on_off(duty_cycle)),
    );
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
