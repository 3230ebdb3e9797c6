//! blesim firmware entry point.
//!
//! Boots the nRF52840, enables the SoftDevice, brings up the OLED and
//! then runs the cooperative main loop: radio events are drained from a
//! channel and handed to the peripheral core, and the core is polled
//! every `LOOP_TICK_MS` for notification ticks and re-advertising.

#![no_std]
#![no_main]

mod ble;
mod ui;

use blesim::config::LOOP_TICK_MS;
use blesim::peripheral::Peripheral;
use blesim::PeripheralConfig;
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_time::{Instant, Timer};
use {defmt_rtt as _, panic_probe as _};

use crate::ble::server::{ble_task, Server};
use crate::ble::{CommandChannel, CommandTransport, EventChannel};
use crate::ui::display::OledSink;

bind_interrupts!(struct Irqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static BLE_EVENTS: EventChannel = EventChannel::new();
static BLE_COMMANDS: CommandChannel = CommandChannel::new();

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("blesim starting");

    // Priorities 0, 1 and 4 belong to the SoftDevice.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);
    interrupt::TWISPI0.set_priority(Priority::P3);

    let sd = ble::enable_softdevice();
    let server = unwrap!(Server::new(sd));
    unwrap!(spawner.spawn(ble::softdevice_task(sd)));

    let config = PeripheralConfig::default();

    // OLED on SDA = P0.26, SCL = P0.27
    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let display = match OledSink::init(i2c) {
        Ok(display) => display,
        Err(e) => match config.display_init.resolve(e) {
            Ok(()) => OledSink::detached(),
            Err(e) => defmt::panic!("display init failed: {}", e),
        },
    };

    unwrap!(spawner.spawn(ble_task(
        sd,
        server,
        BLE_COMMANDS.receiver(),
        BLE_EVENTS.sender(),
    )));

    let transport = CommandTransport::new(BLE_COMMANDS.sender());
    let mut app = Peripheral::new(config, display, transport);
    app.start(now_ms());

    loop {
        if let Either::First(event) =
            select(BLE_EVENTS.receive(), Timer::after_millis(LOOP_TICK_MS)).await
        {
            event.dispatch(&mut app, now_ms());
        }
        app.poll(now_ms());
    }
}
