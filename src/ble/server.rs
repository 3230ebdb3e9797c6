//! GATT server for the test service and the task that advertises it.
//!
//! The task owns the radio side of the link: it advertises when the core
//! asks for it, reports connects, writes and disconnects as
//! [`PeripheralEvent`]s, and applies [`BleCommand`]s while a central is
//! attached.

use blesim::ble::adv::{advertising_data, scan_response, AdvData};
use blesim::config::{
    ADV_INTERVAL, BLE_CONN_INTERVAL_MAX, BLE_CONN_INTERVAL_MIN, BLE_SLAVE_LATENCY,
    BLE_SUP_TIMEOUT, DEVICE_NAME, RECONNECT_GRACE_MS, SERVICE_UUID,
};
use blesim::error::{BleError, Error};
use blesim::gatt::characteristic::{CharacteristicId, Value};
use blesim::peripheral::PeripheralEvent;
use defmt::{debug, info, unwrap, warn};
use embassy_futures::select::{select, Either};
use embassy_time::Timer;
use nrf_softdevice::ble::{gatt_server, peripheral, Connection};
use nrf_softdevice::{raw, Softdevice};

use crate::ble::{BleCommand, CommandReceiver, EventSender};

// UUID literals must match `SERVICE_UUID` and the `*_CHAR_UUID`
// constants in blesim::config.
#[nrf_softdevice::gatt_service(uuid = "5a1d0000-8f3c-4b8e-9b2a-6c1f0e7d4a10")]
pub struct TestService {
    #[characteristic(uuid = "5a1d0001-8f3c-4b8e-9b2a-6c1f0e7d4a10", write)]
    write_char: Value,
    #[characteristic(uuid = "5a1d0002-8f3c-4b8e-9b2a-6c1f0e7d4a10", read)]
    read_char: Value,
    #[characteristic(uuid = "5a1d0003-8f3c-4b8e-9b2a-6c1f0e7d4a10", notify)]
    notify_char: Value,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub test: TestService,
}

impl Server {
    fn set_value(&self, id: CharacteristicId, value: &Value) -> Result<(), Error> {
        let res = match id {
            CharacteristicId::Write => self.test.write_char_set(value),
            CharacteristicId::Read => self.test.read_char_set(value),
            CharacteristicId::Notify => self.test.notify_char_set(value),
        };
        res.map_err(|e| {
            debug!("set {:?}: {:?}", id, e);
            BleError::SetValueFailed.into()
        })
    }

    fn notify(&self, conn: &Connection, value: &Value) -> Result<(), Error> {
        self.test.notify_char_notify(conn, value).map_err(|e| {
            debug!("notify: {:?}", e);
            BleError::NotifyFailed.into()
        })
    }

    fn apply(&self, id: CharacteristicId, value: &Value) {
        if let Err(e) = self.set_value(id, value) {
            warn!("{:?} not updated: {}", id, e);
        }
    }
}

/// Wait for a `StartAdvertising` request, applying value updates that
/// arrive meanwhile.
async fn wait_for_advertise(server: &Server, commands: &CommandReceiver) {
    loop {
        match commands.receive().await {
            BleCommand::StartAdvertising => return,
            BleCommand::SetValue(id, value) => server.apply(id, &value),
            BleCommand::Notify(_) => debug!("notify without a link - dropped"),
        }
    }
}

async fn advertise(sd: &Softdevice, adv_data: &AdvData, scan_data: &AdvData) -> Connection {
    let config = peripheral::Config {
        interval: ADV_INTERVAL,
        ..Default::default()
    };
    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data,
            scan_data,
        };
        match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => return conn,
            Err(e) => {
                warn!("advertising failed: {:?}, retrying", e);
                Timer::after_millis(RECONNECT_GRACE_MS).await;
            }
        }
    }
}

/// Apply commands on the live link until the connection drops.
async fn serve_commands(server: &Server, conn: &Connection, commands: &CommandReceiver) -> ! {
    loop {
        match commands.receive().await {
            BleCommand::SetValue(id, value) => server.apply(id, &value),
            BleCommand::Notify(value) => {
                // Usually fails because the central has not enabled
                // notifications; keep the value readable from the table.
                if let Err(e) = server.notify(conn, &value) {
                    debug!("{}", e);
                    server.apply(CharacteristicId::Notify, &value);
                }
            }
            BleCommand::StartAdvertising => debug!("already connected"),
        }
    }
}

#[embassy_executor::task]
pub async fn ble_task(
    sd: &'static Softdevice,
    server: Server,
    commands: CommandReceiver,
    events: EventSender,
) -> ! {
    let adv_data = unwrap!(advertising_data(SERVICE_UUID, DEVICE_NAME));
    let scan_data = unwrap!(scan_response(SERVICE_UUID));

    loop {
        wait_for_advertise(&server, &commands).await;
        info!("advertising as {}", DEVICE_NAME);
        let conn = advertise(sd, &adv_data, &scan_data).await;

        let params = raw::ble_gap_conn_params_t {
            min_conn_interval: BLE_CONN_INTERVAL_MIN,
            max_conn_interval: BLE_CONN_INTERVAL_MAX,
            slave_latency: BLE_SLAVE_LATENCY,
            conn_sup_timeout: BLE_SUP_TIMEOUT,
        };
        if let Err(e) = conn.set_conn_params(params) {
            warn!("connection parameter request failed: {:?}", e);
        }
        events.send(PeripheralEvent::Connected).await;

        let gatt = gatt_server::run(&conn, &server, |e| match e {
            ServerEvent::Test(TestServiceEvent::WriteCharWrite(value)) => {
                if events.try_send(PeripheralEvent::Write(value)).is_err() {
                    warn!("event queue full, write dropped");
                }
            }
            ServerEvent::Test(TestServiceEvent::NotifyCharCccdWrite { notifications }) => {
                info!("notifications enabled: {}", notifications);
            }
        });

        match select(gatt, serve_commands(&server, &conn, &commands)).await {
            Either::First(_) => info!("link closed"),
            Either::Second(never) => match never {},
        }
        events.send(PeripheralEvent::Disconnected).await;
    }
}
