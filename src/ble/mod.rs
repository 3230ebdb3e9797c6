//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **SoftDevice** - enabled once at boot and run by its own task.
//! 2. **GATT server** - the test service, advertised and served by
//!    [`server::ble_task`].
//! 3. **Command transport** - the [`Transport`] the core uses; requests
//!    travel to the BLE task over a channel.
//!
//! Radio events flow the other way as [`PeripheralEvent`]s on a second
//! channel, drained by the main loop.

pub mod server;

use core::mem;

use blesim::config::{ATT_MTU, BLE_QUEUE_DEPTH, DEVICE_NAME};
use blesim::error::{BleError, Error};
use blesim::gatt::characteristic::{CharacteristicId, Value};
use blesim::peripheral::{PeripheralEvent, Transport};
use defmt::Format;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use nrf_softdevice::{raw, Softdevice};

/// Requests from the core to the BLE task.
#[derive(Clone, Format)]
pub enum BleCommand {
    /// Advertise until a central connects.
    StartAdvertising,
    /// Update a characteristic in the attribute table.
    SetValue(CharacteristicId, Value),
    /// Notify the Notify characteristic on the current link.
    Notify(Value),
}

pub type EventChannel = Channel<CriticalSectionRawMutex, PeripheralEvent, BLE_QUEUE_DEPTH>;
pub type EventSender = Sender<'static, CriticalSectionRawMutex, PeripheralEvent, BLE_QUEUE_DEPTH>;
pub type CommandChannel = Channel<CriticalSectionRawMutex, BleCommand, BLE_QUEUE_DEPTH>;
pub type CommandReceiver = Receiver<'static, CriticalSectionRawMutex, BleCommand, BLE_QUEUE_DEPTH>;
pub type CommandSender = Sender<'static, CriticalSectionRawMutex, BleCommand, BLE_QUEUE_DEPTH>;

/// [`Transport`] backed by the command channel.
///
/// Never blocks: a full queue is reported as [`BleError::QueueFull`].
pub struct CommandTransport {
    tx: CommandSender,
}

impl CommandTransport {
    pub fn new(tx: CommandSender) -> Self {
        Self { tx }
    }

    fn send(&self, cmd: BleCommand) -> Result<(), Error> {
        self.tx
            .try_send(cmd)
            .map_err(|_| Error::Ble(BleError::QueueFull))
    }
}

impl Transport for CommandTransport {
    fn start_advertising(&mut self) -> Result<(), Error> {
        self.send(BleCommand::StartAdvertising)
    }

    fn set_value(&mut self, id: CharacteristicId, value: &[u8]) -> Result<(), Error> {
        let value = Value::from_slice(value).map_err(|_| Error::ValueTooLong)?;
        self.send(BleCommand::SetValue(id, value))
    }

    fn notify(&mut self, value: &[u8]) -> Result<(), Error> {
        let value = Value::from_slice(value).map_err(|_| Error::ValueTooLong)?;
        self.send(BleCommand::Notify(value))
    }
}

/// Enable the SoftDevice with a single peripheral link.
pub fn enable_softdevice() -> &'static mut Softdevice {
    let config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: ATT_MTU }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        // One vendor base shared by the service and its characteristics.
        common_vs_uuid: Some(raw::ble_common_cfg_vs_uuid_t { vs_uuid_count: 1 }),
        ..Default::default()
    };

    Softdevice::enable(&config)
}

#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}
