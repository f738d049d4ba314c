//! GATT server and advertising loop.
//!
//! Service `224c9411-…` holds a single Temperature characteristic
//! (0x2A6E, read only) with a User Description descriptor (0x2901).
//! The value is never stored in the attribute table: every read is
//! deferred to the application so a fresh reading is produced, and
//! counted as activity, per request.

use core::mem;

use embassy_futures::select::select;
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, DeferredReadReply, WriteOp};
use nrf_softdevice::ble::{peripheral, Connection, Uuid};
use nrf_softdevice::{raw, Softdevice};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::ble::adv_data::{build_adv_data, build_scan_data, MAX_ADV_LEN};
use crate::ble::events::{DisconnectAction, PeripheralEventAdapter, PeripheralEvents};
use crate::config::{
    DebugLevel, ADV_INTERVAL, DEVICE_NAME, SERVICE_UUID_LE, TEMPERATURE_CHAR_UUID,
    TEMPERATURE_DESCRIPTION, USER_DESCRIPTION_UUID,
};
use crate::error::{BleError, Error};
use crate::power::{self, SchedulerCell};
use crate::sensor::{decode_temperature, RandomTemperature, TEMPERATURE_PAYLOAD_SIZE};
use crate::ui::{self, ConsoleCell};

/// Back-off after a failed advertising start.
const ADV_RETRY_MS: u64 = 500;

pub type NodeEvents = PeripheralEventAdapter<'static, SchedulerCell, RandomTemperature<SmallRng>>;

/// SoftDevice configuration: one peripheral link, device name in the
/// GAP service.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
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
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
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
        ..Default::default()
    }
}

/// Seed the placeholder sensor from the SoftDevice RNG.
pub fn seed_rng(sd: &Softdevice) -> Result<SmallRng, Error> {
    let mut seed = [0u8; 8];
    nrf_softdevice::random_bytes(sd, &mut seed).map_err(|_| BleError::Random)?;
    Ok(SmallRng::seed_from_u64(u64::from_le_bytes(seed)))
}

pub struct TemperatureServer {
    value_handle: u16,
    events: NodeEvents,
    console: &'static ConsoleCell,
}

impl TemperatureServer {
    /// Register the service. Must run before the SoftDevice task starts.
    pub fn new(
        sd: &mut Softdevice,
        events: NodeEvents,
        console: &'static ConsoleCell,
    ) -> Result<Self, Error> {
        let mut service = ServiceBuilder::new(sd, Uuid::new_128(&SERVICE_UUID_LE))?;

        let attr = Attribute::new([0u8; TEMPERATURE_PAYLOAD_SIZE]).deferred_read();
        let md = Metadata::new(Properties::new().read());
        let mut characteristic =
            service.add_characteristic(Uuid::new_16(TEMPERATURE_CHAR_UUID), attr, md)?;
        characteristic.add_descriptor(
            Uuid::new_16(USER_DESCRIPTION_UUID),
            Attribute::new(TEMPERATURE_DESCRIPTION.as_bytes()),
        )?;
        let handles = characteristic.build();
        let _ = service.build();

        Ok(Self {
            value_handle: handles.value_handle,
            events,
            console,
        })
    }

    pub fn events(&self) -> &NodeEvents {
        &self.events
    }
}

impl gatt_server::Server for TemperatureServer {
    type Event = ();

    fn on_write(
        &self,
        _conn: &Connection,
        _handle: u16,
        _op: WriteOp,
        _offset: usize,
        _data: &[u8],
    ) -> Option<Self::Event> {
        None
    }

    fn on_deferred_read(
        &self,
        handle: u16,
        _offset: usize,
        reply: DeferredReadReply,
    ) -> Option<Self::Event> {
        if handle == self.value_handle {
            let payload = self.events.on_read_requested();
            if let Some(celsius) = decode_temperature(&payload) {
                ui::log_fmt(
                    self.console,
                    DebugLevel::Verbose,
                    format_args!("read {} C", celsius),
                );
            }
            if let Err(e) = reply.reply(Ok(Some(payload.as_slice()))) {
                warn!("BLE: read reply failed: {}", e);
            }
        }
        None
    }
}

/// Advertise, serve one central at a time, repeat. Returns once
/// [`power::RADIO_OFF`] fires; dropping the futures stops advertising
/// and disconnects.
pub async fn run(sd: &'static Softdevice, server: &'static TemperatureServer) {
    select(serve(sd, server), power::RADIO_OFF.wait()).await;
    info!("BLE: radio off");
}

async fn serve(sd: &'static Softdevice, server: &'static TemperatureServer) {
    let mut adv_data = [0u8; MAX_ADV_LEN];
    let adv_len = build_adv_data(&SERVICE_UUID_LE, &mut adv_data);
    let mut scan_data = [0u8; MAX_ADV_LEN];
    let scan_len = build_scan_data(DEVICE_NAME, &mut scan_data);

    let config = peripheral::Config {
        interval: ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv_data[..adv_len],
            scan_data: &scan_data[..scan_len],
        };

        debug!("BLE: advertising");
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("BLE: advertising failed: {}", e);
                Timer::after(Duration::from_millis(ADV_RETRY_MS)).await;
                continue;
            }
        };

        server.events().on_connect();
        ui::log(server.console, DebugLevel::Verbose, "connected");

        let _ = gatt_server::run(&conn, server, |_| {}).await;

        ui::log(server.console, DebugLevel::Verbose, "disconnected");
        match server.events().on_disconnect() {
            DisconnectAction::Advertise => {}
            DisconnectAction::Halt(secs) => {
                power::request_halt(secs);
                core::future::pending::<()>().await;
            }
        }
    }
}
