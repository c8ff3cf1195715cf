//! In-memory collaborators for unit tests

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use pulsedeck_hal::{I2cBus, LinkError, LinkRx, LinkTx, Peripheral};
use pulsedeck_protocol::frame::decode;
use pulsedeck_protocol::{Frame, KeyCombo, MediaKey, Message};

use crate::config::ButtonAddr;
use crate::traits::{
    Element, GuiToolkit, HostOutput, HostOutputError, ResourceMeter, ResourceUsage, UiError,
};

/// Bytes each live element costs in [`FakeToolkit`]
pub const ELEMENT_COST: u32 = 96;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drawn {
    Header { page_label: String, profile_label: String },
    Button { addr: ButtonAddr, label: String },
}

impl From<Element<'_>> for Drawn {
    fn from(element: Element<'_>) -> Self {
        match element {
            Element::Header {
                page_label,
                profile_label,
                ..
            } => Drawn::Header {
                page_label: page_label.into(),
                profile_label: profile_label.into(),
            },
            Element::Button { addr, label } => Drawn::Button {
                addr,
                label: label.into(),
            },
        }
    }
}

#[derive(Default)]
pub struct FakeToolkit {
    next: u32,
    live: BTreeMap<u32, Drawn>,
    high_water: u32,
    /// Creates that succeed before the heap runs out
    pub fail_after: Option<usize>,
    pub creates: usize,
    pub updates: usize,
    pub destroys: usize,
}

impl FakeToolkit {
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Live buttons in creation order
    pub fn buttons(&self) -> Vec<(ButtonAddr, String)> {
        self.live
            .values()
            .filter_map(|d| match d {
                Drawn::Button { addr, label } => Some((*addr, label.clone())),
                Drawn::Header { .. } => None,
            })
            .collect()
    }

    pub fn header(&self) -> Option<Drawn> {
        self.live
            .values()
            .find(|d| matches!(d, Drawn::Header { .. }))
            .cloned()
    }

    pub fn button_labeled(&self, label: &str) -> Option<ButtonAddr> {
        self.buttons()
            .into_iter()
            .find(|(_, l)| l == label)
            .map(|(addr, _)| addr)
    }
}

impl ResourceMeter for FakeToolkit {
    fn usage(&self) -> ResourceUsage {
        ResourceUsage {
            used_bytes: self.live.len() as u32 * ELEMENT_COST,
            high_water_bytes: self.high_water,
            elements: self.live.len() as u16,
        }
    }
}

impl GuiToolkit for FakeToolkit {
    type Handle = u32;

    fn create(&mut self, element: Element<'_>) -> Result<u32, UiError> {
        if let Some(limit) = self.fail_after {
            if self.creates >= limit {
                return Err(UiError::OutOfMemory);
            }
        }
        self.creates += 1;
        self.next += 1;
        self.live.insert(self.next, element.into());
        self.high_water = self.high_water.max(self.live.len() as u32 * ELEMENT_COST);
        Ok(self.next)
    }

    fn update(&mut self, handle: u32, element: Element<'_>) -> Result<(), UiError> {
        let slot = self.live.get_mut(&handle).ok_or(UiError::InvalidHandle)?;
        *slot = element.into();
        self.updates += 1;
        Ok(())
    }

    fn destroy(&mut self, handle: u32) {
        assert!(self.live.remove(&handle).is_some(), "double destroy");
        self.destroys += 1;
    }
}

#[derive(Default)]
struct LinkState {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    fail_writes: bool,
    rx_error: Option<LinkError>,
    writes: usize,
}

/// Loopback-style link whose far end the test controls
#[derive(Clone, Default)]
pub struct FakeLink(Rc<RefCell<LinkState>>);

impl FakeLink {
    pub fn inject(&self, bytes: &[u8]) {
        self.0.borrow_mut().rx.extend(bytes.iter().copied());
    }

    pub fn inject_frame(&self, frame: &Frame) {
        self.inject(&frame.encode_to_vec().unwrap());
    }

    pub fn inject_message(&self, message: Message<'_>) {
        self.inject_frame(&message.to_frame().unwrap());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.0.borrow_mut().fail_writes = fail;
    }

    pub fn fail_next_read(&self, error: LinkError) {
        self.0.borrow_mut().rx_error = Some(error);
    }

    pub fn write_attempts(&self) -> usize {
        self.0.borrow().writes
    }

    /// Frames written so far, oldest first
    pub fn take_sent(&self) -> Vec<Frame> {
        let bytes = std::mem::take(&mut self.0.borrow_mut().tx);
        let mut frames = Vec::new();
        let mut rest = &bytes[..];
        while !rest.is_empty() {
            let (frame, used) = decode(rest).unwrap();
            frames.push(frame);
            rest = &rest[used..];
        }
        frames
    }
}

impl LinkRx for FakeLink {
    fn poll_read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let mut state = self.0.borrow_mut();
        if let Some(e) = state.rx_error.take() {
            return Err(e);
        }
        let n = buf.len().min(state.rx.len());
        for (dst, src) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl LinkTx for FakeLink {
    fn try_write(&mut self, data: &[u8]) -> Result<(), LinkError> {
        let mut state = self.0.borrow_mut();
        state.writes += 1;
        if state.fail_writes {
            return Err(LinkError::Busy);
        }
        state.tx.extend_from_slice(data);
        Ok(())
    }
}

#[derive(Default)]
pub struct HostState {
    pub hotkeys: Vec<KeyCombo>,
    pub media: Vec<MediaKey>,
    pub fail: bool,
}

#[derive(Clone, Default)]
pub struct FakeHost(pub Rc<RefCell<HostState>>);

impl HostOutput for FakeHost {
    fn send_hotkey(&mut self, combo: KeyCombo) -> Result<(), HostOutputError> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(HostOutputError::NotReady);
        }
        state.hotkeys.push(combo);
        Ok(())
    }

    fn send_media(&mut self, key: MediaKey) -> Result<(), HostOutputError> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(HostOutputError::NotReady);
        }
        state.media.push(key);
        Ok(())
    }
}

pub const BACKLIGHT_ADDR: u8 = 0x2C;
pub const GAUGE_ADDR: u8 = 0x36;

/// Register file keyed by (device, register)
#[derive(Default)]
pub struct FakeI2c {
    pub regs: HashMap<(u8, u8), u8>,
    pub fail: bool,
    pub transactions: usize,
}

impl I2cBus for FakeI2c {
    type Error = ();

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), ()> {
        self.transactions += 1;
        if self.fail {
            return Err(());
        }
        for (i, byte) in data[1..].iter().enumerate() {
            self.regs.insert((address, data[0] + i as u8), *byte);
        }
        Ok(())
    }

    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<(), ()> {
        self.transactions += 1;
        if self.fail {
            return Err(());
        }
        for (i, byte) in read.iter_mut().enumerate() {
            *byte = *self.regs.get(&(address, write[0] + i as u8)).unwrap_or(&0);
        }
        Ok(())
    }
}

/// PWM backlight driver: duty percent in register 0x01
pub struct FakeBacklight;

impl Peripheral<FakeI2c> for FakeBacklight {
    type Value = u8;

    fn init(&mut self, bus: &mut FakeI2c) -> bool {
        bus.write_reg(BACKLIGHT_ADDR, 0x00, 0x01).is_ok()
    }

    fn read(&mut self, bus: &mut FakeI2c) -> Result<u8, ()> {
        Ok((bus.read_reg_u16(BACKLIGHT_ADDR, 0x01)? >> 8) as u8)
    }

    fn set(&mut self, bus: &mut FakeI2c, value: u8) -> Result<(), ()> {
        bus.write_reg(BACKLIGHT_ADDR, 0x01, value)
    }
}

/// Fuel gauge: state of charge percent in the high byte of register 0x04
pub struct FakeGauge;

impl Peripheral<FakeI2c> for FakeGauge {
    type Value = u8;

    fn init(&mut self, bus: &mut FakeI2c) -> bool {
        bus.read_reg_u16(GAUGE_ADDR, 0x08).is_ok()
    }

    fn read(&mut self, bus: &mut FakeI2c) -> Result<u8, ()> {
        Ok((bus.read_reg_u16(GAUGE_ADDR, 0x04)? >> 8) as u8)
    }

    fn set(&mut self, _bus: &mut FakeI2c, _value: u8) -> Result<(), ()> {
        Err(())
    }
}
