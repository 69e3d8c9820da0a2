/// A simulated TSL2561 for exercising the driver without hardware.
///
/// Channel counts follow a configurable ambient level, expressed as channel 0 counts at 16x and
/// 402ms, and saturate the way the real ADC does. Register writes, channel reads and waits are
/// recorded in order.
use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use crate::registers::{IntegrationTime, register};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Write { register: u8, data: Vec<u8> },
    Read(u8),
    ClearInterrupt,
    Delay(u32),
}

impl Op {
    pub fn write(register: u8, data: &[u8]) -> Self {
        Op::Write {
            register,
            data: data.to_vec(),
        }
    }
}

struct Device {
    address: SevenBitAddress,
    id: u8,
    registers: [u8; 16],
    pointer: u8,
    ambient: f64,
    infrared: f64,
    failing: bool,
    /// transactions left before the bus starts failing
    remaining: Option<usize>,
    log: Vec<Op>,
}

impl Device {
    fn channels(&self) -> (u16, u16) {
        if self.registers[register::CONTROL as usize] & 0x03 != 0x03 {
            return (0, 0);
        }
        let timing = self.registers[register::TIMING as usize];
        let gain = if timing & 0x10 != 0 { 16.0 } else { 1.0 };
        let (integration, ceiling) = match timing & 0x03 {
            0x00 => (IntegrationTime::Short, 5047.0),
            0x01 => (IntegrationTime::Medium, 37177.0),
            _ => (IntegrationTime::Long, 65535.0),
        };
        let ch0 = self.ambient * gain / 16.0 * integration.nominal_ms() as f64 / 402.0;
        let ch1 = ch0 * self.infrared;
        (ch0.min(ceiling) as u16, ch1.min(ceiling) as u16)
    }

    fn read_byte(&self, reg: u8) -> u8 {
        let (ch0, ch1) = self.channels();
        match reg {
            register::ID => self.id,
            0x0C => ch0.to_le_bytes()[0],
            0x0D => ch0.to_le_bytes()[1],
            0x0E => ch1.to_le_bytes()[0],
            0x0F => ch1.to_le_bytes()[1],
            r => self.registers[r as usize & 0x0F],
        }
    }
}

pub struct Simulation(Rc<RefCell<Device>>);

pub struct Bus(Rc<RefCell<Device>>);

pub struct Delay(Rc<RefCell<Device>>);

impl Simulation {
    /// A TSL2561T (id 0x50) at the floating address with 10% infrared.
    pub fn new(ambient: f64) -> Self {
        Self::with_id(0x50, ambient)
    }

    pub fn with_id(id: u8, ambient: f64) -> Self {
        Simulation(Rc::new(RefCell::new(Device {
            address: 0x39,
            id,
            registers: [0; 16],
            pointer: 0,
            ambient,
            infrared: 0.1,
            failing: false,
            remaining: None,
            log: Vec::new(),
        })))
    }

    pub fn bus(&self) -> Bus {
        Bus(self.0.clone())
    }

    pub fn delay(&self) -> Delay {
        Delay(self.0.clone())
    }

    pub fn set_ambient(&self, ambient: f64) {
        self.0.borrow_mut().ambient = ambient;
    }

    pub fn set_failing(&self, failing: bool) {
        self.0.borrow_mut().failing = failing;
    }

    /// Let `transactions` more bus transactions through, then fail every one after.
    pub fn fail_after(&self, transactions: usize) {
        self.0.borrow_mut().remaining = Some(transactions);
    }

    pub fn take_log(&self) -> Vec<Op> {
        std::mem::take(&mut self.0.borrow_mut().log)
    }

    /// Number of acquisitions logged since the last `take_log`.
    pub fn reads(&self) -> usize {
        self.0
            .borrow()
            .log
            .iter()
            .filter(|op| **op == Op::Read(register::DATA0))
            .count()
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.0.borrow().registers[reg as usize]
    }
}

impl ErrorType for Bus {
    type Error = ErrorKind;
}

impl I2c for Bus {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut device = self.0.borrow_mut();
        match device.remaining {
            Some(0) => device.failing = true,
            Some(n) => device.remaining = Some(n - 1),
            None => {}
        }
        if device.failing {
            return Err(ErrorKind::Bus);
        }
        if address != device.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let Some((&command, data)) = bytes.split_first() else {
                        continue;
                    };
                    if command & 0x80 == 0 {
                        return Err(ErrorKind::Other);
                    }
                    if command & 0x40 != 0 {
                        device.log.push(Op::ClearInterrupt);
                        continue;
                    }
                    let reg = command & 0x0F;
                    device.pointer = reg;
                    if !data.is_empty() {
                        for (i, &value) in data.iter().enumerate() {
                            device.registers[(reg as usize + i) & 0x0F] = value;
                        }
                        device.log.push(Op::write(reg, data));
                    }
                }
                Operation::Read(buf) => {
                    let reg = device.pointer;
                    if reg == register::DATA0 || reg == register::DATA1 {
                        device.log.push(Op::Read(reg));
                    }
                    for (i, byte) in buf.iter_mut().enumerate() {
                        *byte = device.read_byte((reg + i as u8) & 0x0F);
                    }
                }
            }
        }
        Ok(())
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().log.push(Op::Delay(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().log.push(Op::Delay(ms));
    }
}
