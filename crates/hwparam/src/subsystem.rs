// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subsystem objects (syncers).
//!
//! A [`SubsystemObject`] is bound to one configurable element and moves that
//! element's blackboard bytes to or from hardware through a
//! [`HardwareAccess`] binding. The blackboard location is resolved on every
//! sync and the access cursor starts at zero each time.
//!
//! ```text
//!            sync(Send)                      sync(Receive)
//! Blackboard ----------> binding.send_to_hw  binding.receive_from_hw ----------> Blackboard
//!  [offset..offset+data_size]                       (BlackboardIo::write)
//! ```

use crate::blackboard::{Blackboard, BlackboardIo};
use std::fmt;
use thiserror::Error;

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncDirection {
    /// Blackboard to hardware.
    Send,
    /// Hardware to blackboard ("back" synchronization).
    Receive,
}

impl SyncDirection {
    fn verb(self) -> &'static str {
        match self {
            SyncDirection::Send => "synchronize",
            SyncDirection::Receive => "back synchronize",
        }
    }
}

/// Hardware binding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HwError {
    /// The binding does not override this direction.
    #[error("{0} interface not implemented at subsystem level!")]
    NotImplemented(&'static str),

    /// The transfer itself failed.
    #[error("{0}")]
    Transfer(String),
}

impl HwError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, HwError::NotImplemented(_))
    }
}

/// Concrete hardware binding.
///
/// Override only the directions the hardware supports; the defaults fail
/// with [`HwError::NotImplemented`].
pub trait HardwareAccess: Send {
    /// Push blackboard data (read through `io`) to hardware.
    fn send_to_hw(&mut self, io: &mut BlackboardIo<'_>) -> Result<(), HwError> {
        let _ = io;
        Err(HwError::NotImplemented("Send to HW"))
    }

    /// Pull hardware data into the blackboard (written through `io`).
    fn receive_from_hw(&mut self, io: &mut BlackboardIo<'_>) -> Result<(), HwError> {
        let _ = io;
        Err(HwError::NotImplemented("Receive from HW"))
    }

    /// Entry point used by [`SubsystemObject::sync`]; dispatches on the
    /// direction unless overridden.
    fn access_hw(
        &mut self,
        direction: SyncDirection,
        io: &mut BlackboardIo<'_>,
    ) -> Result<(), HwError> {
        match direction {
            SyncDirection::Send => self.send_to_hw(io),
            SyncDirection::Receive => self.receive_from_hw(io),
        }
    }
}

/// A failed synchronization of one element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unable to {} configurable element {}: {}", .direction.verb(), .path, .source)]
pub struct SyncError {
    pub path: String,
    pub direction: SyncDirection,
    pub source: HwError,
}

/// Aggregated failures of a synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncFailure {
    pub errors: Vec<SyncError>,
}

impl SyncFailure {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyncFailure {}

/// Syncer bound to one configurable element.
pub struct SubsystemObject {
    path: String,
    offset: usize,
    data_size: usize,
    binding: Box<dyn HardwareAccess>,
}

impl SubsystemObject {
    pub(crate) fn new(
        path: String,
        offset: usize,
        data_size: usize,
        binding: Box<dyn HardwareAccess>,
    ) -> Self {
        Self {
            path,
            offset,
            data_size,
            binding,
        }
    }

    /// Path of the owning element.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Synchronize the element's blackboard region with hardware.
    ///
    /// With `simulation` set, the location is resolved and the cursor reset
    /// but the binding is not called.
    pub fn sync(
        &mut self,
        blackboard: &mut Blackboard,
        direction: SyncDirection,
        simulation: bool,
    ) -> Result<(), SyncError> {
        let location = blackboard
            .region_mut(self.offset, self.data_size)
            .map_err(|e| SyncError {
                path: self.path.clone(),
                direction,
                source: HwError::Transfer(e.to_string()),
            })?;
        let mut io = BlackboardIo::new(location);

        if simulation {
            return Ok(());
        }

        self.binding
            .access_hw(direction, &mut io)
            .map_err(|source| SyncError {
                path: self.path.clone(),
                direction,
                source,
            })
    }
}

impl fmt::Debug for SubsystemObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsystemObject")
            .field("path", &self.path)
            .field("offset", &self.offset)
            .field("data_size", &self.data_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct SendOnly {
        sent: Arc<Mutex<Vec<u8>>>,
    }

    impl HardwareAccess for SendOnly {
        fn send_to_hw(&mut self, io: &mut BlackboardIo<'_>) -> Result<(), HwError> {
            let mut sent = vec![0u8; io.data_size()];
            io.read(&mut sent);
            *self.sent.lock().expect("sent lock") = sent;
            Ok(())
        }
    }

    struct Register(u16);

    impl HardwareAccess for Register {
        fn receive_from_hw(&mut self, io: &mut BlackboardIo<'_>) -> Result<(), HwError> {
            io.write_raw(2, self.0 as u32);
            Ok(())
        }
    }

    struct Overrun;

    impl HardwareAccess for Overrun {
        fn receive_from_hw(&mut self, io: &mut BlackboardIo<'_>) -> Result<(), HwError> {
            io.write(&[0u8; 3]);
            Ok(())
        }
    }

    #[test]
    fn test_send() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut bb = Blackboard::new(4);
        bb.write_bytes(2, &[7, 8]).expect("write");
        let mut syncer = SubsystemObject::new(
            "/System/Reg".into(),
            2,
            2,
            Box::new(SendOnly {
                sent: Arc::clone(&sent),
            }),
        );
        syncer.sync(&mut bb, SyncDirection::Send, false).expect("send");
        assert_eq!(*sent.lock().expect("sent lock"), vec![7, 8]);
    }

    #[test]
    fn test_receive_writes_region() {
        let mut bb = Blackboard::new(4);
        let mut syncer =
            SubsystemObject::new("/System/Reg".into(), 1, 2, Box::new(Register(0xBEEF)));
        syncer.sync(&mut bb, SyncDirection::Receive, false).expect("receive");
        assert_eq!(bb.as_bytes(), &[0, 0xEF, 0xBE, 0]);
    }

    #[test]
    fn test_not_implemented_prefixed_with_path() {
        let mut bb = Blackboard::new(4);
        let mut syncer = SubsystemObject::new(
            "/System/Reg".into(),
            0,
            2,
            Box::new(SendOnly {
                sent: Arc::default(),
            }),
        );
        let err = syncer
            .sync(&mut bb, SyncDirection::Receive, false)
            .expect_err("receive not implemented");
        assert!(err.source.is_not_implemented());
        assert_eq!(
            err.to_string(),
            "Unable to back synchronize configurable element /System/Reg: Receive from HW interface not implemented at subsystem level!"
        );
    }

    #[test]
    fn test_simulation_skips_binding() {
        let mut bb = Blackboard::new(4);
        let mut syncer =
            SubsystemObject::new("/System/Reg".into(), 0, 2, Box::new(Register(0xFFFF)));
        syncer.sync(&mut bb, SyncDirection::Receive, true).expect("simulated");
        assert_eq!(bb.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "blackboard access overrun")]
    fn test_overrun_is_fatal() {
        let mut bb = Blackboard::new(4);
        let mut syncer = SubsystemObject::new("/System/Reg".into(), 0, 2, Box::new(Overrun));
        let _ = syncer.sync(&mut bb, SyncDirection::Receive, false);
    }

    #[test]
    fn test_failure_display_joins_lines() {
        let failure = SyncFailure {
            errors: vec![
                SyncError {
                    path: "/A".into(),
                    direction: SyncDirection::Send,
                    source: HwError::Transfer("bus error".into()),
                },
                SyncError {
                    path: "/B".into(),
                    direction: SyncDirection::Send,
                    source: HwError::Transfer("timeout".into()),
                },
            ],
        };
        assert_eq!(
            failure.to_string(),
            "Unable to synchronize configurable element /A: bus error\nUnable to synchronize configurable element /B: timeout"
        );
    }
}
