//! Append-only event log collaborator.
//!
//! The account module only ever creates handles and appends to them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::account::types::{Address, Asset};

/// Globally unique identifier of an event stream: (creator, creation number).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Guid {
    pub creation_num: u64,
    pub addr: Address,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventHandle {
    pub counter: u64,
    pub guid: Guid,
}

impl EventHandle {
    pub fn new(addr: Address, creation_num: u64) -> Self {
        Self {
            counter: 0,
            guid: Guid { creation_num, addr },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum AccountEvent {
    CoinRegister {
        asset: Asset,
    },
    KeyRotation {
        old_authentication_key: Vec<u8>,
        new_authentication_key: Vec<u8>,
    },
}

pub trait EventStore {
    fn append(&mut self, handle: &mut EventHandle, event: AccountEvent);
}

/// In-memory event log keyed by stream GUID.
#[derive(Default, Debug)]
pub struct EventLog {
    streams: HashMap<Guid, Vec<AccountEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self, guid: &Guid) -> &[AccountEvent] {
        self.streams.get(guid).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

impl EventStore for EventLog {
    fn append(&mut self, handle: &mut EventHandle, event: AccountEvent) {
        self.streams.entry(handle.guid).or_default().push(event);
        handle.counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bumps_counter() {
        let mut log = EventLog::new();
        let mut handle = EventHandle::new(Address::from_low_byte(7), 0);
        log.append(
            &mut handle,
            AccountEvent::CoinRegister {
                asset: "COMPASS".to_string(),
            },
        );
        assert_eq!(handle.counter, 1);
        assert_eq!(log.events(&handle.guid).len(), 1);
        assert!(log.events(&EventHandle::new(Address::from_low_byte(7), 1).guid).is_empty());
    }
}
