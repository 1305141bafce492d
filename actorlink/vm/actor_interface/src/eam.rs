// Copyright 2022-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Addresses as the EVM sees them, and how they map onto actor IDs.
//!
//! Every actor has an ID, but only some (those created through the Ethereum
//! Address Manager) also have a delegated `f410` address. Inside the EVM both
//! show up as 20 byte values: the delegated sub-address verbatim, or the ID
//! masked into the form `0xff || 0x00 * 11 || id.to_be_bytes()`.

use std::fmt::{Debug, Display};
use std::str::FromStr;

use fvm_shared::address::{Address, Payload, Protocol, MAX_SUBADDRESS_LEN};
use fvm_shared::ActorID;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

define_id!(EAM { id: 10 });

/// Length of an address in the EVM.
pub const ADDRESS_LEN: usize = 20;

// Any EVM address fits into a delegated sub-address.
const _: () = assert!(ADDRESS_LEN <= MAX_SUBADDRESS_LEN);

/// Length of a delegated address in binary form: protocol, namespace, sub-address.
pub const TAGGED_ADDRESS_LEN: usize = 2 + ADDRESS_LEN;

/// Leading byte of the binary form of a delegated address.
pub const DELEGATED_TAG: u8 = Protocol::Delegated as u8;

/// The EAM namespace; a single byte in its LEB128 form.
pub const EAM_NAMESPACE_TAG: u8 = EAM_ACTOR_ID as u8;

/// Everything except the last 8 bytes of an ID-masked address.
const ID_PREFIX: [u8; 12] = [0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressError {
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("unexpected tags {0:#04x} {1:#04x}; expected a delegated EAM address")]
    WrongTags(u8, u8),
    #[error("actor {0} in ID form is not a canonical address")]
    CompactId(ActorID),
    #[error("{0} has no EVM representation")]
    Unsupported(String),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// A 20 byte address as it appears inside the EVM.
///
/// It can either be an ID-masked address (see [`RawAddress::from_id`]), or anything
/// else, in which case we consider it a canonical address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RawAddress(pub [u8; ADDRESS_LEN]);

impl RawAddress {
    /// Mask an actor ID into an address. Every ID has exactly one such address.
    pub const fn from_id(id: ActorID) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = ID_PREFIX[0];
        let id = id.to_be_bytes();
        let mut i = 0;
        while i < 8 {
            bytes[ID_PREFIX.len() + i] = id[i];
            i += 1;
        }
        Self(bytes)
    }

    /// Address of the precompile with the given index, e.g. `0xfe00..0001`.
    pub const fn precompile(index: u8) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = 0xfe;
        bytes[ADDRESS_LEN - 1] = index;
        Self(bytes)
    }

    /// Recover the actor ID if this is an ID-masked address.
    ///
    /// Every prefix byte is inspected, regardless of where the first mismatch is.
    pub fn as_id(&self) -> Option<ActorID> {
        let (prefix, id) = self.0.split_at(ID_PREFIX.len());

        let diff = prefix
            .iter()
            .zip(ID_PREFIX.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        let mut id_bytes = [0u8; 8];
        id_bytes.copy_from_slice(id);
        let id = ActorID::from_be_bytes(id_bytes);

        if diff == 0 {
            Some(id)
        } else {
            None
        }
    }

    pub fn is_id(&self) -> bool {
        self.as_id().is_some()
    }

    /// The binary form of the delegated address with this sub-address in the EAM namespace,
    /// the same bytes `Address::to_bytes` would produce.
    pub fn to_tagged(&self) -> [u8; TAGGED_ADDRESS_LEN] {
        let mut bytes = [0u8; TAGGED_ADDRESS_LEN];
        bytes[0] = DELEGATED_TAG;
        bytes[1] = EAM_NAMESPACE_TAG;
        bytes[2..].copy_from_slice(&self.0);
        bytes
    }

    /// Parse the binary form of a delegated EAM address.
    ///
    /// Only the exact length and the exact tag pair are accepted; there is no attempt
    /// at making sense of addresses in other namespaces.
    pub fn from_tagged(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != TAGGED_ADDRESS_LEN {
            return Err(AddressError::WrongLength {
                expected: TAGGED_ADDRESS_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0] != DELEGATED_TAG || bytes[1] != EAM_NAMESPACE_TAG {
            return Err(AddressError::WrongTags(bytes[0], bytes[1]));
        }
        let mut addr = [0u8; ADDRESS_LEN];
        addr.copy_from_slice(&bytes[2..]);
        Ok(Self(addr))
    }
}

/// Mask an actor ID into an address.
pub const fn encode(id: ActorID) -> RawAddress {
    RawAddress::from_id(id)
}

/// Recover the actor ID from an ID-masked address.
pub fn decode(addr: &RawAddress) -> Option<ActorID> {
    addr.as_id()
}

impl Display for RawAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for RawAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawAddress({self})")
    }
}

impl FromStr for RawAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let bytes: [u8; ADDRESS_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::WrongLength {
                    expected: ADDRESS_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(bytes))
    }
}

impl Serialize for RawAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            self.to_string().serialize(serializer)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for RawAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_str(&s)
                .map_err(|e| D::Error::custom(format!("error deserializing address: {e}")))
        } else {
            <[u8; ADDRESS_LEN]>::deserialize(deserializer).map(Self)
        }
    }
}

impl From<RawAddress> for Address {
    fn from(addr: RawAddress) -> Self {
        match addr.as_id() {
            Some(id) => Address::new_id(id),
            // Only fails for sub-addresses longer than `MAX_SUBADDRESS_LEN`.
            None => Address::new_delegated(EAM_ACTOR_ID, &addr.0)
                .expect("ADDRESS_LEN is within MAX_SUBADDRESS_LEN"),
        }
    }
}

impl TryFrom<&Address> for RawAddress {
    type Error = AddressError;

    fn try_from(addr: &Address) -> Result<Self, Self::Error> {
        match addr.payload() {
            Payload::ID(id) => Ok(Self::from_id(*id)),
            Payload::Delegated(d)
                if d.namespace() == EAM_ACTOR_ID && d.subaddress().len() == ADDRESS_LEN =>
            {
                let mut bytes = [0u8; ADDRESS_LEN];
                bytes.copy_from_slice(d.subaddress());
                let addr = Self(bytes);
                // The EAM never hands out sub-addresses that look like masked IDs.
                match addr.as_id() {
                    Some(id) => Err(AddressError::CompactId(id)),
                    None => Ok(addr),
                }
            }
            _ => Err(AddressError::Unsupported(addr.to_string())),
        }
    }
}

/// An address which is not an ID-masked one.
///
/// This is what the resolution authority hands back for actors that have a delegated address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CanonicalAddress(RawAddress);

impl CanonicalAddress {
    pub fn new(addr: RawAddress) -> Result<Self, AddressError> {
        match addr.as_id() {
            Some(id) => Err(AddressError::CompactId(id)),
            None => Ok(Self(addr)),
        }
    }

    pub fn raw(&self) -> RawAddress {
        self.0
    }
}

impl TryFrom<RawAddress> for CanonicalAddress {
    type Error = AddressError;

    fn try_from(addr: RawAddress) -> Result<Self, Self::Error> {
        Self::new(addr)
    }
}

impl From<CanonicalAddress> for RawAddress {
    fn from(addr: CanonicalAddress) -> Self {
        addr.0
    }
}

impl Display for CanonicalAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}
