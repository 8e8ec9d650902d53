use core::fmt;
use core::fmt::{Debug, Error, Formatter};
use core::str::FromStr;

use chanview_common::{decode_hex, short_hex, HexEncode};
use serde::ser::{SerializeStruct, Serializer};
use serde_derive::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, Bytes, IfIsHumanReadable};

use crate::util::status::{invalid_argument, Status};

/// Channel identifier, as assigned by the wallet's Lightning engine.
///
/// Displayed and serialized as lowercase hex.  This is the unique key of a
/// row in the channel list.
#[serde_as]
#[derive(PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(#[serde_as(as = "IfIsHumanReadable<Hex, Bytes>")] Vec<u8>);

impl ChannelId {
    /// Create an ID
    pub fn new(inner: &[u8]) -> Self {
        Self(inner.to_vec())
    }

    /// Convert to a byte slice
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Abbreviated hex, for log lines
    pub fn short(&self) -> String {
        short_hex(&self.0, 16)
    }
}

impl Debug for ChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.0.to_hex())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for ChannelId {
    type Err = Status;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes =
            decode_hex(s).map_err(|e| invalid_argument(format!("channel id {}: {}", s, e)))?;
        if bytes.is_empty() {
            return Err(invalid_argument("empty channel id"));
        }
        Ok(Self(bytes))
    }
}

/// A Lightning node id (the peer's public key, compressed)
#[serde_as]
#[derive(PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(#[serde_as(as = "IfIsHumanReadable<Hex, Bytes>")] Vec<u8>);

impl NodeId {
    /// Create an ID
    pub fn new(inner: &[u8]) -> Self {
        Self(inner.to_vec())
    }

    /// Convert to a byte slice
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.0.to_hex())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for NodeId {
    type Err = Status;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s).map_err(|e| invalid_argument(format!("node id {}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

/// The lifecycle state of a channel, as the Lightning engine reports it.
///
/// The numeric codes are stable and are what the UI sorts and filters on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChannelState {
    /// Negotiating, funding not yet created
    #[serde(rename = "PREOPENING")]
    PreOpening = 0,
    /// Funding transaction created, waiting for signatures
    #[serde(rename = "OPENING")]
    Opening = 1,
    /// Funding transaction broadcast, waiting for confirmations
    #[serde(rename = "FUNDED")]
    Funded = 2,
    /// Operational
    #[serde(rename = "OPEN")]
    Open = 3,
    /// Cooperative close negotiation started
    #[serde(rename = "SHUTDOWN")]
    Shutdown = 4,
    /// Closing transaction broadcast
    #[serde(rename = "CLOSING")]
    Closing = 5,
    /// Our commitment transaction broadcast
    #[serde(rename = "FORCE_CLOSING")]
    ForceClosing = 6,
    /// We asked the peer to force close
    #[serde(rename = "REQUESTED_FCLOSE")]
    RequestedFClose = 7,
    /// The peer thinks we lost state
    #[serde(rename = "WE_ARE_TOXIC")]
    WeAreToxic = 8,
    /// Funding output spent
    #[serde(rename = "CLOSED")]
    Closed = 9,
    /// All outputs swept
    #[serde(rename = "REDEEMED")]
    Redeemed = 10,
}

impl ChannelState {
    /// All states, in code order
    pub const ALL: [ChannelState; 11] = [
        ChannelState::PreOpening,
        ChannelState::Opening,
        ChannelState::Funded,
        ChannelState::Open,
        ChannelState::Shutdown,
        ChannelState::Closing,
        ChannelState::ForceClosing,
        ChannelState::RequestedFClose,
        ChannelState::WeAreToxic,
        ChannelState::Closed,
        ChannelState::Redeemed,
    ];

    /// The numeric state code
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Look up a state by its numeric code
    pub fn from_code(code: i32) -> Option<ChannelState> {
        Self::ALL.iter().copied().find(|s| s.code() == code)
    }

    /// The upper-case state name
    pub fn name(&self) -> &'static str {
        match self {
            ChannelState::PreOpening => "PREOPENING",
            ChannelState::Opening => "OPENING",
            ChannelState::Funded => "FUNDED",
            ChannelState::Open => "OPEN",
            ChannelState::Shutdown => "SHUTDOWN",
            ChannelState::Closing => "CLOSING",
            ChannelState::ForceClosing => "FORCE_CLOSING",
            ChannelState::RequestedFClose => "REQUESTED_FCLOSE",
            ChannelState::WeAreToxic => "WE_ARE_TOXIC",
            ChannelState::Closed => "CLOSED",
            ChannelState::Redeemed => "REDEEMED",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelState {
    type Err = Status;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|st| st.name() == upper)
            .ok_or_else(|| invalid_argument(format!("unknown channel state: {}", s)))
    }
}

/// Which side of a channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Us
    Local,
    /// The peer
    Remote,
}

/// An amount with millisatoshi precision
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    msat: u64,
}

impl Amount {
    /// The zero amount
    pub fn zero() -> Amount {
        Amount { msat: 0 }
    }

    /// Create from satoshis
    pub fn from_sat(sat: u64) -> Amount {
        Amount { msat: sat.saturating_mul(1000) }
    }

    /// Create from millisatoshis
    pub fn from_msat(msat: u64) -> Amount {
        Amount { msat }
    }

    /// Whole satoshis, truncating
    pub fn sat(&self) -> u64 {
        self.msat / 1000
    }

    /// Millisatoshis
    pub fn msat(&self) -> u64 {
        self.msat
    }

    /// True if zero
    pub fn is_zero(&self) -> bool {
        self.msat == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.msat % 1000 == 0 {
            write!(f, "{} sat", self.sat())
        } else {
            write!(f, "{}.{:03} sat", self.sat(), self.msat % 1000)
        }
    }
}

impl serde::Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Amount", 2)?;
        s.serialize_field("sat", &self.sat())?;
        s.serialize_field("msat", &self.msat)?;
        s.end()
    }
}
