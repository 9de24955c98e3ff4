use crate::debug;
use crate::error::Result;
use crate::reconciler::ReconcilerSnapshot;
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFormat {
    Json,
    MessagePack,
    Bincode,
}

/// Persists [`ReconcilerSnapshot`]s, e.g. to carry smoothing state across
/// a save/restore or into a replay.
pub struct BinarySerializer {
    format: BinaryFormat,
}

impl BinarySerializer {
    pub fn new(format: BinaryFormat) -> Self {
        Self { format }
    }

    pub fn json() -> Self {
        Self::new(BinaryFormat::Json)
    }

    pub fn messagepack() -> Self {
        Self::new(BinaryFormat::MessagePack)
    }

    pub fn bincode() -> Self {
        Self::new(BinaryFormat::Bincode)
    }

    pub fn serialize_snapshot(&self, snapshot: &ReconcilerSnapshot) -> Result<Bytes> {
        debug::log_snapshot("serialize", snapshot);
        match self.format {
            BinaryFormat::Json => {
                let json = serde_json::to_vec(snapshot)?;
                Ok(Bytes::from(json))
            }
            BinaryFormat::MessagePack => {
                let msgpack = rmp_serde::to_vec(snapshot)?;
                Ok(Bytes::from(msgpack))
            }
            BinaryFormat::Bincode => {
                let bincode_data = bincode::serialize(snapshot)?;
                Ok(Bytes::from(bincode_data))
            }
        }
    }

    pub fn deserialize_snapshot(&self, data: &[u8]) -> Result<ReconcilerSnapshot> {
        match self.format {
            BinaryFormat::Json => {
                let snapshot = serde_json::from_slice(data)?;
                Ok(snapshot)
            }
            BinaryFormat::MessagePack => {
                let snapshot = rmp_serde::from_slice(data)?;
                Ok(snapshot)
            }
            BinaryFormat::Bincode => {
                let snapshot = bincode::deserialize(data)?;
                Ok(snapshot)
            }
        }
    }

    pub fn get_format(&self) -> BinaryFormat {
        self.format
    }
}
