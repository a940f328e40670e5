use choreo_serde::{
    BitReader, BitWrite, BitWriter, Serde, SerdeErr, UnsignedInteger, UnsignedVariableInteger,
};

use crate::{
    performance::PerformanceKind,
    sync::{net_object::read_variable_u32, PerformanceUpdate},
    types::{ChoreographerId, TemplateIndex, UNREGISTERED_ID},
};

/// One framed operation on a replica
#[derive(Clone, Debug, PartialEq)]
pub enum ChoreographyMessage {
    Create {
        id: ChoreographerId,
        kind: PerformanceKind,
        template: TemplateIndex,
        update: PerformanceUpdate,
    },
    Update {
        id: ChoreographerId,
        update: PerformanceUpdate,
    },
    Remove {
        id: ChoreographerId,
    },
}

impl ChoreographyMessage {
    pub fn id(&self) -> ChoreographerId {
        match self {
            ChoreographyMessage::Create { id, .. }
            | ChoreographyMessage::Update { id, .. }
            | ChoreographyMessage::Remove { id } => *id,
        }
    }
}

impl Serde for ChoreographyMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let op: u8 = match self {
            ChoreographyMessage::Create { .. } => 0,
            ChoreographyMessage::Update { .. } => 1,
            ChoreographyMessage::Remove { .. } => 2,
        };
        UnsignedInteger::<2>::new(op).ser(writer);
        UnsignedVariableInteger::<7>::new(self.id()).ser(writer);
        match self {
            ChoreographyMessage::Create {
                kind,
                template,
                update,
                ..
            } => {
                kind.ser(writer);
                UnsignedVariableInteger::<5>::new(*template).ser(writer);
                update.ser(writer);
            }
            ChoreographyMessage::Update { update, .. } => update.ser(writer),
            ChoreographyMessage::Remove { .. } => {}
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let op: u8 = UnsignedInteger::<2>::de(reader)?.to();
        let id = read_variable_u32(reader)?;
        if id == UNREGISTERED_ID {
            return Err(SerdeErr);
        }
        match op {
            0 => {
                let kind = PerformanceKind::de(reader)?;
                let template = UnsignedVariableInteger::<5>::de(reader)?.get();
                let template = TemplateIndex::try_from(template).map_err(|_| SerdeErr)?;
                let update = PerformanceUpdate::de(reader)?;
                Ok(ChoreographyMessage::Create {
                    id,
                    kind,
                    template,
                    update,
                })
            }
            1 => Ok(ChoreographyMessage::Update {
                id,
                update: PerformanceUpdate::de(reader)?,
            }),
            2 => Ok(ChoreographyMessage::Remove { id }),
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        let mut bits = 2 + UnsignedVariableInteger::<7>::new(self.id()).bit_length();
        match self {
            ChoreographyMessage::Create {
                kind,
                template,
                update,
                ..
            } => {
                bits += kind.bit_length();
                bits += UnsignedVariableInteger::<5>::new(*template).bit_length();
                bits += update.bit_length();
            }
            ChoreographyMessage::Update { update, .. } => bits += update.bit_length(),
            ChoreographyMessage::Remove { .. } => {}
        }
        bits
    }
}

/// All operations for one connection in one send, each preceded by a
/// continue bit and closed by a cleared one
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChoreographyPacket {
    pub messages: Vec<ChoreographyMessage>,
}

impl ChoreographyPacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChoreographyMessage) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.ser(&mut writer);
        writer.to_bytes()
    }

    /// Decodes a whole packet. Nothing is returned unless every message parses.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = BitReader::new(bytes);
        Self::de(&mut reader)
    }
}

impl Serde for ChoreographyPacket {
    fn ser(&self, writer: &mut dyn BitWrite) {
        for message in &self.messages {
            true.ser(writer);
            message.ser(writer);
        }
        false.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut messages = Vec::new();
        while bool::de(reader)? {
            messages.push(ChoreographyMessage::de(reader)?);
        }
        Ok(Self { messages })
    }

    fn bit_length(&self) -> u32 {
        self.messages
            .iter()
            .map(|message| 1 + message.bit_length())
            .sum::<u32>()
            + 1
    }
}
