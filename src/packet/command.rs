//! # Command Catalog
//!
//! Instructions understood by the sensor. A command is a stateless
//! descriptor; it owns no transport resources.

/// On-device character buffer holding one extracted feature set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Character buffer 1
    One,
    /// Character buffer 2
    Two,
}

impl Slot {
    /// Buffer id as sent on the wire
    pub fn as_byte(self) -> u8 {
        match self {
            Self::One => 0x01,
            Self::Two => 0x02,
        }
    }
}

/// Command opcodes
pub mod opcode {
    pub const VERIFY_PASSWORD: u8 = 0x13;
    pub const CAPTURE_IMAGE: u8 = 0x01;
    pub const IMAGE_TO_TEMPLATE: u8 = 0x02;
    pub const REGISTER_MODEL: u8 = 0x05;
    pub const STORE_MODEL: u8 = 0x06;
    pub const SEARCH: u8 = 0x04;
    pub const DELETE_MODEL: u8 = 0x0C;
    pub const EMPTY_DATABASE: u8 = 0x0D;
    pub const TEMPLATE_COUNT: u8 = 0x1D;
}

/// Commands one can send to the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Handshake; the factory password is 0x00000000
    VerifyPassword { password: u32 },

    /// Capture a fingerprint image into the image buffer
    CaptureImage,

    /// Extract features from the image buffer into a slot
    ImageToTemplate { slot: Slot },

    /// Combine both slots into one model (left in both slots)
    RegisterModel,

    /// Persist the model in `slot` at a library location
    StoreModel { slot: Slot, location: u16 },

    /// Search library locations from `start` up to `end` for the features in `slot`
    Search { slot: Slot, start: u16, end: u16 },

    /// Delete `count` templates starting at `location`
    DeleteModel { location: u16, count: u16 },

    /// Delete every stored template
    EmptyDatabase,

    /// Read the number of stored templates
    TemplateCount,
}

impl Command {
    /// Instruction code
    pub fn opcode(&self) -> u8 {
        match self {
            Self::VerifyPassword { .. } => opcode::VERIFY_PASSWORD,
            Self::CaptureImage => opcode::CAPTURE_IMAGE,
            Self::ImageToTemplate { .. } => opcode::IMAGE_TO_TEMPLATE,
            Self::RegisterModel => opcode::REGISTER_MODEL,
            Self::StoreModel { .. } => opcode::STORE_MODEL,
            Self::Search { .. } => opcode::SEARCH,
            Self::DeleteModel { .. } => opcode::DELETE_MODEL,
            Self::EmptyDatabase => opcode::EMPTY_DATABASE,
            Self::TemplateCount => opcode::TEMPLATE_COUNT,
        }
    }

    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::VerifyPassword { .. } => "verify-password",
            Self::CaptureImage => "capture-image",
            Self::ImageToTemplate { .. } => "image-to-template",
            Self::RegisterModel => "register-model",
            Self::StoreModel { .. } => "store-model",
            Self::Search { .. } => "search",
            Self::DeleteModel { .. } => "delete-model",
            Self::EmptyDatabase => "empty-database",
            Self::TemplateCount => "template-count",
        }
    }

    /// Packet payload: opcode followed by big-endian arguments
    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = vec![self.opcode()];

        match *self {
            Self::VerifyPassword { password } => {
                payload.extend_from_slice(&password.to_be_bytes());
            }
            Self::ImageToTemplate { slot } => {
                payload.push(slot.as_byte());
            }
            Self::StoreModel { slot, location } => {
                payload.push(slot.as_byte());
                payload.extend_from_slice(&location.to_be_bytes());
            }
            Self::Search { slot, start, end } => {
                payload.push(slot.as_byte());
                payload.extend_from_slice(&start.to_be_bytes());
                payload.extend_from_slice(&end.to_be_bytes());
            }
            Self::DeleteModel { location, count } => {
                payload.extend_from_slice(&location.to_be_bytes());
                payload.extend_from_slice(&count.to_be_bytes());
            }
            Self::CaptureImage | Self::RegisterModel | Self::EmptyDatabase | Self::TemplateCount => {}
        }

        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_password_payload() {
        let command = Command::VerifyPassword { password: 0x01020304 };
        assert_eq!(command.to_payload(), vec![0x13, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_bare_opcode_payloads() {
        assert_eq!(Command::CaptureImage.to_payload(), vec![0x01]);
        assert_eq!(Command::RegisterModel.to_payload(), vec![0x05]);
        assert_eq!(Command::EmptyDatabase.to_payload(), vec![0x0D]);
        assert_eq!(Command::TemplateCount.to_payload(), vec![0x1D]);
    }

    #[test]
    fn test_slot_payloads() {
        assert_eq!(
            Command::ImageToTemplate { slot: Slot::Two }.to_payload(),
            vec![0x02, 0x02]
        );
        assert_eq!(
            Command::StoreModel { slot: Slot::One, location: 300 }.to_payload(),
            vec![0x06, 0x01, 0x01, 0x2C]
        );
    }

    #[test]
    fn test_search_payload_full_library() {
        let command = Command::Search {
            slot: Slot::One,
            start: 0,
            end: 0x00A3,
        };
        assert_eq!(command.to_payload(), vec![0x04, 0x01, 0x00, 0x00, 0x00, 0xA3]);
    }

    #[test]
    fn test_delete_payload() {
        let command = Command::DeleteModel { location: 5, count: 1 };
        assert_eq!(command.to_payload(), vec![0x0C, 0x00, 0x05, 0x00, 0x01]);
    }

    #[test]
    fn test_names_are_distinct() {
        let commands = [
            Command::VerifyPassword { password: 0 },
            Command::CaptureImage,
            Command::ImageToTemplate { slot: Slot::One },
            Command::RegisterModel,
            Command::StoreModel { slot: Slot::One, location: 0 },
            Command::Search { slot: Slot::One, start: 0, end: 1 },
            Command::DeleteModel { location: 0, count: 1 },
            Command::EmptyDatabase,
            Command::TemplateCount,
        ];
        let mut names: Vec<_> = commands.iter().map(Command::name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), commands.len());
    }
}
