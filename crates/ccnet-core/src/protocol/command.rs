//! Host-to-validator command opcodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every command the host can send to the bill validator.
///
/// The discriminant is the opcode byte placed at index 3 of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    Ack = 0x00,
    Reset = 0x30,
    GetStatus = 0x31,
    SetSecurity = 0x32,
    Poll = 0x33,
    EnableBillTypes = 0x34,
    Stack = 0x35,
    Return = 0x36,
    Identification = 0x37,
    Hold = 0x38,
    Nak = 0xFF,
}

impl Command {
    /// Opcode byte for this command.
    pub fn opcode(self) -> u8 {
        self as u8
    }

    /// Protocol name of the command, as printed in device manuals and logs.
    pub fn name(self) -> &'static str {
        match self {
            Command::Ack => "ACK",
            Command::Reset => "RESET",
            Command::GetStatus => "GET_STATUS",
            Command::SetSecurity => "SET_SECURITY",
            Command::Poll => "POLL",
            Command::EnableBillTypes => "ENABLE_BILL_TYPES",
            Command::Stack => "STACK",
            Command::Return => "RETURN",
            Command::Identification => "IDENTIFICATION",
            Command::Hold => "HOLD",
            Command::Nak => "NAK",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Command {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x00 => Ok(Command::Ack),
            0x30 => Ok(Command::Reset),
            0x31 => Ok(Command::GetStatus),
            0x32 => Ok(Command::SetSecurity),
            0x33 => Ok(Command::Poll),
            0x34 => Ok(Command::EnableBillTypes),
            0x35 => Ok(Command::Stack),
            0x36 => Ok(Command::Return),
            0x37 => Ok(Command::Identification),
            0x38 => Ok(Command::Hold),
            0xFF => Ok(Command::Nak),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Command; 11] = [
        Command::Ack,
        Command::Reset,
        Command::GetStatus,
        Command::SetSecurity,
        Command::Poll,
        Command::EnableBillTypes,
        Command::Stack,
        Command::Return,
        Command::Identification,
        Command::Hold,
        Command::Nak,
    ];

    #[test]
    fn test_opcodes_match_protocol_table() {
        assert_eq!(Command::Ack.opcode(), 0x00);
        assert_eq!(Command::Reset.opcode(), 0x30);
        assert_eq!(Command::Poll.opcode(), 0x33);
        assert_eq!(Command::EnableBillTypes.opcode(), 0x34);
        assert_eq!(Command::Nak.opcode(), 0xFF);
    }

    #[test]
    fn test_try_from_accepts_every_opcode() {
        for command in ALL {
            assert_eq!(Command::try_from(command.opcode()), Ok(command));
        }
    }

    #[test]
    fn test_try_from_rejects_unknown_opcode() {
        assert_eq!(Command::try_from(0x39), Err(()));
        assert_eq!(Command::try_from(0x14), Err(()));
    }

    #[test]
    fn test_display_uses_protocol_name() {
        assert_eq!(Command::EnableBillTypes.to_string(), "ENABLE_BILL_TYPES");
        assert_eq!(Command::Nak.to_string(), "NAK");
    }
}
