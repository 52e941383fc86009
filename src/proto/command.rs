use std::fmt;

use uuid::Uuid;

/// Trusted application identity shared by both worlds.
pub const TA_UUID: Uuid = Uuid::from_fields(
    0xa1b2c3d4,
    0x5678,
    0x9abc,
    &[0xde, 0xf0, 0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc],
);

/// Number of parameter slots carried by every operation.
pub const NUM_PARAMS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Command {
    /// Read switch state
    Read = 0,
    /// Read switch state + return secure-world cycle counts
    Benchmark = 1,
}

impl Command {
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Parameter-type signature both sides agree on for this command.
    pub const fn param_types(self) -> ParamTypes {
        use ParamType::{None, ValueOutput};
        match self {
            Command::Read => ParamTypes::new([ValueOutput, None, None, None]),
            Command::Benchmark => ParamTypes::new([ValueOutput, ValueOutput, None, None]),
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = u32;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Command::Read),
            1 => Ok(Command::Benchmark),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ParamType {
    None = 0,
    ValueInput = 1,
    ValueOutput = 2,
    ValueInout = 3,
}

impl ParamType {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(ParamType::None),
            1 => Some(ParamType::ValueInput),
            2 => Some(ParamType::ValueOutput),
            3 => Some(ParamType::ValueInout),
            _ => None,
        }
    }

    /// Slots the callee writes back to the caller.
    pub const fn is_output(self) -> bool {
        matches!(self, ParamType::ValueOutput | ParamType::ValueInout)
    }

    fn as_str(self) -> &'static str {
        match self {
            ParamType::None => "NONE",
            ParamType::ValueInput => "VALUE_INPUT",
            ParamType::ValueOutput => "VALUE_OUTPUT",
            ParamType::ValueInout => "VALUE_INOUT",
        }
    }
}

/// Packed parameter-type signature, one nibble per slot (slot 0 in the low nibble).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamTypes(u32);

impl ParamTypes {
    pub const NONE: ParamTypes = ParamTypes(0);

    pub const fn new(types: [ParamType; NUM_PARAMS]) -> Self {
        Self(
            types[0] as u32
                | (types[1] as u32) << 4
                | (types[2] as u32) << 8
                | (types[3] as u32) << 12,
        )
    }

    /// Accepts only signatures made of known value types; anything above
    /// the fourth nibble must be zero.
    pub fn from_raw(raw: u32) -> Option<Self> {
        if raw >> 16 != 0 {
            return None;
        }
        (0..NUM_PARAMS)
            .all(|i| ParamType::from_raw((raw >> (i * 4)) & 0xF).is_some())
            .then_some(Self(raw))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn get(self, index: usize) -> ParamType {
        ParamType::from_raw((self.0 >> (index * 4)) & 0xF).unwrap_or(ParamType::None)
    }
}

impl fmt::Display for ParamTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.get(0).as_str(),
            self.get(1).as_str(),
            self.get(2).as_str(),
            self.get(3).as_str()
        )
    }
}

/// A value parameter: two unsigned 32-bit sub-fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Value {
    pub a: u32,
    pub b: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub param_types: ParamTypes,
    pub params: [Value; NUM_PARAMS],
}

impl Operation {
    /// Zeroed operation with the given signature.
    pub fn new(param_types: ParamTypes) -> Self {
        Self {
            param_types,
            params: [Value::default(); NUM_PARAMS],
        }
    }

    pub fn for_command(cmd: Command) -> Self {
        Self::new(cmd.param_types())
    }
}
