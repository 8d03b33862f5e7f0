//! Graphics command serialization
//!
//! A command has the form `ESC _G <key>=<value>,...;<payload> ESC \`. Inside
//! tmux the command must be wrapped in a DCS passthrough envelope with every
//! escape of the inner command doubled, otherwise tmux swallows it.

use std::fmt;
use std::str::FromStr;

/// Value of a single control key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlValue {
    Number(u32),
    Text(String),
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlValue::Number(n) => write!(f, "{n}"),
            ControlValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<u32> for ControlValue {
    fn from(n: u32) -> Self {
        ControlValue::Number(n)
    }
}

impl From<u16> for ControlValue {
    fn from(n: u16) -> Self {
        ControlValue::Number(u32::from(n))
    }
}

impl From<u8> for ControlValue {
    fn from(n: u8) -> Self {
        ControlValue::Number(u32::from(n))
    }
}

impl From<&str> for ControlValue {
    fn from(s: &str) -> Self {
        ControlValue::Text(s.to_string())
    }
}

impl From<String> for ControlValue {
    fn from(s: String) -> Self {
        ControlValue::Text(s)
    }
}

/// Ordered control data of a graphics command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlData {
    entries: Vec<(char, ControlValue)>,
}

impl ControlData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ControlData::set`]
    pub fn with(mut self, key: char, value: impl Into<ControlValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a key, keeping its original position if already present
    pub fn set(&mut self, key: char, value: impl Into<ControlValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: char) -> Option<&ControlValue> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `k=v` pairs joined by commas
    pub fn encode(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Control data for transmitting an image and creating a virtual placement
/// that is displayed through Unicode placeholder cells.
pub fn virtual_placement(image_id: u32, columns: u16, rows: u16) -> ControlData {
    ControlData::new()
        .with('a', "T")
        .with('q', 2u32)
        .with('f', 100u32)
        .with('U', 1u32)
        .with('c', columns)
        .with('r', rows)
        .with('i', image_id)
}

/// How commands are wrapped for a terminal multiplexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Passthrough {
    /// Check `TMUX` every time a command is encoded
    #[default]
    #[cfg_attr(feature = "clap", value(name = "auto"))]
    Detect,
    /// Never wrap
    #[cfg_attr(feature = "clap", value(name = "none"))]
    Never,
    /// Always wrap for tmux
    #[cfg_attr(feature = "clap", value(name = "tmux"))]
    Tmux,
}

impl Passthrough {
    /// Resolve to whether the tmux envelope is needed right now
    pub fn wraps(self) -> bool {
        match self {
            Passthrough::Detect => in_tmux(),
            Passthrough::Never => false,
            Passthrough::Tmux => true,
        }
    }
}

impl FromStr for Passthrough {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "detect" => Ok(Passthrough::Detect),
            "none" | "never" | "off" => Ok(Passthrough::Never),
            "tmux" => Ok(Passthrough::Tmux),
            other => Err(format!("unknown passthrough mode: {other}")),
        }
    }
}

/// Whether this process runs inside tmux
pub fn in_tmux() -> bool {
    std::env::var_os("TMUX").is_some_and(|v| !v.is_empty())
}

/// Serialize one graphics command. An empty payload omits the `;` separator.
pub fn serialize_command(control: &ControlData, payload: &[u8], tmux: bool) -> Vec<u8> {
    let esc: &[u8] = if tmux { b"\x1b\x1b" } else { b"\x1b" };
    let control = control.encode();

    let mut out = Vec::with_capacity(payload.len() + control.len() + 16);
    if tmux {
        out.extend_from_slice(b"\x1bPtmux;");
    }
    out.extend_from_slice(esc);
    out.extend_from_slice(b"_G");
    out.extend_from_slice(control.as_bytes());
    if !payload.is_empty() {
        out.push(b';');
        out.extend_from_slice(payload);
    }
    out.extend_from_slice(esc);
    out.push(b'\\');
    if tmux {
        out.extend_from_slice(b"\x1b\\");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_data_keeps_insertion_order() {
        let control = ControlData::new()
            .with('a', "T")
            .with('q', 2u32)
            .with('m', 1u32);
        assert_eq!(control.encode(), "a=T,q=2,m=1");
    }

    #[test]
    fn test_control_data_set_replaces_in_place() {
        let mut control = ControlData::new().with('a', "T").with('m', 1u32);
        control.set('a', "t");
        assert_eq!(control.encode(), "a=t,m=1");
        assert_eq!(control.len(), 2);
        assert_eq!(control.get('m'), Some(&ControlValue::Number(1)));
    }

    #[test]
    fn test_serialize_plain() {
        let control = ControlData::new().with('a', "T").with('m', 0u32);
        let cmd = serialize_command(&control, b"QUJD", false);
        assert_eq!(cmd, b"\x1b_Ga=T,m=0;QUJD\x1b\\".to_vec());
    }

    #[test]
    fn test_serialize_empty_payload() {
        let control = ControlData::new().with('a', "d");
        let cmd = serialize_command(&control, b"", false);
        assert_eq!(cmd, b"\x1b_Ga=d\x1b\\".to_vec());
    }

    #[test]
    fn test_serialize_tmux_wrapped() {
        let control = ControlData::new().with('m', 0u32);
        let cmd = serialize_command(&control, b"QUJD", true);
        assert_eq!(
            cmd,
            b"\x1bPtmux;\x1b\x1b_Gm=0;QUJD\x1b\x1b\\\x1b\\".to_vec()
        );
    }

    #[test]
    fn test_virtual_placement_keys() {
        let control = virtual_placement(0x0100_0002, 10, 5);
        assert_eq!(control.encode(), "a=T,q=2,f=100,U=1,c=10,r=5,i=16777218");
    }

    #[test]
    fn test_passthrough_from_str() {
        assert_eq!("auto".parse::<Passthrough>(), Ok(Passthrough::Detect));
        assert_eq!("NONE".parse::<Passthrough>(), Ok(Passthrough::Never));
        assert_eq!("tmux".parse::<Passthrough>(), Ok(Passthrough::Tmux));
        assert!("screen".parse::<Passthrough>().is_err());
    }

    #[test]
    fn test_fixed_passthrough_modes() {
        assert!(Passthrough::Tmux.wraps());
        assert!(!Passthrough::Never.wraps());
    }
}
