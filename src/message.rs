use crate::{Error, Result};

/// Size of the on-queue text buffer, terminating NUL included.
///
/// This matches the C peer's `char msg_text[100]`; both sides transfer the
/// full buffer on every call, so the two implementations interoperate.
pub const TEXT_CAPACITY: usize = 100;

/// Longest text a message can carry (one byte is reserved for the NUL).
pub const MAX_TEXT_LEN: usize = TEXT_CAPACITY - 1;

/// Message priority, bounded to 1..=3.
///
/// The queue uses it as both routing key and ordering key: receivers can
/// select an exact priority or drain in ascending order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(1);
    pub const MAX: Priority = Priority(3);

    pub fn new(value: i64) -> Result<Self> {
        if !(Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&value) {
            return Err(Error::InvalidPriority(value.to_string()));
        }
        Ok(Priority(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub(crate) fn as_mtype(self) -> libc::c_long {
        self.0 as libc::c_long
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidPriority(s.trim().to_string()))?;
        Priority::new(value)
    }
}

/// A priority-tagged text record, the only entity the queue carries.
///
/// Transient by design: built immediately before `send` and reconstituted
/// immediately after `recv`, never stored or mutated in between.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    priority: Priority,
    text: String,
}

/// Exact layout of the C peer's `struct message`.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct WireMessage {
    pub mtype: libc::c_long,
    pub mtext: [u8; TEXT_CAPACITY],
}

impl WireMessage {
    pub(crate) fn zeroed() -> Self {
        WireMessage {
            mtype: 0,
            mtext: [0u8; TEXT_CAPACITY],
        }
    }
}

impl Message {
    pub fn new(priority: Priority, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.len() > MAX_TEXT_LEN {
            return Err(Error::PayloadTooLarge(text.len()));
        }
        if text.as_bytes().contains(&0) {
            return Err(Error::InvalidText("text contains a nul byte"));
        }
        Ok(Message { priority, text })
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn to_wire(&self) -> WireMessage {
        let mut wire = WireMessage::zeroed();
        wire.mtype = self.priority.as_mtype();
        wire.mtext[..self.text.len()].copy_from_slice(self.text.as_bytes());
        wire
    }

    pub(crate) fn from_wire(wire: &WireMessage) -> Result<Self> {
        let priority = Priority::new(wire.mtype as i64)?;
        let len = wire
            .mtext
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(TEXT_CAPACITY);
        if len > MAX_TEXT_LEN {
            return Err(Error::InvalidText("text is not nul-terminated"));
        }
        let text = std::str::from_utf8(&wire.mtext[..len])
            .map_err(|_| Error::InvalidText("text is not valid utf-8"))?;
        Ok(Message {
            priority,
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, Priority, WireMessage, MAX_TEXT_LEN, TEXT_CAPACITY};
    use crate::Error;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn wire_layout_matches_c_struct() {
        // Interop with the C peer needs mtext directly after the c_long
        // mtype; the compiler then rounds the struct up to c_long
        // alignment with tail padding, exactly as C does.
        assert_eq!(offset_of!(WireMessage, mtype), 0);
        assert_eq!(offset_of!(WireMessage, mtext), size_of::<libc::c_long>());
        assert!(size_of::<WireMessage>() >= size_of::<libc::c_long>() + TEXT_CAPACITY);
        assert_eq!(align_of::<WireMessage>(), align_of::<libc::c_long>());
        assert_eq!(size_of::<WireMessage>() % align_of::<libc::c_long>(), 0);
    }

    #[test]
    fn wire_round_trip() {
        let msg = Message::new(Priority::new(2).unwrap(), "hello queue").unwrap();
        let wire = msg.to_wire();
        assert_eq!(wire.mtype, 2);
        let back = Message::from_wire(&wire).expect("decode");
        assert_eq!(back, msg);
    }

    #[test]
    fn decode_truncates_at_nul() {
        let mut wire = WireMessage::zeroed();
        wire.mtype = 1;
        wire.mtext[..5].copy_from_slice(b"hello");
        wire.mtext[6] = b'x'; // stale byte past the terminator
        let msg = Message::from_wire(&wire).expect("decode");
        assert_eq!(msg.text(), "hello");
    }

    #[test]
    fn text_at_capacity_is_accepted() {
        let text = "x".repeat(MAX_TEXT_LEN);
        let msg = Message::new(Priority::MIN, text.clone()).expect("max-length text");
        let back = Message::from_wire(&msg.to_wire()).expect("decode");
        assert_eq!(back.text(), text);
    }

    #[test]
    fn oversized_text_rejected() {
        let text = "x".repeat(MAX_TEXT_LEN + 1);
        match Message::new(Priority::MIN, text) {
            Err(Error::PayloadTooLarge(len)) => assert_eq!(len, MAX_TEXT_LEN + 1),
            other => panic!("expected PayloadTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn interior_nul_rejected() {
        assert!(Message::new(Priority::MIN, "a\0b").is_err());
    }

    #[test]
    fn priority_range_enforced() {
        assert!(Priority::new(0).is_err());
        assert!(Priority::new(4).is_err());
        assert_eq!(Priority::new(1).unwrap(), Priority::MIN);
        assert_eq!(Priority::new(3).unwrap(), Priority::MAX);
    }

    #[test]
    fn priority_parses_from_cli_text() {
        let p: Priority = " 2 ".parse().expect("parse");
        assert_eq!(p.get(), 2);
        match "zero".parse::<Priority>() {
            Err(Error::InvalidPriority(input)) => assert_eq!(input, "zero"),
            other => panic!("expected InvalidPriority, got {other:?}"),
        }
        match "9".parse::<Priority>() {
            Err(Error::InvalidPriority(input)) => assert_eq!(input, "9"),
            other => panic!("expected InvalidPriority, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_out_of_range_mtype() {
        let mut wire = WireMessage::zeroed();
        wire.mtype = 7;
        match Message::from_wire(&wire) {
            Err(Error::InvalidPriority(value)) => assert_eq!(value, "7"),
            other => panic!("expected InvalidPriority, got {other:?}"),
        }
    }
}
