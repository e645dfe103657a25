//! Value types exchanged between the intercept procedure and listeners.

use std::fmt;

/// Opaque handle naming one native window for the whole life of that window.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub isize);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque entry point the platform invokes to deliver a message to a window.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DispatchTarget(pub usize);

impl fmt::Display for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

const CODE_CREATE: u32 = 0x0001;
const CODE_DESTROY: u32 = 0x0002;
const CODE_MOVE: u32 = 0x0003;
const CODE_SIZE: u32 = 0x0005;
const CODE_ACTIVATE: u32 = 0x0006;
const CODE_SET_FOCUS: u32 = 0x0007;
const CODE_KILL_FOCUS: u32 = 0x0008;
const CODE_PAINT: u32 = 0x000F;
const CODE_CLOSE: u32 = 0x0010;
const CODE_NC_DESTROY: u32 = 0x0082;

/// Classified message code. Codes without a dedicated variant are kept in `Other`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Create,
    Destroy,
    Move,
    Size,
    Activate,
    SetFocus,
    KillFocus,
    Paint,
    Close,
    NcDestroy,
    Other(u32),
}

impl MessageKind {
    /// Classify a raw message code; unknown codes are kept verbatim.
    pub fn from_code(code: u32) -> Self {
        match code {
            CODE_CREATE => Self::Create,
            CODE_DESTROY => Self::Destroy,
            CODE_MOVE => Self::Move,
            CODE_SIZE => Self::Size,
            CODE_ACTIVATE => Self::Activate,
            CODE_SET_FOCUS => Self::SetFocus,
            CODE_KILL_FOCUS => Self::KillFocus,
            CODE_PAINT => Self::Paint,
            CODE_CLOSE => Self::Close,
            CODE_NC_DESTROY => Self::NcDestroy,
            other => Self::Other(other),
        }
    }

    /// Raw message code, inverse of `from_code`.
    pub fn code(self) -> u32 {
        match self {
            Self::Create => CODE_CREATE,
            Self::Destroy => CODE_DESTROY,
            Self::Move => CODE_MOVE,
            Self::Size => CODE_SIZE,
            Self::Activate => CODE_ACTIVATE,
            Self::SetFocus => CODE_SET_FOCUS,
            Self::KillFocus => CODE_KILL_FOCUS,
            Self::Paint => CODE_PAINT,
            Self::Close => CODE_CLOSE,
            Self::NcDestroy => CODE_NC_DESTROY,
            Self::Other(code) => code,
        }
    }

    /// The terminal message: once dispatched the hook tears itself down.
    pub fn is_destroy(self) -> bool {
        matches!(self, Self::Destroy)
    }
}

/// One intercepted message. Listeners get it by `&mut` and may rewrite the parameters
/// (seen by later listeners and by the original target) or the result word (returned to
/// the platform when the listener claims the message).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub window: WindowId,
    pub kind: MessageKind,
    pub wparam: usize,
    pub lparam: isize,
    pub result: isize,
}

impl Message {
    /// Fresh message with a zero result word.
    pub fn new(window: WindowId, kind: MessageKind, wparam: usize, lparam: isize) -> Self {
        Self {
            window,
            kind,
            wparam,
            lparam,
            result: 0,
        }
    }

    /// Build from a raw message code as delivered by the platform.
    pub fn from_raw(window: WindowId, code: u32, wparam: usize, lparam: isize) -> Self {
        Self::new(window, MessageKind::from_code(code), wparam, lparam)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_classify_and_unknown_codes_survive() {
        assert_eq!(MessageKind::from_code(0x000F), MessageKind::Paint);
        assert_eq!(MessageKind::from_code(0x0002), MessageKind::Destroy);
        assert_eq!(MessageKind::from_code(0x0400), MessageKind::Other(0x0400));
        assert_eq!(MessageKind::Other(0x0400).code(), 0x0400);
        assert_eq!(MessageKind::Close.code(), 0x0010);
    }

    #[test]
    fn only_destroy_is_terminal() {
        assert!(MessageKind::Destroy.is_destroy());
        assert!(!MessageKind::NcDestroy.is_destroy());
        assert!(!MessageKind::Close.is_destroy());
    }

    #[test]
    fn raw_message_starts_with_zero_result() {
        let msg = Message::from_raw(WindowId(0x10), 0x0005, 1, -2);
        assert_eq!(msg.kind, MessageKind::Size);
        assert_eq!(msg.wparam, 1);
        assert_eq!(msg.lparam, -2);
        assert_eq!(msg.result, 0);
    }
}
