//! Record of the input the virtual backend received.

use std::fmt;

use stepwise_domain::step::{KeyCombination, MouseButton, truncate};

/// Longest text shown when a dispatch is displayed.
const DISPLAY_LIMIT: usize = 50;

/// One input call, in the order it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Move { x: u64, y: u64 },
    Click(MouseButton),
    Text(String),
    Keys {
        combination: KeyCombination,
        use_unicode: bool,
    },
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { x, y } => write!(f, "move to ({x}, {y})"),
            Self::Click(button) => write!(f, "click {button}"),
            Self::Text(text) => write!(f, "type {:?}", truncate(text, DISPLAY_LIMIT)),
            Self::Keys {
                combination,
                use_unicode: true,
            } => write!(f, "press {combination} (unicode)"),
            Self::Keys { combination, .. } => write!(
                f,
                "press {combination} (key code {})",
                combination.key_code
            ),
        }
    }
}
