use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, SendError, Sender};

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::material::{parse_hex_color, to_hex_color};
use crate::registry::PartCategory;

/// Message emitted by the UI towards the configurator.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    ColorChangeRequested { category: PartCategory, color: Vec3 },
    TextureChangeRequested { category: PartCategory, texture: String },
    ResetRequested,
    PartClicked { ndc_x: f32, ndc_y: f32 },
}

impl Intent {
    pub fn click(ndc: Vec2) -> Self {
        Self::PartClicked {
            ndc_x: ndc.x,
            ndc_y: ndc.y,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColorChangeRequested { category, color } => {
                write!(f, "color {category} {}", to_hex_color(*color))
            }
            Self::TextureChangeRequested { category, texture } => {
                write!(f, "texture {category} {texture}")
            }
            Self::ResetRequested => f.write_str("reset"),
            Self::PartClicked { ndc_x, ndc_y } => write!(f, "click {ndc_x} {ndc_y}"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum IntentParseError {
    #[error("empty intent")]
    Empty,
    #[error("unknown intent {0:?}")]
    UnknownCommand(String),
    #[error("{command}: expected {expected}")]
    Arguments {
        command: &'static str,
        expected: &'static str,
    },
    #[error("{0}")]
    Invalid(String),
}

impl FromStr for Intent {
    type Err = IntentParseError;

    /// Parses the line syntax used by intent scripts:
    /// `color <category> <#rrggbb>`, `texture <category> <name>`, `reset`
    /// and `click <ndc_x> <ndc_y>`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, args)) = words.split_first() else {
            return Err(IntentParseError::Empty);
        };
        match (*command, args) {
            ("color", [category, color]) => Ok(Self::ColorChangeRequested {
                category: parse_category(category)?,
                color: parse_hex_color(color)
                    .map_err(|err| IntentParseError::Invalid(err.to_string()))?,
            }),
            ("color", _) => Err(IntentParseError::Arguments {
                command: "color",
                expected: "<category> <#rrggbb>",
            }),
            ("texture", [category, texture]) => Ok(Self::TextureChangeRequested {
                category: parse_category(category)?,
                texture: texture.to_string(),
            }),
            ("texture", _) => Err(IntentParseError::Arguments {
                command: "texture",
                expected: "<category> <name>",
            }),
            ("reset", []) => Ok(Self::ResetRequested),
            ("reset", _) => Err(IntentParseError::Arguments {
                command: "reset",
                expected: "no arguments",
            }),
            ("click", [x, y]) => Ok(Self::PartClicked {
                ndc_x: parse_coordinate(x)?,
                ndc_y: parse_coordinate(y)?,
            }),
            ("click", _) => Err(IntentParseError::Arguments {
                command: "click",
                expected: "<ndc_x> <ndc_y>",
            }),
            (other, _) => Err(IntentParseError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_category(value: &str) -> Result<PartCategory, IntentParseError> {
    value
        .parse::<PartCategory>()
        .map_err(|err| IntentParseError::Invalid(err.to_string()))
}

fn parse_coordinate(value: &str) -> Result<f32, IntentParseError> {
    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| IntentParseError::Invalid(format!("invalid coordinate {value:?}")))
}

/// Clonable handle the UI uses to queue intents.
#[derive(Debug, Clone)]
pub struct IntentSender {
    tx: Sender<Intent>,
}

impl IntentSender {
    pub fn send(&self, intent: Intent) -> Result<(), SendError<Intent>> {
        self.tx.send(intent)
    }
}

/// Receiving end drained by the session on its own thread.
#[derive(Debug)]
pub struct IntentQueue {
    tx: Sender<Intent>,
    rx: Receiver<Intent>,
}

impl IntentQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> IntentSender {
        IntentSender {
            tx: self.tx.clone(),
        }
    }

    pub fn push(&self, intent: Intent) {
        // The queue owns a sender and a receiver, so the channel cannot be
        // disconnected here.
        let _ = self.tx.send(intent);
    }

    /// Takes every intent queued so far, in submission order.
    pub fn drain(&self) -> Vec<Intent> {
        self.rx.try_iter().collect()
    }
}

impl Default for IntentQueue {
    fn default() -> Self {
        Self::new()
    }
}
