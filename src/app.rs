use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::animation::ManualClock;
use crate::intent::Intent;
use crate::material::{to_hex_color, MaterialStore};
use crate::session::ConfiguratorSession;

/// Simulated frame length used when replaying waits.
pub const FRAME: Duration = Duration::from_millis(16);

/// One line of an intent script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Intent(Intent),
    /// Let time pass, ticking the session once per frame.
    Wait(Duration),
    /// Print the order snapshot.
    Order,
}

impl FromStr for ScriptStep {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some("wait"), Some(ms), None) => {
                let ms = ms
                    .parse::<u64>()
                    .with_context(|| format!("invalid wait duration {ms:?}"))?;
                Ok(Self::Wait(Duration::from_millis(ms)))
            }
            (Some("wait"), _, _) => Err(anyhow!("wait: expected <milliseconds>")),
            (Some("order"), None, _) => Ok(Self::Order),
            _ => Ok(Self::Intent(line.parse::<Intent>()?)),
        }
    }
}

/// Parses a script, skipping blank lines and `#` comments.
pub fn parse_script(source: &str) -> Result<Vec<ScriptStep>> {
    source
        .lines()
        .enumerate()
        .map(|(line_no, line)| (line_no, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            line.parse::<ScriptStep>()
                .with_context(|| format!("script line {}: {line}", line_no + 1))
        })
        .collect()
}

/// Replays `steps` against `session`, writing one line per step to `out`.
///
/// Intents go through the session's queue so they are handled exactly as
/// UI messages would be.
pub fn run_script(
    session: &mut ConfiguratorSession,
    clock: &Arc<ManualClock>,
    steps: &[ScriptStep],
    out: &mut impl Write,
) -> Result<()> {
    for step in steps {
        match step {
            ScriptStep::Intent(intent) => {
                session.submit(intent.clone());
                for (intent, outcome) in session.process_intents() {
                    writeln!(out, "> {intent}: {outcome}")?;
                }
            }
            ScriptStep::Wait(duration) => {
                let mut remaining = *duration;
                while !remaining.is_zero() {
                    let frame = remaining.min(FRAME);
                    clock.advance(frame);
                    session.tick();
                    remaining -= frame;
                }
                let state = if session.is_animating() {
                    "animating"
                } else {
                    "idle"
                };
                writeln!(out, "> wait {}ms: {state}", duration.as_millis())?;
            }
            ScriptStep::Order => {
                let json = session.order().to_json().context("failed to serialize order")?;
                writeln!(out, "Order: {json}")?;
            }
        }
    }
    Ok(())
}

pub fn final_state_lines(store: &MaterialStore) -> Vec<String> {
    store
        .snapshot()
        .into_iter()
        .map(|(category, state)| {
            let texture = state
                .texture
                .map(|texture| texture.name)
                .unwrap_or_else(|| "-".to_string());
            format!(
                " - {category} color={} texture={texture}",
                to_hex_color(state.color)
            )
        })
        .collect()
}

pub fn print_final_state(store: &MaterialStore) {
    println!("Final configuration:");
    for line in final_state_lines(store) {
        println!("{line}");
    }
}
