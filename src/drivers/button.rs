//! Debounced push-button gesture classifier.
//!
//! The main loop samples the (active-low) button level at its own rate and
//! feeds it to [`ButtonDriver::sample`]; classified gestures come back as
//! [`InputEvent`]s ready for the input queue.
//!
//! | Gesture | Condition                          | Event         |
//! |---------|------------------------------------|---------------|
//! | Click   | Release before `HOLD_MS`           | `ButtonClick` |
//! | Hold    | Held for `HOLD_MS` (fires once)    | `ButtonHold`  |

use crate::events::InputEvent;
use crate::scheduler::Tick;

const DEBOUNCE_MS: Tick = 30;
const HOLD_MS: Tick = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    Debounce { since: Tick },
    Pressed { since: Tick },
    /// Hold already reported; wait for release.
    Held,
}

pub struct ButtonDriver {
    state: GestureState,
}

impl Default for ButtonDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonDriver {
    pub const fn new() -> Self {
        Self {
            state: GestureState::Idle,
        }
    }

    /// Feed one level sample (`pressed == true` while the switch is closed).
    pub fn sample(&mut self, pressed: bool, now: Tick) -> Option<InputEvent> {
        match (self.state, pressed) {
            (GestureState::Idle, true) => {
                self.state = GestureState::Debounce { since: now };
                None
            }
            (GestureState::Debounce { since }, true) => {
                if now.saturating_sub(since) >= DEBOUNCE_MS {
                    self.state = GestureState::Pressed { since };
                }
                None
            }
            (GestureState::Pressed { since }, true) => {
                if now.saturating_sub(since) >= HOLD_MS {
                    self.state = GestureState::Held;
                    return Some(InputEvent::ButtonHold);
                }
                None
            }
            (GestureState::Pressed { .. }, false) => {
                self.state = GestureState::Idle;
                Some(InputEvent::ButtonClick)
            }
            (_, false) => {
                // Bounce shorter than the debounce window, or release after a hold.
                self.state = GestureState::Idle;
                None
            }
            (GestureState::Held, true) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(btn: &mut ButtonDriver, samples: &[(bool, Tick)]) -> Vec<InputEvent> {
        samples
            .iter()
            .filter_map(|&(pressed, now)| btn.sample(pressed, now))
            .collect()
    }

    #[test]
    fn short_press_is_a_click() {
        let mut btn = ButtonDriver::new();
        let events = run(&mut btn, &[(true, 0), (true, 40), (true, 200), (false, 250)]);
        assert_eq!(events, vec![InputEvent::ButtonClick]);
    }

    #[test]
    fn bounce_is_ignored() {
        let mut btn = ButtonDriver::new();
        let events = run(&mut btn, &[(true, 0), (false, 10), (true, 20), (false, 35)]);
        assert!(events.is_empty());
    }

    #[test]
    fn hold_fires_once_and_release_is_silent() {
        let mut btn = ButtonDriver::new();
        let events = run(
            &mut btn,
            &[(true, 0), (true, 50), (true, 1500), (true, 2000), (false, 2100)],
        );
        assert_eq!(events, vec![InputEvent::ButtonHold]);
    }
}
