//! Full-screen loading overlay
//!
//! Shows a cycling status line and the model load progress in front of a
//! scene. When the model is attached the overlay waits one second, fades out
//! over one second and then hides for good. A failed model never completes,
//! so the overlay stays up with its cycling text.

use crate::scene::ModelStatus;

/// Status lines, cycled in order
pub const STATUS_MESSAGES: [&str; 5] = [
    "Initializing",
    "Loading resources",
    "Preparing experience",
    "Almost ready",
    "Launching",
];

/// Seconds each status line is shown
pub const STATUS_INTERVAL: f32 = 2.0;

/// Delay between model completion and the start of the fade
pub const COMPLETE_DELAY: f32 = 1.0;

/// Fade-out duration
pub const FADE_DURATION: f32 = 1.0;

/// Visibility phase of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    /// Fully opaque
    Visible,
    /// Opacity ramping down
    FadingOut,
    /// Gone; never shown again
    Hidden,
}

/// Loading overlay state machine
#[derive(Debug, Clone)]
pub struct LoadingOverlay {
    phase: OverlayPhase,
    opacity: f32,
    progress: f32,
    status_index: usize,
    completed_at: Option<f32>,
}

impl Default for LoadingOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingOverlay {
    /// Visible overlay with the first status line
    pub fn new() -> Self {
        Self {
            phase: OverlayPhase::Visible,
            opacity: 1.0,
            progress: 0.0,
            status_index: 0,
            completed_at: None,
        }
    }

    /// Advance to elapsed time `t` given the current model status
    pub fn update(&mut self, t: f32, status: &ModelStatus) {
        if self.phase == OverlayPhase::Hidden {
            return;
        }

        self.status_index = ((t.max(0.0) / STATUS_INTERVAL) as usize) % STATUS_MESSAGES.len();
        self.progress = status.progress().clamp(0.0, 100.0);

        if let ModelStatus::Loaded { at } = status {
            if self.completed_at.is_none() {
                log::debug!("Loading overlay: model ready at {:.2}s", at);
                self.completed_at = Some(*at);
            }
        }

        let Some(completed_at) = self.completed_at else {
            return;
        };
        let fade_start = completed_at + COMPLETE_DELAY;
        let previous = self.phase;
        if t < fade_start {
            self.phase = OverlayPhase::Visible;
            self.opacity = 1.0;
        } else if t < fade_start + FADE_DURATION {
            self.phase = OverlayPhase::FadingOut;
            self.opacity = 1.0 - (t - fade_start) / FADE_DURATION;
        } else {
            self.phase = OverlayPhase::Hidden;
            self.opacity = 0.0;
        }
        if self.phase != previous {
            log::info!("Loading overlay {:?} -> {:?}", previous, self.phase);
        }
    }

    /// Current phase
    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    /// Current opacity, 1 while visible and 0 once hidden
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Whole percent of the model load
    pub fn progress_percent(&self) -> u32 {
        self.progress.round() as u32
    }

    /// Current status line
    pub fn status_text(&self) -> &'static str {
        STATUS_MESSAGES[self.status_index]
    }

    /// True once hidden
    pub fn is_hidden(&self) -> bool {
        self.phase == OverlayPhase::Hidden
    }
}
