//! Full-screen image viewer state: gallery navigation, keyboard and swipes.
//!
//! Time is passed in explicitly so the transition cooldown can be driven
//! deterministically.

use std::time::{Duration, Instant};

/// Cooldown after an arrow or swipe navigation during which further
/// navigation is ignored.
pub const TRANSITION_COOLDOWN: Duration = Duration::from_millis(300);

/// Minimum horizontal travel, in pixels, for a touch to count as a swipe.
pub const MIN_SWIPE_DISTANCE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Outcome of feeding an input event to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    Moved { index: usize },
    Closed,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery {
    images: Vec<String>,
    index: usize,
}

impl Gallery {
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&str> {
        self.images.get(self.index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn last_index(&self) -> usize {
        self.images.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewerState {
    #[default]
    Closed,
    Open(Gallery),
}

#[derive(Debug, Default)]
pub struct ImageViewer {
    state: ViewerState,
    locked_until: Option<Instant>,
    touch_start: Option<(f32, f32)>,
    key_listener: bool,
}

impl ImageViewer {
    pub fn gallery(&self) -> Option<&Gallery> {
        match &self.state {
            ViewerState::Open(gallery) => Some(gallery),
            ViewerState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ViewerState::Open(_))
    }

    /// Whether the keyboard listener is currently registered.
    pub fn is_listening(&self) -> bool {
        self.key_listener
    }

    /// Open a fresh gallery at `start`, clamped into bounds.
    pub fn open(&mut self, images: Vec<String>, start: usize) {
        let index = start.min(images.len().saturating_sub(1));
        self.state = ViewerState::Open(Gallery { images, index });
        self.locked_until = None;
        self.touch_start = None;
        self.key_listener = true;
    }

    /// Close the viewer and deregister the keyboard listener.
    pub fn close(&mut self) -> ViewerEvent {
        if !self.is_open() && !self.key_listener {
            return ViewerEvent::Ignored;
        }
        self.state = ViewerState::Closed;
        self.locked_until = None;
        self.touch_start = None;
        self.key_listener = false;
        ViewerEvent::Closed
    }

    pub fn handle_key(&mut self, key: ViewerKey, now: Instant) -> ViewerEvent {
        if !self.key_listener {
            return ViewerEvent::Ignored;
        }
        match key {
            ViewerKey::Escape => self.close(),
            ViewerKey::ArrowLeft => self.previous(now),
            ViewerKey::ArrowRight => self.next(now),
            ViewerKey::Other => ViewerEvent::Ignored,
        }
    }

    pub fn previous(&mut self, now: Instant) -> ViewerEvent {
        self.step(now, |gallery| gallery.index.checked_sub(1))
    }

    pub fn next(&mut self, now: Instant) -> ViewerEvent {
        self.step(now, |gallery| {
            (gallery.index < gallery.last_index()).then_some(gallery.index + 1)
        })
    }

    /// Thumbnail selection; not subject to the transition lock.
    pub fn jump(&mut self, index: usize) -> ViewerEvent {
        match &mut self.state {
            ViewerState::Open(gallery) if index < gallery.images.len() => {
                gallery.index = index;
                ViewerEvent::Moved { index }
            }
            _ => ViewerEvent::Ignored,
        }
    }

    pub fn touch_start(&mut self, x: f32, y: f32) {
        if self.is_open() {
            self.touch_start = Some((x, y));
        }
    }

    /// Classify the gesture that ends at `(x, y)`.
    ///
    /// Swiping left moves forward, swiping right moves back.
    pub fn touch_end(&mut self, x: f32, y: f32, now: Instant) -> ViewerEvent {
        let Some((start_x, start_y)) = self.touch_start.take() else {
            return ViewerEvent::Ignored;
        };
        let delta_x = start_x - x;
        let delta_y = start_y - y;
        if delta_x.abs() <= delta_y.abs() || delta_x.abs() <= MIN_SWIPE_DISTANCE {
            return ViewerEvent::Ignored;
        }
        if delta_x > 0.0 {
            self.next(now)
        } else {
            self.previous(now)
        }
    }

    fn step(&mut self, now: Instant, target: impl FnOnce(&Gallery) -> Option<usize>) -> ViewerEvent {
        if self.locked_until.is_some_and(|until| now < until) {
            return ViewerEvent::Ignored;
        }
        let ViewerState::Open(gallery) = &mut self.state else {
            return ViewerEvent::Ignored;
        };
        match target(gallery) {
            Some(index) => {
                gallery.index = index;
                self.locked_until = Some(now + TRANSITION_COOLDOWN);
                ViewerEvent::Moved { index }
            }
            None => ViewerEvent::Ignored,
        }
    }
}
