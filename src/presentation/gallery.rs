//! Terminal driver for the image viewer.

use std::io;
use std::time::Instant;

use crate::application::viewer::{ImageViewer, MIN_SWIPE_DISTANCE, ViewerEvent, ViewerKey};

use super::terminal::Terminal;
use super::views;

const HELP: &str = "n/→ next · p/← previous · <number> jump · sl/sr swipe · q close";

/// One line of operator input, mapped onto viewer gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryInput {
    Key(ViewerKey),
    Jump(usize),
    SwipeLeft,
    SwipeRight,
}

pub fn parse_input(line: &str) -> GalleryInput {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "n" | "l" | ">" | "right" => GalleryInput::Key(ViewerKey::ArrowRight),
        "p" | "h" | "<" | "left" => GalleryInput::Key(ViewerKey::ArrowLeft),
        "q" | "x" | "esc" | "escape" => GalleryInput::Key(ViewerKey::Escape),
        "sl" => GalleryInput::SwipeLeft,
        "sr" => GalleryInput::SwipeRight,
        other => match other.parse::<usize>() {
            Ok(position) if position > 0 => GalleryInput::Jump(position - 1),
            _ => GalleryInput::Key(ViewerKey::Other),
        },
    }
}

fn apply(viewer: &mut ImageViewer, input: GalleryInput, now: Instant) -> ViewerEvent {
    let travel = MIN_SWIPE_DISTANCE * 2.0;
    match input {
        GalleryInput::Key(key) => viewer.handle_key(key, now),
        GalleryInput::Jump(index) => viewer.jump(index),
        GalleryInput::SwipeLeft => {
            viewer.touch_start(travel, 0.0);
            viewer.touch_end(0.0, 0.0, now)
        }
        GalleryInput::SwipeRight => {
            viewer.touch_start(0.0, 0.0);
            viewer.touch_end(travel, 0.0, now)
        }
    }
}

/// Show `images` starting at `start` until the operator closes the viewer or
/// input ends.
pub fn run(terminal: &Terminal, images: Vec<String>, start: usize) -> io::Result<()> {
    let mut viewer = ImageViewer::default();
    viewer.open(images, start);
    let Some(gallery) = viewer.gallery() else {
        return Ok(());
    };
    if gallery.is_empty() {
        viewer.close();
        return terminal.print("Post has no images.");
    }
    terminal.notice(HELP)?;
    terminal.print(&views::gallery_frame(gallery))?;

    while let Some(line) = terminal.read_line()? {
        match apply(&mut viewer, parse_input(&line), Instant::now()) {
            ViewerEvent::Moved { .. } => {
                if let Some(gallery) = viewer.gallery() {
                    terminal.print(&views::gallery_frame(gallery))?;
                }
            }
            ViewerEvent::Closed => return Ok(()),
            ViewerEvent::Ignored => {}
        }
    }
    viewer.close();
    Ok(())
}
