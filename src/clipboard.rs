//! System pasteboard access and the polling monitor.
//!
//! The pasteboard is behind a trait so the monitor and the app can be
//! driven by an in-memory fake in tests. Images cross the boundary as
//! PNG bytes; conversion to and from raw RGBA happens here.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use arboard::Clipboard;
use async_channel::Sender;
use tracing::{debug, info, warn};

use crate::error::ResultExt;
use crate::events::AppEvent;
use crate::history::entry::Payload;

// Not `Send`: platform clipboards are thread-affine, so each thread
// builds its own probe and keeps it there.
pub trait ClipboardProbe {
    fn read_text(&mut self) -> Option<String>;
    /// Current image as PNG bytes, if any.
    fn read_image(&mut self) -> Option<Vec<u8>>;
    fn write_text(&mut self, text: &str) -> anyhow::Result<()>;
    fn write_image(&mut self, png: &[u8]) -> anyhow::Result<()>;
}

/// Real pasteboard via arboard.
pub struct SystemClipboard {
    clipboard: Clipboard,
}

impl SystemClipboard {
    pub fn new() -> anyhow::Result<Self> {
        let clipboard = Clipboard::new().context("Failed to create clipboard instance")?;
        Ok(Self { clipboard })
    }
}

impl ClipboardProbe for SystemClipboard {
    fn read_text(&mut self) -> Option<String> {
        self.clipboard.get_text().ok().filter(|t| !t.is_empty())
    }

    fn read_image(&mut self) -> Option<Vec<u8>> {
        let image = self.clipboard.get_image().ok()?;
        encode_png(&image).warn_on_err()
    }

    fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.clipboard
            .set_text(text)
            .context("Failed to write text to clipboard")
    }

    fn write_image(&mut self, png: &[u8]) -> anyhow::Result<()> {
        let decoded = image::load_from_memory_with_format(png, image::ImageFormat::Png)
            .context("Failed to decode PNG for clipboard")?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        let data = arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: decoded.into_raw().into(),
        };
        self.clipboard
            .set_image(data)
            .context("Failed to write image to clipboard")
    }
}

/// Encode raw RGBA clipboard data as PNG (~90% smaller than raw).
fn encode_png(image: &arboard::ImageData) -> anyhow::Result<Vec<u8>> {
    let rgba = image::RgbaImage::from_raw(
        image.width as u32,
        image.height as u32,
        image.bytes.to_vec(),
    )
    .context("Failed to create RGBA image from clipboard data")?;
    let mut png = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .context("Failed to encode image as PNG")?;
    Ok(png)
}

/// In-memory pasteboard for tests.
#[derive(Default)]
pub struct MemoryClipboard {
    text: Option<String>,
    image: Option<Vec<u8>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
        self.image = None;
    }

    pub fn set_image(&mut self, png: Vec<u8>) {
        self.image = Some(png);
        self.text = None;
    }
}

impl ClipboardProbe for MemoryClipboard {
    fn read_text(&mut self) -> Option<String> {
        self.text.clone().filter(|t| !t.is_empty())
    }

    fn read_image(&mut self) -> Option<Vec<u8>> {
        self.image.clone()
    }

    fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.set_text(text);
        Ok(())
    }

    fn write_image(&mut self, png: &[u8]) -> anyhow::Result<()> {
        self.set_image(png.to_vec());
        Ok(())
    }
}

/// Polls the pasteboard and emits a `ClipboardChanged` event per change.
///
/// Change detection is local: last seen text and last image fingerprint.
/// Dedup against history is the store's job.
pub struct Monitor<P: ClipboardProbe> {
    probe: P,
    tx: Sender<AppEvent>,
    interval: Duration,
    last_text: Option<String>,
    last_image_fp: Option<String>,
}

impl<P: ClipboardProbe> Monitor<P> {
    pub fn new(probe: P, tx: Sender<AppEvent>, interval: Duration) -> Self {
        Self {
            probe,
            tx,
            interval,
            last_text: None,
            last_image_fp: None,
        }
    }

    /// One poll pass. Returns the detected payload, if any.
    ///
    /// An image on the pasteboard takes precedence: text is only
    /// consulted when no image representation is present.
    pub fn tick(&mut self) -> Option<Payload> {
        if let Some(png) = self.probe.read_image() {
            let payload = Payload::image(png);
            let fingerprint = payload.fingerprint();
            if self.last_image_fp.as_deref() != Some(fingerprint.as_str()) {
                debug!("New image detected in clipboard");
                self.last_image_fp = Some(fingerprint);
                self.emit(payload.clone());
                return Some(payload);
            }
            return None;
        }

        if let Some(text) = self.probe.read_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() && self.last_text.as_deref() != Some(trimmed) {
                debug!(text_len = trimmed.len(), "New text detected in clipboard");
                self.last_text = Some(trimmed.to_string());
                let payload = Payload::text(trimmed);
                self.emit(payload.clone());
                return Some(payload);
            }
        }

        None
    }

    fn emit(&self, payload: Payload) {
        if let Err(e) = self.tx.send_blocking(AppEvent::ClipboardChanged(payload)) {
            warn!(error = %e, "Dropped clipboard change, channel closed");
        }
    }

    /// Poll until the stop flag is set, sleeping out the remainder of
    /// each interval.
    pub fn run(mut self, stop: Arc<AtomicBool>) {
        info!(
            poll_interval_ms = self.interval.as_millis() as u64,
            "Clipboard monitor started"
        );
        loop {
            if stop.load(Ordering::Relaxed) {
                info!("Clipboard monitor stopping");
                break;
            }
            let start = Instant::now();
            self.tick();
            let elapsed = start.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;

    fn test_monitor() -> (Monitor<MemoryClipboard>, async_channel::Receiver<AppEvent>) {
        let (tx, rx) = events::channel();
        let monitor = Monitor::new(MemoryClipboard::new(), tx, Duration::from_millis(10));
        (monitor, rx)
    }

    #[test]
    fn tick_detects_new_text_once() {
        let (mut monitor, rx) = test_monitor();
        monitor.probe.set_text("hello");
        assert_eq!(monitor.tick(), Some(Payload::text("hello")));
        assert_eq!(
            rx.try_recv().unwrap(),
            AppEvent::ClipboardChanged(Payload::text("hello"))
        );
        // Unchanged pasteboard is quiet.
        assert_eq!(monitor.tick(), None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn tick_trims_and_ignores_whitespace_only_text() {
        let (mut monitor, _rx) = test_monitor();
        monitor.probe.set_text("  padded  ");
        assert_eq!(monitor.tick(), Some(Payload::text("padded")));
        monitor.probe.set_text("   \n\t ");
        assert_eq!(monitor.tick(), None);
    }

    #[test]
    fn tick_detects_image_changes_by_content() {
        let (mut monitor, _rx) = test_monitor();
        monitor.probe.set_image(vec![1, 2, 3]);
        assert_eq!(monitor.tick(), Some(Payload::image(vec![1, 2, 3])));
        assert_eq!(monitor.tick(), None);
        monitor.probe.set_image(vec![4, 5, 6]);
        assert_eq!(monitor.tick(), Some(Payload::image(vec![4, 5, 6])));
    }

    #[test]
    fn image_wins_when_both_representations_present() {
        let (mut monitor, _rx) = test_monitor();
        monitor.probe.text = Some("caption".into());
        monitor.probe.image = Some(vec![1, 2, 3]);
        assert_eq!(monitor.tick(), Some(Payload::image(vec![1, 2, 3])));
        // While the image stays on the pasteboard the text is never consulted.
        assert_eq!(monitor.tick(), None);
        // Text is picked up once the image representation goes away.
        monitor.probe.image = None;
        assert_eq!(monitor.tick(), Some(Payload::text("caption")));
    }

    #[test]
    fn text_change_after_same_text_is_detected() {
        let (mut monitor, _rx) = test_monitor();
        monitor.probe.set_text("a");
        monitor.tick();
        monitor.probe.set_text("b");
        assert_eq!(monitor.tick(), Some(Payload::text("b")));
    }

    #[test]
    fn memory_clipboard_write_replaces_other_kind() {
        let mut probe = MemoryClipboard::new();
        probe.write_image(&[1, 2]).unwrap();
        assert!(probe.read_image().is_some());
        probe.write_text("now text").unwrap();
        assert!(probe.read_image().is_none());
        assert_eq!(probe.read_text(), Some("now text".into()));
    }

    #[cfg(feature = "system-tests")]
    #[test]
    fn system_clipboard_round_trips_text() {
        let mut probe = SystemClipboard::new().unwrap();
        probe.write_text("copydeck system test").unwrap();
        assert_eq!(probe.read_text(), Some("copydeck system test".into()));
    }
}
