//! Caller-owned viewer state: current frame, last decoded image and playback.
//!
//! A [`Session`] never owns a timer or a window. Callers drive it: change parameters, call
//! [`Session::refresh`] to (re)decode, and call [`Session::tick`] at the interval returned by
//! [`Session::playback_interval`] while playing.

use std::time::Duration;

use rawview_codec::prelude::*;

use crate::settings::{SettingsError, ViewerSettings};

/// Outcome of [`Session::refresh`].
#[derive(Debug)]
pub enum Refresh<'a> {
    /// The current frame, freshly decoded.
    Frame(&'a DecodedFrame),
    /// Not a single whole frame fits in the buffer with the current parameters.
    NoFramesAvailable,
}

/// Outcome of [`Session::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTick {
    /// Moved to this (0-based) frame; call [`Session::refresh`] to decode it.
    Advanced(usize),
    /// Reached the last frame; playback stopped.
    Finished,
    /// Playback is not running.
    Idle,
}

/// Which navigation controls apply right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    /// `"Frame: X / Y"` with a 1-based `X`, or `"Frame: 0 / 0"` when empty.
    pub label: String,
    pub can_prev: bool,
    pub can_next: bool,
    pub can_jump: bool,
    pub can_play: bool,
    /// The playback rate may only change while stopped.
    pub can_edit_fps: bool,
    pub playing: bool,
}

/// Decode session over a multi-frame dump.
///
/// # Example
/// ```rust
/// use rawview::prelude::*;
///
/// // Two 2x2 NV12 frames: black, then white.
/// let mut dump = vec![16, 16, 16, 16, 128, 128];
/// dump.extend_from_slice(&[235, 235, 235, 235, 128, 128]);
/// let settings = ViewerSettings {
///     width: 2,
///     height: 2,
///     linesize: 2,
///     format: PixelFormat::Nv12,
///     ..ViewerSettings::default()
/// };
///
/// let mut session = Session::new(dump, &settings)?;
/// assert!(session.next_frame());
/// let Refresh::Frame(frame) = session.refresh()? else {
///     panic!("expected a frame");
/// };
/// assert_eq!(frame.pixel(0, 0), Some(&[255u8, 255, 255][..]));
/// assert_eq!(session.navigation().label, "Frame: 2 / 2");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Session<B: AsRef<[u8]>> {
    buffer: B,
    decoder: FrameDecoder,
    format: PixelFormat,
    geometry: FrameGeometry,
    current_frame: usize,
    last_frame: Option<DecodedFrame>,
    playback: Option<Duration>,
}

impl<B: AsRef<[u8]>> Session<B> {
    /// Open a session on `buffer` with validated `settings`, positioned on the first frame.
    pub fn new(buffer: B, settings: &ViewerSettings) -> Result<Self, SettingsError> {
        let geometry = settings.geometry()?;
        log::debug!(
            "session over {} bytes as {} {}",
            buffer.as_ref().len(),
            settings.format,
            geometry
        );
        Ok(Self {
            buffer,
            decoder: FrameDecoder::new(),
            format: settings.format,
            geometry,
            current_frame: 0,
            last_frame: None,
            playback: None,
        })
    }

    /// Decode through `decoder` instead of the built-in registry.
    pub fn with_decoder(mut self, decoder: FrameDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Change format and geometry. Takes effect on the next [`refresh`](Self::refresh).
    pub fn set_parameters(&mut self, format: PixelFormat, geometry: FrameGeometry) {
        if format != self.format || geometry != self.geometry {
            log::debug!("parameters changed to {format} {geometry}");
        }
        self.format = format;
        self.geometry = geometry;
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// 0-based index of the frame shown (or about to be shown).
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Frame decoded by the last successful [`refresh`](Self::refresh).
    pub fn last_frame(&self) -> Option<&DecodedFrame> {
        self.last_frame.as_ref()
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Frame size and count under the current parameters.
    pub fn frame_index(&self) -> Result<FrameIndex, FormatError> {
        SourceBuffer::new(self.buffer.as_ref()).index(self.format, self.geometry)
    }

    fn frame_count(&self) -> usize {
        self.frame_index().map_or(0, |index| index.frame_count())
    }

    /// Decode the current frame.
    ///
    /// The current frame is pulled back to the last frame when the parameters shrank the
    /// count. On error the previously decoded frame is kept.
    pub fn refresh(&mut self) -> Result<Refresh<'_>, CodecError> {
        let index = self.frame_index()?;
        if index.is_empty() {
            log::info!(
                "no whole {} frame of {} bytes in {} bytes",
                self.format,
                index.frame_size(),
                self.buffer.as_ref().len()
            );
            self.last_frame = None;
            self.playback = None;
            return Ok(Refresh::NoFramesAvailable);
        }

        let clamped = index.clamp(self.current_frame);
        if clamped != self.current_frame {
            log::debug!("frame {} out of range, showing {}", self.current_frame, clamped);
            self.current_frame = clamped;
        }

        let source = SourceBuffer::new(self.buffer.as_ref());
        let bytes = source.frame(&index, self.current_frame).ok_or_else(|| {
            CodecError::Codec(format!("frame {} not addressable", self.current_frame))
        })?;
        match self.decoder.decode(bytes, self.format, self.geometry) {
            Ok(frame) => {
                log::debug!(
                    "decoded frame {}/{}",
                    self.current_frame + 1,
                    index.frame_count()
                );
                Ok(Refresh::Frame(self.last_frame.insert(frame)))
            }
            Err(err) => {
                log::warn!("decode of frame {} failed: {err}", self.current_frame + 1);
                Err(err)
            }
        }
    }

    /// Step forward; `false` when already on the last frame.
    pub fn next_frame(&mut self) -> bool {
        if self.current_frame + 1 < self.frame_count() {
            self.current_frame += 1;
            true
        } else {
            false
        }
    }

    /// Step back; `false` when already on the first frame.
    pub fn prev_frame(&mut self) -> bool {
        if self.current_frame > 0 && self.frame_count() > 0 {
            self.current_frame -= 1;
            true
        } else {
            false
        }
    }

    /// Move to the 0-based `frame`; `false` when it does not exist.
    pub fn jump_to(&mut self, frame: usize) -> bool {
        if frame < self.frame_count() {
            self.current_frame = frame;
            true
        } else {
            false
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    /// Interval between [`tick`](Self::tick) calls while playing.
    pub fn playback_interval(&self) -> Option<Duration> {
        self.playback
    }

    /// Start or stop playback. Returns whether playback is running afterwards.
    ///
    /// Playback only starts with more than one frame and a non-zero `fps`; the tick interval
    /// is `1000 / fps` milliseconds.
    pub fn toggle_playback(&mut self, fps: u32) -> bool {
        if self.playback.take().is_some() {
            log::info!("playback paused at frame {}", self.current_frame + 1);
            return false;
        }
        if self.frame_count() > 1 && fps > 0 {
            let interval = Duration::from_millis(u64::from(1000 / fps));
            log::info!("playback started at {fps} fps");
            self.playback = Some(interval);
        }
        self.playback.is_some()
    }

    /// Advance one frame of playback, stopping on the last frame.
    pub fn tick(&mut self) -> PlaybackTick {
        if self.playback.is_none() {
            return PlaybackTick::Idle;
        }
        if self.next_frame() {
            PlaybackTick::Advanced(self.current_frame)
        } else {
            log::info!("playback finished");
            self.playback = None;
            PlaybackTick::Finished
        }
    }

    /// Label text and which controls are enabled.
    pub fn navigation(&self) -> NavigationState {
        let total = self.frame_count();
        let playing = self.is_playing();
        let label = if total > 0 {
            format!("Frame: {} / {}", self.current_frame + 1, total)
        } else {
            "Frame: 0 / 0".to_string()
        };
        NavigationState {
            label,
            can_prev: !playing && self.current_frame > 0,
            can_next: !playing && self.current_frame + 1 < total,
            can_jump: !playing && total > 1,
            can_play: total > 1,
            can_edit_fps: !playing,
            playing,
        }
    }
}
