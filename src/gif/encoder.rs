//! The animated GIF frame encoder.

use std::io::Write;

use indexed_dither::{DitherAlgorithm, DitherOptions, Palette};
use tracing::{debug, warn};

use super::{lzw, stream};
use crate::error::EncodeError;
use crate::pixmap::Pixmap;

/// Frame-size fallback when the first frame is degenerate.
const FALLBACK_SIZE: (u16, u16) = (320, 240);

/// Threshold handed to the per-frame palette analysis.
const ANALYZE_THRESHOLD: f64 = 100.0;

/// Streaming animated GIF encoder.
///
/// Lifecycle: [`start`](Self::start) opens a stream on a sink, any number
/// of [`add_frame`](Self::add_frame) calls append frames, and
/// [`finish`](Self::finish) writes the trailer and hands the sink back.
/// [`write`](Self::write) bundles the three for the common case. The
/// encoder itself is reusable across streams; configuration persists.
///
/// The first frame fixes the animation size; later frames of other sizes
/// are rescaled to fit. With no palette configured, every frame is
/// analyzed on its own (`analyze_fast` by default), which gives each
/// frame a faithful local color table at the cost of larger files.
pub struct GifEncoder<W: Write> {
    sink: Option<W>,
    palette: Option<Palette>,
    /// True while `palette` is a temporary installed by `write()`.
    palette_from_write: bool,
    algorithm: DitherAlgorithm,
    dither_strength: f32,
    flip_y: bool,
    delay_ms: f32,
    dispose: Option<u8>,
    repeat: i32,
    fast_analysis: bool,
    width: u16,
    height: u16,
    size_set: bool,
    first_frame: bool,
    seq: u64,
}

impl<W: Write> Default for GifEncoder<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> GifEncoder<W> {
    pub fn new() -> Self {
        GifEncoder {
            sink: None,
            palette: None,
            palette_from_write: false,
            algorithm: DitherAlgorithm::Overboard,
            dither_strength: 1.0,
            flip_y: true,
            delay_ms: 16.0,
            dispose: None,
            repeat: 0,
            fast_analysis: true,
            width: 0,
            height: 0,
            size_set: false,
            first_frame: true,
            seq: 0,
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Use a fixed palette for every frame instead of per-frame analysis.
    pub fn set_palette(&mut self, palette: Option<Palette>) {
        self.palette = palette;
        self.palette_from_write = false;
    }

    /// Select the dithering algorithm (default OVERBOARD).
    pub fn set_dither_algorithm(&mut self, algorithm: DitherAlgorithm) {
        self.algorithm = algorithm;
    }

    /// Dither strength, clamped to be non-negative (default 1).
    pub fn set_dither_strength(&mut self, strength: f32) {
        self.dither_strength = strength.max(0.0);
    }

    /// Whether source row 0 is emitted last (default true).
    pub fn set_flip_y(&mut self, flip_y: bool) {
        self.flip_y = flip_y;
    }

    /// Delay between frames in milliseconds (default 16).
    pub fn set_delay_ms(&mut self, delay_ms: f32) {
        self.delay_ms = delay_ms.max(0.0);
    }

    /// Override the GIF disposal code; `None` restores the automatic
    /// choice (restore-to-background iff the palette has a transparent
    /// slot).
    pub fn set_dispose(&mut self, dispose: Option<u8>) {
        self.dispose = dispose;
    }

    /// Loop count: 0 loops forever, negative suppresses the Netscape
    /// extension entirely (default 0).
    pub fn set_repeat(&mut self, repeat: i32) {
        self.repeat = repeat;
    }

    /// Per-frame analysis flavor when no palette is configured:
    /// `analyze_fast` (true, default) or the full `analyze`.
    pub fn set_fast_analysis(&mut self, fast: bool) {
        self.fast_analysis = fast;
    }

    // ------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------

    /// Encode a complete animation at the given frame rate.
    ///
    /// Sets the delay to `1000 / fps` ms. With no palette configured and
    /// `fast_analysis` off, one palette is analyzed from all frames at
    /// once and shared; otherwise each frame analyzes itself.
    pub fn write(&mut self, sink: W, frames: &[Pixmap], fps: f32) -> Result<W, EncodeError> {
        if fps > 0.0 {
            self.delay_ms = 1000.0 / fps;
        }
        if self.palette.is_none() && !self.fast_analysis && frames.len() > 1 {
            let views: Vec<&[u32]> = frames.iter().map(|f| f.pixels()).collect();
            self.palette = Some(Palette::analyze(&views, ANALYZE_THRESHOLD, 256));
            self.palette_from_write = true;
        }

        let result = (|| {
            self.start(sink)?;
            for frame in frames {
                self.add_frame(frame)?;
            }
            self.finish()
        })();

        if self.palette_from_write {
            self.palette = None;
            self.palette_from_write = false;
        }
        result
    }

    /// Open a stream: write the GIF89a signature and transition to
    /// started.
    pub fn start(&mut self, mut sink: W) -> Result<(), EncodeError> {
        if self.sink.is_some() {
            warn!("start called on a started encoder");
            return Err(EncodeError::AlreadyStarted);
        }
        stream::write_header(&mut sink)?;
        self.sink = Some(sink);
        self.first_frame = true;
        self.size_set = false;
        self.seq = 0;
        Ok(())
    }

    /// Append one frame.
    ///
    /// Requires a started encoder. The first frame writes the logical
    /// screen descriptor, global color table, and (for non-negative
    /// repeat counts) the Netscape loop extension; every frame writes its
    /// graphic control extension, image descriptor, and LZW pixel data.
    pub fn add_frame(&mut self, image: &Pixmap) -> Result<(), EncodeError> {
        let mut sink = match self.sink.take() {
            Some(sink) => sink,
            None => {
                warn!("add_frame before start; frame dropped");
                return Err(EncodeError::NotStarted);
            }
        };

        if !self.size_set {
            if image.width() < 1 || image.height() < 1 {
                warn!(
                    width = image.width(),
                    height = image.height(),
                    "degenerate first frame, falling back to 320x240"
                );
                self.width = FALLBACK_SIZE.0;
                self.height = FALLBACK_SIZE.1;
            } else {
                self.width = image.width().min(u16::MAX as usize) as u16;
                self.height = image.height().min(u16::MAX as usize) as u16;
            }
            self.size_set = true;
        }
        let (w, h) = (self.width as usize, self.height as usize);

        let scaled;
        let pixels: &[u32] = if image.width() == w && image.height() == h {
            image.pixels()
        } else {
            debug!(
                from_w = image.width(),
                from_h = image.height(),
                to_w = w,
                to_h = h,
                "rescaling frame"
            );
            scaled = image.rescale(w, h);
            scaled.pixels()
        };

        // Palette selection: the configured palette, or this frame's own.
        let strength = self.dither_strength;
        let mut analyzed;
        let palette: &mut Palette = match self.palette.as_mut() {
            Some(p) => p,
            None => {
                analyzed = if self.fast_analysis {
                    Palette::analyze_fast(&[pixels], ANALYZE_THRESHOLD, 256)
                } else {
                    Palette::analyze(&[pixels], ANALYZE_THRESHOLD, 256)
                };
                &mut analyzed
            }
        };
        palette.set_dither_strength(strength);

        let opts = DitherOptions {
            flip_y: self.flip_y,
            seq: self.seq,
        };
        let frame = palette.reduce(self.algorithm, pixels, w, h, &opts);

        let transparent = palette.has_transparent_slot();
        let disposal = self.dispose.unwrap_or(if transparent { 2 } else { 0 });
        let delay_centis = (self.delay_ms / 10.0).round() as u16;
        let bits = stream::palette_size_bits(palette.color_count());

        let written = (|| {
            if self.first_frame {
                stream::write_logical_screen_descriptor(&mut sink, self.width, self.height, bits)?;
                stream::write_color_table(&mut sink, palette, bits)?;
                if self.repeat >= 0 {
                    stream::write_netscape_loop(&mut sink, self.repeat as u16)?;
                }
            }
            stream::write_graphic_control(
                &mut sink,
                disposal,
                delay_centis,
                transparent.then_some(0),
            )?;
            let local_bits = (!self.first_frame).then_some(bits);
            stream::write_image_descriptor(&mut sink, 0, 0, self.width, self.height, local_bits)?;
            if local_bits.is_some() {
                stream::write_color_table(&mut sink, palette, bits)?;
            }
            lzw::encode(
                &mut sink,
                frame.indices(),
                stream::min_code_size(palette.color_count()),
            )
        })();

        match written {
            Ok(()) => {
                debug!(seq = self.seq, used = frame.used_count(), "frame written");
                self.sink = Some(sink);
                self.first_frame = false;
                self.seq += 1;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "sink write failed, aborting stream");
                Err(EncodeError::Write(e))
            }
        }
    }

    /// Write the trailer, flush, and hand the sink back; the encoder
    /// returns to idle and can be started again.
    pub fn finish(&mut self) -> Result<W, EncodeError> {
        let mut sink = match self.sink.take() {
            Some(sink) => sink,
            None => return Err(EncodeError::NotStarted),
        };
        self.first_frame = true;
        self.size_set = false;
        self.seq = 0;
        stream::write_trailer(&mut sink)?;
        sink.flush()?;
        Ok(sink)
    }

    /// Whether a stream is currently open.
    pub fn is_started(&self) -> bool {
        self.sink.is_some()
    }
}
