/// Pixel decoder
///
/// Turns read-back RGBA buffers into the set of color
/// codes they contain, on a dedicated worker thread.
///
/// The render loop moves each buffer into a `DecodeRequest`; the worker
/// moves it back inside the matching `DecodeResult` so the caller can
/// reuse the allocation. Requests are processed one at a time over a
/// single channel, so results come back in submission order.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use rustc_hash::FxHashSet;
use crate::color::ColorCode;
use crate::error::{Error, Result};
use crate::{engine_debug, engine_fail, engine_trace, engine_warn};

const SOURCE: &str = "galaxy3d::PixelDecoder";

/// Which half of a visibility cycle a buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Opaque instances only
    Opaque,
    /// Opaque + transparent instances
    Transparent,
}

/// Tags a submission so its result can be matched to the cycle that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeTicket {
    /// Scene-build generation (bumped on every reload)
    pub generation: u64,
    /// Cycle number within the generation
    pub cycle: u64,
    pub pass: PassKind,
}

/// A buffer handed to the worker.
#[derive(Debug)]
pub struct DecodeRequest {
    pub ticket: DecodeTicket,
    /// Tightly packed RGBA8, row-major
    pub pixels: Vec<u8>,
}

/// The worker's answer to one `DecodeRequest`.
#[derive(Debug)]
pub struct DecodeResult {
    pub ticket: DecodeTicket,
    /// Distinct codes, in order of first appearance in the buffer
    pub colors: Vec<ColorCode>,
    /// The submitted buffer, returned for reuse
    pub pixels: Vec<u8>,
}

/// Collect the distinct (r, g, b) triples of an RGBA8 buffer.
///
/// Alpha is ignored. A trailing partial pixel is ignored. Codes are
/// returned in order of first appearance; the background code is kept
/// and left for the resolver to discard.
pub fn decode_pixels(pixels: &[u8]) -> Vec<ColorCode> {
    let mut seen = FxHashSet::default();
    let mut colors = Vec::new();
    for pixel in pixels.chunks_exact(4) {
        let code = ColorCode::new(pixel[0], pixel[1], pixel[2]);
        if seen.insert(code) {
            colors.push(code);
        }
    }
    colors
}

/// Handle to the decoder worker thread.
///
/// Dropping the handle closes the request channel and joins the worker.
pub struct PixelDecoder {
    request_tx: Option<Sender<DecodeRequest>>,
    result_rx: Receiver<DecodeResult>,
    worker: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl PixelDecoder {
    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if the OS refuses to spawn the thread.
    pub fn new() -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<DecodeRequest>();
        let (result_tx, result_rx) = mpsc::channel::<DecodeResult>();

        let worker = thread::Builder::new()
            .name("galaxy3d-pixel-decoder".to_string())
            .spawn(move || Self::run(request_rx, result_tx))
            .map_err(|e| engine_fail!(SOURCE,
                Error::InitializationFailed(format!("Failed to spawn decoder thread: {}", e))))?;

        engine_debug!(SOURCE, "Decoder worker started");

        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            worker: Some(worker),
            in_flight: 0,
        })
    }

    fn run(requests: Receiver<DecodeRequest>, results: Sender<DecodeResult>) {
        while let Ok(DecodeRequest { ticket, pixels }) = requests.recv() {
            if pixels.len() % 4 != 0 {
                engine_warn!(SOURCE, "Buffer of {} bytes is not RGBA8 aligned, ignoring trailing bytes",
                    pixels.len());
            }
            let colors = decode_pixels(&pixels);
            engine_trace!(SOURCE, "Decoded {:?} pass of cycle {}: {} distinct colors",
                ticket.pass, ticket.cycle, colors.len());
            if results.send(DecodeResult { ticket, colors, pixels }).is_err() {
                break;
            }
        }
    }

    /// Queue a buffer for decoding. Returns immediately.
    ///
    /// # Errors
    ///
    /// `WorkerDisconnected` if the worker has exited.
    pub fn submit(&mut self, request: DecodeRequest) -> Result<()> {
        let sender = self.request_tx.as_ref().ok_or(Error::WorkerDisconnected)?;
        sender
            .send(request)
            .map_err(|_| engine_fail!(SOURCE, Error::WorkerDisconnected))?;
        self.in_flight += 1;
        Ok(())
    }

    /// Take the next finished result if there is one.
    pub fn try_recv(&mut self) -> Result<Option<DecodeResult>> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Ok(Some(result))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(engine_fail!(SOURCE, Error::WorkerDisconnected)),
        }
    }

    /// Wait up to `timeout` for the next result.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<DecodeResult>> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Ok(Some(result))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(engine_fail!(SOURCE, Error::WorkerDisconnected)),
        }
    }

    /// Number of submitted requests whose result has not been received yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for PixelDecoder {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.request_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
#[path = "pixel_decoder_tests.rs"]
mod tests;
