//! Pixel decode module
//!
//! Off-thread scanning of read-back probe buffers.

mod pixel_decoder;

pub use pixel_decoder::{
    decode_pixels, PixelDecoder,
    PassKind, DecodeTicket, DecodeRequest, DecodeResult,
};
