//! `gestevent-tickets` — ticket artifact generation.
//!
//! A ticket is a QR code binding an event and a participant. The payload is
//! the scannable contract with the check-in tooling: `"{event_id}.{participant_id}"`.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;

use gestevent_core::{EventId, ParticipantId};

/// Pixels per QR module in the rendered image.
const MODULE_PIXELS: u32 = 6;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("qr encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("png rendering failed: {0}")]
    Render(#[from] image::ImageError),
}

/// Verification payload embedded in the QR image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketPayload {
    pub event_id: EventId,
    pub participant_id: ParticipantId,
}

impl TicketPayload {
    pub fn new(event_id: EventId, participant_id: ParticipantId) -> Self {
        Self {
            event_id,
            participant_id,
        }
    }

    /// The exact string scanned at check-in.
    pub fn encode(&self) -> String {
        format!("{}.{}", self.event_id, self.participant_id)
    }
}

/// Blob-store object path for a ticket, derived from the two identifiers so
/// re-issuing a ticket overwrites the previous image.
pub fn object_path(event_id: EventId, participant_id: ParticipantId) -> String {
    format!("tickets/{event_id}/{participant_id}.png")
}

/// Rasterize `contents` as a QR code and encode it as a PNG.
pub fn render_png(contents: &str) -> Result<Vec<u8>, TicketError> {
    let code = QrCode::new(contents.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .build();

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_binds_event_and_participant() {
        let event_id = EventId::new();
        let participant_id = ParticipantId::new();
        let encoded = TicketPayload::new(event_id, participant_id).encode();
        assert_eq!(encoded, format!("{event_id}.{participant_id}"));
    }

    #[test]
    fn object_path_is_scoped_by_event() {
        let event_id = EventId::new();
        let participant_id = ParticipantId::new();
        assert_eq!(
            object_path(event_id, participant_id),
            format!("tickets/{event_id}/{participant_id}.png")
        );
    }

    #[test]
    fn render_produces_a_png() {
        let png = render_png("0198c5a0.0198c5a1").expect("render should succeed");
        // PNG signature.
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
        assert!(png.len() > 100);
    }

    #[test]
    fn render_roundtrips_real_payload() {
        let payload = TicketPayload::new(EventId::new(), ParticipantId::new());
        let png = render_png(&payload.encode()).expect("render should succeed");
        let decoded = image::load_from_memory(&png).expect("png should decode");
        // Every module is 6px; the image must be a multiple of that.
        assert_eq!(decoded.width() % MODULE_PIXELS, 0);
        assert_eq!(decoded.width(), decoded.height());
    }
}
