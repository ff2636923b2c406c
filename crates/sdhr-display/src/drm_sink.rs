//! DRM/KMS dumb-buffer scan-out backend.
//!
//! Unlike a GPU-accelerated compositor, SDHR's compositor writes ARGB8888
//! bytes with the CPU, so there is no Vulkan/GBM import step: a "dumb
//! buffer" mapped directly into process memory is the whole story. This
//! drives one connector's preferred mode with two dumb buffers and flips
//! between them with the legacy (non-atomic) page-flip ioctl, which is
//! sufficient for a single fixed plane.

use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsFd, BorrowedFd};

use drm::buffer::DrmFourcc;
use drm::control::{connector, crtc, dumbbuffer::DumbBuffer, framebuffer, Device as ControlDevice};
use drm::Device as BasicDevice;

use crate::error::DisplayError;
use crate::sink::FrameSink;

struct Card(File);

impl AsFd for Card {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl BasicDevice for Card {}
impl ControlDevice for Card {}

/// A DRM-managed scan-out target: two dumb buffers on one CRTC, flipped on
/// vertical blank.
///
/// The compositor writes into `back_buffer`, a plain CPU-side `Vec<u8>`,
/// rather than directly into a mapped dumb buffer: a `DumbMapping`'s
/// lifetime is tied to the `&mut DumbBuffer` borrow that produced it, which
/// cannot be stored alongside the buffer it borrows from and also cannot
/// outlive a single call. `present` copies `back_buffer` into the real dumb
/// buffer's mapping just before flipping.
pub struct DrmFrameSink {
    card: Card,
    crtc: crtc::Handle,
    buffers: [DumbBuffer; 2],
    framebuffers: [framebuffer::Handle; 2],
    front: usize,
    width: u32,
    height: u32,
    stride: u32,
    back_buffer: Vec<u8>,
    flip_pending: bool,
}

impl DrmFrameSink {
    /// Open `path` (typically `/dev/dri/card0`), pick the first connected
    /// connector and its preferred mode, and allocate the two scan-out
    /// buffers at that mode's resolution.
    pub fn open(path: &str) -> Result<Self, DisplayError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| DisplayError::Open {
                path: path.to_string(),
                source,
            })?;
        let card = Card(file);

        let res = card.resource_handles()?;
        let conn = res
            .connectors()
            .iter()
            .filter_map(|&handle| card.get_connector(handle, false).ok())
            .find(|info| info.state() == connector::State::Connected)
            .ok_or(DisplayError::NoConnector)?;

        let mode = conn
            .modes()
            .iter()
            .find(|m| m.mode_type().contains(drm::control::ModeTypeFlags::PREFERRED))
            .or_else(|| conn.modes().first())
            .copied()
            .ok_or(DisplayError::NoMode)?;

        let crtc_handle = conn
            .current_encoder()
            .and_then(|enc| card.get_encoder(enc).ok())
            .and_then(|enc| enc.crtc())
            .or_else(|| res.crtcs().first().copied())
            .ok_or(DisplayError::NoCrtc)?;

        let (w, h) = mode.size();
        let buffers = [
            card.create_dumb_buffer((w as u32, h as u32), DrmFourcc::Xrgb8888, 32)?,
            card.create_dumb_buffer((w as u32, h as u32), DrmFourcc::Xrgb8888, 32)?,
        ];
        let framebuffers = [
            card.add_framebuffer(&buffers[0], 24, 32)?,
            card.add_framebuffer(&buffers[1], 24, 32)?,
        ];

        card.set_crtc(crtc_handle, Some(framebuffers[0]), (0, 0), &[conn.handle()], Some(mode))?;

        let stride = buffers[0].pitch();
        let back_buffer = vec![0u8; stride as usize * h as usize];

        Ok(DrmFrameSink {
            card,
            crtc: crtc_handle,
            buffers,
            framebuffers,
            front: 0,
            width: w as u32,
            height: h as u32,
            stride,
            back_buffer,
            flip_pending: false,
        })
    }

    fn back(&self) -> usize {
        1 - self.front
    }
}

impl FrameSink for DrmFrameSink {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn stride(&self) -> u32 {
        self.stride
    }

    fn map_mut(&mut self) -> &mut [u8] {
        &mut self.back_buffer
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        if self.flip_pending {
            // Block until the previous flip's vblank event arrives before
            // scheduling another one, mirroring the reference source's
            // select()-then-drmHandleEvent() loop.
            let mut events = self.card.receive_events().map_err(DisplayError::EventWait)?;
            for event in &mut events {
                if let drm::control::Event::PageFlip(_) = event {
                    self.flip_pending = false;
                }
            }
        }

        let back = self.back();
        {
            let mut mapping = self
                .card
                .map_dumb_buffer(&mut self.buffers[back])
                .map_err(DisplayError::MapBuffer)?;
            mapping.as_mut().copy_from_slice(&self.back_buffer);
        }

        self.card
            .page_flip(self.crtc, self.framebuffers[back], drm::control::PageFlipFlags::EVENT, None)?;
        self.flip_pending = true;
        self.front = back;
        Ok(())
    }
}
