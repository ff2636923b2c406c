/// Errors raised by a [`crate::FrameSink`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to open DRM device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no connected connector found on this DRM device")]
    NoConnector,

    #[error("connected connector has no usable mode")]
    NoMode,

    #[error("no CRTC available for the selected connector")]
    NoCrtc,

    #[error("DRM ioctl failed: {0}")]
    Drm(#[from] drm::SystemError),

    #[error("page flip event wait failed: {0}")]
    EventWait(std::io::Error),

    #[error("failed to map dumb buffer: {0}")]
    MapBuffer(std::io::Error),
}
