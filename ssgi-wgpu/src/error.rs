//! Error taxonomy for the renderer.
//!
//! Init-time failures (`Init`, `TargetCreation`) never enter the frame loop.
//! Bind, hazard and draw failures abort the current frame. `SurfaceLost` is
//! the recoverable reset path.

/// Centralized error type for all renderer operations
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Target creation error: {0}")]
    TargetCreation(String),

    #[error("Bind error at slot {slot}: {reason}")]
    Bind { slot: usize, reason: String },

    #[error("Read/write hazard: {0}")]
    Hazard(String),

    #[error("Invalid draw: {0}")]
    InvalidDraw(String),

    #[error("Presentable surface lost")]
    SurfaceLost,

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl RenderError {
    pub fn init<T: ToString>(msg: T) -> Self {
        RenderError::Init(msg.to_string())
    }

    pub fn target_creation<T: ToString>(msg: T) -> Self {
        RenderError::TargetCreation(msg.to_string())
    }

    pub fn bind<T: ToString>(slot: usize, reason: T) -> Self {
        RenderError::Bind {
            slot,
            reason: reason.to_string(),
        }
    }

    pub fn hazard<T: ToString>(msg: T) -> Self {
        RenderError::Hazard(msg.to_string())
    }

    pub fn invalid_draw<T: ToString>(msg: T) -> Self {
        RenderError::InvalidDraw(msg.to_string())
    }

    pub fn surface<T: ToString>(msg: T) -> Self {
        RenderError::Surface(msg.to_string())
    }

    /// True for failures that must stop the program before the first frame.
    pub fn is_fatal_at_init(&self) -> bool {
        matches!(self, RenderError::Init(_) | RenderError::TargetCreation(_))
    }

    /// True when the caller should reset device resources and skip the frame.
    pub fn is_surface_lost(&self) -> bool {
        matches!(self, RenderError::SurfaceLost)
    }
}

/// Result type alias for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_message_names_slot() {
        let err = RenderError::bind(3, "slot out of range");
        assert_eq!(err.to_string(), "Bind error at slot 3: slot out of range");
    }

    #[test]
    fn test_error_classification() {
        assert!(RenderError::init("no adapter").is_fatal_at_init());
        assert!(RenderError::target_creation("oom").is_fatal_at_init());
        assert!(!RenderError::hazard("read while bound").is_fatal_at_init());
        assert!(RenderError::SurfaceLost.is_surface_lost());
        assert!(!RenderError::surface("timeout").is_surface_lost());
    }
}
