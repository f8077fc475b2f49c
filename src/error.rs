//! Central error handling for the geoar core
//!
//! Provides a unified GeoArError enum with consistent categorization
//! across the tracking and filtering subsystems.

/// Centralized error type for all core operations
#[derive(thiserror::Error, Debug)]
pub enum GeoArError {
    #[error("Device error: {0}")]
    Device(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tracking error: {0}")]
    Tracking(String),
}

impl GeoArError {
    /// Convenience constructors for common error types
    pub fn device<T: ToString>(msg: T) -> Self {
        GeoArError::Device(msg.to_string())
    }

    pub fn upload<T: ToString>(msg: T) -> Self {
        GeoArError::Upload(msg.to_string())
    }

    pub fn render<T: ToString>(msg: T) -> Self {
        GeoArError::Render(msg.to_string())
    }

    pub fn validation<T: ToString>(msg: T) -> Self {
        GeoArError::Validation(msg.to_string())
    }

    pub fn tracking<T: ToString>(msg: T) -> Self {
        GeoArError::Tracking(msg.to_string())
    }
}

/// Result type alias for core operations
pub type GeoArResult<T> = Result<T, GeoArError>;
