//! Error types for field construction and configuration.
//!
//! Only construction can fail. Once a field exists, ticking and rendering
//! never return errors.

use thiserror::Error;

/// Errors raised while validating catalogs, configs and surfaces.
#[derive(Error, Debug)]
pub enum StarfieldError {
    /// A constellation without stars can never be completed
    #[error("constellation `{name}` has no stars")]
    EmptyConstellation { name: String },

    #[error("constellation `{name}` edge ({a}, {b}) references a star outside 0..{len}")]
    EdgeOutOfRange {
        name: String,
        a: usize,
        b: usize,
        len: usize,
    },

    #[error("constellation `{name}` has a self-loop edge on star {index}")]
    SelfLoop { name: String, index: usize },

    /// Star coordinates are surface fractions and must lie in [0, 1]
    #[error("constellation `{name}` star {index} at ({x}, {y}) lies outside the unit square")]
    StarOutOfBounds {
        name: String,
        index: usize,
        x: f32,
        y: f32,
    },

    #[error("duplicate constellation name `{0}`")]
    DuplicateName(String),

    #[error("surface {width}x{height} is not drawable")]
    InvalidSurface { width: f32, height: f32 },

    /// Tuning values outside their valid range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Adapter, device or surface setup failed
    #[error("GPU setup failed: {0}")]
    Gpu(String),
}

/// Result type alias for starfield construction.
pub type Result<T> = std::result::Result<T, StarfieldError>;

impl StarfieldError {
    /// Creates a new config error.
    #[must_use]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_constellation() {
        let err = StarfieldError::EdgeOutOfRange {
            name: "Lyra".to_string(),
            a: 0,
            b: 7,
            len: 5,
        };
        assert_eq!(
            err.to_string(),
            "constellation `Lyra` edge (0, 7) references a star outside 0..5"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: StarfieldError = parse.unwrap_err().into();
        assert!(matches!(err, StarfieldError::Json(_)));
    }
}
