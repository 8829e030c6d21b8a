//! Failure taxonomy for body construction and per-frame updates

use thiserror::Error;

/// Everything that can go wrong with a single body.
///
/// None of these ever stops the scene: the owning body degrades or is skipped
/// and the rest keeps animating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BodyError {
    /// A catalog entry cannot be built; the body is left out of the scene.
    #[error("configuration error in `{body}`: {reason}")]
    Configuration { body: String, reason: String },

    /// NaN or infinity showed up in kinematic state or geometry.
    #[error("numeric corruption in `{body}`: {what}")]
    NumericCorruption { body: String, what: String },

    /// A texture or other asset failed to fetch or decode.
    #[error("resource `{id}` failed to load: {reason}")]
    ResourceLoad { id: String, reason: String },

    /// A body's update failed for this frame.
    #[error("frame update failed for `{body}`: {reason}")]
    FrameTick { body: String, reason: String },
}

impl BodyError {
    /// Name of the body the error belongs to, when it belongs to one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Configuration { body, .. }
            | Self::NumericCorruption { body, .. }
            | Self::FrameTick { body, .. } => Some(body),
            Self::ResourceLoad { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_body() {
        let err = BodyError::Configuration {
            body: "Vulcan".into(),
            reason: "radius_km must be positive".into(),
        };
        let text = err.to_string();
        assert!(text.contains("Vulcan"));
        assert!(text.contains("radius_km"));
        assert_eq!(err.body(), Some("Vulcan"));
    }

    #[test]
    fn test_resource_errors_have_no_body() {
        let err = BodyError::ResourceLoad {
            id: "textures/missing.png".into(),
            reason: "not found".into(),
        };
        assert_eq!(err.body(), None);
        assert!(err.to_string().contains("textures/missing.png"));
    }
}
