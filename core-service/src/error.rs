use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

impl From<core_runtime::Error> for CoreError {
    fn from(err: core_runtime::Error) -> Self {
        match err {
            core_runtime::Error::CapabilityMissing {
                capability,
                message,
            } => CoreError::CapabilityMissing {
                capability,
                message,
            },
            other => CoreError::InitializationFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capability_keeps_its_name() {
        let err: CoreError = core_runtime::Error::CapabilityMissing {
            capability: "NativeAudioPlayer".to_string(),
            message: "provide one".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            CoreError::CapabilityMissing { ref capability, .. } if capability == "NativeAudioPlayer"
        ));
    }

    #[test]
    fn test_other_runtime_errors_fail_initialization() {
        let err: CoreError = core_runtime::Error::Config("buffer".to_string()).into();
        assert!(matches!(err, CoreError::InitializationFailed(_)));
    }
}
