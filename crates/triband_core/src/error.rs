//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the engine
///
/// Everything except `DspError` is a configuration error: the host called
/// `process` in a state or with a buffer shape the engine wasn't prepared for.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Engine not prepared - call prepare() before process()")]
    NotPrepared,

    #[error("Channel count mismatch: prepared for {expected}, got {got}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("Channel buffers differ in length: expected {expected} samples, got {got}")]
    RaggedChannels { expected: usize, got: usize },

    #[error("Block of {got} frames exceeds prepared maximum of {max}")]
    BlockTooLarge { max: usize, got: usize },

    #[error("Interleaved buffer length {len} is not a multiple of {channels} channels")]
    InterleavedLength { len: usize, channels: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("DSP error: {0}")]
    DspError(#[from] triband_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::NotPrepared;
        assert!(err.to_string().contains("prepare()"));

        let err = EngineError::BlockTooLarge { max: 512, got: 1024 };
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn test_error_from_dsp() {
        let dsp_err = triband_dsp::DspError::UnsupportedChannelCount(6);
        let engine_err: EngineError = dsp_err.into();
        assert!(matches!(engine_err, EngineError::DspError(_)));
    }
}
