//! Exit codes.

/// Exit codes for the itemdedup binary.
///
/// - 0: Success (every input processed without failure)
/// - 1: Argument or configuration error, log file not writable
/// - 2: Input files not found, or nothing to process
/// - 3: Partial success (batch finished with at least one failed input)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success: every input was processed.
    Success = 0,
    /// Arguments, configuration or log file could not be used.
    ArgumentError = 1,
    /// Named inputs do not exist, or there was nothing to do.
    FilesNotExist = 2,
    /// Batch completed but some inputs failed.
    PartialSuccess = 3,
    /// Interrupted: the batch was stopped by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Heading printed in front of a fatal error message.
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::Success => "",
            Self::ArgumentError => "ERROR: arguments error",
            Self::FilesNotExist => "ERROR: Files not exist",
            Self::PartialSuccess => "ERROR: some files failed",
            Self::Interrupted => "ERROR: interrupted",
        }
    }

    /// Exit code for a fatal error returned by [`crate::run_app`].
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<crate::inputs::InputError>() {
            Some(input) if input.is_missing_input() => Self::FilesNotExist,
            _ => match err.downcast_ref::<crate::batch::BatchError>() {
                Some(crate::batch::BatchError::NoInput) => Self::FilesNotExist,
                _ => Self::ArgumentError,
            },
        }
    }

    /// Exit code for a command-line parse failure.
    ///
    /// `--help` and `--version` are not failures; every other clap error is
    /// an argument error.
    #[must_use]
    pub fn for_clap_error(err: &clap::Error) -> Self {
        use clap::error::ErrorKind;
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Self::Success,
            _ => Self::ArgumentError,
        }
    }
}
