use thiserror::Error;

/// Reasons the admission pipeline refuses a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDenied {
    /// Missing or invalid credential under the strict policy
    #[error("Unauthorized")]
    Unauthorized,

    /// The batch carried no files
    #[error("No files uploaded")]
    NoFiles,

    /// The batch carried more files than allowed
    #[error("Maximum {max} files allowed")]
    TooManyFiles {
        /// Files allowed per batch
        max: usize,
    },

    /// A single file exceeded the size limit
    #[error("File {name} exceeds 5MB limit")]
    FileTooLarge {
        /// Display name of the first offending file
        name: String,
    },

    /// The client has no quota left for this batch
    #[error("Rate limit exceeded. Max {allowed} files per IP. You tried to upload {attempted}.")]
    QuotaExceeded {
        /// Files in the refused batch
        attempted: usize,
        /// Ceiling per client
        allowed: u32,
    },

    /// A delete request without a URL
    #[error("Missing publicUrl")]
    MissingPublicUrl,
}
