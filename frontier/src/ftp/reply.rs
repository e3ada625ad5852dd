//! # Reply
//!
//! Classification of the outcome of FTP commands.
//! This is the only place where the FTP reply codes the client cares about are interpreted.

use suppaftp::types::Response;
use suppaftp::{FtpError, Status};

/// What an error returned by a FTP command means for the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The server reported that the path doesn't exist (`550`)
    NotFound,
    /// The control or data connection is broken; the session can't be used anymore
    SessionLost,
    /// Any other refusal or malformed reply
    Unexpected,
}

/// Classify an error returned by a FTP command
pub fn classify(err: &FtpError) -> Outcome {
    if is_not_found(err) {
        Outcome::NotFound
    } else if is_session_lost(err) {
        Outcome::SessionLost
    } else {
        Outcome::Unexpected
    }
}

/// Whether the server refused the command because the path doesn't exist
pub fn is_not_found(err: &FtpError) -> bool {
    matches!(
        err,
        FtpError::UnexpectedResponse(Response {
            status: Status::FileUnavailable,
            ..
        })
    )
}

/// Whether the error comes from the transport rather than from a reply of the server
pub fn is_session_lost(err: &FtpError) -> bool {
    matches!(err, FtpError::ConnectionError(_))
}

/// Whether `status` is a positive completion reply (`2xx`)
pub fn is_positive_completion(status: Status) -> bool {
    (200..300).contains(&status.code())
}

/// The reply text to report to the user; the whole error when it's not a reply
pub fn reply_text(err: &FtpError) -> String {
    match err {
        FtpError::UnexpectedResponse(response) => response.to_string(),
        err => err.to_string(),
    }
}
