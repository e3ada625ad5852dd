//! # Status
//!
//! Classification of the errors reported by libssh2

use std::io;

use ssh2::ErrorCode;

/// `SSH_FX_NO_SUCH_FILE`
pub const SSH_FX_NO_SUCH_FILE: i32 = 2;
/// `SSH_FX_PERMISSION_DENIED`
pub const SSH_FX_PERMISSION_DENIED: i32 = 3;
/// `SSH_FX_FAILURE`
pub const SSH_FX_FAILURE: i32 = 4;

// libssh2 session errors raised by a broken transport
const LIBSSH2_ERROR_SOCKET_SEND: i32 = -7;
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;
const LIBSSH2_ERROR_SOCKET_DISCONNECT: i32 = -13;
const LIBSSH2_ERROR_CHANNEL_CLOSED: i32 = -26;
const LIBSSH2_ERROR_SOCKET_TIMEOUT: i32 = -30;
const LIBSSH2_ERROR_SOCKET_RECV: i32 = -43;
const LIBSSH2_ERROR_BAD_SOCKET: i32 = -45;

/// Whether the server reported that the path doesn't exist
pub fn is_no_such_file(err: &ssh2::Error) -> bool {
    matches!(err.code(), ErrorCode::SFTP(SSH_FX_NO_SUCH_FILE))
}

/// Whether the transport is broken; the session can't be used anymore
pub fn is_session_lost(err: &ssh2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::Session(
            LIBSSH2_ERROR_SOCKET_SEND
                | LIBSSH2_ERROR_TIMEOUT
                | LIBSSH2_ERROR_SOCKET_DISCONNECT
                | LIBSSH2_ERROR_CHANNEL_CLOSED
                | LIBSSH2_ERROR_SOCKET_TIMEOUT
                | LIBSSH2_ERROR_SOCKET_RECV
                | LIBSSH2_ERROR_BAD_SOCKET
        )
    )
}

/// Whether an I/O error raised by a remote file comes from a broken transport.
/// libssh2 errors are carried inside the `io::Error` by `ssh2`.
pub fn is_io_session_lost(err: &io::Error) -> bool {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<ssh2::Error>())
        .is_some_and(is_session_lost)
}

/// The error a closed session reports
pub(crate) fn disconnected() -> ssh2::Error {
    ssh2::Error::new(
        ErrorCode::Session(LIBSSH2_ERROR_SOCKET_DISCONNECT),
        "the session is closed",
    )
}
