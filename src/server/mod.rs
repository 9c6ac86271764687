//! Server Layer
//!
//! Sessions, the platform facade and the market scheduler.
//! This layer is **non-deterministic**: wall-clock time and OS entropy enter
//! here and nowhere below.

pub mod platform;
pub mod protocol;
pub mod scheduler;
pub mod session;

pub use platform::{Platform, PlatformError};
pub use protocol::{
    handle, handle_admin, handle_admin_json, handle_json, AdminRequest, ErrorCode, ErrorResponse, Request, Response,
};
pub use scheduler::Scheduler;
pub use session::{BetReceipt, Session, SessionManager, TransferError, UserId};
