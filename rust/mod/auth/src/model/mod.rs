mod child;
mod otp;
mod session;
mod user;

pub use child::*;
pub use otp::*;
pub use session::*;
pub use user::*;
