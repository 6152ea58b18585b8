pub mod clock;
pub mod notify;
pub mod wait;

pub use clock::*;
pub use notify::*;
pub use wait::*;
