pub mod api;
pub mod device;
pub mod scenario;

pub use api::*;
pub use device::*;
pub use scenario::*;
