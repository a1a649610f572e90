mod endpoint;
mod identity;
mod outcome;
mod request;
mod wire;

pub use endpoint::*;
pub use identity::*;
pub use outcome::*;
pub use request::*;
pub use wire::*;
