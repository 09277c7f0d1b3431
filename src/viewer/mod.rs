//! Bridge between the viewer core and an external deep-zoom viewer.
//!
//! The viewer is driven through an explicit event/command interface:
//! [`ViewerEvent`]s come in, [`ViewerCommand`]s go out, and the application
//! receives [`Notification`]s.

mod events;
mod loader;
mod session;


pub use events::{Notification, RequestId, ViewerCommand, ViewerEvent};
pub use loader::{ImageSourceBarrier, LoadOutcome, Settlement};
pub use session::ViewerSession;
