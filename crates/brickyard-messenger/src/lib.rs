//! # Brickyard Messenger
//!
//! Runs bricks in another browsing context and returns their result.
//!
//! - [`Messenger`] - transport that delivers one message to one context
//! - [`FrameDirectory`] - lists the frames currently attached to a tab
//! - [`Dispatcher`] - typed RPC client with timeouts, cancellation and fan-out
//! - [`LocalMessenger`] - in-process transport routing to [`MessageHandler`]s

mod dispatcher;
mod error;
mod local;
mod message;
mod target;

pub use dispatcher::{DispatchOptions, Dispatcher, DEFAULT_DISPATCH_TIMEOUT};
pub use error::{DispatchError, MessengerError};
pub use local::{LocalMessenger, MessageHandler};
pub use message::{DispatchRequest, Message, RemoteRunOptions, RUN_BRICK};
pub use target::{FrameDirectory, FrameTarget, MessageTarget, Messenger};
