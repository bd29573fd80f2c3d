//! Chat command layer
//!
//! `router` turns command text into service calls and reply text;
//! `message` is the boundary towards the messaging transport.

pub mod message;
pub mod router;

pub use message::{IncomingMessage, MessageHandler, ReplyFormat, ReplySink, WriterSink};
pub use router::{CallerContext, Command, CommandRouter, HELP_TEXT};
