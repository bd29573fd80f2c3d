//! Transport boundary
//!
//! The messaging transport hands over an `IncomingMessage` and receives the
//! reply through a `ReplySink`. Senders other than the configured chat are
//! dropped before any command runs.

use std::io::Write;

use log::warn;

use crate::config::settings::Settings;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::Storage;

use super::router::{CallerContext, Command, CommandRouter};

/// An inbound chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub text: String,
    pub chat_id: String,
    pub display_name: Option<String>,
}

impl IncomingMessage {
    pub fn new(
        text: impl Into<String>,
        chat_id: impl Into<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            chat_id: chat_id.into(),
            display_name,
        }
    }

    fn caller(&self) -> CallerContext {
        CallerContext::new(self.chat_id.clone(), self.display_name.clone())
    }
}

/// Formatting hint passed along with a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFormat {
    #[default]
    Plain,
    /// Line-oriented listings that read best in a fixed-width font
    Monospace,
}

/// Outbound side of the transport
pub trait ReplySink {
    fn send_reply(&mut self, chat_id: &str, text: &str, format: ReplyFormat) -> LedgerResult<()>;
}

/// Writes replies to any `io::Write`, one block per reply
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReplySink for WriterSink<W> {
    fn send_reply(&mut self, _chat_id: &str, text: &str, format: ReplyFormat) -> LedgerResult<()> {
        let result = match format {
            ReplyFormat::Plain => writeln!(self.writer, "{}", text),
            ReplyFormat::Monospace => text
                .lines()
                .try_for_each(|line| writeln!(self.writer, "    {}", line)),
        };
        result
            .and_then(|_| self.writer.flush())
            .map_err(|e| LedgerError::Io(format!("Failed to write reply: {}", e)))
    }
}

/// Applies the access gate and routes authorized messages
pub struct MessageHandler<'a> {
    router: CommandRouter<'a>,
    settings: &'a Settings,
}

impl<'a> MessageHandler<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self {
            router: CommandRouter::new(storage).with_currency(settings.currency_symbol.clone()),
            settings,
        }
    }

    /// Handle one message, returning whether a reply was sent
    pub fn handle(&self, message: &IncomingMessage, sink: &mut dyn ReplySink) -> LedgerResult<bool> {
        if !self.settings.is_authorized(&message.chat_id) {
            warn!("Dropping message from unauthorized chat {}", message.chat_id);
            return Ok(false);
        }

        // another process may have written since the last message
        self.router.refresh()?;

        let (command, args) = CommandRouter::route(&message.text);
        let format = Command::from_word(&command)
            .map(|c| c.reply_format())
            .unwrap_or_default();
        let reply = self.router.dispatch(&command, &args, &message.caller());

        sink.send_reply(&message.chat_id, &reply, format)?;
        Ok(true)
    }
}
