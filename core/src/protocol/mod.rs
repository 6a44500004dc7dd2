mod message;
mod reader;

pub use message::{decode_line, DiscardReason, ProtocolMessage, ScoredAnswer};
pub use reader::{OutputSink, ProtocolReader, RawCollector};
