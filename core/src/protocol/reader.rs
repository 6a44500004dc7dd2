use bytes::BytesMut;

use super::message::{decode_line, ProtocolMessage, ScoredAnswer};

/// Receives stdout chunks from a running answer process, in arrival order.
pub trait OutputSink: Send {
    fn on_stdout(&mut self, chunk: &[u8]);
}

/// Line-buffered reader for the single-answer protocol.
///
/// Chunks are buffered as raw bytes and split on `\n`, so a line (or a
/// multi-byte character) split across reads is reassembled before it is
/// decoded. A trailing partial line stays buffered; it is never classified,
/// and is what [`ProtocolReader::finish`] hands back when a field is missing.
#[derive(Debug, Default)]
pub struct ProtocolReader {
    buf: BytesMut,
    scanned: usize,
    final_answer: Option<String>,
    reward_score: Option<f64>,
    discarded: u64,
}

impl ProtocolReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);

        // Only the newly appended bytes can hold a newline we have not seen.
        while let Some(rel) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + rel;
            let line = self.buf.split_to(end + 1);
            self.scanned = 0;
            let text = String::from_utf8_lossy(&line[..end]);
            self.observe_line(&text);
        }
        self.scanned = self.buf.len();
    }

    fn observe_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match decode_line(line) {
            ProtocolMessage::FinalAnswer(answer) => {
                tracing::debug!(len = answer.len(), "final_answer received");
                self.final_answer = Some(answer);
            }
            ProtocolMessage::RewardScore(score) => {
                tracing::debug!(score, "reward_score received");
                self.reward_score = Some(score);
            }
            ProtocolMessage::Unrecognized(reason) => {
                self.discarded += 1;
                tracing::info!(?reason, line = %line, "answer process stdout (diagnostic)");
            }
        }
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub fn reward_score(&self) -> Option<f64> {
        self.reward_score
    }

    /// Number of non-empty lines that were logged and dropped.
    pub fn discarded_lines(&self) -> u64 {
        self.discarded
    }

    /// Bytes received after the last newline, decoded lossily.
    pub fn pending(&self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }

    /// Both fields, or the unconsumed buffer if either never arrived.
    pub fn finish(self) -> Result<ScoredAnswer, String> {
        match (self.final_answer, self.reward_score) {
            (Some(answer), Some(reward_score)) => Ok(ScoredAnswer {
                answer,
                reward_score,
            }),
            _ => Err(String::from_utf8_lossy(&self.buf).into_owned()),
        }
    }
}

impl OutputSink for ProtocolReader {
    fn on_stdout(&mut self, chunk: &[u8]) {
        self.feed(chunk);
    }
}

/// Keeps stdout verbatim; used when the whole output is one JSON document.
#[derive(Debug, Default)]
pub struct RawCollector {
    buf: BytesMut,
}

impl RawCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_string(self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

impl OutputSink for RawCollector {
    fn on_stdout(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_both_fields_in_order() {
        let mut r = ProtocolReader::new();
        r.feed(b"{\"type\":\"final_answer\",\"answer\":\"X\"}\n");
        r.feed(b"{\"type\":\"reward_score\",\"score\":0.87}\n");

        assert_eq!(
            r.finish(),
            Ok(ScoredAnswer {
                answer: "X".into(),
                reward_score: 0.87
            })
        );
    }

    #[test]
    fn reassembles_line_split_across_chunks() {
        let mut r = ProtocolReader::new();
        r.feed(b"{\"typ");
        assert_eq!(r.final_answer(), None);
        assert_eq!(r.pending(), "{\"typ");

        r.feed(b"e\":\"final_answer\",\"answer\":\"X\"}\n");
        assert_eq!(r.final_answer(), Some("X"));
        assert_eq!(r.pending(), "");
    }

    #[test]
    fn multiple_lines_in_one_chunk() {
        let mut r = ProtocolReader::new();
        r.feed(b"loading model...\n{\"type\":\"final_answer\",\"answer\":\"A\"}\nretrieved 3 docs\n{\"type\":\"reward_score\",\"score\":0.5}\n");
        assert_eq!(r.final_answer(), Some("A"));
        assert_eq!(r.reward_score(), Some(0.5));
        assert_eq!(r.discarded_lines(), 2);
    }

    #[test]
    fn later_messages_overwrite_earlier_ones() {
        let mut r = ProtocolReader::new();
        r.feed(b"{\"type\":\"final_answer\",\"answer\":\"draft\"}\n");
        r.feed(b"{\"type\":\"final_answer\",\"answer\":\"final\"}\n");
        r.feed(b"{\"type\":\"reward_score\",\"score\":0.1}\n{\"type\":\"reward_score\",\"score\":0.9}\n");
        assert_eq!(r.final_answer(), Some("final"));
        assert_eq!(r.reward_score(), Some(0.9));
    }

    #[test]
    fn blank_lines_are_not_counted() {
        let mut r = ProtocolReader::new();
        r.feed(b"\n   \n\r\n");
        assert_eq!(r.discarded_lines(), 0);
    }

    #[test]
    fn malformed_json_does_not_stop_the_stream() {
        let mut r = ProtocolReader::new();
        r.feed(b"{\"type\":\"final_answer\",\"answer\":}\n");
        r.feed(b"{\"type\":\"final_answer\",\"answer\":\"ok\"}\n");
        assert_eq!(r.final_answer(), Some("ok"));
        assert_eq!(r.discarded_lines(), 1);
    }

    #[test]
    fn trailing_partial_line_is_returned_on_missing_field() {
        let mut r = ProtocolReader::new();
        r.feed(b"{\"type\":\"final_answer\",\"answer\":\"X\"}\n");
        r.feed(b"{\"type\":\"reward_score\",\"score\":0.87}");

        // No newline after the score: it is never classified.
        assert_eq!(r.reward_score(), None);
        assert_eq!(
            r.finish(),
            Err("{\"type\":\"reward_score\",\"score\":0.87}".to_string())
        );
    }

    #[test]
    fn only_final_answer_is_a_failure() {
        let mut r = ProtocolReader::new();
        r.feed(b"{\"type\":\"final_answer\",\"answer\":\"X\"}\n");
        assert_eq!(r.finish(), Err(String::new()));
    }

    #[test]
    fn utf8_split_across_chunks_survives() {
        let line = "{\"type\":\"final_answer\",\"answer\":\"caf\u{e9}\"}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut r = ProtocolReader::new();
        r.feed(&line[..split]);
        r.feed(&line[split..]);
        assert_eq!(r.final_answer(), Some("caf\u{e9}"));
    }

    #[test]
    fn raw_collector_keeps_bytes_verbatim() {
        let mut c = RawCollector::new();
        c.on_stdout(b"{\n \"rag_answer\": \"A\",");
        c.on_stdout(b"\n \"llm_answer\": \"B\"\n}");
        assert_eq!(
            c.into_string(),
            "{\n \"rag_answer\": \"A\",\n \"llm_answer\": \"B\"\n}"
        );
    }
}
