use std::io::{BufRead, ErrorKind};
use std::mem;
use std::path::Path;

use tracing::warn;

use super::cancel::CancellationToken;
use super::error::{ErrorAccumulator, PgnError};
use super::header::{DEFAULT_HEADER_REGEX_MAX_LEN, try_parse_header_line};
use super::input::{CompressionMode, PgnInput, open_input};
use super::scan::MovetextContext;
use super::types::GameRecord;

/// Physical lines longer than this are rejected as malformed input.
pub const DEFAULT_MAX_LINE_LEN: usize = 1 << 20;

const NOTE_EXCERPT_LEN: usize = 64;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// When false, movetext is not buffered; records carry an empty movetext
    /// but are split exactly as in full mode.
    pub include_movetext: bool,
    pub max_line_len: usize,
    pub header_regex_max_len: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            include_movetext: true,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            header_regex_max_len: DEFAULT_HEADER_REGEX_MAX_LEN,
        }
    }
}

impl ReaderOptions {
    pub fn headers_only() -> Self {
        Self {
            include_movetext: false,
            ..Self::default()
        }
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    pub fn with_header_regex_max_len(mut self, len: usize) -> Self {
        self.header_regex_max_len = len;
        self
    }
}

/// Result of pulling one record from the reader.
#[derive(Debug)]
pub enum RecordOutcome {
    Parsed(GameRecord),
    /// The record is usable but something was degraded while reading it.
    Recovered(GameRecord, String),
    /// The stream cannot be read further.
    Fatal(PgnError),
}

impl RecordOutcome {
    fn from_record(record: GameRecord) -> Self {
        match record.parse_notes.clone() {
            Some(note) => Self::Recovered(record, note),
            None => Self::Parsed(record),
        }
    }
}

/// Splits a byte stream into physical lines. `\r\n`, `\r` and `\n` each end
/// exactly one line, also when `\r` and `\n` arrive in different buffer fills.
struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_len: usize,
    line_no: u64,
    skip_lf: bool,
    eof: bool,
}

impl<R: BufRead> LineReader<R> {
    fn new(inner: R, max_len: usize) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(256),
            max_len,
            line_no: 0,
            skip_lf: false,
            eof: false,
        }
    }

    fn check_len(&self, len: usize) -> Result<(), PgnError> {
        if len > self.max_len {
            return Err(PgnError::LineTooLong {
                line: self.line_no + 1,
                len,
                max: self.max_len,
            });
        }
        Ok(())
    }

    /// Counts the buffered line; a byte order mark is dropped from the first.
    fn emit(&mut self) -> &[u8] {
        self.line_no += 1;
        match self.buf.strip_prefix(UTF8_BOM) {
            Some(line) if self.line_no == 1 => line,
            _ => &self.buf,
        }
    }

    fn next_line(&mut self) -> Result<Option<&[u8]>, PgnError> {
        self.buf.clear();
        if self.eof {
            return Ok(None);
        }

        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if available.is_empty() {
                self.eof = true;
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.emit()));
            }

            let mut start = 0;
            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    start = 1;
                }
            }

            let rest = &available[start..];
            match rest.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(end) => {
                    let len = self.buf.len() + end;
                    if len > self.max_len {
                        return Err(PgnError::LineTooLong {
                            line: self.line_no + 1,
                            len,
                            max: self.max_len,
                        });
                    }
                    self.buf.extend_from_slice(&rest[..end]);

                    let mut consumed = start + end + 1;
                    if rest[end] == b'\r' {
                        match rest.get(end + 1) {
                            Some(b'\n') => consumed += 1,
                            Some(_) => {}
                            None => self.skip_lf = true,
                        }
                    }

                    self.inner.consume(consumed);
                    return Ok(Some(self.emit()));
                }
                None => {
                    let len = self.buf.len() + rest.len();
                    self.buf.extend_from_slice(rest);
                    let consumed = available.len();
                    self.inner.consume(consumed);
                    self.check_len(len)?;
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParserState {
    /// Between records.
    Idle,
    InHeaders,
    /// Header block closed by a blank line, movetext not started yet.
    AwaitingMovetext,
    InMovetext(MovetextContext),
}

/// Line-driven record state machine, independent of any I/O.
struct RecordAssembler {
    include_movetext: bool,
    header_regex_max_len: usize,
    state: ParserState,
    current: GameRecord,
    movetext_seen: bool,
    notes: ErrorAccumulator,
}

impl RecordAssembler {
    fn new(options: &ReaderOptions) -> Self {
        Self {
            include_movetext: options.include_movetext,
            header_regex_max_len: options.header_regex_max_len,
            state: ParserState::Idle,
            current: GameRecord::default(),
            movetext_seen: false,
            notes: ErrorAccumulator::default(),
        }
    }

    /// Feeds one physical line (without terminator). Returns the record this
    /// line completed, if any.
    fn process_line(&mut self, line: &str) -> Option<GameRecord> {
        let trimmed = line.trim();
        let nested = matches!(self.state, ParserState::InMovetext(ctx) if ctx.is_nested());

        if trimmed.is_empty() {
            return match self.state {
                ParserState::InMovetext(mut ctx) if nested => {
                    self.push_movetext_line("");
                    ctx.feed_line("");
                    self.state = ParserState::InMovetext(ctx);
                    None
                }
                ParserState::InMovetext(_) => self.complete(),
                ParserState::InHeaders => {
                    self.state = ParserState::AwaitingMovetext;
                    None
                }
                ParserState::Idle | ParserState::AwaitingMovetext => None,
            };
        }

        if trimmed.starts_with('[') && !nested {
            if let Some(header) = try_parse_header_line(trimmed, self.header_regex_max_len) {
                let completed = match self.state {
                    ParserState::InMovetext(_) | ParserState::AwaitingMovetext => self.complete(),
                    ParserState::Idle | ParserState::InHeaders => None,
                };
                self.current.set_header(header.name, header.value.into_owned());
                self.state = ParserState::InHeaders;
                return completed;
            }

            self.notes.push(&format!(
                "Unparseable header line treated as movetext: {}",
                excerpt(trimmed)
            ));
        }

        let mut ctx = match self.state {
            ParserState::InMovetext(ctx) => ctx,
            _ => MovetextContext::new(),
        };
        self.push_movetext_line(line.trim_end());
        ctx.feed_line(line);
        self.state = ParserState::InMovetext(ctx);
        None
    }

    fn push_movetext_line(&mut self, text: &str) {
        self.movetext_seen = true;
        if !self.include_movetext {
            return;
        }
        let movetext = &mut self.current.movetext;
        if !movetext.is_empty() {
            movetext.push('\n');
        }
        movetext.push_str(text);
    }

    /// End of input: yields whatever is still open.
    fn finish(&mut self) -> Option<GameRecord> {
        self.complete()
    }

    fn complete(&mut self) -> Option<GameRecord> {
        self.state = ParserState::Idle;
        let has_content = self.current.header_count() > 0 || self.movetext_seen;
        let mut record = mem::take(&mut self.current);
        let notes = self.notes.take();
        self.movetext_seen = false;

        if !has_content {
            return None;
        }

        let trimmed = record.movetext.trim();
        if trimmed.len() != record.movetext.len() {
            record.movetext = trimmed.to_string();
        }
        record.parse_notes = notes;
        Some(record)
    }
}

/// Pull-based PGN record reader.
///
/// Each call to `next` reads only as many lines as it takes to complete one
/// record. After a fatal error (including cancellation) the reader yields that
/// error once and then ends.
pub struct PgnReader<R> {
    lines: LineReader<R>,
    assembler: RecordAssembler,
    cancel: CancellationToken,
    games_read: u64,
    done: bool,
}

impl<R: BufRead> PgnReader<R> {
    pub fn new(source: R, options: ReaderOptions, cancel: CancellationToken) -> Self {
        Self {
            lines: LineReader::new(source, options.max_line_len),
            assembler: RecordAssembler::new(&options),
            cancel,
            games_read: 0,
            done: false,
        }
    }

    pub fn with_defaults(source: R) -> Self {
        Self::new(source, ReaderOptions::default(), CancellationToken::new())
    }

    /// Records yielded so far.
    pub fn games_read(&self) -> u64 {
        self.games_read
    }

    /// Physical lines consumed so far.
    pub fn line_number(&self) -> u64 {
        self.lines.line_no
    }

    pub fn next_outcome(&mut self) -> Option<RecordOutcome> {
        if self.done {
            return None;
        }

        loop {
            if let Err(e) = self.cancel.check() {
                self.done = true;
                return Some(RecordOutcome::Fatal(e));
            }

            match self.lines.next_line() {
                Ok(Some(bytes)) => {
                    let line = String::from_utf8_lossy(bytes);
                    if let Some(record) = self.assembler.process_line(&line) {
                        self.games_read += 1;
                        return Some(RecordOutcome::from_record(record));
                    }
                }
                Ok(None) => {
                    self.done = true;
                    let record = self.assembler.finish()?;
                    self.games_read += 1;
                    return Some(RecordOutcome::from_record(record));
                }
                Err(e) => {
                    self.done = true;
                    return Some(RecordOutcome::Fatal(e));
                }
            }
        }
    }
}

impl PgnReader<PgnInput> {
    pub fn from_path(
        path: &Path,
        compression: CompressionMode,
        options: ReaderOptions,
        cancel: CancellationToken,
    ) -> Result<Self, PgnError> {
        let input = open_input(path, compression)?;
        Ok(Self::new(input, options, cancel))
    }
}

impl<R: BufRead> Iterator for PgnReader<R> {
    type Item = Result<GameRecord, PgnError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_outcome()? {
            RecordOutcome::Parsed(record) => Some(Ok(record)),
            RecordOutcome::Recovered(record, note) => {
                warn!(
                    game_index = self.games_read,
                    line = self.lines.line_no,
                    "{}",
                    note
                );
                Some(Ok(record))
            }
            RecordOutcome::Fatal(e) => Some(Err(e)),
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for PgnReader<R> {}

/// Convenience for in-memory input.
pub fn read_games(input: &str) -> PgnReader<&[u8]> {
    PgnReader::with_defaults(input.as_bytes())
}

fn excerpt(line: &str) -> &str {
    match line.char_indices().nth(NOTE_EXCERPT_LEN) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
