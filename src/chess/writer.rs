use std::borrow::Cow;
use std::io::Write;

use super::cancel::CancellationToken;
use super::error::PgnError;
use super::header::escape_value;
use super::scan::{CommentKind, MovetextContext};
use super::types::GameRecord;

pub const DEFAULT_WRAP_WIDTH: usize = 80;

#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Maximum movetext line length in chars. `0` disables wrapping.
    pub wrap_width: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

/// Serializes records back into PGN.
///
/// Records are separated by exactly one blank line; the stream never starts or
/// ends with one. A record without headers and movetext writes nothing.
pub struct PgnWriter<W: Write> {
    sink: W,
    options: WriterOptions,
    records_written: u64,
}

impl<W: Write> PgnWriter<W> {
    pub fn new(sink: W, options: WriterOptions) -> Self {
        Self {
            sink,
            options,
            records_written: 0,
        }
    }

    pub fn with_defaults(sink: W) -> Self {
        Self::new(sink, WriterOptions::default())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn write_record(&mut self, record: &GameRecord) -> Result<(), PgnError> {
        if !record.has_content() {
            return Ok(());
        }
        let has_movetext = !record.movetext.trim().is_empty();

        if self.records_written > 0 {
            self.sink.write_all(b"\n")?;
        }

        for (name, value) in record.headers() {
            writeln!(self.sink, "[{} \"{}\"]", name, escape_value(value))?;
        }

        if has_movetext {
            if record.header_count() > 0 {
                self.sink.write_all(b"\n")?;
            }
            self.write_movetext(&record.movetext)?;
        }

        self.records_written += 1;
        Ok(())
    }

    /// Writes every record, checking `cancel` before each one. Returns how many
    /// records produced output.
    pub fn write_all<I>(&mut self, records: I, cancel: &CancellationToken) -> Result<u64, PgnError>
    where
        I: IntoIterator<Item = Result<GameRecord, PgnError>>,
    {
        let before = self.records_written;
        for record in records {
            cancel.check()?;
            self.write_record(&record?)?;
        }
        self.sink.flush()?;
        Ok(self.records_written - before)
    }

    pub fn flush(&mut self) -> Result<(), PgnError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn write_movetext(&mut self, movetext: &str) -> Result<(), PgnError> {
        let normalized = normalize_line_endings(movetext);
        let mut ctx = MovetextContext::new();

        for raw in normalized.trim().split('\n') {
            let line = raw.trim();
            if line.is_empty() {
                // Outside a comment or variation a blank line would end the record.
                if ctx.is_nested() {
                    self.sink.write_all(b"\n")?;
                }
                continue;
            }

            let unbreakable_from = line_comment_start(line, ctx).unwrap_or(line.len());
            for segment in wrap_segments(line, self.options.wrap_width, unbreakable_from) {
                writeln!(self.sink, "{}", segment)?;
            }
            ctx.feed_line(line);
        }
        Ok(())
    }
}

/// Writes all records to `sink` with default options.
pub fn write_games<W, I>(sink: W, records: I) -> Result<u64, PgnError>
where
    W: Write,
    I: IntoIterator<Item = Result<GameRecord, PgnError>>,
{
    PgnWriter::with_defaults(sink).write_all(records, &CancellationToken::new())
}

fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Byte offset where a `;` comment starts on this line, given the state at the
/// start of the line.
fn line_comment_start(line: &str, mut ctx: MovetextContext) -> Option<usize> {
    for (idx, &byte) in line.as_bytes().iter().enumerate() {
        let before = ctx.comment();
        ctx.step(byte);
        if before.is_none() && ctx.comment() == Some(CommentKind::Line) {
            return Some(idx);
        }
    }
    None
}

/// Greedy word wrap of one trimmed line at ASCII whitespace, falling back to a
/// hard break when none fits. Nothing from `unbreakable_from` on is split, and
/// no continuation line starts with `[` so it cannot be mistaken for a header
/// when read back.
fn wrap_segments(line: &str, width: usize, unbreakable_from: usize) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = line;
    let mut offset = 0;

    while !rest.is_empty() {
        if width == 0 || offset >= unbreakable_from || rest.chars().count() <= width {
            segments.push(rest);
            break;
        }

        // First char past the limit; it exists because the line is too long.
        let limit = rest
            .char_indices()
            .nth(width)
            .map_or(rest.len(), |(idx, _)| idx);
        let bytes = rest.as_bytes();
        let breakable = |idx: usize| {
            offset + idx < unbreakable_from && !rest[idx..].trim_start().starts_with('[')
        };

        let split_at = (1..=limit)
            .rev()
            .find(|&idx| bytes[idx].is_ascii_whitespace() && breakable(idx))
            .or_else(|| {
                (1..=limit)
                    .rev()
                    .find(|&idx| rest.is_char_boundary(idx) && breakable(idx))
            });

        let Some(split_at) = split_at else {
            segments.push(rest);
            break;
        };

        segments.push(rest[..split_at].trim_end());
        let tail = rest[split_at..].trim_start();
        offset += rest.len() - tail.len();
        rest = tail;
    }

    segments
}
