//! Comment/variation tracking shared by the tokenizer and the record reader.
//!
//! Both consumers feed bytes through the same `MovetextContext::step`, so a `{`
//! or `(` that the tokenizer skips is also what keeps the reader from ending a
//! record on a blank line. All delimiters are ASCII, so stepping over the raw
//! UTF-8 bytes is equivalent to stepping over chars.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentKind {
    /// `{ ... }`, may span lines.
    Brace,
    /// `; ...` up to the end of the line.
    Line,
}

/// What a single byte turned out to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scanned {
    /// Mainline text outside any comment or variation.
    Text,
    /// A delimiter, or anything inside a comment or variation.
    Skipped,
}

/// plain / brace comment / line comment, at variation depth N.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovetextContext {
    comment: Option<CommentKind>,
    variation_depth: u32,
}

impl MovetextContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn step(&mut self, byte: u8) -> Scanned {
        match self.comment {
            Some(CommentKind::Brace) => {
                if byte == b'}' {
                    self.comment = None;
                }
                Scanned::Skipped
            }
            Some(CommentKind::Line) => {
                if byte == b'\n' || byte == b'\r' {
                    self.comment = None;
                }
                Scanned::Skipped
            }
            None => match byte {
                b'{' => {
                    self.comment = Some(CommentKind::Brace);
                    Scanned::Skipped
                }
                b';' => {
                    self.comment = Some(CommentKind::Line);
                    Scanned::Skipped
                }
                b'(' => {
                    self.variation_depth = self.variation_depth.saturating_add(1);
                    Scanned::Skipped
                }
                b')' => {
                    // A stray `)` on the mainline is ignored.
                    self.variation_depth = self.variation_depth.saturating_sub(1);
                    Scanned::Skipped
                }
                _ if self.variation_depth > 0 => Scanned::Skipped,
                _ => Scanned::Text,
            },
        }
    }

    /// Feeds a whole physical line followed by an implicit line break.
    pub fn feed_line(&mut self, line: &str) {
        for &byte in line.as_bytes() {
            self.step(byte);
        }
        self.step(b'\n');
    }

    pub fn comment(&self) -> Option<CommentKind> {
        self.comment
    }

    pub fn variation_depth(&self) -> u32 {
        self.variation_depth
    }

    /// Inside a brace comment or a variation, where a blank line is content
    /// rather than a record terminator and `[` does not start a header.
    pub fn is_nested(&self) -> bool {
        self.comment == Some(CommentKind::Brace) || self.variation_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> (String, MovetextContext) {
        let mut ctx = MovetextContext::new();
        let text = input
            .bytes()
            .filter(|&b| ctx.step(b) == Scanned::Text)
            .map(char::from)
            .collect();
        (text, ctx)
    }

    #[test]
    fn test_brace_comment_is_skipped() {
        let (text, ctx) = scan("e4 {good move} e5");
        assert_eq!(text, "e4  e5");
        assert_eq!(ctx, MovetextContext::default());
    }

    #[test]
    fn test_nested_variations_track_depth() {
        let (text, ctx) = scan("e4 (d4 (c4) Nf6) e5 (");
        assert_eq!(text, "e4  e5 ");
        assert_eq!(ctx.variation_depth(), 1);
        assert!(ctx.is_nested());
    }

    #[test]
    fn test_parenthesis_inside_comment_does_not_open_variation() {
        let (text, ctx) = scan("e4 { see (d4) } e5");
        assert_eq!(text, "e4  e5");
        assert_eq!(ctx.variation_depth(), 0);
    }

    #[test]
    fn test_brace_inside_variation_keeps_depth() {
        let (_, ctx) = scan("(e4 { ) } e5");
        assert_eq!(ctx.variation_depth(), 1);
        assert_eq!(ctx.comment(), None);
    }

    #[test]
    fn test_line_comment_ends_at_line_break() {
        let mut ctx = MovetextContext::new();
        ctx.feed_line("e4 ; a { not a comment");
        assert_eq!(ctx, MovetextContext::default());
    }

    #[test]
    fn test_brace_comment_spans_lines() {
        let mut ctx = MovetextContext::new();
        ctx.feed_line("e4 { starts here");
        assert_eq!(ctx.comment(), Some(CommentKind::Brace));
        assert!(ctx.is_nested());
        ctx.feed_line("ends here } e5");
        assert!(!ctx.is_nested());
    }

    #[test]
    fn test_stray_closing_parenthesis_is_ignored() {
        let (text, ctx) = scan(") e4");
        assert_eq!(text, " e4");
        assert_eq!(ctx.variation_depth(), 0);
    }
}
