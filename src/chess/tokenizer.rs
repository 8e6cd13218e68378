use smallvec::SmallVec;
use std::fmt::Write;

use super::scan::{MovetextContext, Scanned};

pub type MoveList<'a> = SmallVec<[&'a str; 128]>;

const RESULT_TOKENS: [&str; 5] = ["1-0", "0-1", "1/2-1/2", "½-½", "*"];

/// Lazy sequence of normalized SAN tokens over raw movetext.
///
/// Comments, variations, move numbers, NAGs and annotation glyphs are dropped;
/// castling is spelled `O-O`/`O-O-O`. Iteration stops at the first game-result
/// token, which is then available from [`MoveTokens::result`].
///
/// Tokens are slices of the input; nothing is allocated.
#[derive(Debug, Clone)]
pub struct MoveTokens<'a> {
    input: &'a str,
    pos: usize,
    ctx: MovetextContext,
    result: Option<&'a str>,
    finished: bool,
}

enum RawToken<'a> {
    Move(&'a str),
    Result(&'a str),
    Noise,
}

impl<'a> MoveTokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            ctx: MovetextContext::new(),
            result: None,
            finished: false,
        }
    }

    /// The result token that ended tokenization, if any.
    pub fn result(&self) -> Option<&'a str> {
        self.result
    }

    fn next_raw(&mut self) -> Option<&'a str> {
        let bytes = self.input.as_bytes();
        let mut start = None;

        while self.pos < bytes.len() {
            let byte = bytes[self.pos];
            let is_token_byte =
                self.ctx.step(byte) == Scanned::Text && !byte.is_ascii_whitespace();
            self.pos += 1;

            match (is_token_byte, start) {
                (true, None) => start = Some(self.pos - 1),
                (false, Some(s)) => return Some(&self.input[s..self.pos - 1]),
                _ => {}
            }
        }

        start.map(|s| &self.input[s..])
    }
}

impl<'a> Iterator for MoveTokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let Some(raw) = self.next_raw() else {
                self.finished = true;
                break;
            };

            match classify_token(raw) {
                RawToken::Move(token) => return Some(token),
                RawToken::Result(result) => {
                    self.result = Some(result);
                    self.finished = true;
                }
                RawToken::Noise => {}
            }
        }
        None
    }
}

impl std::iter::FusedIterator for MoveTokens<'_> {}

pub fn tokenize(movetext: &str) -> MoveTokens<'_> {
    MoveTokens::new(movetext)
}

pub fn move_list(movetext: &str) -> MoveList<'_> {
    MoveTokens::new(movetext).collect()
}

/// Canonical numbered rendering of the mainline, e.g. `1. e4 e5 2. Nf3 1-0`.
pub fn normalize_movetext(movetext: &str) -> String {
    let mut tokens = MoveTokens::new(movetext);
    let mut output = String::new();

    for (ply, token) in tokens.by_ref().enumerate() {
        if ply % 2 == 0 {
            if !output.is_empty() {
                output.push(' ');
            }
            let _ = write!(output, "{}. ", ply / 2 + 1);
        } else {
            output.push(' ');
        }
        output.push_str(token);
    }

    if let Some(result) = tokens.result() {
        if !output.is_empty() {
            output.push(' ');
        }
        output.push_str(result);
    }

    output
}

fn classify_token(raw: &str) -> RawToken<'_> {
    if RESULT_TOKENS.contains(&raw) {
        return RawToken::Result(raw);
    }

    let token = strip_move_number(raw);
    if token.is_empty() || token.bytes().all(|b| b == b'.') {
        return RawToken::Noise;
    }

    if let Some(digits) = token.strip_prefix('$')
        && digits.bytes().all(|b| b.is_ascii_digit())
    {
        return RawToken::Noise;
    }

    if token.eq_ignore_ascii_case("ep") || token.eq_ignore_ascii_case("e.p.") {
        return RawToken::Noise;
    }

    let token = strip_annotations(token);
    if !token.bytes().any(|b| b.is_ascii_alphanumeric()) {
        return RawToken::Noise;
    }

    RawToken::Move(canonical_castling(token).unwrap_or(token))
}

/// `12.e4` -> `e4`, `12...` -> ``. Leaves `0-0` and `1-0` alone.
fn strip_move_number(raw: &str) -> &str {
    let digits = raw.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && raw[digits..].starts_with('.') {
        raw[digits..].trim_start_matches('.')
    } else {
        raw
    }
}

/// Strips trailing `!?+#` glyphs, `$n` suffixes and en-passant markers, in any
/// order and combination.
fn strip_annotations(mut token: &str) -> &str {
    loop {
        let before = token.len();

        token = token.trim_end_matches(['!', '?', '+', '#']);

        if let Some(idx) = token.rfind('$')
            && token[idx + 1..].bytes().all(|b| b.is_ascii_digit())
        {
            token = &token[..idx];
        }

        if let Some(stripped) = token.strip_suffix("e.p.") {
            token = stripped;
        } else if token.len() > 2
            && token.ends_with("ep")
            && token.as_bytes()[token.len() - 3].is_ascii_digit()
        {
            token = &token[..token.len() - 2];
        }

        if token.len() == before {
            return token;
        }
    }
}

fn canonical_castling(token: &str) -> Option<&'static str> {
    let is_o = |b: u8| matches!(b, b'O' | b'o' | b'0');
    match token.as_bytes() {
        [a, b'-', b] if is_o(*a) && is_o(*b) => Some("O-O"),
        [a, b'-', b, b'-', c] if is_o(*a) && is_o(*b) && is_o(*c) => Some("O-O-O"),
        _ => None,
    }
}
