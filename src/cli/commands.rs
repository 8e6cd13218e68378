use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Value, json};
use tracing::{info, warn};

use super::input::InputGames;
use super::output::AtomicOutput;
use super::progress::ProgressMeter;
use super::{InputArgs, OutputArgs};
use crate::chess::cancel::CancellationToken;
use crate::chess::error::PgnError;
use crate::chess::opening::{OPENING_CACHE, classify_records};
use crate::chess::reader::ReaderOptions;
use crate::chess::tokenizer::{normalize_movetext, tokenize};
use crate::chess::types::GameRecord;
use crate::chess::writer::PgnWriter;

pub fn classify(
    reference: &Path,
    input: &InputArgs,
    output: &OutputArgs,
    cancel: &CancellationToken,
) -> Result<(), PgnError> {
    let trie = OPENING_CACHE.get_or_build_with(reference, cancel)?;
    if trie.is_empty() {
        warn!(reference = %reference.display(), "Games will be copied without classification");
    }

    let games = InputGames::from_args(input, input.reader_options(), cancel)?;
    let mut stream = classify_records(&trie, games);
    let mut progress = ProgressMeter::new("classify");

    let mut sink = AtomicOutput::create(&output.output)?;
    let mut writer = PgnWriter::new(sink.writer(), output.writer_options());
    writer.write_all(stream.by_ref().inspect(|_| progress.tick()), cancel)?;
    drop(writer);
    let target = sink.commit()?;

    info!(
        games = stream.seen(),
        classified = stream.classified(),
        elapsed_ms = progress.elapsed().as_millis() as u64,
        output = %target.display(),
        "Classification finished"
    );
    Ok(())
}

pub fn reformat(
    input: &InputArgs,
    output: &OutputArgs,
    cancel: &CancellationToken,
) -> Result<(), PgnError> {
    let games = InputGames::from_args(input, input.reader_options(), cancel)?;
    let mut progress = ProgressMeter::new("reformat");

    let mut sink = AtomicOutput::create(&output.output)?;
    let mut writer = PgnWriter::new(sink.writer(), output.writer_options());
    let written = writer.write_all(games.inspect(|_| progress.tick()), cancel)?;
    drop(writer);
    let target = sink.commit()?;

    info!(
        games = progress.count(),
        written,
        output = %target.display(),
        "Reformat finished"
    );
    Ok(())
}

pub fn tokens(
    input: &InputArgs,
    numbered: bool,
    cancel: &CancellationToken,
) -> Result<(), PgnError> {
    let games = InputGames::from_args(input, input.reader_options(), cancel)?;
    let mut progress = ProgressMeter::new("tokens");
    let mut out = BufWriter::new(io::stdout().lock());

    for (idx, game) in games.enumerate() {
        let game = game?;
        let line = if numbered {
            json!({ "game": idx + 1, "movetext": normalize_movetext(&game.movetext) })
        } else {
            let tokens: Vec<&str> = tokenize(&game.movetext).collect();
            json!({ "game": idx + 1, "tokens": tokens })
        };
        writeln!(out, "{}", line)?;
        progress.tick();
    }

    out.flush()?;
    Ok(())
}

pub fn headers(input: &InputArgs, cancel: &CancellationToken) -> Result<(), PgnError> {
    let options = ReaderOptions {
        include_movetext: false,
        ..input.reader_options()
    };
    let games = InputGames::from_args(input, options, cancel)?;
    let mut progress = ProgressMeter::new("headers");
    let mut out = BufWriter::new(io::stdout().lock());

    for (idx, game) in games.enumerate() {
        let game = game?;
        writeln!(out, "{}", headers_json(idx + 1, &game))?;
        progress.tick();
    }

    out.flush()?;
    Ok(())
}

fn headers_json(game_number: usize, game: &GameRecord) -> Value {
    let headers: Map<String, Value> = game
        .headers()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();
    json!({ "game": game_number, "headers": headers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::reader::read_games;
    use std::fs;

    fn input_args(paths: &[&Path]) -> InputArgs {
        InputArgs {
            inputs: paths.iter().map(|p| p.display().to_string()).collect(),
            compression: None,
            max_line_len: crate::chess::reader::DEFAULT_MAX_LINE_LEN,
        }
    }

    #[test]
    fn test_headers_json_keeps_header_order() {
        let game = read_games("[White \"A\"]\n[Event \"E\"]\n\n*\n")
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(
            headers_json(3, &game).to_string(),
            r#"{"game":3,"headers":{"White":"A","Event":"E"}}"#
        );
    }

    #[test]
    fn test_classify_writes_annotated_output() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("eco.pgn");
        let games = dir.path().join("games.pgn");
        let out = dir.path().join("out.pgn");
        fs::write(
            &reference,
            "[ECO \"C44\"]\n[Opening \"King's Knight Opening\"]\n\n1. e4 e5 2. Nf3 *\n",
        )
        .unwrap();
        fs::write(
            &games,
            "[Event \"One\"]\n\n1. e4 e5 2. Nf3 Nc6 *\n\n[Event \"Two\"]\n\n1. d4 d5 *\n",
        )
        .unwrap();

        let output = OutputArgs {
            output: out.clone(),
            wrap_width: 80,
        };
        classify(&reference, &input_args(&[&games]), &output, &CancellationToken::new()).unwrap();

        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "[Event \"One\"]\n[ECO \"C44\"]\n[Opening \"King's Knight Opening\"]\n\n1. e4 e5 2. Nf3 Nc6 *\n\n[Event \"Two\"]\n\n1. d4 d5 *\n"
        );
    }

    #[test]
    fn test_cancelled_reformat_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let games = dir.path().join("games.pgn");
        let out = dir.path().join("out.pgn");
        fs::write(&games, "[Event \"One\"]\n\n1. e4 *\n").unwrap();
        fs::write(&out, "previous").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let output = OutputArgs {
            output: out.clone(),
            wrap_width: 80,
        };
        let err = reformat(&input_args(&[&games]), &output, &cancel).unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(fs::read_to_string(&out).unwrap(), "previous");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
