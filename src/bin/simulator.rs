// Line protocol over stdin/stdout for sentence-rendering hosts.
//
//   LOCATE <word>\t<sentence>                 -> MATCH <token> <distance> | NO_MATCH
//   HIGHLIGHT <word>\t<sentence>[\t<phrase>]  -> RESULT <html>
//   EXIT
//
// Logs go to stderr so stdout carries protocol replies only.
use std::io::{self, BufRead, Write};
use wordmark_core::core::types::Sentence;
use wordmark_core::fuzzy::{highlight_sentence, locate, EnglishStemmer};

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    tracing::info!("wordmark simulator starting");

    let stemmer = EnglishStemmer::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let input = line?;
        tracing::debug!(input = %input, "request");
        let (command, rest) = input.split_once(' ').unwrap_or((input.as_str(), ""));
        let reply = match command {
            "LOCATE" => {
                let (word, sentence) = rest.split_once('\t').unwrap_or((rest, ""));
                match locate(sentence, word, &stemmer) {
                    Some(found) => format!("MATCH {} {}", found.token, found.distance),
                    None => "NO_MATCH".to_string(),
                }
            }
            "HIGHLIGHT" => {
                let mut fields = rest.split('\t');
                let word = fields.next().unwrap_or_default();
                let sentence = Sentence {
                    sentence: fields.next().unwrap_or_default().to_string(),
                    highlight_phrase: fields.next().map(str::to_string),
                };
                format!("RESULT {}", highlight_sentence(&sentence, word, &stemmer))
            }
            "EXIT" => break,
            other => {
                tracing::warn!(command = %other, "unknown command");
                "ERROR unknown command".to_string()
            }
        };
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }
    tracing::info!("wordmark simulator shutting down");
    Ok(())
}
