use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, Level};

use crate::core::engine::Engine;
use crate::games::mr_white::command::parse_batch;
use crate::games::mr_white::{CommandGenerator, Disabled, MrWhiteGame, WordGenerator, WordSource, WordSupplier};

#[derive(Parser)]
#[command(name = "mrwhite")]
#[command(about = "🕵️ Mr. White - a pass-the-device social deduction party game")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub words: WordOptions,

    /// Seed for picking Mr. White and fallback words (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Append logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct WordOptions {
    /// Credential handed to the word generator
    #[arg(long, env = "MRWHITE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Command that prints a secret word, e.g. "llm -m gemini-2.0-flash"
    #[arg(long, env = "MRWHITE_GENERATOR")]
    pub generator: Option<String>,

    /// Seconds to wait for the generator before using a fallback word
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Words to queue before the first game (at most 50)
    #[arg(long, default_value_t = 0, value_parser = parse_batch)]
    pub prefetch: usize,
}

impl WordOptions {
    pub fn source(&self) -> WordSource {
        let generator: Arc<dyn WordGenerator> = match self.generator.as_deref().and_then(CommandGenerator::parse) {
            Some(command) => Arc::new(command),
            None => Arc::new(Disabled),
        };
        WordSource::new(generator, self.api_key.clone(), Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play in the terminal (default)
    Play,
    /// Run facilitator commands from a file, one per line ('-' reads stdin)
    Script {
        path: PathBuf,

        /// Print the table as JSON after every command
        #[arg(long)]
        json: bool,
    },
    /// Ask for secret words and print where each one came from
    Words {
        #[arg(default_value_t = 5, value_parser = parse_batch)]
        count: usize,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let headless = !matches!(cli.command, None | Some(Commands::Play));
    init_tracing(cli.verbose, cli.log_file.as_deref(), headless)?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut words = WordSupplier::new(cli.words.source(), StdRng::from_rng(&mut rng));

    match cli.command {
        Some(Commands::Words { count }) => {
            for _ in 0..count {
                let supplied = words.supply_word().await;
                println!("{:<20} {:?}", supplied.word, supplied.origin);
            }
        }

        Some(Commands::Script { path, json }) => {
            prefetch(&mut words, cli.words.prefetch).await;
            let reader: Box<dyn AsyncBufRead + Unpin> = if path.as_os_str() == "-" {
                Box::new(BufReader::new(tokio::io::stdin()))
            } else {
                let file = tokio::fs::File::open(&path)
                    .await
                    .with_context(|| format!("cannot open script {}", path.display()))?;
                Box::new(BufReader::new(file))
            };
            let engine = Engine::new(MrWhiteGame::new(words, rng));
            engine.run_script(reader, json).await?;
        }

        None | Some(Commands::Play) => {
            if cli.words.prefetch > 0 {
                println!("🎲 Preparing {} words...", cli.words.prefetch);
            }
            prefetch(&mut words, cli.words.prefetch).await;

            let engine = Engine::new(MrWhiteGame::new(words, rng));
            let terminal = ratatui::init();
            let result = engine.run(terminal).await;
            ratatui::restore();

            let game = result?;
            for (name, wins) in game.session().scores().ranking() {
                println!("{name}: {wins} wins");
            }
        }
    }

    Ok(())
}

async fn prefetch(words: &mut WordSupplier, count: usize) {
    if count == 0 {
        return;
    }
    let report = words.prefetch(count).await;
    info!(generated = report.generated, fallback = report.fallback, "words prefetched");
}

fn init_tracing(verbose: u8, log_file: Option<&Path>, headless: bool) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(false);

    let installed = if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
    } else if headless {
        builder.with_writer(std::io::stderr).try_init()
    } else {
        // The terminal UI owns the screen, so without a file logs are dropped.
        return Ok(());
    };

    installed.map_err(|e| anyhow!("cannot install log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_script_invocation() {
        let cli = Cli::try_parse_from(["mrwhite", "--seed", "4", "--prefetch", "2", "script", "game.txt", "--json"]).unwrap();
        assert_eq!(cli.seed, Some(4));
        assert_eq!(cli.words.prefetch, 2);
        assert!(matches!(cli.command, Some(Commands::Script { json: true, .. })));
    }

    #[test]
    fn prefetch_is_bounded() {
        assert!(Cli::try_parse_from(["mrwhite", "--prefetch", "50", "words"]).is_ok());
        assert!(Cli::try_parse_from(["mrwhite", "--prefetch", "51", "words"]).is_err());
        assert!(Cli::try_parse_from(["mrwhite", "--prefetch", "18446744073709551615", "words"]).is_err());
    }

    #[tokio::test]
    async fn without_generator_words_come_from_fallback() {
        let options = WordOptions { api_key: Some("key".into()), generator: None, timeout_secs: 1, prefetch: 0 };
        let err = options.source().fetch().await.unwrap_err();
        assert!(matches!(err, crate::games::mr_white::GenerateError::NotConfigured));
    }
}
