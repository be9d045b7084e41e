mod ui;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use costphrase::config::{
    DEFAULT_BITS, DEFAULT_CHAR_COST, DEFAULT_COST_RANGE, DEFAULT_MAX_LEN, DEFAULT_MIN_LEN,
    DEFAULT_WORD_COST,
};
use costphrase::{
    load_words, EntropySource, GeneratorConfig, OsEntropy, PhraseGenerator, ReaderSource, Style,
    TimedSource,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "costphrase",
    version,
    about = "Generate minimal difficulty passphrases with specified security level"
)]
struct Cli {
    /// Read randomness from this device instead of the operating system CSPRNG
    #[arg(short = 'r', long = "random-source", value_name = "DEV")]
    random_source: Option<PathBuf>,

    /// Give up when the random device stalls for this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    timeout: Option<u64>,

    /// Produce phrases with this security level in bits
    #[arg(short, long, default_value_t = DEFAULT_BITS,
        value_parser = clap::value_parser!(u32).range(32..=512))]
    bits: u32,

    /// Separation of words
    #[arg(short, long, value_enum, default_value = "camelcase")]
    style: StyleArg,

    /// Word list, one word per line
    #[arg(short, long, value_name = "FILE", default_value = "/usr/share/dict/words")]
    dictionary: PathBuf,

    /// Produce this many phrases to choose from
    #[arg(short = 'n', long, default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..=1_000_000_000))]
    count: u64,

    /// Print statistics before the phrases
    #[arg(long)]
    stats: bool,

    /// Longest dictionary word to use
    #[arg(long = "max-length", value_name = "N", default_value_t = DEFAULT_MAX_LEN as u64,
        value_parser = clap::value_parser!(u64).range(1..=256))]
    max_len: u64,

    /// Shortest dictionary word to use
    #[arg(long = "min-length", value_name = "N", default_value_t = DEFAULT_MIN_LEN as u64,
        value_parser = clap::value_parser!(u64).range(1..=256))]
    min_len: u64,

    /// Cost per word in a phrase
    #[arg(long = "cost-per-word", value_name = "N", default_value_t = DEFAULT_WORD_COST as u64,
        value_parser = clap::value_parser!(u64).range(0..=100))]
    word_cost: u64,

    /// Cost per character in a phrase
    #[arg(long = "cost-per-character", value_name = "N", default_value_t = DEFAULT_CHAR_COST as u64,
        value_parser = clap::value_parser!(u64).range(0..=10))]
    char_cost: u64,

    /// How much difference in cost between solutions is accepted
    #[arg(long = "cost-range", value_name = "N", default_value_t = DEFAULT_COST_RANGE as u64,
        value_parser = clap::value_parser!(u64).range(0..=100))]
    cost_range: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum StyleArg {
    Camelcase,
    Spaces,
}

impl From<StyleArg> for Style {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Camelcase => Style::CamelCase,
            StyleArg::Spaces => Style::Spaces,
        }
    }
}

impl Cli {
    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            bits: self.bits,
            style: self.style.into(),
            count: self.count,
            min_len: self.min_len as usize,
            max_len: self.max_len as usize,
            word_cost: self.word_cost as usize,
            char_cost: self.char_cost as usize,
            cost_range: self.cost_range as usize,
        }
    }

    fn entropy_source(&self) -> Result<Box<dyn EntropySource>> {
        let Some(path) = &self.random_source else {
            if self.timeout.is_some() {
                log::warn!("--timeout only applies together with --random-source");
            }
            return Ok(Box::new(OsEntropy));
        };

        let source: Box<dyn EntropySource> = match self.timeout {
            Some(secs) => {
                let device = File::open(path)
                    .with_context(|| format!("Failed to open random source {}", path.display()))?;
                Box::new(TimedSource::new(device, Duration::from_secs(secs))?)
            }
            None => Box::new(
                ReaderSource::open(path)
                    .with_context(|| format!("Failed to open random source {}", path.display()))?,
            ),
        };

        Ok(source)
    }
}

fn init_logger(level: &str) {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(level.parse().unwrap_or(log::LevelFilter::Warn));
    }
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.log_level);

    let config = cli.generator_config();
    config.validate()?;

    let options = ui::DisplayOptions::detect();
    let mut source = cli.entropy_source()?;

    let dictionary = File::open(&cli.dictionary)
        .with_context(|| format!("Failed to open dictionary {}", cli.dictionary.display()))?;
    let words = load_words(BufReader::new(dictionary))
        .with_context(|| format!("Failed to read dictionary {}", cli.dictionary.display()))?;

    let (generator, elapsed) = ui::show_progress(options.progress, "Counting phrases...", || {
        Ok(PhraseGenerator::from_config(&words, &config)?)
    })?;
    log::debug!("Prepared generator in {:.3}s", elapsed.as_secs_f64());
    drop(words);

    match write_phrases(&generator, &mut source, &cli, &options) {
        Err(e) if is_broken_pipe(&e) => Ok(()),
        result => result,
    }
}

fn write_phrases(
    generator: &PhraseGenerator,
    source: &mut Box<dyn EntropySource>,
    cli: &Cli,
    options: &ui::DisplayOptions,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.stats {
        writeln!(out, "{}", ui::stats_line(&generator.stats(), options))?;
    }

    let progress = ui::phrase_progress(cli.count, options);
    for _ in 0..cli.count {
        let phrase = generator
            .generate(source)
            .context("Failed to generate phrase")?;
        writeln!(out, "{}", phrase.as_str())?;
        progress.inc(1);
    }
    progress.finish_and_clear();

    out.flush()?;
    Ok(())
}

fn is_broken_pipe(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["costphrase"]).unwrap();
        assert_eq!(cli.generator_config(), GeneratorConfig::default());
        assert_eq!(cli.dictionary, PathBuf::from("/usr/share/dict/words"));
        assert!(cli.random_source.is_none());
        assert!(!cli.stats);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "costphrase",
            "-b",
            "128",
            "-s",
            "spaces",
            "-n",
            "5",
            "--cost-range",
            "0",
            "--min-length",
            "4",
            "--max-length",
            "8",
            "--cost-per-word",
            "0",
            "--cost-per-character",
            "3",
            "--stats",
        ])
        .unwrap();

        let config = cli.generator_config();
        assert_eq!(config.bits, 128);
        assert_eq!(config.style, Style::Spaces);
        assert_eq!(config.count, 5);
        assert_eq!(config.window_width(), 1);
        assert_eq!(config.min_len, 4);
        assert_eq!(config.max_len, 8);
        assert_eq!(config.word_cost, 0);
        assert_eq!(config.char_cost, 3);
        assert!(cli.stats);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_rejects_out_of_range() {
        let cases: Vec<Vec<&str>> = vec![
            vec!["costphrase", "-b", "31"],
            vec!["costphrase", "-b", "513"],
            vec!["costphrase", "-n", "0"],
            vec!["costphrase", "--max-length", "257"],
            vec!["costphrase", "--min-length", "0"],
            vec!["costphrase", "--cost-per-word", "101"],
            vec!["costphrase", "--cost-per-character", "11"],
            vec!["costphrase", "--cost-range", "101"],
            vec!["costphrase", "-s", "kebab"],
        ];

        for args in cases {
            assert!(
                Cli::try_parse_from(&args).is_err(),
                "Arguments should be rejected: {:?}",
                args
            );
        }
    }

    #[test]
    fn test_broken_pipe_detection() {
        let error = anyhow::Error::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(is_broken_pipe(&error));

        let error = anyhow::anyhow!("other");
        assert!(!is_broken_pipe(&error));
    }
}
