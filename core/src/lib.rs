//! libbigram-core
//!
//! Word-level bigram language model with Laplace smoothing and constrained
//! sequence generation.
//!
//! Public API:
//! - `CorpusReader` - Streams non-blank, tokenized lines from a text resource
//! - `BigramCounts` - Raw (previous -> current) counts and vocabulary
//! - `ProbabilityTable` - Immutable smoothed model with fallback lookups
//! - `Greedy` / `Lookahead` - Sequence generators sharing one set of constraints
//! - `Config` - Generation settings loadable from TOML
use serde::{Deserialize, Serialize};

pub mod corpus;
pub use corpus::{CorpusReader, Sentence, Tokenizer, WhitespaceTokenizer};

pub mod counts;
pub use counts::BigramCounts;

pub mod table;
pub use table::{ProbabilityTable, Row, TokenId, Vocabulary, INIT, UNKNOWN};

pub mod smoothing;
pub use smoothing::{bigram_model, laplace};

pub mod generator;
pub use generator::{is_punctuation, Generation, Greedy, Lookahead, SequenceGenerator, Strategy};

pub mod error;
pub use error::{Error, Result};

/// Generation settings.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// seed = "Aslan"
/// length = 30
/// strategy = "greedy"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// First token of every generated sequence
    pub seed: String,
    /// Number of tokens to generate, seed included
    pub length: usize,
    pub strategy: Strategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: "You".to_string(),
            length: 20,
            strategy: Strategy::Lookahead,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no validation).
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// A configured length of zero would only ever produce empty output.
    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(Error::InvalidConfig("length must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Run the configured strategy.
    pub fn generate(&self, table: &ProbabilityTable) -> Generation {
        self.strategy.generate(table, &self.seed, self.length)
    }
}
