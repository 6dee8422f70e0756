//! Boundary to whatever supplies the API key.
//!
//! The session only needs to ask whether a key is selected and to open a
//! selection flow; storage is the host's business.

use crate::config::{is_usable_key, resolve_api_key};
use crate::error::{Result, StatementExtractorError};
use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::sync::Mutex;

#[async_trait]
pub trait CredentialGate: Send + Sync {
    async fn has_selected_key(&self) -> bool;
    async fn open_key_selection(&self) -> Result<()>;
}

/// Key taken from the environment, or typed in at the terminal when absent.
#[derive(Debug, Default)]
pub struct EnvCredentialGate {
    key: Mutex<Option<String>>,
}

impl EnvCredentialGate {
    pub fn from_env() -> Self {
        Self::with_key(resolve_api_key())
    }

    pub fn with_key(key: Option<String>) -> Self {
        Self {
            key: Mutex::new(key.filter(|k| is_usable_key(k))),
        }
    }

    pub fn selected_key(&self) -> Option<String> {
        self.key.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Prompts on `output` and reads one line from `input` as the new key.
    pub fn select_from<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<()> {
        let key = prompt_for_key(input, output)?;
        self.store(key);
        Ok(())
    }

    /// Runs a blocking `read` on tokio's blocking pool and stores the key it returns.
    #[cfg(feature = "gemini")]
    pub async fn select_blocking<F>(&self, read: F) -> Result<()>
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        let key = tokio::task::spawn_blocking(read)
            .await
            .map_err(|e| StatementExtractorError::IoError(std::io::Error::other(e)))??;
        self.store(key);
        Ok(())
    }

    fn store(&self, key: String) {
        *self.key.lock().unwrap_or_else(|e| e.into_inner()) = Some(key);
    }
}

fn prompt_for_key<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    write!(output, "Enter your Gemini API key: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let key = line.trim().to_string();

    if !is_usable_key(&key) {
        return Err(StatementExtractorError::Configuration(
            "no API key entered".to_string(),
        ));
    }
    Ok(key)
}

fn prompt_on_terminal() -> Result<String> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    prompt_for_key(&mut stdin.lock(), &mut stdout.lock())
}

#[async_trait]
impl CredentialGate for EnvCredentialGate {
    async fn has_selected_key(&self) -> bool {
        self.selected_key().is_some()
    }

    #[cfg(feature = "gemini")]
    async fn open_key_selection(&self) -> Result<()> {
        self.select_blocking(prompt_on_terminal).await
    }

    #[cfg(not(feature = "gemini"))]
    async fn open_key_selection(&self) -> Result<()> {
        let key = prompt_on_terminal()?;
        self.store(key);
        Ok(())
    }
}
