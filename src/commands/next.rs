use clap::Args;

use crate::domain::version;
use crate::error::ExitError;

#[derive(Debug, Args)]
pub struct NextArgs {
    /// Current tag, e.g. v4.3.7
    pub current: String,
    /// Version pattern, e.g. v4.3.*
    pub pattern: String,
}

impl NextArgs {
    /// Print the tag that would follow `current` under `pattern`.
    pub fn execute(&self) -> anyhow::Result<()> {
        let next = version::next(&self.current, &self.pattern)
            .map_err(|e| ExitError::Other(e.to_string()))?;
        println!("{next}");
        Ok(())
    }
}
