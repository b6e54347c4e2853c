//! The `archivist check` command: tool pre-flight without touching any files.

use archivist_core::{check_tools, Config};

/// Resolve both external tools and print where they were found.
pub fn execute(config: &Config) -> anyhow::Result<()> {
    let tools = check_tools(&config.tools).map_err(|e| {
        anyhow::anyhow!(
            "{e}\n\n  Hint: Install it or set [tools] in the config file (`archivist config path`)."
        )
    })?;

    println!("{:<16} {}", "metadata reader:", tools.metadata_reader.display());
    println!("{:<16} {}", "encoder:", tools.encoder.display());
    Ok(())
}
