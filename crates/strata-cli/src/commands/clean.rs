//! Intermediate cleanup command

use anyhow::Result;
use strata_gen::{clear_temp_files, GeneratorConfig};

pub fn run(config: &GeneratorConfig) -> Result<()> {
    let removed = clear_temp_files(config)?;
    if removed == 0 {
        println!("No intermediate files found");
    } else {
        println!("Removed {} intermediate file(s)", removed);
    }
    Ok(())
}
