//! Category inspection command

use anyhow::Result;
use strata_gen::{Category, GeneratorConfig, Pick};

pub fn run(config: &GeneratorConfig) -> Result<()> {
    config.validate()?;

    let marker = &config.generation.derived_marker;
    let mut problems = 0;

    for category_config in &config.categories {
        let dir = config.category_dir(category_config);
        let mut flags = Vec::new();
        if category_config.background {
            flags.push("background");
        }
        if category_config.allow_none {
            flags.push("none allowed");
        }
        if category_config.recolor {
            flags.push("recolor");
        }
        println!(
            "{} ({}){}",
            category_config.name,
            dir.display(),
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        );

        let category = match Category::scan(category_config, &dir, marker) {
            Ok(c) => c,
            Err(e) => {
                println!("  ! {}", e);
                problems += 1;
                continue;
            }
        };

        for ((pick, probability), weight) in category
            .probabilities()
            .into_iter()
            .zip(category.weights())
        {
            let name = match &pick {
                Pick::Asset(asset) => asset.file_name(),
                Pick::Nothing => "(none)".to_string(),
            };
            println!("  {:>4}  {:>5.1}%  {}", weight, probability * 100.0, name);
        }
    }

    if problems > 0 {
        anyhow::bail!("{} category(ies) cannot be drawn from", problems);
    }
    Ok(())
}
