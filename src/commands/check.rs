use std::path::PathBuf;

use console::style;
use miette::Result;

pub fn run(config: PathBuf) -> Result<()> {
    let setup = tera_views::setup(&config)?;

    let names = setup.view.template_names();
    println!(
        "{} {} templates",
        style("==>").cyan().bold(),
        style(names.len()).cyan()
    );
    for name in names {
        println!("  {name}");
    }

    println!(
        "{} {} routes",
        style("==>").cyan().bold(),
        style(setup.routes.len()).cyan()
    );
    for (name, pattern) in &setup.config.routes {
        println!("  {} {}", style(name).green(), pattern);
    }

    if !setup.view.is_empty() {
        println!(
            "{} {} default variables",
            style("==>").cyan().bold(),
            style(setup.view.len()).cyan()
        );
        for (key, value) in setup.view.iter() {
            println!("  {} = {}", style(key).green(), value);
        }
    }

    println!("\n{} Configuration is valid", style("✓").green().bold());

    Ok(())
}
