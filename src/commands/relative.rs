use miette::Result;

pub fn run(to: String, from: String) -> Result<()> {
    println!("{}", tera_views::relative_path(&to, &from)?);
    Ok(())
}
