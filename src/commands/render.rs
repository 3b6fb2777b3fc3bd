use std::path::PathBuf;
use std::sync::Arc;

use miette::Result;
use tera::{Context, Value};
use tera_views::{RequestUri, RequestView};

pub fn run(config: PathBuf, template: String, data: Vec<String>, uri: String) -> Result<()> {
    let setup = tera_views::setup(&config)?;
    let uri = RequestUri::parse(&uri)?;
    let view = RequestView::new(Arc::clone(&setup.view), setup.helpers_for(uri));

    let mut context = Context::new();
    for (key, value) in parse_data(data) {
        context.insert(key, &value);
    }

    let output = view.fetch(&template, &context)?;
    print!("{output}");

    Ok(())
}

fn parse_data(data: Vec<String>) -> Vec<(String, Value)> {
    data.into_iter()
        .filter_map(|kv| {
            let (key, raw) = kv.split_once('=')?;
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            Some((key.to_string(), value))
        })
        .collect()
}
