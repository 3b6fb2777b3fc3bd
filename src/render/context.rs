use std::collections::BTreeMap;

use tera::{Context, Value};

pub fn build_context(variables: &BTreeMap<String, Value>) -> Context {
    let mut context = Context::new();
    for (key, value) in variables {
        context.insert(key, value);
    }
    context
}

/// Stack variable layers in order, then call-site data; later keys win.
pub fn merge_context(layers: &[&BTreeMap<String, Value>], data: &Context) -> Context {
    let mut context = Context::new();
    for layer in layers {
        context.extend(build_context(layer));
    }
    context.extend(data.clone());
    context
}
