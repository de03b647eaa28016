//! Serializer: turns a syntax plus the operator's input into the wire command line.
//!
//! Rendering is pure and cheap, so callers re-run it after every edit to keep a
//! live preview in sync with what `send` will transmit.

use crate::store::ParameterStore;
use crate::syntax::{Field, FieldMode, Syntax};

/// Separator between an id and its human label in a composite token.
pub const COMPOSITE_SEPARATOR: &str = " - ";

/// The protocol-significant part of a token: everything before the first `" - "`.
pub fn id_portion(token: &str) -> &str {
    token
        .split_once(COMPOSITE_SEPARATOR)
        .map_or(token, |(id, _)| id)
}

/// Render the full command line. Fields without content are skipped entirely.
pub fn render(syntax: &Syntax, store: &ParameterStore) -> String {
    let mut out = String::from(syntax.keyword());
    for field in syntax.parameters() {
        if let Some(content) = render_field(field, store) {
            out.push(' ');
            out.push_str(&content);
        }
    }
    out
}

/// Content for a single parameter field, or `None` when it renders nothing.
pub fn render_field(field: &Field, store: &ParameterStore) -> Option<String> {
    let key = field.original_name();
    match field.mode() {
        FieldMode::Plain | FieldMode::SimpleRadio | FieldMode::ComplexRadio => {
            scalar_id(store, key).map(str::to_string)
        }
        FieldMode::SpecialPrefix => scalar_id(store, key)
            .map(|id| format!("{}{id}", field.delimiter().unwrap_or_default())),
        FieldMode::MultiSelectSet => {
            let ids: Vec<&str> = store
                .set(key)?
                .iter()
                .map(|t| id_portion(t))
                .filter(|id| !id.is_empty())
                .collect();
            (!ids.is_empty()).then(|| ids.join(field.list_separator()))
        }
        FieldMode::MultiSelectMultiset => {
            let pairs: Vec<String> = store
                .multiset(key)?
                .iter()
                .map(|(token, count)| (id_portion(token), count))
                .filter(|(id, _)| !id.is_empty())
                .map(|(id, count)| format!("{id}:{count}"))
                .collect();
            (!pairs.is_empty()).then(|| pairs.join(field.list_separator()))
        }
    }
}

fn scalar_id<'a>(store: &'a ParameterStore, key: &str) -> Option<&'a str> {
    store
        .scalar(key)
        .map(id_portion)
        .filter(|id| !id.is_empty())
}

/// Display labels of required parameters that currently have no content.
pub fn missing_required(syntax: &Syntax, store: &ParameterStore) -> Vec<String> {
    syntax
        .parameters()
        .iter()
        .filter(|f| f.required() && render_field(f, store).is_none())
        .map(|f| f.display_name().to_string())
        .collect()
}
