#![allow(dead_code)]

use serde_json::{Value, json};

pub fn text(content: &str) -> Value {
    json!({ "type": "text", "text": content })
}

pub fn paragraph() -> Value {
    json!({ "type": "paragraph" })
}

pub fn styled_paragraph(style: &str) -> Value {
    json!({ "type": "paragraph", "style": style })
}

/// A text run followed by a paragraph end.
pub fn para(content: &str) -> Vec<Value> {
    vec![text(content), paragraph()]
}

/// `count` paragraphs of `words` words each.
pub fn lorem(count: usize, words: usize) -> Vec<Value> {
    (0..count)
        .flat_map(|_| para(&"lorem ".repeat(words)))
        .collect()
}

pub fn image(attrs: &str) -> Value {
    json!({ "type": "image", "attrs": attrs })
}

pub fn image_map(attrs: Value) -> Value {
    json!({ "type": "image", "attrs": attrs })
}

pub fn table(data: Value) -> Value {
    json!({ "type": "table", "data": data })
}

/// A table directive with extra fields merged in.
pub fn table_with(data: Value, extra: Value) -> Value {
    let mut table = table(data);
    if let (Some(target), Some(fields)) = (table.as_object_mut(), extra.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    table
}

/// `rows` rows of `cols` cells labelled `r{row}c{col}`.
pub fn grid(rows: usize, cols: usize) -> Value {
    let data: Vec<Vec<String>> = (0..rows)
        .map(|r| (0..cols).map(|c| format!("r{}c{}", r, c)).collect())
        .collect();
    json!(data)
}

pub fn footnote(id: u32, content: &str) -> Value {
    json!({ "type": "footnote", "id": id, "content": content })
}

pub fn endnote(id: u32, content: &str) -> Value {
    json!({ "type": "endnote", "id": id, "content": content })
}

pub fn layout(fields: Value) -> Value {
    let mut value = fields;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("type".to_string(), json!("layout"));
    }
    value
}

pub fn page_break() -> Value {
    json!({ "type": "pageBreak" })
}

pub fn format(style: &str, on: bool) -> Value {
    json!({ "type": "format", "style": style, "on": on })
}

/// Flattens groups of directives into one JSON array.
pub fn doc(parts: Vec<Vec<Value>>) -> Value {
    Value::Array(parts.into_iter().flatten().collect())
}
