//! `simpleGrid`: a paged table rendered from a built-in template.

use kobind_dom::{Document, NodeId};
use kobind_expr::{EvalError, Evaluator};
use serde_json::{Map, Value};

use crate::error::RenderError;
use crate::options::RenderOptions;
use crate::traverse::bind_document;

const GRID_TEMPLATE: &str = include_str!("grid.html");

const DEFAULT_PAGE_SIZE: u64 = 5;

fn field<'m>(grid: &'m Map<String, Value>, name: &str) -> Option<&'m Value> {
    grid.get(name).or_else(|| {
        grid.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

fn count(grid: &Map<String, Value>, name: &str, default: u64) -> Result<u64, EvalError> {
    match field(grid, name) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .ok_or_else(|| {
                EvalError::Type(format!("simpleGrid `{name}` must be a non-negative integer"))
            }),
    }
}

/// Derive the model the grid template binds against: the grid object plus
/// `ItemsOnCurrentPage` and `MaxPageIndex`.
pub fn view_model(value: &Value) -> Result<Value, EvalError> {
    let Value::Object(grid) = value else {
        return Err(EvalError::Type("simpleGrid expects an object".to_string()));
    };
    let Some(Value::Array(data)) = field(grid, "Data") else {
        return Err(EvalError::Type("simpleGrid `Data` must be an array".to_string()));
    };
    if !matches!(field(grid, "Columns"), Some(Value::Array(_))) {
        return Err(EvalError::Type(
            "simpleGrid `Columns` must be an array".to_string(),
        ));
    }
    let page_size = count(grid, "PageSize", DEFAULT_PAGE_SIZE)?;
    if page_size == 0 {
        return Err(EvalError::Type("simpleGrid `PageSize` must be positive".to_string()));
    }
    let page = count(grid, "CurrentPageIndex", 0)?;

    let size = page_size as usize;
    let items: Vec<Value> = data
        .iter()
        .skip(size.saturating_mul(page as usize))
        .take(size)
        .cloned()
        .collect();
    let max_page = data.len() / size;

    let mut model = grid.clone();
    model.insert("PageSize".to_string(), Value::from(page_size));
    model.insert("CurrentPageIndex".to_string(), Value::from(page));
    model.insert("ItemsOnCurrentPage".to_string(), Value::Array(items));
    model.insert("MaxPageIndex".to_string(), Value::from(max_page));
    Ok(Value::Object(model))
}

/// Render the grid template against `model` and make the result the
/// children of `target`.
pub fn render_into(
    doc: &mut Document,
    target: NodeId,
    model: Value,
    options: &RenderOptions,
    evaluator: &dyn Evaluator,
) -> Result<(), RenderError> {
    // the built-in template is written in the default dialect
    let defaults = RenderOptions::default();
    let options = RenderOptions {
        attribute: defaults.attribute,
        virtual_tag: defaults.virtual_tag,
        ..options.clone()
    };
    let mut grid = Document::parse(GRID_TEMPLATE)?;
    let root = grid.root();
    bind_document(&mut grid, root, Some(model), &options, evaluator)?;

    let children = grid
        .children(root)
        .iter()
        .map(|&c| doc.import(&grid, c))
        .collect();
    doc.replace_children(target, children);
    Ok(())
}
