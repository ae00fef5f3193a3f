use kobind_expr::{
    Bindings, EvalError, Evaluator, ExprEvaluator, MemberCase, Translated, Utilities, translate,
};
use serde_json::{Value, json};

/// Scope frames innermost first, like a loop three levels deep.
fn run(raw: &str, frames: &[Value]) -> Result<Value, EvalError> {
    let translated = translate(raw, MemberCase::Pascal)?;
    let utilities = Utilities::new();
    let names: Vec<String> = translated
        .ancestors()
        .iter()
        .map(|k| Translated::ancestor_var(*k))
        .collect();
    let mut bindings = Bindings::new();
    bindings
        .bind("$data", &frames[0])
        .bind("$root", &frames[frames.len() - 1])
        .with_utilities(&utilities);
    for (name, k) in names.iter().zip(translated.ancestors()) {
        bindings.bind(name.as_str(), &frames[*k]);
    }
    ExprEvaluator.evaluate(translated.as_str(), &bindings)
}

fn frames() -> Vec<Value> {
    vec![
        json!({"Name": "leaf"}),
        json!({"Name": "middle"}),
        json!({"Name": "top", "Title": "Root"}),
    ]
}

#[test]
fn parent_forms_agree() {
    let frames = frames();
    let a = run("$parent.$parent.name", &frames).expect("eval");
    let b = run("$parents[2].name", &frames).expect("eval");
    assert_eq!(a, json!("top"));
    assert_eq!(a, b);
    assert_eq!(run("$parent.name", &frames).expect("eval"), json!("middle"));
}

#[test]
fn root_through_parents() {
    let frames = frames();
    assert_eq!(
        run("$parent.$root.title", &frames).expect("eval"),
        json!("Root")
    );
}

#[test]
fn string_literals_are_not_members() {
    let frames = frames();
    assert_eq!(
        run("'name: ' + name", &frames).expect("eval"),
        json!("name: leaf")
    );
}

#[test]
fn conditional_and_comparison() {
    let data = vec![json!({"Count": 3, "Limit": 2})];
    assert_eq!(
        run("count > limit ? 'over' : 'ok'", &data).expect("eval"),
        json!("over")
    );
    assert_eq!(run("count % 2 === 1", &data).expect("eval"), json!(true));
}

#[test]
fn object_literal_values_resolve() {
    let data = vec![json!({"Shade": "red", "Big": true})];
    assert_eq!(
        run("{ color: shade, bold: big && 'yes' }", &data).expect("eval"),
        json!({"color": "red", "bold": "yes"})
    );
}

#[test]
fn range_helper_after_translation() {
    let data = vec![json!({"MaxPageIndex": 2})];
    assert_eq!(
        run("ko.utils.range(0, maxPageIndex)", &data).expect("eval"),
        json!([0, 1, 2])
    );
}

#[test]
fn failures_are_errors() {
    let data = vec![json!({"A": 1})];
    assert!(matches!(
        run("noSuchField", &data),
        Err(EvalError::MissingMember { .. })
    ));
    assert!(matches!(run("a +", &data), Err(EvalError::Syntax { .. })));
    assert!(matches!(
        run("a / 0", &data),
        Err(EvalError::Arithmetic(_))
    ));
    assert!(matches!(
        run("$index", &data),
        Err(EvalError::UnknownVariable(_))
    ));
}
