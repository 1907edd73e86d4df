//! Variable interpolation (C1).
//!
//! Resolves `${step.key}` placeholders inside a step's `variables` mapping
//! against the running [`ResultsMap`]. Pure over its inputs: no I/O, no
//! clock, no randomness, so it stays safe to call during workflow replay.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::model::ResultsMap;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"))
}

/// Renders a single `${dep.key}` placeholder's replacement value as it should
/// appear inlined into a string. Lists are rendered as a literal
/// `["item1", "item2"]` so a downstream CLI sees a list, not a Go/Rust debug
/// dump; everything else uses its canonical string form.
fn render_value(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(|item| format!("{:?}", scalar_str(item))).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn scalar_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Resolves every `${dep.key}` placeholder in `input` against `results`.
/// A placeholder whose `dep` or `key` is absent from `results` is left
/// verbatim — best-effort; the downstream executor observes the literal text.
pub fn interpolate(input: &str, results: &ResultsMap) -> String {
    placeholder_re()
        .replace_all(input, |caps: &regex::Captures| {
            let path = &caps[1];
            let Some((dep, key)) = path.split_once('.') else {
                return caps[0].to_string();
            };
            match results.get(dep).and_then(|output| output.get(key)) {
                Some(value) => render_value(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Applies [`interpolate`] to every string value in a step's `variables`
/// mapping, leaving non-string values untouched.
pub fn interpolate_variables(
    variables: &HashMap<String, Value>,
    results: &ResultsMap,
) -> HashMap<String, Value> {
    variables
        .iter()
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => Value::String(interpolate(s, results)),
                other => other.clone(),
            };
            (k.clone(), rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results_with(step: &str, fields: serde_json::Value) -> ResultsMap {
        let mut map = ResultsMap::new();
        map.insert(step, fields.as_object().unwrap().clone());
        map
    }

    #[test]
    fn no_placeholder_is_unchanged() {
        let results = ResultsMap::new();
        assert_eq!(interpolate("plain-value", &results), "plain-value");
    }

    #[test]
    fn scalar_substitution() {
        let results = results_with("A", json!({"vpc_id": "vpc-abc"}));
        assert_eq!(interpolate("${A.vpc_id}", &results), "vpc-abc");
    }

    #[test]
    fn list_substitution_preserves_list_shape() {
        let results = results_with("A", json!({"subnets": ["s1", "s2"]}));
        assert_eq!(interpolate("${A.subnets}", &results), r#"["s1", "s2"]"#);
    }

    #[test]
    fn missing_placeholder_left_verbatim() {
        let results = ResultsMap::new();
        assert_eq!(interpolate("${A.vpc_id}", &results), "${A.vpc_id}");
    }

    #[test]
    fn scenario_s2_full_variables_map() {
        let results = results_with(
            "A",
            json!({"vpc_id": "vpc-abc", "subnets": ["s1", "s2"]}),
        );
        let mut vars = HashMap::new();
        vars.insert("vpc".to_string(), json!("${A.vpc_id}"));
        vars.insert("subs".to_string(), json!("${A.subnets}"));

        let rendered = interpolate_variables(&vars, &results);
        assert_eq!(rendered["vpc"], json!("vpc-abc"));
        assert_eq!(rendered["subs"], json!(r#"["s1", "s2"]"#));
    }

    #[test]
    fn non_string_variables_pass_through_unchanged() {
        let results = ResultsMap::new();
        let mut vars = HashMap::new();
        vars.insert("count".to_string(), json!(3));
        vars.insert("flags".to_string(), json!(["a", "b"]));

        let rendered = interpolate_variables(&vars, &results);
        assert_eq!(rendered["count"], json!(3));
        assert_eq!(rendered["flags"], json!(["a", "b"]));
    }
}
