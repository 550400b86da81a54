use crate::context::{ContextMapping, CONVENTIONAL_KEY};
use crate::errors::{Result, ScaffoldError};
use crate::render::Renderer;
use itertools::Itertools;
use serde_json::{json, Value};
use std::io::{BufRead, Write};

/// Resolve every variable declared under `cookiecutter`, asking on `input`
/// unless `no_input` is set. Returns the resolved variables (not wrapped).
///
/// String defaults are templates over the values resolved before them, so
/// `"repo_name": "{{ cookiecutter.project_name.lower() }}"` follows whatever
/// the user typed for `project_name`. Dict variables are handled last so they
/// can reference any simple variable.
pub fn prompt_for_config<R: BufRead, W: Write>(
    context: &ContextMapping,
    renderer: &Renderer,
    no_input: bool,
    input: &mut R,
    output: &mut W,
) -> Result<ContextMapping> {
    let declared = context
        .get(CONVENTIONAL_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| ScaffoldError::InvalidContext(format!("context has no `{CONVENTIONAL_KEY}` object")))?;

    let mut term = Terminal { input, output };
    let mut resolved = ContextMapping::new();

    for (key, raw) in declared {
        if key.starts_with("__") {
            let value = render_variable(renderer, key, raw, &resolved)?;
            resolved.insert(key.clone(), value);
            continue;
        }
        if key.starts_with('_') {
            resolved.insert(key.clone(), raw.clone());
            continue;
        }

        let value = match raw {
            Value::Object(_) => continue,
            Value::Array(items) => {
                let choices = items
                    .iter()
                    .map(|item| render_variable(renderer, key, item, &resolved))
                    .collect::<Result<Vec<_>>>()?;
                if choices.is_empty() {
                    return Err(ScaffoldError::InvalidContext(format!("choice variable `{key}` has no choices")));
                }
                if no_input {
                    choices[0].clone()
                } else {
                    term.read_choice(key, &choices)?
                }
            }
            Value::Bool(default) => {
                if no_input {
                    Value::Bool(*default)
                } else {
                    Value::Bool(term.read_yes_no(key, *default)?)
                }
            }
            _ => {
                let default = render_variable(renderer, key, raw, &resolved)?;
                if no_input {
                    default
                } else {
                    term.read_variable(key, default)?
                }
            }
        };
        resolved.insert(key.clone(), value);
    }

    for (key, raw) in declared {
        if key.starts_with('_') || !raw.is_object() {
            continue;
        }
        let default = render_variable(renderer, key, raw, &resolved)?;
        let value = if no_input { default } else { term.read_dict(key, default)? };
        resolved.insert(key.clone(), value);
    }

    Ok(resolved)
}

/// Render string leaves of `raw` against the variables resolved so far.
pub fn render_variable(
    renderer: &Renderer,
    name: &str,
    raw: &Value,
    resolved: &ContextMapping,
) -> Result<Value> {
    match raw {
        Value::String(s) => {
            let ctx = json!({ CONVENTIONAL_KEY: resolved });
            Ok(Value::String(renderer.render(name, s, &ctx)?))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| render_variable(renderer, name, item, resolved))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let ctx = json!({ CONVENTIONAL_KEY: resolved });
            let mut out = ContextMapping::new();
            for (k, v) in map {
                let key = renderer.render(name, k, &ctx)?;
                out.insert(key, render_variable(renderer, name, v, resolved)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

struct Terminal<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Terminal<'_, R, W> {
    /// `None` on end of input, which callers treat as "accept the default".
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{question}").map_err(|e| ScaffoldError::io("<stdout>", e))?;
        self.output.flush().map_err(|e| ScaffoldError::io("<stdout>", e))?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line).map_err(|e| ScaffoldError::io("<stdin>", e))?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn complain(&mut self, msg: &str) -> Result<()> {
        writeln!(self.output, "Error: {msg}").map_err(|e| ScaffoldError::io("<stdout>", e))
    }

    fn read_variable(&mut self, key: &str, default: Value) -> Result<Value> {
        let shown = match &default {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match self.ask(&format!("{key} [{shown}]: "))? {
            Some(answer) if !answer.is_empty() => Ok(Value::String(answer)),
            _ => Ok(default),
        }
    }

    fn read_yes_no(&mut self, key: &str, default: bool) -> Result<bool> {
        let shown = if default { "y" } else { "n" };
        loop {
            let Some(answer) = self.ask(&format!("{key} (y/n) [{shown}]: "))? else {
                return Ok(default);
            };
            match answer.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" | "true" | "1" | "on" => return Ok(true),
                "n" | "no" | "false" | "0" | "off" => return Ok(false),
                _ => self.complain("please answer y or n")?,
            }
        }
    }

    fn read_choice(&mut self, key: &str, choices: &[Value]) -> Result<Value> {
        let listing = choices
            .iter()
            .enumerate()
            .map(|(i, c)| match c {
                Value::String(s) => format!("{} - {s}", i + 1),
                other => format!("{} - {other}", i + 1),
            })
            .join("\n");
        let numbers = (1..=choices.len()).join(", ");
        loop {
            let question = format!("Select {key}:\n{listing}\nChoose from {numbers} [1]: ");
            let Some(answer) = self.ask(&question)? else {
                return Ok(choices[0].clone());
            };
            if answer.is_empty() {
                return Ok(choices[0].clone());
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=choices.len()).contains(&n) => return Ok(choices[n - 1].clone()),
                _ => self.complain(&format!("`{answer}` is not one of {numbers}"))?,
            }
        }
    }

    fn read_dict(&mut self, key: &str, default: Value) -> Result<Value> {
        loop {
            let Some(answer) = self.ask(&format!("{key} (JSON object) [default]: "))? else {
                return Ok(default);
            };
            if answer.is_empty() || answer == "default" {
                return Ok(default);
            }
            match serde_json::from_str::<Value>(&answer) {
                Ok(v @ Value::Object(_)) => return Ok(v),
                Ok(_) => self.complain("expected a JSON object")?,
                Err(e) => self.complain(&format!("invalid JSON: {e}"))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn context(vars: Value) -> ContextMapping {
        let mut ctx = ContextMapping::new();
        ctx.insert(CONVENTIONAL_KEY.to_string(), vars);
        ctx
    }

    fn run(vars: Value, no_input: bool, answers: &str) -> (Value, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let resolved =
            prompt_for_config(&context(vars), &Renderer::new(), no_input, &mut input, &mut output).unwrap();
        (Value::Object(resolved), String::from_utf8(output).unwrap())
    }

    #[test]
    fn no_input_renders_defaults_in_order() {
        let vars = json!({
            "project_name": "Disco Pie",
            "repo_name": "{{ cookiecutter.project_name.lower().replace(' ', '-') }}",
            "license": ["MIT", "BSD-3"],
            "use_docker": true,
            "port": 5000
        });
        let (resolved, out) = run(vars, true, "");
        assert_eq!(
            resolved,
            json!({
                "project_name": "Disco Pie",
                "repo_name": "disco-pie",
                "license": "MIT",
                "use_docker": true,
                "port": 5000
            })
        );
        assert!(out.is_empty());
    }

    #[test]
    fn private_variables_are_not_prompted() {
        let vars = json!({
            "name": "svc",
            "_copy_without_render": ["*.html"],
            "__slug": "{{ cookiecutter.name.upper() }}"
        });
        let (resolved, out) = run(vars, false, "\n");
        assert_eq!(resolved["_copy_without_render"], json!(["*.html"]));
        assert_eq!(resolved["__slug"], json!("SVC"));
        assert_eq!(out, "name [svc]: ");
    }

    #[test]
    fn answers_feed_later_defaults() {
        let vars = json!({
            "service_name": "hello",
            "module": "{{ cookiecutter.service_name.replace('-', '_') }}"
        });
        let (resolved, _) = run(vars, false, "order-api\n\n");
        assert_eq!(resolved, json!({"service_name": "order-api", "module": "order_api"}));
    }

    #[test]
    fn choice_by_index_with_retry() {
        let vars = json!({"license": ["MIT", "BSD-3", "Apache-2.0"]});
        let (resolved, out) = run(vars, false, "9\n3\n");
        assert_eq!(resolved["license"], json!("Apache-2.0"));
        assert!(out.contains("3 - Apache-2.0"));
        assert!(out.contains("Error: `9` is not one of 1, 2, 3"));
    }

    #[test]
    fn yes_no_answers() {
        let vars = json!({"use_docker": true, "use_lambda": false});
        let (resolved, _) = run(vars, false, "no\nmaybe\ny\n");
        assert_eq!(resolved, json!({"use_docker": false, "use_lambda": true}));
    }

    #[test]
    fn dict_variables_resolve_after_simple_ones() {
        let vars = json!({
            "settings": {"name": "{{ cookiecutter.service }}"},
            "service": "orders"
        });
        let (resolved, _) = run(vars, true, "");
        assert_eq!(resolved["settings"], json!({"name": "orders"}));
    }

    #[test]
    fn end_of_input_keeps_defaults() {
        let vars = json!({"a": "x", "b": ["p", "q"], "c": false, "d": {"k": 1}});
        let (resolved, _) = run(vars, false, "");
        assert_eq!(resolved, json!({"a": "x", "b": "p", "c": false, "d": {"k": 1}}));
    }

    #[test]
    fn missing_conventional_key_is_rejected() {
        let mut ctx = ContextMapping::new();
        ctx.insert("cc-disco-pie".into(), json!({}));
        let err = prompt_for_config(&ctx, &Renderer::new(), true, &mut Cursor::new(Vec::<u8>::new()), &mut Vec::<u8>::new())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidContext(_)));
    }
}
