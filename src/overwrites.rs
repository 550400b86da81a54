use crate::comparison::same_choice;
use crate::context::ContextMapping;
use crate::errors::{Result, ScaffoldError};
use serde_json::Value;
use tracing::debug;

/// Apply user-supplied values on top of a template's declared variables.
///
/// Variables the template does not declare are dropped: a stray key in a user
/// config must not leak into the rendering context.
pub fn apply_overwrites(context: &mut ContextMapping, overwrites: &ContextMapping) -> Result<()> {
    for (variable, overwrite) in overwrites {
        let Some(current) = context.get_mut(variable) else {
            debug!(variable = %variable, "ignoring overwrite for undeclared variable");
            continue;
        };

        match (current, overwrite) {
            // A list overwriting a choice variable replaces the choices.
            (Value::Array(choices), Value::Array(replacement)) => {
                *choices = replacement.clone();
            }
            (Value::Array(choices), value) => {
                let Some(pos) = choices.iter().position(|c| same_choice(c, value)) else {
                    return Err(ScaffoldError::InvalidOverwrite {
                        variable: variable.clone(),
                        value: display_value(value),
                    });
                };
                // The default of a choice variable is its first entry.
                let chosen = choices.remove(pos);
                choices.insert(0, chosen);
            }
            (Value::Object(nested), Value::Object(nested_overwrites)) => {
                apply_overwrites(nested, nested_overwrites)?;
            }
            (slot, value) => *slot = value.clone(),
        }
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
