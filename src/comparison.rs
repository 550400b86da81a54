use serde_json::Value;

/// Loose equality used when matching a user-supplied value against a choice list.
/// Command-line values always arrive as strings, so `"2"` matches `2` and
/// `"true"` matches `true`.
pub fn same_choice(choice: &Value, candidate: &Value) -> bool {
    match (choice, candidate) {
        (Value::String(sa), Value::String(sb)) => sa == sb,
        (Value::Number(na), Value::Number(nb)) => {
            if let (Some(da), Some(db)) = (na.as_f64(), nb.as_f64()) {
                (da - db).abs() < f64::EPSILON
            } else {
                na == nb
            }
        }
        (Value::Number(na), Value::String(sb)) | (Value::String(sb), Value::Number(na)) => {
            match (na.as_f64(), sb.trim().parse::<f64>()) {
                (Some(da), Ok(db)) => (da - db).abs() < f64::EPSILON,
                _ => false,
            }
        }
        (Value::Bool(ba), Value::String(sb)) | (Value::String(sb), Value::Bool(ba)) => {
            sb.trim().parse::<bool>().map(|b| b == *ba).unwrap_or(false)
        }
        _ => choice == candidate,
    }
}
