use serde_json::{Map, Value};

enum Mask {
    /// Keeps the first character of the local part and the domain.
    Email,
    /// Keeps the last two characters.
    Document,
    Secret,
}

fn classify(key: &str) -> Option<Mask> {
    match key.to_ascii_lowercase().as_str() {
        "email" | "customer_email" => Some(Mask::Email),
        "taxid" | "tax_id" | "cpf" | "phone" => Some(Mask::Document),
        "password" | "secret" | "token" | "api_key" | "authorization" | "signature" => {
            Some(Mask::Secret)
        }
        _ => None,
    }
}

/// Masks buyer personal data and credentials in a JSON payload before it is logged.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let sanitized = match classify(key) {
                        Some(mask) => apply(&mask, val),
                        None => sanitize_json(val),
                    };
                    (key.clone(), sanitized)
                })
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

fn apply(mask: &Mask, value: &Value) -> Value {
    let Value::String(text) = value else {
        return Value::String("****".to_string());
    };

    let masked = match mask {
        Mask::Email => match text.split_once('@') {
            Some((local, domain)) if !local.is_empty() => {
                let first: String = local.chars().take(1).collect();
                format!("{}***@{}", first, domain)
            }
            _ => "****".to_string(),
        },
        Mask::Document => {
            let count = text.chars().count();
            if count <= 2 {
                "****".to_string()
            } else {
                let tail: String = text.chars().skip(count - 2).collect();
                format!("{}{}", "*".repeat(count - 2), tail)
            }
        }
        Mask::Secret => "****".to_string(),
    };
    Value::String(masked)
}
