use serde_json::Value;

/// Render a float the way tool text output expects it: the shortest digits
/// that round-trip, always with a fractional part or an exponent.
///
/// Fixed notation is used for decimal exponents in `-4..16`, scientific
/// notation with a signed two-digit exponent otherwise: `4.0`, `0.0001`,
/// `1e-05`, `1.5e+16`. Non-finite values render as `inf`, `-inf`, `nan`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        return text.to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `-1.2345e3`.
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    let body = if (-4..16).contains(&exponent) {
        fixed(&digits, exponent)
    } else {
        let (first, rest) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{first}e{exp_sign}{:02}", exponent.abs())
        } else {
            format!("{first}.{rest}e{exp_sign}{:02}", exponent.abs())
        }
    };
    format!("{sign}{body}")
}

/// Render a JSON value as it reads inside a message: `None`, `True`,
/// `False`, strings without quotes, integers digit for digit and other
/// numbers through [`format_float`]. Arrays and objects keep their JSON text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(text) => text.clone(),
        Value::Number(number) => {
            let text = number.to_string();
            if text.contains(['.', 'e', 'E']) {
                number.as_f64().map_or(text, format_float)
            } else {
                text
            }
        }
        other => other.to_string(),
    }
}

fn fixed(digits: &str, exponent: i32) -> String {
    if exponent < 0 {
        let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
        return format!("0.{zeros}{digits}");
    }
    let int_len = exponent.unsigned_abs() as usize + 1;
    if digits.len() > int_len {
        let (int_part, frac_part) = digits.split_at(int_len);
        format!("{int_part}.{frac_part}")
    } else {
        let padding = "0".repeat(int_len - digits.len());
        format!("{digits}{padding}.0")
    }
}
