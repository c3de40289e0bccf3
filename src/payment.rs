use serde::Serialize;

use crate::event::CaptureResource;

pub const PROVIDER_PAYPAL: &str = "paypal";
pub const STATUS_COMPLETED: &str = "completed";

/// Row written to the `payments` table. Created once per processed event, never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub user_id: String,
    /// NaN when the provider sent a non-numeric amount; serialises as `null`.
    pub amount: f64,
    pub provider: &'static str,
    pub status: &'static str,
}

impl PaymentRecord {
    pub fn from_capture(resource: &CaptureResource) -> Self {
        Self {
            user_id: resource.payer_id.clone(),
            amount: parse_amount(&resource.amount.value),
            provider: PROVIDER_PAYPAL,
            status: STATUS_COMPLETED,
        }
    }
}

/// Reads the longest leading decimal literal and ignores trailing text (`"19.99 USD"` is 19.99).
/// No leading number at all gives NaN.
fn parse_amount(value: &str) -> f64 {
    let text = value.trim_start();

    let unsigned = text.strip_prefix(|c| c == '+' || c == '-').unwrap_or(text);
    if unsigned.starts_with("Infinity") {
        return if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    numeric_prefix(text).parse::<f64>().unwrap_or(f64::NAN)
}

fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if has_digits || frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }

    if !has_digits {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    &text[..end]
}
