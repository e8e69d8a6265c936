//! JSON-like text rendering over the contract.
//!
//! Backends without a native text form render containers through here; the
//! output is stable for a given tree, which is all `Display` needs.

use core::fmt::Write as _;

use crate::contract::VariantValue;
use crate::format::SerializeOption;
use crate::kind::VariantKind;
use crate::scalar::Scalar;

/// Renders `value` as JSON-like text.
pub fn render(value: &dyn VariantValue, option: SerializeOption) -> String {
    let mut out = String::new();
    write_value(&mut out, value, option, 0);
    out
}

fn write_value(out: &mut String, value: &dyn VariantValue, option: SerializeOption, depth: usize) {
    match value.kind() {
        VariantKind::Null | VariantKind::Undefined => out.push_str("null"),
        VariantKind::Array => {
            let items = value.values();
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline(out, option, depth + 1);
                write_value(out, item.inner(), option, depth + 1);
            }
            newline(out, option, depth);
            out.push(']');
        }
        VariantKind::Object => {
            let entries = value.entries();
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline(out, option, depth + 1);
                write_string(out, key);
                out.push(':');
                if option == SerializeOption::Indented {
                    out.push(' ');
                }
                write_value(out, item.inner(), option, depth + 1);
            }
            newline(out, option, depth);
            out.push('}');
        }
        _ => match value.raw() {
            Some(scalar) => write_scalar(out, &scalar),
            None => out.push_str("null"),
        },
    }
}

fn write_scalar(out: &mut String, scalar: &Scalar) {
    match scalar {
        Scalar::Bool(_) | Scalar::Int(_) | Scalar::UInt(_) | Scalar::BigInt(_) | Scalar::Decimal(_) => {
            let _ = write!(out, "{scalar}");
        }
        Scalar::F32(v) if v.is_finite() => {
            let _ = write!(out, "{v}");
        }
        Scalar::F64(v) if v.is_finite() => {
            let _ = write!(out, "{v}");
        }
        other => write_string(out, &other.to_string()),
    }
}

pub(crate) fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn newline(out: &mut String, option: SerializeOption, depth: usize) {
    if option == SerializeOption::Indented {
        out.push('\n');
        for _ in 0..depth {
            out.push_str("  ");
        }
    }
}
