use crate::commands::Out;
use crate::model::{format_amount, format_amount_str, parse_amount};
use crate::Result;
use serde::Serialize;

/// Both renderings of one amount.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AmountOut {
    input: String,
    /// Plain decimal, e.g. `1234.5`.
    value: String,
    /// Display form, e.g. `1.234,50`.
    formatted: String,
}

impl AmountOut {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn formatted(&self) -> &str {
        &self.formatted
    }
}

/// Parses user-typed text. Text that is not a valid amount parses as zero.
pub fn amount_parse(text: &str) -> Result<Out<AmountOut>> {
    let value = parse_amount(text);
    let out = AmountOut {
        input: text.to_string(),
        value: value.to_string(),
        formatted: format_amount(value),
    };
    Ok(Out::new(out.value.clone(), out))
}

/// Formats a plain decimal such as `1234.5`. Text that is not a number formats as empty.
pub fn amount_format(value: &str) -> Result<Out<AmountOut>> {
    let formatted = format_amount_str(value);
    let out = AmountOut {
        input: value.to_string(),
        value: value.trim().to_string(),
        formatted: formatted.clone(),
    };
    Ok(Out::new(formatted, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parse() {
        let out = amount_parse(" 1.234,56 ").unwrap();
        assert_eq!(out.message(), "1234.56");
        assert_eq!(out.structure().unwrap().formatted(), "1.234,56");

        let out = amount_parse("abc").unwrap();
        assert_eq!(out.message(), "0");
    }

    #[test]
    fn test_amount_format() {
        assert_eq!(amount_format("1234.5").unwrap().message(), "1.234,50");
        assert_eq!(amount_format("").unwrap().message(), "");
        assert_eq!(amount_format("n/a").unwrap().message(), "");
    }
}
