//! Four-function calculator.
//!
//! Operations chain left to right with no precedence: pressing an operator
//! while another is pending first resolves the pending one against the
//! displayed value. Division by zero (or any non-finite result) shows
//! [`ERROR_DISPLAY`], and only [`Key::Clear`] leaves that state.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ERROR_DISPLAY: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operator {
    /// `None` when the result is not a finite number.
    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        let result = match self {
            Self::Add => lhs + rhs,
            Self::Subtract => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide if rhs == 0.0 => return None,
            Self::Divide => lhs / rhs,
        };
        result.is_finite().then_some(result)
    }
}

/// A calculator button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Decimal,
    Operator(Operator),
    Equals,
    Clear,
    ToggleSign,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown calculator key: {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.trim() {
            "." => Self::Decimal,
            "+" => Self::Operator(Operator::Add),
            "-" => Self::Operator(Operator::Subtract),
            "*" | "x" | "×" => Self::Operator(Operator::Multiply),
            "/" | "÷" => Self::Operator(Operator::Divide),
            "=" => Self::Equals,
            "C" | "c" => Self::Clear,
            "+/-" | "±" => Self::ToggleSign,
            "%" => Self::Percent,
            other => match other.as_bytes() {
                [d @ b'0'..=b'9'] => Self::Digit(d - b'0'),
                _ => return Err(UnknownKey(s.to_string())),
            },
        };
        Ok(key)
    }
}

/// Shortest decimal rendering, `None` for non-finite values.
fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        return Some("0".to_string());
    }
    Some(value.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calculator {
    display: String,
    pending_operator: Option<Operator>,
    previous_operand: Option<f64>,
    awaiting_operand: bool,
}

impl Default for Calculator {
    fn default() -> Self {
        Self {
            display: "0".to_string(),
            pending_operator: None,
            previous_operand: None,
            awaiting_operand: false,
        }
    }
}

impl Calculator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    #[must_use]
    pub fn pending_operator(&self) -> Option<Operator> {
        self.pending_operator
    }

    #[must_use]
    pub fn previous_operand(&self) -> Option<f64> {
        self.previous_operand
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.display == ERROR_DISPLAY
    }

    /// Apply one key press and return the new display.
    pub fn press(&mut self, key: Key) -> &str {
        if self.is_error() && key != Key::Clear {
            return &self.display;
        }

        match key {
            Key::Digit(d) => self.input(char::from(b'0' + d.min(9))),
            Key::Decimal => self.input('.'),
            Key::Operator(op) => self.operator(op),
            Key::Equals => self.equals(),
            Key::Clear => *self = Self::default(),
            Key::ToggleSign => self.toggle_sign(),
            Key::Percent => match format_number(self.current() / 100.0) {
                Some(display) => self.display = display,
                None => self.fail(),
            },
        }
        &self.display
    }

    fn current(&self) -> f64 {
        self.display.parse().unwrap_or(0.0)
    }

    fn input(&mut self, c: char) {
        if self.awaiting_operand {
            self.display = if c == '.' { "0.".to_string() } else { c.to_string() };
            self.awaiting_operand = false;
            return;
        }
        if c == '.' && self.display.contains('.') {
            return;
        }
        if self.display == "0" && c != '.' {
            self.display = c.to_string();
        } else {
            self.display.push(c);
        }
    }

    fn operator(&mut self, op: Operator) {
        // No operand typed since the last operator: just swap the operator.
        if self.awaiting_operand && self.pending_operator.is_some() {
            self.pending_operator = Some(op);
            return;
        }

        let current = self.current();
        match (self.pending_operator, self.previous_operand) {
            (Some(pending), Some(previous)) => {
                let Some(result) = pending.apply(previous, current) else {
                    self.fail();
                    return;
                };
                self.previous_operand = Some(result);
                self.display = format_number(result).unwrap_or_else(|| ERROR_DISPLAY.to_string());
            }
            _ => self.previous_operand = Some(current),
        }
        self.pending_operator = Some(op);
        self.awaiting_operand = true;
    }

    fn equals(&mut self) {
        let (Some(pending), Some(previous)) = (self.pending_operator, self.previous_operand) else {
            return;
        };
        match pending.apply(previous, self.current()).and_then(format_number) {
            Some(display) => {
                self.display = display;
                self.pending_operator = None;
                self.previous_operand = None;
                self.awaiting_operand = true;
            }
            None => self.fail(),
        }
    }

    fn toggle_sign(&mut self) {
        if self.current() == 0.0 {
            return;
        }
        if let Some(positive) = self.display.strip_prefix('-') {
            self.display = positive.to_string();
        } else {
            self.display.insert(0, '-');
        }
    }

    fn fail(&mut self) {
        tracing::debug!(name: "calculator.error", "Calculation produced no finite result");
        self.display = ERROR_DISPLAY.to_string();
        self.pending_operator = None;
        self.previous_operand = None;
        self.awaiting_operand = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(keys: &str) -> Calculator {
        let mut calc = Calculator::new();
        for key in keys.split_whitespace() {
            calc.press(key.parse().unwrap());
        }
        calc
    }

    #[test]
    fn test_addition() {
        assert_eq!(run("7 + 3 =").display(), "10");
    }

    #[test]
    fn test_division_by_zero_is_sticky_until_clear() {
        let mut calc = run("5 / 0 =");
        assert_eq!(calc.display(), "Error");

        calc.press(Key::Digit(4));
        calc.press(Key::Operator(Operator::Add));
        calc.press(Key::Equals);
        assert_eq!(calc.display(), "Error");

        calc.press(Key::Clear);
        assert_eq!(calc, Calculator::new());
    }

    #[test]
    fn test_clear_resets_pending_state() {
        let calc = run("9 * 8 C");
        assert_eq!(calc.display(), "0");
        assert_eq!(calc.pending_operator(), None);
        assert_eq!(calc.previous_operand(), None);
    }

    #[test]
    fn test_chained_operators_evaluate_left_to_right() {
        let mut calc = run("2 + 3 *");
        assert_eq!(calc.display(), "5");
        calc.press(Key::Digit(4));
        calc.press(Key::Equals);
        assert_eq!(calc.display(), "20");
    }

    #[test]
    fn test_operator_replaced_before_second_operand() {
        assert_eq!(run("7 + - 2 =").display(), "5");
    }

    #[test]
    fn test_digit_entry() {
        assert_eq!(run("0 0 7").display(), "7");
        assert_eq!(run("1 . . 5").display(), "1.5");
        assert_eq!(run("3 + .").display(), "0.");
    }

    #[test]
    fn test_new_number_after_equals() {
        assert_eq!(run("7 + 3 = 2").display(), "2");
        assert_eq!(run("7 + 3 = + 5 =").display(), "15");
    }

    #[test]
    fn test_sign_and_percent() {
        assert_eq!(run("5 +/-").display(), "-5");
        assert_eq!(run("5 +/- +/-").display(), "5");
        assert_eq!(run("0 +/-").display(), "0");
        assert_eq!(run("3 + 5 +/- =").display(), "-2");
        assert_eq!(run("5 0 %").display(), "0.5");
    }

    #[test]
    fn test_decimal_arithmetic() {
        assert_eq!(run("0 . 1 + 0 . 2 =").display(), "0.30000000000000004");
        assert_eq!(run("2 - 2 =").display(), "0");
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!("7".parse::<Key>(), Ok(Key::Digit(7)));
        assert_eq!("÷".parse::<Key>(), Ok(Key::Operator(Operator::Divide)));
        assert!("42".parse::<Key>().is_err());
        assert!("sqrt".parse::<Key>().is_err());
    }
}
