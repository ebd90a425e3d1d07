//! Rule language parser.
//!
//! Recursive descent parser for scoring conditions and rule entries. Converts
//! text to AST with meaningful error messages including character offset,
//! expected/found tokens.
//!
//! ```text
//! entry     := condition "=>" weight
//!            | "FIRST" "(" condition "=>" weight ("," condition "=>" weight)* ")"
//! condition := ("ABOVE" | "BELOW" | "AT_LEAST" | "AT_MOST") "(" operand "," operand ")"
//!            | "RISING" "(" operand ")"
//!            | "FALLING" "(" operand "," integer ")"
//!            | ("CROSS_ABOVE" | "CROSS_BELOW") "(" operand "," operand "," integer ")"
//!            | ("AND" | "OR") "(" condition ("," condition)+ ")"
//!            | "NOT" "(" condition ")"
//! operand   := number | field ("[" integer "]")?
//! ```

use crate::domain::error::ParseError;
use crate::domain::rule::{Condition, Operand, RuleKind, Tier};
use crate::domain::snapshot::{Field, SNAPSHOT_DEPTH};

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn expect_arrow(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.remaining().starts_with("=>") {
            self.pos += 2;
            Ok(())
        } else {
            Err(ParseError {
                message: format!("expected '=>', found '{}'", self.peek_word()),
                position: self.pos,
            })
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && (remaining.len() == keyword.len()
                || !remaining[keyword.len()..]
                    .chars()
                    .next()
                    .map(|c| c.is_alphanumeric() || c == '_')
                    .unwrap_or(false))
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            let found = self.peek_word();
            Err(ParseError {
                message: format!("expected '{}', found '{}'", keyword, found),
                position: self.pos,
            })
        }
    }

    fn peek_word(&self) -> String {
        let mut word = String::new();
        for ch in self.remaining().chars() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
            } else {
                break;
            }
        }
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut digits = 0;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected integer".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<usize>().map_err(|_| ParseError {
            message: format!("invalid integer: {}", num_str),
            position: start,
        })
    }

    fn parse_weight(&mut self) -> Result<u32, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let value = self.parse_integer()?;
        u32::try_from(value).map_err(|_| ParseError {
            message: format!("weight out of range: {}", value),
            position: start,
        })
    }

    fn parse_field(&mut self) -> Result<Operand, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let word = self.peek_word();
        let field = word.parse::<Field>().map_err(|_| ParseError {
            message: format!("expected field name, found '{}'", word),
            position: start,
        })?;
        self.pos += word.len();

        let lag = if self.peek() == Some('[') {
            self.advance();
            self.skip_whitespace();
            let lag_pos = self.pos;
            let lag = self.parse_integer()?;
            if lag >= SNAPSHOT_DEPTH {
                return Err(ParseError {
                    message: format!(
                        "lag {} out of range, snapshot keeps {} candles",
                        lag, SNAPSHOT_DEPTH
                    ),
                    position: lag_pos,
                });
            }
            self.expect_char(']')?;
            lag
        } else {
            0
        };

        Ok(Operand::Field { field, lag })
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        self.skip_whitespace();

        if self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || ch == '-' || ch == '.')
        {
            let num = self.parse_number()?;
            return Ok(Operand::Constant(num));
        }

        self.parse_field()
    }

    fn parse_comparison(&mut self, keyword: &str) -> Result<Condition, ParseError> {
        self.expect_keyword(keyword)?;
        self.expect_char('(')?;

        let left = self.parse_operand()?;
        self.expect_char(',')?;
        let right = self.parse_operand()?;
        self.expect_char(')')?;

        match keyword {
            "ABOVE" => Ok(Condition::Above { left, right }),
            "BELOW" => Ok(Condition::Below { left, right }),
            "AT_LEAST" => Ok(Condition::AtLeast { left, right }),
            "AT_MOST" => Ok(Condition::AtMost { left, right }),
            _ => unreachable!(),
        }
    }

    fn parse_cross(&mut self, keyword: &str) -> Result<Condition, ParseError> {
        self.expect_keyword(keyword)?;
        self.expect_char('(')?;

        let left = self.parse_operand()?;
        self.expect_char(',')?;
        let right = self.parse_operand()?;
        self.expect_char(',')?;
        let window = self.parse_integer()?;
        self.expect_char(')')?;

        match keyword {
            "CROSS_ABOVE" => Ok(Condition::CrossAbove {
                left,
                right,
                window,
            }),
            "CROSS_BELOW" => Ok(Condition::CrossBelow {
                left,
                right,
                window,
            }),
            _ => unreachable!(),
        }
    }

    fn parse_rising(&mut self) -> Result<Condition, ParseError> {
        self.expect_keyword("RISING")?;
        self.expect_char('(')?;
        let operand = self.parse_operand()?;
        self.expect_char(')')?;
        Ok(Condition::Rising(operand))
    }

    fn parse_falling(&mut self) -> Result<Condition, ParseError> {
        self.expect_keyword("FALLING")?;
        self.expect_char('(')?;
        let operand = self.parse_operand()?;
        self.expect_char(',')?;
        let points = self.parse_integer()?;
        self.expect_char(')')?;
        Ok(Condition::Falling { operand, points })
    }

    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        self.skip_whitespace();

        for keyword in ["ABOVE", "BELOW", "AT_LEAST", "AT_MOST"] {
            if self.peek_keyword(keyword) {
                return self.parse_comparison(keyword);
            }
        }
        for keyword in ["CROSS_ABOVE", "CROSS_BELOW"] {
            if self.peek_keyword(keyword) {
                return self.parse_cross(keyword);
            }
        }
        if self.peek_keyword("RISING") {
            return self.parse_rising();
        }
        if self.peek_keyword("FALLING") {
            return self.parse_falling();
        }

        if self.peek_keyword("AND") {
            return self.parse_list("AND").map(Condition::And);
        }
        if self.peek_keyword("OR") {
            return self.parse_list("OR").map(Condition::Or);
        }
        if self.peek_keyword("NOT") {
            return self.parse_not();
        }

        let word = self.peek_word();
        Err(ParseError {
            message: format!("expected condition, found '{}'", word),
            position: self.pos,
        })
    }

    fn parse_list(&mut self, keyword: &str) -> Result<Vec<Condition>, ParseError> {
        self.expect_keyword(keyword)?;
        self.expect_char('(')?;

        let mut conditions = Vec::new();
        conditions.push(self.parse_condition()?);

        loop {
            self.skip_whitespace();
            if self.peek() == Some(')') {
                self.advance();
                break;
            }
            self.expect_char(',')?;
            conditions.push(self.parse_condition()?);
        }

        if conditions.len() < 2 {
            return Err(ParseError {
                message: format!("{} requires at least 2 conditions", keyword),
                position: self.pos,
            });
        }

        Ok(conditions)
    }

    fn parse_not(&mut self) -> Result<Condition, ParseError> {
        self.expect_keyword("NOT")?;
        self.expect_char('(')?;
        let condition = self.parse_condition()?;
        self.expect_char(')')?;
        Ok(Condition::Not(Box::new(condition)))
    }

    fn parse_tier(&mut self) -> Result<Tier, ParseError> {
        let condition = self.parse_condition()?;
        self.expect_arrow()?;
        let weight = self.parse_weight()?;
        Ok(Tier { condition, weight })
    }

    fn parse_entry(&mut self) -> Result<RuleKind, ParseError> {
        self.skip_whitespace();

        if self.consume_keyword("FIRST") {
            self.expect_char('(')?;
            let mut tiers = vec![self.parse_tier()?];
            loop {
                self.skip_whitespace();
                if self.peek() == Some(')') {
                    self.advance();
                    break;
                }
                self.expect_char(',')?;
                tiers.push(self.parse_tier()?);
            }
            return Ok(RuleKind::Tiered(tiers));
        }

        let Tier { condition, weight } = self.parse_tier()?;
        Ok(RuleKind::Weighted { condition, weight })
    }

    fn finish<T>(&mut self, value: T) -> Result<T, ParseError> {
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(ParseError {
                message: format!("unexpected input after rule: '{}'", self.remaining()),
                position: self.pos,
            });
        }
        Ok(value)
    }
}

/// Parse a single condition such as `ABOVE(adx, 19)`.
pub fn parse_condition(input: &str) -> Result<Condition, ParseError> {
    let mut parser = Parser::new(input);
    let condition = parser.parse_condition()?;
    parser.finish(condition)
}

/// Parse a rule entry: `CONDITION => WEIGHT` or `FIRST(CONDITION => W, ...)`.
pub fn parse_entry(input: &str) -> Result<RuleKind, ParseError> {
    let mut parser = Parser::new(input);
    let kind = parser.parse_entry()?;
    parser.finish(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(field: Field) -> Operand {
        Operand::field(field)
    }

    #[test]
    fn parse_above_constant() {
        let condition = parse_condition("ABOVE(adx, 19)").unwrap();
        assert_eq!(
            condition,
            Condition::Above {
                left: field(Field::Adx),
                right: Operand::Constant(19.0)
            }
        );
    }

    #[test]
    fn parse_comparisons_between_fields() {
        assert!(matches!(
            parse_condition("BELOW(conversion_line, ema3)").unwrap(),
            Condition::Below { .. }
        ));
        assert!(matches!(
            parse_condition("AT_LEAST(hist, 0)").unwrap(),
            Condition::AtLeast { .. }
        ));
        assert!(matches!(
            parse_condition("AT_MOST(rsi, 70.5)").unwrap(),
            Condition::AtMost { .. }
        ));
    }

    #[test]
    fn parse_negative_and_fractional_numbers() {
        let condition = parse_condition("ABOVE(macd, -0.5)").unwrap();
        assert_eq!(
            condition,
            Condition::Above {
                left: field(Field::Macd),
                right: Operand::Constant(-0.5)
            }
        );
    }

    #[test]
    fn parse_lagged_operand() {
        let condition = parse_condition("ABOVE(close, close[3])").unwrap();
        assert_eq!(
            condition,
            Condition::Above {
                left: field(Field::Close),
                right: Operand::Field {
                    field: Field::Close,
                    lag: 3
                }
            }
        );
    }

    #[test]
    fn parse_rising_and_falling() {
        assert_eq!(
            parse_condition("RISING(sma20)").unwrap(),
            Condition::Rising(field(Field::Sma20))
        );
        assert_eq!(
            parse_condition("FALLING(minus_di, 3)").unwrap(),
            Condition::Falling {
                operand: field(Field::MinusDi),
                points: 3
            }
        );
    }

    #[test]
    fn parse_cross_with_window() {
        assert_eq!(
            parse_condition("CROSS_ABOVE(macd, signal, 5)").unwrap(),
            Condition::CrossAbove {
                left: field(Field::Macd),
                right: field(Field::Signal),
                window: 5
            }
        );
        assert!(matches!(
            parse_condition("CROSS_BELOW(macd, signal, 2)").unwrap(),
            Condition::CrossBelow { window: 2, .. }
        ));
    }

    #[test]
    fn parse_boolean_combinators() {
        match parse_condition("OR(RISING(plus_di), RISING(adx))").unwrap() {
            Condition::Or(children) => assert_eq!(children.len(), 2),
            other => panic!("expected Or, got {other:?}"),
        }
        match parse_condition("AND(BELOW(macd, hist), ABOVE(macd, 0), NOT(RISING(hist)))")
            .unwrap()
        {
            Condition::And(children) => {
                assert_eq!(children.len(), 3);
                assert!(matches!(children[2], Condition::Not(_)));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn parse_weighted_entry() {
        let kind = parse_entry("ABOVE(adx, 19) => 5").unwrap();
        assert_eq!(
            kind,
            RuleKind::Weighted {
                condition: Condition::above(Field::Adx, 19.0),
                weight: 5
            }
        );
    }

    #[test]
    fn parse_tiered_entry() {
        let kind = parse_entry(
            "FIRST(CROSS_ABOVE(macd, signal, 3) => 25, CROSS_ABOVE(macd, signal, 5) => 15, \
             CROSS_ABOVE(macd, signal, 7) => 10)",
        )
        .unwrap();
        match kind {
            RuleKind::Tiered(tiers) => {
                let weights: Vec<u32> = tiers.iter().map(|t| t.weight).collect();
                assert_eq!(weights, vec![25, 15, 10]);
                assert_eq!(
                    tiers[1].condition,
                    Condition::cross_above(Field::Macd, Field::Signal, 5)
                );
            }
            other => panic!("expected Tiered, got {other:?}"),
        }
    }

    #[test]
    fn display_round_trips_through_parser() {
        let source = "AND(ABOVE(conversion_line, sma3), ABOVE(conversion_line, ema5), \
                      ABOVE(conversion_line, sma6))";
        let condition = parse_condition(source).unwrap();
        assert_eq!(parse_condition(&condition.to_string()).unwrap(), condition);
    }

    #[test]
    fn field_names_are_case_insensitive() {
        assert_eq!(
            parse_condition("ABOVE(ADX, 19)").unwrap(),
            Condition::above(Field::Adx, 19.0)
        );
    }

    #[test]
    fn error_unknown_field() {
        let err = parse_condition("ABOVE(volume, 10)").unwrap_err();
        assert_eq!(err.position, 6);
        assert!(err.message.contains("expected field name"));
    }

    #[test]
    fn error_unknown_keyword() {
        let err = parse_condition("BETWEEN(rsi, 30, 70)").unwrap_err();
        assert_eq!(err.position, 0);
        assert!(err.message.contains("expected condition"));
    }

    #[test]
    fn error_missing_weight() {
        let err = parse_entry("ABOVE(adx, 19)").unwrap_err();
        assert!(err.message.contains("'=>'"));

        let err = parse_entry("ABOVE(adx, 19) =>").unwrap_err();
        assert!(err.message.contains("expected integer"));
    }

    #[test]
    fn error_lag_beyond_snapshot() {
        let err = parse_entry("RISING(adx[18446744073709551615]) => 5").unwrap_err();
        assert_eq!(err.position, 11);
        assert!(err.message.contains("out of range"));

        let err = parse_condition("ABOVE(close, close[10])").unwrap_err();
        assert!(err.message.contains("lag 10"));
        assert!(parse_condition("ABOVE(close, close[9])").is_ok());
    }

    #[test]
    fn error_single_child_and() {
        let err = parse_condition("AND(ABOVE(adx, 19))").unwrap_err();
        assert!(err.message.contains("at least 2"));
    }

    #[test]
    fn error_trailing_input() {
        let err = parse_entry("ABOVE(adx, 19) => 5 extra").unwrap_err();
        assert!(err.message.contains("unexpected input"));
    }

    #[test]
    fn error_context_caret() {
        let input = "ABOVE(adx 19)";
        let err = parse_condition(input).unwrap_err();
        let rendered = err.display_with_context(input);
        assert!(rendered.contains("         ^"));
        assert!(rendered.contains("expected ','"));
    }
}
