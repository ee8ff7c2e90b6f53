//! Starting-wealth formula evaluation
//!
//! Supports the subset of dice syntax used by wealth formulas:
//! `NdM`, integers, `+`, `-`, `*` (or `x`), parentheses, and an optional
//! trailing denomination (`5d4 * 10 gp`). Without a denomination the result
//! is in gold.

use rand::Rng;

use crate::domain::value_objects::{Currency, Denomination};

const MAX_DICE: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("Empty formula")]
    Empty,
    #[error("Unexpected '{0}' in formula")]
    UnexpectedChar(char),
    #[error("Unexpected end of formula")]
    UnexpectedEnd,
    #[error("Unknown denomination '{0}'")]
    UnknownDenomination(String),
    #[error("Invalid dice term: {0}")]
    InvalidDice(String),
    #[error("Formula evaluated to a negative amount ({0})")]
    Negative(i64),
    #[error("Formula result is too large")]
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(u64),
    Dice,
    Plus,
    Minus,
    Times,
    Open,
    Close,
}

/// Roll a wealth formula into a currency bundle
pub fn roll_wealth<R: Rng>(formula: &str, rng: &mut R) -> Result<Currency, FormulaError> {
    let (expression, denomination) = split_denomination(formula)?;
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        rng,
    };
    let total = parser.expression()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(FormulaError::UnexpectedChar(token_char(*token)));
    }
    if total < 0 {
        return Err(FormulaError::Negative(total));
    }
    Ok(Currency::of(denomination, total as u64))
}

fn split_denomination(formula: &str) -> Result<(&str, Denomination), FormulaError> {
    let trimmed = formula.trim();
    let suffix_start = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let suffix = &trimmed[suffix_start..];
    // a bare trailing `d` belongs to the dice syntax, not a denomination
    if suffix.is_empty() || suffix.eq_ignore_ascii_case("d") {
        return Ok((trimmed, Denomination::Gp));
    }
    suffix
        .parse::<Denomination>()
        .map(|d| (&trimmed[..suffix_start], d))
        .map_err(|_| FormulaError::UnknownDenomination(suffix.to_string()))
}

fn tokenize(input: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' => {
                let mut value: u64 = 0;
                while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(digit as u64))
                        .ok_or_else(|| FormulaError::InvalidDice(input.to_string()))?;
                    chars.next();
                }
                tokens.push(Token::Number(value));
            }
            'd' | 'D' => {
                chars.next();
                tokens.push(Token::Dice);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' | 'x' | 'X' | '×' => {
                chars.next();
                tokens.push(Token::Times);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            other => return Err(FormulaError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

fn token_char(token: Token) -> char {
    match token {
        Token::Number(_) => '#',
        Token::Dice => 'd',
        Token::Plus => '+',
        Token::Minus => '-',
        Token::Times => '*',
        Token::Open => '(',
        Token::Close => ')',
    }
}

struct Parser<'a, R: Rng> {
    tokens: &'a [Token],
    pos: usize,
    rng: &'a mut R,
}

impl<R: Rng> Parser<'_, R> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> Result<i64, FormulaError> {
        let mut total = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            total = if op == Token::Plus {
                total.checked_add(rhs)
            } else {
                total.checked_sub(rhs)
            }
            .ok_or(FormulaError::Overflow)?;
        }
        Ok(total)
    }

    fn term(&mut self) -> Result<i64, FormulaError> {
        let mut total = self.factor()?;
        while let Some(Token::Times) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            total = total.checked_mul(rhs).ok_or(FormulaError::Overflow)?;
        }
        Ok(total)
    }

    fn factor(&mut self) -> Result<i64, FormulaError> {
        match self.next() {
            Some(Token::Open) => {
                let value = self.expression()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    Some(other) => Err(FormulaError::UnexpectedChar(token_char(other))),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Some(Token::Number(count)) => {
                if let Some(Token::Dice) = self.peek() {
                    self.pos += 1;
                    self.dice(count)
                } else {
                    i64::try_from(count).map_err(|_| FormulaError::Overflow)
                }
            }
            Some(Token::Dice) => self.dice(1),
            Some(other) => Err(FormulaError::UnexpectedChar(token_char(other))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn dice(&mut self, count: u64) -> Result<i64, FormulaError> {
        let faces = match self.next() {
            Some(Token::Number(faces)) => faces,
            Some(other) => return Err(FormulaError::UnexpectedChar(token_char(other))),
            None => return Err(FormulaError::UnexpectedEnd),
        };
        if count == 0 || faces == 0 || count > MAX_DICE {
            return Err(FormulaError::InvalidDice(format!("{count}d{faces}")));
        }
        let faces = i64::try_from(faces).map_err(|_| FormulaError::Overflow)?;
        (0..count).try_fold(0i64, |total, _| {
            total
                .checked_add(self.rng.gen_range(1..=faces))
                .ok_or(FormulaError::Overflow)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_flat_amount_defaults_to_gold() {
        assert_eq!(roll_wealth("50", &mut rng()), Ok(Currency::of(Denomination::Gp, 50)));
    }

    #[test]
    fn test_denomination_suffix() {
        assert_eq!(
            roll_wealth("15 sp", &mut rng()),
            Ok(Currency::of(Denomination::Sp, 15))
        );
    }

    #[test]
    fn test_dice_formula_within_bounds() {
        let mut rng = rng();
        for _ in 0..50 {
            let currency = roll_wealth("5d4 * 10", &mut rng).unwrap();
            assert!((50..=200).contains(&currency.gp), "rolled {}", currency.gp);
            assert_eq!(currency.gp % 10, 0);
        }
    }

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(roll_wealth("2 + 3 * 4", &mut rng()).unwrap().gp, 14);
        assert_eq!(roll_wealth("(2 + 3) x 4gp", &mut rng()).unwrap().gp, 20);
    }

    #[test]
    fn test_invalid_formulas() {
        assert_eq!(roll_wealth("", &mut rng()), Err(FormulaError::Empty));
        assert!(matches!(
            roll_wealth("4d", &mut rng()),
            Err(FormulaError::UnexpectedEnd)
        ));
        assert!(matches!(
            roll_wealth("10 zz", &mut rng()),
            Err(FormulaError::UnknownDenomination(_))
        ));
        assert_eq!(roll_wealth("1 - 5", &mut rng()), Err(FormulaError::Negative(-4)));
        assert!(matches!(
            roll_wealth("3 $", &mut rng()),
            Err(FormulaError::UnexpectedChar('$'))
        ));
    }

    #[test]
    fn test_oversized_formulas_report_overflow() {
        assert_eq!(
            roll_wealth("9999999999 * 9999999999", &mut rng()),
            Err(FormulaError::Overflow)
        );
        assert_eq!(
            roll_wealth("9223372036854775807 + 1", &mut rng()),
            Err(FormulaError::Overflow)
        );
        assert_eq!(
            roll_wealth("18446744073709551615", &mut rng()),
            Err(FormulaError::Overflow)
        );
        assert_eq!(
            roll_wealth("1000d9223372036854775807", &mut rng()),
            Err(FormulaError::Overflow)
        );
    }
}
