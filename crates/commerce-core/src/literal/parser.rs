use chumsky::prelude::*;
use serde_json::{Map, Value};

use super::tokens::{Number, Token};

/// Value parser over the spanned token stream produced by the lexer.
pub(crate) fn value_parser() -> impl Parser<Token, Value, Error = Simple<Token>> {
    recursive(|value| {
        let number = select! { Token::Num(Number(n)) => n };
        let signed = choice::<_, Simple<Token>>((
            just(Token::Minus).ignore_then(number.clone()).map(|n| -n),
            just(Token::Plus).ignore_then(number.clone()),
            number.clone(),
        ))
        .map(number_value);

        let string = select! { Token::Str(s) => Value::String(s) };

        // Minifiers write `!0` for true and `!1` for false.
        let negated = just(Token::Bang).ignore_then(filter_map(|span, tok: Token| match tok {
            Token::Num(Number(n)) => Ok(Value::Bool(n == 0.0)),
            Token::Ident(id) if id == "true" || id == "false" => Ok(Value::Bool(id == "false")),
            _ => Err(Simple::custom(span, "unsupported '!' expression")),
        }));

        let void = just(Token::Ident("void".to_string()))
            .ignore_then(number.clone())
            .to(Value::Null);

        // null, undefined, NaN, Infinity and references to other bindings
        let ident = select! { Token::Ident(id) => match id.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Null,
        } };

        let key_name = select! {
            Token::Str(s) => s,
            Token::Ident(s) => s,
            Token::Num(Number(n)) => number_key(n),
        };
        let key = choice::<_, Simple<Token>>((
            select! {
                Token::Str(s) => (s, false),
                Token::Ident(s) => (s, true),
                Token::Num(Number(n)) => (number_key(n), false),
            },
            key_name
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(|k| (k, false)),
        ));

        // `None` is a spread, which contributes nothing.
        let property = choice::<_, Simple<Token>>((
            just(Token::Ellipsis).ignore_then(value.clone()).to(None),
            key.clone()
                .then_ignore(just(Token::Colon))
                .then(value.clone())
                .map(|((k, _), v)| Some((k, v))),
            key.try_map(|(k, shorthand), span| {
                if shorthand {
                    Ok(Some((k, Value::Null)))
                } else {
                    Err(Simple::custom(span, "expected ':' after property key"))
                }
            }),
        ));
        let object = property
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map(|props: Vec<Option<(String, Value)>>| {
                Value::Object(props.into_iter().flatten().collect::<Map<_, _>>())
            });

        let element = choice::<_, Simple<Token>>((
            just(Token::Ellipsis).ignore_then(value.clone()).to(None),
            value.clone().map(Some),
        ));
        // Empty slots are elisions (`[a,,b]`); the last one is a trailing comma.
        let array = element
            .or_not()
            .separated_by(just(Token::Comma))
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(|mut slots: Vec<Option<Option<Value>>>| {
                if matches!(slots.last(), Some(None)) {
                    slots.pop();
                }
                Value::Array(
                    slots
                        .into_iter()
                        .filter_map(|slot| match slot {
                            Some(Some(v)) => Some(v),
                            Some(None) => None,
                            None => Some(Value::Null),
                        })
                        .collect(),
                )
            });

        choice::<_, Simple<Token>>((object, array, signed, string, negated, void, ident))
    })
    .then_ignore(end())
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}
