use std::ops::Range;

use chumsky::prelude::*;

use super::tokens::{Number, Token};

pub(crate) fn lexer() -> impl Parser<char, Vec<(Token, Range<usize>)>, Error = Simple<char>> {
    let digit_run = filter(|c: &char| c.is_ascii_digit())
        .then(filter(|c: &char| c.is_ascii_digit() || *c == '_').repeated())
        .map(|(first, rest)| std::iter::once(first).chain(rest).collect::<String>());

    let radix = just('0')
        .ignore_then(choice::<_, Simple<char>>((
            one_of("xX").to(16),
            one_of("oO").to(8),
            one_of("bB").to(2),
        )))
        .then(
            filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
                .repeated()
                .at_least(1)
                .collect::<String>(),
        )
        .try_map(|(radix, digits): (u32, String), span| {
            u64::from_str_radix(&digits.replace('_', ""), radix)
                .map(|n| n as f64)
                .map_err(|_| Simple::custom(span, format!("invalid number literal '{digits}'")))
        });

    let mantissa = choice::<_, Simple<char>>((
        digit_run
            .clone()
            .then(just('.').ignore_then(digit_run.clone().or_not()).or_not())
            .map(|(int, frac)| match frac {
                Some(frac) => format!("{int}.{}", frac.unwrap_or_default()),
                None => int,
            }),
        just('.')
            .ignore_then(digit_run.clone())
            .map(|frac| format!("0.{frac}")),
    ));
    let exponent = one_of("eE")
        .ignore_then(one_of("+-").or_not())
        .then(text::digits(10))
        .map(|(sign, digits): (Option<char>, String)| format!("e{}{digits}", sign.unwrap_or('+')));
    let decimal = mantissa
        .then(exponent.or_not())
        .try_map(|(mantissa, exponent), span| {
            let text = format!("{}{}", mantissa.replace('_', ""), exponent.unwrap_or_default());
            text.parse::<f64>()
                .map_err(|_| Simple::custom(span, format!("invalid number literal '{text}'")))
        });

    let number = radix.or(decimal).map(|n| Token::Num(Number(n)));

    let hex = |count: usize| {
        filter(|c: &char| c.is_ascii_hexdigit())
            .repeated()
            .exactly(count)
            .collect::<String>()
            .try_map(|digits, span| {
                u32::from_str_radix(&digits, 16)
                    .map_err(|_| Simple::custom(span, "invalid hex escape"))
            })
    };
    let braced = filter(|c: &char| c.is_ascii_hexdigit())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .delimited_by(just('{'), just('}'))
        .try_map(|digits, span| {
            u32::from_str_radix(&digits, 16)
                .map_err(|_| Simple::custom(span, "invalid \\u{...} escape"))
        });

    // `None` marks a line continuation.
    let escape = just('\\').ignore_then(choice::<_, Simple<char>>((
        just('n').to(Some('\n' as u32)),
        just('t').to(Some('\t' as u32)),
        just('r').to(Some('\r' as u32)),
        just('b').to(Some(0x08)),
        just('f').to(Some(0x0C)),
        just('v').to(Some(0x0B)),
        just('0').to(Some(0)),
        just('x').ignore_then(hex(2)).map(Some),
        just('u').ignore_then(braced.or(hex(4))).map(Some),
        just('\r').or_not().ignore_then(just('\n')).to(None),
        any().map(|c: char| Some(c as u32)),
    )));

    let quoted = |quote: char| {
        let plain = filter::<char, _, Simple<char>>(move |c: &char| {
            *c != quote && *c != '\\' && !(quote == '`' && *c == '$')
        })
        .validate(move |c: char, span, emit| {
            if c == '\n' && quote != '`' {
                emit(Simple::custom(span, "newline inside string"));
            }
            Some(c as u32)
        });
        let dollar = just::<char, _, Simple<char>>('$')
            .then(just('{').or_not())
            .validate(|(dollar, brace): (char, Option<char>), span, emit| {
                if brace.is_some() {
                    emit(Simple::custom(span, "template substitutions are not supported"));
                }
                Some(dollar as u32)
            });

        just(quote)
            .ignore_then(choice((plain, escape.clone(), dollar)).repeated())
            .then_ignore(just(quote))
            .try_map(|units, span| decode_units(units, span))
    };
    let string = choice::<_, Simple<char>>((quoted('"'), quoted('\''), quoted('`'))).map(Token::Str);

    let punct = choice::<_, Simple<char>>((
        just("...").to(Token::Ellipsis),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just(':').to(Token::Colon),
        just(',').to(Token::Comma),
        just('!').to(Token::Bang),
        just('-').to(Token::Minus),
        just('+').to(Token::Plus),
    ));

    let ident = filter(|c: &char| is_ident_start(*c))
        .then(filter(|c: &char| is_ident_part(*c)).repeated())
        .map(|(first, rest)| Token::Ident(std::iter::once(first).chain(rest).collect()));

    let line_comment = just("//")
        .then(filter(|c: &char| *c != '\n').repeated())
        .ignored();
    let block_comment = just("/*").then(take_until(just("*/"))).ignored();
    let trivia = choice::<_, Simple<char>>((
        filter(|c: &char| c.is_whitespace()).ignored(),
        line_comment,
        block_comment,
    ))
    .repeated();

    let token = choice::<_, Simple<char>>((number, string, punct, ident));

    trivia
        .clone()
        .ignore_then(
            token
                .map_with_span(|tok, span| (tok, span))
                .then_ignore(trivia)
                .repeated(),
        )
        .then_ignore(end())
}

/// Fold escaped code units into a string, joining `\uD83D\uDE00` style
/// surrogate pairs.
fn decode_units(units: Vec<Option<u32>>, span: Range<usize>) -> Result<String, Simple<char>> {
    let mut out = String::new();
    let mut units = units.into_iter().flatten().peekable();
    while let Some(unit) = units.next() {
        let code = if (0xD800..0xDC00).contains(&unit) {
            match units.next_if(|low| (0xDC00..0xE000).contains(low)) {
                Some(low) => 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00),
                None => return Err(Simple::custom(span, "invalid surrogate pair")),
            }
        } else {
            unit
        };
        match char::from_u32(code) {
            Some(c) => out.push(c),
            None => return Err(Simple::custom(span, "invalid unicode escape")),
        }
    }
    Ok(out)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
