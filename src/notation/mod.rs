//! # Reading and writing the portable state string.
//!
//! A fusion-chess position travels as one line of text: the oracle's own
//! FEN, a space, then the fusion assignments. Parsing is parser-combinator
//! based; every type that has a text form implements [`Parsable`] and
//! exposes its parser for composition.

pub mod export;

use chumsky::prelude::*;
use shakmaty::{Color, File, Rank, Square};

/// Types which carry their own text-form parser.
pub trait Parsable: Sized {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self>;
}

impl Parsable for Square {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        group((
            one_of('a'..='h').map(|c: char| File::new(c as u32 - 'a' as u32)),
            one_of('1'..='8').map(|c: char| Rank::new(c as u32 - '1' as u32)),
        ))
        .map(|(file, rank)| Square::from_coords(file, rank))
        .labelled("expected a board square a1 ... h8")
    }
}

impl Parsable for Color {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        choice((just('w').to(Color::White), just('b').to(Color::Black)))
            .labelled("expected w or b")
            .boxed()
    }
}

/// Single-letter color tag as it appears in royal fusion tokens.
pub fn color_char(color: Color) -> char {
    match color {
        Color::White => 'w',
        Color::Black => 'b',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_square_parses_back_from_its_display_form() {
        for sq in Square::ALL {
            let text = sq.to_string();
            assert_eq!(
                Square::parser()
                    .then_ignore(end())
                    .parse(text.as_str())
                    .into_output(),
                Some(sq),
                "unable to parse {sq}",
            );
        }
    }

    #[test]
    fn out_of_range_squares_are_refused() {
        for text in ["e9", "i4", "44", "ee"] {
            assert!(
                Square::parser()
                    .then_ignore(end())
                    .parse(text)
                    .into_output()
                    .is_none()
            );
        }
    }
}
