use std::ops::BitOr;

use crossterm::event::{KeyCode, KeyModifiers};

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{anychar, char, digit1},
    combinator::{eof, map_res, value},
    multi::{many0, many1},
    IResult,
};

use super::KeyInput;

fn parse_modifier(input: &str) -> IResult<&str, KeyModifiers> {
    /*
     * Parse the modifier prefixes in things like <C-...>, <S-...>, <A-...>, and <M-...>.
     *
     * <D-...> is the Command key; it is carried as SUPER since that is the bit hosts
     * deliver it on.
     */
    alt((
        value(KeyModifiers::ALT, tag_no_case("A-")),
        value(KeyModifiers::ALT, tag_no_case("M-")),
        value(KeyModifiers::CONTROL, tag_no_case("C-")),
        value(KeyModifiers::SHIFT, tag_no_case("S-")),
        value(KeyModifiers::SUPER, tag_no_case("D-")),
    ))(input)
}

fn parse_arrow(input: &str) -> IResult<&str, KeyCode> {
    alt((
        value(KeyCode::Left, tag_no_case("Left")),
        value(KeyCode::Right, tag_no_case("Right")),
        value(KeyCode::Up, tag_no_case("Up")),
        value(KeyCode::Down, tag_no_case("Down")),
    ))(input)
}

fn parse_page_up(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("PageUp")(input)?;
    Ok((input, KeyCode::PageUp))
}

fn parse_page_down(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("PageDown")(input)?;
    Ok((input, KeyCode::PageDown))
}

fn parse_home(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("Home")(input)?;
    Ok((input, KeyCode::Home))
}

fn parse_end(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("End")(input)?;
    Ok((input, KeyCode::End))
}

fn parse_insert(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = alt((tag_no_case("Insert"), tag_no_case("Ins")))(input)?;
    Ok((input, KeyCode::Insert))
}

fn parse_esc(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("Esc")(input)?;
    Ok((input, KeyCode::Esc))
}

fn parse_tab(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("Tab")(input)?;
    Ok((input, KeyCode::Tab))
}

fn parse_bs(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = alt((tag_no_case("BackSpace"), tag_no_case("BS")))(input)?;
    Ok((input, KeyCode::Backspace))
}

fn parse_nl(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = alt((
        tag_no_case("NewLine"),
        tag_no_case("LineFeed"),
        tag_no_case("NL"),
        tag_no_case("LF"),
    ))(input)?;
    Ok((input, KeyCode::Char('\n')))
}

fn parse_cr(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = alt((tag_no_case("CR"), tag_no_case("Return"), tag_no_case("Enter")))(input)?;
    Ok((input, KeyCode::Enter))
}

fn parse_del(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = alt((tag_no_case("Delete"), tag_no_case("Del")))(input)?;
    Ok((input, KeyCode::Delete))
}

fn parse_nul(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("Nul")(input)?;
    Ok((input, KeyCode::Null))
}

fn parse_space(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("Space")(input)?;
    Ok((input, KeyCode::Char(' ')))
}

fn parse_bar(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("Bar")(input)?;
    Ok((input, KeyCode::Char('|')))
}

fn parse_bslash(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("Bslash")(input)?;
    Ok((input, KeyCode::Char('\\')))
}

fn parse_lt(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = tag_no_case("lt")(input)?;
    Ok((input, KeyCode::Char('<')))
}

fn parse_named_ascii(input: &str) -> IResult<&str, KeyCode> {
    alt((parse_space, parse_bar, parse_bslash, parse_lt))(input)
}

fn parse_named_ctl(input: &str) -> IResult<&str, KeyCode> {
    alt((parse_esc, parse_tab, parse_bs, parse_nl, parse_cr, parse_nul))(input)
}

fn parse_keyname(input: &str) -> IResult<&str, KeyCode> {
    alt((
        parse_arrow,
        parse_named_ascii,
        parse_named_ctl,
        parse_page_up,
        parse_page_down,
        parse_home,
        parse_end,
        parse_insert,
        parse_del,
    ))(input)
}

fn parse_base10_u8(input: &str) -> Result<u8, std::num::ParseIntError> {
    input.parse::<u8>()
}

fn parse_function(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = char('F')(input)?;
    let (input, n) = map_res(digit1, parse_base10_u8)(input)?;

    Ok((input, KeyCode::F(n)))
}

fn parse_anychar(input: &str) -> IResult<&str, KeyCode> {
    let (input, c) = anychar(input)?;

    Ok((input, KeyCode::Char(c)))
}

pub fn parse_simple(input: &str) -> IResult<&str, KeyInput> {
    let (input, c) = anychar(input)?;
    let key = KeyInput::new(KeyCode::Char(c), KeyModifiers::NONE);

    Ok((input, key))
}

pub fn parse_special(input: &str) -> IResult<&str, KeyInput> {
    let (input, _) = char('<')(input)?;
    let (input, m) = many0(parse_modifier)(input)?;
    let (input, k) = alt((parse_keyname, parse_function, parse_anychar))(input)?;
    let (input, _) = char('>')(input)?;

    let m = m.into_iter().fold(KeyModifiers::NONE, BitOr::bitor);

    if let KeyCode::Char(c) = k {
        if m.contains(KeyModifiers::CONTROL) {
            // Control combinations that have historically been other keys.
            let key = match c.to_ascii_lowercase() {
                'i' => KeyInput::from(KeyCode::Tab),
                'j' => KeyInput::from(KeyCode::Char('\n')),
                'm' => KeyInput::from(KeyCode::Enter),
                '[' => KeyInput::from(KeyCode::Esc),
                '?' => KeyInput::from(KeyCode::Backspace),
                '@' => KeyInput::new(KeyCode::Char(' '), m),
                c => KeyInput::new(KeyCode::Char(c), m),
            };

            return Ok((input, key));
        }
    } else if let KeyCode::Tab = k {
        if m == KeyModifiers::SHIFT {
            let key = KeyInput::from(KeyCode::BackTab);

            return Ok((input, key));
        }
    }

    let key = KeyInput::new(k, m);

    return Ok((input, key));
}

pub fn parse_key_str(input: &str) -> IResult<&str, KeyInput> {
    let (input, res) = alt((parse_special, parse_simple))(input)?;
    let (input, _) = eof(input)?;

    Ok((input, res))
}

pub fn parse_keyseq_str(input: &str) -> IResult<&str, Vec<KeyInput>> {
    let (input, res) = many1(alt((parse_special, parse_simple)))(input)?;
    let (input, _) = eof(input)?;

    Ok((input, res))
}
